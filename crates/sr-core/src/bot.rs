//! Polling control loop.
//!
//! `Stopped -> Authenticating -> Running -> Stopped`. One cooperative loop fetches a
//! timeline page, runs every entry through policy, generation, thread resolution and
//! publishing, then sleeps. Per-post failures are logged and skipped; only a failed
//! login or a lost session ends the loop.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::{
    config::{BotSettings, ReplySettings},
    domain::{Profile, StrongRef, TimelineEntry},
    errors::Error,
    generator::ReplyGenerator,
    matcher::RuleSet,
    policy::{ReplyDecision, ReplyPolicy, SkipReason},
    ports::{CompletionClient, FeedProvider},
    publisher::ReplyPublisher,
    thread,
    utils::truncate_chars,
    Result,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BotPhase {
    Stopped,
    Authenticating,
    Running,
}

/// Snapshot of the orchestrator's runtime flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuntimeStatus {
    pub phase: BotPhase,
    pub authenticated: bool,
    pub running: bool,
}

impl Default for RuntimeStatus {
    fn default() -> Self {
        Self {
            phase: BotPhase::Stopped,
            authenticated: false,
            running: false,
        }
    }
}

/// Account credentials used for the single login attempt in `start()`.
#[derive(Clone)]
pub struct Credentials {
    pub handle: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(handle: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("handle", &self.handle)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Per-cycle counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub eligible: usize,
    pub generated: usize,
    pub published: usize,
    pub failed: usize,
}

/// What happened to one timeline entry.
#[derive(Clone, Debug, PartialEq)]
pub enum PostOutcome {
    Skipped(SkipReason),
    Malformed,
    NotGenerated,
    Published(StrongRef),
    PublishFailed,
}

#[derive(Default)]
struct Shared {
    status: Mutex<RuntimeStatus>,
    cancel: Mutex<CancellationToken>,
}

impl Shared {
    fn status(&self) -> MutexGuard<'_, RuntimeStatus> {
        self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Install a fresh cancellation token for a new run.
    fn arm(&self) -> CancellationToken {
        let mut guard = self.cancel.lock().unwrap_or_else(|e| e.into_inner());
        *guard = CancellationToken::new();
        guard.clone()
    }

    fn request_stop(&self) {
        {
            let mut st = self.status();
            if st.phase != BotPhase::Stopped {
                tracing::info!("stopping reply bot");
            }
            st.running = false;
        }
        self.cancel
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .cancel();
    }

    fn is_running(&self) -> bool {
        self.status().running
    }

    fn finish(&self) {
        let mut st = self.status();
        st.phase = BotPhase::Stopped;
        st.running = false;
    }
}

/// Cloneable handle that asks a running bot to stop.
///
/// The loop notices at its next iteration boundary; the current cycle finishes first.
#[derive(Clone)]
pub struct StopHandle {
    shared: Arc<Shared>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.shared.request_stop();
    }
}

pub struct ReplyBot {
    feed: Arc<dyn FeedProvider>,
    policy: ReplyPolicy,
    generator: ReplyGenerator,
    publisher: ReplyPublisher,
    credentials: Credentials,
    reply_settings: ReplySettings,
    profile: Mutex<Option<Profile>>,
    shared: Arc<Shared>,
}

impl ReplyBot {
    pub fn new(
        feed: Arc<dyn FeedProvider>,
        completion: Arc<dyn CompletionClient>,
        settings: &BotSettings,
        credentials: Credentials,
    ) -> Self {
        let rules = RuleSet::compile(&settings.keywords, &settings.regex_patterns);
        if rules.is_empty() {
            tracing::warn!("no keywords or regex patterns configured; the bot will never reply");
        }

        Self {
            policy: ReplyPolicy::new(rules),
            generator: ReplyGenerator::new(completion, settings.llm_api.clone()),
            publisher: ReplyPublisher::new(feed.clone()),
            feed,
            credentials,
            reply_settings: settings.reply_settings.clone(),
            profile: Mutex::new(None),
            shared: Arc::new(Shared::default()),
        }
    }

    pub fn status(&self) -> RuntimeStatus {
        *self.shared.status()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shared: self.shared.clone(),
        }
    }

    pub fn stop(&self) {
        self.shared.request_stop();
    }

    /// Authenticate and run the poll loop until stopped.
    ///
    /// Returns `Ok(())` after a requested stop, `Err` when login fails or the
    /// session is lost while fetching the timeline.
    pub async fn start(&self) -> Result<()> {
        let token = {
            let mut st = self.shared.status();
            if st.phase != BotPhase::Stopped {
                return Err(Error::InvalidState(
                    "reply bot is already started".to_string(),
                ));
            }
            // Arm under the status lock so a stop racing the phase change is kept.
            let token = self.shared.arm();
            st.phase = BotPhase::Authenticating;
            st.authenticated = false;
            token
        };
        tracing::info!("starting reply bot");

        if let Err(e) = self.authenticate().await {
            self.shared.finish();
            return Err(e);
        }

        if token.is_cancelled() {
            tracing::info!("stop requested during authentication");
            self.shared.finish();
            return Ok(());
        }

        {
            let mut st = self.shared.status();
            st.phase = BotPhase::Running;
            st.running = true;
        }

        let outcome = self.run_loop(&token).await;
        self.shared.finish();
        outcome
    }

    async fn authenticate(&self) -> Result<()> {
        tracing::info!(handle = %self.credentials.handle, "authenticating");
        match self
            .feed
            .login(&self.credentials.handle, &self.credentials.secret)
            .await
        {
            Ok(profile) => {
                tracing::info!(display_name = profile.display_label(), "authenticated");
                *self.profile.lock().unwrap_or_else(|e| e.into_inner()) = Some(profile);
                self.shared.status().authenticated = true;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "authentication failed");
                Err(Error::Auth(e.to_string()))
            }
        }
    }

    async fn run_loop(&self, token: &CancellationToken) -> Result<()> {
        loop {
            if !self.shared.is_running() {
                return Ok(());
            }

            if self.reply_settings.enable_replies {
                match self.run_cycle().await {
                    Ok(report) => tracing::info!(
                        fetched = report.fetched,
                        eligible = report.eligible,
                        generated = report.generated,
                        published = report.published,
                        failed = report.failed,
                        "cycle complete"
                    ),
                    Err(e) if e.is_auth() => {
                        tracing::error!(error = %e, "session lost; stopping reply bot");
                        return Err(e);
                    }
                    Err(e) => tracing::error!(error = %e, "error monitoring posts"),
                }
            } else {
                tracing::debug!("replies disabled in configuration");
            }

            self.wait_for_next_cycle(token).await;
        }
    }

    /// Suspension between cycles. A stop request cuts the wait short.
    ///
    /// This is the single place to swap for an event-driven subscription.
    async fn wait_for_next_cycle(&self, token: &CancellationToken) {
        tokio::select! {
            _ = sleep(self.reply_settings.interval()) => {}
            _ = token.cancelled() => {}
        }
    }

    /// Run one fetch-and-process pass.
    ///
    /// Only the timeline fetch can fail; every entry is fault-isolated.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let Some(own_handle) = self.own_handle() else {
            tracing::warn!("not authenticated, skipping post monitoring");
            return Ok(CycleReport::default());
        };

        let entries = self
            .feed
            .get_timeline(self.reply_settings.clamped_limit())
            .await?;

        let mut report = CycleReport {
            fetched: entries.len(),
            ..CycleReport::default()
        };

        for entry in &entries {
            let outcome = self.process_entry(entry, &own_handle).await;
            match outcome {
                PostOutcome::Skipped(_) => {}
                PostOutcome::Malformed => report.failed += 1,
                PostOutcome::NotGenerated => report.eligible += 1,
                PostOutcome::Published(_) => {
                    report.eligible += 1;
                    report.generated += 1;
                    report.published += 1;
                }
                PostOutcome::PublishFailed => {
                    report.eligible += 1;
                    report.generated += 1;
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    async fn process_entry(&self, entry: &TimelineEntry, own_handle: &str) -> PostOutcome {
        let rule = match self.policy.decide(entry, own_handle) {
            ReplyDecision::Reply { rule } => rule,
            ReplyDecision::Skip(reason) => return PostOutcome::Skipped(reason),
        };

        if entry.uri.is_empty() || entry.cid.is_empty() {
            tracing::warn!(
                author = %entry.author_handle,
                post = %truncate_chars(&entry.text, 50),
                "skipping entry without a usable reference"
            );
            return PostOutcome::Malformed;
        }

        tracing::debug!(author = %entry.author_handle, %rule, "post qualifies for a reply");

        let Some(reply) = self.generator.generate(entry).await else {
            return PostOutcome::NotGenerated;
        };

        let thread = thread::resolve(entry);
        match self
            .publisher
            .publish(&entry.author_handle, &thread, &reply.text)
            .await
        {
            Ok(posted) => PostOutcome::Published(posted),
            Err(_) => PostOutcome::PublishFailed,
        }
    }

    fn own_handle(&self) -> Option<String> {
        self.profile
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|p| p.handle.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::ThreadRef,
        ports::{ChatCompletionRequest, ChatRole},
    };
    use async_trait::async_trait;
    use std::{
        collections::{HashMap, VecDeque},
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    const ME: &str = "bot.bsky.social";

    #[derive(Default)]
    struct FakeFeed {
        login_error: Mutex<Option<Error>>,
        pages: Mutex<VecDeque<Result<Vec<TimelineEntry>>>>,
        fail_send_for: Mutex<Vec<String>>,
        sent: Mutex<Vec<(String, ThreadRef)>>,
        stop_after_fetch: Mutex<Option<(usize, StopHandle)>>,
        stop_on_login: Mutex<Option<StopHandle>>,
        logins: AtomicUsize,
        fetches: AtomicUsize,
    }

    impl FakeFeed {
        fn with_page(entries: Vec<TimelineEntry>) -> Arc<Self> {
            let feed = Arc::new(Self::default());
            feed.push_page(Ok(entries));
            feed
        }

        fn push_page(&self, page: Result<Vec<TimelineEntry>>) {
            self.pages.lock().unwrap().push_back(page);
        }

        fn stop_on_fetch(&self, n: usize, handle: StopHandle) {
            *self.stop_after_fetch.lock().unwrap() = Some((n, handle));
        }

        fn sent(&self) -> Vec<(String, ThreadRef)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FeedProvider for FakeFeed {
        async fn login(&self, handle: &str, _secret: &str) -> Result<Profile> {
            self.logins.fetch_add(1, Ordering::SeqCst);
            if let Some(handle) = self.stop_on_login.lock().unwrap().take() {
                handle.stop();
            }
            if let Some(e) = self.login_error.lock().unwrap().take() {
                return Err(e);
            }
            Ok(Profile {
                did: "did:plc:bot".into(),
                handle: handle.to_string(),
                display_name: Some("Reply Bot".into()),
            })
        }

        async fn get_timeline(&self, _limit: usize) -> Result<Vec<TimelineEntry>> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((at, handle)) = self.stop_after_fetch.lock().unwrap().as_ref() {
                if n >= *at {
                    handle.stop();
                }
            }
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn send_post(&self, text: &str, thread: &ThreadRef) -> Result<StrongRef> {
            if self.fail_send_for.lock().unwrap().contains(&thread.parent.uri) {
                return Err(Error::Feed("rejected by provider".into()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((text.to_string(), thread.clone()));
            Ok(StrongRef::new(
                format!("{}/reply", thread.parent.uri),
                "bafy-reply",
            ))
        }
    }

    enum Scripted {
        Reply(&'static str),
        Status(u16),
    }

    #[derive(Default)]
    struct FakeCompletion {
        script: Mutex<HashMap<&'static str, Scripted>>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeCompletion {
        fn scripted(pairs: Vec<(&'static str, Scripted)>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(pairs.into_iter().collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionClient for FakeCompletion {
        async fn complete(&self, req: &ChatCompletionRequest) -> Result<String> {
            let user = req
                .messages
                .iter()
                .find(|m| m.role == ChatRole::User)
                .map(|m| m.content.clone())
                .unwrap_or_default();
            self.prompts.lock().unwrap().push(user.clone());

            let script = self.script.lock().unwrap();
            match script.iter().find(|(k, _)| user.contains(*k)).map(|(_, v)| v) {
                Some(Scripted::Reply(text)) => Ok(text.to_string()),
                Some(Scripted::Status(status)) => Err(Error::Http {
                    status: *status,
                    body: "server error".into(),
                }),
                None => Ok("thanks for sharing!".into()),
            }
        }
    }

    fn entry(id: &str, author: &str, text: &str) -> TimelineEntry {
        TimelineEntry {
            uri: format!("at://did:plc:{author}/app.bsky.feed.post/{id}"),
            cid: format!("bafy-{id}"),
            author_handle: author.to_string(),
            text: text.to_string(),
            reply: None,
        }
    }

    fn settings(keywords: &[&str]) -> BotSettings {
        BotSettings {
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            ..BotSettings::default()
        }
    }

    fn bot(feed: Arc<FakeFeed>, completion: Arc<FakeCompletion>, settings: &BotSettings) -> ReplyBot {
        ReplyBot::new(feed, completion, settings, Credentials::new(ME, "app-password"))
    }

    #[tokio::test]
    async fn replies_to_matching_top_level_post() {
        let post = entry("1", "alice.bsky.social", "I love rust programming");
        let feed = FakeFeed::with_page(vec![post.clone()]);
        let completion =
            FakeCompletion::scripted(vec![("rust", Scripted::Reply("Rust is great for systems work!"))]);
        let bot = bot(feed.clone(), completion.clone(), &settings(&["rust"]));

        bot.authenticate().await.unwrap();
        let report = bot.run_cycle().await.unwrap();

        assert_eq!(
            report,
            CycleReport {
                fetched: 1,
                eligible: 1,
                generated: 1,
                published: 1,
                failed: 0
            }
        );
        let sent = feed.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "Rust is great for systems work!");
        assert_eq!(sent[0].1.parent, post.strong_ref());
        assert_eq!(sent[0].1.root, post.strong_ref());
    }

    #[tokio::test]
    async fn own_posts_never_reach_the_generator() {
        let feed = FakeFeed::with_page(vec![entry("1", ME, "more rust content")]);
        let completion = FakeCompletion::scripted(vec![]);
        let bot = bot(feed.clone(), completion.clone(), &settings(&["rust"]));

        bot.authenticate().await.unwrap();
        let report = bot.run_cycle().await.unwrap();

        assert_eq!(report.eligible, 0);
        assert_eq!(completion.calls(), 0);
        assert!(feed.sent().is_empty());
    }

    #[tokio::test]
    async fn threaded_posts_are_skipped_even_when_matching() {
        let mut post = entry("2", "bob.bsky.social", "rust reply in a thread");
        post.reply = Some(ThreadRef {
            parent: StrongRef::new("at://did:plc:carol/app.bsky.feed.post/1", "bafy-p"),
            root: StrongRef::new("at://did:plc:carol/app.bsky.feed.post/0", "bafy-r"),
        });
        let feed = FakeFeed::with_page(vec![post]);
        let completion = FakeCompletion::scripted(vec![]);
        let bot = bot(feed.clone(), completion.clone(), &settings(&["rust"]));

        bot.authenticate().await.unwrap();
        bot.run_cycle().await.unwrap();

        assert_eq!(completion.calls(), 0);
        assert!(feed.sent().is_empty());
    }

    #[tokio::test]
    async fn generation_failure_skips_only_that_post() {
        let feed = FakeFeed::with_page(vec![
            entry("1", "alice.bsky.social", "broken rust question"),
            entry("2", "bob.bsky.social", "rust is fun"),
        ]);
        let completion = FakeCompletion::scripted(vec![
            ("broken", Scripted::Status(500)),
            ("fun", Scripted::Reply("Agreed!")),
        ]);
        let bot = bot(feed.clone(), completion.clone(), &settings(&["rust"]));

        bot.authenticate().await.unwrap();
        let report = bot.run_cycle().await.unwrap();

        assert_eq!(completion.calls(), 2);
        assert_eq!(report.eligible, 2);
        assert_eq!(report.generated, 1);
        let sent = feed.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "Agreed!");
        assert!(sent[0].1.parent.uri.ends_with("/2"));
    }

    #[tokio::test]
    async fn publish_failure_does_not_block_next_entry() {
        let a = entry("a", "alice.bsky.social", "rust one");
        let b = entry("b", "bob.bsky.social", "rust two");
        let feed = FakeFeed::with_page(vec![a.clone(), b.clone()]);
        feed.fail_send_for.lock().unwrap().push(a.uri.clone());
        let bot = bot(feed.clone(), FakeCompletion::scripted(vec![]), &settings(&["rust"]));

        bot.authenticate().await.unwrap();
        let report = bot.run_cycle().await.unwrap();

        assert_eq!(report.published, 1);
        assert_eq!(report.failed, 1);
        let sent = feed.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.parent, b.strong_ref());
    }

    #[tokio::test]
    async fn entries_without_reference_are_skipped() {
        let mut broken = entry("1", "alice.bsky.social", "rust");
        broken.cid.clear();
        let feed = FakeFeed::with_page(vec![broken, entry("2", "bob.bsky.social", "rust")]);
        let completion = FakeCompletion::scripted(vec![]);
        let bot = bot(feed.clone(), completion.clone(), &settings(&["rust"]));

        bot.authenticate().await.unwrap();
        let report = bot.run_cycle().await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.published, 1);
        assert_eq!(completion.calls(), 1);
    }

    #[tokio::test]
    async fn cycle_before_login_does_nothing() {
        let feed = FakeFeed::with_page(vec![entry("1", "alice.bsky.social", "rust")]);
        let bot = bot(feed.clone(), FakeCompletion::scripted(vec![]), &settings(&["rust"]));

        assert_eq!(bot.run_cycle().await.unwrap(), CycleReport::default());
        assert_eq!(feed.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn login_failure_aborts_start() {
        let feed = Arc::new(FakeFeed::default());
        *feed.login_error.lock().unwrap() = Some(Error::Http {
            status: 401,
            body: "AuthenticationRequired".into(),
        });
        let bot = bot(feed.clone(), FakeCompletion::scripted(vec![]), &settings(&["rust"]));

        let err = bot.start().await.unwrap_err();
        assert!(err.is_auth());
        assert_eq!(bot.status(), RuntimeStatus::default());
        assert_eq!(feed.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stop_during_cycle_lets_the_cycle_finish() {
        let feed = FakeFeed::with_page(vec![
            entry("1", "alice.bsky.social", "rust one"),
            entry("2", "bob.bsky.social", "rust two"),
        ]);
        let bot = bot(feed.clone(), FakeCompletion::scripted(vec![]), &settings(&["rust"]));
        feed.stop_on_fetch(1, bot.stop_handle());

        bot.start().await.unwrap();

        assert_eq!(feed.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(feed.sent().len(), 2);
        let status = bot.status();
        assert_eq!(status.phase, BotPhase::Stopped);
        assert!(!status.running);
        assert!(status.authenticated);
    }

    #[tokio::test]
    async fn stop_while_authenticating_is_not_lost() {
        let feed = FakeFeed::with_page(vec![entry("1", "alice.bsky.social", "rust")]);
        let bot = bot(feed.clone(), FakeCompletion::scripted(vec![]), &settings(&["rust"]));
        *feed.stop_on_login.lock().unwrap() = Some(bot.stop_handle());

        bot.start().await.unwrap();

        assert_eq!(feed.logins.load(Ordering::SeqCst), 1);
        assert_eq!(feed.fetches.load(Ordering::SeqCst), 0);
        assert_eq!(bot.status().phase, BotPhase::Stopped);
        assert!(!bot.status().running);
    }

    #[tokio::test]
    async fn bot_can_be_started_again_after_stop() {
        let feed = Arc::new(FakeFeed::default());
        let bot = bot(feed.clone(), FakeCompletion::scripted(vec![]), &settings(&["rust"]));
        feed.stop_on_fetch(1, bot.stop_handle());

        bot.start().await.unwrap();
        bot.start().await.unwrap();

        assert_eq!(feed.logins.load(Ordering::SeqCst), 2);
        assert_eq!(feed.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_is_cycle_local() {
        let feed = Arc::new(FakeFeed::default());
        feed.push_page(Err(Error::Feed("timeline timed out".into())));
        feed.push_page(Ok(vec![entry("1", "alice.bsky.social", "rust")]));
        let bot = bot(feed.clone(), FakeCompletion::scripted(vec![]), &settings(&["rust"]));
        feed.stop_on_fetch(2, bot.stop_handle());

        bot.start().await.unwrap();

        assert_eq!(feed.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(feed.sent().len(), 1);
    }

    #[tokio::test]
    async fn lost_session_while_fetching_is_fatal() {
        let feed = Arc::new(FakeFeed::default());
        feed.push_page(Err(Error::Auth("refresh token expired".into())));
        let bot = bot(feed.clone(), FakeCompletion::scripted(vec![]), &settings(&["rust"]));

        let err = bot.start().await.unwrap_err();

        assert!(err.is_auth());
        assert_eq!(bot.status().phase, BotPhase::Stopped);
        assert_eq!(feed.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_replies_skip_fetching_and_second_start_is_rejected() {
        let feed = Arc::new(FakeFeed::default());
        let mut cfg = settings(&["rust"]);
        cfg.reply_settings.enable_replies = false;
        let bot = Arc::new(bot(feed.clone(), FakeCompletion::scripted(vec![]), &cfg));

        let runner = {
            let bot = bot.clone();
            tokio::spawn(async move { bot.start().await })
        };
        while bot.status().phase != BotPhase::Running {
            tokio::task::yield_now().await;
        }

        let err = bot.start().await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));

        tokio::time::sleep(Duration::from_secs(300)).await;
        bot.stop();
        runner.await.unwrap().unwrap();

        assert_eq!(feed.fetches.load(Ordering::SeqCst), 0);
        assert_eq!(bot.status().phase, BotPhase::Stopped);
    }
}
