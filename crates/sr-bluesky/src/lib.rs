//! Bluesky adapter (AT Protocol XRPC over HTTPS).
//!
//! Implements the feed provider port: session creation and refresh, home timeline
//! reads, and threaded post creation.

mod wire;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use sr_core::{
    config::MAX_TIMELINE_LIMIT,
    domain::{Profile, StrongRef, ThreadRef, TimelineEntry},
    errors::Error,
    ports::FeedProvider,
    utils::truncate_chars,
    Result,
};

use crate::wire::{
    CreateRecordRequest, CreateSessionRequest, FeedViewPost, PostRecord, ProfileView, RecordRef,
    ReplyRecord, SessionResponse, TimelineResponse, XrpcError, POST_COLLECTION, POST_TYPE,
};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
struct Session {
    did: String,
    access_jwt: String,
    refresh_jwt: String,
}

impl From<SessionResponse> for Session {
    fn from(s: SessionResponse) -> Self {
        Self {
            did: s.did,
            access_jwt: s.access_jwt,
            refresh_jwt: s.refresh_jwt,
        }
    }
}

pub struct BlueskyClient {
    service: String,
    http: reqwest::Client,
    session: RwLock<Option<Session>>,
}

impl BlueskyClient {
    pub fn new(service: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::External(format!("http client build failed: {e}")))?;
        Ok(Self {
            service: service.into().trim_end_matches('/').to_string(),
            http,
            session: RwLock::new(None),
        })
    }

    fn xrpc(&self, method: &str) -> String {
        format!("{}/xrpc/{method}", self.service)
    }

    async fn current_session(&self) -> Result<Session> {
        self.session
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::Auth("not logged in".to_string()))
    }

    async fn send(req: RequestBuilder) -> Result<(StatusCode, String)> {
        let resp = req
            .send()
            .await
            .map_err(|e| Error::Feed(format!("request error: {e}")))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::Feed(format!("failed to read response: {e}")))?;
        Ok((status, body))
    }

    /// Run an authenticated call, refreshing the session once if the access token expired.
    async fn authed<T, F>(&self, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn(&Session) -> RequestBuilder + Send + Sync,
    {
        let session = self.current_session().await?;
        let (status, body) = Self::send(build(&session)).await?;
        if !token_expired(status, &body) {
            return decode(status, &body);
        }

        tracing::info!("access token expired; refreshing session");
        let session = self.refresh().await?;
        let (status, body) = Self::send(build(&session)).await?;
        decode(status, &body)
    }

    async fn refresh(&self) -> Result<Session> {
        let current = self.current_session().await?;
        let req = self
            .http
            .post(self.xrpc("com.atproto.server.refreshSession"))
            .bearer_auth(&current.refresh_jwt);
        let (status, body) = Self::send(req).await?;
        let fresh: SessionResponse = decode(status, &body).map_err(|e| {
            tracing::error!(error = %e, "session refresh failed");
            Error::Auth(format!("session refresh failed: {e}"))
        })?;

        let session = Session::from(fresh);
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    async fn fetch_display_name(&self, did: &str) -> Option<String> {
        let result: Result<ProfileView> = self
            .authed(|s| {
                self.http
                    .get(self.xrpc("app.bsky.actor.getProfile"))
                    .query(&[("actor", did)])
                    .bearer_auth(&s.access_jwt)
            })
            .await;
        match result {
            Ok(profile) => profile.display_name,
            Err(e) => {
                tracing::warn!(error = %e, "could not fetch profile");
                None
            }
        }
    }
}

#[async_trait]
impl FeedProvider for BlueskyClient {
    async fn login(&self, handle: &str, secret: &str) -> Result<Profile> {
        let req = self
            .http
            .post(self.xrpc("com.atproto.server.createSession"))
            .json(&CreateSessionRequest {
                identifier: handle,
                password: secret,
            });
        let (status, body) = Self::send(req).await?;
        let created: SessionResponse = decode(status, &body)?;

        let did = created.did.clone();
        let account_handle = created.handle.clone();
        *self.session.write().await = Some(Session::from(created));

        let display_name = self.fetch_display_name(&did).await;
        Ok(Profile {
            did,
            handle: account_handle,
            display_name,
        })
    }

    async fn get_timeline(&self, limit: usize) -> Result<Vec<TimelineEntry>> {
        let limit = limit.clamp(1, MAX_TIMELINE_LIMIT).to_string();
        let page: TimelineResponse = self
            .authed(|s| {
                self.http
                    .get(self.xrpc("app.bsky.feed.getTimeline"))
                    .query(&[("limit", limit.as_str())])
                    .bearer_auth(&s.access_jwt)
            })
            .await?;

        Ok(page.feed.into_iter().filter_map(to_entry).collect())
    }

    async fn send_post(&self, text: &str, thread: &ThreadRef) -> Result<StrongRef> {
        let record = PostRecord {
            kind: POST_TYPE.to_string(),
            text: text.to_string(),
            created_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            reply: Some(ReplyRecord {
                root: RecordRef::from(&thread.root),
                parent: RecordRef::from(&thread.parent),
            }),
        };

        let created: RecordRef = self
            .authed(|s| {
                self.http
                    .post(self.xrpc("com.atproto.repo.createRecord"))
                    .bearer_auth(&s.access_jwt)
                    .json(&CreateRecordRequest {
                        repo: &s.did,
                        collection: POST_COLLECTION,
                        record: &record,
                    })
            })
            .await?;

        Ok(created.into())
    }
}

fn to_entry(item: FeedViewPost) -> Option<TimelineEntry> {
    let post = item.post;
    let record: PostRecord = match serde_json::from_value(post.record) {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(uri = %post.uri, error = %e, "skipping non-post record");
            return None;
        }
    };
    if record.kind != POST_TYPE {
        return None;
    }

    Some(TimelineEntry {
        uri: post.uri,
        cid: post.cid,
        author_handle: post.author.handle,
        text: record.text,
        reply: record.reply.map(|r| ThreadRef {
            parent: r.parent.into(),
            root: r.root.into(),
        }),
    })
}

fn token_expired(status: StatusCode, body: &str) -> bool {
    if status != StatusCode::BAD_REQUEST && status != StatusCode::UNAUTHORIZED {
        return false;
    }
    serde_json::from_str::<XrpcError>(body)
        .ok()
        .and_then(|e| e.error)
        .is_some_and(|code| code == "ExpiredToken")
}

fn decode<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T> {
    if status.is_success() {
        return Ok(serde_json::from_str(body)?);
    }

    let detail = serde_json::from_str::<XrpcError>(body)
        .ok()
        .map(|e| e.describe())
        .unwrap_or_else(|| truncate_chars(body, 200));
    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::Auth(detail));
    }
    Err(Error::Http {
        status: status.as_u16(),
        body: detail,
    })
}
