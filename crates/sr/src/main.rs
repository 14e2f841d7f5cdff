use std::{process::ExitCode, sync::Arc};

use sr_bluesky::BlueskyClient;
use sr_core::{
    bot::{Credentials, ReplyBot, StopHandle},
    config::{self, BotSettings, Config},
};
use sr_openai::OpenAiCompatClient;

#[tokio::main]
async fn main() -> ExitCode {
    config::load_dotenv();
    if let Err(e) = sr_core::logging::init("sr") {
        eprintln!("{e}");
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "reply bot failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = Config::load().inspect_err(|_| {
        tracing::error!("copy .env.example to .env and fill in your credentials");
    })?;
    let settings = BotSettings::load(&cfg.settings_path);

    let feed = Arc::new(BlueskyClient::new(&cfg.service_url)?);
    let completion = Arc::new(OpenAiCompatClient::new(&settings.llm_api.base_url)?);

    let bot = ReplyBot::new(
        feed,
        completion,
        &settings,
        Credentials::new(&cfg.handle, &cfg.password),
    );
    tokio::spawn(stop_on_signal(bot.stop_handle()));

    bot.start().await?;
    tracing::info!("reply bot stopped");
    Ok(())
}

async fn stop_on_signal(handle: StopHandle) {
    let signal = wait_for_signal().await;
    tracing::info!(signal, "received signal, shutting down gracefully");
    handle.stop();
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "cannot listen for SIGTERM");
            let _ = tokio::signal::ctrl_c().await;
            return "SIGINT";
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => "SIGINT",
        _ = term.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "SIGINT"
}
