/// Core error type for the bot.
///
/// Adapter crates map their transport errors into this type so the orchestrator
/// can tell fatal failures (lost session) from ones it isolates and logs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("feed error: {0}")]
    Feed(String),

    #[error("completion error: {0}")]
    Completion(String),

    #[error("http {status}: {body}")]
    Http { status: u16, body: String },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// True when the failure means the account session is gone and cannot be
    /// recovered by the feed provider on its own.
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
