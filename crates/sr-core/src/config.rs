use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::{errors::Error, Result};

const DEFAULT_SERVICE: &str = "https://bsky.social";
const DEFAULT_CONFIG_PATH: &str = "bot_config.json";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant replying to social media posts. \
Keep responses brief, friendly, and relevant to the original post.";

/// Largest page the timeline endpoint accepts.
pub const MAX_TIMELINE_LIMIT: usize = 100;

/// Process-level configuration taken from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub handle: String,
    pub password: String,
    pub service_url: String,
    pub settings_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv();

        let handle = env_str("BLUESKY_HANDLE").and_then(non_empty);
        let password = env_str("BLUESKY_PASSWORD").and_then(non_empty);
        let (Some(handle), Some(password)) = (handle, password) else {
            return Err(Error::Config(
                "BLUESKY_HANDLE and BLUESKY_PASSWORD environment variables are required"
                    .to_string(),
            ));
        };

        let service_url = env_str("BLUESKY_SERVICE")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_SERVICE.to_string());
        let settings_path = env::var_os("BOT_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        Ok(Self {
            handle: handle.trim().to_string(),
            password,
            service_url,
            settings_path,
        })
    }
}

/// Bot behaviour settings read from the JSON config file.
///
/// Every key is optional; anything missing falls back to its default.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct BotSettings {
    pub keywords: Vec<String>,
    pub regex_patterns: Vec<String>,
    pub llm_api: LlmSettings,
    pub reply_settings: ReplySettings,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub system_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1234".to_string(),
            model: "local-model".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: 100,
            temperature: 0.7,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReplySettings {
    /// Seconds to sleep between cycles.
    pub check_interval: u64,
    pub timeline_limit: usize,
    pub enable_replies: bool,
}

impl Default for ReplySettings {
    fn default() -> Self {
        Self {
            check_interval: 60,
            timeline_limit: 20,
            enable_replies: true,
        }
    }
}

impl ReplySettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.check_interval.max(1))
    }

    pub fn clamped_limit(&self) -> usize {
        self.timeline_limit.clamp(1, MAX_TIMELINE_LIMIT)
    }
}

impl BotSettings {
    /// Load settings from `path`.
    ///
    /// Never fails: a missing file yields defaults, an unreadable or invalid one
    /// is logged and also yields defaults.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!(path = %path.display(), "bot config not found, using defaults");
            return Self::default();
        }

        match Self::read(path) {
            Ok(settings) => settings.normalized(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to load bot config, using defaults");
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)?;
        Self::from_json(&txt)
    }

    pub fn from_json(txt: &str) -> Result<Self> {
        Ok(serde_json::from_str(txt)?)
    }

    fn normalized(mut self) -> Self {
        let rs = &mut self.reply_settings;
        if rs.check_interval == 0 {
            tracing::warn!("check_interval must be at least 1 second; using 1");
            rs.check_interval = 1;
        }
        let limit = rs.clamped_limit();
        if limit != rs.timeline_limit {
            tracing::warn!(
                requested = rs.timeline_limit,
                limit,
                "timeline_limit out of range; clamped"
            );
            rs.timeline_limit = limit;
        }
        self
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Load `.env` from the working directory into the process environment.
///
/// Call before `logging::init` so `LOG_LEVEL` from the file is seen. Existing
/// variables are never overridden.
pub fn load_dotenv() {
    load_dotenv_from(Path::new(".env"));
}

pub fn load_dotenv_from(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}
