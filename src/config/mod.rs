//! Configuration system (layered: code > env > config file).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::QuillError;

pub const DEFAULT_BASE_URL: &str = "https://open.bigmodel.cn/api/paas/v4";
pub const DEFAULT_MODEL: &str = "glm-5";
pub const DEFAULT_MAX_ROUNDS: usize = 5;

/// Runtime configuration, injected into the provider and orchestrator at
/// construction.
///
/// Resolution order:
/// 1. Values set in code (`with_*` setters) after loading
/// 2. Environment variables (`QUILL_*`, `.env` honored)
/// 3. TOML config file (`QUILL_CONFIG`, else the platform config dir)
/// 4. Built-in defaults
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QuillConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_rounds: usize,
    /// Longest silence tolerated on an upstream stream; 0 disables.
    pub stream_idle_timeout_ms: u64,
    /// Bound on each non-streaming (tool) completion.
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub system_prompt: Option<String>,
}

impl Default for QuillConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            stream_idle_timeout_ms: 120_000,
            request_timeout_ms: 120_000,
            connect_timeout_ms: 10_000,
            system_prompt: None,
        }
    }
}

impl std::fmt::Debug for QuillConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuillConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_rounds", &self.max_rounds)
            .field("stream_idle_timeout_ms", &self.stream_idle_timeout_ms)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("system_prompt", &self.system_prompt.as_ref().map(|_| ".."))
            .finish()
    }
}

impl QuillConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load file, then environment.
    pub fn load() -> Result<Self, QuillError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        let path = std::env::var_os("QUILL_CONFIG")
            .map(PathBuf::from)
            .or_else(|| Self::default_path().filter(|p| p.exists()));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Defaults overlaid with environment variables only.
    pub fn from_env() -> Result<Self, QuillError> {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// `<platform config dir>/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "quill")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn from_file(path: &Path) -> Result<Self, QuillError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw).map_err(|e| match e {
            QuillError::Configuration(msg) => {
                QuillError::Configuration(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, QuillError> {
        toml::from_str(raw).map_err(|e| QuillError::Configuration(e.to_string()))
    }

    /// Overlay values from an environment lookup.
    pub fn apply_env_with(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), QuillError> {
        if let Some(key) = lookup("QUILL_API_KEY").or_else(|| lookup("ZHIPUAI_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup("QUILL_BASE_URL") {
            self.base_url = url;
        }
        if let Some(model) = lookup("QUILL_MODEL") {
            self.model = model;
        }
        if let Some(prompt) = lookup("QUILL_SYSTEM_PROMPT") {
            self.system_prompt = Some(prompt);
        }
        if let Some(raw) = lookup("QUILL_MAX_ROUNDS") {
            self.max_rounds = parse_env("QUILL_MAX_ROUNDS", &raw)?;
        }
        if let Some(raw) = lookup("QUILL_STREAM_IDLE_TIMEOUT_MS") {
            self.stream_idle_timeout_ms = parse_env("QUILL_STREAM_IDLE_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = lookup("QUILL_REQUEST_TIMEOUT_MS") {
            self.request_timeout_ms = parse_env("QUILL_REQUEST_TIMEOUT_MS", &raw)?;
        }
        Ok(())
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = rounds;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn stream_idle_timeout(&self) -> Option<Duration> {
        (self.stream_idle_timeout_ms > 0).then(|| Duration::from_millis(self.stream_idle_timeout_ms))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, QuillError> {
    raw.trim()
        .parse()
        .map_err(|_| QuillError::Configuration(format!("{name} has an invalid value: {raw}")))
}
