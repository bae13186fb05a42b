use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::api::stream::DEFAULT_MAX_LINE_BYTES;
use crate::util::join_endpoint;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_USERNAME: &str = "cle";
pub const DEFAULT_THINK_OPEN: &str = "<think>";
pub const DEFAULT_THINK_CLOSE: &str = "</think>";
const STREAM_PATH: &str = "chat/stream";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub api_url: String,
    pub username: String,
    pub think_open: String,
    pub think_close: String,
    pub max_line_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            think_open: DEFAULT_THINK_OPEN.to_string(),
            think_close: DEFAULT_THINK_CLOSE.to_string(),
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let defaults = Self::default();
        let max_line_bytes = match non_empty_env("THINKCHAT_MAX_LINE_BYTES") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(value) => value,
                Err(_) => bail!("Invalid THINKCHAT_MAX_LINE_BYTES '{raw}': expected a byte count"),
            },
            None => defaults.max_line_bytes,
        };

        Ok(Self {
            api_url: non_empty_env("THINKCHAT_API_URL").unwrap_or(defaults.api_url),
            username: non_empty_env("THINKCHAT_USERNAME").unwrap_or(defaults.username),
            think_open: non_empty_env("THINKCHAT_THINK_OPEN").unwrap_or(defaults.think_open),
            think_close: non_empty_env("THINKCHAT_THINK_CLOSE").unwrap_or(defaults.think_close),
            max_line_bytes,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            bail!(
                "Invalid THINKCHAT_API_URL '{}': expected http:// or https:// URL",
                self.api_url
            );
        }

        if self.username.trim().is_empty() {
            bail!("THINKCHAT_USERNAME must not be empty");
        }

        if self.think_open.is_empty() || self.think_close.is_empty() {
            bail!("Thinking markers must not be empty");
        }

        if self.think_open == self.think_close {
            bail!(
                "Thinking markers must differ (both are '{}')",
                self.think_open
            );
        }

        if self.max_line_bytes == 0 {
            bail!("THINKCHAT_MAX_LINE_BYTES must be greater than zero");
        }

        Ok(())
    }

    pub fn stream_url(&self) -> String {
        join_endpoint(&self.api_url, STREAM_PATH)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
