use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{Result, WrapErr};
use log::debug;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_YT_DLP: &str = "yt-dlp";
pub const DEFAULT_CAPTION_LANG: &str = "en";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub bind: Option<String>,
    pub allowed_origin: Option<String>,
    pub yt_dlp: Option<PathBuf>,
    pub caption_lang: Option<String>,
    pub workspace_root: Option<PathBuf>,
    pub download_timeout_secs: Option<u64>,
    pub api_timeout_secs: Option<u64>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub gemini_base_url: Option<String>,
}

impl Config {
    /// Load config from `path` (normally ~/.config/ytsum/config.toml) if it exists
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(path)?;
            let config: Config =
                toml::from_str(&content).wrap_err_with(|| format!("invalid config file {}", path.display()))?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    /// The key from `GEMINI_API_KEY` wins over the config file; blank keys count as unset.
    pub fn api_key_from(&self, env_key: Option<String>) -> Option<String> {
        env_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.gemini_api_key.clone().filter(|k| !k.trim().is_empty()))
    }

    pub fn bind(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }

    pub fn allowed_origin(&self) -> &str {
        self.allowed_origin.as_deref().unwrap_or(DEFAULT_ALLOWED_ORIGIN)
    }

    pub fn yt_dlp(&self) -> PathBuf {
        self.yt_dlp.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_YT_DLP))
    }

    pub fn caption_lang(&self) -> &str {
        self.caption_lang.as_deref().unwrap_or(DEFAULT_CAPTION_LANG)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs.unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT_SECS))
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs.unwrap_or(DEFAULT_API_TIMEOUT_SECS))
    }

    pub fn gemini_model(&self) -> &str {
        self.gemini_model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL)
    }

    pub fn gemini_base_url(&self) -> &str {
        self.gemini_base_url.as_deref().unwrap_or(DEFAULT_GEMINI_BASE_URL)
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytsum")
        .join("config.toml")
}
