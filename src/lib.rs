pub mod captions;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod server;
pub mod summarize;
pub mod transcript;

use eyre::{Result, eyre};

use captions::CaptionFetcher;
use config::Config;
use pipeline::Pipeline;
use summarize::{GeminiSettings, Summarizer};

/// Assemble the summarize pipeline from config and the process environment.
///
/// Fails when no Gemini API key is configured.
pub fn build_pipeline(config: &Config, client: reqwest::Client) -> Result<Pipeline> {
    build_pipeline_with_env_key(config, client, std::env::var("GEMINI_API_KEY").ok())
}

pub fn build_pipeline_with_env_key(
    config: &Config,
    client: reqwest::Client,
    env_key: Option<String>,
) -> Result<Pipeline> {
    let api_key = config.api_key_from(env_key).ok_or_else(|| {
        eyre!("GEMINI_API_KEY environment variable not set and no gemini_api_key in config")
    })?;

    let captions = CaptionFetcher::new(config.yt_dlp(), config.caption_lang(), config.download_timeout())
        .with_workspace_root(config.workspace_root.clone());

    let settings = GeminiSettings {
        api_key,
        model: config.gemini_model().to_string(),
        base_url: config.gemini_base_url().to_string(),
        timeout: config.api_timeout(),
    };

    Ok(Pipeline::new(captions, Summarizer::new(client, settings)))
}
