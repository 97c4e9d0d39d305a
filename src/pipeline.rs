use log::{debug, info, warn};

use crate::captions::CaptionFetcher;
use crate::error::PipelineError;
use crate::summarize::Summarizer;
use crate::transcript::read_transcript;

/// Acquire → discover → extract → summarize, for one video URL.
#[derive(Debug, Clone)]
pub struct Pipeline {
    captions: CaptionFetcher,
    summarizer: Summarizer,
}

impl Pipeline {
    pub fn new(captions: CaptionFetcher, summarizer: Summarizer) -> Self {
        Self { captions, summarizer }
    }

    pub async fn run(&self, video_url: &str) -> Result<String, PipelineError> {
        info!("Summarizing {video_url}");

        let result = self.run_steps(video_url).await;
        match &result {
            Ok(summary) => info!("Summary ready for {video_url} ({} characters)", summary.len()),
            Err(e) => warn!("Summarizing {video_url} failed: {e}"),
        }
        result
    }

    async fn run_steps(&self, video_url: &str) -> Result<String, PipelineError> {
        let workspace = self.captions.fetch(video_url).await?;

        let caption = workspace
            .latest_caption()?
            .ok_or(PipelineError::CaptionsNotFound)?;

        let text = read_transcript(&caption).await?;
        if text.is_empty() {
            return Err(PipelineError::EmptyTranscript);
        }
        debug!("Transcript for {video_url}: {text}");

        self.summarizer.summarize(&text).await
    }
}
