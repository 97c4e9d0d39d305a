use std::path::Path;

use eyre::{Result, WrapErr};
use log::debug;
use regex::Regex;

const TIMESTAMP_PATTERN: &str = r"\d{2}:\d{2}:\d{2}\.\d{3} --> \d{2}:\d{2}:\d{2}\.\d{3}";
const TAG_PATTERN: &str = r"<[^>]+>";

/// Flatten WebVTT contents into a single line of transcript text.
///
/// Cue timing lines are dropped, inline tags such as `<c>` or `<00:00:01.520>` are
/// stripped, and the remaining non-empty lines are joined with a single space.
pub fn transcript_from_vtt(contents: &str) -> Result<String> {
    let timestamp = Regex::new(TIMESTAMP_PATTERN)?;
    let tag = Regex::new(TAG_PATTERN)?;

    let text = contents
        .lines()
        .filter(|line| !timestamp.is_match(line))
        .map(|line| tag.replace_all(line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    Ok(text.trim().to_string())
}

/// Read a caption file and extract its transcript
pub async fn read_transcript(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .wrap_err_with(|| format!("failed to read caption file {}", path.display()))?;
    let contents = String::from_utf8_lossy(&bytes);

    let text = transcript_from_vtt(&contents)?;
    debug!("Extracted {} characters of transcript from {}", text.len(), path.display());
    Ok(text)
}
