use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, SystemTime};

use eyre::{Result, WrapErr, bail};
use log::{debug, warn};
use tempfile::TempDir;
use tokio::process::Command;

/// Downloads auto-generated captions with yt-dlp into a per-request workspace.
#[derive(Debug, Clone)]
pub struct CaptionFetcher {
    yt_dlp: PathBuf,
    lang: String,
    workspace_root: Option<PathBuf>,
    timeout: Duration,
}

/// Scratch directory holding one request's caption download.
///
/// The directory and everything in it is removed on drop.
#[derive(Debug)]
pub struct CaptionWorkspace {
    dir: TempDir,
    suffix: String,
}

impl CaptionFetcher {
    pub fn new(yt_dlp: impl Into<PathBuf>, lang: impl Into<String>, timeout: Duration) -> Self {
        Self {
            yt_dlp: yt_dlp.into(),
            lang: lang.into(),
            workspace_root: None,
            timeout,
        }
    }

    pub fn with_workspace_root(mut self, root: Option<PathBuf>) -> Self {
        self.workspace_root = root;
        self
    }

    /// Filename suffix yt-dlp gives subtitles in the requested language, e.g. `.en.vtt`
    pub fn caption_suffix(&self) -> String {
        format!(".{}.vtt", self.lang)
    }

    fn create_workspace(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("ytsum-");
        let dir = match &self.workspace_root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    /// Run yt-dlp for `video_url` and return the workspace it wrote into.
    ///
    /// The exit status is only logged; callers decide success by looking for a caption file.
    pub async fn fetch(&self, video_url: &str) -> Result<CaptionWorkspace> {
        let dir = self.create_workspace().wrap_err("failed to create caption workspace")?;

        debug!(
            "Running {} for {video_url} in {}",
            self.yt_dlp.display(),
            dir.path().display()
        );

        let mut cmd = Command::new(&self.yt_dlp);
        cmd.args([
            "--write-auto-sub",
            "--sub-lang",
            &self.lang,
            "--sub-format",
            "vtt",
            "--skip-download",
            "--",
        ])
        .arg(video_url)
        .current_dir(dir.path())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                bail!(
                    "{} not found. Install it to enable caption downloads:\n  \
                     pip install yt-dlp\n  \
                     or: brew install yt-dlp",
                    self.yt_dlp.display()
                );
            }
            Err(e) => bail!("failed to run {}: {e}", self.yt_dlp.display()),
        };

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output.wrap_err("failed waiting for yt-dlp")?,
            Err(_) => bail!("yt-dlp timed out after {}s", self.timeout.as_secs_f64()),
        };

        if !output.status.success() {
            warn!(
                "yt-dlp exited with status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(CaptionWorkspace {
            dir,
            suffix: self.caption_suffix(),
        })
    }
}

impl CaptionWorkspace {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Newest caption file in this workspace, if yt-dlp produced one
    pub fn latest_caption(&self) -> Result<Option<PathBuf>> {
        find_latest_caption(self.path(), &self.suffix)
    }
}

/// Find the most recently modified file in `dir` whose name ends with `suffix`.
///
/// Not recursive. On equal modification times the first entry found wins.
pub fn find_latest_caption(dir: &Path, suffix: &str) -> Result<Option<PathBuf>> {
    let mut latest: Option<(SystemTime, PathBuf)> = None;

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if !name.to_string_lossy().ends_with(suffix) {
            continue;
        }
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified()?;
        match &latest {
            Some((newest, _)) if modified <= *newest => {}
            _ => latest = Some((modified, entry.path())),
        }
    }

    match &latest {
        Some((_, path)) => debug!("Using caption file: {}", path.display()),
        None => debug!("No {suffix} file found in {}", dir.display()),
    }

    Ok(latest.map(|(_, path)| path))
}
