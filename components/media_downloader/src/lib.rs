// components/media_downloader/src/lib.rs
mod layout;
mod progress;
mod thumbnail;
mod types;
mod utils;
mod ytdlp;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

pub use layout::{ensure_layout, Layout, AUDIO_DIR, VIDEO_DIR};
pub use progress::{parse_fraction, ProgressHook, ProgressReporter, ProgressWatch};
pub use thumbnail::{
    derive_thumbnail_url, extract_video_id, fallback_thumbnail_url, max_res_thumbnail_url,
    EvictionPolicy, Fifo, ThumbnailResolver, Unbounded,
};
pub use types::{
    Cancelled, DownloadError, DownloadMode, DownloadOutcome, DownloadRequest, ProgressEvent,
    ProgressStatus, VideoQuality, AUDIO_SELECTOR,
};
pub use utils::{sanitize_filename, MAX_FILENAME_CHARS};
pub use ytdlp::{AudioTranscode, Engine, EngineConfig, EngineReport, ItemInfo, YtDlp};

const DEFAULT_TITLE: &str = "Untitled";
const DEFAULT_EXT: &str = "mp4";

/// Drives the extraction engine for download requests and files the results
/// under a fixed [`Layout`].
#[derive(Clone)]
pub struct MediaDownloader {
    layout: Layout,
    engine: Arc<dyn Engine + Send + Sync>,
}

impl MediaDownloader {
    /// Create a new MediaDownloader backed by yt-dlp, storing files under `root`
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self::new_with_engine(root, Arc::new(YtDlp::default()))
    }

    /// Create a new MediaDownloader with a specific engine implementation
    pub fn new_with_engine(root: impl AsRef<Path>, engine: Arc<dyn Engine + Send + Sync>) -> Self {
        Self {
            layout: Layout::new(root),
            engine,
        }
    }

    /// Check that the engine can be used at all
    pub async fn check_engine(&self) -> Result<(), DownloadError> {
        self.engine.check_available().await
    }

    /// Run one download to completion.
    ///
    /// Never fails: every error, including a cancellation through `cancel`,
    /// ends up as one [`DownloadOutcome`] variant.
    pub async fn orchestrate(
        &self,
        request: &DownloadRequest,
        reporter: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> DownloadOutcome {
        tracing::info!("Starting {:?} download from {}", request.mode(), request.source_url());

        let outcome = DownloadOutcome::from(self.run(request, reporter, cancel).await);
        match &outcome {
            DownloadOutcome::Success(path) => {
                tracing::info!("Download completed successfully in: {}", path.display())
            }
            DownloadOutcome::Cancelled => {
                tracing::warn!("Download of {} cancelled by user", request.source_url())
            }
            DownloadOutcome::Failed(message) => {
                tracing::error!("{:?} download of {} failed: {}", request.mode(), request.source_url(), message)
            }
        }
        outcome
    }

    async fn run(
        &self,
        request: &DownloadRequest,
        reporter: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, DownloadError> {
        self.layout.ensure().await?;

        check_url(request.source_url())?;
        let config = self.engine_config(request);

        if cancel.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }

        let report = self
            .engine
            .run(&config, ProgressHook::new(reporter, cancel))
            .await?;

        Ok(self.output_path(request.mode(), &report))
    }

    /// Engine settings for a request: selector, output template, post-processing
    pub fn engine_config(&self, request: &DownloadRequest) -> EngineConfig {
        let title = format!("%(title).{MAX_FILENAME_CHARS}s");
        let videos = self.layout.videos();

        let (format, output_template, transcode) = match request.mode() {
            DownloadMode::Video | DownloadMode::VideoOnly => (
                request.quality_selector().to_string(),
                videos.join(format!("{title}.%(ext)s")),
                None,
            ),
            DownloadMode::AudioOnly => (
                AUDIO_SELECTOR.to_string(),
                self.layout.audio().join(format!("{title}.%(ext)s")),
                Some(AudioTranscode::MP3_192),
            ),
            DownloadMode::Playlist => (
                request.quality_selector().to_string(),
                videos.join(format!("%(playlist_index)s - {title}.%(ext)s")),
                None,
            ),
            DownloadMode::Channel => (
                request.quality_selector().to_string(),
                videos.join("%(uploader)s").join(format!("{title}.%(ext)s")),
                None,
            ),
        };

        EngineConfig {
            url: request.source_url().to_string(),
            format,
            output_template,
            transcode,
            collection: request.mode().is_collection(),
        }
    }

    /// Where the result of a successful run lives
    fn output_path(&self, mode: DownloadMode, report: &EngineReport) -> PathBuf {
        if mode.is_collection() {
            return self.layout.videos().to_path_buf();
        }

        let item = report.items.first().cloned().unwrap_or_else(|| {
            tracing::warn!("Engine reported no finished item, assuming defaults");
            ItemInfo::default()
        });
        let title = sanitize_filename(item.title.as_deref().unwrap_or(DEFAULT_TITLE));

        match mode {
            DownloadMode::AudioOnly => self.layout.audio().join(format!("{title}.mp3")),
            _ => {
                let ext = item.ext.as_deref().unwrap_or(DEFAULT_EXT);
                self.layout.videos().join(format!("{title}.{ext}"))
            }
        }
    }

    /// Start a download on the tokio runtime and hand back its handle
    pub fn start_download(&self, request: DownloadRequest) -> DownloadHandle {
        let (reporter, progress) = ProgressReporter::channel();
        let cancel = CancellationToken::new();

        let downloader = self.clone();
        let token = cancel.clone();
        let task = tokio::spawn(async move { downloader.orchestrate(&request, &reporter, &token).await });

        DownloadHandle {
            progress,
            cancel,
            task,
        }
    }
}

/// Accept absolute URLs and scheme-less ones like `www.youtube.com/watch?v=…`,
/// which yt-dlp resolves itself
fn check_url(raw: &str) -> Result<(), DownloadError> {
    match Url::parse(raw) {
        Ok(_) => Ok(()),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{raw}"))
            .map(|_| ())
            .map_err(|e| DownloadError::InvalidUrl(e.to_string())),
        Err(e) => Err(DownloadError::InvalidUrl(e.to_string())),
    }
}

/// A download running in the background
pub struct DownloadHandle {
    progress: ProgressWatch,
    cancel: CancellationToken,
    task: JoinHandle<DownloadOutcome>,
}

impl DownloadHandle {
    /// Last published progress, between 0.0 and 1.0
    pub fn poll_progress(&self) -> f32 {
        self.progress.fraction()
    }

    pub fn progress_watch(&self) -> ProgressWatch {
        self.progress.clone()
    }

    /// Ask the download to stop; it ends as [`DownloadOutcome::Cancelled`]
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn await_result(self) -> DownloadOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Download task ended abnormally: {}", e);
                DownloadOutcome::Failed(format!("Unexpected error: {e}"))
            }
        }
    }
}
