// components/media_downloader/src/types.rs
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Required dependency not found: {0}")]
    DependencyNotFound(&'static str),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Download error: {0}")]
    Engine(String),

    #[error("Download cancelled by user")]
    Cancelled,

    #[error("Failed to create directory {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl DownloadError {
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DownloadError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// Raised by the progress reporter when the user asked to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Download cancelled by user")]
pub struct Cancelled;

impl From<Cancelled> for DownloadError {
    fn from(_: Cancelled) -> Self {
        DownloadError::Cancelled
    }
}

/// What to fetch for a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadMode {
    /// Best video merged with best audio
    Video,
    /// Best audio, transcoded to MP3
    AudioOnly,
    VideoOnly,
    /// Every item of a playlist, numbered by playlist position
    Playlist,
    /// Every upload of a channel, grouped by uploader
    Channel,
}

impl DownloadMode {
    /// Playlist and channel downloads produce a directory instead of a single file
    pub fn is_collection(self) -> bool {
        matches!(self, DownloadMode::Playlist | DownloadMode::Channel)
    }

    /// Selector used when the caller does not pick a quality
    pub fn default_selector(self) -> &'static str {
        match self {
            DownloadMode::AudioOnly => AUDIO_SELECTOR,
            _ => VideoQuality::Best.selector(),
        }
    }
}

/// Format selector forced for audio downloads
pub const AUDIO_SELECTOR: &str = "bestaudio/best";

/// Video quality presets, each falling back to the best single stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VideoQuality {
    #[default]
    Best,
    P1080,
    P720,
    P480,
    P360,
    P240,
    P144,
}

impl VideoQuality {
    pub const ALL: [VideoQuality; 7] = [
        VideoQuality::Best,
        VideoQuality::P1080,
        VideoQuality::P720,
        VideoQuality::P480,
        VideoQuality::P360,
        VideoQuality::P240,
        VideoQuality::P144,
    ];

    /// Maximum frame height, `None` for uncapped
    pub fn max_height(self) -> Option<u32> {
        match self {
            VideoQuality::Best => None,
            VideoQuality::P1080 => Some(1080),
            VideoQuality::P720 => Some(720),
            VideoQuality::P480 => Some(480),
            VideoQuality::P360 => Some(360),
            VideoQuality::P240 => Some(240),
            VideoQuality::P144 => Some(144),
        }
    }

    /// The yt-dlp format selector for this preset
    pub fn selector(self) -> &'static str {
        match self {
            VideoQuality::Best => "bv*+ba/best",
            VideoQuality::P1080 => "bv*[height<=1080]+ba/best",
            VideoQuality::P720 => "bv*[height<=720]+ba/best",
            VideoQuality::P480 => "bv*[height<=480]+ba/best",
            VideoQuality::P360 => "bv*[height<=360]+ba/best",
            VideoQuality::P240 => "bv*[height<=240]+ba/best",
            VideoQuality::P144 => "bv*[height<=144]+ba/best",
        }
    }
}

/// A single download job. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    source_url: String,
    mode: DownloadMode,
    quality_selector: String,
}

impl DownloadRequest {
    pub fn new(source_url: impl Into<String>, mode: DownloadMode) -> Self {
        Self {
            source_url: source_url.into(),
            mode,
            quality_selector: mode.default_selector().to_string(),
        }
    }

    pub fn with_quality(self, quality: VideoQuality) -> Self {
        self.with_selector(quality.selector())
    }

    /// Use a raw engine selector; it is forwarded without interpretation
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.quality_selector = selector.into();
        self
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn mode(&self) -> DownloadMode {
        self.mode
    }

    pub fn quality_selector(&self) -> &str {
        &self.quality_selector
    }
}

/// Terminal result of one orchestrated download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Path of the downloaded file, or the destination directory for collections
    Success(PathBuf),
    Cancelled,
    Failed(String),
}

impl DownloadOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            DownloadOutcome::Success(path) => Some(path),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success(_))
    }
}

impl From<Result<PathBuf, DownloadError>> for DownloadOutcome {
    fn from(result: Result<PathBuf, DownloadError>) -> Self {
        match result {
            Ok(path) => DownloadOutcome::Success(path),
            Err(DownloadError::Cancelled) => DownloadOutcome::Cancelled,
            Err(e) => DownloadOutcome::Failed(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    Downloading,
    Other,
}

impl ProgressStatus {
    pub fn from_engine(status: &str) -> Self {
        if status.trim().eq_ignore_ascii_case("downloading") {
            ProgressStatus::Downloading
        } else {
            ProgressStatus::Other
        }
    }
}

/// One progress tick emitted by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub status: ProgressStatus,
    /// Raw percentage text as formatted by the engine, e.g. `" 45.2%"`
    pub percent: Option<String>,
}

impl ProgressEvent {
    pub fn downloading(percent: impl Into<String>) -> Self {
        Self {
            status: ProgressStatus::Downloading,
            percent: Some(percent.into()),
        }
    }

    pub fn other() -> Self {
        Self {
            status: ProgressStatus::Other,
            percent: None,
        }
    }
}
