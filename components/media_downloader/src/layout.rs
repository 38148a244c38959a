// components/media_downloader/src/layout.rs
use std::path::{Path, PathBuf};

use crate::types::DownloadError;

pub const VIDEO_DIR: &str = "Videos";
pub const AUDIO_DIR: &str = "Audio";

/// Destination tree for downloads: `<root>/Videos` and `<root>/Audio`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
    videos: PathBuf,
    audio: PathBuf,
}

impl Layout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_owned();
        Self {
            videos: root.join(VIDEO_DIR),
            audio: root.join(AUDIO_DIR),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn videos(&self) -> &Path {
        &self.videos
    }

    pub fn audio(&self) -> &Path {
        &self.audio
    }

    /// Create every directory of the tree. Existing directories are left alone.
    pub async fn ensure(&self) -> Result<(), DownloadError> {
        for dir in [&self.root, &self.videos, &self.audio] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| DownloadError::filesystem(dir, e))?;
        }
        tracing::debug!("Download layout ready under {}", self.root.display());
        Ok(())
    }
}

/// Create the download tree under `root` and return it
pub async fn ensure_layout(root: impl AsRef<Path>) -> Result<Layout, DownloadError> {
    let layout = Layout::new(root);
    layout.ensure().await?;
    Ok(layout)
}
