// bases/download_cli/src/app.rs
use color_eyre::Result;
use media_downloader::{DownloadOutcome, MediaDownloader, ThumbnailResolver, YtDlp};
use std::sync::Arc;

use crate::config::Config;
use crate::output::OutputHandler;
use crate::preview::{fetch_thumbnail, http_get};

pub struct App {
    config: Config,
    output: OutputHandler,
    thumbnails: ThumbnailResolver,
}

impl App {
    pub fn new(config: Config) -> Self {
        let output = OutputHandler::new(config.verbose);
        Self {
            config,
            output,
            thumbnails: ThumbnailResolver::new(),
        }
    }

    /// Run the download, returning its outcome
    pub async fn run(&self) -> Result<DownloadOutcome> {
        let engine = Arc::new(YtDlp::new(&self.config.yt_dlp));
        let downloader = MediaDownloader::new_with_engine(&self.config.output_dir, engine);
        downloader.check_engine().await?;

        let request = self.config.request.clone();
        if !looks_like_youtube(request.source_url()) {
            self.output.print_warning("Please enter a valid YouTube URL.");
        } else if self.config.show_thumbnail {
            self.show_thumbnail(request.source_url()).await;
        }

        self.output.print_download_start(&request);
        let handle = downloader.start_download(request);
        let mut progress = handle.progress_watch();

        loop {
            tokio::select! {
                fraction = progress.changed() => match fraction {
                    Some(fraction) => self.output.print_progress(fraction),
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    self.output.print_cancelling();
                    handle.cancel();
                }
            }
        }

        let outcome = handle.await_result().await;
        self.output.print_outcome(&outcome);
        Ok(outcome)
    }

    /// Thumbnail problems are reported but never stop the download
    async fn show_thumbnail(&self, url: &str) {
        let client = reqwest::Client::new();
        match fetch_thumbnail(&self.thumbnails, url, |u| http_get(&client, u)).await {
            Ok(Some(thumbnail)) => self.output.print_thumbnail(&thumbnail),
            Ok(None) => self
                .output
                .print_warning("Could not fetch thumbnail. Please check the URL."),
            Err(e) => self
                .output
                .print_warning(&format!("Could not display thumbnail: {e}")),
        }
    }

    pub fn print_error(&self, error: &color_eyre::Report) {
        self.output.print_error(error);
    }
}

fn looks_like_youtube(url: &str) -> bool {
    url.contains("youtube.com") || url.contains("youtu.be")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn youtube_url_check() {
        assert!(looks_like_youtube("https://www.youtube.com/watch?v=ABC123"));
        assert!(looks_like_youtube("https://youtu.be/XYZ789"));
        assert!(!looks_like_youtube("https://example.com/video"));
    }
}
