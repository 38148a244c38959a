// bases/download_cli/src/config.rs
use crate::args::CliArgs;
use media_downloader::{DownloadMode, DownloadRequest, VideoQuality};
use std::path::PathBuf;

/// Download CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the download tree
    pub output_dir: PathBuf,

    /// The download to run
    pub request: DownloadRequest,

    /// yt-dlp executable
    pub yt_dlp: PathBuf,

    /// Show the thumbnail preview before downloading
    pub show_thumbnail: bool,

    pub verbose: bool,
}

impl Config {
    /// Create configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Self {
        let mode = DownloadMode::from(args.mode);
        let request = DownloadRequest::new(args.url, mode);

        // Quality only applies to single videos; the other modes keep their defaults
        let request = match mode {
            DownloadMode::Video | DownloadMode::VideoOnly => {
                request.with_quality(VideoQuality::from(args.quality))
            }
            _ => request,
        };

        Self {
            output_dir: args.output_dir,
            request,
            yt_dlp: args.yt_dlp,
            show_thumbnail: !args.no_thumbnail,
            verbose: args.verbose,
        }
    }

    /// Default log filter when RUST_LOG is not set
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "download_cli=debug,media_downloader=debug"
        } else {
            "download_cli=info,media_downloader=info"
        }
    }
}
