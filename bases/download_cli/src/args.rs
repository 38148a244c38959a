// bases/download_cli/src/args.rs
use clap::{Parser, ValueEnum};
use media_downloader::{DownloadMode, VideoQuality};
use std::path::PathBuf;

/// Download videos, audio, playlists and channels from YouTube
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// URL to download from
    pub url: String,

    /// Directory to store downloaded files (Videos/ and Audio/ are created inside)
    #[arg(short, long, default_value = "youtube_downloads")]
    pub output_dir: PathBuf,

    /// What to download
    #[arg(short, long, value_enum, default_value_t = ModeArg::Video)]
    pub mode: ModeArg,

    /// Video quality, used by the video and video-only modes
    #[arg(short, long, value_enum, default_value_t = QualityArg::Best)]
    pub quality: QualityArg,

    /// yt-dlp executable to run
    #[arg(long = "yt-dlp", default_value = "yt-dlp")]
    pub yt_dlp: PathBuf,

    /// Skip the thumbnail preview
    #[arg(long)]
    pub no_thumbnail: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    /// Best video and audio, merged
    Video,
    /// Audio only, converted to MP3
    Audio,
    VideoOnly,
    /// Every video of a playlist
    Playlist,
    /// Every video of a channel
    Channel,
}

impl From<ModeArg> for DownloadMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Video => DownloadMode::Video,
            ModeArg::Audio => DownloadMode::AudioOnly,
            ModeArg::VideoOnly => DownloadMode::VideoOnly,
            ModeArg::Playlist => DownloadMode::Playlist,
            ModeArg::Channel => DownloadMode::Channel,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityArg {
    Best,
    #[value(name = "1080p")]
    P1080,
    #[value(name = "720p")]
    P720,
    #[value(name = "480p")]
    P480,
    #[value(name = "360p")]
    P360,
    #[value(name = "240p")]
    P240,
    #[value(name = "144p")]
    P144,
}

impl From<QualityArg> for VideoQuality {
    fn from(quality: QualityArg) -> Self {
        match quality {
            QualityArg::Best => VideoQuality::Best,
            QualityArg::P1080 => VideoQuality::P1080,
            QualityArg::P720 => VideoQuality::P720,
            QualityArg::P480 => VideoQuality::P480,
            QualityArg::P360 => VideoQuality::P360,
            QualityArg::P240 => VideoQuality::P240,
            QualityArg::P144 => VideoQuality::P144,
        }
    }
}
