// bases/download_cli/src/output.rs
use std::io::Write;
use media_downloader::{DownloadOutcome, DownloadRequest};

use crate::preview::Thumbnail;

const BAR_WIDTH: usize = 30;

pub struct OutputHandler {
    verbose: bool,
}

impl OutputHandler {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn print_download_start(&self, request: &DownloadRequest) {
        println!("Starting {:?} download from: {}", request.mode(), request.source_url());
        if self.verbose {
            println!("Format selector: {}", request.quality_selector());
        }
    }

    pub fn print_thumbnail(&self, thumbnail: &Thumbnail) {
        if thumbnail.fallback {
            self.print_warning("Could not fetch thumbnail. Using default thumbnail.");
        }
        println!("Thumbnail: {} ({} bytes)", thumbnail.url, thumbnail.bytes.len());
    }

    pub fn print_progress(&self, fraction: f32) {
        print!("\r{}", progress_line(fraction));
        let _ = std::io::stdout().flush();
    }

    pub fn print_cancelling(&self) {
        println!();
        println!("Cancelling download...");
    }

    pub fn print_outcome(&self, outcome: &DownloadOutcome) {
        println!();
        match outcome {
            DownloadOutcome::Success(path) => {
                println!("Download complete!");
                println!("Location: {}", path.display());
            }
            DownloadOutcome::Cancelled => self.print_warning("Download cancelled by user."),
            DownloadOutcome::Failed(message) => eprintln!("❌ {}", message),
        }
    }

    pub fn print_warning(&self, message: &str) {
        eprintln!("Warning: {}", message);
    }

    pub fn print_error(&self, error: &color_eyre::Report) {
        eprintln!("Error: {}", error);

        if self.verbose {
            eprintln!("\nError details:");
            error.chain().skip(1).for_each(|cause| {
                eprintln!("  caused by: {}", cause);
            });
        }
    }
}

/// `[#######-------] 45%`
fn progress_line(fraction: f32) -> String {
    let fraction = fraction.clamp(0.0, 1.0);
    let filled = (fraction * BAR_WIDTH as f32).round() as usize;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        (fraction * 100.0).round() as u32
    )
}
