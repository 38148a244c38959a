// components/media_downloader/src/ytdlp.rs
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};

use crate::progress::ProgressHook;
use crate::types::{DownloadError, ProgressEvent, ProgressStatus};
use crate::utils::RESERVED_PATTERN;

const PROGRESS_PREFIX: &str = "progress|";
const ITEM_PREFIX: &str = "item|";

/// Post-processing that re-encodes the selected audio stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTranscode {
    pub codec: &'static str,
    pub bitrate_kbps: u32,
}

impl AudioTranscode {
    pub const MP3_192: AudioTranscode = AudioTranscode {
        codec: "mp3",
        bitrate_kbps: 192,
    };
}

/// Everything the engine needs for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub url: String,
    /// Format selector, passed through untouched
    pub format: String,
    /// Absolute output template with engine fields such as `%(title)s`
    pub output_template: PathBuf,
    pub transcode: Option<AudioTranscode>,
    /// Follow playlists and channels instead of a single item
    pub collection: bool,
}

/// A finished item as reported by the engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ItemInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineReport {
    pub items: Vec<ItemInfo>,
}

/// The extraction/download engine the orchestrator drives
#[async_trait]
pub trait Engine {
    /// Check if the engine is available and has all required dependencies
    async fn check_available(&self) -> Result<(), DownloadError>;

    /// Run one download, reporting every progress tick through `hook`.
    ///
    /// When the hook reports cancellation the engine stops and returns
    /// [`DownloadError::Cancelled`].
    async fn run(&self, config: &EngineConfig, hook: ProgressHook<'_>) -> Result<EngineReport, DownloadError>;
}

/// yt-dlp driven as a child process
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl YtDlp {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl Engine for YtDlp {
    async fn check_available(&self) -> Result<(), DownloadError> {
        which::which(&self.binary)
            .map(|_| ())
            .map_err(|_| DownloadError::DependencyNotFound("yt-dlp"))
    }

    async fn run(&self, config: &EngineConfig, hook: ProgressHook<'_>) -> Result<EngineReport, DownloadError> {
        let args = build_args(config);
        tracing::debug!("Running {} {:?}", self.binary.display(), args);

        let mut command = Command::new(&self.binary);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // own process group: a terminal Ctrl-C reaches us, not yt-dlp
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => DownloadError::DependencyNotFound("yt-dlp"),
                _ => DownloadError::Io(e),
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::Unexpected("yt-dlp stdout was not captured".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::Unexpected("yt-dlp stderr was not captured".to_string()))?;

        let stderr_reader = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Err(e) = stderr.read_to_end(&mut buf).await {
                tracing::debug!("Failed to read yt-dlp stderr: {}", e);
            }
            String::from_utf8_lossy(&buf).into_owned()
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut report = EngineReport::default();
        let mut malformed = None;
        let cancel = hook.cancellation();

        loop {
            let line = tokio::select! {
                line = lines.next_line() => line?,
                // don't wait for the next tick when the engine goes quiet
                _ = cancel.cancelled() => None,
            };
            let Some(line) = line else { break };

            match parse_line(&line) {
                Some(EngineLine::Progress(event)) => {
                    if let Err(cancelled) = hook.report(&event) {
                        abort(&mut child).await;
                        return Err(cancelled.into());
                    }
                }
                Some(EngineLine::Item(item)) => {
                    tracing::debug!("yt-dlp finished item {:?}", item);
                    report.items.push(item);
                }
                Some(EngineLine::Malformed(reason)) => {
                    tracing::warn!("Malformed item report from yt-dlp: {}", reason);
                    malformed.get_or_insert(reason);
                }
                None => tracing::trace!("yt-dlp: {}", line),
            }
        }

        if cancel.is_cancelled() {
            abort(&mut child).await;
            return Err(DownloadError::Cancelled);
        }

        let status = child.wait().await?;
        let stderr = stderr_reader.await.unwrap_or_default();

        if !status.success() {
            return Err(DownloadError::Engine(diagnostic(&stderr, status)));
        }

        if let Some(reason) = malformed {
            return Err(DownloadError::Unexpected(format!(
                "Malformed item report from yt-dlp: {reason}"
            )));
        }

        Ok(report)
    }
}

async fn abort(child: &mut Child) {
    if let Err(e) = child.kill().await {
        tracing::warn!("Failed to stop yt-dlp: {}", e);
    }
}

/// Build the yt-dlp command line for a run
pub fn build_args(config: &EngineConfig) -> Vec<String> {
    let mut args = vec![
        "--format".to_string(),
        config.format.clone(),
        "--output".to_string(),
        config.output_template.to_string_lossy().into_owned(),
        "--replace-in-metadata".to_string(),
        "title".to_string(),
        RESERVED_PATTERN.to_string(),
        "_".to_string(),
    ];

    if let Some(transcode) = &config.transcode {
        args.extend([
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            transcode.codec.to_string(),
            "--audio-quality".to_string(),
            format!("{}K", transcode.bitrate_kbps),
        ]);
    }

    args.push(if config.collection { "--yes-playlist" } else { "--no-playlist" }.to_string());

    args.extend([
        "--newline".to_string(),
        "--progress".to_string(),
        "--no-colors".to_string(),
        "--progress-template".to_string(),
        format!("download:{PROGRESS_PREFIX}%(progress.status)s|%(progress._percent_str)s"),
        "--print".to_string(),
        format!("after_move:{ITEM_PREFIX}%(.{{title,ext}})j"),
        "--".to_string(),
        config.url.clone(),
    ]);

    args
}

#[derive(Debug, PartialEq)]
enum EngineLine {
    Progress(ProgressEvent),
    Item(ItemInfo),
    /// An item report that is not valid JSON
    Malformed(String),
}

fn parse_line(line: &str) -> Option<EngineLine> {
    let line = line.trim_end();

    if let Some(rest) = line.strip_prefix(PROGRESS_PREFIX) {
        let (status, percent) = rest.split_once('|').unwrap_or((rest, ""));
        let percent = percent.trim();
        let percent = (!percent.is_empty() && percent != "NA").then(|| percent.to_string());
        return Some(EngineLine::Progress(ProgressEvent {
            status: ProgressStatus::from_engine(status),
            percent,
        }));
    }

    if let Some(rest) = line.strip_prefix(ITEM_PREFIX) {
        return Some(match serde_json::from_str(rest) {
            Ok(item) => EngineLine::Item(item),
            Err(e) => EngineLine::Malformed(format!("{e} in {rest:?}")),
        });
    }

    None
}

/// Error text of a failed run: the `ERROR:` lines, or all of stderr
fn diagnostic(stderr: &str, status: std::process::ExitStatus) -> String {
    let errors: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with("ERROR:"))
        .collect();

    if !errors.is_empty() {
        errors.join("\n")
    } else if !stderr.trim().is_empty() {
        stderr.trim().to_string()
    } else {
        format!("yt-dlp exited with status: {}", status)
    }
}



#[cfg(all(test, unix))]
mod process_tests {
    use super::stub::fake_yt_dlp;
    use super::*;
    use crate::progress::ProgressReporter;
    use assert_matches::assert_matches;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    async fn run_script(body: &str, cancel: &CancellationToken) -> (Result<EngineReport, DownloadError>, f32) {
        let temp_dir = TempDir::new().unwrap();
        let engine = YtDlp::new(fake_yt_dlp(temp_dir.path(), body));
        let config = EngineConfig {
            url: "https://youtu.be/XYZ789".to_string(),
            format: "bv*+ba/best".to_string(),
            output_template: temp_dir.path().join("%(title).255s.%(ext)s"),
            transcode: None,
            collection: false,
        };
        let (reporter, progress) = ProgressReporter::channel();

        let result = tokio::time::timeout(
            Duration::from_secs(10),
            engine.run(&config, ProgressHook::new(&reporter, cancel)),
        )
        .await
        .expect("yt-dlp run did not finish");
        (result, progress.fraction())
    }

    #[tokio::test]
    async fn test_run_reports_progress_and_items() {
        let body = r#"
echo 'progress|downloading|  45.2%'
echo '[download] Destination: somewhere.webm'
echo 'progress|downloading|100.0%'
echo 'item|{"title": "Fake_Clip", "ext": "webm"}'
"#;
        let (result, fraction) = run_script(body, &CancellationToken::new()).await;

        let report = result.unwrap();
        assert_eq!(
            report.items,
            vec![ItemInfo {
                title: Some("Fake_Clip".to_string()),
                ext: Some("webm".to_string()),
            }]
        );
        assert_eq!(fraction, 1.0);
    }

    #[tokio::test]
    async fn test_run_publishes_each_tick() {
        let (result, fraction) =
            run_script("echo 'progress|downloading| 45.2%'", &CancellationToken::new()).await;

        assert_eq!(result.unwrap(), EngineReport::default());
        assert_eq!(fraction, 0.45);
    }

    #[tokio::test]
    async fn test_run_failure_keeps_error_lines() {
        let body = r#"
echo 'progress|downloading|  3.0%'
echo 'WARNING: retrying' >&2
echo 'ERROR: [youtube] XYZ789: Video unavailable' >&2
exit 1
"#;
        let (result, _) = run_script(body, &CancellationToken::new()).await;

        assert_matches!(
            result,
            Err(DownloadError::Engine(msg)) if msg == "ERROR: [youtube] XYZ789: Video unavailable"
        );
    }

    #[tokio::test]
    async fn test_run_failure_with_non_utf8_stderr() {
        let body = r#"
printf 'ERROR: bad \377 bytes\n' >&2
exit 2
"#;
        let (result, _) = run_script(body, &CancellationToken::new()).await;

        assert_matches!(result, Err(DownloadError::Engine(msg)) if msg.starts_with("ERROR: bad "));
    }

    #[tokio::test]
    async fn test_run_rejects_malformed_item_report() {
        let body = r#"
echo 'progress|downloading|100.0%'
echo 'item|{"title": broken'
"#;
        let (result, _) = run_script(body, &CancellationToken::new()).await;

        assert_matches!(result, Err(DownloadError::Unexpected(msg)) if msg.contains("Malformed item report"));
    }

    #[tokio::test]
    async fn test_cancel_stops_a_quiet_child() {
        let body = r#"
echo 'progress|downloading| 10.0%'
exec sleep 30
"#;
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            token.cancel();
        });

        let (result, _) = run_script(body, &cancel).await;

        assert_matches!(result, Err(DownloadError::Cancelled));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_child_leads_its_own_process_group() {
        // field 5 of /proc/<pid>/stat is the process group id
        let body = r#"
read -r stat < /proc/$$/stat
set -- $stat
echo "item|{\"title\": \"$5\", \"ext\": \"$$\"}"
"#;
        let (result, _) = run_script(body, &CancellationToken::new()).await;

        let item = result.unwrap().items.remove(0);
        assert_eq!(item.title, item.ext);
    }
}
