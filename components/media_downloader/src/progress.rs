// components/media_downloader/src/progress.rs
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::types::{Cancelled, ProgressEvent, ProgressStatus};

/// Turns engine progress ticks into a fraction in `[0.0, 1.0]`.
///
/// Only the latest fraction is kept; readers never see a backlog.
#[derive(Debug)]
pub struct ProgressReporter {
    tx: watch::Sender<f32>,
}

/// Read side of a [`ProgressReporter`]
#[derive(Debug, Clone)]
pub struct ProgressWatch {
    rx: watch::Receiver<f32>,
}

impl ProgressReporter {
    pub fn channel() -> (Self, ProgressWatch) {
        let (tx, rx) = watch::channel(0.0);
        (Self { tx }, ProgressWatch { rx })
    }

    /// Handle one engine tick.
    ///
    /// Fails with [`Cancelled`] when the user asked to stop; the engine has to
    /// abandon the download when it sees that.
    pub fn on_progress(&self, event: &ProgressEvent, cancel_requested: bool) -> Result<(), Cancelled> {
        if cancel_requested {
            return Err(Cancelled);
        }

        if event.status != ProgressStatus::Downloading {
            return Ok(());
        }

        if let Some(raw) = &event.percent {
            self.publish(parse_fraction(raw).unwrap_or(0.0));
        }
        Ok(())
    }

    fn publish(&self, fraction: f32) {
        // send_replace never fails, even after every reader is gone
        self.tx.send_replace(fraction);
    }
}

impl ProgressWatch {
    /// Last published fraction
    pub fn fraction(&self) -> f32 {
        *self.rx.borrow()
    }

    /// Wait for the next publish. Returns `None` once the reporter is dropped.
    pub async fn changed(&mut self) -> Option<f32> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}

/// Parse engine percentage text such as `" 45.2%"` into `0.45`.
///
/// Keeps digits, the decimal point and `%`, drops the `%` and uses the whole
/// percent only.
pub fn parse_fraction(raw: &str) -> Option<f32> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '%')
        .collect();
    let number = cleaned.trim_end_matches('%');
    let whole = number.split('.').next().unwrap_or_default();
    let percent: u32 = whole.parse().ok()?;
    Some((percent as f32 / 100.0).clamp(0.0, 1.0))
}

/// What the engine calls on every progress tick of one download.
///
/// Pairs the reporter with the download's cancellation token, so the token is
/// checked on each callback.
#[derive(Debug, Clone, Copy)]
pub struct ProgressHook<'a> {
    reporter: &'a ProgressReporter,
    cancel: &'a CancellationToken,
}

impl<'a> ProgressHook<'a> {
    pub fn new(reporter: &'a ProgressReporter, cancel: &'a CancellationToken) -> Self {
        Self { reporter, cancel }
    }

    pub fn report(&self, event: &ProgressEvent) -> Result<(), Cancelled> {
        self.reporter.on_progress(event, self.cancel.is_cancelled())
    }

    /// Token of the running download, for engines that can also react between ticks
    pub fn cancellation(&self) -> &'a CancellationToken {
        self.cancel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("45.2%", Some(0.45))]
    #[case(" 45.2%", Some(0.45))]
    #[case("100.0%", Some(1.0))]
    #[case("0.0%", Some(0.0))]
    #[case("7%", Some(0.07))]
    #[case("--%", None)]
    #[case("NA", None)]
    #[case("", None)]
    fn test_parse_fraction(#[case] raw: &str, #[case] expected: Option<f32>) {
        assert_eq!(parse_fraction(raw), expected);
    }

    #[test]
    fn test_downloading_publishes_fraction() {
        let (reporter, watch) = ProgressReporter::channel();
        reporter
            .on_progress(&ProgressEvent::downloading("45.2%"), false)
            .unwrap();
        assert_eq!(watch.fraction(), 0.45);
    }

    #[test]
    fn test_unparseable_publishes_zero() {
        let (reporter, watch) = ProgressReporter::channel();
        reporter
            .on_progress(&ProgressEvent::downloading("50.0%"), false)
            .unwrap();
        reporter
            .on_progress(&ProgressEvent::downloading("--%"), false)
            .unwrap();
        assert_eq!(watch.fraction(), 0.0);
    }

    #[test]
    fn test_other_status_does_not_publish() {
        let (reporter, watch) = ProgressReporter::channel();
        reporter
            .on_progress(&ProgressEvent::downloading("30%"), false)
            .unwrap();

        let finished = ProgressEvent {
            status: ProgressStatus::Other,
            percent: Some("100%".to_string()),
        };
        reporter.on_progress(&finished, false).unwrap();
        reporter.on_progress(&ProgressEvent::other(), false).unwrap();
        assert_eq!(watch.fraction(), 0.3);
    }

    #[tokio::test]
    async fn test_missing_percent_does_not_publish() {
        let (reporter, mut watch) = ProgressReporter::channel();
        let event = ProgressEvent {
            status: ProgressStatus::Downloading,
            percent: None,
        };
        reporter.on_progress(&event, false).unwrap();
        assert!(!watch.rx.has_changed().unwrap());
        assert_eq!(watch.fraction(), 0.0);
        drop(reporter);
        assert!(watch.changed().await.is_none());
    }

    #[test]
    fn test_cancel_request_aborts() {
        let (reporter, watch) = ProgressReporter::channel();
        let result = reporter.on_progress(&ProgressEvent::downloading("10%"), true);
        assert_eq!(result, Err(Cancelled));
        assert_eq!(watch.fraction(), 0.0);
    }

    #[test]
    fn test_hook_checks_token_each_tick() {
        let (reporter, watch) = ProgressReporter::channel();
        let cancel = CancellationToken::new();
        let hook = ProgressHook::new(&reporter, &cancel);

        assert!(hook.report(&ProgressEvent::downloading("20%")).is_ok());
        cancel.cancel();
        assert_eq!(hook.report(&ProgressEvent::downloading("40%")), Err(Cancelled));
        assert_eq!(watch.fraction(), 0.2);
    }

    #[tokio::test]
    async fn test_watch_sees_latest_value() {
        let (reporter, mut watch) = ProgressReporter::channel();
        for pct in ["10%", "20%", "30%"] {
            reporter
                .on_progress(&ProgressEvent::downloading(pct), false)
                .unwrap();
        }
        assert_eq!(watch.changed().await, Some(0.3));
    }
}
