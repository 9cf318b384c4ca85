//! Decoder engine for line-oriented barcode readers.
//!
//! Hardware readers decode on their own and send one code per line, either
//! over a serial device or as keystrokes. With a device path the engine reads
//! it on a background task; without one, lines typed on stdin are handed over
//! through [`LineDecoderEngine::feed_line`].

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use scanner_core::{
    CameraConstraint, DecodeEvent, DecodeSink, DecoderConfig, DecoderEngine, DecoderHandle,
    Generation, ScanError, ScanResult,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

/// Admits at most one decode attempt per interval.
#[derive(Debug, Clone)]
pub struct RateGate {
    interval: Duration,
    last: Option<Instant>,
}

impl RateGate {
    /// Gate with the given minimum spacing.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Whether an attempt at `now` may go through. Admitted attempts reset
    /// the interval.
    pub fn admit(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// Sink plus rate limit for the engine instance currently running.
#[derive(Debug)]
struct Feed {
    sink: DecodeSink,
    gate: RateGate,
}

impl Feed {
    fn deliver(&mut self, line: &str) -> bool {
        if !self.gate.admit(Instant::now()) {
            tracing::trace!("line arrived faster than the scan rate; skipped");
            return true;
        }
        let event = if line.is_empty() {
            DecodeEvent::NotFound
        } else {
            DecodeEvent::decoded(line)
        };
        self.sink.emit(event)
    }
}

type SharedFeed = Arc<Mutex<Option<Feed>>>;

/// Deliver a line read by the engine instance of `generation`.
///
/// Returns `false` once that instance's feed has been cleared or replaced by
/// a later start, which tells its reader to stop.
fn deliver_from(feed: &SharedFeed, generation: Generation, line: &str) -> bool {
    let Ok(mut guard) = feed.lock() else {
        return false;
    };
    match guard.as_mut() {
        Some(current) if current.sink.generation() == generation => current.deliver(line),
        _ => false,
    }
}

/// Decoder engine backed by a serial device or by stdin.
#[derive(Debug, Clone, Default)]
pub struct LineDecoderEngine {
    device: Option<PathBuf>,
    feed: SharedFeed,
}

impl LineDecoderEngine {
    /// Engine reading codes from `device`, or from [`feed_line`](Self::feed_line)
    /// when `None`.
    #[must_use]
    pub fn new(device: Option<PathBuf>) -> Self {
        Self {
            device,
            feed: Arc::default(),
        }
    }

    /// Hand a line typed on stdin to the running engine.
    ///
    /// Returns `false` when no stdin-fed engine is running.
    pub fn feed_line(&self, line: &str) -> bool {
        let Ok(mut feed) = self.feed.lock() else {
            return false;
        };
        match feed.as_mut() {
            Some(feed) => feed.deliver(line.trim()),
            None => false,
        }
    }

    async fn spawn_device_reader(
        path: &Path,
        feed: SharedFeed,
        generation: Generation,
    ) -> ScanResult<JoinHandle<()>> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| ScanError::CameraUnavailable(format!("{}: {e}", path.display())))?;
        let path = path.to_path_buf();

        Ok(tokio::spawn(async move {
            let mut lines = BufReader::new(file).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if !deliver_from(&feed, generation, line.trim()) {
                            break;
                        }
                    }
                    Ok(None) => {
                        tracing::info!(device = %path.display(), "barcode reader closed");
                        break;
                    }
                    Err(e) => {
                        if let Ok(guard) = feed.lock() {
                            if let Some(current) = guard
                                .as_ref()
                                .filter(|f| f.sink.generation() == generation)
                            {
                                current.sink.emit(DecodeEvent::engine_error(e.to_string()));
                            }
                        }
                        break;
                    }
                }
            }
        }))
    }
}

#[async_trait]
impl DecoderEngine for LineDecoderEngine {
    async fn start(
        &self,
        camera: CameraConstraint,
        config: DecoderConfig,
        sink: DecodeSink,
    ) -> ScanResult<Box<dyn DecoderHandle>> {
        let generation = sink.generation();
        tracing::debug!(
            generation,
            facing = ?camera.facing_mode,
            fps = config.scan_rate_fps,
            region = ?config.decode_region,
            "starting line decoder"
        );

        {
            let mut feed = self
                .feed
                .lock()
                .map_err(|_| ScanError::Initialization("decoder state poisoned".into()))?;
            *feed = Some(Feed {
                sink,
                gate: RateGate::new(config.frame_interval()),
            });
        }

        let reader = match &self.device {
            Some(path) => match Self::spawn_device_reader(path, Arc::clone(&self.feed), generation)
                .await
            {
                Ok(reader) => Some(reader),
                Err(e) => {
                    if let Ok(mut feed) = self.feed.lock() {
                        *feed = None;
                    }
                    return Err(e);
                }
            },
            None => None,
        };

        Ok(Box::new(LineDecoderHandle {
            feed: Arc::clone(&self.feed),
            reader,
        }))
    }
}

struct LineDecoderHandle {
    feed: SharedFeed,
    reader: Option<JoinHandle<()>>,
}

#[async_trait]
impl DecoderHandle for LineDecoderHandle {
    async fn stop(&mut self) -> ScanResult<()> {
        if let Some(reader) = self.reader.take() {
            reader.abort();
            if let Err(e) = reader.await {
                if !e.is_cancelled() {
                    tracing::warn!("barcode reader task failed: {e}");
                }
            }
        }
        let mut feed = self
            .feed
            .lock()
            .map_err(|_| ScanError::Teardown("decoder state poisoned".into()))?;
        *feed = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanner_core::{
        LookupOutcome, ProductIdentifier, ProductLookup, ScanSessionController, SessionConfig,
        SessionEvent, SessionPhase,
    };
    use std::io::Write;

    struct NoProducts;

    #[async_trait]
    impl ProductLookup for NoProducts {
        async fn lookup(&self, _identifier: &ProductIdentifier) -> LookupOutcome {
            LookupOutcome::NotFound
        }
    }

    fn controller(engine: &LineDecoderEngine) -> ScanSessionController {
        ScanSessionController::new(
            Arc::new(engine.clone()),
            Arc::new(NoProducts),
            SessionConfig::default(),
        )
    }

    #[test]
    fn test_rate_gate_spacing() {
        let mut gate = RateGate::new(Duration::from_millis(100));
        let t0 = Instant::now();
        assert!(gate.admit(t0));
        assert!(!gate.admit(t0 + Duration::from_millis(50)));
        assert!(gate.admit(t0 + Duration::from_millis(100)));
        assert!(!gate.admit(t0 + Duration::from_millis(150)));
    }

    #[tokio::test]
    async fn test_stdin_feed_only_while_running() {
        let engine = LineDecoderEngine::new(None);
        let mut controller = controller(&engine);
        assert!(!engine.feed_line("3017620422003"));

        controller.dispatch(SessionEvent::StartRequested).await;
        assert_eq!(controller.phase(), SessionPhase::Scanning);
        assert!(engine.feed_line("3017620422003\n"));
        controller.step().await;
        assert_eq!(controller.stats().frames_accepted, 1);

        controller.dispatch(SessionEvent::StopRequested).await;
        assert!(!engine.feed_line("3017620422003"));
    }

    #[tokio::test]
    async fn test_missing_device_is_an_initialization_error() {
        let engine = LineDecoderEngine::new(Some(PathBuf::from("/nonexistent/ttyACM9")));
        let mut controller = controller(&engine);

        controller.dispatch(SessionEvent::StartRequested).await;

        assert_eq!(controller.phase(), SessionPhase::Idle);
        let error = controller.presentation().last_error.clone().unwrap();
        assert!(error.starts_with("Initialization Error:"));
        assert!(error.contains("ttyACM9"));
        assert!(!engine.feed_line("123"));
    }

    #[tokio::test]
    async fn test_device_lines_become_decode_events() {
        let mut device = tempfile::NamedTempFile::new().unwrap();
        writeln!(device, "5000112637922").unwrap();
        device.flush().unwrap();

        let engine = LineDecoderEngine::new(Some(device.path().to_path_buf()));
        let mut controller = controller(&engine);
        controller.dispatch(SessionEvent::StartRequested).await;

        controller.step().await;
        assert_eq!(controller.stats().frames_accepted, 1);

        controller.dispatch(SessionEvent::StopRequested).await;
        assert!(!controller.has_decoder());
    }

    #[tokio::test]
    async fn test_replaced_reader_cannot_feed_new_start() {
        let engine = LineDecoderEngine::new(None);
        let mut controller = controller(&engine);

        controller.dispatch(SessionEvent::StartRequested).await;
        controller.dispatch(SessionEvent::StartRequested).await;

        assert!(!deliver_from(&engine.feed, 1, "5000112637922"));
        assert!(deliver_from(&engine.feed, 2, "5000112637922"));
        controller.step().await;
        assert_eq!(controller.stats().frames_accepted, 1);
        assert_eq!(controller.stats().stale_events, 0);

        controller.dispatch(SessionEvent::StopRequested).await;
        assert!(!deliver_from(&engine.feed, 2, "5000112637922"));
    }
}
