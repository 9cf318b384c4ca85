//! # Scan Session Controller
//!
//! Owns the session phase and the decoder engine handle, and turns the stream
//! of [`SessionEvent`]s into [`PresentationState`] updates.
//!
//! ```text
//!             startRequested (ok)
//!   ┌──────┐ ─────────────────────▶ ┌──────────┐
//!   │ Idle │                        │ Scanning │ ── decode ─▶ ScanFilter ─▶ lookup task
//!   └──────┘ ◀───────────────────── └──────────┘                              │
//!      ▲       stopRequested / shutdown                                        │
//!      └── startRequested (init failure, lastError set)                        │
//!                                                                              ▼
//!                     lookupCompleted (any phase) ─▶ PresentationState ◀───────┘
//! ```
//!
//! All events are applied one at a time from a single queue. Lookups run as
//! spawned tasks and post their outcome back into the same queue, so decoding
//! never waits on the network and each outcome is applied as one complete
//! transition.

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use serde::Serialize;
use tokio::sync::{mpsc, watch};

use crate::engine::{CameraConstraint, DecodeSink, DecoderConfig, DecoderEngine, DecoderHandle};
use crate::error::{ScanError, ScanResult};
use crate::event::{DecodeEvent, Generation, SessionEvent};
use crate::filter::{ProductIdentifier, ScanFilter};
use crate::lookup::ProductLookup;
use crate::product::LookupOutcome;
use crate::state::{PresentationState, SessionPhase};

/// Settings applied to every decoder engine the session starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Camera to bind.
    pub camera: CameraConstraint,
    /// Engine tuning.
    pub decoder: DecoderConfig,
}

/// Diagnostic counters for one controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Decoded payloads accepted as product identifiers.
    pub frames_accepted: u64,
    /// Decoded payloads rejected as non-numeric.
    pub frames_rejected: u64,
    /// Frames with no barcode.
    pub frames_empty: u64,
    /// Non-benign decoder engine errors.
    pub engine_errors: u64,
    /// Decode events dropped because their engine was no longer active.
    pub stale_events: u64,
    /// Lookups issued.
    pub lookups_started: u64,
    /// Accepted scans skipped because the same identifier was already in flight.
    pub lookups_deduplicated: u64,
}

/// User-facing controls for a running session.
///
/// Cheap to clone; every method just queues an event. Dropping the last
/// clone shuts the session down as if [`shutdown`](Self::shutdown) had been
/// called.
#[derive(Debug, Clone)]
pub struct SessionControls {
    tx: mpsc::UnboundedSender<SessionEvent>,
    _liveness: Arc<ControlsLiveness>,
}

/// Shared by every clone of one [`SessionControls`]; queues a shutdown when
/// the last clone goes away.
#[derive(Debug)]
struct ControlsLiveness {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl Drop for ControlsLiveness {
    fn drop(&mut self) {
        if self.tx.send(SessionEvent::Shutdown).is_ok() {
            tracing::debug!("all session controls dropped; shutting down");
        }
    }
}

impl SessionControls {
    /// Request that scanning starts.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::SessionClosed`] if the controller has shut down.
    pub fn start(&self) -> ScanResult<()> {
        self.send(SessionEvent::StartRequested)
    }

    /// Request that scanning stops.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::SessionClosed`] if the controller has shut down.
    pub fn stop(&self) -> ScanResult<()> {
        self.send(SessionEvent::StopRequested)
    }

    /// Close the product result.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::SessionClosed`] if the controller has shut down.
    pub fn dismiss(&self) -> ScanResult<()> {
        self.send(SessionEvent::DismissRequested)
    }

    /// Stop the controller's event loop, releasing the decoder.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::SessionClosed`] if the controller has shut down.
    pub fn shutdown(&self) -> ScanResult<()> {
        self.send(SessionEvent::Shutdown)
    }

    fn send(&self, event: SessionEvent) -> ScanResult<()> {
        self.tx.send(event).map_err(|_| ScanError::SessionClosed)
    }
}

/// The scan-session state machine.
pub struct ScanSessionController {
    engine: Arc<dyn DecoderEngine>,
    lookup: Arc<dyn ProductLookup>,
    config: SessionConfig,
    /// Present iff an engine is running.
    decoder: Option<Box<dyn DecoderHandle>>,
    generation: Generation,
    in_flight: HashSet<ProductIdentifier>,
    presentation: PresentationState,
    published: watch::Sender<PresentationState>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    liveness: Weak<ControlsLiveness>,
    stats: SessionStats,
    closed: bool,
}

impl ScanSessionController {
    /// Create an idle controller.
    #[must_use]
    pub fn new(
        engine: Arc<dyn DecoderEngine>,
        lookup: Arc<dyn ProductLookup>,
        config: SessionConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let presentation = PresentationState::new();
        let (published, _) = watch::channel(presentation.clone());
        Self {
            engine,
            lookup,
            config,
            decoder: None,
            generation: 0,
            in_flight: HashSet::new(),
            presentation,
            published,
            events_tx,
            events_rx,
            liveness: Weak::new(),
            stats: SessionStats::default(),
            closed: false,
        }
    }

    /// Controls that feed user intents into this controller.
    ///
    /// All controls handed out while any of them is alive share one liveness
    /// token. Once every one of them is dropped, the controller shuts down.
    #[must_use]
    pub fn controls(&mut self) -> SessionControls {
        let liveness = self.liveness.upgrade().unwrap_or_else(|| {
            let liveness = Arc::new(ControlsLiveness {
                tx: self.events_tx.clone(),
            });
            self.liveness = Arc::downgrade(&liveness);
            liveness
        });
        SessionControls {
            tx: self.events_tx.clone(),
            _liveness: liveness,
        }
    }

    /// Observe every published presentation update.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PresentationState> {
        self.published.subscribe()
    }

    /// Current presentation state.
    #[must_use]
    pub fn presentation(&self) -> &PresentationState {
        &self.presentation
    }

    /// Current session phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.presentation.phase
    }

    /// Diagnostic counters.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Whether a decoder engine is currently held.
    #[must_use]
    pub fn has_decoder(&self) -> bool {
        self.decoder.is_some()
    }

    /// Number of lookups that have not reported back yet.
    #[must_use]
    pub fn lookups_in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Process events until shutdown is requested or every [`SessionControls`]
    /// has been dropped, then release the decoder.
    ///
    /// Call [`controls`](Self::controls) before handing the controller to
    /// `run`; a controller that never gave out controls has nobody to stop it.
    pub async fn run(mut self) {
        while self.step().await {}
        self.finalize_decoder().await;
        tracing::info!(stats = ?self.stats, "scan session closed");
    }

    /// Wait for the next queued event and apply it.
    ///
    /// Returns `false` once the controller has shut down.
    pub async fn step(&mut self) -> bool {
        if self.closed {
            return false;
        }
        match self.events_rx.recv().await {
            Some(event) => {
                self.dispatch(event).await;
                !self.closed
            }
            None => false,
        }
    }

    /// Apply a single event.
    pub async fn dispatch(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::StartRequested => self.start_scanning().await,
            SessionEvent::StopRequested => self.stop_scanning().await,
            SessionEvent::DismissRequested => {
                if self.presentation.dismiss() {
                    self.publish();
                }
            }
            SessionEvent::Decode { generation, event } => self.on_decode(generation, event),
            SessionEvent::LookupCompleted {
                identifier,
                outcome,
            } => self.on_lookup_completed(&identifier, &outcome),
            SessionEvent::Shutdown => {
                self.stop_scanning().await;
                self.closed = true;
                self.events_rx.close();
            }
        }
    }

    async fn start_scanning(&mut self) {
        if self.decoder.is_some() {
            tracing::info!("start requested while scanning; releasing current decoder first");
            self.finalize_decoder().await;
        }

        self.generation += 1;
        let sink = DecodeSink::new(self.generation, self.events_tx.clone());
        match self
            .engine
            .start(self.config.camera, self.config.decoder, sink)
            .await
        {
            Ok(handle) => {
                self.decoder = Some(handle);
                self.presentation.phase = SessionPhase::Scanning;
                self.presentation.last_error = None;
                tracing::info!(generation = self.generation, "scanning started");
            }
            Err(e) => {
                tracing::error!("Initialization Error: {e}");
                self.presentation.phase = SessionPhase::Idle;
                self.presentation.last_error = Some(format!("Initialization Error: {e}"));
            }
        }
        self.publish();
    }

    async fn stop_scanning(&mut self) {
        if self.decoder.is_none() && self.presentation.phase == SessionPhase::Idle {
            tracing::debug!("stop requested while idle");
            return;
        }
        self.finalize_decoder().await;
        tracing::info!(generation = self.generation, "scanning stopped");
        self.publish();
    }

    /// Release the decoder, if any. The phase is Idle afterwards no matter
    /// how teardown went.
    async fn finalize_decoder(&mut self) {
        if let Some(mut decoder) = self.decoder.take() {
            if let Err(e) = decoder.stop().await {
                tracing::error!("Scanner cleanup error: {e}");
            }
        }
        self.presentation.phase = SessionPhase::Idle;
    }

    fn on_decode(&mut self, generation: Generation, event: DecodeEvent) {
        if self.presentation.phase != SessionPhase::Scanning || generation != self.generation {
            self.stats.stale_events += 1;
            tracing::trace!(
                generation,
                current = self.generation,
                "dropping decode event from inactive decoder"
            );
            return;
        }

        if let Some(identifier) = ScanFilter::accept(&event) {
            self.stats.frames_accepted += 1;
            tracing::debug!(%identifier, "scanned");
            self.request_lookup(identifier);
            return;
        }

        match event {
            DecodeEvent::NotFound => self.stats.frames_empty += 1,
            DecodeEvent::Decoded(text) => {
                self.stats.frames_rejected += 1;
                tracing::debug!(payload = %text, "ignoring non-numeric barcode");
            }
            DecodeEvent::EngineError(detail) => {
                self.stats.engine_errors += 1;
                tracing::warn!("Camera Error: {detail}");
            }
        }
    }

    fn request_lookup(&mut self, identifier: ProductIdentifier) {
        if !self.in_flight.insert(identifier.clone()) {
            self.stats.lookups_deduplicated += 1;
            tracing::trace!(%identifier, "lookup already in flight");
            return;
        }
        self.stats.lookups_started += 1;

        let lookup = Arc::clone(&self.lookup);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = lookup.lookup(&identifier).await;
            if tx
                .send(SessionEvent::LookupCompleted {
                    identifier,
                    outcome,
                })
                .is_err()
            {
                tracing::debug!("session closed before lookup completed");
            }
        });
    }

    fn on_lookup_completed(&mut self, identifier: &ProductIdentifier, outcome: &LookupOutcome) {
        self.in_flight.remove(identifier);

        let outcome_kind = outcome.kind();
        match outcome {
            LookupOutcome::Found(record) => {
                tracing::info!(
                    %identifier,
                    outcome = outcome_kind,
                    name = record.name(),
                    "product found"
                );
            }
            LookupOutcome::NotFound => {
                tracing::info!(%identifier, outcome = outcome_kind, "no product data available");
            }
            LookupOutcome::TransientError(detail) => {
                tracing::warn!(
                    %identifier,
                    outcome = outcome_kind,
                    "product lookup failed: {detail}"
                );
            }
        }

        if self.presentation.apply_outcome(identifier, outcome) {
            self.publish();
        }
    }

    fn publish(&self) {
        self.published.send_replace(self.presentation.clone());
    }
}

impl Drop for ScanSessionController {
    fn drop(&mut self) {
        if self.decoder.is_some() {
            tracing::warn!("scan session dropped while scanning; decoder was not stopped");
        }
    }
}
