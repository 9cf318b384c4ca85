//! In-memory decoder engine and lookup service for session tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use scanner_core::{
    CameraConstraint, DecodeEvent, DecodeSink, DecoderConfig, DecoderEngine, DecoderHandle,
    LookupOutcome, OriginSources, ProductIdentifier, ProductLookup, ProductRecord, ScanError,
    ScanFilter, ScanResult,
};
use tokio::sync::Notify;

/// Build a validated identifier for test fixtures.
pub fn id(code: &str) -> ProductIdentifier {
    ScanFilter::accept(&DecodeEvent::decoded(code)).expect("numeric test identifier")
}

/// Build a found outcome with only a name.
pub fn found(code: &str, name: &str) -> LookupOutcome {
    LookupOutcome::Found(ProductRecord::new(
        id(code),
        Some(name),
        None,
        &OriginSources::default(),
    ))
}

#[derive(Debug, Default)]
struct EngineState {
    starts: usize,
    active: usize,
    max_active: usize,
    sinks: Vec<DecodeSink>,
    fail_next_start: Option<String>,
    fail_stops: bool,
}

/// Decoder engine that records how many instances are bound at once.
#[derive(Debug, Clone, Default)]
pub struct FakeEngine {
    state: Arc<Mutex<EngineState>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next start fail as if camera access was denied.
    pub fn fail_next_start(&self, reason: &str) {
        self.state.lock().unwrap().fail_next_start = Some(reason.to_string());
    }

    /// Make every stop report a teardown failure.
    pub fn fail_stops(&self) {
        self.state.lock().unwrap().fail_stops = true;
    }

    /// Sink handed to the most recently started engine.
    pub fn last_sink(&self) -> DecodeSink {
        self.state
            .lock()
            .unwrap()
            .sinks
            .last()
            .cloned()
            .expect("engine was started")
    }

    pub fn starts(&self) -> usize {
        self.state.lock().unwrap().starts
    }

    pub fn active(&self) -> usize {
        self.state.lock().unwrap().active
    }

    pub fn max_active(&self) -> usize {
        self.state.lock().unwrap().max_active
    }
}

#[async_trait]
impl DecoderEngine for FakeEngine {
    async fn start(
        &self,
        _camera: CameraConstraint,
        _config: DecoderConfig,
        sink: DecodeSink,
    ) -> ScanResult<Box<dyn DecoderHandle>> {
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = state.fail_next_start.take() {
            return Err(ScanError::CameraUnavailable(reason));
        }
        state.starts += 1;
        state.active += 1;
        state.max_active = state.max_active.max(state.active);
        state.sinks.push(sink);
        Ok(Box::new(FakeHandle {
            state: Arc::clone(&self.state),
            stopped: false,
        }))
    }
}

struct FakeHandle {
    state: Arc<Mutex<EngineState>>,
    stopped: bool,
}

#[async_trait]
impl DecoderHandle for FakeHandle {
    async fn stop(&mut self) -> ScanResult<()> {
        let mut state = self.state.lock().unwrap();
        if !self.stopped {
            self.stopped = true;
            state.active -= 1;
        }
        if state.fail_stops {
            return Err(ScanError::Teardown("video track already ended".into()));
        }
        Ok(())
    }
}

/// Lookup service answering from a fixed table, optionally held behind a gate.
#[derive(Default)]
pub struct ScriptedLookup {
    answers: Mutex<HashMap<String, LookupOutcome>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: AtomicUsize,
}

impl ScriptedLookup {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn answer(&self, code: &str, outcome: LookupOutcome) {
        self.answers
            .lock()
            .unwrap()
            .insert(code.to_string(), outcome);
    }

    /// Hold lookups for `code` until the returned notifier fires.
    pub fn gate(&self, code: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(code.to_string(), Arc::clone(&notify));
        notify
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProductLookup for ScriptedLookup {
    async fn lookup(&self, identifier: &ProductIdentifier) -> LookupOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().get(identifier.as_str()).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.answers
            .lock()
            .unwrap()
            .get(identifier.as_str())
            .cloned()
            .unwrap_or(LookupOutcome::NotFound)
    }
}
