//! Events flowing through a scan session.
//!
//! Decoder callbacks, lookup completions and user intents are all modelled as
//! discrete values delivered to the session controller one at a time.

use serde::{Deserialize, Serialize};

use crate::filter::ProductIdentifier;
use crate::product::LookupOutcome;

/// Identifies one decoder engine instance within a controller's lifetime.
///
/// Every successful start bumps the generation, so events still queued from an
/// engine that has since been torn down can be recognised and dropped.
pub type Generation = u64;

/// The result of a single decode attempt on one camera frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DecodeEvent {
    /// The engine read a barcode and produced its text payload.
    Decoded(String),
    /// No barcode was found in the frame. Expected on most frames.
    NotFound,
    /// The engine failed for a reason other than "nothing in frame".
    EngineError(String),
}

impl DecodeEvent {
    /// Create a decoded event from any string-like payload.
    #[must_use]
    pub fn decoded(text: impl Into<String>) -> Self {
        Self::Decoded(text.into())
    }

    /// Create an engine error event.
    #[must_use]
    pub fn engine_error(detail: impl Into<String>) -> Self {
        Self::EngineError(detail.into())
    }
}

/// Everything the session controller reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// User asked to start scanning.
    StartRequested,
    /// User asked to stop scanning.
    StopRequested,
    /// User closed the product result.
    DismissRequested,
    /// A decoder engine produced a per-frame result.
    Decode {
        /// Engine instance that produced the event.
        generation: Generation,
        /// The decode attempt.
        event: DecodeEvent,
    },
    /// A product lookup finished.
    LookupCompleted {
        /// Identifier the lookup was issued for.
        identifier: ProductIdentifier,
        /// What the lookup service answered.
        outcome: LookupOutcome,
    },
    /// Stop processing events and release the decoder.
    Shutdown,
}
