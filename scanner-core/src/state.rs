//! Presentation state consumed by renderers.

use serde::{Deserialize, Serialize};

use crate::filter::ProductIdentifier;
use crate::product::{LookupOutcome, ProductRecord};

/// Whether a decoder engine is bound to the camera.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// No decoder engine exists.
    #[default]
    Idle,
    /// A decoder engine is consuming camera frames.
    Scanning,
}

/// View-state projection of a scan session.
///
/// Only the session controller mutates this; rendering reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationState {
    /// Current session phase.
    pub phase: SessionPhase,
    /// User-visible error message, if any.
    pub last_error: Option<String>,
    /// Most recently resolved product.
    pub last_product: Option<ProductRecord>,
    /// Whether the product result is being shown.
    pub modal_open: bool,
}

impl PresentationState {
    /// Create the initial, idle state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the outcome of a lookup for `identifier`. Returns whether anything changed.
    ///
    /// `Found` replaces the product, opens the modal and clears the error.
    /// `TransientError` sets the error and leaves the product alone.
    /// `NotFound` changes nothing.
    pub fn apply_outcome(
        &mut self,
        identifier: &ProductIdentifier,
        outcome: &LookupOutcome,
    ) -> bool {
        match outcome {
            LookupOutcome::Found(record) => {
                self.last_product = Some(record.clone());
                self.modal_open = true;
                self.last_error = None;
                true
            }
            LookupOutcome::NotFound => false,
            LookupOutcome::TransientError(detail) => {
                self.last_error = Some(format!("Lookup failed for {identifier}: {detail}"));
                true
            }
        }
    }

    /// Close the product modal. The product itself is kept.
    pub fn dismiss(&mut self) -> bool {
        std::mem::replace(&mut self.modal_open, false)
    }

    /// The product to render in the modal, if it is open.
    #[must_use]
    pub fn showing_product(&self) -> Option<&ProductRecord> {
        if self.modal_open {
            self.last_product.as_ref()
        } else {
            None
        }
    }
}
