//! # Scanner Core
//!
//! Scan-session lifecycle and result reconciliation for the barcode product
//! scanner. Camera decoding and the product database are consumed through the
//! [`DecoderEngine`] and [`ProductLookup`] traits, so everything here runs
//! without a camera or a network.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  ScanSessionController                   │
//! ├──────────────────────────────────────────────────────────┤
//! │  DecoderEngine ──▶ DecodeEvent ──▶ ScanFilter            │
//! │                                       │                  │
//! │                          ProductIdentifier               │
//! │                                       ▼                  │
//! │  PresentationState ◀── LookupOutcome ◀── ProductLookup   │
//! └──────────────────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod engine;
pub mod error;
pub mod event;
pub mod filter;
pub mod lookup;
pub mod product;
pub mod session;
pub mod state;

pub use engine::{
    CameraConstraint, DecodeSink, DecoderConfig, DecoderEngine, DecoderHandle, FacingMode,
    RegionSize,
};
pub use error::{ScanError, ScanResult};
pub use event::{DecodeEvent, Generation, SessionEvent};
pub use filter::{InvalidIdentifier, ProductIdentifier, ScanFilter};
pub use lookup::ProductLookup;
pub use product::{LookupOutcome, OriginSources, ProductRecord, NO_NAME_FALLBACK};
pub use session::{ScanSessionController, SessionConfig, SessionControls, SessionStats};
pub use state::{PresentationState, SessionPhase};

/// Scanner core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
