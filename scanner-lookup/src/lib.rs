//! # Scanner Lookup
//!
//! Client for the Open Food Facts product API. Resolves a scanned
//! [`ProductIdentifier`](scanner_core::ProductIdentifier) into a
//! [`ProductRecord`](scanner_core::ProductRecord) with a single HTTP round trip
//! and implements [`ProductLookup`](scanner_core::ProductLookup) for the scan
//! session controller.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod client;
mod payload;

pub use client::{LookupClient, LookupConfig, LookupError, DEFAULT_LOOKUP_URL};
