//! Product lookup capability.

use async_trait::async_trait;

use crate::filter::ProductIdentifier;
use crate::product::LookupOutcome;

/// Resolves product identifiers against an external product database.
///
/// Implementations make a single attempt per call and fold every failure into
/// [`LookupOutcome::TransientError`]; retrying is the caller's business.
#[async_trait]
pub trait ProductLookup: Send + Sync {
    /// Look up one product.
    async fn lookup(&self, identifier: &ProductIdentifier) -> LookupOutcome;
}
