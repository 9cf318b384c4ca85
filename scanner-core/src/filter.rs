//! Validation of raw decoder output.
//!
//! The lookup service indexes products by fully numeric identifiers, so only
//! decoded payloads made entirely of ASCII digits become lookup candidates.
//! URLs, alphanumeric codes and empty payloads are rejected.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::DecodeEvent;

/// A validated, non-empty, all-digit product identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductIdentifier(String);

impl ProductIdentifier {
    /// The identifier as it will appear in the lookup request.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProductIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ProductIdentifier> for String {
    fn from(id: ProductIdentifier) -> Self {
        id.0
    }
}

/// Returned when text does not qualify as a [`ProductIdentifier`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a numeric product identifier: {0:?}")]
pub struct InvalidIdentifier(pub String);

impl TryFrom<String> for ProductIdentifier {
    type Error = InvalidIdentifier;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        if is_numeric_identifier(&text) {
            Ok(Self(text))
        } else {
            Err(InvalidIdentifier(text))
        }
    }
}

/// Stateless gate between the decoder engine and the lookup client.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanFilter;

impl ScanFilter {
    /// Turn a decode attempt into a lookup candidate, if it is one.
    ///
    /// `NotFound` and `EngineError` never produce a candidate; a `Decoded`
    /// payload does iff it is non-empty and every character is a decimal digit.
    #[must_use]
    pub fn accept(event: &DecodeEvent) -> Option<ProductIdentifier> {
        match event {
            DecodeEvent::Decoded(text) if is_numeric_identifier(text) => {
                Some(ProductIdentifier(text.clone()))
            }
            DecodeEvent::Decoded(_) | DecodeEvent::NotFound | DecodeEvent::EngineError(_) => None,
        }
    }
}

fn is_numeric_identifier(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}
