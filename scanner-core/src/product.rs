//! Resolved product records and lookup outcomes.

use serde::{Deserialize, Serialize};

use crate::filter::ProductIdentifier;

/// Display name used when the lookup service has no product name.
pub const NO_NAME_FALLBACK: &str = "(No name found)";

/// A product resolved by a successful lookup.
///
/// Records are immutable once built; a later scan replaces the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    identifier: ProductIdentifier,
    name: String,
    image_url: Option<String>,
    origin_label: Option<String>,
}

impl ProductRecord {
    /// Build a record from the raw fields a lookup produced.
    ///
    /// Empty strings count as missing: an empty name becomes
    /// [`NO_NAME_FALLBACK`] and an empty image URL becomes `None`.
    #[must_use]
    pub fn new(
        identifier: ProductIdentifier,
        name: Option<&str>,
        image_url: Option<&str>,
        origin: &OriginSources<'_>,
    ) -> Self {
        Self {
            identifier,
            name: non_empty(name).unwrap_or(NO_NAME_FALLBACK).to_string(),
            image_url: non_empty(image_url).map(str::to_string),
            origin_label: origin.label(),
        }
    }

    /// The scanned identifier this record was resolved from.
    #[must_use]
    pub fn identifier(&self) -> &ProductIdentifier {
        &self.identifier
    }

    /// Product display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Front-of-pack image, if the service has one.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    /// Human-readable origin, or `None` when no country signal exists.
    #[must_use]
    pub fn origin_label(&self) -> Option<&str> {
        self.origin_label.as_deref()
    }
}

/// Country-related fields of a product payload, in raw form.
#[derive(Debug, Clone, Copy, Default)]
pub struct OriginSources<'a> {
    /// Free-text origins of the ingredients.
    pub origins: Option<&'a str>,
    /// Free-text manufacturing places.
    pub manufacturing_places: Option<&'a str>,
    /// Taxonomy tags such as `en:france`, most relevant first.
    pub countries_tags: &'a [String],
}

impl OriginSources<'_> {
    /// Derive the origin label.
    ///
    /// Precedence: non-empty `origins`, then non-empty `manufacturing_places`,
    /// then the first country tag with its `xx:` language prefix removed and
    /// capitalized. `None` if none of them yields text.
    #[must_use]
    pub fn label(&self) -> Option<String> {
        if let Some(origins) = non_empty(self.origins) {
            return Some(origins.to_string());
        }
        if let Some(places) = non_empty(self.manufacturing_places) {
            return Some(places.to_string());
        }
        self.countries_tags
            .first()
            .map(|tag| capitalize(strip_language_prefix(tag)))
            .filter(|label| !label.is_empty())
    }
}

/// Remove a leading two-letter language code such as `en:` or `fr:`.
fn strip_language_prefix(tag: &str) -> &str {
    match tag.as_bytes() {
        [a, b, b':', ..] if a.is_ascii_alphabetic() && b.is_ascii_alphabetic() => &tag[3..],
        _ => tag,
    }
}

/// Uppercase the first character and lowercase the rest.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// What a single lookup attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The service knows the product.
    Found(ProductRecord),
    /// The service answered but has no product for the identifier.
    NotFound,
    /// Bad status, network failure or malformed payload.
    TransientError(String),
}

impl LookupOutcome {
    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Found(_) => "found",
            Self::NotFound => "not_found",
            Self::TransientError(_) => "transient_error",
        }
    }
}
