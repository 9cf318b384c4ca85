//! Text and JSON projections of the presentation state.

use std::fmt::Write as _;

use scanner_core::{PresentationState, SessionPhase};

/// Human-readable rendering.
#[must_use]
pub fn render_text(state: &PresentationState) -> String {
    let mut out = String::new();
    let phase = match state.phase {
        SessionPhase::Idle => "idle - type `start` to scan",
        SessionPhase::Scanning => "scanning - type `stop` to finish",
    };
    let _ = writeln!(out, "[{phase}]");

    if let Some(error) = &state.last_error {
        let _ = writeln!(out, "Error: {error}");
    }

    if let Some(product) = state.showing_product() {
        let _ = writeln!(out, "── Product Scanned ──");
        let _ = writeln!(out, "Name: {}", product.name());
        let _ = writeln!(
            out,
            "Country: {}",
            product.origin_label().unwrap_or("(Unknown)")
        );
        if let Some(url) = product.image_url() {
            let _ = writeln!(out, "Image: {url}");
        }
        let _ = writeln!(out, "(type `dismiss` to close)");
    }

    out
}

/// One JSON object per state.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json(state: &PresentationState) -> serde_json::Result<String> {
    serde_json::to_string(state)
}
