//! Extraction of `## <Label>: <payload>` markers from completions.

use crate::error::MissingMarkerError;

/// Marker the theme completion must contain.
pub const THEME_MARKER: &str = "## Theme:";

/// Marker the summary completion is asked to contain.
pub const SUMMARY_MARKER: &str = "## Summary:";

/// Return the payload following the first `marker` in `text`.
///
/// The payload runs up to the next occurrence of the marker, if any, and is
/// trimmed.
pub fn extract_marked(text: &str, marker: &str) -> Result<String, MissingMarkerError> {
    let start = text
        .find(marker)
        .ok_or_else(|| MissingMarkerError::new(marker))?;
    let rest = &text[start + marker.len()..];
    let payload = match rest.find(marker) {
        Some(end) => &rest[..end],
        None => rest,
    };
    Ok(payload.trim().to_string())
}
