//! URL validation for the input field.
//!
//! Validation is a view state, not an error: an invalid candidate only
//! suppresses rendering and export and shows an inline hint.

use url::Url;

/// Inline hint shown under the input when the candidate is not a usable URL.
pub const INVALID_URL_HINT: &str = "Please enter a valid URL (including http:// or https://)";

/// Check if a candidate string is an absolute URL with a scheme and an authority.
///
/// Parse failures are reported as `false`, never surfaced as errors.
pub fn is_valid_url(candidate: &str) -> bool {
    if candidate.is_empty() {
        return false;
    }

    match Url::parse(candidate) {
        Ok(url) => url.has_host(),
        Err(_) => false,
    }
}

/// Get the inline hint for a candidate, if one should be shown.
///
/// Empty input shows nothing; the form simply waits for text.
pub fn validation_hint(candidate: &str) -> Option<&'static str> {
    if candidate.is_empty() || is_valid_url(candidate) {
        None
    } else {
        Some(INVALID_URL_HINT)
    }
}
