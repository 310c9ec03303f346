//! Per-window UI state: the candidate URL and its rendered QR graphic.

use crate::qr::{render_svg, QrError, QrStyle, VectorGraphic};
use crate::validator::{is_valid_url, validation_hint};
use serde::{Deserialize, Serialize};

/// Hint shown when a valid URL does not fit in a QR code.
pub const TOO_LONG_HINT: &str = "URL is too long to encode as a QR code";

/// Facts shown under the QR code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QrDetails {
    pub url: String,
    /// e.g. "256x256 pixels"
    pub size: String,
    pub format: String,
}

/// Snapshot of the form returned to the page after every change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub url: String,
    pub valid: bool,
    /// Inline validation message
    pub hint: Option<String>,
    /// SVG markup of the current QR code
    pub svg: Option<String>,
    pub svg_data_url: Option<String>,
    pub details: Option<QrDetails>,
    /// An export run is in flight; the page disables its button
    pub generating: bool,
}

/// Owns the candidate URL and the graphic rendered from it.
#[derive(Debug, Default)]
pub struct UiSession {
    style: QrStyle,
    url: String,
    graphic: Option<VectorGraphic>,
    render_error: Option<QrError>,
}

impl UiSession {
    pub fn new(style: QrStyle) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The rendered graphic, present only while the URL is valid.
    pub fn graphic(&self) -> Option<&VectorGraphic> {
        self.graphic.as_ref()
    }

    /// Replace the candidate URL, revalidating and re-rendering.
    pub fn set_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        if url == self.url && self.graphic.is_some() {
            return;
        }

        self.url = url;
        self.graphic = None;
        self.render_error = None;

        if !is_valid_url(&self.url) {
            return;
        }

        match render_svg(&self.url, &self.style) {
            Ok(graphic) => {
                log::debug!(
                    "Rendered QR code for {} ({} modules)",
                    self.url,
                    graphic.modules()
                );
                self.graphic = Some(graphic);
            }
            Err(e) => {
                log::warn!("Could not render QR code: {}", e);
                self.render_error = Some(e);
            }
        }
    }

    /// Owned copy of what the export pipeline needs, so no lock is held
    /// while it runs.
    pub fn export_source(&self) -> (String, Option<VectorGraphic>) {
        (self.url.clone(), self.graphic.clone())
    }

    pub fn view(&self, generating: bool) -> ViewState {
        let valid = is_valid_url(&self.url);
        let hint = match &self.render_error {
            Some(QrError::DataTooLong) => Some(TOO_LONG_HINT.to_string()),
            Some(e) => Some(e.to_string()),
            None => validation_hint(&self.url).map(str::to_string),
        };

        let details = self.graphic.as_ref().map(|graphic| QrDetails {
            url: self.url.clone(),
            size: format!("{0}x{0} pixels", graphic.display_size()),
            format: "PNG".to_string(),
        });

        ViewState {
            url: self.url.clone(),
            valid,
            hint,
            svg: self.graphic.as_ref().map(|g| g.serialize()),
            svg_data_url: self.graphic.as_ref().map(VectorGraphic::to_data_url),
            details,
            generating,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::INVALID_URL_HINT;

    #[test]
    fn test_valid_url_renders_graphic() {
        let mut session = UiSession::new(QrStyle::default());
        session.set_url("https://example.com");

        let view = session.view(false);
        assert!(view.valid);
        assert_eq!(view.hint, None);
        assert!(view.svg.unwrap().starts_with("<svg"));
        assert!(view.svg_data_url.unwrap().starts_with("data:image/svg+xml;base64,"));

        let details = view.details.unwrap();
        assert_eq!(details.url, "https://example.com");
        assert_eq!(details.size, "256x256 pixels");
        assert_eq!(details.format, "PNG");
    }

    #[test]
    fn test_invalid_url_clears_graphic() {
        let mut session = UiSession::new(QrStyle::default());
        session.set_url("https://example.com");
        session.set_url("not a url");

        assert!(session.graphic().is_none());
        let view = session.view(false);
        assert!(!view.valid);
        assert_eq!(view.hint.as_deref(), Some(INVALID_URL_HINT));
        assert_eq!(view.svg, None);
        assert_eq!(view.details, None);
    }

    #[test]
    fn test_empty_url_shows_nothing() {
        let mut session = UiSession::new(QrStyle::default());
        session.set_url("");

        let view = session.view(false);
        assert!(!view.valid);
        assert_eq!(view.hint, None);
        assert_eq!(view.svg, None);
    }

    #[test]
    fn test_graphic_follows_url_changes() {
        let mut session = UiSession::new(QrStyle::default());
        session.set_url("https://example.com");
        let first = session.graphic().cloned().unwrap();

        session.set_url("https://example.com");
        assert_eq!(session.graphic(), Some(&first));

        session.set_url("https://example.org");
        assert_ne!(session.graphic(), Some(&first));
    }

    #[test]
    fn test_oversized_url_gets_hint() {
        let mut session = UiSession::new(QrStyle::default());
        session.set_url(format!("https://example.com/{}", "a".repeat(4000)));

        let view = session.view(false);
        assert!(view.valid);
        assert_eq!(view.svg, None);
        assert_eq!(view.hint.as_deref(), Some(TOO_LONG_HINT));
    }

    #[test]
    fn test_view_serializes_camel_case() {
        let session = UiSession::new(QrStyle::default());
        let value = serde_json::to_value(session.view(true)).unwrap();
        assert_eq!(value["generating"], serde_json::json!(true));
        assert!(value.get("svgDataUrl").is_some());
    }
}
