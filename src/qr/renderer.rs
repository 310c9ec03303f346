//! SVG renderer built on the `qrcode` encoder.

use crate::config::{ErrorCorrection, QrConfig};
use base64::Engine;
use qrcode::types::{Color, QrError as EncodeError};
use qrcode::{EcLevel, QrCode};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while encoding a QR code.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QrError {
    #[error("Data is too long to encode as a QR code")]
    DataTooLong,

    #[error("QR encoding failed: {0}")]
    Encode(String),
}

impl From<EncodeError> for QrError {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::DataTooLong => QrError::DataTooLong,
            other => QrError::Encode(other.to_string()),
        }
    }
}

impl Serialize for QrError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Rendering options for the vector graphic.
#[derive(Debug, Clone, PartialEq)]
pub struct QrStyle {
    /// Rendered width/height in pixels
    pub display_size: u32,
    pub error_correction: ErrorCorrection,
    /// Light border around the code, in modules
    pub quiet_zone: u32,
    pub dark_color: String,
    pub light_color: String,
}

impl Default for QrStyle {
    fn default() -> Self {
        QrStyle::from(&QrConfig::default())
    }
}

impl From<&QrConfig> for QrStyle {
    fn from(config: &QrConfig) -> Self {
        Self {
            display_size: config.display_size,
            error_correction: config.error_correction,
            quiet_zone: config.quiet_zone,
            dark_color: config.dark_color.clone(),
            light_color: config.light_color.clone(),
        }
    }
}

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::L => EcLevel::L,
            ErrorCorrection::M => EcLevel::M,
            ErrorCorrection::Q => EcLevel::Q,
            ErrorCorrection::H => EcLevel::H,
        }
    }
}

/// An in-memory SVG rendering of a QR code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorGraphic {
    markup: String,
    /// Module count per side, quiet zone included
    modules: u32,
    display_size: u32,
}

impl VectorGraphic {
    /// Wrap existing markup. The pipeline only needs markup text, so any
    /// SVG (or garbage, for decode-failure paths) can stand in.
    pub fn from_markup(markup: impl Into<String>, display_size: u32) -> Self {
        Self {
            markup: markup.into(),
            modules: 0,
            display_size,
        }
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Serialize to markup text for handing off to the rasterizer.
    pub fn serialize(&self) -> String {
        self.markup.clone()
    }

    pub fn modules(&self) -> u32 {
        self.modules
    }

    pub fn display_size(&self) -> u32 {
        self.display_size
    }

    /// `data:` URL suitable for an `<img src>`.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:image/svg+xml;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(self.markup.as_bytes())
        )
    }
}

/// Render `value` as QR code SVG markup.
///
/// Output is byte-identical for equal inputs.
pub fn render_svg(value: &str, style: &QrStyle) -> Result<VectorGraphic, QrError> {
    let code = QrCode::with_error_correction_level(value.as_bytes(), style.error_correction.into())?;
    let width = code.width();
    let colors = code.to_colors();
    let quiet = style.quiet_zone as usize;
    let total = width + 2 * quiet;

    let mut path = String::new();
    for y in 0..width {
        let row = &colors[y * width..(y + 1) * width];
        let mut x = 0;
        while x < width {
            if row[x] != Color::Dark {
                x += 1;
                continue;
            }

            // Merge horizontal runs of dark modules into one rectangle
            let start = x;
            while x < width && row[x] == Color::Dark {
                x += 1;
            }
            let run = x - start;
            path.push_str(&format!(
                "M{},{}h{}v1h-{}z",
                start + quiet,
                y + quiet,
                run,
                run
            ));
        }
    }

    let markup = format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" "#,
            r#"viewBox="0 0 {total} {total}" shape-rendering="crispEdges">"#,
            r#"<path fill="{light}" d="M0,0h{total}v{total}H0z"/>"#,
            r#"<path fill="{dark}" d="{path}"/>"#,
            "</svg>"
        ),
        size = style.display_size,
        total = total,
        light = style.light_color,
        dark = style.dark_color,
        path = path,
    );

    Ok(VectorGraphic {
        markup,
        modules: total as u32,
        display_size: style.display_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_is_deterministic() {
        let style = QrStyle::default();
        let a = render_svg("https://example.com", &style).unwrap();
        let b = render_svg("https://example.com", &style).unwrap();
        let c = render_svg("https://example.org", &style).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.markup(), c.markup());
    }

    #[test]
    fn test_markup_shape() {
        let graphic = render_svg("https://example.com", &QrStyle::default()).unwrap();
        let markup = graphic.markup();

        // Version 2 at level L for this input: 25 modules per side
        assert_eq!(graphic.modules(), 25);
        assert!(markup.starts_with("<svg "));
        assert!(markup.ends_with("</svg>"));
        assert!(markup.contains(r#"width="256" height="256""#));
        assert!(markup.contains(r#"viewBox="0 0 25 25""#));
        assert!(markup.contains(r##"fill="#000000""##));
        assert!(markup.contains(r##"fill="#ffffff""##));
        // Top-left finder pattern starts with a run of seven dark modules
        assert!(markup.contains("M0,0h7v1h-7z"));
    }

    #[test]
    fn test_quiet_zone_grows_view_box() {
        let style = QrStyle {
            quiet_zone: 4,
            ..QrStyle::default()
        };
        let graphic = render_svg("https://example.com", &style).unwrap();
        assert_eq!(graphic.modules(), 33);
        assert!(graphic.markup().contains(r#"viewBox="0 0 33 33""#));
        assert!(graphic.markup().contains("M4,4h7v1h-7z"));
    }

    #[test]
    fn test_too_long_for_qr() {
        let value = format!("https://example.com/{}", "a".repeat(4000));
        assert_eq!(
            render_svg(&value, &QrStyle::default()),
            Err(QrError::DataTooLong)
        );
    }

    #[test]
    fn test_data_url() {
        let graphic = VectorGraphic::from_markup("<svg/>", 256);
        assert_eq!(graphic.to_data_url(), "data:image/svg+xml;base64,PHN2Zy8+");
    }
}
