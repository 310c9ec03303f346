//! QR code vector rendering.
//!
//! This module provides:
//! - Deterministic SVG markup for a QR code encoding a string
//! - Styling (size, quiet zone, colours, error correction) from config

mod renderer;

pub use renderer::*;
