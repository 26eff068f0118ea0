//! Watermark overlay: tile synthesis, resource encoding, and style generation.
//!
//! ```text
//! WatermarkSpec ──► style::build_watermark_css
//!                      ├─ Tiled:  tile::synthesize_tile ─► encode::svg_data_uri ─► background rule
//!                      └─ Corner: escape::escape_css_string ─► pseudo-element `content` rule
//! ```
//!
//! The module is split into:
//! - **Data model**: [`WatermarkSpec`], [`WatermarkLayout`], [`TileGeometry`], [`Corner`]
//! - **[`tile`]**: builds one SVG tile, rotated about its own center
//! - **[`encode`]**: inlines an SVG document as a base64 data URI
//! - **[`style`]**: decides the mode and emits the watermark style layer
//!
//! All values here are immutable once built. [`crate::config`] constructs the
//! spec once per run after validation; nothing downstream re-reads config.

pub mod encode;
pub mod style;
pub mod tile;

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};

pub use encode::svg_data_uri;
pub use style::build_watermark_css;
pub use tile::{TileImage, synthesize_tile};

/// Dimensions of one repeatable watermark tile, in CSS pixels.
///
/// Only constructible through [`TileGeometry::new`], so every instance has
/// finite, positive sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileGeometry {
    width: f64,
    height: f64,
}

impl TileGeometry {
    pub fn new(width: f64, height: f64) -> Result<Self, ConfigError> {
        if !(width.is_finite() && width > 0.0) {
            return Err(ConfigError::Validation(format!(
                "watermark.gap_x must be a positive number, got {width}"
            )));
        }
        if !(height.is_finite() && height > 0.0) {
            return Err(ConfigError::Validation(format!(
                "watermark.gap_y must be a positive number, got {height}"
            )));
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn center_x(&self) -> f64 {
        self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.height / 2.0
    }
}

/// Page corner the single-mark watermark is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

impl Corner {
    /// CSS inset properties for this corner: `(vertical, horizontal)`.
    pub fn css_sides(self) -> (&'static str, &'static str) {
        match self {
            Corner::TopLeft => ("top", "left"),
            Corner::TopRight => ("top", "right"),
            Corner::BottomLeft => ("bottom", "left"),
            Corner::BottomRight => ("bottom", "right"),
        }
    }

    /// Name as written in config and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Corner::TopLeft => "top-left",
            Corner::TopRight => "top-right",
            Corner::BottomLeft => "bottom-left",
            Corner::BottomRight => "bottom-right",
        }
    }
}

/// How the watermark is laid over the page. Resolved once from config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WatermarkLayout {
    /// A pre-rendered SVG tile repeated across the whole document surface.
    Tiled(TileGeometry),
    /// One text mark at a fixed offset from a page corner.
    Corner { corner: Corner, offset_px: f64 },
}

/// Fully resolved watermark settings for one run.
///
/// An empty `text` disables the watermark entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkSpec {
    pub text: String,
    pub opacity: f64,
    pub color: String,
    pub rotation_degrees: f64,
    pub font_family: String,
    pub font_size_px: f64,
    pub jitter: bool,
    pub layout: WatermarkLayout,
}

impl WatermarkSpec {
    pub fn is_enabled(&self) -> bool {
        !self.text.is_empty()
    }
}
