//! Render configuration.
//!
//! Handles loading, merging, validating, and resolving configuration. Values
//! come from three layers, each overriding the one below:
//!
//! ```text
//! stock defaults  →  inkmark.toml (or --config FILE)  →  command-line flags
//! ```
//!
//! The result is validated once, before any rendering work starts, and then
//! turned into immutable values ([`WatermarkSpec`], [`PageConfig`], ...) that
//! the pipeline stages receive explicitly. No stage reads process state.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [page]
//! width = 800               # Viewport / document width in px
//! margin = 40               # Horizontal page margin in px
//! padding_y = 40            # Vertical page padding in px
//! background = "#ffffff"
//!
//! [style]
//! # css = "custom.css"      # Custom content stylesheet (must exist)
//! no_default = false        # Skip the built-in content stylesheet
//! # default_css = "..."     # Alternative location of the default stylesheet
//!
//! [watermark]
//! text = ""                 # Empty disables the watermark
//! opacity = 0.25
//! color = "#000000"
//! rotate = -30              # Degrees
//! font = "Arial, sans-serif"
//! size = 24                 # Font size in px
//! gap_x = 180               # Tile width in px
//! gap_y = 150               # Tile height in px
//! tile = true               # false = one mark in a corner
//! jitter = false            # Per-character scatter
//! # seed = 42               # Fix the jitter pattern
//! corner = "bottom-right"   # Single-mark placement
//! offset = 24               # Single-mark distance from the corner in px
//!
//! [render]
//! viewport_height = 800
//! scale = 1.0               # Device scale factor
//! settle_ms = 0             # Extra fixed wait before capture
//! ready_timeout_ms = 5000   # Bound on the paint-readiness wait
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::watermark::{Corner, TileGeometry, WatermarkLayout, WatermarkSpec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file picked up from the working directory.
pub const CONFIG_FILENAME: &str = "inkmark.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Complete configuration for one run.
///
/// All fields have defaults. Config files need only specify the values they
/// want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Page geometry and background.
    pub page: PageConfig,
    /// Content stylesheet selection.
    pub style: StyleConfig,
    /// Watermark text, styling, and layout.
    pub watermark: WatermarkConfig,
    /// Browser capture settings.
    pub render: CaptureConfig,
}

impl RenderConfig {
    /// Validate every value. Runs after all layers are applied.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let page = &self.page;
        if page.width == 0 {
            return Err(ConfigError::Validation("page.width must be positive".into()));
        }
        check_css_value("page.background", &page.background)?;

        let wm = &self.watermark;
        check_finite("watermark.opacity", wm.opacity)?;
        if !(0.0..=1.0).contains(&wm.opacity) {
            return Err(ConfigError::Validation(
                "watermark.opacity must be between 0 and 1".into(),
            ));
        }
        check_finite("watermark.rotate", wm.rotate)?;
        check_positive("watermark.size", wm.size)?;
        check_positive("watermark.gap_x", wm.gap_x)?;
        check_positive("watermark.gap_y", wm.gap_y)?;
        check_finite("watermark.offset", wm.offset)?;
        if wm.offset < 0.0 {
            return Err(ConfigError::Validation(
                "watermark.offset must not be negative".into(),
            ));
        }
        check_css_value("watermark.color", &wm.color)?;
        check_css_value("watermark.font", &wm.font)?;

        let render = &self.render;
        if render.viewport_height == 0 {
            return Err(ConfigError::Validation(
                "render.viewport_height must be positive".into(),
            ));
        }
        check_positive("render.scale", render.scale)?;
        Ok(())
    }

    /// Resolve the watermark section into the immutable spec the pipeline uses.
    ///
    /// The tiling flag is decided here, once.
    pub fn watermark_spec(&self) -> Result<WatermarkSpec, ConfigError> {
        let wm = &self.watermark;
        let layout = if wm.tile {
            WatermarkLayout::Tiled(TileGeometry::new(wm.gap_x, wm.gap_y)?)
        } else {
            WatermarkLayout::Corner {
                corner: wm.corner,
                offset_px: wm.offset,
            }
        };
        Ok(WatermarkSpec {
            text: wm.text.clone(),
            opacity: wm.opacity,
            color: wm.color.clone(),
            rotation_degrees: wm.rotate,
            font_family: wm.font.clone(),
            font_size_px: wm.size,
            jitter: wm.jitter,
            layout,
        })
    }
}

fn check_finite(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{name} must be a finite number, got {value}"
        )))
    }
}

fn check_positive(name: &str, value: f64) -> Result<(), ConfigError> {
    check_finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{name} must be positive, got {value}"
        )))
    }
}

/// Characters that would end a CSS declaration or break out of markup.
const CSS_VALUE_FORBIDDEN: &[char] = &[';', '{', '}', '<', '>', '"', '\\'];

/// Reject values that are interpolated into CSS/SVG verbatim but could
/// terminate the surrounding declaration.
fn check_css_value(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{name} must not be empty")));
    }
    if let Some(c) = value.chars().find(|c| CSS_VALUE_FORBIDDEN.contains(c)) {
        return Err(ConfigError::Validation(format!(
            "{name} contains forbidden character {c:?}"
        )));
    }
    Ok(())
}

/// Page geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    /// Document and viewport width in px.
    pub width: u32,
    /// Horizontal page margin in px.
    pub margin: u32,
    /// Vertical page padding in px.
    pub padding_y: u32,
    /// Page background color.
    pub background: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            width: 800,
            margin: 40,
            padding_y: 40,
            background: "#ffffff".to_string(),
        }
    }
}

/// Content stylesheet selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleConfig {
    /// Custom content stylesheet. Failing to read it is fatal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css: Option<PathBuf>,
    /// Render without any content stylesheet.
    pub no_default: bool,
    /// Where to read the default stylesheet from. `None` uses the built-in one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_css: Option<PathBuf>,
}

/// Raw watermark settings as written in config files and flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatermarkConfig {
    /// Watermark text. Empty disables the watermark.
    pub text: String,
    /// Opacity from 0 (invisible) to 1.
    pub opacity: f64,
    /// Text color (any CSS color).
    pub color: String,
    /// Rotation in degrees; negative is counter-clockwise.
    pub rotate: f64,
    /// CSS font-family list.
    pub font: String,
    /// Font size in px.
    pub size: f64,
    /// Tile width in px (tiled mode).
    pub gap_x: f64,
    /// Tile height in px (tiled mode).
    pub gap_y: f64,
    /// Repeat the mark over the whole page instead of placing it once.
    pub tile: bool,
    /// Scatter each character by a few pixels.
    pub jitter: bool,
    /// Seed for the jitter RNG. `None` draws from system entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Corner for the single mark.
    pub corner: Corner,
    /// Distance of the single mark from its corner, in px.
    pub offset: f64,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            opacity: 0.25,
            color: "#000000".to_string(),
            rotate: -30.0,
            font: "Arial, sans-serif".to_string(),
            size: 24.0,
            gap_x: 180.0,
            gap_y: 150.0,
            tile: true,
            jitter: false,
            seed: None,
            corner: Corner::default(),
            offset: 24.0,
        }
    }
}

/// Browser capture settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    /// Initial viewport height in px. Capture always covers the full page.
    pub viewport_height: u32,
    /// Device scale factor of the captured image.
    pub scale: f64,
    /// Extra fixed delay after the page reports ready, in ms.
    pub settle_ms: u64,
    /// Upper bound on waiting for the page to report ready, in ms.
    pub ready_timeout_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            viewport_height: 800,
            scale: 1.0,
            settle_ms: 0,
            ready_timeout_ms: 5000,
        }
    }
}

/// Values given on the command line. `None` leaves the lower layer alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub width: Option<u32>,
    pub margin: Option<u32>,
    pub css: Option<PathBuf>,
    pub no_default_css: bool,
    pub watermark: Option<String>,
    pub opacity: Option<f64>,
    pub color: Option<String>,
    pub rotate: Option<f64>,
    pub font: Option<String>,
    pub size: Option<f64>,
    pub gap_x: Option<f64>,
    pub gap_y: Option<f64>,
    pub tile: Option<bool>,
    pub jitter: bool,
    pub seed: Option<u64>,
    pub corner: Option<Corner>,
}

impl ConfigOverrides {
    /// Write every given value into `config`.
    pub fn apply(self, config: &mut RenderConfig) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }

        set(&mut config.page.width, self.width);
        set(&mut config.page.margin, self.margin);
        if self.css.is_some() {
            config.style.css = self.css;
        }
        config.style.no_default |= self.no_default_css;

        let wm = &mut config.watermark;
        set(&mut wm.text, self.watermark);
        set(&mut wm.opacity, self.opacity);
        set(&mut wm.color, self.color);
        set(&mut wm.rotate, self.rotate);
        set(&mut wm.font, self.font);
        set(&mut wm.size, self.size);
        set(&mut wm.gap_x, self.gap_x);
        set(&mut wm.gap_y, self.gap_y);
        set(&mut wm.tile, self.tile);
        wm.jitter |= self.jitter;
        if self.seed.is_some() {
            wm.seed = self.seed;
        }
        set(&mut wm.corner, self.corner);
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer that user overrides are merged on top of.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(RenderConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist, `Err` if it exists but
/// cannot be read or parsed.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional file layer onto `base`, apply flag overrides, then
/// deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
    overrides: ConfigOverrides,
) -> Result<RenderConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let mut config: RenderConfig = merged.try_into()?;
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Load the full configuration for a run.
///
/// An explicit `config_path` must exist. Without one, `inkmark.toml` in
/// `working_dir` is used when present.
pub fn load_config(
    config_path: Option<&Path>,
    working_dir: &Path,
    overrides: ConfigOverrides,
) -> Result<RenderConfig, ConfigError> {
    let overlay = match config_path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str(&content)?)
        }
        None => load_raw_config(&working_dir.join(CONFIG_FILENAME))?,
    };
    resolve_config(stock_defaults_value(), overlay, overrides)
}

/// Returns a fully-commented stock `inkmark.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# inkmark configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# inkmark reads ./inkmark.toml, or the file given with --config.
# Command-line flags override anything set here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Page
# ---------------------------------------------------------------------------
[page]
# Document and viewport width in px.
width = 800

# Horizontal page margin in px.
margin = 40

# Vertical page padding in px.
padding_y = 40

# Page background color.
background = "#ffffff"

# ---------------------------------------------------------------------------
# Content stylesheet
# ---------------------------------------------------------------------------
[style]
# Custom stylesheet for the document body. Rendering fails if it is missing.
# css = "custom.css"

# Render with no content stylesheet at all.
no_default = false

# Read the default stylesheet from this file instead of the built-in one.
# If the file is missing, rendering continues unstyled with a warning.
# default_css = "/usr/share/inkmark/default.css"

# ---------------------------------------------------------------------------
# Watermark
# ---------------------------------------------------------------------------
[watermark]
# Watermark text. Leave empty to disable the watermark.
text = ""

# Opacity from 0 (invisible) to 1 (solid).
opacity = 0.25

# Text color (any CSS color).
color = "#000000"

# Rotation in degrees. Negative values rotate counter-clockwise.
rotate = -30

# CSS font-family list.
font = "Arial, sans-serif"

# Font size in px.
size = 24

# Tile size in px. Each tile holds one copy of the text.
gap_x = 180
gap_y = 150

# Repeat the watermark across the page. Set to false for a single mark.
tile = true

# Scatter each character by a few pixels for a hand-placed look.
jitter = false

# Fix the jitter pattern. Omit to pick a new pattern on every run.
# seed = 42

# Single-mark placement: top-left, top-right, bottom-left, bottom-right.
corner = "bottom-right"

# Single-mark distance from its corner in px.
offset = 24

# ---------------------------------------------------------------------------
# Capture
# ---------------------------------------------------------------------------
[render]
# Initial viewport height in px. The capture always covers the whole page.
viewport_height = 800

# Device scale factor (2.0 for high-DPI output).
scale = 1.0

# Extra fixed wait in ms after the page reports it has painted.
settle_ms = 0

# Upper bound in ms on waiting for fonts and paint to finish.
ready_timeout_ms = 5000
"##
}

/// Generate CSS custom properties for the page layer.
pub fn generate_page_css(page: &PageConfig) -> String {
    format!(
        r#":root {{
    --page-width: {width}px;
    --page-margin-x: {margin}px;
    --page-padding-y: {padding_y}px;
    --page-background: {background};
}}"#,
        width = page.width,
        margin = page.margin,
        padding_y = page.padding_y,
        background = page.background,
    )
}
