//! Watermark style layer.
//!
//! Produces the last of the three style layers in the assembled document.
//! Both layouts hang the watermark off `body::after` and make `<html>` the
//! positioning context, so the overlay spans the whole document rather than
//! the first viewport. Coverage is declared, never computed from content
//! length: the same spec yields byte-identical CSS for a one-line note and a
//! fifty-page report.
//!
//! Every declaration is `!important` and the overlay sits on the topmost
//! stacking layer, so content styles (which come earlier) cannot hide or
//! move it. `pointer-events: none` keeps the overlay from swallowing
//! clicks and text selection.

use super::{Corner, TileGeometry, WatermarkLayout, WatermarkSpec, svg_data_uri, synthesize_tile};
use crate::escape::escape_css_string;
use rand::Rng;

/// Highest value a 32-bit `z-index` can hold.
pub const WATERMARK_Z_INDEX: i32 = i32::MAX;

/// Build the watermark style layer for `spec`.
///
/// Returns an empty string when the watermark text is empty. `rng` feeds the
/// per-character jitter and is not touched otherwise.
pub fn build_watermark_css<R: Rng + ?Sized>(spec: &WatermarkSpec, rng: &mut R) -> String {
    if !spec.is_enabled() {
        return String::new();
    }

    let overlay = match spec.layout {
        WatermarkLayout::Tiled(geometry) => tiled_overlay(spec, &geometry, rng),
        WatermarkLayout::Corner { corner, offset_px } => corner_overlay(spec, corner, offset_px),
    };

    format!("{}\n\n{}", surface_rule(), overlay)
}

/// Turns the root element into the containing block of the overlay.
fn surface_rule() -> &'static str {
    r#"html {
    position: relative !important;
    min-height: 100vh !important;
}"#
}

fn tiled_overlay<R: Rng + ?Sized>(
    spec: &WatermarkSpec,
    geometry: &TileGeometry,
    rng: &mut R,
) -> String {
    let tile = synthesize_tile(spec, geometry, rng);
    let uri = svg_data_uri(tile.as_str());

    format!(
        r#"body::after {{
    content: "" !important;
    position: absolute !important;
    top: 0 !important;
    left: 0 !important;
    width: 100% !important;
    height: 100% !important;
    min-height: 100vh !important;
    background-image: url("{uri}") !important;
    background-repeat: repeat !important;
    background-size: {w}px {h}px !important;
    background-position: 0 0 !important;
    background-origin: border-box !important;
    opacity: 1 !important;
{common}
}}"#,
        w = tile.width,
        h = tile.height,
        common = overlay_common(),
    )
}

fn corner_overlay(spec: &WatermarkSpec, corner: Corner, offset_px: f64) -> String {
    let (vertical, horizontal) = corner.css_sides();

    format!(
        r#"body::after {{
    content: {content} !important;
    position: absolute !important;
    {vertical}: {offset_px}px !important;
    {horizontal}: {offset_px}px !important;
    color: {color} !important;
    opacity: {opacity} !important;
    font-family: {font} !important;
    font-size: {size}px !important;
    line-height: 1 !important;
    white-space: pre !important;
    transform: rotate({angle}deg) !important;
    transform-origin: center !important;
{common}
}}"#,
        content = escape_css_string(&spec.text),
        color = spec.color,
        opacity = spec.opacity,
        font = spec.font_family,
        size = spec.font_size_px,
        angle = spec.rotation_degrees,
        common = overlay_common(),
    )
}

/// Declarations shared by both overlays: shown on top and never interactive.
fn overlay_common() -> String {
    format!(
        r#"    display: block !important;
    visibility: visible !important;
    z-index: {WATERMARK_Z_INDEX} !important;
    pointer-events: none !important;
    user-select: none !important;"#
    )
}
