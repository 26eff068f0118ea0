//! SVG tile synthesis.
//!
//! A tile is a standalone SVG document of exactly `gap_x × gap_y` pixels
//! holding the watermark text once, centered. The text group is rotated
//! about the tile's own center, so repeating the tile edge to edge yields a
//! uniform diagonal field with no seams.
//!
//! ```text
//! <svg width=W height=H viewBox="0 0 W H">
//!   <defs> wobble filter (feTurbulence + feDisplacementMap, fixed seed) </defs>
//!   <g fill opacity font-* transform="rotate(θ cx cy)" filter="url(#wobble)">
//!     <text x=cx y=cy anchor=middle>TEXT</text>          jitter off
//!     <text ...><tspan dx dy>C</tspan>…</text>           jitter on
//!   </g>
//! </svg>
//! ```
//!
//! Jitter offsets come from the caller's RNG; pass a seeded one for
//! reproducible output.

use super::{TileGeometry, WatermarkSpec};
use crate::escape::escape_markup;
use rand::Rng;
use std::fmt::Write as _;
use std::ops::RangeInclusive;
use unicode_segmentation::UnicodeSegmentation;

/// Horizontal nudge per character, in px.
const JITTER_DX: RangeInclusive<i32> = -3..=3;
/// Vertical displacement of each character from the baseline, in px.
const JITTER_DY: RangeInclusive<i32> = -2..=2;

/// Noise seed of the edge wobble filter. Constant so renders are comparable
/// across runs.
const WOBBLE_SEED: u32 = 7;
const WOBBLE_BASE_FREQUENCY: f64 = 0.04;
const WOBBLE_OCTAVES: u32 = 2;
const WOBBLE_SCALE: f64 = 1.5;

/// One generated watermark tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileImage {
    pub width: f64,
    pub height: f64,
    svg: String,
}

impl TileImage {
    /// The complete SVG document.
    pub fn as_str(&self) -> &str {
        &self.svg
    }

    pub fn into_string(self) -> String {
        self.svg
    }
}

/// Build the SVG tile for `spec` at the given geometry.
pub fn synthesize_tile<R: Rng + ?Sized>(
    spec: &WatermarkSpec,
    geometry: &TileGeometry,
    rng: &mut R,
) -> TileImage {
    let (w, h) = (geometry.width(), geometry.height());
    let (cx, cy) = (geometry.center_x(), geometry.center_y());

    let text_node = if spec.jitter {
        jittered_text(&spec.text, cx, cy, rng)
    } else {
        format!(
            r#"<text x="{cx}" y="{cy}" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
            escape_markup(&spec.text)
        )
    };

    let mut svg = String::with_capacity(768 + text_node.len());
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    );
    svg.push_str(&wobble_filter());
    let _ = write!(
        svg,
        r#"<g fill="{fill}" opacity="{opacity}" font-family="{font}" font-size="{size}" transform="rotate({angle} {cx} {cy})" filter="url(#wobble)">"#,
        fill = escape_markup(&spec.color),
        opacity = spec.opacity,
        font = escape_markup(&spec.font_family),
        size = spec.font_size_px,
        angle = spec.rotation_degrees,
    );
    svg.push_str(&text_node);
    svg.push_str("</g></svg>");

    TileImage {
        width: w,
        height: h,
        svg,
    }
}

/// Noise-displacement filter that roughens glyph edges slightly.
fn wobble_filter() -> String {
    format!(
        concat!(
            r#"<defs><filter id="wobble" x="-10%" y="-10%" width="120%" height="120%">"#,
            r#"<feTurbulence type="fractalNoise" baseFrequency="{freq}" numOctaves="{octaves}" seed="{seed}" result="noise"/>"#,
            r#"<feDisplacementMap in="SourceGraphic" in2="noise" scale="{scale}" xChannelSelector="R" yChannelSelector="G"/>"#,
            r#"</filter></defs>"#
        ),
        freq = WOBBLE_BASE_FREQUENCY,
        octaves = WOBBLE_OCTAVES,
        seed = WOBBLE_SEED,
        scale = WOBBLE_SCALE,
    )
}

/// One `<tspan>` per grapheme cluster, each nudged by a random offset.
///
/// `dy` in SVG is relative to the previous glyph, so each span carries the
/// difference between its own displacement and its predecessor's. Every
/// character therefore sits within `JITTER_DY` of the baseline instead of
/// drifting away from it.
fn jittered_text<R: Rng + ?Sized>(text: &str, cx: f64, cy: f64, rng: &mut R) -> String {
    let mut out = format!(
        r#"<text x="{cx}" y="{cy}" text-anchor="middle" dominant-baseline="middle">"#
    );
    let mut previous_dy = 0;
    for grapheme in text.graphemes(true) {
        let dx = rng.gen_range(JITTER_DX);
        let dy = rng.gen_range(JITTER_DY);
        let _ = write!(
            out,
            r#"<tspan dx="{dx}" dy="{}">{}</tspan>"#,
            dy - previous_dy,
            escape_markup(grapheme)
        );
        previous_dy = dy;
    }
    out.push_str("</text>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{attr_values, tiled_spec};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn geometry() -> TileGeometry {
        TileGeometry::new(180.0, 150.0).unwrap()
    }

    fn tile(spec: &WatermarkSpec, seed: u64) -> String {
        let mut rng = StdRng::seed_from_u64(seed);
        synthesize_tile(spec, &geometry(), &mut rng).into_string()
    }

    #[test]
    fn tile_declares_geometry_size() {
        let svg = tile(&tiled_spec("CONFIDENTIAL"), 0);
        assert!(svg.starts_with("<svg "));
        assert!(svg.contains(r#"width="180" height="150""#));
        assert!(svg.contains(r#"viewBox="0 0 180 150""#));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn rotation_is_about_tile_center() {
        let svg = tile(&tiled_spec("CONFIDENTIAL"), 0);
        assert!(svg.contains("rotate(-30 90 75)"));
    }

    #[test]
    fn rotation_center_follows_geometry() {
        let spec = tiled_spec("X");
        let g = TileGeometry::new(300.0, 101.0).unwrap();
        let svg = synthesize_tile(&spec, &g, &mut StdRng::seed_from_u64(0)).into_string();
        assert!(svg.contains("rotate(-30 150 50.5)"));
    }

    #[test]
    fn group_carries_styling() {
        let mut spec = tiled_spec("CONFIDENTIAL");
        spec.color = "#c00".to_string();
        spec.opacity = 0.4;
        spec.font_size_px = 30.0;
        let svg = tile(&spec, 0);
        assert!(svg.contains(r##"fill="#c00""##));
        assert!(svg.contains(r#"opacity="0.4""#));
        assert!(svg.contains(r#"font-family="Arial, sans-serif""#));
        assert!(svg.contains(r#"font-size="30""#));
        assert!(svg.contains(r#"filter="url(#wobble)""#));
    }

    #[test]
    fn plain_text_is_single_centered_node() {
        let svg = tile(&tiled_spec("CONFIDENTIAL"), 0);
        assert!(svg.contains(
            r#"<text x="90" y="75" text-anchor="middle" dominant-baseline="middle">CONFIDENTIAL</text>"#
        ));
        assert!(!svg.contains("<tspan"));
    }

    #[test]
    fn text_is_escaped() {
        let svg = tile(&tiled_spec("R&D <internal>"), 0);
        assert!(svg.contains("R&amp;D &lt;internal&gt;"));
        assert!(!svg.contains("<internal>"));
    }

    #[test]
    fn wobble_filter_has_fixed_seed() {
        let a = tile(&tiled_spec("A"), 1);
        let b = tile(&tiled_spec("A"), 2);
        let needle = format!(r#"seed="{WOBBLE_SEED}""#);
        assert!(a.contains(&needle));
        assert!(a.contains("feDisplacementMap"));
        // Without jitter the RNG is unused, so output is identical.
        assert_eq!(a, b);
    }

    #[test]
    fn jitter_emits_one_span_per_character() {
        let mut spec = tiled_spec("CONFIDENTIAL");
        spec.jitter = true;
        let svg = tile(&spec, 42);
        assert_eq!(svg.matches("<tspan").count(), 12);
    }

    #[test]
    fn jitter_counts_cjk_characters_not_bytes() {
        let mut spec = tiled_spec("机密文件");
        spec.jitter = true;
        let svg = tile(&spec, 42);
        assert_eq!(svg.matches("<tspan").count(), 4);
        for c in ["机", "密", "文", "件"] {
            assert!(svg.contains(&format!(">{c}</tspan>")));
        }
    }

    #[test]
    fn jitter_keeps_grapheme_clusters_together() {
        let mut spec = tiled_spec("e\u{301}👩\u{200d}💻");
        spec.jitter = true;
        let svg = tile(&spec, 42);
        assert_eq!(svg.matches("<tspan").count(), 2);
    }

    #[test]
    fn jitter_offsets_stay_in_range() {
        let mut spec = tiled_spec("THE QUICK BROWN FOX JUMPS OVER THE LAZY DOG");
        spec.jitter = true;
        let svg = tile(&spec, 7);

        let dxs = attr_values(&svg, "dx");
        assert_eq!(dxs.len(), spec.text.chars().count());
        assert!(dxs.iter().all(|dx| (-3.0..=3.0).contains(dx)));

        // dy is chained; the running sum is the absolute displacement.
        let mut baseline_offset = 0.0;
        for dy in attr_values(&svg, "dy") {
            baseline_offset += dy;
            assert!((-2.0..=2.0).contains(&baseline_offset));
        }
    }

    #[test]
    fn jitter_is_reproducible_for_a_seed() {
        let mut spec = tiled_spec("REPRODUCIBLE OUTPUT");
        spec.jitter = true;
        assert_eq!(tile(&spec, 99), tile(&spec, 99));
        assert_ne!(tile(&spec, 1), tile(&spec, 2));
    }

    #[test]
    fn jitter_keeps_text_centered() {
        let mut spec = tiled_spec("AB");
        spec.jitter = true;
        let svg = tile(&spec, 3);
        assert!(svg.contains(r#"<text x="90" y="75" text-anchor="middle""#));
    }
}
