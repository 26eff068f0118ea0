//! Shared test utilities for the inkmark test suite.
//!
//! Spec builders with the stock defaults, plus small extractors for pulling
//! data URIs and SVG attributes back out of generated text.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let css = build_watermark_css(&tiled_spec("DRAFT"), &mut rng);
//! let svg = decode_svg_data_uri(&extract_data_uri(&css));
//! assert!(svg.contains(">DRAFT</text>"));
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::watermark::{Corner, TileGeometry, WatermarkLayout, WatermarkSpec};

// =========================================================================
// Spec builders
// =========================================================================

/// Stock watermark settings in tiled mode (180×150 tile).
pub fn tiled_spec(text: &str) -> WatermarkSpec {
    WatermarkSpec {
        text: text.to_string(),
        opacity: 0.25,
        color: "#000000".to_string(),
        rotation_degrees: -30.0,
        font_family: "Arial, sans-serif".to_string(),
        font_size_px: 24.0,
        jitter: false,
        layout: WatermarkLayout::Tiled(TileGeometry::new(180.0, 150.0).unwrap()),
    }
}

/// Stock watermark settings in single-mark mode (bottom-right, 24px).
pub fn corner_spec(text: &str) -> WatermarkSpec {
    WatermarkSpec {
        layout: WatermarkLayout::Corner {
            corner: Corner::BottomRight,
            offset_px: 24.0,
        },
        ..tiled_spec(text)
    }
}

/// Markdown with `n` paragraphs under one heading.
pub fn paragraphs(n: usize) -> String {
    let mut md = String::from("# Report\n\n");
    for i in 1..=n {
        md.push_str(&format!("Paragraph {i} of the report body.\n\n"));
    }
    md
}

// =========================================================================
// Extractors (panic with a clear message on miss)
// =========================================================================

/// Return the first `data:image/svg+xml;base64,...` URI inside `text`.
pub fn extract_data_uri(text: &str) -> String {
    let start = text
        .find("data:image/svg+xml;base64,")
        .unwrap_or_else(|| panic!("no SVG data URI in:\n{text}"));
    let rest = &text[start..];
    let end = rest.find('"').unwrap_or(rest.len());
    rest[..end].to_string()
}

/// Decode an SVG data URI back into the document text.
pub fn decode_svg_data_uri(uri: &str) -> String {
    let payload = uri
        .strip_prefix("data:image/svg+xml;base64,")
        .unwrap_or_else(|| panic!("not an SVG data URI: {uri}"));
    let bytes = STANDARD.decode(payload).expect("payload must be valid base64");
    String::from_utf8(bytes).expect("payload must be UTF-8")
}

/// All numeric values of attribute `name` in document order.
pub fn attr_values(markup: &str, name: &str) -> Vec<f64> {
    let needle = format!(" {name}=\"");
    markup
        .match_indices(&needle)
        .map(|(idx, _)| {
            let rest = &markup[idx + needle.len()..];
            let end = rest.find('"').expect("unterminated attribute");
            rest[..end]
                .parse()
                .unwrap_or_else(|_| panic!("attribute {name} is not numeric: {}", &rest[..end]))
        })
        .collect()
}
