//! Inline resource encoding.
//!
//! The assembled document must render without touching the filesystem or the
//! network, so the watermark tile travels inside the style sheet as a data URI.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

const SVG_DATA_URI_PREFIX: &str = "data:image/svg+xml;base64,";

/// Encode an SVG document as `data:image/svg+xml;base64,<payload>`.
///
/// The payload is the standard (padded) base64 of the document's UTF-8 bytes.
pub fn svg_data_uri(svg: &str) -> String {
    let mut uri = String::with_capacity(SVG_DATA_URI_PREFIX.len() + svg.len() * 4 / 3 + 4);
    uri.push_str(SVG_DATA_URI_PREFIX);
    STANDARD.encode_string(svg.as_bytes(), &mut uri);
    uri
}
