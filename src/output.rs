//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Render
//!
//! ```text
//! Quarterly Report → report.png
//!     Source: report.md
//!     Image: 800×1432 png (182 KB)
//!     Styles: built-in
//!     Watermark: tiled "CONFIDENTIAL" 180×150, rotate -30°
//! ```
//!
//! ## Html
//!
//! ```text
//! Quarterly Report → report.html
//!     Source: report.md
//!     Styles: custom.css
//!     Watermark: corner "DRAFT" bottom-right
//! ```
//!
//! Soft degradations are not repeated here; they are logged as warnings when
//! they happen. The `Styles:` line shows their effect.
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::document::{AssembledDocument, StyleSource};
use crate::naming::InputSource;
use crate::render::RenderedImage;
use crate::watermark::{WatermarkLayout, WatermarkSpec};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count.
fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < KB * KB {
        format!("{:.0} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

/// Trim a float for display: `-30`, `0.25`.
fn format_number(value: f64) -> String {
    let s = format!("{value:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// One-line description of the watermark.
fn watermark_line(spec: &WatermarkSpec) -> String {
    if !spec.is_enabled() {
        return "Watermark: none".to_string();
    }
    let rotate = format_number(spec.rotation_degrees);
    match &spec.layout {
        WatermarkLayout::Tiled(geometry) => format!(
            "Watermark: tiled {:?} {}×{}, rotate {rotate}°{}",
            spec.text,
            format_number(geometry.width()),
            format_number(geometry.height()),
            if spec.jitter { ", jitter" } else { "" }
        ),
        WatermarkLayout::Corner { corner, .. } => format!(
            "Watermark: corner {:?} {}, rotate {rotate}°",
            spec.text,
            corner.name()
        ),
    }
}

/// Where the content styles came from, and whether they made it in.
fn styles_line(document: &AssembledDocument) -> String {
    let detail = match &document.style {
        StyleSource::Custom(path) => path.display().to_string(),
        StyleSource::DefaultFile(path) if !document.diagnostics.is_empty() => {
            format!("none ({} unavailable)", path.display())
        }
        StyleSource::DefaultFile(path) => path.display().to_string(),
        StyleSource::BuiltIn => "built-in".to_string(),
        StyleSource::Disabled => "none".to_string(),
    };
    format!("Styles: {detail}")
}

fn header(document: &AssembledDocument, target: &str) -> String {
    format!("{} \u{2192} {}", document.title, target)
}

// ============================================================================
// Render
// ============================================================================

/// Format the summary of a completed `render`.
pub fn format_render_output(
    input: &InputSource,
    document: &AssembledDocument,
    watermark: &WatermarkSpec,
    image: &RenderedImage,
) -> Vec<String> {
    vec![
        header(document, &image.path.display().to_string()),
        format!("{}Source: {}", indent(1), input.label()),
        format!(
            "{}Image: {}×{} {} ({})",
            indent(1),
            image.width,
            image.height,
            image.format.extension(),
            format_size(image.bytes)
        ),
        format!("{}{}", indent(1), styles_line(document)),
        format!("{}{}", indent(1), watermark_line(watermark)),
    ]
}

/// Print render output to stdout.
pub fn print_render_output(
    input: &InputSource,
    document: &AssembledDocument,
    watermark: &WatermarkSpec,
    image: &RenderedImage,
) {
    for line in format_render_output(input, document, watermark, image) {
        println!("{}", line);
    }
}

// ============================================================================
// Html
// ============================================================================

/// Format the summary of an `html` run that wrote to a file.
pub fn format_html_output(
    input: &InputSource,
    document: &AssembledDocument,
    watermark: &WatermarkSpec,
    path: &Path,
) -> Vec<String> {
    vec![
        header(document, &path.display().to_string()),
        format!("{}Source: {}", indent(1), input.label()),
        format!("{}{}", indent(1), styles_line(document)),
        format!("{}{}", indent(1), watermark_line(watermark)),
    ]
}

/// Print html output to stdout.
pub fn print_html_output(
    input: &InputSource,
    document: &AssembledDocument,
    watermark: &WatermarkSpec,
    path: &Path,
) {
    for line in format_html_output(input, document, watermark, path) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{corner_spec, tiled_spec};
    use crate::types::{Diagnostic, ImageFormat};
    use std::path::PathBuf;

    fn document(style: StyleSource, diagnostics: Vec<Diagnostic>) -> AssembledDocument {
        AssembledDocument {
            title: "Quarterly Report".to_string(),
            html: String::new(),
            style,
            diagnostics,
        }
    }

    fn image() -> RenderedImage {
        RenderedImage {
            path: PathBuf::from("report.png"),
            format: ImageFormat::Png,
            width: 800,
            height: 1432,
            bytes: 186_368,
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(186_368), "182 KB");
        assert_eq!(format_size(3 * 1024 * 1024 + 512 * 1024), "3.5 MB");
    }

    #[test]
    fn number_trimming() {
        assert_eq!(format_number(-30.0), "-30");
        assert_eq!(format_number(0.25), "0.25");
        assert_eq!(format_number(12.5), "12.5");
    }

    #[test]
    fn watermark_line_tiled() {
        assert_eq!(
            watermark_line(&tiled_spec("CONFIDENTIAL")),
            r#"Watermark: tiled "CONFIDENTIAL" 180×150, rotate -30°"#
        );
    }

    #[test]
    fn watermark_line_tiled_jitter() {
        let spec = WatermarkSpec {
            jitter: true,
            ..tiled_spec("X")
        };
        assert!(watermark_line(&spec).ends_with(", jitter"));
    }

    #[test]
    fn watermark_line_corner() {
        assert_eq!(
            watermark_line(&corner_spec("DRAFT")),
            r#"Watermark: corner "DRAFT" bottom-right, rotate -30°"#
        );
    }

    #[test]
    fn watermark_line_disabled() {
        assert_eq!(watermark_line(&tiled_spec("")), "Watermark: none");
    }

    #[test]
    fn styles_line_variants() {
        assert_eq!(
            styles_line(&document(StyleSource::BuiltIn, vec![])),
            "Styles: built-in"
        );
        assert_eq!(
            styles_line(&document(StyleSource::Disabled, vec![])),
            "Styles: none"
        );
        assert_eq!(
            styles_line(&document(StyleSource::Custom("custom.css".into()), vec![])),
            "Styles: custom.css"
        );
    }

    #[test]
    fn styles_line_shows_degradation() {
        let doc = document(
            StyleSource::DefaultFile("/opt/default.css".into()),
            vec![Diagnostic::DefaultStyleUnavailable {
                path: "/opt/default.css".into(),
                reason: "not found".into(),
            }],
        );
        assert_eq!(
            styles_line(&doc),
            "Styles: none (/opt/default.css unavailable)"
        );
    }

    // =========================================================================
    // Command output tests
    // =========================================================================

    #[test]
    fn render_output_lines() {
        let lines = format_render_output(
            &InputSource::File("report.md".into()),
            &document(StyleSource::BuiltIn, vec![]),
            &tiled_spec("CONFIDENTIAL"),
            &image(),
        );
        assert_eq!(
            lines,
            vec![
                "Quarterly Report \u{2192} report.png",
                "    Source: report.md",
                "    Image: 800×1432 png (182 KB)",
                "    Styles: built-in",
                r#"    Watermark: tiled "CONFIDENTIAL" 180×150, rotate -30°"#,
            ]
        );
    }

    #[test]
    fn html_output_lines() {
        let lines = format_html_output(
            &InputSource::Stdin,
            &document(StyleSource::Disabled, vec![]),
            &tiled_spec(""),
            Path::new("out.html"),
        );
        assert_eq!(
            lines,
            vec![
                "Quarterly Report \u{2192} out.html",
                "    Source: <stdin>",
                "    Styles: none",
                "    Watermark: none",
            ]
        );
    }
}
