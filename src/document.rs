//! Document assembly.
//!
//! Combines the converted markdown body with three style layers into one
//! self-contained HTML document:
//!
//! ```text
//! <head>
//!   <style data-layer="page">       page geometry + base reset
//!   <style data-layer="content">    custom, default, or no content styles
//!   <style data-layer="watermark">  overlay rules (absent when disabled)
//! </head>
//! <body><main class="document"> converted markdown </main></body>
//! ```
//!
//! Layer order is the only precedence mechanism: a later layer wins over an
//! earlier one for rules of equal specificity, and the assembler never looks
//! inside the CSS. The watermark is always last.
//!
//! ## Content stylesheet resolution
//!
//! | Source | Missing file |
//! |---|---|
//! | `--css FILE` / `style.css` | fatal [`DocumentError::Stylesheet`] |
//! | `style.default_css` | warning + empty layer ([`Diagnostic::DefaultStyleUnavailable`]) |
//! | built-in default | cannot be missing |
//! | `--no-default-css` | empty layer, no warning |

use crate::config::{RenderConfig, StyleConfig, generate_page_css};
use crate::markdown;
use crate::types::Diagnostic;
use crate::watermark::{WatermarkSpec, build_watermark_css};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use rand::Rng;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

const PAGE_CSS: &str = include_str!("../static/page.css");
const DEFAULT_CONTENT_CSS: &str = include_str!("../static/content.css");

/// Title used when the markdown has no `# heading` and no fallback is given.
const UNTITLED: &str = "Document";

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("cannot read stylesheet {path}: {source}")]
    Stylesheet {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where the content layer comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleSource {
    /// User-supplied stylesheet; must be readable.
    Custom(PathBuf),
    /// Default stylesheet read from disk; may be missing.
    DefaultFile(PathBuf),
    /// Stylesheet compiled into the binary.
    BuiltIn,
    /// No content styles.
    Disabled,
}

impl StyleSource {
    pub fn from_config(style: &StyleConfig) -> Self {
        match (&style.css, style.no_default, &style.default_css) {
            (Some(path), _, _) => StyleSource::Custom(path.clone()),
            (None, true, _) => StyleSource::Disabled,
            (None, false, Some(path)) => StyleSource::DefaultFile(path.clone()),
            (None, false, None) => StyleSource::BuiltIn,
        }
    }
}

/// Load the content layer for `source`.
///
/// Only an unreadable custom stylesheet is an error. An unreadable default
/// stylesheet yields an empty layer and a diagnostic.
pub fn load_content_style(
    source: &StyleSource,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<String, DocumentError> {
    match source {
        StyleSource::Custom(path) => {
            fs::read_to_string(path).map_err(|source| DocumentError::Stylesheet {
                path: path.clone(),
                source,
            })
        }
        StyleSource::DefaultFile(path) => match fs::read_to_string(path) {
            Ok(css) => Ok(css),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "default stylesheet unavailable");
                diagnostics.push(Diagnostic::DefaultStyleUnavailable {
                    path: path.clone(),
                    reason: e.to_string(),
                });
                Ok(String::new())
            }
        },
        StyleSource::BuiltIn => Ok(DEFAULT_CONTENT_CSS.to_string()),
        StyleSource::Disabled => Ok(String::new()),
    }
}

/// The three style layers, in precedence order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentStyleLayers {
    pub page: String,
    pub content: String,
    pub watermark: String,
}

impl DocumentStyleLayers {
    /// `(layer name, css)` pairs, lowest precedence first.
    pub fn in_order(&self) -> [(&'static str, &str); 3] {
        [
            ("page", &self.page),
            ("content", &self.content),
            ("watermark", &self.watermark),
        ]
    }
}

/// A complete, self-contained document ready for the rendering bridge.
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    pub title: String,
    pub html: String,
    /// Where the content layer came from.
    pub style: StyleSource,
    pub diagnostics: Vec<Diagnostic>,
}

/// Render the final HTML from its parts. Empty layers are left out.
pub fn assemble(layers: &DocumentStyleLayers, title: &str, body_html: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                @for (name, css) in layers.in_order() {
                    @if !css.is_empty() {
                        style data-layer=(name) { (PreEscaped(embeddable_css(css))) }
                    }
                }
            }
            body {
                main.document {
                    (PreEscaped(body_html))
                }
            }
        }
    }
}

/// Keep user CSS from closing the `<style>` element it is embedded in.
///
/// End tags match case-insensitively, so `</STYLE` is escaped too.
fn embeddable_css(css: &str) -> String {
    const CLOSE: &str = "</style";
    // ASCII lowercasing keeps byte offsets aligned with `css`.
    let lower = css.to_ascii_lowercase();
    let mut out = String::with_capacity(css.len());
    let mut last = 0;
    for (i, _) in lower.match_indices(CLOSE) {
        out.push_str(&css[last..i]);
        out.push_str("<\\/");
        out.push_str(&css[i + 2..i + CLOSE.len()]);
        last = i + CLOSE.len();
    }
    out.push_str(&css[last..]);
    out
}

/// Run the whole front half of the pipeline: markdown, style layers, assembly.
///
/// `fallback_title` is used when the markdown has no level-1 heading.
pub fn build_document<R: Rng + ?Sized>(
    markdown_source: &str,
    fallback_title: Option<&str>,
    config: &RenderConfig,
    watermark: &WatermarkSpec,
    rng: &mut R,
) -> Result<AssembledDocument, DocumentError> {
    let mut diagnostics = Vec::new();

    let converted = markdown::convert(markdown_source);
    tracing::debug!(bytes = converted.html.len(), "converted markdown");

    let source = StyleSource::from_config(&config.style);
    let layers = DocumentStyleLayers {
        page: format!("{}\n\n{}", generate_page_css(&config.page), PAGE_CSS),
        content: load_content_style(&source, &mut diagnostics)?,
        watermark: build_watermark_css(watermark, rng),
    };
    tracing::debug!(
        style = ?source,
        watermark = watermark.is_enabled(),
        "resolved style layers"
    );

    let title = converted
        .title
        .or_else(|| fallback_title.map(str::to_string))
        .unwrap_or_else(|| UNTITLED.to_string());

    let html = assemble(&layers, &title, &converted.html).into_string();
    Ok(AssembledDocument {
        title,
        html,
        style: source,
        diagnostics,
    })
}
