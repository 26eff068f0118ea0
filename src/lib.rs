//! # Inkmark
//!
//! Render a markdown document to an image with a watermark baked into it.
//! The document is converted to HTML, styled, overlaid with a watermark
//! layer, and captured by a headless browser as one full-page image.
//!
//! # Architecture: Linear Pipeline
//!
//! ```text
//! markdown ─► markdown::convert ─► body HTML ─┐
//! config   ─► page CSS                        ├─► document::assemble ─► HTML ─► render ─► image
//!          ─► content CSS                     │
//!          ─► watermark CSS ──────────────────┘
//! ```
//!
//! Every stage is a plain function of its inputs. Configuration is resolved
//! and validated once at startup into immutable values; no stage reads
//! process state. The only stage with side effects beyond the output file is
//! the rendering bridge, which sits behind the [`render::RenderBackend`]
//! trait so the rest of the pipeline can be tested without a browser.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`escape`] | Markup and CSS string escaping for untrusted watermark text |
//! | [`watermark`] | Tile synthesis, data URI encoding, and the watermark style layer |
//! | [`markdown`] | Markdown to body HTML, bare-URL linking, title extraction |
//! | [`document`] | Style layer resolution and final document assembly |
//! | [`render`] | Headless Chrome capture, output encoding, atomic writes |
//! | [`config`] | `inkmark.toml` loading, merging, validation, and page CSS |
//! | [`naming`] | Output path, image format, and fallback title derivation |
//! | [`output`] | CLI output formatting |
//! | [`types`] | Shared types (`Diagnostic`, `ImageFormat`) |
//!
//! # Design Decisions
//!
//! ## Watermark as a Style Layer
//!
//! The watermark is not drawn onto the captured image afterwards. It is a
//! CSS layer inside the document, painted by the browser along with the
//! content. This keeps the watermark text crisp at any device scale and lets
//! one mechanism serve both output formats: the `html` command emits the
//! same document the `render` command captures.
//!
//! ## Declarative Coverage
//!
//! The tiled overlay is a `body::after` pseudo-element sized by CSS to the
//! whole document, with the root element as its positioning context. Nothing
//! measures the content. A one-paragraph note and a fifty-page report get
//! byte-identical watermark rules.
//!
//! ## Self-Contained Documents
//!
//! The tile image is inlined as a base64 SVG data URI and all stylesheets are
//! embedded in `<style>` elements. The browser never fetches anything, so a
//! capture cannot fail or stall on a missing resource.
//!
//! ## Layer Order Is Precedence
//!
//! Styles are emitted page → content → watermark. A later layer wins on equal
//! specificity, and the watermark declarations are additionally `!important`,
//! so a custom content stylesheet cannot hide the watermark by accident.
//!
//! ## Reproducible Jitter
//!
//! Per-character jitter draws from an injected random source. Pass a seed
//! (`--seed` or `watermark.seed`) and the tile is byte-for-byte reproducible.

pub mod config;
pub mod document;
pub mod escape;
pub mod markdown;
pub mod naming;
pub mod output;
pub mod render;
pub mod types;
pub mod watermark;

#[cfg(test)]
pub(crate) mod test_helpers;
