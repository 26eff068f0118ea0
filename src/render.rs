//! Rendering bridge: assembled HTML in, raster image out.
//!
//! The [`RenderBackend`] trait is the seam between the pipeline and the
//! browser. It has one operation, [`capture`](RenderBackend::capture), which
//! turns a self-contained HTML document into PNG bytes covering the full
//! content height. The production implementation is [`ChromeBackend`];
//! tests use a recording mock.
//!
//! ## Capture sequence
//!
//! ```text
//! write temp .html ─► launch Chrome (width × viewport_height)
//!   ─► navigate ─► await fonts + two frames (bounded) ─► settle
//!   ─► measure content height ─► grow window ─► screenshot
//! ```
//!
//! The readiness wait is bounded by `ready_timeout`. When the page cannot
//! report readiness in time, a fixed [`FALLBACK_DELAY`] is used instead. Both
//! are heuristics: a document with heavy imagery may still be painting when
//! the capture is taken.
//!
//! ## Output
//!
//! PNG bytes are written as they come from the browser. JPEG and WebP are
//! re-encoded with the `image` crate. The file is written to a temporary
//! sibling first and renamed into place, so a failed run never leaves a
//! partial image at the target path.

use crate::config::RenderConfig;
use crate::types::ImageFormat;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::types::Bounds;
use headless_chrome::{Browser, LaunchOptions};
use image::{DynamicImage, ImageEncoder, ImageReader};
use std::fmt::Display;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Wait used when the page never reports readiness.
pub const FALLBACK_DELAY: Duration = Duration::from_millis(500);

/// JPEG quality for re-encoded captures.
const JPEG_QUALITY: u8 = 90;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("browser error: {0}")]
    Browser(String),
    #[error("capture failed: {0}")]
    Capture(String),
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

fn browser_err(e: impl Display) -> RenderError {
    RenderError::Browser(e.to_string())
}

/// Everything the backend needs to know about the capture.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOptions {
    /// Viewport width in CSS px.
    pub width: u32,
    /// Initial viewport height in CSS px, before the window grows to the content.
    pub viewport_height: u32,
    /// Device scale factor.
    pub scale: f64,
    /// Extra fixed wait after readiness.
    pub settle: Duration,
    /// Bound on the readiness wait.
    pub ready_timeout: Duration,
}

impl CaptureOptions {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            width: config.page.width,
            viewport_height: config.render.viewport_height,
            scale: config.render.scale,
            settle: Duration::from_millis(config.render.settle_ms),
            ready_timeout: Duration::from_millis(config.render.ready_timeout_ms),
        }
    }
}

/// Turns an HTML document into a full-page PNG.
pub trait RenderBackend {
    fn capture(&self, html: &str, options: &CaptureOptions) -> Result<Vec<u8>, RenderError>;
}

// =============================================================================
// Chrome backend
// =============================================================================

/// Captures with a locally installed Chrome or Chromium.
///
/// A fresh headless browser is launched per capture and shut down when the
/// capture returns.
#[derive(Debug, Default)]
pub struct ChromeBackend {
    /// Browser binary. `None` lets headless_chrome locate one.
    pub chrome_path: Option<PathBuf>,
    /// Where the page handed to the browser is written. `None` uses the
    /// system temp directory.
    pub temp_dir: Option<PathBuf>,
}

/// Write `html` to a `.html` temp file that is removed on drop.
///
/// Deletion errors are ignored.
fn write_page(html: &str, dir: Option<&Path>) -> std::io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("inkmark-").suffix(".html");
    let mut page = match dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    page.write_all(html.as_bytes())?;
    page.flush()?;
    Ok(page)
}

/// Resolves `true` once fonts are loaded and two frames have been painted,
/// or `false` when the bound expires first.
fn readiness_script(timeout: Duration) -> String {
    format!(
        "Promise.race([\
            document.fonts.ready.then(() => new Promise(resolve => \
                requestAnimationFrame(() => requestAnimationFrame(() => resolve(true))))),\
            new Promise(resolve => setTimeout(() => resolve(false), {}))\
        ])",
        timeout.as_millis()
    )
}

const CONTENT_HEIGHT_SCRIPT: &str = "Math.ceil(Math.max(\
    document.documentElement.scrollHeight, \
    document.body ? document.body.scrollHeight : 0))";

impl RenderBackend for ChromeBackend {
    fn capture(&self, html: &str, options: &CaptureOptions) -> Result<Vec<u8>, RenderError> {
        // Lives until this function returns, on every path.
        let page = write_page(html, self.temp_dir.as_deref())?;

        let browser = Browser::new(LaunchOptions {
            headless: true,
            window_size: Some((options.width, options.viewport_height)),
            path: self.chrome_path.clone(),
            ..Default::default()
        })
        .map_err(browser_err)?;
        let tab = browser.new_tab().map_err(browser_err)?;

        let url = format!("file://{}", page.path().display());
        tracing::debug!(%url, "loading document");
        tab.navigate_to(&url)
            .map_err(browser_err)?
            .wait_until_navigated()
            .map_err(browser_err)?;

        let ready = tab
            .evaluate(&readiness_script(options.ready_timeout), true)
            .ok()
            .and_then(|result| result.value)
            .and_then(|value| value.as_bool())
            .unwrap_or(false);
        if !ready {
            tracing::warn!(
                timeout_ms = options.ready_timeout.as_millis() as u64,
                "page did not report ready; using fixed delay"
            );
            thread::sleep(FALLBACK_DELAY);
        }
        if !options.settle.is_zero() {
            thread::sleep(options.settle);
        }

        let height = tab
            .evaluate(CONTENT_HEIGHT_SCRIPT, false)
            .map_err(browser_err)?
            .value
            .and_then(|value| value.as_f64())
            .ok_or_else(|| RenderError::Capture("could not measure content height".into()))?
            .max(f64::from(options.viewport_height));
        tracing::debug!(height, "measured content height");

        tab.set_bounds(Bounds::Normal {
            left: None,
            top: None,
            width: Some(f64::from(options.width)),
            height: Some(height),
        })
        .map_err(browser_err)?;

        let png = tab
            .capture_screenshot(
                Page::CaptureScreenshotFormatOption::Png,
                None,
                Some(Page::Viewport {
                    x: 0.0,
                    y: 0.0,
                    width: f64::from(options.width),
                    height,
                    scale: options.scale,
                }),
                true,
            )
            .map_err(|e| RenderError::Capture(e.to_string()))?;
        Ok(png)
    }
}

// =============================================================================
// Output
// =============================================================================

/// Pixel size of an encoded image.
pub fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32), RenderError> {
    let dims = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()?;
    Ok(dims)
}

/// Convert captured PNG bytes into `format`.
pub fn encode_output(png: Vec<u8>, format: ImageFormat) -> Result<Vec<u8>, RenderError> {
    let decode = || image::load_from_memory_with_format(&png, image::ImageFormat::Png);
    let mut out = Vec::new();
    match format {
        ImageFormat::Png => return Ok(png),
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = decode()?.to_rgb8();
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
                .write_image(
                    rgb.as_raw(),
                    rgb.width(),
                    rgb.height(),
                    image::ExtendedColorType::Rgb8,
                )?;
        }
        ImageFormat::Webp => {
            DynamicImage::ImageRgba8(decode()?.to_rgba8())
                .write_to(&mut Cursor::new(&mut out), image::ImageFormat::WebP)?;
        }
    }
    Ok(out)
}

/// Write `bytes` to `path` atomically: temp file in the same directory, then rename.
pub fn write_output(bytes: &[u8], path: &Path) -> Result<(), RenderError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| RenderError::Io(e.error))?;
    Ok(())
}

/// What [`render_to_file`] produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImage {
    pub path: PathBuf,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
}

/// Capture `html`, encode it as `format`, and write it to `path`.
pub fn render_to_file(
    backend: &dyn RenderBackend,
    html: &str,
    options: &CaptureOptions,
    format: ImageFormat,
    path: &Path,
) -> Result<RenderedImage, RenderError> {
    let png = backend.capture(html, options)?;
    let (width, height) = image_dimensions(&png)?;
    tracing::debug!(width, height, "captured page");

    let encoded = encode_output(png, format)?;
    write_output(&encoded, path)?;
    tracing::debug!(path = %path.display(), bytes = encoded.len(), "wrote image");

    Ok(RenderedImage {
        path: path.to_path_buf(),
        format,
        width,
        height,
        bytes: encoded.len(),
    })
}
