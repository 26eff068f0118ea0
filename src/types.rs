//! Shared types used across pipeline stages.

use std::fmt;
use std::path::PathBuf;

/// A non-fatal problem the run recovered from.
///
/// Collected while building the document and reported by the CLI after the
/// output is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The default content stylesheet could not be read; the document was
    /// rendered without a content layer.
    DefaultStyleUnavailable { path: PathBuf, reason: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DefaultStyleUnavailable { path, reason } => write!(
                f,
                "default stylesheet {} unavailable ({reason}); rendering without content styles",
                path.display()
            ),
        }
    }
}

/// Raster format of the output image, chosen from the output file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    /// Match a file extension, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::Webp),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }
}
