//! Input and output naming.
//!
//! Decides where the rendered image goes, which raster format it uses, and
//! the fallback document title when the markdown has no `# heading`:
//!
//! | Input | Default output | Fallback title |
//! |---|---|---|
//! | `notes/q3-report.md` | `notes/q3-report.png` | "q3 report" |
//! | `README` | `README.png` | "README" |
//! | stdin | `output.png` | none ("Document") |
//!
//! The output format always follows the output file's extension. An
//! extension other than `png`, `jpg`/`jpeg`, or `webp` is an error rather
//! than a silent PNG.

use crate::types::ImageFormat;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name used for the image when the input came from stdin.
pub const STDIN_OUTPUT: &str = "output.png";

#[derive(Error, Debug, PartialEq)]
pub enum NamingError {
    #[error("unsupported output format for {path}: expected .png, .jpg, .jpeg or .webp")]
    UnsupportedFormat { path: PathBuf },
}

/// Where the markdown came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    File(PathBuf),
    Stdin,
}

impl InputSource {
    /// Short label for CLI output.
    pub fn label(&self) -> String {
        match self {
            InputSource::File(path) => path.display().to_string(),
            InputSource::Stdin => "<stdin>".to_string(),
        }
    }
}

/// `<stem>.png` beside the input file, or [`STDIN_OUTPUT`] in the working
/// directory for stdin.
pub fn default_output_path(input: &InputSource) -> PathBuf {
    match input {
        InputSource::File(path) => {
            let stem = path
                .file_stem()
                .map(|s| s.to_os_string())
                .unwrap_or_else(|| "output".into());
            let mut name = stem;
            name.push(".");
            name.push(ImageFormat::Png.extension());
            path.with_file_name(name)
        }
        InputSource::Stdin => PathBuf::from(STDIN_OUTPUT),
    }
}

/// Image format implied by the extension of `path`.
pub fn output_format(path: &Path) -> Result<ImageFormat, NamingError> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(ImageFormat::from_extension)
        .ok_or_else(|| NamingError::UnsupportedFormat {
            path: path.to_path_buf(),
        })
}

/// Title derived from the input file name: the stem with dashes and
/// underscores shown as spaces.
pub fn fallback_title(input: &InputSource) -> Option<String> {
    let InputSource::File(path) = input else {
        return None;
    };
    let stem = path.file_stem()?.to_string_lossy();
    let title = stem.replace(['-', '_'], " ");
    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}
