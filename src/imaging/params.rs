//! Parameter types for variant transforms.
//!
//! These types describe *what* to produce, not *how* to produce it. They are
//! the interface between the [`matrix`](super::matrix) planner (which decides
//! which variants exist) and the [`engine`](super::engine) (which does the
//! pixel work). The split keeps the engine swappable — tests run the whole
//! generator against a recording mock.

use serde::Serialize;

/// Output encodings the pipeline can produce.
///
/// This is the complete, closed set: an instruction's format is always drawn
/// from here, never from caller input, so the engine treats an unknown format
/// as a programming error rather than a runtime failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Webp,
    Avif,
    Jpeg,
}

impl ImageFormat {
    /// File extension / wire name, as it appears in variant filenames.
    pub fn as_str(self) -> &'static str {
        match self {
            ImageFormat::Webp => "webp",
            ImageFormat::Avif => "avif",
            ImageFormat::Jpeg => "jpeg",
        }
    }

    /// MIME type used when the variant is uploaded to object storage.
    pub fn content_type(self) -> &'static str {
        match self {
            ImageFormat::Webp => "image/webp",
            ImageFormat::Avif => "image/avif",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One planned transform: target width, output format, encode quality.
///
/// `width: None` means "keep original dimensions" and is reserved for the
/// original-size slot — the default matrix never emits it, since the
/// original upload is stored untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformInstruction {
    pub width: Option<u32>,
    pub format: ImageFormat,
    /// Encode quality, 0–100.
    pub quality: u8,
}
