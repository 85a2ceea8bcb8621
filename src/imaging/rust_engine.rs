//! Pure Rust engine implementation.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate (pure Rust decoders) |
//! | Orientation | `image::metadata::Orientation` via the decoder interface |
//! | Resize | `image::DynamicImage::resize` with `Lanczos3` filter |
//! | Encode → WebP (lossy) | `webp` crate (libwebp) — the `image` WebP encoder is lossless-only |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (baseline) |
//! | HEIC → PNG | `libheif-rs`, behind the `heic` cargo feature |
//!
//! The `image` crate's `"avif"` feature only enables the **encoder** (rav1e),
//! which is all we need — AVIF is strictly an output format here. Decoding
//! would require `"avif-native"` (a C library we don't use).

use super::calculations::constrain_width;
use super::engine::{EngineError, ImageEngine, ImageInfo};
use super::params::{ImageFormat, TransformInstruction};
use super::sniff::{SourceKind, classify};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageDecoder, ImageReader};
use log::{debug, warn};
use std::borrow::Cow;
use std::io::Cursor;

/// Pure Rust engine using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustEngine;

impl RustEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Cheap "could the pipeline accept this at all" check for upload validation.
///
/// HEIC is accepted on the sniff alone (full validation happens at
/// normalize time); everything else must at least yield a recognizable
/// header with readable dimensions.
pub fn validate_source(buffer: &[u8]) -> bool {
    match classify(buffer) {
        SourceKind::Heic => true,
        SourceKind::Native => ImageReader::new(Cursor::new(buffer))
            .with_guessed_format()
            .ok()
            .and_then(|reader| reader.into_dimensions().ok())
            .is_some(),
    }
}

/// Decode a prepared buffer with EXIF orientation applied.
///
/// Orientation correction MUST precede any resize: 90°/270° rotations swap
/// width and height, and the width constraint applies to post-rotation
/// geometry.
fn decode_oriented(buffer: &[u8]) -> Result<DynamicImage, EngineError> {
    use image::metadata::Orientation;

    let reader = ImageReader::new(Cursor::new(buffer))
        .with_guessed_format()
        .map_err(|e| EngineError::Decode(format!("unrecognized container: {e}")))?;

    match reader.into_decoder() {
        Ok(mut decoder) => {
            let orientation = decoder
                .orientation()
                .unwrap_or(Orientation::NoTransforms);
            let mut img = DynamicImage::from_decoder(decoder)
                .map_err(|e| EngineError::Decode(e.to_string()))?;
            if orientation != Orientation::NoTransforms {
                debug!("applying EXIF orientation {orientation:?}");
                img.apply_orientation(orientation);
            }
            Ok(img)
        }
        // Some formats lack the decoder interface; decode without
        // orientation rather than rejecting them.
        Err(e) => {
            warn!("no decoder interface ({e}), decoding without orientation");
            ImageReader::new(Cursor::new(buffer))
                .with_guessed_format()
                .map_err(|e| EngineError::Decode(e.to_string()))?
                .decode()
                .map_err(|e| EngineError::Decode(e.to_string()))
        }
    }
}

/// Encode a decoded image to the requested output format.
///
/// JPEG output is baseline, not progressive — the `image` crate's encoder
/// does not emit progressive scans.
fn encode(img: &DynamicImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>, EngineError> {
    match format {
        ImageFormat::Webp => {
            let rgba = img.to_rgba8();
            let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
            Ok(encoder.encode(quality as f32).to_vec())
        }
        ImageFormat::Avif => {
            let mut buf = Cursor::new(Vec::new());
            let encoder =
                image::codecs::avif::AvifEncoder::new_with_speed_quality(&mut buf, 6, quality);
            img.write_with_encoder(encoder)
                .map_err(|e| EngineError::Encode {
                    format,
                    reason: e.to_string(),
                })?;
            Ok(buf.into_inner())
        }
        ImageFormat::Jpeg => {
            let mut buf = Cursor::new(Vec::new());
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
            img.to_rgb8()
                .write_with_encoder(encoder)
                .map_err(|e| EngineError::Encode {
                    format,
                    reason: e.to_string(),
                })?;
            Ok(buf.into_inner())
        }
    }
}

impl ImageEngine for RustEngine {
    fn normalize<'a>(&self, raw: &'a [u8]) -> Result<Cow<'a, [u8]>, EngineError> {
        match classify(raw) {
            SourceKind::Native => Ok(Cow::Borrowed(raw)),
            SourceKind::Heic => {
                debug!("detected HEIC container, converting to PNG");
                let img = heic::decode(raw)?;
                let mut out = Cursor::new(Vec::new());
                img.write_to(&mut out, image::ImageFormat::Png)
                    .map_err(|e| EngineError::Heic(format!("PNG re-encode failed: {e}")))?;
                Ok(Cow::Owned(out.into_inner()))
            }
        }
    }

    fn probe(&self, prepared: &[u8]) -> Result<ImageInfo, EngineError> {
        let reader = ImageReader::new(Cursor::new(prepared))
            .with_guessed_format()
            .map_err(|e| EngineError::Decode(format!("unrecognized container: {e}")))?;
        let format = reader
            .format()
            .and_then(|f| f.extensions_str().first().copied());
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| EngineError::Decode(e.to_string()))?;
        Ok(ImageInfo {
            width,
            height,
            format,
        })
    }

    fn transform(
        &self,
        prepared: &[u8],
        instruction: &TransformInstruction,
    ) -> Result<Vec<u8>, EngineError> {
        let img = decode_oriented(prepared)?;

        let img = match instruction
            .width
            .and_then(|target| constrain_width(img.dimensions(), target))
        {
            Some((width, height)) => img.resize(width, height, FilterType::Lanczos3),
            None => img,
        };

        encode(&img, instruction.format, instruction.quality)
    }
}

#[cfg(feature = "heic")]
mod heic {
    use super::EngineError;
    use image::{DynamicImage, RgbImage};
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    /// Decode the primary image of a HEIC/HEIF container to RGB8.
    pub fn decode(data: &[u8]) -> Result<DynamicImage, EngineError> {
        let lib_heif = LibHeif::new();
        let ctx = HeifContext::read_from_bytes(data)
            .map_err(|e| EngineError::Heic(e.to_string()))?;
        let handle = ctx
            .primary_image_handle()
            .map_err(|e| EngineError::Heic(e.to_string()))?;

        let img = lib_heif
            .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
            .map_err(|e| EngineError::Heic(e.to_string()))?;

        let planes = img.planes();
        let interleaved = planes
            .interleaved
            .ok_or_else(|| EngineError::Heic("no interleaved RGB plane".into()))?;

        let width = interleaved.width;
        let height = interleaved.height;
        let stride = interleaved.stride;
        let row_bytes = width as usize * 3;

        // Rows may be padded to the stride; copy row by row.
        let mut rgb = Vec::with_capacity(row_bytes * height as usize);
        for y in 0..height as usize {
            let start = y * stride;
            rgb.extend_from_slice(&interleaved.data[start..start + row_bytes]);
        }

        RgbImage::from_raw(width, height, rgb)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| EngineError::Heic("decoded plane has unexpected size".into()))
    }
}

#[cfg(not(feature = "heic"))]
mod heic {
    use super::EngineError;
    use image::DynamicImage;

    pub fn decode(_data: &[u8]) -> Result<DynamicImage, EngineError> {
        Err(EngineError::Heic(
            "HEIC support not compiled in (enable the `heic` feature)".into(),
        ))
    }
}
