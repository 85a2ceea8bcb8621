//! The variant matrix: which derivatives exist for every uploaded photo.
//!
//! The matrix is fixed configuration, not caller input — every photo gets the
//! same widths × formats at the same quality, so downstream caches and the
//! CDN URL convention never have to consult stored state.
//!
//! ```text
//! widths:  1920 (large), 800 (thumbnail)
//! formats: webp (q80), avif (q75), jpeg (q85)
//! ```
//!
//! 2 widths × 3 formats = 6 instructions per photo. The original-size slot
//! (`width = None`) is deliberately excluded: the uploaded original is stored
//! as-is, unprocessed.
//!
//! Plan order is deterministic (width descending, formats in declared order)
//! but callers must not depend on *execution* order — the generator runs
//! instructions concurrently and only the output set is guaranteed.

use super::params::{ImageFormat, TransformInstruction};

/// Target widths in plan order: full-size web version, then thumbnail.
pub const TARGET_WIDTHS: [u32; 2] = [1920, 800];

/// Output formats in plan order.
pub const FORMATS: [ImageFormat; 3] = [ImageFormat::Webp, ImageFormat::Avif, ImageFormat::Jpeg];

/// Fixed per-format encode quality (0–100).
///
/// AVIF achieves better compression at equivalent perceived quality, so it
/// runs a lower scalar than WebP/JPEG.
pub fn quality_for(format: ImageFormat) -> u8 {
    match format {
        ImageFormat::Webp => 80,
        ImageFormat::Avif => 75,
        ImageFormat::Jpeg => 85,
    }
}

/// Expand the full variant matrix into transform instructions.
pub fn variant_configs() -> Vec<TransformInstruction> {
    plan_with(|_| true)
}

/// Expand the matrix, keeping only instructions the predicate accepts.
///
/// The filter hook exists for partial regeneration (e.g. backfilling one
/// missing format) without re-deriving the matrix logic elsewhere.
pub fn plan_with(filter: impl Fn(&TransformInstruction) -> bool) -> Vec<TransformInstruction> {
    let mut configs = Vec::with_capacity(TARGET_WIDTHS.len() * FORMATS.len());
    for width in TARGET_WIDTHS {
        for format in FORMATS {
            let instruction = TransformInstruction {
                width: Some(width),
                format,
                quality: quality_for(format),
            };
            if filter(&instruction) {
                configs.push(instruction);
            }
        }
    }
    configs
}

/// Derive a variant filename from the original upload's name.
///
/// `IMG_0036.jpeg` at width 800 in WebP becomes `IMG_0036_800w.webp`.
/// A `None` width (the original-size slot) carries no width suffix.
/// Only the final extension is stripped; the name is never treated as a
/// filesystem path.
pub fn variant_filename(original_name: &str, width: Option<u32>, format: ImageFormat) -> String {
    let base = match original_name.rfind('.') {
        Some(pos) if pos + 1 < original_name.len() => &original_name[..pos],
        _ => original_name,
    };
    match width {
        Some(w) => format!("{base}_{w}w.{}", format.as_str()),
        None => format!("{base}.{}", format.as_str()),
    }
}
