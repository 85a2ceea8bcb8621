//! Variant generation: fan a prepared source out over the variant matrix.
//!
//! One call to [`generate_variants`] turns a raw upload into the full set of
//! derivative images. The flow is:
//!
//! 1. Normalize once — a HEIC source is converted to PNG a single time no
//!    matter how many variants are planned (the prepared buffer is shared,
//!    read-only, by every transform).
//! 2. Expand the matrix into transform instructions.
//! 3. Run the engine over every instruction in parallel (rayon).
//! 4. Join: all variants or a single error — a partial variant set is never
//!    returned, because a catalog entry referencing missing derivative sizes
//!    is worse than a visible upload failure.
//!
//! No I/O happens here; buffers stay in memory until the caller persists
//! them. Callers processing many photos at once should bound their own
//! parallelism — each in-flight photo holds several decoded-raster-sized
//! buffers (roughly width × height × 4 bytes each) at peak.

use crate::imaging::{
    EngineError, ImageEngine, ImageFormat, TransformInstruction, matrix, variant_filename,
};
use log::debug;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VariantError {
    /// The source buffer could not be prepared for transforms at all.
    #[error("failed to prepare source image: {0}")]
    Prepare(#[source] EngineError),
    /// A specific variant's transform failed; the whole generation fails.
    #[error("variant {filename} failed: {source}")]
    Transform {
        filename: String,
        #[source]
        source: EngineError,
    },
}

/// One generated derivative, held in memory until the caller uploads it.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedVariant {
    /// Derived via the deterministic naming rule (`{base}_{width}w.{format}`).
    pub filename: String,
    #[serde(skip)]
    pub buffer: Vec<u8>,
    pub width: Option<u32>,
    pub format: ImageFormat,
    /// Encoded size in bytes; always equals `buffer.len()`.
    pub size: usize,
}

/// Generate the full variant matrix for one uploaded photo.
///
/// All-or-nothing: if any planned transform fails, the error identifies the
/// failed variant and no partial set is observable.
pub fn generate_variants(
    engine: &impl ImageEngine,
    raw: &[u8],
    original_filename: &str,
) -> Result<Vec<GeneratedVariant>, VariantError> {
    generate_variants_filtered(engine, raw, original_filename, |_| true)
}

/// Generate a restricted subset of the matrix (e.g. backfill one format).
///
/// The filter runs over planned instructions before any pixel work, so a
/// fully-rejecting filter costs one normalize and nothing else.
pub fn generate_variants_filtered(
    engine: &impl ImageEngine,
    raw: &[u8],
    original_filename: &str,
    filter: impl Fn(&TransformInstruction) -> bool,
) -> Result<Vec<GeneratedVariant>, VariantError> {
    let configs = matrix::plan_with(filter);

    // Shared-decode invariant: normalize exactly once per generation.
    let prepared = engine.normalize(raw).map_err(VariantError::Prepare)?;

    if let Ok(info) = engine.probe(&prepared) {
        debug!(
            "processing {original_filename}: {}x{} ({})",
            info.width,
            info.height,
            info.format.unwrap_or("unknown")
        );
    }

    configs
        .par_iter()
        .map(|instruction| {
            let variant = run_instruction(engine, &prepared, original_filename, instruction)?;
            debug!(
                "generated {}: {:.1} KB",
                variant.filename,
                variant.size as f64 / 1024.0
            );
            Ok(variant)
        })
        .collect()
}

/// Generate a single variant outside the default matrix.
pub fn generate_single_variant(
    engine: &impl ImageEngine,
    raw: &[u8],
    original_filename: &str,
    width: Option<u32>,
    format: ImageFormat,
    quality: u8,
) -> Result<GeneratedVariant, VariantError> {
    let prepared = engine.normalize(raw).map_err(VariantError::Prepare)?;
    let instruction = TransformInstruction {
        width,
        format,
        quality,
    };
    run_instruction(engine, &prepared, original_filename, &instruction)
}

fn run_instruction(
    engine: &impl ImageEngine,
    prepared: &[u8],
    original_filename: &str,
    instruction: &TransformInstruction,
) -> Result<GeneratedVariant, VariantError> {
    let filename = variant_filename(original_filename, instruction.width, instruction.format);
    let buffer =
        engine
            .transform(prepared, instruction)
            .map_err(|source| VariantError::Transform {
                filename: filename.clone(),
                source,
            })?;
    let size = buffer.len();
    Ok(GeneratedVariant {
        filename,
        buffer,
        width: instruction.width,
        format: instruction.format,
        size,
    })
}
