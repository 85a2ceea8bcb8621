//! Byte-pattern classification of uploaded image buffers.
//!
//! HEIC/HEIF containers cannot be decoded by the pure-Rust decode path, so
//! uploads are sniffed before any decode attempt. ISO-BMFF files carry a
//! `ftyp` box whose brand starts at byte 8; checking bytes 4..12 for the
//! HEIC brand markers covers `ftypheic`, `ftypmif1` and `ftypmsf1` without
//! parsing the box structure.
//!
//! Classification is best-effort: a false negative simply falls through to
//! the generic decode path, which fails loudly on a genuinely unsupported
//! format. A buffer too short to carry a `ftyp` box is never HEIC.

/// How a raw upload buffer should enter the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// HEIC/HEIF container; must be normalized to PNG before transforms.
    Heic,
    /// Anything else — handed to the decoder as-is.
    Native,
}

/// Brand markers that identify HEIC/HEIF inside the sniff window.
const HEIC_BRANDS: [&[u8; 4]; 3] = [b"heic", b"mif1", b"msf1"];

/// Classify a raw buffer by its `ftyp` header bytes.
///
/// Reads bytes 4..12 and looks for any HEIC brand marker. Never fails:
/// short or garbage buffers classify as [`SourceKind::Native`].
pub fn classify(buffer: &[u8]) -> SourceKind {
    let Some(header) = buffer.get(4..12) else {
        return SourceKind::Native;
    };

    let is_heic = header
        .windows(4)
        .any(|window| HEIC_BRANDS.iter().any(|brand| window == *brand));

    if is_heic {
        SourceKind::Heic
    } else {
        SourceKind::Native
    }
}
