//! Engine trait and shared types for the transform pipeline.
//!
//! [`ImageEngine`] is the seam between variant orchestration and pixel work:
//! normalize (HEIC → decodable raster), probe (cheap metadata read), and
//! transform (orient → resize → encode). The production implementation is
//! [`RustEngine`](super::rust_engine::RustEngine); tests drive the generator
//! through a recording mock so the orchestration invariants (single
//! normalize, all-or-nothing fan-out) are checked without encoding pixels.

use super::params::{ImageFormat, TransformInstruction};
use std::borrow::Cow;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Input buffer is not a decodable image (corrupt, truncated, or
    /// genuinely unsupported format).
    #[error("failed to decode image: {0}")]
    Decode(String),
    /// A format-specific encode step failed independent of decode.
    #[error("{format} encode failed: {reason}")]
    Encode {
        format: ImageFormat,
        reason: String,
    },
    /// HEIC container could not be converted to a decodable raster.
    #[error("HEIC conversion failed: {0}")]
    Heic(String),
}

/// Metadata of a prepared buffer, read without a full decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Short format name (`"jpg"`, `"png"`, …) when the container is
    /// recognized.
    pub format: Option<&'static str>,
}

/// The pixel-work boundary of the variant pipeline.
///
/// All three operations are read-only over their input buffers, so a single
/// prepared buffer is safely shared by concurrent `transform` calls —
/// implementations must be `Sync` for rayon's fan-out.
pub trait ImageEngine: Sync {
    /// Convert a raw upload into a buffer the transform stage can always
    /// decode. HEIC is re-encoded to lossless PNG; everything else is
    /// returned borrowed, unchanged.
    fn normalize<'a>(&self, raw: &'a [u8]) -> Result<Cow<'a, [u8]>, EngineError>;

    /// Read dimensions and container format of a prepared buffer.
    fn probe(&self, prepared: &[u8]) -> Result<ImageInfo, EngineError>;

    /// Produce one encoded variant: orientation correction, optional
    /// width-constrained resize (never enlarging), then encode.
    fn transform(
        &self,
        prepared: &[u8],
        instruction: &TransformInstruction,
    ) -> Result<Vec<u8>, EngineError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock engine that records operations without touching pixels.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct MockEngine {
        pub operations: Mutex<Vec<RecordedOp>>,
        /// When set, `normalize` returns this owned buffer (simulating a
        /// HEIC conversion); otherwise it passes the input through borrowed.
        pub normalize_output: Option<Vec<u8>>,
        /// When set, `transform` fails for the matching (width, format).
        pub fail_on: Option<(Option<u32>, ImageFormat)>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Normalize { input_len: usize },
        Probe,
        Transform {
            width: Option<u32>,
            format: ImageFormat,
            quality: u8,
        },
    }

    impl MockEngine {
        pub fn new() -> Self {
            Self::default()
        }

        /// Simulate a HEIC source: `normalize` replaces the input with `out`.
        pub fn converting_to(out: Vec<u8>) -> Self {
            Self {
                normalize_output: Some(out),
                ..Self::default()
            }
        }

        /// Fail the transform for one specific matrix slot.
        pub fn failing_on(width: Option<u32>, format: ImageFormat) -> Self {
            Self {
                fail_on: Some((width, format)),
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn normalize_calls(&self) -> usize {
            self.get_operations()
                .iter()
                .filter(|op| matches!(op, RecordedOp::Normalize { .. }))
                .count()
        }
    }

    impl ImageEngine for MockEngine {
        fn normalize<'a>(&self, raw: &'a [u8]) -> Result<Cow<'a, [u8]>, EngineError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Normalize { input_len: raw.len() });

            match &self.normalize_output {
                Some(out) => Ok(Cow::Owned(out.clone())),
                None => Ok(Cow::Borrowed(raw)),
            }
        }

        fn probe(&self, _prepared: &[u8]) -> Result<ImageInfo, EngineError> {
            self.operations.lock().unwrap().push(RecordedOp::Probe);
            Ok(ImageInfo {
                width: 4000,
                height: 3000,
                format: Some("jpg"),
            })
        }

        fn transform(
            &self,
            prepared: &[u8],
            instruction: &TransformInstruction,
        ) -> Result<Vec<u8>, EngineError> {
            self.operations.lock().unwrap().push(RecordedOp::Transform {
                width: instruction.width,
                format: instruction.format,
                quality: instruction.quality,
            });

            if self.fail_on == Some((instruction.width, instruction.format)) {
                return Err(EngineError::Encode {
                    format: instruction.format,
                    reason: "mock failure".into(),
                });
            }

            // Deterministic fake output whose length varies per slot, so
            // size bookkeeping is observable.
            let width_label = instruction
                .width
                .map_or_else(|| "orig".to_string(), |w| w.to_string());
            let mut out = format!("{}:{}:", instruction.format, width_label).into_bytes();
            out.extend_from_slice(&prepared[..prepared.len().min(4)]);
            Ok(out)
        }
    }

    #[test]
    fn mock_passes_input_through_by_default() {
        let engine = MockEngine::new();
        let raw = b"jpegdata".to_vec();
        let prepared = engine.normalize(&raw).unwrap();
        assert!(matches!(prepared, Cow::Borrowed(_)));
        assert_eq!(engine.normalize_calls(), 1);
    }

    #[test]
    fn mock_converting_returns_owned_buffer() {
        let engine = MockEngine::converting_to(b"pngdata".to_vec());
        let raw = b"heicdata".to_vec();
        let prepared = engine.normalize(&raw).unwrap();
        assert_eq!(prepared.as_ref(), b"pngdata");
        assert!(matches!(prepared, Cow::Owned(_)));
    }

    #[test]
    fn mock_records_transform_instruction() {
        let engine = MockEngine::new();
        let instruction = TransformInstruction {
            width: Some(800),
            format: ImageFormat::Webp,
            quality: 80,
        };
        engine.transform(b"data", &instruction).unwrap();

        let ops = engine.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Transform {
                width: Some(800),
                format: ImageFormat::Webp,
                quality: 80,
            }
        ));
    }

    #[test]
    fn mock_fails_only_on_configured_slot() {
        let engine = MockEngine::failing_on(Some(800), ImageFormat::Avif);

        let ok = TransformInstruction {
            width: Some(1920),
            format: ImageFormat::Avif,
            quality: 75,
        };
        assert!(engine.transform(b"data", &ok).is_ok());

        let bad = TransformInstruction {
            width: Some(800),
            format: ImageFormat::Avif,
            quality: 75,
        };
        assert!(matches!(
            engine.transform(b"data", &bad),
            Err(EngineError::Encode { format: ImageFormat::Avif, .. })
        ));
    }
}
