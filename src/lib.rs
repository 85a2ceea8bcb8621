//! # Photo Variants
//!
//! An in-memory image-variant pipeline for photo uploads: one raw buffer in,
//! a complete set of web-ready derivatives out, plus formatted capture
//! metadata and an all-or-nothing upload contract against object storage.
//!
//! # Architecture: Prepare Once, Fan Out
//!
//! A photo upload flows through four independent stages:
//!
//! ```text
//! 1. Sniff      raw bytes   →  Heic | Native        (brand-pattern only)
//! 2. Normalize  raw bytes   →  prepared buffer      (HEIC decoded once)
//! 3. Transform  prepared    →  width × format grid  (parallel, shared input)
//! 4. Upload     variants    →  object storage       (rollback on failure)
//! ```
//!
//! The prepared buffer is produced exactly once and shared read-only by every
//! transform. This matters for HEIC sources: the expensive container decode
//! happens a single time no matter how many variants are planned, instead of
//! once per variant.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Source sniffing, the variant matrix, and the transform engine |
//! | [`variants`] | Orchestration — normalize once, run the matrix in parallel, join all-or-nothing |
//! | [`exif`] | Capture-metadata extraction and formatting for catalog entries |
//! | [`storage`] | Object-key convention, sequential uploads, best-effort rollback |
//!
//! # Design Decisions
//!
//! ## A Fixed Matrix, Not Per-Request Parameters
//!
//! Every photo gets the same derivative set: two target widths (1920 for
//! display, 800 for thumbnails) crossed with three formats (WebP, AVIF, JPEG),
//! each at a per-format quality tuned once. Serving code can then construct
//! `<picture>` sources and storage keys from `(filename, width, format)` alone,
//! with no per-photo state. The matrix lives in one place,
//! [`imaging::matrix`], and everything else — planning, naming, bulk-delete
//! key reconstruction — derives from it.
//!
//! ## All-or-Nothing Generation
//!
//! If any variant's transform fails, the whole generation fails and nothing is
//! returned. A catalog entry whose 800w AVIF silently never existed is a
//! broken image on every gallery page; a visible upload failure is retried.
//! The same discipline extends to [`storage::upload_photo`]: a write failure
//! rolls back every object already persisted for that photo.
//!
//! ## The Engine Seam
//!
//! All pixel work goes through the [`imaging::ImageEngine`] trait. The
//! shipped implementation is [`imaging::RustEngine`]; tests drive the
//! orchestration through a mock that records its calls, so invariants like
//! "normalize runs exactly once" and "a failing transform aborts the set" are
//! asserted without decoding a single pixel.
//!
//! ## Pure-Rust Imaging, HEIC Behind a Feature
//!
//! Decoding and encoding use the `image` crate plus the `webp` crate for
//! lossy WebP — pure Rust, no system libraries, so the default build is fully
//! self-contained. The one exception is HEIC: there is no production-grade
//! pure-Rust HEIF decoder, so HEIC decoding binds `libheif` and is gated
//! behind the non-default `heic` cargo feature. Without it the pipeline
//! still handles every native format and reports a clear error for HEIC
//! sources.
//!
//! ## EXIF Is Best-Effort, Everything Else Is Not
//!
//! Capture metadata ([`exif::extract_exif_data`]) never fails the calling
//! operation: a photo with a corrupt or absent EXIF block is still a valid
//! photo, it just gets an empty summary. This is the deliberate opposite of
//! the generation and upload paths, where partial success is treated as
//! corruption.

pub mod exif;
pub mod imaging;
pub mod storage;
pub mod variants;

pub use exif::{ExifSummary, extract_exif_data};
pub use imaging::{ImageEngine, ImageFormat, RustEngine};
pub use storage::{ObjectStore, photo_variant_keys, sanitize_filename, upload_photo};
pub use variants::{GeneratedVariant, VariantError, generate_variants};
