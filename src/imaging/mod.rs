//! Image processing core: sniffing, planning, and the transform engine.
//!
//! | Concern | Module |
//! |---|---|
//! | **Sniff** | [`sniff`] — HEIC vs natively-decodable, byte-pattern only |
//! | **Plan** | [`matrix`] — widths × formats × quality, variant filenames |
//! | **Transform** | [`engine`] trait + [`rust_engine`] implementation |
//!
//! The module is split into:
//! - **Calculations**: pure functions for dimension math (unit testable)
//! - **Parameters**: data structures describing transform instructions
//! - **Engine**: [`ImageEngine`] trait + [`RustEngine`]
//! - **Matrix**: the fixed variant configuration and naming rule

pub mod engine;
pub mod matrix;
pub mod params;
pub mod rust_engine;
pub mod sniff;

mod calculations;

pub use calculations::constrain_width;
pub use engine::{EngineError, ImageEngine, ImageInfo};
pub use matrix::{FORMATS, TARGET_WIDTHS, plan_with, quality_for, variant_configs, variant_filename};
pub use params::{ImageFormat, TransformInstruction};
pub use rust_engine::{RustEngine, validate_source};
pub use sniff::{SourceKind, classify};

// Re-exported for tests (variants.rs tests drive the generator through this)
#[cfg(test)]
pub use engine::tests::MockEngine;
