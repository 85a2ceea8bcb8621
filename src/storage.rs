//! Object-storage coordination: key naming, uploads, and rollback.
//!
//! The pipeline never talks to storage directly — it hands its variant set
//! to [`upload_photo`], which persists the original plus every variant
//! against an [`ObjectStore`] and guarantees that a partially-failed upload
//! leaves zero objects behind.
//!
//! ## Key convention
//!
//! ```text
//! albums/{album_id}/{sanitized_filename}          # original, stored as-is
//! albums/{album_id}/{base}_{width}w.{format}      # each variant
//! ```
//!
//! The convention is deliberately reconstructible: [`photo_variant_keys`]
//! derives the full 7-key set (original + 2 widths × 3 formats) from
//! `(album_id, filename)` alone, so a later bulk delete never has to query
//! stored state.
//!
//! ## Rollback discipline
//!
//! Uploads run sequentially and a key enters the rollback log only after its
//! write is confirmed — never optimistically. A failure at upload N
//! therefore rolls back exactly the first N keys. Rollback itself is
//! best-effort: deletes run in parallel, individual failures are logged and
//! swallowed so they never mask the original upload error.

use crate::imaging::matrix::{FORMATS, TARGET_WIDTHS, variant_filename};
use crate::variants::GeneratedVariant;
use log::{error, warn};
use rayon::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage request failed: {0}")]
    Request(String),
}

#[derive(Error, Debug)]
pub enum UploadError {
    /// A write failed after `written` objects had already been persisted
    /// (all of which were rolled back, best-effort).
    #[error("upload of {key} failed after {written} object(s) written: {source}")]
    Store {
        key: String,
        written: usize,
        #[source]
        source: StoreError,
    },
}

/// Durable object storage, S3-style. Both operations are idempotent from
/// the coordinator's perspective.
pub trait ObjectStore: Sync {
    fn upload_object(&self, key: &str, buffer: &[u8], content_type: &str)
    -> Result<(), StoreError>;

    fn delete_object(&self, key: &str) -> Result<(), StoreError>;
}

/// Sanitize an untrusted upload filename for use inside an object key.
///
/// Strips path-traversal sequences and replaces anything outside
/// `[A-Za-z0-9._-]` with an underscore. The result is a single path
/// segment — never a filesystem path.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .replace("../", "")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Key for the untouched original upload.
pub fn original_key(album_id: &str, sanitized_filename: &str) -> String {
    format!("albums/{album_id}/{sanitized_filename}")
}

/// Key for one generated variant.
pub fn variant_key(album_id: &str, filename: &str) -> String {
    format!("albums/{album_id}/{filename}")
}

/// Reconstruct every key a photo occupies, by convention alone.
///
/// Returns 7 keys: the original plus the full variant matrix. Used for
/// bulk deletes without consulting stored state.
pub fn photo_variant_keys(album_id: &str, filename: &str) -> Vec<String> {
    let mut keys = vec![original_key(album_id, filename)];
    for width in TARGET_WIDTHS {
        for format in FORMATS {
            keys.push(variant_key(
                album_id,
                &variant_filename(filename, Some(width), format),
            ));
        }
    }
    keys
}

/// Persist one photo: the original first, then every variant, rolling back
/// all confirmed writes if anything fails.
///
/// Every key is derived from the *sanitized* original name: the variant
/// slot comes from the variant's `(width, format)` pair run back through the
/// naming rule, never from the variant's own filename. This keeps the full
/// key set reachable by [`photo_variant_keys`] even when the caller passes
/// an unsanitized upload name.
///
/// Returns the ordered list of written keys on success. On failure the
/// original error is returned after best-effort rollback; rollback failures
/// are logged, never propagated.
pub fn upload_photo(
    store: &impl ObjectStore,
    album_id: &str,
    filename: &str,
    original: &[u8],
    content_type: &str,
    variants: &[GeneratedVariant],
) -> Result<Vec<String>, UploadError> {
    let mut written: Vec<String> = Vec::with_capacity(variants.len() + 1);
    let sanitized = sanitize_filename(filename);

    let key = original_key(album_id, &sanitized);
    upload_step(store, &key, original, content_type, &mut written)?;

    for variant in variants {
        let key = variant_key(
            album_id,
            &variant_filename(&sanitized, variant.width, variant.format),
        );
        upload_step(
            store,
            &key,
            &variant.buffer,
            variant.format.content_type(),
            &mut written,
        )?;
    }

    Ok(written)
}

/// One confirmed-write step: the key joins the rollback log only after the
/// store acknowledges the write.
fn upload_step(
    store: &impl ObjectStore,
    key: &str,
    buffer: &[u8],
    content_type: &str,
    written: &mut Vec<String>,
) -> Result<(), UploadError> {
    match store.upload_object(key, buffer, content_type) {
        Ok(()) => {
            written.push(key.to_string());
            Ok(())
        }
        Err(source) => {
            error!(
                "upload of {key} failed, rolling back {} object(s): {source}",
                written.len()
            );
            rollback(store, written);
            Err(UploadError::Store {
                key: key.to_string(),
                written: written.len(),
                source,
            })
        }
    }
}

/// Best-effort parallel delete of every confirmed key.
fn rollback(store: &impl ObjectStore, keys: &[String]) {
    keys.par_iter().for_each(|key| {
        if let Err(e) = store.delete_object(key) {
            warn!("rollback delete of {key} failed (object may be orphaned): {e}");
        }
    });
}
