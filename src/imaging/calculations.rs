//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Compute output dimensions for a width-constrained resize.
///
/// Returns `None` when no resize is needed — the source is already at or
/// below the target width. Sources are never enlarged. The height is derived
/// from the aspect ratio and rounded, with a floor of 1 pixel.
///
/// Callers apply this to *post-orientation* dimensions: a portrait photo
/// stored rotated has its width/height swapped before this runs.
///
/// ```
/// # use photo_variants::imaging::constrain_width;
/// // 4000x3000 constrained to 1920 wide → 1920x1440
/// assert_eq!(constrain_width((4000, 3000), 1920), Some((1920, 1440)));
///
/// // 500 wide source never upscales to 800
/// assert_eq!(constrain_width((500, 400), 800), None);
/// ```
pub fn constrain_width(source: (u32, u32), target_width: u32) -> Option<(u32, u32)> {
    let (width, height) = source;
    if width <= target_width || width == 0 {
        return None;
    }
    let ratio = target_width as f64 / width as f64;
    let out_height = ((height as f64 * ratio).round() as u32).max(1);
    Some((target_width, out_height))
}
