//! Capture-metadata extraction for catalog entries.
//!
//! Runs independently of the variant pipeline, over the same raw upload
//! bytes, and produces human-readable strings for the photo's catalog row
//! (camera model, focal length, aperture, shutter speed, ISO).
//!
//! Extraction is best-effort per field: a photo missing its aperture tag
//! still yields its camera model, and a buffer with no EXIF block at all
//! yields an all-`None` summary. This function never fails the calling
//! operation.
//!
//! The formatting rules are load-bearing — stored values feed templates and
//! existing catalog rows, so `f/2.8`, `1/500s`, `2.0s`, `24mm` are exact
//! output contracts, not suggestions.

use exif::{In, Tag, Value};
use log::debug;
use serde::Serialize;
use std::io::Cursor;

/// Formatted capture metadata, all fields independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExifSummary {
    /// Raw camera model string, e.g. `"ILCE-7M4"`.
    pub camera: Option<String>,
    /// Focal length, e.g. `"24mm"`.
    pub lens: Option<String>,
    /// Aperture, e.g. `"f/2.8"`.
    pub f_stop: Option<String>,
    /// Exposure time, e.g. `"1/500s"` or `"2.0s"`.
    pub shutter_speed: Option<String>,
    /// Sensitivity as a bare integer string, e.g. `"100"`.
    pub iso: Option<String>,
}

/// Format an f-number as `f/2.8`. Absent or zero values carry no aperture.
pub fn format_f_number(value: f64) -> Option<String> {
    if value <= 0.0 {
        return None;
    }
    Some(format!("f/{value:.1}"))
}

/// Format an exposure time in seconds.
///
/// Fast shutter speeds render as a fraction (`0.002` → `1/500s`), slow ones
/// as a decimal (`2.0` → `2.0s`).
pub fn format_exposure_time(seconds: f64) -> Option<String> {
    if seconds <= 0.0 {
        return None;
    }
    if seconds < 1.0 {
        let denominator = (1.0 / seconds).round() as u32;
        Some(format!("1/{denominator}s"))
    } else {
        Some(format!("{seconds:.1}s"))
    }
}

/// Format a focal length in millimetres, rounded to the nearest integer.
pub fn format_focal_length(mm: f64) -> Option<String> {
    if mm <= 0.0 {
        return None;
    }
    Some(format!("{}mm", mm.round() as u32))
}

/// Extract and format capture metadata from a raw image buffer.
///
/// Accepts either a full container (JPEG, TIFF, …) or a bare EXIF blob.
/// Never fails: unparsable metadata produces an all-`None` summary.
pub fn extract_exif_data(buffer: &[u8]) -> ExifSummary {
    let Some(exif) = read_exif(buffer) else {
        debug!("no parsable EXIF block");
        return ExifSummary::default();
    };

    ExifSummary {
        camera: ascii_field(&exif, Tag::Model),
        lens: rational_field(&exif, Tag::FocalLength).and_then(format_focal_length),
        f_stop: rational_field(&exif, Tag::FNumber).and_then(format_f_number),
        shutter_speed: rational_field(&exif, Tag::ExposureTime).and_then(format_exposure_time),
        iso: uint_field(&exif, Tag::PhotographicSensitivity).map(|v| v.to_string()),
    }
}

/// Parse the EXIF block from a container, falling back to a raw TIFF blob.
fn read_exif(buffer: &[u8]) -> Option<exif::Exif> {
    let mut cursor = Cursor::new(buffer);
    exif::Reader::new()
        .read_from_container(&mut cursor)
        .or_else(|_| exif::Reader::new().read_raw(buffer.to_vec()))
        .ok()
}

/// Find a tag in the primary IFD, searching all IFDs as a fallback.
fn field<'a>(exif: &'a exif::Exif, tag: Tag) -> Option<&'a exif::Field> {
    exif.get_field(tag, In::PRIMARY)
        .or_else(|| exif.fields().find(|f| f.tag == tag))
}

fn ascii_field(exif: &exif::Exif, tag: Tag) -> Option<String> {
    match &field(exif, tag)?.value {
        Value::Ascii(v) if !v.is_empty() => std::str::from_utf8(&v[0])
            .ok()
            .map(|s| s.trim_matches('\0').trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

fn rational_field(exif: &exif::Exif, tag: Tag) -> Option<f64> {
    match &field(exif, tag)?.value {
        Value::Rational(v) if !v.is_empty() => Some(v[0].to_f64()),
        _ => None,
    }
}

fn uint_field(exif: &exif::Exif, tag: Tag) -> Option<u32> {
    field(exif, tag)?.value.get_uint(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use exif::Rational;
    use exif::experimental::Writer;

    /// Build a raw EXIF (TIFF) blob from the given fields.
    fn exif_blob(fields: &[exif::Field]) -> Vec<u8> {
        let mut writer = Writer::new();
        for field in fields {
            writer.push_field(field);
        }
        let mut buf = Cursor::new(Vec::new());
        writer.write(&mut buf, false).unwrap();
        buf.into_inner()
    }

    fn ascii(tag: Tag, text: &str) -> exif::Field {
        exif::Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![text.as_bytes().to_vec()]),
        }
    }

    fn rational(tag: Tag, num: u32, denom: u32) -> exif::Field {
        exif::Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Rational(vec![Rational { num, denom }]),
        }
    }

    // =========================================================================
    // Formatting rules (exact output contracts)
    // =========================================================================

    #[test]
    fn f_number_renders_one_decimal() {
        assert_eq!(format_f_number(2.8), Some("f/2.8".to_string()));
        assert_eq!(format_f_number(8.0), Some("f/8.0".to_string()));
        assert_eq!(format_f_number(1.75), Some("f/1.8".to_string()));
    }

    #[test]
    fn f_number_zero_or_absent_is_none() {
        assert_eq!(format_f_number(0.0), None);
        assert_eq!(format_f_number(-1.0), None);
    }

    #[test]
    fn fast_shutter_renders_as_fraction() {
        assert_eq!(format_exposure_time(0.002), Some("1/500s".to_string()));
        assert_eq!(format_exposure_time(1.0 / 8000.0), Some("1/8000s".to_string()));
        assert_eq!(format_exposure_time(0.5), Some("1/2s".to_string()));
    }

    #[test]
    fn slow_shutter_renders_as_decimal() {
        assert_eq!(format_exposure_time(2.0), Some("2.0s".to_string()));
        assert_eq!(format_exposure_time(30.0), Some("30.0s".to_string()));
        assert_eq!(format_exposure_time(1.0), Some("1.0s".to_string()));
    }

    #[test]
    fn shutter_zero_is_none() {
        assert_eq!(format_exposure_time(0.0), None);
    }

    #[test]
    fn focal_length_rounds_to_integer() {
        assert_eq!(format_focal_length(24.4), Some("24mm".to_string()));
        assert_eq!(format_focal_length(24.5), Some("25mm".to_string()));
        assert_eq!(format_focal_length(70.0), Some("70mm".to_string()));
    }

    #[test]
    fn focal_length_zero_is_none() {
        assert_eq!(format_focal_length(0.0), None);
    }

    // =========================================================================
    // Extraction
    // =========================================================================

    #[test]
    fn extracts_all_fields_from_raw_blob() {
        let fields = [
            ascii(Tag::Model, "ILCE-7M4"),
            rational(Tag::FNumber, 28, 10),
            rational(Tag::ExposureTime, 1, 500),
            rational(Tag::FocalLength, 244, 10),
            exif::Field {
                tag: Tag::PhotographicSensitivity,
                ifd_num: In::PRIMARY,
                value: Value::Short(vec![100]),
            },
        ];
        let blob = exif_blob(&fields);

        let summary = extract_exif_data(&blob);
        assert_eq!(summary.camera.as_deref(), Some("ILCE-7M4"));
        assert_eq!(summary.f_stop.as_deref(), Some("f/2.8"));
        assert_eq!(summary.shutter_speed.as_deref(), Some("1/500s"));
        assert_eq!(summary.lens.as_deref(), Some("24mm"));
        assert_eq!(summary.iso.as_deref(), Some("100"));
    }

    #[test]
    fn missing_fields_do_not_block_present_ones() {
        let fields = [ascii(Tag::Model, "PENTAX K-1")];
        let blob = exif_blob(&fields);

        let summary = extract_exif_data(&blob);
        assert_eq!(summary.camera.as_deref(), Some("PENTAX K-1"));
        assert_eq!(summary.f_stop, None);
        assert_eq!(summary.shutter_speed, None);
        assert_eq!(summary.lens, None);
        assert_eq!(summary.iso, None);
    }

    #[test]
    fn slow_exposure_from_blob_renders_decimal() {
        let fields = [rational(Tag::ExposureTime, 2, 1)];
        let blob = exif_blob(&fields);
        let summary = extract_exif_data(&blob);
        assert_eq!(summary.shutter_speed.as_deref(), Some("2.0s"));
    }

    #[test]
    fn garbage_buffer_yields_empty_summary() {
        assert_eq!(extract_exif_data(b"definitely not exif"), ExifSummary::default());
        assert_eq!(extract_exif_data(&[]), ExifSummary::default());
    }

    #[test]
    fn image_without_exif_yields_empty_summary() {
        // A synthetic JPEG carries no EXIF block at all.
        let img = image::RgbImage::from_pixel(8, 8, image::Rgb([1, 2, 3]));
        let mut buf = Cursor::new(Vec::new());
        image::codecs::jpeg::JpegEncoder::new(&mut buf)
            .encode_image(&img)
            .unwrap();

        assert_eq!(extract_exif_data(&buf.into_inner()), ExifSummary::default());
    }

    #[test]
    fn summary_serializes_with_catalog_field_names() {
        let summary = ExifSummary {
            camera: Some("X100V".into()),
            f_stop: Some("f/2.0".into()),
            ..ExifSummary::default()
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["camera"], "X100V");
        assert_eq!(json["fStop"], "f/2.0");
        assert!(json["shutterSpeed"].is_null());
    }
}
