//! Best-effort image format sniffing for base64 screenshot payloads.

use filmstrip_types::trace::ImageFormat;

const DATA_URI_IMAGE_PREFIX: &str = "data:image/";
const JPEG_BASE64_MAGIC: &str = "/9j/";
const PNG_BASE64_MAGIC: &str = "iVBOR";

/// Classifies a payload as jpeg or png. Never fails: anything unrecognised
/// is assumed to be jpeg.
pub fn detect(payload: &str) -> ImageFormat {
    if let Some(rest) = payload.strip_prefix(DATA_URI_IMAGE_PREFIX) {
        let subtype = rest
            .split([';', ','])
            .next()
            .unwrap_or_default();
        if let Some(format) = format_from_subtype(subtype) {
            return format;
        }
    }

    let payload = strip_data_uri(payload);
    if payload.starts_with(JPEG_BASE64_MAGIC) {
        ImageFormat::Jpeg
    } else if payload.starts_with(PNG_BASE64_MAGIC) {
        ImageFormat::Png
    } else {
        ImageFormat::Jpeg
    }
}

fn format_from_subtype(subtype: &str) -> Option<ImageFormat> {
    match subtype.to_ascii_lowercase().as_str() {
        "jpeg" | "jpg" => Some(ImageFormat::Jpeg),
        "png" => Some(ImageFormat::Png),
        _ => None,
    }
}

/// Returns the base64 segment of an image data URI, or the input untouched
/// when it is not one.
pub fn strip_data_uri(payload: &str) -> &str {
    if payload.starts_with(DATA_URI_IMAGE_PREFIX) {
        if let Some((_, data)) = payload.split_once(',') {
            return data;
        }
    }
    payload
}
