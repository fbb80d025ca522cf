//! Base64 image payloads for image-to-video requests.

use std::path::Path;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use image::{DynamicImage, ImageFormat};
use tempfile::NamedTempFile;

use crate::types::VideoGenError;

// Browsers and scripts disagree about padding, accept both.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

fn invalid_image() -> VideoGenError {
    VideoGenError::BadRequest("Invalid image data".to_string())
}

/// A decoded input image written out as PNG. The file is removed on drop.
#[derive(Debug)]
pub struct TempImage {
    file: NamedTempFile,
}

impl TempImage {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Drops a `data:<mime>;base64,` prefix if present.
pub fn strip_data_url(data: &str) -> &str {
    match data.split_once(',') {
        Some((_, payload)) => payload,
        None => data,
    }
}

pub fn decode_base64_image(data: &str) -> Result<DynamicImage, VideoGenError> {
    let payload: String = strip_data_url(data)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if payload.is_empty() {
        return Err(invalid_image());
    }
    let bytes = LENIENT.decode(payload.as_bytes()).map_err(|e| {
        log::warn!("Image payload is not valid base64: {e}");
        invalid_image()
    })?;
    image::load_from_memory(&bytes).map_err(|e| {
        log::warn!("Image payload could not be decoded: {e}");
        invalid_image()
    })
}

pub fn write_temp_png(image: &DynamicImage) -> Result<TempImage, VideoGenError> {
    let mut file = tempfile::Builder::new()
        .prefix("videogen-input-")
        .suffix(".png")
        .tempfile()?;
    DynamicImage::ImageRgba8(image.to_rgba8())
        .write_to(file.as_file_mut(), ImageFormat::Png)
        .map_err(|e| VideoGenError::Internal(format!("failed to write input image: {e}")))?;
    Ok(TempImage { file })
}

/// Decodes `data` and writes it to a temporary PNG. Decoding runs on the
/// blocking pool.
pub async fn prepare_input_image(data: Option<&str>) -> Result<TempImage, VideoGenError> {
    let data = match data {
        Some(d) if !d.trim().is_empty() => d.to_string(),
        _ => return Err(invalid_image()),
    };
    tokio::task::spawn_blocking(move || {
        let image = decode_base64_image(&data)?;
        write_temp_png(&image)
    })
    .await
    .map_err(|e| VideoGenError::Internal(format!("image decoding task failed: {e}")))?
}
