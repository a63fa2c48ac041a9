use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};

/// Uploaded images wider than this are downscaled. Never upscales.
pub const MAX_WIDTH: u32 = 800;

/// JPEG re-encode quality for stored photos.
pub const JPEG_QUALITY: u8 = 70;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("failed to read image: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to process image: {0}")]
    Image(#[from] image::ImageError),
    #[error("image task was cancelled")]
    Cancelled,
}

/// Normalize orientation, downscale, and re-encode an uploaded image.
///
/// Image work is CPU-bound; runs on the blocking pool so it does not stall
/// other in-flight requests.
pub async fn compress(data: Vec<u8>) -> Result<Vec<u8>, TransformError> {
    tokio::task::spawn_blocking(move || compress_sync(&data))
        .await
        .map_err(|_| TransformError::Cancelled)?
}

fn compress_sync(data: &[u8]) -> Result<Vec<u8>, TransformError> {
    let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
    let mut decoder = reader.into_decoder()?;

    // EXIF orientation must be read before the decoder is consumed.
    let orientation = decoder
        .orientation()
        .unwrap_or(Orientation::NoTransforms);

    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);

    let img = downscale(img);

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    img.write_with_encoder(encoder)?;

    Ok(out)
}

fn downscale(img: DynamicImage) -> DynamicImage {
    let (w, h) = (img.width(), img.height());
    if w <= MAX_WIDTH {
        return img;
    }
    let target_h = ((h as u64 * MAX_WIDTH as u64) / w as u64).max(1) as u32;
    img.resize(MAX_WIDTH, target_h, FilterType::Lanczos3)
}
