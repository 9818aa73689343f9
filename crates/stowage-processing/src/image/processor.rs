//! Image processor - decoding and dimension policy

use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, GenericImageView, ImageDecoder, ImageReader};
use std::io::Cursor;
use stowage_core::{AppError, AppResult};

pub struct ImageProcessor;

impl ImageProcessor {
    /// Decode an image, guessing the format from its content.
    ///
    /// The EXIF orientation is applied, so the pixels come out upright.
    pub fn decode(data: &[u8]) -> AppResult<DynamicImage> {
        let mut decoder = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| AppError::ImageProcessing(format!("Failed to read image: {}", e)))?
            .into_decoder()
            .map_err(|e| AppError::ImageProcessing(format!("Failed to decode image: {}", e)))?;
        let orientation = decoder.orientation().unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Unreadable orientation, assuming upright");
            Orientation::NoTransforms
        });
        let mut img = DynamicImage::from_decoder(decoder)
            .map_err(|e| AppError::ImageProcessing(format!("Failed to decode image: {}", e)))?;
        img.apply_orientation(orientation);
        Ok(img)
    }

    pub fn get_dimensions(data: &[u8]) -> Option<(u32, u32)> {
        Self::decode(data).ok().map(|img| img.dimensions())
    }

    /// Target size for the fixed 2x downscale: half the larger side, at least 1.
    pub fn downscale_cap(width: u32, height: u32) -> u32 {
        (width.max(height) / 2).max(1)
    }

    /// Resize so neither side exceeds `cap`, keeping the aspect ratio.
    pub fn resize_within(img: &DynamicImage, cap: u32) -> DynamicImage {
        img.resize(cap, cap, FilterType::Triangle)
    }
}
