use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use stowage_core::constants::{DEFAULT_QUALITY_FACTOR, JPEG_QUALITY_FACTOR};
use stowage_core::{AppError, AppResult};

/// Lowest quality factor tried before giving up on the size ceiling.
const MIN_QUALITY_FACTOR: f32 = 0.1;

/// Quality step used when an encode overshoots the ceiling.
const QUALITY_STEP: f32 = 0.1;

/// Encodings the optimizer can write back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
}

impl OutputFormat {
    /// Output format matching an input media type, if it can be re-encoded.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        match media_type.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(OutputFormat::Jpeg),
            "image/png" => Some(OutputFormat::Png),
            "image/webp" => Some(OutputFormat::WebP),
            "image/gif" => Some(OutputFormat::Gif),
            _ => None,
        }
    }

    pub fn to_mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
            OutputFormat::Gif => "image/gif",
        }
    }

    pub fn to_image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::WebP => ImageFormat::WebP,
            OutputFormat::Gif => ImageFormat::Gif,
        }
    }

    /// Whether the encoder honours a quality factor
    pub fn is_lossy(self) -> bool {
        matches!(self, OutputFormat::Jpeg)
    }
}

/// Quality factor per output format, in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityPolicy {
    pub jpeg: f32,
    pub other: f32,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self {
            jpeg: JPEG_QUALITY_FACTOR,
            other: DEFAULT_QUALITY_FACTOR,
        }
    }
}

impl QualityPolicy {
    pub fn factor_for(&self, format: OutputFormat) -> f32 {
        match format {
            OutputFormat::Jpeg => self.jpeg,
            _ => self.other,
        }
    }
}

/// Map a quality factor to the 1-100 scale used by the JPEG encoder.
pub fn jpeg_quality(factor: f32) -> u8 {
    (factor * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Encode an image as JPEG at the given quality (1-100).
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> AppResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    // JPEG has no alpha channel
    img.to_rgb8()
        .write_with_encoder(encoder)
        .map_err(|e| AppError::ImageProcessing(format!("JPEG encoding failed: {}", e)))?;
    Ok(buffer)
}

fn encode_lossless(img: &DynamicImage, format: OutputFormat) -> AppResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    // The WebP and GIF encoders only accept 8-bit RGBA
    let result = match format {
        OutputFormat::WebP | OutputFormat::Gif => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut cursor, format.to_image_format())
        }
        _ => img.write_to(&mut cursor, format.to_image_format()),
    };
    result.map_err(|e| {
        AppError::ImageProcessing(format!("{:?} encoding failed: {}", format, e))
    })?;
    Ok(buffer)
}

/// Encode an image under a byte ceiling
pub struct ImageCompressor {
    ceiling: u64,
    policy: QualityPolicy,
}

impl ImageCompressor {
    pub fn new(ceiling: u64, policy: QualityPolicy) -> Self {
        Self { ceiling, policy }
    }

    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    /// Encode `img` as `format`, lowering JPEG quality until the output fits.
    ///
    /// Returns `SizeBudgetExceeded` when even the lowest quality (or the only
    /// lossless encoding) is larger than the ceiling.
    pub fn compress(&self, img: &DynamicImage, format: OutputFormat) -> AppResult<Vec<u8>> {
        if !format.is_lossy() {
            let encoded = encode_lossless(img, format)?;
            return self.within_ceiling(encoded);
        }

        let mut factor = self.policy.factor_for(format);
        loop {
            let encoded = encode_jpeg(img, jpeg_quality(factor))?;
            if encoded.len() as u64 <= self.ceiling {
                return Ok(encoded);
            }

            let next = factor - QUALITY_STEP;
            if next < MIN_QUALITY_FACTOR - f32::EPSILON {
                return self.within_ceiling(encoded);
            }
            tracing::debug!(
                size_bytes = encoded.len(),
                ceiling = self.ceiling,
                quality = jpeg_quality(next),
                "Encoded image over ceiling, lowering quality"
            );
            factor = next;
        }
    }

    fn within_ceiling(&self, encoded: Vec<u8>) -> AppResult<Vec<u8>> {
        let size = encoded.len() as u64;
        if size > self.ceiling {
            return Err(AppError::SizeBudgetExceeded {
                size,
                ceiling: self.ceiling,
            });
        }
        Ok(encoded)
    }
}
