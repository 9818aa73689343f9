//! Downscaling and recompression of image payloads.

use bytes::Bytes;
use image::GenericImageView;
use stowage_core::{media, AppError, AppResult, PipelineArtifact, UploaderConfig};

use super::processor::ImageProcessor;
use crate::compression::{ImageCompressor, OutputFormat, QualityPolicy};
use crate::stage::StageOutcome;

const STAGE: &str = "optimize";

/// Halves large images and re-encodes them under a byte ceiling.
///
/// The halved size is further capped at `min_dimension`. Images whose larger
/// side is at most `min_dimension` and that already fit the ceiling are left
/// alone, so feeding an optimized image back in is a no-op.
pub struct ImageOptimizer {
    ceiling: u64,
    min_dimension: u32,
    policy: QualityPolicy,
}

impl ImageOptimizer {
    pub fn new(ceiling: u64, min_dimension: u32, policy: QualityPolicy) -> Self {
        Self {
            ceiling,
            min_dimension,
            policy,
        }
    }

    pub fn from_config(config: &UploaderConfig) -> Self {
        Self::new(
            config.max_image_size_bytes,
            config.optimize_min_dimension,
            QualityPolicy::default(),
        )
    }

    pub async fn optimize(&self, artifact: PipelineArtifact) -> StageOutcome<PipelineArtifact> {
        if !media::is_image(&artifact.media_type) {
            return StageOutcome::Skipped(artifact);
        }

        let data = artifact.bytes.clone();
        let format = OutputFormat::from_media_type(&artifact.media_type);
        let compressor = ImageCompressor::new(self.ceiling, self.policy);
        let min_dimension = self.min_dimension;

        // Decode and encode are CPU-bound; the decoded buffer lives only inside the closure.
        let result = tokio::task::spawn_blocking(move || {
            recompress(&data, format, &compressor, min_dimension)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Optimize task failed: {}", e)))
        .and_then(|r| r);

        match result {
            Ok(None) => StageOutcome::Skipped(artifact),
            Ok(Some((encoded, format))) => {
                if encoded.len() as u64 == artifact.size() {
                    return StageOutcome::Skipped(artifact);
                }
                tracing::info!(
                    file_name = %artifact.name,
                    original_size_bytes = artifact.size(),
                    size_bytes = encoded.len(),
                    "Optimized image"
                );
                let name = artifact.name.clone();
                StageOutcome::Applied(artifact.replaced(
                    Bytes::from(encoded),
                    name,
                    format.to_mime_type().to_string(),
                ))
            }
            Err(e) => {
                let name = artifact.name.clone();
                StageOutcome::recovered(STAGE, &name, artifact, e)
            }
        }
    }
}

/// `Ok(None)` when the image is already small enough to keep as is.
fn recompress(
    data: &[u8],
    format: Option<OutputFormat>,
    compressor: &ImageCompressor,
    min_dimension: u32,
) -> AppResult<Option<(Vec<u8>, OutputFormat)>> {
    let img = ImageProcessor::decode(data)?;
    let (width, height) = img.dimensions();

    if width.max(height) <= min_dimension && data.len() as u64 <= compressor.ceiling() {
        return Ok(None);
    }

    let format = format.ok_or_else(|| {
        AppError::ImageProcessing("No encoder for this image type".to_string())
    })?;

    let cap = ImageProcessor::downscale_cap(width, height).min(min_dimension.max(1));
    let resized = ImageProcessor::resize_within(&img, cap);
    drop(img);

    let encoded = compressor.compress(&resized, format)?;
    Ok(Some((encoded, format)))
}
