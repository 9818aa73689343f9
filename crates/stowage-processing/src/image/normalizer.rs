//! Conversion of camera-native image encodings to JPEG.

use bytes::Bytes;
use std::sync::Arc;
use stowage_core::constants::NORMALIZE_JPEG_QUALITY;
use stowage_core::{media, AppError, AppResult, PipelineArtifact, UploaderConfig};

use super::raw_decoder::{FfmpegDecoder, RawImageDecoder};
use crate::compression::{encode_jpeg, OutputFormat};
use crate::stage::StageOutcome;

const STAGE: &str = "normalize";

/// Re-encodes files with a legacy suffix (HEIC, HEIF, ...) as JPEG.
pub struct FormatNormalizer {
    suffixes: Vec<String>,
    decoder: Arc<dyn RawImageDecoder>,
    quality: u8,
}

impl FormatNormalizer {
    pub fn new(suffixes: Vec<String>, decoder: Arc<dyn RawImageDecoder>) -> Self {
        Self {
            suffixes,
            decoder,
            quality: NORMALIZE_JPEG_QUALITY,
        }
    }

    /// Normalizer using the configured suffixes and an ffmpeg decoder.
    pub fn from_config(config: &UploaderConfig) -> Self {
        Self::new(
            config.legacy_image_suffixes.clone(),
            Arc::new(FfmpegDecoder::new(config.ffmpeg_path.clone())),
        )
    }

    /// The configured suffix `name` ends with, if any.
    pub fn legacy_suffix(&self, name: &str) -> Option<&str> {
        self.suffixes
            .iter()
            .find(|suffix| media::has_suffix(name, suffix))
            .map(String::as_str)
    }

    pub async fn normalize(&self, artifact: PipelineArtifact) -> StageOutcome<PipelineArtifact> {
        let Some(suffix) = self.legacy_suffix(&artifact.name) else {
            return StageOutcome::Skipped(artifact);
        };

        match self.convert(&artifact, suffix).await {
            Ok(jpeg) => {
                let name = media::replace_extension(&artifact.name, "jpg");
                tracing::info!(
                    from = %artifact.name,
                    to = %name,
                    original_size_bytes = artifact.size(),
                    size_bytes = jpeg.len(),
                    "Converted image to JPEG"
                );
                StageOutcome::Applied(artifact.replaced(
                    jpeg,
                    name,
                    OutputFormat::Jpeg.to_mime_type().to_string(),
                ))
            }
            Err(e) => {
                let name = artifact.name.clone();
                StageOutcome::recovered(STAGE, &name, artifact, e)
            }
        }
    }

    async fn convert(&self, artifact: &PipelineArtifact, suffix: &str) -> AppResult<Bytes> {
        let img = self.decoder.decode(artifact.bytes.clone(), suffix).await?;
        let quality = self.quality;
        let encoded = tokio::task::spawn_blocking(move || encode_jpeg(&img, quality))
            .await
            .map_err(|e| AppError::Internal(format!("Encode task failed: {}", e)))??;
        Ok(Bytes::from(encoded))
    }
}
