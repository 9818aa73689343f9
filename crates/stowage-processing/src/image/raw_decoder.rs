//! Decoders for camera-native encodings the `image` crate cannot read.

use async_trait::async_trait;
use bytes::Bytes;
use image::DynamicImage;
use stowage_core::{AppError, AppResult};
use tempfile::NamedTempFile;
use tokio::process::Command;

use super::processor::ImageProcessor;

/// Decodes a camera-native image (HEIC, HEIF, ...) into pixels.
#[async_trait]
pub trait RawImageDecoder: Send + Sync {
    /// Decode `data`, whose file name ended in `.{suffix}`.
    async fn decode(&self, data: Bytes, suffix: &str) -> AppResult<DynamicImage>;
}

/// Decoder that asks `ffmpeg` to extract the first frame as PNG.
pub struct FfmpegDecoder {
    ffmpeg_path: String,
}

impl FfmpegDecoder {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl RawImageDecoder for FfmpegDecoder {
    async fn decode(&self, data: Bytes, suffix: &str) -> AppResult<DynamicImage> {
        // ffmpeg picks the demuxer from the input extension
        let input = tempfile::Builder::new()
            .suffix(&format!(".{}", suffix))
            .tempfile()?;
        tokio::fs::write(input.path(), &data).await?;

        let output_file = NamedTempFile::with_suffix(".png")?;

        let output = Command::new(&self.ffmpeg_path)
            .arg("-y")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(input.path())
            .arg("-frames:v")
            .arg("1")
            .arg(output_file.path())
            .output()
            .await
            .map_err(|e| {
                AppError::MediaConversion(format!(
                    "Failed to run {}: {}",
                    self.ffmpeg_path, e
                ))
            })?;

        if !output.status.success() {
            let err_msg = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(suffix = %suffix, error = %err_msg, "ffmpeg failed to decode image");
            return Err(AppError::MediaConversion(format!(
                "ffmpeg failed on .{}: {}",
                suffix,
                err_msg.trim()
            )));
        }

        let png_data = tokio::fs::read(output_file.path()).await?;
        tokio::task::spawn_blocking(move || ImageProcessor::decode(&png_data))
            .await
            .map_err(|e| AppError::Internal(format!("Decode task failed: {}", e)))?
    }
}
