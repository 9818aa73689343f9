//! Shared fixtures for upload pipeline integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stowage_core::{AppResult, SourceFile};
use stowage_processing::{
    DirectoryHandle, FormatNormalizer, ImageOptimizer, ImageProcessor, LocalPersistence,
    LocalSaveError, QualityPolicy, RawImageDecoder, SaveEnvironment, TransferAgent,
    UploadEvents, UploadOrchestrator,
};
use stowage_storage::test_helpers::MockStorage;

pub const CEILING: u64 = 10 * 1024 * 1024;

/// Stands in for ffmpeg: "HEIC" fixtures are PNG bytes with a `.heic` name.
pub struct InProcessDecoder;

#[async_trait]
impl RawImageDecoder for InProcessDecoder {
    async fn decode(&self, data: Bytes, _suffix: &str) -> AppResult<DynamicImage> {
        ImageProcessor::decode(&data)
    }
}

pub fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 251) as u8, (y % 241) as u8, ((x + y) % 239) as u8])
    });
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buffer), format)
        .unwrap();
    buffer
}

pub fn heic_file(name: &str, width: u32, height: u32) -> SourceFile {
    SourceFile::new(name, "image/heic", encoded_image(width, height, ImageFormat::Png))
}

pub fn jpeg_file(name: &str, width: u32, height: u32) -> SourceFile {
    SourceFile::new(name, "image/jpeg", encoded_image(width, height, ImageFormat::Jpeg))
}

pub fn text_file(name: &str, body: &str) -> SourceFile {
    SourceFile::new(name, "text/plain", body.as_bytes().to_vec())
}

/// In-memory directory that records writes and can be made to fail.
#[derive(Default)]
pub struct MemoryDirectory {
    pub files: Mutex<HashMap<String, Bytes>>,
    pub fail_writes: bool,
}

#[async_trait]
impl DirectoryHandle for MemoryDirectory {
    fn name(&self) -> &str {
        "memory"
    }

    async fn write_file(&self, file_name: &str, data: &Bytes) -> Result<(), LocalSaveError> {
        if self.fail_writes {
            return Err(LocalSaveError::Failed("disk full".to_string()));
        }
        self.files
            .lock()
            .unwrap()
            .insert(file_name.to_string(), data.clone());
        Ok(())
    }
}

/// Save environment that records every interaction.
pub struct RecordingEnvironment {
    pub prompt: bool,
    pub picker: bool,
    pub picker_cancels: bool,
    pub directory: Arc<MemoryDirectory>,
    pub picks: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
    pub downloads: Mutex<Vec<String>>,
}

impl RecordingEnvironment {
    pub fn new(prompt: bool, picker: bool) -> Self {
        Self {
            prompt,
            picker,
            picker_cancels: false,
            directory: Arc::new(MemoryDirectory::default()),
            picks: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            downloads: Mutex::new(Vec::new()),
        }
    }

    pub fn picks(&self) -> usize {
        self.picks.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }

    pub fn directory_files(&self) -> usize {
        self.directory.files.lock().unwrap().len()
    }
}

#[async_trait]
impl SaveEnvironment for RecordingEnvironment {
    fn supports_save_prompt(&self) -> bool {
        self.prompt
    }

    async fn prompt_save(
        &self,
        suggested_name: &str,
        _media_type: &str,
        _extension: Option<&str>,
        _data: &Bytes,
    ) -> Result<(), LocalSaveError> {
        self.prompts
            .lock()
            .unwrap()
            .push(suggested_name.to_string());
        Ok(())
    }

    fn supports_directory_picker(&self) -> bool {
        self.picker
    }

    async fn pick_directory(&self) -> Result<Option<Arc<dyn DirectoryHandle>>, LocalSaveError> {
        self.picks.fetch_add(1, Ordering::SeqCst);
        if self.picker_cancels {
            return Ok(None);
        }
        Ok(Some(self.directory.clone()))
    }

    async fn download(&self, file_name: &str, _data: &Bytes) -> Result<PathBuf, LocalSaveError> {
        self.downloads.lock().unwrap().push(file_name.to_string());
        Ok(PathBuf::from(file_name))
    }
}

/// Records batch events.
#[derive(Default)]
pub struct RecordingEvents {
    pub progress: Mutex<Vec<(String, f64)>>,
    pub completions: AtomicUsize,
}

impl RecordingEvents {
    pub fn completions(&self) -> usize {
        self.completions.load(Ordering::SeqCst)
    }

    pub fn last_progress(&self, file_name: &str) -> Option<f64> {
        self.progress
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(name, _)| name == file_name)
            .map(|(_, p)| *p)
    }
}

impl UploadEvents for RecordingEvents {
    fn on_progress(&self, file_name: &str, percent: f64) {
        self.progress
            .lock()
            .unwrap()
            .push((file_name.to_string(), percent));
    }

    fn on_batch_complete(&self) {
        self.completions.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn orchestrator(
    storage: &MockStorage,
    env: Arc<RecordingEnvironment>,
    settle_delay: Duration,
) -> UploadOrchestrator {
    UploadOrchestrator::new(
        FormatNormalizer::new(
            vec!["heic".to_string(), "heif".to_string()],
            Arc::new(InProcessDecoder),
        ),
        ImageOptimizer::new(CEILING, 1920, QualityPolicy::default()),
        LocalPersistence::new(env),
        TransferAgent::new(Arc::new(storage.clone())),
        settle_delay,
    )
}
