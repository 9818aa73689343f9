//! Files as they enter and move through the upload pipeline.

use bytes::Bytes;
use std::path::Path;

use crate::media;

/// A file as dropped or selected by the user. Never mutated.
#[derive(Clone, Debug)]
pub struct SourceFile {
    name: String,
    media_type: String,
    data: Bytes,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk, inferring its media type from the extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("{} has no usable file name", path.display()),
                )
            })?;
        let media_type = media::media_type_from_name(&name).to_string();
        Ok(Self::new(name, media_type, data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Start a pipeline run for this file. `Bytes` clones share the buffer.
    pub fn to_artifact(&self) -> PipelineArtifact {
        PipelineArtifact {
            bytes: self.data.clone(),
            name: self.name.clone(),
            media_type: self.media_type.clone(),
            was_transformed: false,
        }
    }
}

/// The working copy of a file as it passes through pipeline stages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineArtifact {
    pub bytes: Bytes,
    pub name: String,
    pub media_type: String,
    /// True once any stage has changed the content relative to the source file.
    pub was_transformed: bool,
}

impl PipelineArtifact {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Replace content, name and media type, marking the artifact transformed.
    pub fn replaced(self, bytes: Bytes, name: String, media_type: String) -> Self {
        Self {
            bytes,
            name,
            media_type,
            was_transformed: true,
        }
    }
}
