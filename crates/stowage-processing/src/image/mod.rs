//! Image processing module
//!
//! This module provides the image stages of the upload pipeline:
//! - Decoding and dimension policy (processor)
//! - Camera-native format decoding (raw_decoder)
//! - Conversion of legacy encodings to JPEG (normalizer)
//! - Downscaling and recompression under a size ceiling (optimizer)

pub mod normalizer;
pub mod optimizer;
pub mod processor;
pub mod raw_decoder;

pub use normalizer::FormatNormalizer;
pub use optimizer::ImageOptimizer;
pub use processor::ImageProcessor;
pub use raw_decoder::{FfmpegDecoder, RawImageDecoder};
