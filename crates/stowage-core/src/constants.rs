//! Application-wide constants.

/// Default size ceiling for optimized images, in megabytes.
pub const DEFAULT_MAX_IMAGE_SIZE_MB: u64 = 10;

/// Images whose larger side is at or below this many pixels (and that already
/// fit the size ceiling) are not re-encoded.
pub const DEFAULT_OPTIMIZE_MIN_DIMENSION: u32 = 1920;

/// Quality used when converting camera-native formats to JPEG.
pub const NORMALIZE_JPEG_QUALITY: u8 = 80;

/// Quality factor applied when recompressing JPEG images.
pub const JPEG_QUALITY_FACTOR: f32 = 0.7;

/// Quality factor applied to every other encoding.
pub const DEFAULT_QUALITY_FACTOR: f32 = 1.0;

/// Name suffixes treated as camera-native formats, without the leading dot.
pub const DEFAULT_LEGACY_IMAGE_SUFFIXES: &[&str] = &["heic", "heif"];

/// Delay between a successful batch and clearing its progress state.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1000;

/// Multipart part size for S3 uploads, in megabytes. S3 requires at least 5.
pub const DEFAULT_S3_PART_SIZE_MB: usize = 8;

/// Delimiter emulating folders in the flat key namespace.
pub const KEY_DELIMITER: char = '/';

pub const BYTES_PER_MB: u64 = 1024 * 1024;
