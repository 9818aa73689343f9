//! Media type and file name helpers.

/// Whether a media type denotes a raster image the pipeline may recompress.
pub fn is_image(media_type: &str) -> bool {
    media_type.trim().to_ascii_lowercase().starts_with("image/")
}

/// Lowercased extension of a file name, without the dot.
///
/// Returns `None` for names without a dot or with a trailing dot.
pub fn extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Check whether `name` ends with `.{suffix}`, ignoring ASCII case.
pub fn has_suffix(name: &str, suffix: &str) -> bool {
    let suffix = suffix.trim_start_matches('.');
    extension(name).is_some_and(|ext| ext.eq_ignore_ascii_case(suffix))
}

/// Replace the extension of `name` with `new_ext`, appending one if absent.
pub fn replace_extension(name: &str, new_ext: &str) -> String {
    let new_ext = new_ext.trim_start_matches('.');
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => format!("{}.{}", stem, new_ext),
        _ => format!("{}.{}", name, new_ext),
    }
}

/// Guess a media type from a file name's extension.
pub fn media_type_from_name(name: &str) -> &'static str {
    match extension(name).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("heic") => "image/heic",
        Some("heif") => "image/heif",
        Some("svg") => "image/svg+xml",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("csv") => "text/csv",
        Some("html") | Some("htm") => "text/html",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("mp3") => "audio/mpeg",
        _ => "application/octet-stream",
    }
}

/// Conventional extension for a media type, used as a save-dialog hint.
pub fn extension_for_media_type(media_type: &str) -> Option<&'static str> {
    match media_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "image/heif" => Some("heif"),
        "text/plain" => Some("txt"),
        "application/pdf" => Some("pdf"),
        _ => None,
    }
}
