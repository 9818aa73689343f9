use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use stowage_processing::{BatchReport, LocalSaveEffect, UploadEvents};
use stowage_storage::{BrowserEntry, DirectoryListing};

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Human readable byte size, e.g. `1.5 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// One row of `ls` output.
#[derive(Debug, Serialize, PartialEq)]
pub struct ListRow {
    pub name: String,
    pub kind: &'static str,
    pub key: String,
    pub size: Option<u64>,
}

pub fn listing_rows(listing: &DirectoryListing) -> Vec<ListRow> {
    listing
        .entries
        .iter()
        .map(|entry| match entry {
            BrowserEntry::Folder { name, prefix } => ListRow {
                name: format!("{}/", name),
                kind: "folder",
                key: prefix.clone(),
                size: None,
            },
            BrowserEntry::File { name, key, size, .. } => ListRow {
                name: name.clone(),
                kind: "file",
                key: key.clone(),
                size: Some(*size),
            },
        })
        .collect()
}

pub fn format_listing(listing: &DirectoryListing) -> String {
    let heading = if listing.prefix.is_empty() {
        "/"
    } else {
        listing.prefix.as_str()
    };
    let mut out = format!("{}\n", heading);
    for row in listing_rows(listing) {
        let size = row.size.map(format_size).unwrap_or_default();
        out.push_str(&format!(
            "  {:<48} {:>10}\n",
            truncate_string(&row.name, 48),
            size
        ));
    }
    out
}

fn save_label(effect: &LocalSaveEffect) -> String {
    match effect {
        LocalSaveEffect::Skipped => "-".to_string(),
        LocalSaveEffect::SavedViaPrompt => "saved".to_string(),
        LocalSaveEffect::WrittenToDirectory => "saved to directory".to_string(),
        LocalSaveEffect::Downloaded => "downloaded".to_string(),
        LocalSaveEffect::Cancelled => "cancelled".to_string(),
        LocalSaveEffect::Failed { reason } => format!("failed: {}", reason),
    }
}

/// One line per file: outcome, key, size and local copy.
pub fn format_report(report: &BatchReport) -> String {
    let mut out = String::new();
    for file in &report.files {
        let status = if file.succeeded() { "ok" } else { "FAILED" };
        out.push_str(&format!(
            "{:<6} {} ({}, {}) local copy: {}\n",
            status,
            file.key,
            file.media_type,
            format_size(file.size_bytes),
            save_label(&file.local_save)
        ));
    }
    out
}

/// Prints progress to stderr in 25% steps per file.
#[derive(Default)]
pub struct ConsoleEvents {
    reported: Mutex<HashMap<String, u8>>,
}

impl UploadEvents for ConsoleEvents {
    fn on_progress(&self, file_name: &str, percent: f64) {
        let step = ((percent / 25.0).floor() as u8).min(4);
        let mut reported = match self.reported.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let last = reported.entry(file_name.to_string()).or_insert(0);
        if step > *last {
            *last = step;
            eprintln!("{}: {}%", file_name, step as u32 * 25);
        }
    }

    fn on_batch_complete(&self) {
        tracing::info!("All files uploaded");
    }
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("", 5), "");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("héllo wörld", 8), "héllo...");
        assert_eq!(truncate_string("abc", 2), "...");
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(10 * 1024 * 1024), "10.0 MB");
    }

    #[test]
    fn listing_rows_mark_folders() {
        let listing = DirectoryListing {
            prefix: "photos/".to_string(),
            entries: vec![
                BrowserEntry::Folder {
                    name: "2024".to_string(),
                    prefix: "photos/2024/".to_string(),
                },
                BrowserEntry::File {
                    name: "a.jpg".to_string(),
                    key: "photos/a.jpg".to_string(),
                    size: 2048,
                    last_modified: None,
                },
            ],
        };

        let rows = listing_rows(&listing);
        assert_eq!(rows[0].name, "2024/");
        assert_eq!(rows[0].kind, "folder");
        assert_eq!(rows[1].size, Some(2048));

        let text = format_listing(&listing);
        assert!(text.starts_with("photos/\n"));
        assert!(text.contains("2.0 KB"));
    }

    #[test]
    fn console_events_report_each_step_once() {
        let events = ConsoleEvents::default();
        events.on_progress("a.txt", 30.0);
        events.on_progress("a.txt", 40.0);
        events.on_progress("a.txt", 100.0);
        assert_eq!(events.reported.lock().unwrap().get("a.txt"), Some(&4));
    }
}
