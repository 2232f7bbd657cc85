use std::path::{Path, PathBuf};

use crate::styles::{detect_engine_style, StyleEntry, StyleResults};
use crate::{ProcessingError, Result};

/// Collect style results and a video title from the files an engine wrote.
///
/// Files are visited in filename order and the first file per result key wins.
pub fn parse_outputs(output_dir: &Path) -> Result<(StyleResults, String)> {
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in fs_err::read_dir(output_dir).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        // Symlinks are not followed
        if entry.file_type().map_err(read_error)?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    let mut results = StyleResults::default();
    let mut video_title = String::new();

    for file_path in files {
        let Some(file_name) = file_path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let Some(entry) = detect_engine_style(file_name) else {
            tracing::debug!("Ignoring unrecognized output file: {}", file_name);
            continue;
        };
        if results.contains(entry.result_key) {
            tracing::debug!(
                "Skipping {}: {} already collected",
                file_name,
                entry.result_key.as_str()
            );
            continue;
        }

        let content = fs_err::read_to_string(&file_path).map_err(read_error)?;
        results.set(entry.result_key, content.trim().to_string());

        if video_title.is_empty() {
            let stem = file_path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or(file_name);
            video_title = extract_title(stem, entry);
        }
    }

    Ok((results, video_title))
}

fn read_error(error: std::io::Error) -> ProcessingError {
    ProcessingError::external(format!("Failed to read processed output: {}", error))
}

/// Title is whatever precedes the style name in the file stem
pub fn extract_title(stem: &str, entry: &StyleEntry) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `stem`
    let lower_stem = stem.to_ascii_lowercase();
    let Some(index) = lower_stem.find(&entry.engine_name.to_ascii_lowercase()) else {
        return cleanup_title(stem);
    };

    let title_part = stem[..index].trim_end_matches([' ', '-', '_']);
    if title_part.is_empty() {
        cleanup_title(stem)
    } else {
        cleanup_title(title_part)
    }
}

fn cleanup_title(value: &str) -> String {
    value.replace(['_', '-'], " ").trim().to_string()
}
