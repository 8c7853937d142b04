//! Turning paths on the command line, or pasted into the shell, into `ResumeFile`s.

use anyhow::{Context, Result};
use lumascan::types::{ResumeFile, PDF_MIME_TYPE};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Reads a file and labels it with a MIME type, the way a browser would: by its
/// extension first, then by its content.
pub fn read_resume_file(path: &Path) -> Result<ResumeFile> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read '{}'", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime_type = mime_type_for(path, &bytes);
    Ok(ResumeFile::new(file_name, mime_type, bytes))
}

fn mime_type_for(path: &Path, bytes: &[u8]) -> String {
    let is_pdf_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf_extension {
        return PDF_MIME_TYPE.to_string();
    }
    infer::get(bytes)
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string())
}

/// Interprets a shell line as a dropped file, if it names an existing file.
///
/// Terminals paste dragged files quoted, backslash-escaped or as `file://` URLs.
pub fn dropped_path(line: &str) -> Option<PathBuf> {
    let trimmed = line.trim();
    let unquoted = trimmed
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .map(str::to_string)
        .unwrap_or_else(|| trimmed.replace("\\ ", " "));
    if unquoted.is_empty() {
        return None;
    }

    let path = if unquoted.starts_with("file://") {
        Url::parse(&unquoted).ok()?.to_file_path().ok()?
    } else {
        PathBuf::from(unquoted)
    };
    path.is_file().then_some(path)
}
