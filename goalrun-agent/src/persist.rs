//! Writing recovered replies to disk

use crate::extract::extract_last_response;
use crate::transcript::Transcript;
use goalrun_backend::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Result of a save request that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(PathBuf),
    /// No destination was chosen; nothing was written
    Cancelled,
}

/// Write `text` byte-for-byte to the chosen path.
///
/// `None` means the user backed out of choosing one.
pub fn save_to_path(text: &str, path: Option<&Path>) -> Result<SaveOutcome> {
    let Some(path) = path else {
        return Ok(SaveOutcome::Cancelled);
    };

    std::fs::write(path, text).map_err(|e| {
        Error::from(e)
            .with_operation("persist::save_to_path")
            .with_context("path", path.display().to_string())
    })?;

    info!(path = %path.display(), bytes = text.len(), "output saved");
    Ok(SaveOutcome::Saved(path.to_path_buf()))
}

/// Append `.{extension}` when the chosen path has no extension of its own
pub fn with_default_extension(path: &Path, extension: &str) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(extension)
    }
}

/// Save the latest reply found in the transcript, reporting back into it.
///
/// Fails with `ResponseNotFound` before any path is consulted when there is
/// nothing to save.
pub fn save_last_response(transcript: &Transcript, chosen: Option<&Path>) -> Result<SaveOutcome> {
    let Some(text) = extract_last_response(&transcript.text()) else {
        warn!("save requested but transcript holds no reply");
        transcript.append("\n⚠️ No LLM response found to save.");
        return Err(Error::response_not_found().with_operation("persist::save_last_response"));
    };

    match save_to_path(&text, chosen) {
        Ok(SaveOutcome::Saved(path)) => {
            transcript.append(format!("\n💾 Saved output to: {}", path.display()));
            Ok(SaveOutcome::Saved(path))
        }
        Ok(SaveOutcome::Cancelled) => {
            transcript.append("\n❌ Save cancelled.");
            Ok(SaveOutcome::Cancelled)
        }
        Err(err) => {
            transcript.append(format!("\n❌ Error: {}", err.message()));
            Err(err.with_operation("persist::save_last_response"))
        }
    }
}
