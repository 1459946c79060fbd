//! Per-file processing: read, walk, decode, resolve, write.
//!
//! One input at a time, in the order supplied. A file that cannot be read
//! degrades to a warning and the batch continues; every readable `.m4a`
//! contributes a note even when most of its metadata is undecodable.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::atom::{self, FourCc};
use crate::metadata::DecodedMetadata;
use crate::note::{NoteDocument, NoteError, NoteWriter};
use crate::slug::{slugify, MAX_SLUG_LEN};
use crate::timestamp;
use crate::walker::collect_atoms;

/// Atom types captured from the tree.
pub const TARGETS: [FourCc; 5] = [atom::MVHD, atom::TKHD, atom::MDHD, atom::NAM, atom::TSRP];

/// Input extension accepted for processing (case-insensitive).
pub const INPUT_EXTENSION: &str = "m4a";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to read {}: {source}", .path.display())]
    ReadInput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Note(#[from] NoteError),
}

/// Counts for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Process a batch of paths sequentially.
///
/// Ensures the destination directory exists exactly once, then handles
/// each path inside its own failure boundary: unreadable or unwritable
/// inputs are logged and counted, never fatal for the rest of the batch.
pub fn process_paths(paths: &[PathBuf], writer: &NoteWriter) -> Result<RunSummary, NoteError> {
    writer.ensure_dest()?;

    let mut summary = RunSummary::default();
    for path in paths {
        if !has_input_extension(path) {
            tracing::debug!(path = %path.display(), "skipping non-m4a input");
            summary.skipped += 1;
            continue;
        }
        match process_file(path, writer) {
            Ok(_) => summary.processed += 1,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to process input");
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}

/// Process one voice memo container into a note, returning the note path.
pub fn process_file(path: &Path, writer: &NoteWriter) -> Result<PathBuf, PipelineError> {
    let data = Bytes::from(std::fs::read(path).map_err(|source| PipelineError::ReadInput {
        path: path.to_path_buf(),
        source,
    })?);

    let found = collect_atoms(&data, 0, data.len(), &TARGETS);
    let meta = DecodedMetadata::from_atoms(&found);

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "voice-memo".to_string());

    let resolved = timestamp::resolve(
        meta.movie_created(),
        &filename,
        std::fs::metadata(path).ok().as_ref(),
    );

    let title = meta.title.clone().unwrap_or(stem);
    let basename = NoteWriter::basename(&resolved.compact(), &slugify(&title, MAX_SLUG_LEN));

    let doc = NoteDocument {
        title,
        date_iso: resolved.iso8601(),
        duration_seconds: meta.duration_seconds,
        language: meta.language.clone(),
        transcript: meta.transcript.clone(),
        audio_file: None,
    };

    Ok(writer.write(&basename, doc, path)?)
}

fn has_input_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(INPUT_EXTENSION))
}
