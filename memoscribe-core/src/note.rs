//! Markdown note assembly and persistence.
//!
//! One note per recording: a YAML-style front-matter block with the
//! decoded metadata, then the transcript body. Writes overwrite any
//! existing note of the same basename without warning.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::metadata::Language;

/// Fixed `source` header value.
pub const SOURCE_LABEL: &str = "Apple Voice Memos";

/// Body used when no transcript could be decoded.
pub const PLACEHOLDER_BODY: &str = "(no embedded transcript)";

/// Output file extension (without the dot).
pub const NOTE_EXTENSION: &str = "md";

#[derive(Debug, Error)]
pub enum NoteError {
    #[error("Failed to create output directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write note {}: {source}", .path.display())]
    WriteNote {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to copy audio to {}: {source}", .path.display())]
    CopyAudio {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Everything that goes into one rendered note.
#[derive(Debug, Clone)]
pub struct NoteDocument {
    pub title: String,
    pub date_iso: String,
    pub duration_seconds: Option<f64>,
    pub language: Option<Language>,
    pub transcript: Option<String>,
    /// Companion audio filename, only set when the audio copy is enabled.
    pub audio_file: Option<String>,
}

impl NoteDocument {
    /// Render the full document: front matter in fixed field order, blank
    /// line, body, exactly one trailing newline.
    pub fn render(&self) -> String {
        let mut lines: Vec<String> = vec![
            "---".to_string(),
            format!("title: \"{}\"", yaml_escape(&self.title)),
            format!("date: \"{}\"", yaml_escape(&self.date_iso)),
            format!("source: \"{}\"", SOURCE_LABEL),
        ];
        if let Some(duration) = self.duration_seconds {
            lines.push(format!("duration_seconds: {duration:.3}"));
        }
        if let Some(language) = &self.language {
            lines.push(format!("language: \"{}\"", yaml_escape(language.identifier())));
        }
        lines.push("tags: [\"voice-memo\"]".to_string());
        if let Some(audio) = &self.audio_file {
            lines.push(format!("audio: \"./{}\"", yaml_escape(audio)));
        }
        lines.push("---".to_string());

        let body = match &self.transcript {
            Some(text) => text.trim(),
            None => PLACEHOLDER_BODY,
        };
        format!("{}\n\n{}\n", lines.join("\n"), body)
    }
}

/// Writes notes into one fixed destination directory.
#[derive(Debug, Clone)]
pub struct NoteWriter {
    dest: PathBuf,
    copy_audio: bool,
}

impl NoteWriter {
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        Self {
            dest: dest.into(),
            copy_audio: false,
        }
    }

    /// Enable copying the source audio next to the note, with an `audio`
    /// header line pointing at it. Dormant capability: the shipped CLI
    /// never turns this on.
    pub fn with_audio_copy(mut self, enabled: bool) -> Self {
        self.copy_audio = enabled;
        self
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Idempotently ensure the destination directory exists. Called once
    /// per run before any writes.
    pub fn ensure_dest(&self) -> Result<(), NoteError> {
        std::fs::create_dir_all(&self.dest).map_err(|source| NoteError::CreateDir {
            path: self.dest.clone(),
            source,
        })
    }

    /// Build the output basename from the compact timestamp and slug.
    pub fn basename(compact_timestamp: &str, slug: &str) -> String {
        format!("{compact_timestamp}_{slug}")
    }

    /// Render and persist one note, returning the written path. An
    /// existing note of the same basename is silently overwritten.
    pub fn write(
        &self,
        basename: &str,
        mut doc: NoteDocument,
        source_audio: &Path,
    ) -> Result<PathBuf, NoteError> {
        if self.copy_audio {
            let audio_name = format!("{basename}.m4a");
            let audio_path = self.dest.join(&audio_name);
            std::fs::copy(source_audio, &audio_path).map_err(|source| NoteError::CopyAudio {
                path: audio_path.clone(),
                source,
            })?;
            doc.audio_file = Some(audio_name);
        }

        let note_path = self.dest.join(format!("{basename}.{NOTE_EXTENSION}"));
        std::fs::write(&note_path, doc.render()).map_err(|source| NoteError::WriteNote {
            path: note_path.clone(),
            source,
        })?;
        tracing::info!(path = %note_path.display(), "wrote note");
        Ok(note_path)
    }
}

fn yaml_escape(text: &str) -> String {
    // Deliberately minimal: only double quotes are escaped.
    text.replace('"', "\\\"")
}
