//! Binary payload decoders for the captured metadata atoms.
//!
//! All decoders are total functions of a payload buffer: malformed input
//! yields `None` (field unavailable), never an error. Callers fall through
//! to the next source or omit the field.

use std::collections::HashMap;

use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::atom::{self, FourCc};

/// Seconds between the container epoch (1904-01-01) and the Unix epoch.
pub const MP4_EPOCH_OFFSET: i64 = 2_082_844_800;

/// Creation/modification instants from one header atom. Either side may be
/// absent when the raw value does not land after the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampPair {
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

/// Language tag from the transcript JSON: a plain string or a structured
/// value carrying an `identifier`. Any other JSON shape fails to decode
/// and the language is omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Language {
    Plain(String),
    Structured { identifier: String },
}

impl Language {
    pub fn identifier(&self) -> &str {
        match self {
            Language::Plain(tag) => tag,
            Language::Structured { identifier } => identifier,
        }
    }
}

/// Everything the decoders could recover from one container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecodedMetadata {
    pub duration_seconds: Option<f64>,
    pub movie_times: Option<TimestampPair>,
    pub track_times: Option<TimestampPair>,
    pub media_times: Option<TimestampPair>,
    pub title: Option<String>,
    pub transcript: Option<String>,
    pub language: Option<Language>,
}

impl DecodedMetadata {
    /// Decode every recognized atom from a walker result.
    pub fn from_atoms(found: &HashMap<FourCc, Bytes>) -> Self {
        let (transcript, language) = found
            .get(&atom::TSRP)
            .map(|p| decode_transcript(p))
            .unwrap_or((None, None));

        Self {
            duration_seconds: found.get(&atom::MVHD).and_then(|p| decode_duration(p)),
            movie_times: found.get(&atom::MVHD).and_then(|p| decode_timestamp_pair(p)),
            track_times: found.get(&atom::TKHD).and_then(|p| decode_timestamp_pair(p)),
            media_times: found.get(&atom::MDHD).and_then(|p| decode_timestamp_pair(p)),
            title: found.get(&atom::NAM).and_then(|p| decode_title(p)),
            transcript,
            language,
        }
    }

    /// The movie-header creation instant, the resolver's first tier.
    pub fn movie_created(&self) -> Option<DateTime<Utc>> {
        self.movie_times.and_then(|t| t.created)
    }
}

fn be_u32(payload: &[u8], offset: usize) -> Option<u32> {
    payload
        .get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_be_bytes)
}

fn be_u64(payload: &[u8], offset: usize) -> Option<u64> {
    payload
        .get(offset..offset + 8)
        .and_then(|b| b.try_into().ok())
        .map(u64::from_be_bytes)
}

/// Movie-header duration in seconds.
///
/// Version 0 keeps a 32-bit duration, version 1 a 64-bit one at different
/// offsets. A zero timescale, short payload, or unknown version is
/// undecodable.
pub fn decode_duration(payload: &[u8]) -> Option<f64> {
    if payload.len() < 20 {
        return None;
    }
    let (timescale, duration) = match payload[0] {
        0 if payload.len() >= 24 => (be_u32(payload, 12)?, be_u32(payload, 16)? as u64),
        1 if payload.len() >= 36 => (be_u32(payload, 20)?, be_u64(payload, 24)?),
        _ => return None,
    };
    if timescale == 0 {
        return None;
    }
    Some(duration as f64 / timescale as f64)
}

/// Creation/modification instants shared by mvhd, tkhd and mdhd.
///
/// Raw values are seconds since 1904-01-01 UTC; anything at or below the
/// epoch offset is treated as absent rather than mapped to a negative or
/// zero Unix timestamp.
pub fn decode_timestamp_pair(payload: &[u8]) -> Option<TimestampPair> {
    let (created, modified) = match *payload.first()? {
        0 => (be_u32(payload, 4)? as u64, be_u32(payload, 8)? as u64),
        1 => (be_u64(payload, 4)?, be_u64(payload, 12)?),
        _ => return None,
    };
    Some(TimestampPair {
        created: mp4_instant(created),
        modified: mp4_instant(modified),
    })
}

fn mp4_instant(raw: u64) -> Option<DateTime<Utc>> {
    let raw = i64::try_from(raw).ok()?;
    if raw <= MP4_EPOCH_OFFSET {
        return None;
    }
    Utc.timestamp_opt(raw - MP4_EPOCH_OFFSET, 0).single()
}

/// Display title from the `©nam` payload.
///
/// The payload is a miniature child structure: each child is a 4-byte size
/// plus 4-byte type; a `data` child carries a 16-byte type/locale
/// sub-header before the text. UTF-8 is tried first, then UTF-16BE; the
/// first non-empty decoded string wins.
pub fn decode_title(payload: &[u8]) -> Option<String> {
    let mut cursor = 0usize;
    while cursor + 8 <= payload.len() {
        let size = be_u32(payload, cursor)? as usize;
        if size < 8 {
            break;
        }
        let kind = &payload[cursor + 4..cursor + 8];
        let child_end = (cursor + size).min(payload.len());
        if kind == &atom::DATA && size >= 16 && cursor + 16 <= child_end {
            let text_bytes = &payload[cursor + 16..child_end];
            if let Some(text) = decode_text(text_bytes) {
                return Some(text);
            }
        }
        cursor = child_end;
    }
    None
}

fn decode_text(bytes: &[u8]) -> Option<String> {
    let decoded = match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => decode_utf16_be(bytes)?,
    };
    let trimmed = decoded.trim_end_matches('\0').trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn decode_utf16_be(bytes: &[u8]) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

/// Transcript text and language tag from the `tsrp` payload.
///
/// The payload may carry a non-JSON prefix before the opening brace. Text
/// comes from `attributedString`: either an object holding a `runs` list
/// or a bare list; only plain string elements are concatenated, everything
/// else (run-attribute objects and the like) is skipped.
pub fn decode_transcript(payload: &[u8]) -> (Option<String>, Option<Language>) {
    let raw = String::from_utf8_lossy(payload);
    let json = match raw.find('{') {
        Some(idx) => &raw[idx..],
        None => raw.as_ref(),
    };
    let obj: Value = match serde_json::from_str(json) {
        Ok(value) => value,
        Err(_) => return (None, None),
    };

    let language = ["languageTag", "language", "locale"]
        .iter()
        .find_map(|key| obj.get(*key))
        .cloned()
        .and_then(|value| serde_json::from_value(value).ok());

    let text = match obj.get("attributedString") {
        Some(Value::Object(attributed)) => attributed
            .get("runs")
            .and_then(Value::as_array)
            .map(|runs| concat_string_runs(runs)),
        Some(Value::Array(runs)) => Some(concat_string_runs(runs)),
        _ => None,
    };

    (text.filter(|t| !t.is_empty()), language)
}

fn concat_string_runs(runs: &[Value]) -> String {
    runs.iter().filter_map(Value::as_str).collect()
}
