//! Authoritative recording timestamp resolution.
//!
//! Four tiers, first hit wins: movie-header creation instant, a
//! `YYYYMMDD HHMMSS` prefix in the original filename, filesystem
//! creation/modification time, current wall-clock time. The last tier
//! cannot fail, so resolution always produces a value.

use std::fs::Metadata;

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static FILENAME_STAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{8}) (\d{6})").expect("valid filename stamp pattern"));

/// The one instant chosen for a recording, in local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTimestamp(DateTime<Local>);

impl ResolvedTimestamp {
    /// ISO-8601 with the local UTC offset, for the note header.
    pub fn iso8601(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, false)
    }

    /// Sortable compact form used as the leading basename segment.
    pub fn compact(&self) -> String {
        self.0.format("%Y-%m-%d_%H-%M-%S").to_string()
    }

    pub fn instant(&self) -> DateTime<Local> {
        self.0
    }
}

/// Resolve one instant from the decoded movie creation time, the original
/// filename, and the filesystem metadata, in that order of priority.
pub fn resolve(
    movie_created: Option<DateTime<Utc>>,
    filename: &str,
    fs_meta: Option<&Metadata>,
) -> ResolvedTimestamp {
    if let Some(created) = movie_created {
        tracing::debug!("timestamp from movie header");
        return ResolvedTimestamp(created.with_timezone(&Local));
    }
    if let Some(stamped) = from_filename(filename) {
        tracing::debug!("timestamp from filename prefix");
        return ResolvedTimestamp(stamped);
    }
    if let Some(fs_time) = fs_meta.and_then(from_filesystem) {
        tracing::debug!("timestamp from filesystem metadata");
        return ResolvedTimestamp(fs_time);
    }
    tracing::debug!("timestamp fell back to current time");
    ResolvedTimestamp(Local::now())
}

/// Match "8 digits, space, 6 digits" at the start of the filename and read
/// it as `YYYYMMDD HHMMSS` in local civil time.
fn from_filename(filename: &str) -> Option<DateTime<Local>> {
    let caps = FILENAME_STAMP.captures(filename)?;
    let naive = NaiveDateTime::parse_from_str(
        &format!("{} {}", &caps[1], &caps[2]),
        "%Y%m%d %H%M%S",
    )
    .ok()?;
    Local.from_local_datetime(&naive).earliest()
}

/// Creation time where the platform exposes it, else modification time.
fn from_filesystem(meta: &Metadata) -> Option<DateTime<Local>> {
    meta.created()
        .or_else(|_| meta.modified())
        .ok()
        .map(DateTime::<Local>::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movie_header_takes_priority_over_filename() {
        let created = Utc.timestamp_opt(1_600_000_000, 0).unwrap();
        let resolved = resolve(Some(created), "20240101 120000 memo.m4a", None);
        assert_eq!(resolved.instant().timestamp(), 1_600_000_000);
    }

    #[test]
    fn filename_prefix_parses_as_local_time() {
        let resolved = resolve(None, "20240315 093045.m4a", None);
        let expected = Local
            .with_ymd_and_hms(2024, 3, 15, 9, 30, 45)
            .earliest()
            .unwrap();
        assert_eq!(resolved.instant(), expected);
        assert_eq!(resolved.compact(), "2024-03-15_09-30-45");
    }

    #[test]
    fn filename_pattern_must_anchor_at_start() {
        assert!(from_filename("memo 20240315 093045.m4a").is_none());
        assert!(from_filename("2024031 093045.m4a").is_none());
        assert!(from_filename("20241301 093045.m4a").is_none()); // month 13
    }

    #[test]
    fn filesystem_metadata_is_third_tier() {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        let meta = file.as_file().metadata().expect("metadata");
        let resolved = resolve(None, "memo.m4a", Some(&meta));
        let age = Local::now().signed_duration_since(resolved.instant());
        assert!(age.num_seconds().abs() < 60);
    }

    #[test]
    fn final_tier_always_produces_an_instant() {
        let resolved = resolve(None, "memo.m4a", None);
        let age = Local::now().signed_duration_since(resolved.instant());
        assert!(age.num_seconds().abs() < 60);
    }

    #[test]
    fn iso_rendering_carries_an_offset() {
        let resolved = resolve(None, "20240315 093045.m4a", None);
        let iso = resolved.iso8601();
        assert!(iso.starts_with("2024-03-15T09:30:45"));
        assert!(iso.contains('+') || iso.contains('-') || iso.ends_with('Z'));
    }
}
