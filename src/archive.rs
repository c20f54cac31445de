//! Computes the destination path for a primary file being rolled over.

use chrono::{DateTime, Local, Utc};
use std::path::{Path, PathBuf};

/// Which clock `timestamp` archive names are computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Times {
    #[default]
    Utc,
    Local,
}

impl Times {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "utc" => Some(Times::Utc),
            "local" => Some(Times::Local),
            _ => None,
        }
    }
}

/// How a rolled primary file is named, or whether it is kept at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiveMode {
    #[default]
    None,
    Number,
    Timestamp,
}

impl ArchiveMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(ArchiveMode::None),
            "number" => Some(ArchiveMode::Number),
            "timestamp" => Some(ArchiveMode::Timestamp),
            _ => None,
        }
    }
}

/// Compute the archive destination for `primary`, or `None` if the mode is
/// `ArchiveMode::None` (the caller truncates the primary in place instead).
///
/// `number` mode probes `.0`, `.1`, ... for the first suffix not already
/// present, so suffixes grow monotonically across a process's lifetime
/// rather than shifting existing archives up by one.
///
/// `timestamp` mode uses millisecond resolution and, on the rare collision,
/// appends a disambiguating counter.
pub fn archive_path(mode: ArchiveMode, primary: &Path, times: Times, now: DateTime<Utc>) -> Option<PathBuf> {
    match mode {
        ArchiveMode::None => None,
        ArchiveMode::Number => Some(number_archive_path(primary)),
        ArchiveMode::Timestamp => Some(timestamp_archive_path(primary, times, now)),
    }
}

fn number_archive_path(primary: &Path) -> PathBuf {
    let mut n = 0u64;
    loop {
        let candidate = suffixed(primary, &n.to_string());
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

fn timestamp_archive_path(primary: &Path, times: Times, now: DateTime<Utc>) -> PathBuf {
    let stamp = match times {
        Times::Utc => now.format("%Y%m%dT%H%M%S%.3f").to_string(),
        Times::Local => {
            let local: DateTime<Local> = now.into();
            local.format("%Y%m%dT%H%M%S%.3f").to_string()
        }
    };

    let candidate = suffixed(primary, &stamp);
    if !candidate.exists() {
        return candidate;
    }

    let mut n = 1u64;
    loop {
        let disambiguated = suffixed(primary, &format!("{}.{}", stamp, n));
        if !disambiguated.exists() {
            return disambiguated;
        }
        n += 1;
    }
}

fn suffixed(primary: &Path, suffix: &str) -> PathBuf {
    let mut name = primary.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
