//! Deletes or caps archived files once they are no longer wanted.

use crate::archive::ArchiveMode;
use crate::diag::Diagnostics;
use crate::error::Result;
use crate::sizefmt::parse_interval;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// How many (or how old) archives are retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PurgeMode {
    #[default]
    None,
    Count(usize),
    Age(u64),
}

impl PurgeMode {
    /// Parse a `purge` attribute value: `none`, `count:N`, or `age:HH:MM:SS`.
    pub fn parse(value: &str) -> Option<Self> {
        if value == "none" {
            return Some(PurgeMode::None);
        }
        if let Some(rest) = value.strip_prefix("count:") {
            return rest.parse().ok().map(PurgeMode::Count);
        }
        if let Some(rest) = value.strip_prefix("age:") {
            return parse_interval(rest).ok().map(PurgeMode::Age);
        }
        None
    }
}

/// Apply `mode` to the archives of `primary`. Deletion failures are reported
/// through `diagnostics` and otherwise ignored: purge never fails the
/// caller of `log`.
pub fn apply(mode: PurgeMode, primary: &Path, archive_mode: ArchiveMode, now: DateTime<Utc>, diagnostics: &Diagnostics) {
    if mode == PurgeMode::None {
        return;
    }

    let candidates = match archived_files(primary) {
        Ok(files) => files,
        Err(e) => {
            diagnostics.warn(&format!("purge: failed to list archive directory: {}", e));
            return;
        }
    };

    let to_delete = match mode {
        PurgeMode::None => Vec::new(),
        PurgeMode::Count(keep) => select_by_count(candidates, keep, archive_mode),
        PurgeMode::Age(max_age_secs) => select_by_age(candidates, max_age_secs, now),
    };

    for path in to_delete {
        if let Err(e) = fs::remove_file(&path) {
            diagnostics.warn(&format!("purge: failed to remove '{}': {}", path.display(), e));
        }
    }
}

/// Files in `dirname(primary)` whose name begins with `basename(primary) + "."`.
fn archived_files(primary: &Path) -> std::io::Result<Vec<std::path::PathBuf>> {
    let dir = primary.parent().filter(|p| !p.as_os_str().is_empty());
    let dir = dir.unwrap_or_else(|| Path::new("."));
    let prefix = format!(
        "{}.",
        primary.file_name().and_then(|n| n.to_str()).unwrap_or_default()
    );

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            if name.starts_with(&prefix) {
                files.push(entry.path());
            }
        }
    }
    Ok(files)
}

fn select_by_count(
    mut files: Vec<std::path::PathBuf>,
    keep: usize,
    archive_mode: ArchiveMode,
) -> Vec<std::path::PathBuf> {
    match archive_mode {
        ArchiveMode::Number => {
            files.sort_by_key(|p| numeric_suffix(p).unwrap_or(0));
        }
        _ => {
            files.sort_by_key(|p| fs::metadata(p).and_then(|m| m.modified()).unwrap_or(SystemTime::UNIX_EPOCH));
        }
    }
    if files.len() <= keep {
        return Vec::new();
    }
    let drop_count = files.len() - keep;
    files.into_iter().take(drop_count).collect()
}

fn select_by_age(
    files: Vec<std::path::PathBuf>,
    max_age_secs: u64,
    now: DateTime<Utc>,
) -> Vec<std::path::PathBuf> {
    let cutoff = now - chrono::Duration::seconds(max_age_secs as i64);
    files
        .into_iter()
        .filter(|p| {
            fs::metadata(p)
                .and_then(|m| m.modified())
                .map(DateTime::<Utc>::from)
                .map(|mtime| mtime < cutoff)
                .unwrap_or(false)
        })
        .collect()
}

fn numeric_suffix(path: &Path) -> Option<u64> {
    path.extension()?.to_str()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_modes() {
        assert_eq!(PurgeMode::parse("none"), Some(PurgeMode::None));
        assert_eq!(PurgeMode::parse("count:5"), Some(PurgeMode::Count(5)));
        assert_eq!(PurgeMode::parse("age:01:00:00"), Some(PurgeMode::Age(3600)));
        assert_eq!(PurgeMode::parse("bogus"), None);
    }

    #[test]
    fn test_count_keeps_most_recent_by_number() {
        let dir = tempdir().unwrap();
        let primary = dir.path().join("a.log");
        for i in 0..5u64 {
            std::fs::write(dir.path().join(format!("a.log.{}", i)), b"x").unwrap();
        }
        let diag = Diagnostics::default();
        apply(PurgeMode::Count(2), &primary, ArchiveMode::Number, Utc::now(), &diag);

        let remaining: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_str().unwrap().to_string())
            .collect();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.contains(&"a.log.3".to_string()));
        assert!(remaining.contains(&"a.log.4".to_string()));
    }

    #[test]
    fn test_none_mode_deletes_nothing() {
        let dir = tempdir().unwrap();
        let primary = dir.path().join("a.log");
        std::fs::write(dir.path().join("a.log.0"), b"x").unwrap();
        let diag = Diagnostics::default();
        apply(PurgeMode::None, &primary, ArchiveMode::Number, Utc::now(), &diag);
        assert!(dir.path().join("a.log.0").exists());
    }
}
