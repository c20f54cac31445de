//! The orchestrator: wires the attribute bag, rotate policy, archive
//! strategy, purge strategy, and compressor stack into the public
//! `open`/`log`/`close` contract.

use crate::archive::{self, ArchiveMode, Times};
use crate::attrs::AttributeBag;
use crate::compress::{CompressionMode, Compressor};
use crate::diag::Diagnostics;
use crate::error::{ChannelError, Result};
use crate::message::{Clock, Message, SystemClock};
use crate::purge::{self, PurgeMode};
use crate::rotate::{RotateMode, RotatePolicy};
use crate::sink::ByteSink;
use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Parsed, cached form of the attribute bag. Rebuilt on every attribute
/// mutation so `log` never reparses a string on the hot path.
struct ParsedConfig {
    compression_mode: CompressionMode,
    rotate_mode: RotateMode,
    raw_size: Option<String>,
    raw_interval: Option<String>,
    rotate: RotatePolicy,
    archive_mode: ArchiveMode,
    times: Times,
    purge_mode: PurgeMode,
}

impl Default for ParsedConfig {
    fn default() -> Self {
        Self {
            compression_mode: CompressionMode::None,
            rotate_mode: RotateMode::None,
            raw_size: None,
            raw_interval: None,
            rotate: RotatePolicy::none(),
            archive_mode: ArchiveMode::None,
            times: Times::Utc,
            purge_mode: PurgeMode::None,
        }
    }
}

impl ParsedConfig {
    fn rebuild_rotate(&mut self, diagnostics: &Diagnostics) {
        self.rotate = match self.rotate_mode {
            RotateMode::None => RotatePolicy::none(),
            RotateMode::Size => match self.raw_size.as_deref().map(crate::sizefmt::parse_size) {
                Some(Ok(threshold)) => RotatePolicy::size(threshold),
                Some(Err(e)) => {
                    diagnostics.warn(&format!("rotate.size: {}, falling back to none", e));
                    RotatePolicy::none()
                }
                None => {
                    diagnostics.warn("rotate=size configured without rotate.size, falling back to none");
                    RotatePolicy::none()
                }
            },
            RotateMode::Interval => match self.raw_interval.as_deref().map(crate::sizefmt::parse_interval) {
                Some(Ok(seconds)) => RotatePolicy::interval(seconds),
                Some(Err(e)) => {
                    diagnostics.warn(&format!("rotate.interval: {}, falling back to none", e));
                    RotatePolicy::none()
                }
                None => {
                    diagnostics.warn("rotate=interval configured without rotate.interval, falling back to none");
                    RotatePolicy::none()
                }
            },
        };
    }
}

fn install_observer(attrs: &mut AttributeBag, config: Rc<RefCell<ParsedConfig>>, diagnostics: Diagnostics) {
    attrs.set_observer(move |key, value| {
        let mut cfg = config.borrow_mut();
        match key {
            "compression_mode" => {
                cfg.compression_mode = CompressionMode::parse(value).unwrap_or_else(|| {
                    diagnostics.warn(&format!(
                        "unrecognized compression_mode '{}', falling back to none",
                        value
                    ));
                    CompressionMode::None
                });
            }
            "rotate" => {
                cfg.rotate_mode = RotateMode::parse(value).unwrap_or_else(|| {
                    diagnostics.warn(&format!("unrecognized rotate '{}', falling back to none", value));
                    RotateMode::None
                });
                cfg.rebuild_rotate(&diagnostics);
            }
            "rotate.size" => {
                cfg.raw_size = Some(value.to_string());
                cfg.rebuild_rotate(&diagnostics);
            }
            "rotate.interval" => {
                cfg.raw_interval = Some(value.to_string());
                cfg.rebuild_rotate(&diagnostics);
            }
            "archive" => {
                cfg.archive_mode = ArchiveMode::parse(value).unwrap_or_else(|| {
                    diagnostics.warn(&format!("unrecognized archive '{}', falling back to none", value));
                    ArchiveMode::None
                });
            }
            "purge" => {
                cfg.purge_mode = PurgeMode::parse(value).unwrap_or_else(|| {
                    diagnostics.warn(&format!("unrecognized purge '{}', falling back to none", value));
                    PurgeMode::None
                });
            }
            "times" => {
                cfg.times = Times::parse(value).unwrap_or_else(|| {
                    diagnostics.warn(&format!("unrecognized times '{}', falling back to utc", value));
                    Times::Utc
                });
            }
            _ => {}
        }
    });
}

/// A scoped resource owning the file handle and compressor for the current
/// primary file. Finalizes the compressor on every exit path, including
/// panic/unwind, via `Drop`.
struct ActiveWriter {
    compressor: Option<Compressor>,
}

impl ActiveWriter {
    fn new(compressor: Compressor) -> Self {
        Self {
            compressor: Some(compressor),
        }
    }

    fn write_record(&mut self, bytes: &[u8]) -> Result<()> {
        self.compressor
            .as_mut()
            .expect("ActiveWriter used after finalize")
            .write_record(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        self.compressor
            .as_mut()
            .expect("ActiveWriter used after finalize")
            .flush()
    }

    /// Finalize the compressor and release the file handle. Consuming `self`
    /// here (rather than relying solely on `Drop`) lets the caller observe
    /// the finalization error.
    fn finalize(mut self) -> Result<()> {
        if let Some(compressor) = self.compressor.take() {
            let sink = compressor.finalize()?;
            drop(sink);
        }
        Ok(())
    }
}

impl Drop for ActiveWriter {
    fn drop(&mut self) {
        if let Some(compressor) = self.compressor.take() {
            let _ = compressor.finalize();
        }
    }
}

/// A rotating, archiving, compressing file log channel.
///
/// Not internally synchronized: at most one logical writer may call
/// `log`/`put_attr`/`open`/`close` at a time. Concurrent callers must
/// serialize through an external mutex.
pub struct FileChannel {
    path: PathBuf,
    attrs: AttributeBag,
    config: Rc<RefCell<ParsedConfig>>,
    writer: Option<ActiveWriter>,
    opened_at: DateTime<Utc>,
    bytes_written: u64,
    rotation_seq: u64,
    diagnostics: Diagnostics,
    clock: Rc<dyn Clock>,
}

impl FileChannel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_diagnostics(path, Diagnostics::default())
    }

    pub fn with_diagnostics(path: impl Into<PathBuf>, diagnostics: Diagnostics) -> Self {
        let mut attrs = AttributeBag::new();
        let config = Rc::new(RefCell::new(ParsedConfig::default()));
        install_observer(&mut attrs, Rc::clone(&config), diagnostics.clone());

        Self {
            path: path.into(),
            attrs,
            config,
            writer: None,
            opened_at: Utc::now(),
            bytes_written: 0,
            rotation_seq: 0,
            diagnostics,
            clock: Rc::new(SystemClock),
        }
    }

    /// Inject a clock, for tests that drive interval rotation without
    /// sleeping in real time.
    #[must_use]
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn rotation_seq(&self) -> u64 {
        self.rotation_seq
    }

    /// Ensure a writer exists. Idempotent.
    pub fn open(&mut self) -> Result<()> {
        if self.writer.is_some() {
            return Ok(());
        }

        let sink = ByteSink::open(&self.path)?;
        self.bytes_written = sink.current_size()?;
        let compression_mode = self.config.borrow().compression_mode;
        self.writer = Some(ActiveWriter::new(Compressor::new(compression_mode, sink)));
        self.opened_at = self.clock.now();
        Ok(())
    }

    /// Finalize the compressor, flush and close the sink, clear state.
    /// Idempotent.
    pub fn close(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
        }
        Ok(())
    }

    pub fn log(&mut self, msg: &dyn Message) -> Result<()> {
        self.open()?;

        let record = format!("{}\n", msg.text());
        let record_len = record.len() as u64;
        let now = self.clock.now();

        let should_rotate = {
            let config = self.config.borrow();
            config
                .rotate
                .should_rotate(self.bytes_written, record_len, self.opened_at, now)
        };

        if should_rotate {
            self.rotate(now)?;
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| ChannelError::not_a_file(self.path.display().to_string()))?;
        writer.write_record(record.as_bytes())?;
        writer.flush()?;
        self.bytes_written += record_len;
        Ok(())
    }

    pub fn put_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attrs.put(key, value);
    }

    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key)
    }

    pub fn get_path(&self) -> &Path {
        &self.path
    }

    /// Current on-disk size of the primary file, or 0 if it does not exist.
    pub fn get_size(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    /// Seconds since the epoch of the primary file's last modification, or
    /// `-1` if the primary file does not exist.
    pub fn get_last_write_time(&self) -> i64 {
        fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(-1)
    }

    /// Close the current primary, archive or truncate it, purge old
    /// archives, and open a fresh primary. On any failure the channel
    /// transitions to the closed state and surfaces the error.
    fn rotate(&mut self, now: DateTime<Utc>) -> Result<()> {
        match self.try_rotate(now) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.writer = None;
                Err(e)
            }
        }
    }

    fn try_rotate(&mut self, now: DateTime<Utc>) -> Result<()> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| ChannelError::not_a_file(self.path.display().to_string()))?;
        writer.finalize()?;

        let (archive_mode, times, purge_mode, compression_mode) = {
            let config = self.config.borrow();
            (config.archive_mode, config.times, config.purge_mode, config.compression_mode)
        };

        match archive::archive_path(archive_mode, &self.path, times, now) {
            Some(dest) => {
                fs::rename(&self.path, &dest).map_err(|e| {
                    ChannelError::io_operation(
                        "rename",
                        self.path.display().to_string(),
                        format!("failed to rotate to '{}'", dest.display()),
                        e,
                    )
                })?;
            }
            None => {
                if self.path.exists() {
                    fs::remove_file(&self.path).map_err(|e| {
                        ChannelError::io_operation(
                            "remove",
                            self.path.display().to_string(),
                            "failed to truncate primary on rotation",
                            e,
                        )
                    })?;
                }
            }
        }

        purge::apply(purge_mode, &self.path, archive_mode, now, &self.diagnostics);

        let sink = ByteSink::open(&self.path)?;
        self.writer = Some(ActiveWriter::new(Compressor::new(compression_mode, sink)));
        self.bytes_written = 0;
        self.opened_at = now;
        self.rotation_seq += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::BasicMessage;
    use tempfile::tempdir;

    fn msg(text: &str) -> BasicMessage {
        BasicMessage::new(text)
    }

    #[test]
    fn test_s1_fresh_channel() {
        let dir = tempdir().unwrap();
        let channel = FileChannel::new(dir.path().join("app.log"));
        assert_eq!(channel.get_size(), 0);
        assert_eq!(channel.get_last_write_time(), -1);
    }

    #[test]
    fn test_s2_default_log_writes_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let mut channel = FileChannel::new(&path);
        channel.log(&msg("What... is the air-speed velocity of an unladen swallow?")).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "What... is the air-speed velocity of an unladen swallow?\n");
    }

    #[test]
    fn test_s6_size_rotation_with_number_archive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let mut channel = FileChannel::new(&path);
        channel.put_attr("rotate", "size");
        channel.put_attr("rotate.size", "57");
        channel.put_attr("archive", "number");
        channel.put_attr("purge", "none");

        let text = "What... is the air-speed velocity of an unladen swallow?";
        for _ in 0..5 {
            channel.log(&msg(text)).unwrap();
        }

        let count = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(count, 6);
        for i in 0..5u64 {
            assert!(dir.path().join(format!("app.log.{}", i)).exists());
        }
        assert!(path.exists());

        // Concatenating the archives in creation order, then the primary,
        // reproduces exactly the five logged records (one archive is left
        // empty by the boundary case where threshold == record length).
        let mut concatenated = Vec::new();
        for i in 0..5u64 {
            concatenated.extend(fs::read(dir.path().join(format!("app.log.{}", i))).unwrap());
        }
        concatenated.extend(fs::read(&path).unwrap());
        let expected: String = std::iter::repeat(format!("{}\n", text)).take(5).collect();
        assert_eq!(concatenated, expected.as_bytes());
    }

    #[test]
    fn test_s7_size_rotation_with_timestamp_archive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let mut channel = FileChannel::new(&path);
        channel.put_attr("rotate", "size");
        channel.put_attr("rotate.size", "57");
        channel.put_attr("archive", "timestamp");
        channel.put_attr("purge", "none");

        let text = "What... is the air-speed velocity of an unladen swallow?";
        for _ in 0..5 {
            channel.log(&msg(text)).unwrap();
        }

        let count = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(count, 6);
    }

    #[test]
    fn test_s10_interval_rotation_archive_none_truncates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let clock = Rc::new(crate::message::FixedClock::new(Utc::now()));
        let mut channel = FileChannel::new(&path).with_clock(clock.clone());
        channel.put_attr("rotate", "interval");
        channel.put_attr("rotate.interval", "00:00:01");
        channel.put_attr("archive", "none");

        let text = "What... is the air-speed velocity of an unladen swallow?";
        channel.log(&msg(text)).unwrap();
        clock.advance(chrono::Duration::seconds(1));
        channel.log(&msg(text)).unwrap();
        channel.log(&msg(text)).unwrap();
        clock.advance(chrono::Duration::seconds(1));
        channel.log(&msg(text)).unwrap();
        channel.log(&msg(text)).unwrap();

        let count = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(count, 1);
        let contents = fs::read_to_string(&path).unwrap();
        let single_record = format!("{}\n", text);
        assert_ne!(contents, single_record);
    }

    #[test]
    fn test_s11_interval_rotation_archive_number() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let clock = Rc::new(crate::message::FixedClock::new(Utc::now()));
        let mut channel = FileChannel::new(&path).with_clock(clock.clone());
        channel.put_attr("rotate", "interval");
        channel.put_attr("rotate.interval", "00:00:01");
        channel.put_attr("archive", "number");

        let text = "What... is the air-speed velocity of an unladen swallow?";
        channel.log(&msg(text)).unwrap();
        clock.advance(chrono::Duration::seconds(1));
        channel.log(&msg(text)).unwrap();
        channel.log(&msg(text)).unwrap();
        clock.advance(chrono::Duration::seconds(1));
        channel.log(&msg(text)).unwrap();
        channel.log(&msg(text)).unwrap();

        let count = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_s12_interval_rotation_archive_timestamp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let clock = Rc::new(crate::message::FixedClock::new(Utc::now()));
        let mut channel = FileChannel::new(&path).with_clock(clock.clone());
        channel.put_attr("rotate", "interval");
        channel.put_attr("rotate.interval", "00:00:01");
        channel.put_attr("archive", "timestamp");

        let text = "What... is the air-speed velocity of an unladen swallow?";
        channel.log(&msg(text)).unwrap();
        clock.advance(chrono::Duration::seconds(1));
        channel.log(&msg(text)).unwrap();
        channel.log(&msg(text)).unwrap();
        clock.advance(chrono::Duration::seconds(1));
        channel.log(&msg(text)).unwrap();
        channel.log(&msg(text)).unwrap();

        let count = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_put_attr_get_attr_roundtrip() {
        let dir = tempdir().unwrap();
        let mut channel = FileChannel::new(dir.path().join("app.log"));
        channel.put_attr("compression_mode", "gzip");
        assert_eq!(channel.get_attr("compression_mode"), Some("gzip"));
    }

    #[test]
    fn test_unrecognized_attribute_value_falls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let mut channel = FileChannel::new(&path);
        channel.put_attr("compression_mode", "lz4");
        // Falls back to none rather than erroring; log still succeeds.
        channel.log(&msg("hi")).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "hi\n");
    }

    #[test]
    fn test_open_on_directory_fails() {
        let dir = tempdir().unwrap();
        let mut channel = FileChannel::new(dir.path());
        let err = channel.open().unwrap_err();
        assert!(matches!(err, ChannelError::NotAFile { .. }));
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut channel = FileChannel::new(dir.path().join("app.log"));
        channel.log(&msg("hi")).unwrap();
        channel.close().unwrap();
        channel.close().unwrap();
    }
}
