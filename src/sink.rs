//! The innermost writable stream: an OS file opened in append mode, wrapped
//! in a `BufWriter`. Implements `std::io::Write` so compressors can be
//! layered on top of it without a bespoke trait.

use crate::error::{ChannelError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// A writable stream over a path.
#[derive(Debug)]
pub struct ByteSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl ByteSink {
    /// Open `path`, creating it if absent and appending if present.
    ///
    /// # Errors
    ///
    /// Returns `NotAFile` if `path` names an existing directory, or
    /// `IoOperation` if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if path.is_dir() {
            return Err(ChannelError::not_a_file(path.display().to_string()));
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    ChannelError::io_operation(
                        "create parent directory",
                        parent.display().to_string(),
                        "failed to create log directory",
                        e,
                    )
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                ChannelError::io_operation(
                    "open",
                    path.display().to_string(),
                    "failed to open primary file",
                    e,
                )
            })?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current on-disk size of the underlying file, consulting the OS
    /// directly (not an in-process counter).
    pub fn current_size(&self) -> Result<u64> {
        fs::metadata(&self.path).map(|m| m.len()).map_err(|e| {
            ChannelError::io_operation("stat", self.path.display().to_string(), "failed to stat file", e)
        })
    }
}

impl Write for ByteSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sink.log");
        let sink = ByteSink::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(sink.current_size().unwrap(), 0);
    }

    #[test]
    fn test_open_appends_to_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sink.log");
        {
            let mut sink = ByteSink::open(&path).unwrap();
            sink.write_all(b"hello\n").unwrap();
            sink.flush().unwrap();
        }
        let sink = ByteSink::open(&path).unwrap();
        assert_eq!(sink.current_size().unwrap(), 6);
    }

    #[test]
    fn test_open_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = ByteSink::open(dir.path()).unwrap_err();
        assert!(matches!(err, ChannelError::NotAFile { .. }));
    }

    #[test]
    fn test_write_then_size_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sink.log");
        let mut sink = ByteSink::open(&path).unwrap();
        sink.write_all(b"abc").unwrap();
        sink.flush().unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 3);
    }
}
