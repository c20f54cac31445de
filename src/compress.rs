//! The compressor stack: an optional streaming filter layered on top of a
//! `ByteSink`. Represented as a tagged enum rather than a trait object so
//! that adding a codec is a new variant, not a new class, and so the hot
//! `write` path is statically dispatched.

use crate::error::{ChannelError, Result};
use crate::sink::ByteSink;
use bzip2::write::BzEncoder;
use bzip2::Compression as BzCompression;
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression as GzCompression;
use std::io::Write;

/// Which codec is active for the live write stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionMode {
    #[default]
    None,
    Gzip,
    Bzip2,
    Zlib,
}

impl CompressionMode {
    /// Parse a `compression_mode` attribute value. Returns `None` (the
    /// `Option`, not the variant) on an unrecognized value so the caller can
    /// fall back and emit a diagnostic, per the attribute bag's contract.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(CompressionMode::None),
            "gzip" => Some(CompressionMode::Gzip),
            "bzip2" => Some(CompressionMode::Bzip2),
            "zlib" => Some(CompressionMode::Zlib),
            _ => None,
        }
    }
}

/// A byte sink with an optional compression filter layered on top.
pub enum Compressor {
    None(ByteSink),
    Gzip(GzEncoder<ByteSink>),
    Bzip2(BzEncoder<ByteSink>),
    Zlib(ZlibEncoder<ByteSink>),
}

impl Compressor {
    pub fn new(mode: CompressionMode, sink: ByteSink) -> Self {
        match mode {
            CompressionMode::None => Compressor::None(sink),
            CompressionMode::Gzip => Compressor::Gzip(GzEncoder::new(sink, GzCompression::default())),
            CompressionMode::Bzip2 => Compressor::Bzip2(BzEncoder::new(sink, BzCompression::default())),
            CompressionMode::Zlib => Compressor::Zlib(ZlibEncoder::new(sink, GzCompression::default())),
        }
    }

    fn path_hint(&self) -> String {
        match self {
            Compressor::None(sink) => sink.path().display().to_string(),
            Compressor::Gzip(enc) => enc.get_ref().path().display().to_string(),
            Compressor::Bzip2(enc) => enc.get_ref().path().display().to_string(),
            Compressor::Zlib(enc) => enc.get_ref().path().display().to_string(),
        }
    }

    pub fn write_record(&mut self, bytes: &[u8]) -> Result<()> {
        let path = self.path_hint();
        let result: std::io::Result<()> = match self {
            Compressor::None(sink) => sink.write_all(bytes),
            Compressor::Gzip(enc) => enc.write_all(bytes),
            Compressor::Bzip2(enc) => enc.write_all(bytes),
            Compressor::Zlib(enc) => enc.write_all(bytes),
        };
        result.map_err(|e| ChannelError::io_operation("write", path, "failed to write record", e))
    }

    pub fn flush(&mut self) -> Result<()> {
        let path = self.path_hint();
        let result: std::io::Result<()> = match self {
            Compressor::None(sink) => sink.flush(),
            Compressor::Gzip(enc) => enc.flush(),
            Compressor::Bzip2(enc) => enc.flush(),
            Compressor::Zlib(enc) => enc.flush(),
        };
        result.map_err(|e| ChannelError::io_operation("flush", path, "failed to flush", e))
    }

    /// Flush internal state, write the codec's terminator frame, and return
    /// the underlying sink so the caller can close the file handle.
    pub fn finalize(self) -> Result<ByteSink> {
        let path = self.path_hint();
        match self {
            Compressor::None(sink) => Ok(sink),
            Compressor::Gzip(enc) => enc
                .finish()
                .map_err(|e| ChannelError::compression(path, format!("gzip finalize failed: {}", e))),
            Compressor::Bzip2(enc) => enc
                .finish()
                .map_err(|e| ChannelError::compression(path, format!("bzip2 finalize failed: {}", e))),
            Compressor::Zlib(enc) => enc
                .finish()
                .map_err(|e| ChannelError::compression(path, format!("zlib finalize failed: {}", e))),
        }
    }
}
