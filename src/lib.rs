//! # rotaling
//!
//! A rotating, archiving, compressing file log channel: a sink that accepts
//! structured log messages and persists them as newline-delimited records to
//! a primary file, transparently rolling that file over when a configured
//! condition fires, archiving or truncating the rolled file, optionally
//! compressing the live stream, and optionally purging old archives.
//!
//! This crate implements the channel only. A surrounding logger facade
//! (message formatting, configuration file parsing, other channel types
//! such as console or syslog) is expected to sit in front of it; the seam
//! is the [`Message`] trait.
//!
//! ## Example
//!
//! ```no_run
//! use rotaling::{BasicMessage, FileChannel};
//!
//! let mut channel = FileChannel::new("/var/log/app.log");
//! channel.put_attr("rotate", "size");
//! channel.put_attr("rotate.size", "10m");
//! channel.put_attr("archive", "number");
//! channel.put_attr("compression_mode", "gzip");
//!
//! channel.log(&BasicMessage::new("service started")).unwrap();
//! channel.close().unwrap();
//! ```

pub mod archive;
pub mod attrs;
pub mod channel;
pub mod compress;
pub mod diag;
pub mod error;
pub mod message;
pub mod purge;
pub mod rotate;
pub mod sink;
pub mod sizefmt;

pub mod prelude {
    pub use crate::archive::{ArchiveMode, Times};
    pub use crate::attrs::AttributeBag;
    pub use crate::channel::FileChannel;
    pub use crate::compress::CompressionMode;
    pub use crate::diag::Diagnostics;
    pub use crate::error::{ChannelError, Result};
    pub use crate::message::{BasicMessage, Clock, FixedClock, Message, Priority, SystemClock};
    pub use crate::purge::PurgeMode;
    pub use crate::rotate::RotateMode;
}

pub use archive::{ArchiveMode, Times};
pub use attrs::AttributeBag;
pub use channel::FileChannel;
pub use compress::CompressionMode;
pub use diag::Diagnostics;
pub use error::{ChannelError, Result};
pub use message::{BasicMessage, Clock, FixedClock, Message, Priority, SystemClock};
pub use purge::PurgeMode;
pub use rotate::RotateMode;
