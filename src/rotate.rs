//! The rotation predicate: given the channel's current counters, should the
//! primary file be rolled over before the next record is written?

use chrono::{DateTime, Utc};

/// Which trigger, if any, is configured for this channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotateMode {
    #[default]
    None,
    Size,
    Interval,
}

impl RotateMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(RotateMode::None),
            "size" => Some(RotateMode::Size),
            "interval" => Some(RotateMode::Interval),
            _ => None,
        }
    }
}

/// A pure predicate over rotation state. Holds the parsed threshold so it
/// need not be reparsed on every `log` call.
#[derive(Debug, Clone, Copy)]
pub struct RotatePolicy {
    mode: RotateMode,
    size_threshold: u64,
    interval_seconds: i64,
}

impl RotatePolicy {
    pub fn none() -> Self {
        Self {
            mode: RotateMode::None,
            size_threshold: 0,
            interval_seconds: 0,
        }
    }

    pub fn size(threshold: u64) -> Self {
        Self {
            mode: RotateMode::Size,
            size_threshold: threshold,
            interval_seconds: 0,
        }
    }

    pub fn interval(seconds: u64) -> Self {
        Self {
            mode: RotateMode::Interval,
            size_threshold: 0,
            interval_seconds: seconds as i64,
        }
    }

    /// Checked *before* writing the next record: size triggers fire on
    /// either "already at or past threshold" or "this record would cross
    /// it", producing a trailing empty primary file when a rotation fires
    /// with no further record arriving.
    pub fn should_rotate(
        &self,
        bytes_written: u64,
        next_record_len: u64,
        opened_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> bool {
        match self.mode {
            RotateMode::None => false,
            RotateMode::Size => {
                bytes_written >= self.size_threshold
                    || bytes_written + next_record_len >= self.size_threshold
            }
            RotateMode::Interval => (now - opened_at).num_seconds() >= self.interval_seconds,
        }
    }
}
