//! The seam between this crate and the logger that drives it: a `Message`
//! trait the channel reads from, and a `Clock` trait it reads the time from.
//! Neither type owns formatting or configuration policy: those remain the
//! caller's concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a logged message, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Priority {
    Trace = 0,
    Debug = 1,
    #[default]
    Info = 2,
    Notice = 3,
    Warning = 4,
    Error = 5,
    Critical = 6,
    Fatal = 7,
}

impl Priority {
    pub fn to_str(&self) -> &'static str {
        match self {
            Priority::Trace => "TRACE",
            Priority::Debug => "DEBUG",
            Priority::Info => "INFO",
            Priority::Notice => "NOTICE",
            Priority::Warning => "WARNING",
            Priority::Error => "ERROR",
            Priority::Critical => "CRITICAL",
            Priority::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(Priority::Trace),
            "DEBUG" => Ok(Priority::Debug),
            "INFO" => Ok(Priority::Info),
            "NOTICE" => Ok(Priority::Notice),
            "WARNING" | "WARN" => Ok(Priority::Warning),
            "ERROR" => Ok(Priority::Error),
            "CRITICAL" => Ok(Priority::Critical),
            "FATAL" => Ok(Priority::Fatal),
            _ => Err(format!("invalid priority: '{}'", s)),
        }
    }
}

/// A structured log message, as produced by the surrounding logger facade.
///
/// The channel reads only `text()` to build a record; the other fields are
/// available to richer formatters that may be layered in front of it.
pub trait Message {
    fn source(&self) -> &str;
    fn text(&self) -> &str;
    fn priority(&self) -> Priority;
    fn timestamp(&self) -> DateTime<Utc>;
}

/// A minimal, owned `Message` implementation for standalone use and tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicMessage {
    pub source: String,
    pub text: String,
    pub priority: Priority,
    pub timestamp: DateTime<Utc>,
}

impl BasicMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            source: String::new(),
            text: text.into(),
            priority: Priority::default(),
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

impl Message for BasicMessage {
    fn source(&self) -> &str {
        &self.source
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Pluggable source of "now", so rotation logic is testable without real sleeps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real clock, backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that returns a fixed, externally-advanced instant. Used by tests
/// that exercise interval rotation without sleeping in real time.
#[derive(Debug)]
pub struct FixedClock {
    instant: std::sync::Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: std::sync::Mutex::new(instant),
        }
    }

    pub fn advance(&self, duration: chrono::Duration) {
        let mut guard = self.instant.lock().expect("clock mutex poisoned");
        *guard = *guard + duration;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.lock().expect("clock mutex poisoned")
    }
}
