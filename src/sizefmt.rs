//! Parsers for the two grammars recognized by the attribute bag: byte sizes
//! (`57`, `1k`, `1m`) and `HH:MM:SS` intervals.

use crate::error::ChannelError;

/// Parse a byte size: digits with an optional `k`/`K` (x1024) or `m`/`M`
/// (x1024^2) suffix. An absent suffix means bytes.
pub fn parse_size(input: &str) -> Result<u64, ChannelError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ChannelError::invalid_config("rotate.size", "empty value"));
    }

    let (digits, multiplier) = match input.chars().last() {
        Some(c) if c == 'k' || c == 'K' => (&input[..input.len() - 1], 1024u64),
        Some(c) if c == 'm' || c == 'M' => (&input[..input.len() - 1], 1024u64 * 1024),
        _ => (input, 1u64),
    };

    if digits.starts_with('-') {
        return Err(ChannelError::invalid_config(
            "rotate.size",
            format!("negative size: '{}'", input),
        ));
    }

    let value: u64 = digits.parse().map_err(|_| {
        ChannelError::invalid_config("rotate.size", format!("not a number: '{}'", input))
    })?;

    value
        .checked_mul(multiplier)
        .ok_or_else(|| ChannelError::invalid_config("rotate.size", format!("overflow: '{}'", input)))
}

/// Parse an `HH:MM:SS` interval into a whole number of seconds.
/// `HH` is unbounded; `MM` and `SS` must each be in `[0, 59]`.
pub fn parse_interval(input: &str) -> Result<u64, ChannelError> {
    let parts: Vec<&str> = input.trim().split(':').collect();
    if parts.len() != 3 {
        return Err(ChannelError::invalid_config(
            "rotate.interval",
            format!("expected HH:MM:SS, got '{}'", input),
        ));
    }

    let hh: u64 = parts[0].parse().map_err(|_| {
        ChannelError::invalid_config("rotate.interval", format!("bad hours: '{}'", parts[0]))
    })?;
    let mm: u64 = parts[1].parse().map_err(|_| {
        ChannelError::invalid_config("rotate.interval", format!("bad minutes: '{}'", parts[1]))
    })?;
    let ss: u64 = parts[2].parse().map_err(|_| {
        ChannelError::invalid_config("rotate.interval", format!("bad seconds: '{}'", parts[2]))
    })?;

    if mm > 59 {
        return Err(ChannelError::invalid_config(
            "rotate.interval",
            format!("minutes out of range: {}", mm),
        ));
    }
    if ss > 59 {
        return Err(ChannelError::invalid_config(
            "rotate.interval",
            format!("seconds out of range: {}", ss),
        ));
    }

    Ok(hh * 3600 + mm * 60 + ss)
}
