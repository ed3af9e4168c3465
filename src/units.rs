//! Byte size and rate units.
//!
//! Sizes are plain `u64` byte counts throughout the crate. The constants and
//! parsers here make platform and test descriptions read naturally:
//!
//! ```
//! use simfs::units::{self, KB, MB};
//!
//! assert_eq!(units::parse_size("10kB").unwrap(), 10 * KB);
//! assert_eq!(units::parse_rate("2MBps").unwrap(), 2.0 * MB as f64);
//! assert_eq!(units::parse_speed("100Gf").unwrap(), 100e9);
//! ```

use crate::fs::{FsError, FsResult};

pub const KB: u64 = 1000;
pub const MB: u64 = 1000 * KB;
pub const GB: u64 = 1000 * MB;
pub const TB: u64 = 1000 * GB;

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * KIB;
pub const GIB: u64 = 1024 * MIB;
pub const TIB: u64 = 1024 * GIB;

const SIZE_SUFFIXES: &[(&str, u64)] = &[
    ("KiB", KIB),
    ("MiB", MIB),
    ("GiB", GIB),
    ("TiB", TIB),
    ("kB", KB),
    ("KB", KB),
    ("MB", MB),
    ("GB", GB),
    ("TB", TB),
    ("B", 1),
];

/// Parse a size such as `"10kB"`, `"1.5GB"`, `"4MiB"` or `"512"` into bytes.
pub fn parse_size(value: &str) -> FsResult<u64> {
    let (number, unit) = split(value)?;

    let multiplier = if unit.is_empty() {
        1
    } else {
        lookup(SIZE_SUFFIXES, unit).ok_or_else(|| invalid("size", value))?
    };

    Ok((number * multiplier as f64).round() as u64)
}

/// Parse a transfer rate into bytes per second. Accepts byte rates
/// (`"2MBps"`) and bit rates (`"1Gbps"`).
pub fn parse_rate(value: &str) -> FsResult<f64> {
    let (number, unit) = split(value)?;

    let (unit, divisor) = if let Some(bytes) = unit.strip_suffix("Bps") {
        (bytes, 1.0)
    } else if let Some(bits) = unit.strip_suffix("bps") {
        (bits, 8.0)
    } else {
        return Err(invalid("rate", value));
    };

    Ok(number * prefix(unit).ok_or_else(|| invalid("rate", value))? / divisor)
}

/// Parse a compute speed such as `"100Gf"` into flops per second.
pub fn parse_speed(value: &str) -> FsResult<f64> {
    let (number, unit) = split(value)?;
    let unit = unit
        .strip_suffix('f')
        .ok_or_else(|| invalid("speed", value))?;

    Ok(number * prefix(unit).ok_or_else(|| invalid("speed", value))?)
}

fn split(value: &str) -> FsResult<(f64, &str)> {
    let value = value.trim();
    let idx = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == 'e' || c == '-'))
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(idx);

    let number: f64 = number.parse().map_err(|_| invalid("number", value))?;
    if !number.is_finite() || number < 0.0 {
        return Err(invalid("number", value));
    }

    Ok((number, unit.trim()))
}

fn prefix(unit: &str) -> Option<f64> {
    Some(match unit {
        "" => 1.0,
        "k" | "K" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "Ki" => KIB as f64,
        "Mi" => MIB as f64,
        "Gi" => GIB as f64,
        "Ti" => TIB as f64,
        _ => return None,
    })
}

fn lookup(table: &[(&str, u64)], unit: &str) -> Option<u64> {
    table
        .iter()
        .find(|(suffix, _)| *suffix == unit)
        .map(|(_, multiplier)| *multiplier)
}

fn invalid(what: &str, value: &str) -> FsError {
    FsError::InvalidArgument(format!("invalid {what}: {value:?}"))
}
