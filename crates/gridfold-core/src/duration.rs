// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

/// Converts a day count into a `Duration`, assuming a 24 hour day.
///
/// Leap seconds make this approximate; retention windows do not need
/// that level of precision.
#[must_use]
pub fn days(d: f64) -> Duration {
    Duration::from_secs_f64(d * 24.0 * 3600.0)
}

/// Parses flag durations of the form `90s`, `2m`, `10m`, `1h30m`.
///
/// Segments concatenate; each needs an explicit unit from
/// `ms`, `s`, `m`, `h`.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }
    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 {
            return Err(format!("invalid duration {s:?}: expected digits at {rest:?}"));
        }
        let value: u64 = rest[..digits]
            .parse()
            .map_err(|e| format!("invalid duration {s:?}: {e}"))?;
        rest = &rest[digits..];
        let unit_len = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()).len();
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];
        let segment = match unit {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value * 60),
            "h" => Duration::from_secs(value * 3600),
            "" => return Err(format!("invalid duration {s:?}: missing unit")),
            other => return Err(format!("invalid duration {s:?}: unknown unit {other:?}")),
        };
        total += segment;
    }
    Ok(total)
}
