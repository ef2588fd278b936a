//! Duration grammar used by duration flags and by config documents.
//!
//! A duration is a sequence of decimal numbers, each with an optional
//! fraction and a mandatory unit suffix: `300ms`, `1.5h`, `2h45m`. Valid units
//! are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. The bare literal `0` is
//! accepted without a unit. Negative durations are rejected because they have
//! no `std::time::Duration` representation.

use std::fmt::Write;
use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Parse a duration string such as `"1m30s"` or `"1.5h"`.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let mut rest = raw;
    if let Some(unsigned) = rest.strip_prefix('+') {
        rest = unsigned;
    } else if rest.starts_with('-') {
        return Err("negative durations are not supported".into());
    }
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err("empty duration".into());
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_end = digits_end(rest);
        let (int_part, after_int) = rest.split_at(int_end);

        let (frac_part, after_number, had_dot) = match after_int.strip_prefix('.') {
            Some(after_dot) => {
                let frac_end = digits_end(after_dot);
                let (frac, tail) = after_dot.split_at(frac_end);
                (frac, tail, true)
            }
            None => ("", after_int, false),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(if had_dot {
                "missing digits around '.'".into()
            } else {
                "expected a number".into()
            });
        }

        let unit_end = after_number
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after_number.len());
        let (unit, tail) = after_number.split_at(unit_end);
        let scale = unit_scale(unit)?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| "duration out of range".to_string())?
        };
        let mut nanos = whole
            .checked_mul(scale)
            .ok_or_else(|| "duration out of range".to_string())?;
        if !frac_part.is_empty() {
            // Digits past nanosecond precision for the largest unit carry no weight.
            let digits = &frac_part[..frac_part.len().min(18)];
            let frac: u128 = digits
                .parse()
                .map_err(|_| "duration out of range".to_string())?;
            nanos = nanos
                .checked_add(frac * scale / 10u128.pow(digits.len() as u32))
                .ok_or_else(|| "duration out of range".to_string())?;
        }
        total = total
            .checked_add(nanos)
            .ok_or_else(|| "duration out of range".to_string())?;
        rest = tail;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC)
        .map_err(|_| "duration out of range".to_string())?;
    Ok(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}

/// Format a duration in the same grammar `parse_duration` accepts.
///
/// Sub-second values use the largest fitting unit (`1.5ms`, `250ns`); larger
/// values spell out hours and minutes (`1h0m0s`, `2m30.5s`).
pub fn format_duration(d: Duration) -> String {
    let total = d.as_nanos();
    if total == 0 {
        return "0s".into();
    }
    if total < NANOS_PER_SEC {
        let (unit, scale) = if total < 1_000 {
            ("ns", 1)
        } else if total < 1_000_000 {
            ("µs", 1_000)
        } else {
            ("ms", 1_000_000)
        };
        return format!("{}{unit}", fixed(total, scale));
    }

    let secs = d.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    let sec_nanos = u128::from(seconds) * NANOS_PER_SEC + u128::from(d.subsec_nanos());
    let _ = write!(out, "{}s", fixed(sec_nanos, NANOS_PER_SEC));
    out
}

fn digits_end(s: &str) -> usize {
    s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len())
}

fn unit_scale(unit: &str) -> Result<u128, String> {
    match unit {
        "ns" => Ok(1),
        "us" | "µs" | "μs" => Ok(1_000),
        "ms" => Ok(1_000_000),
        "s" => Ok(NANOS_PER_SEC),
        "m" => Ok(60 * NANOS_PER_SEC),
        "h" => Ok(3600 * NANOS_PER_SEC),
        "" => Err("missing unit in duration".into()),
        other => Err(format!("unknown unit '{other}' in duration")),
    }
}

/// Render `value / scale` with the fraction's trailing zeros trimmed.
fn fixed(value: u128, scale: u128) -> String {
    let whole = value / scale;
    let frac = value % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let width = scale.ilog10() as usize;
    let digits = format!("{frac:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}
