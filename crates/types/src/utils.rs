//! Utility functions and helpers

use std::time::Duration;

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Parse a duration such as `300ms`, `1.5h` or `1m30s`.
///
/// Accepts a sequence of decimal numbers, each with an optional fraction and
/// a mandatory unit (`ns`, `us`, `µs`, `ms`, `s`, `m`, `h`). A bare `0` and the
/// empty string parse as zero.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() || s == "0" {
        return Ok(Duration::ZERO);
    }

    let s = s.strip_prefix('+').unwrap_or(s);
    if s.starts_with('-') {
        return Err("negative durations are not supported".to_string());
    }

    let mut total: u128 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_end);

        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);

        let scale: u128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SECOND,
            "m" => 60 * NANOS_PER_SECOND,
            "h" => 3_600 * NANOS_PER_SECOND,
            "" => return Err(format!("missing unit in duration '{}'", input)),
            other => return Err(format!("unknown unit '{}' in duration '{}'", other, input)),
        };

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(format!("invalid duration '{}'", input));
        }

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| format!("invalid duration '{}'", input))?
        };
        let mut nanos = whole
            .checked_mul(scale)
            .ok_or_else(|| format!("duration '{}' overflows", input))?;

        if !fraction.is_empty() {
            // Digits past 18 are below nanosecond precision for every unit
            let digits = &fraction[..fraction.len().min(18)];
            let value: u128 = digits
                .parse()
                .map_err(|_| format!("invalid duration '{}'", input))?;
            nanos = nanos
                .checked_add(value * scale / 10u128.pow(digits.len() as u32))
                .ok_or_else(|| format!("duration '{}' overflows", input))?;
        }

        total = total
            .checked_add(nanos)
            .ok_or_else(|| format!("duration '{}' overflows", input))?;
        rest = tail;
    }

    let secs = u64::try_from(total / NANOS_PER_SECOND)
        .map_err(|_| format!("duration '{}' overflows", input))?;
    Ok(Duration::new(secs, (total % NANOS_PER_SECOND) as u32))
}

/// Format a duration in the syntax accepted by [`parse_duration`]
pub fn format_duration(duration: Duration) -> String {
    if duration.is_zero() {
        return "0s".to_string();
    }

    let secs = duration.as_secs();
    let nanos = duration.subsec_nanos();
    if secs == 0 {
        return if nanos % 1_000_000 == 0 {
            format!("{}ms", nanos / 1_000_000)
        } else if nanos % 1_000 == 0 {
            format!("{}µs", nanos / 1_000)
        } else {
            format!("{}ns", nanos)
        };
    }

    let hours = secs / 3_600;
    let minutes = (secs % 3_600) / 60;
    let seconds = secs % 60;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if nanos == 0 {
        out.push_str(&format!("{}s", seconds));
    } else {
        let fraction = format!("{:09}", nanos);
        out.push_str(&format!("{}.{}s", seconds, fraction.trim_end_matches('0')));
    }
    out
}

/// Parse a boolean flag (`1`, `t`, `true`, `0`, `f`, `false`, any case)
pub fn parse_bool(input: &str) -> Result<bool, String> {
    match input.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "f" | "false" => Ok(false),
        "1" | "t" | "true" => Ok(true),
        _ => Err(format!("'{}' is not a boolean", input)),
    }
}

/// Split a comma separated list, dropping empty items
pub fn parse_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Mask a secret for display, keeping only whether it was set
pub fn redact(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "********".to_string()
    }
}
