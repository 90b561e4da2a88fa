//! Translation of letter-based date patterns (`yyyy-MM-dd HH:mm:ss`) into
//! chrono strftime strings, and resolution of partially specified dates.

use std::iter;

use chrono::format::{self, Item, Numeric, Pad, Parsed, StrftimeItems};

/// Translate a letter pattern into a strftime string chrono can parse with.
///
/// Runs of the same letter select the field, anything between single quotes
/// is literal (`''` is an escaped quote), other characters are literal. A
/// single letter accepts an unpadded number; longer runs require the full
/// width (`MM` needs two digits, `yyyy` four).
pub(super) fn translate(pattern: &str) -> Result<String, String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\'' {
            i += 1;
            if chars.get(i) == Some(&'\'') {
                out.push('\'');
                i += 1;
                continue;
            }
            loop {
                let Some(&ch) = chars.get(i) else {
                    return Err("unterminated quoted literal".to_string());
                };
                if ch == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        out.push('\'');
                        i += 2;
                        continue;
                    }
                    i += 1;
                    break;
                }
                push_literal(&mut out, ch);
                i += 1;
            }
            continue;
        }

        if c.is_ascii_alphabetic() {
            let start = i;
            while chars.get(i) == Some(&c) {
                i += 1;
            }
            out.push_str(field_for(c, i - start)?);
            continue;
        }

        push_literal(&mut out, c);
        i += 1;
    }

    if StrftimeItems::new(&out).any(|item| matches!(item, Item::Error)) {
        return Err(format!("pattern translates to invalid format '{}'", out));
    }
    Ok(out)
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

fn field_for(letter: char, run: usize) -> Result<&'static str, String> {
    let field = match (letter, run) {
        ('y' | 'u', 1) => "%-Y",
        ('y' | 'u', 2) => "%y",
        ('y' | 'u', _) => "%Y",
        ('M', 1) => "%-m",
        ('M', 2) => "%m",
        ('M', 3) => "%b",
        ('M', _) => "%B",
        ('d', 1) => "%-d",
        ('d', 2) => "%d",
        ('D', 1 | 2) => "%-j",
        ('D', 3) => "%j",
        ('H', 1) => "%-H",
        ('H', 2) => "%H",
        ('h', 1) => "%-I",
        ('h', 2) => "%I",
        ('a', 1) => "%p",
        ('m', 1) => "%-M",
        ('m', 2) => "%M",
        ('s', 1) => "%-S",
        ('s', 2) => "%S",
        ('S', 3) => "%3f",
        ('S', 6) => "%6f",
        ('S', 9) => "%9f",
        ('E', 1..=3) => "%a",
        ('E', _) => "%A",
        ('Z' | 'X' | 'x', 1..=3) => "%z",
        _ => {
            return Err(format!(
                "unsupported pattern letter '{}' repeated {} time(s)",
                letter, run
            ))
        }
    };
    Ok(field)
}

/// Parse `text` with a strftime string and resolve it to epoch milliseconds.
///
/// The whole input must be consumed. Zero-padded numeric fields must be
/// written at full width. Fields the format does not carry default to the
/// start of their period (month/day 1, midnight, UTC).
pub(super) fn parse_strftime(fmt: &str, text: &str) -> Option<i64> {
    let mut parsed = Parsed::new();
    let mut rest = text;
    for item in StrftimeItems::new(fmt) {
        if let Item::Numeric(numeric, pad) = &item {
            if !has_digits_for(numeric, *pad, rest) {
                return None;
            }
        }
        rest = format::parse_and_remainder(&mut parsed, rest, iter::once(&item)).ok()?;
    }
    if !rest.is_empty() {
        return None;
    }

    // set_* only fills a field that is still empty; a conflicting value
    // already parsed wins and the error is irrelevant here.
    let _ = parsed.set_month(1);
    let _ = parsed.set_day(1);
    let _ = parsed.set_hour(0);
    let _ = parsed.set_minute(0);
    let _ = parsed.set_second(0);

    if let Ok(dt) = parsed.to_datetime() {
        return Some(dt.timestamp_millis());
    }
    let _ = parsed.set_offset(0);
    parsed.to_datetime().ok().map(|dt| dt.timestamp_millis())
}

/// chrono reads 1 up to N digits for a numeric field and skips leading
/// whitespace. A padded field must start with its full width of digits,
/// an unpadded one with at least one digit.
fn has_digits_for(numeric: &Numeric, pad: Pad, rest: &str) -> bool {
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    let width = match numeric {
        Numeric::Year => 4,
        Numeric::Ordinal => 3,
        Numeric::YearMod100
        | Numeric::Month
        | Numeric::Day
        | Numeric::Hour
        | Numeric::Hour12
        | Numeric::Minute
        | Numeric::Second => 2,
        _ => 1,
    };
    match pad {
        Pad::Zero => digits >= width,
        _ => digits >= 1,
    }
}

/// Parse an epoch timestamp given in units of `1 / millis_per_unit` seconds.
pub(super) fn parse_epoch(text: &str, millis_per_unit: i64) -> Option<i64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let mut seen_dot = false;
    let well_formed = !digits.is_empty()
        && digits.chars().all(|c| {
            if c == '.' && !seen_dot {
                seen_dot = true;
                true
            } else {
                c.is_ascii_digit()
            }
        });
    if !well_formed {
        return None;
    }
    if let Ok(value) = text.parse::<i64>() {
        return value.checked_mul(millis_per_unit);
    }
    let value: f64 = text.parse().ok()?;
    let millis = value * millis_per_unit as f64;
    if millis.is_finite() && millis.abs() < i64::MAX as f64 {
        Some(millis.trunc() as i64)
    } else {
        None
    }
}
