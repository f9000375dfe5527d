//! Conversion rules for the value kinds every fixed-width file uses.
//!
//! Format hints follow the conventions legacy layouts are written in:
//!
//! - Dates and times take `yyyy yy MM dd HH hh mm ss fff tt` patterns
//!   (`yyyyMMdd` by default for dates, `HHmmss` for times). A pattern
//!   containing `%` is passed to chrono unchanged.
//! - Numbers take a picture such as `0000000.00`, or `F<n>` / `N<n>` / `D<n>`.
//!   Floats are written as their unscaled digits: the decimal point and any
//!   group separator are stripped, and decoding puts the point back.
//! - Booleans take the true token (`Y` by default) or a `T/F` pair.

use crate::converter::ValueConverter;
use crate::error::ConversionError;
use crate::value::{Value, ValueKind};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::borrow::Cow;
use std::fmt::Write;

const DEFAULT_DATE_FORMAT: &str = "yyyyMMdd";
const DEFAULT_TIME_FORMAT: &str = "HHmmss";
const DEFAULT_FRACTION_DIGITS: usize = 2;
const DEFAULT_TRUE_TOKEN: &str = "Y";
const DEFAULT_FALSE_TOKEN: &str = "N";

/// The converter used for every column without a custom one.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConverter;

impl ValueConverter for DefaultConverter {
    fn to_text(
        &self,
        value: &Value,
        _width: usize,
        format: Option<&str>,
    ) -> Result<String, ConversionError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Text(s) => Ok(s.clone()),
            Value::Int(i) => format_int(*i, format),
            Value::Float(f) => format_float(*f, format),
            Value::Bool(b) => {
                let (t, f) = bool_tokens(format);
                Ok(if *b { t } else { f }.to_string())
            }
            Value::Date(d) => render(d.format(&strftime(format.unwrap_or(DEFAULT_DATE_FORMAT)))),
            Value::Time(t) => render(t.format(&strftime(format.unwrap_or(DEFAULT_TIME_FORMAT)))),
            Value::DateTime(dt) => {
                render(dt.format(&strftime(format.unwrap_or(DEFAULT_DATE_FORMAT))))
            }
        }
    }

    fn from_text(
        &self,
        text: &str,
        kind: ValueKind,
        format: Option<&str>,
    ) -> Result<Value, ConversionError> {
        if text.trim().is_empty() {
            return Ok(kind.zero());
        }
        match kind {
            ValueKind::Text => Ok(Value::Text(text.to_string())),
            ValueKind::Int => text
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| ConversionError::new(format!("'{text}' is not an integer: {e}"))),
            ValueKind::Float => parse_float(text.trim(), format).map(Value::Float),
            ValueKind::Bool => {
                let (t, _) = bool_tokens(format);
                Ok(Value::Bool(text.trim().eq_ignore_ascii_case(t)))
            }
            ValueKind::Date => {
                let pattern = strftime(format.unwrap_or(DEFAULT_DATE_FORMAT));
                NaiveDate::parse_from_str(text, &pattern)
                    .map(Value::Date)
                    .map_err(|e| parse_error(text, &pattern, e))
            }
            ValueKind::Time => {
                let pattern = strftime(format.unwrap_or(DEFAULT_TIME_FORMAT));
                NaiveTime::parse_from_str(text, &pattern)
                    .map(Value::Time)
                    .map_err(|e| parse_error(text, &pattern, e))
            }
            ValueKind::DateTime => {
                let pattern = strftime(format.unwrap_or(DEFAULT_DATE_FORMAT));
                // Date-only patterns are common for timestamp columns.
                NaiveDateTime::parse_from_str(text, &pattern)
                    .or_else(|_| {
                        NaiveDate::parse_from_str(text, &pattern)
                            .map(|d| d.and_time(NaiveTime::default()))
                    })
                    .map(Value::DateTime)
                    .map_err(|e| parse_error(text, &pattern, e))
            }
        }
    }
}

fn parse_error(text: &str, pattern: &str, err: chrono::ParseError) -> ConversionError {
    ConversionError::new(format!("'{text}' does not match '{pattern}': {err}"))
}

fn render(formatted: impl std::fmt::Display) -> Result<String, ConversionError> {
    let mut out = String::new();
    write!(out, "{formatted}")
        .map_err(|_| ConversionError::new("invalid date/time format pattern"))?;
    Ok(out)
}

/// Translate a `yyyyMMdd`-style pattern into a chrono format string.
fn strftime(pattern: &str) -> Cow<'_, str> {
    if pattern.contains('%') {
        return Cow::Borrowed(pattern);
    }
    const TOKENS: [(&str, &str); 10] = [
        ("yyyy", "%Y"),
        ("fff", "%3f"),
        ("yy", "%y"),
        ("MM", "%m"),
        ("dd", "%d"),
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
        ("tt", "%p"),
    ];
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut rest = pattern;
    'scan: while let Some(c) = rest.chars().next() {
        for (token, directive) in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(directive);
                rest = tail;
                continue 'scan;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    Cow::Owned(out)
}

/// Digit layout of a numeric format hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Picture {
    int_digits: usize,
    frac_digits: usize,
}

fn picture(format: Option<&str>, default_frac: usize) -> Result<Picture, ConversionError> {
    let Some(format) = format.filter(|f| !f.is_empty()) else {
        return Ok(Picture {
            int_digits: 1,
            frac_digits: default_frac,
        });
    };
    let mut chars = format.chars();
    let head = chars.next().unwrap_or_default();
    let tail = chars.as_str();
    let count = || -> Result<Option<usize>, ConversionError> {
        if tail.is_empty() {
            return Ok(None);
        }
        tail.parse()
            .map(Some)
            .map_err(|_| ConversionError::new(format!("bad precision in format '{format}'")))
    };
    match head {
        'F' | 'f' | 'N' | 'n' => Ok(Picture {
            int_digits: 1,
            frac_digits: count()?.unwrap_or(DEFAULT_FRACTION_DIGITS),
        }),
        'D' | 'd' => Ok(Picture {
            int_digits: count()?.unwrap_or(1),
            frac_digits: 0,
        }),
        '0' | '#' | '.' | ',' => {
            if let Some(bad) = format.chars().find(|c| !matches!(c, '0' | '#' | '.' | ',')) {
                return Err(ConversionError::new(format!(
                    "unsupported character '{bad}' in numeric format '{format}'"
                )));
            }
            let (int_part, frac_part) = format.split_once('.').unwrap_or((format, ""));
            Ok(Picture {
                int_digits: int_part.chars().filter(|&c| c == '0').count(),
                frac_digits: frac_part.chars().filter(|&c| c != ',').count(),
            })
        }
        _ => Err(ConversionError::new(format!(
            "unsupported numeric format '{format}'"
        ))),
    }
}

fn format_int(value: i64, format: Option<&str>) -> Result<String, ConversionError> {
    let pic = picture(format, 0)?;
    let sign = if value < 0 { "-" } else { "" };
    Ok(format!(
        "{sign}{:0w$}",
        value.unsigned_abs(),
        w = pic.int_digits.max(1)
    ))
}

fn format_float(value: f64, format: Option<&str>) -> Result<String, ConversionError> {
    if !value.is_finite() {
        return Err(ConversionError::new(format!("{value} has no digit form")));
    }
    let pic = picture(format, DEFAULT_FRACTION_DIGITS)?;
    let width = if pic.frac_digits > 0 {
        pic.int_digits + pic.frac_digits + 1
    } else {
        pic.int_digits
    };
    let body = format!("{:0w$.p$}", value.abs(), w = width, p = pic.frac_digits);
    let sign = if value < 0.0 { "-" } else { "" };
    let digits: String = body.chars().filter(|c| !matches!(c, '.' | ',')).collect();
    Ok(format!("{sign}{digits}"))
}

fn parse_float(text: &str, format: Option<&str>) -> Result<f64, ConversionError> {
    let invalid = |e: std::num::ParseFloatError| {
        ConversionError::new(format!("'{text}' is not a number: {e}"))
    };
    if text.contains('.') {
        return text.parse().map_err(invalid);
    }
    let frac = picture(format, DEFAULT_FRACTION_DIGITS)?.frac_digits;
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.strip_prefix('+').unwrap_or(text)),
    };
    if frac == 0 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return text.parse().map_err(invalid);
    }
    let digits = format!("{digits:0>frac$}");
    let (whole, fraction) = digits.split_at(digits.len() - frac);
    let whole = if whole.is_empty() { "0" } else { whole };
    format!("{sign}{whole}.{fraction}").parse().map_err(invalid)
}

fn bool_tokens(format: Option<&str>) -> (&str, &str) {
    match format.filter(|f| !f.is_empty()) {
        None => (DEFAULT_TRUE_TOKEN, DEFAULT_FALSE_TOKEN),
        Some(f) => match f.split_once('/') {
            Some((t, f)) => (t, f),
            None => (f, DEFAULT_FALSE_TOKEN),
        },
    }
}
