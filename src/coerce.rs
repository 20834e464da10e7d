//! Raw value normalization
//!
//! Rows coming back from a gateway carry whatever types the driver produced.
//! Fields declared in a model schema are normalized into their declared kind;
//! undeclared fields and `NULL`s are left alone.
//!
//! The default mode is lenient: numbers are read from the leading numeric
//! prefix of a string (`"42abc"` is `42`, `"abc"` is `0`) and nothing ever
//! fails. Strict mode reports unparseable input as a type mismatch instead.

use crate::core::{DbError, FieldKind, FieldMap, ModelSchema, Result, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoercionMode {
    #[default]
    Lenient,
    Strict,
}

/// Normalizes every declared, non-null field of `fields` in place.
pub fn coerce_fields(fields: &mut FieldMap, schema: &ModelSchema, mode: CoercionMode) -> Result<()> {
    for (name, kind) in schema {
        let Some(value) = fields.get_mut(name) else {
            continue;
        };
        if value.is_null() {
            continue;
        }

        *value = match mode {
            CoercionMode::Lenient => coerce_value(value, *kind),
            CoercionMode::Strict => coerce_value_strict(value, *kind).map_err(|err| match err {
                DbError::TypeMismatch(msg) => {
                    DbError::TypeMismatch(format!("field '{}': {}", name, msg))
                }
                other => other,
            })?,
        };
    }
    Ok(())
}

pub fn coerce_value(value: &Value, kind: FieldKind) -> Value {
    if value.is_null() {
        return Value::Null;
    }

    match kind {
        FieldKind::Raw => value.clone(),
        FieldKind::Text => Value::Text(value.to_text()),
        FieldKind::Integer => Value::Integer(match value {
            Value::Integer(i) => *i,
            // `as` truncates toward zero, saturates and maps NaN to 0
            Value::Float(f) => *f as i64,
            Value::Text(s) => parse_int_prefix(s),
            Value::Boolean(b) => i64::from(*b),
            Value::Null => 0,
        }),
        FieldKind::Float => Value::Float(match value {
            Value::Integer(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Text(s) => parse_float_prefix(s),
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::Null => 0.0,
        }),
        FieldKind::Boolean => Value::Boolean(value.is_truthy()),
    }
}

pub fn coerce_value_strict(value: &Value, kind: FieldKind) -> Result<Value> {
    let mismatch = || {
        DbError::TypeMismatch(format!(
            "cannot convert {} '{}' to {}",
            value.type_name(),
            value,
            kind
        ))
    };

    match (kind, value) {
        (_, Value::Null) => Ok(Value::Null),
        (FieldKind::Raw, _) => Ok(value.clone()),
        (FieldKind::Text, _) => Ok(Value::Text(value.to_text())),

        (FieldKind::Integer, Value::Integer(i)) => Ok(Value::Integer(*i)),
        (FieldKind::Integer, Value::Float(f)) if f.is_finite() && f.fract() == 0.0 => {
            Ok(Value::Integer(*f as i64))
        }
        (FieldKind::Integer, Value::Text(s)) => {
            s.trim().parse::<i64>().map(Value::Integer).map_err(|_| mismatch())
        }

        (FieldKind::Float, Value::Integer(i)) => Ok(Value::Float(*i as f64)),
        (FieldKind::Float, Value::Float(f)) => Ok(Value::Float(*f)),
        (FieldKind::Float, Value::Text(s)) => {
            s.trim().parse::<f64>().map(Value::Float).map_err(|_| mismatch())
        }

        (FieldKind::Boolean, Value::Boolean(b)) => Ok(Value::Boolean(*b)),
        (FieldKind::Boolean, Value::Integer(i)) if *i == 0 || *i == 1 => {
            Ok(Value::Boolean(*i == 1))
        }
        (FieldKind::Boolean, Value::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Ok(Value::Boolean(true)),
            "0" | "false" => Ok(Value::Boolean(false)),
            _ => Err(mismatch()),
        },

        _ => Err(mismatch()),
    }
}

fn skip_whitespace(s: &str) -> &str {
    s.trim_start_matches([' ', '\t', '\n', '\r', '\x0b', '\x0c'])
}

/// Reads the leading integer of `s` the way C's `strtol` does. Overflow
/// saturates; no digits yields 0.
pub fn parse_int_prefix(s: &str) -> i64 {
    let s = skip_whitespace(s);
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut acc: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        let digit = i64::from(b - b'0');
        acc = if negative {
            acc.saturating_mul(10).saturating_sub(digit)
        } else {
            acc.saturating_mul(10).saturating_add(digit)
        };
    }
    acc
}

/// Reads the leading decimal number of `s` the way C's `strtod` does,
/// including an optional fraction and exponent. No digits yields 0.0.
pub fn parse_float_prefix(s: &str) -> f64 {
    let s = skip_whitespace(s);
    let bytes = s.as_bytes();
    let count_digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'-' | b'+')) {
        end += 1;
    }

    let int_digits = count_digits(end);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(end + 1);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return 0.0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'-' | b'+')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(exp_end);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    let literal = s[..end].trim_end_matches('.');
    let (sign, body) = match literal.strip_prefix(['-', '+']) {
        Some(body) => (&literal[..1], body),
        None => ("", literal),
    };
    let zero = if body.starts_with('.') { "0" } else { "" };

    format!("{}{}{}", sign, zero, body).parse::<f64>().unwrap_or(0.0)
}
