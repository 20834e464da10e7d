use serde::{Deserialize, Serialize};
use std::fmt;

/// A single field value as it travels between a record and its backing row.
///
/// Serializes as a bare JSON scalar, so a record's exported document is a flat
/// object of strings, numbers, booleans and nulls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Integer(_) => "INTEGER",
            Self::Float(_) => "FLOAT",
            Self::Text(_) => "TEXT",
            Self::Boolean(_) => "BOOLEAN",
        }
    }

    /// Falsy values are `NULL`, `false`, `0`, `0.0`, `""` and `"0"`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Boolean(b) => *b,
            Self::Integer(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Text(s) => !(s.is_empty() || s == "0"),
        }
    }

    /// String rendering used when a field is declared as text.
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => format_float(*f),
            Self::Text(s) => s.clone(),
            Self::Boolean(true) => "1".to_string(),
            Self::Boolean(false) => String::new(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Loose comparison used when matching rows against a filter.
    ///
    /// Integers and floats compare numerically; everything else must share a
    /// variant. `NULL` never equals anything, itself included.
    pub fn sql_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Null, _) | (_, Self::Null) => false,
            (Self::Integer(i), Self::Float(f)) | (Self::Float(f), Self::Integer(i)) => {
                *i as f64 == *f
            }
            _ => self == other,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Boolean(b) => serde_json::Value::Bool(*b),
        }
    }
}

/// Significant digits kept when a float is rendered as text.
const FLOAT_TEXT_PRECISION: usize = 14;

// General format at FLOAT_TEXT_PRECISION digits: fixed notation unless the
// exponent is below -4 or reaches the precision, trailing zeros dropped.
fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "NAN".to_string();
    }
    if f.is_infinite() {
        let sign = if f > 0.0 { "" } else { "-" };
        return format!("{}INF", sign);
    }

    let scientific = format!("{:.*e}", FLOAT_TEXT_PRECISION - 1, f);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= FLOAT_TEXT_PRECISION as i32 {
        let mantissa = trim_fraction(mantissa);
        let mantissa = if mantissa.contains('.') {
            mantissa.to_string()
        } else {
            format!("{}.0", mantissa)
        };
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}E{}{}", mantissa, sign, exponent.abs())
    } else {
        let decimals = (FLOAT_TEXT_PRECISION as i32 - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, f)).to_string()
    }
}

fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

// Strict: a value only equals another value of the same variant.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(fl) => write!(f, "{}", fl),
            Self::Text(s) => write!(f, "{}", s),
            Self::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(*b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            serde_json::Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_equality() {
        assert_eq!(Value::Integer(42), Value::Integer(42));
        assert_ne!(Value::Integer(1), Value::Float(1.0));
        assert_ne!(Value::Text("1".into()), Value::Integer(1));
        assert_eq!(Value::Null, Value::Null);
    }

    #[test]
    fn test_sql_eq_crosses_numeric_types() {
        assert!(Value::Integer(3).sql_eq(&Value::Float(3.0)));
        assert!(!Value::Null.sql_eq(&Value::Null));
        assert!(!Value::Text("3".into()).sql_eq(&Value::Integer(3)));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Text(String::new()).is_truthy());
        assert!(!Value::Text("0".into()).is_truthy());
        assert!(Value::Text("0.0".into()).is_truthy());
        assert!(!Value::Integer(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(Value::Float(0.5).is_truthy());
        assert!(!Value::Null.is_truthy());
    }

    #[test]
    fn test_to_text() {
        assert_eq!(Value::Float(3.0).to_text(), "3");
        assert_eq!(Value::Float(2.5).to_text(), "2.5");
        assert_eq!(Value::Boolean(true).to_text(), "1");
        assert_eq!(Value::Boolean(false).to_text(), "");
        assert_eq!(Value::Integer(-7).to_text(), "-7");
    }

    #[test]
    fn test_float_text_precision() {
        assert_eq!(Value::Float(0.1 + 0.2).to_text(), "0.3");
        assert_eq!(Value::Float(-0.5).to_text(), "-0.5");
        assert_eq!(Value::Float(0.0001).to_text(), "0.0001");
        assert_eq!(Value::Float(1.5e-7).to_text(), "1.5E-7");
        assert_eq!(Value::Float(12345678901234.0).to_text(), "12345678901234");
        assert_eq!(Value::Float(1e15).to_text(), "1.0E+15");
        assert_eq!(Value::Float(1.0 / 3.0).to_text(), "0.33333333333333");
        assert_eq!(Value::Float(f64::NAN).to_text(), "NAN");
        assert_eq!(Value::Float(f64::NEG_INFINITY).to_text(), "-INF");
    }

    #[test]
    fn test_serializes_as_scalar() {
        let json = serde_json::to_string(&vec![
            Value::Integer(1),
            Value::Text("x".into()),
            Value::Null,
            Value::Boolean(true),
        ])
        .unwrap();
        assert_eq!(json, r#"[1,"x",null,true]"#);

        let back: Vec<Value> = serde_json::from_str("[2, 2.5, \"y\", false, null]").unwrap();
        assert_eq!(
            back,
            vec![
                Value::Integer(2),
                Value::Float(2.5),
                Value::Text("y".into()),
                Value::Boolean(false),
                Value::Null,
            ]
        );
    }
}
