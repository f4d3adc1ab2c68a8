use std::fmt;

use serde::{Deserialize, Serialize};

/// A typed argument value recovered from command text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl Value {
    /// Convert a raw token using the bridge conversion policy: numeric
    /// literals first, then the exact words `true`/`false`, then text.
    pub fn from_token(token: &str) -> Self {
        if let Some(number) = parse_number(token) {
            return Value::Number(number);
        }
        match token {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            other => Value::Text(other.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Non-negative whole number view, used for counts.
    pub fn as_count(&self) -> Option<u32> {
        let value = self.as_f64()?;
        if value.is_finite() && value >= 0.0 && value <= u32::MAX as f64 {
            Some(value.floor() as u32)
        } else {
            None
        }
    }

    /// Textual view of any value. Names such as item or recipe identifiers
    /// may legitimately look numeric, so they are read through this.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(value) => {
                if value.fract() == 0.0 && value.abs() < 1e15 {
                    write!(f, "{}", *value as i64)
                } else {
                    write!(f, "{}", value)
                }
            }
            Value::Bool(value) => write!(f, "{}", value),
            Value::Text(value) => f.write_str(value),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

fn parse_number(token: &str) -> Option<f64> {
    let (negative, unsigned) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };

    let magnitude = if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).ok()? as f64
    } else {
        // Rust accepts "inf" and "NaN"; numeric literals must start with a digit or '.'.
        let first = unsigned.chars().next()?;
        if !(first.is_ascii_digit() || first == '.') {
            return None;
        }
        unsigned.parse::<f64>().ok()?
    };

    if !magnitude.is_finite() {
        return None;
    }
    Some(if negative { -magnitude } else { magnitude })
}
