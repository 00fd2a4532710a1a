//! Conversion of literal strings and stored values into typed values.

use std::fmt;

use toml::Value;

use super::resolve::value_to_string;
use super::ConfigError;

/// The value type an accessor expects back from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ValueKind {
    String,
    Integer,
    Float,
    Boolean,
    Datetime,
    /// Comma separated when decoded from a literal.
    List,
    /// Whatever the store holds, unconverted. Literals decode as strings.
    Any,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::String => "string",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Boolean => "boolean",
            ValueKind::Datetime => "datetime",
            ValueKind::List => "list",
            ValueKind::Any => "any",
        };
        f.write_str(name)
    }
}

impl ValueKind {
    /// Whether `value` already has this kind.
    pub fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ValueKind::Any, _)
                | (ValueKind::String, Value::String(_))
                | (ValueKind::Integer, Value::Integer(_))
                | (ValueKind::Float, Value::Float(_))
                | (ValueKind::Boolean, Value::Boolean(_))
                | (ValueKind::Datetime, Value::Datetime(_))
                | (ValueKind::List, Value::Array(_))
        )
    }
}

/// Turns strings (and loosely typed stored values) into values of a [`ValueKind`].
///
/// Implementations must be safe to share between threads; proxies hold one
/// for their whole lifetime.
pub trait Decoder: Send + Sync + fmt::Debug {
    /// Decodes a literal string into `kind`.
    fn decode(&self, kind: ValueKind, literal: &str) -> Result<Value, ConfigError>;

    /// Converts a stored value into `kind`.
    ///
    /// Values that already match pass through. Strings are decoded, integers
    /// widen to floats, and other scalars are re-rendered then decoded.
    fn convert(&self, kind: ValueKind, value: Value) -> Result<Value, ConfigError> {
        if kind.matches(&value) {
            return Ok(value);
        }
        match (kind, value) {
            (ValueKind::Float, Value::Integer(i)) => Ok(Value::Float(i as f64)),
            (kind, Value::String(s)) => self.decode(kind, &s),
            (kind, value @ (Value::Array(_) | Value::Table(_))) => Err(ConfigError::DecodeError {
                kind,
                literal: value.to_string(),
            }),
            (kind, value) => {
                let literal = value_to_string(&value, "")?;
                self.decode(kind, &literal)
            }
        }
    }
}

/// Decoder for the scalar kinds TOML can represent.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDecoder;

impl Decoder for DefaultDecoder {
    fn decode(&self, kind: ValueKind, literal: &str) -> Result<Value, ConfigError> {
        let fail = || ConfigError::DecodeError {
            kind,
            literal: literal.to_string(),
        };
        let trimmed = literal.trim();

        match kind {
            ValueKind::String | ValueKind::Any => Ok(Value::String(literal.to_string())),
            ValueKind::Integer => trimmed.parse::<i64>().map(Value::Integer).map_err(|_| fail()),
            ValueKind::Float => trimmed.parse::<f64>().map(Value::Float).map_err(|_| fail()),
            ValueKind::Boolean => {
                if trimmed.eq_ignore_ascii_case("true") {
                    Ok(Value::Boolean(true))
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Ok(Value::Boolean(false))
                } else {
                    Err(fail())
                }
            }
            ValueKind::Datetime => trimmed
                .parse::<toml::value::Datetime>()
                .map(Value::Datetime)
                .map_err(|_| fail()),
            ValueKind::List => {
                if trimmed.is_empty() {
                    return Ok(Value::Array(Vec::new()));
                }
                Ok(Value::Array(
                    trimmed
                        .split(',')
                        .map(|item| Value::String(item.trim().to_string()))
                        .collect(),
                ))
            }
        }
    }
}
