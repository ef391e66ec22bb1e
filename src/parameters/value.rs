//! Parameter values and their declared types
//!
//! Every parameter declares one of four scalar types. Writes go through
//! [`ValueType::convert`], which is total over [`Value`] and fails with a
//! [`ConversionError`] instead of coercing silently.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when converting a value to a declared type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("invalid literal '{input}' for type {target}")]
    Unparsable { input: String, target: ValueType },

    #[error("cannot convert non-finite float {value} to int")]
    NonFinite { value: f64 },

    #[error("float {value} does not fit into int")]
    OutOfRange { value: f64 },

    #[error("NaN is not a valid {target} value")]
    NotANumber { target: ValueType },
}

/// Declared type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Int,
    Float,
    Bool,
    Str,
}

impl ValueType {
    /// Name used on the wire (`int`, `float`, `bool`, `str`)
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
            ValueType::Str => "str",
        }
    }

    /// Look up a type by its wire name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(ValueType::Int),
            "float" => Some(ValueType::Float),
            "bool" => Some(ValueType::Bool),
            "str" => Some(ValueType::Str),
            _ => None,
        }
    }

    /// Convert `value` to this type.
    ///
    /// The conversion rules are:
    ///
    /// * `Int`: floats are truncated toward zero (non-finite floats fail),
    ///   booleans become 0/1, strings must parse as an integer literal.
    /// * `Float`: ints and booleans widen, strings must parse as a float
    ///   literal (`inf` and `-inf` are accepted, NaN in any form is not).
    /// * `Bool`: numbers other than NaN are `true` when non-zero, strings accept
    ///   `true/false/1/0/yes/no/on/off` in any case.
    /// * `Str`: every value is formatted with its `Display` form.
    ///
    /// # Examples
    ///
    /// ```
    /// use rigparams_rs::parameters::value::{Value, ValueType};
    ///
    /// assert_eq!(ValueType::Float.convert(&Value::Int(10)).unwrap(), Value::Float(10.0));
    /// assert_eq!(ValueType::Int.convert(&Value::Str("42".into())).unwrap(), Value::Int(42));
    /// assert!(ValueType::Float.convert(&Value::Str("foo".into())).is_err());
    /// ```
    pub fn convert(&self, value: &Value) -> Result<Value, ConversionError> {
        match self {
            ValueType::Int => to_int(value).map(Value::Int),
            ValueType::Float => to_float(value).map(Value::Float),
            ValueType::Bool => to_bool(value).map(Value::Bool),
            ValueType::Str => Ok(Value::Str(match value {
                Value::Str(s) => s.clone(),
                other => other.to_string(),
            })),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn to_int(value: &Value) -> Result<i64, ConversionError> {
    match value {
        Value::Int(i) => Ok(*i),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Float(f) => {
            if !f.is_finite() {
                return Err(ConversionError::NonFinite { value: *f });
            }
            let truncated = f.trunc();
            if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
                return Err(ConversionError::OutOfRange { value: *f });
            }
            Ok(truncated as i64)
        }
        Value::Str(s) => s.trim().parse::<i64>().map_err(|_| ConversionError::Unparsable {
            input: s.clone(),
            target: ValueType::Int,
        }),
    }
}

fn to_float(value: &Value) -> Result<f64, ConversionError> {
    let f = match value {
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        Value::Bool(b) => if *b { 1.0 } else { 0.0 },
        Value::Str(s) => s.trim().parse::<f64>().map_err(|_| ConversionError::Unparsable {
            input: s.clone(),
            target: ValueType::Float,
        })?,
    };
    if f.is_nan() {
        return Err(ConversionError::NotANumber {
            target: ValueType::Float,
        });
    }
    Ok(f)
}

fn to_bool(value: &Value) -> Result<bool, ConversionError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Int(i) => Ok(*i != 0),
        Value::Float(f) if f.is_nan() => Err(ConversionError::NotANumber {
            target: ValueType::Bool,
        }),
        Value::Float(f) => Ok(*f != 0.0),
        Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConversionError::Unparsable {
                input: s.clone(),
                target: ValueType::Bool,
            }),
        },
    }
}

/// A dynamically-typed scalar parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Value {
    /// The type this value currently holds
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Bool(_) => ValueType::Bool,
            Value::Str(_) => ValueType::Str,
        }
    }

    /// Numeric view of the value; `None` for booleans and strings
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            // Debug keeps the fractional marker ("2.0") and exponent form ("1e100")
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}
