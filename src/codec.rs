//! JSON wire format for parameter sets
//!
//! A set is one object keyed by parameter name:
//!
//! ```json
//! {
//!   "baseline_mm": {
//!     "value": 80.0,
//!     "type": "float",
//!     "status": { "read": true, "write": true, "status": "hardware" },
//!     "minValue": 0.0,
//!     "maxValue": 300.0
//!   }
//! }
//! ```
//!
//! Infinite floats travel as the sentinels in [`infinity`]; decoding maps
//! any float at or beyond the sentinel magnitude back to an infinity.

use crate::parameters::{infinity, BoundsError, ConversionError, Parameter, ParameterStatus, Value, ValueType};
use log::debug;
use serde_json::{json, Map, Value as Json};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("JSON decoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request not an object")]
    NotAnObject,

    #[error("no request data")]
    Empty,

    #[error("entry '{name}' is not an object")]
    InvalidEntry { name: String },

    #[error("entry '{name}' has no 'value' field")]
    MissingValue { name: String },

    #[error("entry '{name}' has an unsupported value: {value}")]
    UnsupportedValue { name: String, value: String },

    #[error("value of '{name}' is NaN and cannot be encoded")]
    NotANumber { name: String },

    #[error("entry '{name}' has an invalid status: {message}")]
    InvalidStatus { name: String, message: String },

    #[error("value of '{name}' does not match its type: {source}")]
    Conversion {
        name: String,
        source: ConversionError,
    },

    #[error("entry '{name}' has invalid bounds: {source}")]
    InvalidBounds { name: String, source: BoundsError },
}

/// Encoder and decoder of the parameter set representation
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterCodec;

impl ParameterCodec {
    pub fn new() -> Self {
        Self
    }

    /// Encode parameters as a JSON object string
    pub fn encode(&self, params: &[Parameter]) -> Result<String, CodecError> {
        Ok(serde_json::to_string(&self.to_json(params)?)?)
    }

    /// Indented form of [`encode`](Self::encode), used for files
    pub fn encode_pretty(&self, params: &[Parameter]) -> Result<String, CodecError> {
        Ok(serde_json::to_string_pretty(&self.to_json(params)?)?)
    }

    /// Fails on a NaN value, which JSON cannot carry
    pub fn to_json(&self, params: &[Parameter]) -> Result<Json, CodecError> {
        let mut set = Map::new();
        for param in params {
            set.insert(param.name().to_string(), entry_to_json(param)?);
        }
        Ok(Json::Object(set))
    }

    /// Decode a JSON object string into parameters
    pub fn decode(&self, data: &str) -> Result<Vec<Parameter>, CodecError> {
        let request: Json = serde_json::from_str(data)?;
        self.from_json(&request)
    }

    pub fn from_json(&self, request: &Json) -> Result<Vec<Parameter>, CodecError> {
        let set = request.as_object().ok_or(CodecError::NotAnObject)?;
        if set.is_empty() {
            return Err(CodecError::Empty);
        }

        set.iter().map(|(name, entry)| entry_from_json(name, entry)).collect()
    }
}

fn value_to_json(name: &str, value: &Value) -> Result<Json, CodecError> {
    Ok(match value {
        Value::Int(i) => json!(i),
        Value::Float(f) if f.is_nan() => {
            return Err(CodecError::NotANumber {
                name: name.to_string(),
            })
        }
        Value::Float(f) => json!(infinity::to_wire(*f)),
        Value::Bool(b) => json!(b),
        Value::Str(s) => json!(s),
    })
}

fn entry_to_json(param: &Parameter) -> Result<Json, CodecError> {
    let status = param.status();
    let mut entry = Map::new();
    entry.insert("value".to_string(), value_to_json(param.name(), param.value())?);
    entry.insert("type".to_string(), json!(param.value_type().name()));
    entry.insert(
        "status".to_string(),
        json!({
            "read": status.read,
            "write": status.write,
            "status": status.origin.name(),
        }),
    );
    if let Some(min) = param.min_value() {
        entry.insert("minValue".to_string(), json!(min));
    }
    if let Some(max) = param.max_value() {
        entry.insert("maxValue".to_string(), json!(max));
    }
    Ok(Json::Object(entry))
}

fn value_from_json(name: &str, value: &Json) -> Result<Value, CodecError> {
    match value {
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::String(s) => Ok(Value::Str(s.clone())),
        Json::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(Value::Int(i)),
            (None, Some(f)) => Ok(Value::Float(infinity::from_wire(f))),
            (None, None) => Err(CodecError::UnsupportedValue {
                name: name.to_string(),
                value: n.to_string(),
            }),
        },
        other => Err(CodecError::UnsupportedValue {
            name: name.to_string(),
            value: other.to_string(),
        }),
    }
}

fn limit_from_json(entry: &Map<String, Json>, key: &str) -> Option<f64> {
    entry.get(key).and_then(Json::as_f64).map(infinity::from_wire)
}

fn entry_from_json(name: &str, entry: &Json) -> Result<Parameter, CodecError> {
    debug!("decoding parameter {}: {}", name, entry);

    let entry = entry.as_object().ok_or_else(|| CodecError::InvalidEntry {
        name: name.to_string(),
    })?;
    let raw = entry.get("value").ok_or_else(|| CodecError::MissingValue {
        name: name.to_string(),
    })?;
    let mut value = value_from_json(name, raw)?;

    let declared = entry
        .get("type")
        .and_then(Json::as_str)
        .and_then(ValueType::from_name);
    let value_type = match declared {
        Some(value_type) => {
            value = value_type
                .convert(&value)
                .map_err(|source| CodecError::Conversion {
                    name: name.to_string(),
                    source,
                })?;
            value_type
        }
        None => value.value_type(),
    };

    let mut param = Parameter::new(name, value, value_type);

    if let Some(status) = entry.get("status") {
        let status: ParameterStatus =
            serde_json::from_value(status.clone()).map_err(|e| CodecError::InvalidStatus {
                name: name.to_string(),
                message: e.to_string(),
            })?;
        param = param.with_status(status);
    }

    let min = limit_from_json(entry, "minValue");
    let max = limit_from_json(entry, "maxValue");
    if min.is_some() || max.is_some() {
        param = param
            .with_limits(min, max)
            .map_err(|source| CodecError::InvalidBounds {
                name: name.to_string(),
                source,
            })?;
    }

    Ok(param)
}
