//! Parameter definition and implementation
//!
//! This module provides the Parameter struct, the descriptor held by the
//! store for every named value of the rig. A parameter with an evaluator is
//! *derived*: the store recomputes it whenever one of its inputs changes.

use crate::evaluator::Evaluator;
use crate::parameters::bounds::{Bounds, BoundsError};
use crate::parameters::value::{Value, ValueType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Where a parameter's value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Hardware,
    Software,
}

impl Origin {
    pub fn name(&self) -> &'static str {
        match self {
            Origin::Hardware => "hardware",
            Origin::Software => "software",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "hardware" => Some(Origin::Hardware),
            "software" => Some(Origin::Software),
            _ => None,
        }
    }
}

/// Access metadata of a parameter.
///
/// `write == false` marks a read-only parameter. The store does not enforce
/// it; the controller layer refuses external writes to such parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterStatus {
    pub read: bool,
    pub write: bool,
    #[serde(rename = "status")]
    pub origin: Origin,
}

impl ParameterStatus {
    pub fn new(read: bool, write: bool, origin: Origin) -> Self {
        Self {
            read,
            write,
            origin,
        }
    }

    /// Status of a parameter that can be read but not written
    pub fn read_only() -> Self {
        Self::new(true, false, Origin::Hardware)
    }
}

impl Default for ParameterStatus {
    fn default() -> Self {
        Self::new(true, true, Origin::Hardware)
    }
}

/// A named, typed value of the rig
#[derive(Clone)]
pub struct Parameter {
    name: String,
    value: Value,
    value_type: ValueType,
    status: ParameterStatus,
    bounds: Bounds,
    evaluator: Option<Arc<dyn Evaluator>>,
}

impl Parameter {
    /// Create a writable hardware parameter with no bounds and no evaluator
    ///
    /// # Examples
    ///
    /// ```
    /// use rigparams_rs::parameters::{Parameter, Value, ValueType};
    ///
    /// let param = Parameter::new("focus_distance_m", 5.0, ValueType::Float);
    /// assert_eq!(param.name(), "focus_distance_m");
    /// assert_eq!(param.value(), &Value::Float(5.0));
    /// assert!(!param.is_read_only());
    /// assert!(!param.is_derived());
    /// ```
    pub fn new(name: &str, value: impl Into<Value>, value_type: ValueType) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            value_type,
            status: ParameterStatus::default(),
            bounds: Bounds::default(),
            evaluator: None,
        }
    }

    /// Create a parameter flagged as read-only
    pub fn read_only(name: &str, value: impl Into<Value>, value_type: ValueType) -> Self {
        Self::new(name, value, value_type).with_status(ParameterStatus::read_only())
    }

    pub fn with_status(mut self, status: ParameterStatus) -> Self {
        self.status = status;
        self
    }

    /// Attach inclusive numeric bounds
    pub fn with_bounds(self, min: f64, max: f64) -> Result<Self, BoundsError> {
        self.with_limits(Some(min), Some(max))
    }

    /// Attach bounds where either side may be missing
    pub fn with_limits(mut self, min: Option<f64>, max: Option<f64>) -> Result<Self, BoundsError> {
        self.bounds = Bounds::from_limits(min, max)?;
        Ok(self)
    }

    /// Make this parameter derived from the evaluator's inputs
    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn status(&self) -> &ParameterStatus {
        &self.status
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn min_value(&self) -> Option<f64> {
        self.bounds.min_value()
    }

    pub fn max_value(&self) -> Option<f64> {
        self.bounds.max_value()
    }

    pub fn evaluator(&self) -> Option<&Arc<dyn Evaluator>> {
        self.evaluator.as_ref()
    }

    /// Names of the parameters this one is computed from
    pub fn requires(&self) -> &[String] {
        self.evaluator.as_ref().map(|e| e.requires()).unwrap_or(&[])
    }

    pub fn is_derived(&self) -> bool {
        self.evaluator.is_some()
    }

    pub fn is_read_only(&self) -> bool {
        !self.status.write
    }

    /// Replace the value without conversion; the store converts first
    pub(crate) fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    pub(crate) fn set_status(&mut self, status: ParameterStatus) {
        self.status = status;
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("value", &self.value)
            .field("value_type", &self.value_type)
            .field("status", &self.status)
            .field("bounds", &self.bounds)
            .field("evaluator", &self.evaluator.as_ref().map(|e| e.name().to_string()))
            .finish()
    }
}
