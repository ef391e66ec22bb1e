//! # Evaluators
//!
//! An evaluator computes the value of a derived parameter from a fixed list
//! of named inputs. Evaluators are pure: the store gathers the current
//! values of every name in [`Evaluator::requires`] into an [`Inputs`] map and
//! passes it in, so each evaluator can be tested without a store.
//!
//! Failures are split in two classes. [`EvaluationError::Arithmetic`] marks
//! an expected numeric edge case (a division by zero, an undefined result);
//! the store logs it and keeps the previous value. Every other variant is a
//! bug in the evaluator and aborts the cascade.

pub mod expression;
#[cfg(feature = "optics")]
pub mod optics;
pub mod registry;

pub use expression::{ExpressionError, ExpressionEvaluator};
pub use registry::EvaluatorRegistry;

use crate::parameters::value::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Errors raised while computing a derived value
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("arithmetic error: {message}")]
    Arithmetic { message: String },

    #[error("missing input '{name}'")]
    MissingInput { name: String },

    #[error("input '{name}' is not numeric: {value}")]
    NonNumericInput { name: String, value: String },

    #[error("evaluation failed: {message}")]
    Failed { message: String },
}

impl EvaluationError {
    /// Whether this is an expected numeric edge case the cascade tolerates
    pub fn is_arithmetic(&self) -> bool {
        matches!(self, EvaluationError::Arithmetic { .. })
    }
}

/// Divide, reporting a zero denominator as an arithmetic error
pub fn checked_div(numerator: f64, denominator: f64) -> Result<f64, EvaluationError> {
    if denominator == 0.0 {
        return Err(EvaluationError::Arithmetic {
            message: format!("division of {} by zero", numerator),
        });
    }
    Ok(numerator / denominator)
}

/// Named input values handed to an evaluator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inputs {
    values: HashMap<String, Value>,
}

impl Inputs {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.values.insert(name.to_string(), value.into());
    }

    /// Builder form of [`Inputs::insert`]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Result<&Value, EvaluationError> {
        self.values
            .get(name)
            .ok_or_else(|| EvaluationError::MissingInput {
                name: name.to_string(),
            })
    }

    /// Numeric input; ints are widened to floats
    pub fn number(&self, name: &str) -> Result<f64, EvaluationError> {
        let value = self.get(name)?;
        value.as_f64().ok_or_else(|| EvaluationError::NonNumericInput {
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, Value)> for Inputs {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Capability to compute a value from named inputs
pub trait Evaluator: Send + Sync {
    /// Registry key of this evaluator
    fn name(&self) -> &str;

    /// Parameter names this evaluator reads, in declaration order
    fn requires(&self) -> &[String];

    fn evaluate(&self, inputs: &Inputs) -> Result<Value, EvaluationError>;
}

impl fmt::Debug for dyn Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("name", &self.name())
            .field("requires", &self.requires())
            .finish()
    }
}

/// Run an evaluator and classify a NaN result as an arithmetic failure
pub fn evaluate_checked(
    evaluator: &dyn Evaluator,
    inputs: &Inputs,
) -> Result<Value, EvaluationError> {
    match evaluator.evaluate(inputs)? {
        Value::Float(v) if v.is_nan() => Err(EvaluationError::Arithmetic {
            message: format!("{} produced an undefined result", evaluator.name()),
        }),
        value => Ok(value),
    }
}

type EvalFn = dyn Fn(&Inputs) -> Result<Value, EvaluationError> + Send + Sync;

/// An evaluator backed by a closure
pub struct FnEvaluator {
    name: String,
    requires: Vec<String>,
    func: Box<EvalFn>,
}

impl FnEvaluator {
    /// # Examples
    ///
    /// ```
    /// use rigparams_rs::evaluator::{Evaluator, FnEvaluator, Inputs};
    /// use rigparams_rs::parameters::Value;
    ///
    /// let total = FnEvaluator::new("dof_total_m", &["dof_near_m", "dof_far_m"], |inputs| {
    ///     Ok(Value::Float(inputs.number("dof_far_m")? - inputs.number("dof_near_m")?))
    /// });
    ///
    /// let inputs = Inputs::new().with("dof_near_m", 2.0).with("dof_far_m", 7.5);
    /// assert_eq!(total.evaluate(&inputs).unwrap(), Value::Float(5.5));
    /// ```
    pub fn new<F>(name: &str, requires: &[&str], func: F) -> Self
    where
        F: Fn(&Inputs) -> Result<Value, EvaluationError> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            requires: requires.iter().map(|r| r.to_string()).collect(),
            func: Box::new(func),
        }
    }
}

impl Evaluator for FnEvaluator {
    fn name(&self) -> &str {
        &self.name
    }

    fn requires(&self) -> &[String] {
        &self.requires
    }

    fn evaluate(&self, inputs: &Inputs) -> Result<Value, EvaluationError> {
        (self.func)(inputs)
    }
}
