//! # Parameter Store
//!
//! The single authoritative map from parameter name to [`Parameter`], plus
//! the cascading evaluation protocol.
//!
//! A successful [`ParameterStore::set`] converts the value to the declared
//! type, commits it, fires the change listeners and then walks the
//! [`DependencyGraph`] depth-first, recomputing every derived parameter that
//! transitively depends on the written one. Dependents are visited in load
//! order; there is no topological sort, so when two branches of a cascade
//! meet in the same parameter it is evaluated once per branch and the last
//! evaluation wins.
//!
//! ## Locking
//!
//! All state sits behind one reentrant mutex held for the full duration of
//! every public operation, cascade included. Listeners and evaluators run
//! with the lock held but with no borrow of the state outstanding, so a
//! listener may write back into the store from the same thread.
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use rigparams_rs::evaluator::FnEvaluator;
//! use rigparams_rs::parameters::{Parameter, Value, ValueType};
//! use rigparams_rs::store::ParameterStore;
//!
//! let doubled = FnEvaluator::new("doubled", &["base"], |inputs| {
//!     Ok(Value::Float(inputs.number("base")? * 2.0))
//! });
//!
//! let store = ParameterStore::new();
//! store.load(vec![
//!     Parameter::new("base", 1.0, ValueType::Float),
//!     Parameter::new("doubled", 0.0, ValueType::Float).with_evaluator(Arc::new(doubled)),
//! ]).unwrap();
//!
//! store.set("base", 21).unwrap();
//! assert_eq!(store.get_value("doubled").unwrap(), Value::Float(42.0));
//! ```

pub mod graph;
pub mod listeners;

pub use graph::{ConfigurationError, DependencyGraph};
pub use listeners::{ChangeListeners, Listener};

use crate::evaluator::{evaluate_checked, EvaluationError, Inputs};
use crate::parameters::{BoundsError, ConversionError, Parameter, ParameterStatus, Value};
use log::{debug, info, warn};
use parking_lot::ReentrantMutex;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised by store operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("parameter '{name}' not found")]
    NotFound { name: String },

    #[error("invalid value for '{name}': {source}")]
    Validation {
        name: String,
        source: ConversionError,
    },

    #[error("value for '{name}' out of bounds: {source}")]
    OutOfBounds { name: String, source: BoundsError },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("evaluating '{name}' failed: {source}")]
    Evaluation {
        name: String,
        source: EvaluationError,
    },

    #[error("cascade exceeded depth {depth} at '{name}'")]
    CascadeDepthExceeded { name: String, depth: usize },

    #[error("listener failed: {message}")]
    Listener { message: String },
}

impl StoreError {
    fn not_found(name: &str) -> Self {
        StoreError::NotFound {
            name: name.to_string(),
        }
    }
}

/// Per-write switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetOptions {
    /// Fire the change listeners with the updated parameter
    pub notify: bool,
    /// Recompute dependents
    pub evaluate: bool,
}

impl Default for SetOptions {
    fn default() -> Self {
        Self {
            notify: true,
            evaluate: true,
        }
    }
}

impl SetOptions {
    /// Write without firing listeners
    pub fn silent() -> Self {
        Self {
            notify: false,
            evaluate: true,
        }
    }

    /// Write the value only, with no notification and no cascade
    pub fn raw() -> Self {
        Self {
            notify: false,
            evaluate: false,
        }
    }
}

/// Store-wide cascade policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Deepest cascade recursion allowed before the write is aborted
    pub cascade_depth_limit: usize,
    /// Fire listeners for values recomputed by a cascade too
    pub notify_derived: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            cascade_depth_limit: 32,
            notify_derived: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct StoreState {
    parameters: HashMap<String, Parameter>,
    order: Vec<String>,
    graph: DependencyGraph,
}

impl StoreState {
    fn find(&self, name: &str) -> Result<&Parameter, StoreError> {
        self.parameters
            .get(name)
            .ok_or_else(|| StoreError::not_found(name))
    }
}

/// Convert `value` for `param` and check it against the declared bounds
fn checked_value(param: &Parameter, value: &Value) -> Result<Value, StoreError> {
    let converted = param
        .value_type()
        .convert(value)
        .map_err(|source| StoreError::Validation {
            name: param.name().to_string(),
            source,
        })?;

    if let Some(number) = converted.as_f64() {
        param
            .bounds()
            .check(number)
            .map_err(|source| StoreError::OutOfBounds {
                name: param.name().to_string(),
                source,
            })?;
    }

    Ok(converted)
}

/// Thread-safe parameter repository with cascading re-evaluation
pub struct ParameterStore {
    state: ReentrantMutex<RefCell<StoreState>>,
    listeners: ChangeListeners,
    settings: StoreSettings,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::with_settings(StoreSettings::default())
    }

    pub fn with_settings(settings: StoreSettings) -> Self {
        Self {
            state: ReentrantMutex::new(RefCell::new(StoreState::default())),
            listeners: ChangeListeners::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// The change notification bus
    pub fn listeners(&self) -> &ChangeListeners {
        &self.listeners
    }

    /// Add parameters and rebuild the dependency graph.
    ///
    /// Parameters already in the store stay; a name that is already loaded
    /// (or repeated within `params`) is a [`ConfigurationError`]. Default
    /// values are converted to their declared type. The load is atomic: on
    /// any error the store is left exactly as it was.
    pub fn load(&self, params: Vec<Parameter>) -> Result<(), StoreError> {
        let guard = self.state.lock();
        let mut next = guard.borrow().clone();
        let count = params.len();

        for mut param in params {
            let name = param.name().to_string();
            if next.parameters.contains_key(&name) {
                return Err(ConfigurationError::DuplicateParameter { name }.into());
            }

            let converted = param
                .value_type()
                .convert(param.value())
                .map_err(|source| ConfigurationError::InvalidDefault {
                    name: name.clone(),
                    source,
                })?;
            param.set_value(converted);

            next.order.push(name.clone());
            next.parameters.insert(name, param);
        }

        next.graph = DependencyGraph::build(&next.order, &next.parameters)?;
        info!(
            "loaded {} parameters ({} total, {} dependency edges)",
            count,
            next.order.len(),
            next.graph.edge_count()
        );
        *guard.borrow_mut() = next;
        Ok(())
    }

    /// A copy of the named parameter
    pub fn get(&self, name: &str) -> Result<Parameter, StoreError> {
        let guard = self.state.lock();
        let state = guard.borrow();
        state.find(name).cloned()
    }

    pub fn get_value(&self, name: &str) -> Result<Value, StoreError> {
        let guard = self.state.lock();
        let state = guard.borrow();
        Ok(state.find(name)?.value().clone())
    }

    /// Check that `value` would be accepted by [`set`](Self::set) without
    /// writing it
    pub fn validate(&self, name: &str, value: impl Into<Value>) -> Result<(), StoreError> {
        let value = value.into();
        let guard = self.state.lock();
        let state = guard.borrow();
        checked_value(state.find(name)?, &value).map(|_| ())
    }

    /// Validate a full descriptor against the loaded parameter of the same name
    pub fn validate_parameter(&self, parameter: &Parameter) -> Result<(), StoreError> {
        self.validate(parameter.name(), parameter.value().clone())
    }

    /// Write a value, notify listeners and cascade
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), StoreError> {
        self.set_with(name, value, SetOptions::default())
    }

    /// Write a value with explicit notification and cascade switches
    pub fn set_with(
        &self,
        name: &str,
        value: impl Into<Value>,
        options: SetOptions,
    ) -> Result<(), StoreError> {
        let guard = self.state.lock();
        self.set_locked(&guard, name, value.into(), options, 0)
    }

    fn set_locked(
        &self,
        state: &RefCell<StoreState>,
        name: &str,
        value: Value,
        options: SetOptions,
        depth: usize,
    ) -> Result<(), StoreError> {
        if depth > self.settings.cascade_depth_limit {
            return Err(StoreError::CascadeDepthExceeded {
                name: name.to_string(),
                depth,
            });
        }

        let (updated, dependents) = {
            let mut state = state.borrow_mut();
            let param = state
                .parameters
                .get_mut(name)
                .ok_or_else(|| StoreError::not_found(name))?;
            let converted = checked_value(param, &value)?;
            param.set_value(converted);
            let updated = param.clone();
            (updated, state.graph.dependents(name).to_vec())
        };
        debug!("set {} = {} (depth {})", name, updated.value(), depth);

        if options.notify {
            self.listeners.fire(&updated)?;
        }

        if options.evaluate {
            for dependent in &dependents {
                self.evaluate_locked(state, dependent, depth + 1)?;
            }
        }

        Ok(())
    }

    /// Recompute one derived parameter and continue the cascade from it
    fn evaluate_locked(
        &self,
        state: &RefCell<StoreState>,
        name: &str,
        depth: usize,
    ) -> Result<(), StoreError> {
        let (evaluator, inputs) = {
            let state = state.borrow();
            let param = state.find(name)?;
            let Some(evaluator) = param.evaluator().cloned() else {
                return Ok(());
            };
            let inputs = evaluator
                .requires()
                .iter()
                .map(|input| Ok((input.clone(), state.find(input)?.value().clone())))
                .collect::<Result<Inputs, StoreError>>()?;
            (evaluator, inputs)
        };

        let result = match evaluate_checked(evaluator.as_ref(), &inputs) {
            Ok(result) => result,
            Err(e) if e.is_arithmetic() => {
                warn!("could not evaluate '{}': {}", name, e);
                return Ok(());
            }
            Err(source) => {
                return Err(StoreError::Evaluation {
                    name: name.to_string(),
                    source,
                })
            }
        };

        let options = SetOptions {
            notify: self.settings.notify_derived,
            evaluate: true,
        };
        match self.set_locked(state, name, result, options, depth) {
            Err(StoreError::OutOfBounds { name, source }) => {
                warn!("evaluated value of '{}' rejected: {}", name, source);
                Ok(())
            }
            other => other,
        }
    }

    /// Replace the status metadata of a parameter and notify listeners
    pub fn set_status(&self, name: &str, status: ParameterStatus) -> Result<(), StoreError> {
        self.set_status_with(name, status, true)
    }

    pub fn set_status_with(
        &self,
        name: &str,
        status: ParameterStatus,
        notify: bool,
    ) -> Result<(), StoreError> {
        let guard = self.state.lock();
        let updated = {
            let mut state = guard.borrow_mut();
            let param = state
                .parameters
                .get_mut(name)
                .ok_or_else(|| StoreError::not_found(name))?;
            param.set_status(status);
            param.clone()
        };
        debug!("status of {} = {:?}", name, status);

        if notify {
            self.listeners.fire(&updated)?;
        }
        Ok(())
    }

    /// Copies of every parameter, in load order
    pub fn get_parameters(&self) -> Vec<Parameter> {
        let guard = self.state.lock();
        let state = guard.borrow();
        state
            .order
            .iter()
            .filter_map(|name| state.parameters.get(name).cloned())
            .collect()
    }

    pub fn is_read_only(&self, name: &str) -> Result<bool, StoreError> {
        let guard = self.state.lock();
        let state = guard.borrow();
        Ok(state.find(name)?.is_read_only())
    }

    /// Direct dependents of `name`, in cascade order
    pub fn dependents(&self, name: &str) -> Result<Vec<String>, StoreError> {
        let guard = self.state.lock();
        let state = guard.borrow();
        state.find(name)?;
        Ok(state.graph.dependents(name).to_vec())
    }

    pub fn contains(&self, name: &str) -> bool {
        let guard = self.state.lock();
        let state = guard.borrow();
        state.parameters.contains_key(name)
    }

    /// Parameter names in load order
    pub fn names(&self) -> Vec<String> {
        let guard = self.state.lock();
        let state = guard.borrow();
        state.order.clone()
    }

    pub fn len(&self) -> usize {
        let guard = self.state.lock();
        let state = guard.borrow();
        state.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every parameter and the dependency graph
    pub fn clear(&self) {
        let guard = self.state.lock();
        *guard.borrow_mut() = StoreState::default();
        debug!("store cleared");
    }

    /// Run `f` with the store lock held, so several reads observe one state
    pub fn with_lock<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
        let _guard = self.state.lock();
        f(self)
    }
}
