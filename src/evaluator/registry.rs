//! Flat registry of evaluators keyed by name
//!
//! Parameter definitions reference evaluators by key; the registry resolves
//! them to shared instances when the parameter set is built.

use crate::evaluator::{EvaluationError, Evaluator, FnEvaluator, Inputs};
use crate::parameters::value::Value;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct EvaluatorRegistry {
    evaluators: HashMap<String, Arc<dyn Evaluator>>,
}

impl EvaluatorRegistry {
    pub fn new() -> Self {
        Self {
            evaluators: HashMap::new(),
        }
    }

    /// Registry preloaded with the stereoscopic formulas
    #[cfg(feature = "optics")]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        crate::evaluator::optics::register_builtin(&mut registry);
        registry
    }

    /// Register an evaluator under its own name, returning the one it replaced
    pub fn register(&mut self, evaluator: Arc<dyn Evaluator>) -> Option<Arc<dyn Evaluator>> {
        let key = evaluator.name().to_string();
        debug!("registering evaluator '{}'", key);
        let previous = self.evaluators.insert(key.clone(), evaluator);
        if previous.is_some() {
            warn!("evaluator '{}' replaced", key);
        }
        previous
    }

    /// Register a closure as an evaluator
    pub fn register_fn<F>(&mut self, name: &str, requires: &[&str], func: F)
    where
        F: Fn(&Inputs) -> Result<Value, EvaluationError> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnEvaluator::new(name, requires, func)));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Evaluator>> {
        self.evaluators.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.evaluators.contains_key(name)
    }

    /// Registered keys, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.evaluators.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.evaluators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluators.is_empty()
    }
}
