//! Dependency graph between parameters
//!
//! Maps every input name to the derived parameters that must be recomputed
//! when it changes. The graph is built once per load from the evaluators'
//! declared inputs and is never mutated afterwards.

use crate::parameters::{BoundsError, ConversionError, Parameter};
use std::collections::HashMap;
use thiserror::Error;

/// A parameter set that cannot be loaded
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("duplicate parameter '{name}'")]
    DuplicateParameter { name: String },

    #[error("parameter '{parameter}' requires unknown parameter '{input}'")]
    UnresolvedDependency { parameter: String, input: String },

    #[error("parameter '{parameter}' uses unknown evaluator '{evaluator}'")]
    UnknownEvaluator { parameter: String, evaluator: String },

    #[error("default value of '{name}' does not match its type: {source}")]
    InvalidDefault {
        name: String,
        source: ConversionError,
    },

    #[error("invalid bounds for '{name}': {source}")]
    InvalidBounds { name: String, source: BoundsError },

    #[error("invalid expression for '{name}': {message}")]
    InvalidExpression { name: String, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    dependents: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for parameters given in load order.
    ///
    /// Dependents of an input are kept in the order their parameters were
    /// loaded; this is the order a cascade visits them in.
    pub fn build(
        order: &[String],
        parameters: &HashMap<String, Parameter>,
    ) -> Result<Self, ConfigurationError> {
        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();

        for name in order {
            let Some(param) = parameters.get(name) else {
                continue;
            };

            for input in param.requires() {
                if !parameters.contains_key(input) {
                    return Err(ConfigurationError::UnresolvedDependency {
                        parameter: name.clone(),
                        input: input.clone(),
                    });
                }

                let entry = dependents.entry(input.clone()).or_default();
                if !entry.contains(name) {
                    entry.push(name.clone());
                }
            }
        }

        Ok(Self { dependents })
    }

    /// Direct dependents of `name`, in cascade order
    pub fn dependents(&self, name: &str) -> &[String] {
        self.dependents.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every parameter reachable from `name`, each listed once, in the
    /// order a depth-first cascade first reaches it
    pub fn transitive_dependents(&self, name: &str) -> Vec<String> {
        let mut reached = Vec::new();
        let mut stack: Vec<&str> = self.dependents(name).iter().rev().map(String::as_str).collect();

        while let Some(current) = stack.pop() {
            if current == name || reached.iter().any(|r| r == current) {
                continue;
            }
            reached.push(current.to_string());
            stack.extend(self.dependents(current).iter().rev().map(String::as_str));
        }

        reached
    }

    /// Number of dependency edges
    pub fn edge_count(&self) -> usize {
        self.dependents.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }
}
