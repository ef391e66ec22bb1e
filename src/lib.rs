//! # rigparams-rs
//!
//! `rigparams-rs` is the live parameter store of a stereoscopic camera rig
//! controller: a typed key-value store where primary parameters (focus
//! distance, baseline, ...) are written by clients and hardware, and derived
//! parameters (depth of field, field of view, parallax, ...) are recomputed
//! synchronously whenever one of their inputs changes.
//!
//! The library provides:
//! - A thread-safe [`ParameterStore`] with cascading re-evaluation along a
//!   static dependency graph and a change notification bus
//! - Pluggable evaluators: compiled stereoscopic formulas and expression
//!   strings parsed at load time
//! - The rig's system parameter set, a JSON wire codec and snapshot backends
//! - A [`Controller`] enforcing read-only parameters and driving snapshots
//!
//! ## Basic Usage
//!
//! ```
//! use rigparams_rs::evaluator::EvaluatorRegistry;
//! use rigparams_rs::parameters::Value;
//! use rigparams_rs::store::ParameterStore;
//! use rigparams_rs::sysparams::system_parameters;
//!
//! let registry = EvaluatorRegistry::with_builtin();
//! let store = ParameterStore::new();
//! store.load(system_parameters(&registry).unwrap()).unwrap();
//!
//! store.set("record_framerate", 50).unwrap();
//! assert_eq!(store.get_value("shutter_us").unwrap(), Value::Float(10000.0));
//! ```

// Public modules
pub mod error;

// Data model and evaluation engine
pub mod evaluator;
pub mod parameters;
pub mod store;

// Rig definition and collaborators
pub mod codec;
pub mod config;
pub mod controller;
pub mod snapshot;
pub mod sysparams;

// Re-exports for convenience
pub use controller::Controller;
pub use error::{RigError, Result};
pub use parameters::{Parameter, ParameterStatus, Value, ValueType};
pub use store::{ParameterStore, SetOptions, StoreSettings};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
