//! # Parameter System
//!
//! The data model of the rig: typed values, bounds, access status and the
//! parameter descriptor itself.
//!
//! ## Core Components
//!
//! - [`Value`] and [`ValueType`]: dynamically-typed scalars and the closed
//!   set of declared types with explicit conversion
//! - [`Bounds`]: optional inclusive numeric limits
//! - [`Parameter`] and [`ParameterStatus`]: the descriptor owned by the store
//! - [`infinity`]: wire sentinels standing in for IEEE infinities
//!
//! ## Example Usage
//!
//! ```rust
//! use rigparams_rs::parameters::{Parameter, Value, ValueType};
//!
//! let iso = Parameter::new("iso", 800, ValueType::Int);
//! let camera = Parameter::read_only("camera_id", "A", ValueType::Str);
//!
//! assert_eq!(iso.value(), &Value::Int(800));
//! assert!(camera.is_read_only());
//! ```

pub mod bounds;
pub mod infinity;
pub mod parameter;
pub mod value;

// Re-export key types
pub use bounds::{Bounds, BoundsError};
pub use parameter::{Origin, Parameter, ParameterStatus};
pub use value::{ConversionError, Value, ValueType};
