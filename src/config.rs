//! Controller configuration
//!
//! Loaded from a TOML file; every field has a default, so an empty file
//! (or a missing one, through [`ControllerConfig::load_or_default`]) gives
//! a working controller.
//!
//! ```toml
//! snapshots_location = "/var/lib/rig-controller/snapshots"
//!
//! [store]
//! cascade_depth_limit = 32
//! notify_derived = false
//!
//! [[derived]]
//! name = "baseline_ratio"
//! expression = "baseline_mm / interpupillary_distance_mm"
//! type = "float"
//! min = 0.0
//! ```

use crate::evaluator::ExpressionEvaluator;
use crate::parameters::{Parameter, ParameterStatus, ValueType};
use crate::store::{ConfigurationError, StoreSettings};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub const DEFAULT_SNAPSHOTS_LOCATION: &str = "/var/lib/rig-controller/snapshots";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

fn default_value_type() -> ValueType {
    ValueType::Float
}

/// A parameter computed from an expression over other parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedDefinition {
    pub name: String,
    pub expression: String,
    #[serde(rename = "type", default = "default_value_type")]
    pub value_type: ValueType,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl DerivedDefinition {
    /// Build the parameter, parsing its expression
    pub fn to_parameter(&self) -> Result<Parameter, ConfigurationError> {
        let evaluator = ExpressionEvaluator::parse(&self.name, &self.expression).map_err(|e| {
            ConfigurationError::InvalidExpression {
                name: self.name.clone(),
                message: e.to_string(),
            }
        })?;

        let mut param = Parameter::new(&self.name, 0, self.value_type)
            .with_evaluator(Arc::new(evaluator))
            .with_limits(self.min, self.max)
            .map_err(|source| ConfigurationError::InvalidBounds {
                name: self.name.clone(),
                source,
            })?;
        if self.read_only {
            param = param.with_status(ParameterStatus::read_only());
        }
        Ok(param)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub snapshots_location: PathBuf,
    pub store: StoreSettings,
    pub derived: Vec<DerivedDefinition>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            snapshots_location: PathBuf::from(DEFAULT_SNAPSHOTS_LOCATION),
            store: StoreSettings::default(),
            derived: Vec::new(),
        }
    }
}

impl ControllerConfig {
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&source)?;
        info!("configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load `path`, falling back to defaults when it is missing or broken
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                warn!("no configuration at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                error!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Parameters declared in `[[derived]]` tables
    pub fn derived_parameters(&self) -> Result<Vec<Parameter>, ConfigurationError> {
        self.derived.iter().map(DerivedDefinition::to_parameter).collect()
    }
}
