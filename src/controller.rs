//! Rig controller
//!
//! The business layer in front of the store: external writes go through
//! here so read-only parameters are refused, and snapshots are taken and
//! restored here so persistence never runs under the store lock.

use crate::config::ControllerConfig;
use crate::evaluator::EvaluatorRegistry;
use crate::parameters::{Parameter, Value};
use crate::snapshot::{FileSnapshotBackend, SnapshotBackend, SnapshotError, SnapshotId};
use crate::store::{ParameterStore, StoreError};
use crate::sysparams;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("parameter '{name}' is read-only")]
    ReadOnly { name: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

pub struct Controller {
    store: Arc<ParameterStore>,
    snapshots: Arc<dyn SnapshotBackend>,
}

impl Controller {
    pub fn new(store: Arc<ParameterStore>, snapshots: Arc<dyn SnapshotBackend>) -> Self {
        Self { store, snapshots }
    }

    /// Build the store from the rig definition plus configured derived
    /// parameters, with file snapshots at the configured location
    pub fn from_config(config: &ControllerConfig, registry: &EvaluatorRegistry) -> crate::Result<Self> {
        let store = ParameterStore::with_settings(config.store);

        let mut params = sysparams::system_parameters(registry)?;
        params.extend(config.derived_parameters()?);
        store.load(params)?;

        let snapshots = FileSnapshotBackend::new(&config.snapshots_location)?;
        info!(
            "controller ready: {} parameters, snapshots in {}",
            store.len(),
            config.snapshots_location.display()
        );
        Ok(Self::new(Arc::new(store), Arc::new(snapshots)))
    }

    pub fn store(&self) -> &Arc<ParameterStore> {
        &self.store
    }

    /// All parameters keyed by name
    pub fn get_parameters(&self) -> BTreeMap<String, Parameter> {
        self.store
            .get_parameters()
            .into_iter()
            .map(|p| (p.name().to_string(), p))
            .collect()
    }

    /// Write one parameter on behalf of an external client
    pub fn set_parameter(&self, name: &str, value: impl Into<Value>) -> Result<Parameter, ControllerError> {
        // the read-only check and the write see the same status
        self.store.with_lock(|store| -> Result<Parameter, ControllerError> {
            if store.is_read_only(name)? {
                return Err(ControllerError::ReadOnly {
                    name: name.to_string(),
                });
            }
            store.set(name, value)?;
            Ok(store.get(name)?)
        })
    }

    /// Apply a batch of client-supplied parameters.
    ///
    /// Every writable entry is validated before anything is written, so a
    /// bad entry leaves the store untouched. Read-only entries are skipped.
    /// Returns the applied parameters as stored after their cascades. The
    /// whole batch runs under one store lock.
    pub fn apply_parameters(&self, params: Vec<Parameter>) -> Result<Vec<Parameter>, ControllerError> {
        self.store.with_lock(|store| -> Result<Vec<Parameter>, ControllerError> {
            let mut writable = Vec::with_capacity(params.len());
            for param in params {
                if store.is_read_only(param.name())? {
                    warn!("skipping read-only parameter '{}'", param.name());
                    continue;
                }
                store.validate_parameter(&param)?;
                writable.push(param);
            }

            let mut applied = Vec::with_capacity(writable.len());
            for param in writable {
                debug!("applying {} = {}", param.name(), param.value());
                store.set(param.name(), param.value().clone())?;
                applied.push(store.get(param.name())?);
            }
            Ok(applied)
        })
    }

    /// Save a copy of the current parameter set
    pub fn take_snapshot(&self) -> Result<SnapshotId, ControllerError> {
        let params = self.store.get_parameters();
        let id = self.snapshots.save(&params)?;
        info!("snapshot {} taken ({} parameters)", id, params.len());
        Ok(id)
    }

    pub fn list_snapshots(&self) -> Result<Vec<SnapshotId>, ControllerError> {
        Ok(self.snapshots.list()?)
    }

    pub fn load_snapshot(&self, id: SnapshotId) -> Result<Vec<Parameter>, ControllerError> {
        Ok(self.snapshots.load(id)?)
    }

    pub fn delete_snapshot(&self, id: SnapshotId) -> Result<SnapshotId, ControllerError> {
        Ok(self.snapshots.delete(id)?)
    }

    pub fn delete_all_snapshots(&self) -> Result<Vec<SnapshotId>, ControllerError> {
        Ok(self.snapshots.delete_all()?)
    }

    /// Write back the primary parameters recorded in a snapshot.
    ///
    /// Entries no longer in the store, read-only entries and derived
    /// entries are left out; derived values follow from their inputs.
    pub fn restore_snapshot(&self, id: SnapshotId) -> Result<Vec<Parameter>, ControllerError> {
        let snapshot = self.snapshots.load(id)?;
        let current = self.get_parameters();

        let restorable = snapshot
            .into_iter()
            .filter(|p| match current.get(p.name()) {
                Some(existing) => !existing.is_read_only() && !existing.is_derived(),
                None => {
                    warn!("snapshot {} entry '{}' no longer exists", id, p.name());
                    false
                }
            })
            .collect();

        let applied = self.apply_parameters(restorable)?;
        info!("snapshot {} restored ({} parameters)", id, applied.len());
        Ok(applied)
    }
}
