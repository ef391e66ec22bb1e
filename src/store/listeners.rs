//! Change notification bus
//!
//! An ordered set of callbacks invoked with the updated parameter after
//! every notifying write. Identity is the `Arc` allocation: registering the
//! same `Arc` twice is a no-op.

use crate::parameters::Parameter;
use crate::store::StoreError;
use log::{debug, warn};
use parking_lot::Mutex;
use std::sync::Arc;

/// Callback invoked on every notifying change.
///
/// An error returned by a listener aborts the write that fired it and is
/// handed back to the caller unchanged.
pub type Listener = Arc<dyn Fn(&Parameter) -> Result<(), StoreError> + Send + Sync>;

#[derive(Default)]
pub struct ChangeListeners {
    listeners: Mutex<Vec<Listener>>,
}

fn same(a: &Listener, b: &Listener) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

impl ChangeListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; returns `false` if it was already registered
    pub fn add(&self, listener: Listener) -> bool {
        let mut listeners = self.listeners.lock();
        if listeners.iter().any(|l| same(l, &listener)) {
            warn!("listener already registered");
            return false;
        }
        listeners.push(listener);
        debug!("listener added ({} registered)", listeners.len());
        true
    }

    /// Unregister a listener; returns `false` if it was not registered
    pub fn remove(&self, listener: &Listener) -> bool {
        let mut listeners = self.listeners.lock();
        match listeners.iter().position(|l| same(l, listener)) {
            Some(index) => {
                listeners.remove(index);
                true
            }
            None => {
                warn!("attempted to remove a listener that is not registered");
                false
            }
        }
    }

    /// Invoke every listener in registration order.
    ///
    /// The list is copied before dispatch, so listeners may add or remove
    /// listeners (or write to the store) without deadlocking.
    pub fn fire(&self, parameter: &Parameter) -> Result<(), StoreError> {
        let listeners: Vec<Listener> = self.listeners.lock().clone();
        for listener in listeners {
            listener(parameter)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }

    pub fn clear(&self) {
        self.listeners.lock().clear();
    }
}
