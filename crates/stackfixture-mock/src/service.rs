//! Activation state shared by every mocked service.
//!
//! A service starts inactive. While inactive every call fails with
//! [`BackendError::ServiceInactive`]; deactivating discards all state so the
//! next activation starts empty.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use stackfixture_common::error::BackendError;

#[derive(Debug, Default)]
struct ServiceState<T> {
    active: bool,
    data: T,
}

/// Clonable handle to one mocked service's state.
pub(crate) struct Service<T> {
    name: &'static str,
    state: Arc<Mutex<ServiceState<T>>>,
}

impl<T> Clone for Service<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> fmt::Debug for Service<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("active", &self.state.lock().active)
            .finish_non_exhaustive()
    }
}

impl<T: Default> Service<T> {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Arc::new(Mutex::new(ServiceState::default())),
        }
    }

    /// Activates the service. Returns `false` if it was already active.
    pub(crate) fn start(&self) -> bool {
        let mut state = self.state.lock();
        if state.active {
            return false;
        }
        state.active = true;
        tracing::debug!(service = self.name, "mock service activated");
        true
    }

    /// Deactivates the service and discards everything it held.
    pub(crate) fn stop(&self) {
        let mut state = self.state.lock();
        if state.active {
            tracing::debug!(service = self.name, "mock service deactivated");
        }
        *state = ServiceState::default();
    }

    pub(crate) fn is_active(&self) -> bool {
        self.state.lock().active
    }

    /// Runs `f` against the service data, failing if the service is inactive.
    pub(crate) fn with<R>(
        &self,
        f: impl FnOnce(&mut T) -> Result<R, BackendError>,
    ) -> Result<R, BackendError> {
        let mut state = self.state.lock();
        if !state.active {
            return Err(BackendError::ServiceInactive { service: self.name });
        }
        f(&mut state.data)
    }
}
