//! Decoupling hooks: the HTTP 401 registration point and the
//! dependent-subsystem reset callback.
//!
//! Both exist to break compile-time cycles. The HTTP layer must trigger a
//! logout without depending on the session crate's internals, and a UI
//! subsystem (the navigation drawer in the original client) must clear its
//! transient state during logout without the session manager importing UI
//! code. Each is a single mutable slot: last registration wins, `None`
//! clears, and invocation is panic-isolated so a misbehaving callback can
//! never abort a session transition. The callback is cloned out of the
//! slot before it runs, so it may re-enter the slot (a subsystem
//! unmounting during its own reset) without deadlocking.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use okul_core::prelude::*;

/// Callback supplied by a dependent subsystem, invoked during logout.
pub type ResetCallback = Arc<dyn Fn() + Send + Sync>;

/// Single-slot holder for the dependent-subsystem reset callback.
#[derive(Default)]
pub struct ResetSlot {
    slot: Mutex<Option<ResetCallback>>,
}

impl ResetSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback, replacing any previous one. `None` clears the
    /// slot and is safe even when nothing was registered.
    pub fn register(&self, callback: Option<ResetCallback>) {
        let mut slot = self.slot.lock().expect("reset slot mutex poisoned");
        *slot = callback;
    }

    pub fn is_registered(&self) -> bool {
        self.slot
            .lock()
            .expect("reset slot mutex poisoned")
            .is_some()
    }

    /// Invoke the registered callback, if any. Panics are caught and
    /// logged; the caller's state transition continues regardless.
    pub fn invoke(&self) {
        // Clone out of the lock first: the callback may call register()
        // itself, which must not find the mutex held.
        let callback = self
            .slot
            .lock()
            .expect("reset slot mutex poisoned")
            .clone();
        if let Some(callback) = callback {
            if catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
                warn!("reset callback panicked; continuing logout");
            }
        }
    }
}

/// Registration point the HTTP layer calls into on a 401 response.
///
/// The session manager installs its reaction (a spawned logout) via
/// [`SessionManager::install_unauthorized_hook`](crate::SessionManager::install_unauthorized_hook);
/// the HTTP layer only ever calls [`notify`](Self::notify).
#[derive(Default)]
pub struct UnauthorizedHook {
    slot: Mutex<Option<Arc<dyn Fn() + Send + Sync>>>,
}

impl UnauthorizedHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the reaction callback, replacing any previous one.
    pub fn install(&self, callback: impl Fn() + Send + Sync + 'static) {
        let mut slot = self.slot.lock().expect("hook mutex poisoned");
        *slot = Some(Arc::new(callback));
    }

    pub fn clear(&self) {
        let mut slot = self.slot.lock().expect("hook mutex poisoned");
        *slot = None;
    }

    pub fn is_installed(&self) -> bool {
        self.slot.lock().expect("hook mutex poisoned").is_some()
    }

    /// Called by the HTTP layer, once per detected 401. A notify with no
    /// installed callback is a no-op.
    pub fn notify(&self) {
        // Same discipline as the reset slot: never hold the mutex across
        // the callback, which may install or clear the hook itself.
        let callback = self.slot.lock().expect("hook mutex poisoned").clone();
        match callback {
            Some(callback) => {
                if catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
                    warn!("unauthorized hook callback panicked");
                }
            }
            None => debug!("401 received but no unauthorized hook installed"),
        }
    }
}
