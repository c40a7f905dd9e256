//! The session manager: owns authentication state and its lifecycle.
//!
//! Responsibilities:
//! - Restoring the session from secure storage at boot
//! - The `login` / `logout` / `update_tenant` mutations
//! - Publishing the current [`SessionRecord`] through a watch channel
//! - Coordinating best-effort push registration with the transitions
//! - Invoking the dependent-subsystem reset callback during logout
//! - Reacting to the HTTP layer's 401 hook with an automatic logout
//!
//! # Concurrency note
//!
//! There is no lock around the record. Operations read the current value,
//! do their storage work, and publish the result; the watch channel's
//! `send_replace` makes a racing `login`/`logout` resolve to
//! last-publish-wins. That is the accepted behavior -- the UI disables
//! concurrent submission in practice, and `restore()` on the next boot
//! recomputes `authenticated` from whatever actually persisted.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use okul_core::prelude::*;
use okul_core::UserRole;

use crate::hooks::{ResetCallback, ResetSlot, UnauthorizedHook};
use crate::persist::SessionStorage;
use crate::push::{self, IdentityGateway, PushGateway};
use crate::record::{LoginUpdate, SessionRecord};
use crate::settings::SessionSettings;
use crate::store::SecureStore;

/// Owns the process-wide session record.
///
/// Cheap to clone; clones share the same state. Handed to the HTTP layer
/// (for the 401 hook) and to any subsystem that needs to read or mutate
/// the session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    storage: SessionStorage,
    push: Arc<dyn PushGateway>,
    identity: Arc<dyn IdentityGateway>,
    record_tx: watch::Sender<SessionRecord>,
    reset: ResetSlot,
    push_timeout: Duration,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SecureStore>,
        push: Arc<dyn PushGateway>,
        identity: Arc<dyn IdentityGateway>,
        settings: &SessionSettings,
    ) -> Self {
        let (record_tx, _) = watch::channel(SessionRecord::booting());
        Self {
            inner: Arc::new(Inner {
                storage: SessionStorage::new(store),
                push,
                identity,
                record_tx,
                reset: ResetSlot::new(),
                push_timeout: settings.push_timeout(),
            }),
        }
    }

    // ─────────────────────────────────────────────────────────
    // Read access
    // ─────────────────────────────────────────────────────────

    /// Snapshot of the current record. After boot, this (not storage) is
    /// ground truth for readers.
    pub fn current(&self) -> SessionRecord {
        self.inner.record_tx.borrow().clone()
    }

    /// Subscribe to record changes. The receiver immediately holds the
    /// current value.
    pub fn subscribe(&self) -> watch::Receiver<SessionRecord> {
        self.inner.record_tx.subscribe()
    }

    /// Typed access to the persistence adapter, for collaborators that
    /// front non-session keys (theme).
    pub fn storage(&self) -> &SessionStorage {
        &self.inner.storage
    }

    fn publish(&self, record: SessionRecord) {
        self.inner.record_tx.send_replace(record);
    }

    // ─────────────────────────────────────────────────────────
    // restore()
    // ─────────────────────────────────────────────────────────

    /// Restore the session from storage. Called exactly once at boot.
    ///
    /// The five reads are independent and issued concurrently. A failed
    /// read is logged and its field treated as absent; `loading` flips to
    /// false unconditionally, including on partial failure. Tenant fields
    /// are surfaced even when unauthenticated, so a tenant-selection
    /// screen can be skipped for a logged-out user.
    pub async fn restore(&self) -> SessionRecord {
        let s = &self.inner.storage;
        let (token, role, user, tenant_code, tenant_photo) = tokio::join!(
            s.access_token(),
            s.role(),
            s.user(),
            s.tenant_code(),
            s.tenant_photo(),
        );

        let mut record = SessionRecord {
            authenticated: false,
            access_token: read_or_absent(token, "accessToken"),
            refresh_token: None,
            role: read_or_absent(role, "role"),
            user: read_or_absent(user, "user"),
            tenant_code: read_or_absent(tenant_code, "schoolCode"),
            tenant_photo: read_or_absent(tenant_photo, "schoolPhoto"),
            loading: false,
        };
        record.recompute_authenticated();

        info!(authenticated = record.authenticated, "session restored");
        self.publish(record.clone());
        record
    }

    // ─────────────────────────────────────────────────────────
    // login()
    // ─────────────────────────────────────────────────────────

    /// Apply a login update.
    ///
    /// Every supplied field is persisted independently -- a failed write
    /// is logged, not rolled back; the next `restore()` reflects whatever
    /// actually persisted. Supplied fields are merged into the in-memory
    /// record, and `authenticated` flips only if the merged record holds
    /// both a token and a role.
    ///
    /// A complete login (token + role supplied) additionally spawns the
    /// detached push-registration task; `login` returns without awaiting
    /// it.
    ///
    /// # Errors
    /// [`Error::LoginContract`] when `access_token` or `role` is missing
    /// from the update. The supplied fields are still persisted and
    /// merged, and `authenticated` stays false.
    pub async fn login(&self, update: LoginUpdate) -> Result<SessionRecord> {
        let complete = update.is_complete();
        let s = &self.inner.storage;

        if let Some(token) = &update.access_token {
            log_persist(s.set_access_token(Some(token)).await, "accessToken");
        }
        if let Some(token) = &update.refresh_token {
            log_persist(s.set_refresh_token(Some(token)).await, "refreshToken");
        }
        if let Some(role) = update.role {
            log_persist(s.set_role(Some(role)).await, "role");
        }
        if let Some(user) = &update.user {
            log_persist(s.set_user(Some(user)).await, "user");
        }
        if let Some(code) = &update.tenant_code {
            log_persist(s.set_tenant_code(Some(code)).await, "schoolCode");
        }

        let mut record = self.current();
        if update.access_token.is_some() {
            record.access_token = update.access_token;
        }
        if update.refresh_token.is_some() {
            record.refresh_token = update.refresh_token;
        }
        if update.role.is_some() {
            record.role = update.role;
        }
        if update.user.is_some() {
            record.user = update.user;
        }
        if update.tenant_code.is_some() {
            record.tenant_code = update.tenant_code;
        }
        record.loading = false;
        record.recompute_authenticated();

        self.publish(record.clone());

        if complete {
            // A new authenticated identity exists; registration is fire
            // and forget with its own error boundary.
            if let Some(role) = record.role {
                self.spawn_push_registration(role);
            }
            info!(role = ?record.role, "logged in");
            Ok(record)
        } else {
            warn!("login update missing access token or role");
            Err(Error::LoginContract)
        }
    }

    fn spawn_push_registration(&self, role: UserRole) {
        let push = self.inner.push.clone();
        let identity = self.inner.identity.clone();
        let limit = self.inner.push_timeout;
        tokio::spawn(async move {
            push::register_device(push.as_ref(), identity.as_ref(), role, limit).await;
        });
    }

    // ─────────────────────────────────────────────────────────
    // logout()
    // ─────────────────────────────────────────────────────────

    /// Tear down the session. Idempotent.
    ///
    /// Step order matters: the push deregistration call is itself
    /// authenticated, so it runs with the pre-clear bearer token before
    /// storage is touched.
    pub async fn logout(&self) {
        // 1. Let the dependent subsystem (navigation drawer) reset its
        //    own transient state. Panics are swallowed by the slot.
        self.inner.reset.invoke();

        // 2. Best-effort push deregistration, bounded by the configured
        //    timeout. Skipped when there is no bearer to authenticate it.
        match self.current().access_token {
            Some(bearer) => {
                push::deregister_device(self.inner.push.as_ref(), &bearer, self.inner.push_timeout)
                    .await;
            }
            None => debug!("no bearer token; skipping push deregistration"),
        }

        // 3. Clear every persisted session field. Theme survives.
        self.inner.storage.clear_session().await;

        // 4. Publish the fully-reset record.
        self.publish(SessionRecord::signed_out());
        info!("logged out");
    }

    // ─────────────────────────────────────────────────────────
    // update_tenant()
    // ─────────────────────────────────────────────────────────

    /// Persist and merge the tenant selection. Never touches
    /// `authenticated`, the token, or the role; valid both before and
    /// after login.
    ///
    /// `photo: None` leaves any stored photo unchanged; only an explicit
    /// value overwrites.
    pub async fn update_tenant(&self, code: &str, photo: Option<&str>) -> SessionRecord {
        let s = &self.inner.storage;
        log_persist(s.set_tenant_code(Some(code)).await, "schoolCode");
        if let Some(photo) = photo {
            log_persist(s.set_tenant_photo(Some(photo)).await, "schoolPhoto");
        }

        let mut record = self.current();
        record.tenant_code = Some(code.to_string());
        if let Some(photo) = photo {
            record.tenant_photo = Some(photo.to_string());
        }

        self.publish(record.clone());
        debug!(tenant = code, "tenant updated");
        record
    }

    // ─────────────────────────────────────────────────────────
    // Decoupling hooks
    // ─────────────────────────────────────────────────────────

    /// Register (or clear, with `None`) the dependent-subsystem reset
    /// callback. At most one is held; last registration wins.
    pub fn register_reset_callback(&self, callback: Option<ResetCallback>) {
        self.inner.reset.register(callback);
    }

    /// Wire `logout()` as the HTTP layer's 401 reaction. The hook's
    /// `notify()` spawns the logout so the HTTP layer never blocks on it.
    pub fn install_unauthorized_hook(&self, hook: &UnauthorizedHook) {
        let manager = self.clone();
        hook.install(move || {
            let manager = manager.clone();
            tokio::spawn(async move {
                manager.logout().await;
            });
        });
    }
}

/// Treat a failed storage read as an absent field, with a log trail.
fn read_or_absent<T>(result: Result<Option<T>>, key: &str) -> Option<T> {
    result.unwrap_or_else(|e| {
        warn!(key, error = %e, "failed to read session field; treating as absent");
        None
    })
}

fn log_persist(result: Result<()>, key: &str) {
    if let Err(e) = result {
        warn!(key, error = %e, "failed to persist session field");
    }
}
