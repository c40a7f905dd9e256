//! The in-memory session record: single source of truth for auth state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use okul_core::UserRole;

/// Authentication state of the running app instance.
///
/// Exactly one record exists process-wide, owned by the
/// [`SessionManager`](crate::SessionManager). UI code receives clones
/// through a watch subscription and must treat them as read-only; only the
/// manager's operations mutate the published record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// True iff `access_token` and `role` were both present at the last
    /// successful restore or mutation.
    pub authenticated: bool,

    /// Opaque bearer credential.
    pub access_token: Option<String>,

    /// Opaque renewal credential. Stored but not rotated by this core.
    pub refresh_token: Option<String>,

    /// Flat role tag; drives navigation-stack selection downstream.
    pub role: Option<UserRole>,

    /// Last-known profile payload. Not validated here.
    pub user: Option<Value>,

    /// Tenant (school) selection. Made before login and meaningful even
    /// while unauthenticated.
    pub tenant_code: Option<String>,
    pub tenant_photo: Option<String>,

    /// True only during the initial restore; never true again afterwards.
    pub loading: bool,
}

impl SessionRecord {
    /// The record at process start, before `restore()` has settled.
    pub fn booting() -> Self {
        Self {
            authenticated: false,
            access_token: None,
            refresh_token: None,
            role: None,
            user: None,
            tenant_code: None,
            tenant_photo: None,
            loading: true,
        }
    }

    /// The fully-reset record published by `logout()`.
    pub fn signed_out() -> Self {
        Self {
            loading: false,
            ..Self::booting()
        }
    }

    /// Recompute the derived `authenticated` flag from field presence.
    pub(crate) fn recompute_authenticated(&mut self) {
        self.authenticated = self.access_token.is_some() && self.role.is_some();
    }
}

impl Default for SessionRecord {
    fn default() -> Self {
        Self::booting()
    }
}

/// Input to [`SessionManager::login`](crate::SessionManager::login).
///
/// Every field is optional at the type level so callers can update a
/// subset (a tenant-only write before login, for example), but the login
/// *contract* requires `access_token` and `role` -- without both the call
/// persists what it was given and returns
/// [`Error::LoginContract`](okul_core::Error::LoginContract).
#[derive(Debug, Clone, Default)]
pub struct LoginUpdate {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub role: Option<UserRole>,
    pub user: Option<Value>,
    pub tenant_code: Option<String>,
}

impl LoginUpdate {
    /// A well-formed login carrying the two required fields.
    pub fn new(access_token: impl Into<String>, role: UserRole) -> Self {
        Self {
            access_token: Some(access_token.into()),
            role: Some(role),
            ..Self::default()
        }
    }

    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    pub fn with_user(mut self, user: Value) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_tenant_code(mut self, code: impl Into<String>) -> Self {
        self.tenant_code = Some(code.into());
        self
    }

    /// Whether the update satisfies the login contract.
    pub fn is_complete(&self) -> bool {
        self.access_token.is_some() && self.role.is_some()
    }
}
