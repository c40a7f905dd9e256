//! Persistence adapter: typed accessors over the secure store.
//!
//! One storage key per session field. Writing `None` deletes the key
//! rather than storing an empty string, so "absent" has exactly one
//! representation. Reads attempt a JSON parse first and fall back to the
//! raw string, letting plain strings and structured values share one code
//! path (older client versions stored some fields both ways).

use std::sync::Arc;

use serde_json::Value;

use okul_core::prelude::*;
use okul_core::UserRole;

use crate::store::SecureStore;

/// Storage key names, shared with the original client so an upgraded app
/// restores sessions written by previous versions.
pub mod keys {
    pub const ACCESS_TOKEN: &str = "accessToken";
    pub const REFRESH_TOKEN: &str = "refreshToken";
    pub const ROLE: &str = "role";
    pub const USER: &str = "user";
    pub const TENANT_CODE: &str = "schoolCode";
    pub const TENANT_PHOTO: &str = "schoolPhoto";
    pub const THEME: &str = "theme";

    /// Keys cleared by logout. `theme` is deliberately not here: the theme
    /// choice is app-level and survives sign-out.
    pub const SESSION_KEYS: &[&str] = &[
        ACCESS_TOKEN,
        REFRESH_TOKEN,
        ROLE,
        USER,
        TENANT_CODE,
        TENANT_PHOTO,
    ];
}

/// Typed wrapper over the [`SecureStore`] for each session field.
///
/// Callers never touch the store directly; every field has a paired
/// setter/getter here.
#[derive(Clone)]
pub struct SessionStorage {
    store: Arc<dyn SecureStore>,
}

impl SessionStorage {
    pub fn new(store: Arc<dyn SecureStore>) -> Self {
        Self { store }
    }

    // ─────────────────────────────────────────────────────────
    // Shared read/write paths
    // ─────────────────────────────────────────────────────────

    /// Store a raw string, or delete the key when `value` is `None`.
    async fn save(&self, key: &str, value: Option<&str>) -> Result<()> {
        match value {
            Some(v) => self.store.set(key, v).await,
            None => self.store.delete(key).await,
        }
    }

    /// Read a value as JSON, falling back to a raw string on parse failure.
    ///
    /// A malformed stored value is never an error from this layer: the raw
    /// text comes back as `Value::String`.
    async fn read(&self, key: &str) -> Result<Option<Value>> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(_) => Ok(Some(Value::String(raw))),
        }
    }

    /// Read a field that is semantically a plain string, whichever way it
    /// was stored.
    async fn read_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read(key).await?.map(|value| match value {
            Value::String(s) => s,
            other => other.to_string(),
        }))
    }

    // ─────────────────────────────────────────────────────────
    // Credentials
    // ─────────────────────────────────────────────────────────

    pub async fn set_access_token(&self, token: Option<&str>) -> Result<()> {
        self.save(keys::ACCESS_TOKEN, token).await
    }

    pub async fn access_token(&self) -> Result<Option<String>> {
        self.read_string(keys::ACCESS_TOKEN).await
    }

    pub async fn set_refresh_token(&self, token: Option<&str>) -> Result<()> {
        self.save(keys::REFRESH_TOKEN, token).await
    }

    pub async fn refresh_token(&self) -> Result<Option<String>> {
        self.read_string(keys::REFRESH_TOKEN).await
    }

    // ─────────────────────────────────────────────────────────
    // Role and profile
    // ─────────────────────────────────────────────────────────

    pub async fn set_role(&self, role: Option<UserRole>) -> Result<()> {
        self.save(keys::ROLE, role.map(|r| r.as_str())).await
    }

    /// Read the stored role. An unrecognized role string is logged and
    /// treated as absent; it must not abort a restore.
    pub async fn role(&self) -> Result<Option<UserRole>> {
        let Some(raw) = self.read_string(keys::ROLE).await? else {
            return Ok(None);
        };
        match raw.parse::<UserRole>() {
            Ok(role) => Ok(Some(role)),
            Err(_) => {
                warn!(value = %raw, "stored role not recognized, treating as absent");
                Ok(None)
            }
        }
    }

    pub async fn set_user(&self, user: Option<&Value>) -> Result<()> {
        let serialized = match user {
            Some(value) => Some(serde_json::to_string(value)?),
            None => None,
        };
        self.save(keys::USER, serialized.as_deref()).await
    }

    /// Last-known profile payload. Opaque to this core; screens consume it.
    pub async fn user(&self) -> Result<Option<Value>> {
        self.read(keys::USER).await
    }

    // ─────────────────────────────────────────────────────────
    // Tenant selection
    // ─────────────────────────────────────────────────────────

    pub async fn set_tenant_code(&self, code: Option<&str>) -> Result<()> {
        self.save(keys::TENANT_CODE, code).await
    }

    pub async fn tenant_code(&self) -> Result<Option<String>> {
        self.read_string(keys::TENANT_CODE).await
    }

    pub async fn set_tenant_photo(&self, photo: Option<&str>) -> Result<()> {
        self.save(keys::TENANT_PHOTO, photo).await
    }

    pub async fn tenant_photo(&self) -> Result<Option<String>> {
        self.read_string(keys::TENANT_PHOTO).await
    }

    // ─────────────────────────────────────────────────────────
    // App-level values
    // ─────────────────────────────────────────────────────────

    pub async fn set_theme(&self, theme: Option<&str>) -> Result<()> {
        self.save(keys::THEME, theme).await
    }

    pub async fn theme(&self) -> Result<Option<String>> {
        self.read_string(keys::THEME).await
    }

    // ─────────────────────────────────────────────────────────
    // Bulk clear
    // ─────────────────────────────────────────────────────────

    /// Delete every session key ([`keys::SESSION_KEYS`]).
    ///
    /// Individual failures are logged and skipped so that one stubborn key
    /// cannot leave the rest of the session behind. Deleting keys that are
    /// already absent is harmless, which is what makes logout idempotent.
    pub async fn clear_session(&self) {
        for key in keys::SESSION_KEYS {
            if let Err(e) = self.store.delete(key).await {
                warn!(key, error = %e, "failed to clear session key");
            }
        }
    }
}
