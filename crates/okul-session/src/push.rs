//! Push-notification registration coordination.
//!
//! Keeps the remote push endpoint's device-token mapping consistent with
//! the local session without ever being a hard dependency of the session
//! transitions themselves: every call here is best-effort, bounded by a
//! short timeout, and every failure is logged and discarded. `login`
//! spawns registration as a detached task; `logout` awaits deregistration
//! inline because it needs the bearer token before storage is cleared.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use okul_core::prelude::*;
use okul_core::UserRole;

/// Payload submitted to the remote push endpoint.
///
/// The remote side treats a repeated submission as a no-op upsert; this
/// client does not deduplicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRegistration {
    pub token: String,
    pub user_id: i64,
    pub user_type: String,
}

/// Numeric identifier and role-derived category for the signed-in user,
/// resolved from the profile endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushIdentity {
    pub user_id: i64,
    pub user_type: String,
}

/// Port to the device push SDK and the remote token endpoint.
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Obtain the device push token. Fails when the user denied
    /// notification permission or the SDK is unavailable.
    async fn device_token(&self) -> Result<String>;

    /// Submit `{token, user_id, user_type}` to the remote endpoint.
    async fn register(&self, registration: &PushRegistration) -> Result<()>;

    /// Revoke the device token at the remote endpoint. The call is itself
    /// authenticated: `bearer_token` must still be valid when it runs,
    /// which is why logout deregisters before clearing storage.
    async fn revoke(&self, bearer_token: &str, device_token: &str) -> Result<()>;
}

/// Port resolving the push identity from the profile-fetch endpoint.
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    async fn push_identity(&self, role: UserRole) -> Result<PushIdentity>;
}

/// Bound a push-path future so a hung endpoint cannot stall a session
/// transition.
async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::PushTimeout {
            secs: limit.as_secs(),
        }),
    }
}

/// Best-effort device registration after a successful login.
///
/// Runs inside the detached task spawned by `login`; nothing here can
/// surface to the caller. Failure at any step abandons the attempt.
pub(crate) async fn register_device(
    push: &dyn PushGateway,
    identity: &dyn IdentityGateway,
    role: UserRole,
    limit: Duration,
) {
    let attempt = async {
        let token = bounded(limit, push.device_token()).await?;
        let resolved = bounded(limit, identity.push_identity(role)).await?;
        let registration = PushRegistration {
            token,
            user_id: resolved.user_id,
            user_type: resolved.user_type,
        };
        bounded(limit, push.register(&registration)).await?;
        Ok::<_, Error>(registration)
    };

    match attempt.await {
        Ok(registration) => {
            debug!(user_id = registration.user_id, "push token registered");
        }
        Err(e) => {
            warn!(error = %e, "push registration failed; continuing without it");
        }
    }
}

/// Best-effort device deregistration during logout.
///
/// `bearer_token` is the pre-clear credential captured by the manager;
/// passing it explicitly guarantees the ordering the revoke call needs.
pub(crate) async fn deregister_device(push: &dyn PushGateway, bearer_token: &str, limit: Duration) {
    let attempt = async {
        let token = bounded(limit, push.device_token()).await?;
        bounded(limit, push.revoke(bearer_token, &token)).await
    };

    if let Err(e) = attempt.await {
        warn!(error = %e, "push deregistration failed; logout continues");
    }
}
