//! okul-session - Authentication session lifecycle for the Okul client
//!
//! Owns the process-wide [`SessionRecord`]: restoring it from secure
//! storage at boot, the `login`/`logout`/`update_tenant` mutations,
//! best-effort push-token coordination, and the decoupling hooks that let
//! the HTTP layer (401 responses) and UI subsystems (logout reset)
//! interact with the session without compile-time cycles.

pub mod hooks;
pub mod manager;
pub mod persist;
pub mod push;
pub mod record;
pub mod settings;
pub mod store;

// Re-export primary types
pub use hooks::{ResetCallback, UnauthorizedHook};
pub use manager::SessionManager;
pub use persist::{keys, SessionStorage};
pub use push::{IdentityGateway, PushGateway, PushIdentity, PushRegistration};
pub use record::{LoginUpdate, SessionRecord};
pub use settings::{load_settings, save_settings, SessionSettings};
pub use store::{FileStore, MemoryStore, SecureStore};

// Re-export core types used throughout the public API
pub use okul_core::{Error, Result, UserRole};
