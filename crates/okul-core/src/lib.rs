//! # okul-core - Core Domain Types
//!
//! Foundation crate for the Okul mobile client. Provides shared domain
//! types, error handling, and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on
//! external crates (serde, serde_json, thiserror, the tracing stack).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`UserRole`] - Role tag of the signed-in user (admin, teacher, parent)
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `environmental` vs `contract` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use okul_core::prelude::*;
//! ```

pub mod error;
pub mod logging;
pub mod types;

/// Prelude for common imports used throughout all Okul crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

pub use error::{Error, Result, ResultExt};
pub use types::UserRole;
