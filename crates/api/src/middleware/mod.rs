//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the caller from a JWT Bearer token.
//! - [`rbac::RequireStaff`] -- Requires the `staff` role.

pub mod auth;
pub mod rbac;
