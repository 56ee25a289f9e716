//! Authentication primitives.
//!
//! - [`jwt`] -- access-token validation (tokens are minted by the identity
//!   provider; [`jwt::generate_access_token`] exists for tooling and tests).

pub mod jwt;
