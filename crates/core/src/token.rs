//! Reschedule tokens: unguessable capabilities naming one booking.
//!
//! A token is a lookup index, not a login. Staff-initiated actions still go
//! through subject identity checks.

use rand::Rng;

/// Length of a generated reschedule token (alphanumeric characters).
pub const TOKEN_LENGTH: usize = 32;

/// Generate a fresh reschedule token.
pub fn generate_reschedule_token() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Cheap shape check before hitting storage with a token lookup.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LENGTH && token.chars().all(|c| c.is_ascii_alphanumeric())
}
