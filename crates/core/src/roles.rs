//! Well-known role name constants.
//!
//! These must match the `role` claim minted by the identity provider.

pub const ROLE_CLIENT: &str = "client";
pub const ROLE_VOLUNTEER: &str = "volunteer";
pub const ROLE_AGENCY: &str = "agency";
pub const ROLE_STAFF: &str = "staff";

/// Roles allowed to act on bookings they do not own.
pub const PRIVILEGED_ROLES: &[&str] = &[ROLE_STAFF];

/// Whether `role` may manage any booking and record outcomes.
pub fn is_staff(role: &str) -> bool {
    PRIVILEGED_ROLES.contains(&role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_is_privileged() {
        assert!(is_staff(ROLE_STAFF));
    }

    #[test]
    fn other_roles_are_not_privileged() {
        assert!(!is_staff(ROLE_CLIENT));
        assert!(!is_staff(ROLE_VOLUNTEER));
        assert!(!is_staff(ROLE_AGENCY));
        assert!(!is_staff(""));
    }
}
