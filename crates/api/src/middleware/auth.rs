//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use pantry_core::booking::{BookingKind, Subject};
use pantry_core::error::CoreError;
use pantry_core::roles::{self, ROLE_AGENCY, ROLE_CLIENT, ROLE_VOLUNTEER};
use pantry_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated caller extracted from a JWT Bearer token in the
/// `Authorization` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Id of the client, volunteer, agency or staff account (`claims.sub`).
    pub user_id: DbId,
    pub role: String,
}

impl AuthUser {
    pub fn is_staff(&self) -> bool {
        roles::is_staff(&self.role)
    }

    /// The subject this caller books as in `kind`'s ledger, if any.
    pub fn own_subject(&self, kind: BookingKind) -> Option<Subject> {
        match (self.role.as_str(), kind) {
            (ROLE_CLIENT, BookingKind::Shopper) => Some(Subject::Client(self.user_id)),
            (ROLE_VOLUNTEER, BookingKind::Volunteer) => Some(Subject::Volunteer(self.user_id)),
            _ => None,
        }
    }

    /// Whether this caller may create or manage bookings held by `subject`.
    ///
    /// Staff act for anyone; agencies act for shoppers; everyone else only
    /// for themselves.
    pub fn may_act_for(&self, subject: Subject) -> bool {
        if self.is_staff() {
            return true;
        }
        if self.role == ROLE_AGENCY {
            return subject.kind() == BookingKind::Shopper;
        }
        self.own_subject(subject.kind()) == Some(subject)
    }

    /// [`may_act_for`](Self::may_act_for) as a 403 rejection.
    pub fn ensure_may_act_for(&self, subject: Subject) -> Result<(), AppError> {
        if self.may_act_for(subject) {
            Ok(())
        } else {
            Err(AppError::Core(CoreError::Forbidden(format!(
                "Not allowed to act for {subject}"
            ))))
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}
