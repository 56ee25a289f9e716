use chrono::NaiveDate;

use crate::booking::{Booking, RequestDescriptor, SlotRef};
use crate::status::BookingStatus;
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures of the booking engine, returned as typed results to the caller.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// Holiday, weekend, blocked slot, break or elapsed time. Not retryable
    /// for this date.
    #[error("{target} is closed on {date}: {reason}")]
    SlotClosed {
        target: SlotRef,
        date: NaiveDate,
        reason: String,
    },

    /// Capacity exhausted at claim time. The caller may pick another slot.
    #[error("{target} is full on {date}")]
    SlotFull { target: SlotRef, date: NaiveDate },

    /// The subject already holds an overlapping live booking that day.
    #[error("{} already holds booking {} overlapping the requested time", .attempted.request.subject, .existing.id)]
    DuplicateActiveBooking {
        existing: Box<Booking>,
        attempted: Box<RequestDescriptor>,
    },

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Malformed request (bad recurrence rule, subject/slot kind mismatch).
    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl BookingError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        BookingError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Short reason used in recurrence `skipped` lists and API error codes.
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::SlotClosed { .. } => "SLOT_CLOSED",
            BookingError::SlotFull { .. } => "SLOT_FULL",
            BookingError::DuplicateActiveBooking { .. } => "DUPLICATE_ACTIVE_BOOKING",
            BookingError::InvalidTransition { .. } => "INVALID_TRANSITION",
            BookingError::NotFound { .. } => "NOT_FOUND",
            BookingError::Invalid(_) => "VALIDATION_ERROR",
            BookingError::Storage(_) => "INTERNAL_ERROR",
        }
    }

    /// Per-date failures a recurring series records and skips past.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            BookingError::SlotClosed { .. }
                | BookingError::SlotFull { .. }
                | BookingError::DuplicateActiveBooking { .. }
        )
    }
}

/// Result alias for engine and store operations.
pub type BookingResult<T> = Result<T, BookingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_message_carries_reason() {
        let err = BookingError::SlotClosed {
            target: SlotRef::Shopper(2),
            date: NaiveDate::from_ymd_opt(2024, 12, 25).unwrap(),
            reason: "Christmas".into(),
        };
        assert_eq!(err.to_string(), "slot:2 is closed on 2024-12-25: Christmas");
        assert_eq!(err.code(), "SLOT_CLOSED");
        assert!(err.is_skippable());
    }

    #[test]
    fn transition_errors_are_not_skippable() {
        let err = BookingError::InvalidTransition {
            from: BookingStatus::Visited,
            to: BookingStatus::Cancelled,
        };
        assert!(!err.is_skippable());
        assert_eq!(err.to_string(), "Invalid transition: visited -> cancelled");
    }

    #[test]
    fn not_found_helper_formats_key() {
        let err = BookingError::not_found("Slot", 9);
        assert_eq!(err.to_string(), "Slot not found: 9");
    }
}
