//! Status helper enums mapping to SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` database table.

use pantry_core::booking::BookingKind;
use pantry_core::status::{occupying_statuses, BookingStatus};

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Map a database status ID back to the enum.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( x if x == $val => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Shopper reservation status (`reservation_statuses`).
    ReservationStatus {
        Approved = 1,
        Cancelled = 2,
        NoShow = 3,
        Visited = 4,
        Expired = 5,
    }
}

define_status_enum! {
    /// Volunteer booking status (`volunteer_booking_statuses`).
    VolunteerBookingStatus {
        Pending = 1,
        Approved = 2,
        Rejected = 3,
        Cancelled = 4,
        NoShow = 5,
        Completed = 6,
        Expired = 7,
    }
}

impl From<ReservationStatus> for BookingStatus {
    fn from(value: ReservationStatus) -> Self {
        match value {
            ReservationStatus::Approved => BookingStatus::Approved,
            ReservationStatus::Cancelled => BookingStatus::Cancelled,
            ReservationStatus::NoShow => BookingStatus::NoShow,
            ReservationStatus::Visited => BookingStatus::Visited,
            ReservationStatus::Expired => BookingStatus::Expired,
        }
    }
}

impl TryFrom<BookingStatus> for ReservationStatus {
    type Error = BookingStatus;

    fn try_from(value: BookingStatus) -> Result<Self, Self::Error> {
        match value {
            BookingStatus::Approved => Ok(ReservationStatus::Approved),
            BookingStatus::Cancelled => Ok(ReservationStatus::Cancelled),
            BookingStatus::NoShow => Ok(ReservationStatus::NoShow),
            BookingStatus::Visited => Ok(ReservationStatus::Visited),
            BookingStatus::Expired => Ok(ReservationStatus::Expired),
            other => Err(other),
        }
    }
}

impl From<VolunteerBookingStatus> for BookingStatus {
    fn from(value: VolunteerBookingStatus) -> Self {
        match value {
            VolunteerBookingStatus::Pending => BookingStatus::Pending,
            VolunteerBookingStatus::Approved => BookingStatus::Approved,
            VolunteerBookingStatus::Rejected => BookingStatus::Rejected,
            VolunteerBookingStatus::Cancelled => BookingStatus::Cancelled,
            VolunteerBookingStatus::NoShow => BookingStatus::NoShow,
            VolunteerBookingStatus::Completed => BookingStatus::Completed,
            VolunteerBookingStatus::Expired => BookingStatus::Expired,
        }
    }
}

impl TryFrom<BookingStatus> for VolunteerBookingStatus {
    type Error = BookingStatus;

    fn try_from(value: BookingStatus) -> Result<Self, Self::Error> {
        match value {
            BookingStatus::Pending => Ok(VolunteerBookingStatus::Pending),
            BookingStatus::Approved => Ok(VolunteerBookingStatus::Approved),
            BookingStatus::Rejected => Ok(VolunteerBookingStatus::Rejected),
            BookingStatus::Cancelled => Ok(VolunteerBookingStatus::Cancelled),
            BookingStatus::NoShow => Ok(VolunteerBookingStatus::NoShow),
            BookingStatus::Completed => Ok(VolunteerBookingStatus::Completed),
            BookingStatus::Expired => Ok(VolunteerBookingStatus::Expired),
            other => Err(other),
        }
    }
}

/// `status_id` column value for `status` in the given ledger's table.
pub fn status_id_for(kind: BookingKind, status: BookingStatus) -> Option<StatusId> {
    match kind {
        BookingKind::Shopper => ReservationStatus::try_from(status).ok().map(|s| s.id()),
        BookingKind::Volunteer => VolunteerBookingStatus::try_from(status).ok().map(|s| s.id()),
    }
}

/// Domain status for a `status_id` read from the given ledger's table.
pub fn booking_status_for(kind: BookingKind, id: StatusId) -> Option<BookingStatus> {
    match kind {
        BookingKind::Shopper => ReservationStatus::from_id(id).map(Into::into),
        BookingKind::Volunteer => VolunteerBookingStatus::from_id(id).map(Into::into),
    }
}

/// Status ids that count against capacity, for `status_id = ANY($n)`.
pub fn occupying_ids(kind: BookingKind) -> Vec<StatusId> {
    occupying_statuses(kind)
        .iter()
        .filter_map(|s| status_id_for(kind, *s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservation_status_ids_match_seed_data() {
        assert_eq!(ReservationStatus::Approved.id(), 1);
        assert_eq!(ReservationStatus::Cancelled.id(), 2);
        assert_eq!(ReservationStatus::NoShow.id(), 3);
        assert_eq!(ReservationStatus::Visited.id(), 4);
        assert_eq!(ReservationStatus::Expired.id(), 5);
    }

    #[test]
    fn volunteer_status_ids_match_seed_data() {
        assert_eq!(VolunteerBookingStatus::Pending.id(), 1);
        assert_eq!(VolunteerBookingStatus::Approved.id(), 2);
        assert_eq!(VolunteerBookingStatus::Rejected.id(), 3);
        assert_eq!(VolunteerBookingStatus::Cancelled.id(), 4);
        assert_eq!(VolunteerBookingStatus::NoShow.id(), 5);
        assert_eq!(VolunteerBookingStatus::Completed.id(), 6);
        assert_eq!(VolunteerBookingStatus::Expired.id(), 7);
    }

    #[test]
    fn from_id_round_trips_and_rejects_unknown() {
        assert_eq!(ReservationStatus::from_id(4), Some(ReservationStatus::Visited));
        assert_eq!(ReservationStatus::from_id(0), None);
        assert_eq!(VolunteerBookingStatus::from_id(8), None);
    }

    #[test]
    fn shopper_never_pending() {
        assert_eq!(
            ReservationStatus::try_from(BookingStatus::Pending),
            Err(BookingStatus::Pending)
        );
        assert!(VolunteerBookingStatus::try_from(BookingStatus::Visited).is_err());
    }

    #[test]
    fn every_occupying_status_has_a_column_value() {
        for s in occupying_statuses(BookingKind::Shopper) {
            assert!(ReservationStatus::try_from(*s).is_ok(), "{s}");
        }
        for s in occupying_statuses(BookingKind::Volunteer) {
            assert!(VolunteerBookingStatus::try_from(*s).is_ok(), "{s}");
        }
    }

    #[test]
    fn occupying_ids_per_ledger() {
        assert_eq!(occupying_ids(BookingKind::Shopper), vec![1, 4, 3]);
        assert_eq!(occupying_ids(BookingKind::Volunteer), vec![1, 2, 6, 5]);
    }

    #[test]
    fn ledger_specific_mapping() {
        assert_eq!(status_id_for(BookingKind::Shopper, BookingStatus::Cancelled), Some(2));
        assert_eq!(status_id_for(BookingKind::Volunteer, BookingStatus::Cancelled), Some(4));
        assert_eq!(
            booking_status_for(BookingKind::Volunteer, 6),
            Some(BookingStatus::Completed)
        );
        assert_eq!(booking_status_for(BookingKind::Shopper, 6), None);
    }
}
