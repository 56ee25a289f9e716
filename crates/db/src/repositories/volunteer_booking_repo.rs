//! Repository for the `volunteer_bookings` table (volunteer ledger).

use chrono::NaiveDate;
use pantry_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::status::StatusId;
use crate::models::volunteer_booking::VolunteerBookingRow;

const COLUMNS: &str = "id, volunteer_id, slot_id, date, status_id, note, staff_note, reason, \
     recurring_id, reschedule_token, created_at, updated_at";

/// Insert payload for a volunteer booking.
#[derive(Debug, Clone)]
pub struct NewVolunteerBooking {
    pub volunteer_id: DbId,
    pub slot_id: DbId,
    pub date: NaiveDate,
    pub status_id: StatusId,
    pub note: Option<String>,
    pub recurring_id: Option<DbId>,
    pub reschedule_token: String,
}

pub struct VolunteerBookingRepo;

impl VolunteerBookingRepo {
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<VolunteerBookingRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM volunteer_bookings WHERE id = $1");
        sqlx::query_as::<_, VolunteerBookingRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<VolunteerBookingRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM volunteer_bookings WHERE reschedule_token = $1");
        sqlx::query_as::<_, VolunteerBookingRow>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    pub async fn for_volunteer_on(
        conn: &mut PgConnection,
        volunteer_id: DbId,
        date: NaiveDate,
        status_ids: &[StatusId],
    ) -> Result<Vec<VolunteerBookingRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM volunteer_bookings \
             WHERE volunteer_id = $1 AND date = $2 AND status_id = ANY($3) ORDER BY id"
        );
        sqlx::query_as::<_, VolunteerBookingRow>(&query)
            .bind(volunteer_id)
            .bind(date)
            .bind(status_ids)
            .fetch_all(&mut *conn)
            .await
    }

    pub async fn list_for_volunteer(
        pool: &PgPool,
        volunteer_id: DbId,
        from: NaiveDate,
    ) -> Result<Vec<VolunteerBookingRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM volunteer_bookings \
             WHERE volunteer_id = $1 AND date >= $2 ORDER BY date, id"
        );
        sqlx::query_as::<_, VolunteerBookingRow>(&query)
            .bind(volunteer_id)
            .bind(from)
            .fetch_all(pool)
            .await
    }

    pub async fn list_for_date(
        pool: &PgPool,
        date: NaiveDate,
    ) -> Result<Vec<VolunteerBookingRow>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM volunteer_bookings WHERE date = $1 ORDER BY slot_id, id");
        sqlx::query_as::<_, VolunteerBookingRow>(&query)
            .bind(date)
            .fetch_all(pool)
            .await
    }

    pub async fn list_for_series(
        pool: &PgPool,
        recurring_id: DbId,
    ) -> Result<Vec<VolunteerBookingRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM volunteer_bookings WHERE recurring_id = $1 ORDER BY date, id"
        );
        sqlx::query_as::<_, VolunteerBookingRow>(&query)
            .bind(recurring_id)
            .fetch_all(pool)
            .await
    }

    /// `(shift_id, count)` of bookings in `status_ids` on `date`.
    pub async fn occupancy(
        pool: &PgPool,
        date: NaiveDate,
        status_ids: &[StatusId],
    ) -> Result<Vec<(DbId, i64)>, sqlx::Error> {
        sqlx::query_as(
            "SELECT slot_id, COUNT(*) FROM volunteer_bookings \
             WHERE date = $1 AND status_id = ANY($2) GROUP BY slot_id",
        )
        .bind(date)
        .bind(status_ids)
        .fetch_all(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Transaction-scoped
    // -----------------------------------------------------------------------

    pub async fn lock(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<VolunteerBookingRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM volunteer_bookings WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, VolunteerBookingRow>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    pub async fn count_for_shift(
        conn: &mut PgConnection,
        shift_id: DbId,
        date: NaiveDate,
        status_ids: &[StatusId],
        exclude: Option<DbId>,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM volunteer_bookings \
             WHERE slot_id = $1 AND date = $2 AND status_id = ANY($3) \
               AND ($4::BIGINT IS NULL OR id <> $4)",
        )
        .bind(shift_id)
        .bind(date)
        .bind(status_ids)
        .bind(exclude)
        .fetch_one(&mut *conn)
        .await?;
        Ok(count)
    }

    pub async fn insert(
        conn: &mut PgConnection,
        input: &NewVolunteerBooking,
    ) -> Result<VolunteerBookingRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO volunteer_bookings
                (volunteer_id, slot_id, date, status_id, note, recurring_id, reschedule_token)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VolunteerBookingRow>(&query)
            .bind(input.volunteer_id)
            .bind(input.slot_id)
            .bind(input.date)
            .bind(input.status_id)
            .bind(&input.note)
            .bind(input.recurring_id)
            .bind(&input.reschedule_token)
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn set_status(
        conn: &mut PgConnection,
        id: DbId,
        from: StatusId,
        to: StatusId,
        reason: Option<&str>,
    ) -> Result<Option<VolunteerBookingRow>, sqlx::Error> {
        let query = format!(
            "UPDATE volunteer_bookings SET
                status_id = $3,
                reason = COALESCE($4, reason),
                updated_at = NOW()
             WHERE id = $1 AND status_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VolunteerBookingRow>(&query)
            .bind(id)
            .bind(from)
            .bind(to)
            .bind(reason)
            .fetch_optional(&mut *conn)
            .await
    }

    pub async fn move_to(
        conn: &mut PgConnection,
        id: DbId,
        shift_id: DbId,
        date: NaiveDate,
    ) -> Result<VolunteerBookingRow, sqlx::Error> {
        let query = format!(
            "UPDATE volunteer_bookings SET slot_id = $2, date = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VolunteerBookingRow>(&query)
            .bind(id)
            .bind(shift_id)
            .bind(date)
            .fetch_one(&mut *conn)
            .await
    }
}
