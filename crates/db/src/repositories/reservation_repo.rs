//! Repository for the `reservations` table (shopper ledger).

use chrono::NaiveDate;
use pantry_core::booking::Subject;
use pantry_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::reservation::ReservationRow;
use crate::models::status::StatusId;

const COLUMNS: &str = "id, client_id, new_client_id, slot_id, date, status_id, note, \
     staff_note, reason, reschedule_token, created_at, updated_at";

/// Insert payload for a reservation.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub client_id: Option<DbId>,
    pub new_client_id: Option<DbId>,
    pub slot_id: DbId,
    pub date: NaiveDate,
    pub status_id: StatusId,
    pub note: Option<String>,
    pub reschedule_token: String,
}

/// Column identifying the subject (`client_id` or `new_client_id`).
fn subject_column(subject: Subject) -> &'static str {
    match subject {
        Subject::NewClient(_) => "new_client_id",
        _ => "client_id",
    }
}

pub struct ReservationRepo;

impl ReservationRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ReservationRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reservations WHERE id = $1");
        sqlx::query_as::<_, ReservationRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<ReservationRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reservations WHERE reschedule_token = $1");
        sqlx::query_as::<_, ReservationRow>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// The subject's reservations on `date` whose status is in `status_ids`.
    pub async fn for_subject_on(
        conn: &mut PgConnection,
        subject: Subject,
        date: NaiveDate,
        status_ids: &[StatusId],
    ) -> Result<Vec<ReservationRow>, sqlx::Error> {
        let column = subject_column(subject);
        let query = format!(
            "SELECT {COLUMNS} FROM reservations \
             WHERE {column} = $1 AND date = $2 AND status_id = ANY($3) \
             ORDER BY id"
        );
        sqlx::query_as::<_, ReservationRow>(&query)
            .bind(subject.id())
            .bind(date)
            .bind(status_ids)
            .fetch_all(&mut *conn)
            .await
    }

    /// All of a subject's reservations from `from` onward, by date.
    pub async fn list_for_subject(
        pool: &PgPool,
        subject: Subject,
        from: NaiveDate,
    ) -> Result<Vec<ReservationRow>, sqlx::Error> {
        let column = subject_column(subject);
        let query = format!(
            "SELECT {COLUMNS} FROM reservations \
             WHERE {column} = $1 AND date >= $2 ORDER BY date, id"
        );
        sqlx::query_as::<_, ReservationRow>(&query)
            .bind(subject.id())
            .bind(from)
            .fetch_all(pool)
            .await
    }

    pub async fn list_for_date(
        pool: &PgPool,
        date: NaiveDate,
    ) -> Result<Vec<ReservationRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reservations WHERE date = $1 ORDER BY slot_id, id");
        sqlx::query_as::<_, ReservationRow>(&query)
            .bind(date)
            .fetch_all(pool)
            .await
    }

    /// `(slot_id, count)` of reservations in `status_ids` on `date`.
    pub async fn occupancy(
        pool: &PgPool,
        date: NaiveDate,
        status_ids: &[StatusId],
    ) -> Result<Vec<(DbId, i64)>, sqlx::Error> {
        sqlx::query_as(
            "SELECT slot_id, COUNT(*) FROM reservations \
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

    /// Lock a reservation row for the rest of the transaction.
    pub async fn lock(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<ReservationRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reservations WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, ReservationRow>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Count reservations in `status_ids` for one slot and date, skipping
    /// `exclude`.
    pub async fn count_for_slot(
        conn: &mut PgConnection,
        slot_id: DbId,
        date: NaiveDate,
        status_ids: &[StatusId],
        exclude: Option<DbId>,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM reservations \
             WHERE slot_id = $1 AND date = $2 AND status_id = ANY($3) \
               AND ($4::BIGINT IS NULL OR id <> $4)",
        )
        .bind(slot_id)
        .bind(date)
        .bind(status_ids)
        .bind(exclude)
        .fetch_one(&mut *conn)
        .await?;
        Ok(count)
    }

    pub async fn insert(
        conn: &mut PgConnection,
        input: &NewReservation,
    ) -> Result<ReservationRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO reservations
                (client_id, new_client_id, slot_id, date, status_id, note, reschedule_token)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ReservationRow>(&query)
            .bind(input.client_id)
            .bind(input.new_client_id)
            .bind(input.slot_id)
            .bind(input.date)
            .bind(input.status_id)
            .bind(&input.note)
            .bind(&input.reschedule_token)
            .fetch_one(&mut *conn)
            .await
    }

    /// Compare-and-set the status. Returns `None` if the row is missing or
    /// no longer in `from`.
    pub async fn set_status(
        conn: &mut PgConnection,
        id: DbId,
        from: StatusId,
        to: StatusId,
        reason: Option<&str>,
    ) -> Result<Option<ReservationRow>, sqlx::Error> {
        let query = format!(
            "UPDATE reservations SET
                status_id = $3,
                reason = COALESCE($4, reason),
                updated_at = NOW()
             WHERE id = $1 AND status_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ReservationRow>(&query)
            .bind(id)
            .bind(from)
            .bind(to)
            .bind(reason)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Point a locked reservation at a new slot and date.
    pub async fn move_to(
        conn: &mut PgConnection,
        id: DbId,
        slot_id: DbId,
        date: NaiveDate,
    ) -> Result<ReservationRow, sqlx::Error> {
        let query = format!(
            "UPDATE reservations SET slot_id = $2, date = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ReservationRow>(&query)
            .bind(id)
            .bind(slot_id)
            .bind(date)
            .fetch_one(&mut *conn)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_ins_are_keyed_by_new_client_id() {
        assert_eq!(subject_column(Subject::NewClient(1)), "new_client_id");
        assert_eq!(subject_column(Subject::Client(1)), "client_id");
    }
}
