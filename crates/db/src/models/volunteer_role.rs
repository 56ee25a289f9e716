//! Volunteer roles and their shifts (`volunteer_roles`, `volunteer_slots`).

use chrono::NaiveTime;
use pantry_core::catalog::VolunteerRoleShift;
use pantry_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `volunteer_roles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VolunteerRoleRow {
    pub id: DbId,
    pub name: String,
    pub categories: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A shift joined with its role, as the catalog needs it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VolunteerShiftRow {
    pub shift_id: DbId,
    pub role_id: DbId,
    pub role_name: String,
    pub categories: Vec<String>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_volunteers: i32,
    pub is_active: bool,
}

impl From<VolunteerShiftRow> for VolunteerRoleShift {
    fn from(row: VolunteerShiftRow) -> Self {
        VolunteerRoleShift {
            shift_id: row.shift_id,
            role_id: row.role_id,
            role_name: row.role_name,
            categories: row.categories,
            start_time: row.start_time,
            end_time: row.end_time,
            max_volunteers: row.max_volunteers,
        }
    }
}

/// DTO for creating a new role.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVolunteerRole {
    pub name: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// DTO for adding a shift to a role.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVolunteerShift {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_volunteers: i32,
}

/// DTO for updating a shift. All fields are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateVolunteerShift {
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub max_volunteers: Option<i32>,
    pub is_active: Option<bool>,
}
