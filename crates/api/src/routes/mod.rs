pub mod admin;
pub mod availability;
pub mod bookings;
pub mod health;
pub mod reschedule;
pub mod series;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /availability/slots                              shopper slots (?date, include_past)
/// /availability/shifts                             volunteer shifts (?date, include_past, role_id)
///
/// /bookings                                        book (POST)
/// /bookings/resolve-conflict                       keep or replace (POST)
/// /bookings/mine                                   caller's bookings (?from)
/// /bookings/{kind}/{id}                            get
/// /bookings/{kind}/{id}/cancel                     cancel (POST)
/// /bookings/{kind}/{id}/reschedule                 reschedule (POST)
/// /bookings/{kind}/{id}/outcome                    visited / no-show (POST, staff)
/// /bookings/{kind}/{id}/expire                     expire (POST, staff)
/// /volunteer-bookings/{id}/review                  approve / reject (POST, staff)
/// /subjects/{subject_type}/{id}/bookings           a person's bookings (?from)
/// /day-sheet                                       day listing (?kind, date; staff)
///
/// /reschedule/{token}                              get, reschedule (public)
/// /reschedule/{token}/cancel                       cancel (POST, public)
///
/// /volunteer-series                                create (POST)
/// /volunteer-series/{id}/cancel                    cancel future members (POST)
///
/// /admin/slots                                     list, create (staff)
/// /admin/slots/{id}                                update, delete
/// /admin/roles                                     list, create
/// /admin/roles/{role_id}/shifts                    add shift (POST)
/// /admin/shifts                                    list (?include_inactive)
/// /admin/shifts/{id}                               update
/// /admin/overrides                                 list, create
/// /admin/overrides/{table}/{id}                    delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/availability", availability::router())
        .merge(bookings::router())
        .nest("/reschedule", reschedule::router())
        .nest("/volunteer-series", series::router())
        .nest("/admin", admin::router())
}
