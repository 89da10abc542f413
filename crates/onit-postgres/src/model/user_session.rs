//! User session model for PostgreSQL database operations.

use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::user_sessions;

/// Data for appending a session to a user's list.
///
/// The position column is assigned by the database, so the list reads back
/// in insertion order.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewUserSession {
    pub user_id: Uuid,
    pub session_id: Uuid,
}
