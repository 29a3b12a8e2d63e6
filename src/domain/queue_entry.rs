use super::status::QueueStatus;
use chrono::{DateTime, Utc};
use rusqlite::{Row, Result as SqlResult};

/// A pending SmartQueue release slot (spec §4.14).
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub id: i64,
    pub listing_id: i64,
    pub priority: i64,
    pub scheduled_window: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub released_at: Option<DateTime<Utc>>,
    pub status: QueueStatus,
    pub error_message: Option<String>,
    pub batch_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QueueEntry {
    pub fn from_row(row: &Row) -> SqlResult<Self> {
        let status_str: String = row.get("status")?;
        Ok(QueueEntry {
            id: row.get("id")?,
            listing_id: row.get("listing_id")?,
            priority: row.get("priority")?,
            scheduled_window: row.get("scheduled_window")?,
            scheduled_at: row.get("scheduled_at")?,
            released_at: row.get("released_at")?,
            status: QueueStatus::from_str(&status_str).unwrap_or(QueueStatus::Pending),
            error_message: row.get("error_message")?,
            batch_id: row.get("batch_id")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}
