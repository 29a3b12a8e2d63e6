use super::status::ZombieAction;
use chrono::{DateTime, Utc};
use rusqlite::{Row, Result as SqlResult};

/// One audit row per zombie-detection event: flag, resurrection, or
/// preventive relist (spec §4.4-§4.8).
#[derive(Debug, Clone)]
pub struct ZombieRecord {
    pub id: i64,
    pub listing_id: i64,
    pub detected_at: DateTime<Utc>,
    pub days_active_at_detection: i64,
    pub views_at_detection: i64,
    pub action_taken: ZombieAction,
    pub resurrected_at: Option<DateTime<Utc>>,
    pub old_item_id: Option<String>,
    pub new_item_id: Option<String>,
    pub cycle_number: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ZombieRecord {
    pub fn from_row(row: &Row) -> SqlResult<Self> {
        let action_str: String = row.get("action_taken")?;
        Ok(ZombieRecord {
            id: row.get("id")?,
            listing_id: row.get("listing_id")?,
            detected_at: row.get("detected_at")?,
            days_active_at_detection: row.get("days_active_at_detection")?,
            views_at_detection: row.get("views_at_detection")?,
            action_taken: ZombieAction::from_str(&action_str).unwrap_or(ZombieAction::Flagged),
            resurrected_at: row.get("resurrected_at")?,
            old_item_id: row.get("old_item_id")?,
            new_item_id: row.get("new_item_id")?,
            cycle_number: row.get("cycle_number")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}
