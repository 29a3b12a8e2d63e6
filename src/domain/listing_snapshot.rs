use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Row, Result as SqlResult};

/// A daily traffic/price sample for one listing, used to reconstruct
/// history independent of the live `Listing` row.
#[derive(Debug, Clone)]
pub struct ListingSnapshot {
    pub id: i64,
    pub listing_id: i64,
    pub snapshot_date: NaiveDate,
    pub views: i64,
    pub impressions: i64,
    pub watchers: i64,
    pub price_at_snapshot: f64,
    pub status_at_snapshot: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ListingSnapshot {
    pub fn from_row(row: &Row) -> SqlResult<Self> {
        Ok(ListingSnapshot {
            id: row.get("id")?,
            listing_id: row.get("listing_id")?,
            snapshot_date: row.get("snapshot_date")?,
            views: row.get("views")?,
            impressions: row.get("impressions")?,
            watchers: row.get("watchers")?,
            price_at_snapshot: row.get("price_at_snapshot")?,
            status_at_snapshot: row.get("status_at_snapshot")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}
