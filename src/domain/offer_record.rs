use super::status::OfferStatus;
use chrono::{DateTime, Utc};
use rusqlite::{Row, Result as SqlResult};

/// One offer sent to (or received from) a watcher (spec §4.9).
#[derive(Debug, Clone)]
pub struct OfferRecord {
    pub id: i64,
    pub listing_id: i64,
    pub buyer_id: String,
    pub offer_price: f64,
    pub discount_percent: f64,
    pub sent_at: DateTime<Utc>,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OfferRecord {
    pub fn from_row(row: &Row) -> SqlResult<Self> {
        let status_str: String = row.get("status")?;
        Ok(OfferRecord {
            id: row.get("id")?,
            listing_id: row.get("listing_id")?,
            buyer_id: row.get("buyer_id")?,
            offer_price: row.get("offer_price")?,
            discount_percent: row.get("discount_percent")?,
            sent_at: row.get("sent_at")?,
            status: OfferStatus::from_str(&status_str).unwrap_or(OfferStatus::Sent),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}
