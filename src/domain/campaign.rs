use super::status::{CampaignStatus, CampaignType};
use chrono::{DateTime, Utc};
use rusqlite::{Row, Result as SqlResult};

/// A running (or finished) marketing campaign against a listing (spec §4.12).
#[derive(Debug, Clone)]
pub struct Campaign {
    pub id: i64,
    pub listing_id: i64,
    pub ebay_campaign_id: Option<String>,
    pub campaign_type: CampaignType,
    pub ad_rate_percent: f64,
    pub started_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: CampaignStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    pub fn from_row(row: &Row) -> SqlResult<Self> {
        let type_str: String = row.get("campaign_type")?;
        let status_str: String = row.get("status")?;
        Ok(Campaign {
            id: row.get("id")?,
            listing_id: row.get("listing_id")?,
            ebay_campaign_id: row.get("ebay_campaign_id")?,
            campaign_type: CampaignType::from_str(&type_str).unwrap_or(CampaignType::Manual),
            ad_rate_percent: row.get("ad_rate_percent")?,
            started_at: row.get("started_at")?,
            ends_at: row.get("ends_at")?,
            status: CampaignStatus::from_str(&status_str).unwrap_or(CampaignStatus::Ended),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}
