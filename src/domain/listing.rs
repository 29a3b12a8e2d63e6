use super::status::ListingStatus;
use chrono::{DateTime, Utc};
use rusqlite::{Row, Result as SqlResult};

/// The central entity (spec §3). Pricing fields are stored as `f64`;
/// the persisted schema pins them to `DECIMAL(10,2)`/`DECIMAL(5,2)`
/// columns so precision loss is bounded to what SQLite's `NUMERIC`
/// affinity already tolerates.
#[derive(Debug, Clone)]
pub struct Listing {
    pub id: i64,
    pub ebay_item_id: Option<String>,
    pub sku: String,
    pub title: String,
    pub title_sanitized: Option<String>,
    pub description: String,
    pub description_mobile: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub category_id: Option<String>,
    pub condition_id: String,

    pub purchase_price: f64,
    pub list_price: f64,
    pub current_price: Option<f64>,
    pub shipping_cost: f64,
    pub ad_rate_percent: f64,

    pub status: ListingStatus,
    pub listed_at: Option<DateTime<Utc>>,
    pub days_active: i64,
    pub total_views: i64,
    pub watchers: i64,
    pub zombie_cycle_count: i64,

    pub sell_through_rate: Option<f64>,
    pub str_data_source: Option<String>,

    pub photo_urls: Vec<String>,
    pub main_photo_index: i64,

    pub offer_id: Option<String>,
    pub last_offer_sent_at: Option<DateTime<Utc>>,
    pub last_repriced_at: Option<DateTime<Utc>>,

    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Effective current price: `current_price` when set, else `list_price`.
    /// This fallback recurs across nearly every policy in the source.
    pub fn effective_price(&self) -> f64 {
        self.current_price.unwrap_or(self.list_price)
    }

    pub fn from_row(row: &Row) -> SqlResult<Self> {
        let status_str: String = row.get("status")?;
        let photos_json: Option<String> = row.get("photo_urls_json")?;
        let photo_urls = photos_json
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();

        Ok(Listing {
            id: row.get("id")?,
            ebay_item_id: row.get("ebay_item_id")?,
            sku: row.get("sku")?,
            title: row.get("title")?,
            title_sanitized: row.get("title_sanitized")?,
            description: row.get("description")?,
            description_mobile: row.get("description_mobile")?,
            brand: row.get("brand")?,
            model: row.get("model")?,
            category_id: row.get("category_id")?,
            condition_id: row.get("condition_id")?,
            purchase_price: row.get("purchase_price")?,
            list_price: row.get("list_price")?,
            current_price: row.get("current_price")?,
            shipping_cost: row.get("shipping_cost")?,
            ad_rate_percent: row.get("ad_rate_percent")?,
            status: ListingStatus::from_str(&status_str).unwrap_or(ListingStatus::Draft),
            listed_at: row.get("listed_at")?,
            days_active: row.get("days_active")?,
            total_views: row.get("total_views")?,
            watchers: row.get("watchers")?,
            zombie_cycle_count: row.get("zombie_cycle_count")?,
            sell_through_rate: row.get("sell_through_rate")?,
            str_data_source: row.get("str_data_source")?,
            photo_urls,
            main_photo_index: row.get("main_photo_index")?,
            offer_id: row.get("offer_id")?,
            last_offer_sent_at: row.get("last_offer_sent_at")?,
            last_repriced_at: row.get("last_repriced_at")?,
            deleted: row.get::<_, i64>("deleted")? != 0,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}
