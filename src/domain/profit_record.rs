use chrono::{DateTime, Utc};
use rusqlite::{Row, Result as SqlResult};

/// A snapshot of the fee/profit breakdown computed for one listing at one
/// candidate sale price (spec §4.3).
#[derive(Debug, Clone)]
pub struct ProfitRecord {
    pub id: i64,
    pub listing_id: i64,
    pub sale_price: f64,
    pub purchase_price: f64,
    pub shipping_cost: f64,
    pub ebay_fee_percent: f64,
    pub ad_fee_percent: f64,
    pub ebay_fee_amount: f64,
    pub payment_processing_amount: f64,
    pub ad_fee_amount: f64,
    pub total_fees: f64,
    pub net_profit: f64,
    pub profit_margin_percent: f64,
    pub profit_floor: f64,
    pub meets_floor: bool,
    pub minimum_viable_price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfitRecord {
    pub fn from_row(row: &Row) -> SqlResult<Self> {
        Ok(ProfitRecord {
            id: row.get("id")?,
            listing_id: row.get("listing_id")?,
            sale_price: row.get("sale_price")?,
            purchase_price: row.get("purchase_price")?,
            shipping_cost: row.get("shipping_cost")?,
            ebay_fee_percent: row.get("ebay_fee_percent")?,
            ad_fee_percent: row.get("ad_fee_percent")?,
            ebay_fee_amount: row.get("ebay_fee_amount")?,
            payment_processing_amount: row.get("payment_processing_amount")?,
            ad_fee_amount: row.get("ad_fee_amount")?,
            total_fees: row.get("total_fees")?,
            net_profit: row.get("net_profit")?,
            profit_margin_percent: row.get("profit_margin_percent")?,
            profit_floor: row.get("profit_floor")?,
            meets_floor: row.get::<_, i64>("meets_floor")? != 0,
            minimum_viable_price: row.get("minimum_viable_price")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}
