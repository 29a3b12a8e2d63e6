//! The marketplace boundary. Every policy holds an `Arc<dyn Gateway>` rather
//! than talking to a concrete client, so the same policy code runs against
//! the deterministic mock in tests and a real client in production.

mod mock;

pub use mock::MockGateway;

use crate::errors::GatewayError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type GwResult<T> = Result<T, GatewayError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub sku: String,
    pub title: String,
    pub description: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub category_id: Option<String>,
    pub condition_id: String,
    pub photo_urls: Vec<String>,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkPriceQuantityUpdate {
    pub sku: String,
    pub price: Option<f64>,
    pub handling_days: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkUpdateResponse {
    pub sku: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferRequest {
    pub sku: String,
    pub price: f64,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResult {
    pub listing_id: String,
    pub offer_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrafficRecord {
    pub views: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignRequest {
    pub campaign_name: String,
    pub ad_rate: f64,
    pub listing_id: String,
}

/// The full surface of marketplace operations a policy can invoke,
/// grouped the way the gatekeeper/lifecycle/growth services use them:
/// inventory, offers, analytics, marketing, browse, negotiation, account.
#[async_trait]
pub trait Gateway: Send + Sync {
    // -- Inventory management --
    async fn create_inventory_item(&self, item: InventoryItem) -> GwResult<()>;
    async fn get_inventory_item(&self, sku: &str) -> GwResult<Option<InventoryItem>>;
    async fn update_inventory_item(&self, sku: &str, item: InventoryItem) -> GwResult<()>;
    async fn delete_inventory_item(&self, sku: &str) -> GwResult<()>;
    async fn bulk_update_price_quantity(
        &self,
        updates: Vec<BulkPriceQuantityUpdate>,
    ) -> GwResult<Vec<BulkUpdateResponse>>;

    // -- Offer management --
    async fn create_offer(&self, req: OfferRequest) -> GwResult<String>;
    async fn publish_offer(&self, offer_id: &str) -> GwResult<PublishResult>;
    async fn withdraw_offer(&self, offer_id: &str) -> GwResult<()>;
    async fn get_offer(&self, offer_id: &str) -> GwResult<Option<serde_json::Value>>;
    async fn get_offers_by_sku(&self, sku: &str) -> GwResult<Vec<serde_json::Value>>;

    // -- Analytics --
    async fn get_traffic_report(
        &self,
        item_ids: Vec<String>,
        range: &str,
        metrics: Vec<String>,
    ) -> GwResult<HashMap<String, TrafficRecord>>;

    // -- Marketing --
    async fn create_campaign(&self, req: CampaignRequest) -> GwResult<String>;
    async fn end_campaign(&self, campaign_id: &str) -> GwResult<bool>;
    async fn get_campaign(&self, campaign_id: &str) -> GwResult<Option<serde_json::Value>>;

    // -- Browse --
    async fn search_items(&self, query: &str) -> GwResult<Vec<serde_json::Value>>;

    // -- Buyer engagement --
    async fn send_offer_to_buyer(
        &self,
        listing_id: &str,
        buyer_id: &str,
        price: f64,
        message: &str,
    ) -> GwResult<()>;
    async fn get_watchers(&self, listing_id: &str) -> GwResult<Vec<String>>;

    // -- Negotiation --
    async fn respond_to_offer(&self, offer_id: &str, action: &str, price: Option<f64>) -> GwResult<()>;

    // -- Account --
    async fn update_handling_time(&self, sku: &str, days: i64) -> GwResult<()>;
}
