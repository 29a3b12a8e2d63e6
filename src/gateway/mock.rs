use super::*;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// Deterministic in-memory fake. Built for tests: no network, no clock
/// skew, and a side channel (`inject_failure`) that lets a test force the
/// next call to a given method to fail exactly once.
pub struct MockGateway {
    inventory: Mutex<HashMap<String, InventoryItem>>,
    offers: Mutex<HashMap<String, serde_json::Value>>,
    campaigns: Mutex<HashMap<String, serde_json::Value>>,
    watchers: Mutex<HashMap<String, Vec<String>>>,
    traffic: Mutex<HashMap<String, TrafficRecord>>,
    failures: Mutex<HashMap<&'static str, GatewayError>>,
    next_listing_id: AtomicI64,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    pub fn new() -> Self {
        MockGateway {
            inventory: Mutex::new(HashMap::new()),
            offers: Mutex::new(HashMap::new()),
            campaigns: Mutex::new(HashMap::new()),
            watchers: Mutex::new(HashMap::new()),
            traffic: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            next_listing_id: AtomicI64::new(200_000),
        }
    }

    /// Arranges for the next call to `method_name` to fail with `error`.
    /// Consumed exactly once.
    pub fn inject_failure(&self, method_name: &'static str, error: GatewayError) {
        self.failures.lock().insert(method_name, error);
    }

    /// Seeds watcher ids for a listing, for tests that exercise OfferSniper.
    pub fn set_watchers(&self, listing_id: &str, buyer_ids: Vec<String>) {
        self.watchers.lock().insert(listing_id.to_string(), buyer_ids);
    }

    /// Seeds a traffic count for a listing, for tests that exercise ZombieKiller.
    pub fn set_traffic(&self, item_id: &str, views: i64) {
        self.traffic
            .lock()
            .insert(item_id.to_string(), TrafficRecord { views });
    }

    fn check_failure(&self, method_name: &str) -> GwResult<()> {
        if let Some(err) = self.failures.lock().remove(method_name) {
            return Err(err);
        }
        Ok(())
    }

    fn next_id(&self) -> i64 {
        self.next_listing_id.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Gateway for MockGateway {
    async fn create_inventory_item(&self, item: InventoryItem) -> GwResult<()> {
        self.check_failure("create_inventory_item")?;
        self.inventory.lock().insert(item.sku.clone(), item);
        Ok(())
    }

    async fn get_inventory_item(&self, sku: &str) -> GwResult<Option<InventoryItem>> {
        self.check_failure("get_inventory_item")?;
        Ok(self.inventory.lock().get(sku).cloned())
    }

    async fn update_inventory_item(&self, sku: &str, item: InventoryItem) -> GwResult<()> {
        self.check_failure("update_inventory_item")?;
        self.inventory.lock().insert(sku.to_string(), item);
        Ok(())
    }

    async fn delete_inventory_item(&self, sku: &str) -> GwResult<()> {
        self.check_failure("delete_inventory_item")?;
        self.inventory.lock().remove(sku);
        Ok(())
    }

    async fn bulk_update_price_quantity(
        &self,
        updates: Vec<BulkPriceQuantityUpdate>,
    ) -> GwResult<Vec<BulkUpdateResponse>> {
        self.check_failure("bulk_update_price_quantity")?;
        let inventory = self.inventory.lock();
        Ok(updates
            .into_iter()
            .map(|u| {
                let status = if inventory.contains_key(&u.sku) {
                    "SUCCESS"
                } else {
                    "NOT_FOUND"
                };
                BulkUpdateResponse {
                    sku: u.sku,
                    status: status.to_string(),
                }
            })
            .collect())
    }

    async fn create_offer(&self, req: OfferRequest) -> GwResult<String> {
        self.check_failure("create_offer")?;
        let offer_id = format!("OFFER-{:08x}", self.next_id());
        self.offers.lock().insert(
            offer_id.clone(),
            serde_json::json!({
                "offerId": offer_id,
                "sku": req.sku,
                "price": req.price,
                "format": req.format,
                "status": "CREATED",
            }),
        );
        Ok(offer_id)
    }

    async fn publish_offer(&self, offer_id: &str) -> GwResult<PublishResult> {
        self.check_failure("publish_offer")?;
        let mut offers = self.offers.lock();
        let offer = offers
            .get_mut(offer_id)
            .ok_or_else(|| GatewayError::NotFound(format!("offer {offer_id}")))?;
        offer["status"] = serde_json::json!("PUBLISHED");
        let listing_id = format!("MOCK-{}", self.next_id());
        offer["listingId"] = serde_json::json!(listing_id);
        Ok(PublishResult {
            listing_id,
            offer_id: offer_id.to_string(),
        })
    }

    async fn withdraw_offer(&self, offer_id: &str) -> GwResult<()> {
        self.check_failure("withdraw_offer")?;
        if let Some(offer) = self.offers.lock().get_mut(offer_id) {
            offer["status"] = serde_json::json!("WITHDRAWN");
        }
        Ok(())
    }

    async fn get_offer(&self, offer_id: &str) -> GwResult<Option<serde_json::Value>> {
        self.check_failure("get_offer")?;
        Ok(self.offers.lock().get(offer_id).cloned())
    }

    async fn get_offers_by_sku(&self, sku: &str) -> GwResult<Vec<serde_json::Value>> {
        self.check_failure("get_offers_by_sku")?;
        Ok(self
            .offers
            .lock()
            .values()
            .filter(|o| o.get("sku").and_then(|s| s.as_str()) == Some(sku))
            .cloned()
            .collect())
    }

    async fn get_traffic_report(
        &self,
        item_ids: Vec<String>,
        _range: &str,
        _metrics: Vec<String>,
    ) -> GwResult<HashMap<String, TrafficRecord>> {
        self.check_failure("get_traffic_report")?;
        let traffic = self.traffic.lock();
        Ok(item_ids
            .into_iter()
            .map(|id| {
                let record = traffic.get(&id).cloned().unwrap_or_default();
                (id, record)
            })
            .collect())
    }

    async fn create_campaign(&self, req: CampaignRequest) -> GwResult<String> {
        self.check_failure("create_campaign")?;
        let campaign_id = format!("CAMP-{:08x}", self.next_id());
        self.campaigns.lock().insert(
            campaign_id.clone(),
            serde_json::json!({
                "campaignId": campaign_id,
                "campaignName": req.campaign_name,
                "adRate": req.ad_rate,
                "listingId": req.listing_id,
                "status": "RUNNING",
            }),
        );
        Ok(campaign_id)
    }

    async fn end_campaign(&self, campaign_id: &str) -> GwResult<bool> {
        self.check_failure("end_campaign")?;
        let mut campaigns = self.campaigns.lock();
        match campaigns.get_mut(campaign_id) {
            Some(c) => {
                c["status"] = serde_json::json!("ENDED");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_campaign(&self, campaign_id: &str) -> GwResult<Option<serde_json::Value>> {
        self.check_failure("get_campaign")?;
        Ok(self.campaigns.lock().get(campaign_id).cloned())
    }

    async fn search_items(&self, query: &str) -> GwResult<Vec<serde_json::Value>> {
        self.check_failure("search_items")?;
        let needle = query.to_lowercase();
        Ok(self
            .inventory
            .lock()
            .values()
            .filter(|item| item.title.to_lowercase().contains(&needle))
            .map(|item| serde_json::to_value(item).unwrap_or_default())
            .collect())
    }

    async fn send_offer_to_buyer(
        &self,
        _listing_id: &str,
        _buyer_id: &str,
        _price: f64,
        _message: &str,
    ) -> GwResult<()> {
        self.check_failure("send_offer_to_buyer")?;
        Ok(())
    }

    async fn get_watchers(&self, listing_id: &str) -> GwResult<Vec<String>> {
        self.check_failure("get_watchers")?;
        Ok(self.watchers.lock().get(listing_id).cloned().unwrap_or_default())
    }

    async fn respond_to_offer(&self, _offer_id: &str, _action: &str, _price: Option<f64>) -> GwResult<()> {
        self.check_failure("respond_to_offer")?;
        Ok(())
    }

    async fn update_handling_time(&self, _sku: &str, _days: i64) -> GwResult<()> {
        self.check_failure("update_handling_time")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_and_fetch_inventory_item() {
        let gw = MockGateway::new();
        let item = InventoryItem {
            sku: "NIKE-001".into(),
            title: "Nike Air".into(),
            description: String::new(),
            brand: None,
            model: None,
            category_id: None,
            condition_id: "3000".into(),
            photo_urls: vec![],
            price: 100.0,
        };
        gw.create_inventory_item(item).await.unwrap();
        let fetched = gw.get_inventory_item("NIKE-001").await.unwrap();
        assert!(fetched.is_some());
    }

    #[tokio::test]
    async fn injected_failure_fires_once() {
        let gw = MockGateway::new();
        gw.inject_failure("create_offer", GatewayError::Transport("boom".into()));
        let req = OfferRequest {
            sku: "X".into(),
            price: 1.0,
            format: "FIXED_PRICE".into(),
        };
        assert!(gw.create_offer(req.clone()).await.is_err());
        assert!(gw.create_offer(req).await.is_ok());
    }

    #[tokio::test]
    async fn publish_offer_generates_listing_id() {
        let gw = MockGateway::new();
        let offer_id = gw
            .create_offer(OfferRequest {
                sku: "X".into(),
                price: 1.0,
                format: "FIXED_PRICE".into(),
            })
            .await
            .unwrap();
        let result = gw.publish_offer(&offer_id).await.unwrap();
        assert!(result.listing_id.starts_with("MOCK-"));
    }
}
