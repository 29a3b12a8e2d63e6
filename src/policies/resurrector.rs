//! Resurrection (spec §4.7): retires a zombie's SKU and relists it fresh
//! under a new one, carrying forward its sanitized content and rotated
//! photos.

use crate::domain::{Listing, ListingStatus, ZombieAction};
use crate::gateway::{Gateway, InventoryItem, OfferRequest};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct ResurrectionResult {
    pub success: bool,
    pub listing_id: i64,
    pub old_sku: String,
    pub new_sku: Option<String>,
    pub old_item_id: Option<String>,
    pub new_item_id: Option<String>,
    pub cycle: i64,
    pub error: Option<String>,
}

pub struct Resurrector {
    gateway: Arc<dyn Gateway>,
    cooldown: Duration,
}

impl Resurrector {
    pub fn new(gateway: Arc<dyn Gateway>, cooldown_seconds: u64) -> Self {
        Resurrector {
            gateway,
            cooldown: Duration::from_secs(cooldown_seconds),
        }
    }

    /// New SKU for a resurrection cycle: strips any existing `_R<n>`
    /// suffix from the original SKU, then appends the new cycle number.
    fn generate_resurrection_sku(original_sku: &str, cycle: i64) -> String {
        let base = original_sku.split("_R").next().unwrap_or(original_sku);
        format!("{base}_R{cycle}")
    }

    fn fail(listing: &Listing, cycle: i64, message: impl Into<String>) -> ResurrectionResult {
        ResurrectionResult {
            success: false,
            listing_id: listing.id,
            old_sku: listing.sku.clone(),
            new_sku: None,
            old_item_id: listing.ebay_item_id.clone(),
            new_item_id: None,
            cycle,
            error: Some(message.into()),
        }
    }

    /// Retires the listing's current offer, rotates its photos, creates
    /// a fresh inventory item + offer under a new SKU, and publishes it.
    /// Any step failing short-circuits with a structured failure; the
    /// caller is expected to hold the listing mutation inside a
    /// transaction so a failed resurrection never persists a half state.
    pub async fn resurrect(&self, listing: &mut Listing) -> ResurrectionResult {
        let cycle = listing.zombie_cycle_count + 1;
        let new_sku = Self::generate_resurrection_sku(&listing.sku, cycle);

        if let Some(old_offer_id) = listing.offer_id.clone() {
            if let Err(e) = self.gateway.withdraw_offer(&old_offer_id).await {
                return Self::fail(listing, cycle, format!("Failed to withdraw offer: {e}"));
            }
        }

        if !self.cooldown.is_zero() {
            tokio::time::sleep(self.cooldown).await;
        }

        let mut photos = listing.photo_urls.clone();
        if photos.len() >= 2 {
            photos.swap(0, 1);
        }

        let item = InventoryItem {
            sku: new_sku.clone(),
            title: listing
                .title_sanitized
                .clone()
                .unwrap_or_else(|| listing.title.clone()),
            description: listing
                .description_mobile
                .clone()
                .unwrap_or_else(|| listing.description.clone()),
            brand: listing.brand.clone(),
            model: listing.model.clone(),
            category_id: listing.category_id.clone(),
            condition_id: listing.condition_id.clone(),
            photo_urls: photos.clone(),
            price: listing.list_price,
        };
        if let Err(e) = self.gateway.create_inventory_item(item).await {
            return Self::fail(listing, cycle, format!("Failed to create inventory item: {e}"));
        }

        let publish_result = async {
            let offer_id = self
                .gateway
                .create_offer(OfferRequest {
                    sku: new_sku.clone(),
                    price: listing.list_price,
                    format: "FIXED_PRICE".to_string(),
                })
                .await?;
            self.gateway.publish_offer(&offer_id).await
        }
        .await;

        let publish_result = match publish_result {
            Ok(r) => r,
            Err(e) => return Self::fail(listing, cycle, format!("Failed to publish offer: {e}")),
        };

        let old_item_id = listing.ebay_item_id.clone();
        let old_sku = listing.sku.clone();

        listing.sku = new_sku.clone();
        listing.ebay_item_id = Some(publish_result.listing_id.clone());
        listing.offer_id = Some(publish_result.offer_id.clone());
        listing.status = ListingStatus::Active;
        listing.zombie_cycle_count = cycle;
        listing.days_active = 0;
        listing.total_views = 0;
        listing.watchers = 0;
        listing.photo_urls = photos;
        listing.main_photo_index = 0;
        listing.listed_at = Some(Utc::now());

        info!(listing_id = listing.id, new_sku = %new_sku, cycle, "resurrection succeeded");

        ResurrectionResult {
            success: true,
            listing_id: listing.id,
            old_sku,
            new_sku: Some(new_sku),
            old_item_id,
            new_item_id: Some(publish_result.listing_id),
            cycle,
            error: None,
        }
    }

    pub fn resurrection_action(&self) -> ZombieAction {
        ZombieAction::Resurrected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ListingStatus;
    use crate::errors::GatewayError;
    use chrono::Utc;

    fn listing() -> Listing {
        Listing {
            id: 1,
            ebay_item_id: Some("MOCK-1".into()),
            sku: "NIKE-001".into(),
            title: "Nike Air".into(),
            title_sanitized: Some("Nike Air Max".into()),
            description: "desc".into(),
            description_mobile: None,
            brand: Some("Nike".into()),
            model: Some("Air Max".into()),
            category_id: None,
            condition_id: "3000".into(),
            purchase_price: 30.0,
            list_price: 100.0,
            current_price: None,
            shipping_cost: 5.0,
            ad_rate_percent: 0.0,
            status: ListingStatus::Zombie,
            listed_at: None,
            days_active: 60,
            total_views: 0,
            watchers: 0,
            zombie_cycle_count: 1,
            sell_through_rate: None,
            str_data_source: None,
            photo_urls: vec!["a.jpg".into(), "b.jpg".into()],
            main_photo_index: 0,
            offer_id: Some("OFFER-1".into()),
            last_offer_sent_at: None,
            last_repriced_at: None,
            deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn generates_resurrection_sku_from_plain_sku() {
        assert_eq!(Resurrector::generate_resurrection_sku("NIKE-001", 1), "NIKE-001_R1");
    }

    #[test]
    fn strips_existing_resurrection_suffix() {
        assert_eq!(Resurrector::generate_resurrection_sku("NIKE-001_R2", 3), "NIKE-001_R3");
    }

    #[tokio::test]
    async fn successful_resurrection_rotates_photos_and_resets_counters() {
        let gw = Arc::new(crate::gateway::MockGateway::new());
        let r = Resurrector::new(gw, 0);
        let mut l = listing();
        let result = r.resurrect(&mut l).await;
        assert!(result.success);
        assert_eq!(l.sku, "NIKE-001_R2");
        assert_eq!(l.status, ListingStatus::Active);
        assert_eq!(l.days_active, 0);
        assert_eq!(l.total_views, 0);
        assert_eq!(l.photo_urls, vec!["b.jpg".to_string(), "a.jpg".to_string()]);
        assert_eq!(l.zombie_cycle_count, 2);
    }

    #[tokio::test]
    async fn withdraw_failure_short_circuits_without_mutating() {
        let gw = Arc::new(crate::gateway::MockGateway::new());
        gw.inject_failure("withdraw_offer", GatewayError::Transport("down".into()));
        let r = Resurrector::new(gw, 0);
        let mut l = listing();
        let original_sku = l.sku.clone();
        let result = r.resurrect(&mut l).await;
        assert!(!result.success);
        assert_eq!(l.sku, original_sku);
        assert_eq!(l.status, ListingStatus::Zombie);
    }
}
