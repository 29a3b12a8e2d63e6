//! Store Pulse (spec §4.13): a monthly handling-time toggle across every
//! active listing with an eBay id, reusing the same bulk endpoint the
//! repricer uses for price.

use crate::domain::{Listing, ListingStatus};
use crate::gateway::{BulkPriceQuantityUpdate, Gateway};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct PulseResult {
    pub updated: usize,
    pub errors: usize,
    pub message: Option<String>,
}

pub struct StorePulse {
    gateway: Arc<dyn Gateway>,
}

impl StorePulse {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        StorePulse { gateway }
    }

    async fn toggle_handling_time(&self, listings: &[Listing], target_days: i64) -> PulseResult {
        let active: Vec<&Listing> = listings
            .iter()
            .filter(|l| l.status == ListingStatus::Active)
            .collect();
        if active.is_empty() {
            return PulseResult {
                updated: 0,
                errors: 0,
                message: Some("No active listings".to_string()),
            };
        }

        let updates: Vec<BulkPriceQuantityUpdate> = active
            .iter()
            .filter(|l| l.ebay_item_id.is_some())
            .map(|l| BulkPriceQuantityUpdate {
                sku: l.sku.clone(),
                price: None,
                handling_days: Some(target_days),
            })
            .collect();

        if updates.is_empty() {
            return PulseResult {
                updated: 0,
                errors: 0,
                message: Some("No listings with eBay IDs".to_string()),
            };
        }

        match self.gateway.bulk_update_price_quantity(updates.clone()).await {
            Ok(responses) => {
                let success_count = responses.iter().filter(|r| r.status == "SUCCESS").count();
                let errors = updates.len() - success_count;
                info!(updated = success_count, errors, "store pulse toggle complete");
                PulseResult {
                    updated: success_count,
                    errors,
                    message: None,
                }
            }
            Err(e) => PulseResult {
                updated: 0,
                errors: updates.len(),
                message: Some(e.to_string()),
            },
        }
    }

    /// Bumps handling time to `target_days` (2 days, by default) ahead
    /// of a scheduled break in fulfillment.
    pub async fn extend_handling_time(&self, listings: &[Listing], target_days: i64) -> PulseResult {
        self.toggle_handling_time(listings, target_days).await
    }

    /// Restores the default 1-day handling time.
    pub async fn revert_handling_time(&self, listings: &[Listing]) -> PulseResult {
        self.toggle_handling_time(listings, 1).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn listing(ebay_item_id: Option<String>) -> Listing {
        Listing {
            id: 1,
            ebay_item_id,
            sku: "SKU-1".into(),
            title: "Title".into(),
            title_sanitized: None,
            description: String::new(),
            description_mobile: None,
            brand: None,
            model: None,
            category_id: None,
            condition_id: "3000".into(),
            purchase_price: 30.0,
            list_price: 100.0,
            current_price: None,
            shipping_cost: 5.0,
            ad_rate_percent: 0.0,
            status: ListingStatus::Active,
            listed_at: None,
            days_active: 1,
            total_views: 0,
            watchers: 0,
            zombie_cycle_count: 0,
            sell_through_rate: None,
            str_data_source: None,
            photo_urls: vec![],
            main_photo_index: 0,
            offer_id: None,
            last_offer_sent_at: None,
            last_repriced_at: None,
            deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn returns_early_with_no_active_listings() {
        let pulse = StorePulse::new(Arc::new(crate::gateway::MockGateway::new()));
        let result = pulse.extend_handling_time(&[], 2).await;
        assert_eq!(result.message, Some("No active listings".to_string()));
    }

    #[tokio::test]
    async fn returns_early_with_no_ebay_ids() {
        let pulse = StorePulse::new(Arc::new(crate::gateway::MockGateway::new()));
        let result = pulse.extend_handling_time(&[listing(None)], 2).await;
        assert_eq!(result.message, Some("No listings with eBay IDs".to_string()));
    }

    #[tokio::test]
    async fn updates_listings_with_ebay_ids() {
        let gw = Arc::new(crate::gateway::MockGateway::new());
        gw.create_inventory_item(crate::gateway::InventoryItem {
            sku: "SKU-1".into(),
            title: "Title".into(),
            description: String::new(),
            brand: None,
            model: None,
            category_id: None,
            condition_id: "3000".into(),
            photo_urls: vec![],
            price: 100.0,
        })
        .await
        .unwrap();
        let pulse = StorePulse::new(gw);
        let result = pulse.extend_handling_time(&[listing(Some("MOCK-1".into()))], 2).await;
        assert_eq!(result.updated, 1);
        assert_eq!(result.errors, 0);
    }
}
