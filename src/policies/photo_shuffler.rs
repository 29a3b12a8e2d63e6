//! Photo shuffler (spec §4.11): swaps the lead photo on stalled,
//! zero-view listings to refresh how they look in browse results.

use crate::config::Config;
use crate::domain::{Listing, ListingStatus};
use crate::gateway::{Gateway, InventoryItem};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct ShuffleOutcome {
    pub listing_id: i64,
    pub old_main: String,
    pub new_main: String,
}

#[derive(Debug, Clone)]
pub struct ShuffleSkip {
    pub listing_id: i64,
    pub reason: String,
}

pub struct PhotoShuffler {
    gateway: Arc<dyn Gateway>,
    days_no_views_threshold: i64,
}

impl PhotoShuffler {
    pub fn new(gateway: Arc<dyn Gateway>, config: &Config) -> Self {
        PhotoShuffler {
            gateway,
            days_no_views_threshold: config.photo_shuffle_days_no_views,
        }
    }

    pub fn needs_shuffle(&self, listing: &Listing) -> bool {
        listing.status == ListingStatus::Active
            && listing.days_active >= self.days_no_views_threshold
            && listing.total_views == 0
            && listing.photo_urls.len() >= 2
    }

    /// Swaps the first two photos for every eligible listing, pushing
    /// the new photo order to the gateway when the listing has a sku.
    /// The local swap is applied before the gateway call and is NOT
    /// rolled back if that call fails — the listing keeps the new order
    /// locally even though the marketplace side never saw it.
    pub async fn scan_and_shuffle(
        &self,
        listings: &mut [Listing],
    ) -> (Vec<ShuffleOutcome>, Vec<ShuffleSkip>) {
        let mut shuffled = Vec::new();
        let mut skipped = Vec::new();

        for listing in listings
            .iter_mut()
            .filter(|l| l.status == ListingStatus::Active && l.days_active >= self.days_no_views_threshold && l.total_views == 0)
        {
            if listing.photo_urls.len() < 2 {
                skipped.push(ShuffleSkip {
                    listing_id: listing.id,
                    reason: "Only 1 photo, cannot shuffle".to_string(),
                });
                continue;
            }

            let old_main = listing.photo_urls[0].clone();
            listing.photo_urls.swap(0, 1);
            listing.main_photo_index = 0;
            let new_main = listing.photo_urls[0].clone();

            let item = InventoryItem {
                sku: listing.sku.clone(),
                title: listing.title_sanitized.clone().unwrap_or_else(|| listing.title.clone()),
                description: listing.description.clone(),
                brand: listing.brand.clone(),
                model: listing.model.clone(),
                category_id: listing.category_id.clone(),
                condition_id: listing.condition_id.clone(),
                photo_urls: listing.photo_urls.clone(),
                price: listing.effective_price(),
            };

            match self.gateway.update_inventory_item(&listing.sku, item).await {
                Ok(()) => shuffled.push(ShuffleOutcome {
                    listing_id: listing.id,
                    old_main,
                    new_main,
                }),
                Err(e) => skipped.push(ShuffleSkip {
                    listing_id: listing.id,
                    reason: format!("eBay update failed: {e}"),
                }),
            }
        }

        info!(shuffled = shuffled.len(), skipped = skipped.len(), "photo shuffler scan complete");
        (shuffled, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn listing(photo_urls: Vec<String>) -> Listing {
        Listing {
            id: 1,
            ebay_item_id: Some("MOCK-1".into()),
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
            days_active: 14,
            total_views: 0,
            watchers: 0,
            zombie_cycle_count: 0,
            sell_through_rate: None,
            str_data_source: None,
            photo_urls,
            main_photo_index: 0,
            offer_id: None,
            last_offer_sent_at: None,
            last_repriced_at: None,
            deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn shuffler() -> PhotoShuffler {
        let config = Config::from_env();
        PhotoShuffler::new(Arc::new(crate::gateway::MockGateway::new()), &config)
    }

    #[tokio::test]
    async fn skips_listing_with_only_one_photo() {
        let s = shuffler();
        let mut listings = vec![listing(vec!["a.jpg".into()])];
        let (shuffled, skipped) = s.scan_and_shuffle(&mut listings).await;
        assert!(shuffled.is_empty());
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].reason, "Only 1 photo, cannot shuffle");
    }

    #[tokio::test]
    async fn swaps_first_two_photos() {
        let s = shuffler();
        let mut listings = vec![listing(vec!["a.jpg".into(), "b.jpg".into()])];
        let (shuffled, skipped) = s.scan_and_shuffle(&mut listings).await;
        assert_eq!(shuffled.len(), 1);
        assert!(skipped.is_empty());
        assert_eq!(listings[0].photo_urls, vec!["b.jpg".to_string(), "a.jpg".to_string()]);
    }

    #[test]
    fn needs_shuffle_requires_zero_views_and_two_photos() {
        let s = shuffler();
        let mut l = listing(vec!["a.jpg".into(), "b.jpg".into()]);
        assert!(s.needs_shuffle(&l));
        l.total_views = 1;
        assert!(!s.needs_shuffle(&l));
    }
}
