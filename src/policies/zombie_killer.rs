//! Zombie detection (spec §4.4): listings stalled past a days/views
//! threshold get flagged, and repeat offenders get routed to Purgatory.

use crate::config::Config;
use crate::domain::{Listing, ListingStatus, ZombieAction};
use crate::gateway::Gateway;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct ZombieReport {
    pub listing_id: i64,
    pub sku: String,
    pub days_active: i64,
    pub total_views: i64,
    pub zombie_cycle_count: i64,
    pub should_purgatory: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ZombieScanResult {
    pub total_scanned: usize,
    pub zombies_found: usize,
    pub purgatory_candidates: usize,
    pub zombies: Vec<ZombieReport>,
}

pub struct ZombieKiller {
    gateway: Arc<dyn Gateway>,
    days_threshold: i64,
    views_threshold: i64,
    max_cycles: i64,
}

impl ZombieKiller {
    pub fn new(gateway: Arc<dyn Gateway>, config: &Config) -> Self {
        ZombieKiller {
            gateway,
            days_threshold: config.zombie_days_threshold,
            views_threshold: config.zombie_views_threshold,
            max_cycles: config.max_zombie_cycles,
        }
    }

    /// Scans active listings for zombie candidates. Fetches a single
    /// batched traffic report for listings with an eBay id and syncs
    /// `total_views` from it before evaluating the threshold — so a
    /// listing evaluated in the same scan as its traffic refresh sees
    /// the refreshed number, not the stale stored one.
    pub async fn scan(&self, listings: &mut [Listing]) -> ZombieScanResult {
        let active: Vec<usize> = listings
            .iter()
            .enumerate()
            .filter(|(_, l)| l.status == ListingStatus::Active)
            .map(|(i, _)| i)
            .collect();

        if active.is_empty() {
            return ZombieScanResult {
                total_scanned: 0,
                zombies_found: 0,
                purgatory_candidates: 0,
                zombies: vec![],
            };
        }

        let item_ids: Vec<String> = active
            .iter()
            .filter_map(|&i| listings[i].ebay_item_id.clone())
            .collect();

        let traffic: HashMap<String, crate::gateway::TrafficRecord> = if item_ids.is_empty() {
            HashMap::new()
        } else {
            self.gateway
                .get_traffic_report(item_ids, "LAST_90_DAYS", vec!["views".to_string()])
                .await
                .unwrap_or_default()
        };

        let mut zombies = Vec::new();
        for &i in &active {
            let listing = &mut listings[i];
            let mut views = listing.total_views;
            if let Some(item_id) = &listing.ebay_item_id {
                if let Some(record) = traffic.get(item_id) {
                    views = record.views;
                    listing.total_views = views;
                }
            }

            if listing.days_active >= self.days_threshold && views < self.views_threshold {
                zombies.push(ZombieReport {
                    listing_id: listing.id,
                    sku: listing.sku.clone(),
                    days_active: listing.days_active,
                    total_views: views,
                    zombie_cycle_count: listing.zombie_cycle_count,
                    should_purgatory: listing.zombie_cycle_count >= self.max_cycles,
                });
            }
        }

        let purgatory_candidates = zombies.iter().filter(|z| z.should_purgatory).count();
        info!(
            scanned = active.len(),
            zombies_found = zombies.len(),
            purgatory_candidates,
            "zombie killer scan complete"
        );

        ZombieScanResult {
            total_scanned: active.len(),
            zombies_found: zombies.len(),
            purgatory_candidates,
            zombies,
        }
    }

    /// Flags a single listing as a zombie (or routes it straight to
    /// Purgatory if it has already exhausted its resurrection cycles).
    pub fn flag_zombie(&self, listing: &mut Listing) -> ZombieAction {
        if listing.zombie_cycle_count >= self.max_cycles {
            listing.status = ListingStatus::Purgatory;
            ZombieAction::Purgatored
        } else {
            listing.status = ListingStatus::Zombie;
            ZombieAction::Flagged
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn listing(days_active: i64, total_views: i64, cycles: i64) -> Listing {
        Listing {
            id: 1,
            ebay_item_id: None,
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
            days_active,
            total_views,
            watchers: 0,
            zombie_cycle_count: cycles,
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

    fn killer() -> ZombieKiller {
        let config = Config::from_env();
        ZombieKiller::new(Arc::new(crate::gateway::MockGateway::new()), &config)
    }

    #[tokio::test]
    async fn flags_listing_at_exact_threshold_boundary() {
        let k = killer();
        let mut listings = vec![listing(60, 9, 0)];
        let result = k.scan(&mut listings).await;
        assert_eq!(result.zombies_found, 1);
    }

    #[tokio::test]
    async fn does_not_flag_below_days_threshold() {
        let k = killer();
        let mut listings = vec![listing(59, 0, 0)];
        let result = k.scan(&mut listings).await;
        assert_eq!(result.zombies_found, 0);
    }

    #[tokio::test]
    async fn does_not_flag_at_exact_views_threshold() {
        let k = killer();
        let mut listings = vec![listing(60, 10, 0)];
        let result = k.scan(&mut listings).await;
        assert_eq!(result.zombies_found, 0);
    }

    #[tokio::test]
    async fn flags_purgatory_candidate_after_max_cycles() {
        let k = killer();
        let mut listings = vec![listing(60, 0, 3)];
        let result = k.scan(&mut listings).await;
        assert_eq!(result.purgatory_candidates, 1);
    }

    #[test]
    fn flag_zombie_routes_to_purgatory_past_max_cycles() {
        let k = killer();
        let mut l = listing(60, 0, 3);
        let action = k.flag_zombie(&mut l);
        assert_eq!(action, ZombieAction::Purgatored);
        assert_eq!(l.status, ListingStatus::Purgatory);
    }

    #[test]
    fn flag_zombie_flags_under_max_cycles() {
        let k = killer();
        let mut l = listing(60, 0, 1);
        let action = k.flag_zombie(&mut l);
        assert_eq!(action, ZombieAction::Flagged);
        assert_eq!(l.status, ListingStatus::Zombie);
    }
}
