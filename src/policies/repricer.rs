//! Scheduled repricer (spec §4.6): drops the price along a tiered
//! days-active schedule, clamped so it never undercuts the profit floor.

use crate::config::Config;
use crate::domain::Listing;
use crate::gatekeepers::ProfitFloor;
use crate::gateway::{BulkPriceQuantityUpdate, Gateway};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Clone, Serialize)]
pub struct RepriceAction {
    pub listing_id: i64,
    pub sku: String,
    pub step: i64,
    pub percent_off: f64,
    pub old_price: f64,
    pub new_price: f64,
    pub min_viable_price: f64,
    pub reason: String,
}

pub struct Repricer {
    gateway: Arc<dyn Gateway>,
    steps: Vec<(i64, f64)>,
    profit_floor: ProfitFloor,
}

impl Repricer {
    pub fn new(gateway: Arc<dyn Gateway>, config: &Config) -> Self {
        Repricer {
            gateway,
            steps: config.reprice_steps.clone(),
            profit_floor: ProfitFloor::new(
                config.ebay_base_fee_rate,
                config.payment_processing_rate,
                config.per_order_fee,
                config.min_profit_floor,
            ),
        }
    }

    /// Latest step whose day threshold has been reached, if any. Returns
    /// `(step_number, percent_off)`, 1-indexed.
    fn current_step(&self, days_active: i64) -> Option<(i64, f64)> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, (day, _))| *day <= days_active)
            .last()
            .map(|(idx, (_, pct))| ((idx + 1) as i64, *pct))
    }

    /// Computes the reprice for one listing, or `None` if no step applies
    /// yet or the new price wouldn't meaningfully change the old one.
    pub fn calculate_reprice(&self, listing: &Listing) -> Option<RepriceAction> {
        let (step, pct) = self.current_step(listing.days_active)?;

        let candidate = crate::gatekeepers::round_half_even_cents(
            listing.list_price * (1.0 - pct / 100.0),
        );
        let min_price = self.profit_floor.find_minimum_price(
            listing.purchase_price,
            listing.shipping_cost,
            listing.ad_rate_percent,
        );
        let new_price = if candidate < min_price {
            min_price
        } else {
            candidate
        };

        let current = listing.effective_price();
        if (new_price - current).abs() < 0.01 {
            return None;
        }

        Some(RepriceAction {
            listing_id: listing.id,
            sku: listing.sku.clone(),
            step,
            percent_off: pct,
            old_price: current,
            new_price,
            min_viable_price: min_price,
            reason: format!("step {step} ({pct}% off list price)"),
        })
    }

    /// Previews the reprice actions a scan would take, without mutating
    /// anything or calling the gateway.
    pub fn preview(&self, listings: &[Listing]) -> Vec<RepriceAction> {
        listings
            .iter()
            .filter(|l| l.status == crate::domain::ListingStatus::Active)
            .filter_map(|l| self.calculate_reprice(l))
            .collect()
    }

    /// Applies reprice actions: computes them all first, pushes one
    /// bulk price update to the gateway, and reports how many listings
    /// were touched and how many were skipped. A gateway failure counts
    /// the whole batch as errored — callers are expected to have already
    /// committed whatever local mutation they intend before calling this,
    /// mirroring the upstream's no-rollback-on-batch-failure behavior.
    pub async fn execute(&self, listings: &[Listing]) -> RepriceRunResult {
        let actions = self.preview(listings);
        let skipped = listings
            .iter()
            .filter(|l| l.status == crate::domain::ListingStatus::Active)
            .count()
            - actions.len();

        if actions.is_empty() {
            info!(scanned = listings.len(), repriced = 0, skipped, "repricer scan complete");
            return RepriceRunResult {
                actions: vec![],
                errors: 0,
            };
        }

        let updates: Vec<BulkPriceQuantityUpdate> = actions
            .iter()
            .map(|a| BulkPriceQuantityUpdate {
                sku: a.sku.clone(),
                price: Some(a.new_price),
                handling_days: None,
            })
            .collect();

        match self.gateway.bulk_update_price_quantity(updates).await {
            Ok(_) => {
                info!(
                    scanned = listings.len(),
                    repriced = actions.len(),
                    skipped,
                    "repricer scan complete"
                );
                RepriceRunResult { actions, errors: 0 }
            }
            Err(e) => {
                error!(error = %e, batch_size = actions.len(), "repricer bulk update failed");
                RepriceRunResult {
                    errors: actions.len(),
                    actions,
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RepriceRunResult {
    pub actions: Vec<RepriceAction>,
    pub errors: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ListingStatus;
    use chrono::Utc;

    fn listing(days_active: i64, list_price: f64, current_price: Option<f64>) -> Listing {
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
            list_price,
            current_price,
            shipping_cost: 5.0,
            ad_rate_percent: 0.0,
            status: ListingStatus::Active,
            listed_at: None,
            days_active,
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

    fn repricer() -> Repricer {
        let config = Config::from_env();
        Repricer::new(Arc::new(crate::gateway::MockGateway::new()), &config)
    }

    #[test]
    fn no_step_applies_before_first_threshold() {
        let r = repricer();
        let l = listing(3, 100.0, None);
        assert!(r.calculate_reprice(&l).is_none());
    }

    #[test]
    fn applies_latest_matching_step() {
        let r = repricer();
        let l = listing(20, 100.0, None);
        let action = r.calculate_reprice(&l).unwrap();
        assert_eq!(action.step, 2);
        assert_eq!(action.percent_off, 20.0);
        assert_eq!(action.new_price, 80.0);
    }

    #[test]
    fn skips_when_new_price_matches_current() {
        let r = repricer();
        let l = listing(20, 100.0, Some(80.0));
        assert!(r.calculate_reprice(&l).is_none());
    }

    #[test]
    fn clamps_up_to_minimum_viable_price() {
        let r = repricer();
        let l = listing(45, 31.0, None);
        let action = r.calculate_reprice(&l).unwrap();
        assert!(action.new_price >= action.min_viable_price);
    }
}
