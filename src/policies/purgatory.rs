//! Purgatory (spec §4.10): a deep markdown for listings that have
//! exhausted their resurrection cycles, with a donate/trash suggestion
//! once they've sat there too long.

use crate::config::Config;
use crate::domain::{Listing, ListingStatus};
use crate::gatekeepers::round_half_even_cents;
use crate::gateway::{BulkPriceQuantityUpdate, Gateway};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Clone, Serialize)]
pub struct PurgatoryEntryResult {
    pub success: bool,
    pub listing_id: i64,
    pub markdown_price: f64,
    pub estimated_loss: f64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DonateSuggestion {
    pub listing_id: i64,
    pub sku: String,
    pub days_active: i64,
}

pub struct Purgatory {
    gateway: Arc<dyn Gateway>,
    ebay_base_fee_rate: f64,
    payment_processing_rate: f64,
    per_order_fee: f64,
    sale_percent: f64,
}

impl Purgatory {
    pub fn new(gateway: Arc<dyn Gateway>, config: &Config) -> Self {
        Purgatory {
            gateway,
            ebay_base_fee_rate: config.ebay_base_fee_rate,
            payment_processing_rate: config.payment_processing_rate,
            per_order_fee: config.per_order_fee,
            sale_percent: config.purgatory_sale_percent,
        }
    }

    /// Break-even price excludes ad rate, unlike the gatekeeper's minimum
    /// viable price — Purgatory listings are assumed to be carrying no ad
    /// spend by the time they land here.
    pub fn calculate_break_even_price(&self, purchase_price: f64, shipping_cost: f64) -> f64 {
        let denominator = 1.0 - self.ebay_base_fee_rate - self.payment_processing_rate;
        if denominator <= 0.0 {
            return f64::INFINITY;
        }
        (purchase_price + shipping_cost + self.per_order_fee) / denominator
    }

    pub fn calculate_sale_price(&self, purchase_price: f64, shipping_cost: f64) -> f64 {
        round_half_even_cents(self.calculate_break_even_price(purchase_price, shipping_cost))
    }

    pub fn calculate_markdown_price(&self, purchase_price: f64, shipping_cost: f64) -> f64 {
        let break_even = self.calculate_break_even_price(purchase_price, shipping_cost);
        round_half_even_cents(break_even * (1.0 - self.sale_percent / 100.0))
    }

    /// Marks a listing Purgatory and pushes its markdown price. A gateway
    /// failure reverts the status/price mutation before returning the
    /// failure result, so a caller inspecting `listing` after an `Err`
    /// sees it unchanged.
    pub async fn enter_purgatory(&self, listing: &mut Listing) -> PurgatoryEntryResult {
        let markdown = self.calculate_markdown_price(listing.purchase_price, listing.shipping_cost);
        let previous_status = listing.status;
        let previous_price = listing.current_price;
        listing.status = ListingStatus::Purgatory;
        listing.current_price = Some(markdown);

        if listing.ebay_item_id.is_some() {
            let update = BulkPriceQuantityUpdate {
                sku: listing.sku.clone(),
                price: Some(markdown),
                handling_days: None,
            };
            if let Err(e) = self.gateway.bulk_update_price_quantity(vec![update]).await {
                error!(listing_id = listing.id, error = %e, "purgatory markdown push failed");
                listing.status = previous_status;
                listing.current_price = previous_price;
                return PurgatoryEntryResult {
                    success: false,
                    listing_id: listing.id,
                    markdown_price: markdown,
                    estimated_loss: 0.0,
                    error: Some(e.to_string()),
                };
            }
        }

        let net_profit = round_half_even_cents(
            markdown
                - listing.purchase_price
                - listing.shipping_cost
                - round_half_even_cents(
                    markdown * (self.ebay_base_fee_rate + self.payment_processing_rate)
                        + self.per_order_fee,
                ),
        );
        let estimated_loss = if net_profit < 0.0 { net_profit.abs() } else { 0.0 };

        info!(listing_id = listing.id, markdown, estimated_loss, "listing entered purgatory");

        PurgatoryEntryResult {
            success: true,
            listing_id: listing.id,
            markdown_price: markdown,
            estimated_loss,
            error: None,
        }
    }

    /// Purgatory listings whose `days_active` exceeds 7 are surfaced as
    /// donate-or-trash candidates.
    pub fn scan_for_purgatory(&self, listings: &[Listing]) -> Vec<DonateSuggestion> {
        listings
            .iter()
            .filter(|l| l.status == ListingStatus::Purgatory && l.days_active > 7)
            .map(|l| DonateSuggestion {
                listing_id: l.id,
                sku: l.sku.clone(),
                days_active: l.days_active,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn listing() -> Listing {
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
            status: ListingStatus::Zombie,
            listed_at: None,
            days_active: 10,
            total_views: 0,
            watchers: 0,
            zombie_cycle_count: 3,
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

    fn purgatory() -> Purgatory {
        let config = Config::from_env();
        Purgatory::new(Arc::new(crate::gateway::MockGateway::new()), &config)
    }

    #[test]
    fn break_even_excludes_ad_rate() {
        let p = purgatory();
        let be = p.calculate_break_even_price(30.0, 5.0);
        assert_eq!(be, (30.0 + 5.0 + 0.30) / (1.0 - 0.13 - 0.029));
    }

    #[test]
    fn markdown_is_discounted_off_break_even() {
        let p = purgatory();
        let be = p.calculate_break_even_price(30.0, 5.0);
        let markdown = p.calculate_markdown_price(30.0, 5.0);
        assert!(markdown < be);
    }

    #[test]
    fn scan_for_purgatory_requires_strictly_more_than_seven_days() {
        let p = purgatory();
        let mut l = listing();
        l.status = ListingStatus::Purgatory;
        l.days_active = 7;
        assert!(p.scan_for_purgatory(&[l.clone()]).is_empty());
        l.days_active = 8;
        assert_eq!(p.scan_for_purgatory(&[l]).len(), 1);
    }

    #[tokio::test]
    async fn enter_purgatory_sets_status_and_markdown_price() {
        let p = purgatory();
        let mut l = listing();
        let result = p.enter_purgatory(&mut l).await;
        assert!(result.success);
        assert_eq!(l.status, ListingStatus::Purgatory);
        assert_eq!(l.current_price, Some(result.markdown_price));
    }

    #[tokio::test]
    async fn enter_purgatory_reverts_mutation_on_gateway_failure() {
        let gw = Arc::new(crate::gateway::MockGateway::new());
        gw.inject_failure(
            "bulk_update_price_quantity",
            crate::errors::GatewayError::Transport("simulated outage".into()),
        );
        let config = Config::from_env();
        let p = Purgatory::new(gw, &config);
        let mut l = listing();
        let original_status = l.status;
        let original_price = l.current_price;
        let result = p.enter_purgatory(&mut l).await;
        assert!(!result.success);
        assert_eq!(l.status, original_status);
        assert_eq!(l.current_price, original_price);
    }
}
