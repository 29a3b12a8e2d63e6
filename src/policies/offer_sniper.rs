//! Offer sniper (spec §4.9): proactively discounts to watchers on a
//! tiered schedule, and triages inbound buyer offers against
//! accept/counter/reject thresholds.

use crate::config::Config;
use crate::domain::{Listing, OfferAction, OfferRecord, OfferStatus};
use crate::errors::ValidationError;
use crate::gatekeepers::round_half_even_cents;
use crate::gateway::Gateway;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SnipeOutcome {
    pub listing_id: i64,
    pub buyer_id: String,
    pub offer_price: f64,
    pub discount_percent: f64,
}

pub struct OfferSniper {
    gateway: Arc<dyn Gateway>,
    tiers: Vec<(i64, f64)>,
    auto_accept_threshold: f64,
    counter_threshold: f64,
    counter_percent: f64,
}

impl OfferSniper {
    pub fn new(gateway: Arc<dyn Gateway>, config: &Config) -> Self {
        OfferSniper {
            gateway,
            tiers: config.offer_tiers.clone(),
            auto_accept_threshold: config.offer_auto_accept_threshold,
            counter_threshold: config.offer_counter_threshold,
            counter_percent: config.offer_counter_percent,
        }
    }

    /// The discount percent for a listing's days-active tier: the first
    /// tier's percent as a fallback when none match, or 10% if there are
    /// no tiers configured at all.
    pub fn get_discount_percent(&self, days_active: i64) -> f64 {
        if self.tiers.is_empty() {
            return 10.0;
        }
        self.tiers
            .iter()
            .rev()
            .find(|(day, _)| *day <= days_active)
            .map(|(_, pct)| *pct)
            .unwrap_or(self.tiers[0].1)
    }

    pub fn calculate_offer_price(&self, current_price: f64, discount_percent: f64) -> f64 {
        round_half_even_cents(current_price * (1.0 - discount_percent / 100.0))
    }

    fn was_offer_sent_recently(
        &self,
        records: &[OfferRecord],
        listing_id: i64,
        buyer_id: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let cutoff = now - ChronoDuration::hours(24);
        records
            .iter()
            .any(|r| r.listing_id == listing_id && r.buyer_id == buyer_id && r.sent_at >= cutoff)
    }

    /// Sends a tiered discount offer to every watcher of `listing` who
    /// hasn't received one in the last 24 hours. Per-watcher and
    /// per-listing failures are both counted and do not stop the scan.
    pub async fn scan_and_snipe(
        &self,
        listing: &Listing,
        existing_offers: &[OfferRecord],
        now: DateTime<Utc>,
    ) -> (Vec<SnipeOutcome>, usize) {
        let mut sent = Vec::new();
        let mut errors = 0;

        let Some(item_id) = &listing.ebay_item_id else {
            return (sent, errors);
        };

        let watchers = match self.gateway.get_watchers(item_id).await {
            Ok(w) => w,
            Err(e) => {
                warn!(listing_id = listing.id, error = %e, "failed to fetch watchers");
                return (sent, 1);
            }
        };

        let discount_pct = self.get_discount_percent(listing.days_active);
        let current_price = listing.effective_price();
        let offer_price = self.calculate_offer_price(current_price, discount_pct);

        for buyer_id in watchers {
            if self.was_offer_sent_recently(existing_offers, listing.id, &buyer_id, now) {
                continue;
            }

            let message = format!(
                "Special offer: ${offer_price:.2} ({:.0}% off)!",
                discount_pct.round()
            );
            match self
                .gateway
                .send_offer_to_buyer(item_id, &buyer_id, offer_price, &message)
                .await
            {
                Ok(()) => sent.push(SnipeOutcome {
                    listing_id: listing.id,
                    buyer_id,
                    offer_price,
                    discount_percent: discount_pct,
                }),
                Err(e) => {
                    warn!(listing_id = listing.id, buyer_id = %buyer_id, error = %e, "offer send failed");
                    errors += 1;
                }
            }
        }

        info!(listing_id = listing.id, sent = sent.len(), errors, "offer sniper scan complete");
        (sent, errors)
    }

    /// Decides what to do with an inbound buyer offer: accept above the
    /// auto-accept threshold, counter above the counter threshold, else
    /// reject. Relays the decision to the marketplace via `respond_to_offer`
    /// before returning the action plus a counter price when applicable.
    pub async fn handle_incoming_offer(
        &self,
        offer_id: &str,
        current_price: f64,
        offer_amount: f64,
    ) -> Result<(OfferAction, Option<f64>), ValidationError> {
        if current_price <= 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "current_price",
                message: "must be greater than zero".to_string(),
            });
        }

        let ratio = offer_amount / current_price;
        let (action, counter_price) = if ratio >= self.auto_accept_threshold {
            (OfferAction::Accept, None)
        } else if ratio >= self.counter_threshold {
            let counter_price = round_half_even_cents(current_price * self.counter_percent);
            (OfferAction::Counter, Some(counter_price))
        } else {
            (OfferAction::Reject, None)
        };

        if let Err(e) = self
            .gateway
            .respond_to_offer(offer_id, action.as_str(), counter_price)
            .await
        {
            warn!(offer_id, error = %e, "failed to relay offer response");
        }

        Ok((action, counter_price))
    }

    pub fn record_status_for(action: OfferAction) -> OfferStatus {
        match action {
            OfferAction::Accept => OfferStatus::Accepted,
            OfferAction::Counter | OfferAction::Reject => OfferStatus::Sent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ListingStatus;

    fn sniper() -> OfferSniper {
        let config = Config::from_env();
        OfferSniper::new(Arc::new(crate::gateway::MockGateway::new()), &config)
    }

    #[test]
    fn discount_percent_uses_latest_matching_tier() {
        let s = sniper();
        assert_eq!(s.get_discount_percent(0), 5.0);
        assert_eq!(s.get_discount_percent(20), 10.0);
        assert_eq!(s.get_discount_percent(100), 20.0);
    }

    #[test]
    fn calculate_offer_price_applies_discount() {
        let s = sniper();
        assert_eq!(s.calculate_offer_price(100.0, 10.0), 90.0);
    }

    #[tokio::test]
    async fn handle_incoming_offer_accepts_above_threshold() {
        let s = sniper();
        let (action, counter) = s.handle_incoming_offer("offer-1", 100.0, 92.0).await.unwrap();
        assert_eq!(action, OfferAction::Accept);
        assert!(counter.is_none());
    }

    #[tokio::test]
    async fn handle_incoming_offer_counters_mid_range() {
        let s = sniper();
        let (action, counter) = s.handle_incoming_offer("offer-1", 100.0, 80.0).await.unwrap();
        assert_eq!(action, OfferAction::Counter);
        assert_eq!(counter, Some(95.0));
    }

    #[tokio::test]
    async fn handle_incoming_offer_rejects_low_ball() {
        let s = sniper();
        let (action, counter) = s.handle_incoming_offer("offer-1", 100.0, 50.0).await.unwrap();
        assert_eq!(action, OfferAction::Reject);
        assert!(counter.is_none());
    }

    #[tokio::test]
    async fn handle_incoming_offer_rejects_non_positive_price() {
        let s = sniper();
        let result = s.handle_incoming_offer("offer-1", 0.0, 50.0).await;
        assert!(matches!(result, Err(ValidationError::OutOfRange { .. })));
    }

    #[tokio::test]
    async fn scan_and_snipe_skips_buyers_within_cooldown() {
        let gw = Arc::new(crate::gateway::MockGateway::new());
        gw.set_watchers("MOCK-1", vec!["buyer-1".to_string()]);
        let config = Config::from_env();
        let s = OfferSniper::new(gw, &config);
        let listing = Listing {
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
            days_active: 5,
            total_views: 0,
            watchers: 1,
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
        };
        let now = Utc::now();
        let recent = OfferRecord {
            id: 1,
            listing_id: 1,
            buyer_id: "buyer-1".into(),
            offer_price: 90.0,
            discount_percent: 10.0,
            sent_at: now - ChronoDuration::hours(1),
            status: OfferStatus::Sent,
            created_at: now,
            updated_at: now,
        };
        let (sent, errors) = s.scan_and_snipe(&listing, &[recent], now).await;
        assert!(sent.is_empty());
        assert_eq!(errors, 0);
    }
}
