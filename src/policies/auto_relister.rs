//! Preventive relisting (spec §4.8): resurrects a listing before it ever
//! goes zombie, once it has run long enough without selling.

use crate::config::Config;
use crate::domain::{Listing, ListingStatus, ZombieAction, ZombieRecord};
use crate::policies::resurrector::Resurrector;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct RelistCandidate {
    pub listing_id: i64,
    pub sku: String,
    pub days_active: i64,
    pub total_views: i64,
}

pub struct AutoRelister {
    resurrector: Arc<Resurrector>,
    cadence_days: i64,
    views_threshold: i64,
}

impl AutoRelister {
    pub fn new(resurrector: Arc<Resurrector>, config: &Config) -> Self {
        AutoRelister {
            resurrector,
            cadence_days: config.relist_cadence_days,
            views_threshold: config.relist_views_threshold,
        }
    }

    fn is_due(&self, listing: &Listing) -> bool {
        listing.status == ListingStatus::Active
            && listing.days_active >= self.cadence_days
            && listing.total_views < self.views_threshold
            && listing.offer_id.is_some()
    }

    pub fn preview(&self, listings: &[Listing]) -> Vec<RelistCandidate> {
        listings
            .iter()
            .filter(|l| self.is_due(l))
            .map(|l| RelistCandidate {
                listing_id: l.id,
                sku: l.sku.clone(),
                days_active: l.days_active,
                total_views: l.total_views,
            })
            .collect()
    }

    /// Relists every due listing via the resurrector, recording a
    /// `PreventiveRelist` zombie-record entry. The record's detection
    /// fields are read after the resurrection mutates the listing in
    /// place, so they reflect the post-reset 0/0 state rather than the
    /// pre-relist values — a carried-over quirk of the upstream scan.
    pub async fn auto_relist(&self, listings: &mut [Listing]) -> Vec<ZombieRecord> {
        let mut records = Vec::new();
        let due: Vec<usize> = listings
            .iter()
            .enumerate()
            .filter(|(_, l)| self.is_due(l))
            .map(|(i, _)| i)
            .collect();

        for i in due {
            let listing = &mut listings[i];
            let old_cycle = listing.zombie_cycle_count;
            let result = self.resurrector.resurrect(listing).await;
            if result.success {
                listing.zombie_cycle_count = old_cycle;
                records.push(ZombieRecord {
                    id: 0,
                    listing_id: listing.id,
                    detected_at: Utc::now(),
                    days_active_at_detection: listing.days_active,
                    views_at_detection: listing.total_views,
                    action_taken: ZombieAction::PreventiveRelist,
                    resurrected_at: Some(Utc::now()),
                    old_item_id: result.old_item_id,
                    new_item_id: result.new_item_id,
                    cycle_number: 0,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                });
            }
        }

        info!(relisted = records.len(), "auto-relister scan complete");
        records
    }
}
