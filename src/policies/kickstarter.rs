//! Kickstarter campaigns (spec §4.12): a time-boxed ad boost for a newly
//! active listing, cleaned up automatically once it expires.

use crate::config::Config;
use crate::domain::{Campaign, CampaignStatus, CampaignType, Listing, ListingStatus};
use crate::errors::LifecycleError;
use crate::gateway::{CampaignRequest, Gateway};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use tracing::{error, info};

pub struct Kickstarter {
    gateway: Arc<dyn Gateway>,
    ad_rate: f64,
    duration_days: i64,
}

#[derive(Debug, Clone)]
pub struct KickstarterResult {
    pub campaign: Campaign,
    pub ebay_campaign_id: String,
}

impl Kickstarter {
    pub fn new(gateway: Arc<dyn Gateway>, config: &Config) -> Self {
        Kickstarter {
            gateway,
            ad_rate: config.kickstarter_ad_rate,
            duration_days: config.kickstarter_duration_days,
        }
    }

    /// Starts a campaign for `listing`, given the listing's current
    /// campaigns (so a caller can't double-promote). Mutates the
    /// listing's ad rate on success.
    pub async fn promote_new_listing(
        &self,
        listing: &mut Listing,
        existing_campaigns: &[Campaign],
    ) -> Result<KickstarterResult, LifecycleError> {
        if listing.status != ListingStatus::Active {
            return Err(LifecycleError::Cooldown(
                "listing must be active to promote".to_string(),
            ));
        }

        let has_active = existing_campaigns
            .iter()
            .any(|c| c.listing_id == listing.id && c.status == CampaignStatus::Active);
        if has_active {
            return Err(LifecycleError::DuplicateCampaign);
        }

        let ebay_campaign_id = self
            .gateway
            .create_campaign(CampaignRequest {
                campaign_name: format!("Kickstart-{}", listing.sku),
                ad_rate: self.ad_rate,
                listing_id: listing
                    .ebay_item_id
                    .clone()
                    .unwrap_or_else(|| listing.sku.clone()),
            })
            .await
            .map_err(|e| LifecycleError::Cooldown(format!("failed to create campaign: {e}")))?;

        let now = Utc::now();
        let campaign = Campaign {
            id: 0,
            listing_id: listing.id,
            ebay_campaign_id: Some(ebay_campaign_id.clone()),
            campaign_type: CampaignType::Kickstarter,
            ad_rate_percent: self.ad_rate,
            started_at: now,
            ends_at: now + ChronoDuration::days(self.duration_days),
            status: CampaignStatus::Active,
            created_at: now,
            updated_at: now,
        };

        listing.ad_rate_percent = self.ad_rate;

        info!(listing_id = listing.id, campaign_id = %ebay_campaign_id, "kickstarter campaign started");

        Ok(KickstarterResult {
            campaign,
            ebay_campaign_id,
        })
    }

    /// Ends every active campaign whose `ends_at` has passed. A gateway
    /// failure on a given campaign leaves it active for the next run
    /// rather than forcing it closed locally.
    pub async fn cleanup_expired(
        &self,
        campaigns: &mut [Campaign],
        listings_ad_rate_reset: &mut dyn FnMut(i64),
        now: DateTime<Utc>,
    ) -> (usize, usize) {
        let mut ended = 0;
        let mut errors = 0;

        for campaign in campaigns
            .iter_mut()
            .filter(|c| c.status == CampaignStatus::Active && c.ends_at <= now)
        {
            let result = if let Some(id) = &campaign.ebay_campaign_id {
                self.gateway.end_campaign(id).await
            } else {
                Ok(true)
            };

            match result {
                Ok(_) => {
                    campaign.status = CampaignStatus::Ended;
                    listings_ad_rate_reset(campaign.listing_id);
                    ended += 1;
                }
                Err(e) => {
                    error!(campaign_id = ?campaign.ebay_campaign_id, error = %e, "campaign end failed");
                    errors += 1;
                }
            }
        }

        info!(ended, errors, "kickstarter cleanup scan complete");
        (ended, errors)
    }
}
