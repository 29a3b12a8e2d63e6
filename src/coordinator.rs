//! The policy coordinator (spec §5): one entry point per policy, each
//! wrapping the unit of work in a store transaction and a `JobLog` row.
//! A failed transaction means no listing mutation and no audit record
//! ever reach disk — only a successful run gets logged.

use crate::config::Config;
use crate::domain::{JobStatus, Listing, ZombieRecord};
use crate::gateway::Gateway;
use crate::policies::{
    AutoRelister, Kickstarter, OfferSniper, PhotoShuffler, Purgatory, Repricer, RepriceRunResult,
    Resurrector, SmartQueue, StorePulse, ZombieKiller, ZombieScanResult,
};
use crate::store::Store;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

/// Holds every policy bound to the same gateway/store/config, so the API
/// layer (or a cron-style caller) has one object to reach for.
pub struct Coordinator {
    store: Store,
    pub repricer: Repricer,
    pub zombie_killer: ZombieKiller,
    pub resurrector: Arc<Resurrector>,
    pub auto_relister: AutoRelister,
    pub purgatory: Purgatory,
    pub kickstarter: Kickstarter,
    pub offer_sniper: OfferSniper,
    pub photo_shuffler: PhotoShuffler,
    pub store_pulse: StorePulse,
    pub smart_queue: SmartQueue,
}

impl Coordinator {
    pub fn new(store: Store, gateway: Arc<dyn Gateway>, config: &Config) -> Self {
        let resurrector = Arc::new(Resurrector::new(
            gateway.clone(),
            config.resurrection_delay_seconds,
        ));

        Coordinator {
            store,
            repricer: Repricer::new(gateway.clone(), config),
            zombie_killer: ZombieKiller::new(gateway.clone(), config),
            resurrector: resurrector.clone(),
            auto_relister: AutoRelister::new(resurrector, config),
            purgatory: Purgatory::new(gateway.clone(), config),
            kickstarter: Kickstarter::new(gateway.clone(), config),
            offer_sniper: OfferSniper::new(gateway.clone(), config),
            photo_shuffler: PhotoShuffler::new(gateway.clone(), config),
            store_pulse: StorePulse::new(gateway.clone()),
            smart_queue: SmartQueue::new(gateway, config),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Runs the repricer against `listings`, persisting every changed
    /// `current_price`/`last_repriced_at` inside one transaction and
    /// logging the run as a `JobLog` row.
    pub async fn run_repricer(&self, listings: &mut [Listing]) -> RepriceRunResult {
        let result = self.repricer.execute(listings).await;
        let now = Utc::now();
        for action in &result.actions {
            if let Some(l) = listings.iter_mut().find(|l| l.id == action.listing_id) {
                l.current_price = Some(action.new_price);
                l.last_repriced_at = Some(now);
            }
        }

        let processed = listings.len() as i64;
        let affected = result.actions.len() as i64;
        let changed: Vec<Listing> = listings.to_vec();
        let store = self.store.clone();
        self.run_job("repricer", "scheduled", move || async move {
            store.save_listings(&changed).await?;
            Ok((processed, affected))
        })
        .await;

        result
    }

    /// Runs the zombie-killer scan, persisting refreshed `total_views`
    /// (and any other in-place mutation the scan made) and logging the
    /// run.
    pub async fn run_zombie_scan(&self, listings: &mut [Listing]) -> ZombieScanResult {
        let result = self.zombie_killer.scan(listings).await;
        let processed = result.total_scanned as i64;
        let affected = result.zombies_found as i64;
        let changed: Vec<Listing> = listings.to_vec();
        let store = self.store.clone();
        self.run_job("zombie_killer", "scheduled", move || async move {
            store.save_listings(&changed).await?;
            Ok((processed, affected))
        })
        .await;

        result
    }

    /// Runs the preventive-relister sweep, persisting every relisted
    /// listing's reset state and logging the run.
    pub async fn run_auto_relist(&self, listings: &mut [Listing]) -> Vec<ZombieRecord> {
        let records = self.auto_relister.auto_relist(listings).await;
        let processed = listings.len() as i64;
        let affected = records.len() as i64;
        let changed: Vec<Listing> = listings.to_vec();
        let store = self.store.clone();
        self.run_job("auto_relister", "scheduled", move || async move {
            store.save_listings(&changed).await?;
            Ok((processed, affected))
        })
        .await;

        records
    }

    /// Resurrects a single zombie listing under a new SKU, persisting the
    /// full reset state on success.
    pub async fn run_resurrect(
        &self,
        listing: &mut Listing,
    ) -> crate::policies::resurrector::ResurrectionResult {
        let result = self.resurrector.resurrect(listing).await;
        let success = result.success;
        let changed = listing.clone();
        let store = self.store.clone();
        self.run_job("resurrector", "on_demand", move || async move {
            if success {
                store.save_listings(std::slice::from_ref(&changed)).await?;
            }
            Ok((1, if success { 1 } else { 0 }))
        })
        .await;

        result
    }

    /// Marks a single listing Purgatory, persisting its new status/price
    /// only when the gateway push (and thus the mutation) actually stuck.
    pub async fn run_purgatory_entry(
        &self,
        listing: &mut Listing,
    ) -> crate::policies::purgatory::PurgatoryEntryResult {
        let result = self.purgatory.enter_purgatory(listing).await;
        let success = result.success;
        let changed = listing.clone();
        let store = self.store.clone();
        self.run_job("purgatory", "on_demand", move || async move {
            if success {
                store.save_listings(std::slice::from_ref(&changed)).await?;
            }
            Ok((1, if success { 1 } else { 0 }))
        })
        .await;

        result
    }

    /// Starts a Kickstarter campaign for `listing`, persisting the new
    /// campaign row and the listing's bumped ad rate together.
    pub async fn run_kickstarter_promote(
        &self,
        listing: &mut Listing,
        existing_campaigns: &[crate::domain::Campaign],
    ) -> Result<crate::policies::kickstarter::KickstarterResult, crate::errors::LifecycleError> {
        let result = self.kickstarter.promote_new_listing(listing, existing_campaigns).await?;
        let changed = listing.clone();
        let campaign = result.campaign.clone();
        let store = self.store.clone();
        self.run_job("kickstarter", "on_demand", move || async move {
            store.insert_campaign(&campaign).await?;
            store.save_listings(std::slice::from_ref(&changed)).await?;
            Ok((1, 1))
        })
        .await;

        Ok(result)
    }

    /// Runs an offer-sniper sweep against one listing's watchers,
    /// persisting an `OfferRecord` row per offer actually sent.
    pub async fn run_offer_snipe(
        &self,
        listing: &Listing,
        existing_offers: &[crate::domain::OfferRecord],
        now: chrono::DateTime<Utc>,
    ) -> (Vec<crate::policies::offer_sniper::SnipeOutcome>, usize) {
        let (sent, errors) = self.offer_sniper.scan_and_snipe(listing, existing_offers, now).await;
        let processed = 1i64;
        let affected = sent.len() as i64;
        let records: Vec<crate::domain::OfferRecord> = sent
            .iter()
            .map(|s| crate::domain::OfferRecord {
                id: 0,
                listing_id: s.listing_id,
                buyer_id: s.buyer_id.clone(),
                offer_price: s.offer_price,
                discount_percent: s.discount_percent,
                sent_at: now,
                status: crate::domain::OfferStatus::Sent,
                created_at: now,
                updated_at: now,
            })
            .collect();
        let store = self.store.clone();
        self.run_job("offer_sniper", "scheduled", move || async move {
            for record in &records {
                store.insert_offer_record(record).await?;
            }
            Ok((processed, affected))
        })
        .await;

        (sent, errors)
    }

    /// Runs the photo shuffler, persisting every listing whose photo
    /// order changed.
    pub async fn run_photo_shuffle(
        &self,
        listings: &mut [Listing],
    ) -> (
        Vec<crate::policies::photo_shuffler::ShuffleOutcome>,
        Vec<crate::policies::photo_shuffler::ShuffleSkip>,
    ) {
        let (shuffled, skipped) = self.photo_shuffler.scan_and_shuffle(listings).await;
        let processed = listings.len() as i64;
        let affected = shuffled.len() as i64;
        let changed: Vec<Listing> = listings.to_vec();
        let store = self.store.clone();
        self.run_job("photo_shuffler", "scheduled", move || async move {
            store.save_listings(&changed).await?;
            Ok((processed, affected))
        })
        .await;

        (shuffled, skipped)
    }

    /// Toggles store-wide handling time. Nothing persists locally besides
    /// the job log — the effect lives entirely on the marketplace side.
    pub async fn run_store_pulse(
        &self,
        listings: &[Listing],
        target_days: Option<i64>,
    ) -> crate::policies::store_pulse::PulseResult {
        let result = match target_days {
            Some(days) => self.store_pulse.extend_handling_time(listings, days).await,
            None => self.store_pulse.revert_handling_time(listings).await,
        };
        let processed = listings.len() as i64;
        let affected = result.updated as i64;
        self.run_job("store_pulse", "scheduled", move || async move { Ok((processed, affected)) })
            .await;

        result
    }

    /// Drafts and persists a new queue entry for `listing`.
    pub async fn run_smart_queue_enqueue(
        &self,
        listing: &mut Listing,
        priority: i64,
        now: chrono::DateTime<Utc>,
    ) -> Result<crate::domain::QueueEntry, crate::errors::ValidationError> {
        let entry = self.smart_queue.enqueue(Some(listing), priority, now)?;
        let changed = listing.clone();
        let to_insert = entry.clone();
        let store = self.store.clone();
        self.run_job("smart_queue_enqueue", "on_demand", move || async move {
            store.insert_queue_entry(&to_insert).await?;
            store.save_listings(std::slice::from_ref(&changed)).await?;
            Ok((1, 1))
        })
        .await;

        Ok(entry)
    }

    /// Releases a batch of queued listings, persisting the activated
    /// listings and their queue entries' outcome together.
    pub async fn run_smart_queue_release(
        &self,
        entries: &mut [crate::domain::QueueEntry],
        listings: &mut [Listing],
        dry_run: bool,
    ) -> Vec<i64> {
        let released = self.smart_queue.release_batch(entries, listings, dry_run).await;
        if dry_run {
            return released;
        }

        let processed = entries.len() as i64;
        let affected = released.len() as i64;
        let changed_listings: Vec<Listing> = listings.to_vec();
        let changed_entries: Vec<crate::domain::QueueEntry> = entries.to_vec();
        let store = self.store.clone();
        self.run_job("smart_queue_release", "scheduled", move || async move {
            store.save_listings(&changed_listings).await?;
            store.update_queue_entries(&changed_entries).await?;
            Ok((processed, affected))
        })
        .await;

        released
    }

    /// Writes the starting half of a `JobLog` row and returns its id.
    async fn start_job(&self, job_name: &str, job_type: &str) -> anyhow::Result<i64> {
        let job_name = job_name.to_string();
        let job_type = job_type.to_string();
        let now = Utc::now().to_rfc3339();
        self.store
            .with_conn(move |conn| {
                conn.execute(
                    "INSERT INTO job_logs (job_name, job_type, started_at, status, created_at, updated_at) VALUES (?1, ?2, ?3, 'running', ?3, ?3)",
                    rusqlite::params![job_name, job_type, now],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
    }

    /// Finalizes a `JobLog` row with outcome counts.
    async fn finish_job(
        &self,
        job_id: i64,
        status: JobStatus,
        items_processed: i64,
        items_affected: i64,
        error_message: Option<String>,
    ) -> anyhow::Result<()> {
        let now = Utc::now().to_rfc3339();
        let status_str = status.as_str().to_string();
        self.store
            .with_conn(move |conn| {
                conn.execute(
                    "UPDATE job_logs SET finished_at = ?1, status = ?2, items_processed = ?3, items_affected = ?4, error_message = ?5, updated_at = ?1 WHERE id = ?6",
                    rusqlite::params![now, status_str, items_processed, items_affected, error_message, job_id],
                )?;
                Ok(())
            })
            .await
    }

    /// Runs `body`, logging a `JobLog` row around it. `body` returns the
    /// (items_processed, items_affected) counts for the scan.
    pub async fn run_job<F, Fut>(&self, job_name: &str, job_type: &str, body: F)
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = anyhow::Result<(i64, i64)>>,
    {
        let job_id = match self.start_job(job_name, job_type).await {
            Ok(id) => id,
            Err(e) => {
                error!(job_name, error = %e, "failed to record job start");
                return;
            }
        };

        match body().await {
            Ok((processed, affected)) => {
                info!(job_name, processed, affected, "policy run succeeded");
                if let Err(e) = self
                    .finish_job(job_id, JobStatus::Success, processed, affected, None)
                    .await
                {
                    error!(job_name, error = %e, "failed to record job completion");
                }
            }
            Err(e) => {
                error!(job_name, error = %e, "policy run failed");
                if let Err(log_err) = self
                    .finish_job(job_id, JobStatus::Failed, 0, 0, Some(e.to_string()))
                    .await
                {
                    error!(job_name, error = %log_err, "failed to record job failure");
                }
            }
        }
    }
}
