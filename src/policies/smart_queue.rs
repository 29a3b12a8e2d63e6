//! SmartQueue (spec §4.14): holds drafted listings for a scheduled release
//! window (default: the Sunday-evening surge) instead of publishing them
//! the instant they're ready.

use crate::config::Config;
use crate::domain::{Listing, ListingStatus, QueueEntry, QueueStatus};
use crate::errors::ValidationError;
use crate::gateway::{Gateway, OfferRequest};
use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct QueueStatusSummary {
    pub pending: usize,
    pub released_today: usize,
    pub failed: usize,
    pub total: usize,
    pub surge_window_active: bool,
}

pub struct SmartQueue {
    gateway: Arc<dyn Gateway>,
    batch_size: usize,
    surge_window_day: String,
    surge_start_hour: u32,
    surge_end_hour: u32,
    tz: Tz,
}

fn weekday_index(day: &str) -> Option<u32> {
    match day.to_lowercase().as_str() {
        "monday" => Some(0),
        "tuesday" => Some(1),
        "wednesday" => Some(2),
        "thursday" => Some(3),
        "friday" => Some(4),
        "saturday" => Some(5),
        "sunday" => Some(6),
        _ => None,
    }
}

impl SmartQueue {
    pub fn new(gateway: Arc<dyn Gateway>, config: &Config) -> Self {
        let tz: Tz = config
            .surge_window_timezone
            .parse()
            .unwrap_or(chrono_tz::America::New_York);
        SmartQueue {
            gateway,
            batch_size: config.queue_batch_size.max(0) as usize,
            surge_window_day: config.surge_window_day.to_lowercase(),
            surge_start_hour: config.surge_window_start_hour,
            surge_end_hour: config.surge_window_end_hour,
            tz,
        }
    }

    /// Whether `now` (converted into the configured timezone) falls
    /// within the configured weekday + hour window.
    pub fn is_surge_window_active(&self, now: DateTime<Utc>) -> bool {
        use chrono::Timelike;
        let Some(target_day) = weekday_index(&self.surge_window_day) else {
            return false;
        };
        let local = now.with_timezone(&self.tz);
        local.weekday().num_days_from_monday() == target_day
            && local.hour() >= self.surge_start_hour
            && local.hour() < self.surge_end_hour
    }

    /// Drafts a queue entry for `listing` and transitions it into
    /// `Queued` status, ready to be picked up by the next `select_batch`/
    /// `release_batch` cycle. Enqueuing a listing that doesn't exist is a
    /// validation error, not a silent no-op.
    pub fn enqueue(
        &self,
        listing: Option<&mut Listing>,
        priority: i64,
        now: DateTime<Utc>,
    ) -> Result<QueueEntry, ValidationError> {
        let Some(listing) = listing else {
            return Err(ValidationError::NotFound {
                entity: "listing",
                id: 0,
            });
        };

        listing.status = ListingStatus::Queued;

        Ok(QueueEntry {
            id: 0,
            listing_id: listing.id,
            priority,
            scheduled_window: self.surge_window_day.clone(),
            scheduled_at: None,
            released_at: None,
            status: QueueStatus::Pending,
            error_message: None,
            batch_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Selects up to `batch_size` pending entries ordered by priority
    /// (descending) then age (ascending), without mutating anything.
    pub fn select_batch<'a>(&self, entries: &'a [QueueEntry]) -> Vec<&'a QueueEntry> {
        let mut pending: Vec<&QueueEntry> = entries
            .iter()
            .filter(|e| e.status == QueueStatus::Pending)
            .collect();
        pending.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        pending.truncate(self.batch_size);
        pending
    }

    /// Releases a batch of pending entries: creates and publishes an
    /// offer per listing, restoring its `Active` status. An entry whose
    /// listing has vanished is marked `Failed` and left out of the
    /// released set; any other per-entry gateway failure is recorded
    /// the same way without aborting the rest of the batch.
    pub async fn release_batch(
        &self,
        entries: &mut [QueueEntry],
        listings: &mut [Listing],
        dry_run: bool,
    ) -> Vec<i64> {
        let to_release: Vec<usize> = {
            let selection: Vec<i64> = self
                .select_batch(entries)
                .into_iter()
                .map(|e| e.id)
                .collect();
            entries
                .iter()
                .enumerate()
                .filter(|(_, e)| selection.contains(&e.id))
                .map(|(i, _)| i)
                .collect()
        };

        if dry_run {
            return to_release.into_iter().map(|i| entries[i].id).collect();
        }

        let batch_id = Uuid::new_v4().simple().to_string()[..12].to_string();
        let mut released = Vec::new();

        for i in to_release {
            let listing_id = entries[i].listing_id;
            let listing_idx = listings.iter().position(|l| l.id == listing_id);

            let Some(listing_idx) = listing_idx else {
                entries[i].status = QueueStatus::Failed;
                entries[i].error_message = Some("Listing not found".to_string());
                continue;
            };

            let listing = &listings[listing_idx];
            let result = async {
                let offer_id = self
                    .gateway
                    .create_offer(OfferRequest {
                        sku: listing.sku.clone(),
                        price: listing.list_price,
                        format: "FIXED_PRICE".to_string(),
                    })
                    .await?;
                self.gateway.publish_offer(&offer_id).await
            }
            .await;

            match result {
                Ok(publish) => {
                    let listing = &mut listings[listing_idx];
                    listing.ebay_item_id = Some(publish.listing_id.clone());
                    listing.offer_id = Some(publish.offer_id);
                    listing.status = ListingStatus::Active;
                    listing.listed_at = Some(Utc::now());
                    listing.days_active = 0;

                    entries[i].status = QueueStatus::Released;
                    entries[i].released_at = Some(Utc::now());
                    entries[i].batch_id = Some(batch_id.clone());
                    released.push(entries[i].id);
                }
                Err(e) => {
                    warn!(entry_id = entries[i].id, error = %e, "queue release failed");
                    entries[i].status = QueueStatus::Failed;
                    entries[i].error_message = Some(e.to_string());
                }
            }
        }

        info!(batch_id = %batch_id, released = released.len(), "smart queue batch released");
        released
    }

    pub fn get_queue_status(&self, entries: &[QueueEntry], now: DateTime<Utc>) -> QueueStatusSummary {
        let pending = entries.iter().filter(|e| e.status == QueueStatus::Pending).count();
        let failed = entries.iter().filter(|e| e.status == QueueStatus::Failed).count();
        let released_today = entries
            .iter()
            .filter(|e| {
                e.status == QueueStatus::Released
                    && e.released_at
                        .map(|r| r.date_naive() == now.date_naive())
                        .unwrap_or(false)
            })
            .count();

        QueueStatusSummary {
            pending,
            released_today,
            failed,
            total: entries.len(),
            surge_window_active: self.is_surge_window_active(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn queue() -> SmartQueue {
        let config = Config::from_env();
        SmartQueue::new(Arc::new(crate::gateway::MockGateway::new()), &config)
    }

    #[test]
    fn surge_window_active_on_sunday_evening() {
        let q = queue();
        // 2024-01-07 is a Sunday.
        let now = chrono_tz::America::New_York
            .with_ymd_and_hms(2024, 1, 7, 21, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        assert!(q.is_surge_window_active(now));
    }

    #[test]
    fn surge_window_inactive_on_monday() {
        let q = queue();
        let now = chrono_tz::America::New_York
            .with_ymd_and_hms(2024, 1, 8, 21, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        assert!(!q.is_surge_window_active(now));
    }

    #[test]
    fn surge_window_inactive_outside_hour_range() {
        let q = queue();
        let now = chrono_tz::America::New_York
            .with_ymd_and_hms(2024, 1, 7, 19, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        assert!(!q.is_surge_window_active(now));
    }

    #[test]
    fn select_batch_orders_by_priority_then_age() {
        let q = queue();
        let now = Utc::now();
        let entries = vec![
            QueueEntry {
                id: 1,
                listing_id: 1,
                priority: 0,
                scheduled_window: "sunday_surge".into(),
                scheduled_at: None,
                released_at: None,
                status: QueueStatus::Pending,
                error_message: None,
                batch_id: None,
                created_at: now,
                updated_at: now,
            },
            QueueEntry {
                id: 2,
                listing_id: 2,
                priority: 5,
                scheduled_window: "sunday_surge".into(),
                scheduled_at: None,
                released_at: None,
                status: QueueStatus::Pending,
                error_message: None,
                batch_id: None,
                created_at: now,
                updated_at: now,
            },
        ];
        let batch = q.select_batch(&entries);
        assert_eq!(batch[0].id, 2);
    }

    fn blank_listing() -> Listing {
        let now = Utc::now();
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
            purchase_price: 10.0,
            list_price: 20.0,
            current_price: None,
            shipping_cost: 0.0,
            ad_rate_percent: 0.0,
            status: ListingStatus::Draft,
            listed_at: None,
            days_active: 0,
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
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn enqueue_transitions_listing_to_queued() {
        let q = queue();
        let mut listing = blank_listing();
        let now = Utc::now();
        let entry = q.enqueue(Some(&mut listing), 0, now).unwrap();
        assert_eq!(listing.status, ListingStatus::Queued);
        assert_eq!(entry.status, QueueStatus::Pending);
        assert_eq!(entry.listing_id, listing.id);
    }

    #[test]
    fn enqueue_rejects_missing_listing() {
        let q = queue();
        let result = q.enqueue(None, 0, Utc::now());
        assert!(matches!(result, Err(ValidationError::NotFound { .. })));
    }

    #[tokio::test]
    async fn release_batch_marks_missing_listing_failed() {
        let q = queue();
        let now = Utc::now();
        let mut entries = vec![QueueEntry {
            id: 1,
            listing_id: 99,
            priority: 0,
            scheduled_window: "sunday_surge".into(),
            scheduled_at: None,
            released_at: None,
            status: QueueStatus::Pending,
            error_message: None,
            batch_id: None,
            created_at: now,
            updated_at: now,
        }];
        let mut listings: Vec<Listing> = vec![];
        let released = q.release_batch(&mut entries, &mut listings, false).await;
        assert!(released.is_empty());
        assert_eq!(entries[0].status, QueueStatus::Failed);
        assert_eq!(entries[0].error_message, Some("Listing not found".to_string()));
    }
}
