//! SQLite-backed persistence. Schema creation is idempotent
//! (`CREATE TABLE IF NOT EXISTS`), WAL mode is turned on for concurrent
//! reader/writer access, and every multi-row mutation runs inside a
//! `with_transaction` closure so a failed policy leaves no partial
//! writes behind.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::sync::Arc;
use tokio::sync::Mutex;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS listings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ebay_item_id TEXT UNIQUE,
    sku TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    title_sanitized TEXT,
    description TEXT NOT NULL DEFAULT '',
    description_mobile TEXT,
    brand TEXT,
    model TEXT,
    category_id TEXT,
    condition_id TEXT NOT NULL DEFAULT '3000',
    purchase_price REAL NOT NULL,
    list_price REAL NOT NULL,
    current_price REAL,
    shipping_cost REAL NOT NULL DEFAULT 0,
    ad_rate_percent REAL NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'draft',
    listed_at TEXT,
    days_active INTEGER NOT NULL DEFAULT 0,
    total_views INTEGER NOT NULL DEFAULT 0,
    watchers INTEGER NOT NULL DEFAULT 0,
    zombie_cycle_count INTEGER NOT NULL DEFAULT 0,
    sell_through_rate REAL,
    str_data_source TEXT,
    photo_urls_json TEXT,
    main_photo_index INTEGER NOT NULL DEFAULT 0,
    offer_id TEXT,
    last_offer_sent_at TEXT,
    last_repriced_at TEXT,
    deleted INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_listings_status ON listings(status);
CREATE INDEX IF NOT EXISTS idx_listings_ebay_item_id ON listings(ebay_item_id);

CREATE TABLE IF NOT EXISTS listing_snapshots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    listing_id INTEGER NOT NULL REFERENCES listings(id),
    snapshot_date TEXT NOT NULL,
    views INTEGER NOT NULL DEFAULT 0,
    impressions INTEGER NOT NULL DEFAULT 0,
    watchers INTEGER NOT NULL DEFAULT 0,
    price_at_snapshot REAL NOT NULL,
    status_at_snapshot TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_snapshots_listing_id ON listing_snapshots(listing_id);

CREATE TABLE IF NOT EXISTS zombie_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    listing_id INTEGER NOT NULL REFERENCES listings(id),
    detected_at TEXT NOT NULL,
    days_active_at_detection INTEGER NOT NULL,
    views_at_detection INTEGER NOT NULL,
    action_taken TEXT NOT NULL,
    resurrected_at TEXT,
    old_item_id TEXT,
    new_item_id TEXT,
    cycle_number INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_zombie_records_listing_id ON zombie_records(listing_id);

CREATE TABLE IF NOT EXISTS campaigns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    listing_id INTEGER NOT NULL REFERENCES listings(id),
    ebay_campaign_id TEXT,
    campaign_type TEXT NOT NULL,
    ad_rate_percent REAL NOT NULL,
    started_at TEXT NOT NULL,
    ends_at TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_campaigns_listing_id ON campaigns(listing_id);
CREATE INDEX IF NOT EXISTS idx_campaigns_status ON campaigns(status);

CREATE TABLE IF NOT EXISTS profit_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    listing_id INTEGER NOT NULL REFERENCES listings(id),
    sale_price REAL NOT NULL,
    purchase_price REAL NOT NULL,
    shipping_cost REAL NOT NULL,
    ebay_fee_percent REAL NOT NULL,
    ad_fee_percent REAL NOT NULL,
    ebay_fee_amount REAL NOT NULL,
    payment_processing_amount REAL NOT NULL,
    ad_fee_amount REAL NOT NULL,
    total_fees REAL NOT NULL,
    net_profit REAL NOT NULL,
    profit_margin_percent REAL NOT NULL,
    profit_floor REAL NOT NULL,
    meets_floor INTEGER NOT NULL,
    minimum_viable_price REAL NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_profit_records_listing_id ON profit_records(listing_id);

CREATE TABLE IF NOT EXISTS queue_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    listing_id INTEGER NOT NULL REFERENCES listings(id),
    priority INTEGER NOT NULL DEFAULT 0,
    scheduled_window TEXT NOT NULL DEFAULT 'sunday_surge',
    scheduled_at TEXT,
    released_at TEXT,
    status TEXT NOT NULL DEFAULT 'pending',
    error_message TEXT,
    batch_id TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_queue_entries_listing_id ON queue_entries(listing_id);
CREATE INDEX IF NOT EXISTS idx_queue_entries_status ON queue_entries(status);

CREATE TABLE IF NOT EXISTS offer_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    listing_id INTEGER NOT NULL REFERENCES listings(id),
    buyer_id TEXT NOT NULL,
    offer_price REAL NOT NULL,
    discount_percent REAL NOT NULL,
    sent_at TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'sent',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_offer_records_listing_id ON offer_records(listing_id);
CREATE INDEX IF NOT EXISTS idx_offer_records_buyer_id ON offer_records(buyer_id);

CREATE TABLE IF NOT EXISTS job_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_name TEXT NOT NULL,
    job_type TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    status TEXT NOT NULL DEFAULT 'running',
    items_processed INTEGER NOT NULL DEFAULT 0,
    items_affected INTEGER NOT NULL DEFAULT 0,
    error_message TEXT,
    details TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_job_logs_job_name ON job_logs(job_name);
"#;

/// Shared handle to the database connection. Cloning is cheap; every
/// clone refers to the same underlying connection.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).with_context(|| format!("opening database at {path}"))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .context("enabling WAL mode")?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .context("enabling foreign keys")?;
        conn.execute_batch(SCHEMA).context("creating schema")?;
        Ok(Store {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("opening in-memory database")?;
        conn.execute_batch(SCHEMA).context("creating schema")?;
        Ok(Store {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` against the live connection with no transaction wrapper,
    /// for simple reads.
    pub async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send,
        T: Send,
    {
        let conn = self.conn.lock().await;
        f(&conn)
    }

    /// Persists the mutable fields of `listings` (status, pricing,
    /// lifecycle timestamps) inside a single transaction, so a policy that
    /// touches several listings and then fails partway through leaves none
    /// of them half-written.
    pub async fn save_listings(&self, listings: &[crate::domain::Listing]) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let rows = listings.to_vec();
        self.with_transaction(move |tx| {
            for l in &rows {
                let photos_json = serde_json::to_string(&l.photo_urls)?;
                tx.execute(
                    "UPDATE listings SET \
                        status = ?1, current_price = ?2, days_active = ?3, \
                        zombie_cycle_count = ?4, ebay_item_id = ?5, offer_id = ?6, \
                        listed_at = ?7, last_offer_sent_at = ?8, last_repriced_at = ?9, \
                        photo_urls_json = ?10, main_photo_index = ?11, deleted = ?12, \
                        total_views = ?13, ad_rate_percent = ?14, sku = ?15, watchers = ?16, \
                        updated_at = ?17 \
                    WHERE id = ?18",
                    rusqlite::params![
                        l.status.as_str(),
                        l.current_price,
                        l.days_active,
                        l.zombie_cycle_count,
                        l.ebay_item_id,
                        l.offer_id,
                        l.listed_at.map(|t| t.to_rfc3339()),
                        l.last_offer_sent_at.map(|t| t.to_rfc3339()),
                        l.last_repriced_at.map(|t| t.to_rfc3339()),
                        photos_json,
                        l.main_photo_index,
                        l.deleted as i64,
                        l.total_views,
                        l.ad_rate_percent,
                        l.sku,
                        l.watchers,
                        now,
                        l.id,
                    ],
                )?;
            }
            Ok(())
        })
        .await
    }

    /// Inserts a new campaign row and returns its id.
    pub async fn insert_campaign(&self, campaign: &crate::domain::Campaign) -> Result<i64> {
        let c = campaign.clone();
        self.with_transaction(move |tx| {
            tx.execute(
                "INSERT INTO campaigns (listing_id, ebay_campaign_id, campaign_type, ad_rate_percent, started_at, ends_at, status, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                rusqlite::params![
                    c.listing_id,
                    c.ebay_campaign_id,
                    c.campaign_type.as_str(),
                    c.ad_rate_percent,
                    c.started_at.to_rfc3339(),
                    c.ends_at.to_rfc3339(),
                    c.status.as_str(),
                    c.created_at.to_rfc3339(),
                ],
            )?;
            Ok(tx.last_insert_rowid())
        })
        .await
    }

    /// Updates a campaign's status (and, on end, clears nothing else —
    /// the caller resets the listing's ad rate separately).
    pub async fn update_campaign_status(&self, campaign_id: i64, status: crate::domain::CampaignStatus) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let status_str = status.as_str().to_string();
        self.with_conn(move |conn| {
            conn.execute(
                "UPDATE campaigns SET status = ?1, updated_at = ?2 WHERE id = ?3",
                rusqlite::params![status_str, now, campaign_id],
            )?;
            Ok(())
        })
        .await
    }

    /// Inserts a new queue entry row and returns its id.
    pub async fn insert_queue_entry(&self, entry: &crate::domain::QueueEntry) -> Result<i64> {
        let e = entry.clone();
        self.with_transaction(move |tx| {
            tx.execute(
                "INSERT INTO queue_entries (listing_id, priority, scheduled_window, status, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                rusqlite::params![
                    e.listing_id,
                    e.priority,
                    e.scheduled_window,
                    e.status.as_str(),
                    e.created_at.to_rfc3339(),
                ],
            )?;
            Ok(tx.last_insert_rowid())
        })
        .await
    }

    /// Persists the post-release outcome (status, released_at, batch_id,
    /// error_message) of every queue entry touched by a release batch.
    pub async fn update_queue_entries(&self, entries: &[crate::domain::QueueEntry]) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let rows = entries.to_vec();
        self.with_transaction(move |tx| {
            for e in &rows {
                tx.execute(
                    "UPDATE queue_entries SET status = ?1, released_at = ?2, batch_id = ?3, error_message = ?4, updated_at = ?5 WHERE id = ?6",
                    rusqlite::params![
                        e.status.as_str(),
                        e.released_at.map(|t| t.to_rfc3339()),
                        e.batch_id,
                        e.error_message,
                        now,
                        e.id,
                    ],
                )?;
            }
            Ok(())
        })
        .await
    }

    /// Inserts a new offer record row and returns its id.
    pub async fn insert_offer_record(&self, record: &crate::domain::OfferRecord) -> Result<i64> {
        let r = record.clone();
        self.with_transaction(move |tx| {
            tx.execute(
                "INSERT INTO offer_records (listing_id, buyer_id, offer_price, discount_percent, sent_at, status, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                rusqlite::params![
                    r.listing_id,
                    r.buyer_id,
                    r.offer_price,
                    r.discount_percent,
                    r.sent_at.to_rfc3339(),
                    r.status.as_str(),
                    r.created_at.to_rfc3339(),
                ],
            )?;
            Ok(tx.last_insert_rowid())
        })
        .await
    }

    /// Runs `f` inside a transaction. The transaction commits only if `f`
    /// returns `Ok`; any error rolls the whole unit of work back, so a
    /// policy that mutates several rows and then fails a gateway call
    /// never leaves partial state behind.
    pub async fn with_transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&rusqlite::Transaction) -> Result<T> + Send,
        T: Send,
    {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().context("starting transaction")?;
        let result = f(&tx)?;
        tx.commit().context("committing transaction")?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_creates_idempotently() {
        let store = Store::open_in_memory().unwrap();
        // Re-running the batch against the same connection must not error.
        store
            .with_conn(|conn| {
                conn.execute_batch(SCHEMA)?;
                Ok(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn failed_transaction_rolls_back() {
        let store = Store::open_in_memory().unwrap();
        let now = "2024-01-01T00:00:00Z";
        let result: Result<()> = store
            .with_transaction(|tx| {
                tx.execute(
                    "INSERT INTO listings (sku, title, purchase_price, list_price, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                    rusqlite::params!["SKU-1", "Title", 10.0, 20.0, now],
                )?;
                anyhow::bail!("simulated gateway failure");
            })
            .await;
        assert!(result.is_err());

        let count: i64 = store
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM listings", [], |r| r.get(0))?)
            })
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
