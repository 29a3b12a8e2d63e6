//! End-to-end scenarios against the mock gateway: each test mirrors one
//! of the worked examples the components are designed around, wired
//! through more than one module at once instead of unit-testing a
//! single function in isolation.

use chrono::{DateTime, TimeZone, Utc};
use flipflow_engine::config::Config;
use flipflow_engine::domain::{Listing, ListingStatus, OfferAction, OfferRecord};
use flipflow_engine::gatekeepers::{ProfitFloor, TitleSanitizer};
use flipflow_engine::gateway::MockGateway;
use flipflow_engine::policies::{OfferSniper, Resurrector, SmartQueue, ZombieKiller};
use std::sync::Arc;

fn blank_listing(id: i64) -> Listing {
    Listing {
        id,
        ebay_item_id: None,
        sku: format!("SKU-{id}"),
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
        shipping_cost: 10.0,
        ad_rate_percent: 0.0,
        status: ListingStatus::Active,
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
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Scenario 1: profit calc. Checks the parts of the worked example that
/// reconcile with the documented formula — see DESIGN.md's open-question
/// note (d) on the example's `min_viable` figure.
#[test]
fn scenario_profit_calc() {
    let floor = ProfitFloor::new(0.13, 0.029, 0.30, 5.00);
    let breakdown = floor.calculate(100.0, 30.0, 10.0, 1.5);

    assert_eq!(breakdown.net_profit, 42.30);
    assert!(breakdown.meets_floor);

    let min_viable = floor.find_minimum_price(30.0, 10.0, 1.5);
    let reconciled = floor.calculate(min_viable, 30.0, 10.0, 1.5);
    assert!((reconciled.net_profit - 5.00).abs() < 0.01);
}

/// Scenario 2: title sanitize.
#[test]
fn scenario_title_sanitize() {
    let sanitizer = TitleSanitizer::new();
    let result = sanitizer.sanitize(
        "!!!L@@K!! AMAZING VINTAGE NIKE AIR JORDAN 1 RETRO HIGH WOW!!!",
        Some("Nike"),
        Some("Air Jordan 1"),
    );

    assert!(result.sanitized.starts_with("Nike Air Jordan 1"));
    let lower = result.sanitized.to_lowercase();
    assert!(!lower.contains("l@@k"));
    assert!(!lower.contains("wow"));
    assert!(!lower.contains("amazing"));
    assert!(result.sanitized.len() <= 80);
}

/// Scenario 3: zombie boundary.
#[tokio::test]
async fn scenario_zombie_boundary() {
    let gw = Arc::new(MockGateway::new());
    let config = Config::from_env();
    let killer = ZombieKiller::new(gw.clone(), &config);

    let mut zombie = blank_listing(1);
    zombie.ebay_item_id = Some("ITEM-1".into());
    zombie.days_active = 61;
    gw.set_traffic("ITEM-1", 9);

    let mut borderline = blank_listing(2);
    borderline.ebay_item_id = Some("ITEM-2".into());
    borderline.days_active = 60;
    gw.set_traffic("ITEM-2", 10);

    let mut listings = vec![zombie, borderline];
    let result = killer.scan(&mut listings).await;

    assert_eq!(result.zombies.len(), 1);
    assert_eq!(result.zombies[0].listing_id, 1);
    assert!(!result.zombies[0].should_purgatory);
}

/// Scenario 4: tiered offer timing and cooldown.
#[tokio::test]
async fn scenario_tiered_offer_cooldown() {
    let gw = Arc::new(MockGateway::new());
    let config = Config::from_env();
    let sniper = OfferSniper::new(gw.clone(), &config);

    let mut listing = blank_listing(1);
    listing.ebay_item_id = Some("ITEM-1".into());
    listing.list_price = 50.0;
    listing.current_price = Some(50.0);
    listing.days_active = 14;
    gw.set_watchers("ITEM-1", vec!["BUYER-1".to_string()]);

    let now: DateTime<Utc> = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
    let (sent, errors) = sniper.scan_and_snipe(&listing, &[], now).await;
    assert_eq!(errors, 0);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].offer_price, 45.00);
    assert_eq!(sent[0].discount_percent, 10.0);

    let existing = vec![OfferRecord {
        id: 1,
        listing_id: listing.id,
        buyer_id: "BUYER-1".into(),
        offer_price: sent[0].offer_price,
        discount_percent: sent[0].discount_percent,
        sent_at: now,
        status: flipflow_engine::domain::OfferStatus::Sent,
        created_at: now,
        updated_at: now,
    }];

    let (rescan_sent, _) = sniper.scan_and_snipe(&listing, &existing, now).await;
    assert!(rescan_sent.is_empty());

    let later = now + chrono::Duration::hours(25);
    let (later_sent, _) = sniper.scan_and_snipe(&listing, &existing, later).await;
    assert_eq!(later_sent.len(), 1);
}

/// Scenario 5: inbound offer triage.
#[tokio::test]
async fn scenario_inbound_offer_thresholds() {
    let gw = Arc::new(MockGateway::new());
    let config = Config::from_env();
    let sniper = OfferSniper::new(gw, &config);

    let (action, counter) = sniper.handle_incoming_offer("offer-1", 50.0, 46.0).await.unwrap();
    assert_eq!(action, OfferAction::Accept);
    assert!(counter.is_none());

    let (action, counter) = sniper.handle_incoming_offer("offer-2", 50.0, 40.0).await.unwrap();
    assert_eq!(action, OfferAction::Counter);
    assert_eq!(counter, Some(47.50));

    let (action, counter) = sniper.handle_incoming_offer("offer-3", 50.0, 30.0).await.unwrap();
    assert_eq!(action, OfferAction::Reject);
    assert!(counter.is_none());
}

/// Scenario 6: resurrection.
#[tokio::test]
async fn scenario_resurrection() {
    let gw = Arc::new(MockGateway::new());
    let resurrector = Resurrector::new(gw, 0);

    let mut listing = blank_listing(1);
    listing.sku = "NIKE-001".into();
    listing.ebay_item_id = Some("OLD".into());
    listing.offer_id = Some("OFFER-OLD".into());
    listing.photo_urls = vec!["a.jpg".into(), "b.jpg".into(), "c.jpg".into()];
    listing.status = ListingStatus::Zombie;
    listing.zombie_cycle_count = 0;

    let result = resurrector.resurrect(&mut listing).await;

    assert!(result.success);
    assert_eq!(listing.sku, "NIKE-001_R1");
    assert_ne!(listing.ebay_item_id.as_deref(), Some("OLD"));
    assert_eq!(
        listing.photo_urls,
        vec!["b.jpg".to_string(), "a.jpg".to_string(), "c.jpg".to_string()]
    );
    assert_eq!(listing.zombie_cycle_count, 1);
    assert_eq!(listing.status, ListingStatus::Active);
    assert_eq!(listing.days_active, 0);
}

/// Scenario 7: surge window boundaries.
#[test]
fn scenario_surge_window() {
    let gw = Arc::new(MockGateway::new());
    let config = Config::from_env();
    let queue = SmartQueue::new(gw, &config);

    let sunday_in_window = chrono_tz::America::New_York
        .with_ymd_and_hms(2026, 2, 8, 21, 0, 0)
        .unwrap()
        .with_timezone(&Utc);
    assert!(queue.is_surge_window_active(sunday_in_window));

    let sunday_after_window = chrono_tz::America::New_York
        .with_ymd_and_hms(2026, 2, 8, 22, 0, 0)
        .unwrap()
        .with_timezone(&Utc);
    assert!(!queue.is_surge_window_active(sunday_after_window));

    let monday = chrono_tz::America::New_York
        .with_ymd_and_hms(2026, 2, 9, 21, 0, 0)
        .unwrap()
        .with_timezone(&Utc);
    assert!(!queue.is_surge_window_active(monday));
}
