//! Engine configuration loaded once from the environment.
//!
//! Mirrors the `Config::from_env()` pattern used elsewhere in this codebase:
//! read `.env` once, then pull each field from its environment variable with
//! a hard-coded default, never re-reading the environment afterward.

use std::env;

/// Marketplace client mode. Selects which `Gateway` implementation the
/// coordinator binds policies to; the concrete sandbox/production clients
/// are out of scope here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMode {
    Mock,
    Sandbox,
    Production,
}

impl GatewayMode {
    fn from_str(s: &str) -> Self {
        match s {
            "sandbox" => GatewayMode::Sandbox,
            "production" => GatewayMode::Production,
            _ => GatewayMode::Mock,
        }
    }
}

/// Frozen configuration, constructed once and shared read-only across
/// every policy and the coordinator.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub gateway_mode: GatewayMode,

    // Fee structure
    pub ebay_base_fee_rate: f64,
    pub payment_processing_rate: f64,
    pub per_order_fee: f64,
    pub min_profit_floor: f64,

    // Zombie detection
    pub zombie_days_threshold: i64,
    pub zombie_views_threshold: i64,
    pub max_zombie_cycles: i64,
    pub resurrection_delay_seconds: u64,

    // SmartQueue
    pub queue_batch_size: i64,
    pub surge_window_day: String,
    pub surge_window_start_hour: u32,
    pub surge_window_end_hour: u32,
    pub surge_window_timezone: String,

    // Kickstarter
    pub kickstarter_ad_rate: f64,
    pub kickstarter_duration_days: i64,

    // Offer Sniper
    pub offer_tiers: Vec<(i64, f64)>,
    pub offer_auto_accept_threshold: f64,
    pub offer_counter_threshold: f64,
    pub offer_counter_percent: f64,
    pub offer_poll_interval_hours: i64,

    // Purgatory
    pub purgatory_sale_percent: f64,

    // Photo Shuffler
    pub photo_shuffle_days_no_views: i64,

    // Store Pulse
    pub store_pulse_day_of_month: u32,

    // Repricer / AutoRelister
    pub reprice_steps: Vec<(i64, f64)>,
    pub relist_cadence_days: i64,
    pub relist_views_threshold: i64,
}

fn env_var(name: &str) -> Option<String> {
    env::var(format!("FLIPFLOW_{name}")).ok()
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env_var(name)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_or_string(name: &str, default: &str) -> String {
    env_var(name).unwrap_or_else(|| default.to_string())
}

/// Parses the `"days:pct,..."` grammar shared by `reprice_steps` and
/// `offer_tiers` into a list sorted ascending by day. Malformed pairs
/// (missing `:`) are skipped rather than erroring, matching the source.
pub fn parse_tiered_steps(raw: &str) -> Vec<(i64, f64)> {
    let mut steps: Vec<(i64, f64)> = raw
        .split(',')
        .filter_map(|pair| {
            let pair = pair.trim();
            let (days_str, pct_str) = pair.split_once(':')?;
            let days: i64 = days_str.trim().parse().ok()?;
            let pct: f64 = pct_str.trim().parse().ok()?;
            Some((days, pct))
        })
        .collect();
    steps.sort_by_key(|(days, _)| *days);
    steps
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            database_path: env_or_string("DATABASE_PATH", "flipflow.db"),
            gateway_mode: GatewayMode::from_str(&env_or_string("EBAY_MODE", "mock")),

            ebay_base_fee_rate: env_or("EBAY_BASE_FEE_RATE", 0.13),
            payment_processing_rate: env_or("PAYMENT_PROCESSING_RATE", 0.029),
            per_order_fee: env_or("PER_ORDER_FEE", 0.30),
            min_profit_floor: env_or("MIN_PROFIT_FLOOR", 5.00),

            zombie_days_threshold: env_or("ZOMBIE_DAYS_THRESHOLD", 60),
            zombie_views_threshold: env_or("ZOMBIE_VIEWS_THRESHOLD", 10),
            max_zombie_cycles: env_or("MAX_ZOMBIE_CYCLES", 3),
            resurrection_delay_seconds: env_or("RESURRECTION_DELAY_SECONDS", 120),

            queue_batch_size: env_or("QUEUE_BATCH_SIZE", 10),
            surge_window_day: env_or_string("SURGE_WINDOW_DAY", "sunday"),
            surge_window_start_hour: env_or("SURGE_WINDOW_START_HOUR", 20),
            surge_window_end_hour: env_or("SURGE_WINDOW_END_HOUR", 22),
            surge_window_timezone: env_or_string("SURGE_WINDOW_TIMEZONE", "America/New_York"),

            kickstarter_ad_rate: env_or("KICKSTARTER_AD_RATE", 1.5),
            kickstarter_duration_days: env_or("KICKSTARTER_DURATION_DAYS", 14),

            offer_tiers: parse_tiered_steps(&env_or_string(
                "OFFER_TIERS",
                "0:5,14:10,30:15,45:20",
            )),
            offer_auto_accept_threshold: env_or("OFFER_AUTO_ACCEPT_THRESHOLD", 0.90),
            offer_counter_threshold: env_or("OFFER_COUNTER_THRESHOLD", 0.75),
            offer_counter_percent: env_or("OFFER_COUNTER_PERCENT", 0.95),
            offer_poll_interval_hours: env_or("OFFER_POLL_INTERVAL_HOURS", 1),

            purgatory_sale_percent: env_or("PURGATORY_SALE_PERCENT", 30.0),

            photo_shuffle_days_no_views: env_or("PHOTO_SHUFFLE_DAYS_NO_VIEWS", 14),

            store_pulse_day_of_month: env_or("STORE_PULSE_DAY_OF_MONTH", 1),

            reprice_steps: parse_tiered_steps(&env_or_string(
                "REPRICE_STEPS",
                "7:10,14:20,30:30,45:40",
            )),
            relist_cadence_days: env_or("RELIST_CADENCE_DAYS", 45),
            relist_views_threshold: env_or("RELIST_VIEWS_THRESHOLD", 5),
        }
    }
}
