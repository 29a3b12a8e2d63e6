//! Error taxonomy.
//!
//! No generic exception hierarchy here — a flat enum per branch, matched
//! once at whatever boundary needs to turn it into a response. Internal
//! plumbing (database open/prepare) stays on `anyhow::Result` instead.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    OutOfRange { field: &'static str, message: String },
    NotFound { entity: &'static str, id: i64 },
    Invalid(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::OutOfRange { field, message } => {
                write!(f, "{field} out of range: {message}")
            }
            ValidationError::NotFound { entity, id } => write!(f, "{entity} {id} not found"),
            ValidationError::Invalid(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq)]
pub enum GatekeeperError {
    LowStr { str_value: f64, threshold: f64 },
    LowProfit { net_profit: f64, floor: f64 },
    BadTitle(String),
}

impl fmt::Display for GatekeeperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatekeeperError::LowStr {
                str_value,
                threshold,
            } => write!(
                f,
                "Sell-Through Rate {:.1}% is below minimum {:.0}%",
                str_value * 100.0,
                threshold * 100.0
            ),
            GatekeeperError::LowProfit { net_profit, floor } => {
                write!(f, "Net profit ${net_profit:.2} is below minimum ${floor:.2}")
            }
            GatekeeperError::BadTitle(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for GatekeeperError {}

#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleError {
    Cooldown(String),
    StateTransitionRefused { from: String, to: String },
    DuplicateCampaign,
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleError::Cooldown(msg) => write!(f, "{msg}"),
            LifecycleError::StateTransitionRefused { from, to } => {
                write!(f, "transition {from} -> {to} is not allowed")
            }
            LifecycleError::DuplicateCampaign => write!(f, "active campaign already exists"),
        }
    }
}

impl std::error::Error for LifecycleError {}

/// Mirrors the gateway's documented failure families (spec §4.1, §7).
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayError {
    Auth(String),
    RateLimit(String),
    NotFound(String),
    Duplicate(String),
    Transport(String),
    Other(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Auth(m) => write!(f, "gateway auth error: {m}"),
            GatewayError::RateLimit(m) => write!(f, "gateway rate limit: {m}"),
            GatewayError::NotFound(m) => write!(f, "gateway not found: {m}"),
            GatewayError::Duplicate(m) => write!(f, "gateway duplicate: {m}"),
            GatewayError::Transport(m) => write!(f, "gateway transport error: {m}"),
            GatewayError::Other(m) => write!(f, "gateway error: {m}"),
        }
    }
}

impl std::error::Error for GatewayError {}

impl GatewayError {
    /// `Auth` failures are fatal and halt the current coordinator call;
    /// everything else is absorbed into a per-item error count.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GatewayError::Auth(_))
    }
}
