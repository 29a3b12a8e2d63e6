pub mod mobile_enforcer;
pub mod profit_floor;
pub mod str_enforcer;
pub mod title_sanitizer;

pub use mobile_enforcer::MobileEnforcer;
pub use profit_floor::{round_half_even_cents, ProfitBreakdown, ProfitFloor};
pub use str_enforcer::{StrEnforcer, StrValidation};
pub use title_sanitizer::{SanitizeResult, TitleSanitizer};
