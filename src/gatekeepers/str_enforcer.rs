//! Sell-Through Rate gatekeeper (spec §4.1). The default threshold is a
//! fixed constant, not a config field — listings below it need an explicit
//! manual override to proceed.

use crate::domain::status::StrSource;
use crate::errors::{GatekeeperError, ValidationError};
use serde::Serialize;

const DEFAULT_THRESHOLD: f64 = 0.4;

#[derive(Debug, Clone, Serialize)]
pub struct StrValidation {
    pub approved: bool,
    pub str_value: f64,
    pub threshold: f64,
    pub source: StrSource,
    pub passes_threshold: bool,
    pub warning: Option<String>,
}

pub struct StrEnforcer {
    threshold: f64,
}

impl Default for StrEnforcer {
    fn default() -> Self {
        StrEnforcer {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl StrEnforcer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `sold / (sold + active)`, or 0 when there is nothing to divide.
    pub fn calculate_str(&self, sold: i64, active: i64) -> f64 {
        let total = sold + active;
        if total == 0 {
            0.0
        } else {
            sold as f64 / total as f64
        }
    }

    /// Validates an operator-supplied STR value against the threshold.
    /// `override_threshold` lets a caller approve a below-threshold listing
    /// anyway, recorded as a warning rather than silently accepted.
    pub fn validate_manual(
        &self,
        str_value: f64,
        override_threshold: bool,
    ) -> Result<StrValidation, ValidationError> {
        if !(0.0..=1.0).contains(&str_value) {
            return Err(ValidationError::OutOfRange {
                field: "str_value",
                message: format!("{str_value} must be within [0, 1]"),
            });
        }

        let passes_threshold = str_value >= self.threshold;
        if !passes_threshold && !override_threshold {
            return Err(ValidationError::Invalid(
                GatekeeperError::LowStr {
                    str_value,
                    threshold: self.threshold,
                }
                .to_string(),
            ));
        }

        let warning = if !passes_threshold && override_threshold {
            Some(format!(
                "STR {:.1}% is below the {:.0}% threshold but was manually overridden",
                str_value * 100.0,
                self.threshold * 100.0
            ))
        } else {
            None
        };

        Ok(StrValidation {
            approved: true,
            str_value,
            threshold: self.threshold,
            source: StrSource::Manual,
            passes_threshold,
            warning,
        })
    }

    /// The marketplace-insights API this would read from is access-gated
    /// and not wired up; any caller expecting automatic STR data gets a
    /// clear "not implemented" rather than a silently wrong estimate.
    pub fn validate_from_api(&self) -> Result<StrValidation, ValidationError> {
        Err(ValidationError::Invalid(
            "automatic STR lookup via the marketplace insights API is not implemented".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calculate_str_handles_zero_total() {
        let e = StrEnforcer::new();
        assert_eq!(e.calculate_str(0, 0), 0.0);
    }

    #[test]
    fn calculate_str_divides_sold_by_total() {
        let e = StrEnforcer::new();
        assert_eq!(e.calculate_str(3, 7), 0.3);
    }

    #[test]
    fn validate_manual_rejects_out_of_range() {
        let e = StrEnforcer::new();
        assert!(e.validate_manual(1.5, false).is_err());
    }

    #[test]
    fn validate_manual_rejects_below_threshold_without_override() {
        let e = StrEnforcer::new();
        let result = e.validate_manual(0.2, false);
        assert!(result.is_err());
    }

    #[test]
    fn validate_manual_allows_override_with_warning() {
        let e = StrEnforcer::new();
        let result = e.validate_manual(0.2, true).unwrap();
        assert!(result.approved);
        assert!(!result.passes_threshold);
        assert!(result.warning.is_some());
    }

    #[test]
    fn validate_manual_passes_at_threshold() {
        let e = StrEnforcer::new();
        let result = e.validate_manual(0.4, false).unwrap();
        assert!(result.passes_threshold);
        assert!(result.warning.is_none());
    }

    #[test]
    fn validate_from_api_is_not_implemented() {
        let e = StrEnforcer::new();
        assert!(e.validate_from_api().is_err());
    }
}
