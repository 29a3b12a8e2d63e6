//! Net-profit gatekeeper (spec §4.3). Fees are computed off the candidate
//! sale price, not the purchase price — a seller loses percentage fees on
//! the amount the buyer pays.

use crate::errors::GatekeeperError;

#[derive(Debug, Clone, Copy)]
pub struct ProfitBreakdown {
    pub sale_price: f64,
    pub purchase_price: f64,
    pub shipping_cost: f64,
    pub ebay_fee_percent: f64,
    pub ad_fee_percent: f64,
    pub ebay_fee_amount: f64,
    pub payment_processing_amount: f64,
    pub ad_fee_amount: f64,
    pub total_fees: f64,
    pub net_profit: f64,
    pub profit_margin_percent: f64,
    pub profit_floor: f64,
    pub meets_floor: bool,
    pub minimum_viable_price: f64,
}

/// Rounds to the nearest cent using banker's rounding (round-half-to-even),
/// matching the decimal semantics callers expect for monetary output.
/// `f64::round()` rounds half away from zero, which is the wrong tie rule
/// here, so this walks the halfway case explicitly.
pub fn round_half_even_cents(value: f64) -> f64 {
    let scaled = value * 100.0;
    let floor = scaled.floor();
    let diff = scaled - floor;
    let rounded = if (diff - 0.5).abs() < 1e-9 {
        if (floor as i64) % 2 == 0 {
            floor
        } else {
            floor + 1.0
        }
    } else {
        scaled.round()
    };
    rounded / 100.0
}

pub struct ProfitFloor {
    ebay_base_fee_rate: f64,
    payment_processing_rate: f64,
    per_order_fee: f64,
    min_profit_floor: f64,
}

impl ProfitFloor {
    pub fn new(
        ebay_base_fee_rate: f64,
        payment_processing_rate: f64,
        per_order_fee: f64,
        min_profit_floor: f64,
    ) -> Self {
        ProfitFloor {
            ebay_base_fee_rate,
            payment_processing_rate,
            per_order_fee,
            min_profit_floor,
        }
    }

    /// Full fee/profit breakdown for one candidate sale price. The eBay
    /// base fee and payment-processing fee (plus the flat per-order fee)
    /// are reported as distinct line items, per `S·f` and `S·p + F`.
    pub fn calculate(
        &self,
        sale_price: f64,
        purchase_price: f64,
        shipping_cost: f64,
        ad_rate_percent: f64,
    ) -> ProfitBreakdown {
        let ebay_fee_amount = round_half_even_cents(sale_price * self.ebay_base_fee_rate);
        let payment_processing_amount =
            round_half_even_cents(sale_price * self.payment_processing_rate + self.per_order_fee);
        let ad_fee_amount = round_half_even_cents(sale_price * ad_rate_percent / 100.0);
        let total_fees =
            round_half_even_cents(ebay_fee_amount + payment_processing_amount + ad_fee_amount);
        let net_profit =
            round_half_even_cents(sale_price - purchase_price - shipping_cost - total_fees);
        let profit_margin_percent = if sale_price > 0.0 {
            round_half_even_cents(net_profit / sale_price * 100.0)
        } else {
            0.0
        };

        ProfitBreakdown {
            sale_price,
            purchase_price,
            shipping_cost,
            ebay_fee_percent: self.ebay_base_fee_rate * 100.0,
            ad_fee_percent: ad_rate_percent,
            ebay_fee_amount,
            payment_processing_amount,
            ad_fee_amount,
            total_fees,
            net_profit,
            profit_margin_percent,
            profit_floor: self.min_profit_floor,
            meets_floor: net_profit >= self.min_profit_floor,
            minimum_viable_price: self.find_minimum_price(purchase_price, shipping_cost, ad_rate_percent),
        }
    }

    /// Lowest sale price that clears the configured profit floor, given
    /// cost, shipping and ad rate. Returns `f64::INFINITY` when the fee
    /// structure leaves no solvable price (fee_multiplier <= 0).
    pub fn find_minimum_price(
        &self,
        purchase_price: f64,
        shipping_cost: f64,
        ad_rate_percent: f64,
    ) -> f64 {
        let fee_multiplier =
            1.0 - self.ebay_base_fee_rate - self.payment_processing_rate - ad_rate_percent / 100.0;
        if fee_multiplier <= 0.0 {
            return f64::INFINITY;
        }
        let numerator =
            purchase_price + shipping_cost + self.per_order_fee + self.min_profit_floor;
        round_half_even_cents(numerator / fee_multiplier)
    }

    /// Validates a candidate sale price against the floor, returning the
    /// full breakdown on success or `GatekeeperError::LowProfit` on failure.
    pub fn validate(
        &self,
        sale_price: f64,
        purchase_price: f64,
        shipping_cost: f64,
        ad_rate_percent: f64,
    ) -> Result<ProfitBreakdown, GatekeeperError> {
        let breakdown = self.calculate(sale_price, purchase_price, shipping_cost, ad_rate_percent);
        if !breakdown.meets_floor {
            return Err(GatekeeperError::LowProfit {
                net_profit: breakdown.net_profit,
                floor: self.min_profit_floor,
            });
        }
        Ok(breakdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor() -> ProfitFloor {
        ProfitFloor::new(0.13, 0.029, 0.30, 5.00)
    }

    #[test]
    fn half_even_rounds_ties_to_even() {
        assert_eq!(round_half_even_cents(1.005), 1.00);
        assert_eq!(round_half_even_cents(1.015), 1.02);
    }

    #[test]
    fn calculate_matches_documented_formula() {
        let pf = floor();
        let breakdown = pf.calculate(100.0, 30.0, 10.0, 0.0);
        assert_eq!(breakdown.ebay_fee_amount, round_half_even_cents(100.0 * 0.13));
        assert_eq!(
            breakdown.payment_processing_amount,
            round_half_even_cents(100.0 * 0.029 + 0.30)
        );
        assert_eq!(
            breakdown.total_fees,
            breakdown.ebay_fee_amount + breakdown.payment_processing_amount + breakdown.ad_fee_amount
        );
        assert!(breakdown.net_profit < 100.0 - 30.0 - 10.0);
    }

    #[test]
    fn calculate_splits_ebay_and_payment_fees_as_distinct_line_items() {
        let pf = floor();
        let breakdown = pf.calculate(100.0, 30.0, 10.0, 1.5);
        assert_eq!(breakdown.ebay_fee_amount, 13.00);
        assert_eq!(breakdown.payment_processing_amount, 3.20);
        assert_eq!(breakdown.ad_fee_amount, 1.50);
        assert_eq!(breakdown.net_profit, 42.30);
        assert_eq!(breakdown.profit_floor, 5.00);
    }

    #[test]
    fn find_minimum_price_is_infinite_when_unsolvable() {
        let pf = ProfitFloor::new(0.6, 0.5, 0.30, 5.00);
        assert!(pf.find_minimum_price(30.0, 10.0, 0.0).is_infinite());
    }

    #[test]
    fn validate_rejects_below_floor() {
        let pf = floor();
        let result = pf.validate(20.0, 18.0, 5.0, 0.0);
        assert!(matches!(result, Err(GatekeeperError::LowProfit { .. })));
    }
}
