//! Deterministic storage pricing.
//!
//! The price of hosting a file is a pure function of (size, retention):
//! a flat base fee plus a rate per size-unit x time-unit block. Both inputs
//! are billed in ceiling units, so the function is non-decreasing in each
//! argument, and all arithmetic is done in u128 with saturation so it is
//! total over the whole valid input domain.

use crate::config::PricingConfig;
use crate::error::{Error, Result};

/// Deterministic price quoter.
#[derive(Debug, Clone)]
pub struct PriceQuoter {
    config: PricingConfig,
}

impl PriceQuoter {
    /// Create a quoter from pricing parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if either billing unit is zero.
    pub fn new(config: PricingConfig) -> Result<Self> {
        if config.size_unit_bytes == 0 || config.time_unit_minutes == 0 {
            return Err(Error::Pricing(
                "billing units must be positive".to_string(),
            ));
        }
        Ok(Self { config })
    }

    /// Quote the price of hosting `file_size` bytes for
    /// `retention_minutes` minutes, in ledger units.
    ///
    /// # Errors
    ///
    /// Returns an error if either input is zero; callers validate range and
    /// sign before reaching this point.
    pub fn quote(&self, file_size: u64, retention_minutes: u64) -> Result<u64> {
        if file_size == 0 {
            return Err(Error::Pricing("file size must be positive".to_string()));
        }
        if retention_minutes == 0 {
            return Err(Error::Pricing(
                "retention period must be positive".to_string(),
            ));
        }

        let size_units = ceil_div(u128::from(file_size), u128::from(self.config.size_unit_bytes));
        let time_units = ceil_div(
            u128::from(retention_minutes),
            u128::from(self.config.time_unit_minutes),
        );

        let variable = size_units
            .saturating_mul(time_units)
            .saturating_mul(u128::from(self.config.unit_rate));
        let total = u128::from(self.config.base_fee).saturating_add(variable);

        Ok(u64::try_from(total).unwrap_or(u64::MAX))
    }
}

const fn ceil_div(value: u128, unit: u128) -> u128 {
    value.div_ceil(unit)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn create_test_quoter() -> PriceQuoter {
        PriceQuoter::new(PricingConfig {
            base_fee: 546,
            unit_rate: 5,
            size_unit_bytes: 1_000_000,
            time_unit_minutes: 60,
        })
        .expect("valid pricing config")
    }

    #[test]
    fn test_quote_is_deterministic() {
        let quoter = create_test_quoter();
        let a = quoter.quote(1000, 60).expect("quote");
        let b = quoter.quote(1000, 60).expect("quote");
        assert_eq!(a, b);
    }

    #[test]
    fn test_quote_small_file() {
        let quoter = create_test_quoter();
        // One size unit, one time unit: base + rate.
        assert_eq!(quoter.quote(1000, 60).expect("quote"), 546 + 5);
    }

    #[test]
    fn test_ceiling_units() {
        let quoter = create_test_quoter();
        // 1_000_001 bytes is two size units.
        assert_eq!(quoter.quote(1_000_001, 60).expect("quote"), 546 + 10);
        // 61 minutes is two time units.
        assert_eq!(quoter.quote(1000, 61).expect("quote"), 546 + 10);
    }

    #[test]
    fn test_monotonic_in_size() {
        let quoter = create_test_quoter();
        let sizes = [1u64, 999, 1000, 1_000_000, 1_000_001, 5_000_000, 11_000_000_000];
        let mut previous = 0;
        for size in sizes {
            let amount = quoter.quote(size, 120).expect("quote");
            assert!(
                amount >= previous,
                "price decreased at size {size}: {amount} < {previous}"
            );
            previous = amount;
        }
    }

    #[test]
    fn test_monotonic_in_retention() {
        let quoter = create_test_quoter();
        let minutes = [1u64, 30, 59, 60, 61, 1440, 525_600];
        let mut previous = 0;
        for retention in minutes {
            let amount = quoter.quote(4_000_000, retention).expect("quote");
            assert!(
                amount >= previous,
                "price decreased at retention {retention}: {amount} < {previous}"
            );
            previous = amount;
        }
    }

    #[test]
    fn test_total_at_extremes() {
        let quoter = create_test_quoter();
        // Must not panic or overflow even at absurd inputs.
        let amount = quoter.quote(u64::MAX, u64::MAX).expect("quote");
        assert_eq!(amount, u64::MAX);
    }

    #[test]
    fn test_rejects_zero_inputs() {
        let quoter = create_test_quoter();
        assert!(quoter.quote(0, 60).is_err());
        assert!(quoter.quote(1000, 0).is_err());
    }

    #[test]
    fn test_rejects_zero_units() {
        let result = PriceQuoter::new(PricingConfig {
            base_fee: 0,
            unit_rate: 1,
            size_unit_bytes: 0,
            time_unit_minutes: 60,
        });
        assert!(result.is_err());
    }
}
