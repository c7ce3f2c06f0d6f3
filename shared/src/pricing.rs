//! Price formulas for catalog goods
//!
//! All amounts are rupiah. Results are rounded to whole rupiah, half away
//! from zero.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("margin must be at least 0% and below 100%, got {0}%")]
    InvalidMargin(Decimal),

    #[error("{field} must be between 0% and 100%, got {value}%")]
    InvalidPercent { field: &'static str, value: Decimal },

    #[error("discount must be at least 0% and below 100%, got {0}%")]
    InvalidDiscount(Decimal),

    #[error("cost must not be negative")]
    NegativeCost,
}

/// Percentage adjustments layered on top of the selling price
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PriceAdjustments {
    pub pajak_persen: Decimal,
    pub diskon_persen: Decimal,
    pub service_charge_persen: Decimal,
}

impl PriceAdjustments {
    /// A full discount would price goods at zero, which the till reads as
    /// "no final price", so the discount stays below 100%.
    pub fn validate(&self) -> Result<(), PricingError> {
        validate_percent("pajak_persen", self.pajak_persen)?;
        validate_percent("service_charge_persen", self.service_charge_persen)?;
        if self.diskon_persen < Decimal::ZERO || self.diskon_persen >= HUNDRED {
            return Err(PricingError::InvalidDiscount(self.diskon_persen));
        }
        Ok(())
    }
}

/// Round to whole rupiah
pub fn round_rupiah(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

pub fn validate_percent(field: &'static str, value: Decimal) -> Result<(), PricingError> {
    if value < Decimal::ZERO || value > HUNDRED {
        return Err(PricingError::InvalidPercent { field, value });
    }
    Ok(())
}

/// Selling price from cost and a margin on price:
/// `harga_jual = round(modal / (1 - margin / 100))`
pub fn harga_jual_from_margin(modal: Decimal, margin_persen: Decimal) -> Result<Decimal, PricingError> {
    if modal < Decimal::ZERO {
        return Err(PricingError::NegativeCost);
    }
    if margin_persen < Decimal::ZERO || margin_persen >= HUNDRED {
        return Err(PricingError::InvalidMargin(margin_persen));
    }
    let divisor = Decimal::ONE - margin_persen / HUNDRED;
    Ok(round_rupiah(modal / divisor))
}

/// Final shelf price: discount first, then tax and service charge on the
/// discounted amount.
pub fn harga_final(harga_jual: Decimal, adj: &PriceAdjustments) -> Decimal {
    let after_discount = harga_jual * (Decimal::ONE - adj.diskon_persen / HUNDRED);
    let surcharge = Decimal::ONE + adj.pajak_persen / HUNDRED + adj.service_charge_persen / HUNDRED;
    round_rupiah(after_discount * surcharge)
}

/// Price a sale line is charged at: `harga_final` when set, else `harga_jual`
pub fn effective_unit_price(harga_jual: Decimal, harga_final: Decimal) -> Decimal {
    if harga_final > Decimal::ZERO {
        harga_final
    } else {
        harga_jual
    }
}

/// Margin implied by a cost and a selling price, in percent of price
pub fn margin_from_prices(modal: Decimal, harga_jual: Decimal) -> Decimal {
    if harga_jual.is_zero() {
        return Decimal::ZERO;
    }
    ((harga_jual - modal) / harga_jual * HUNDRED).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_harga_jual_from_margin() {
        // 9000 / (1 - 0.40) = 15000
        assert_eq!(harga_jual_from_margin(dec("9000"), dec("40")).unwrap(), dec("15000"));
        // 1000 / 0.7 = 1428.57.. -> 1429
        assert_eq!(harga_jual_from_margin(dec("1000"), dec("30")).unwrap(), dec("1429"));
        assert_eq!(harga_jual_from_margin(dec("5000"), Decimal::ZERO).unwrap(), dec("5000"));
    }

    #[test]
    fn test_margin_bounds() {
        assert_eq!(
            harga_jual_from_margin(dec("1000"), dec("100")),
            Err(PricingError::InvalidMargin(dec("100")))
        );
        assert!(harga_jual_from_margin(dec("1000"), dec("-1")).is_err());
        assert_eq!(harga_jual_from_margin(dec("-1"), dec("10")), Err(PricingError::NegativeCost));
    }

    #[test]
    fn test_harga_final_layers_adjustments() {
        let adj = PriceAdjustments {
            pajak_persen: dec("10"),
            diskon_persen: dec("10"),
            service_charge_persen: dec("5"),
        };
        // 15000 * 0.9 = 13500; 13500 * 1.15 = 15525
        assert_eq!(harga_final(dec("15000"), &adj), dec("15525"));
        assert_eq!(harga_final(dec("15000"), &PriceAdjustments::default()), dec("15000"));
    }

    #[test]
    fn test_effective_unit_price() {
        assert_eq!(effective_unit_price(dec("15000"), Decimal::ZERO), dec("15000"));
        assert_eq!(effective_unit_price(dec("15000"), dec("16500")), dec("16500"));
    }

    #[test]
    fn test_margin_from_prices() {
        assert_eq!(margin_from_prices(dec("9000"), dec("15000")), dec("40"));
        assert_eq!(margin_from_prices(dec("9000"), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_adjustments_validate() {
        let bad = PriceAdjustments {
            pajak_persen: dec("120"),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        assert!(PriceAdjustments::default().validate().is_ok());
    }

    #[test]
    fn test_full_discount_rejected() {
        let full = PriceAdjustments {
            diskon_persen: dec("100"),
            ..Default::default()
        };
        assert_eq!(full.validate(), Err(PricingError::InvalidDiscount(dec("100"))));

        let almost = PriceAdjustments {
            diskon_persen: dec("99"),
            ..Default::default()
        };
        assert!(almost.validate().is_ok());
        // 15000 * 0.01 = 150, still charged at the final price
        let final_price = harga_final(dec("15000"), &almost);
        assert_eq!(final_price, dec("150"));
        assert_eq!(effective_unit_price(dec("15000"), final_price), dec("150"));
    }
}
