//! User-entered transfer amounts.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::{ValidationError, WalletError};

/// A positive, finite amount in whole native units (e.g. ETH).
///
/// Validity is decided on the typed text alone. Conversion to exact base
/// units happens in [`Amount::to_base_units`], which can still refuse
/// amounts that have no exact representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amount {
    raw: String,
}

impl Amount {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() && value > 0.0 => Ok(Self {
                raw: raw.to_string(),
            }),
            _ => Err(ValidationError::InvalidAmount(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Convert to integer base units (wei for `decimals = 18`), rounding
    /// half up at the last unit.
    pub fn to_base_units(&self, decimals: u32) -> Result<u128, WalletError> {
        let invalid = |reason: &str| WalletError::InvalidAmount {
            amount: self.raw.clone(),
            reason: reason.to_string(),
        };

        let value = self.to_decimal().ok_or_else(|| invalid("not representable"))?;
        let mantissa =
            u128::try_from(value.mantissa()).map_err(|_| invalid("amount is not positive"))?;
        let scale = value.scale();

        let units = if decimals >= scale {
            10u128
                .checked_pow(decimals - scale)
                .and_then(|factor| mantissa.checked_mul(factor))
                .ok_or_else(|| invalid("amount too large"))?
        } else {
            let divisor = 10u128
                .checked_pow(scale - decimals)
                .ok_or_else(|| invalid("unsupported decimals"))?;
            let (whole, rest) = (mantissa / divisor, mantissa % divisor);
            if rest >= divisor - rest { whole + 1 } else { whole }
        };

        if units == 0 {
            return Err(invalid("amount is below the smallest unit"));
        }
        Ok(units)
    }

    fn to_decimal(&self) -> Option<Decimal> {
        Decimal::from_str(&self.raw)
            .or_else(|_| Decimal::from_scientific(&self.raw))
            .ok()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Render integer base units as a decimal string, e.g. `1500000000000000000` -> `1.5`.
pub fn format_units(units: u128, decimals: u32) -> String {
    let Some(base) = 10u128.checked_pow(decimals) else {
        return units.to_string();
    };
    let whole = units / base;
    let frac = units % base;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn accepts_positive_numbers() {
        for raw in ["0.05", "10", "1e-3", ".5", "1e30", "1e-30"] {
            assert_eq!(Amount::parse(raw).unwrap().as_str(), raw);
        }
        assert_eq!(Amount::parse("0.05").unwrap().to_decimal(), Some(dec!(0.05)));
        assert_eq!(Amount::parse("1e-3").unwrap().to_decimal(), Some(dec!(0.001)));
    }

    #[test]
    fn rejects_non_positive_and_non_numeric() {
        for raw in [
            "0", "0.0", "-1", "abc", "", "NaN", "Infinity", "inf", "1 eth", "1_000", "0x10",
        ] {
            assert_eq!(
                Amount::parse(raw).unwrap_err(),
                ValidationError::InvalidAmount(raw.to_string()),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn keeps_original_text() {
        let amount = Amount::parse("0.050").unwrap();
        assert_eq!(amount.as_str(), "0.050");
        assert_eq!(amount.to_string(), "0.050");
    }

    #[test]
    fn converts_to_wei() {
        let amount = Amount::parse("0.05").unwrap();
        assert_eq!(amount.to_base_units(18).unwrap(), 50_000_000_000_000_000);

        let amount = Amount::parse("2").unwrap();
        assert_eq!(amount.to_base_units(6).unwrap(), 2_000_000);

        let amount = Amount::parse("1.25e-2").unwrap();
        assert_eq!(amount.to_base_units(4).unwrap(), 125);
    }

    #[test]
    fn converts_across_the_configurable_decimal_range() {
        let one = Amount::parse("1").unwrap();
        for decimals in [0, 18, 19, 20, 24, 30] {
            assert_eq!(
                one.to_base_units(decimals).unwrap(),
                10u128.pow(decimals),
                "decimals = {decimals}"
            );
        }
        let small = Amount::parse("0.000000000000000000000000001").unwrap();
        assert_eq!(small.to_base_units(30).unwrap(), 1_000);
    }

    #[test]
    fn excess_precision_rounds_half_up() {
        assert_eq!(Amount::parse("1.25").unwrap().to_base_units(1).unwrap(), 13);
        assert_eq!(Amount::parse("1.24").unwrap().to_base_units(1).unwrap(), 12);
    }

    #[test]
    fn dust_below_one_unit_is_rejected() {
        let amount = Amount::parse("0.0000001").unwrap();
        assert!(matches!(
            amount.to_base_units(6),
            Err(WalletError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn valid_but_unconvertible_amounts_fail_at_conversion() {
        for raw in ["1e30", "1e-30"] {
            let amount = Amount::parse(raw).unwrap();
            assert!(
                matches!(amount.to_base_units(18), Err(WalletError::InvalidAmount { .. })),
                "{raw} should not convert"
            );
        }
    }

    #[test]
    fn formats_base_units() {
        assert_eq!(format_units(0, 18), "0");
        assert_eq!(format_units(1_500_000_000_000_000_000, 18), "1.5");
        assert_eq!(format_units(1, 18), "0.000000000000000001");
        assert_eq!(format_units(42_000_000, 6), "42");
    }
}
