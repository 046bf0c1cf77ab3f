//! Money amounts and their display in a shop currency.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., yen, dollars - not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Format for display with the currency symbol and thousands separators.
    ///
    /// ```
    /// use atelier_core::{CurrencyCode, Price};
    /// use rust_decimal::Decimal;
    ///
    /// let price = Price::new(Decimal::new(250_000, 0), CurrencyCode::JPY);
    /// assert_eq!(price.display(), "¥250,000");
    ///
    /// let price = Price::new(Decimal::new(123_456, 2), CurrencyCode::USD);
    /// assert_eq!(price.display(), "$1,234.56");
    /// ```
    #[must_use]
    pub fn display(&self) -> String {
        let dp = self.currency_code.minor_units();
        let rounded = self.amount.round_dp(dp);
        let fixed = format!("{:.*}", dp as usize, rounded.abs());

        let (int_part, frac_part) = match fixed.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (fixed.as_str(), None),
        };

        let mut out = String::new();
        if rounded.is_sign_negative() && !rounded.is_zero() {
            out.push('-');
        }
        out.push_str(self.currency_code.symbol());
        out.push_str(&group_thousands(int_part));
        if let Some(frac) = frac_part {
            out.push('.');
            out.push_str(frac);
        }
        out
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Insert `,` every three digits from the right.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// ISO 4217 currency codes accepted by the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    JPY,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::JPY => "¥",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// Number of digits after the decimal point.
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Self::JPY => 0,
            Self::USD | Self::EUR | Self::GBP => 2,
        }
    }

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::JPY => "JPY",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "JPY" => Ok(Self::JPY),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            _ => Err(format!("unsupported currency: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_small_amounts() {
        assert_eq!(
            Price::new(Decimal::ZERO, CurrencyCode::JPY).display(),
            "¥0"
        );
        assert_eq!(
            Price::new(Decimal::new(999, 0), CurrencyCode::JPY).display(),
            "¥999"
        );
        assert_eq!(
            Price::new(Decimal::new(5, 1), CurrencyCode::EUR).display(),
            "€0.50"
        );
    }

    #[test]
    fn test_display_rounds_to_minor_units() {
        let price = Price::new(Decimal::new(10_005, 1), CurrencyCode::JPY);
        assert_eq!(price.display(), "¥1,000");

        let price = Price::new(Decimal::new(1_234_567, 3), CurrencyCode::GBP);
        assert_eq!(price.display(), "£1,234.57");
    }

    #[test]
    fn test_display_negative() {
        let price = Price::new(Decimal::new(-1500, 0), CurrencyCode::JPY);
        assert_eq!(price.display(), "-¥1,500");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("1"), "1");
        assert_eq!(group_thousands("123"), "123");
        assert_eq!(group_thousands("1234"), "1,234");
        assert_eq!(group_thousands("1234567"), "1,234,567");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("jpy".parse::<CurrencyCode>().unwrap(), CurrencyCode::JPY);
        assert_eq!("USD".parse::<CurrencyCode>().unwrap(), CurrencyCode::USD);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }
}
