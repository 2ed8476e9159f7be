//! Display currencies.
//!
//! Prices are stored in USD; the storefront and email receipts render them in
//! the shopper's preferred currency using fixed exchange rates. Orders keep
//! the rate they were placed with so old receipts keep their numbers.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Pkr,
    Aed,
}

impl Currency {
    /// Units per one USD.
    pub fn rate(self) -> Decimal {
        match self {
            Self::Usd => Decimal::ONE,
            Self::Pkr => Decimal::new(27850, 2),
            Self::Aed => Decimal::new(367, 2),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Usd => "$",
            Self::Pkr => "Rs ",
            Self::Aed => "AED ",
        }
    }

    /// PKR amounts read better without cents.
    pub fn decimals(self) -> u32 {
        match self {
            Self::Pkr => 0,
            _ => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Pkr => "PKR",
            Self::Aed => "AED",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "PKR" => Ok(Self::Pkr),
            "AED" => Ok(Self::Aed),
            _ => Err(UnknownCurrency),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown currency")]
pub struct UnknownCurrency;

/// Format a USD amount in `currency` using its built-in rate.
pub fn format_in(amount_usd: Decimal, currency: Currency) -> String {
    format_with_rate(amount_usd, currency, currency.rate())
}

/// Format a USD amount using an explicit rate (orders snapshot theirs).
pub fn format_with_rate(amount_usd: Decimal, currency: Currency, rate: Decimal) -> String {
    let converted = (amount_usd * rate).round_dp(currency.decimals());
    format!("{}{}", currency.symbol(), group_thousands(&converted.to_string()))
}

/// Insert thousands separators into a plain decimal string.
fn group_thousands(raw: &str) -> String {
    let (number, fraction) = match raw.split_once('.') {
        Some((n, f)) => (n, Some(f)),
        None => (raw, None),
    };
    let (sign, digits) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match fraction {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}
