//! Currency-aware amount formatting.
//!
//! Every amount the panel displays - balances, transaction amounts, order
//! costs - goes through [`CurrencyCode::format`] with the account's currency
//! preference. Formatting anywhere else is a bug: optimistic values and
//! reconciled values must render identically.
//!
//! Each currency carries a fixed `{symbol, rate, placement}` triple. Rates
//! convert from the backend's stored USD amounts to the display currency;
//! the backend stays authoritative for the stored value.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Supported display currencies.
///
/// Unknown preferences fall back to [`CurrencyCode::Usd`], both when
/// parsing a preference string and when the preference field is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    #[default]
    Usd,
    Eur,
    Gbp,
    Mad,
    Aed,
}

impl CurrencyCode {
    /// Parse a preference string, falling back to USD for anything
    /// unrecognized.
    #[must_use]
    pub fn parse(preference: &str) -> Self {
        match preference.trim().to_uppercase().as_str() {
            "EUR" => Self::Eur,
            "GBP" => Self::Gbp,
            "MAD" => Self::Mad,
            "AED" => Self::Aed,
            _ => Self::Usd,
        }
    }

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Mad => "MAD",
            Self::Aed => "AED",
        }
    }

    /// Display symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Usd => "$",
            Self::Eur => "€",
            Self::Gbp => "£",
            Self::Mad => "MAD",
            Self::Aed => "AED",
        }
    }

    /// Symbol placement is fixed per currency, not configurable.
    const fn symbol_is_prefix(self) -> bool {
        matches!(self, Self::Usd | Self::Gbp)
    }

    /// Fixed conversion rate from the backend's stored USD amounts.
    #[must_use]
    pub fn rate(&self) -> Decimal {
        match self {
            Self::Usd => Decimal::ONE,
            Self::Eur => Decimal::new(92, 2),  // 0.92
            Self::Gbp => Decimal::new(79, 2),  // 0.79
            Self::Mad => Decimal::new(100, 1), // 10.0
            Self::Aed => Decimal::new(367, 2), // 3.67
        }
    }

    /// Format a stored amount for display.
    ///
    /// Applies the conversion rate, rounds to exactly two decimal digits,
    /// groups thousands, and places the symbol per currency.
    #[must_use]
    pub fn format(self, amount: Decimal) -> String {
        let converted = (amount * self.rate())
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        let negative = converted.is_sign_negative() && !converted.is_zero();
        let body = format!("{:.2}", converted.abs());
        let (int_part, frac_part) = body.split_once('.').unwrap_or((body.as_str(), "00"));
        let grouped = group_digits(int_part);

        let sign = if negative { "-" } else { "" };
        if self.symbol_is_prefix() {
            format!("{sign}{}{grouped}.{frac_part}", self.symbol())
        } else {
            format!("{sign}{grouped}.{frac_part} {}", self.symbol())
        }
    }

    /// Format a raw backend value that may arrive as a string.
    ///
    /// Non-numeric characters are stripped before parsing; input with no
    /// numeric content formats as zero rather than failing.
    #[must_use]
    pub fn format_raw(self, raw: &str) -> String {
        self.format(coerce_amount(raw))
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Coerce a loosely-typed amount string to a [`Decimal`], treating
/// non-numeric input as zero.
#[must_use]
pub fn coerce_amount(raw: &str) -> Decimal {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse::<Decimal>().unwrap_or(Decimal::ZERO)
}

/// Insert thousands separators into a plain digit string.
///
/// Also used for quantity labels ("10,000 followers"), which is why it is
/// public rather than an implementation detail of [`CurrencyCode::format`].
#[must_use]
pub fn group_digits(digits: &str) -> String {
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
