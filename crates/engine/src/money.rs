use std::fmt;

use crate::{Currency, EngineError, ResultEngine};

/// Signed money amount represented as **integer minor units** of a currency.
///
/// Use this type for **all** monetary values in the engine (transfer amounts,
/// ledger entries, balances) to avoid floating-point drift. The precision is
/// scoped by the currency: `Money::new(1050, Currency::Usd)` is `10.50 USD`,
/// `Money::new(1050, Currency::Jpy)` is `1050 JPY`.
///
/// # Examples
///
/// ```rust
/// use engine::{Currency, Money};
///
/// let amount = Money::parse("12.34", Currency::Usd).unwrap();
/// assert_eq!(amount.minor(), 1234);
/// assert_eq!(amount.to_string(), "12.34 USD");
/// assert_eq!(amount.decimal_string(), "12.34");
/// ```
///
/// Parsing rejects more precision than the currency carries:
///
/// ```rust
/// use engine::{Currency, Money};
///
/// assert!(Money::parse("12.345", Currency::Usd).is_err());
/// assert!(Money::parse("1.5", Currency::Jpy).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Money {
    minor: i64,
    currency: Currency,
}

impl Money {
    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn new(minor: i64, currency: Currency) -> Self {
        Self { minor, currency }
    }

    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self { minor: 0, currency }
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.minor
    }

    #[must_use]
    pub const fn currency(self) -> Currency {
        self.currency
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.minor > 0
    }

    /// Checked addition (returns `None` on overflow or currency mismatch).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        if self.currency != rhs.currency {
            return None;
        }
        self.minor
            .checked_add(rhs.minor)
            .map(|minor| Money::new(minor, self.currency))
    }

    /// Checked subtraction (returns `None` on overflow or currency mismatch).
    #[must_use]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        if self.currency != rhs.currency {
            return None;
        }
        self.minor
            .checked_sub(rhs.minor)
            .map(|minor| Money::new(minor, self.currency))
    }

    /// Formats the amount as a plain decimal with exactly the currency's
    /// precision, without the currency code (`50.00`, `500`, `1.250`).
    #[must_use]
    pub fn decimal_string(self) -> String {
        let sign = if self.minor < 0 { "-" } else { "" };
        let abs = self.minor.unsigned_abs();
        let digits = u32::from(self.currency.minor_units());
        if digits == 0 {
            return format!("{sign}{abs}");
        }
        let scale = 10u64.pow(digits);
        let major = abs / scale;
        let fraction = abs % scale;
        let width = digits as usize;
        format!("{sign}{major}.{fraction:0width$}")
    }

    /// Parses a decimal string into minor units of `currency`.
    ///
    /// Accepts an optional leading `+`/`-` and `.` as decimal separator.
    ///
    /// Validation rules:
    /// - at most `currency.minor_units()` significant fractional digits
    ///   (trailing zeros beyond the precision are accepted: `50.000 USD`)
    /// - rejects empty/invalid strings, exponents and thousands separators
    /// - rejects values that overflow `i64` minor units
    pub fn parse(input: &str, currency: Currency) -> ResultEngine<Self> {
        let empty = || EngineError::InvalidRequest("empty amount".to_string());
        let invalid = || EngineError::InvalidRequest(format!("invalid amount: {}", input.trim()));
        let overflow = || EngineError::InvalidRequest("amount too large".to_string());

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, trimmed)
        };
        if rest.is_empty() {
            return Err(empty());
        }

        let (major_str, fraction_str) = match rest.split_once('.') {
            Some((major, fraction)) => (major, fraction),
            None => (rest, ""),
        };

        if major_str.is_empty() || !major_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if !fraction_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let digits = usize::from(currency.minor_units());
        let significant = fraction_str.trim_end_matches('0');
        if significant.len() > digits {
            return Err(EngineError::InvalidRequest(format!(
                "{} supports at most {digits} decimal places",
                currency.code()
            )));
        }

        let scale = 10i64.pow(u32::from(currency.minor_units()));
        let major: i64 = major_str.parse().map_err(|_| overflow())?;
        let fraction: i64 = if digits == 0 {
            0
        } else {
            // Right-pad to the currency precision: "5" -> "50" for cents.
            let padded = format!("{significant:0<digits$}");
            padded.parse().map_err(|_| invalid())?
        };

        let total = major
            .checked_mul(scale)
            .and_then(|v| v.checked_add(fraction))
            .ok_or_else(overflow)?;
        let minor = if negative {
            total.checked_neg().ok_or_else(overflow)?
        } else {
            total
        };

        Ok(Money::new(minor, currency))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.decimal_string(), self.currency.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_currency_precision() {
        assert_eq!(Money::new(0, Currency::Usd).to_string(), "0.00 USD");
        assert_eq!(Money::new(1, Currency::Usd).to_string(), "0.01 USD");
        assert_eq!(Money::new(5000, Currency::Usd).to_string(), "50.00 USD");
        assert_eq!(Money::new(-1050, Currency::Eur).to_string(), "-10.50 EUR");
        assert_eq!(Money::new(500, Currency::Jpy).to_string(), "500 JPY");
        assert_eq!(Money::new(1250, Currency::Kwd).to_string(), "1.250 KWD");
    }

    #[test]
    fn parse_scales_by_currency() {
        assert_eq!(Money::parse("50", Currency::Usd).unwrap().minor(), 5000);
        assert_eq!(Money::parse("50.5", Currency::Usd).unwrap().minor(), 5050);
        assert_eq!(Money::parse("50.05", Currency::Usd).unwrap().minor(), 5005);
        assert_eq!(Money::parse("  2.30 ", Currency::Usd).unwrap().minor(), 230);
        assert_eq!(Money::parse("500", Currency::Jpy).unwrap().minor(), 500);
        assert_eq!(Money::parse("1.25", Currency::Kwd).unwrap().minor(), 1250);
        assert_eq!(Money::parse("-0.01", Currency::Usd).unwrap().minor(), -1);
        assert_eq!(Money::parse("+1.00", Currency::Usd).unwrap().minor(), 100);
    }

    #[test]
    fn parse_accepts_trailing_zeros_beyond_precision() {
        assert_eq!(Money::parse("50.000", Currency::Usd).unwrap().minor(), 5000);
        assert_eq!(Money::parse("500.0", Currency::Jpy).unwrap().minor(), 500);
    }

    #[test]
    fn parse_rejects_excess_precision() {
        assert!(Money::parse("12.345", Currency::Usd).is_err());
        assert!(Money::parse("0.001", Currency::Eur).is_err());
        assert!(Money::parse("1.5", Currency::Jpy).is_err());
    }

    #[test]
    fn parse_rejects_garbage() {
        for input in ["", " ", "-", "abc", "1,000", "1e3", "1.2.3", ".5", "12 34"] {
            assert!(Money::parse(input, Currency::Usd).is_err(), "{input:?}");
        }
    }

    #[test]
    fn parse_rejects_overflow() {
        assert!(Money::parse("92233720368547758.08", Currency::Usd).is_err());
    }

    #[test]
    fn checked_ops_refuse_mixed_currencies() {
        let usd = Money::new(100, Currency::Usd);
        let eur = Money::new(100, Currency::Eur);
        assert_eq!(usd.checked_add(eur), None);
        assert_eq!(
            usd.checked_sub(Money::new(30, Currency::Usd)),
            Some(Money::new(70, Currency::Usd))
        );
    }
}
