//! Rate Pricing
//!
//! Turns a raw snapshot into the sale/buy board shown to customers.
//!
//! Rules, applied per unit in decimal arithmetic:
//! 1. Sale = raw scraped price rounded to the unit's step
//!    (tola: nearest 1, 10 g: nearest 0.50), midpoints away from zero.
//! 2. Buy = sale minus the configured deduction, rounded to the same step.
//!    Percentage deduction: `sale × percent / 100`. Flat deduction: a fixed
//!    amount per unit, never going below zero.
//! 3. Display: currency prefix, comma thousands separators, unit-specific
//!    fraction digits (tola 0-2, 10 g exactly 2).

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::quote::QuoteSnapshot;

/// Default currency prefix on the board
pub const DEFAULT_CURRENCY_PREFIX: &str = "Rs. ";

/// Unit of a quoted price
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Tola,
    TenGram,
}

/// How the buy price is derived from the sale price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeductionRule {
    /// Buy = sale − sale × percent / 100
    Percentage { percent: Decimal },
    /// Buy = sale − fixed amount per unit, floored at zero
    Flat { tola: Decimal, ten_gram: Decimal },
}

impl Default for DeductionRule {
    fn default() -> Self {
        DeductionRule::Percentage { percent: dec!(4) }
    }
}

impl DeductionRule {
    /// Unrounded buy price for a (rounded) sale price.
    /// Out-of-range arithmetic gives zero rather than panicking.
    pub fn buy_price(&self, sale: Decimal, unit: Unit) -> Decimal {
        let buy = match self {
            DeductionRule::Percentage { percent } => percent
                .checked_div(dec!(100))
                .and_then(|rate| sale.checked_mul(rate))
                .and_then(|deduction| sale.checked_sub(deduction)),
            DeductionRule::Flat { tola, ten_gram } => match unit {
                Unit::Tola => sale.checked_sub(*tola),
                Unit::TenGram => sale.checked_sub(*ten_gram),
            },
        };
        buy.unwrap_or(Decimal::ZERO).max(Decimal::ZERO)
    }
}

/// Rounding step and display precision for one unit
#[derive(Debug, Clone, PartialEq)]
pub struct UnitFormat {
    pub step: Decimal,
    pub min_fraction_digits: u32,
    pub max_fraction_digits: u32,
}

impl UnitFormat {
    pub fn tola() -> Self {
        Self {
            step: dec!(1),
            min_fraction_digits: 0,
            max_fraction_digits: 2,
        }
    }

    pub fn ten_gram() -> Self {
        Self {
            step: dec!(0.5),
            min_fraction_digits: 2,
            max_fraction_digits: 2,
        }
    }
}

/// Sale and buy price for one unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    pub sale: Decimal,
    pub buy: Decimal,
}

/// Both units, ready to display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateBoard {
    pub tola: PriceQuote,
    pub ten_gram: PriceQuote,
}

/// Deduction, rounding and display settings
#[derive(Debug, Clone, PartialEq)]
pub struct PricingPolicy {
    pub deduction: DeductionRule,
    pub tola: UnitFormat,
    pub ten_gram: UnitFormat,
    pub currency_prefix: String,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            deduction: DeductionRule::default(),
            tola: UnitFormat::tola(),
            ten_gram: UnitFormat::ten_gram(),
            currency_prefix: DEFAULT_CURRENCY_PREFIX.to_string(),
        }
    }
}

impl PricingPolicy {
    fn unit_format(&self, unit: Unit) -> &UnitFormat {
        match unit {
            Unit::Tola => &self.tola,
            Unit::TenGram => &self.ten_gram,
        }
    }

    /// Sale/buy pair for a raw scraped price
    pub fn quote(&self, raw_sale: f64, unit: Unit) -> PriceQuote {
        let step = self.unit_format(unit).step;
        let raw = Decimal::from_f64(raw_sale)
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO);

        let sale = round_to_step(raw, step);
        let buy = round_to_step(self.deduction.buy_price(sale, unit), step);

        PriceQuote { sale, buy }
    }

    /// Price both units of a snapshot
    pub fn board(&self, snapshot: &QuoteSnapshot) -> RateBoard {
        RateBoard {
            tola: self.quote(snapshot.per_tola, Unit::Tola),
            ten_gram: self.quote(snapshot.per_ten_gram, Unit::TenGram),
        }
    }

    /// "Rs. 150,000" style display string
    pub fn format(&self, amount: Decimal, unit: Unit) -> String {
        let format = self.unit_format(unit);
        format!(
            "{}{}",
            self.currency_prefix,
            format_amount(amount, format.min_fraction_digits, format.max_fraction_digits)
        )
    }
}

/// Round to the nearest multiple of `step` (midpoint away from zero).
/// Values too large to divide by `step` are returned unrounded.
pub fn round_to_step(value: Decimal, step: Decimal) -> Decimal {
    if step <= Decimal::ZERO {
        return value;
    }
    value
        .checked_div(step)
        .map(|steps| steps.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|steps| steps.checked_mul(step))
        .unwrap_or(value)
}

/// Comma-grouped amount with between `min` and `max` fraction digits
pub fn format_amount(value: Decimal, min_fraction_digits: u32, max_fraction_digits: u32) -> String {
    let max_fraction_digits = max_fraction_digits.max(min_fraction_digits);
    let rounded = value
        .round_dp_with_strategy(max_fraction_digits, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let negative = rounded.is_sign_negative() && !rounded.is_zero();

    let text = rounded.abs().to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part.to_string(), frac_part.to_string()),
        None => (text, String::new()),
    };

    let mut fraction = frac_part;
    while (fraction.len() as u32) < min_fraction_digits {
        fraction.push('0');
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&group_thousands(&int_part));
    if !fraction.is_empty() {
        out.push('.');
        out.push_str(&fraction);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_board() {
        let policy = PricingPolicy::default();
        let board = policy.board(&QuoteSnapshot::live(150_000.0, 12_859.5));

        assert_eq!(board.tola.sale, dec!(150000));
        assert_eq!(board.tola.buy, dec!(144000));
        assert_eq!(board.ten_gram.sale, dec!(12859.5));
        // 12859.5 × 0.96 = 12345.12 → nearest 0.50
        assert_eq!(board.ten_gram.buy, dec!(12345.0));
    }

    #[test]
    fn test_sale_rounding() {
        let policy = PricingPolicy::default();

        assert_eq!(policy.quote(5_683.2, Unit::Tola).sale, dec!(5683));
        assert_eq!(policy.quote(5_683.5, Unit::Tola).sale, dec!(5684));
        assert_eq!(policy.quote(4_872.48, Unit::TenGram).sale, dec!(4872.5));
        assert_eq!(policy.quote(4_872.20, Unit::TenGram).sale, dec!(4872.0));
        assert_eq!(policy.quote(4_872.25, Unit::TenGram).sale, dec!(4872.5));
    }

    #[test]
    fn test_flat_deduction() {
        let policy = PricingPolicy {
            deduction: DeductionRule::Flat {
                tola: dec!(500),
                ten_gram: dec!(430),
            },
            ..PricingPolicy::default()
        };

        let tola = policy.quote(2_750.0, Unit::Tola);
        assert_eq!(tola.buy, dec!(2250));

        let ten_gram = policy.quote(2_357.5, Unit::TenGram);
        assert_eq!(ten_gram.buy, dec!(1927.5));

        let floor = policy.quote(100.0, Unit::Tola);
        assert_eq!(floor.buy, Decimal::ZERO);
    }

    #[test]
    fn test_zero_and_invalid_prices() {
        let policy = PricingPolicy::default();
        let board = policy.board(&QuoteSnapshot::uninitialized());
        assert_eq!(board.tola.sale, Decimal::ZERO);
        assert_eq!(board.tola.buy, Decimal::ZERO);

        assert_eq!(policy.quote(f64::NAN, Unit::Tola).sale, Decimal::ZERO);
        assert_eq!(policy.quote(-10.0, Unit::Tola).sale, Decimal::ZERO);
    }

    #[test]
    fn test_format_display() {
        let policy = PricingPolicy::default();

        assert_eq!(policy.format(dec!(150000), Unit::Tola), "Rs. 150,000");
        assert_eq!(policy.format(dec!(144000), Unit::Tola), "Rs. 144,000");
        assert_eq!(policy.format(dec!(12859.5), Unit::TenGram), "Rs. 12,859.50");
        assert_eq!(policy.format(dec!(12345.0), Unit::TenGram), "Rs. 12,345.00");
        assert_eq!(policy.format(Decimal::ZERO, Unit::Tola), "Rs. 0");
        assert_eq!(policy.format(Decimal::ZERO, Unit::TenGram), "Rs. 0.00");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(1234567.891), 0, 2), "1,234,567.89");
        assert_eq!(format_amount(dec!(999), 0, 2), "999");
        assert_eq!(format_amount(dec!(1000), 2, 2), "1,000.00");
        assert_eq!(format_amount(dec!(1000.5), 0, 2), "1,000.5");
        assert_eq!(format_amount(dec!(-1500), 0, 0), "-1,500");
    }

    #[test]
    fn test_round_to_step() {
        assert_eq!(round_to_step(dec!(10.26), dec!(0.5)), dec!(10.5));
        assert_eq!(round_to_step(dec!(10.24), dec!(0.5)), dec!(10.0));
        assert_eq!(round_to_step(dec!(10.24), Decimal::ZERO), dec!(10.24));
        assert_eq!(round_to_step(Decimal::MAX, dec!(0.5)), Decimal::MAX);
    }

    #[test]
    fn test_out_of_range_prices_do_not_panic() {
        let policy = PricingPolicy::default();
        let huge = policy.board(&QuoteSnapshot::live(3e28, 7.5e28));
        assert!(huge.tola.sale > Decimal::ZERO);
        assert!(huge.tola.buy <= huge.tola.sale);
        assert!(huge.ten_gram.sale > Decimal::ZERO);
        assert!(policy.format(huge.tola.sale, Unit::Tola).starts_with("Rs. "));
        assert!(policy.format(huge.ten_gram.buy, Unit::TenGram).starts_with("Rs. "));

        let surcharge = DeductionRule::Percentage { percent: dec!(-100) };
        assert_eq!(surcharge.buy_price(Decimal::MAX, Unit::Tola), Decimal::ZERO);

        let negative_flat = DeductionRule::Flat {
            tola: dec!(-1),
            ten_gram: dec!(-1),
        };
        assert_eq!(negative_flat.buy_price(Decimal::MAX, Unit::TenGram), Decimal::ZERO);

        // Beyond Decimal range entirely
        assert_eq!(policy.quote(1e30, Unit::Tola).sale, Decimal::ZERO);
    }

    #[test]
    fn test_deduction_rule_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            deduction: DeductionRule,
        }

        let percentage: Wrapper = toml::from_str("deduction = { kind = \"percentage\", percent = 4.5 }").unwrap();
        assert_eq!(percentage.deduction, DeductionRule::Percentage { percent: dec!(4.5) });

        let flat: Wrapper =
            toml::from_str("deduction = { kind = \"flat\", tola = 500, ten_gram = 430 }").unwrap();
        assert_eq!(
            flat.deduction,
            DeductionRule::Flat {
                tola: dec!(500),
                ten_gram: dec!(430)
            }
        );
    }
}
