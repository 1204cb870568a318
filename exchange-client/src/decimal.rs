//! # Fixed-Point Codec
//!
//! Every amount, price, fee and funds field of the exchange protocol is a [`ScaledDecimal`]:
//! the quantity multiplied by `10^10` and written as a base-10 integer string
//! (`1000 USDT` travels as `"10000000000000"`). Floating point never touches the wire.
//!
//! All arithmetic happens on the underlying integers. Only human display divides by the
//! scale, through [`ScaledDecimal::to_decimal`].
//!
//! ## Funds
//!
//! The cost of `amount` at `price` is `(price_int * amount_int) / 10^10`, truncated toward
//! zero. [`ScaledDecimal::funds`] is the single place that computes it, so every consumer
//! matches the engine's bookkeeping to the last unit.
use crate::error::CodecError;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::{fmt, str::FromStr};

/// Number of fractional decimal digits carried by a scaled value.
pub const DECIMALS: u32 = 10;

/// `10^DECIMALS`, the factor between a quantity and its wire integer.
pub const SCALE: i128 = 10_000_000_000;

/// A quantity stored as `value * 10^10` in an `i128`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScaledDecimal(i128);

impl ScaledDecimal {
    pub const ZERO: Self = Self(0);

    /// Wraps an already scaled integer.
    pub const fn from_raw(raw: i128) -> Self {
        Self(raw)
    }

    /// The scaled integer, i.e. what goes on the wire.
    pub const fn raw(self) -> i128 {
        self.0
    }

    /// Scales a whole number of units.
    pub fn from_units(units: i64) -> Self {
        // |i64| * 10^10 always fits in an i128.
        Self(i128::from(units) * SCALE)
    }

    /// Encodes a real number as `round(value * 10^10)`, halves rounded away from zero.
    ///
    /// Values with at most ten fractional digits survive [`Self::to_f64`] exactly, every
    /// other value within `10^-10`.
    pub fn from_f64(value: f64) -> Result<Self, CodecError> {
        if !value.is_finite() {
            return Err(CodecError::NotRepresentable(value.to_string()));
        }

        let scaled = (value * SCALE as f64).round();
        if scaled < i128::MIN as f64 || scaled >= i128::MAX as f64 {
            return Err(CodecError::NotRepresentable(value.to_string()));
        }

        Ok(Self(scaled as i128))
    }

    /// Encodes an exact decimal, rounding anything past the tenth fractional digit.
    pub fn from_decimal(value: Decimal) -> Result<Self, CodecError> {
        let scaled = value
            .checked_mul(Decimal::from(SCALE as i64))
            .ok_or(CodecError::Overflow("decimal scaling"))?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

        scaled
            .to_i128()
            .map(Self)
            .ok_or(CodecError::Overflow("decimal scaling"))
    }

    /// Lossy conversion for display or charting.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / SCALE as f64
    }

    /// Exact human-readable value, e.g. `0.005` for `"50000000"`.
    ///
    /// Fails when the raw integer exceeds the 96 bit mantissa of [`Decimal`].
    pub fn to_decimal(self) -> Result<Decimal, CodecError> {
        Decimal::try_from_i128_with_scale(self.0, DECIMALS)
            .map(|d| d.normalize())
            .map_err(|_| CodecError::Overflow("decimal conversion"))
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Self) -> Result<Self, CodecError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(CodecError::Overflow("addition"))
    }

    pub fn checked_sub(self, other: Self) -> Result<Self, CodecError> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(CodecError::Overflow("subtraction"))
    }

    /// Funds needed to trade `amount` at `price`: `(price * amount) / 10^10`, truncated
    /// toward zero exactly like the engine's integer division.
    pub fn funds(price: Self, amount: Self) -> Result<Self, CodecError> {
        price
            .0
            .checked_mul(amount.0)
            .map(|product| Self(product / SCALE))
            .ok_or(CodecError::Overflow("price * amount"))
    }
}

impl fmt::Display for ScaledDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ScaledDecimal {
    type Err = CodecError;

    /// Accepts an optional leading `-` followed by ASCII digits only: no fraction, no
    /// exponent, no `+`, no whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('-').unwrap_or(s);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CodecError::InvalidScaledDecimal(s.to_string()));
        }

        s.parse::<i128>()
            .map(Self)
            .map_err(|_| CodecError::NotRepresentable(s.to_string()))
    }
}

impl From<i128> for ScaledDecimal {
    fn from(raw: i128) -> Self {
        Self(raw)
    }
}

impl Serialize for ScaledDecimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ScaledDecimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ScaledDecimalVisitor)
    }
}

struct ScaledDecimalVisitor;

impl de::Visitor<'_> for ScaledDecimalVisitor {
    type Value = ScaledDecimal;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a base-10 integer string scaled by 10^10")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        // An unset proto3 string arrives empty and reads as zero.
        if v.is_empty() {
            return Ok(ScaledDecimal::ZERO);
        }
        v.parse().map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(ScaledDecimal(i128::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(ScaledDecimal(i128::from(v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaled(s: &str) -> ScaledDecimal {
        s.parse().unwrap()
    }

    #[test]
    fn encodes_deposit_amounts() {
        assert_eq!(
            ScaledDecimal::from_f64(1000.0).unwrap().to_string(),
            "10000000000000"
        );
        assert_eq!(
            ScaledDecimal::from_f64(0.01).unwrap().to_string(),
            "100000000"
        );
        assert_eq!(
            ScaledDecimal::from_f64(0.005).unwrap().to_string(),
            "50000000"
        );
        assert_eq!(
            ScaledDecimal::from_f64(-2.5).unwrap().to_string(),
            "-25000000000"
        );
        assert_eq!(ScaledDecimal::from_units(30000), scaled("300000000000000"));
    }

    #[test]
    fn short_fractions_round_trip_exactly() {
        for value in [
            0.0,
            0.1,
            0.3,
            0.005,
            1000.0,
            30000.0,
            123.456_789_012_3,
            -0.000_000_000_1,
            -98765.4321,
        ] {
            let decoded = ScaledDecimal::from_f64(value).unwrap().to_f64();
            assert_eq!(decoded, value, "round trip of {value}");
        }
    }

    #[test]
    fn long_fractions_round_trip_within_one_unit() {
        for value in [1.0 / 3.0, 2.0 / 7.0, std::f64::consts::PI, -1.0 / 9.0] {
            let decoded = ScaledDecimal::from_f64(value).unwrap().to_f64();
            assert!((decoded - value).abs() <= 1e-10, "round trip of {value}");
        }
    }

    #[test]
    fn rejects_non_finite_values() {
        assert!(ScaledDecimal::from_f64(f64::NAN).is_err());
        assert!(ScaledDecimal::from_f64(f64::INFINITY).is_err());
        assert!(ScaledDecimal::from_f64(1e30).is_err());
    }

    #[test]
    fn parses_only_plain_integers() {
        assert_eq!(scaled("0"), ScaledDecimal::ZERO);
        assert_eq!(scaled("-42").raw(), -42);
        assert_eq!(scaled("007").raw(), 7);

        for bad in ["", "-", "1.5", "1e10", "+5", "--1", " 1", "1 ", "0x10", "abc"] {
            assert!(
                matches!(
                    bad.parse::<ScaledDecimal>(),
                    Err(CodecError::InvalidScaledDecimal(_))
                ),
                "'{bad}' should be rejected"
            );
        }

        assert!(matches!(
            "9999999999999999999999999999999999999999".parse::<ScaledDecimal>(),
            Err(CodecError::NotRepresentable(_))
        ));
    }

    #[test]
    fn funds_truncate_toward_zero() {
        // 30000 * 0.005 = 150
        let funds =
            ScaledDecimal::funds(scaled("300000000000000"), scaled("50000000")).unwrap();
        assert_eq!(funds, scaled("1500000000000"));
        assert_eq!(funds.to_decimal().unwrap().to_string(), "150");

        // 3e-10 * 3e-10 is far below one unit
        let dust = ScaledDecimal::funds(scaled("3"), scaled("3")).unwrap();
        assert_eq!(dust, ScaledDecimal::ZERO);

        // 0.3 * 0.0000000015 = 4.5e-10 -> 4 units, never rounded up
        let truncated = ScaledDecimal::funds(scaled("3000000000"), scaled("15")).unwrap();
        assert_eq!(truncated.raw(), 4);

        let negative = ScaledDecimal::funds(scaled("-3000000000"), scaled("15")).unwrap();
        assert_eq!(negative.raw(), -4);
    }

    #[test]
    fn funds_overflow_is_reported() {
        let huge = ScaledDecimal::from_raw(i128::MAX / 2);
        assert!(matches!(
            ScaledDecimal::funds(huge, huge),
            Err(CodecError::Overflow(_))
        ));
    }

    #[test]
    fn ledger_arithmetic_is_exact() {
        let deposit = ScaledDecimal::from_f64(1000.0).unwrap();
        let frozen = scaled("1500000000000");

        let available = deposit.checked_sub(frozen).unwrap();
        assert_eq!(available, scaled("8500000000000"));
        assert_eq!(available.checked_add(frozen).unwrap(), deposit);
        assert!(available < deposit);
    }

    #[test]
    fn decimal_conversions() {
        let price = ScaledDecimal::from_decimal(Decimal::from_str("0.3").unwrap()).unwrap();
        assert_eq!(price, scaled("3000000000"));
        assert_eq!(price.to_decimal().unwrap(), Decimal::from_str("0.3").unwrap());

        let rounded =
            ScaledDecimal::from_decimal(Decimal::from_str("0.00000000005").unwrap()).unwrap();
        assert_eq!(rounded.raw(), 1);
    }

    #[test]
    fn serde_uses_integer_strings() {
        let value = scaled("10000000000000");
        assert_eq!(
            serde_json::to_value(value).unwrap(),
            serde_json::json!("10000000000000")
        );

        let parsed: ScaledDecimal = serde_json::from_value(serde_json::json!("-15")).unwrap();
        assert_eq!(parsed.raw(), -15);

        let empty: ScaledDecimal = serde_json::from_value(serde_json::json!("")).unwrap();
        assert_eq!(empty, ScaledDecimal::ZERO);

        let number: ScaledDecimal = serde_json::from_value(serde_json::json!(100)).unwrap();
        assert_eq!(number.raw(), 100);

        assert!(serde_json::from_value::<ScaledDecimal>(serde_json::json!("1.5")).is_err());
        assert!(serde_json::from_value::<ScaledDecimal>(serde_json::json!(1.5)).is_err());
    }
}
