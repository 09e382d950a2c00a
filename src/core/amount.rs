//! Arbitrary-precision decimal amounts.
//!
//! Balances are summed across the whole chain, so amounts are kept as an
//! integer mantissa with a base-10 scale: `mantissa * 10^-scale`. No floating
//! point is involved in arithmetic or comparison.

use crate::error::{BlockchainError, Result};
use num_bigint::{BigInt, Sign};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Amount {
    mantissa: BigInt,
    scale: u32,
}

impl Amount {
    pub fn zero() -> Amount {
        Amount {
            mantissa: BigInt::from(0),
            scale: 0,
        }
    }

    pub fn from_integer(value: i64) -> Amount {
        Amount {
            mantissa: BigInt::from(value),
            scale: 0,
        }
    }

    pub fn is_negative(&self) -> bool {
        self.mantissa.sign() == Sign::Minus
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa.sign() == Sign::NoSign
    }

    pub fn get_scale(&self) -> u32 {
        self.scale
    }

    // Drop trailing fractional zeros so equal values share one representation.
    fn normalized(mut self) -> Amount {
        let ten = BigInt::from(10);
        let zero = BigInt::from(0);
        if self.mantissa == zero {
            self.scale = 0;
            return self;
        }
        while self.scale > 0 && (&self.mantissa % &ten) == zero {
            self.mantissa = &self.mantissa / &ten;
            self.scale -= 1;
        }
        self
    }

    fn rescaled(&self, scale: u32) -> BigInt {
        debug_assert!(scale >= self.scale);
        &self.mantissa * BigInt::from(10).pow(scale - self.scale)
    }
}

impl Default for Amount {
    fn default() -> Self {
        Amount::zero()
    }
}

impl FromStr for Amount {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Amount> {
        let invalid = || BlockchainError::Transaction(format!("Invalid decimal amount: '{s}'"));
        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (unsigned, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let digits = format!("{int_part}{frac_part}");
        let mut mantissa = BigInt::parse_bytes(digits.as_bytes(), 10).ok_or_else(invalid)?;
        if negative {
            mantissa = -mantissa;
        }
        let scale = u32::try_from(frac_part.len()).map_err(|_| invalid())?;
        Ok(Amount { mantissa, scale }.normalized())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let normalized = self.clone().normalized();
        let sign = if normalized.is_negative() { "-" } else { "" };
        let digits = normalized.mantissa.magnitude().to_string();
        let scale = normalized.scale as usize;
        if scale == 0 {
            return write!(f, "{sign}{digits}");
        }
        let padded = format!("{digits:0>width$}", width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{sign}{int_part}.{frac_part}")
    }
}

impl PartialEq for Amount {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Amount {}

impl PartialOrd for Amount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Amount {
    fn cmp(&self, other: &Self) -> Ordering {
        let scale = self.scale.max(other.scale);
        self.rescaled(scale).cmp(&other.rescaled(scale))
    }
}

impl<'a> Add<&'a Amount> for &'a Amount {
    type Output = Amount;

    fn add(self, rhs: &'a Amount) -> Amount {
        let scale = self.scale.max(rhs.scale);
        Amount {
            mantissa: self.rescaled(scale) + rhs.rescaled(scale),
            scale,
        }
        .normalized()
    }
}

impl<'a> Sub<&'a Amount> for &'a Amount {
    type Output = Amount;

    fn sub(self, rhs: &'a Amount) -> Amount {
        let scale = self.scale.max(rhs.scale);
        Amount {
            mantissa: self.rescaled(scale) - rhs.rescaled(scale),
            scale,
        }
        .normalized()
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        &self + &rhs
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        &self - &rhs
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Amount, E> {
        Amount::from_str(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Amount, E> {
        Ok(Amount {
            mantissa: BigInt::from(v),
            scale: 0,
        })
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Amount, E> {
        Ok(Amount::from_integer(v))
    }

    // JSON numbers with a fraction arrive as f64; their shortest decimal
    // rendering is what the sender wrote.
    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Amount, E> {
        if !v.is_finite() {
            return Err(E::custom("amount must be finite"));
        }
        Amount::from_str(&v.to_string()).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Amount, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}
