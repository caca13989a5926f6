use std::ops::{Add, AddAssign, Mul};

use fraction::Fraction;

use super::{fraction_to_f64, limit_denominator, TimeSignature, LIMIT_DENOMINATOR};

/// Musical length in whole notes.
#[derive(Debug, PartialEq, PartialOrd, Clone, Copy)]
pub struct Length {
    fraction: Fraction,
}
impl Length {
    pub fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            fraction: Fraction::new(numerator, denominator),
        }
    }
    pub fn zero() -> Self {
        Self::new(0, 1)
    }
    pub fn get(&self) -> Fraction {
        self.fraction
    }
    pub fn is_zero(&self) -> bool {
        self.fraction == Fraction::new(0u64, 1u64)
    }
    pub fn as_f64(&self) -> f64 {
        fraction_to_f64(self.fraction)
    }
    /// `None` if the result would be negative.
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        let frac = self.fraction - rhs.fraction;
        match frac.is_sign_negative() && frac != Fraction::new(0u64, 1u64) {
            true => None,
            false => Some(Self::from(frac)),
        }
    }
}
impl From<Fraction> for Length {
    fn from(value: Fraction) -> Self {
        Self { fraction: value }
    }
}
impl From<f64> for Length {
    fn from(value: f64) -> Self {
        let fraction = limit_denominator(Fraction::from(value), LIMIT_DENOMINATOR)
            .unwrap_or_else(|_| Fraction::from(value));
        Self { fraction }
    }
}
impl From<&TimeSignature> for Length {
    fn from(ts: &TimeSignature) -> Self {
        Self::new(ts.numerator as u64, ts.denominator as u64)
    }
}
impl Add for Length {
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            fraction: self.fraction + rhs.fraction,
        }
    }
    type Output = Self;
}
impl AddAssign for Length {
    fn add_assign(&mut self, rhs: Self) {
        self.fraction = self.fraction + rhs.fraction;
    }
}
impl Mul<u64> for Length {
    fn mul(self, rhs: u64) -> Self::Output {
        Self {
            fraction: self.fraction * Fraction::new(rhs, 1u64),
        }
    }
    type Output = Self;
}
