//! Positions of events.
//!
//! There are two kinds of positions: absolute and relative.
//!
//! Relative represents bar number and distance from bar start.
//! Absolute represents distance from the start of the score,
//! in whole notes.
//!
//! # Examples
//!
//! ```
//! use fraction::Fraction;
//! use score_sync::primitives::{AbsolutePosition, Length};
//!
//! let a = AbsolutePosition::from(0.0);
//! let b = AbsolutePosition::from(Fraction::new(4u64, 4u64));
//! let c = AbsolutePosition::from(Fraction::new(0u64, 4u64));
//! assert_eq!(a, c);
//! assert_ne!(a, b);
//! assert_eq!(b.get(), Fraction::from(1.0));
//! assert_eq!(a.distance_to(&b), Length::from(1.0));
//! assert_eq!(b.distance_to(&a), Length::from(1.0));
//! ```

use std::fmt::Display;
use std::ops::{Add, AddAssign};

use fraction::Fraction;

use super::{fraction_to_f64, limit_denominator, Length, LIMIT_DENOMINATOR};

/// Absolute position in whole notes.
#[derive(Debug, PartialEq, PartialOrd, Clone, Copy)]
pub struct AbsolutePosition {
    position: Fraction,
}
impl AbsolutePosition {
    pub fn new(position: Fraction) -> Self {
        Self { position }
    }
    pub fn zero() -> Self {
        Self::new(Fraction::new(0u64, 1u64))
    }
    pub fn get(&self) -> Fraction {
        self.position
    }
    pub fn as_f64(&self) -> f64 {
        fraction_to_f64(self.position)
    }
    /// Distance between positions, regardless of their order.
    pub fn distance_to(&self, other: &Self) -> Length {
        let (mut a, mut b) = (self.position, other.position);
        if a < b {
            (a, b) = (b, a);
        }
        Length::from(a - b)
    }
}
impl Add<Length> for AbsolutePosition {
    fn add(self, rhs: Length) -> Self::Output {
        Self {
            position: self.position + rhs.get(),
        }
    }

    type Output = Self;
}
impl AddAssign<Length> for AbsolutePosition {
    fn add_assign(&mut self, rhs: Length) {
        self.position = self.position + rhs.get()
    }
}
impl From<Fraction> for AbsolutePosition {
    fn from(value: Fraction) -> Self {
        Self { position: value }
    }
}
impl From<f64> for AbsolutePosition {
    fn from(value: f64) -> Self {
        let position =
            limit_denominator(Fraction::from(value), LIMIT_DENOMINATOR)
                .unwrap_or_else(|_| Fraction::from(value));
        Self { position }
    }
}
impl Display for AbsolutePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.position)
    }
}

/// Represents relative position (like in score).
///
/// Depends totally on the TimeMap of the part.
#[derive(Debug, PartialEq, PartialOrd, Clone, Copy)]
pub struct RelativePosition {
    measure_index: u32,
    /// distance from the start of the measure.
    measure_position: Fraction,
}
impl RelativePosition {
    /// # Parameters:
    /// * measure index: measure number (1-based)
    /// * measure_position: distance from start of measure.
    pub fn new(measure_index: u32, measure_position: Fraction) -> Self {
        Self {
            measure_index,
            measure_position,
        }
    }
    /// position in measure.
    pub fn get_position(&self) -> Fraction {
        self.measure_position
    }
    /// measure (1-based)
    pub fn get_measure_index(&self) -> u32 {
        self.measure_index
    }
}
impl Display for RelativePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "measure {} + {}", self.measure_index, self.measure_position)
    }
}

#[cfg(test)]
mod tests {
    use fraction::Fraction;

    use crate::primitives::{AbsolutePosition, Length, RelativePosition};

    #[test]
    fn relative_position() {
        let a = RelativePosition::new(2, Fraction::new(1u32, 4u32));
        assert_eq!(
            a,
            RelativePosition {
                measure_index: 2,
                measure_position: Fraction::new(1u64, 4u64)
            }
        );
        assert_eq!(a.to_string(), "measure 2 + 1/4");
    }

    #[test]
    fn absolute_add_length() {
        let mut a = AbsolutePosition::zero();
        a += Length::new(3, 8);
        assert_eq!(a + Length::new(1, 8), AbsolutePosition::from(0.5));
        assert_eq!(a.as_f64(), 0.375);
    }
}
