//! Conversion of whole-note positions into seconds.

use fraction::Fraction;
use thiserror::Error;

use super::{limit_denominator, AbsolutePosition, Length};

/// Seconds of every tempo segment are rounded to this denominator, so
/// sums over many segments stay within `u64`.
pub static SECONDS_DENOMINATOR: u64 = 8_064_000;

/// Tempo map can not convert a position into seconds.
///
/// Carries the whole-note position only: the event model builder turns
/// it into a build error, naming part and measure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TempoIssue {
    #[error("Tempo is not defined at position {}", .0.get())]
    Gap(AbsolutePosition),
    #[error("Invalid tempo at position {}: {message}", .position.get())]
    Invalid {
        position: AbsolutePosition,
        message: String,
    },
}

/// Tempo in effect from `position` on: `bpm` beats of `beat` length
/// per minute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoChange {
    pub position: AbsolutePosition,
    pub bpm: Fraction,
    pub beat: Length,
}
impl TempoChange {
    /// Quarter-note based tempo.
    pub fn new(position: AbsolutePosition, bpm: Fraction) -> Self {
        Self {
            position,
            bpm,
            beat: Length::new(1, 4),
        }
    }
    pub fn with_beat(mut self, beat: Length) -> Self {
        self.beat = beat;
        self
    }
    /// How many seconds a whole note lasts under this tempo.
    fn seconds_per_whole(&self) -> Fraction {
        Fraction::new(60u64, 1u64) / (self.bpm * self.beat.get())
    }
}

/// Piecewise-constant tempo, sorted by position.
///
/// # Example
///
/// ```
/// # use fraction::Fraction;
/// # use score_sync::primitives::{AbsolutePosition, TempoMap};
/// let tempo = TempoMap::constant(60)
///     .with_change(AbsolutePosition::from(1.0), Fraction::new(120u64, 1u64));
/// assert_eq!(
///     tempo.seconds_at(&AbsolutePosition::from(1.5)).unwrap(),
///     Fraction::new(5u64, 1u64)
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TempoMap {
    changes: Vec<TempoChange>,
}
impl TempoMap {
    pub fn new(changes: Vec<TempoChange>) -> Self {
        Self { changes }
    }
    /// One quarter-note tempo for the whole score.
    pub fn constant(bpm: u64) -> Self {
        Self::new(vec![TempoChange::new(
            AbsolutePosition::zero(),
            Fraction::new(bpm, 1u64),
        )])
    }
    pub fn with_change(
        mut self,
        position: AbsolutePosition,
        bpm: Fraction,
    ) -> Self {
        self.changes.push(TempoChange::new(position, bpm));
        self
    }
    pub fn changes(&self) -> &Vec<TempoChange> {
        &self.changes
    }

    /// Tempo has to be defined from the score start, with strictly
    /// increasing positions and positive values.
    pub fn validate(&self) -> Result<(), TempoIssue> {
        let first = self
            .changes
            .first()
            .ok_or(TempoIssue::Gap(AbsolutePosition::zero()))?;
        if first.position != AbsolutePosition::zero() {
            return Err(TempoIssue::Gap(AbsolutePosition::zero()));
        }
        let zero = Fraction::new(0u64, 1u64);
        for (idx, change) in self.changes.iter().enumerate() {
            if change.bpm <= zero || change.beat.get() <= zero {
                return Err(TempoIssue::Invalid {
                    position: change.position,
                    message: format!(
                        "tempo {} per {} is not positive",
                        change.bpm,
                        change.beat.get()
                    ),
                });
            }
            if idx > 0 && change.position <= self.changes[idx - 1].position {
                return Err(TempoIssue::Invalid {
                    position: change.position,
                    message: "tempo changes are not in increasing order"
                        .to_string(),
                });
            }
        }
        Ok(())
    }

    /// Seconds elapsed from the score start to the given position.
    ///
    /// Exact, as long as segment durations are multiples of
    /// `1/SECONDS_DENOMINATOR` seconds; rounded to it otherwise.
    pub fn seconds_at(
        &self,
        position: &AbsolutePosition,
    ) -> Result<Fraction, TempoIssue> {
        self.validate()?;
        let mut seconds = Fraction::new(0u64, 1u64);
        for (idx, change) in self.changes.iter().enumerate() {
            if change.position >= *position {
                break;
            }
            let segment_end = match self.changes.get(idx + 1) {
                Some(next) if next.position < *position => next.position,
                _ => *position,
            };
            let length = segment_end.get() - change.position.get();
            let segment =
                limit_denominator(length * change.seconds_per_whole(), SECONDS_DENOMINATOR)
                    .map_err(|message| TempoIssue::Invalid {
                        position: change.position,
                        message,
                    })?;
            seconds = seconds + segment;
        }
        Ok(seconds)
    }
}
