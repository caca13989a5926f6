//! How the state of a binding evolves in time.
use crate::scene::VisualState;

/// Half-open time interval in seconds: `start <= t < end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub start: f64,
    pub end: f64,
}
impl Span {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }
    /// Passed fraction of the span, clamped to 0.0..=1.0.
    pub fn progress(&self, t: f64) -> f64 {
        if self.end <= self.start {
            return match t >= self.start {
                true => 1.0,
                false => 0.0,
            };
        }
        ((t - self.start) / (self.end - self.start)).clamp(0.0, 1.0)
    }
    /// Smallest span, covering both.
    pub fn union(&self, other: &Self) -> Self {
        Self::new(self.start.min(other.start), self.end.max(other.end))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampChannel {
    Opacity,
    Color,
}

/// Closed set of state behaviors, one per kind of event.
#[derive(Debug, Clone, PartialEq)]
pub enum StateShape {
    /// Active inside the span: notes, chords, rests.
    Step(Span),
    /// Progressive reveal over member segments: beams.
    Reveal(Vec<Span>),
    /// Active from the first to the last member: slurs, ties.
    Hold(Span),
    /// Level interpolated from `from` to `to`: hairpins.
    Ramp {
        span: Span,
        from: f64,
        to: f64,
        channel: RampChannel,
    },
    /// Short activation at the start: dynamics, articulations.
    Pulse(Span),
    Inactive,
}
impl StateShape {
    pub fn evaluate(
        &self,
        t: f64,
        active: &VisualState,
        inactive: &VisualState,
    ) -> VisualState {
        match self {
            Self::Step(span) | Self::Hold(span) | Self::Pulse(span) => {
                match span.contains(t) {
                    true => *active,
                    false => *inactive,
                }
            }
            Self::Reveal(segments) => {
                let (Some(first), Some(last)) = (segments.first(), segments.last())
                else {
                    return *inactive;
                };
                if t < first.start || t >= last.end {
                    return *inactive;
                }
                let reveal = segments.iter().map(|s| s.progress(t)).sum::<f64>()
                    / segments.len() as f64;
                active.with_reveal(reveal)
            }
            Self::Ramp {
                span,
                from,
                to,
                channel,
            } => {
                if !span.contains(t) {
                    return *inactive;
                }
                let level = from + (to - from) * span.progress(t);
                match channel {
                    RampChannel::Opacity => VisualState {
                        opacity: level,
                        ..*active
                    },
                    RampChannel::Color => VisualState {
                        color: inactive.color.lerp(&active.color, level),
                        ..*active
                    },
                }
            }
            Self::Inactive => *inactive,
        }
    }

    /// Instants, where the state may jump.
    pub fn transitions(&self) -> Vec<f64> {
        match self {
            Self::Step(span) | Self::Hold(span) | Self::Pulse(span) => {
                vec![span.start, span.end]
            }
            Self::Ramp { span, .. } => vec![span.start, span.end],
            Self::Reveal(segments) => segments
                .iter()
                .flat_map(|s| [s.start, s.end])
                .collect(),
            Self::Inactive => Vec::new(),
        }
    }

    /// Interval, where the state changes continuously.
    pub fn continuous_span(&self) -> Option<Span> {
        match self {
            Self::Reveal(segments) => Some(Span::new(
                segments.first()?.start,
                segments.last()?.end,
            )),
            Self::Ramp { span, .. } => Some(*span),
            _ => None,
        }
    }
}
