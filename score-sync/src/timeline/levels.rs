//! Prevailing dynamic level of every staff.
use std::collections::HashMap;

use crate::model::EventModel;
use crate::notation::DynamicMark;
use crate::primitives::{EventId, EventKind, Marking, TimedEvent};

use super::shape::Span;

static DEFAULT_LEVEL: f64 = 0.7;
/// How far after a hairpin end its target dynamic is searched, in seconds.
static HAIRPIN_LOOKAHEAD: f64 = 2.0;
/// Target dynamic may come slightly before the hairpin end.
static HAIRPIN_EARLY_TOLERANCE: f64 = 0.2;
static HAIRPIN_FALLBACK_STEP: f64 = 0.3;
static MIN_LEVEL: f64 = 0.3;
static EPSILON: f64 = 1e-9;

type StaffKey = (usize, u8);

#[derive(Debug, Clone, PartialEq)]
struct Ramp {
    span: Span,
    from: f64,
    to: f64,
}

#[derive(Debug, Clone, Default)]
pub struct DynamicLevels {
    /// (time, level after the mark), sorted by time.
    steps: HashMap<StaffKey, Vec<(f64, f64)>>,
    ramps: HashMap<StaffKey, Vec<Ramp>>,
    hairpins: HashMap<EventId, (f64, f64)>,
    accents: HashMap<EventId, f64>,
}
impl DynamicLevels {
    pub fn new(model: &EventModel) -> Self {
        let mut levels = Self::default();
        let mut marks: HashMap<StaffKey, Vec<(f64, DynamicMark, &TimedEvent)>> =
            HashMap::new();
        for event in model.iter_kind(EventKind::Dynamic) {
            if let Marking::Dynamic(mark) = event.marking {
                marks
                    .entry(staff_of(event))
                    .or_default()
                    .push((event.start_seconds(), mark, event));
            }
        }
        for (staff, staff_marks) in marks.iter_mut() {
            staff_marks.sort_by(|a, b| a.0.total_cmp(&b.0));
            let steps = levels.steps.entry(*staff).or_default();
            let mut previous = DEFAULT_LEVEL;
            for (time, mark, event) in staff_marks.iter() {
                if mark.is_accent() {
                    if let Some(anchor) = event.anchor {
                        levels.accents.insert(anchor, mark.level());
                    }
                }
                previous = mark.settled_level(previous);
                steps.push((*time, previous));
            }
        }
        for event in model.iter_kind(EventKind::Hairpin) {
            let Marking::Hairpin(form) = event.marking else {
                continue;
            };
            let staff = staff_of(event);
            let span = Span::new(event.start_seconds(), event.end_seconds());
            let from = levels.step_level(staff, span.start);
            let target = marks
                .get(&staff)
                .and_then(|staff_marks| {
                    staff_marks.iter().find(|(time, ..)| {
                        *time > span.start + EPSILON
                            && *time >= span.end - HAIRPIN_EARLY_TOLERANCE
                            && *time <= span.end + HAIRPIN_LOOKAHEAD
                    })
                })
                .map(|(_, mark, _)| mark.level());
            let to = target.unwrap_or_else(|| {
                (from + form.direction() * HAIRPIN_FALLBACK_STEP).clamp(MIN_LEVEL, 1.0)
            });
            levels.hairpins.insert(event.id, (from, to));
            levels
                .ramps
                .entry(staff)
                .or_default()
                .push(Ramp { span, from, to });
        }
        log::debug!(
            "dynamic levels: {} staves, {} hairpins, {} accents",
            levels.steps.len(),
            levels.hairpins.len(),
            levels.accents.len()
        );
        levels
    }

    fn step_level(&self, staff: StaffKey, t: f64) -> f64 {
        let Some(steps) = self.steps.get(&staff) else {
            return DEFAULT_LEVEL;
        };
        match steps.partition_point(|(time, _)| *time <= t + EPSILON) {
            0 => DEFAULT_LEVEL,
            idx => steps[idx - 1].1,
        }
    }

    /// Level of the staff at time `t`, interpolated inside hairpins.
    pub fn level_at(&self, staff: StaffKey, t: f64) -> f64 {
        let ramp = self
            .ramps
            .get(&staff)
            .and_then(|ramps| ramps.iter().find(|r| r.span.contains(t)));
        match ramp {
            Some(ramp) => ramp.from + (ramp.to - ramp.from) * ramp.span.progress(t),
            None => self.step_level(staff, t),
        }
    }

    /// Level of a sounding event: its accent, or the level at its start.
    pub fn event_level(&self, event: &TimedEvent) -> f64 {
        match self.accents.get(&event.id) {
            Some(level) => *level,
            None => self.level_at(staff_of(event), event.start_seconds()),
        }
    }

    /// Start and end level of a hairpin.
    pub fn hairpin(&self, event: EventId) -> Option<(f64, f64)> {
        self.hairpins.get(&event).copied()
    }
}

fn staff_of(event: &TimedEvent) -> StaffKey {
    (event.voice.part, event.voice.staff)
}
