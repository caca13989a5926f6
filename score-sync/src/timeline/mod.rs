//! Global timeline: visual state of every binding as a pure function of
//! playback time.
//!
//! Compiled once from the event model and the resolved bindings, then
//! read-only. All parts are merged into one sorted list of transition
//! instants, which splits playback time into segments. Inside a segment
//! only the bindings listed as continuous change their state, so
//! incremental frames evaluate just those.
use std::collections::{HashMap, HashSet};

use crate::config::{HairpinMode, PartialCompositePolicy, SyncConfig, TiePolicy};
use crate::model::EventModel;
use crate::primitives::{EventId, EventKind, Marking, TimedEvent};
use crate::scene::{ObjectHandle, VisualState};
use crate::sync::{BoundObject, Bindings};

mod levels;
mod shape;

pub use levels::DynamicLevels;
pub use shape::{RampChannel, Span, StateShape};

/// Transition instants closer than this are merged.
static EPSILON: f64 = 1e-9;

/// Binding of one event with its precomputed state function.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledBinding {
    pub event: EventId,
    pub kind: EventKind,
    pub part: usize,
    pub start: f64,
    /// Ordered left to right.
    pub objects: Vec<BoundObject>,
    pub shape: StateShape,
    pub active: VisualState,
    pub inactive: VisualState,
}
impl CompiledBinding {
    pub fn state_at(&self, t: f64) -> VisualState {
        self.shape.evaluate(t, &self.active, &self.inactive)
    }

    /// State of every object. Beam segments split the reveal between them.
    pub fn object_states(&self, t: f64) -> Vec<(ObjectHandle, VisualState)> {
        let state = self.state_at(t);
        match (&self.shape, self.objects.len()) {
            (StateShape::Reveal(_), n) if n > 1 && state != self.inactive => {
                let total = state.reveal * n as f64;
                self.objects
                    .iter()
                    .enumerate()
                    .map(|(j, object)| {
                        let reveal = (total - j as f64).clamp(0.0, 1.0);
                        (object.handle, state.with_reveal(reveal))
                    })
                    .collect()
            }
            _ => self.objects.iter().map(|o| (o.handle, state)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    /// Sorted by part, start and event.
    bindings: Vec<CompiledBinding>,
    transitions: Vec<f64>,
    /// Per segment: indexes of bindings, changing continuously inside.
    continuous: Vec<Vec<usize>>,
    end: f64,
}
impl Timeline {
    pub fn compile(model: &EventModel, bindings: &Bindings, config: &SyncConfig) -> Self {
        let compiler = Compiler::new(model, bindings, config);
        let mut compiled: Vec<CompiledBinding> = bindings
            .iter()
            .filter_map(|binding| {
                let event = model.get(binding.event)?;
                Some(compiler.compile(event, binding.objects.clone()))
            })
            .collect();
        compiled.sort_by(|a, b| {
            a.part
                .cmp(&b.part)
                .then(a.start.total_cmp(&b.start))
                .then(a.event.cmp(&b.event))
        });

        let mut transitions: Vec<f64> = compiled
            .iter()
            .flat_map(|b| b.shape.transitions())
            .filter(|t| t.is_finite())
            .collect();
        transitions.sort_by(f64::total_cmp);
        transitions.dedup_by(|later, kept| (*later - *kept).abs() < EPSILON);

        let mut continuous = vec![Vec::new(); transitions.len() + 1];
        for (idx, binding) in compiled.iter().enumerate() {
            if let Some(span) = binding.shape.continuous_span() {
                let first = segment_of(&transitions, span.start);
                let last = segment_of(&transitions, span.end);
                for segment in continuous[first..last].iter_mut() {
                    segment.push(idx);
                }
            }
        }
        let end = transitions
            .last()
            .copied()
            .unwrap_or(0.0)
            .max(model.total_seconds());
        log::info!(
            "compiled timeline: {} bindings, {} transitions, ends at {:.3}s",
            compiled.len(),
            transitions.len(),
            end
        );
        Self {
            bindings: compiled,
            transitions,
            continuous,
            end,
        }
    }

    pub fn bindings(&self) -> &[CompiledBinding] {
        &self.bindings
    }
    pub fn binding(&self, event: EventId) -> Option<&CompiledBinding> {
        self.bindings.iter().find(|b| b.event == event)
    }
    pub fn len(&self) -> usize {
        self.bindings.len()
    }
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
    /// Sorted instants, where any binding may change its state abruptly.
    pub fn transitions(&self) -> &[f64] {
        &self.transitions
    }
    /// Segment `k` lies between transitions `k-1` and `k`.
    pub fn segment_index(&self, t: f64) -> usize {
        segment_of(&self.transitions, t)
    }
    /// Bindings changing continuously inside the segment.
    pub fn continuous_in(&self, segment: usize) -> &[usize] {
        self.continuous
            .get(segment)
            .map(|s| s.as_slice())
            .unwrap_or_default()
    }
    /// Last transition, or the score end if later.
    pub fn end_time(&self) -> f64 {
        self.end
    }

    /// State of every bound object at `t`, in write order.
    ///
    /// Pure: may be called for any `t`, in any order.
    pub fn states_at(&self, t: f64) -> Vec<(ObjectHandle, VisualState)> {
        self.bindings
            .iter()
            .flat_map(|b| b.object_states(t))
            .collect()
    }
}

fn segment_of(transitions: &[f64], t: f64) -> usize {
    transitions.partition_point(|x| *x <= t)
}

struct Compiler<'a> {
    model: &'a EventModel,
    bindings: &'a Bindings,
    config: &'a SyncConfig,
    levels: Option<DynamicLevels>,
    tie_spans: HashMap<EventId, Span>,
}
impl<'a> Compiler<'a> {
    fn new(model: &'a EventModel, bindings: &'a Bindings, config: &'a SyncConfig) -> Self {
        let levels = match config.dynamic_opacity {
            true => Some(DynamicLevels::new(model)),
            false => None,
        };
        let tie_spans = match config.tie_policy {
            TiePolicy::Continuous => tie_chains(model),
            TiePolicy::Separate => HashMap::new(),
        };
        Self {
            model,
            bindings,
            config,
            levels,
            tie_spans,
        }
    }

    fn compile(&self, event: &TimedEvent, objects: Vec<BoundObject>) -> CompiledBinding {
        let mut active = VisualState::new(
            self.config.part_color(event.voice.part),
            self.config.active_opacity,
        );
        if let Some(levels) = &self.levels {
            if event.kind.is_sounding() {
                active.opacity = levels.event_level(event);
            }
        }
        CompiledBinding {
            event: event.id,
            kind: event.kind,
            part: event.voice.part,
            start: event.start_seconds(),
            objects,
            shape: self.shape(event),
            active,
            inactive: VisualState::new(
                self.config.inactive_color,
                self.config.inactive_opacity,
            ),
        }
    }

    fn shape(&self, event: &TimedEvent) -> StateShape {
        match event.kind {
            EventKind::Note | EventKind::Chord => StateShape::Step(
                self.tie_spans
                    .get(&event.id)
                    .copied()
                    .unwrap_or_else(|| span_of(event)),
            ),
            EventKind::Rest => match self.config.show_rests {
                true => StateShape::Step(span_of(event)),
                false => StateShape::Inactive,
            },
            EventKind::BeamGroup => match self.matched_members(event) {
                Some(members) => StateShape::Reveal(members.into_iter().map(span_of).collect()),
                None => StateShape::Inactive,
            },
            EventKind::Slur | EventKind::Tie => match self.matched_members(event) {
                Some(members) => StateShape::Hold(cover(&members)),
                None => StateShape::Inactive,
            },
            EventKind::Hairpin => match self.matched_members(event) {
                Some(members) => self.hairpin(event, cover(&members)),
                None => StateShape::Inactive,
            },
            EventKind::Dynamic | EventKind::Articulation => {
                let start = event.start_seconds();
                StateShape::Pulse(Span::new(start, start + self.config.pulse_seconds))
            }
        }
    }

    fn hairpin(&self, event: &TimedEvent, span: Span) -> StateShape {
        let direction = match &event.marking {
            Marking::Hairpin(form) => form.direction(),
            _ => 1.0,
        };
        let (from, to) = match (&self.levels, self.config.hairpin_mode) {
            (Some(levels), HairpinMode::Opacity) => {
                levels.hairpin(event.id).unwrap_or(self.config.hairpin_opacity)
            }
            (_, HairpinMode::Opacity) => ordered(self.config.hairpin_opacity, direction),
            (_, HairpinMode::Color) => ordered((0.0, 1.0), direction),
        };
        StateShape::Ramp {
            span,
            from,
            to,
            channel: match self.config.hairpin_mode {
                HairpinMode::Opacity => RampChannel::Opacity,
                HairpinMode::Color => RampChannel::Color,
            },
        }
    }

    /// Members to animate, `None` when the composite stays inactive.
    fn matched_members(&self, event: &TimedEvent) -> Option<Vec<&'a TimedEvent>> {
        let members = self.model.members(event.id);
        let matched: Vec<&TimedEvent> = members
            .iter()
            .copied()
            .filter(|m| self.bindings.get(m.id).is_some())
            .collect();
        // Composites without any bound member keep their own span.
        if matched.is_empty() {
            return match members.is_empty() {
                true => None,
                false => Some(members),
            };
        }
        match self.config.partial_composites {
            PartialCompositePolicy::Suppress if matched.len() < members.len() => None,
            _ => Some(matched),
        }
    }
}

fn span_of(event: &TimedEvent) -> Span {
    Span::new(event.start_seconds(), event.end_seconds())
}

fn cover(events: &[&TimedEvent]) -> Span {
    events
        .iter()
        .map(|ev| span_of(ev))
        .reduce(|a, b| a.union(&b))
        .unwrap_or(Span::new(0.0, 0.0))
}

fn ordered((low, high): (f64, f64), direction: f64) -> (f64, f64) {
    match direction < 0.0 {
        true => (high, low),
        false => (low, high),
    }
}

/// Span of the whole tie chain for every tied note.
fn tie_chains(model: &EventModel) -> HashMap<EventId, Span> {
    let mut next: HashMap<EventId, EventId> = HashMap::new();
    let mut continued: HashSet<EventId> = HashSet::new();
    for tie in model.iter_kind(EventKind::Tie) {
        for pair in tie.members.windows(2) {
            next.insert(pair[0], pair[1]);
            continued.insert(pair[1]);
        }
    }
    let mut spans = HashMap::new();
    for head in next.keys().filter(|id| !continued.contains(*id)) {
        let mut chain = vec![*head];
        let mut visited = HashSet::from([*head]);
        while let Some(following) = chain.last().and_then(|last| next.get(last)) {
            if !visited.insert(*following) {
                break;
            }
            chain.push(*following);
        }
        let events: Vec<&TimedEvent> = chain.iter().filter_map(|id| model.get(*id)).collect();
        let span = cover(&events);
        for id in chain {
            spans.insert(id, span);
        }
    }
    spans
}

#[cfg(test)]
mod tests {
    use fraction::Fraction;

    use super::{StateShape, Timeline};
    use crate::config::{PartialCompositePolicy, SyncConfig, TiePolicy};
    use crate::model::EventModel;
    use crate::notation::HairpinForm;
    use crate::primitives::{
        AbsolutePosition, EventId, EventKind, Marking, RelativePosition, Rgb,
        TimedEvent, VoiceKey,
    };
    use crate::scene::{ObjectHandle, VisualState};
    use crate::sync::{BoundObject, Bindings};

    fn event(id: u32, kind: EventKind, start: u64, duration: u64) -> TimedEvent {
        let mut ev = TimedEvent::new(
            EventId::new(id),
            kind,
            VoiceKey::new(0, 1, 1),
            format!("e{id}"),
            RelativePosition::new(1, Fraction::new(0u64, 1u64)),
            AbsolutePosition::zero(),
        );
        ev.start = Fraction::new(start, 1u64);
        ev.duration = Fraction::new(duration, 1u64);
        ev
    }

    fn composite(id: u32, kind: EventKind, members: &[u32]) -> TimedEvent {
        let mut ev = event(id, kind, members[0] as u64, members.len() as u64);
        ev.members = members.iter().map(|m| EventId::new(*m)).collect();
        ev
    }

    fn model(events: Vec<TimedEvent>) -> EventModel {
        let total = events
            .iter()
            .map(|ev| ev.end())
            .fold(Fraction::new(0u64, 1u64), |a, b| if b > a { b } else { a });
        EventModel::from_parts(
            events,
            Default::default(),
            vec!["P1".to_string()],
            Vec::new(),
            total,
        )
    }

    /// Binds handles `first..first+count` to the event.
    fn bind(bindings: &mut Bindings, event: u32, first: usize, count: usize) {
        for idx in first..first + count {
            bindings.insert(
                EventId::new(event),
                BoundObject {
                    handle: ObjectHandle::new(idx),
                    sub_element: None,
                    anchor_x: idx as f64,
                },
            );
        }
    }

    fn notes(count: u32) -> Vec<TimedEvent> {
        (0..count)
            .map(|i| event(i, EventKind::Note, i as u64, 1))
            .collect()
    }

    fn active(config: &SyncConfig) -> Rgb {
        config.part_color(0)
    }

    #[test]
    fn notes_and_hidden_rest() {
        let events = vec![
            event(0, EventKind::Note, 0, 1),
            event(1, EventKind::Rest, 1, 1),
            event(2, EventKind::Note, 2, 1),
        ];
        let model = model(events);
        let mut bindings = Bindings::default();
        for id in 0..3 {
            bind(&mut bindings, id, id as usize, 1);
        }
        let config = SyncConfig {
            show_rests: false,
            ..Default::default()
        };
        let timeline = Timeline::compile(&model, &bindings, &config);
        let active_at = |t: f64| -> Vec<EventId> {
            timeline
                .bindings()
                .iter()
                .filter(|b| b.state_at(t).color == active(&config))
                .map(|b| b.event)
                .collect()
        };
        assert_eq!(active_at(0.5), vec![EventId::new(0)]);
        assert_eq!(active_at(1.5), vec![]);
        assert_eq!(active_at(2.5), vec![EventId::new(2)]);

        let note = timeline.binding(EventId::new(0)).unwrap();
        assert_eq!(note.state_at(0.5), note.state_at(0.5));
        assert_eq!(note.state_at(-1.0), note.state_at(7.0));
        assert_eq!(note.state_at(-1.0), VisualState::new(Rgb::BLACK, 1.0));
        assert_eq!(timeline.end_time(), 3.0);
        assert_eq!(timeline.transitions(), &[0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn beam_segments_reveal_in_order() {
        let mut events = notes(3);
        events.push(composite(3, EventKind::BeamGroup, &[0, 1, 2]));
        let model = model(events);
        let mut bindings = Bindings::default();
        for id in 0..3 {
            bind(&mut bindings, id, id as usize, 1);
        }
        bind(&mut bindings, 3, 3, 3);
        let timeline = Timeline::compile(&model, &bindings, &SyncConfig::default());
        let beam = timeline.binding(EventId::new(3)).unwrap();
        assert_eq!(beam.state_at(1.5).reveal, 0.5);
        let reveals: Vec<f64> = beam
            .object_states(1.5)
            .into_iter()
            .map(|(_, state)| state.reveal)
            .collect();
        assert_eq!(reveals, vec![1.0, 0.5, 0.0]);

        let beam_idx = timeline
            .bindings()
            .iter()
            .position(|b| b.event == EventId::new(3))
            .unwrap();
        for t in [0.0, 0.5, 1.5, 2.9] {
            let segment = timeline.segment_index(t);
            assert!(timeline.continuous_in(segment).contains(&beam_idx));
        }
        assert!(timeline
            .continuous_in(timeline.segment_index(3.0))
            .is_empty());
    }

    #[test]
    fn hairpin_ramps() {
        let mut events = notes(4);
        let mut cresc = composite(4, EventKind::Hairpin, &[0, 1, 2, 3]);
        cresc.set_marking(Marking::Hairpin(HairpinForm::Crescendo));
        events.push(cresc);
        let mut dim = composite(5, EventKind::Hairpin, &[0, 1, 2, 3]);
        dim.set_marking(Marking::Hairpin(HairpinForm::Diminuendo));
        events.push(dim);
        let model = model(events);
        let mut bindings = Bindings::default();
        bind(&mut bindings, 4, 0, 1);
        bind(&mut bindings, 5, 1, 1);
        let timeline = Timeline::compile(&model, &bindings, &SyncConfig::default());
        let cresc = timeline.binding(EventId::new(4)).unwrap();
        assert!((cresc.state_at(2.0).opacity - 0.6).abs() < 1e-9);
        assert!((cresc.state_at(1.0).opacity - 0.4).abs() < 1e-9);
        let dim = timeline.binding(EventId::new(5)).unwrap();
        assert!((dim.state_at(1.0).opacity - 0.8).abs() < 1e-9);
        assert_eq!(dim.state_at(4.0), dim.inactive);
    }

    #[test]
    fn continuous_ties() {
        let mut events = notes(3);
        events.push(composite(3, EventKind::Tie, &[0, 1]));
        let model = model(events);
        let mut bindings = Bindings::default();
        for id in 0..3 {
            bind(&mut bindings, id, id as usize, 1);
        }
        let config = SyncConfig {
            tie_policy: TiePolicy::Continuous,
            ..Default::default()
        };
        let timeline = Timeline::compile(&model, &bindings, &config);
        let first = timeline.binding(EventId::new(0)).unwrap();
        assert_eq!(first.state_at(1.5).color, active(&config));
        let second = timeline.binding(EventId::new(1)).unwrap();
        assert_eq!(second.state_at(0.5).color, active(&config));
        let third = timeline.binding(EventId::new(2)).unwrap();
        assert_eq!(third.state_at(0.5).color, Rgb::BLACK);

        let separate = Timeline::compile(&model, &bindings, &SyncConfig::default());
        let first = separate.binding(EventId::new(0)).unwrap();
        assert_eq!(first.state_at(1.5).color, Rgb::BLACK);
    }

    #[test]
    fn partial_composites() {
        let mut events = notes(3);
        events.push(composite(3, EventKind::Slur, &[0, 1, 2]));
        let model = model(events);
        let mut bindings = Bindings::default();
        bind(&mut bindings, 0, 0, 1);
        bind(&mut bindings, 1, 1, 1);
        bind(&mut bindings, 3, 3, 1);

        let timeline = Timeline::compile(&model, &bindings, &SyncConfig::default());
        let slur = timeline.binding(EventId::new(3)).unwrap();
        assert_eq!(slur.shape, StateShape::Hold(super::Span::new(0.0, 2.0)));

        let config = SyncConfig {
            partial_composites: PartialCompositePolicy::Suppress,
            ..Default::default()
        };
        let timeline = Timeline::compile(&model, &bindings, &config);
        let slur = timeline.binding(EventId::new(3)).unwrap();
        assert_eq!(slur.shape, StateShape::Inactive);
    }

    #[test]
    fn pulses_and_dynamic_opacity() {
        let mut events = notes(2);
        let mut mark = event(2, EventKind::Dynamic, 1, 0);
        mark.set_marking(Marking::Dynamic(crate::notation::DynamicMark::P));
        mark.anchor = Some(EventId::new(1));
        events.push(mark);
        let model = model(events);
        let mut bindings = Bindings::default();
        for id in 0..3 {
            bind(&mut bindings, id, id as usize, 1);
        }
        let config = SyncConfig {
            dynamic_opacity: true,
            pulse_seconds: 0.25,
            ..Default::default()
        };
        let timeline = Timeline::compile(&model, &bindings, &config);
        let pulse = timeline.binding(EventId::new(2)).unwrap();
        assert_eq!(pulse.state_at(1.1).color, active(&config));
        assert_eq!(pulse.state_at(1.3).color, Rgb::BLACK);
        assert_eq!(timeline.binding(EventId::new(0)).unwrap().active.opacity, 0.7);
        assert_eq!(timeline.binding(EventId::new(1)).unwrap().active.opacity, 0.5);
        assert_eq!(timeline.states_at(1.1).len(), 3);
    }
}
