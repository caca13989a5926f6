//! Walks the score input part by part and emits timed events.
use std::collections::{BTreeMap, HashMap, HashSet};

use fraction::Fraction;
use itertools::Itertools;

use crate::dom::{Element, NoteElement, Part, Score};
use crate::error::{BuildError, BuildResult};
use crate::notation::{AttachmentKind, BeamMarker, SpannerEdge, SpannerKind};
use crate::primitives::{
    AbsolutePosition, EventId, EventKind, Length, Marking, MeasureInfo, Pitch,
    RelativePosition, TempoIssue, TimeMap, TimedEvent, VoiceKey,
};

use super::EventModel;

/// Grace notes take this length from the time before their principal note.
fn grace_length() -> Length {
    Length::new(1, 32)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SpannerKey {
    voice: VoiceKey,
    family: &'static str,
    number: u8,
}

#[derive(Debug)]
struct OpenComposite {
    kind: EventKind,
    marking: Marking,
    source_id: String,
    measure: u32,
    members: Vec<EventId>,
}
impl OpenComposite {
    fn new(
        kind: EventKind,
        marking: Marking,
        source_id: &str,
        measure: u32,
        first: EventId,
    ) -> Self {
        Self {
            kind,
            marking,
            source_id: source_id.to_string(),
            measure,
            members: vec![first],
        }
    }
    fn unterminated(self, part: &Part) -> BuildError {
        BuildError::UnterminatedSpanner {
            kind: self.kind.name(),
            source_id: self.source_id,
            part: part.id.clone(),
            measure: self.measure,
        }
    }
}

#[derive(Debug)]
struct OpenTie {
    source_id: String,
    start: EventId,
    measure: u32,
}

/// Spanners, ties and grace notes, which wait for their closing note.
#[derive(Debug, Default)]
struct PartState {
    open: Vec<(SpannerKey, OpenComposite)>,
    ties: HashMap<(VoiceKey, Pitch), OpenTie>,
    graces: HashMap<VoiceKey, Vec<NoteElement>>,
    cursors: BTreeMap<VoiceKey, (AbsolutePosition, u32)>,
}
impl PartState {
    fn find(&self, key: &SpannerKey) -> Option<usize> {
        self.open.iter().position(|(k, _)| k == key)
    }
    fn take(&mut self, key: &SpannerKey) -> Option<OpenComposite> {
        self.find(key).map(|idx| self.open.remove(idx).1)
    }
}

/// Builds [EventModel] from [Score].
///
/// Events get ids in order of creation: notes before the composites
/// and attachments, which refer to them.
pub struct EventModelBuilder<'a> {
    score: &'a Score,
    events: Vec<TimedEvent>,
    voices: BTreeMap<VoiceKey, Vec<EventId>>,
    time_maps: Vec<TimeMap>,
}
impl<'a> EventModelBuilder<'a> {
    pub fn new(score: &'a Score) -> Self {
        Self {
            score,
            events: Vec::new(),
            voices: BTreeMap::new(),
            time_maps: Vec::new(),
        }
    }

    pub fn build(mut self) -> BuildResult<EventModel> {
        let score = self.score;
        if score.parts.is_empty() {
            return Err(BuildError::EmptyScore);
        }
        for (part_idx, part) in score.parts.iter().enumerate() {
            let before = self.events.len();
            self.build_part(part_idx, part)?;
            log::debug!(
                "part `{}`: {} events",
                part.id,
                self.events.len() - before
            );
        }
        score
            .tempo_map
            .validate()
            .map_err(|issue| self.tempo_error(issue))?;
        self.finalize_composites();
        self.apply_tempo()?;

        let mut total = Fraction::new(0u64, 1u64);
        for time_map in self.time_maps.iter() {
            let end = score
                .tempo_map
                .seconds_at(&time_map.end_position())
                .map_err(|issue| self.tempo_error(issue))?;
            if end > total {
                total = end;
            }
        }
        for event in self.events.iter() {
            if event.end() > total {
                total = event.end();
            }
        }

        let events = &self.events;
        for list in self.voices.values_mut() {
            list.sort_by(|a, b| {
                events[a.index()]
                    .position
                    .partial_cmp(&events[b.index()].position)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.cmp(b))
            });
        }
        let part_ids = score.parts.iter().map(|p| p.id.clone()).collect();
        Ok(EventModel::from_parts(
            self.events,
            self.voices,
            part_ids,
            self.time_maps,
            total,
        ))
    }

    fn build_part(&mut self, part_idx: usize, part: &Part) -> BuildResult<()> {
        let time_map = time_map_of(part)?;
        let mut state = PartState::default();
        let mut measure_start = time_map.start_position();
        let mut last_measure = 0;
        for (measure, info) in part.measures.iter().zip(time_map.get().iter()) {
            let mut seen = HashSet::new();
            for voice in measure.voices.iter() {
                if !seen.insert((voice.staff, voice.voice)) {
                    return Err(BuildError::DuplicateVoice {
                        part: part.id.clone(),
                        measure: measure.index,
                        staff: voice.staff,
                        voice: voice.voice,
                    });
                }
                let key = VoiceKey::new(part_idx, voice.staff, voice.voice);
                let mut cursor = measure_start;
                for element in voice.elements.iter() {
                    let location = RelativePosition::new(
                        measure.index,
                        cursor.get() - measure_start.get(),
                    );
                    match element {
                        Element::Rest(rest) => {
                            let length = rest.length.unwrap_or(info.length);
                            if length.is_zero() {
                                return Err(zero_length(
                                    part,
                                    measure.index,
                                    &rest.source_id,
                                ));
                            }
                            let id = self.push_event(
                                EventKind::Rest,
                                key,
                                &rest.source_id,
                                location,
                                cursor,
                            );
                            self.events[id.index()]
                                .set_length(length)
                                .set_visible(rest.visible);
                            self.voices.entry(key).or_default().push(id);
                            cursor += length;
                        }
                        Element::Note(note) if note.grace => {
                            state
                                .graces
                                .entry(key)
                                .or_default()
                                .push(note.clone());
                        }
                        Element::Note(note) => {
                            if note.length.is_zero() {
                                return Err(zero_length(
                                    part,
                                    measure.index,
                                    &note.source_id,
                                ));
                            }
                            self.flush_graces(
                                &mut state,
                                part,
                                key,
                                cursor,
                                measure.index,
                                &time_map,
                            )?;
                            self.push_note(
                                &mut state,
                                part,
                                key,
                                note,
                                (location, cursor, note.length),
                                measure.index,
                            )?;
                            cursor += note.length;
                        }
                    }
                }
                let measure_end = measure_start + info.length;
                if cursor > measure_end {
                    return Err(BuildError::MeasureOverflow {
                        part: part.id.clone(),
                        measure: measure.index,
                        staff: voice.staff,
                        voice: voice.voice,
                        excess: cursor.get() - measure_end.get(),
                    });
                }
                state.cursors.insert(key, (cursor, measure.index));
            }
            measure_start += info.length;
            last_measure = measure.index;
        }

        let pending: Vec<VoiceKey> = state.graces.keys().copied().collect();
        for key in pending {
            let (cursor, measure) = state
                .cursors
                .get(&key)
                .copied()
                .unwrap_or((measure_start, last_measure));
            self.flush_graces(&mut state, part, key, cursor, measure, &time_map)?;
        }
        if !state.open.is_empty() {
            let (_, open) = state.open.remove(0);
            return Err(open.unterminated(part));
        }
        if let Some(tie) = state.ties.into_values().min_by_key(|t| t.start) {
            return Err(BuildError::UnterminatedSpanner {
                kind: EventKind::Tie.name(),
                source_id: tie.source_id,
                part: part.id.clone(),
                measure: tie.measure,
            });
        }
        self.time_maps.push(time_map);
        Ok(())
    }

    /// Place pending grace notes of the voice right before `principal`.
    ///
    /// Free time before the principal is used first. Otherwise the previous
    /// event of the voice is shortened, down to a half of its length.
    fn flush_graces(
        &mut self,
        state: &mut PartState,
        part: &Part,
        key: VoiceKey,
        principal: AbsolutePosition,
        measure: u32,
        time_map: &TimeMap,
    ) -> BuildResult<()> {
        let graces = match state.graces.remove(&key) {
            Some(graces) if !graces.is_empty() => graces,
            _ => return Ok(()),
        };
        let previous = self.voices.get(&key).and_then(|ids| ids.last()).copied();
        let floor = match previous.map(|id| &self.events[id.index()]) {
            Some(prev) if prev.end_position() < principal => prev.end_position(),
            Some(prev) => AbsolutePosition::from(
                prev.position.get() + prev.length.get() / Fraction::new(2u64, 1u64),
            ),
            None => time_map.start_position(),
        };
        let count = Fraction::new(graces.len() as u64, 1u64);
        let available = principal.get() - floor.get();
        let mut each = grace_length();
        if each.get() * count > available {
            each = Length::from(available / count);
        }
        let mut position =
            AbsolutePosition::from(principal.get() - each.get() * count);
        if let Some(prev) = previous {
            let prev = &mut self.events[prev.index()];
            if prev.end_position() > position {
                let shortened = position.get() - prev.position.get();
                log::debug!(
                    "grace notes shorten `{}` to {} whole notes",
                    prev.source_id,
                    shortened
                );
                prev.set_length(Length::from(shortened));
            }
        }
        for grace in graces.iter() {
            let location = time_map
                .pos_relative_from_absolute(&position)
                .unwrap_or_else(|| {
                    RelativePosition::new(measure, Fraction::new(0u64, 1u64))
                });
            self.push_note(
                state,
                part,
                key,
                grace,
                (location, position, each),
                location.get_measure_index(),
            )?;
            position += each;
        }
        Ok(())
    }

    fn push_note(
        &mut self,
        state: &mut PartState,
        part: &Part,
        key: VoiceKey,
        note: &NoteElement,
        (location, position, length): (RelativePosition, AbsolutePosition, Length),
        measure: u32,
    ) -> BuildResult<EventId> {
        let kind = match note.is_chord() {
            true => EventKind::Chord,
            false => EventKind::Note,
        };
        let id = self.push_event(kind, key, &note.source_id, location, position);
        let event = &mut self.events[id.index()];
        event.set_length(length).set_grace(note.grace);
        event.pitches = note.heads.iter().map(|h| h.pitch).collect();
        if note.is_chord() {
            event.sub_elements =
                note.heads.iter().map(|h| h.source_id.clone()).collect();
        }
        self.voices.entry(key).or_default().push(id);
        self.link_note(state, part, key, note, id, measure)?;

        for attachment in note.attachments.iter() {
            let (kind, marking) = match &attachment.kind {
                AttachmentKind::Dynamic(mark) => {
                    (EventKind::Dynamic, Marking::Dynamic(*mark))
                }
                AttachmentKind::Articulation(art) => {
                    (EventKind::Articulation, Marking::Articulation(art.clone()))
                }
            };
            let att = self.push_event(
                kind,
                key,
                &attachment.source_id,
                location,
                position,
            );
            let event = &mut self.events[att.index()];
            event.anchor = Some(id);
            event.set_marking(marking);
        }
        Ok(id)
    }

    /// Add note to open beams and spanners of its voice, open and close them.
    fn link_note(
        &mut self,
        state: &mut PartState,
        part: &Part,
        key: VoiceKey,
        note: &NoteElement,
        id: EventId,
        measure: u32,
    ) -> BuildResult<()> {
        for (spanner, open) in state.open.iter_mut() {
            if spanner.voice == key {
                open.members.push(id);
            }
        }
        let unmatched = |kind: &'static str| BuildError::UnmatchedSpannerStop {
            kind,
            source_id: note.source_id.clone(),
            part: part.id.clone(),
            measure,
        };

        if let Some(beam) = &note.beam {
            let beam_key = SpannerKey {
                voice: key,
                family: EventKind::BeamGroup.name(),
                number: 0,
            };
            match beam {
                BeamMarker::Begin(source_id) => {
                    if let Some(open) = state.take(&beam_key) {
                        return Err(open.unterminated(part));
                    }
                    state.open.push((
                        beam_key,
                        OpenComposite::new(
                            EventKind::BeamGroup,
                            Marking::None,
                            source_id,
                            measure,
                            id,
                        ),
                    ));
                }
                BeamMarker::Continue => {
                    if state.find(&beam_key).is_none() {
                        return Err(unmatched(EventKind::BeamGroup.name()));
                    }
                }
                BeamMarker::End => match state.take(&beam_key) {
                    Some(open) => {
                        self.close(open)?;
                    }
                    None => return Err(unmatched(EventKind::BeamGroup.name())),
                },
            }
        }

        // Stops go first, so one note may end a slur and start the next.
        for marker in note
            .spanners
            .iter()
            .sorted_by_key(|m| m.edge == SpannerEdge::Start)
        {
            let spanner_key = SpannerKey {
                voice: key,
                family: marker.kind.name(),
                number: marker.number,
            };
            match marker.edge {
                SpannerEdge::Stop => match state.take(&spanner_key) {
                    Some(open) => {
                        self.close(open)?;
                    }
                    None => return Err(unmatched(marker.kind.name())),
                },
                SpannerEdge::Start => {
                    if let Some(open) = state.take(&spanner_key) {
                        return Err(open.unterminated(part));
                    }
                    let (kind, marking) = match marker.kind {
                        SpannerKind::Slur => (EventKind::Slur, Marking::None),
                        SpannerKind::Hairpin(form) => {
                            (EventKind::Hairpin, Marking::Hairpin(form))
                        }
                    };
                    state.open.push((
                        spanner_key,
                        OpenComposite::new(
                            kind,
                            marking,
                            &marker.source_id,
                            measure,
                            id,
                        ),
                    ));
                }
            }
        }

        for head in note.heads.iter().filter(|h| h.tie_stop) {
            match state.ties.remove(&(key, head.pitch)) {
                Some(tie) => {
                    self.close(OpenComposite {
                        kind: EventKind::Tie,
                        marking: Marking::None,
                        source_id: tie.source_id,
                        measure: tie.measure,
                        members: vec![tie.start, id],
                    })?;
                }
                None => {
                    return Err(BuildError::UnmatchedSpannerStop {
                        kind: EventKind::Tie.name(),
                        source_id: head.source_id.clone(),
                        part: part.id.clone(),
                        measure,
                    })
                }
            }
        }
        for head in note.heads.iter() {
            if let Some(tie_id) = &head.tie_start {
                let tie = OpenTie {
                    source_id: tie_id.clone(),
                    start: id,
                    measure,
                };
                if let Some(old) = state.ties.insert((key, head.pitch), tie) {
                    return Err(BuildError::UnterminatedSpanner {
                        kind: EventKind::Tie.name(),
                        source_id: old.source_id,
                        part: part.id.clone(),
                        measure: old.measure,
                    });
                }
            }
        }
        Ok(())
    }

    fn close(&mut self, open: OpenComposite) -> BuildResult<EventId> {
        if open.members.len() < 2 {
            return Err(BuildError::ShortComposite {
                kind: open.kind.name(),
                source_id: open.source_id,
                members: open.members.len(),
            });
        }
        let first = &self.events[open.members[0].index()];
        let (voice, location, position) =
            (first.voice, first.location, first.position);
        let id =
            self.push_event(open.kind, voice, &open.source_id, location, position);
        let event = &mut self.events[id.index()];
        event.members = open.members;
        event.set_marking(open.marking);
        Ok(id)
    }

    fn push_event(
        &mut self,
        kind: EventKind,
        voice: VoiceKey,
        source_id: &str,
        location: RelativePosition,
        position: AbsolutePosition,
    ) -> EventId {
        let id = EventId::new(self.events.len() as u32);
        self.events.push(TimedEvent::new(
            id, kind, voice, source_id, location, position,
        ));
        id
    }

    /// Composites span from their earliest member start to latest member end.
    fn finalize_composites(&mut self) {
        let events = &self.events;
        let bounds: Vec<(usize, AbsolutePosition, AbsolutePosition)> = events
            .iter()
            .filter(|ev| ev.is_composite())
            .filter_map(|ev| {
                let mut members = ev.members.iter().map(|m| &events[m.index()]);
                let first = members.next()?;
                let (mut start, mut end) = (first.position, first.end_position());
                for member in members {
                    if member.position < start {
                        start = member.position;
                    }
                    if member.end_position() > end {
                        end = member.end_position();
                    }
                }
                Some((ev.id.index(), start, end))
            })
            .collect();
        for (idx, start, end) in bounds {
            let event = &mut self.events[idx];
            event.position = start;
            event.set_length(start.distance_to(&end));
        }
    }

    fn apply_tempo(&mut self) -> BuildResult<()> {
        let tempo = &self.score.tempo_map;
        let mut times = Vec::with_capacity(self.events.len());
        for event in self.events.iter() {
            let seconds = |position: &AbsolutePosition| {
                tempo
                    .seconds_at(position)
                    .map_err(|issue| self.tempo_error(issue))
            };
            times.push((seconds(&event.position)?, seconds(&event.end_position())?));
        }
        for (event, (start, end)) in self.events.iter_mut().zip(times) {
            event.start = start;
            event.duration = end - start;
        }
        Ok(())
    }

    /// Build error, naming part and measure of the tempo issue.
    fn tempo_error(&self, issue: TempoIssue) -> BuildError {
        let position = match &issue {
            TempoIssue::Gap(position) => *position,
            TempoIssue::Invalid { position, .. } => *position,
        };
        let located = self
            .score
            .parts
            .iter()
            .zip(self.time_maps.iter())
            .find_map(|(part, time_map)| {
                let relative = time_map.pos_relative_from_absolute(&position)?;
                Some((part.id.clone(), relative.get_measure_index()))
            });
        // Past the score end: last measure of the first part.
        let (part, measure) = located.unwrap_or_else(|| {
            (
                self.score
                    .parts
                    .first()
                    .map(|p| p.id.clone())
                    .unwrap_or_default(),
                self.time_maps
                    .first()
                    .and_then(|tm| tm.get().last())
                    .map(|m| m.index)
                    .unwrap_or_default(),
            )
        });
        match issue {
            TempoIssue::Gap(_) => BuildError::TempoGap {
                part,
                measure,
                position: position.get(),
            },
            TempoIssue::Invalid { message, .. } => BuildError::InvalidTempo {
                part,
                measure,
                position: position.get(),
                message,
            },
        }
    }
}

fn zero_length(part: &Part, measure: u32, source_id: &str) -> BuildError {
    BuildError::ZeroLength {
        part: part.id.clone(),
        measure,
        source_id: source_id.to_string(),
    }
}

/// Measures of the part with the time signature in effect for each.
fn time_map_of(part: &Part) -> BuildResult<TimeMap> {
    let mut current = None;
    let mut measures = Vec::with_capacity(part.measures.len());
    for measure in part.measures.iter() {
        if let Some(ts) = measure.time_signature {
            if !ts.is_valid() {
                return Err(BuildError::MalformedTimeSignature {
                    part: part.id.clone(),
                    measure: measure.index,
                    numerator: ts.numerator,
                    denominator: ts.denominator,
                });
            }
            current = Some(ts);
        }
        let ts = current.ok_or(BuildError::MissingTimeSignature {
            part: part.id.clone(),
            measure: measure.index,
        })?;
        let nominal = Length::from(&ts);
        let longest = measure
            .voices
            .iter()
            .map(|v| v.length())
            .fold(Length::zero(), |a, b| if b > a { b } else { a });
        let info = match measure.pickup && !longest.is_zero() && longest < nominal
        {
            true => MeasureInfo::pickup(measure.index, ts, longest),
            false => MeasureInfo::new(measure.index, ts),
        };
        measures.push(info);
    }
    Ok(TimeMap::new(measures, AbsolutePosition::zero()))
}

#[cfg(test)]
mod tests {
    use fraction::Fraction;

    use crate::dom::{Measure, NoteElement, NoteHead, Part, RestElement, Score, VoiceContent};
    use crate::error::BuildError;
    use crate::notation::{
        Attachment, AttachmentKind, BeamMarker, DynamicMark, HairpinForm,
        SpannerKind, SpannerMarker,
    };
    use crate::primitives::{
        AbsolutePosition, EventKind, Length, Marking, Pitch, TempoChange, TempoMap,
        TimeSignature, VoiceKey,
    };

    use super::EventModel;

    fn note(id: &str, midi: u8, len: u64) -> NoteElement {
        NoteElement::new(id, Pitch::from_midi(midi), Length::new(1, len))
    }

    fn score_of(measures: Vec<Measure>) -> Score {
        let mut part = Part::new("P1");
        part.measures = measures;
        Score::new(TempoMap::constant(60)).push(part)
    }

    fn four_four(index: u32, voice: VoiceContent) -> Measure {
        Measure::new(index)
            .with_time_signature(TimeSignature::new(4, 4))
            .push(voice)
    }

    #[test]
    fn notes_and_rests_in_seconds() {
        let voice = VoiceContent::new(1, 1)
            .push(note("n1", 60, 4))
            .push(RestElement::new("r1", Length::new(1, 4)))
            .push(note("n2", 62, 2));
        let model = EventModel::build(&score_of(vec![four_four(1, voice)])).unwrap();
        assert_eq!(model.len(), 3);
        let starts: Vec<f64> =
            model.events().iter().map(|e| e.start_seconds()).collect();
        assert_eq!(starts, vec![0.0, 1.0, 2.0]);
        assert_eq!(model.events()[2].end_seconds(), 4.0);
        assert_eq!(model.total_seconds(), 4.0);
        assert_eq!(
            model.voice(&VoiceKey::new(0, 1, 1)).map(|v| v.len()),
            Some(3)
        );
    }

    #[test]
    fn measure_rest_and_time_signature_carry() {
        let m1 = Measure::new(1)
            .with_time_signature(TimeSignature::new(3, 4))
            .push(VoiceContent::new(1, 1).push(RestElement::measure_rest("r1")));
        let m2 = Measure::new(2).push(VoiceContent::new(1, 1).push(note("n1", 60, 2)));
        let model = EventModel::build(&score_of(vec![m1, m2])).unwrap();
        assert_eq!(model.events()[0].length, Length::new(3, 4));
        assert_eq!(model.events()[1].start_seconds(), 3.0);
        assert_eq!(model.events()[1].location.get_measure_index(), 2);
        assert_eq!(model.total_seconds(), 6.0);
    }

    #[test]
    fn composites_and_attachments() {
        let voice = VoiceContent::new(1, 1)
            .push(
                note("n1", 60, 8)
                    .beam(BeamMarker::Begin("b1".to_string()))
                    .spanner(SpannerMarker::start(
                        SpannerKind::Hairpin(HairpinForm::Crescendo),
                        1,
                        "h1",
                    ))
                    .attach(Attachment::new(
                        "d1",
                        AttachmentKind::Dynamic(DynamicMark::P),
                    )),
            )
            .push(note("n2", 62, 8).beam(BeamMarker::Continue))
            .push(note("n3", 64, 8).beam(BeamMarker::End))
            .push(
                note("n4", 65, 8).spanner(SpannerMarker::stop(
                    SpannerKind::Hairpin(HairpinForm::Crescendo),
                    1,
                )),
            )
            .push(RestElement::new("r1", Length::new(1, 2)));
        let model = EventModel::build(&score_of(vec![four_four(1, voice)])).unwrap();
        let beam = model.iter_kind(EventKind::BeamGroup).next().unwrap();
        assert_eq!(beam.source_id, "b1");
        assert_eq!(beam.members.len(), 3);
        assert_eq!(beam.start_seconds(), 0.0);
        assert_eq!(beam.end_seconds(), 1.5);
        let hairpin = model.iter_kind(EventKind::Hairpin).next().unwrap();
        assert_eq!(hairpin.members.len(), 4);
        assert_eq!(hairpin.marking, Marking::Hairpin(HairpinForm::Crescendo));
        assert_eq!(hairpin.end_seconds(), 2.0);
        let dynamic = model.iter_kind(EventKind::Dynamic).next().unwrap();
        assert_eq!(dynamic.anchor, Some(model.events()[0].id));
        assert_eq!(dynamic.duration, Fraction::new(0u64, 1u64));
    }

    #[test]
    fn ties_and_chords() {
        let chord = NoteElement::chord(
            "c1",
            vec![
                NoteHead::new("c1-0", Pitch::from_midi(60)),
                NoteHead::new("c1-1", Pitch::from_midi(64)),
            ],
            Length::new(1, 1),
        )
        .tie_start("t");
        let chord2 = NoteElement::chord(
            "c2",
            vec![
                NoteHead::new("c2-0", Pitch::from_midi(60)),
                NoteHead::new("c2-1", Pitch::from_midi(64)),
            ],
            Length::new(1, 1),
        )
        .tie_stop();
        let model = EventModel::build(&score_of(vec![
            four_four(1, VoiceContent::new(1, 1).push(chord)),
            four_four(2, VoiceContent::new(1, 1).push(chord2)),
        ]))
        .unwrap();
        assert_eq!(model.events()[0].kind, EventKind::Chord);
        assert_eq!(model.events()[0].sub_elements, vec!["c1-0", "c1-1"]);
        let ties: Vec<_> = model.iter_kind(EventKind::Tie).collect();
        assert_eq!(ties.len(), 2);
        assert_eq!(ties[0].source_id, "t-0");
        assert_eq!(ties[1].end_seconds(), 8.0);
    }

    #[test]
    fn grace_notes_take_time_before_principal() {
        let voice = VoiceContent::new(1, 1)
            .push(note("n1", 60, 2))
            .push(note("g1", 62, 8).grace())
            .push(note("n2", 64, 2));
        let model = EventModel::build(&score_of(vec![four_four(1, voice)])).unwrap();
        let (n1, grace) = (&model.events()[0], &model.events()[1]);
        assert!(grace.grace);
        assert_eq!(grace.length, Length::new(1, 32));
        assert_eq!(grace.start_seconds(), 2.0 - 0.125);
        assert_eq!(grace.end_seconds(), 2.0);
        assert_eq!(n1.end_seconds(), grace.start_seconds());
        assert_eq!(n1.length, Length::new(15, 32));

        let at_start = VoiceContent::new(1, 1)
            .push(note("g1", 62, 8).grace())
            .push(note("n1", 64, 1));
        let model =
            EventModel::build(&score_of(vec![four_four(1, at_start)])).unwrap();
        assert_eq!(model.events()[0].length, Length::zero());
    }

    #[test]
    fn grace_notes_never_overlap_the_voice() {
        // Graces on the downbeat borrow from the last note of the bar before.
        let m1 = four_four(1, VoiceContent::new(1, 1).push(note("n1", 60, 1)));
        let m2 = four_four(
            2,
            VoiceContent::new(1, 1)
                .push(note("g1", 62, 8).grace())
                .push(note("g2", 64, 8).grace())
                .push(note("n2", 65, 1)),
        );
        let model = EventModel::build(&score_of(vec![m1, m2])).unwrap();
        let voice = model.voice(&VoiceKey::new(0, 1, 1)).unwrap();
        let mut events: Vec<_> = voice.iter().filter_map(|id| model.get(*id)).collect();
        events.sort_by(|a, b| a.start.cmp(&b.start));
        for pair in events.windows(2) {
            assert!(pair[0].end() <= pair[1].start, "{:?}", pair);
        }
        assert_eq!(events[0].end_seconds(), 4.0 - 0.25);
        assert_eq!(events[1].location.get_measure_index(), 1);

        // A short previous note keeps at least a half of its length.
        let tight = VoiceContent::new(1, 1)
            .push(note("n1", 60, 32))
            .push(note("g1", 62, 8).grace())
            .push(note("g2", 64, 8).grace())
            .push(note("n2", 65, 2));
        let model = EventModel::build(&score_of(vec![four_four(1, tight)])).unwrap();
        assert_eq!(model.events()[0].length, Length::new(1, 64));
        assert_eq!(model.events()[1].length, Length::new(1, 128));
        assert_eq!(model.events()[2].end(), model.events()[3].start);
    }

    #[test]
    fn pickup_measure() {
        let pickup = Measure::new(0)
            .with_time_signature(TimeSignature::new(3, 4))
            .pickup()
            .push(VoiceContent::new(1, 1).push(note("n0", 60, 4)));
        let m1 = Measure::new(1).push(VoiceContent::new(1, 1).push(note("n1", 60, 2)));
        let model = EventModel::build(&score_of(vec![pickup, m1])).unwrap();
        assert_eq!(model.events()[1].start_seconds(), 1.0);
    }

    #[test]
    fn structural_errors() {
        let malformed = Measure::new(1)
            .with_time_signature(TimeSignature::new(3, 6))
            .push(VoiceContent::new(1, 1).push(note("n", 60, 2)));
        assert!(matches!(
            EventModel::build(&score_of(vec![malformed])),
            Err(BuildError::MalformedTimeSignature { measure: 1, .. })
        ));

        let missing = Measure::new(1).push(VoiceContent::new(1, 1).push(note("n", 60, 2)));
        assert!(matches!(
            EventModel::build(&score_of(vec![missing])),
            Err(BuildError::MissingTimeSignature { measure: 1, .. })
        ));

        let overflow = four_four(
            7,
            VoiceContent::new(1, 1)
                .push(note("n1", 60, 1))
                .push(note("n2", 60, 8)),
        );
        match EventModel::build(&score_of(vec![overflow])) {
            Err(BuildError::MeasureOverflow { measure, excess, .. }) => {
                assert_eq!(measure, 7);
                assert_eq!(excess, Fraction::new(1u64, 8u64));
            }
            other => panic!("unexpected: {:?}", other),
        }

        let duplicate = four_four(2, VoiceContent::new(1, 1).push(note("n", 60, 1)))
            .push(VoiceContent::new(1, 1).push(note("m", 60, 1)));
        assert!(matches!(
            EventModel::build(&score_of(vec![duplicate])),
            Err(BuildError::DuplicateVoice { measure: 2, .. })
        ));

        assert!(matches!(
            EventModel::build(&Score::new(TempoMap::constant(60))),
            Err(BuildError::EmptyScore)
        ));
    }

    #[test]
    fn tempo_errors_name_measure() {
        let measures = || {
            (1..=3)
                .map(|idx| {
                    four_four(idx, VoiceContent::new(1, 1).push(note("n", 60, 1)))
                })
                .collect::<Vec<_>>()
        };
        let mut score = score_of(measures());
        score.tempo_map = TempoMap::constant(60)
            .with_change(AbsolutePosition::from(1.5), Fraction::new(80u64, 1u64))
            .with_change(AbsolutePosition::from(1.5), Fraction::new(90u64, 1u64));
        match EventModel::build(&score) {
            Err(BuildError::InvalidTempo {
                part,
                measure,
                position,
                ..
            }) => {
                assert_eq!(part, "P1");
                assert_eq!(measure, 2);
                assert_eq!(position, Fraction::new(3u64, 2u64));
            }
            other => panic!("unexpected: {:?}", other),
        }

        let mut score = score_of(measures());
        score.tempo_map = TempoMap::new(vec![TempoChange::new(
            AbsolutePosition::from(2.0),
            Fraction::new(60u64, 1u64),
        )]);
        assert!(matches!(
            EventModel::build(&score),
            Err(BuildError::TempoGap { measure: 1, .. })
        ));
    }

    #[test]
    fn accelerando_on_every_beat() {
        let voice = (0..40).fold(VoiceContent::new(1, 1), |voice, idx| {
            voice.push(note(&format!("n{idx}"), 60, 4))
        });
        let measure = Measure::new(1)
            .with_time_signature(TimeSignature::new(40, 4))
            .push(voice);
        let mut score = score_of(vec![measure]);
        score.tempo_map =
            (1..40u64).fold(TempoMap::constant(61), |tempo, beat| {
                tempo.with_change(
                    AbsolutePosition::from(Fraction::new(beat, 4u64)),
                    Fraction::new(60 + beat + 1, 1u64),
                )
            });

        let model = EventModel::build(&score).unwrap();
        let expected: f64 = (61..101).map(|bpm| 60.0 / bpm as f64).sum();
        assert!((model.total_seconds() - expected).abs() < 1e-5);
        for pair in model.events().windows(2) {
            assert_eq!(pair[0].end(), pair[1].start);
            assert!(pair[0].duration > Fraction::new(0u64, 1u64));
        }
    }

    #[test]
    fn spanner_errors() {
        let open_slur = four_four(
            1,
            VoiceContent::new(1, 1)
                .push(note("n1", 60, 2).spanner(SpannerMarker::start(
                    SpannerKind::Slur,
                    1,
                    "s1",
                )))
                .push(note("n2", 60, 2)),
        );
        match EventModel::build(&score_of(vec![open_slur])) {
            Err(BuildError::UnterminatedSpanner { kind, source_id, .. }) => {
                assert_eq!(kind, "slur");
                assert_eq!(source_id, "s1");
            }
            other => panic!("unexpected: {:?}", other),
        }

        let stray_stop = four_four(
            1,
            VoiceContent::new(1, 1)
                .push(note("n1", 60, 1).spanner(SpannerMarker::stop(SpannerKind::Slur, 1))),
        );
        assert!(matches!(
            EventModel::build(&score_of(vec![stray_stop])),
            Err(BuildError::UnmatchedSpannerStop { kind: "slur", .. })
        ));

        let one_note_slur = four_four(
            1,
            VoiceContent::new(1, 1).push(
                note("n1", 60, 1)
                    .spanner(SpannerMarker::start(SpannerKind::Slur, 1, "s1"))
                    .spanner(SpannerMarker::stop(SpannerKind::Slur, 1)),
            ),
        );
        assert!(matches!(
            EventModel::build(&score_of(vec![one_note_slur])),
            Err(BuildError::UnmatchedSpannerStop { .. })
        ));

        let stray_tie = four_four(
            1,
            VoiceContent::new(1, 1).push(note("n1", 60, 1).tie_stop()),
        );
        assert!(matches!(
            EventModel::build(&score_of(vec![stray_tie])),
            Err(BuildError::UnmatchedSpannerStop { kind: "tie", .. })
        ));
    }
}
