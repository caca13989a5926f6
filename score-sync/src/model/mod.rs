//! Timed event model of a whole score.
//!
//! Built once from the score input and read-only afterwards.
use std::collections::BTreeMap;

use fraction::Fraction;

use crate::dom::Score;
use crate::error::BuildResult;
use crate::primitives::{
    fraction_to_f64, EventId, EventKind, TimeMap, TimedEvent, VoiceKey,
};

mod builder;

pub use builder::EventModelBuilder;

#[derive(Debug, Clone)]
pub struct EventModel {
    events: Vec<TimedEvent>,
    voices: BTreeMap<VoiceKey, Vec<EventId>>,
    part_ids: Vec<String>,
    time_maps: Vec<TimeMap>,
    total_duration: Fraction,
}
impl EventModel {
    /// Build event model from the score input.
    pub fn build(score: &Score) -> BuildResult<Self> {
        EventModelBuilder::new(score).build()
    }
    pub(crate) fn from_parts(
        events: Vec<TimedEvent>,
        voices: BTreeMap<VoiceKey, Vec<EventId>>,
        part_ids: Vec<String>,
        time_maps: Vec<TimeMap>,
        total_duration: Fraction,
    ) -> Self {
        Self {
            events,
            voices,
            part_ids,
            time_maps,
            total_duration,
        }
    }

    pub fn get(&self, id: EventId) -> Option<&TimedEvent> {
        self.events.get(id.index())
    }
    /// All events, indexed by their id.
    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }
    pub fn len(&self) -> usize {
        self.events.len()
    }
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
    pub fn iter_kind(
        &self,
        kind: EventKind,
    ) -> impl Iterator<Item = &TimedEvent> + '_ {
        self.events.iter().filter(move |ev| ev.kind == kind)
    }
    /// Events sorted by start time, then by id.
    pub fn in_time_order(&self) -> Vec<&TimedEvent> {
        let mut events: Vec<&TimedEvent> = self.events.iter().collect();
        events.sort_by(|a, b| {
            a.start
                .partial_cmp(&b.start)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        events
    }
    /// Notes, chords and rests of one voice, in order of position.
    pub fn voice(&self, key: &VoiceKey) -> Option<&Vec<EventId>> {
        self.voices.get(key)
    }
    pub fn voice_keys(&self) -> impl Iterator<Item = &VoiceKey> + '_ {
        self.voices.keys()
    }
    pub fn members(&self, id: EventId) -> Vec<&TimedEvent> {
        self.get(id)
            .map(|ev| ev.members.iter().filter_map(|m| self.get(*m)).collect())
            .unwrap_or_default()
    }
    pub fn part_count(&self) -> usize {
        self.part_ids.len()
    }
    pub fn part_id(&self, part: usize) -> Option<&str> {
        self.part_ids.get(part).map(|s| s.as_str())
    }
    pub fn time_map(&self, part: usize) -> Option<&TimeMap> {
        self.time_maps.get(part)
    }
    /// Seconds from the score start to the end of the longest part.
    pub fn total_duration(&self) -> Fraction {
        self.total_duration
    }
    pub fn total_seconds(&self) -> f64 {
        fraction_to_f64(self.total_duration)
    }
}
