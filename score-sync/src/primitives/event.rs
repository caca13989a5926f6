//! A smallest piece of the event model: one timed event.
use std::fmt::Display;

use fraction::Fraction;

use crate::notation::{ArticulationKind, DynamicMark, HairpinForm};

use super::{fraction_to_f64, AbsolutePosition, Length, Pitch, RelativePosition};

/// Stable identifier of an event inside one event model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(u32);
impl EventId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}
impl Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ev{}", self.0)
    }
}

/// Part (0-based, in score order), staff and voice of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VoiceKey {
    pub part: usize,
    pub staff: u8,
    pub voice: u8,
}
impl VoiceKey {
    pub fn new(part: usize, staff: u8, voice: u8) -> Self {
        Self { part, staff, voice }
    }
}
impl Display for VoiceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.part, self.staff, self.voice)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Note,
    Chord,
    Rest,
    BeamGroup,
    Slur,
    Tie,
    Hairpin,
    Dynamic,
    Articulation,
}
impl EventKind {
    /// Composite events are made of member notes or chords.
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::BeamGroup | Self::Slur | Self::Tie | Self::Hairpin)
    }
    /// Dynamics and articulations, anchored to a note.
    pub fn is_attachment(&self) -> bool {
        matches!(self, Self::Dynamic | Self::Articulation)
    }
    pub fn is_sounding(&self) -> bool {
        matches!(self, Self::Note | Self::Chord)
    }
    pub fn name(&self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Chord => "chord",
            Self::Rest => "rest",
            Self::BeamGroup => "beam",
            Self::Slur => "slur",
            Self::Tie => "tie",
            Self::Hairpin => "hairpin",
            Self::Dynamic => "dynamic",
            Self::Articulation => "articulation",
        }
    }
}

/// Kind-specific details of an event.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Marking {
    #[default]
    None,
    Hairpin(HairpinForm),
    Dynamic(DynamicMark),
    Articulation(ArticulationKind),
}

/// Musical or graphical unit with start and duration in seconds.
///
/// `position` and `length` keep the musical (whole-note) time,
/// `start` and `duration` the performed one.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEvent {
    pub id: EventId,
    pub kind: EventKind,
    pub voice: VoiceKey,
    /// Identifier of the element in the score input.
    pub source_id: String,
    pub location: RelativePosition,
    pub position: AbsolutePosition,
    pub length: Length,
    pub start: Fraction,
    pub duration: Fraction,
    pub pitches: Vec<Pitch>,
    /// Identifiers of sub-elements (chord heads), in the order of `pitches`.
    pub sub_elements: Vec<String>,
    pub visible: bool,
    pub grace: bool,
    /// Ordered members of composite events.
    pub members: Vec<EventId>,
    /// Note, which carries a dynamic or articulation.
    pub anchor: Option<EventId>,
    pub marking: Marking,
}
impl TimedEvent {
    pub fn new(
        id: EventId,
        kind: EventKind,
        voice: VoiceKey,
        source_id: impl Into<String>,
        location: RelativePosition,
        position: AbsolutePosition,
    ) -> Self {
        Self {
            id,
            kind,
            voice,
            source_id: source_id.into(),
            location,
            position,
            length: Length::zero(),
            start: Fraction::new(0u64, 1u64),
            duration: Fraction::new(0u64, 1u64),
            pitches: Vec::new(),
            sub_elements: Vec::new(),
            visible: true,
            grace: false,
            members: Vec::new(),
            anchor: None,
            marking: Marking::None,
        }
    }
    pub fn set_length(&mut self, length: Length) -> &mut Self {
        self.length = length;
        self
    }
    pub fn set_visible(&mut self, visible: bool) -> &mut Self {
        self.visible = visible;
        self
    }
    pub fn set_grace(&mut self, grace: bool) -> &mut Self {
        self.grace = grace;
        self
    }
    pub fn set_marking(&mut self, marking: Marking) -> &mut Self {
        self.marking = marking;
        self
    }
    pub fn end_position(&self) -> AbsolutePosition {
        self.position + self.length
    }
    pub fn end(&self) -> Fraction {
        self.start + self.duration
    }
    pub fn start_seconds(&self) -> f64 {
        fraction_to_f64(self.start)
    }
    pub fn end_seconds(&self) -> f64 {
        fraction_to_f64(self.end())
    }
    pub fn is_composite(&self) -> bool {
        self.kind.is_composite()
    }
}
