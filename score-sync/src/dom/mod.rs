//! Score input: parts of measures of voices of elements.
//!
//! Mirrors what a notation document contains, with every element
//! carrying the identifier the engraver knows it by.
//!
//! # Example
//!
//! ```
//! use score_sync::dom::{Element, Measure, NoteElement, Part, RestElement, Score, VoiceContent};
//! use score_sync::primitives::{Length, Pitch, TempoMap, TimeSignature};
//!
//! let voice = VoiceContent::new(1, 1)
//!     .push(NoteElement::new("n1", Pitch::from_midi(60), Length::new(1, 2)))
//!     .push(RestElement::new("r1", Length::new(1, 2)));
//! let measure = Measure::new(1)
//!     .with_time_signature(TimeSignature::new(4, 4))
//!     .push(voice);
//! let score = Score::new(TempoMap::constant(120)).push(Part::new("P1").push(measure));
//! assert_eq!(score.parts[0].measures[0].voices[0].elements.len(), 2);
//! ```

use crate::notation::{Attachment, BeamMarker, SpannerMarker};
use crate::primitives::{Length, Pitch, TempoMap, TimeSignature};

#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub title: Option<String>,
    pub parts: Vec<Part>,
    pub tempo_map: TempoMap,
}
impl Score {
    pub fn new(tempo_map: TempoMap) -> Self {
        Self {
            title: None,
            parts: Vec::new(),
            tempo_map,
        }
    }
    pub fn push(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub id: String,
    pub name: String,
    pub measures: Vec<Measure>,
}
impl Part {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            measures: Vec::new(),
        }
    }
    pub fn push(mut self, measure: Measure) -> Self {
        self.measures.push(measure);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    pub index: u32,
    /// `None` keeps the previous one in effect.
    pub time_signature: Option<TimeSignature>,
    /// Incomplete measure: its length is the length of its longest voice.
    pub pickup: bool,
    pub voices: Vec<VoiceContent>,
}
impl Measure {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            time_signature: None,
            pickup: false,
            voices: Vec::new(),
        }
    }
    pub fn with_time_signature(mut self, time_signature: TimeSignature) -> Self {
        self.time_signature = Some(time_signature);
        self
    }
    pub fn pickup(mut self) -> Self {
        self.pickup = true;
        self
    }
    pub fn push(mut self, voice: VoiceContent) -> Self {
        self.voices.push(voice);
        self
    }
}

/// Content of one voice of one staff inside a measure.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceContent {
    pub staff: u8,
    pub voice: u8,
    pub elements: Vec<Element>,
}
impl VoiceContent {
    pub fn new(staff: u8, voice: u8) -> Self {
        Self {
            staff,
            voice,
            elements: Vec::new(),
        }
    }
    pub fn push(mut self, element: impl Into<Element>) -> Self {
        self.elements.push(element.into());
        self
    }
    /// Sum of element lengths. Grace notes and measure rests count as zero.
    pub fn length(&self) -> Length {
        self.elements
            .iter()
            .filter_map(|el| el.length())
            .fold(Length::zero(), |acc, l| acc + l)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Note(NoteElement),
    Rest(RestElement),
}
impl Element {
    pub fn source_id(&self) -> &str {
        match self {
            Self::Note(note) => &note.source_id,
            Self::Rest(rest) => &rest.source_id,
        }
    }
    /// Length, which moves voice cursor.
    pub fn length(&self) -> Option<Length> {
        match self {
            Self::Note(note) if note.grace => Some(Length::zero()),
            Self::Note(note) => Some(note.length),
            Self::Rest(rest) => rest.length,
        }
    }
}
impl From<NoteElement> for Element {
    fn from(value: NoteElement) -> Self {
        Self::Note(value)
    }
}
impl From<RestElement> for Element {
    fn from(value: RestElement) -> Self {
        Self::Rest(value)
    }
}

/// One note head with its tie state.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteHead {
    pub source_id: String,
    pub pitch: Pitch,
    /// Identifier of the tie, which starts at this head.
    pub tie_start: Option<String>,
    /// Head ends a tie, started at the same pitch.
    pub tie_stop: bool,
}
impl NoteHead {
    pub fn new(source_id: impl Into<String>, pitch: Pitch) -> Self {
        Self {
            source_id: source_id.into(),
            pitch,
            tie_start: None,
            tie_stop: false,
        }
    }
}

/// Note or chord: a chord is a note element with several heads.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteElement {
    pub source_id: String,
    pub heads: Vec<NoteHead>,
    pub length: Length,
    pub grace: bool,
    pub beam: Option<BeamMarker>,
    pub spanners: Vec<SpannerMarker>,
    pub attachments: Vec<Attachment>,
}
impl NoteElement {
    /// Single note. Its only head shares the note identifier.
    pub fn new(source_id: impl Into<String>, pitch: Pitch, length: Length) -> Self {
        let source_id = source_id.into();
        Self {
            heads: vec![NoteHead::new(source_id.clone(), pitch)],
            source_id,
            length,
            grace: false,
            beam: None,
            spanners: Vec::new(),
            attachments: Vec::new(),
        }
    }
    pub fn chord(
        source_id: impl Into<String>,
        heads: Vec<NoteHead>,
        length: Length,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            heads,
            length,
            grace: false,
            beam: None,
            spanners: Vec::new(),
            attachments: Vec::new(),
        }
    }
    pub fn is_chord(&self) -> bool {
        self.heads.len() > 1
    }
    pub fn grace(mut self) -> Self {
        self.grace = true;
        self
    }
    /// Start a tie at every head.
    pub fn tie_start(mut self, tie_id: impl Into<String>) -> Self {
        let tie_id = tie_id.into();
        let single = self.heads.len() == 1;
        for (idx, head) in self.heads.iter_mut().enumerate() {
            head.tie_start = Some(match single {
                true => tie_id.clone(),
                false => format!("{}-{}", tie_id, idx),
            });
        }
        self
    }
    /// End ties at every head.
    pub fn tie_stop(mut self) -> Self {
        for head in self.heads.iter_mut() {
            head.tie_stop = true;
        }
        self
    }
    pub fn beam(mut self, marker: BeamMarker) -> Self {
        self.beam = Some(marker);
        self
    }
    pub fn spanner(mut self, marker: SpannerMarker) -> Self {
        self.spanners.push(marker);
        self
    }
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestElement {
    pub source_id: String,
    /// `None` for a measure rest, which fills the whole measure.
    pub length: Option<Length>,
    pub visible: bool,
}
impl RestElement {
    pub fn new(source_id: impl Into<String>, length: Length) -> Self {
        Self {
            source_id: source_id.into(),
            length: Some(length),
            visible: true,
        }
    }
    pub fn measure_rest(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            length: None,
            visible: true,
        }
    }
    pub fn invisible(mut self) -> Self {
        self.visible = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{Element, NoteElement, NoteHead, RestElement, VoiceContent};
    use crate::primitives::{Length, Pitch};

    #[test]
    fn voice_length() {
        let voice = VoiceContent::new(1, 1)
            .push(
                NoteElement::new("g", Pitch::from_midi(62), Length::new(1, 8))
                    .grace(),
            )
            .push(NoteElement::new("n", Pitch::from_midi(60), Length::new(1, 4)))
            .push(RestElement::new("r", Length::new(1, 8)))
            .push(RestElement::measure_rest("m"));
        assert_eq!(voice.length(), Length::new(3, 8));
        assert_eq!(voice.elements[3].source_id(), "m");
        assert_eq!(voice.elements[0].length(), Some(Length::zero()));
    }

    #[test]
    fn chord_ties() {
        let chord = NoteElement::chord(
            "c",
            vec![
                NoteHead::new("c-0", Pitch::from_midi(60)),
                NoteHead::new("c-1", Pitch::from_midi(64)),
            ],
            Length::new(1, 2),
        )
        .tie_start("t");
        assert!(chord.is_chord());
        assert_eq!(chord.heads[1].tie_start.as_deref(), Some("t-1"));
        let note = Element::from(
            NoteElement::new("n", Pitch::from_midi(60), Length::new(1, 2))
                .tie_start("t2"),
        );
        match note {
            Element::Note(n) => {
                assert_eq!(n.heads[0].tie_start.as_deref(), Some("t2"))
            }
            Element::Rest(_) => panic!("expected note"),
        }
    }
}
