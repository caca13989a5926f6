#![allow(dead_code)]
use score_sync::dom::{Measure, NoteElement, Part, Score, VoiceContent};
use score_sync::error::{RenderError, RenderResult};
use score_sync::model::EventModel;
use score_sync::primitives::{EventKind, Length, Pitch, TempoMap, TimeSignature};
use score_sync::render::{annotate_svg, AnnotationRequest, Engraver, RenderOutput, StructuralMap};
use score_sync::scene::{SvgScene, VisualState};
use score_sync::{PreparedScore, SyncConfig};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Lays out every visible event as a row of rectangles.
///
/// Beams get one rectangle per member, chords one more per head.
#[derive(Debug, Default)]
pub struct FixtureEngraver {
    pub calls: usize,
}
impl FixtureEngraver {
    pub fn layout(score: &Score) -> RenderResult<(String, StructuralMap)> {
        let model =
            EventModel::build(score).map_err(|err| RenderError::Engraver(err.to_string()))?;
        let mut svg = String::from(r#"<svg xmlns="http://www.w3.org/2000/svg"><g>"#);
        let mut structure = StructuralMap::new();
        let mut x = 0;
        let mut rect = |source: &str, primitive: String, svg: &mut String| {
            svg.push_str(&format!(
                r#"<rect id="{primitive}" x="{x}" y="0" width="8" height="8"/>"#
            ));
            structure.insert(source, primitive);
            x += 10;
        };
        for event in model.events().iter().filter(|ev| ev.visible) {
            let segments = match event.kind {
                EventKind::BeamGroup => event.members.len(),
                _ => 1,
            };
            for idx in 0..segments {
                rect(&event.source_id, format!("{}-p{}", event.source_id, idx), &mut svg);
            }
            for head in event.sub_elements.iter() {
                rect(head, format!("{}-h", head), &mut svg);
            }
        }
        svg.push_str("</g></svg>");
        Ok((svg, structure))
    }
}
impl Engraver for FixtureEngraver {
    fn engrave(
        &mut self,
        score: &Score,
        request: &AnnotationRequest,
    ) -> RenderResult<RenderOutput> {
        self.calls += 1;
        let (svg, structure) = Self::layout(score)?;
        Ok(RenderOutput {
            svg: annotate_svg(&svg, &structure, request)?,
            structure,
        })
    }
}

pub fn note(id: &str, midi: u8, denominator: u64) -> NoteElement {
    NoteElement::new(id, Pitch::from_midi(midi), Length::new(1, denominator))
}

/// One part at quarter = 60, so a quarter note lasts one second.
pub fn score_of(measures: Vec<Measure>) -> Score {
    let part = measures
        .into_iter()
        .fold(Part::new("P1"), |part, measure| part.push(measure));
    Score::new(TempoMap::constant(60)).push(part)
}

pub fn measure(index: u32, numerator: u32, voice: VoiceContent) -> Measure {
    Measure::new(index)
        .with_time_signature(TimeSignature::new(numerator, 4))
        .push(voice)
}

/// Last written states of the objects of an element.
pub fn states_of(prepared: &PreparedScore<SvgScene>, source_id: &str) -> Vec<VisualState> {
    let Some(event) = prepared
        .model()
        .events()
        .iter()
        .find(|ev| ev.source_id == source_id)
    else {
        return Vec::new();
    };
    prepared
        .bindings()
        .get(event.id)
        .map(|binding| {
            binding
                .objects
                .iter()
                .filter_map(|o| prepared.scene().object(o.handle))
                .filter_map(|object| object.state)
                .collect()
        })
        .unwrap_or_default()
}

pub fn is_active(prepared: &PreparedScore<SvgScene>, source_id: &str) -> bool {
    let color = prepared.config().part_color(0);
    let states = states_of(prepared, source_id);
    !states.is_empty() && states.iter().all(|s| s.color == color)
}

pub fn config() -> SyncConfig {
    SyncConfig::default()
}
