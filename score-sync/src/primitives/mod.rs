//! Elements, from which the event model is constructed.
//!
//! At first, one TimeMap is created per part from its measures.
//! Then every voice is walked through the TimeMap and positioned in whole
//! notes. Then the TempoMap turns whole-note positions into seconds.

pub mod color;
pub mod event;
pub mod fraction_tools;
pub mod length;
pub mod pitch;
pub mod position;
pub mod tempo;
pub mod time_map;

pub use color::Rgb;
pub use event::{EventId, EventKind, Marking, TimedEvent, VoiceKey};
pub use fraction_tools::{fraction_from_f64, fraction_to_f64, limit_denominator};
pub use length::Length;
pub use pitch::Pitch;
pub use position::{AbsolutePosition, RelativePosition};
pub use tempo::{TempoChange, TempoIssue, TempoMap};
pub use time_map::{MeasureInfo, TimeMap, TimeMapMeasures, TimeSignature};

/// Denominator used when floats are turned into musical fractions.
///
/// Divisible by triplets, quintuplets and 1/128 notes.
pub static LIMIT_DENOMINATOR: u64 = 1920;
