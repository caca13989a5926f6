//! Errors of every stage of synchronization.
use std::fmt::Display;

use fraction::Fraction;
use thiserror::Error;

use crate::playback::PlaybackState;
use crate::primitives::{EventId, Rgb};

/// Score input can not be turned into an event model.
///
/// Every variant names the part and measure (or element) it comes from.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    #[error("Score has no parts")]
    EmptyScore,
    #[error(
        "Malformed time signature {numerator}/{denominator} \
        in part `{part}`, measure {measure}"
    )]
    MalformedTimeSignature {
        part: String,
        measure: u32,
        numerator: u32,
        denominator: u32,
    },
    #[error("No time signature in effect in part `{part}`, measure {measure}")]
    MissingTimeSignature { part: String, measure: u32 },
    #[error(
        "Tempo is not defined in part `{part}`, measure {measure} \
        (position {position} whole notes)"
    )]
    TempoGap {
        part: String,
        measure: u32,
        position: Fraction,
    },
    #[error("Invalid tempo in part `{part}`, measure {measure}: {message}")]
    InvalidTempo {
        part: String,
        measure: u32,
        position: Fraction,
        message: String,
    },
    #[error(
        "Voice {staff}/{voice} of part `{part}` overflows measure {measure} \
        by {excess} whole notes"
    )]
    MeasureOverflow {
        part: String,
        measure: u32,
        staff: u8,
        voice: u8,
        excess: Fraction,
    },
    #[error(
        "Voice {staff}/{voice} appears twice in part `{part}`, \
        measure {measure}"
    )]
    DuplicateVoice {
        part: String,
        measure: u32,
        staff: u8,
        voice: u8,
    },
    #[error("Element `{source_id}` has zero length, in part `{part}`, measure {measure}")]
    ZeroLength {
        part: String,
        measure: u32,
        source_id: String,
    },
    #[error(
        "{kind} `{source_id}` opened in part `{part}`, measure {measure} \
        is never closed"
    )]
    UnterminatedSpanner {
        kind: &'static str,
        source_id: String,
        part: String,
        measure: u32,
    },
    #[error(
        "{kind} stop at `{source_id}` without start, \
        in part `{part}`, measure {measure}"
    )]
    UnmatchedSpannerStop {
        kind: &'static str,
        source_id: String,
        part: String,
        measure: u32,
    },
    #[error(
        "{kind} `{source_id}` has {members} member(s), at least 2 required"
    )]
    ShortComposite {
        kind: &'static str,
        source_id: String,
        members: usize,
    },
}
pub type BuildResult<T> = Result<T, BuildError>;

/// Not enough distinct markers for the events to tag.
#[derive(Debug, Error, Clone, PartialEq)]
#[error(
    "Marker palette exhausted at event {event} (`{source_id}`): \
    {requested} markers requested, capacity is {capacity}"
)]
pub struct TaggingCapacityError {
    pub event: EventId,
    pub source_id: String,
    pub requested: usize,
    pub capacity: u32,
}

/// Non-fatal problems of linking geometry to events.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionWarning {
    /// Event was tagged, but no geometry carries its marker.
    MarkerWithoutGeometry { event: EventId, source_id: String },
    /// Geometry carries a marker, which was not issued in its pass.
    UnknownMarker { object: usize, color: Rgb },
    /// Composite event, where only some members have geometry.
    PartialComposite {
        event: EventId,
        missing: Vec<EventId>,
    },
    /// Scene of a later pass differs from the first one.
    PassGeometryMismatch {
        pass: usize,
        expected: usize,
        found: usize,
    },
}
impl Display for ResolutionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MarkerWithoutGeometry { event, source_id } => write!(
                f,
                "No geometry found for event {} (`{}`)",
                event, source_id
            ),
            Self::UnknownMarker { object, color } => write!(
                f,
                "Object {} carries unknown marker {}",
                object, color
            ),
            Self::PartialComposite { event, missing } => write!(
                f,
                "Composite event {} misses geometry of members {:?}",
                event, missing
            ),
            Self::PassGeometryMismatch {
                pass,
                expected,
                found,
            } => write!(
                f,
                "Pass {} rendered {} objects, {} expected",
                pass, found, expected
            ),
        }
    }
}

/// Playback operation is not allowed in the current state.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Can not {operation} while playback is {state:?}")]
pub struct PlaybackStateError {
    pub operation: &'static str,
    pub state: PlaybackState,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Engraver failed: {0}")]
    Engraver(String),
    #[error("Malformed SVG: {0}")]
    Svg(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
pub type RenderResult<T> = Result<T, RenderError>;

/// Any error, which stops preparing a score for playback.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Capacity(#[from] TaggingCapacityError),
    #[error(transparent)]
    Render(#[from] RenderError),
}
pub type SyncResult<T> = Result<T, SyncError>;
