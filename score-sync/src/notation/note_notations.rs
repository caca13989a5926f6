//! Notations, which are attached to single notes.
use std::str::FromStr;

use super::{get_token, tokens, DynamicMark, HairpinForm, NotationError};

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub enum ArticulationKind {
    Staccato,
    Staccatissimo,
    Accent,
    Tenuto,
    Marcato,
    Fermata,
    Other(String),
}
impl ToString for ArticulationKind {
    fn to_string(&self) -> String {
        match self {
            Self::Staccato => "staccato".to_string(),
            Self::Staccatissimo => "staccatissimo".to_string(),
            Self::Accent => "accent".to_string(),
            Self::Tenuto => "tenuto".to_string(),
            Self::Marcato => "marcato".to_string(),
            Self::Fermata => "fermata".to_string(),
            Self::Other(name) => name.clone(),
        }
    }
}
impl FromStr for ArticulationKind {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staccato" | "stacc" => Ok(Self::Staccato),
            "staccatissimo" => Ok(Self::Staccatissimo),
            "accent" => Ok(Self::Accent),
            "tenuto" => Ok(Self::Tenuto),
            "marcato" => Ok(Self::Marcato),
            "fermata" => Ok(Self::Fermata),
            "" => Err(NotationError::NoTokens(s.to_string())),
            x => Ok(Self::Other(x.to_string())),
        }
    }
}

/// Standalone score element, drawn near a note.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub enum AttachmentKind {
    Dynamic(DynamicMark),
    Articulation(ArticulationKind),
}
impl ToString for AttachmentKind {
    fn to_string(&self) -> String {
        match self {
            Self::Dynamic(mark) => format!("dyn:{}", mark.to_string()),
            Self::Articulation(kind) => format!("art:{}", kind.to_string()),
        }
    }
}
impl FromStr for AttachmentKind {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens = tokens(s)?;
        match tokens[0] {
            "dyn" => Ok(Self::Dynamic(get_token(&tokens, 1)?.parse()?)),
            "art" => Ok(Self::Articulation(get_token(&tokens, 1)?.parse()?)),
            x => Err(NotationError::UnexpectedToken(x.to_string())),
        }
    }
}

/// Attachment together with the identifier of its score element.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct Attachment {
    pub source_id: String,
    pub kind: AttachmentKind,
}
impl Attachment {
    pub fn new(source_id: impl Into<String>, kind: AttachmentKind) -> Self {
        Self {
            source_id: source_id.into(),
            kind,
        }
    }
    /// Parse from token form, like `dyn:mf`.
    pub fn parse(
        source_id: impl Into<String>,
        token: &str,
    ) -> Result<Self, NotationError> {
        Ok(Self::new(source_id, token.parse()?))
    }
}

/// Position of a note inside a beam group.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub enum BeamMarker {
    /// Carries identifier of the beam element.
    Begin(String),
    Continue,
    End,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum SpannerKind {
    Slur,
    Hairpin(HairpinForm),
}
impl SpannerKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Slur => "slur",
            Self::Hairpin(_) => "hairpin",
        }
    }
    /// Stop of a hairpin closes any hairpin form.
    pub fn same_family(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum SpannerEdge {
    Start,
    Stop,
}

/// Start or stop of a slur or hairpin on a note.
///
/// `number` distinguishes overlapping spanners of the same kind
/// in one voice.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct SpannerMarker {
    pub kind: SpannerKind,
    pub number: u8,
    pub edge: SpannerEdge,
    /// Identifier of the spanner element, set on start.
    pub source_id: String,
}
impl SpannerMarker {
    pub fn start(
        kind: SpannerKind,
        number: u8,
        source_id: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            number,
            edge: SpannerEdge::Start,
            source_id: source_id.into(),
        }
    }
    pub fn stop(kind: SpannerKind, number: u8) -> Self {
        Self {
            kind,
            number,
            edge: SpannerEdge::Stop,
            source_id: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::notation::{
        ArticulationKind, Attachment, AttachmentKind, DynamicMark,
        HairpinForm, NotationError, SpannerKind,
    };

    #[test]
    fn attachments() {
        assert_eq!(
            "dyn:mf".parse::<AttachmentKind>().unwrap(),
            AttachmentKind::Dynamic(DynamicMark::MF)
        );
        assert_eq!(
            Attachment::parse("a1", "art:stacc").unwrap(),
            Attachment::new(
                "a1",
                AttachmentKind::Articulation(ArticulationKind::Staccato)
            )
        );
        assert_eq!(
            "art:snap-pizzicato".parse::<AttachmentKind>().unwrap(),
            AttachmentKind::Articulation(ArticulationKind::Other(
                "snap-pizzicato".to_string()
            ))
        );
        assert_eq!(
            "dyn".parse::<AttachmentKind>(),
            Err(NotationError::NotEnoughTokens(2, 1))
        );
        assert!("pedal:down".parse::<AttachmentKind>().is_err());
        assert_eq!(
            AttachmentKind::Dynamic(DynamicMark::P).to_string(),
            "dyn:p"
        );
    }

    #[test]
    fn spanner_family() {
        let cresc = SpannerKind::Hairpin(HairpinForm::Crescendo);
        let dim = SpannerKind::Hairpin(HairpinForm::Diminuendo);
        assert!(cresc.same_family(&dim));
        assert!(!cresc.same_family(&SpannerKind::Slur));
    }
}
