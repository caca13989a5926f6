//! Marks, which are attached to notes: dynamics, hairpins, articulations,
//! beams, slurs and ties.
//!
//! Every mark has a compact token form, e.g. `dyn:mf`, `art:staccato`,
//! `hairpin:cresc`, which is parsed with [FromStr](std::str::FromStr).
use thiserror;

pub mod chord_notations;
pub mod note_notations;

pub use chord_notations::{DynamicMark, HairpinForm};
pub use note_notations::{
    ArticulationKind, Attachment, AttachmentKind, BeamMarker, SpannerEdge,
    SpannerKind, SpannerMarker,
};

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum NotationError {
    #[error("No tokens found! Original string: `{0}`")]
    NoTokens(String),
    #[error("Not enough tokens found! Expected: {0}, found: {1}")]
    NotEnoughTokens(u16, u16),
    #[error("Unexpected Token: {0}")]
    UnexpectedToken(String),
}
pub type NotationResult<T> = Result<T, NotationError>;

const TOKENS_DELIMITER: &str = ":";

/// Split notation string into tokens, e.g. `dyn:mf` → `["dyn", "mf"]`.
fn tokens(s: &str) -> NotationResult<Vec<&str>> {
    let tokens: Vec<&str> = s
        .split(TOKENS_DELIMITER)
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return Err(NotationError::NoTokens(s.to_string()));
    }
    Ok(tokens)
}

/// Try to get token from vec, and return [NotationError] at fail.
fn get_token<'a>(v: &'a [&str], idx: usize) -> NotationResult<&'a str> {
    let s = v
        .get(idx)
        .ok_or(NotationError::NotEnoughTokens(idx as u16 + 1, v.len() as u16))?;
    Ok(*s)
}

#[cfg(test)]
mod tests {
    use super::{get_token, tokens, NotationError};

    #[test]
    fn test_tokens() {
        assert_eq!(tokens("dyn:mf").unwrap(), vec!["dyn", "mf"]);
        assert_eq!(tokens(" art : staccato ").unwrap(), vec!["art", "staccato"]);
        assert_eq!(tokens(":"), Err(NotationError::NoTokens(":".to_string())));
        assert_eq!(
            get_token(&["dyn"], 1),
            Err(NotationError::NotEnoughTokens(2, 1))
        );
    }
}
