//! Notations, which concern the whole chord: dynamics and hairpins.
use std::str::FromStr;

use super::NotationError;

/// Written dynamic, like `mf` or `sfz`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum DynamicMark {
    PPPP,
    PPP,
    PP,
    P,
    MP,
    MF,
    F,
    FF,
    FFF,
    FFFF,
    SF,
    SFZ,
    RF,
    RFZ,
    FP,
    SFP,
}
impl DynamicMark {
    /// Loudness level in range 0.0..=1.0.
    ///
    /// For forte-piano marks it is the attack level.
    pub fn level(&self) -> f64 {
        match self {
            Self::PPPP => 0.3,
            Self::PPP => 0.35,
            Self::PP => 0.4,
            Self::P => 0.5,
            Self::MP => 0.6,
            Self::MF => 0.7,
            Self::F => 0.8,
            Self::FF => 0.9,
            Self::FFF => 0.95,
            Self::FFFF => 1.0,
            Self::SF | Self::SFZ | Self::RF | Self::RFZ => 0.85,
            Self::FP | Self::SFP => 0.8,
        }
    }
    /// Level, which stays after the mark: accents fall back to
    /// the previous level, forte-piano settles at piano.
    pub fn settled_level(&self, previous: f64) -> f64 {
        match self {
            Self::SF | Self::SFZ | Self::RF | Self::RFZ => previous,
            Self::FP | Self::SFP => Self::P.level(),
            _ => self.level(),
        }
    }
    /// Mark is a momentary accent, not a new loudness level.
    pub fn is_accent(&self) -> bool {
        matches!(
            self,
            Self::SF | Self::SFZ | Self::RF | Self::RFZ | Self::FP | Self::SFP
        )
    }
}
impl ToString for DynamicMark {
    fn to_string(&self) -> String {
        match self {
            Self::PPPP => "pppp",
            Self::PPP => "ppp",
            Self::PP => "pp",
            Self::P => "p",
            Self::MP => "mp",
            Self::MF => "mf",
            Self::F => "f",
            Self::FF => "ff",
            Self::FFF => "fff",
            Self::FFFF => "ffff",
            Self::SF => "sf",
            Self::SFZ => "sfz",
            Self::RF => "rf",
            Self::RFZ => "rfz",
            Self::FP => "fp",
            Self::SFP => "sfp",
        }
        .to_string()
    }
}
impl FromStr for DynamicMark {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('\\') {
            "pppp" => Ok(Self::PPPP),
            "ppp" => Ok(Self::PPP),
            "pp" => Ok(Self::PP),
            "p" => Ok(Self::P),
            "mp" => Ok(Self::MP),
            "mf" => Ok(Self::MF),
            "f" => Ok(Self::F),
            "ff" => Ok(Self::FF),
            "fff" => Ok(Self::FFF),
            "ffff" => Ok(Self::FFFF),
            "sf" => Ok(Self::SF),
            "sfz" => Ok(Self::SFZ),
            "rf" => Ok(Self::RF),
            "rfz" => Ok(Self::RFZ),
            "fp" => Ok(Self::FP),
            "sfp" => Ok(Self::SFP),
            x => Err(NotationError::UnexpectedToken(x.to_string())),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum HairpinForm {
    Crescendo,
    Diminuendo,
}
impl HairpinForm {
    /// Direction of level change: `1.0` or `-1.0`.
    pub fn direction(&self) -> f64 {
        match self {
            Self::Crescendo => 1.0,
            Self::Diminuendo => -1.0,
        }
    }
}
impl ToString for HairpinForm {
    fn to_string(&self) -> String {
        match self {
            Self::Crescendo => "cresc".to_string(),
            Self::Diminuendo => "dim".to_string(),
        }
    }
}
impl FromStr for HairpinForm {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cresc" | "crescendo" | "<" => Ok(Self::Crescendo),
            "dim" | "diminuendo" | "decresc" | "decrescendo" | ">" => {
                Ok(Self::Diminuendo)
            }
            x => Err(NotationError::UnexpectedToken(x.to_string())),
        }
    }
}
