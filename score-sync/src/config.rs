//! Settings of tagging, timeline compilation and playback.
use std::collections::BTreeSet;

use derivative::Derivative;
use serde::{Deserialize, Serialize};

use crate::primitives::Rgb;

/// How hairpins show their progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HairpinMode {
    /// Opacity ramps between `hairpin-opacity` bounds.
    #[default]
    Opacity,
    /// Color ramps from inactive to part color.
    Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TiePolicy {
    /// Tied notes highlight one after another.
    #[default]
    Separate,
    /// Every note of a tie chain stays active for the whole chain.
    Continuous,
}

/// What to do with composites, where only some members got geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartialCompositePolicy {
    #[default]
    AnimateMatched,
    Suppress,
}

/// Every field falls back to its default, when missing in JSON.
///
/// # Example
///
/// ```
/// # use score_sync::config::{HairpinMode, SyncConfig};
/// let config = SyncConfig::from_json(
///     r##"{"part-colors": ["#ff0000", "#00ff00"], "hairpin-mode": "color"}"##,
/// )
/// .unwrap();
/// assert_eq!(config.part_color(3).to_string(), "#00ff00");
/// assert_eq!(config.hairpin_mode, HairpinMode::Color);
/// assert_eq!(config.pulse_seconds, 0.5);
/// ```
#[derive(Debug, Clone, PartialEq, Derivative, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct SyncConfig {
    /// Active color of every part, cycled by part index.
    #[derivative(Default(value = "vec![Rgb::new(0x58, 0xc4, 0xdd)]"))]
    pub part_colors: Vec<Rgb>,
    #[derivative(Default(value = "Rgb::BLACK"))]
    pub inactive_color: Rgb,
    #[derivative(Default(value = "1.0"))]
    pub inactive_opacity: f64,
    #[derivative(Default(value = "1.0"))]
    pub active_opacity: f64,
    #[derivative(Default(value = "true"))]
    pub show_rests: bool,
    pub hairpin_mode: HairpinMode,
    /// Quiet and loud end of hairpin ramps.
    #[derivative(Default(value = "(0.2, 1.0)"))]
    pub hairpin_opacity: (f64, f64),
    /// How long dynamics and articulations stay active.
    #[derivative(Default(value = "0.5"))]
    pub pulse_seconds: f64,
    /// Markers available in one tagging pass.
    #[derivative(Default(value = "65536"))]
    pub palette_size: u32,
    #[derivative(Default(value = "true"))]
    pub multi_pass: bool,
    /// Colors, which markers must never take, besides the inactive and
    /// part colors.
    pub reserved_colors: Vec<Rgb>,
    pub tie_policy: TiePolicy,
    pub partial_composites: PartialCompositePolicy,
    /// Scale active opacity of notes by the prevailing dynamic level.
    pub dynamic_opacity: bool,
    /// Seconds before the first event, when playback starts.
    pub lead_in: f64,
}
impl SyncConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
    pub fn part_color(&self, part: usize) -> Rgb {
        match self.part_colors.is_empty() {
            true => Rgb::new(0x58, 0xc4, 0xdd),
            false => self.part_colors[part % self.part_colors.len()],
        }
    }
    /// Colors, which can't be used as markers.
    pub fn reserved(&self) -> BTreeSet<Rgb> {
        let mut reserved: BTreeSet<Rgb> =
            self.reserved_colors.iter().copied().collect();
        reserved.insert(self.inactive_color);
        reserved.insert(Rgb::BLACK);
        reserved.insert(Rgb::WHITE);
        reserved.extend(self.part_colors.iter().copied());
        reserved
    }
}
