//! RGB colors, as written into SVG and read back from a host scene.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::notation::NotationError;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}
impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
    /// Lower 24 bits are used.
    pub fn from_u32(value: u32) -> Self {
        Self::new((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }
    pub fn to_u32(&self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }
    /// From channels in range 0.0..=1.0, as hosts usually store them.
    pub fn from_unit(r: f64, g: f64, b: f64) -> Self {
        let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(channel(r), channel(g), channel(b))
    }
    /// Linear interpolation, `amount` is clamped to 0.0..=1.0.
    pub fn lerp(&self, other: &Self, amount: f64) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        let channel = |a: u8, b: u8| {
            (a as f64 + (b as f64 - a as f64) * amount).round() as u8
        };
        Self::new(
            channel(self.r, other.r),
            channel(self.g, other.g),
            channel(self.b, other.b),
        )
    }
}
impl Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}
impl FromStr for Rgb {
    type Err = NotationError;

    /// Accepts `#rrggbb`, `#rgb`, `rgb(r, g, b)` and a few color names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || NotationError::UnexpectedToken(s.to_string());
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "black" => return Ok(Self::BLACK),
            "white" => return Ok(Self::WHITE),
            "red" => return Ok(Self::new(255, 0, 0)),
            "green" => return Ok(Self::new(0, 128, 0)),
            "blue" => return Ok(Self::new(0, 0, 255)),
            _ => (),
        }
        if let Some(hex) = s.strip_prefix('#') {
            return match hex.len() {
                6 => u32::from_str_radix(hex, 16)
                    .map(Self::from_u32)
                    .map_err(|_| err()),
                3 => {
                    let value =
                        u32::from_str_radix(hex, 16).map_err(|_| err())?;
                    let expand = |v: u32| (v * 17) as u8;
                    Ok(Self::new(
                        expand(value >> 8 & 0xf),
                        expand(value >> 4 & 0xf),
                        expand(value & 0xf),
                    ))
                }
                _ => Err(err()),
            };
        }
        if let Some(body) =
            s.strip_prefix("rgb(").and_then(|rest| rest.strip_suffix(')'))
        {
            let channels = body
                .split(',')
                .map(|c| c.trim().parse::<u8>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| err())?;
            return match channels.as_slice() {
                [r, g, b] => Ok(Self::new(*r, *g, *b)),
                _ => Err(err()),
            };
        }
        Err(err())
    }
}
impl TryFrom<String> for Rgb {
    type Error = NotationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::Rgb;

    #[test]
    fn parse_colors() {
        assert_eq!("#58c4dd".parse::<Rgb>().unwrap(), Rgb::new(88, 196, 221));
        assert_eq!("#fff".parse::<Rgb>().unwrap(), Rgb::WHITE);
        assert_eq!("rgb(0, 0, 3)".parse::<Rgb>().unwrap().to_u32(), 3);
        assert_eq!("Black".parse::<Rgb>().unwrap(), Rgb::BLACK);
        assert!("none".parse::<Rgb>().is_err());
        assert!("#12345".parse::<Rgb>().is_err());
    }

    #[test]
    fn counter_encoding() {
        let color = Rgb::from_u32(0x010203);
        assert_eq!(color, Rgb::new(1, 2, 3));
        assert_eq!(color.to_u32(), 0x010203);
        assert_eq!(color.to_string(), "#010203");
        assert_eq!(Rgb::from_unit(0.0, 1.0 / 255.0, 1.0), Rgb::new(0, 1, 255));
    }

    #[test]
    fn interpolation() {
        let color = Rgb::BLACK.lerp(&Rgb::new(100, 200, 0), 0.5);
        assert_eq!(color, Rgb::new(50, 100, 0));
        assert_eq!(Rgb::BLACK.lerp(&Rgb::WHITE, 2.0), Rgb::WHITE);
    }
}
