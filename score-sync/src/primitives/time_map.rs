//! Main "ruler" for walking through the measures of a part.
use std::fmt::Display;

use super::{
    position::{AbsolutePosition, RelativePosition},
    Length,
};
pub type TimeMapMeasures = Vec<MeasureInfo>;

/// Meter of a measure, e.g. 7/8.
#[derive(Debug, PartialEq, Eq, PartialOrd, Clone, Copy, Hash)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}
impl TimeSignature {
    pub fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
    /// Numerator is positive, denominator is a power of two.
    pub fn is_valid(&self) -> bool {
        self.numerator > 0 && self.denominator.is_power_of_two()
    }
}
impl Display for TimeSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Measures of one part, with their nominal lengths.
///
/// Used as reference for positioning voices and converting positions
/// from absolute to relative.
#[derive(Debug, Clone)]
pub struct TimeMap {
    /// measure numbers as they appear in score (usually 1-based)
    measures: TimeMapMeasures,
    /// start position of the first measure in map
    start_position: AbsolutePosition,
}
impl TimeMap {
    pub fn new(
        measures: Vec<MeasureInfo>,
        start_position: AbsolutePosition,
    ) -> Self {
        Self {
            measures,
            start_position,
        }
    }
    /// Get absolute position of measure start.
    pub fn get_absolute_position_of_measure(
        &self,
        measure_index: u32,
    ) -> AbsolutePosition {
        let mut counted_abs = self.start_position;
        for measure in self.measures.iter() {
            if measure.index == measure_index {
                break;
            }
            counted_abs += measure.length;
        }
        counted_abs
    }
    /// Get measure under given position.
    ///
    ///  # Returns
    /// MeasureInfo block and absolute position of its start.
    pub fn get_measure_from_absolute_position(
        &self,
        absolute: &AbsolutePosition,
    ) -> Option<(&MeasureInfo, AbsolutePosition)> {
        let mut counted_abs = self.start_position;
        for measure in self.measures.iter() {
            let last_measure_pos = counted_abs;
            counted_abs += measure.length;
            if counted_abs > *absolute {
                return Some((measure, last_measure_pos));
            }
        }
        None
    }

    pub fn pos_relative_from_absolute(
        &self,
        absolute: &AbsolutePosition,
    ) -> Option<RelativePosition> {
        if let Some((measure, measure_start)) =
            self.get_measure_from_absolute_position(absolute)
        {
            return Some(RelativePosition::new(
                measure.index,
                absolute.get() - measure_start.get(),
            ));
        }
        // The very end of the map belongs to the last measure.
        let last = self.measures.last()?;
        if *absolute == self.end_position() {
            let start = self.get_absolute_position_of_measure(last.index);
            return Some(RelativePosition::new(
                last.index,
                absolute.get() - start.get(),
            ));
        }
        None
    }
    pub fn pos_absolute_from_relative(
        &self,
        relative: &RelativePosition,
    ) -> AbsolutePosition {
        let m_pos =
            self.get_absolute_position_of_measure(relative.get_measure_index());
        AbsolutePosition::from(m_pos.get() + relative.get_position())
    }
    pub fn get_measure_info(&self, measure_index: u32) -> Option<&MeasureInfo> {
        self.measures.iter().find(|m| m.index == measure_index)
    }
    pub fn get(&self) -> &Vec<MeasureInfo> {
        &self.measures
    }
    pub fn start_position(&self) -> AbsolutePosition {
        self.start_position
    }
    /// Position right after the last measure.
    pub fn end_position(&self) -> AbsolutePosition {
        let mut end = self.start_position;
        for measure in self.measures.iter() {
            end += measure.length;
        }
        end
    }
}

#[derive(Debug, PartialEq, PartialOrd, Clone)]
pub struct MeasureInfo {
    pub index: u32,
    pub time_signature: TimeSignature,
    pub length: Length,
}
impl MeasureInfo {
    pub fn new(index: u32, time_signature: TimeSignature) -> Self {
        let length = Length::from(&time_signature);
        Self {
            index,
            time_signature,
            length,
        }
    }
    /// Measure, which is shorter than its meter (anacrusis).
    pub fn pickup(
        index: u32,
        time_signature: TimeSignature,
        length: Length,
    ) -> Self {
        Self {
            index,
            time_signature,
            length,
        }
    }
}

#[cfg(test)]
mod tests {
    use fraction::Fraction;

    use crate::primitives::{
        position::{AbsolutePosition, RelativePosition},
        Length,
    };

    use super::{MeasureInfo, TimeMap, TimeMapMeasures, TimeSignature};

    fn measures_from_ts(info: Vec<(u32, TimeSignature)>) -> TimeMapMeasures {
        info.into_iter()
            .map(|(idx, ts)| MeasureInfo::new(idx, ts))
            .collect()
    }

    fn time_map_1() -> TimeMap {
        let info = Vec::from([
            (1, TimeSignature::new(4, 4)),
            (2, TimeSignature::new(4, 4)),
            (3, TimeSignature::new(4, 4)),
            (4, TimeSignature::new(7, 8)),
            (5, TimeSignature::new(9, 8)),
            (6, TimeSignature::new(4, 4)),
        ]);

        TimeMap::new(measures_from_ts(info), 0.0.into())
    }

    fn time_map_pickup() -> TimeMap {
        let mut measures = vec![MeasureInfo::pickup(
            0,
            TimeSignature::new(3, 4),
            Length::new(1, 4),
        )];
        measures.extend(measures_from_ts(vec![
            (1, TimeSignature::new(3, 4)),
            (2, TimeSignature::new(3, 4)),
        ]));
        TimeMap::new(measures, 0.0.into())
    }

    #[test]
    fn test_time_signature() {
        assert!(TimeSignature::new(7, 8).is_valid());
        assert!(!TimeSignature::new(0, 4).is_valid());
        assert!(!TimeSignature::new(3, 6).is_valid());
        assert_eq!(TimeSignature::new(9, 8).to_string(), "9/8");
    }

    #[test]
    fn test_measure_position() {
        let time_map = time_map_1();
        assert_eq!(
            time_map.get_absolute_position_of_measure(1),
            AbsolutePosition::from(0.0)
        );
        assert_eq!(
            time_map.get_absolute_position_of_measure(4),
            AbsolutePosition::from(3.0)
        );
        let position_5 = AbsolutePosition::from(
            Fraction::from(3.0) + Fraction::new(7u64, 8u64),
        );
        assert_eq!(time_map.get_absolute_position_of_measure(5), position_5);
        assert_eq!(
            time_map.end_position(),
            AbsolutePosition::from(Fraction::new(48u64, 8u64))
        );
    }

    #[test]
    fn test_pickup() {
        let time_map = time_map_pickup();
        assert_eq!(
            time_map.get_absolute_position_of_measure(1),
            AbsolutePosition::from(0.25)
        );
        assert_eq!(
            time_map.get_measure_info(2).map(|m| m.length),
            Some(Length::new(3, 4))
        );
    }

    #[test]
    fn test_converter() {
        let time_map = time_map_1();
        let absolute = AbsolutePosition::from(Fraction::new(
            8 * 3 + 7 + 3 as u64,
            8 as u64,
        ));
        let relative = RelativePosition::new(5, Fraction::new(3u64, 8u64));
        assert_eq!(&time_map.pos_absolute_from_relative(&relative), &absolute);
        assert_eq!(
            &time_map.pos_relative_from_absolute(&absolute).unwrap(),
            &relative
        );
        let end = time_map.end_position();
        assert_eq!(
            time_map.pos_relative_from_absolute(&end),
            Some(RelativePosition::new(6, Fraction::from(1.0)))
        );
        assert_eq!(
            time_map.pos_relative_from_absolute(&AbsolutePosition::from(10.0)),
            None
        );
    }
}
