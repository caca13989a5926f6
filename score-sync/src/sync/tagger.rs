//! Identifier tagging: a unique marker color for every tracked element.
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::config::SyncConfig;
use crate::error::TaggingCapacityError;
use crate::model::EventModel;
use crate::primitives::{EventId, Rgb, TimedEvent};
use crate::render::AnnotationRequest;

/// Markers are 24-bit colors.
const COLOR_SPACE: u32 = 0xFF_FFFF;

/// Synthetic color, which identifies one score element during one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VisualMarker {
    color: Rgb,
}
impl VisualMarker {
    pub fn color(&self) -> Rgb {
        self.color
    }
    pub fn counter(&self) -> u32 {
        self.color.to_u32()
    }
}

/// Counter-encoded colors, starting from `#000001`, skipping reserved ones.
#[derive(Debug, Clone)]
pub struct Palette {
    capacity: u32,
    reserved: BTreeSet<Rgb>,
    next: u32,
    issued: u32,
}
impl Palette {
    pub fn new(capacity: u32, reserved: BTreeSet<Rgb>) -> Self {
        let usable = COLOR_SPACE.saturating_sub(reserved.len() as u32);
        Self {
            capacity: capacity.min(usable),
            reserved,
            next: 1,
            issued: 0,
        }
    }
    pub fn allocate(&mut self) -> Option<VisualMarker> {
        if self.issued >= self.capacity {
            return None;
        }
        while self.next <= COLOR_SPACE {
            let color = Rgb::from_u32(self.next);
            self.next += 1;
            if !self.reserved.contains(&color) {
                self.issued += 1;
                return Some(VisualMarker { color });
            }
        }
        None
    }
    pub fn capacity(&self) -> u32 {
        self.capacity
    }
    pub fn remaining(&self) -> u32 {
        self.capacity - self.issued
    }
}

/// Marker of one score element: an event or a sub-element (chord head).
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerAssignment {
    pub event: EventId,
    pub sub_element: Option<usize>,
    pub source_id: String,
    pub marker: VisualMarker,
}

/// Markers of one pass.
#[derive(Debug, Clone, Default)]
pub struct MarkerTable {
    pub pass: usize,
    assignments: Vec<MarkerAssignment>,
    by_color: HashMap<Rgb, usize>,
    highest: u32,
}
impl MarkerTable {
    pub fn new(pass: usize) -> Self {
        Self {
            pass,
            ..Default::default()
        }
    }
    pub(crate) fn push(&mut self, assignment: MarkerAssignment) {
        self.highest = self.highest.max(assignment.marker.counter());
        self.by_color
            .insert(assignment.marker.color(), self.assignments.len());
        self.assignments.push(assignment);
    }
    pub fn lookup(&self, color: Rgb) -> Option<&MarkerAssignment> {
        self.by_color.get(&color).map(|idx| &self.assignments[*idx])
    }
    /// Color looks like a marker of this pass, issued or not.
    pub fn in_range(&self, color: Rgb) -> bool {
        (1..=self.highest).contains(&color.to_u32())
    }
    pub fn assignments(&self) -> &[MarkerAssignment] {
        &self.assignments
    }
    /// Tagged events, in order of tagging.
    pub fn events(&self) -> Vec<EventId> {
        let mut seen = HashSet::new();
        self.assignments
            .iter()
            .map(|a| a.event)
            .filter(|e| seen.insert(*e))
            .collect()
    }
    pub fn len(&self) -> usize {
        self.assignments.len()
    }
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
    pub fn annotation_request(&self) -> AnnotationRequest {
        let mut request = AnnotationRequest::new(self.pass);
        for assignment in self.assignments.iter() {
            request.insert(assignment.source_id.clone(), assignment.marker.color());
        }
        request
    }
}

/// Score elements of the event, which need their own marker.
fn targets(event: &TimedEvent) -> Vec<(Option<usize>, &str)> {
    let mut targets = vec![(None, event.source_id.as_str())];
    targets.extend(
        event
            .sub_elements
            .iter()
            .enumerate()
            .map(|(idx, source)| (Some(idx), source.as_str())),
    );
    targets
}

/// Tag every visible event of the model.
///
/// Events are tagged in time order. When the palette runs out, a new pass
/// with a fresh palette is started, so passes split the score in time.
/// All markers of one event always belong to the same pass.
pub fn tag(
    model: &EventModel,
    config: &SyncConfig,
) -> Result<Vec<MarkerTable>, TaggingCapacityError> {
    let reserved = config.reserved();
    let mut palette = Palette::new(config.palette_size, reserved.clone());
    let capacity = palette.capacity();
    let mut seen_sources = HashSet::new();
    let events: Vec<(&TimedEvent, Vec<(Option<usize>, &str)>)> = model
        .in_time_order()
        .into_iter()
        .filter(|ev| ev.visible && !ev.source_id.is_empty())
        .filter_map(|ev| {
            let targets: Vec<_> = targets(ev)
                .into_iter()
                .filter(|(_, source)| match seen_sources.insert(*source) {
                    true => true,
                    false => {
                        log::warn!(
                            "element `{}` of {} is already tagged",
                            source,
                            ev.id
                        );
                        false
                    }
                })
                .collect();
            match targets.is_empty() {
                true => None,
                false => Some((ev, targets)),
            }
        })
        .collect();
    let total: usize = events.iter().map(|(_, t)| t.len()).sum();

    let mut tables = Vec::new();
    let mut table = MarkerTable::new(0);
    for (event, targets) in events {
        let error = |requested| TaggingCapacityError {
            event: event.id,
            source_id: event.source_id.clone(),
            requested,
            capacity,
        };
        if targets.len() > capacity as usize {
            return Err(error(targets.len()));
        }
        if (palette.remaining() as usize) < targets.len() {
            if !config.multi_pass {
                return Err(error(total));
            }
            let pass = table.pass + 1;
            tables.push(std::mem::replace(&mut table, MarkerTable::new(pass)));
            palette = Palette::new(config.palette_size, reserved.clone());
        }
        for (sub_element, source_id) in targets {
            let marker = palette.allocate().ok_or_else(|| error(total))?;
            table.push(MarkerAssignment {
                event: event.id,
                sub_element,
                source_id: source_id.to_string(),
                marker,
            });
        }
    }
    tables.push(table);
    log::info!(
        "tagged {} elements in {} pass(es)",
        total,
        tables.len()
    );
    Ok(tables)
}
