//! Linking rendered geometry back to events by reading markers.
use std::collections::{BTreeMap, HashMap};

use crate::error::ResolutionWarning;
use crate::model::EventModel;
use crate::primitives::EventId;
use crate::scene::{HostScene, ObjectHandle};

use super::tagger::MarkerTable;

#[derive(Debug, Clone, PartialEq)]
pub struct BoundObject {
    pub handle: ObjectHandle,
    /// Chord head index, `None` for the element itself.
    pub sub_element: Option<usize>,
    pub anchor_x: f64,
}

/// Graphic objects of one event, ordered left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub event: EventId,
    pub objects: Vec<BoundObject>,
}

/// Event → objects and object → event index. Every object has one owner.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    bindings: BTreeMap<EventId, Binding>,
    owners: HashMap<ObjectHandle, EventId>,
}
impl Bindings {
    pub fn get(&self, event: EventId) -> Option<&Binding> {
        self.bindings.get(&event)
    }
    pub fn owner(&self, handle: ObjectHandle) -> Option<EventId> {
        self.owners.get(&handle).copied()
    }
    pub fn iter(&self) -> impl Iterator<Item = &Binding> + '_ {
        self.bindings.values()
    }
    pub fn len(&self) -> usize {
        self.bindings.len()
    }
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
    /// Every bound object, in document order.
    pub fn handles(&self) -> Vec<ObjectHandle> {
        let mut handles: Vec<ObjectHandle> = self.owners.keys().copied().collect();
        handles.sort();
        handles
    }

    pub(crate) fn insert(&mut self, event: EventId, object: BoundObject) {
        if self.owners.contains_key(&object.handle) {
            return;
        }
        self.owners.insert(object.handle, event);
        self.bindings
            .entry(event)
            .or_insert_with(|| Binding {
                event,
                objects: Vec::new(),
            })
            .objects
            .push(object);
    }

    /// Add bindings of another pass. Objects already owned stay with
    /// their first owner.
    pub fn merge(&mut self, other: Bindings) {
        for (event, binding) in other.bindings {
            for object in binding.objects {
                self.insert(event, object);
            }
        }
        self.sort_objects();
    }

    fn sort_objects(&mut self) {
        for binding in self.bindings.values_mut() {
            binding.objects.sort_by(|a, b| {
                a.anchor_x
                    .total_cmp(&b.anchor_x)
                    .then(a.handle.cmp(&b.handle))
            });
        }
    }
}

/// Read marker of every object of the scene and bind it to its event.
///
/// Objects without a known marker are left alone.
pub fn resolve<S: HostScene>(
    scene: &S,
    table: &MarkerTable,
) -> (Bindings, Vec<ResolutionWarning>) {
    let mut bindings = Bindings::default();
    let mut warnings = Vec::new();
    for handle in scene.objects() {
        let Some(color) = scene.marker_color(handle) else {
            continue;
        };
        match table.lookup(color) {
            Some(assignment) => bindings.insert(
                assignment.event,
                BoundObject {
                    handle,
                    sub_element: assignment.sub_element,
                    anchor_x: scene.anchor_x(handle),
                },
            ),
            None if table.in_range(color) => {
                warnings.push(ResolutionWarning::UnknownMarker {
                    object: handle.index(),
                    color,
                })
            }
            None => (),
        }
    }
    for event in table.events() {
        if bindings.get(event).is_none() {
            let source_id = table
                .assignments()
                .iter()
                .find(|a| a.event == event)
                .map(|a| a.source_id.clone())
                .unwrap_or_default();
            warnings.push(ResolutionWarning::MarkerWithoutGeometry {
                event,
                source_id,
            });
        }
    }
    bindings.sort_objects();
    log::debug!(
        "pass {}: bound {} of {} events",
        table.pass,
        bindings.len(),
        table.events().len()
    );
    (bindings, warnings)
}

/// Composites, where some members have geometry and some don't.
pub fn composite_warnings(
    model: &EventModel,
    bindings: &Bindings,
) -> Vec<ResolutionWarning> {
    model
        .events()
        .iter()
        .filter(|ev| ev.is_composite())
        .filter_map(|ev| {
            let missing: Vec<EventId> = ev
                .members
                .iter()
                .copied()
                .filter(|m| bindings.get(*m).is_none())
                .collect();
            match !missing.is_empty() && missing.len() < ev.members.len() {
                true => Some(ResolutionWarning::PartialComposite {
                    event: ev.id,
                    missing,
                }),
                false => None,
            }
        })
        .collect()
}
