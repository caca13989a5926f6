//! Boundary to the host scene, which owns and draws graphic objects.
//!
//! The engine only reads marker colors and horizontal anchors from it and
//! writes [VisualState]s into it.
use std::fmt::Display;

use crate::error::RenderResult;
use crate::primitives::Rgb;

mod svg_scene;

pub use svg_scene::{GraphicObject, SvgScene, SvgSceneLoader};

/// Index of a graphic object in its host scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectHandle(usize);
impl ObjectHandle {
    pub fn new(index: usize) -> Self {
        Self(index)
    }
    pub fn index(&self) -> usize {
        self.0
    }
}
impl Display for ObjectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything the engine may change on a graphic object.
///
/// `reveal` is the drawn fraction of progressively revealed objects
/// (beam segments), 0.0 for the rest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualState {
    pub color: Rgb,
    pub opacity: f64,
    pub reveal: f64,
}
impl VisualState {
    pub fn new(color: Rgb, opacity: f64) -> Self {
        Self {
            color,
            opacity,
            reveal: 0.0,
        }
    }
    pub fn with_reveal(mut self, reveal: f64) -> Self {
        self.reveal = reveal;
        self
    }
}

pub trait HostScene {
    /// All graphic objects, in document order.
    fn objects(&self) -> Vec<ObjectHandle>;
    /// Tracing marker: fill color, or stroke color when the fill is
    /// absent or fully transparent.
    fn marker_color(&self, object: ObjectHandle) -> Option<Rgb>;
    /// Leftmost horizontal coordinate, approximately.
    fn anchor_x(&self, object: ObjectHandle) -> f64;
    fn apply(&mut self, object: ObjectHandle, state: &VisualState);
}

/// Turns engraved SVG text into a host scene.
pub trait SceneLoader {
    type Scene: HostScene;
    fn load(&mut self, svg: &str) -> RenderResult<Self::Scene>;
}
