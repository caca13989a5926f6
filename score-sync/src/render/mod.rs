//! Boundary to the external notation engraver.
//!
//! The engraver turns the score into vector geometry. Before that it gets an
//! [AnnotationRequest]: a marker color for every tracked score element,
//! which it has to put on the element's primitives without moving them.
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dom::Score;
use crate::error::{RenderError, RenderResult};
use crate::primitives::Rgb;

mod svg;

pub use svg::annotate_svg;

/// Score element identifiers with the marker color to paint them with.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnnotationRequest {
    pub pass: usize,
    markers: BTreeMap<String, Rgb>,
}
impl AnnotationRequest {
    pub fn new(pass: usize) -> Self {
        Self {
            pass,
            markers: BTreeMap::new(),
        }
    }
    pub fn insert(&mut self, source_id: impl Into<String>, marker: Rgb) {
        self.markers.insert(source_id.into(), marker);
    }
    pub fn marker(&self, source_id: &str) -> Option<Rgb> {
        self.markers.get(source_id).copied()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Rgb)> + '_ {
        self.markers.iter()
    }
    pub fn len(&self) -> usize {
        self.markers.len()
    }
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

/// Which rendered primitives (by SVG id) belong to which score element.
///
/// Serialized as a plain JSON object: `{"n1": ["g12", "path13"]}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuralMap {
    elements: BTreeMap<String, Vec<String>>,
}
impl StructuralMap {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(
        &mut self,
        source_id: impl Into<String>,
        primitive_id: impl Into<String>,
    ) {
        self.elements
            .entry(source_id.into())
            .or_default()
            .push(primitive_id.into());
    }
    pub fn primitives_of(&self, source_id: &str) -> &[String] {
        self.elements
            .get(source_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
    /// Primitive id → score element id.
    pub fn reversed(&self) -> HashMap<&str, &str> {
        self.elements
            .iter()
            .flat_map(|(source, primitives)| {
                primitives.iter().map(move |p| (p.as_str(), source.as_str()))
            })
            .collect()
    }
    pub fn from_json(json: &str) -> RenderResult<Self> {
        serde_json::from_str(json).map_err(|e| RenderError::Engraver(e.to_string()))
    }
    pub fn len(&self) -> usize {
        self.elements.len()
    }
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// What the engraver returns: vector scene and structural map.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    pub svg: String,
    pub structure: StructuralMap,
}

/// External service, which engraves a score into SVG.
///
/// Implementations must honor the annotation request and must produce
/// identical geometry for identical scores, whatever the request is.
pub trait Engraver {
    fn engrave(
        &mut self,
        score: &Score,
        request: &AnnotationRequest,
    ) -> RenderResult<RenderOutput>;
}

/// Engraver for geometry, which was rendered beforehand.
///
/// Every call re-annotates the same SVG, so passes share geometry.
#[derive(Debug, Clone)]
pub struct PrerenderedEngraver {
    svg: String,
    structure: StructuralMap,
}
impl PrerenderedEngraver {
    pub fn new(svg: impl Into<String>, structure: StructuralMap) -> Self {
        Self {
            svg: svg.into(),
            structure,
        }
    }
    /// SVG file and JSON structural map, as written by an engraver.
    pub fn from_files(
        svg_path: impl AsRef<Path>,
        map_path: impl AsRef<Path>,
    ) -> RenderResult<Self> {
        let svg = std::fs::read_to_string(svg_path)?;
        let structure = StructuralMap::from_json(&std::fs::read_to_string(map_path)?)?;
        Ok(Self::new(svg, structure))
    }
}
impl Engraver for PrerenderedEngraver {
    fn engrave(
        &mut self,
        _score: &Score,
        request: &AnnotationRequest,
    ) -> RenderResult<RenderOutput> {
        Ok(RenderOutput {
            svg: annotate_svg(&self.svg, &self.structure, request)?,
            structure: self.structure.clone(),
        })
    }
}
