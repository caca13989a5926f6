//! Host scene made of flattened SVG drawing primitives.
use std::collections::HashMap;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{RenderError, RenderResult};
use crate::primitives::Rgb;

use super::{HostScene, ObjectHandle, SceneLoader, VisualState};

static PRIMITIVES: [&str; 10] = [
    "path", "rect", "circle", "ellipse", "line", "polyline", "polygon", "use",
    "text", "image",
];

fn svg_error(e: impl std::fmt::Display) -> RenderError {
    RenderError::Svg(e.to_string())
}

/// One drawing primitive with its effective (inherited) paint.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicObject {
    pub element: String,
    pub id: Option<String>,
    pub fill: Option<Rgb>,
    pub stroke: Option<Rgb>,
    pub fill_opacity: f64,
    pub anchor_x: f64,
    /// Last state written by the engine.
    pub state: Option<VisualState>,
}

/// Paint, inherited from the ancestors.
#[derive(Debug, Clone, PartialEq)]
struct Paint {
    fill: Option<Rgb>,
    stroke: Option<Rgb>,
    fill_opacity: f64,
    offset_x: f64,
}
impl Default for Paint {
    fn default() -> Self {
        Self {
            fill: Some(Rgb::BLACK),
            stroke: None,
            fill_opacity: 1.0,
            offset_x: 0.0,
        }
    }
}
impl Paint {
    fn inherit(&self, attributes: &HashMap<String, String>) -> Self {
        let mut paint = self.clone();
        let mut declarations: Vec<(&str, &str)> = attributes
            .iter()
            .filter(|(k, _)| k.as_str() != "style")
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        // inline style wins over presentation attributes
        if let Some(style) = attributes.get("style") {
            declarations.extend(
                style
                    .split(';')
                    .filter_map(|d| d.split_once(':'))
                    .map(|(k, v)| (k.trim(), v.trim())),
            );
        }
        for (key, value) in declarations {
            match key {
                "fill" => paint.fill = parse_paint(value, paint.fill),
                "stroke" => paint.stroke = parse_paint(value, paint.stroke),
                "fill-opacity" => {
                    if let Ok(opacity) = value.parse::<f64>() {
                        paint.fill_opacity = opacity;
                    }
                }
                "transform" => paint.offset_x += translate_x(value),
                _ => (),
            }
        }
        paint
    }
}

/// `none` clears paint, unknown values (gradients, currentColor) inherit.
fn parse_paint(value: &str, inherited: Option<Rgb>) -> Option<Rgb> {
    match value.trim() {
        "none" | "transparent" => None,
        value => value.parse().ok().or(inherited),
    }
}

/// Horizontal part of `translate(..)` and `matrix(..)` transforms.
fn translate_x(transform: &str) -> f64 {
    let mut offset = 0.0;
    for function in transform.split(')') {
        let Some((name, args)) = function.split_once('(') else {
            continue;
        };
        let args = numbers(args);
        match name.trim() {
            "translate" => offset += args.first().copied().unwrap_or(0.0),
            "matrix" => offset += args.get(4).copied().unwrap_or(0.0),
            _ => (),
        }
    }
    offset
}

/// All numbers of an SVG attribute, like path data or point lists.
fn numbers(s: &str) -> Vec<f64> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut flush = |current: &mut String| {
        if let Ok(value) = current.parse::<f64>() {
            out.push(value);
        }
        current.clear();
    };
    for c in s.chars() {
        match c {
            '0'..='9' => current.push(c),
            '.' if current.contains('.') => {
                flush(&mut current);
                current.push(c);
            }
            '.' => current.push(c),
            '-' | '+' if current.ends_with(['e', 'E']) => current.push(c),
            '-' | '+' => {
                flush(&mut current);
                current.push(c);
            }
            'e' | 'E' if !current.is_empty() => current.push(c),
            _ => flush(&mut current),
        }
    }
    flush(&mut current);
    out
}

fn attributes(e: &BytesStart) -> RenderResult<HashMap<String, String>> {
    let mut map = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(svg_error)?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(svg_error)?
            .to_string();
        let value = attr.unescape_value().map_err(svg_error)?.into_owned();
        map.insert(key, value);
    }
    Ok(map)
}

/// Leftmost x of a primitive, in its own coordinates.
fn local_anchor_x(element: &str, attributes: &HashMap<String, String>) -> f64 {
    let first = |key: &str| {
        attributes
            .get(key)
            .and_then(|v| numbers(v).first().copied())
            .unwrap_or(0.0)
    };
    match element {
        "circle" => first("cx") - first("r"),
        "ellipse" => first("cx") - first("rx"),
        "line" => first("x1").min(first("x2")),
        "polyline" | "polygon" => attributes
            .get("points")
            .map(|points| {
                numbers(points)
                    .iter()
                    .step_by(2)
                    .copied()
                    .fold(f64::INFINITY, f64::min)
            })
            .filter(|x| x.is_finite())
            .unwrap_or(0.0),
        // first moveto of the path
        "path" => first("d"),
        _ => first("x"),
    }
}

#[derive(Debug, Clone, Default)]
pub struct SvgScene {
    objects: Vec<GraphicObject>,
}
impl SvgScene {
    pub fn from_svg(svg: &str) -> RenderResult<Self> {
        let mut reader = Reader::from_str(svg);
        let mut stack = vec![Paint::default()];
        let mut objects = Vec::new();
        loop {
            match reader.read_event().map_err(svg_error)? {
                Event::Start(e) => {
                    let paint = Self::visit(&e, &stack, &mut objects)?;
                    stack.push(paint);
                }
                Event::Empty(e) => {
                    Self::visit(&e, &stack, &mut objects)?;
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Eof => break,
                _ => (),
            }
        }
        log::debug!("loaded SVG scene with {} objects", objects.len());
        Ok(Self { objects })
    }
    pub fn from_file(path: impl AsRef<Path>) -> RenderResult<Self> {
        Self::from_svg(&std::fs::read_to_string(path)?)
    }

    fn visit(
        e: &BytesStart,
        stack: &[Paint],
        objects: &mut Vec<GraphicObject>,
    ) -> RenderResult<Paint> {
        let attributes = attributes(e)?;
        let paint = stack.last().cloned().unwrap_or_default().inherit(&attributes);
        let element = std::str::from_utf8(e.local_name().as_ref())
            .map_err(svg_error)?
            .to_string();
        if PRIMITIVES.contains(&element.as_str()) {
            objects.push(GraphicObject {
                anchor_x: paint.offset_x + local_anchor_x(&element, &attributes),
                id: attributes.get("id").cloned(),
                element,
                fill: paint.fill,
                stroke: paint.stroke,
                fill_opacity: paint.fill_opacity,
                state: None,
            });
        }
        Ok(paint)
    }

    pub fn object(&self, handle: ObjectHandle) -> Option<&GraphicObject> {
        self.objects.get(handle.index())
    }
    pub fn len(&self) -> usize {
        self.objects.len()
    }
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
    /// Written states of all objects, in document order.
    pub fn states(&self) -> Vec<Option<VisualState>> {
        self.objects.iter().map(|o| o.state).collect()
    }
}
impl HostScene for SvgScene {
    fn objects(&self) -> Vec<ObjectHandle> {
        (0..self.objects.len()).map(ObjectHandle::new).collect()
    }
    fn marker_color(&self, object: ObjectHandle) -> Option<Rgb> {
        let object = self.objects.get(object.index())?;
        match object.fill {
            Some(fill) if object.fill_opacity > 0.0 => Some(fill),
            _ => object.stroke,
        }
    }
    fn anchor_x(&self, object: ObjectHandle) -> f64 {
        self.objects
            .get(object.index())
            .map(|o| o.anchor_x)
            .unwrap_or(0.0)
    }
    fn apply(&mut self, object: ObjectHandle, state: &VisualState) {
        if let Some(object) = self.objects.get_mut(object.index()) {
            if object.fill.is_some() {
                object.fill = Some(state.color);
            }
            if object.stroke.is_some() {
                object.stroke = Some(state.color);
            }
            object.state = Some(*state);
        }
    }
}

/// Loads annotated SVG text as [SvgScene].
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgSceneLoader;
impl SceneLoader for SvgSceneLoader {
    type Scene = SvgScene;

    fn load(&mut self, svg: &str) -> RenderResult<Self::Scene> {
        SvgScene::from_svg(svg)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{numbers, translate_x, SvgScene};
    use crate::primitives::Rgb;
    use crate::scene::{HostScene, ObjectHandle, VisualState};

    #[test]
    fn number_parsing() {
        assert_eq!(numbers("M10-20L3.5.5"), vec![10.0, -20.0, 3.5, 0.5]);
        assert_eq!(numbers("1e2,3"), vec![100.0, 3.0]);
        assert_eq!(translate_x("translate(10, 5) scale(2) translate(-3)"), 7.0);
        assert_eq!(translate_x("matrix(1 0 0 1 40 2)"), 40.0);
    }

    #[test]
    fn inherited_paint_and_anchors() {
        let svg = r##"<svg>
            <g fill="#000005" transform="translate(100)">
                <path d="M12 3 L40 3"/>
                <rect x="5" y="0" style="fill:#000006"/>
                <polygon points="9,1 4,2 7,3"/>
            </g>
            <path d="M0 0" fill="none" stroke="#000007"/>
            <circle cx="10" r="2" fill="#000008" fill-opacity="0" stroke="#000009"/>
            <text x="3 4">a<tspan>b</tspan></text>
        </svg>"##;
        let scene = SvgScene::from_svg(svg).unwrap();
        assert_eq!(scene.len(), 6);
        let handles = scene.objects();
        assert_eq!(scene.marker_color(handles[0]), Some(Rgb::from_u32(5)));
        assert_eq!(scene.anchor_x(handles[0]), 112.0);
        assert_eq!(scene.marker_color(handles[1]), Some(Rgb::from_u32(6)));
        assert_eq!(scene.anchor_x(handles[1]), 105.0);
        assert_eq!(scene.anchor_x(handles[2]), 104.0);
        assert_eq!(scene.marker_color(handles[3]), Some(Rgb::from_u32(7)));
        assert_eq!(scene.marker_color(handles[4]), Some(Rgb::from_u32(9)));
        assert_eq!(scene.anchor_x(handles[4]), 8.0);
        assert_eq!(scene.marker_color(handles[5]), Some(Rgb::BLACK));
        assert_eq!(scene.anchor_x(handles[5]), 3.0);
    }

    #[test]
    fn apply_state() {
        let mut scene =
            SvgScene::from_svg(r##"<svg><rect fill="#000001"/></svg>"##).unwrap();
        let state = VisualState::new(Rgb::new(1, 2, 3), 0.5);
        scene.apply(ObjectHandle::new(0), &state);
        scene.apply(ObjectHandle::new(9), &state);
        assert_eq!(scene.states(), vec![Some(state)]);
        assert_eq!(
            scene.object(ObjectHandle::new(0)).and_then(|o| o.fill),
            Some(Rgb::new(1, 2, 3))
        );
    }

    #[test]
    fn from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"<svg><line x1="4" x2="2"/></svg>"#).unwrap();
        let scene = SvgScene::from_file(file.path()).unwrap();
        assert_eq!(scene.anchor_x(ObjectHandle::new(0)), 2.0);
    }
}
