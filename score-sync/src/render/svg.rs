//! Marker injection into SVG text.
use std::io::Cursor;

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::{RenderError, RenderResult};
use crate::primitives::Rgb;

use super::{AnnotationRequest, StructuralMap};

fn svg_error(e: impl std::fmt::Display) -> RenderError {
    RenderError::Svg(e.to_string())
}

/// Paint every element of the request, and all its descendants, with its
/// marker color. Nested elements with their own marker keep it.
///
/// Elements are matched by their `id` through the structural map, or
/// directly when the id is a score element id. Only `fill` and `stroke`
/// are touched, and `none` values are kept.
///
/// # Example
///
/// ```
/// # use score_sync::render::{annotate_svg, AnnotationRequest, StructuralMap};
/// # use score_sync::primitives::Rgb;
/// let mut structure = StructuralMap::new();
/// structure.insert("n1", "g1");
/// let mut request = AnnotationRequest::new(0);
/// request.insert("n1", Rgb::from_u32(1));
/// let svg = annotate_svg(
///     r#"<svg><g id="g1"><path d="M0 0"/></g></svg>"#,
///     &structure,
///     &request,
/// )
/// .unwrap();
/// assert_eq!(
///     svg,
///     r##"<svg><g id="g1" fill="#000001" stroke="#000001"><path d="M0 0" fill="#000001" stroke="#000001"/></g></svg>"##
/// );
/// ```
pub fn annotate_svg(
    svg: &str,
    structure: &StructuralMap,
    request: &AnnotationRequest,
) -> RenderResult<String> {
    let reversed = structure.reversed();
    let marker_of = |e: &BytesStart| -> RenderResult<Option<Rgb>> {
        Ok(element_id(e)?.and_then(|id| {
            let source = reversed.get(id.as_str()).copied().unwrap_or(id.as_str());
            request.marker(source)
        }))
    };

    let mut reader = Reader::from_str(svg);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut stack: Vec<Option<Rgb>> = Vec::new();
    let mut painted = 0;
    loop {
        let event = reader.read_event().map_err(svg_error)?;
        match event {
            Event::Start(e) => {
                let marker = marker_of(&e)?.or(stack.last().copied().flatten());
                stack.push(marker);
                let e = match marker {
                    Some(marker) => {
                        painted += 1;
                        paint(&e, marker)?
                    }
                    None => e,
                };
                writer.write_event(Event::Start(e))
            }
            Event::Empty(e) => {
                let marker = marker_of(&e)?.or(stack.last().copied().flatten());
                let e = match marker {
                    Some(marker) => {
                        painted += 1;
                        paint(&e, marker)?
                    }
                    None => e,
                };
                writer.write_event(Event::Empty(e))
            }
            Event::End(e) => {
                stack.pop();
                writer.write_event(Event::End(e))
            }
            Event::Eof => break,
            other => writer.write_event(other),
        }
        .map_err(svg_error)?;
    }
    log::debug!(
        "pass {}: painted {} SVG elements for {} markers",
        request.pass,
        painted,
        request.len()
    );
    String::from_utf8(writer.into_inner().into_inner()).map_err(svg_error)
}

fn element_id(e: &BytesStart) -> RenderResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(svg_error)?;
        if attr.key.as_ref() == b"id" {
            return Ok(Some(attr.unescape_value().map_err(svg_error)?.into_owned()));
        }
    }
    Ok(None)
}

fn paint(e: &BytesStart, marker: Rgb) -> RenderResult<BytesStart<'static>> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(svg_error)?
        .to_string();
    let color = marker.to_string();
    let mut painted = BytesStart::new(name);
    let (mut fill_none, mut stroke_none) = (false, false);
    let mut style: Option<Vec<String>> = None;
    for attr in e.attributes() {
        let attr = attr.map_err(svg_error)?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(svg_error)?;
        let value = attr.unescape_value().map_err(svg_error)?;
        match key {
            "fill" => fill_none = value.trim() == "none",
            "stroke" => stroke_none = value.trim() == "none",
            "style" => {
                let mut kept = Vec::new();
                for declaration in value.split(';') {
                    match declaration.split_once(':') {
                        Some((prop, val)) if prop.trim() == "fill" => {
                            fill_none |= val.trim() == "none"
                        }
                        Some((prop, val)) if prop.trim() == "stroke" => {
                            stroke_none |= val.trim() == "none"
                        }
                        _ if declaration.trim().is_empty() => (),
                        _ => kept.push(declaration.trim().to_string()),
                    }
                }
                style = Some(kept);
            }
            _ => painted.push_attribute((key, value.as_ref())),
        }
    }
    let fill = if fill_none { "none" } else { color.as_str() };
    let stroke = if stroke_none { "none" } else { color.as_str() };
    painted.push_attribute(("fill", fill));
    painted.push_attribute(("stroke", stroke));
    if let Some(mut kept) = style {
        kept.push(format!("fill:{}", fill));
        kept.push(format!("stroke:{}", stroke));
        painted.push_attribute(("style", kept.join(";").as_str()));
    }
    Ok(painted)
}

#[cfg(test)]
mod tests {
    use super::annotate_svg;
    use crate::error::RenderError;
    use crate::primitives::Rgb;
    use crate::render::{AnnotationRequest, StructuralMap};

    fn request(entries: &[(&str, u32)]) -> AnnotationRequest {
        let mut request = AnnotationRequest::new(0);
        for (id, counter) in entries {
            request.insert(*id, Rgb::from_u32(*counter));
        }
        request
    }

    #[test]
    fn nested_markers() {
        let mut structure = StructuralMap::new();
        structure.insert("c1", "chord");
        structure.insert("h1", "head");
        let svg = r#"<svg><g id="chord"><rect x="1"/><g id="head"><path d="M1 2"/></g></g><rect id="other"/></svg>"#;
        let out =
            annotate_svg(svg, &structure, &request(&[("c1", 1), ("h1", 2)]))
                .unwrap();
        assert!(out.contains(r##"<rect x="1" fill="#000001" stroke="#000001"/>"##));
        assert!(out.contains(r##"<path d="M1 2" fill="#000002" stroke="#000002"/>"##));
        assert!(out.contains(r#"<rect id="other"/>"#));
    }

    #[test]
    fn keeps_none_and_other_styles() {
        let svg = r#"<svg><path id="s1" fill="none" style="stroke:black;stroke-width:2"/></svg>"#;
        let out =
            annotate_svg(svg, &StructuralMap::new(), &request(&[("s1", 3)]))
                .unwrap();
        assert_eq!(
            out,
            r##"<svg><path id="s1" fill="none" stroke="#000003" style="stroke-width:2;fill:none;stroke:#000003"/></svg>"##
        );
    }

    #[test]
    fn malformed_svg() {
        let result = annotate_svg(
            "<svg><g></svg>",
            &StructuralMap::new(),
            &AnnotationRequest::new(0),
        );
        assert!(matches!(result, Err(RenderError::Svg(_))));
    }
}
