use crate::binding::path::PathFlattener;
use crate::error::BindingError;
use crate::host::{HostTree, Viewport};
use crate::math::{to_radians, Vector2};
use crate::Result;

use std::f32::consts::PI;
use tracing::{trace, warn};

/// Collision geometry for a single body
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeDescriptor {
    Rectangle { width: f32, height: f32 },
    Polygon { vertices: Vec<Vector2> },
    Circle { radius: f32 },
}

/// Rendered box of an element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxGeometry {
    pub width: f32,
    pub height: f32,
    pub border_radius: f32,

    /// Page-space top-left corner
    pub top_left: Vector2,
}

impl BoxGeometry {
    /// Page-space centre of the box; where the body is placed
    pub fn center(&self) -> Vector2 {
        Vector2::new(
            self.top_left.x + self.width / 2.0,
            self.top_left.y + self.height / 2.0,
        )
    }
}

/// Splits the first `<number><unit>` run out of a CSS length.
///
/// The sign is not part of the match, so `-5px` reads as `5px`.
pub fn split_length(value: &str) -> Option<(f32, &str)> {
    let bytes = value.as_bytes();

    for start in 0..bytes.len() {
        let mut i = start;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        let integer_end = i;

        let number_end = if i < bytes.len() && bytes[i] == b'.' {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if j == i + 1 {
                continue;
            }
            j
        } else if integer_end > start {
            integer_end
        } else {
            continue;
        };

        let mut unit_end = number_end;
        while unit_end < bytes.len() && bytes[unit_end].is_ascii_alphabetic() {
            unit_end += 1;
        }
        if unit_end == number_end {
            continue;
        }

        let number = value[start..number_end].parse::<f32>().ok()?;
        return Some((number, &value[number_end..unit_end]));
    }

    None
}

/// Resolves a CSS length to pixels. Only `px`, `vw` and `vh` are supported.
pub fn parse_length(value: &str, viewport: Viewport) -> Result<f32> {
    let (number, unit) = split_length(value)
        .ok_or_else(|| BindingError::MalformedLength(value.to_string()))?;

    match unit {
        "px" => Ok(number),
        "vw" => Ok((number / 100.0) * viewport.width),
        "vh" => Ok((number / 100.0) * viewport.height),
        _ => Err(BindingError::UnsupportedUnit(value.to_string())),
    }
}

/// Reads the longest numeric prefix, ignoring leading whitespace
pub fn parse_leading_float(value: &str) -> Option<f32> {
    let trimmed = value.trim_start();
    let bytes = trimmed.as_bytes();

    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let mut digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return None;
    }

    // optional exponent, only kept when well formed
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    trimmed[..end].parse::<f32>().ok()
}

/// Parses an angle with a CSS angle unit into radians
fn parse_angle(value: &str) -> Option<f32> {
    let value = value.trim();
    let number = parse_leading_float(value)?;
    let unit = value.trim_start_matches(|c: char| c.is_ascii_digit() || "+-.eE".contains(c));

    match unit.trim() {
        "deg" => Some(to_radians(number)),
        "rad" | "" => Some(number),
        "turn" => Some(number * 2.0 * PI),
        "grad" => Some(number * PI / 200.0),
        _ => None,
    }
}

/// The argument list of the first `name(...)` call in a transform value
fn call_arguments<'a>(transform: &'a str, name: &str) -> Option<&'a str> {
    let start = transform.find(name)? + name.len();
    let rest = &transform[start..];
    let end = rest.find(')')?;
    Some(&rest[..end])
}

/// Reads the rotation encoded in a CSS `transform` value, in radians.
///
/// Understands `rotate()`, `rotateZ()` and the `matrix()` form that computed
/// styles report. Anything else is treated as unrotated.
pub fn parse_rotation(transform: &str) -> f32 {
    let transform = transform.trim();

    if let Some(args) = call_arguments(transform, "rotateZ(").or_else(|| call_arguments(transform, "rotate(")) {
        return parse_angle(args).unwrap_or(0.0);
    }

    if let Some(args) = call_arguments(transform, "matrix(") {
        let values: Vec<f32> = args
            .split(',')
            .filter_map(|v| v.trim().parse::<f32>().ok())
            .collect();
        if values.len() == 6 {
            return values[1].atan2(values[0]);
        }
    }

    0.0
}

/// The element's current visual rotation, in radians. Inline style wins over computed.
pub fn extract_rotation<H: HostTree>(host: &H, node: H::Node) -> f32 {
    host.inline_style(node, "transform")
        .or_else(|| host.computed_style(node, "transform"))
        .map(|t| parse_rotation(&t))
        .unwrap_or(0.0)
}

fn style_length<H: HostTree>(host: &H, node: H::Node, property: &str, viewport: Viewport) -> Result<f32> {
    let value = host
        .inline_style(node, property)
        .filter(|v| !v.trim().is_empty())
        .or_else(|| host.computed_style(node, property))
        .ok_or_else(|| BindingError::MalformedLength(format!("{} is not set", property)))?;
    parse_length(&value, viewport)
}

/// Rendered size, border radius and page position of an element
pub fn extract_box<H: HostTree>(host: &H, node: H::Node) -> Result<BoxGeometry> {
    let viewport = host.viewport();
    let width = style_length(host, node, "width", viewport)?;
    let height = style_length(host, node, "height", viewport)?;

    let border_radius = host
        .computed_style(node, "border-radius")
        .and_then(|r| parse_leading_float(&r))
        .unwrap_or(0.0);

    let rect = host.bounding_rect(node);

    Ok(BoxGeometry {
        width,
        height,
        border_radius,
        top_left: rect.origin(),
    })
}

/// Parses a polygon `points` attribute.
///
/// Coordinates may be separated by whitespace, commas or both, so `0,0 10,0`
/// and `0 0 10 0` read the same. Every coordinate must be a finite number and
/// they must pair up.
pub fn parse_points(points: &str) -> std::result::Result<Vec<Vector2>, String> {
    let coords = points
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<f32>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| format!("bad coordinate `{}`", token))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if coords.is_empty() {
        return Err("polygon has no points".to_string());
    }
    if coords.len() % 2 != 0 {
        return Err(format!("odd number of coordinates ({})", coords.len()));
    }
    Ok(coords.chunks_exact(2).map(|xy| Vector2::new(xy[0], xy[1])).collect())
}

/// Tags that carry no geometry and are passed over without a diagnostic
const NON_DRAWING_TAGS: &[&str] = &["title", "desc", "defs", "metadata", "style"];

/// Collects the collision shapes of a vector container's primitives, in document order.
///
/// Groups are descended into. A primitive that cannot be turned into a shape,
/// whether its tag is unknown or its geometry is empty or malformed, is
/// skipped with a warning.
pub fn extract_vector_shapes<H: HostTree>(
    host: &H,
    node: H::Node,
    flattener: &dyn PathFlattener,
) -> Vec<ShapeDescriptor> {
    let owner = host.id_of(node).unwrap_or_default();
    let mut shapes = Vec::new();
    collect_shapes(host, node, flattener, &owner, &mut shapes);
    shapes
}

fn collect_shapes<H: HostTree>(
    host: &H,
    node: H::Node,
    flattener: &dyn PathFlattener,
    owner: &str,
    shapes: &mut Vec<ShapeDescriptor>,
) {
    for child in host.children(node) {
        let tag = host.tag_name(child);
        let shape = match tag.as_str() {
            "polygon" => {
                let points = host.attribute(child, "points").unwrap_or_default();
                parse_points(&points).map(|vertices| ShapeDescriptor::Polygon { vertices })
            }
            "circle" => match host.attribute(child, "r").as_deref().and_then(parse_leading_float) {
                Some(radius) if radius > 0.0 => Ok(ShapeDescriptor::Circle { radius }),
                _ => Err("circle has no positive radius".to_string()),
            },
            "path" => {
                let data = host.attribute(child, "d").unwrap_or_default();
                match flattener.flatten(&data) {
                    Ok(vertices) if !vertices.is_empty() => Ok(ShapeDescriptor::Polygon { vertices }),
                    Ok(_) => Err("path has no vertices".to_string()),
                    Err(err) => Err(err.to_string()),
                }
            }
            "g" => {
                collect_shapes(host, child, flattener, owner, shapes);
                continue;
            }
            t if NON_DRAWING_TAGS.contains(&t) => {
                trace!(element = owner, tag = t, "non-drawing child ignored");
                continue;
            }
            other => Err(format!("unrecognized primitive <{}>", other)),
        };

        match shape {
            Ok(shape) => shapes.push(shape),
            Err(reason) => warn!(element = owner, tag = %tag, %reason, "vector primitive skipped"),
        }
    }
}
