use crate::error::BindingError;
use crate::math::Vector2;
use crate::Result;

/// Most points a single curve segment is sampled into
pub const MAX_CURVE_SAMPLES: usize = 256;

/// Turns path data (`d` attribute) into an ordered point list
pub trait PathFlattener {
    fn flatten(&self, data: &str) -> Result<Vec<Vector2>>;
}

/// Flattens straight segments to their end points and samples curves every
/// `sample_length` pixels along their control polygon.
///
/// Supports `M L H V C S Q T Z` in absolute and relative form. Arcs are
/// rejected.
#[derive(Debug, Clone, Copy)]
pub struct SampledPathFlattener {
    pub sample_length: f32,
}

impl SampledPathFlattener {
    pub fn new(sample_length: f32) -> Self {
        Self { sample_length }
    }

    fn curve_samples(&self, control_polygon_length: f32) -> Result<usize> {
        if !control_polygon_length.is_finite() {
            return Err(malformed("curve extent is not finite".to_string()));
        }
        if self.sample_length <= 0.0 {
            return Ok(1);
        }
        let samples = (control_polygon_length / self.sample_length).ceil() as usize;
        Ok(samples.clamp(1, MAX_CURVE_SAMPLES))
    }
}

impl Default for SampledPathFlattener {
    fn default() -> Self {
        Self::new(15.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Command(char),
    Number(f32),
}

fn tokenize(data: &str) -> Result<Vec<Token>> {
    let bytes = data.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_whitespace() || c == ',' {
            i += 1;
        } else if c.is_ascii_alphabetic() && c != 'e' && c != 'E' {
            tokens.push(Token::Command(c));
            i += 1;
        } else if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' {
            let start = i;
            let mut seen_dot = false;
            let mut seen_exp = false;
            i += 1;
            if c == '.' {
                seen_dot = true;
            }
            while i < bytes.len() {
                let d = bytes[i] as char;
                if d.is_ascii_digit() {
                    i += 1;
                } else if d == '.' && !seen_dot && !seen_exp {
                    seen_dot = true;
                    i += 1;
                } else if (d == 'e' || d == 'E') && !seen_exp {
                    seen_exp = true;
                    i += 1;
                    if i < bytes.len() && (bytes[i] == b'-' || bytes[i] == b'+') {
                        i += 1;
                    }
                } else {
                    break;
                }
            }
            let number = data[start..i]
                .parse::<f32>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| malformed(format!("bad number `{}`", &data[start..i])))?;
            tokens.push(Token::Number(number));
        } else {
            return Err(malformed(format!("unexpected character `{}`", c)));
        }
    }

    Ok(tokens)
}

fn malformed(reason: String) -> BindingError {
    BindingError::MalformedGeometry {
        element: "path".to_string(),
        reason,
    }
}

fn cubic(p0: Vector2, p1: Vector2, p2: Vector2, p3: Vector2, t: f32) -> Vector2 {
    let u = 1.0 - t;
    p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
}

fn quadratic(p0: Vector2, p1: Vector2, p2: Vector2, t: f32) -> Vector2 {
    let u = 1.0 - t;
    p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
}

/// Pushes a point unless it repeats the previous one
fn push_point(points: &mut Vec<Vector2>, point: Vector2) {
    if points.last().map_or(true, |last| !crate::math::approx_zero(last.distance(&point))) {
        points.push(point);
    }
}

impl PathFlattener for SampledPathFlattener {
    fn flatten(&self, data: &str) -> Result<Vec<Vector2>> {
        let tokens = tokenize(data)?;
        let mut points = Vec::new();

        let mut current = Vector2::zero();
        let mut subpath_start = Vector2::zero();
        // reflected control point for S/T
        let mut last_cubic_control: Option<Vector2> = None;
        let mut last_quad_control: Option<Vector2> = None;

        let mut i = 0;
        let mut command: Option<char> = None;

        let take = |i: &mut usize, count: usize| -> Result<Vec<f32>> {
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                match tokens.get(*i) {
                    Some(Token::Number(n)) => values.push(*n),
                    _ => return Err(malformed("missing path argument".to_string())),
                }
                *i += 1;
            }
            Ok(values)
        };

        while i < tokens.len() {
            let cmd = match tokens[i] {
                Token::Command(c) => {
                    i += 1;
                    c
                }
                // implicit repetition of the previous command
                Token::Number(_) => match command {
                    Some('M') => 'L',
                    Some('m') => 'l',
                    Some(c) if c != 'Z' && c != 'z' => c,
                    _ => return Err(malformed("path data must start with a command".to_string())),
                },
            };
            command = Some(cmd);

            let relative = cmd.is_ascii_lowercase();
            let base = if relative { current } else { Vector2::zero() };
            let point = |x: f32, y: f32| Vector2::new(base.x + x, base.y + y);

            match cmd.to_ascii_uppercase() {
                'M' => {
                    let v = take(&mut i, 2)?;
                    current = point(v[0], v[1]);
                    subpath_start = current;
                    push_point(&mut points, current);
                    last_cubic_control = None;
                    last_quad_control = None;
                }
                'L' => {
                    let v = take(&mut i, 2)?;
                    current = point(v[0], v[1]);
                    push_point(&mut points, current);
                    last_cubic_control = None;
                    last_quad_control = None;
                }
                'H' => {
                    let v = take(&mut i, 1)?;
                    current = Vector2::new(if relative { current.x + v[0] } else { v[0] }, current.y);
                    push_point(&mut points, current);
                    last_cubic_control = None;
                    last_quad_control = None;
                }
                'V' => {
                    let v = take(&mut i, 1)?;
                    current = Vector2::new(current.x, if relative { current.y + v[0] } else { v[0] });
                    push_point(&mut points, current);
                    last_cubic_control = None;
                    last_quad_control = None;
                }
                'C' | 'S' => {
                    let (c1, c2, end) = if cmd.to_ascii_uppercase() == 'C' {
                        let v = take(&mut i, 6)?;
                        (point(v[0], v[1]), point(v[2], v[3]), point(v[4], v[5]))
                    } else {
                        let v = take(&mut i, 4)?;
                        let c1 = last_cubic_control.map_or(current, |c| current * 2.0 - c);
                        (c1, point(v[0], v[1]), point(v[2], v[3]))
                    };
                    let length = current.distance(&c1) + c1.distance(&c2) + c2.distance(&end);
                    let samples = self.curve_samples(length)?;
                    for s in 1..=samples {
                        push_point(&mut points, cubic(current, c1, c2, end, s as f32 / samples as f32));
                    }
                    current = end;
                    last_cubic_control = Some(c2);
                    last_quad_control = None;
                }
                'Q' | 'T' => {
                    let (control, end) = if cmd.to_ascii_uppercase() == 'Q' {
                        let v = take(&mut i, 4)?;
                        (point(v[0], v[1]), point(v[2], v[3]))
                    } else {
                        let v = take(&mut i, 2)?;
                        let control = last_quad_control.map_or(current, |c| current * 2.0 - c);
                        (control, point(v[0], v[1]))
                    };
                    let length = current.distance(&control) + control.distance(&end);
                    let samples = self.curve_samples(length)?;
                    for s in 1..=samples {
                        push_point(&mut points, quadratic(current, control, end, s as f32 / samples as f32));
                    }
                    current = end;
                    last_quad_control = Some(control);
                    last_cubic_control = None;
                }
                'Z' => {
                    current = subpath_start;
                    last_cubic_control = None;
                    last_quad_control = None;
                }
                'A' => return Err(malformed("arc segments are not supported".to_string())),
                other => return Err(malformed(format!("unknown path command `{}`", other))),
            }
        }

        // a closed loop ends on its first point; the hull closes itself
        if points.len() > 1 {
            if let (Some(first), Some(last)) = (points.first(), points.last()) {
                if crate::math::approx_zero(first.distance(last)) {
                    points.pop();
                }
            }
        }

        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_segments() {
        let flattener = SampledPathFlattener::default();
        let points = flattener.flatten("M0,0 L10,0 L10,10 L0,10 Z").unwrap();
        assert_eq!(
            points,
            vec![
                Vector2::new(0.0, 0.0),
                Vector2::new(10.0, 0.0),
                Vector2::new(10.0, 10.0),
                Vector2::new(0.0, 10.0),
            ]
        );
    }

    #[test]
    fn test_relative_and_implicit_commands() {
        let flattener = SampledPathFlattener::default();
        let points = flattener.flatten("m 5 5 10 0 v 10 h -10 z").unwrap();
        assert_eq!(
            points,
            vec![
                Vector2::new(5.0, 5.0),
                Vector2::new(15.0, 5.0),
                Vector2::new(15.0, 15.0),
                Vector2::new(5.0, 15.0),
            ]
        );
    }

    #[test]
    fn test_curve_is_sampled() {
        let flattener = SampledPathFlattener::new(5.0);
        let points = flattener.flatten("M0 0 Q 10 20 20 0").unwrap();
        // control polygon is ~44.7px long, so 9 samples plus the start point
        assert_eq!(points.len(), 10);
        assert_eq!(points.last().copied(), Some(Vector2::new(20.0, 0.0)));
    }

    #[test]
    fn test_huge_curve_sample_count_is_capped() {
        let flattener = SampledPathFlattener::default();
        let points = flattener.flatten("M0 0 Q 1e30 0 0 0").unwrap();
        assert!(points.len() <= MAX_CURVE_SAMPLES + 1);
    }

    #[test]
    fn test_non_finite_geometry_is_rejected() {
        let flattener = SampledPathFlattener::default();
        // control polygon length overflows f32
        assert!(matches!(
            flattener.flatten("M 3e38 0 Q -3e38 0 0 0"),
            Err(BindingError::MalformedGeometry { .. })
        ));
        // number literal overflows f32
        assert!(matches!(
            flattener.flatten("M0 0 Q 1e39 0 0 0"),
            Err(BindingError::MalformedGeometry { .. })
        ));
    }

    #[test]
    fn test_arc_is_rejected() {
        let flattener = SampledPathFlattener::default();
        assert!(flattener.flatten("M0 0 A 5 5 0 0 1 10 0").is_err());
    }
}
