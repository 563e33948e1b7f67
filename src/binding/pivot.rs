use crate::engine::{PhysicsEngine, SimObject};
use crate::math::{mean, Aabb, Vector2};

use std::fmt;
use tracing::warn;

/// Bounding box over every vertex of every sub-body.
///
/// Sub-bodies without vertices are skipped. `None` when no vertex exists at all.
pub fn bounds<E: PhysicsEngine>(engine: &E, object: SimObject) -> Option<Aabb> {
    let mut bounds: Option<Aabb> = None;

    for handle in engine.all_bodies(object) {
        let Some(body_bounds) = engine
            .body(handle)
            .and_then(|state| Aabb::from_points(&state.vertices))
        else {
            warn!(?handle, "body has no vertices, left out of the bounding box");
            continue;
        };

        bounds = Some(match bounds {
            Some(b) => b.union(&body_bounds),
            None => body_bounds,
        });
    }

    bounds
}

/// Minimum x and minimum y over all vertices
pub fn north_west<E: PhysicsEngine>(engine: &E, object: SimObject) -> Option<Vector2> {
    bounds(engine, object).map(|b| b.min)
}

/// Unweighted average of the sub-body positions
pub fn centroid<E: PhysicsEngine>(engine: &E, object: SimObject) -> Option<Vector2> {
    mean(
        engine
            .all_bodies(object)
            .into_iter()
            .filter_map(|handle| engine.body(handle))
            .map(|state| state.position),
    )
}

/// Vector from the centroid to the bounding box's top-left corner.
///
/// A composite has no single centre, so the unweighted mean of its sub-body
/// positions stands in for one. The offset is measured once, at build time,
/// and replayed on every sync.
pub fn pivot_offset<E: PhysicsEngine>(engine: &E, object: SimObject) -> Option<Vector2> {
    let corner = north_west(engine, object)?;
    let centre = centroid(engine, object)?;
    Some(corner - centre)
}

/// A CSS `transform-origin` in percent of the element's own box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformOrigin {
    pub x_percent: f32,
    pub y_percent: f32,
}

impl TransformOrigin {
    /// Places the rotation origin `|offset|` away from the box's top-left corner.
    ///
    /// An axis of zero size falls back to the middle of that axis.
    pub fn from_offset(offset: Vector2, box_size: Vector2) -> Self {
        Self {
            x_percent: axis_percent(offset.x, box_size.x),
            y_percent: axis_percent(offset.y, box_size.y),
        }
    }
}

fn axis_percent(offset: f32, size: f32) -> f32 {
    let percent = (100.0 / (size / offset)).abs();
    if percent.is_finite() {
        percent
    } else {
        50.0
    }
}

impl fmt::Display for TransformOrigin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}% {}%", self.x_percent, self.y_percent)
    }
}
