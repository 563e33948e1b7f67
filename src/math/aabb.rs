use crate::math::Vector2;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Axis-aligned bounding box in 2D page/world space
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner (the north-west corner, since y points down)
    pub min: Vector2,

    /// Maximum corner
    pub max: Vector2,
}

impl Aabb {
    /// Creates a new AABB from minimum and maximum points
    #[inline]
    pub fn new(min: Vector2, max: Vector2) -> Self {
        Self { min, max }
    }

    /// Creates an AABB from a set of points
    pub fn from_points(points: &[Vector2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;

        let mut aabb = Self::new(*first, *first);
        for point in rest {
            aabb.expand_to_include_point(*point);
        }
        Some(aabb)
    }

    /// Returns the union of this AABB with another
    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(&other.min),
            max: self.max.max(&other.max),
        }
    }

    /// Expands this AABB to include a point
    #[inline]
    pub fn expand_to_include_point(&mut self, point: Vector2) {
        self.min = self.min.min(&point);
        self.max = self.max.max(&point);
    }
}

/// A box-model rectangle as reported by the host (left/top plus size)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[inline]
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }

    /// Top-left corner
    #[inline]
    pub fn origin(&self) -> Vector2 {
        Vector2::new(self.left, self.top)
    }

    #[inline]
    pub fn size(&self) -> Vector2 {
        Vector2::new(self.width, self.height)
    }

    #[inline]
    pub fn center(&self) -> Vector2 {
        Vector2::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}
