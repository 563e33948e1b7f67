mod memory;

pub use self::memory::{ElementSpec, MemoryDocument, NodeId};

use crate::math::{Rect, Vector2};
use std::fmt::Debug;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Current viewport size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// Style properties the binding layer mutates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleProperty {
    Left,
    Top,
    Transform,
    TransformOrigin,
    Position,
}

impl StyleProperty {
    /// The CSS property name
    pub fn as_css(&self) -> &'static str {
        match self {
            StyleProperty::Left => "left",
            StyleProperty::Top => "top",
            StyleProperty::Transform => "transform",
            StyleProperty::TransformOrigin => "transform-origin",
            StyleProperty::Position => "position",
        }
    }
}

/// The queryable, stylable element tree that geometry is read from and
/// positions are written back into
pub trait HostTree {
    /// Opaque node handle
    type Node: Copy + Eq + Debug;

    /// Every element carrying `attribute`, in document order
    fn query_by_attribute(&self, attribute: &str) -> Vec<Self::Node>;

    /// The element whose `id` attribute equals `id`
    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    /// Content of the metadata declaration named `name`
    fn meta_content(&self, name: &str) -> Option<String>;

    /// Lower-case tag name
    fn tag_name(&self, node: Self::Node) -> String;

    fn attribute(&self, node: Self::Node, name: &str) -> Option<String>;

    /// Value set directly on the element's style, if any
    fn inline_style(&self, node: Self::Node, property: &str) -> Option<String>;

    /// Resolved value of a style property
    fn computed_style(&self, node: Self::Node, property: &str) -> Option<String>;

    /// Page-space border box
    fn bounding_rect(&self, node: Self::Node) -> Rect;

    /// Bounding box of a vector container's drawn content, in its own user space
    fn bbox(&self, node: Self::Node) -> Option<Rect>;

    /// Rendered layout size (offset width/height)
    fn offset_size(&self, node: Self::Node) -> Vector2;

    /// Direct children, in document order
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    fn set_style(&mut self, node: Self::Node, property: StyleProperty, value: &str);

    fn viewport(&self) -> Viewport;

    /// The element's `id` attribute
    fn id_of(&self, node: Self::Node) -> Option<String> {
        self.attribute(node, "id")
    }
}
