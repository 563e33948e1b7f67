use crate::engine::{BodyHandle, CompositeHandle, SimObject};
use crate::math::Vector2;
use std::collections::HashMap;

/// How an element's geometry is turned into bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    /// Axis-aligned box
    Primitive,

    /// Vector container assembled from its shape primitives
    Composite,
}

impl RenderKind {
    /// Vector containers (`<svg>`) are composites, everything else a box
    pub fn from_tag(tag: &str) -> Self {
        if tag.eq_ignore_ascii_case("svg") {
            RenderKind::Composite
        } else {
            RenderKind::Primitive
        }
    }
}

/// An element discovered through the marker attribute
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedElement<N> {
    pub node: N,

    /// Stable `id` attribute; the registry key
    pub id: String,

    /// Marker attribute value; key into the rule set
    pub classification: String,

    pub kind: RenderKind,
}

/// The simulation side of a binding
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyKind {
    Primitive {
        body: BodyHandle,
    },
    Composite {
        composite: CompositeHandle,

        /// Sub-body whose angle drives the element's rotation
        pivot: Option<BodyHandle>,

        /// Centroid → top-left corner, measured at build time
        offset: Option<Vector2>,
    },
}

/// What an element is, physically
#[derive(Debug, Clone, PartialEq)]
pub struct BindingRecord {
    pub classification: String,
    pub kind: BodyKind,
}

impl BindingRecord {
    /// The object that was inserted into the world for this element
    pub fn object(&self) -> SimObject {
        match self.kind {
            BodyKind::Primitive { body } => SimObject::Body(body),
            BodyKind::Composite { composite, .. } => SimObject::Composite(composite),
        }
    }
}

/// Element id → binding record, one record per tracked element
#[derive(Debug, Clone, Default)]
pub struct ElementBodyRegistry {
    records: HashMap<String, BindingRecord>,
}

impl ElementBodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a record, handing back the one it replaced
    pub fn insert(&mut self, id: &str, record: BindingRecord) -> Option<BindingRecord> {
        self.records.insert(id.to_string(), record)
    }

    pub fn get(&self, id: &str) -> Option<&BindingRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BindingRecord)> {
        self.records.iter().map(|(id, record)| (id.as_str(), record))
    }
}
