use crate::host::{HostTree, StyleProperty, Viewport};
use crate::math::{Rect, Vector2};
use std::collections::HashMap;

/// Handle to a node of a [`MemoryDocument`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Description of an element to insert into a [`MemoryDocument`]
#[derive(Debug, Clone, Default)]
pub struct ElementSpec {
    tag: String,
    attributes: Vec<(String, String)>,
    inline: HashMap<String, String>,
    computed: HashMap<String, String>,
    rect: Rect,
    bbox: Option<Rect>,
}

impl ElementSpec {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    /// Sets an inline style declaration
    pub fn style(mut self, property: &str, value: &str) -> Self {
        self.inline.insert(property.to_string(), value.to_string());
        self
    }

    /// Sets a computed style value
    pub fn computed(mut self, property: &str, value: &str) -> Self {
        self.computed.insert(property.to_string(), value.to_string());
        self
    }

    pub fn rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    pub fn bbox(mut self, bbox: Rect) -> Self {
        self.bbox = Some(bbox);
        self
    }
}

#[derive(Debug)]
struct NodeData {
    spec: ElementSpec,
    children: Vec<NodeId>,
}

/// A headless element tree.
///
/// Layout is whatever the caller says it is: rects and computed styles are
/// stored as given and never recomputed from style writes.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    nodes: Vec<NodeData>,
    roots: Vec<NodeId>,
    metas: HashMap<String, String>,
    viewport: Viewport,
    style_writes: usize,
}

impl MemoryDocument {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    /// Adds a `<meta name=.. content=..>` declaration
    pub fn add_meta(&mut self, name: &str, content: &str) {
        self.metas.insert(name.to_string(), content.to_string());
    }

    /// Appends an element under `parent`, or at the top level
    pub fn append(&mut self, parent: Option<NodeId>, spec: ElementSpec) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            spec,
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        self.nodes[node.0].spec.rect = rect;
    }

    pub fn set_computed(&mut self, node: NodeId, property: &str, value: &str) {
        self.nodes[node.0]
            .spec
            .computed
            .insert(property.to_string(), value.to_string());
    }

    /// Current inline style value, including values written by `set_style`
    pub fn style(&self, node: NodeId, property: StyleProperty) -> Option<&str> {
        self.nodes[node.0]
            .spec
            .inline
            .get(property.as_css())
            .map(String::as_str)
    }

    /// Number of `set_style` calls so far
    pub fn style_writes(&self) -> usize {
        self.style_writes
    }

    /// All nodes in document (pre-)order
    fn document_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend(self.nodes[node.0].children.iter().rev().copied());
        }
        order
    }

    fn spec(&self, node: NodeId) -> &ElementSpec {
        &self.nodes[node.0].spec
    }
}

impl HostTree for MemoryDocument {
    type Node = NodeId;

    fn query_by_attribute(&self, attribute: &str) -> Vec<NodeId> {
        self.document_order()
            .into_iter()
            .filter(|node| self.attribute(*node, attribute).is_some())
            .collect()
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.document_order()
            .into_iter()
            .find(|node| self.attribute(*node, "id").as_deref() == Some(id))
    }

    fn meta_content(&self, name: &str) -> Option<String> {
        self.metas.get(name).cloned()
    }

    fn tag_name(&self, node: NodeId) -> String {
        self.spec(node).tag.clone()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.spec(node)
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }

    fn inline_style(&self, node: NodeId, property: &str) -> Option<String> {
        self.spec(node).inline.get(property).cloned()
    }

    fn computed_style(&self, node: NodeId, property: &str) -> Option<String> {
        self.spec(node).computed.get(property).cloned()
    }

    fn bounding_rect(&self, node: NodeId) -> Rect {
        self.spec(node).rect
    }

    fn bbox(&self, node: NodeId) -> Option<Rect> {
        self.spec(node).bbox
    }

    fn offset_size(&self, node: NodeId) -> Vector2 {
        self.spec(node).rect.size()
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes[node.0].children.clone()
    }

    fn set_style(&mut self, node: NodeId, property: StyleProperty, value: &str) {
        self.style_writes += 1;
        self.nodes[node.0]
            .spec
            .inline
            .insert(property.as_css().to_string(), value.to_string());
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }
}
