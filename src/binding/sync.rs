use crate::binding::pivot;
use crate::binding::registry::{BindingRecord, BodyKind, ElementBodyRegistry, TrackedElement};
use crate::engine::{PhysicsEngine, SimObject};
use crate::host::{HostTree, StyleProperty};
use crate::math::to_degrees;

use tracing::trace;

/// Where an element has to be drawn for the current simulation state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Page-space left edge in pixels
    pub left: f32,

    /// Page-space top edge in pixels
    pub top: f32,

    /// Rotation in degrees
    pub rotation: f32,
}

impl Placement {
    /// Reads the placement of one bound element back from the engine
    pub fn read<E: PhysicsEngine, H: HostTree>(
        engine: &E,
        host: &H,
        node: H::Node,
        record: &BindingRecord,
    ) -> Option<Self> {
        match record.kind {
            BodyKind::Composite { composite, pivot, offset } => {
                let centre = pivot::centroid(engine, SimObject::Composite(composite))?;
                let offset = offset?;
                let pivot = engine.body(pivot?)?;
                Some(Self {
                    left: centre.x + offset.x,
                    top: centre.y + offset.y,
                    rotation: to_degrees(pivot.angle),
                })
            }
            BodyKind::Primitive { body } => {
                let state = engine.body(body)?;
                let size = host.offset_size(node);
                Some(Self {
                    left: state.position.x - size.x / 2.0,
                    top: state.position.y - size.y / 2.0,
                    rotation: to_degrees(state.angle),
                })
            }
        }
    }

    pub fn left_css(&self) -> String {
        format!("{}px", self.left)
    }

    pub fn top_css(&self) -> String {
        format!("{}px", self.top)
    }

    pub fn transform_css(&self) -> String {
        format!("rotateZ({}deg)", self.rotation)
    }

    /// Writes left, top and transform onto the element
    pub fn apply<H: HostTree>(&self, host: &mut H, node: H::Node) {
        host.set_style(node, StyleProperty::Left, &self.left_css());
        host.set_style(node, StyleProperty::Top, &self.top_css());
        host.set_style(node, StyleProperty::Transform, &self.transform_css());
    }
}

/// Per-step read-back of every enrolled element.
///
/// Runs unconditionally: no batching and no diffing against the previous step.
pub struct SyncLoop;

impl SyncLoop {
    /// Synchronises `elements` with their bodies; returns how many were written
    pub fn run<'a, E, H>(
        registry: &ElementBodyRegistry,
        elements: impl IntoIterator<Item = &'a TrackedElement<H::Node>>,
        engine: &E,
        host: &mut H,
    ) -> usize
    where
        E: PhysicsEngine,
        H: HostTree,
        H::Node: 'a,
    {
        let mut written = 0;
        for element in elements {
            let Some(record) = registry.get(&element.id) else {
                trace!(element = %element.id, "no binding yet");
                continue;
            };
            match Placement::read(engine, host, element.node, record) {
                Some(placement) => {
                    placement.apply(host, element.node);
                    written += 1;
                }
                None => trace!(element = %element.id, "body state unavailable"),
            }
        }
        written
    }
}
