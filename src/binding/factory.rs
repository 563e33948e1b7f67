use crate::binding::geometry::ShapeDescriptor;
use crate::engine::{BodyHandle, BodyOptions, CompositeHandle, PhysicsEngine, SimObject};
use crate::math::Vector2;

use tracing::{debug, warn};

/// A freshly built, not yet inserted, simulation object
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BuiltBody {
    Primitive {
        body: BodyHandle,
    },
    Composite {
        composite: CompositeHandle,

        /// First sub-body built; the rotation reference
        pivot: Option<BodyHandle>,
    },
}

impl BuiltBody {
    pub fn object(&self) -> SimObject {
        match self {
            BuiltBody::Primitive { body } => SimObject::Body(*body),
            BuiltBody::Composite { composite, .. } => SimObject::Composite(*composite),
        }
    }
}

/// Asks the engine for bodies matching shape descriptors
pub struct BodyFactory<'e, E: PhysicsEngine> {
    engine: &'e mut E,
}

impl<'e, E: PhysicsEngine> BodyFactory<'e, E> {
    pub fn new(engine: &'e mut E) -> Self {
        Self { engine }
    }

    /// Builds one body for a shape, centred on `center`
    pub fn build_shape(&mut self, center: Vector2, shape: &ShapeDescriptor, options: &BodyOptions) -> BodyHandle {
        match shape {
            ShapeDescriptor::Rectangle { width, height } => {
                self.engine.create_rectangle(center, *width, *height, options)
            }
            ShapeDescriptor::Polygon { vertices } => {
                self.engine.create_from_vertices(center, vertices, options)
            }
            ShapeDescriptor::Circle { radius } => {
                self.engine.create_circle(center, *radius, options)
            }
        }
    }

    /// Builds a single rectangle body
    pub fn build_primitive(&mut self, center: Vector2, width: f32, height: f32, options: &BodyOptions) -> BuiltBody {
        let body = self.build_shape(center, &ShapeDescriptor::Rectangle { width, height }, options);
        BuiltBody::Primitive { body }
    }

    /// Builds one sub-body per shape, all anchored at `center`, grouped in a composite
    pub fn build_composite(&mut self, center: Vector2, shapes: &[ShapeDescriptor], options: &BodyOptions) -> BuiltBody {
        let composite = self.engine.create_composite();
        let mut pivot = None;

        for shape in shapes {
            let body = self.build_shape(center, shape, options);
            pivot.get_or_insert(body);
            self.engine.add_to_composite(composite, body);
        }

        if pivot.is_none() {
            warn!(?composite, "composite built without any sub-body");
        }

        BuiltBody::Composite { composite, pivot }
    }

    /// Swaps `previous` for `built` in the world. The old object leaves the
    /// world before the new one enters.
    pub fn install(&mut self, previous: Option<SimObject>, built: &BuiltBody) {
        if let Some(previous) = previous {
            self.engine.remove_from_world(previous);
        }
        let object = built.object();
        self.engine.add_to_world(object);
        debug!(?object, replaced = ?previous, "body installed");
    }

    /// Read access to the engine, for measuring what was just built
    pub fn engine(&self) -> &E {
        self.engine
    }
}
