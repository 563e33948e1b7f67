use crate::math::Vector2;
use serde_json::{Map, Value};

/// A unique identifier for a body owned by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u32);

/// A unique identifier for a composite (a grouping of bodies) owned by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeHandle(pub u32);

/// Anything that can be inserted into or removed from the simulation world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimObject {
    Body(BodyHandle),
    Composite(CompositeHandle),
}

impl From<BodyHandle> for SimObject {
    fn from(handle: BodyHandle) -> Self {
        SimObject::Body(handle)
    }
}

impl From<CompositeHandle> for SimObject {
    fn from(handle: CompositeHandle) -> Self {
        SimObject::Composite(handle)
    }
}

/// Construction options handed to the engine for every body it builds
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BodyOptions {
    /// Corner rounding radius in pixels
    pub chamfer_radius: f32,

    /// Initial rotation in radians
    pub angle: f32,

    /// Static bodies never move
    pub is_static: bool,

    pub density: Option<f32>,
    pub mass: Option<f32>,
    pub friction: Option<f32>,
    pub friction_air: Option<f32>,
    pub friction_static: Option<f32>,
    pub restitution: Option<f32>,

    /// Engine-specific properties the binding layer passes through untouched
    pub extra: Map<String, Value>,
}

/// Read-only snapshot of a body's simulated state
#[derive(Debug, Clone, PartialEq)]
pub struct BodyState {
    /// Position of the body's centre in world space
    pub position: Vector2,

    /// Rotation in radians
    pub angle: f32,

    /// Hull vertices in world space
    pub vertices: Vec<Vector2>,
}

/// Operations the binding layer needs from a 2D physics engine.
///
/// Integration, collision response and constraint solving stay behind this
/// trait. [`crate::world::KinematicWorld`] is the in-crate implementation.
pub trait PhysicsEngine {
    /// Builds an axis-aligned rectangle body centred on `position`
    fn create_rectangle(
        &mut self,
        position: Vector2,
        width: f32,
        height: f32,
        options: &BodyOptions,
    ) -> BodyHandle;

    /// Builds a body from a vertex loop. The engine re-centres the vertices so
    /// the resulting body's centre sits at `position`.
    fn create_from_vertices(
        &mut self,
        position: Vector2,
        vertices: &[Vector2],
        options: &BodyOptions,
    ) -> BodyHandle;

    /// Builds a circle body centred on `position`
    fn create_circle(&mut self, position: Vector2, radius: f32, options: &BodyOptions) -> BodyHandle;

    /// Creates an empty composite
    fn create_composite(&mut self) -> CompositeHandle;

    /// Adds a body to a composite
    fn add_to_composite(&mut self, composite: CompositeHandle, body: BodyHandle);

    /// Inserts an object into the simulation world
    fn add_to_world(&mut self, object: SimObject);

    /// Removes an object from the simulation world
    fn remove_from_world(&mut self, object: SimObject);

    /// Every body of a composite (or the body itself), in insertion order
    fn all_bodies(&self, object: SimObject) -> Vec<BodyHandle>;

    /// Reads back a body's current state
    fn body(&self, handle: BodyHandle) -> Option<BodyState>;

    /// Starts the simulation clock
    fn run(&mut self);

    /// Starts the optional debug renderer
    fn run_renderer(&mut self) {}

    /// Advances the simulation by `delta` seconds
    fn update(&mut self, delta: f32);
}
