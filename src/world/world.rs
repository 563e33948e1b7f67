use crate::engine::{BodyHandle, BodyOptions, BodyState, CompositeHandle, PhysicsEngine, SimObject};
use crate::math::{polygon_centroid, Vector2};
use crate::world::body::KinematicBody;
use crate::world::events::{EventQueue, WorldEvent, WorldEventType};
use crate::world::storage::{BodyStorage, CompositeStorage, Storage};
use crate::world::WorldConfig;
use crate::Result;

use std::f32::consts::PI;
use tracing::{debug, trace};

/// Reference 2D world: builds hulls the way a vertex-based engine does and
/// integrates velocities, without collision response.
pub struct KinematicWorld {
    /// Bodies created and not yet removed from the world
    bodies: BodyStorage<KinematicBody>,

    /// Composites created and not yet removed from the world
    composites: CompositeStorage,

    /// Top-level objects currently in the world, in insertion order
    objects: Vec<SimObject>,

    config: WorldConfig,

    events: EventQueue,

    /// The total elapsed simulation time
    time: f32,

    running: bool,
    renderer_running: bool,
}

impl KinematicWorld {
    /// Creates a new world with default settings
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Creates a new world with the given configuration
    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            bodies: BodyStorage::new(),
            composites: CompositeStorage::new(),
            objects: Vec::new(),
            config,
            events: EventQueue::new(),
            time: 0.0,
            running: false,
            renderer_running: false,
        }
    }

    /// Returns the current simulation time
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Whether `run` has started the simulation clock
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_renderer_running(&self) -> bool {
        self.renderer_running
    }

    /// Gets a reference to a body by its handle
    pub fn get_body(&self, handle: BodyHandle) -> Result<&KinematicBody> {
        self.bodies.get_body(handle)
    }

    /// Gets a mutable reference to a body by its handle
    pub fn get_body_mut(&mut self, handle: BodyHandle) -> Result<&mut KinematicBody> {
        self.bodies.get_body_mut(handle)
    }

    /// Whether a top-level object is currently in the world
    pub fn contains(&self, object: SimObject) -> bool {
        self.objects.contains(&object)
    }

    /// Top-level objects currently in the world
    pub fn objects(&self) -> &[SimObject] {
        &self.objects
    }

    /// Handles of every body reachable from the world
    pub fn bodies_in_world(&self) -> Vec<BodyHandle> {
        self.objects
            .iter()
            .flat_map(|object| self.all_bodies(*object))
            .collect()
    }

    /// Number of bodies reachable from the world
    pub fn world_body_count(&self) -> usize {
        self.bodies_in_world().len()
    }

    /// Number of bodies held in storage
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Returns a reference to the event queue
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Returns a mutable reference to the event queue
    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    /// Number of sides used to approximate a circle of `radius`
    pub fn circle_sides(&self, radius: f32) -> u32 {
        let min = self.config.circle_min_sides as f32;
        let max = self.config.circle_max_sides as f32;
        radius.min(max).max(min).ceil() as u32
    }

    fn insert_body(&mut self, position: Vector2, vertices: Vec<Vector2>, options: &BodyOptions) -> BodyHandle {
        let body = KinematicBody::new(position, vertices, options);
        let handle = self.bodies.add(body);
        trace!(?handle, %position, "body created");
        handle
    }

    /// Performs a single fixed step
    fn step_simulation(&mut self, dt: f32) {
        let gravity = self.config.gravity;
        for handle in self.bodies_in_world() {
            if let Some(body) = self.bodies.get_mut(handle) {
                body.integrate(gravity, dt);
            }
        }
    }
}

impl Default for KinematicWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsEngine for KinematicWorld {
    fn create_rectangle(
        &mut self,
        position: Vector2,
        width: f32,
        height: f32,
        options: &BodyOptions,
    ) -> BodyHandle {
        let half = Vector2::new(width / 2.0, height / 2.0);
        let vertices = vec![
            Vector2::new(position.x - half.x, position.y - half.y),
            Vector2::new(position.x + half.x, position.y - half.y),
            Vector2::new(position.x + half.x, position.y + half.y),
            Vector2::new(position.x - half.x, position.y + half.y),
        ];
        self.insert_body(position, vertices, options)
    }

    fn create_from_vertices(
        &mut self,
        position: Vector2,
        vertices: &[Vector2],
        options: &BodyOptions,
    ) -> BodyHandle {
        let placed = match polygon_centroid(vertices) {
            Some(centre) => vertices.iter().map(|v| *v - centre + position).collect(),
            None => Vec::new(),
        };
        self.insert_body(position, placed, options)
    }

    fn create_circle(&mut self, position: Vector2, radius: f32, options: &BodyOptions) -> BodyHandle {
        let sides = self.circle_sides(radius);
        let theta = 2.0 * PI / sides as f32;
        let offset = theta * 0.5;

        let vertices = (0..sides)
            .map(|i| {
                let angle = offset + i as f32 * theta;
                Vector2::new(position.x + angle.cos() * radius, position.y + angle.sin() * radius)
            })
            .collect();
        self.insert_body(position, vertices, options)
    }

    fn create_composite(&mut self) -> CompositeHandle {
        self.composites.add(Vec::new())
    }

    fn add_to_composite(&mut self, composite: CompositeHandle, body: BodyHandle) {
        if let Some(members) = self.composites.get_mut(composite) {
            members.push(body);
        }
    }

    fn add_to_world(&mut self, object: SimObject) {
        if self.objects.contains(&object) {
            return;
        }
        self.objects.push(object);
        self.events.push(WorldEvent {
            event_type: WorldEventType::Added,
            object,
        });
        debug!(?object, "added to world");
    }

    /// Takes an object out of the world and frees its storage. Handles of
    /// the removed bodies no longer resolve afterwards.
    fn remove_from_world(&mut self, object: SimObject) {
        let before = self.objects.len();
        self.objects.retain(|o| *o != object);
        if self.objects.len() == before {
            return;
        }

        match object {
            SimObject::Body(handle) => {
                self.bodies.remove(handle);
            }
            SimObject::Composite(handle) => {
                for body in self.composites.remove(handle).unwrap_or_default() {
                    self.bodies.remove(body);
                }
            }
        }

        self.events.push(WorldEvent {
            event_type: WorldEventType::Removed,
            object,
        });
        debug!(?object, "removed from world");
    }

    fn all_bodies(&self, object: SimObject) -> Vec<BodyHandle> {
        match object {
            SimObject::Body(handle) => {
                if self.bodies.get(handle).is_some() {
                    vec![handle]
                } else {
                    Vec::new()
                }
            }
            SimObject::Composite(handle) => self.composites.get(handle).cloned().unwrap_or_default(),
        }
    }

    fn body(&self, handle: BodyHandle) -> Option<BodyState> {
        self.bodies.get(handle).map(KinematicBody::state)
    }

    fn run(&mut self) {
        self.running = true;
    }

    fn run_renderer(&mut self) {
        self.renderer_running = true;
    }

    fn update(&mut self, delta: f32) {
        // events from the previous update
        self.events.clear();

        if !self.running {
            return;
        }

        let fixed_step = self.config.time_step;
        let max_steps = self.config.max_substeps;

        let mut remaining_time = delta;
        let mut steps = 0;

        while remaining_time > 0.0 && steps < max_steps {
            let dt = fixed_step.min(remaining_time);
            self.step_simulation(dt);
            remaining_time -= dt;
            steps += 1;
        }

        self.time += delta;
    }
}
