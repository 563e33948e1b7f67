use crate::engine::{BodyOptions, BodyState};
use crate::math::Vector2;

/// Flags for controlling body behavior
pub mod body_flags {
    use bitflags::bitflags;

    bitflags! {
        /// Flags for controlling the behavior of kinematic bodies
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct BodyFlags: u32 {
            /// Body never moves
            const STATIC = 0x01;

            /// Body is affected by gravity
            const AFFECTED_BY_GRAVITY = 0x02;
        }
    }
}

use body_flags::BodyFlags;

/// A rigid body with a world-space vertex hull, moved by its velocities only
#[derive(Debug, Clone)]
pub struct KinematicBody {
    position: Vector2,
    angle: f32,
    linear_velocity: Vector2,
    angular_velocity: f32,

    /// Hull vertices in world space
    vertices: Vec<Vector2>,

    options: BodyOptions,
    flags: BodyFlags,
}

impl KinematicBody {
    /// Creates a body from world-space vertices around `position`, then
    /// applies the initial angle from `options`.
    pub fn new(position: Vector2, vertices: Vec<Vector2>, options: &BodyOptions) -> Self {
        let mut flags = BodyFlags::AFFECTED_BY_GRAVITY;
        if options.is_static {
            flags |= BodyFlags::STATIC;
        }

        let mut body = Self {
            position,
            angle: 0.0,
            linear_velocity: Vector2::zero(),
            angular_velocity: 0.0,
            vertices,
            options: options.clone(),
            flags,
        };
        body.set_angle(options.angle);
        body
    }

    pub fn position(&self) -> Vector2 {
        self.position
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn vertices(&self) -> &[Vector2] {
        &self.vertices
    }

    pub fn options(&self) -> &BodyOptions {
        &self.options
    }

    pub fn flags(&self) -> BodyFlags {
        self.flags
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(BodyFlags::STATIC)
    }

    pub fn linear_velocity(&self) -> Vector2 {
        self.linear_velocity
    }

    pub fn set_linear_velocity(&mut self, velocity: Vector2) {
        self.linear_velocity = velocity;
    }

    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    pub fn set_angular_velocity(&mut self, angular_velocity: f32) {
        self.angular_velocity = angular_velocity;
    }

    /// Sets whether gravity pulls on this body
    pub fn set_affected_by_gravity(&mut self, affected: bool) {
        self.flags.set(BodyFlags::AFFECTED_BY_GRAVITY, affected);
    }

    /// Moves the body so its centre is at `position`, carrying the hull along
    pub fn set_position(&mut self, position: Vector2) {
        let delta = position - self.position;
        for vertex in &mut self.vertices {
            *vertex += delta;
        }
        self.position = position;
    }

    /// Rotates the body about its centre to an absolute angle
    pub fn set_angle(&mut self, angle: f32) {
        let delta = angle - self.angle;
        if delta != 0.0 {
            let pivot = self.position;
            for vertex in &mut self.vertices {
                *vertex = vertex.rotate_about(pivot, delta);
            }
        }
        self.angle = angle;
    }

    /// Symplectic Euler: velocities first, then position and angle
    pub(crate) fn integrate(&mut self, gravity: Vector2, dt: f32) {
        if self.is_static() {
            return;
        }

        if self.flags.contains(BodyFlags::AFFECTED_BY_GRAVITY) {
            self.linear_velocity += gravity * dt;
        }

        let new_position = self.position + self.linear_velocity * dt;
        let new_angle = self.angle + self.angular_velocity * dt;

        self.set_position(new_position);
        self.set_angle(new_angle);
    }

    pub(crate) fn state(&self) -> BodyState {
        BodyState {
            position: self.position,
            angle: self.angle,
            vertices: self.vertices.clone(),
        }
    }
}
