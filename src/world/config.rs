use crate::math::Vector2;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Configuration parameters for the reference world
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct WorldConfig {
    /// The fixed time step for the simulation
    pub time_step: f32,

    /// The maximum number of substeps per `update` call
    pub max_substeps: u32,

    /// Gravitational acceleration in px/s² (screen space, y down)
    pub gravity: Vector2,

    /// Fewest sides a circle approximation may have
    pub circle_min_sides: u32,

    /// Most sides a circle approximation may have
    pub circle_max_sides: u32,
}

impl WorldConfig {
    /// Same as the default but with gravity switched off
    pub fn weightless() -> Self {
        Self {
            gravity: Vector2::zero(),
            ..Self::default()
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            time_step: 1.0 / 60.0,
            max_substeps: 10,
            gravity: Vector2::new(0.0, 980.0),
            circle_min_sides: 10,
            circle_max_sides: 25,
        }
    }
}
