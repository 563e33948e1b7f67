pub mod math;
pub mod engine;
pub mod world;
pub mod host;
pub mod binding;

/// Re-export common types for easier usage
pub use crate::binding::{
    BindingConfig, BindingRecord, BodyKind, Controller, ControllerState, ElementBodyRegistry,
    RuleSet, ShapeDescriptor,
};
pub use crate::engine::{BodyHandle, BodyOptions, CompositeHandle, PhysicsEngine, SimObject};
pub use crate::host::{HostTree, MemoryDocument, StyleProperty, Viewport};
pub use crate::math::Vector2;
pub use crate::world::{KinematicWorld, WorldConfig};

/// Error types for the binding layer
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum BindingError {
        #[error("Unknown physics classification: {0}")]
        UnknownClassification(String),

        #[error("Element is not tracked: {0}")]
        NotTracked(String),

        #[error("Unsupported length unit: {0}")]
        UnsupportedUnit(String),

        #[error("Malformed length: {0}")]
        MalformedLength(String),

        #[error("Malformed geometry on {element}: {reason}")]
        MalformedGeometry { element: String, reason: String },

        #[error("Element not found: {0}")]
        ElementNotFound(String),

        #[error("Failed to fetch physics rules: {0}")]
        RuleFetch(String),

        #[error("Failed to parse physics rules: {0}")]
        RuleParse(#[from] serde_json::Error),

        #[error("Invalid state: {0}")]
        InvalidState(String),

        #[error("Resource not found: {0}")]
        ResourceNotFound(String),
    }
}

/// Result type for binding operations
pub type Result<T> = std::result::Result<T, error::BindingError>;

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
