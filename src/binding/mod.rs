pub mod config;
pub mod controller;
pub mod factory;
pub mod geometry;
pub mod path;
pub mod pivot;
pub mod registry;
pub mod rules;
pub mod source;
pub mod sync;

pub use self::config::BindingConfig;
pub use self::controller::{Controller, ControllerState, ReadyEvent, RuleRequest};
pub use self::factory::{BodyFactory, BuiltBody};
pub use self::geometry::{BoxGeometry, ShapeDescriptor};
pub use self::path::{PathFlattener, SampledPathFlattener};
pub use self::pivot::TransformOrigin;
pub use self::registry::{BindingRecord, BodyKind, ElementBodyRegistry, RenderKind, TrackedElement};
pub use self::rules::{BaseProperties, Chamfer, RuleRecord, RuleSet, ShapeRuleResolver};
pub use self::source::{FsRuleSource, RuleSource, StaticRuleSource};
pub use self::sync::{Placement, SyncLoop};
