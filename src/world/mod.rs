mod body;
mod config;
mod events;
mod storage;
#[allow(clippy::module_inception)]
mod world;

pub use self::body::{body_flags, KinematicBody};
pub use self::config::WorldConfig;
pub use self::events::{EventQueue, WorldEvent, WorldEventType};
pub use self::storage::{BodyStorage, CompositeStorage, Storage};
pub use self::world::KinematicWorld;
