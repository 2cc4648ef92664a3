// Game layer
//
// Everything above the physics adapter:
// - Entities, their registry and the per-level arena
// - Collision resolution and the entity lifecycle
// - Session state machine, aiming and ammo
// - Level data, configuration and presentation boundaries

pub mod aim;
pub mod ammo;
pub mod arena;
pub mod collision;
pub mod config;
pub mod entity;
pub mod error;
pub mod level;
mod lifecycle;
pub mod presentation;
pub mod registry;
pub mod session;
pub mod state;

// Re-export commonly used types
pub use aim::GameInput;
pub use config::GameConfig;
pub use entity::CannonModel;
pub use level::{builtin_levels, LevelData};
pub use presentation::{LogHud, LogScene};
pub use session::{Game, SessionEvent};
pub use state::GameState;
