// Engine modules: physics adapter, frame clock, deferred timers

pub mod game_loop;
pub mod physics;
pub mod timer;
