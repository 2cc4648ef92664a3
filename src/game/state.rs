// Game session state machine

/// Where the session is in its level cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    /// No level loaded
    #[default]
    Idle,
    /// Level in play; the loop ticks
    Running,
    /// Every enemy is gone
    LevelComplete,
    /// Out of ammo with enemies left
    GameOver,
}

impl GameState {
    /// Check if the frame loop should tick the world
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Check if `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: GameState) -> bool {
        use GameState::*;
        match (self, next) {
            (_, Idle) => true,
            (Idle, Running) => true,
            (Running, LevelComplete | GameOver) => true,
            (LevelComplete | GameOver, Running) => true,
            _ => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::LevelComplete => "level_complete",
            Self::GameOver => "game_over",
        }
    }
}

/// Tracks the session state and how long it has been held
#[derive(Debug, Default)]
pub struct GameStateMachine {
    current_state: GameState,
    state_time: f32,
}

impl GameStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GameState {
        self.current_state
    }

    /// Seconds of simulation spent in the current state
    pub fn state_time(&self) -> f32 {
        self.state_time
    }

    /// Move to `next` if the transition is legal
    ///
    /// Returns false, leaving the state untouched, for an illegal or
    /// same-state transition.
    pub fn transition(&mut self, next: GameState) -> bool {
        if self.current_state == next || !self.current_state.can_transition_to(next) {
            return false;
        }
        log::debug!(
            "Game state {} -> {}",
            self.current_state.name(),
            next.name()
        );
        self.current_state = next;
        self.state_time = 0.0;
        true
    }

    /// Reset the timer without changing state (level retried while running)
    pub fn restart_state(&mut self) {
        self.state_time = 0.0;
    }

    pub fn update(&mut self, dt: f32) {
        self.state_time += dt;
    }
}
