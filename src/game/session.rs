// Game session
//
// Owns the level campaign and drives one arena at a time through the
// per-tick cycle: inputs, physics, snapshot sync, collision resolution,
// timers, culling, HUD, win check. Presentation happens only through the
// scene and HUD sinks the session was built with.

use log::{info, warn};
use std::collections::VecDeque;

use super::aim::{Aim, GameInput};
use super::ammo::{AmmoCount, AmmoCounter};
use super::arena::Arena;
use super::collision::CollisionResolver;
use super::config::GameConfig;
use super::entity::{CannonModel, EntityId};
use super::error::GameError;
use super::level::LevelData;
use super::presentation::{GameEvent, HudSink, HudSnapshot, SceneSink};
use super::state::{GameState, GameStateMachine};

/// Result of a fire attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    Fired(EntityId),
    /// No level in play
    NotRunning,
    /// Selected kind is empty but the other still has rounds
    OutOfAmmo,
    /// Nothing left to fire and enemies remain
    GameOver,
}

/// Summary of a cleared level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelOutcome {
    pub level_index: usize,
    pub ammo_used: AmmoCount,
    pub elapsed_secs: f32,
}

/// Session-level notifications, alongside the arena's entity events
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    LevelStarted { level_index: usize },
    LevelComplete(LevelOutcome),
    GameOver { level_index: usize },
    Entity(GameEvent),
}

pub struct Game {
    config: GameConfig,
    levels: Vec<LevelData>,
    cannon: CannonModel,
    arena: Option<Arena>,
    resolver: CollisionResolver,
    ammo: AmmoCounter,
    aim: Aim,
    state: GameStateMachine,
    level_index: usize,
    /// First id for the next arena, so ids stay unique across levels
    next_entity_id: EntityId,
    inputs: VecDeque<GameInput>,
    scene: Box<dyn SceneSink>,
    hud: Box<dyn HudSink>,
    events: Vec<SessionEvent>,
}

impl Game {
    pub fn new(
        config: GameConfig,
        levels: Vec<LevelData>,
        cannon: CannonModel,
        scene: Box<dyn SceneSink>,
        hud: Box<dyn HudSink>,
    ) -> Result<Self, GameError> {
        config.validate()?;
        if levels.is_empty() {
            return Err(GameError::InvalidLevel("no levels to play".to_string()));
        }
        for level in &levels {
            level.validate()?;
        }

        Ok(Self {
            resolver: CollisionResolver::new(&config),
            aim: Aim::new(&config.aim),
            config,
            levels,
            cannon,
            arena: None,
            ammo: AmmoCounter::default(),
            state: GameStateMachine::new(),
            level_index: 0,
            next_entity_id: EntityId(0),
            inputs: VecDeque::new(),
            scene,
            hud,
            events: Vec::new(),
        })
    }

    /// Tear down whatever is in play and build level `index` from scratch
    ///
    /// If the physics world cannot be built the session is left Idle.
    pub fn start_level(&mut self, index: usize) -> Result<(), GameError> {
        if index >= self.levels.len() {
            return Err(GameError::LevelIndex {
                index,
                count: self.levels.len(),
            });
        }

        self.teardown();
        self.inputs.clear();

        let level = &self.levels[index];
        let built = Arena::from_level(
            &self.config,
            level,
            self.cannon.clone(),
            self.next_entity_id,
        );
        let arena = match built {
            Ok(arena) => arena,
            Err(err) => {
                warn!("Level {} failed to start: {}", index + 1, err);
                self.state.transition(GameState::Idle);
                return Err(err);
            }
        };

        info!(
            "Starting level {}/{} ({}) with {} rocks and {} bombs",
            index + 1,
            self.levels.len(),
            level.difficulty,
            level.ammo.rock,
            level.ammo.bomb
        );

        self.ammo = AmmoCounter::new(level.ammo);
        self.arena = Some(arena);
        self.resolver = CollisionResolver::new(&self.config);
        self.aim.reset();
        self.level_index = index;

        if !self.state.transition(GameState::Running) {
            self.state.restart_state();
        }
        self.events.push(SessionEvent::LevelStarted { level_index: index });
        self.forward_events();
        self.push_hud();
        Ok(())
    }

    /// Advance to the following level, wrapping to the first after the last
    pub fn next_level(&mut self) -> Result<(), GameError> {
        let next = (self.level_index + 1) % self.levels.len();
        self.start_level(next)
    }

    pub fn retry_level(&mut self) -> Result<(), GameError> {
        self.start_level(self.level_index)
    }

    /// Back to the first level
    pub fn restart(&mut self) -> Result<(), GameError> {
        self.start_level(0)
    }

    /// Drop the level and go Idle
    pub fn quit(&mut self) {
        self.teardown();
        self.inputs.clear();
        self.state.transition(GameState::Idle);
        info!("Session stopped");
    }

    fn teardown(&mut self) {
        if let Some(mut arena) = self.arena.take() {
            self.next_entity_id = arena.registry().peek_next_id();
            arena.teardown();
            self.forward_arena_events(&mut arena);
        }
    }

    /// Queue an input for the next tick
    pub fn queue_input(&mut self, input: GameInput) {
        self.inputs.push_back(input);
    }

    /// Apply an input right away
    pub fn handle_input(&mut self, input: GameInput) {
        if !self.state.state().is_running() {
            return;
        }
        match input {
            GameInput::Fire => {
                self.fire();
                return;
            }
            GameInput::SwitchAmmo => self.aim.switch_ammo(),
            GameInput::AdjustElevation(delta) => self.aim.adjust_elevation(delta),
            GameInput::AdjustHeading(delta) => self.aim.adjust_heading(delta),
            GameInput::AdjustPower(delta) => self.aim.adjust_power(delta),
        }
        self.push_hud();
    }

    /// Fire the selected projectile from the muzzle
    pub fn fire(&mut self) -> FireOutcome {
        if !self.state.state().is_running() {
            return FireOutcome::NotRunning;
        }
        let Some(arena) = self.arena.as_mut() else {
            return FireOutcome::NotRunning;
        };

        let kind = self.aim.selected();
        if !self.ammo.try_consume(kind) {
            if self.ammo.is_exhausted() && arena.enemy_count() > 0 {
                info!(
                    "Out of ammo with {} enemies left, game over",
                    arena.enemy_count()
                );
                self.state.transition(GameState::GameOver);
                self.events.push(SessionEvent::GameOver {
                    level_index: self.level_index,
                });
                return FireOutcome::GameOver;
            }
            info!("No {}s left", kind.name());
            return FireOutcome::OutOfAmmo;
        }

        let launch = self.aim.launch();
        let id = arena.spawn_projectile(kind, launch);
        info!(
            "Fired {} {} at {:.0}° power {:.0} ({} left)",
            kind.name(),
            id,
            self.aim.elevation_deg(),
            self.aim.power(),
            self.ammo.remaining(kind)
        );
        self.forward_events();
        self.push_hud();
        FireOutcome::Fired(id)
    }

    /// Run one simulation tick of `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        if !self.state.state().is_running() {
            return;
        }

        while let Some(input) = self.inputs.pop_front() {
            self.handle_input(input);
            if !self.state.state().is_running() {
                self.inputs.clear();
                return;
            }
        }

        let Some(arena) = self.arena.as_mut() else {
            return;
        };
        arena.step(dt);
        arena.sync_snapshots();
        arena.advance_clock(dt);
        self.resolver.resolve(arena);
        arena.process_timers();
        arena.cull_out_of_bounds();

        self.state.update(dt);
        self.forward_events();
        self.push_hud();
        self.check_level_complete();
    }

    fn check_level_complete(&mut self) {
        let cleared = self.arena.as_ref().is_some_and(|a| a.enemy_count() == 0);
        // Time spent Running, read before the transition resets it
        let elapsed_secs = self.state.state_time();
        if !cleared || !self.state.transition(GameState::LevelComplete) {
            return;
        }

        let outcome = LevelOutcome {
            level_index: self.level_index,
            ammo_used: self.ammo.used_counts(),
            elapsed_secs,
        };
        info!(
            "Level {} complete in {:.1}s using {} rocks and {} bombs",
            outcome.level_index + 1,
            outcome.elapsed_secs,
            outcome.ammo_used.rock,
            outcome.ammo_used.bomb
        );
        self.events.push(SessionEvent::LevelComplete(outcome));
    }

    fn forward_events(&mut self) {
        if let Some(mut arena) = self.arena.take() {
            self.forward_arena_events(&mut arena);
            self.arena = Some(arena);
        }
    }

    fn forward_arena_events(&mut self, arena: &mut Arena) {
        for event in arena.drain_events() {
            match &event {
                GameEvent::Spawned { id, kind, position } => {
                    self.scene.add_visual(*id, *kind, *position)
                }
                GameEvent::Removed { id, .. } => self.scene.remove_visual(*id),
                _ => {}
            }
            self.events.push(SessionEvent::Entity(event));
        }
    }

    pub fn hud_snapshot(&self) -> HudSnapshot {
        HudSnapshot {
            ammo_remaining: self.ammo.remaining_counts(),
            aim_angle_deg: self.aim.elevation_deg(),
            aim_power: self.aim.power(),
            selected: self.aim.selected(),
        }
    }

    fn push_hud(&mut self) {
        let snapshot = self.hud_snapshot();
        self.hud.update(&snapshot);
    }

    /// Take every event raised since the last drain
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn state(&self) -> GameState {
        self.state.state()
    }

    pub fn level_index(&self) -> usize {
        self.level_index
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn enemy_count(&self) -> usize {
        self.arena.as_ref().map_or(0, Arena::enemy_count)
    }

    pub fn ammo(&self) -> &AmmoCounter {
        &self.ammo
    }

    pub fn aim(&self) -> &Aim {
        &self.aim
    }

    pub fn arena(&self) -> Option<&Arena> {
        self.arena.as_ref()
    }

    pub fn arena_mut(&mut self) -> Option<&mut Arena> {
        self.arena.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::aim::Launch;
    use crate::game::entity::{EntityKind, ProjectileKind};
    use crate::game::level::{builtin_levels, EnemySpec};
    use crate::game::presentation::RemovalReason;
    use glam::Vec3;
    use std::cell::RefCell;
    use std::rc::Rc;

    const DT: f32 = 1.0 / 60.0;

    #[derive(Default)]
    struct Recorded {
        visuals: Vec<EntityId>,
        huds: Vec<HudSnapshot>,
    }

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Recorded>>);

    impl SceneSink for Recorder {
        fn add_visual(&mut self, id: EntityId, _kind: EntityKind, _position: Vec3) {
            self.0.borrow_mut().visuals.push(id);
        }

        fn remove_visual(&mut self, id: EntityId) {
            self.0.borrow_mut().visuals.retain(|v| *v != id);
        }
    }

    impl HudSink for Recorder {
        fn update(&mut self, snapshot: &HudSnapshot) {
            self.0.borrow_mut().huds.push(*snapshot);
        }
    }

    fn single_enemy_level(rock: u32, bomb: u32, enemy: Vec3) -> LevelData {
        LevelData {
            difficulty: "test".to_string(),
            ammo: AmmoCount::new(rock, bomb),
            bricks: Vec::new(),
            enemies: vec![EnemySpec { pos: enemy }],
            scenery: Vec::new(),
        }
    }

    fn game_with(config: GameConfig, levels: Vec<LevelData>) -> (Game, Recorder) {
        let recorder = Recorder::default();
        let game = Game::new(
            config,
            levels,
            CannonModel::Procedural,
            Box::new(recorder.clone()),
            Box::new(recorder.clone()),
        )
        .unwrap();
        (game, recorder)
    }

    fn count<F: Fn(&SessionEvent) -> bool>(events: &[SessionEvent], f: F) -> usize {
        events.iter().filter(|e| f(e)).count()
    }

    #[test]
    fn test_new_session_is_idle() {
        let (mut game, _) = game_with(GameConfig::default(), builtin_levels().unwrap());
        assert_eq!(game.state(), GameState::Idle);
        assert_eq!(game.fire(), FireOutcome::NotRunning);
        game.tick(DT);
        assert!(game.arena().is_none());
    }

    #[test]
    fn test_no_levels_rejected() {
        let recorder = Recorder::default();
        let result = Game::new(
            GameConfig::default(),
            Vec::new(),
            CannonModel::Procedural,
            Box::new(recorder.clone()),
            Box::new(recorder),
        );
        assert!(matches!(result, Err(GameError::InvalidLevel(_))));
    }

    #[test]
    fn test_start_level_out_of_range() {
        let (mut game, _) = game_with(GameConfig::default(), builtin_levels().unwrap());
        let err = game.start_level(7).unwrap_err();
        assert!(matches!(err, GameError::LevelIndex { index: 7, count: 3 }));
        assert_eq!(game.state(), GameState::Idle);
    }

    #[test]
    fn test_physics_failure_stays_idle() {
        let mut config = GameConfig::default();
        config.physics.fixed_timestep = -1.0;
        let (mut game, _) = game_with(config, builtin_levels().unwrap());

        let err = game.start_level(0).unwrap_err();
        assert!(matches!(err, GameError::PhysicsInit(_)));
        assert_eq!(game.state(), GameState::Idle);
        assert!(game.arena().is_none());
    }

    #[test]
    fn test_start_level_shows_scene_and_hud() {
        let levels = builtin_levels().unwrap();
        let (mut game, recorder) = game_with(GameConfig::default(), levels);
        game.start_level(0).unwrap();

        assert_eq!(game.state(), GameState::Running);
        let registry_len = game.arena().unwrap().registry().len();
        let recorded = recorder.0.borrow();
        assert_eq!(recorded.visuals.len(), registry_len);
        assert_eq!(
            recorded.huds.last().map(|h| h.ammo_remaining),
            Some(AmmoCount::new(6, 2))
        );
    }

    #[test]
    fn test_fire_spends_ammo() {
        let level = single_enemy_level(2, 1, Vec3::new(0.0, 0.5, 20.0));
        let (mut game, recorder) = game_with(GameConfig::default(), vec![level]);
        game.start_level(0).unwrap();

        let FireOutcome::Fired(id) = game.fire() else {
            panic!("expected a shot");
        };
        let projectile = game.arena().unwrap().registry().find(id).unwrap();
        assert_eq!(projectile.projectile_kind(), Some(ProjectileKind::Rock));
        assert_eq!(game.ammo().remaining(ProjectileKind::Rock), 1);
        assert_eq!(game.ammo().used(ProjectileKind::Rock), 1);

        let hud = *recorder.0.borrow().huds.last().unwrap();
        assert_eq!(hud.ammo_remaining, AmmoCount::new(1, 1));
        assert!(recorder.0.borrow().visuals.contains(&id));
    }

    #[test]
    fn test_game_over_on_exhausted_ammo() {
        let level = single_enemy_level(1, 1, Vec3::new(40.0, 0.5, 40.0));
        let (mut game, _) = game_with(GameConfig::default(), vec![level]);
        game.start_level(0).unwrap();

        assert!(matches!(game.fire(), FireOutcome::Fired(_)));
        // Rock empty, bomb still there
        assert_eq!(game.fire(), FireOutcome::OutOfAmmo);
        assert_eq!(game.state(), GameState::Running);

        game.handle_input(GameInput::SwitchAmmo);
        assert!(matches!(game.fire(), FireOutcome::Fired(_)));
        assert_eq!(game.state(), GameState::Running);

        assert_eq!(game.fire(), FireOutcome::GameOver);
        assert_eq!(game.state(), GameState::GameOver);
        assert_eq!(game.fire(), FireOutcome::NotRunning);

        let events = game.drain_events();
        assert_eq!(
            count(&events, |e| matches!(e, SessionEvent::GameOver { .. })),
            1
        );
    }

    #[test]
    fn test_level_complete_fires_once() {
        let level = single_enemy_level(3, 0, Vec3::new(0.0, 0.5, 20.0));
        let (mut game, _) = game_with(GameConfig::default(), vec![level]);
        game.start_level(0).unwrap();

        let arena = game.arena_mut().unwrap();
        let enemy = arena.registry().all_of_kind(EntityKind::Enemy)[0];
        arena.remove(enemy, RemovalReason::Hit);

        game.tick(DT);
        assert_eq!(game.state(), GameState::LevelComplete);
        for _ in 0..10 {
            game.tick(DT);
        }

        let events = game.drain_events();
        let completions: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::LevelComplete(outcome) => Some(*outcome),
                _ => None,
            })
            .collect();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].level_index, 0);
        assert_eq!(completions[0].ammo_used, AmmoCount::new(0, 0));
        assert_eq!(completions[0].elapsed_secs, DT);
    }

    #[test]
    fn test_fuse_burns_full_delay() {
        let level = single_enemy_level(0, 1, Vec3::new(40.0, 0.5, 40.0));
        let (mut game, _) = game_with(GameConfig::default(), vec![level]);
        game.start_level(0).unwrap();
        let bomb = game.arena_mut().unwrap().spawn_projectile(
            ProjectileKind::Bomb,
            Launch {
                position: Vec3::new(0.0, 0.3, 0.0),
                velocity: Vec3::ZERO,
            },
        );
        game.drain_events();

        let dt = 0.25;
        let mut armed_at = None;
        let mut exploded_at = None;
        for step in 1..=8 {
            game.tick(dt);
            let now = step as f32 * dt;
            for event in game.drain_events() {
                match event {
                    SessionEvent::Entity(GameEvent::BombArmed { id }) if id == bomb => {
                        armed_at = armed_at.or(Some(now));
                    }
                    SessionEvent::Entity(GameEvent::Exploded { id, .. }) if id == bomb => {
                        exploded_at = Some(now);
                    }
                    _ => {}
                }
            }
        }

        assert_eq!(armed_at, Some(0.25));
        // Lit at 0.25 with a 1 s fuse
        assert_eq!(exploded_at, Some(1.25));
    }

    #[test]
    fn test_enemy_culled_within_one_tick() {
        let level = single_enemy_level(3, 0, Vec3::new(0.0, -31.0, 0.0));
        let (mut game, _) = game_with(GameConfig::default(), vec![level]);
        game.start_level(0).unwrap();
        assert_eq!(game.enemy_count(), 1);

        game.tick(DT);
        assert_eq!(game.enemy_count(), 0);
        assert_eq!(game.state(), GameState::LevelComplete);
    }

    #[test]
    fn test_queued_inputs_apply_on_tick() {
        let level = single_enemy_level(3, 3, Vec3::new(0.0, 0.5, 20.0));
        let (mut game, recorder) = game_with(GameConfig::default(), vec![level]);
        game.start_level(0).unwrap();

        game.queue_input(GameInput::AdjustPower(10.0));
        game.queue_input(GameInput::SwitchAmmo);
        game.queue_input(GameInput::Fire);
        assert_eq!(game.aim().power(), 50.0);

        game.tick(DT);
        assert_eq!(game.aim().power(), 60.0);
        assert_eq!(game.aim().selected(), ProjectileKind::Bomb);
        assert_eq!(game.ammo().remaining(ProjectileKind::Bomb), 2);

        let hud = *recorder.0.borrow().huds.last().unwrap();
        assert_eq!(hud.aim_power, 60.0);
        assert_eq!(hud.selected, ProjectileKind::Bomb);
    }

    #[test]
    fn test_level_navigation() {
        let (mut game, recorder) = game_with(GameConfig::default(), builtin_levels().unwrap());
        game.start_level(2).unwrap();
        game.next_level().unwrap();
        assert_eq!(game.level_index(), 0);

        game.next_level().unwrap();
        game.retry_level().unwrap();
        assert_eq!(game.level_index(), 1);
        assert_eq!(game.state(), GameState::Running);

        game.restart().unwrap();
        assert_eq!(game.level_index(), 0);

        game.quit();
        assert_eq!(game.state(), GameState::Idle);
        assert!(game.arena().is_none());
        assert!(recorder.0.borrow().visuals.is_empty());
    }

    #[test]
    fn test_entity_ids_not_reused_across_levels() {
        let (mut game, _) = game_with(GameConfig::default(), builtin_levels().unwrap());
        game.start_level(0).unwrap();
        let FireOutcome::Fired(first) = game.fire() else {
            panic!("expected a shot");
        };
        game.retry_level().unwrap();
        let FireOutcome::Fired(second) = game.fire() else {
            panic!("expected a shot");
        };
        assert!(second > first);
        assert!(game.arena().unwrap().registry().find(first).is_none());
    }
}
