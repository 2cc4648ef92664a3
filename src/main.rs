use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use log::{info, warn};
use std::path::{Path, PathBuf};

mod core;
mod engine;
mod game;

use engine::game_loop::{FrameClock, FIXED_TIMESTEP_DURATION};
use game::entity::EntityKind;
use game::presentation::GameEvent;
use game::{
    builtin_levels, CannonModel, Game, GameConfig, GameInput, GameState, LevelData, LogHud,
    LogScene, SessionEvent,
};

/// Headless artillery siege: loads levels and plays them with a scripted cannon
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file overriding the default game configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Play a single level from this JSON file instead of the built-in campaign
    #[arg(long)]
    level_file: Option<PathBuf>,

    /// Level to start from (1-based)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    level: u64,

    /// Seed for recoil randomness
    #[arg(long)]
    seed: Option<u64>,

    /// Number of frames to simulate
    #[arg(long, default_value_t = 3600)]
    frames: u64,

    /// Fire a shot every N frames
    #[arg(long, default_value_t = 150, value_parser = clap::value_parser!(u64).range(1..))]
    fire_every: u64,

    /// Cannon model file; the procedural cannon is used if it cannot be read
    #[arg(long, default_value = "assets/models/pirate-cannon.glb")]
    cannon_model: PathBuf,

    /// Retry a lost level this many times before giving up
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Pace frames against the wall clock instead of stepping as fast as possible
    #[arg(long)]
    realtime: bool,
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    info!("Starting Siege Core...");

    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let levels = match &args.level_file {
        Some(path) => vec![LevelData::load(path)
            .with_context(|| format!("Failed to load level {}", path.display()))?],
        None => builtin_levels().context("Built-in levels are invalid")?,
    };

    let cannon = load_cannon_model(&args.cannon_model);
    let autopilot = Autopilot::new(&config);

    let mut game = Game::new(
        config,
        levels,
        cannon,
        Box::new(LogScene::new()),
        Box::new(LogHud::new()),
    )
    .context("Failed to create game session")?;

    let start = usize::try_from(args.level - 1).unwrap_or(usize::MAX);
    game.start_level(start)
        .with_context(|| format!("Failed to start level {}", args.level))?;

    let mut clock = FrameClock::new();
    let mut cleared = 0;
    let mut explosions = 0;
    let mut retries_left = args.retries;

    for frame in 0..args.frames {
        if frame % args.fire_every == 0 {
            autopilot.take_shot(&mut game);
        }

        let updates = if args.realtime {
            std::thread::sleep(FIXED_TIMESTEP_DURATION);
            clock.begin_frame()
        } else {
            clock.advance(FIXED_TIMESTEP_DURATION)
        };
        for _ in 0..updates {
            game.tick(clock.fixed_timestep());
        }

        for event in game.drain_events() {
            match event {
                SessionEvent::LevelComplete(_) => cleared += 1,
                SessionEvent::Entity(GameEvent::Exploded { .. }) => explosions += 1,
                _ => {}
            }
        }

        match game.state() {
            GameState::LevelComplete if cleared >= game.level_count() => {
                info!("Campaign cleared");
                break;
            }
            GameState::LevelComplete => {
                game.next_level().context("Failed to start next level")?
            }
            GameState::GameOver if retries_left > 0 => {
                retries_left -= 1;
                info!(
                    "Retrying level {} ({} retries left)",
                    game.level_index() + 1,
                    retries_left
                );
                game.retry_level().context("Failed to retry level")?;
            }
            GameState::GameOver => {
                info!("Game over on level {}", game.level_index() + 1);
                break;
            }
            GameState::Idle | GameState::Running => {}
        }
    }

    info!(
        "Finished after {} frames ({} updates): {} levels cleared, {} explosions, {} enemies left",
        clock.frame_count(),
        clock.update_count(),
        cleared,
        explosions,
        game.enemy_count()
    );
    if args.realtime {
        info!("Average {:.1} fps", clock.fps());
    }
    game.quit();
    Ok(())
}

/// Use the model file if it is readable, the procedural cannon otherwise
fn load_cannon_model(path: &Path) -> CannonModel {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            info!("Cannon model {} loaded", name);
            CannonModel::Loaded(name)
        }
        Ok(_) => {
            warn!("{} is not a file, using procedural cannon", path.display());
            CannonModel::Procedural
        }
        Err(err) => {
            warn!(
                "Cannon model {} unavailable ({}), using procedural cannon",
                path.display(),
                err
            );
            CannonModel::Procedural
        }
    }
}

/// Scripted gunner: aims at the nearest enemy and fires
struct Autopilot {
    mount: Vec3,
    gravity: f32,
    base_speed: f32,
    power_speed: f32,
    min_power: f32,
    max_power: f32,
}

impl Autopilot {
    fn new(config: &GameConfig) -> Self {
        Self {
            mount: config.aim.mount_position,
            gravity: config.physics.gravity.y.abs(),
            base_speed: config.aim.base_speed,
            power_speed: config.aim.power_speed,
            min_power: config.aim.min_power,
            max_power: config.aim.max_power,
        }
    }

    fn nearest_enemy(&self, game: &Game) -> Option<Vec3> {
        let registry = game.arena()?.registry();
        registry
            .all_of_kind(EntityKind::Enemy)
            .into_iter()
            .filter_map(|id| registry.find(id))
            .map(|enemy| enemy.position)
            .min_by(|a, b| {
                a.distance_squared(self.mount)
                    .total_cmp(&b.distance_squared(self.mount))
            })
    }

    /// Elevation (radians) and power that land a shot `range` metres away
    fn solve(&self, range: f32) -> (f32, f32) {
        let speed = |power: f32| self.base_speed + power / 100.0 * self.power_speed;
        let flat = (range * self.gravity).sqrt();

        if flat >= speed(self.min_power) {
            let power = (flat - self.base_speed) / self.power_speed * 100.0;
            return (
                std::f32::consts::FRAC_PI_4,
                power.clamp(self.min_power, self.max_power),
            );
        }

        // Too close for a 45 degree shot: lob at minimum power
        let v = speed(self.min_power);
        let sin = (range * self.gravity / (v * v)).clamp(-1.0, 1.0);
        ((std::f32::consts::PI - sin.asin()) / 2.0, self.min_power)
    }

    fn take_shot(&self, game: &mut Game) {
        if game.state() != GameState::Running {
            return;
        }
        let Some(target) = self.nearest_enemy(game) else {
            return;
        };

        let offset = target - self.mount;
        let heading = offset.x.atan2(offset.z);
        let range = Vec3::new(offset.x, 0.0, offset.z).length();
        let (elevation, power) = self.solve(range);

        let aim = game.aim();
        let (current_heading, current_elevation, current_power) =
            (aim.heading(), aim.elevation(), aim.power());
        let selected = aim.selected();
        let ammo = game.ammo();
        let switch = ammo.remaining(selected) == 0 && ammo.remaining(selected.other()) > 0;
        let kind = if switch { selected.other() } else { selected };

        game.queue_input(GameInput::AdjustHeading(heading - current_heading));
        game.queue_input(GameInput::AdjustElevation(elevation - current_elevation));
        game.queue_input(GameInput::AdjustPower(power - current_power));
        if switch {
            game.queue_input(GameInput::SwitchAmmo);
        }
        game.queue_input(GameInput::Fire);

        log::debug!(
            "Autopilot: {} at {} ({:.1} m, {:.0}°, power {:.0})",
            kind.name(),
            target,
            range,
            elevation.to_degrees(),
            power
        );
    }
}
