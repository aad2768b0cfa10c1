//! AIMWALL Simulation Core
//!
//! Headless ECS-симуляция aim тренажёра на Bevy 0.16:
//! стена с мишенями, aim ray каждый кадр, trace history, выстрелы, статистика скорости.
//!
//! HOST BOUNDARY:
//! - Host (renderer + input) → core: AimInput (direction, delta, aspect), FireIntent, ConfigUpdate
//! - Core → host: RenderView, SpeedStats, ShotResolved, ConfigChanged
//!
//! Весь state - Resources в `World` (owned simulation context), никакого global state.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod config;
pub mod hit_test;
pub mod logger;
pub mod orientation;
pub mod render;
pub mod respawn;
pub mod runner;
pub mod shot;
pub mod stats;
pub mod trace;

// Re-export основных типов
pub use config::{
    horizontal_to_vertical_fov, AimConfig, ApplyEffect, ConfigChanged, ConfigError, ConfigField,
    ConfigUpdate, SchemaVerdict, CURRENT_SCHEMA_VERSION,
};
pub use hit_test::{
    capture_frame, cast_aim_ray, AimRay, Backdrop, FrameCapture, Target, TargetId, TargetSet, Viewer,
};
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, set_log_level, set_logger, LogLevel,
    LogPrinter, LOGGER_LEVEL,
};
pub use orientation::{AimInput, OrientationSampler, SimClock};
pub use render::{DisplayedTrail, MarkerKind, RenderView, TraceMarker};
pub use respawn::{rebuild_targets, respawn_target, RespawnBounds};
pub use runner::{FrameInput, FrameLoop, FrameSource, LoopHandle, ScriptedFrames};
pub use shot::{resolve_shot, FireIntent, IgnoreReason, ShotOutcome, ShotResolved};
pub use stats::SpeedStats;
pub use trace::{TraceHistory, TraceSample};

/// Seed по умолчанию (если host не вставил свой DeterministicRng)
pub const DEFAULT_SEED: u64 = 42;

/// Главный plugin симуляции
///
/// Порядок systems в кадре (chain):
/// 1. apply_config_updates - изменения настроек между кадрами
/// 2. resolve_fire_intents - выстрелы против буфера прошлого кадра
/// 3. sample_orientation - часы + angular velocity
/// 4. capture_aim_sample - hit-test + append в trace history
/// 5. update_speed_stats - max / average / instantaneous
/// 6. publish_render_view - snapshot для renderer/UI
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Host мог вставить свой seed / persisted config до plugin - не перетираем
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(DEFAULT_SEED));
        }

        app.init_resource::<AimConfig>()
            .init_resource::<Backdrop>()
            .init_resource::<Viewer>()
            .init_resource::<AimInput>()
            .init_resource::<SimClock>()
            .init_resource::<OrientationSampler>()
            .init_resource::<TargetSet>()
            .init_resource::<TraceHistory>()
            .init_resource::<SpeedStats>()
            .init_resource::<DisplayedTrail>()
            .init_resource::<RenderView>();

        app.add_event::<ConfigUpdate>()
            .add_event::<ConfigChanged>()
            .add_event::<FireIntent>()
            .add_event::<ShotResolved>();

        app.add_systems(Startup, respawn::setup_targets);

        app.add_systems(
            Update,
            (
                config::apply_config_updates,
                shot::resolve_fire_intents,
                orientation::sample_orientation,
                hit_test::capture_aim_sample,
                stats::update_speed_stats,
                render::publish_render_view,
            )
                .chain(), // Последовательное выполнение
        );
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции (без SimulationPlugin)
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed));

    app
}

/// Headless App с SimulationPlugin и заданным конфигом
pub fn create_simulation_app(seed: u64, config: AimConfig) -> App {
    let mut app = create_headless_app(seed);
    app.insert_resource(config).add_plugins(SimulationPlugin);
    app
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_update_builds_targets_and_view() {
        let mut app = create_simulation_app(7, AimConfig::default());

        FrameLoop::step(&mut app, FrameInput::aim(Vec3::NEG_Z, 1.0 / 60.0));

        let world = app.world();
        assert_eq!(world.resource::<TargetSet>().len(), 1);

        let view = world.resource::<RenderView>();
        assert_eq!(view.frame, 1);
        assert_eq!(view.targets.len(), 1);
        assert_eq!(view.trail.len(), 1);
        assert_eq!(view.trail[0].kind, MarkerKind::Trail);
    }

    #[test]
    fn test_plugin_keeps_host_config_and_seed() {
        let mut config = AimConfig::default();
        config.target_count = 3;
        let mut app = create_simulation_app(99, config);
        app.update();

        assert_eq!(app.world().resource::<DeterministicRng>().seed, 99);
        assert_eq!(app.world().resource::<TargetSet>().len(), 3);
    }
}
