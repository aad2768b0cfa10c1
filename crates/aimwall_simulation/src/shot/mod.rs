//! Shot Resolver - реакция на внешний fire signal
//!
//! State machine: IDLE → (FireIntent) → RESOLVED в рамках одного вызова,
//! multi-frame pending состояния нет.
//!
//! Правила:
//! - буфер пуст → no-op (at_click не обновляется)
//! - latest().shot уже true → no-op (fire коалесцируется per-sample)
//! - иначе: shot = true, hit читается из sample (факт кадра capture),
//!   at_click = instantaneous, respawn цели этого кадра (если hit && randomizeOnHit),
//!   reset буфера (если !realtimeTrace)

use bevy::prelude::*;
use rand::Rng;

use crate::config::AimConfig;
use crate::hit_test::{Backdrop, TargetId, TargetSet};
use crate::orientation::SimClock;
use crate::render::DisplayedTrail;
use crate::respawn::{respawn_target, RespawnBounds};
use crate::stats::SpeedStats;
use crate::trace::{TraceHistory, TraceSample};

/// Event: пользователь выстрелил (input source → core, между кадрами)
#[derive(Event, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FireIntent;

/// Event: выстрел разрешён (core → UI / telemetry)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ShotResolved {
    /// Hit outcome кадра, по которому стреляли
    pub hit: bool,
    /// Instantaneous скорость в момент выстрела (deg/s)
    pub velocity_at_click: f32,
    /// Цель, которую перенесли (если respawn случился)
    pub respawned: Option<TargetId>,
    /// Буфер очищен (non-realtime режим)
    pub trace_cleared: bool,
    /// Timestamp sample, по которому стреляли
    pub sample_timestamp: f64,
}

/// Почему fire проигнорирован
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Ни одного sample (aim ни разу не пересекал стену, или буфер только что сброшен)
    EmptyHistory,
    /// Повторный fire без нового sample
    AlreadyShot,
}

/// Результат разрешения выстрела
#[derive(Debug, Clone, PartialEq)]
pub enum ShotOutcome {
    Ignored(IgnoreReason),
    Resolved {
        shot: ShotResolved,
        /// Trail до выстрела включительно (только если буфер сброшен)
        cleared_trail: Option<Vec<TraceSample>>,
    },
}

/// Разрешает один fire signal против текущего буфера
pub fn resolve_shot<R: Rng + ?Sized>(
    history: &mut TraceHistory,
    targets: &mut TargetSet,
    config: &AimConfig,
    backdrop: &Backdrop,
    instantaneous: f32,
    rng: &mut R,
) -> ShotOutcome {
    let hit_target = history.latest_hit_target();

    let Some(latest) = history.latest_mut() else {
        return ShotOutcome::Ignored(IgnoreReason::EmptyHistory);
    };
    if !latest.mark_shot() {
        return ShotOutcome::Ignored(IgnoreReason::AlreadyShot);
    }
    let hit = latest.hit;
    let sample_timestamp = latest.timestamp;

    let mut respawned = None;
    if hit && config.randomize_on_hit {
        let recorded = match hit_target {
            Some(id) => targets.get_mut(id).map(|target| (id, target)),
            None => None,
        };
        match recorded {
            Some((id, target)) => {
                respawn_target(target, RespawnBounds::from_config(config), backdrop, rng);
                respawned = Some(id);
            }
            None => {
                // Набор целей пересобран между capture и выстрелом
                crate::log_warning(&format!(
                    "Shot hit {:?}, but target no longer exists; respawn skipped",
                    hit_target
                ));
            }
        }
    }

    let cleared_trail = if config.realtime_trace {
        None
    } else {
        Some(history.take())
    };

    ShotOutcome::Resolved {
        shot: ShotResolved {
            hit,
            velocity_at_click: instantaneous,
            respawned,
            trace_cleared: cleared_trail.is_some(),
            sample_timestamp,
        },
        cleared_trail,
    }
}

/// System: FireIntent events → resolve_shot
///
/// Запускается ДО capture текущего кадра: выстрел судит буфер на конец прошлого кадра,
/// instantaneous = скорость прошлого кадра.
pub fn resolve_fire_intents(
    mut fire_events: EventReader<FireIntent>,
    mut history: ResMut<TraceHistory>,
    mut targets: ResMut<TargetSet>,
    mut stats: ResMut<SpeedStats>,
    mut displayed: ResMut<DisplayedTrail>,
    mut rng: ResMut<crate::DeterministicRng>,
    mut resolved_events: EventWriter<ShotResolved>,
    config: Res<AimConfig>,
    backdrop: Res<Backdrop>,
    clock: Res<SimClock>,
) {
    for _ in fire_events.read() {
        let outcome = resolve_shot(
            &mut history,
            &mut targets,
            &config,
            &backdrop,
            stats.instantaneous,
            &mut rng.rng,
        );

        match outcome {
            ShotOutcome::Ignored(reason) => {
                crate::log(&format!("Frame {}: fire ignored ({:?})", clock.frame, reason));
            }
            ShotOutcome::Resolved { shot, cleared_trail } => {
                stats.at_click = shot.velocity_at_click;
                if let Some(trail) = cleared_trail {
                    displayed.freeze(trail);
                }

                crate::log_info(&format!(
                    "{} Shot at {:.3}s: hit={} speed={:.3} deg/s respawned={:?}",
                    if shot.hit { "💥" } else { "❌" },
                    shot.sample_timestamp,
                    shot.hit,
                    shot.velocity_at_click,
                    shot.respawned
                ));

                resolved_events.write(shot);
            }
        }
    }
}
