//! System: применение ConfigUpdate событий к живой симуляции

use bevy::prelude::*;

use super::{AimConfig, ApplyEffect, ConfigChanged, ConfigUpdate};
use crate::hit_test::{Backdrop, TargetSet};
use crate::render::DisplayedTrail;
use crate::respawn::{rebuild_targets, RespawnBounds};
use crate::trace::TraceHistory;

/// System: ConfigUpdate → AimConfig (+ effect) → ConfigChanged
///
/// Первая в кадре: все изменения между кадрами применяются атомарно до tick.
/// Отклонённое значение логируется и отбрасывается, поле сохраняет прежнее значение.
pub fn apply_config_updates(
    mut updates: EventReader<ConfigUpdate>,
    mut config: ResMut<AimConfig>,
    mut targets: ResMut<TargetSet>,
    mut history: ResMut<TraceHistory>,
    mut displayed: ResMut<DisplayedTrail>,
    mut rng: ResMut<crate::DeterministicRng>,
    mut changed: EventWriter<ConfigChanged>,
    backdrop: Res<Backdrop>,
) {
    for update in updates.read() {
        let effect = match config.set(update.field, &update.value) {
            Ok(effect) => effect,
            Err(err) => {
                crate::log_warning(&format!("⚠️ Config update rejected: {}", err));
                continue;
            }
        };

        match effect {
            ApplyEffect::RebuildTargets => {
                *targets = rebuild_targets(
                    config.target_count,
                    config.target_radius,
                    RespawnBounds::from_config(&config),
                    &backdrop,
                    &mut rng.rng,
                );
                // Sample остаётся hit, но цель кадра capture больше не существует
                history.forget_hit_target();
            }
            ApplyEffect::ResizeTargets => targets.set_radius(config.target_radius),
            ApplyEffect::TracePolicy => displayed.clear(),
            _ => {}
        }

        crate::log_info(&format!(
            "Config `{}` = {} ({:?})",
            update.field.key(),
            config.get(update.field),
            effect
        ));

        changed.write(ConfigChanged {
            field: update.field,
            config: config.clone(),
            record: config.to_record(),
        });
    }
}
