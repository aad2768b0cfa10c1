//! Target Respawn Policy - новая случайная позиция цели
//!
//! x ∈ [-w/2, +w/2], y ∈ [-h/2, +h/2] (центр - origin стены), z = backdrop + offset.
//! w = 0 или h = 0 схлопывает ось в точку 0 - валидно, не ошибка.
//! RNG - `DeterministicRng` (seeded) для воспроизводимых headless прогонов.

use bevy::prelude::*;
use rand::Rng;

use crate::config::AimConfig;
use crate::hit_test::{Backdrop, Target, TargetSet};

/// Область respawn (размеры, центр - origin стены)
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct RespawnBounds {
    pub width: f32,
    pub height: f32,
}

impl RespawnBounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn from_config(config: &AimConfig) -> Self {
        Self::new(config.random_width, config.random_height)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x.abs() <= self.width / 2.0 && point.y.abs() <= self.height / 2.0
    }

    fn draw_axis<R: Rng + ?Sized>(extent: f32, rng: &mut R) -> f32 {
        if !(extent > 0.0) {
            return 0.0;
        }
        let half = extent / 2.0;
        // gen::<f32>() ∈ [0, 1); clamp страхует округление на краях
        (rng.gen::<f32>() * extent - half).clamp(-half, half)
    }

    /// Случайная точка (x, y) внутри области
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        let x = Self::draw_axis(self.width, rng);
        let y = Self::draw_axis(self.height, rng);
        Vec2::new(x, y)
    }
}

/// Переносит цель в новую случайную позицию (radius не меняется)
pub fn respawn_target<R: Rng + ?Sized>(
    target: &mut Target,
    bounds: RespawnBounds,
    backdrop: &Backdrop,
    rng: &mut R,
) {
    let point = bounds.draw(rng);
    target.position = point.extend(backdrop.target_depth());
}

/// Пересборка набора целей (при изменении `targetCount`)
///
/// Цель 0 стартует в центре стены, остальные - через respawn policy.
pub fn rebuild_targets<R: Rng + ?Sized>(
    count: usize,
    radius: f32,
    bounds: RespawnBounds,
    backdrop: &Backdrop,
    rng: &mut R,
) -> TargetSet {
    let center = Vec3::new(0.0, 0.0, backdrop.target_depth());
    let targets = (0..count)
        .map(|index| {
            let mut target = Target::new(center, radius);
            if index > 0 {
                respawn_target(&mut target, bounds, backdrop, rng);
            }
            target
        })
        .collect();

    TargetSet::new(targets)
}

/// Startup system: первичный набор целей из конфига
pub fn setup_targets(
    config: Res<AimConfig>,
    backdrop: Res<Backdrop>,
    mut rng: ResMut<crate::DeterministicRng>,
    mut targets: ResMut<TargetSet>,
) {
    *targets = rebuild_targets(
        config.target_count,
        config.target_radius,
        RespawnBounds::from_config(&config),
        &backdrop,
        &mut rng.rng,
    );

    crate::log_info(&format!(
        "Target set ready: {} targets, radius {}",
        targets.len(),
        config.target_radius
    ));
}
