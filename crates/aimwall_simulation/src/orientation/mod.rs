//! Orientation Sampler - угловая скорость прицела
//!
//! `angular_velocity_deg = angle(current, previous) / delta_secs`
//!
//! Хранит только направление предыдущего кадра. Guarded edge cases:
//! - первый кадр: previous = current → 0 deg/s
//! - delta ≤ 0 / NaN / inf → 0 deg/s (никаких inf/NaN в статистике)
//! - нулевое направление → 0 deg/s, previous не меняется

use bevy::prelude::*;

use crate::config::DEFAULT_ASPECT;

/// Входные данные кадра от хоста (direction, elapsed, viewport aspect)
///
/// Хост (или `FrameLoop::step`) перезаписывает ресурс перед каждым `app.update()`.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Resource)]
pub struct AimInput {
    /// Aim direction (unit vector; ненормированный нормализуется)
    pub direction: Vec3,
    /// Секунды с предыдущего кадра
    pub delta_secs: f32,
    /// Viewport width / height
    pub aspect: f32,
}

impl Default for AimInput {
    fn default() -> Self {
        Self {
            direction: Vec3::NEG_Z,
            delta_secs: 0.0,
            aspect: DEFAULT_ASPECT as f32,
        }
    }
}

/// Часы симуляции (накапливаются из delta хоста, не из wall clock)
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Resource)]
pub struct SimClock {
    /// Секунды с начала сессии (timestamp trace samples)
    pub elapsed: f64,
    /// Номер кадра (1 после первого tick)
    pub frame: u64,
}

impl SimClock {
    pub fn advance(&mut self, delta_secs: f32) {
        self.frame += 1;
        if delta_secs.is_finite() && delta_secs > 0.0 {
            self.elapsed += delta_secs as f64;
        }
    }
}

/// Orientation sampler
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Resource)]
pub struct OrientationSampler {
    previous: Option<Vec3>,
    last_velocity: f32,
}

impl OrientationSampler {
    /// Новый sample → deg/s
    pub fn sample(&mut self, direction: Vec3, delta_secs: f32) -> f32 {
        let Some(current) = direction.try_normalize() else {
            self.last_velocity = 0.0;
            return 0.0;
        };

        let previous = self.previous.replace(current).unwrap_or(current);

        let velocity = if delta_secs.is_finite() && delta_secs > 0.0 {
            angle_between_deg(previous, current) / delta_secs
        } else {
            0.0
        };

        self.last_velocity = if velocity.is_finite() { velocity } else { 0.0 };
        self.last_velocity
    }

    /// Скорость последнего кадра (instantaneous)
    pub fn last_velocity(&self) -> f32 {
        self.last_velocity
    }

    pub fn previous_direction(&self) -> Option<Vec3> {
        self.previous
    }
}

/// Беззнаковый угол между направлениями, градусы
///
/// atan2(|a × b|, a · b) в f64 - стабильно и для малых углов (acos около 1 теряет точность).
pub fn angle_between_deg(a: Vec3, b: Vec3) -> f32 {
    let (a, b) = (a.as_dvec3(), b.as_dvec3());
    a.cross(b).length().atan2(a.dot(b)).to_degrees() as f32
}

/// System: часы + angular velocity кадра
pub fn sample_orientation(
    input: Res<AimInput>,
    mut clock: ResMut<SimClock>,
    mut sampler: ResMut<OrientationSampler>,
) {
    clock.advance(input.delta_secs);
    sampler.sample(input.direction, input.delta_secs);

    if input.delta_secs <= 0.0 && clock.frame > 1 {
        crate::log(&format!(
            "Frame {}: zero elapsed time, angular velocity forced to 0",
            clock.frame
        ));
    }
}
