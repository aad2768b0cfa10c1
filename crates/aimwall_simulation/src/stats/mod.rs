//! Statistics Aggregator - readout скорости прицела
//!
//! Пересчитывается каждый кадр из текущего содержимого trace history
//! (не инкрементально - всегда консистентно с eviction).

use bevy::prelude::*;

use crate::orientation::OrientationSampler;
use crate::trace::TraceHistory;

/// Readout для UI (deg/s)
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Resource)]
pub struct SpeedStats {
    /// Скорость текущего кадра
    pub instantaneous: f32,
    /// Максимум по буферу (0 если пуст)
    pub max: f32,
    /// Среднее по буферу (0 если пуст)
    pub average: f32,
    /// Snapshot последнего выстрела (не меняется между выстрелами)
    pub at_click: f32,
}

pub fn max_velocity(history: &TraceHistory) -> f32 {
    history
        .iter()
        .map(|sample| sample.angular_velocity)
        .fold(0.0, f32::max)
}

/// Running mean: для буфера одинаковых `v` результат ровно `v`
pub fn average_velocity(history: &TraceHistory) -> f32 {
    let mut mean = 0.0_f64;
    for (index, sample) in history.iter().enumerate() {
        let value = sample.angular_velocity as f64;
        mean += (value - mean) / (index + 1) as f64;
    }
    mean as f32
}

pub fn aggregate(history: &TraceHistory, instantaneous: f32, at_click: f32) -> SpeedStats {
    SpeedStats {
        instantaneous,
        max: max_velocity(history),
        average: average_velocity(history),
        at_click,
    }
}

/// System: пересчёт readout (после capture кадра)
pub fn update_speed_stats(
    history: Res<TraceHistory>,
    sampler: Res<OrientationSampler>,
    mut stats: ResMut<SpeedStats>,
) {
    *stats = aggregate(&history, sampler.last_velocity(), stats.at_click);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::TraceSample;

    fn history_of(velocities: &[f32]) -> TraceHistory {
        let mut history = TraceHistory::default();
        for &v in velocities {
            history.append(TraceSample::new(Vec3::ZERO, 0.0, v, false), 1024);
        }
        history
    }

    #[test]
    fn test_empty_history_is_zero() {
        let stats = aggregate(&TraceHistory::default(), 12.0, 3.0);
        assert_eq!(stats.max, 0.0);
        assert_eq!(stats.average, 0.0);
        assert_eq!(stats.instantaneous, 12.0);
        assert_eq!(stats.at_click, 3.0);
    }

    #[test]
    fn test_constant_buffer_average_is_exact() {
        for v in [0.1_f32, 1.0 / 3.0, 123.456, 7.0e-3] {
            let history = history_of(&[v; 37]);
            assert_eq!(average_velocity(&history), v);
            assert_eq!(max_velocity(&history), v);
        }
    }

    #[test]
    fn test_mixed_buffer() {
        let history = history_of(&[10.0, 30.0, 20.0, 40.0]);
        assert_eq!(max_velocity(&history), 40.0);
        assert!((average_velocity(&history) - 25.0).abs() < 1e-5);
    }

    #[test]
    fn test_stats_follow_eviction() {
        let mut history = history_of(&[500.0]);
        for _ in 0..3 {
            history.append(TraceSample::new(Vec3::ZERO, 0.0, 5.0, false), 3);
        }
        // 500 выдавлен из буфера → max больше его не видит
        assert_eq!(max_velocity(&history), 5.0);
    }
}
