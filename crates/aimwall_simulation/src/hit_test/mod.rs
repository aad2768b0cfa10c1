//! Hit-Test domain - один aim ray за кадр
//!
//! Flow (каждый кадр):
//! 1. Ray vs backdrop. Нет пересечения → sample не создаётся (смотрим мимо стены)
//! 2. Ray vs цели в порядке набора. Первый пересечённый диск = candidate hit target
//! 3. TraceSample{position = точка на стене, hit = candidate.is_some()}
//!    + candidate TargetId отдельно (для respawn при выстреле)
//!
//! Hit outcome фиксируется в момент cast'а и больше не пересчитывается:
//! выстрел судит свой кадр, а не текущее положение целей.

use bevy::prelude::*;

pub mod geometry;

pub use geometry::{
    AimRay, Backdrop, Target, TARGET_DEPTH_OFFSET, WALL_DEPTH, WALL_HEIGHT, WALL_WIDTH,
};

use crate::config::AimConfig;
use crate::orientation::{AimInput, OrientationSampler, SimClock};
use crate::trace::{TraceHistory, TraceSample};

/// Стабильный handle цели (индекс в `TargetSet`, переживает respawn)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub struct TargetId(pub usize);

/// Набор целей фиксированного размера (`targetCount`)
///
/// Порядок детерминированный и значимый: при перекрытии побеждает цель с меньшим индексом.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct TargetSet {
    targets: Vec<Target>,
}

impl TargetSet {
    pub fn new(targets: Vec<Target>) -> Self {
        Self { targets }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn get(&self, id: TargetId) -> Option<&Target> {
        self.targets.get(id.0)
    }

    pub fn get_mut(&mut self, id: TargetId) -> Option<&mut Target> {
        self.targets.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TargetId, &Target)> {
        self.targets
            .iter()
            .enumerate()
            .map(|(index, target)| (TargetId(index), target))
    }

    pub fn as_slice(&self) -> &[Target] {
        &self.targets
    }

    /// Radius меняется in place, identity и позиции сохраняются
    pub fn set_radius(&mut self, radius: f32) {
        for target in &mut self.targets {
            target.radius = radius;
        }
    }

    /// Первая (по порядку набора) цель, которую пересекает ray
    pub fn first_hit(&self, ray: &AimRay) -> Option<TargetId> {
        self.iter()
            .find(|(_, target)| target.intersects(ray))
            .map(|(id, _)| id)
    }
}

/// Позиция viewer (камера стоит на месте, вращается только направление)
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Resource)]
pub struct Viewer {
    pub position: Vec3,
}

/// Результат cast'а, попавшего в стену
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayCastOutcome {
    /// Точка на backdrop
    pub point: Vec3,
    /// Первая пересечённая цель (если есть)
    pub hit_target: Option<TargetId>,
}

/// Candidate sample + handle попавшей цели (handle НЕ хранится в sample)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameCapture {
    pub sample: TraceSample,
    pub hit_target: Option<TargetId>,
}

/// Ray vs backdrop, затем vs цели. `None` если стена не пересечена.
pub fn cast_aim_ray(ray: &AimRay, backdrop: &Backdrop, targets: &TargetSet) -> Option<RayCastOutcome> {
    let point = backdrop.intersect(ray)?;
    Some(RayCastOutcome {
        point,
        hit_target: targets.first_hit(ray),
    })
}

/// Полный hit-test кадра → не больше одного candidate sample
pub fn capture_frame(
    viewer: Vec3,
    direction: Vec3,
    backdrop: &Backdrop,
    targets: &TargetSet,
    timestamp: f64,
    angular_velocity: f32,
) -> Option<FrameCapture> {
    let ray = AimRay::new(viewer, direction)?;
    let outcome = cast_aim_ray(&ray, backdrop, targets)?;

    Some(FrameCapture {
        sample: TraceSample::new(
            outcome.point,
            timestamp,
            angular_velocity,
            outcome.hit_target.is_some(),
        ),
        hit_target: outcome.hit_target,
    })
}

/// System: hit-test текущего кадра → append в trace history
///
/// Запускается после `sample_orientation` (velocity кадра уже посчитана).
pub fn capture_aim_sample(
    input: Res<AimInput>,
    clock: Res<SimClock>,
    sampler: Res<OrientationSampler>,
    viewer: Res<Viewer>,
    backdrop: Res<Backdrop>,
    targets: Res<TargetSet>,
    config: Res<AimConfig>,
    mut history: ResMut<TraceHistory>,
) {
    let Some(capture) = capture_frame(
        viewer.position,
        input.direction,
        &backdrop,
        &targets,
        clock.elapsed,
        sampler.last_velocity(),
    ) else {
        return;
    };

    let evicted = history.record(capture, config.trace_capacity);

    if capture.sample.hit {
        crate::log(&format!(
            "🎯 Frame {}: aim on target {:?} at {:?}",
            clock.frame, capture.hit_target, capture.sample.position
        ));
    }
    if evicted > 1 {
        crate::log(&format!(
            "Trace history trimmed by {} samples (capacity {})",
            evicted, config.trace_capacity
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall_targets(positions: &[(f32, f32)], radius: f32) -> TargetSet {
        let backdrop = Backdrop::default();
        TargetSet::new(
            positions
                .iter()
                .map(|&(x, y)| Target::new(Vec3::new(x, y, backdrop.target_depth()), radius))
                .collect(),
        )
    }

    #[test]
    fn test_miss_wall_produces_nothing() {
        let targets = wall_targets(&[(0.0, 0.0)], 4.0);
        let capture = capture_frame(Vec3::ZERO, Vec3::Z, &Backdrop::default(), &targets, 1.0, 10.0);
        assert!(capture.is_none());
    }

    #[test]
    fn test_wall_hit_without_target() {
        let targets = wall_targets(&[(100.0, 0.0)], 4.0);
        let capture = capture_frame(Vec3::ZERO, Vec3::NEG_Z, &Backdrop::default(), &targets, 0.5, 42.0)
            .expect("wall hit");

        assert!(!capture.sample.hit);
        assert!(!capture.sample.shot);
        assert_eq!(capture.hit_target, None);
        assert_eq!(capture.sample.position, Vec3::new(0.0, 0.0, WALL_DEPTH));
        assert_eq!(capture.sample.timestamp, 0.5);
        assert_eq!(capture.sample.angular_velocity, 42.0);
    }

    #[test]
    fn test_overlapping_targets_first_in_order_wins() {
        let targets = wall_targets(&[(50.0, 0.0), (1.0, 0.0), (0.0, 0.0)], 4.0);
        let capture = capture_frame(Vec3::ZERO, Vec3::NEG_Z, &Backdrop::default(), &targets, 0.0, 0.0)
            .expect("wall hit");

        assert!(capture.sample.hit);
        assert_eq!(capture.hit_target, Some(TargetId(1)));
    }

    #[test]
    fn test_empty_target_set_never_hits() {
        let capture = capture_frame(
            Vec3::ZERO,
            Vec3::NEG_Z,
            &Backdrop::default(),
            &TargetSet::default(),
            0.0,
            0.0,
        )
        .expect("wall hit");
        assert!(!capture.sample.hit);
    }

    #[test]
    fn test_set_radius_keeps_positions() {
        let mut targets = wall_targets(&[(10.0, 5.0), (-20.0, 0.0)], 4.0);
        targets.set_radius(8.0);

        assert_eq!(targets.len(), 2);
        for (_, target) in targets.iter() {
            assert_eq!(target.radius, 8.0);
        }
        assert_eq!(
            targets.get(TargetId(0)).map(|t| t.position.truncate()),
            Some(Vec2::new(10.0, 5.0))
        );
        assert!(targets.get(TargetId(2)).is_none());
    }
}
