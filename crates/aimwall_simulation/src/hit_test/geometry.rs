//! Геометрия сцены: backdrop (стена), цели-диски, aim ray
//!
//! Система координат оригинальной сцены:
//! - viewer в origin, смотрит в -Z
//! - стена 1600 × 900 на z = -800, лицом к viewer (+Z нормаль)
//! - цели - плоские диски на z = wall + 1 (чуть впереди стены, без z-fighting)

use bevy::prelude::*;

/// Глубина стены (z)
pub const WALL_DEPTH: f32 = -800.0;
/// Размер стены (world units)
pub const WALL_WIDTH: f32 = 1600.0;
pub const WALL_HEIGHT: f32 = 900.0;
/// Цель всегда строго впереди backdrop на это расстояние
pub const TARGET_DEPTH_OFFSET: f32 = 1.0;

/// |dir.z| ниже порога → ray параллелен плоскости
const PARALLEL_EPSILON: f32 = 1e-6;

/// Aim ray: origin + нормализованное направление
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimRay {
    pub origin: Vec3,
    direction: Vec3,
}

impl AimRay {
    /// `None` для нулевого / non-finite направления
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        let direction = direction.try_normalize()?;
        if !origin.is_finite() {
            return None;
        }
        Some(Self { origin, direction })
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Точка пересечения с плоскостью `z = depth` строго впереди origin
    pub fn point_at_depth(&self, depth: f32) -> Option<Vec3> {
        if self.direction.z.abs() < PARALLEL_EPSILON {
            return None;
        }
        let t = (depth - self.origin.z) / self.direction.z;
        if !(t > 0.0) {
            return None;
        }
        Some(self.origin + self.direction * t)
    }
}

/// Backdrop - стена с мишенями
#[derive(Resource, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Resource)]
pub struct Backdrop {
    /// z плоскости стены
    pub depth: f32,
    /// Половины ширины/высоты; `None` = бесконечная плоскость
    pub half_extents: Option<Vec2>,
}

impl Default for Backdrop {
    fn default() -> Self {
        Self::bounded(WALL_DEPTH, WALL_WIDTH, WALL_HEIGHT)
    }
}

impl Backdrop {
    pub fn bounded(depth: f32, width: f32, height: f32) -> Self {
        Self {
            depth,
            half_extents: Some(Vec2::new(width / 2.0, height / 2.0)),
        }
    }

    pub fn unbounded(depth: f32) -> Self {
        Self {
            depth,
            half_extents: None,
        }
    }

    /// z, на котором живут цели
    pub fn target_depth(&self) -> f32 {
        self.depth + TARGET_DEPTH_OFFSET
    }

    pub fn intersect(&self, ray: &AimRay) -> Option<Vec3> {
        let point = ray.point_at_depth(self.depth)?;
        match self.half_extents {
            Some(half) if point.x.abs() > half.x || point.y.abs() > half.y => None,
            _ => Some(point),
        }
    }
}

/// Цель - диск лицом к viewer
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct Target {
    pub position: Vec3,
    pub radius: f32,
}

impl Target {
    pub fn new(position: Vec3, radius: f32) -> Self {
        Self { position, radius }
    }

    /// Ray пересекает диск (плоскость диска впереди origin, в пределах radius)
    pub fn intersects(&self, ray: &AimRay) -> bool {
        let Some(point) = ray.point_at_depth(self.position.z) else {
            return false;
        };
        let offset = point.truncate() - self.position.truncate();
        offset.length_squared() <= self.radius * self.radius
    }
}
