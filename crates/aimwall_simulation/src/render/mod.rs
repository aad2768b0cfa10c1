//! Render View - то, что core отдаёт внешнему renderer/UI каждый кадр
//!
//! Core не рисует: renderer читает `RenderView` после `app.update()` и
//! синхронизирует свои меши (цели, trail точки, crosshair, camera FOV).
//!
//! Trail:
//! - realtimeTrace = true → живой trace buffer
//! - realtimeTrace = false → trail, замороженный на последнем выстреле
//!   (до выстрела включительно); живой буфер после выстрела начинается с нуля

use bevy::prelude::*;

use crate::config::{horizontal_to_vertical_fov, AimConfig};
use crate::hit_test::{Target, TargetSet};
use crate::orientation::{AimInput, SimClock};
use crate::stats::SpeedStats;
use crate::trace::{TraceHistory, TraceSample};

/// Как renderer должен нарисовать trail точку
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum MarkerKind {
    /// Обычная точка trail
    Trail,
    /// Выстрел с попаданием
    ShotHit,
    /// Выстрел мимо
    ShotMiss,
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct TraceMarker {
    pub position: Vec3,
    pub kind: MarkerKind,
}

impl From<&TraceSample> for TraceMarker {
    fn from(sample: &TraceSample) -> Self {
        let kind = match (sample.shot, sample.hit) {
            (false, _) => MarkerKind::Trail,
            (true, true) => MarkerKind::ShotHit,
            (true, false) => MarkerKind::ShotMiss,
        };
        Self {
            position: sample.position,
            kind,
        }
    }
}

/// Trail, замороженный на последнем выстреле (non-realtime режим)
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct DisplayedTrail {
    samples: Vec<TraceSample>,
}

impl DisplayedTrail {
    pub fn freeze(&mut self, samples: Vec<TraceSample>) {
        self.samples = samples;
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn samples(&self) -> &[TraceSample] {
        &self.samples
    }
}

/// Snapshot кадра для renderer/UI
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct RenderView {
    pub frame: u64,
    pub targets: Vec<Target>,
    /// От старого к новому
    pub trail: Vec<TraceMarker>,
    pub trace_radius: f32,
    pub crosshair_visible: bool,
    pub crosshair_scale: f32,
    /// Для viewport aspect текущего кадра
    pub vertical_fov_deg: f32,
    pub stats: SpeedStats,
}

/// Собирает RenderView из состояния симуляции
pub fn build_render_view(
    frame: u64,
    config: &AimConfig,
    aspect: f32,
    targets: &TargetSet,
    history: &TraceHistory,
    displayed: &DisplayedTrail,
    stats: SpeedStats,
) -> RenderView {
    let trail = if config.realtime_trace {
        history.iter().map(TraceMarker::from).collect()
    } else {
        displayed.samples().iter().map(TraceMarker::from).collect()
    };

    RenderView {
        frame,
        targets: targets.as_slice().to_vec(),
        trail,
        trace_radius: config.trace_radius,
        crosshair_visible: config.show_crosshair,
        crosshair_scale: config.crosshair_scale,
        vertical_fov_deg: horizontal_to_vertical_fov(config.horizontal_fov_deg as f64, aspect as f64)
            as f32,
        stats,
    }
}

/// System: публикация RenderView (последняя в кадре)
pub fn publish_render_view(
    clock: Res<SimClock>,
    config: Res<AimConfig>,
    input: Res<AimInput>,
    targets: Res<TargetSet>,
    history: Res<TraceHistory>,
    displayed: Res<DisplayedTrail>,
    stats: Res<SpeedStats>,
    mut view: ResMut<RenderView>,
) {
    *view = build_render_view(
        clock.frame,
        &config,
        input.aspect,
        &targets,
        &history,
        &displayed,
        *stats,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shot_sample(hit: bool) -> TraceSample {
        let mut sample = TraceSample::new(Vec3::ZERO, 0.0, 0.0, hit);
        sample.mark_shot();
        sample
    }

    #[test]
    fn test_marker_kinds() {
        let trail = TraceSample::new(Vec3::ZERO, 0.0, 0.0, true);
        assert_eq!(TraceMarker::from(&trail).kind, MarkerKind::Trail);
        assert_eq!(TraceMarker::from(&shot_sample(true)).kind, MarkerKind::ShotHit);
        assert_eq!(TraceMarker::from(&shot_sample(false)).kind, MarkerKind::ShotMiss);
    }

    #[test]
    fn test_realtime_shows_live_history() {
        let config = AimConfig::default();
        let mut history = TraceHistory::default();
        history.append(TraceSample::new(Vec3::X, 0.0, 0.0, false), 10);
        let mut displayed = DisplayedTrail::default();
        displayed.freeze(vec![shot_sample(true), shot_sample(false)]);

        let view = build_render_view(
            1,
            &config,
            16.0 / 9.0,
            &TargetSet::default(),
            &history,
            &displayed,
            SpeedStats::default(),
        );
        assert_eq!(view.trail.len(), 1);
        assert_eq!(view.trail[0].position, Vec3::X);
    }

    #[test]
    fn test_non_realtime_shows_frozen_trail() {
        let mut config = AimConfig::default();
        config.set(crate::config::ConfigField::RealtimeTrace, &json!(false)).ok();
        config.set(crate::config::ConfigField::ShowCrosshair, &json!(false)).ok();

        let mut history = TraceHistory::default();
        history.append(TraceSample::new(Vec3::X, 0.0, 0.0, false), 10);
        let mut displayed = DisplayedTrail::default();
        displayed.freeze(vec![shot_sample(true)]);

        let view = build_render_view(
            2,
            &config,
            16.0 / 9.0,
            &TargetSet::default(),
            &history,
            &displayed,
            SpeedStats::default(),
        );
        assert_eq!(view.trail.len(), 1);
        assert_eq!(view.trail[0].kind, MarkerKind::ShotHit);
        assert!(!view.crosshair_visible);
        assert!((view.vertical_fov_deg - 73.48).abs() < 0.01);
    }
}
