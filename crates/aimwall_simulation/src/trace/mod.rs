//! Trace History - FIFO буфер trace samples с ограничением capacity
//!
//! Порядок хронологический и значимый (статистика и trail renderer'а читают по порядку).
//! Capacity передаётся на каждый append: изменение `traceCapacity` действует
//! со следующей проверки, без ретро-обрезки.

use std::collections::VecDeque;

use bevy::prelude::*;

use crate::hit_test::{FrameCapture, TargetId};

/// Один кадр: пересечение aim ray со стеной + флаги
///
/// Иммутабелен после append, кроме `shot` (ставится один раз, только у последнего sample).
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct TraceSample {
    /// Точка на backdrop
    pub position: Vec3,
    /// Секунды сессии (SimClock)
    pub timestamp: f64,
    /// deg/s в момент capture
    pub angular_velocity: f32,
    /// По этому кадру был выстрел
    pub shot: bool,
    /// Aim ray пересекал цель в момент capture
    pub hit: bool,
}

impl TraceSample {
    pub fn new(position: Vec3, timestamp: f64, angular_velocity: f32, hit: bool) -> Self {
        Self {
            position,
            timestamp,
            angular_velocity,
            shot: false,
            hit,
        }
    }

    /// `false` если выстрел по этому sample уже был
    pub(crate) fn mark_shot(&mut self) -> bool {
        if self.shot {
            return false;
        }
        self.shot = true;
        true
    }
}

/// Trace history buffer
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct TraceHistory {
    samples: VecDeque<TraceSample>,
    /// Candidate цель самого нового sample (handle для respawn при выстреле)
    latest_hit_target: Option<TargetId>,
}

impl TraceHistory {
    /// Append в хвост + eviction с головы до `len <= capacity`
    ///
    /// Возвращает число выброшенных samples.
    pub fn append(&mut self, sample: TraceSample, capacity: usize) -> usize {
        self.samples.push_back(sample);
        self.latest_hit_target = None;
        self.evict_to(capacity)
    }

    /// Append кадра hit-test вместе с handle попавшей цели
    pub fn record(&mut self, capture: FrameCapture, capacity: usize) -> usize {
        let evicted = self.append(capture.sample, capacity);
        // capacity = 0 выбрасывает и только что добавленный sample
        if !self.samples.is_empty() {
            self.latest_hit_target = capture.hit_target;
        }
        evicted
    }

    fn evict_to(&mut self, capacity: usize) -> usize {
        let mut evicted = 0;
        while self.samples.len() > capacity {
            self.samples.pop_front();
            evicted += 1;
        }
        if self.samples.is_empty() {
            self.latest_hit_target = None;
        }
        evicted
    }

    /// Немедленно очищает буфер
    pub fn reset(&mut self) {
        self.samples.clear();
        self.latest_hit_target = None;
    }

    /// Забирает всё содержимое (буфер остаётся пустым)
    pub fn take(&mut self) -> Vec<TraceSample> {
        self.latest_hit_target = None;
        self.samples.drain(..).collect()
    }

    pub fn latest(&self) -> Option<&TraceSample> {
        self.samples.back()
    }

    pub(crate) fn latest_mut(&mut self) -> Option<&mut TraceSample> {
        self.samples.back_mut()
    }

    /// Цель, которую hit-test определил для `latest()`
    pub fn latest_hit_target(&self) -> Option<TargetId> {
        self.latest_hit_target
    }

    /// Набор целей пересобран: старый handle больше ни на что не указывает
    pub(crate) fn forget_hit_target(&mut self) {
        self.latest_hit_target = None;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// От старого к новому
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TraceSample> + ExactSizeIterator {
        self.samples.iter()
    }

    pub fn to_vec(&self) -> Vec<TraceSample> {
        self.samples.iter().copied().collect()
    }
}
