//! Frame loop с явным run/stop управлением
//!
//! Host держит `LoopHandle` и останавливает loop через него; loop проверяет
//! handle перед каждым tick (нет бесконечного самоперепланирования без владельца).
//!
//! Один tick = один `app.update()`:
//! ConfigUpdate/FireIntent events + AimInput ресурс → chained Update systems.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bevy::prelude::*;

use crate::config::{ConfigUpdate, DEFAULT_ASPECT};
use crate::orientation::AimInput;
use crate::shot::FireIntent;

/// Cancellation handle (clone отдаём хосту / другому потоку)
#[derive(Debug, Clone, Default)]
pub struct LoopHandle {
    stopped: Arc<AtomicBool>,
}

impl LoopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Вход одного кадра от хоста
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInput {
    pub direction: Vec3,
    pub delta_secs: f32,
    pub aspect: f32,
    /// Fire signal, пришедший с прошлого кадра
    pub fire: bool,
    /// Изменения настроек, пришедшие с прошлого кадра
    pub config_updates: Vec<ConfigUpdate>,
}

impl Default for FrameInput {
    fn default() -> Self {
        Self {
            direction: Vec3::NEG_Z,
            delta_secs: 1.0 / 60.0,
            aspect: DEFAULT_ASPECT as f32,
            fire: false,
            config_updates: Vec::new(),
        }
    }
}

impl FrameInput {
    pub fn aim(direction: Vec3, delta_secs: f32) -> Self {
        Self {
            direction,
            delta_secs,
            ..default()
        }
    }

    pub fn with_fire(mut self) -> Self {
        self.fire = true;
        self
    }

    pub fn with_update(mut self, update: ConfigUpdate) -> Self {
        self.config_updates.push(update);
        self
    }
}

/// Источник кадров (input layer хоста, скрипт, replay)
pub trait FrameSource {
    /// `None` → источник иссяк, loop завершается
    fn next_frame(&mut self) -> Option<FrameInput>;
}

/// Готовый список кадров (тесты, headless harness)
#[derive(Debug, Clone, Default)]
pub struct ScriptedFrames {
    frames: VecDeque<FrameInput>,
}

impl ScriptedFrames {
    pub fn new(frames: impl IntoIterator<Item = FrameInput>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for ScriptedFrames {
    fn next_frame(&mut self) -> Option<FrameInput> {
        self.frames.pop_front()
    }
}

/// Frame loop
#[derive(Debug, Clone, Default)]
pub struct FrameLoop {
    handle: LoopHandle,
}

impl FrameLoop {
    pub fn new(handle: LoopHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    /// Один tick из одного входа
    pub fn step(app: &mut App, input: FrameInput) {
        let world = app.world_mut();

        for update in input.config_updates {
            world.send_event(update);
        }
        if input.fire {
            world.send_event(FireIntent);
        }
        world.insert_resource(AimInput {
            direction: input.direction,
            delta_secs: input.delta_secs,
            aspect: input.aspect,
        });

        app.update();
    }

    /// Tick'и пока handle не остановлен и source отдаёт кадры. Возвращает число tick'ов.
    pub fn run(&self, app: &mut App, source: &mut impl FrameSource) -> u64 {
        let mut ticks = 0;

        while !self.handle.is_stopped() {
            let Some(input) = source.next_frame() else {
                break;
            };
            Self::step(app, input);
            ticks += 1;
        }

        crate::log_info(&format!(
            "Frame loop finished after {} ticks (stopped: {})",
            ticks,
            self.handle.is_stopped()
        ));
        ticks
    }
}
