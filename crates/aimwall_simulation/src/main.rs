//! Headless сессия AIMWALL
//!
//! Скриптованный flick drill без рендера: прицел качается по горизонтали через
//! центр стены, выстрел на каждом проходе через цель. Печатает readout скорости.
//!
//! Usage: `aimwall_simulation [persisted-config.json]`
//!
//! `AIMWALL_LOG=debug` включает per-frame логи (по умолчанию только info и выше).

use aimwall_simulation::{
    create_simulation_app, set_log_level, AimConfig, FrameInput, FrameLoop, FrameSource, LogLevel,
    LoopHandle, ShotResolved, SpeedStats, TargetSet,
};
use bevy::prelude::*;

const TICKS: u64 = 1000;
const FRAME_SECS: f32 = 1.0 / 60.0;

/// Горизонтальный sweep ±`amplitude_deg` с периодом `period_frames`
struct FlickDrill {
    frame: u64,
    amplitude_deg: f32,
    period_frames: u64,
}

impl FlickDrill {
    fn yaw_at(&self, frame: u64) -> f32 {
        let phase = frame as f32 / self.period_frames as f32 * std::f32::consts::TAU;
        self.amplitude_deg * phase.sin()
    }
}

impl FrameSource for FlickDrill {
    fn next_frame(&mut self) -> Option<FrameInput> {
        if self.frame >= TICKS {
            return None;
        }
        let yaw = self.yaw_at(self.frame).to_radians();
        let direction = Vec3::new(yaw.sin(), 0.0, -yaw.cos());

        // Стреляем на кадре после прохода через центр (стена судит прошлый кадр)
        let crossed = self.frame > 0 && self.frame % (self.period_frames / 2) == 1;

        self.frame += 1;
        let input = FrameInput::aim(direction, FRAME_SECS);
        Some(if crossed { input.with_fire() } else { input })
    }
}

fn main() {
    // Per-frame capture логи (Debug) в drill только шумят
    let level = std::env::var("AIMWALL_LOG")
        .ok()
        .and_then(|name| LogLevel::from_name(&name))
        .unwrap_or(LogLevel::Info);
    set_log_level(level);

    let seed = 42;
    let stored = std::env::args()
        .nth(1)
        .and_then(|path| std::fs::read_to_string(path).ok());
    let config = AimConfig::load_persisted_str(stored.as_deref());

    println!(
        "Starting AIMWALL headless drill (seed: {}, hfov: {}, capacity: {})",
        seed, config.horizontal_fov_deg, config.trace_capacity
    );

    let mut app = create_simulation_app(seed, config);
    let frame_loop = FrameLoop::new(LoopHandle::new());
    let mut drill = FlickDrill {
        frame: 0,
        amplitude_deg: 5.0,
        period_frames: 120,
    };

    let mut hits = 0u32;
    let mut shots = 0u32;
    let mut ticks = 0u64;

    // Гоняем по 100 кадров, между пачками печатаем readout
    while ticks < TICKS {
        let mut batch = std::iter::from_fn(|| drill.next_frame()).take(100);
        let mut chunk = BatchSource(&mut batch);
        let ran = frame_loop.run(&mut app, &mut chunk);
        if ran == 0 {
            break;
        }
        ticks += ran;

        let world = app.world_mut();
        for shot in world.resource_mut::<Events<ShotResolved>>().drain() {
            shots += 1;
            if shot.hit {
                hits += 1;
            }
        }

        let stats = *app.world().resource::<SpeedStats>();
        println!(
            "Tick {}: speed {:.3} deg/s | max {:.3} | avg {:.3} | at click {:.3} | shots {}/{}",
            ticks, stats.instantaneous, stats.max, stats.average, stats.at_click, hits, shots
        );
    }

    let targets = app.world().resource::<TargetSet>();
    for (id, target) in targets.iter() {
        println!("Target {:?} final position {:?}", id, target.position);
    }
    println!("Drill complete!");
}

/// Адаптер: итератор кадров → FrameSource (одна пачка)
struct BatchSource<'a, I: Iterator<Item = FrameInput>>(&'a mut I);

impl<I: Iterator<Item = FrameInput>> FrameSource for BatchSource<'_, I> {
    fn next_frame(&mut self) -> Option<FrameInput> {
        self.0.next()
    }
}
