//! The simulation thread: owns the world, the GPU context, and the frame
//! loop.

use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::time::{Duration, Instant};

use crate::physics::PhysicsEngine;
use crate::render::{GpuContext, ParticleRenderer};
use crate::slabs::MAX_BODIES;

use super::{Command, Event, InitPayload, Metrics};

const METRICS_INTERVAL: Duration = Duration::from_secs(1);
const PAUSED_POLL: Duration = Duration::from_millis(50);

pub(super) fn run(payload: InitPayload, commands: Receiver<Command>, events: Sender<Event>) {
    let mut gpu = match GpuContext::new(payload.window, payload.width, payload.height) {
        Ok(gpu) => gpu,
        Err(err) => {
            log::error!("simulation thread failed to initialize GPU: {err}");
            let _ = events.send(Event::Fault(err.to_string()));
            return;
        }
    };

    let renderer = ParticleRenderer::new(&gpu.device, gpu.config.format, MAX_BODIES);
    let mut engine = PhysicsEngine::new(
        payload.settings,
        payload.width as f32,
        payload.height as f32,
    );
    renderer.set_globals(
        &gpu.queue,
        payload.width as f32,
        payload.height as f32,
        engine.settings().rendering.shape_sides,
    );
    renderer.upload_static(&gpu.queue, engine.slabs());
    engine.take_static_dirty();

    log::info!(
        "simulation up: {} bodies at {}x{}",
        engine.body_count(),
        payload.width,
        payload.height
    );
    let _ = events.send(Event::Initialized);

    let mut paused = false;
    let mut last_frame = Instant::now();
    let mut metrics_at = Instant::now();
    let mut frames = 0u32;
    let mut sim_time = Duration::ZERO;
    let mut sim_steps = 0u32;
    let mut render_time = Duration::ZERO;

    loop {
        // Drain every pending command, in arrival order, before touching
        // the frame.
        loop {
            match commands.try_recv() {
                Ok(Command::Terminate) => return,
                Ok(Command::Resize { width, height }) => {
                    gpu.resize(width, height);
                    renderer.set_globals(
                        &gpu.queue,
                        width as f32,
                        height as f32,
                        engine.settings().rendering.shape_sides,
                    );
                    engine.resize(width as f32, height as f32);
                }
                Ok(Command::Shockwave { x, y, strength }) => {
                    engine.apply_shockwave(x, y, strength);
                }
                Ok(Command::ScrollForce { force, direction }) => {
                    engine.apply_scroll_force(force, direction);
                }
                Ok(Command::SetPaused(value)) => {
                    if paused != value {
                        log::debug!("simulation {}", if value { "paused" } else { "resumed" });
                    }
                    paused = value;
                }
                Ok(Command::UpdateSettings(settings)) => {
                    let shape_sides = settings.rendering.shape_sides;
                    engine.update_settings(*settings);
                    let (width, height) = engine.canvas_size();
                    renderer.set_globals(&gpu.queue, width, height, shape_sides);
                }
                Ok(Command::GetState) => {
                    let (positions, angles) = engine.snapshot();
                    let _ = events.send(Event::StateUpdate { positions, angles });
                }
                Err(TryRecvError::Empty) => break,
                // Main side dropped the bridge; treat like Terminate.
                Err(TryRecvError::Disconnected) => return,
            }
        }

        if paused {
            std::thread::sleep(PAUSED_POLL);
            // Do not bank the paused time as simulation backlog.
            last_frame = Instant::now();
            continue;
        }

        let now = Instant::now();
        let elapsed = (now - last_frame).as_secs_f32();
        last_frame = now;

        let sim_start = Instant::now();
        if engine.advance(elapsed) {
            sim_time += sim_start.elapsed();
            sim_steps += 1;
        }

        let render_start = Instant::now();
        if engine.take_static_dirty() {
            renderer.upload_static(&gpu.queue, engine.slabs());
        }
        renderer.upload_dynamic(&gpu.queue, engine.slabs());

        match gpu.surface.get_current_texture() {
            Ok(frame) => {
                let view = frame
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                let mut encoder = gpu
                    .device
                    .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                        label: Some("particle frame"),
                    });
                renderer.render(&mut encoder, &view, engine.body_count() as u32);
                gpu.queue.submit(Some(encoder.finish()));
                frame.present();
                frames += 1;
                render_time += render_start.elapsed();
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.reconfigure();
            }
            Err(wgpu::SurfaceError::Timeout) => {}
            Err(err @ (wgpu::SurfaceError::OutOfMemory | wgpu::SurfaceError::Other)) => {
                log::error!("surface unrecoverable: {err}");
                let _ = events.send(Event::Fault(err.to_string()));
                return;
            }
        }

        let window = metrics_at.elapsed();
        if window >= METRICS_INTERVAL {
            let metrics = Metrics {
                fps: frames as f32 / window.as_secs_f32(),
                sim_ms: if sim_steps > 0 {
                    sim_time.as_secs_f32() * 1000.0 / sim_steps as f32
                } else {
                    0.0
                },
                render_ms: if frames > 0 {
                    render_time.as_secs_f32() * 1000.0 / frames as f32
                } else {
                    0.0
                },
                body_count: engine.body_count(),
            };
            log::debug!(
                "fps {:.1}, sim {:.2} ms, render {:.2} ms, {} bodies",
                metrics.fps,
                metrics.sim_ms,
                metrics.render_ms,
                metrics.body_count
            );
            let _ = events.send(Event::Metrics(metrics));
            metrics_at = Instant::now();
            frames = 0;
            sim_steps = 0;
            sim_time = Duration::ZERO;
            render_time = Duration::ZERO;
        }
    }
}
