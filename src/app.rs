//! Main-thread application: window, input, and the worker handle.
//!
//! The event loop never touches the GPU or the physics world. It owns the
//! window and the input stream, translates both into commands, and hands
//! the render/simulation side to the worker thread at startup.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::error::HeroError;
use crate::settings::{Settings, SettingsPatch};
use crate::viewport::{cursor_to_canvas, ResizeDebouncer, ViewportState};
use crate::worker::{Command, Event, InitPayload, WorkerBridge};

/// Multiplier from scroll-wheel lines to scroll force units.
const LINE_SCROLL_FORCE: f32 = 20.0;

pub fn run() -> Result<(), HeroError> {
    let override_patch = Settings::load_override(Path::new("gravwell.toml"))?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        override_patch,
        state: None,
    };
    event_loop.run_app(&mut app)?;
    Ok(())
}

struct App {
    override_patch: Option<SettingsPatch>,
    state: Option<HeroState>,
}

struct HeroState {
    window: Arc<Window>,
    bridge: WorkerBridge,
    viewport: ViewportState,
    debouncer: ResizeDebouncer,
    cursor: Option<(f64, f64)>,
}

impl App {
    /// Preset for the current classification, with the local override file
    /// applied on top.
    fn compose_settings(&self, mobile: bool) -> Settings {
        let mut settings = Settings::preset(mobile);
        if let Some(patch) = &self.override_patch {
            patch.apply(&mut settings);
        }
        settings
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title("gravwell")
            .with_inner_size(winit::dpi::LogicalSize::new(1280.0, 720.0));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let viewport = ViewportState::new(size.width, size.height, window.scale_factor());
        let settings = self.compose_settings(viewport.mobile());

        let bridge = match WorkerBridge::spawn(InitPayload {
            window: window.clone(),
            width: size.width,
            height: size.height,
            settings,
        }) {
            Ok(bridge) => bridge,
            Err(err) => {
                log::error!("failed to spawn simulation thread: {err}");
                event_loop.exit();
                return;
            }
        };

        self.state = Some(HeroState {
            window,
            bridge,
            viewport,
            debouncer: ResizeDebouncer::new(),
            cursor: None,
        });
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                state.bridge.terminate();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                state.debouncer.push(size.width, size.height, Instant::now());
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                state.viewport.scale_factor = scale_factor;
                let size = state.window.inner_size();
                state.debouncer.push(size.width, size.height, Instant::now());
            }
            WindowEvent::CursorMoved { position, .. } => {
                state.cursor = Some((position.x, position.y));
            }
            WindowEvent::CursorLeft { .. } => {
                state.cursor = None;
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if let Some((cx, cy)) = state.cursor {
                    let (x, y) = cursor_to_canvas(cx, cy, state.viewport.height);
                    if state
                        .bridge
                        .send(Command::Shockwave { x, y, strength: 1.0 })
                        .is_err()
                    {
                        log::error!("simulation thread is gone");
                        event_loop.exit();
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y * LINE_SCROLL_FORCE,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32,
                };
                if amount != 0.0 {
                    let _ = state.bridge.send(Command::ScrollForce {
                        force: amount.abs(),
                        direction: amount.signum(),
                    });
                }
            }
            WindowEvent::Occluded(occluded) => {
                let _ = state.bridge.send(Command::SetPaused(occluded));
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let override_patch = self.override_patch.clone();
        let Some(state) = self.state.as_mut() else {
            return;
        };

        if let Some((width, height)) = state.debouncer.poll(Instant::now()) {
            let scale_factor = state.window.scale_factor();
            let flipped = state.viewport.apply_resize(width, height, scale_factor);
            let _ = state.bridge.send(Command::Resize { width, height });
            if flipped {
                let mut settings = Settings::preset(state.viewport.mobile());
                if let Some(patch) = &override_patch {
                    patch.apply(&mut settings);
                }
                log::info!(
                    "viewport reclassified: {} preset",
                    if state.viewport.mobile() { "mobile" } else { "desktop" }
                );
                let _ = state
                    .bridge
                    .send(Command::UpdateSettings(Box::new(settings)));
            }
        }

        while let Some(event) = state.bridge.poll_event() {
            match event {
                Event::Initialized => log::info!("simulation thread initialized"),
                Event::Metrics(metrics) => {
                    log::trace!("metrics: {metrics:?}");
                }
                Event::StateUpdate { positions, .. } => {
                    log::trace!("state snapshot: {} bodies", positions.len() / 2);
                }
                Event::Fault(message) => {
                    log::error!("simulation fault: {message}");
                    state.bridge.terminate();
                    event_loop.exit();
                    return;
                }
            }
        }
    }
}
