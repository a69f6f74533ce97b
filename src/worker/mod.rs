//! The simulation worker and its message protocol.
//!
//! The main thread and the simulation thread talk exclusively through the
//! tagged enums below. Commands are processed strictly in arrival order;
//! force commands mutate physics state cumulatively rather than queueing
//! future work, so a burst of input can never build a backlog.

mod bridge;
mod sim_loop;

pub use bridge::{InitPayload, WorkerBridge};

use crate::settings::Settings;

/// Main thread -> simulation thread.
///
/// There is no INIT variant: the thread is spawned with its init payload,
/// so a command arriving before initialization is unrepresentable.
#[derive(Debug)]
pub enum Command {
    /// Physical canvas size changed.
    Resize { width: u32, height: u32 },
    /// Pointer impulse at physical canvas coordinates (y-up).
    Shockwave { x: f32, y: f32, strength: f32 },
    /// Scroll input; `direction` is +1 up, -1 down.
    ScrollForce { force: f32, direction: f32 },
    SetPaused(bool),
    /// Atomically adopt a new settings snapshot.
    UpdateSettings(Box<Settings>),
    /// Request one `Event::StateUpdate`.
    GetState,
    /// Stop the loop and release GPU and window resources. No events are
    /// emitted after this is processed.
    Terminate,
}

/// Simulation thread -> main thread.
#[derive(Debug)]
pub enum Event {
    /// GPU and world are up; frames are being produced.
    Initialized,
    /// Snapshot answering `Command::GetState`. Positions are interleaved
    /// x,y in meters.
    StateUpdate { positions: Vec<f32>, angles: Vec<f32> },
    /// Periodic timing report, roughly once per second.
    Metrics(Metrics),
    /// Initialization or rendering failed fatally; the thread has exited.
    Fault(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub fps: f32,
    /// Mean physics step time over the report window, milliseconds.
    pub sim_ms: f32,
    /// Mean frame encode+submit time over the report window, milliseconds.
    pub render_ms: f32,
    pub body_count: usize,
}
