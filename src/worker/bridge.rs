//! Main-thread handle to the simulation thread.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

use winit::window::Window;

use crate::error::HeroError;
use crate::settings::Settings;

use super::{sim_loop, Command, Event};

/// Everything the simulation thread needs to start. Handing the window
/// clone over here is the one-way ownership transfer: after `spawn` the
/// main thread never touches the surface side of it again.
pub struct InitPayload {
    pub window: Arc<Window>,
    pub width: u32,
    pub height: u32,
    pub settings: Settings,
}

pub struct WorkerBridge {
    commands: mpsc::Sender<Command>,
    events: mpsc::Receiver<Event>,
    /// Taken on the first terminate, making repeat calls no-ops.
    handle: Option<JoinHandle<()>>,
}

impl WorkerBridge {
    /// Spawn the simulation thread with its init payload.
    pub fn spawn(payload: InitPayload) -> Result<Self, HeroError> {
        let (command_tx, command_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        let handle = std::thread::Builder::new()
            .name("gravwell-sim".into())
            .spawn(move || sim_loop::run(payload, command_rx, event_tx))?;

        Ok(Self {
            commands: command_tx,
            events: event_rx,
            handle: Some(handle),
        })
    }

    pub fn send(&self, command: Command) -> Result<(), HeroError> {
        self.commands.send(command).map_err(|_| HeroError::WorkerGone)
    }

    /// Non-blocking event poll; the main thread drains this from its event
    /// loop.
    pub fn poll_event(&self) -> Option<Event> {
        self.events.try_recv().ok()
    }

    /// Send `Terminate` and join the thread. Safe to call any number of
    /// times; only the first does anything.
    pub fn terminate(&mut self) {
        if let Some(handle) = self.handle.take() {
            // A send error just means the thread already exited.
            let _ = self.commands.send(Command::Terminate);
            if handle.join().is_err() {
                log::error!("simulation thread panicked during shutdown");
            }
        }
    }

    #[cfg(test)]
    fn from_parts(
        commands: mpsc::Sender<Command>,
        events: mpsc::Receiver<Event>,
        handle: JoinHandle<()>,
    ) -> Self {
        Self {
            commands,
            events,
            handle: Some(handle),
        }
    }
}

impl Drop for WorkerBridge {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A stand-in worker that behaves like the real loop at the protocol
    /// level: drains commands in order, answers GetState, stops on
    /// Terminate and sends nothing afterwards.
    fn stub_bridge() -> WorkerBridge {
        let (command_tx, command_rx) = mpsc::channel::<Command>();
        let (event_tx, event_rx) = mpsc::channel::<Event>();
        let handle = std::thread::spawn(move || {
            event_tx.send(Event::Initialized).unwrap();
            while let Ok(command) = command_rx.recv() {
                match command {
                    Command::GetState => {
                        event_tx
                            .send(Event::StateUpdate {
                                positions: vec![1.0, 2.0],
                                angles: vec![0.5],
                            })
                            .unwrap();
                    }
                    Command::Terminate => return,
                    _ => {}
                }
            }
        });
        WorkerBridge::from_parts(command_tx, event_rx, handle)
    }

    #[test]
    fn terminate_is_idempotent() {
        let mut bridge = stub_bridge();
        bridge.terminate();
        bridge.terminate();
        bridge.terminate();
    }

    #[test]
    fn send_after_terminate_reports_worker_gone() {
        let mut bridge = stub_bridge();
        bridge.terminate();
        let result = bridge.send(Command::GetState);
        assert!(matches!(result, Err(HeroError::WorkerGone)));
    }

    #[test]
    fn get_state_round_trip() {
        let bridge = stub_bridge();
        bridge.send(Command::GetState).unwrap();

        let mut saw_state = false;
        for _ in 0..100 {
            match bridge.poll_event() {
                Some(Event::StateUpdate { positions, angles }) => {
                    assert_eq!(positions, vec![1.0, 2.0]);
                    assert_eq!(angles, vec![0.5]);
                    saw_state = true;
                    break;
                }
                Some(_) => {}
                None => std::thread::sleep(std::time::Duration::from_millis(5)),
            }
        }
        assert!(saw_state);
    }

    #[test]
    fn drop_joins_the_thread() {
        let bridge = stub_bridge();
        drop(bridge);
    }
}
