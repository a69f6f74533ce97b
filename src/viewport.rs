//! Main-thread viewport logic: device classification, resize debouncing,
//! and cursor coordinate conversion.
//!
//! Kept free of window handles so every policy here is testable with plain
//! values; the winit glue in `app` feeds it events and forwards its
//! decisions to the worker.

use std::time::{Duration, Instant};

/// Logical width at or below which the mobile preset is selected.
pub const MOBILE_BREAKPOINT: f32 = 768.0;

/// Resize bursts within this window collapse into one RESIZE command.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(100);

pub fn is_mobile(logical_width: f32) -> bool {
    logical_width <= MOBILE_BREAKPOINT
}

/// Convert a cursor position (physical pixels, y-down from the top-left,
/// as the windowing system reports it) into the renderer's y-up canvas
/// space.
pub fn cursor_to_canvas(x: f64, y: f64, canvas_height: u32) -> (f32, f32) {
    (x as f32, canvas_height as f32 - y as f32)
}

/// Coalesces resize notifications: the latest size wins, and nothing is
/// emitted until the burst has been quiet for the debounce window.
pub struct ResizeDebouncer {
    pending: Option<(u32, u32)>,
    quiet_since: Option<Instant>,
}

impl ResizeDebouncer {
    pub fn new() -> Self {
        Self {
            pending: None,
            quiet_since: None,
        }
    }

    pub fn push(&mut self, width: u32, height: u32, now: Instant) {
        self.pending = Some((width, height));
        self.quiet_since = Some(now);
    }

    /// The debounced size, once the burst has settled. Returns at most one
    /// size per burst.
    pub fn poll(&mut self, now: Instant) -> Option<(u32, u32)> {
        let since = self.quiet_since?;
        if now.duration_since(since) < RESIZE_DEBOUNCE {
            return None;
        }
        self.quiet_since = None;
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Default for ResizeDebouncer {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracked viewport state: physical size, scale factor, and the preset
/// classification derived from them.
#[derive(Debug, Clone, Copy)]
pub struct ViewportState {
    pub width: u32,
    pub height: u32,
    pub scale_factor: f64,
}

impl ViewportState {
    pub fn new(width: u32, height: u32, scale_factor: f64) -> Self {
        Self {
            width,
            height,
            scale_factor,
        }
    }

    pub fn logical_width(&self) -> f32 {
        self.width as f32 / self.scale_factor.max(0.01) as f32
    }

    pub fn mobile(&self) -> bool {
        is_mobile(self.logical_width())
    }

    /// Apply a new size; returns true if the mobile classification flipped
    /// (which warrants a settings update, not a restart).
    pub fn apply_resize(&mut self, width: u32, height: u32, scale_factor: f64) -> bool {
        let was_mobile = self.mobile();
        self.width = width;
        self.height = height;
        self.scale_factor = scale_factor;
        self.mobile() != was_mobile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_threshold() {
        assert!(is_mobile(320.0));
        assert!(is_mobile(MOBILE_BREAKPOINT));
        assert!(!is_mobile(MOBILE_BREAKPOINT + 1.0));
        assert!(!is_mobile(1920.0));
    }

    #[test]
    fn classification_uses_logical_width() {
        // 1500 physical at 2x DPR is 750 logical: mobile.
        let state = ViewportState::new(1500, 2000, 2.0);
        assert!(state.mobile());
        let state = ViewportState::new(1500, 2000, 1.0);
        assert!(!state.mobile());
    }

    #[test]
    fn resize_flips_classification_once() {
        let mut state = ViewportState::new(1920, 1080, 1.0);
        assert!(!state.apply_resize(1800, 1080, 1.0));
        assert!(state.apply_resize(700, 1080, 1.0));
        assert!(!state.apply_resize(650, 1080, 1.0));
        assert!(state.apply_resize(1024, 768, 1.0));
    }

    #[test]
    fn debouncer_coalesces_bursts() {
        let mut debouncer = ResizeDebouncer::new();
        let t0 = Instant::now();

        debouncer.push(800, 600, t0);
        debouncer.push(810, 600, t0 + Duration::from_millis(30));
        debouncer.push(820, 610, t0 + Duration::from_millis(60));

        // Still inside the burst.
        assert_eq!(debouncer.poll(t0 + Duration::from_millis(100)), None);
        // Quiet long enough: the last size wins, exactly once.
        let settled = t0 + Duration::from_millis(60) + RESIZE_DEBOUNCE;
        assert_eq!(debouncer.poll(settled), Some((820, 610)));
        assert_eq!(debouncer.poll(settled + Duration::from_secs(1)), None);
    }

    #[test]
    fn cursor_conversion_flips_y() {
        let (x, y) = cursor_to_canvas(100.0, 50.0, 600);
        assert_eq!(x, 100.0);
        assert_eq!(y, 550.0);
        // Bottom of the window maps to canvas y = 0.
        let (_, y) = cursor_to_canvas(0.0, 600.0, 600);
        assert_eq!(y, 0.0);
    }
}
