//! Small 2D math helpers shared by the simulation and palette code.

use glam::Vec2;

/// Cubic Hermite interpolation between 0 and 1 (clamped).
///
/// Matches the GLSL `smoothstep(0.0, 1.0, t)` curve. Used for the radial
/// gravity falloff so the field fades smoothly to zero at the planet surface.
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Per-step multiplier for an exponential decay with the given half-life
/// expressed as a plain retention factor.
///
/// `decay_factor(0.9, dt, reference_dt)` keeps 90% of the value per
/// `reference_dt` seconds regardless of the actual step size.
#[inline]
pub fn decay_factor(retention: f32, dt: f32, reference_dt: f32) -> f32 {
    if reference_dt <= 0.0 {
        return retention;
    }
    retention.powf(dt / reference_dt)
}

/// Angular position of `point` around `center`, normalized to [0, 1).
///
/// 0 is along +x; the value increases counter-clockwise. Feeds the palette
/// lookup so body color follows position around the planet.
#[inline]
pub fn normalized_angle(center: Vec2, point: Vec2) -> f32 {
    let delta = point - center;
    if delta.length_squared() < 1e-12 {
        return 0.0;
    }
    let a = delta.y.atan2(delta.x);
    let t = a / std::f32::consts::TAU;
    t - t.floor()
}

/// Fixed-size arena of scratch vectors handed out round-robin.
///
/// A returned value is only valid until `capacity` further `get()` calls
/// have been made; callers must not hold an index across a full pool cycle.
pub struct VecPool {
    slots: Vec<Vec2>,
    next: usize,
}

impl VecPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![Vec2::ZERO; capacity.max(1)],
            next: 0,
        }
    }

    /// Claim the next scratch slot, overwriting whatever it held.
    pub fn get(&mut self, value: Vec2) -> Vec2 {
        let idx = self.next;
        self.next = (self.next + 1) % self.slots.len();
        self.slots[idx] = value;
        self.slots[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothstep_endpoints() {
        assert_eq!(smoothstep(-1.0), 0.0);
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(1.0), 1.0);
        assert_eq!(smoothstep(2.0), 1.0);
        assert!((smoothstep(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn smoothstep_monotone() {
        let mut prev = 0.0;
        for i in 0..=100 {
            let v = smoothstep(i as f32 / 100.0);
            assert!(v >= prev);
            prev = v;
        }
    }

    #[test]
    fn decay_factor_matches_reference_step() {
        let f = decay_factor(0.9, 1.0 / 60.0, 1.0 / 60.0);
        assert!((f - 0.9).abs() < 1e-6);
        // Two half-size steps compose to one reference step.
        let half = decay_factor(0.9, 1.0 / 120.0, 1.0 / 60.0);
        assert!((half * half - 0.9).abs() < 1e-5);
    }

    #[test]
    fn normalized_angle_quadrants() {
        let c = Vec2::ZERO;
        assert!((normalized_angle(c, Vec2::X) - 0.0).abs() < 1e-6);
        assert!((normalized_angle(c, Vec2::Y) - 0.25).abs() < 1e-6);
        assert!((normalized_angle(c, -Vec2::X) - 0.5).abs() < 1e-6);
        assert!((normalized_angle(c, -Vec2::Y) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn vec_pool_cycles_round_robin() {
        let mut pool = VecPool::new(4);
        for i in 0..8 {
            let v = pool.get(Vec2::splat(i as f32));
            assert_eq!(v, Vec2::splat(i as f32));
        }
    }
}
