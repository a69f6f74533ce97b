//! The authoritative simulation world.
//!
//! Owns the body slabs, steps them on a fixed timestep, and applies the
//! radial gravity field, damping, collisions, wall and planet contacts, and
//! externally injected forces (shockwaves, scroll).
//!
//! Physics runs in a "meters" unit space; canvas dimensions, cursor
//! coordinates, and configured pixel radii are converted once at the
//! boundary with [`PIXELS_PER_METER`] and never mixed inside the step.

use glam::Vec2;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::math::{decay_factor, normalized_angle, smoothstep};
use crate::palette::{pack_rgba, PaletteCache};
use crate::settings::Settings;
use crate::slabs::{BodySlabs, MAX_BODIES};

use super::collision::resolve_pairs;
use super::grid::{CollisionPair, SpatialGrid};

/// Fixed conversion between render pixel space and physics meter space.
pub const PIXELS_PER_METER: f32 = 100.0;

/// Resize deltas at or below this many pixels only retarget the projection;
/// physics geometry is left alone so sub-pixel layout jitter cannot thrash
/// the world.
pub const RESIZE_JITTER_PX: f32 = 2.0;

/// Accumulated scroll force below this magnitude is treated as zero.
const SCROLL_DEADBAND: f32 = 1e-3;

const SCROLL_REFERENCE_DT: f32 = 1.0 / 60.0;

pub struct PhysicsEngine {
    settings: Settings,
    width_px: f32,
    height_px: f32,
    /// World center in meters. The planet sits here.
    center: Vec2,
    /// Planet collider radius in meters.
    planet_radius: f32,
    slabs: BodySlabs,
    /// Per-body angular velocity (rad/s). Engine-internal; only the
    /// integrated angle crosses to the renderer.
    spins: Vec<f32>,
    grid: SpatialGrid,
    pairs: Vec<CollisionPair>,
    palette: PaletteCache,
    scroll_force: f32,
    accumulator: f32,
    /// Set when radii or colors changed and the static GPU region must be
    /// re-uploaded. Consumed by the render loop.
    static_dirty: bool,
}

impl PhysicsEngine {
    pub fn new(settings: Settings, width_px: f32, height_px: f32) -> Self {
        let mut engine = Self {
            settings,
            width_px,
            height_px,
            center: Vec2::ZERO,
            planet_radius: 0.0,
            slabs: BodySlabs::new(MAX_BODIES),
            spins: vec![0.0; MAX_BODIES],
            grid: SpatialGrid::new(Vec2::ZERO, Vec2::ONE, 0.1, MAX_BODIES),
            pairs: Vec::new(),
            palette: PaletteCache::new(),
            scroll_force: 0.0,
            accumulator: 0.0,
            static_dirty: false,
        };
        engine.rebuild_geometry();
        engine.recreate_bodies();
        engine
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn slabs(&self) -> &BodySlabs {
        &self.slabs
    }

    pub fn body_count(&self) -> usize {
        self.slabs.active()
    }

    pub fn canvas_size(&self) -> (f32, f32) {
        (self.width_px, self.height_px)
    }

    /// True once after any change that rewrote radii or colors.
    pub fn take_static_dirty(&mut self) -> bool {
        std::mem::take(&mut self.static_dirty)
    }

    fn min_dim_px(&self) -> f32 {
        self.width_px.min(self.height_px)
    }

    /// Distance from the canvas edge to the inner wall face: the wall
    /// collider is centered `wall_offset` inside the edge, so bodies stop
    /// half a thickness further in.
    fn wall_inset(&self) -> f32 {
        (self.settings.world.wall_offset + 0.5 * self.settings.world.wall_thickness)
            / PIXELS_PER_METER
    }

    fn max_body_radius(&self) -> f32 {
        self.settings.bodies.radius * (1.0 + self.settings.bodies.radius_variance)
            / PIXELS_PER_METER
    }

    /// Recompute center, planet, and the collision grid from the current
    /// canvas size. Body data is untouched.
    fn rebuild_geometry(&mut self) {
        let extent = Vec2::new(self.width_px, self.height_px) / PIXELS_PER_METER;
        self.center = extent * 0.5;
        self.planet_radius =
            self.settings.world.center_circle_radius * self.min_dim_px() / PIXELS_PER_METER;
        self.grid = SpatialGrid::new(
            Vec2::ZERO,
            extent,
            2.0 * self.max_body_radius(),
            MAX_BODIES,
        );
    }

    /// Deterministic placement: a centered grid scan over the inset canvas
    /// area, skipping cells inside the exclusion circle, tightened until it
    /// yields enough cells or the spacing bottoms out. Randomness only
    /// affects the per-body radius draw.
    fn recreate_bodies(&mut self) {
        let count = self.settings.bodies.count.min(MAX_BODIES);
        let inset = self.wall_inset();
        let usable = Vec2::new(self.width_px, self.height_px) / PIXELS_PER_METER
            - Vec2::splat(2.0 * inset);
        let exclusion = self
            .planet_radius
            .max(self.settings.world.start_radius * self.min_dim_px() / PIXELS_PER_METER);

        let area = (usable.x * usable.y).max(1e-6);
        let spread = (0.4 + self.settings.world.start_spread).clamp(0.5, 0.85);
        let mut spacing = (area / count.max(1) as f32).sqrt() * spread;

        let mut cells: Vec<Vec2> = Vec::new();
        for _ in 0..6 {
            cells.clear();
            let cols = (usable.x / spacing).floor().max(1.0) as usize;
            let rows = (usable.y / spacing).floor().max(1.0) as usize;
            let margin = (usable - Vec2::new(cols as f32, rows as f32) * spacing) * 0.5;
            'scan: for row in 0..rows {
                for col in 0..cols {
                    let p = Vec2::splat(inset)
                        + margin
                        + Vec2::new(col as f32 + 0.5, row as f32 + 0.5) * spacing;
                    if (p - self.center).length() > exclusion {
                        cells.push(p);
                        if cells.len() >= count {
                            break 'scan;
                        }
                    }
                }
            }
            if cells.len() >= count {
                break;
            }
            spacing *= 0.75;
        }

        let placed = cells.len().min(count);
        if placed < count {
            log::warn!(
                "placement grid exhausted: {} of {} bodies placed",
                placed,
                count
            );
        }
        self.slabs.set_active(placed);

        let mut rng = StdRng::seed_from_u64(self.settings.seed);
        let base_radius = self.settings.bodies.radius / PIXELS_PER_METER;
        let variance = self.settings.bodies.radius_variance;
        let level = self.settings.rendering.color_level;
        let steps = self.settings.rendering.color_steps;

        for (i, &p) in cells[..placed].iter().enumerate() {
            let factor = if variance > 0.0 {
                1.0 + rng.gen_range(-variance..=variance)
            } else {
                1.0
            };
            let angular = normalized_angle(self.center, p);
            // Clockwise tangent in y-up space, speed ramped by angular
            // position so the field starts with a coherent swirl.
            let delta = p - self.center;
            let tangent = Vec2::new(delta.y, -delta.x).normalize_or_zero();
            let speed =
                self.settings.simulation.initial_clockwise_velocity * (0.5 + 0.5 * angular);
            let velocity = tangent * speed;

            self.slabs.positions_mut()[2 * i] = p.x;
            self.slabs.positions_mut()[2 * i + 1] = p.y;
            self.slabs.velocities_mut()[2 * i] = velocity.x;
            self.slabs.velocities_mut()[2 * i + 1] = velocity.y;
            self.slabs.angles_mut()[i] = 0.0;
            self.slabs.radii_mut()[i] = base_radius * factor;
            let rgb = self.palette.color(level, angular, steps);
            self.slabs.colors_mut()[i] = pack_rgba(rgb, 1.0);
            self.spins[i] = speed / base_radius.max(1e-4) * 0.1;
        }

        self.static_dirty = true;
    }

    /// Rewrite packed colors in place from current angular positions.
    fn recolor_bodies(&mut self) {
        let level = self.settings.rendering.color_level;
        let steps = self.settings.rendering.color_steps;
        for i in 0..self.slabs.active() {
            let p = Vec2::new(
                self.slabs.positions()[2 * i],
                self.slabs.positions()[2 * i + 1],
            );
            let angular = normalized_angle(self.center, p);
            let rgb = self.palette.color(level, angular, steps);
            self.slabs.colors_mut()[i] = pack_rgba(rgb, 1.0);
        }
        self.static_dirty = true;
    }

    /// Push any body overlapping the planet radially to just outside its
    /// surface. Runs after planet rebuilds and resizes.
    fn eject_embedded(&mut self) {
        for i in 0..self.slabs.active() {
            let p = Vec2::new(
                self.slabs.positions()[2 * i],
                self.slabs.positions()[2 * i + 1],
            );
            let radius = self.slabs.radii()[i];
            let delta = p - self.center;
            let dist = delta.length();
            let min_dist = self.planet_radius + radius;
            if dist < min_dist {
                let dir = if dist > 1e-4 { delta / dist } else { Vec2::X };
                let q = self.center + dir * min_dist;
                self.slabs.positions_mut()[2 * i] = q.x;
                self.slabs.positions_mut()[2 * i + 1] = q.y;
            }
        }
    }

    /// Feed elapsed wall time into the fixed-timestep accumulator. At most
    /// one step runs per call; excess backlog beyond one step is discarded
    /// so a stalled frame cannot trigger a catch-up spiral.
    pub fn advance(&mut self, elapsed: f32) -> bool {
        let dt = self.settings.simulation.time_step;
        self.accumulator = (self.accumulator + elapsed).min(2.0 * dt);
        if self.accumulator >= dt {
            self.accumulator -= dt;
            self.step();
            return true;
        }
        false
    }

    /// One fixed timestep: forces, integration, collisions, contacts.
    pub fn step(&mut self) {
        let dt = self.settings.simulation.time_step;
        let sim = self.settings.simulation.clone();
        let count = self.slabs.active();
        let center = self.center;
        let planet_radius = self.planet_radius;
        // Reach of the gravity field: from the planet surface to the
        // farthest corner.
        let field_extent = (Vec2::new(self.width_px, self.height_px).length() * 0.5
            / PIXELS_PER_METER
            - planet_radius)
            .max(1e-3);

        // Scroll force decays every step and is applied as a uniform
        // vertical velocity change above the deadband.
        self.scroll_force *= decay_factor(
            self.settings.scroll.velocity_damping,
            dt,
            SCROLL_REFERENCE_DT,
        );
        let scroll_kick = if self.scroll_force.abs() > SCROLL_DEADBAND {
            self.scroll_force
        } else {
            0.0
        };

        for i in 0..count {
            let p = Vec2::new(
                self.slabs.positions()[2 * i],
                self.slabs.positions()[2 * i + 1],
            );
            let mut v = Vec2::new(
                self.slabs.velocities()[2 * i],
                self.slabs.velocities()[2 * i + 1],
            );

            let delta = p - center;
            let dist = delta.length();
            if dist > planet_radius && dist > 1e-4 {
                let outward = delta / dist;
                // Gravity fades to zero at the planet surface so settled
                // bodies are not catapulted back out.
                let depth = ((dist - planet_radius) / field_extent).clamp(0.0, 1.0);
                let pull = smoothstep(depth).powf(sim.gravity_ease) * sim.gravity;
                v -= outward * pull * dt;

                // Split velocity into radial and tangential components and
                // damp each independently.
                let radial_speed = v.dot(outward);
                let radial = outward * radial_speed;
                let tangential = v - radial;
                v -= tangential * (sim.tangential_damping * dt).min(1.0);
                v -= radial * (sim.radial_damping * dt).min(1.0);
            }

            v *= (1.0 - sim.linear_damping * dt).max(0.0);
            v.y += scroll_kick;

            let p = p + v * dt;
            self.slabs.positions_mut()[2 * i] = p.x;
            self.slabs.positions_mut()[2 * i + 1] = p.y;
            self.slabs.velocities_mut()[2 * i] = v.x;
            self.slabs.velocities_mut()[2 * i + 1] = v.y;

            self.spins[i] *= (1.0 - sim.angular_damping * dt).max(0.0);
            self.slabs.angles_mut()[i] += self.spins[i] * dt;
        }

        // Inter-body collisions.
        self.grid.rebuild(self.slabs.positions(), count);
        let mut pairs = std::mem::take(&mut self.pairs);
        self.grid
            .detect_collisions(self.slabs.positions(), self.slabs.radii(), &mut pairs);
        {
            let restitution = self.settings.bodies.restitution;
            let friction = self.settings.bodies.friction;
            let (positions, velocities, radii) = self.slabs.contact_views();
            resolve_pairs(
                &pairs,
                positions,
                velocities,
                radii,
                restitution,
                friction,
            );
        }
        self.pairs = pairs;

        self.resolve_wall_contacts();
        self.resolve_planet_contacts();

        if sim.max_speed > 0.0 {
            for i in 0..count {
                let v = Vec2::new(
                    self.slabs.velocities()[2 * i],
                    self.slabs.velocities()[2 * i + 1],
                );
                let speed = v.length();
                if speed > sim.max_speed {
                    let v = v * (sim.max_speed / speed);
                    self.slabs.velocities_mut()[2 * i] = v.x;
                    self.slabs.velocities_mut()[2 * i + 1] = v.y;
                }
            }
        }
    }

    fn resolve_wall_contacts(&mut self) {
        let inset = self.wall_inset();
        let extent = Vec2::new(self.width_px, self.height_px) / PIXELS_PER_METER;
        let restitution = self.settings.bodies.restitution;

        for i in 0..self.slabs.active() {
            let radius = self.slabs.radii()[i];
            let lo = Vec2::splat(inset) + Vec2::splat(radius);
            let hi = extent - Vec2::splat(inset) - Vec2::splat(radius);
            // Degenerate canvases collapse the interval; skip rather than
            // invert it.
            if lo.x > hi.x || lo.y > hi.y {
                continue;
            }

            let mut p = Vec2::new(
                self.slabs.positions()[2 * i],
                self.slabs.positions()[2 * i + 1],
            );
            let mut v = Vec2::new(
                self.slabs.velocities()[2 * i],
                self.slabs.velocities()[2 * i + 1],
            );

            if p.x < lo.x {
                p.x = lo.x;
                v.x = v.x.abs() * restitution;
            } else if p.x > hi.x {
                p.x = hi.x;
                v.x = -v.x.abs() * restitution;
            }
            if p.y < lo.y {
                p.y = lo.y;
                v.y = v.y.abs() * restitution;
            } else if p.y > hi.y {
                p.y = hi.y;
                v.y = -v.y.abs() * restitution;
            }

            self.slabs.positions_mut()[2 * i] = p.x;
            self.slabs.positions_mut()[2 * i + 1] = p.y;
            self.slabs.velocities_mut()[2 * i] = v.x;
            self.slabs.velocities_mut()[2 * i + 1] = v.y;
        }
    }

    /// Planet contact runs last so no body ever finishes a step embedded in
    /// the planet, whatever forces acted earlier.
    fn resolve_planet_contacts(&mut self) {
        let restitution = self.settings.bodies.restitution;
        for i in 0..self.slabs.active() {
            let radius = self.slabs.radii()[i];
            let p = Vec2::new(
                self.slabs.positions()[2 * i],
                self.slabs.positions()[2 * i + 1],
            );
            let delta = p - self.center;
            let dist = delta.length();
            let min_dist = self.planet_radius + radius;
            if dist >= min_dist {
                continue;
            }

            let outward = if dist > 1e-4 { delta / dist } else { Vec2::X };
            let q = self.center + outward * min_dist;
            self.slabs.positions_mut()[2 * i] = q.x;
            self.slabs.positions_mut()[2 * i + 1] = q.y;

            let mut v = Vec2::new(
                self.slabs.velocities()[2 * i],
                self.slabs.velocities()[2 * i + 1],
            );
            let inward = v.dot(outward);
            if inward < 0.0 {
                v -= outward * inward * (1.0 + restitution);
                self.slabs.velocities_mut()[2 * i] = v.x;
                self.slabs.velocities_mut()[2 * i + 1] = v.y;
            }
        }
    }

    /// Outward impulse from a point, in pixel coordinates. Clicking inside
    /// the planet fires the stronger center variant.
    pub fn apply_shockwave(&mut self, x_px: f32, y_px: f32, strength: f32) {
        let origin = Vec2::new(x_px, y_px) / PIXELS_PER_METER;
        let sw = &self.settings.shockwave;

        let center_hit = (origin - self.center).length() < self.planet_radius;
        let (force, radius, decay) = if center_hit {
            (
                sw.force * sw.center_force_multiplier,
                sw.radius * sw.center_radius_multiplier / PIXELS_PER_METER,
                sw.decay * sw.center_decay_multiplier,
            )
        } else {
            (sw.force, sw.radius / PIXELS_PER_METER, sw.decay)
        };
        let directionality = sw.directionality.clamp(0.0, 1.0);

        for i in 0..self.slabs.active() {
            let p = Vec2::new(
                self.slabs.positions()[2 * i],
                self.slabs.positions()[2 * i + 1],
            );
            let delta = p - origin;
            let dist = delta.length();
            if dist >= radius {
                continue;
            }

            let radial = if dist > 1e-4 { delta / dist } else { Vec2::Y };
            let dir = (radial * (1.0 - directionality) + Vec2::Y * directionality)
                .normalize_or(radial);
            let falloff = (1.0 - dist / radius).powf(decay.max(0.0));
            let kick = dir * force * falloff * strength;

            self.slabs.velocities_mut()[2 * i] += kick.x;
            self.slabs.velocities_mut()[2 * i + 1] += kick.y;
        }
    }

    /// Accumulate scroll input. `direction` is +1 for up, -1 for down; the
    /// accumulated value decays each step and is applied as a continuous
    /// vertical force, not a velocity set.
    pub fn apply_scroll_force(&mut self, force: f32, direction: f32) {
        self.scroll_force +=
            force.abs() * direction.signum() * self.settings.scroll.force_multiplier;
    }

    /// Atomically adopt a new settings snapshot, running whichever
    /// structural rebuilds the change requires.
    pub fn update_settings(&mut self, new: Settings) {
        let old = std::mem::replace(&mut self.settings, new);

        let planet_rebuild = self.settings.requires_planet_rebuild(&old);
        let body_rebuild = self.settings.requires_body_rebuild(&old);
        let recolor = self.settings.rendering != old.rendering;

        if planet_rebuild {
            self.rebuild_geometry();
        }
        if body_rebuild {
            self.recreate_bodies();
        } else if planet_rebuild {
            self.eject_embedded();
        }
        if recolor && !body_rebuild {
            self.recolor_bodies();
        }
    }

    /// Adopt a new canvas size. Returns true if physics geometry changed
    /// (deltas within the jitter tolerance only retarget the projection).
    pub fn resize(&mut self, width_px: f32, height_px: f32) -> bool {
        if (width_px - self.width_px).abs() <= RESIZE_JITTER_PX
            && (height_px - self.height_px).abs() <= RESIZE_JITTER_PX
        {
            return false;
        }
        self.width_px = width_px;
        self.height_px = height_px;
        self.rebuild_geometry();
        self.eject_embedded();
        true
    }

    /// Copy out positions and angles for a state snapshot request.
    pub fn snapshot(&self) -> (Vec<f32>, Vec<f32>) {
        let n = self.slabs.active();
        (
            self.slabs.positions()[..2 * n].to_vec(),
            self.slabs.angles()[..n].to_vec(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn test_settings(count: usize) -> Settings {
        let mut s = Settings::desktop();
        s.bodies.count = count;
        s
    }

    #[test]
    fn initialization_is_deterministic() {
        let a = PhysicsEngine::new(test_settings(200), 800.0, 600.0);
        let b = PhysicsEngine::new(test_settings(200), 800.0, 600.0);

        assert_eq!(a.body_count(), b.body_count());
        let n = a.body_count();
        assert_eq!(
            a.slabs().positions()[..2 * n],
            b.slabs().positions()[..2 * n]
        );
        assert_eq!(a.slabs().radii()[..n], b.slabs().radii()[..n]);
        assert_eq!(a.slabs().colors()[..n], b.slabs().colors()[..n]);
    }

    #[test]
    fn placement_reaches_target_count() {
        let engine = PhysicsEngine::new(test_settings(500), 1280.0, 720.0);
        assert_eq!(engine.body_count(), 500);
    }

    #[test]
    fn placement_avoids_planet() {
        let engine = PhysicsEngine::new(test_settings(300), 800.0, 600.0);
        for i in 0..engine.body_count() {
            let p = Vec2::new(
                engine.slabs().positions()[2 * i],
                engine.slabs().positions()[2 * i + 1],
            );
            assert!((p - engine.center).length() > engine.planet_radius);
        }
    }

    #[test]
    fn body_on_surface_stays_settled() {
        let mut settings = test_settings(1);
        settings.simulation.initial_clockwise_velocity = 0.0;
        let mut engine = PhysicsEngine::new(settings, 800.0, 600.0);
        assert_eq!(engine.body_count(), 1);

        // Park the body exactly on the planet surface, at rest.
        let radius = engine.slabs().radii()[0];
        let surface = engine.center + Vec2::X * (engine.planet_radius + radius);
        engine.slabs.positions_mut()[0] = surface.x;
        engine.slabs.positions_mut()[1] = surface.y;
        engine.slabs.velocities_mut()[0] = 0.0;
        engine.slabs.velocities_mut()[1] = 0.0;

        for _ in 0..120 {
            engine.step();
        }
        let p = Vec2::new(engine.slabs().positions()[0], engine.slabs().positions()[1]);
        let dist = (p - engine.center).length();
        assert!((dist - (engine.planet_radius + radius)).abs() < 1e-3);
    }

    #[test]
    fn init_and_step_scenario_keeps_bodies_out_of_planet() {
        let mut settings = Settings::desktop();
        settings.bodies.count = 100;
        settings.simulation.gravity = 80.0;
        settings.simulation.time_step = 1.0;
        settings.world.center_circle_radius = 0.3;
        let mut engine = PhysicsEngine::new(settings, 800.0, 600.0);
        assert_eq!(engine.body_count(), 100);

        engine.step();

        let min_dist_px = 0.3 * 600.0 * 0.99;
        for i in 0..engine.body_count() {
            let p = Vec2::new(
                engine.slabs().positions()[2 * i],
                engine.slabs().positions()[2 * i + 1],
            );
            assert!(p.x.is_finite() && p.y.is_finite());
            let dist_px = (p - engine.center).length() * PIXELS_PER_METER;
            assert!(dist_px >= min_dist_px, "body {i} at {dist_px} px");
        }
    }

    #[test]
    fn wall_face_accounts_for_thickness() {
        let mut settings = test_settings(1);
        settings.simulation.initial_clockwise_velocity = 0.0;
        settings.simulation.gravity = 0.0;
        let mut engine = PhysicsEngine::new(settings, 800.0, 600.0);
        assert_eq!(engine.body_count(), 1);

        // Drive the body into the left wall.
        engine.slabs.positions_mut()[0] = 0.01;
        engine.slabs.positions_mut()[1] = engine.center.y;
        engine.slabs.velocities_mut()[0] = -1.0;
        engine.slabs.velocities_mut()[1] = 0.0;
        engine.step();

        let world = engine.settings().world.clone();
        let inset = (world.wall_offset + 0.5 * world.wall_thickness) / PIXELS_PER_METER;
        let radius = engine.slabs().radii()[0];
        let x = engine.slabs().positions()[0];
        assert!((x - (inset + radius)).abs() < 1e-4);
        // Bounce is outward.
        assert!(engine.slabs().velocities()[0] >= 0.0);
    }

    #[test]
    fn shockwave_falloff_is_monotone() {
        let mut settings = test_settings(2);
        settings.shockwave.directionality = 0.0;
        let mut engine = PhysicsEngine::new(settings, 800.0, 600.0);
        assert_eq!(engine.body_count(), 2);

        // Two bodies along +x from a corner origin, zero velocity.
        let origin = Vec2::new(0.5, 0.5);
        let radius_m = engine.settings.shockwave.radius / PIXELS_PER_METER;
        let near = origin + Vec2::X * (radius_m * 0.2);
        let far = origin + Vec2::X * (radius_m * 0.7);
        for (i, p) in [near, far].into_iter().enumerate() {
            engine.slabs.positions_mut()[2 * i] = p.x;
            engine.slabs.positions_mut()[2 * i + 1] = p.y;
            engine.slabs.velocities_mut()[2 * i] = 0.0;
            engine.slabs.velocities_mut()[2 * i + 1] = 0.0;
        }

        engine.apply_shockwave(
            origin.x * PIXELS_PER_METER,
            origin.y * PIXELS_PER_METER,
            1.0,
        );

        let kick = |i: usize| {
            Vec2::new(
                engine.slabs().velocities()[2 * i],
                engine.slabs().velocities()[2 * i + 1],
            )
            .length()
        };
        assert!(kick(0) > 0.0);
        assert!(kick(0) >= kick(1));
        // Push is away from the origin.
        assert!(engine.slabs().velocities()[0] > 0.0);
    }

    #[test]
    fn scroll_force_decays_to_zero() {
        let mut engine = PhysicsEngine::new(test_settings(10), 800.0, 600.0);
        engine.apply_scroll_force(100.0, 1.0);
        let initial = engine.scroll_force;
        assert!(initial > 0.0);

        for _ in 0..600 {
            engine.step();
        }
        assert!(engine.scroll_force.abs() < SCROLL_DEADBAND * 10.0);
    }

    #[test]
    fn small_resize_is_projection_only() {
        let mut engine = PhysicsEngine::new(test_settings(50), 800.0, 600.0);
        let planet_before = engine.planet_radius;
        assert!(!engine.resize(801.0, 600.0));
        assert_eq!(engine.planet_radius, planet_before);

        assert!(engine.resize(1000.0, 900.0));
        assert!(engine.planet_radius > planet_before);
    }

    #[test]
    fn growing_planet_ejects_embedded_bodies() {
        let mut engine = PhysicsEngine::new(test_settings(100), 800.0, 600.0);
        let mut settings = engine.settings().clone();
        settings.world.center_circle_radius = 0.45;
        engine.update_settings(settings);

        for i in 0..engine.body_count() {
            let p = Vec2::new(
                engine.slabs().positions()[2 * i],
                engine.slabs().positions()[2 * i + 1],
            );
            let radius = engine.slabs().radii()[i];
            let dist = (p - engine.center).length();
            assert!(dist >= engine.planet_radius + radius - 1e-4);
        }
    }

    #[test]
    fn numeric_settings_change_keeps_bodies() {
        let mut engine = PhysicsEngine::new(test_settings(100), 800.0, 600.0);
        let before = engine.slabs().positions()[..20].to_vec();

        let mut settings = engine.settings().clone();
        settings.simulation.gravity *= 3.0;
        settings.bodies.friction = 0.9;
        engine.update_settings(settings);

        assert_eq!(&engine.slabs().positions()[..20], &before[..]);
    }

    #[test]
    fn body_count_change_recreates_bodies() {
        let mut engine = PhysicsEngine::new(test_settings(100), 800.0, 600.0);
        let mut settings = engine.settings().clone();
        settings.bodies.count = 40;
        engine.update_settings(settings);
        assert_eq!(engine.body_count(), 40);
        assert!(engine.take_static_dirty());
    }

    #[test]
    fn steps_stay_finite_under_load() {
        let mut engine = PhysicsEngine::new(test_settings(400), 800.0, 600.0);
        engine.apply_shockwave(400.0, 300.0, 3.0);
        engine.apply_scroll_force(500.0, -1.0);
        for _ in 0..240 {
            engine.step();
        }
        for i in 0..engine.body_count() {
            assert!(engine.slabs().positions()[2 * i].is_finite());
            assert!(engine.slabs().positions()[2 * i + 1].is_finite());
            assert!(engine.slabs().velocities()[2 * i].is_finite());
        }
    }
}
