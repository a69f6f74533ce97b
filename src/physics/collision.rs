//! Impulse-based narrow-phase resolution for circle-circle contacts.

use glam::Vec2;

use super::grid::CollisionPair;

/// Fraction of the remaining overlap removed per resolution pass.
const CORRECTION_FACTOR: f32 = 0.8;
/// Overlap below this is left to the next step rather than corrected.
const CORRECTION_SLOP: f32 = 1e-3;

/// Mass of a body from its radius, area-based with unit density.
#[inline]
pub fn body_mass(radius: f32) -> f32 {
    std::f32::consts::PI * radius * radius
}

/// Resolve every detected pair in order: positional correction split by
/// inverse mass, then a restitution impulse along the contact normal and a
/// Coulomb-clamped friction impulse along the tangent.
///
/// `positions` and `velocities` are the interleaved x,y slab views.
pub fn resolve_pairs(
    pairs: &[CollisionPair],
    positions: &mut [f32],
    velocities: &mut [f32],
    radii: &[f32],
    restitution: f32,
    friction: f32,
) {
    for pair in pairs {
        let (a, b) = (pair.index_a, pair.index_b);
        let inv_mass_a = 1.0 / body_mass(radii[a]);
        let inv_mass_b = 1.0 / body_mass(radii[b]);
        let inv_mass_sum = inv_mass_a + inv_mass_b;
        let normal = pair.normal;

        // Push the bodies apart, heavier body moves less.
        let correction = (pair.overlap - CORRECTION_SLOP).max(0.0) * CORRECTION_FACTOR
            / inv_mass_sum;
        let shift_a = -normal * correction * inv_mass_a;
        let shift_b = normal * correction * inv_mass_b;
        positions[2 * a] += shift_a.x;
        positions[2 * a + 1] += shift_a.y;
        positions[2 * b] += shift_b.x;
        positions[2 * b + 1] += shift_b.y;

        let va = Vec2::new(velocities[2 * a], velocities[2 * a + 1]);
        let vb = Vec2::new(velocities[2 * b], velocities[2 * b + 1]);
        let relative = vb - va;
        let approach = relative.dot(normal);
        // Separating already; no impulse.
        if approach > 0.0 {
            continue;
        }

        let impulse = -(1.0 + restitution) * approach / inv_mass_sum;
        let mut delta_a = -normal * impulse * inv_mass_a;
        let mut delta_b = normal * impulse * inv_mass_b;

        // Friction: oppose the tangential slide, clamped by the normal
        // impulse magnitude.
        let tangential = relative - normal * approach;
        let slide = tangential.length();
        if slide > 1e-6 && friction > 0.0 {
            let tangent = tangential / slide;
            let friction_impulse = (slide / inv_mass_sum).min(friction * impulse);
            delta_a += tangent * friction_impulse * inv_mass_a;
            delta_b -= tangent * friction_impulse * inv_mass_b;
        }

        velocities[2 * a] += delta_a.x;
        velocities[2 * a + 1] += delta_a.y;
        velocities[2 * b] += delta_b.x;
        velocities[2 * b + 1] += delta_b.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head_on_pair() -> CollisionPair {
        CollisionPair {
            index_a: 0,
            index_b: 1,
            overlap: 0.1,
            normal: Vec2::X,
        }
    }

    #[test]
    fn head_on_equal_masses_exchange_velocity_at_full_restitution() {
        let mut positions = vec![0.0, 0.0, 0.9, 0.0];
        let mut velocities = vec![1.0, 0.0, -1.0, 0.0];
        let radii = [0.5, 0.5];

        resolve_pairs(
            &[head_on_pair()],
            &mut positions,
            &mut velocities,
            &radii,
            1.0,
            0.0,
        );

        assert!((velocities[0] - -1.0).abs() < 1e-5);
        assert!((velocities[2] - 1.0).abs() < 1e-5);
        // Momentum is conserved.
        assert!((velocities[0] + velocities[2]).abs() < 1e-5);
    }

    #[test]
    fn zero_restitution_kills_approach_velocity() {
        let mut positions = vec![0.0, 0.0, 0.9, 0.0];
        let mut velocities = vec![1.0, 0.0, -1.0, 0.0];
        let radii = [0.5, 0.5];

        resolve_pairs(
            &[head_on_pair()],
            &mut positions,
            &mut velocities,
            &radii,
            0.0,
            0.0,
        );

        let relative = velocities[2] - velocities[0];
        assert!(relative.abs() < 1e-5);
    }

    #[test]
    fn positional_correction_reduces_overlap() {
        let mut positions = vec![0.0, 0.0, 0.9, 0.0];
        let mut velocities = vec![0.0; 4];
        let radii = [0.5, 0.5];

        resolve_pairs(
            &[head_on_pair()],
            &mut positions,
            &mut velocities,
            &radii,
            0.5,
            0.0,
        );

        let gap = positions[2] - positions[0];
        assert!(gap > 0.9);
        assert!(gap <= 1.0 + 1e-5);
    }

    #[test]
    fn separating_pair_gets_no_impulse() {
        let mut positions = vec![0.0, 0.0, 0.9, 0.0];
        let mut velocities = vec![-1.0, 0.0, 1.0, 0.0];
        let radii = [0.5, 0.5];

        resolve_pairs(
            &[head_on_pair()],
            &mut positions,
            &mut velocities,
            &radii,
            1.0,
            0.5,
        );

        assert_eq!(velocities[0], -1.0);
        assert_eq!(velocities[2], 1.0);
    }

    #[test]
    fn heavier_body_moves_less_during_correction() {
        let pair = CollisionPair {
            index_a: 0,
            index_b: 1,
            overlap: 0.2,
            normal: Vec2::X,
        };
        let mut positions = vec![0.0, 0.0, 1.0, 0.0];
        let mut velocities = vec![0.0; 4];
        let radii = [1.0, 0.2];

        resolve_pairs(&[pair], &mut positions, &mut velocities, &radii, 0.0, 0.0);

        let moved_a = positions[0].abs();
        let moved_b = (positions[2] - 1.0).abs();
        assert!(moved_b > moved_a * 5.0);
    }
}
