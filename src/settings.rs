//! Simulation configuration.
//!
//! Settings are nested typed groups with a desktop baseline and a mobile
//! override expressed as a partial patch. Merging is an explicit
//! field-by-field operation (`SettingsPatch::apply`), so every overridable
//! field is enumerable and the precedence order is the code you can read,
//! not a structural deep-merge.
//!
//! A `gravwell.toml` next to the binary, if present, is loaded as one more
//! patch over the selected preset for local tuning.

use std::path::Path;

use serde::Deserialize;

use crate::error::HeroError;

/// Complete, immutable settings snapshot. Applied atomically; the physics
/// engine compares snapshots to decide which structural rebuilds a change
/// requires.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub simulation: SimulationSettings,
    pub bodies: BodySettings,
    pub world: WorldSettings,
    pub shockwave: ShockwaveSettings,
    pub scroll: ScrollSettings,
    pub rendering: RenderSettings,
    /// RNG seed for the per-body radius variance draw. Placement itself is
    /// deterministic; this is the only source of randomness.
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    /// Radial gravity coefficient toward the planet center.
    pub gravity: f32,
    /// Fixed timestep in seconds.
    pub time_step: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Damping applied to the velocity component perpendicular to the
    /// radius vector (kills orbital shear over time).
    pub tangential_damping: f32,
    /// Damping applied to the velocity component along the radius vector.
    pub radial_damping: f32,
    /// Tangential speed given to each body at creation, scaled by its
    /// angular position, so the whole field starts with a coherent spin.
    pub initial_clockwise_velocity: f32,
    /// Exponent applied to the smoothstep gravity falloff.
    pub gravity_ease: f32,
    /// Hard speed clamp after integration. 0 disables the clamp.
    pub max_speed: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodySettings {
    pub count: usize,
    /// Base radius in pixels.
    pub radius: f32,
    /// Fractional variance: each body draws its radius from
    /// `radius * (1 +/- variance)`.
    pub radius_variance: f32,
    pub restitution: f32,
    pub friction: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorldSettings {
    /// Planet radius as a fraction of the smaller canvas dimension.
    pub center_circle_radius: f32,
    /// Wall collider thickness in pixels; the inner wall face sits at
    /// `wall_offset + wall_thickness / 2` from the canvas edge.
    pub wall_thickness: f32,
    pub wall_offset: f32,
    /// Placement grid start radius and spread, as fractions of the smaller
    /// canvas dimension.
    pub start_radius: f32,
    pub start_spread: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShockwaveSettings {
    pub force: f32,
    /// Effect radius in pixels.
    pub radius: f32,
    /// Falloff exponent: impulse scales with `(1 - d/R)^decay`.
    pub decay: f32,
    /// 0 = purely radial push; 1 = purely upward. Values between blend.
    pub directionality: f32,
    /// Multipliers for the stronger variant fired by clicking the planet
    /// itself.
    pub center_force_multiplier: f32,
    pub center_radius_multiplier: f32,
    pub center_decay_multiplier: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrollSettings {
    pub force_multiplier: f32,
    /// Per-reference-step retention of the accumulated scroll force.
    pub velocity_damping: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub color_level: u8,
    pub color_steps: usize,
    /// 0 draws circles; >= 3 draws regular polygons with that many sides.
    pub shape_sides: u32,
}

impl Settings {
    /// Desktop baseline. Every other configuration is a patch over this.
    pub fn desktop() -> Self {
        Self {
            simulation: SimulationSettings {
                gravity: 40.0,
                time_step: 1.0 / 60.0,
                linear_damping: 0.4,
                angular_damping: 0.6,
                tangential_damping: 0.25,
                radial_damping: 0.15,
                initial_clockwise_velocity: 1.2,
                gravity_ease: 1.0,
                max_speed: 25.0,
            },
            bodies: BodySettings {
                count: 600,
                radius: 5.0,
                radius_variance: 0.45,
                restitution: 0.35,
                friction: 0.2,
            },
            world: WorldSettings {
                center_circle_radius: 0.18,
                wall_thickness: 50.0,
                wall_offset: 4.0,
                start_radius: 0.3,
                start_spread: 0.45,
            },
            shockwave: ShockwaveSettings {
                force: 12.0,
                radius: 260.0,
                decay: 1.0,
                directionality: 0.0,
                center_force_multiplier: 2.0,
                center_radius_multiplier: 1.5,
                center_decay_multiplier: 1.0,
            },
            scroll: ScrollSettings {
                force_multiplier: 0.015,
                velocity_damping: 0.92,
            },
            rendering: RenderSettings {
                color_level: 4,
                color_steps: 256,
                shape_sides: 0,
            },
            seed: 0x67726176,
        }
    }

    /// Mobile preset: the desktop baseline with the mobile patch applied.
    pub fn mobile() -> Self {
        let mut settings = Self::desktop();
        Self::mobile_patch().apply(&mut settings);
        settings
    }

    /// The partial override that turns the desktop preset into the mobile
    /// one. Kept as a patch so the two presets cannot silently diverge on
    /// fields mobile does not care about.
    pub fn mobile_patch() -> SettingsPatch {
        SettingsPatch {
            simulation: SimulationPatch {
                gravity: Some(30.0),
                ..Default::default()
            },
            bodies: BodyPatch {
                count: Some(250),
                radius: Some(4.0),
                ..Default::default()
            },
            shockwave: ShockwavePatch {
                force: Some(8.0),
                radius: Some(180.0),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn preset(mobile: bool) -> Self {
        if mobile {
            Self::mobile()
        } else {
            Self::desktop()
        }
    }

    /// Load a local override patch from a TOML file, if it exists.
    pub fn load_override(path: &Path) -> Result<Option<SettingsPatch>, HeroError> {
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)?;
        let patch: SettingsPatch = toml::from_str(&text)?;
        log::info!("loaded settings override from {}", path.display());
        Ok(Some(patch))
    }

    /// True if moving from `old` to `self` requires destroying and
    /// recreating the body batch.
    pub fn requires_body_rebuild(&self, old: &Settings) -> bool {
        self.bodies.count != old.bodies.count
            || self.bodies.radius != old.bodies.radius
            || self.bodies.radius_variance != old.bodies.radius_variance
            || self.world.start_radius != old.world.start_radius
            || self.world.start_spread != old.world.start_spread
            || self.seed != old.seed
    }

    /// True if moving from `old` to `self` requires rebuilding the planet
    /// collider (and ejecting any body the larger planet now overlaps).
    pub fn requires_planet_rebuild(&self, old: &Settings) -> bool {
        self.world.center_circle_radius != old.world.center_circle_radius
            || self.world.wall_thickness != old.world.wall_thickness
            || self.world.wall_offset != old.world.wall_offset
    }
}

// === Patches ===
//
// One Option per overridable field. `apply` is the whole merge policy:
// Some wins, None keeps the target's value.

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsPatch {
    pub simulation: SimulationPatch,
    pub bodies: BodyPatch,
    pub world: WorldPatch,
    pub shockwave: ShockwavePatch,
    pub scroll: ScrollPatch,
    pub rendering: RenderPatch,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationPatch {
    pub gravity: Option<f32>,
    pub time_step: Option<f32>,
    pub linear_damping: Option<f32>,
    pub angular_damping: Option<f32>,
    pub tangential_damping: Option<f32>,
    pub radial_damping: Option<f32>,
    pub initial_clockwise_velocity: Option<f32>,
    pub gravity_ease: Option<f32>,
    pub max_speed: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BodyPatch {
    pub count: Option<usize>,
    pub radius: Option<f32>,
    pub radius_variance: Option<f32>,
    pub restitution: Option<f32>,
    pub friction: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WorldPatch {
    pub center_circle_radius: Option<f32>,
    pub wall_thickness: Option<f32>,
    pub wall_offset: Option<f32>,
    pub start_radius: Option<f32>,
    pub start_spread: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ShockwavePatch {
    pub force: Option<f32>,
    pub radius: Option<f32>,
    pub decay: Option<f32>,
    pub directionality: Option<f32>,
    pub center_force_multiplier: Option<f32>,
    pub center_radius_multiplier: Option<f32>,
    pub center_decay_multiplier: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScrollPatch {
    pub force_multiplier: Option<f32>,
    pub velocity_damping: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RenderPatch {
    pub color_level: Option<u8>,
    pub color_steps: Option<usize>,
    pub shape_sides: Option<u32>,
}

macro_rules! merge {
    ($patch:expr, $target:expr, { $($field:ident),* $(,)? }) => {
        $(if let Some(v) = $patch.$field {
            $target.$field = v;
        })*
    };
}

impl SettingsPatch {
    /// Merge this patch into `settings`. Present fields win; absent fields
    /// leave the target untouched.
    pub fn apply(&self, settings: &mut Settings) {
        merge!(self.simulation, settings.simulation, {
            gravity,
            time_step,
            linear_damping,
            angular_damping,
            tangential_damping,
            radial_damping,
            initial_clockwise_velocity,
            gravity_ease,
            max_speed,
        });
        merge!(self.bodies, settings.bodies, {
            count,
            radius,
            radius_variance,
            restitution,
            friction,
        });
        merge!(self.world, settings.world, {
            center_circle_radius,
            wall_thickness,
            wall_offset,
            start_radius,
            start_spread,
        });
        merge!(self.shockwave, settings.shockwave, {
            force,
            radius,
            decay,
            directionality,
            center_force_multiplier,
            center_radius_multiplier,
            center_decay_multiplier,
        });
        merge!(self.scroll, settings.scroll, {
            force_multiplier,
            velocity_damping,
        });
        merge!(self.rendering, settings.rendering, {
            color_level,
            color_steps,
            shape_sides,
        });
        if let Some(seed) = self.seed {
            settings.seed = seed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_overrides_only_present_fields() {
        let mut settings = Settings::desktop();
        let baseline = settings.clone();
        let patch = SettingsPatch {
            simulation: SimulationPatch {
                gravity: Some(99.0),
                ..Default::default()
            },
            ..Default::default()
        };
        patch.apply(&mut settings);

        assert_eq!(settings.simulation.gravity, 99.0);
        assert_eq!(settings.simulation.time_step, baseline.simulation.time_step);
        assert_eq!(settings.bodies, baseline.bodies);
        assert_eq!(settings.world, baseline.world);
    }

    #[test]
    fn mobile_preset_is_desktop_plus_patch() {
        let mobile = Settings::mobile();
        let desktop = Settings::desktop();

        assert_ne!(mobile.bodies.count, desktop.bodies.count);
        // Fields the patch does not name stay at the desktop value.
        assert_eq!(mobile.simulation.time_step, desktop.simulation.time_step);
        assert_eq!(mobile.rendering, desktop.rendering);
    }

    #[test]
    fn rebuild_rules() {
        let desktop = Settings::desktop();

        let mut changed = desktop.clone();
        changed.bodies.count += 1;
        assert!(changed.requires_body_rebuild(&desktop));
        assert!(!changed.requires_planet_rebuild(&desktop));

        let mut changed = desktop.clone();
        changed.world.center_circle_radius = 0.3;
        assert!(!changed.requires_body_rebuild(&desktop));
        assert!(changed.requires_planet_rebuild(&desktop));

        let mut changed = desktop.clone();
        changed.world.wall_thickness += 10.0;
        assert!(!changed.requires_body_rebuild(&desktop));
        assert!(changed.requires_planet_rebuild(&desktop));

        let mut changed = desktop.clone();
        changed.simulation.gravity *= 2.0;
        assert!(!changed.requires_body_rebuild(&desktop));
        assert!(!changed.requires_planet_rebuild(&desktop));
    }

    #[test]
    fn patch_parses_from_toml() {
        let patch: SettingsPatch = toml::from_str(
            r#"
            [simulation]
            gravity = 55.0

            [bodies]
            count = 128

            [rendering]
            shape_sides = 6
            "#,
        )
        .unwrap();

        assert_eq!(patch.simulation.gravity, Some(55.0));
        assert_eq!(patch.bodies.count, Some(128));
        assert_eq!(patch.rendering.shape_sides, Some(6));
        assert_eq!(patch.scroll, ScrollPatch::default());

        let mut settings = Settings::desktop();
        patch.apply(&mut settings);
        assert_eq!(settings.bodies.count, 128);
    }

    #[test]
    fn unknown_toml_keys_are_rejected() {
        let err = toml::from_str::<SettingsPatch>("[simulation]\ngravty = 1.0\n");
        assert!(err.is_err());
    }
}
