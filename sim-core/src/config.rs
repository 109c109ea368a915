//! Tunable constants for the simulation, layout and decoration.
//!
//! Every section falls back to its defaults when missing from a JSON preset.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, SceneError},
    spring::SpringParams,
};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sim: SimConfig,
    pub forces: ForceConfig,
    pub springs: SpringConfig,
    pub layout: LayoutConfig,
    pub decor: DecorConfig,
    /// Seed for layout jitter and decoration; `None` draws a fresh one.
    pub seed: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed update rate in steps per second.
    pub hz: f32,
    pub sub_steps: usize,
    pub max_steps_per_frame: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            hz: 60.0,
            sub_steps: 4,
            max_steps_per_frame: 5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    /// Upward acceleration on tree nodes.
    pub anti_gravity: f32,
    /// Downward acceleration on twigs and leaves.
    pub gravity: f32,
    pub repulsion: f32,
    pub repulsion_min_distance: f32,
    pub repulsion_max_force: f32,
    pub center_x: f32,
    pub center_pull: f32,
    /// Velocity damping rate per second.
    pub damping: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            anti_gravity: 40.0,
            gravity: 25.0,
            repulsion: 8000.0,
            repulsion_min_distance: 16.0,
            repulsion_max_force: 40.0,
            center_x: 0.0,
            center_pull: 0.6,
            damping: 1.5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    pub branch: SpringParams,
    pub twig: SpringParams,
    pub leaf: SpringParams,
    pub mouse_stiffness: f32,
    pub mouse_damping: f32,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            branch: SpringParams {
                length: 70.0,
                stiffness: 40.0,
                damping: 1.0,
            },
            twig: SpringParams {
                length: 18.0,
                stiffness: 6.0,
                damping: 0.3,
            },
            leaf: SpringParams {
                length: 12.0,
                stiffness: 3.0,
                damping: 0.2,
            },
            mouse_stiffness: 30.0,
            mouse_damping: 3.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub root_pos: Vec2,
    pub level_spacing: f32,
    pub sibling_spacing: f32,
    pub jitter: f32,
    pub root_radius: f32,
    /// Radius multiplier applied per depth level.
    pub radius_falloff: f32,
    pub min_radius: f32,
    pub density: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            root_pos: Vec2::ZERO,
            level_spacing: 70.0,
            sibling_spacing: 60.0,
            jitter: 8.0,
            root_radius: 12.0,
            radius_falloff: 0.8,
            min_radius: 4.0,
            density: 0.01,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorConfig {
    pub enabled: bool,
    pub leaves_per_tip: usize,
    /// Angle between neighbouring leaves on a tip, in radians.
    pub leaf_fan: f32,
    /// Random jitter added to each leaf angle, in radians.
    pub leaf_spread: f32,
    pub leaf_radius: f32,
    /// Probability in `[0, 1]` that a branch node sprouts a twig.
    pub twig_chance: f32,
    /// Side angle of a twig relative to the outward direction, in radians.
    pub twig_angle: f32,
    pub twig_spread: f32,
    pub twig_radius: f32,
}

impl Default for DecorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            leaves_per_tip: 3,
            leaf_fan: 0.6,
            leaf_spread: 0.25,
            leaf_radius: 3.0,
            twig_chance: 0.6,
            twig_angle: 1.0,
            twig_spread: 0.3,
            twig_radius: 2.0,
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> SceneError {
    SceneError::InvalidConfig {
        field,
        reason: reason.into(),
    }
}

fn check_spring(field: &'static str, p: &SpringParams) -> Result<()> {
    if !(p.length > 0.0) {
        return Err(invalid(field, format!("length must be positive, got {}", p.length)));
    }
    if p.stiffness < 0.0 || p.damping < 0.0 {
        return Err(invalid(field, "stiffness and damping must be non-negative"));
    }
    Ok(())
}

impl Config {
    pub fn from_json(s: &str) -> Result<Self> {
        let cfg: Config = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Seconds per fixed update step.
    pub fn dt(&self) -> f32 {
        1.0 / self.sim.hz
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.sim.hz > 0.0) {
            return Err(invalid("sim.hz", "must be positive"));
        }
        if self.sim.sub_steps == 0 {
            return Err(invalid("sim.sub_steps", "must be at least 1"));
        }
        if self.sim.max_steps_per_frame == 0 {
            return Err(invalid("sim.max_steps_per_frame", "must be at least 1"));
        }
        check_spring("springs.branch", &self.springs.branch)?;
        check_spring("springs.twig", &self.springs.twig)?;
        check_spring("springs.leaf", &self.springs.leaf)?;

        let l = &self.layout;
        if l.root_radius < 0.0 || l.min_radius < 0.0 {
            return Err(invalid("layout", "radii must be non-negative"));
        }
        if !(l.density > 0.0) {
            return Err(invalid("layout.density", "must be positive"));
        }

        let d = &self.decor;
        if d.leaf_radius < 0.0 || d.twig_radius < 0.0 {
            return Err(invalid("decor", "radii must be non-negative"));
        }
        if !(0.0..=1.0).contains(&d.twig_chance) {
            return Err(invalid(
                "decor.twig_chance",
                format!("must be in [0, 1], got {}", d.twig_chance),
            ));
        }
        if self.forces.repulsion_min_distance <= 0.0 {
            return Err(invalid("forces.repulsion_min_distance", "must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        cfg.validate().unwrap();
        assert!((cfg.dt() - 1.0 / 60.0).abs() < 1e-7);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg = Config::from_json(r#"{ "forces": { "gravity": 5.0 }, "seed": 9 }"#).unwrap();
        assert_eq!(cfg.forces.gravity, 5.0);
        assert_eq!(cfg.forces.repulsion, ForceConfig::default().repulsion);
        assert_eq!(cfg.springs, SpringConfig::default());
        assert_eq!(cfg.seed, Some(9));
    }

    #[test]
    fn saved_preset_loads_back() {
        let mut cfg = Config::default();
        cfg.layout.root_pos = Vec2::new(3.0, -2.0);
        cfg.decor.enabled = false;
        let back = Config::from_json(&cfg.to_json().unwrap()).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.sim.sub_steps = 0;
        assert!(matches!(
            cfg.validate(),
            Err(SceneError::InvalidConfig { field: "sim.sub_steps", .. })
        ));

        let mut cfg = Config::default();
        cfg.sim.max_steps_per_frame = 0;
        assert!(matches!(
            cfg.validate(),
            Err(SceneError::InvalidConfig { field: "sim.max_steps_per_frame", .. })
        ));

        let mut cfg = Config::default();
        cfg.springs.leaf.length = 0.0;
        assert!(matches!(
            cfg.validate(),
            Err(SceneError::InvalidConfig { field: "springs.leaf", .. })
        ));

        let mut cfg = Config::default();
        cfg.decor.twig_chance = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            Config::from_json("{ not json"),
            Err(SceneError::Json(_))
        ));
    }
}
