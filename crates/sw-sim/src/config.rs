//! Switch geometry and solver settings.
//!
//! Lengths are inches, weights pounds. `SwitchConfig` holds angles in
//! radians; the YAML form (`SwitchConfigFile`) writes them in degrees.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sw_core::ensure_finite;
use sw_core::units::{degrees_to_radians, radians_to_degrees};
use sw_solver::{BisectionConfig, EquilibriumStrategy};

use crate::error::{SimError, SimResult};

pub const PIVOT_HEIGHT: f64 = 111.375;
pub const FIXED_RUNG_OFFSET: f64 = 63.0;
pub const COM_PIVOT_DISTANCE: f64 = 26.0;
pub const SWITCH_WEIGHT: f64 = 93.0;
pub const LEVEL_THRESHOLD_DEG: f64 = 8.0;
pub const MAX_ANGLE_DEG: f64 = 14.5;
// The real handle is 114.25 in; 114 gives round slider limits
pub const HANDLE_LENGTH: f64 = 114.0;
pub const MAX_ROBOT_WEIGHT: f64 = 120.0;
pub const SOLVE_PRECISION: f64 = 1e-6;
pub const ROBOT_COUNT: usize = 3;

/// Immutable simulation constants.
#[derive(Clone, Debug, PartialEq)]
pub struct SwitchConfig {
    /// Height of the pivot above the floor
    pub pivot_height: f64,
    /// Height of the robot rung above the floor
    pub fixed_rung_offset: f64,
    /// Distance from the pivot down to the switch's own center of mass
    pub com_pivot_distance: f64,
    /// Weight of the switch itself (the counterweight)
    pub switch_weight: f64,
    /// Largest |angle| that still counts as level (radians)
    pub level_threshold: f64,
    /// Mechanical stop (radians)
    pub max_angle: f64,
    pub handle_length: f64,
    /// Expected upper bound on robot mass; not enforced
    pub max_robot_weight: f64,
    /// Bisection convergence width
    pub solve_precision: f64,
    pub robot_count: usize,
    pub equilibrium: EquilibriumStrategy,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            pivot_height: PIVOT_HEIGHT,
            fixed_rung_offset: FIXED_RUNG_OFFSET,
            com_pivot_distance: COM_PIVOT_DISTANCE,
            switch_weight: SWITCH_WEIGHT,
            level_threshold: degrees_to_radians(LEVEL_THRESHOLD_DEG),
            max_angle: degrees_to_radians(MAX_ANGLE_DEG),
            handle_length: HANDLE_LENGTH,
            max_robot_weight: MAX_ROBOT_WEIGHT,
            solve_precision: SOLVE_PRECISION,
            robot_count: ROBOT_COUNT,
            equilibrium: EquilibriumStrategy::default(),
        }
    }
}

impl SwitchConfig {
    /// Vertical distance from the pivot down to the robot rung.
    pub fn rung_pivot_distance(&self) -> f64 {
        self.pivot_height - self.fixed_rung_offset
    }

    pub fn half_handle(&self) -> f64 {
        0.5 * self.handle_length
    }

    pub fn bisection(&self) -> BisectionConfig {
        BisectionConfig::with_precision(self.solve_precision)
    }

    pub fn validate(&self) -> SimResult<()> {
        ensure_finite(self.pivot_height, "pivot_height")?;
        ensure_finite(self.fixed_rung_offset, "fixed_rung_offset")?;
        ensure_finite(self.com_pivot_distance, "com_pivot_distance")?;
        ensure_finite(self.switch_weight, "switch_weight")?;
        ensure_finite(self.level_threshold, "level_threshold")?;
        ensure_finite(self.max_angle, "max_angle")?;
        ensure_finite(self.handle_length, "handle_length")?;
        ensure_finite(self.max_robot_weight, "max_robot_weight")?;
        ensure_finite(self.solve_precision, "solve_precision")?;

        if self.switch_weight < 0.0 {
            return Err(SimError::InvalidConfig {
                what: "switch_weight must be non-negative",
            });
        }
        if self.handle_length <= 0.0 {
            return Err(SimError::InvalidConfig {
                what: "handle_length must be positive",
            });
        }
        if self.max_robot_weight < 0.0 {
            return Err(SimError::InvalidConfig {
                what: "max_robot_weight must be non-negative",
            });
        }
        if self.solve_precision <= 0.0 {
            return Err(SimError::InvalidConfig {
                what: "solve_precision must be positive",
            });
        }
        if self.max_angle <= 0.0 || self.max_angle >= std::f64::consts::FRAC_PI_2 {
            return Err(SimError::InvalidConfig {
                what: "max_angle must lie in (0, pi/2)",
            });
        }
        if self.level_threshold < 0.0 || self.level_threshold > self.max_angle {
            return Err(SimError::InvalidConfig {
                what: "level_threshold must lie in [0, max_angle]",
            });
        }
        if self.robot_count == 0 {
            return Err(SimError::InvalidConfig {
                what: "robot_count must be at least 1",
            });
        }
        Ok(())
    }

    pub fn from_yaml_str(text: &str) -> SimResult<Self> {
        let file: SwitchConfigFile = serde_yaml::from_str(text)?;
        file.into_config()
    }

    pub fn load_yaml(path: &Path) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml_string(&self) -> SimResult<String> {
        self.validate()?;
        Ok(serde_yaml::to_string(&SwitchConfigFile::from(self))?)
    }
}

/// Equilibrium strategy as written in configuration files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquilibriumMode {
    #[default]
    ClosedForm,
    Bisection,
}

impl From<EquilibriumMode> for EquilibriumStrategy {
    fn from(mode: EquilibriumMode) -> Self {
        match mode {
            EquilibriumMode::ClosedForm => Self::ClosedForm,
            EquilibriumMode::Bisection => Self::Bisection,
        }
    }
}

impl From<EquilibriumStrategy> for EquilibriumMode {
    fn from(strategy: EquilibriumStrategy) -> Self {
        match strategy {
            EquilibriumStrategy::ClosedForm => Self::ClosedForm,
            EquilibriumStrategy::Bisection => Self::Bisection,
        }
    }
}

/// On-disk configuration. Missing fields take the reference values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwitchConfigFile {
    pub pivot_height: f64,
    pub fixed_rung_offset: f64,
    pub com_pivot_distance: f64,
    pub switch_weight: f64,
    pub level_threshold_deg: f64,
    pub max_angle_deg: f64,
    pub handle_length: f64,
    pub max_robot_weight: f64,
    pub solve_precision: f64,
    pub robot_count: usize,
    pub equilibrium: EquilibriumMode,
}

impl Default for SwitchConfigFile {
    fn default() -> Self {
        Self {
            pivot_height: PIVOT_HEIGHT,
            fixed_rung_offset: FIXED_RUNG_OFFSET,
            com_pivot_distance: COM_PIVOT_DISTANCE,
            switch_weight: SWITCH_WEIGHT,
            level_threshold_deg: LEVEL_THRESHOLD_DEG,
            max_angle_deg: MAX_ANGLE_DEG,
            handle_length: HANDLE_LENGTH,
            max_robot_weight: MAX_ROBOT_WEIGHT,
            solve_precision: SOLVE_PRECISION,
            robot_count: ROBOT_COUNT,
            equilibrium: EquilibriumMode::default(),
        }
    }
}

impl SwitchConfigFile {
    pub fn into_config(self) -> SimResult<SwitchConfig> {
        let config = SwitchConfig {
            pivot_height: self.pivot_height,
            fixed_rung_offset: self.fixed_rung_offset,
            com_pivot_distance: self.com_pivot_distance,
            switch_weight: self.switch_weight,
            level_threshold: degrees_to_radians(self.level_threshold_deg),
            max_angle: degrees_to_radians(self.max_angle_deg),
            handle_length: self.handle_length,
            max_robot_weight: self.max_robot_weight,
            solve_precision: self.solve_precision,
            robot_count: self.robot_count,
            equilibrium: self.equilibrium.into(),
        };
        config.validate()?;
        Ok(config)
    }
}

impl From<&SwitchConfig> for SwitchConfigFile {
    fn from(config: &SwitchConfig) -> Self {
        Self {
            pivot_height: config.pivot_height,
            fixed_rung_offset: config.fixed_rung_offset,
            com_pivot_distance: config.com_pivot_distance,
            switch_weight: config.switch_weight,
            level_threshold_deg: radians_to_degrees(config.level_threshold),
            max_angle_deg: radians_to_degrees(config.max_angle),
            handle_length: config.handle_length,
            max_robot_weight: config.max_robot_weight,
            solve_precision: config.solve_precision,
            robot_count: config.robot_count,
            equilibrium: config.equilibrium.into(),
        }
    }
}
