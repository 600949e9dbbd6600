use serde::{Deserialize, Serialize};

use crate::{floating_type_mod::FT, scene_config::ConfigError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LiquidParams {
    // kinematic viscosity used in the diffusion term of the tilde velocities
    pub viscosity: FT,

    // over-relaxation of the pressure iteration, 1 = plain Gauss-Seidel
    pub b0: FT,

    pub max_pressure_iterations: usize,

    // the pressure iteration stops once no full cell has a larger |divergence|
    pub max_divergence: FT,

    pub initial_time_step: FT,
    pub max_time_step: FT,
}

impl Default for LiquidParams {
    fn default() -> Self {
        Self {
            viscosity: 0.001,
            b0: 1.7,
            max_pressure_iterations: 100,
            max_divergence: 0.0001,
            initial_time_step: 0.01,
            max_time_step: 0.05,
        }
    }
}

pub const B0_RANGE: (FT, FT) = (1.0, 2.0);

impl LiquidParams {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let params: LiquidParams = serde_yaml::from_str(yaml)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_viscosity(self.viscosity)?;
        validate_b0(self.b0)?;
        if self.max_pressure_iterations == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_pressure_iterations",
                value: 0.,
                reason: "at least one iteration is needed",
            });
        }
        if !(self.max_divergence > 0.) {
            return Err(ConfigError::InvalidParameter {
                name: "max_divergence",
                value: self.max_divergence,
                reason: "must be positive",
            });
        }
        if !(self.max_time_step > 0.) || !self.max_time_step.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "max_time_step",
                value: self.max_time_step,
                reason: "must be positive and finite",
            });
        }
        if !(self.initial_time_step > 0.) || self.initial_time_step > self.max_time_step {
            return Err(ConfigError::InvalidParameter {
                name: "initial_time_step",
                value: self.initial_time_step,
                reason: "must be positive and not larger than max_time_step",
            });
        }
        Ok(())
    }
}

pub fn validate_viscosity(viscosity: FT) -> Result<(), ConfigError> {
    if !(viscosity >= 0.) || !viscosity.is_finite() {
        return Err(ConfigError::InvalidParameter {
            name: "viscosity",
            value: viscosity,
            reason: "must be non-negative and finite",
        });
    }
    Ok(())
}

pub fn validate_b0(b0: FT) -> Result<(), ConfigError> {
    if !(b0 >= B0_RANGE.0 && b0 <= B0_RANGE.1) {
        return Err(ConfigError::InvalidParameter {
            name: "b0",
            value: b0,
            reason: "must be within [1, 2]",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::LiquidParams;
    use crate::scene_config::ConfigError;

    #[test]
    fn default_is_valid() {
        assert!(LiquidParams::default().validate().is_ok());
    }

    #[test]
    fn yaml_round_trip_of_defaults() {
        let yaml = serde_yaml::to_string(&LiquidParams::default()).unwrap();
        assert_eq!(LiquidParams::from_yaml(&yaml).unwrap(), LiquidParams::default());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let bad_b0 = LiquidParams {
            b0: 2.5,
            ..Default::default()
        };
        assert!(matches!(
            bad_b0.validate(),
            Err(ConfigError::InvalidParameter { name: "b0", .. })
        ));

        let bad_viscosity = LiquidParams {
            viscosity: -1.,
            ..Default::default()
        };
        assert!(bad_viscosity.validate().is_err());

        let bad_time_step = LiquidParams {
            initial_time_step: 0.1,
            max_time_step: 0.05,
            ..Default::default()
        };
        assert!(matches!(
            bad_time_step.validate(),
            Err(ConfigError::InvalidParameter {
                name: "initial_time_step",
                ..
            })
        ));
    }

    #[test]
    fn bundled_params_are_valid() {
        let params = LiquidParams::from_yaml(include_str!("../../configs/params.yaml")).unwrap();
        assert_eq!(params, LiquidParams::default());
    }

    #[test]
    fn rejects_unknown_keys() {
        let yaml = "viscosity: 0.0\nb0: 1.0\nmax_pressure_iterations: 10\nmax_divergence: 0.001\ninitial_time_step: 0.01\nmax_time_step: 0.1\ncfl: 3\n";
        assert!(matches!(LiquidParams::from_yaml(yaml), Err(ConfigError::Parse(_))));
    }
}
