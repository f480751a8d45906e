use thiserror::Error;

pub const DEFAULT_SEARCH_RADIUS: f64 = 1.2;
pub const DEFAULT_FALLBACK_RADIUS: f64 = 2.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid {name}: {value} (must be a positive distance in Angstroms)")]
    InvalidRadius { name: &'static str, value: f64 },
}

/// Distance cutoffs used by the connectivity inference engine, in Angstroms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectivityConfig {
    /// Radius of the geometric step when every atom of a molecule is connected at once.
    pub search_radius: f64,
    /// Radius used by bond lookups when an atom is still unbonded after the residue templates ran.
    pub fallback_radius: f64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            search_radius: DEFAULT_SEARCH_RADIUS,
            fallback_radius: DEFAULT_FALLBACK_RADIUS,
        }
    }
}

impl ConnectivityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("search-radius", self.search_radius),
            ("fallback-radius", self.fallback_radius),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidRadius { name, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_radii() {
        let config = ConnectivityConfig::default();
        assert_eq!(config.search_radius, 1.2);
        assert_eq!(config.fallback_radius, 2.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_search_radius_is_rejected() {
        let config = ConnectivityConfig {
            search_radius: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRadius {
                name: "search-radius",
                ..
            })
        ));
    }

    #[test]
    fn non_finite_fallback_radius_is_rejected() {
        let config = ConnectivityConfig {
            fallback_radius: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRadius {
                name: "fallback-radius",
                ..
            })
        ));
    }
}
