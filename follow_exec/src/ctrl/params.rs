//! Controller parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use crate::path::PathType;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the controller
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Params {
    /// The reference path to track
    pub path_type: PathType,

    /// Lateral error proportional gain
    pub k_p_lat: f64,

    /// Heading error proportional gain
    pub k_p_head: f64,

    /// Lateral error derivative gain
    pub k_d_lat: f64,

    /// Nominal speed demand
    ///
    /// Units: meters/second
    pub v_nom: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            path_type: PathType::Curved,
            k_p_lat: 1.5,
            k_p_head: 2.5,
            k_d_lat: 0.1,
            v_nom: 1.0,
        }
    }
}

impl Params {
    /// Check every numeric parameter is finite.
    pub fn validate(&self) -> Result<(), super::CtrlError> {
        let values = [
            ("k_p_lat", self.k_p_lat),
            ("k_p_head", self.k_p_head),
            ("k_d_lat", self.k_d_lat),
            ("v_nom", self.v_nom),
        ];

        for (name, value) in values.iter() {
            if !value.is_finite() {
                return Err(super::CtrlError::NonFiniteParam(*name, *value));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_file() {
        let p: Params = toml::from_str("path_type = \"sine\"\nk_p_lat = 2.0").unwrap();

        assert_eq!(p.path_type, PathType::Sine);
        assert_eq!(p.k_p_lat, 2.0);
        assert_eq!(p.k_p_head, 2.5);
        assert_eq!(p.v_nom, 1.0);
    }

    #[test]
    fn test_validate() {
        assert!(Params::default().validate().is_ok());

        let p = Params {
            k_d_lat: f64::NAN,
            ..Default::default()
        };
        assert!(p.validate().is_err());
    }
}
