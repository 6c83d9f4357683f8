//! Run configuration.
//!
//! The configuration is loaded once from a TOML file with four tables —
//! `[time]`, `[geometry]`, `[material]`, `[data]` — validated against the
//! physical constraints below, and read-only from then on. Unknown keys
//! are ignored; missing required keys fail deserialization.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::{Error, Real, Result};

/// Validated run configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// `[time]` table
    pub time: TimeConfig,
    /// `[geometry]` table
    pub geometry: GeometryConfig,
    /// `[material]` table
    pub material: MaterialConfig,
    /// `[data]` table
    pub data: DataConfig,
}

/// Simulated time span.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeConfig {
    /// (s) end time of the simulation
    pub end_time: Real,
}

/// Bounding box geometry.
#[derive(Debug, Clone, Deserialize)]
pub struct GeometryConfig {
    /// (m) length of the bounding box in the x-direction
    pub x_len: Real,
    /// (m) length of the bounding box in the y-direction
    pub y_len: Real,
    /// (m) length of the bounding box in the z-direction
    pub z_len: Real,
}

/// Homogeneous material inside the bounding box.
#[derive(Debug, Clone, Deserialize)]
pub struct MaterialConfig {
    /// diagonally isotropic relative permittivity
    pub ep_r: Real,
    /// diagonally isotropic relative permeability
    pub mu_r: Real,
    /// (S/m) diagonally isotropic conductivity
    pub sigma: Real,
}

/// Solver resolution and snapshot cadence.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// (Hz) maximum frequency to resolve
    pub max_frequency: Real,
    /// voxels per minimum wavelength
    pub num_vox_min_wavelength: usize,
    /// voxels per minimum feature dimension
    pub num_vox_min_feature: usize,
    /// number of timesteps between snapshots
    pub ds_ratio: u64,
}

impl Config {
    /// Read and validate a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|err| Error::Config(format!("{}: {err}", path.display())))?;
        Self::from_toml_str(&text)
            .map_err(|err| Error::Config(format!("{}: {err}", path.display())))
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|err| Error::Config(err.message().to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field against its physical constraint.
    pub fn validate(&self) -> Result<()> {
        require_positive("end_time", self.time.end_time)?;
        require_positive("x_len", self.geometry.x_len)?;
        require_positive("y_len", self.geometry.y_len)?;
        require_positive("z_len", self.geometry.z_len)?;
        require_positive("ep_r", self.material.ep_r)?;
        require_positive("mu_r", self.material.mu_r)?;
        if !(self.material.sigma >= 0.0) || !self.material.sigma.is_finite() {
            return Err(invalid("sigma", self.material.sigma, "must be finite and >= 0"));
        }
        require_positive("max_frequency", self.data.max_frequency)?;
        if self.data.num_vox_min_wavelength < 1 {
            return Err(Error::InvalidField {
                field: "num_vox_min_wavelength",
                reason: "must be >= 1".into(),
            });
        }
        if self.data.num_vox_min_feature < 1 {
            return Err(Error::InvalidField {
                field: "num_vox_min_feature",
                reason: "must be >= 1".into(),
            });
        }
        if self.data.ds_ratio == 0 {
            return Err(Error::InvalidField {
                field: "ds_ratio",
                reason: "must be >= 1".into(),
            });
        }
        Ok(())
    }

    /// A small vacuum-filled example configuration, used by documentation
    /// and tests.
    pub fn example() -> Self {
        Self {
            time: TimeConfig { end_time: 25e-9 },
            geometry: GeometryConfig {
                x_len: 0.1,
                y_len: 0.1,
                z_len: 0.1,
            },
            material: MaterialConfig {
                ep_r: 1.0,
                mu_r: 1.0,
                sigma: 0.0,
            },
            data: DataConfig {
                max_frequency: 15e9,
                num_vox_min_wavelength: 20,
                num_vox_min_feature: 4,
                ds_ratio: 100,
            },
        }
    }
}

fn require_positive(field: &'static str, value: Real) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, value, "must be finite and > 0"))
    }
}

fn invalid(field: &'static str, value: Real, constraint: &str) -> Error {
    Error::InvalidField {
        field,
        reason: format!("{constraint} (got {value:e})"),
    }
}
