//! Physical and numeric constants.

use crate::Real;

/// (F/m) vacuum permittivity <https://en.wikipedia.org/wiki/Vacuum_permittivity>
pub const VAC_PERMITTIVITY: Real = 8.8541878188e-12 as Real;

/// (H/m) vacuum permeability <https://en.wikipedia.org/wiki/Vacuum_permeability>
pub const VAC_PERMEABILITY: Real = (4.0 * std::f64::consts::PI * 1e-7) as Real;

/// (m/s) vacuum speed of light, `1 / sqrt(VAC_PERMITTIVITY * VAC_PERMEABILITY)`
pub const VAC_SPEED_OF_LIGHT: Real = 299_792_457.980_029_9 as Real;

/// one half
pub const ONE_HALF: Real = 0.5 as Real;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_of_light_matches_definition() {
        let c = 1.0 / ((VAC_PERMITTIVITY as f64) * (VAC_PERMEABILITY as f64)).sqrt();
        assert!(
            ((VAC_SPEED_OF_LIGHT as f64) - c).abs() / c < 1e-12,
            "constant {} differs from 1/sqrt(ep0*mu0) = {}",
            VAC_SPEED_OF_LIGHT,
            c
        );
    }
}
