//! Yee lattice sizing.
//!
//! Derives a stable uniform discretization from the physical inputs: the
//! spatial step is bounded by both the shortest resolved wavelength and
//! the smallest geometric feature, then snapped so an integer number of
//! voxels spans each axis.

use log::debug;

use crate::arrays::Dimensions;
use crate::config::Config;
use crate::constants::VAC_SPEED_OF_LIGHT;
use crate::{Error, Real, Result};

/// A real-valued triplet over the three spatial axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord3 {
    /// x-component
    pub x: Real,
    /// y-component
    pub y: Real,
    /// z-component
    pub z: Real,
}

/// Uniform Yee lattice derived from a configuration.
///
/// The E field wraps the H field by one voxel on the high side of every
/// axis, so stencil reads at `+1` offsets during the H update never leave
/// the E arrays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lattice {
    /// voxel counts for the H field
    pub nv_h: Dimensions,
    /// voxel counts for the E field, `nv_h + 1` per axis
    pub nv_e: Dimensions,
    /// (m) spatial increments
    pub d: Coord3,
    /// (m^-1) inverse spatial increments
    pub d_inv: Coord3,
}

impl Lattice {
    /// Derive lattice extents and spacing from the configuration.
    pub fn size(config: &Config) -> Result<Self> {
        let geom = &config.geometry;
        let mat = &config.material;
        let data = &config.data;
        debug!(
            "bounding box (m): {:.3e} x {:.3e} x {:.3e}",
            geom.x_len, geom.y_len, geom.z_len
        );

        // (m) maximum spatial step based on maximum frequency
        let ds_wavelength = VAC_SPEED_OF_LIGHT
            / ((mat.ep_r * mat.mu_r).sqrt()
                * data.num_vox_min_wavelength as Real
                * data.max_frequency);
        debug!("maximum spatial step based on maximum frequency (m): {ds_wavelength:.3e}");

        // (m) maximum spatial step based on minimum feature size
        let ds_feature =
            geom.x_len.min(geom.y_len).min(geom.z_len) / data.num_vox_min_feature as Real;
        debug!("maximum spatial step based on feature size (m): {ds_feature:.3e}");

        // (m) binding spatial step
        let ds = ds_wavelength.min(ds_feature);
        debug!("maximum spatial step (m): {ds:.3e}");
        if !(ds > 0.0) || !ds.is_finite() {
            return Err(Error::Grid(format!("spatial step {ds:e} is not positive")));
        }

        // voxel counts snapped to ds
        let nv_h = Dimensions::new(
            axis_voxels(geom.x_len, ds, "x")?,
            axis_voxels(geom.y_len, ds, "y")?,
            axis_voxels(geom.z_len, ds, "z")?,
        );
        let nv_e = nv_h.grown();
        debug!("field voxels: {} x {} x {}", nv_h.nx, nv_h.ny, nv_h.nz);

        // (m) final spatial steps
        let d = Coord3 {
            x: geom.x_len / nv_h.nx as Real,
            y: geom.y_len / nv_h.ny as Real,
            z: geom.z_len / nv_h.nz as Real,
        };
        debug!("voxel size (m): {:.3e} x {:.3e} x {:.3e}", d.x, d.y, d.z);

        // (m^-1) inverse spatial steps
        let d_inv = Coord3 {
            x: 1.0 / d.x,
            y: 1.0 / d.y,
            z: 1.0 / d.z,
        };

        Ok(Self { nv_h, nv_e, d, d_inv })
    }
}

/// Number of voxels spanning one axis, rounded up so the spacing never
/// exceeds `ds`.
fn axis_voxels(len: Real, ds: Real, axis: &str) -> Result<usize> {
    let count = (len / ds).ceil();
    if !count.is_finite() || count < 1.0 {
        return Err(Error::Grid(format!(
            "axis {axis}: voxel count {count} from length {len:e} and step {ds:e}"
        )));
    }
    if count >= u64::MAX as Real {
        return Err(Error::Grid(format!(
            "axis {axis}: voxel count {count:e} overflows the index type"
        )));
    }
    Ok(count as usize)
}
