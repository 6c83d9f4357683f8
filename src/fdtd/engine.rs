//! Leapfrog curl-update kernel on the staggered lattice.
//!
//! One step half-advances time, updates the three H components from the
//! curl of E, half-advances again, then updates the three E components
//! from the curl of H. The outer faces of the E arrays model a perfect
//! electric conductor: they are initialized to zero and never written, so
//! tangential E vanishes on the boundary for all time. Because the E
//! arrays are one voxel larger than the H arrays on every axis, the H
//! update needs no boundary branches — every `+1` read lands on a frozen
//! zero face at worst.

use log::trace;

use crate::arrays::VectorField3D;
use crate::config::Config;
use crate::constants::{ONE_HALF, VAC_PERMEABILITY, VAC_PERMITTIVITY};
use crate::geometry::Lattice;
use crate::{Real, Result};

/// Loop constants for one leapfrog step, precomputed once per advance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepCoefficients {
    /// electric field a loop constant
    pub ea: Real,
    /// electric field b loop constant
    pub eb: Real,
    /// magnetic field a loop constant for the x-component
    pub hxa: Real,
    /// magnetic field a loop constant for the y-component
    pub hya: Real,
    /// magnetic field a loop constant for the z-component
    pub hza: Real,
}

/// FDTD field state and update kernel.
pub struct FdtdEngine {
    /// lattice extents and spacing
    lattice: Lattice,
    /// relative permittivity
    ep_r: Real,
    /// relative permeability
    mu_r: Real,
    /// (F/m) permittivity of the material
    ep: Real,
    /// (H/m) permeability of the material
    mu: Real,
    /// (S/m) conductivity of the material
    sigma: Real,
    /// (V/m) electric field, extents `nv_e`
    e: VectorField3D,
    /// (A/m) magnetic field, extents `nv_h`
    h: VectorField3D,
    /// (s) elapsed simulated time
    time: Real,
}

impl FdtdEngine {
    /// Build an engine with zero-initialized fields from a validated
    /// configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let lattice = Lattice::size(config)?;
        let e = VectorField3D::new(lattice.nv_e, 0.0)?;
        let h = VectorField3D::new(lattice.nv_h, 0.0)?;
        Ok(Self {
            lattice,
            ep_r: config.material.ep_r,
            mu_r: config.material.mu_r,
            ep: config.material.ep_r * VAC_PERMITTIVITY,
            mu: config.material.mu_r * VAC_PERMEABILITY,
            sigma: config.material.sigma,
            e,
            h,
            time: 0.0,
        })
    }

    /// Lattice this engine runs on.
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// (s) elapsed simulated time.
    pub fn time(&self) -> Real {
        self.time
    }

    /// Electric field, extents `nv_e`.
    pub fn e(&self) -> &VectorField3D {
        &self.e
    }

    /// Magnetic field, extents `nv_h`.
    pub fn h(&self) -> &VectorField3D {
        &self.h
    }

    /// Mutable access to both fields, e.g. for seeding an initial state.
    pub fn fields_mut(&mut self) -> (&mut VectorField3D, &mut VectorField3D) {
        (&mut self.e, &mut self.h)
    }

    /// Relative permittivity and permeability of the material.
    pub fn relative_material(&self) -> (Real, Real) {
        (self.ep_r, self.mu_r)
    }

    /// Precompute the loop constants for a timestep of `dt` seconds.
    pub fn coefficients(&self, dt: Real) -> StepCoefficients {
        let d_inv = self.lattice.d_inv;
        StepCoefficients {
            ea: 1.0 / (self.ep / dt + self.sigma / 2.0),
            eb: self.ep / dt - self.sigma / 2.0,
            hxa: dt * d_inv.x / self.mu,
            hya: dt * d_inv.y / self.mu,
            hza: dt * d_inv.z / self.mu,
        }
    }

    /// Advance the field state by one timestep of `dt` seconds.
    pub fn step(&mut self, dt: Real, c: &StepCoefficients) {
        // half timestep update before updating magnetic fields
        self.time += ONE_HALF * dt;
        trace!("advance half time step to (s): {:.5e}", self.time);

        self.update_hx(c.hya, c.hza);
        self.update_hy(c.hxa, c.hza);
        self.update_hz(c.hxa, c.hya);

        // half timestep update before updating electric fields
        self.time += ONE_HALF * dt;
        trace!("advance half time step to (s): {:.5e}", self.time);

        self.update_ex(c.ea, c.eb);
        self.update_ey(c.ea, c.eb);
        self.update_ez(c.ea, c.eb);
    }

    fn update_hx(&mut self, hya: Real, hza: Real) {
        let hx = &mut self.h.x;
        let (ey, ez) = (&self.e.y, &self.e.z);
        let dims = hx.dims();
        for i in 0..dims.nx {
            for j in 0..dims.ny {
                for k in 0..dims.nz {
                    let curl = -hya * (ez.get(i, j + 1, k) - ez.get(i, j, k))
                        + hza * (ey.get(i, j, k + 1) - ey.get(i, j, k));
                    hx.set(i, j, k, hx.get(i, j, k) + curl);
                }
            }
        }
    }

    fn update_hy(&mut self, hxa: Real, hza: Real) {
        let hy = &mut self.h.y;
        let (ex, ez) = (&self.e.x, &self.e.z);
        let dims = hy.dims();
        for i in 0..dims.nx {
            for j in 0..dims.ny {
                for k in 0..dims.nz {
                    let curl = -hza * (ex.get(i, j, k + 1) - ex.get(i, j, k))
                        + hxa * (ez.get(i + 1, j, k) - ez.get(i, j, k));
                    hy.set(i, j, k, hy.get(i, j, k) + curl);
                }
            }
        }
    }

    fn update_hz(&mut self, hxa: Real, hya: Real) {
        let hz = &mut self.h.z;
        let (ex, ey) = (&self.e.x, &self.e.y);
        let dims = hz.dims();
        for i in 0..dims.nx {
            for j in 0..dims.ny {
                for k in 0..dims.nz {
                    let curl = -hxa * (ey.get(i + 1, j, k) - ey.get(i, j, k))
                        + hya * (ex.get(i, j + 1, k) - ex.get(i, j, k));
                    hz.set(i, j, k, hz.get(i, j, k) + curl);
                }
            }
        }
    }

    fn update_ex(&mut self, ea: Real, eb: Real) {
        let d_inv = self.lattice.d_inv;
        let ex = &mut self.e.x;
        let (hy, hz) = (&self.h.y, &self.h.z);
        let dims = ex.dims();
        // PEC outer boundary: faces stay at zero
        for i in 1..dims.nx - 1 {
            for j in 1..dims.ny - 1 {
                for k in 1..dims.nz - 1 {
                    let value = ea
                        * (eb * ex.get(i, j, k)
                            + d_inv.y * (hz.get(i, j, k) - hz.get(i, j - 1, k))
                            - d_inv.z * (hy.get(i, j, k) - hy.get(i, j, k - 1)));
                    ex.set(i, j, k, value);
                }
            }
        }
    }

    fn update_ey(&mut self, ea: Real, eb: Real) {
        let d_inv = self.lattice.d_inv;
        let ey = &mut self.e.y;
        let (hx, hz) = (&self.h.x, &self.h.z);
        let dims = ey.dims();
        // PEC outer boundary: faces stay at zero
        for i in 1..dims.nx - 1 {
            for j in 1..dims.ny - 1 {
                for k in 1..dims.nz - 1 {
                    let value = ea
                        * (eb * ey.get(i, j, k)
                            + d_inv.z * (hx.get(i, j, k) - hx.get(i, j, k - 1))
                            - d_inv.x * (hz.get(i, j, k) - hz.get(i - 1, j, k)));
                    ey.set(i, j, k, value);
                }
            }
        }
    }

    fn update_ez(&mut self, ea: Real, eb: Real) {
        let d_inv = self.lattice.d_inv;
        let ez = &mut self.e.z;
        let (hx, hy) = (&self.h.x, &self.h.y);
        let dims = ez.dims();
        // PEC outer boundary: faces stay at zero
        for i in 1..dims.nx - 1 {
            for j in 1..dims.ny - 1 {
                for k in 1..dims.nz - 1 {
                    let value = ea
                        * (eb * ez.get(i, j, k)
                            + d_inv.x * (hy.get(i, j, k) - hy.get(i - 1, j, k))
                            - d_inv.y * (hx.get(i, j, k) - hx.get(i, j - 1, k)));
                    ez.set(i, j, k, value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::Dimensions;
    use crate::config::Config;

    fn small_cube() -> Config {
        let mut config = Config::example();
        config.geometry.x_len = 1e-3;
        config.geometry.y_len = 1e-3;
        config.geometry.z_len = 1e-3;
        config
    }

    #[test]
    fn fields_match_lattice_extents() {
        let engine = FdtdEngine::new(&small_cube()).unwrap();
        assert_eq!(engine.e().dims(), Dimensions::new(5, 5, 5));
        assert_eq!(engine.h().dims(), Dimensions::new(4, 4, 4));
    }

    #[test]
    fn coefficients_follow_the_semi_implicit_form() {
        let mut config = small_cube();
        config.material.sigma = 2.0;
        let engine = FdtdEngine::new(&config).unwrap();
        let dt = 1e-13;
        let c = engine.coefficients(dt);

        let ep = config.material.ep_r * VAC_PERMITTIVITY;
        let mu = config.material.mu_r * VAC_PERMEABILITY;
        assert_eq!(c.ea, 1.0 / (ep / dt + 1.0));
        assert_eq!(c.eb, ep / dt - 1.0);
        assert_eq!(c.hxa, dt * engine.lattice().d_inv.x / mu);
        assert_eq!(c.hya, c.hxa);
        assert_eq!(c.hza, c.hxa);
    }

    #[test]
    fn step_advances_time_by_two_half_steps() {
        let mut engine = FdtdEngine::new(&small_cube()).unwrap();
        // a power of two keeps every half-step sum exact
        let dt = (2.0 as Real).powi(-42);
        let c = engine.coefficients(dt);
        engine.step(dt, &c);
        assert_eq!(engine.time(), 0.5 * dt + 0.5 * dt);
        engine.step(dt, &c);
        assert_eq!(engine.time(), 2.0 * dt);
    }

    #[test]
    fn zero_state_stays_exactly_zero() {
        let mut engine = FdtdEngine::new(&small_cube()).unwrap();
        let dt = 1e-13;
        let c = engine.coefficients(dt);
        for _ in 0..100 {
            engine.step(dt, &c);
        }
        assert!(engine.e().x.as_slice().iter().all(|&v| v == 0.0));
        assert!(engine.e().y.as_slice().iter().all(|&v| v == 0.0));
        assert!(engine.e().z.as_slice().iter().all(|&v| v == 0.0));
        assert!(engine.h().x.as_slice().iter().all(|&v| v == 0.0));
        assert!(engine.h().y.as_slice().iter().all(|&v| v == 0.0));
        assert!(engine.h().z.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn seeded_ez_drives_the_prescribed_h_neighbors() {
        let mut engine = FdtdEngine::new(&small_cube()).unwrap();
        let (e, _) = engine.fields_mut();
        e.z.set(2, 2, 2, 1.0);

        let dt = 1e-13;
        let c = engine.coefficients(dt);
        engine.step(dt, &c);

        let h = engine.h();
        // Hx couples to Ez through the j-derivative, Hy through the
        // i-derivative; Hz never reads Ez.
        assert_eq!(h.x.get(2, 1, 2), -c.hya);
        assert_eq!(h.x.get(2, 2, 2), c.hya);
        assert_eq!(h.y.get(1, 2, 2), c.hxa);
        assert_eq!(h.y.get(2, 2, 2), -c.hxa);
        assert!(h.z.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn pec_faces_are_never_written() {
        let mut engine = FdtdEngine::new(&small_cube()).unwrap();
        let (e, _) = engine.fields_mut();
        e.z.set(2, 2, 2, 1.0);

        let dt = 1e-13;
        let c = engine.coefficients(dt);
        for _ in 0..10 {
            engine.step(dt, &c);
        }

        let e = engine.e();
        let n = e.dims().nx;
        for a in 0..n {
            for b in 0..n {
                for component in [&e.x, &e.y, &e.z] {
                    assert_eq!(component.get(0, a, b), 0.0);
                    assert_eq!(component.get(n - 1, a, b), 0.0);
                    assert_eq!(component.get(a, 0, b), 0.0);
                    assert_eq!(component.get(a, n - 1, b), 0.0);
                    assert_eq!(component.get(a, b, 0), 0.0);
                    assert_eq!(component.get(a, b, n - 1), 0.0);
                }
            }
        }
    }
}
