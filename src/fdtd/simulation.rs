//! Time-stepping controller.
//!
//! Chooses a CFL-stable step count for each advance, precomputes the loop
//! constants once, drives the engine through the step loop, and hands
//! both fields to the snapshot sink at the configured cadence.

use indicatif::{ProgressBar, ProgressStyle};
use instant::Instant;
use log::{debug, info, trace, warn};

use crate::config::Config;
use crate::constants::VAC_SPEED_OF_LIGHT;
use crate::fdtd::{FdtdEngine, StepCoefficients};
use crate::output::{EpochSpec, FieldSink};
use crate::{Error, Real, Result};

/// Statistics from one advance.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunStats {
    /// timesteps executed
    pub steps: u64,
    /// (s) timestep used
    pub dt: Real,
    /// (s) wall clock time spent in the step loop
    pub wall_time: f64,
    /// average update speed over the H lattice (million voxels per second)
    pub speed_mcells_per_sec: f64,
    /// snapshot writes handed to the sink
    pub snapshots: u64,
}

/// Simulation driver owning the engine and the snapshot sink.
pub struct Simulation<S: FieldSink> {
    engine: FdtdEngine,
    end_time: Real,
    ds_ratio: u64,
    sink: S,
    show_progress: bool,
}

impl<S: FieldSink> Simulation<S> {
    /// Validate the configuration and build the engine and fields.
    pub fn new(config: &Config, sink: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine: FdtdEngine::new(config)?,
            end_time: config.time.end_time,
            ds_ratio: config.data.ds_ratio,
            sink,
            show_progress: true,
        })
    }

    /// Enable or disable the progress bar.
    pub fn set_show_progress(&mut self, show: bool) -> &mut Self {
        self.show_progress = show;
        self
    }

    /// The engine driven by this simulation.
    pub fn engine(&self) -> &FdtdEngine {
        &self.engine
    }

    /// Mutable engine access, e.g. for seeding an initial field state.
    pub fn engine_mut(&mut self) -> &mut FdtdEngine {
        &mut self.engine
    }

    /// Consume the simulation and return its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Advance to the configured end time.
    pub fn run(&mut self) -> Result<RunStats> {
        self.advance_to(self.end_time)
    }

    /// Advance the field state to an end time.
    ///
    /// Does nothing (and reports zeroed stats) when `end_t` does not lie
    /// beyond the current time.
    pub fn advance_to(&mut self, end_t: Real) -> Result<RunStats> {
        let time = self.engine.time();
        debug!("current time is {time:.3e} (s), advance to {end_t:.3e} (s)");
        if end_t > time {
            self.advance_by(end_t - time)
        } else {
            warn!(
                "end time of {end_t:.3e} (s) is not greater than current time of {time:.3e} (s)"
            );
            Ok(RunStats::default())
        }
    }

    /// Advance the field state by a time period.
    pub fn advance_by(&mut self, adv_t: Real) -> Result<RunStats> {
        debug!("advance time by {adv_t:.3e} (s)");
        if !(adv_t > 0.0) {
            warn!("advance period of {adv_t:.3e} (s) is not positive");
            return Ok(RunStats::default());
        }

        // number of steps required by the CFL condition
        let steps = self.calc_cfl_steps(adv_t);

        // (s) time step
        let dt = adv_t / steps as Real;
        debug!("timestep: {dt:.3e} (s)");

        // preprocess loop constants
        let coefficients = self.engine.coefficients(dt);

        // one slot per cadence boundary plus the final state
        let logged_steps = steps / self.ds_ratio + 1;
        let lattice = *self.engine.lattice();
        self.sink.open_epoch(&EpochSpec {
            logged_steps,
            nv_e: lattice.nv_e,
            nv_h: lattice.nv_h,
            dt,
            d: lattice.d,
        })?;

        let progress = if self.show_progress {
            let bar = ProgressBar::new(steps);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({per_sec})")
                    .unwrap()
                    .progress_chars("##-"),
            );
            Some(bar)
        } else {
            None
        };

        debug!("enter main time loop");
        let start = Instant::now();
        let mut snapshots = 0u64;
        let loop_result =
            self.step_loop(steps, dt, &coefficients, logged_steps, &progress, &mut snapshots);
        // the epoch closes on every exit path; a step-loop error wins
        let close_result = self.sink.close_epoch();
        if let Some(bar) = progress {
            bar.finish_and_clear();
        }
        loop_result?;
        close_result?;
        debug!("exit main time loop with success");

        let wall_time = start.elapsed().as_secs_f64();
        let cells = lattice.nv_h.total() as f64;
        let stats = RunStats {
            steps,
            dt,
            wall_time,
            speed_mcells_per_sec: steps as f64 * cells / wall_time / 1e6,
            snapshots,
        };
        info!(
            "completed {} steps in {:.2}s ({:.2} MC/s), {} snapshots",
            stats.steps, stats.wall_time, stats.speed_mcells_per_sec, stats.snapshots
        );
        Ok(stats)
    }

    fn step_loop(
        &mut self,
        steps: u64,
        dt: Real,
        coefficients: &StepCoefficients,
        logged_steps: u64,
        progress: &Option<ProgressBar>,
        snapshots: &mut u64,
    ) -> Result<()> {
        for i in 0..steps {
            self.engine.step(dt, coefficients);
            trace!(
                "step: {}/{} elapsed time: {:.5e} (s)",
                i + 1,
                steps,
                self.engine.time()
            );

            if i % self.ds_ratio == 0 || i == steps - 1 {
                let slab = snapshot_slab(i, steps, self.ds_ratio, logged_steps);
                self.sink
                    .write(slab, self.engine.time(), i, self.engine.e(), self.engine.h())
                    .map_err(|err| Error::Io(format!("snapshot at step {i}: {err}")))?;
                *snapshots += 1;
            }

            if let Some(bar) = progress {
                bar.inc(1);
            }
        }
        Ok(())
    }

    /// Number of steps required to model a time span under the CFL
    /// stability condition.
    fn calc_cfl_steps(&self, time_span: Real) -> u64 {
        let maximum_dt = self.max_stable_dt();
        debug!("maximum possible timestep to satisfy CFL condition (s): {maximum_dt:.3e}");

        let steps = ((time_span / maximum_dt).ceil() as u64).max(1);
        debug!("steps required to satisfy CFL condition: {steps}");
        steps
    }

    /// (s) maximum timestep satisfying the CFL stability condition on the
    /// current lattice.
    pub fn max_stable_dt(&self) -> Real {
        let (ep_r, mu_r) = self.engine.relative_material();
        let d_inv = self.engine.lattice().d_inv;
        1.0 / (VAC_SPEED_OF_LIGHT / (ep_r * mu_r).sqrt()
            * (d_inv.x * d_inv.x + d_inv.y * d_inv.y + d_inv.z * d_inv.z).sqrt())
    }
}

/// Hyperslab slot for the snapshot emitted at step `i`: cadence boundaries
/// fill consecutive slots and the final step lands in the last slot.
fn snapshot_slab(i: u64, steps: u64, ds_ratio: u64, logged_steps: u64) -> usize {
    if i == steps - 1 {
        (logged_steps - 1) as usize
    } else {
        (i / ds_ratio) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MemorySink;

    fn cadence(steps: u64, ds_ratio: u64) -> (Vec<u64>, Vec<usize>, u64) {
        let logged_steps = steps / ds_ratio + 1;
        let mut written_steps = Vec::new();
        let mut slabs = Vec::new();
        for i in 0..steps {
            if i % ds_ratio == 0 || i == steps - 1 {
                written_steps.push(i);
                slabs.push(snapshot_slab(i, steps, ds_ratio, logged_steps));
            }
        }
        (written_steps, slabs, logged_steps)
    }

    #[test]
    fn cadence_hits_boundaries_and_final_step() {
        let (steps, slabs, logged) = cadence(25, 10);
        assert_eq!(steps, vec![0, 10, 20, 24]);
        assert_eq!(slabs, vec![0, 1, 2, 2]);
        assert_eq!(logged, 3);
    }

    #[test]
    fn cadence_with_aligned_final_step() {
        let (steps, slabs, logged) = cadence(21, 10);
        assert_eq!(steps, vec![0, 10, 20]);
        assert_eq!(slabs, vec![0, 1, 2]);
        assert_eq!(logged, 3);
    }

    #[test]
    fn cadence_slots_never_exceed_allocation() {
        for steps in 1..200u64 {
            for ds_ratio in 1..20u64 {
                let (_, slabs, logged) = cadence(steps, ds_ratio);
                assert!(slabs.iter().all(|&s| (s as u64) < logged));
                assert_eq!(*slabs.last().unwrap() as u64, logged - 1);
            }
        }
    }

    #[test]
    fn single_step_advance_writes_one_snapshot() {
        let mut config = crate::config::Config::example();
        config.geometry.x_len = 1e-3;
        config.geometry.y_len = 1e-3;
        config.geometry.z_len = 1e-3;
        config.data.ds_ratio = 10;

        let mut sim = Simulation::new(&config, MemorySink::default()).unwrap();
        sim.set_show_progress(false);
        let dt_max = sim.max_stable_dt();
        let stats = sim.advance_by(dt_max * 0.5).unwrap();
        assert_eq!(stats.steps, 1);
        assert_eq!(stats.snapshots, 1);

        let sink = sim.into_sink();
        assert_eq!(sink.snapshots.len(), 1);
        assert_eq!(sink.snapshots[0].step, 0);
        assert_eq!(sink.snapshots[0].slab, 0);
        assert!(sink.closed);
    }

    #[test]
    fn cfl_ratio_never_exceeds_one() {
        let mut config = crate::config::Config::example();
        config.geometry.x_len = 1e-3;
        config.geometry.y_len = 2e-3;
        config.geometry.z_len = 3e-3;

        let mut sim = Simulation::new(&config, MemorySink::default()).unwrap();
        sim.set_show_progress(false);
        let stats = sim.advance_by(1e-11).unwrap();

        let (ep_r, mu_r) = sim.engine().relative_material();
        let d_inv = sim.engine().lattice().d_inv;
        let ratio = stats.dt * VAC_SPEED_OF_LIGHT / (ep_r * mu_r).sqrt()
            * (d_inv.x * d_inv.x + d_inv.y * d_inv.y + d_inv.z * d_inv.z).sqrt();
        assert!(ratio <= 1.0 + 1e-12, "CFL ratio {ratio} exceeds 1");
    }
}
