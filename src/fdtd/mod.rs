//! FDTD numerical kernel: the leapfrog update engine and the
//! time-stepping controller that drives it.

mod engine;
mod simulation;

pub use engine::{FdtdEngine, StepCoefficients};
pub use simulation::{RunStats, Simulation};
