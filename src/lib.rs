//! EPPIC — a three-dimensional electromagnetic field solver.
//!
//! EPPIC evolves the coupled Maxwell curl equations through a homogeneous,
//! linear, isotropic, lossy dielectric box using the Finite-Difference
//! Time-Domain (FDTD) method on a staggered Cartesian (Yee) lattice. Field
//! snapshots are persisted to an HDF5 container at a configurable cadence
//! for later post-processing.
//!
//! The crate is organized as:
//! - [`config`] — validated run configuration loaded from a TOML file
//! - [`geometry`] — lattice sizing from physical inputs
//! - [`arrays`] — aligned contiguous storage for the vector fields
//! - [`fdtd`] — the leapfrog update kernel and the time-stepping controller
//! - [`output`] — snapshot sinks (HDF5, in-memory)
//!
//! Logging goes through the `log` facade; verbosity is bounded at compile
//! time via the `log` crate's `max_level_*` / `release_max_level_*`
//! features.

pub mod arrays;
pub mod config;
pub mod constants;
pub mod fdtd;
pub mod geometry;
pub mod output;

/// Floating point precision used for configuration, fields, and persisted
/// datasets. Double by default; single when the `single-precision` feature
/// is enabled.
#[cfg(feature = "single-precision")]
pub type Real = f32;

/// Floating point precision used for configuration, fields, and persisted
/// datasets. Double by default; single when the `single-precision` feature
/// is enabled.
#[cfg(not(feature = "single-precision"))]
pub type Real = f64;

/// Crate-wide error type.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration file missing, unreadable, or syntactically invalid.
    #[error("config: {0}")]
    Config(String),

    /// A configuration field with an out-of-range value.
    #[error("config field `{field}`: {reason}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Lattice sizing produced a zero, non-finite, or overflowing voxel
    /// count.
    #[error("grid: {0}")]
    Grid(String),

    /// Memory allocation for a field component failed.
    #[error("allocation: {0}")]
    Alloc(String),

    /// Dump-sink open or write failure.
    #[error("i/o: {0}")]
    Io(String),

    /// Error surfaced by the HDF5 library.
    #[error(transparent)]
    Hdf5(#[from] hdf5::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
