//! Snapshot sinks.
//!
//! The time controller hands both vector fields to a [`FieldSink`] at the
//! configured cadence. The archival sink is [`H5Sink`]; [`MemorySink`]
//! keeps snapshots in memory for tests and embedding, and [`NullSink`]
//! discards them for benchmarks.

mod h5;

pub use h5::H5Sink;

use crate::arrays::{Dimensions, VectorField3D};
use crate::geometry::Coord3;
use crate::{Error, Real, Result};

/// Shape and timing of one dump epoch.
#[derive(Debug, Clone, Copy)]
pub struct EpochSpec {
    /// number of hyperslab slots along the time axis
    pub logged_steps: u64,
    /// E-field extents
    pub nv_e: Dimensions,
    /// H-field extents
    pub nv_h: Dimensions,
    /// (s) timestep for this epoch
    pub dt: Real,
    /// (m) voxel size
    pub d: Coord3,
}

/// Destination for field snapshots.
///
/// One epoch spans one advance: `open_epoch` sizes the destination,
/// `write` fills one hyperslab per snapshot, and `close_epoch` releases
/// any held resources. The controller guarantees `close_epoch` runs on
/// every exit path, including after a failed `write`.
pub trait FieldSink {
    /// Allocate the destination for `spec.logged_steps` snapshots.
    fn open_epoch(&mut self, spec: &EpochSpec) -> Result<()>;

    /// Record one snapshot at hyperslab index `slab`.
    fn write(
        &mut self,
        slab: usize,
        time: Real,
        step: u64,
        e: &VectorField3D,
        h: &VectorField3D,
    ) -> Result<()>;

    /// Finish the epoch and release held resources.
    fn close_epoch(&mut self) -> Result<()>;
}

/// Sink that drops every snapshot.
pub struct NullSink;

impl FieldSink for NullSink {
    fn open_epoch(&mut self, _spec: &EpochSpec) -> Result<()> {
        Ok(())
    }

    fn write(
        &mut self,
        _slab: usize,
        _time: Real,
        _step: u64,
        _e: &VectorField3D,
        _h: &VectorField3D,
    ) -> Result<()> {
        Ok(())
    }

    fn close_epoch(&mut self) -> Result<()> {
        Ok(())
    }
}

/// One recorded snapshot.
pub struct Snapshot {
    /// hyperslab index the snapshot was addressed to
    pub slab: usize,
    /// (s) simulated time of the snapshot
    pub time: Real,
    /// step index within the advance
    pub step: u64,
    /// copy of the electric field
    pub e: VectorField3D,
    /// copy of the magnetic field
    pub h: VectorField3D,
}

/// In-memory sink recording every write.
#[derive(Default)]
pub struct MemorySink {
    /// spec of the currently or last opened epoch
    pub epoch: Option<EpochSpec>,
    /// snapshots in write order
    pub snapshots: Vec<Snapshot>,
    /// whether the last epoch was closed
    pub closed: bool,
}

impl FieldSink for MemorySink {
    fn open_epoch(&mut self, spec: &EpochSpec) -> Result<()> {
        self.epoch = Some(*spec);
        self.closed = false;
        Ok(())
    }

    fn write(
        &mut self,
        slab: usize,
        time: Real,
        step: u64,
        e: &VectorField3D,
        h: &VectorField3D,
    ) -> Result<()> {
        let spec = self
            .epoch
            .as_ref()
            .ok_or_else(|| Error::Io("write outside of an open dump epoch".into()))?;
        if slab as u64 >= spec.logged_steps {
            return Err(Error::Io(format!(
                "hyperslab index {slab} out of range for {} slots",
                spec.logged_steps
            )));
        }
        self.snapshots.push(Snapshot {
            slab,
            time,
            step,
            e: e.clone(),
            h: h.clone(),
        });
        Ok(())
    }

    fn close_epoch(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
