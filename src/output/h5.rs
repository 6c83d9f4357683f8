//! HDF5 archival container.
//!
//! Layout per run:
//!
//! ```text
//! /metadata/dt              scalar, chosen precision
//! /metadata/dxdydz          [3], (x, y, z) order
//! /metadata/logged_steps    scalar, u64
//! /data/time                [logged_steps]
//! /data/step                [logged_steps], u64
//! /data/{ex,ey,ez}          [nv_e.x, nv_e.y, nv_e.z, logged_steps]
//! /data/{hx,hy,hz}          [nv_h.x, nv_h.y, nv_h.z, logged_steps]
//! ```
//!
//! Each snapshot occupies one full `(x, y, z)` slab at its hyperslab index
//! along the last axis. The file holds exactly one epoch; dataset handles
//! are dropped when the epoch closes.

use std::path::Path;

use hdf5::{Dataset, File, Group};
use log::debug;
use ndarray::s;

use crate::arrays::{Dimensions, Field3D, VectorField3D};
use crate::output::{EpochSpec, FieldSink};
use crate::{Error, Real, Result};

/// Snapshot sink writing to an HDF5 file.
pub struct H5Sink {
    file: File,
    epoch: Option<EpochDatasets>,
    epoch_written: bool,
}

/// Open dataset handles for the current epoch.
struct EpochDatasets {
    time: Dataset,
    step: Dataset,
    ex: Dataset,
    ey: Dataset,
    ez: Dataset,
    hx: Dataset,
    hy: Dataset,
    hz: Dataset,
    logged_steps: u64,
}

impl H5Sink {
    /// Create the output file, truncating any existing file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .map_err(|err| Error::Io(format!("create {}: {err}", path.display())))?;
        Ok(Self {
            file,
            epoch: None,
            epoch_written: false,
        })
    }

    fn field_dataset(
        group: &Group,
        name: &str,
        dims: Dimensions,
        logged_steps: u64,
    ) -> Result<Dataset> {
        group
            .new_dataset::<Real>()
            .shape([dims.nx, dims.ny, dims.nz, logged_steps as usize])
            .create(name)
            .map_err(Error::from)
    }

    fn write_component(dataset: &Dataset, field: &Field3D, slab: usize) -> Result<()> {
        dataset.write_slice(field.view(), s![.., .., .., slab])?;
        Ok(())
    }
}

impl FieldSink for H5Sink {
    fn open_epoch(&mut self, spec: &EpochSpec) -> Result<()> {
        if self.epoch_written || self.epoch.is_some() {
            return Err(Error::Io(
                "dump epoch already written to this file".into(),
            ));
        }
        debug!(
            "open dump epoch with {} hyperslab slots",
            spec.logged_steps
        );

        let metadata = self.file.create_group("metadata")?;
        metadata
            .new_dataset::<Real>()
            .create("dt")?
            .write_scalar(&spec.dt)?;
        metadata
            .new_dataset_builder()
            .with_data(&[spec.d.x, spec.d.y, spec.d.z])
            .create("dxdydz")?;
        metadata
            .new_dataset::<u64>()
            .create("logged_steps")?
            .write_scalar(&spec.logged_steps)?;

        let data = self.file.create_group("data")?;
        let slots = spec.logged_steps as usize;
        self.epoch = Some(EpochDatasets {
            time: data.new_dataset::<Real>().shape([slots]).create("time")?,
            step: data.new_dataset::<u64>().shape([slots]).create("step")?,
            ex: Self::field_dataset(&data, "ex", spec.nv_e, spec.logged_steps)?,
            ey: Self::field_dataset(&data, "ey", spec.nv_e, spec.logged_steps)?,
            ez: Self::field_dataset(&data, "ez", spec.nv_e, spec.logged_steps)?,
            hx: Self::field_dataset(&data, "hx", spec.nv_h, spec.logged_steps)?,
            hy: Self::field_dataset(&data, "hy", spec.nv_h, spec.logged_steps)?,
            hz: Self::field_dataset(&data, "hz", spec.nv_h, spec.logged_steps)?,
            logged_steps: spec.logged_steps,
        });
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
        let datasets = self
            .epoch
            .as_ref()
            .ok_or_else(|| Error::Io("write outside of an open dump epoch".into()))?;
        if slab as u64 >= datasets.logged_steps {
            return Err(Error::Io(format!(
                "hyperslab index {slab} out of range for {} slots",
                datasets.logged_steps
            )));
        }

        datasets.time.write_slice(&[time], s![slab..slab + 1])?;
        datasets.step.write_slice(&[step], s![slab..slab + 1])?;
        Self::write_component(&datasets.ex, &e.x, slab)?;
        Self::write_component(&datasets.ey, &e.y, slab)?;
        Self::write_component(&datasets.ez, &e.z, slab)?;
        Self::write_component(&datasets.hx, &h.x, slab)?;
        Self::write_component(&datasets.hy, &h.y, slab)?;
        Self::write_component(&datasets.hz, &h.z, slab)?;
        Ok(())
    }

    fn close_epoch(&mut self) -> Result<()> {
        if self.epoch.take().is_some() {
            self.epoch_written = true;
            self.file.flush()?;
            debug!("dump epoch closed");
        }
        Ok(())
    }
}
