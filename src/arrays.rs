//! Aligned contiguous storage for 3-D scalar and vector fields.
//!
//! Each field component is one cache-line-aligned allocation viewed as a
//! row-major 3-D array (k fastest, then j, then i). The two vector fields
//! of a simulation own their buffers for the lifetime of the run; nothing
//! aliases them.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use ndarray::ArrayView3;

use crate::{Error, Real, Result};

/// Alignment of every field component buffer, in bytes.
const FIELD_ALIGN: usize = 64;

/// Voxel counts along the three axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    /// voxels along x
    pub nx: usize,
    /// voxels along y
    pub ny: usize,
    /// voxels along z
    pub nz: usize,
}

impl Dimensions {
    /// Create a new dimension triplet.
    pub const fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    /// Total number of voxels.
    pub const fn total(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Dimensions grown by one voxel per axis.
    pub const fn grown(&self) -> Self {
        Self::new(self.nx + 1, self.ny + 1, self.nz + 1)
    }

    /// Linear offset of `(i, j, k)`: incrementing k advances by one
    /// element, j by `nz`, i by `ny * nz`.
    #[inline]
    pub const fn to_linear(&self, i: usize, j: usize, k: usize) -> usize {
        k + self.nz * (j + self.ny * i)
    }
}

/// One scalar field component stored in a 64-byte-aligned contiguous
/// buffer.
pub struct Field3D {
    ptr: NonNull<Real>,
    dims: Dimensions,
}

// The buffer is uniquely owned; &Field3D only permits reads and
// &mut Field3D is exclusive.
unsafe impl Send for Field3D {}
unsafe impl Sync for Field3D {}

impl Field3D {
    /// Allocate a field of the given extents with every element set to
    /// `init`.
    pub fn new(dims: Dimensions, init: Real) -> Result<Self> {
        let n = dims.total();
        if n == 0 {
            return Err(Error::Alloc("field with zero extent".into()));
        }
        let layout = Self::layout(n)?;
        // SAFETY: layout has non-zero size.
        let raw = unsafe { alloc::alloc(layout) } as *mut Real;
        let ptr = NonNull::new(raw).ok_or_else(|| {
            Error::Alloc(format!("failed to allocate {n} field elements"))
        })?;
        // SAFETY: initialize every element before any slice is formed.
        unsafe {
            for offset in 0..n {
                ptr.as_ptr().add(offset).write(init);
            }
        }
        Ok(Self { ptr, dims })
    }

    fn layout(n: usize) -> Result<Layout> {
        Layout::from_size_align(n * std::mem::size_of::<Real>(), FIELD_ALIGN)
            .map_err(|err| Error::Alloc(err.to_string()))
    }

    /// Extents of this component.
    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    /// Read the element at `(i, j, k)`.
    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> Real {
        debug_assert!(i < self.dims.nx && j < self.dims.ny && k < self.dims.nz);
        // SAFETY: to_linear(i, j, k) < total() for in-range indices.
        unsafe { *self.ptr.as_ptr().add(self.dims.to_linear(i, j, k)) }
    }

    /// Write the element at `(i, j, k)`.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: Real) {
        debug_assert!(i < self.dims.nx && j < self.dims.ny && k < self.dims.nz);
        // SAFETY: as for get.
        unsafe { *self.ptr.as_ptr().add(self.dims.to_linear(i, j, k)) = value }
    }

    /// Set every element to `value`.
    pub fn fill(&mut self, value: Real) {
        self.as_mut_slice().fill(value);
    }

    /// The whole buffer as a slice, in linear-offset order.
    pub fn as_slice(&self) -> &[Real] {
        // SAFETY: the buffer holds exactly total() initialized elements.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.dims.total()) }
    }

    /// The whole buffer as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [Real] {
        // SAFETY: as for as_slice; &mut self guarantees exclusivity.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.dims.total()) }
    }

    /// 3-D view over the buffer for bulk I/O.
    pub fn view(&self) -> ArrayView3<'_, Real> {
        ArrayView3::from_shape((self.dims.nx, self.dims.ny, self.dims.nz), self.as_slice())
            .expect("extents match storage")
    }

    /// Sum of squared elements, accumulated in double precision.
    pub fn energy(&self) -> f64 {
        self.as_slice()
            .iter()
            .map(|&v| (v as f64) * (v as f64))
            .sum()
    }
}

impl Drop for Field3D {
    fn drop(&mut self) {
        let layout = Self::layout(self.dims.total()).expect("layout valid at construction");
        // SAFETY: ptr was allocated with this layout in new().
        unsafe { alloc::dealloc(self.ptr.as_ptr() as *mut u8, layout) }
    }
}

impl Clone for Field3D {
    fn clone(&self) -> Self {
        let mut copy = Self::new(self.dims, 0.0).expect("source allocation succeeded");
        copy.as_mut_slice().copy_from_slice(self.as_slice());
        copy
    }
}

/// A three-component vector field; the components share extents but each
/// owns its own aligned buffer.
#[derive(Clone)]
pub struct VectorField3D {
    /// x-component
    pub x: Field3D,
    /// y-component
    pub y: Field3D,
    /// z-component
    pub z: Field3D,
}

impl VectorField3D {
    /// Allocate a vector field with all components set to `init`.
    pub fn new(dims: Dimensions, init: Real) -> Result<Self> {
        Ok(Self {
            x: Field3D::new(dims, init)?,
            y: Field3D::new(dims, init)?,
            z: Field3D::new(dims, init)?,
        })
    }

    /// Extents shared by the three components.
    pub fn dims(&self) -> Dimensions {
        self.x.dims()
    }

    /// Zero all components.
    pub fn clear(&mut self) {
        self.x.fill(0.0);
        self.y.fill(0.0);
        self.z.fill(0.0);
    }

    /// Sum of squared elements over all components.
    pub fn energy(&self) -> f64 {
        self.x.energy() + self.y.energy() + self.z.energy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_order_is_k_fastest() {
        let dims = Dimensions::new(2, 3, 4);
        assert_eq!(dims.to_linear(0, 0, 0), 0);
        assert_eq!(dims.to_linear(0, 0, 1), 1);
        assert_eq!(dims.to_linear(0, 1, 0), 4);
        assert_eq!(dims.to_linear(1, 0, 0), 12);
        assert_eq!(dims.to_linear(1, 2, 3), 23);
        assert_eq!(dims.total(), 24);
    }

    #[test]
    fn buffers_are_cache_line_aligned() {
        let field = Field3D::new(Dimensions::new(3, 5, 7), 0.0).unwrap();
        assert_eq!(field.as_slice().as_ptr() as usize % FIELD_ALIGN, 0);
    }

    #[test]
    fn construction_initializes_every_element() {
        let field = Field3D::new(Dimensions::new(4, 4, 4), 2.5).unwrap();
        assert!(field.as_slice().iter().all(|&v| v == 2.5));
    }

    #[test]
    fn get_set_round_trip() {
        let mut field = Field3D::new(Dimensions::new(3, 3, 3), 0.0).unwrap();
        field.set(1, 2, 0, -4.0);
        assert_eq!(field.get(1, 2, 0), -4.0);
        assert_eq!(field.as_slice()[field.dims().to_linear(1, 2, 0)], -4.0);
    }

    #[test]
    fn view_matches_element_access() {
        let mut field = Field3D::new(Dimensions::new(2, 2, 2), 0.0).unwrap();
        field.set(1, 0, 1, 9.0);
        assert_eq!(field.view()[(1, 0, 1)], 9.0);
    }

    #[test]
    fn clone_copies_contents() {
        let mut field = Field3D::new(Dimensions::new(2, 2, 2), 1.0).unwrap();
        field.set(0, 1, 1, 7.0);
        let copy = field.clone();
        assert_eq!(copy.get(0, 1, 1), 7.0);
        assert_eq!(copy.as_slice(), field.as_slice());
    }

    #[test]
    fn zero_extent_is_rejected() {
        assert!(Field3D::new(Dimensions::new(0, 4, 4), 0.0).is_err());
    }

    #[test]
    fn vector_field_components_share_extents() {
        let field = VectorField3D::new(Dimensions::new(2, 3, 4), 0.0).unwrap();
        assert_eq!(field.x.dims(), field.dims());
        assert_eq!(field.y.dims(), field.dims());
        assert_eq!(field.z.dims(), field.dims());
    }

    #[test]
    fn energy_sums_squares() {
        let mut field = VectorField3D::new(Dimensions::new(2, 2, 2), 0.0).unwrap();
        field.x.set(0, 0, 0, 3.0);
        field.y.set(1, 1, 1, 4.0);
        assert_eq!(field.energy(), 25.0);
    }
}
