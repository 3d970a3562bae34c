use ndarray::Array3;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum VolumeError {
    #[error("Volume dimensions differ: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        expected: (usize, usize, usize),
        found: (usize, usize, usize),
    },
}

/// Scalar image volume with its position in patient space.
///
/// Voxels are stored as `(depth, height, width)`, i.e. `(z, y, x)`. Point ids
/// enumerate voxels with x varying fastest, then y, then z, which is the
/// iteration order of the standard layout array.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Volume {
    pub data: Array3<f32>,
    /// Voxel spacing in millimetres, `(x, y, z)`.
    pub spacing: [f64; 3],
    /// Physical position of voxel `(0, 0, 0)`, `(x, y, z)`.
    pub origin: [f64; 3],
}

impl Volume {
    pub fn new(data: Array3<f32>, spacing: [f64; 3]) -> Self {
        Self {
            data,
            spacing,
            origin: [0.0; 3],
        }
    }

    pub fn with_origin(mut self, origin: [f64; 3]) -> Self {
        self.origin = origin;
        self
    }

    /// Volume holding the same geometry as `self` with new voxel values.
    pub fn with_data(&self, data: Array3<f32>) -> Self {
        Self {
            data,
            spacing: self.spacing,
            origin: self.origin,
        }
    }

    /// Get the dimensions of the volume (depth, height, width)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn number_of_points(&self) -> usize {
        self.data.len()
    }

    /// Array index `(z, y, x)` of a point id.
    pub fn index_of(&self, point_id: usize) -> (usize, usize, usize) {
        let (_, height, width) = self.dim();
        let x = point_id % width;
        let y = (point_id / width) % height;
        let z = point_id / (width * height);
        (z, y, x)
    }

    /// Value of a point id, `None` past the end of the volume.
    pub fn value(&self, point_id: usize) -> Option<f32> {
        if point_id >= self.number_of_points() {
            return None;
        }
        let (z, y, x) = self.index_of(point_id);
        self.data.get((z, y, x)).copied()
    }

    /// Physical coordinates `(x, y, z)` of a point id.
    pub fn point(&self, point_id: usize) -> [f64; 3] {
        let (z, y, x) = self.index_of(point_id);
        self.index_to_physical([x as f64, y as f64, z as f64])
    }

    /// Maps a continuous `(x, y, z)` index to physical coordinates.
    #[inline]
    pub fn index_to_physical(&self, index: [f64; 3]) -> [f64; 3] {
        [
            self.spacing[0].mul_add(index[0], self.origin[0]),
            self.spacing[1].mul_add(index[1], self.origin[1]),
            self.spacing[2].mul_add(index[2], self.origin[2]),
        ]
    }

    /// Maps physical coordinates to a continuous `(x, y, z)` index.
    #[inline]
    pub fn physical_to_index(&self, point: [f64; 3]) -> [f64; 3] {
        [
            (point[0] - self.origin[0]) / self.spacing[0],
            (point[1] - self.origin[1]) / self.spacing[1],
            (point[2] - self.origin[2]) / self.spacing[2],
        ]
    }

    pub(crate) fn check_same_dimensions(&self, other: &Volume) -> Result<(), VolumeError> {
        if self.dim() != other.dim() {
            return Err(VolumeError::DimensionMismatch {
                expected: self.dim(),
                found: other.dim(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(dim: (usize, usize, usize)) -> Volume {
        let data = Array3::from_shape_fn(dim, |(z, y, x)| (z * 100 + y * 10 + x) as f32);
        Volume::new(data, [0.5, 2.0, 3.0]).with_origin([10.0, -1.0, 0.0])
    }

    #[test]
    fn point_ids_run_x_fastest() {
        let volume = ramp((2, 3, 4));
        assert_eq!(volume.index_of(0), (0, 0, 0));
        assert_eq!(volume.index_of(1), (0, 0, 1));
        assert_eq!(volume.index_of(4), (0, 1, 0));
        assert_eq!(volume.index_of(12), (1, 0, 0));
        assert_eq!(volume.value(13), Some(101.0));
        assert_eq!(volume.value(24), None);
    }

    #[test]
    fn point_coordinates_use_origin_and_spacing() {
        let volume = ramp((2, 3, 4));
        assert_eq!(volume.point(0), [10.0, -1.0, 0.0]);
        // (z, y, x) = (1, 2, 3)
        assert_eq!(volume.point(12 + 8 + 3), [11.5, 3.0, 3.0]);
    }

    #[test]
    fn physical_index_mapping_is_inverse() {
        let volume = ramp((2, 3, 4));
        let index = [1.25, 0.5, 1.0];
        let back = volume.physical_to_index(volume.index_to_physical(index));
        for (a, b) in index.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn dimension_check_reports_both_shapes() {
        let a = ramp((2, 3, 4));
        let b = ramp((2, 3, 5));
        assert_eq!(
            a.check_same_dimensions(&b),
            Err(VolumeError::DimensionMismatch {
                expected: (2, 3, 4),
                found: (2, 3, 5),
            })
        );
    }
}
