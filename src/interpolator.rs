use ndarray::ArrayView3;

use crate::enums::Interpolation;

// Continuous indices this close outside the extent still count as inside.
const EXTENT_TOLERANCE: f64 = 1e-6;

pub(crate) struct Interpolator;

impl Interpolator {
    /// Samples `data` (`z, y, x` layout) at a continuous `(x, y, z)` index.
    /// Returns `None` when the index lies outside the volume.
    #[inline]
    pub(crate) fn sample(
        data: &ArrayView3<f32>,
        index: [f64; 3],
        interpolation: Interpolation,
    ) -> Option<f32> {
        let (depth, height, width) = data.dim();
        let x = Self::clamp_to_extent(index[0], width)?;
        let y = Self::clamp_to_extent(index[1], height)?;
        let z = Self::clamp_to_extent(index[2], depth)?;

        match interpolation {
            Interpolation::NearestNeighbor => Some(Self::nearest(data, z, y, x)),
            Interpolation::Linear => Some(Self::trilinear_interpolate(data, z, y, x)),
        }
    }

    #[inline]
    fn clamp_to_extent(value: f64, len: usize) -> Option<f64> {
        let max = (len as f64) - 1.0;
        if len == 0 || value < -EXTENT_TOLERANCE || value > max + EXTENT_TOLERANCE {
            return None;
        }
        Some(value.clamp(0.0, max))
    }

    #[inline]
    fn nearest(data: &ArrayView3<f32>, z: f64, y: f64, x: f64) -> f32 {
        data[[z.round() as usize, y.round() as usize, x.round() as usize]]
    }

    #[inline]
    pub(crate) fn trilinear_interpolate(data: &ArrayView3<f32>, z: f64, y: f64, x: f64) -> f32 {
        let (depth, height, width) = data.dim();

        let z0 = z.floor() as usize;
        let y0 = y.floor() as usize;
        let x0 = x.floor() as usize;
        let z1 = (z0 + 1).min(depth - 1);
        let y1 = (y0 + 1).min(height - 1);
        let x1 = (x0 + 1).min(width - 1);

        let dz = (z - z0 as f64) as f32;
        let dy = (y - y0 as f64) as f32;
        let dx = (x - x0 as f64) as f32;
        let one_minus_dx = 1.0 - dx;
        let one_minus_dy = 1.0 - dy;
        let one_minus_dz = 1.0 - dz;

        let along_x = |z: usize, y: usize| {
            data[[z, y, x0]].mul_add(one_minus_dx, data[[z, y, x1]] * dx)
        };

        let v0 = along_x(z0, y0).mul_add(one_minus_dy, along_x(z0, y1) * dy);
        let v1 = along_x(z1, y0).mul_add(one_minus_dy, along_x(z1, y1) * dy);

        v0.mul_add(one_minus_dz, v1 * dz)
    }
}
