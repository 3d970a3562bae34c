//! Voxel filters applied to every velocity stack: thresholding, flipping,
//! reslicing through a transform and masking.

use nalgebra::{Matrix4, Point3};
use ndarray::{Array3, Zip};

use crate::enums::{Axis, Interpolation};
use crate::interpolator::Interpolator;
use crate::volume::{Volume, VolumeError};

const IN_VALUE: f32 = 1.0;
const OUT_VALUE: f32 = 0.0;
const BACKGROUND: f32 = 0.0;

/// Binarises a volume: voxels inside `[low, high]` become 1, all others 0.
pub fn threshold(volume: &Volume, low: f64, high: f64) -> Volume {
    let mut data = volume.data.clone();
    data.par_mapv_inplace(|v| {
        let v = f64::from(v);
        if v >= low && v <= high {
            IN_VALUE
        } else {
            OUT_VALUE
        }
    });
    volume.with_data(data)
}

/// Mirrors the voxel data along one axis. Origin and spacing are kept.
pub fn flip(volume: &mut Volume, axis: Axis) {
    volume.data.invert_axis(axis.array_axis());
    volume.data = volume.data.as_standard_layout().into_owned();
}

/// Resamples `volume` onto its own grid through `matrix`.
///
/// Every output voxel at physical point `p` takes the input value at
/// `matrix * p`; positions falling outside the input are set to 0.
pub fn reslice(volume: &Volume, matrix: &Matrix4<f64>, interpolation: Interpolation) -> Volume {
    let input = volume.data.view();
    let mut output = Array3::<f32>::zeros(volume.dim());

    Zip::indexed(&mut output).par_for_each(|(z, y, x), out| {
        let [px, py, pz] = volume.index_to_physical([x as f64, y as f64, z as f64]);
        let source = matrix.transform_point(&Point3::new(px, py, pz));
        let index = volume.physical_to_index([source.x, source.y, source.z]);
        *out = Interpolator::sample(&input, index, interpolation).unwrap_or(BACKGROUND);
    });

    volume.with_data(output)
}

/// Pointwise product of an image and a mask of identical dimensions.
pub fn multiply(image: &Volume, mask: &Volume) -> Result<Volume, VolumeError> {
    image.check_same_dimensions(mask)?;
    Ok(image.with_data(&image.data * &mask.data))
}
