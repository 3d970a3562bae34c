use log::{debug, info};
use nalgebra::{Matrix4, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use crate::enums::{Axis, Interpolation};
use crate::filters;
use crate::volume::Volume;

/// Flip, rotation, translation and scaling applied to every velocity stack
/// before it is masked against the reference image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometricTransform {
    /// Mirror the data along x, y and z respectively.
    pub flip: [bool; 3],
    /// Rotation around the x, y and z axes in degrees.
    pub rotation: [f64; 3],
    pub translation: [f64; 3],
    pub scaling: [f64; 3],
}

impl Default for GeometricTransform {
    fn default() -> Self {
        Self {
            flip: [false; 3],
            rotation: [0.0; 3],
            translation: [0.0; 3],
            scaling: [1.0; 3],
        }
    }
}

impl GeometricTransform {
    pub fn needs_flip(&self) -> bool {
        self.flip.iter().any(|&f| f)
    }

    pub fn needs_reslice(&self) -> bool {
        self.rotation != [0.0; 3] || self.translation != [0.0; 3] || self.scaling != [1.0; 3]
    }

    /// Homogeneous matrix `Rx * Ry * Rz * T * S` mapping output points to
    /// the input points they are sampled from.
    pub fn matrix(&self) -> Matrix4<f64> {
        let [rx, ry, rz] = self.rotation;
        let rotate_x = Rotation3::from_axis_angle(&Vector3::x_axis(), rx.to_radians());
        let rotate_y = Rotation3::from_axis_angle(&Vector3::y_axis(), ry.to_radians());
        let rotate_z = Rotation3::from_axis_angle(&Vector3::z_axis(), rz.to_radians());
        let translate = Matrix4::new_translation(&Vector3::from(self.translation));
        let scale = Matrix4::new_nonuniform_scaling(&Vector3::from(self.scaling));

        rotate_x.to_homogeneous()
            * rotate_y.to_homogeneous()
            * rotate_z.to_homogeneous()
            * translate
            * scale
    }

    /// Flips the flagged axes in x, y, z order, then reslices if any
    /// rotation, translation or scaling is set.
    pub fn apply(&self, mut volume: Volume, interpolation: Interpolation) -> Volume {
        for (axis, _) in Axis::ALL.iter().zip(self.flip).filter(|(_, f)| *f) {
            debug!("Flipping image along {axis:?}");
            filters::flip(&mut volume, *axis);
        }

        if !self.needs_reslice() {
            return volume;
        }

        info!("Setting up transform matrix using specified translation, rotation and/or scaling");
        let matrix = self.matrix();
        debug!("Reslice matrix: {matrix}");
        filters::reslice(&volume, &matrix, interpolation)
    }
}
