use thiserror::Error;

use crate::enums::Component;
use crate::mask::ReferenceMask;
use crate::volume::Volume;

#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    #[error("Image has {found} points but the reference image has {expected}")]
    PointCountMismatch { expected: usize, found: usize },
}

/// Velocity vectors of one timestep, one `(u, v, w)` triple per masked point.
#[derive(Clone, Debug, PartialEq)]
pub struct VelocityField {
    vectors: Vec<[f32; 3]>,
}

impl VelocityField {
    pub fn new(number_data_points: usize) -> Self {
        Self {
            vectors: vec![[0.0; 3]; number_data_points],
        }
    }

    /// Copies the values of `image` at the masked points into `component`.
    pub fn set_component(
        &mut self,
        component: Component,
        image: &Volume,
        mask: &ReferenceMask,
    ) -> Result<(), FieldError> {
        let expected = mask.volume().number_of_points();
        if image.number_of_points() != expected {
            return Err(FieldError::PointCountMismatch {
                expected,
                found: image.number_of_points(),
            });
        }

        let slot = component.index();
        for (vector, &id) in self.vectors.iter_mut().zip(mask.indices()) {
            let (z, y, x) = image.index_of(id);
            vector[slot] = image.data[[z, y, x]];
        }
        Ok(())
    }

    pub fn vectors(&self) -> &[[f32; 3]] {
        &self.vectors
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn mask() -> ReferenceMask {
        let data = Array3::from_shape_vec((1, 2, 2), vec![0.0, -5.0, 3.0, -1.0]).unwrap();
        ReferenceMask::from_reference(&Volume::new(data, [1.0; 3]), -100.0, 0.0)
    }

    #[test]
    fn components_fill_their_own_slot() {
        let mask = mask();
        let mut field = VelocityField::new(mask.count());
        let u = Volume::new(Array3::from_shape_vec((1, 2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap(), [1.0; 3]);
        let w = Volume::new(Array3::from_elem((1, 2, 2), -0.5), [1.0; 3]);

        field.set_component(Component::U, &u, &mask).unwrap();
        field.set_component(Component::W, &w, &mask).unwrap();

        assert_eq!(field.vectors(), &[[1.0, 0.0, -0.5], [2.0, 0.0, -0.5], [4.0, 0.0, -0.5]]);
    }

    #[test]
    fn rejects_images_of_another_size() {
        let mask = mask();
        let mut field = VelocityField::new(mask.count());
        let small = Volume::new(Array3::zeros((1, 1, 2)), [1.0; 3]);
        assert_eq!(
            field.set_component(Component::V, &small, &mask),
            Err(FieldError::PointCountMismatch {
                expected: 4,
                found: 2
            })
        );
    }
}
