use log::info;

use crate::filters;
use crate::volume::Volume;

/// Thresholded reference image and the ordered ids of its masked points.
///
/// The id list is built once and shared by the geometry and timestep
/// writers, so both files list points in the same order.
#[derive(Clone, Debug)]
pub struct ReferenceMask {
    volume: Volume,
    indices: Vec<usize>,
}

impl ReferenceMask {
    pub fn from_reference(reference: &Volume, low: f64, high: f64) -> Self {
        info!("Filtering reference image...");
        let volume = filters::threshold(reference, low, high);
        let indices: Vec<usize> = volume
            .data
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == 1.0)
            .map(|(i, _)| i)
            .collect();
        info!("Number of data points in region = {}", indices.len());
        Self { volume, indices }
    }

    /// Number of masked points ("numberDataPoints").
    pub fn count(&self) -> usize {
        self.indices.len()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// The 0/1 mask volume.
    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    /// Physical coordinates of the masked points, in id order.
    pub fn points(&self) -> impl Iterator<Item = [f64; 3]> + '_ {
        self.indices.iter().map(|&id| self.volume.point(id))
    }
}
