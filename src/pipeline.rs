use std::path::PathBuf;

use log::{error, info};
use thiserror::Error;

use crate::config::{ConfigError, PcvConfig};
use crate::enums::{Component, Interpolation, SortBy};
use crate::field::{FieldError, VelocityField};
use crate::filters;
use crate::layout::StackLayout;
use crate::mask::ReferenceMask;
use crate::transform::GeometricTransform;
use crate::volume::{Volume, VolumeError};
use crate::volume_loader::{VolumeLoader, VolumeLoaderError};
use crate::writer::{PcvWriter, WriterError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to load reference image: {0}")]
    Reference(#[source] VolumeLoaderError),

    #[error("Failed to load {component} stack of timestep {timestep}: {source}")]
    Component {
        timestep: usize,
        component: Component,
        #[source]
        source: VolumeLoaderError,
    },

    #[error(transparent)]
    Volume(#[from] VolumeError),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Writer(#[from] WriterError),
}

/// Supplies the reference image and the velocity stacks of a run.
pub trait VolumeSource {
    fn load_reference(&self) -> Result<Volume, VolumeLoaderError>;

    fn load_component(
        &self,
        timestep: usize,
        component: Component,
    ) -> Result<Volume, VolumeLoaderError>;
}

/// Reads stacks from a scanner export on disk.
pub struct DicomSource {
    reference_directory: PathBuf,
    layout: StackLayout,
    sort_by: SortBy,
}

impl DicomSource {
    pub fn new(reference_directory: impl Into<PathBuf>, layout: StackLayout, sort_by: SortBy) -> Self {
        Self {
            reference_directory: reference_directory.into(),
            layout,
            sort_by,
        }
    }

    pub fn from_config(config: &PcvConfig) -> Self {
        Self::new(
            config.reference_directory.clone(),
            config.stack_layout(),
            config.sort_by,
        )
    }
}

impl VolumeSource for DicomSource {
    fn load_reference(&self) -> Result<Volume, VolumeLoaderError> {
        info!("reading reference : {}", self.reference_directory.display());
        VolumeLoader::load_from_directory(&self.reference_directory, self.sort_by)
    }

    fn load_component(
        &self,
        timestep: usize,
        component: Component,
    ) -> Result<Volume, VolumeLoaderError> {
        let archetype = self.layout.archetype_path(timestep, component);
        info!("reading : {}", archetype.display());
        VolumeLoader::load_series_from_archetype(&archetype, self.layout.slices_per_stack, self.sort_by)
    }
}

/// Files written by a run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub number_data_points: usize,
    pub geometry_file: PathBuf,
    pub timestep_files: Vec<PathBuf>,
}

pub struct PcvPipeline<S> {
    source: S,
    writer: PcvWriter,
    number_of_timesteps: usize,
    time_increment: f64,
    low_threshold: f64,
    high_threshold: f64,
    transform: GeometricTransform,
    interpolation: Interpolation,
    keep_going: bool,
}

impl PcvPipeline<DicomSource> {
    /// Pipeline reading DICOM stacks as described by `config`.
    pub fn from_config(config: &PcvConfig) -> Result<Self, PipelineError> {
        Self::with_source(config, DicomSource::from_config(config))
    }
}

impl<S: VolumeSource> PcvPipeline<S> {
    pub fn with_source(config: &PcvConfig, source: S) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            source,
            writer: PcvWriter::new(config.output_file_name.clone())?,
            number_of_timesteps: config.number_of_timesteps,
            time_increment: config.time_increment,
            low_threshold: config.low_threshold,
            high_threshold: config.high_threshold,
            transform: config.transform.clone(),
            interpolation: config.interpolation,
            keep_going: config.keep_going,
        })
    }

    pub fn run(&self) -> Result<RunSummary, PipelineError> {
        let reference = self
            .source
            .load_reference()
            .map_err(PipelineError::Reference)?;
        let mask = ReferenceMask::from_reference(&reference, self.low_threshold, self.high_threshold);
        drop(reference);
        let geometry_file = self.writer.write_geometry(&mask)?;

        let mut timestep_files = Vec::with_capacity(self.number_of_timesteps);
        for timestep in 1..=self.number_of_timesteps {
            info!(
                "Processing timestep {timestep} (t = {})",
                timestep as f64 * self.time_increment
            );
            let field = self.extract_timestep(timestep, &mask)?;
            timestep_files.push(self.writer.write_timestep(timestep, &mask, &field)?);
        }

        Ok(RunSummary {
            number_data_points: mask.count(),
            geometry_file,
            timestep_files,
        })
    }

    fn extract_timestep(
        &self,
        timestep: usize,
        mask: &ReferenceMask,
    ) -> Result<VelocityField, PipelineError> {
        let mut field = VelocityField::new(mask.count());

        for component in Component::ALL {
            match self.accumulate_component(&mut field, timestep, component, mask) {
                Ok(()) => {}
                Err(e) if self.keep_going => {
                    error!("Skipping {component} stack of timestep {timestep}: {e}");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(field)
    }

    /// Loads, transforms and masks one stack, then stores it in `field`.
    /// On error `field` is left untouched.
    fn accumulate_component(
        &self,
        field: &mut VelocityField,
        timestep: usize,
        component: Component,
        mask: &ReferenceMask,
    ) -> Result<(), PipelineError> {
        let image = self
            .source
            .load_component(timestep, component)
            .map_err(|source| PipelineError::Component {
                timestep,
                component,
                source,
            })?;

        let image = self.transform.apply(image, self.interpolation);
        let masked = filters::multiply(&image, mask.volume())?;
        field.set_component(component, &masked, mask)?;
        Ok(())
    }
}
