use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::enums::{Interpolation, SortBy};
use crate::layout::{DEFAULT_NUMBER_PADDING, StackLayout};
use crate::transform::GeometricTransform;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Error: no OutputFileName.")]
    MissingOutputFileName,

    #[error("Error: no input directory.")]
    MissingInputDirectory,

    #[error("Error: no reference image directory.")]
    MissingReference,

    #[error("{0} must be at least 1")]
    Zero(&'static str),

    #[error("Low threshold {low} is above high threshold {high}")]
    InvalidThreshold { low: f64, high: f64 },
}

/// Settings of one PCV extraction run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PcvConfig {
    /// Root of the `{timestep}/{u|v|w}/` stack directories.
    pub input_directory: PathBuf,
    /// Directory of the DICOM series thresholded into the region mask.
    pub reference_directory: PathBuf,
    /// Output name; files are written as `{name}.geom` and `{name}{t}.pcv`.
    pub output_file_name: String,
    pub input_file_prefix: String,
    pub number_of_timesteps: usize,
    pub slices_per_stack: usize,
    pub image_number_padding: usize,
    /// Time between timesteps, only used for progress logging.
    pub time_increment: f64,
    pub low_threshold: f64,
    pub high_threshold: f64,
    pub transform: GeometricTransform,
    pub interpolation: Interpolation,
    pub sort_by: SortBy,
    /// Log unreadable component stacks and leave them zero instead of
    /// aborting the run.
    pub keep_going: bool,
}

impl Default for PcvConfig {
    fn default() -> Self {
        Self {
            input_directory: PathBuf::new(),
            reference_directory: PathBuf::new(),
            output_file_name: String::new(),
            input_file_prefix: String::new(),
            number_of_timesteps: 0,
            slices_per_stack: 36,
            image_number_padding: DEFAULT_NUMBER_PADDING,
            time_increment: 0.0,
            low_threshold: -100.0,
            high_threshold: 0.0,
            transform: GeometricTransform::default(),
            interpolation: Interpolation::default(),
            sort_by: SortBy::default(),
            keep_going: false,
        }
    }
}

impl PcvConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_file_name.is_empty() {
            return Err(ConfigError::MissingOutputFileName);
        }
        if self.input_directory.as_os_str().is_empty() {
            return Err(ConfigError::MissingInputDirectory);
        }
        if self.reference_directory.as_os_str().is_empty() {
            return Err(ConfigError::MissingReference);
        }
        if self.number_of_timesteps == 0 {
            return Err(ConfigError::Zero("number_of_timesteps"));
        }
        if self.slices_per_stack == 0 {
            return Err(ConfigError::Zero("slices_per_stack"));
        }
        if self.low_threshold > self.high_threshold {
            return Err(ConfigError::InvalidThreshold {
                low: self.low_threshold,
                high: self.high_threshold,
            });
        }
        Ok(())
    }

    pub fn stack_layout(&self) -> StackLayout {
        StackLayout {
            file_prefix: self.input_file_prefix.clone(),
            number_padding: self.image_number_padding,
            ..StackLayout::new(
                self.input_directory.clone(),
                self.slices_per_stack,
                self.number_of_timesteps,
            )
        }
    }
}
