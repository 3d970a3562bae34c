use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

use crate::field::VelocityField;
use crate::mask::ReferenceMask;

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("No output file name given")]
    MissingOutputFileName,

    #[error("Field has {found} vectors but the mask has {expected} points")]
    FieldSizeMismatch { expected: usize, found: usize },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes the `.geom` and `.pcv` text files sharing one output name.
#[derive(Clone, Debug)]
pub struct PcvWriter {
    output_file_name: String,
}

impl PcvWriter {
    pub fn new(output_file_name: impl Into<String>) -> Result<Self, WriterError> {
        let output_file_name = output_file_name.into();
        if output_file_name.is_empty() {
            return Err(WriterError::MissingOutputFileName);
        }
        Ok(Self { output_file_name })
    }

    pub fn geometry_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.geom", self.output_file_name))
    }

    pub fn timestep_path(&self, timestep: usize) -> PathBuf {
        PathBuf::from(format!("{}{}.pcv", self.output_file_name, timestep))
    }

    /// Every file a run over `number_of_timesteps` produces.
    pub fn expected_files(&self, number_of_timesteps: usize) -> Vec<PathBuf> {
        std::iter::once(self.geometry_path())
            .chain((1..=number_of_timesteps).map(|t| self.timestep_path(t)))
            .collect()
    }

    /// Point count, then the coordinates of every masked point.
    pub fn write_geometry(&self, mask: &ReferenceMask) -> Result<PathBuf, WriterError> {
        let path = self.geometry_path();
        info!("Writing Geometry data to: {}", path.display());
        Self::write_rows(&path, mask.count(), mask.points())?;
        info!("done!");
        Ok(path)
    }

    /// Point count, then one velocity triple per masked point.
    pub fn write_timestep(
        &self,
        timestep: usize,
        mask: &ReferenceMask,
        field: &VelocityField,
    ) -> Result<PathBuf, WriterError> {
        if field.len() != mask.count() {
            return Err(WriterError::FieldSizeMismatch {
                expected: mask.count(),
                found: field.len(),
            });
        }
        let path = self.timestep_path(timestep);
        info!("Writing PCV data for time: {timestep}");
        Self::write_rows(&path, mask.count(), field.vectors().iter().copied())?;
        info!("done!");
        Ok(path)
    }

    fn write_rows<T: Copy + Into<f64>>(
        path: &Path,
        count: usize,
        rows: impl Iterator<Item = [T; 3]>,
    ) -> Result<(), WriterError> {
        let io_error = |source| WriterError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let mut out = BufWriter::new(File::create(path).map_err(io_error)?);
        writeln!(out, "{count}").map_err(io_error)?;
        for [a, b, c] in rows {
            let (a, b, c): (f64, f64, f64) = (a.into(), b.into(), c.into());
            writeln!(out, "{a:.6} {b:.6} {c:.6}").map_err(io_error)?;
        }
        out.flush().map_err(io_error)
    }
}
