use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use dicom_pcv::{
    config::PcvConfig,
    enums::{Interpolation, SortBy},
    pipeline::PcvPipeline,
};
use log::info;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Extracts velocity vector data from a PCV image stack"
)]
struct Args {
    /// Load settings from YAML; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Root of the {timestep}/{u|v|w}/ stack directories
    #[arg(short = 'd', long)]
    input_directory: Option<PathBuf>,
    /// Directory of the reference DICOM series
    #[arg(short = 'r', long)]
    reference: Option<PathBuf>,
    /// Output file name
    #[arg(short = 'o', long = "ofile")]
    output_file_name: Option<String>,
    /// Input file prefix (e.g. foo_)
    #[arg(long)]
    prefix: Option<String>,
    /// Number of timesteps for which there is PCV data
    #[arg(long = "numbertimesteps")]
    number_of_timesteps: Option<usize>,
    /// Number of slices per stack
    #[arg(long = "slices")]
    slices_per_stack: Option<usize>,
    /// Time increment between PCV timesteps
    #[arg(long = "timeincrement")]
    time_increment: Option<f64>,
    /// Lower threshold value for the reference image
    #[arg(long = "lowthreshold", allow_negative_numbers = true)]
    low_threshold: Option<f64>,
    /// Upper threshold value for the reference image
    #[arg(long = "highthreshold", allow_negative_numbers = true)]
    high_threshold: Option<f64>,
    /// Rotations around the x, y and z axes in degrees
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
    rotation: Option<Vec<f64>>,
    /// Translation in the x, y and z directions
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
    translation: Option<Vec<f64>>,
    /// Scaling of the x, y and z directions
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
    scaling: Option<Vec<f64>>,
    /// Flip toggles (0 or 1) for the x, y and z axes
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], value_parser = clap::value_parser!(u8).range(0..=1))]
    flip: Option<Vec<u8>>,
    /// Sampling used when reslicing: nearest or linear
    #[arg(long)]
    interpolation: Option<Interpolation>,
    /// Slice ordering: position, table, instance or none
    #[arg(long)]
    sort_by: Option<SortBy>,
    /// Log unreadable stacks and continue with zero velocities
    #[arg(long, default_value_t = false)]
    keep_going: bool,
}

fn triple<T: Copy>(values: Vec<T>) -> [T; 3] {
    [values[0], values[1], values[2]]
}

impl Args {
    fn into_config(self) -> anyhow::Result<PcvConfig> {
        let mut config = match &self.config {
            Some(path) => PcvConfig::load(path)?,
            None => PcvConfig::default(),
        };

        if let Some(dir) = self.input_directory {
            config.input_directory = dir;
        }
        if let Some(dir) = self.reference {
            config.reference_directory = dir;
        }
        if let Some(name) = self.output_file_name {
            config.output_file_name = name;
        }
        if let Some(prefix) = self.prefix {
            config.input_file_prefix = prefix;
        }
        if let Some(n) = self.number_of_timesteps {
            config.number_of_timesteps = n;
        }
        if let Some(n) = self.slices_per_stack {
            config.slices_per_stack = n;
        }
        if let Some(dt) = self.time_increment {
            config.time_increment = dt;
        }
        if let Some(low) = self.low_threshold {
            config.low_threshold = low;
        }
        if let Some(high) = self.high_threshold {
            config.high_threshold = high;
        }
        if let Some(rotation) = self.rotation {
            config.transform.rotation = triple(rotation);
        }
        if let Some(translation) = self.translation {
            config.transform.translation = triple(translation);
        }
        if let Some(scaling) = self.scaling {
            config.transform.scaling = triple(scaling);
        }
        if let Some(flip) = self.flip {
            config.transform.flip = triple(flip).map(|f| f == 1);
        }
        if let Some(interpolation) = self.interpolation {
            config.interpolation = interpolation;
        }
        if let Some(sort_by) = self.sort_by {
            config.sort_by = sort_by;
        }
        config.keep_going |= self.keep_going;

        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Args::parse().into_config()?;

    let pipeline = PcvPipeline::from_config(&config).context("invalid PCV settings")?;
    let summary = pipeline.run().with_context(|| {
        format!(
            "extracting PCV data from {}",
            config.input_directory.display()
        )
    })?;

    info!(
        "Wrote {} and {} timestep files for {} data points",
        summary.geometry_file.display(),
        summary.timestep_files.len(),
        summary.number_data_points
    );
    Ok(())
}
