//! # DICOM-PCV library
//!
//! This crate extracts phase-contrast velocimetry (PCV) vector fields from
//! stacks of DICOM images and writes them as plain-text point data.
//!
//! It builds on the dicom-rs ecosystem for reading and decoding images and
//! represents every stack as a [`Volume`](volume::Volume). A run
//!
//!  - thresholds a reference image (e.g. a magnitude series) into a 0/1 mask
//!    and writes the coordinates of the masked voxels to `{name}.geom`,
//!  - reads the `u`, `v` and `w` stacks of every timestep, optionally flips,
//!    rotates, translates and scales them, multiplies them by the mask,
//!  - writes the velocity triple of every masked voxel to `{name}{t}.pcv`.
//!
//! Both output files list points in the same order, so line `n` of a `.pcv`
//! file belongs to line `n` of the `.geom` file.
//!
//! Scanner exports are expected in the following layout, with images
//! numbered consecutively over all stacks (all `u` stacks first, then `v`,
//! then `w`):
//!
//! ```text
//! {input}/1/u/image00001.dcm ... image00036.dcm
//! {input}/2/u/image00037.dcm ...
//! {input}/1/v/image{1 + N * 36}.dcm ...
//! ```
//!
//! Volumes are processed in parallel using rayon where the work allows it.
//!
//! # Examples
//!
//! ## Extracting 20 timesteps
//!
//! ```no_run
//! # use dicom_pcv::{config::PcvConfig, pipeline::PcvPipeline};
//! let config = PcvConfig {
//!     input_directory: "scan".into(),
//!     reference_directory: "scan/magnitude".into(),
//!     output_file_name: "out/flow".into(),
//!     number_of_timesteps: 20,
//!     ..Default::default()
//! };
//! let summary = PcvPipeline::from_config(&config)
//!     .and_then(|pipeline| pipeline.run())
//!     .expect("should have written the PCV files");
//! println!("{} points", summary.number_data_points);
//! ```

pub mod config;
pub mod enums;
pub mod field;
pub mod filters;
mod interpolator;
pub mod layout;
pub mod mask;
pub mod pipeline;
pub mod transform;
pub mod volume;
pub mod volume_loader;
pub mod writer;
