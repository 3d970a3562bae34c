use crate::{enums::SortBy, volume::Volume};

use dicom::{
    object::{FileDicomObject, InMemDicomObject, open_file},
    pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder, VoiLutOption},
};
use dicom_dictionary_std::tags;
use log::{debug, warn};
use ndarray::{Array2, Array3, s};
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

const DEFAULT_SPACING: f64 = 1.0;

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("No valid DICOM images found")]
    NoValidImages,

    #[error("Inconsistent image dimensions")]
    InconsistentDimensions,

    #[error("Archetype file {0} does not exist")]
    MissingArchetype(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),
}

struct Slice {
    order: f32,
    position: Option<[f64; 3]>,
    image: Array2<f32>,
}

/// File name of a numbered series member split around its number.
#[derive(Debug, PartialEq)]
struct SeriesPattern<'a> {
    prefix: &'a str,
    digits: usize,
    number: u64,
    suffix: &'a str,
}

impl<'a> SeriesPattern<'a> {
    /// Splits `image00037.dcm` into `image`, `00037` and `.dcm`, using the
    /// last run of digits in the name.
    fn parse(file_name: &'a str) -> Option<Self> {
        let end = file_name.rfind(|c: char| c.is_ascii_digit())? + 1;
        let start = file_name[..end]
            .char_indices()
            .rev()
            .find(|(_, c)| !c.is_ascii_digit())
            .map_or(0, |(i, c)| i + c.len_utf8());
        Some(Self {
            prefix: &file_name[..start],
            digits: end - start,
            number: file_name[start..end].parse().ok()?,
            suffix: &file_name[end..],
        })
    }

    /// Number of `file_name` if it belongs to the same series.
    fn number_of(&self, file_name: &str) -> Option<u64> {
        let middle = file_name
            .strip_prefix(self.prefix)?
            .strip_suffix(self.suffix)?;
        if middle.len() != self.digits || !middle.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        middle.parse().ok()
    }
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Load a volume from DICOM objects
    ///
    /// # Arguments
    ///
    /// * `dicom_objects` - Slice of DICOM file objects
    /// * `sort_by` - Method to sort the slices
    ///
    /// # Errors
    ///
    /// Returns error if no valid images found or dimensions are inconsistent
    pub fn load_from_dicom_objects(
        dicom_objects: &[FileDicomObject<InMemDicomObject>],
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let mut slices: Vec<_> = dicom_objects
            .iter()
            .filter_map(|dicom_object| Self::extract_slice(dicom_object, &sort_by))
            .collect();

        if slices.is_empty() {
            return Err(VolumeLoaderError::NoValidImages);
        }

        Self::sort_slices(&mut slices, sort_by);
        Self::validate_dimensions(&slices)?;

        let spacing = Self::get_spacing(dicom_objects, &slices);
        let origin = slices[0].position.unwrap_or_else(|| {
            warn!("No ImagePositionPatient found, using origin (0, 0, 0)");
            [0.0; 3]
        });
        let volume_array = Self::build_volume_array(&slices);
        debug!(
            "Loaded volume of {:?} voxels, spacing {:?}, origin {:?}",
            volume_array.dim(),
            spacing,
            origin
        );

        Ok(Volume::new(volume_array, spacing).with_origin(origin))
    }

    /// Load a volume from file paths
    pub fn load_from_file_paths(
        paths: &[impl AsRef<Path> + Sync],
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let objects: Result<Vec<_>, _> = paths
            .par_iter()
            .map(|path| {
                debug!("reading : {}", path.as_ref().display());
                open_file(path.as_ref())
            })
            .collect();

        Self::load_from_dicom_objects(&objects?, sort_by)
    }

    /// Load a volume from a directory containing .dcm files
    pub fn load_from_directory(
        path: impl AsRef<Path>,
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let mut paths: Vec<_> = fs::read_dir(path.as_ref())?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"))
            })
            .collect();

        if paths.is_empty() {
            return Err(VolumeLoaderError::NoValidImages);
        }
        paths.sort();

        Self::load_from_file_paths(&paths, sort_by)
    }

    /// Load the numbered series an archetype file belongs to.
    ///
    /// Siblings sharing the archetype's name pattern are read in number
    /// order, starting at the archetype and stopping after `max_slices`
    /// files.
    pub fn load_series_from_archetype(
        archetype: impl AsRef<Path>,
        max_slices: usize,
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let paths = Self::series_file_names(archetype.as_ref(), max_slices)?;
        Self::load_from_file_paths(&paths, sort_by)
    }

    /// Paths of the series starting at `archetype`, in number order.
    pub fn series_file_names(
        archetype: &Path,
        max_slices: usize,
    ) -> Result<Vec<PathBuf>, VolumeLoaderError> {
        if !archetype.is_file() {
            return Err(VolumeLoaderError::MissingArchetype(archetype.to_path_buf()));
        }

        let Some(pattern) = archetype
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(SeriesPattern::parse)
        else {
            return Ok(vec![archetype.to_path_buf()]);
        };

        let directory = archetype
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut numbered: Vec<(u64, PathBuf)> = fs::read_dir(directory)?
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name();
                let number = pattern.number_of(name.to_str()?)?;
                (number >= pattern.number).then(|| (number, entry.path()))
            })
            .collect();
        numbered.sort_by_key(|(number, _)| *number);
        numbered.truncate(max_slices);

        if numbered.len() < max_slices {
            warn!(
                "Expected {} slices starting at {}, found {}",
                max_slices,
                archetype.display(),
                numbered.len()
            );
        }

        Ok(numbered.into_iter().map(|(_, path)| path).collect())
    }

    fn extract_slice(
        dicom_object: &FileDicomObject<InMemDicomObject>,
        sort_by: &SortBy,
    ) -> Option<Slice> {
        let order = Self::get_sort_order(dicom_object, sort_by)?;
        let image = Self::decode_image(dicom_object)?;
        Some(Slice {
            order,
            position: Self::get_position(dicom_object),
            image,
        })
    }

    fn get_sort_order(
        dicom_object: &FileDicomObject<InMemDicomObject>,
        sort_by: &SortBy,
    ) -> Option<f32> {
        match sort_by {
            SortBy::ImagePositionPatient => {
                let pos = dicom_object
                    .element(tags::IMAGE_POSITION_PATIENT)
                    .ok()?
                    .to_multi_float32()
                    .ok()?;
                pos.get(2).copied()
            }
            SortBy::TablePosition => dicom_object
                .element(tags::TABLE_POSITION)
                .ok()?
                .to_float32()
                .ok(),
            SortBy::InstanceNumber => dicom_object
                .element(tags::INSTANCE_NUMBER)
                .ok()?
                .to_int::<i32>()
                .ok()
                .map(|n| n as f32),
            SortBy::None => Some(0.0),
        }
    }

    fn get_position(dicom_object: &FileDicomObject<InMemDicomObject>) -> Option<[f64; 3]> {
        let pos = dicom_object
            .element(tags::IMAGE_POSITION_PATIENT)
            .ok()?
            .to_multi_float64()
            .ok()?;
        match pos.as_slice() {
            [x, y, z, ..] => Some([*x, *y, *z]),
            _ => None,
        }
    }

    /// Decodes the first frame to real-world values (modality LUT applied,
    /// no windowing).
    fn decode_image(dicom_object: &FileDicomObject<InMemDicomObject>) -> Option<Array2<f32>> {
        let pixel_data = match dicom_object.decode_pixel_data() {
            Ok(pixel_data) => pixel_data,
            Err(e) => {
                warn!("Skipping image without decodable pixel data: {e}");
                return None;
            }
        };
        let options = ConvertOptions::new()
            .with_modality_lut(ModalityLutOption::Default)
            .with_voi_lut(VoiLutOption::Identity);
        pixel_data
            .to_ndarray_with_options::<f32>(&options)
            .ok()
            .map(|arr| arr.slice_move(s![0, .., .., 0]))
    }

    fn sort_slices(slices: &mut [Slice], sort_by: SortBy) {
        if !matches!(sort_by, SortBy::None) {
            slices.sort_by(|a, b| a.order.total_cmp(&b.order));
        }
    }

    fn validate_dimensions(slices: &[Slice]) -> Result<(), VolumeLoaderError> {
        let first_dim = slices[0].image.dim();
        if slices.iter().any(|slice| slice.image.dim() != first_dim) {
            return Err(VolumeLoaderError::InconsistentDimensions);
        }
        Ok(())
    }

    fn build_volume_array(slices: &[Slice]) -> Array3<f32> {
        let (height, width) = slices[0].image.dim();
        let depth = slices.len();
        let mut volume = Array3::<f32>::zeros((depth, height, width));

        for (i, slice) in slices.iter().enumerate() {
            volume.slice_mut(s![i, .., ..]).assign(&slice.image);
        }

        volume
    }

    /// Voxel spacing `(x, y, z)`. Missing values fall back to 1 mm.
    fn get_spacing(
        dicom_objects: &[FileDicomObject<InMemDicomObject>],
        slices: &[Slice],
    ) -> [f64; 3] {
        // PixelSpacing is (row spacing, column spacing), i.e. (y, x).
        let in_plane = dicom_objects.iter().find_map(|dicom_object| {
            let pixel_spacing = dicom_object
                .element(tags::PIXEL_SPACING)
                .ok()?
                .to_multi_float64()
                .ok()?;
            match pixel_spacing.as_slice() {
                [row, column, ..] => Some((*column, *row)),
                _ => None,
            }
        });
        let (x, y) = in_plane.unwrap_or_else(|| {
            warn!("No PixelSpacing found, using default spacing");
            (DEFAULT_SPACING, DEFAULT_SPACING)
        });

        let between_slices = dicom_objects.iter().find_map(|dicom_object| {
            dicom_object
                .element(tags::SPACING_BETWEEN_SLICES)
                .ok()?
                .to_float64()
                .ok()
        });
        let from_positions = match slices {
            [first, second, ..] => first.position.zip(second.position).map(|(a, b)| {
                a.iter()
                    .zip(b.iter())
                    .map(|(a, b)| (b - a) * (b - a))
                    .sum::<f64>()
                    .sqrt()
            }),
            _ => None,
        };
        let thickness = || {
            dicom_objects.iter().find_map(|dicom_object| {
                dicom_object
                    .element(tags::SLICE_THICKNESS)
                    .ok()?
                    .to_float64()
                    .ok()
            })
        };
        let z = between_slices
            .or(from_positions)
            .filter(|z| *z > 0.0)
            .or_else(thickness)
            .unwrap_or(DEFAULT_SPACING);

        [x, y, z]
    }
}
