use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Velocity component of a PCV acquisition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Component {
    U,
    V,
    W,
}

impl Component {
    pub const ALL: [Component; 3] = [Component::U, Component::V, Component::W];

    /// Position of the component inside a velocity triple.
    pub fn index(self) -> usize {
        match self {
            Component::U => 0,
            Component::V => 1,
            Component::W => 2,
        }
    }

    /// Directory name used by the scanner export (`u`, `v` or `w`).
    pub fn name(self) -> &'static str {
        match self {
            Component::U => "u",
            Component::V => "v",
            Component::W => "w",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Volume axis in image coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Index of the axis in the `(z, y, x)` layout of [`crate::volume::Volume::data`].
    pub(crate) fn array_axis(self) -> ndarray::Axis {
        match self {
            Axis::X => ndarray::Axis(2),
            Axis::Y => ndarray::Axis(1),
            Axis::Z => ndarray::Axis(0),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    #[default]
    NearestNeighbor,
    Linear,
}

impl FromStr for Interpolation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" | "nearest_neighbor" => Ok(Interpolation::NearestNeighbor),
            "linear" | "trilinear" => Ok(Interpolation::Linear),
            other => Err(format!("unknown interpolation '{other}'")),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    ImagePositionPatient,
    TablePosition,
    InstanceNumber,
    None,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "position" | "image_position_patient" => Ok(SortBy::ImagePositionPatient),
            "table" | "table_position" => Ok(SortBy::TablePosition),
            "instance" | "instance_number" => Ok(SortBy::InstanceNumber),
            "none" => Ok(SortBy::None),
            other => Err(format!("unknown slice ordering '{other}'")),
        }
    }
}
