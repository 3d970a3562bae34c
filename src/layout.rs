use std::path::{Path, PathBuf};

use crate::enums::Component;

pub const DEFAULT_NUMBER_PADDING: usize = 5;

/// Naming scheme of a scanner PCV export.
///
/// Images are numbered consecutively through all stacks, components first:
/// all `u` stacks of every timestep, then all `v` stacks, then all `w`
/// stacks. Each stack lives in `{timestep}/{component}/`.
#[derive(Clone, Debug, PartialEq)]
pub struct StackLayout {
    pub input_directory: PathBuf,
    pub file_prefix: String,
    pub slices_per_stack: usize,
    pub number_of_timesteps: usize,
    pub number_padding: usize,
}

impl StackLayout {
    pub fn new(
        input_directory: impl Into<PathBuf>,
        slices_per_stack: usize,
        number_of_timesteps: usize,
    ) -> Self {
        Self {
            input_directory: input_directory.into(),
            file_prefix: String::new(),
            slices_per_stack,
            number_of_timesteps,
            number_padding: DEFAULT_NUMBER_PADDING,
        }
    }

    /// Timesteps in acquisition order, starting at 1.
    pub fn timesteps(&self) -> impl Iterator<Item = usize> {
        1..=self.number_of_timesteps
    }

    /// Number of the first image of a stack. `timestep` is 1-based.
    pub fn file_number(&self, timestep: usize, component: Component) -> usize {
        1 + component.index() * self.number_of_timesteps * self.slices_per_stack
            + (timestep - 1) * self.slices_per_stack
    }

    /// Directory holding one component stack.
    pub fn stack_directory(&self, timestep: usize, component: Component) -> PathBuf {
        self.input_directory
            .join(timestep.to_string())
            .join(component.name())
    }

    /// Path of the first image of a stack, used as the series archetype.
    pub fn archetype_path(&self, timestep: usize, component: Component) -> PathBuf {
        let file_name = format!(
            "{prefix}image{number:0width$}.dcm",
            prefix = self.file_prefix,
            number = self.file_number(timestep, component),
            width = self.number_padding,
        );
        self.stack_directory(timestep, component).join(file_name)
    }

    pub fn input_directory(&self) -> &Path {
        &self.input_directory
    }
}
