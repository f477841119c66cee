use crate::error::Result;
use crate::utils::constants::{
    CENSUS_2024_FILE, CENSUS_ENRICHED_FILE, CORRESPONDENCE_FILE, FINAL_FILE,
    POLLUTANTS_CLEANED_FILE, POLLUTANTS_FILE, POLLUTION_POPULATION_FILE, POPULATION_BASE_FILE,
    POPULATION_FILE,
};
use std::path::{Path, PathBuf};

/// Explicit pipeline configuration: every input and checkpoint path derives
/// from two directories handed in by the caller, so tests can run the whole
/// pipeline against temporary locations.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl PipelineConfig {
    pub fn new(data_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Source files write their outputs next to themselves by default, the
    /// way the datasets are laid out in the project's data directory.
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            output_dir: data_dir.clone(),
            data_dir,
        }
    }

    pub fn ensure_output_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    // Inputs

    pub fn correspondence_path(&self) -> PathBuf {
        self.data_dir.join(CORRESPONDENCE_FILE)
    }

    pub fn population_path(&self) -> PathBuf {
        self.data_dir.join(POPULATION_FILE)
    }

    pub fn census_path(&self) -> PathBuf {
        self.data_dir.join(CENSUS_2024_FILE)
    }

    pub fn pollutants_path(&self) -> PathBuf {
        self.data_dir.join(POLLUTANTS_FILE)
    }

    // Checkpoints and final output

    pub fn population_base_path(&self) -> PathBuf {
        self.output_dir.join(POPULATION_BASE_FILE)
    }

    pub fn pollutants_cleaned_path(&self) -> PathBuf {
        self.output_dir.join(POLLUTANTS_CLEANED_FILE)
    }

    pub fn pollution_population_path(&self) -> PathBuf {
        self.output_dir.join(POLLUTION_POPULATION_FILE)
    }

    pub fn census_enriched_path(&self) -> PathBuf {
        self.output_dir.join(CENSUS_ENRICHED_FILE)
    }

    pub fn final_path(&self) -> PathBuf {
        self.output_dir.join(FINAL_FILE)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::in_dir(Path::new("données"))
    }
}
