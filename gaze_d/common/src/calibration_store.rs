use anyhow::{Context, Result};
use api::CalibrationSample;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

const CALIBRATION_FILENAME: &str = "calibration.json";

/// On-disk shape of a calibration set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationData {
    pub samples: Vec<CalibrationSample>,
}

/// Accepted file shapes: the wrapped form this store writes, or a bare sample list.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCalibration {
    Wrapped(CalibrationData),
    Bare(Vec<CalibrationSample>),
}

impl From<StoredCalibration> for Vec<CalibrationSample> {
    fn from(stored: StoredCalibration) -> Self {
        match stored {
            StoredCalibration::Wrapped(data) => data.samples,
            StoredCalibration::Bare(samples) => samples,
        }
    }
}

pub struct CalibrationStore {
    storage_path: PathBuf,
}

impl CalibrationStore {
    pub fn new(storage_dir: PathBuf) -> Self {
        Self {
            storage_path: storage_dir.join(CALIBRATION_FILENAME),
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    fn sanitized_for_save(samples: &[CalibrationSample]) -> CalibrationData {
        let kept: Vec<CalibrationSample> =
            samples.iter().copied().filter(|s| s.is_finite()).collect();
        if kept.len() != samples.len() {
            warn!(
                "Skipping {} non-finite calibration samples on save",
                samples.len() - kept.len()
            );
        }
        CalibrationData { samples: kept }
    }

    pub fn save(&self, samples: &[CalibrationSample]) -> Result<()> {
        if let Some(parent) = self.storage_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create calibration dir: {:?}", parent))?;
            }
        }
        let file = File::create(&self.storage_path).context("Failed to create calibration file")?;
        let sanitized = Self::sanitized_for_save(samples);
        serde_json::to_writer_pretty(file, &sanitized)
            .context("Failed to serialize calibration data")?;
        info!(
            "Saved {} calibration samples to {:?}",
            sanitized.samples.len(),
            self.storage_path
        );
        Ok(())
    }

    /// `Ok(None)` when no calibration has been saved yet.
    pub fn load(&self) -> Result<Option<Vec<CalibrationSample>>> {
        if !self.storage_path.exists() {
            info!("No calibration file found at {:?}", self.storage_path);
            return Ok(None);
        }

        let file = File::open(&self.storage_path).context("Failed to open calibration file")?;
        let reader = BufReader::new(file);
        let stored: StoredCalibration =
            serde_json::from_reader(reader).context("Failed to deserialize calibration data")?;
        let samples = Vec::from(stored);

        info!(
            "Loaded {} calibration samples from {:?}",
            samples.len(),
            self.storage_path
        );
        Ok(Some(samples))
    }
}
