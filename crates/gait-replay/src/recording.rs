//! ---
//! gait_section: "05-replay"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "In-memory recording and format dispatch."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
use std::path::Path;

use gait_common::InputConfig;
use gait_kinematics::TimestepRecord;

use crate::error::SourceError;
use crate::{tabular, trial_store};

/// Which group of a trial store to load. `None` picks the first one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrialSelector {
    pub day: Option<String>,
    pub trial: Option<String>,
}

/// A fully loaded source: records plus optional per-record timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    name: String,
    records: Vec<TimestepRecord>,
    timestamps: Option<Vec<f64>>,
}

impl Recording {
    pub fn new(name: impl Into<String>, records: Vec<TimestepRecord>) -> Self {
        Self {
            name: name.into(),
            records,
            timestamps: None,
        }
    }

    /// Attach timestamps (seconds). Lengths must match the records.
    pub fn with_timestamps(mut self, timestamps: Vec<f64>) -> Result<Self, SourceError> {
        if timestamps.len() != self.records.len() {
            return Err(SourceError::ShapeMismatch {
                group: self.name.clone(),
                field: "Time",
                expected: self.records.len(),
                actual: timestamps.len(),
            });
        }
        self.timestamps = Some(timestamps);
        Ok(self)
    }

    /// Load by extension: `.csv` is tabular (laid out per `input.columns`),
    /// `.json` is a trial store (quaternions decomposed per
    /// `input.euler_sequence`).
    pub fn from_path(
        path: &Path,
        input: &InputConfig,
        selector: &TrialSelector,
    ) -> Result<Self, SourceError> {
        let recording = match path.extension().and_then(|ext| ext.to_str()) {
            Some("csv") => tabular::load(path, &input.columns)?,
            Some("json") => {
                trial_store::TrialStore::open(path)?.load(selector, input.euler_sequence)?
            }
            _ => return Err(SourceError::UnsupportedFormat(path.to_path_buf())),
        };
        if recording.is_empty() {
            return Err(SourceError::Empty(recording.name));
        }
        Ok(recording)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TimestepRecord] {
        &self.records
    }

    pub fn timestamp(&self, index: usize) -> Option<f64> {
        self.timestamps
            .as_ref()
            .and_then(|times| times.get(index).copied())
    }

    pub fn has_timestamps(&self) -> bool {
        self.timestamps.is_some()
    }

    pub fn into_records(self) -> Vec<TimestepRecord> {
        self.records
    }
}
