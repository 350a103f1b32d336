//! ---
//! gait_section: "05-replay"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Day/trial hierarchical dataset loader."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
//! Hierarchical recordings exported as JSON:
//! `{"Day_1": {"Trial_01": {"Time": [...], "Acc_Left_Thigh": [[x, y, z], ...]}}}`.
//! Top-level entries that are not objects of trials (metadata) are skipped.
use std::fs;
use std::path::Path;

use gait_kinematics::{EulerSequence, OrientationRecord, Segment, TimestepRecord, Vec3};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::SourceError;
use crate::recording::{Recording, TrialSelector};

/// Arrays of one trial. Unknown channels are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Trial {
    pub time: Vec<f64>,
    #[serde(rename = "Acc_Left_Shank")]
    pub acc_left_shank: Vec<[f64; 3]>,
    #[serde(rename = "Acc_Left_Thigh")]
    pub acc_left_thigh: Vec<[f64; 3]>,
    #[serde(rename = "Acc_Right_Shank")]
    pub acc_right_shank: Vec<[f64; 3]>,
    #[serde(rename = "Acc_Right_Thigh")]
    pub acc_right_thigh: Vec<[f64; 3]>,
    #[serde(rename = "Ang_Left_Knee")]
    pub ang_left_knee: Vec<Vec<f64>>,
    #[serde(rename = "Ang_Right_Knee")]
    pub ang_right_knee: Vec<Vec<f64>>,
    #[serde(rename = "Quat_Left_Thigh", default)]
    pub quat_left_thigh: Option<Vec<[f64; 4]>>,
    #[serde(rename = "Quat_Left_Shank", default)]
    pub quat_left_shank: Option<Vec<[f64; 4]>>,
    #[serde(rename = "Quat_Right_Thigh", default)]
    pub quat_right_thigh: Option<Vec<[f64; 4]>>,
    #[serde(rename = "Quat_Right_Shank", default)]
    pub quat_right_shank: Option<Vec<[f64; 4]>>,
}

impl Trial {
    /// Every array must share the leading length of `Time`.
    pub fn check_shape(&self, group: &str) -> Result<usize, SourceError> {
        let expected = self.time.len();
        let mut lengths = vec![
            ("Acc_Left_Shank", self.acc_left_shank.len()),
            ("Acc_Left_Thigh", self.acc_left_thigh.len()),
            ("Acc_Right_Shank", self.acc_right_shank.len()),
            ("Acc_Right_Thigh", self.acc_right_thigh.len()),
            ("Ang_Left_Knee", self.ang_left_knee.len()),
            ("Ang_Right_Knee", self.ang_right_knee.len()),
        ];
        let quaternions = [
            ("Quat_Left_Thigh", &self.quat_left_thigh),
            ("Quat_Left_Shank", &self.quat_left_shank),
            ("Quat_Right_Thigh", &self.quat_right_thigh),
            ("Quat_Right_Shank", &self.quat_right_shank),
        ];
        for (field, values) in quaternions {
            if let Some(values) = values {
                lengths.push((field, values.len()));
            }
        }
        for (field, actual) in lengths {
            if actual != expected {
                return Err(SourceError::ShapeMismatch {
                    group: group.to_string(),
                    field,
                    expected,
                    actual,
                });
            }
        }
        Ok(expected)
    }

    fn orientations(&self) -> Option<[&Vec<[f64; 4]>; 4]> {
        Some([
            self.quat_left_thigh.as_ref()?,
            self.quat_left_shank.as_ref()?,
            self.quat_right_thigh.as_ref()?,
            self.quat_right_shank.as_ref()?,
        ])
    }

    /// Orientation trials become Euler angle records, others carry the
    /// accelerometer vectors.
    pub fn to_records(&self, sequence: EulerSequence) -> Vec<TimestepRecord> {
        match self.orientations() {
            Some(quaternions) => (0..self.time.len())
                .map(|row| {
                    OrientationRecord::from_fn(|segment| quaternions[segment.index()][row])
                        .to_pitch_record(sequence)
                })
                .collect(),
            None => (0..self.time.len())
                .map(|row| {
                    TimestepRecord::from_fn(|segment| {
                        let [x, y, z] = match segment {
                            Segment::LeftThigh => self.acc_left_thigh[row],
                            Segment::LeftShank => self.acc_left_shank[row],
                            Segment::RightThigh => self.acc_right_thigh[row],
                            Segment::RightShank => self.acc_right_shank[row],
                        };
                        Vec3::new(x as f32, y as f32, z as f32)
                    })
                })
                .collect(),
        }
    }

    pub fn is_orientation(&self) -> bool {
        self.orientations().is_some()
    }
}

/// Parsed store, groups kept in document order.
#[derive(Debug, Clone)]
pub struct TrialStore {
    days: IndexMap<String, IndexMap<String, Value>>,
}

impl TrialStore {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let contents = fs::read_to_string(path).map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents).map_err(|source| SourceError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let root: IndexMap<String, Value> = serde_json::from_str(contents)?;
        let days = root
            .into_iter()
            .filter_map(|(name, value)| match value {
                Value::Object(trials) => {
                    let trials: IndexMap<String, Value> = trials
                        .into_iter()
                        .filter(|(_, trial)| trial.is_object())
                        .collect();
                    (!trials.is_empty()).then_some((name, trials))
                }
                _ => None,
            })
            .collect();
        Ok(Self { days })
    }

    pub fn days(&self) -> impl Iterator<Item = &str> {
        self.days.keys().map(String::as_str)
    }

    pub fn trials(&self, day: &str) -> Option<impl Iterator<Item = &str>> {
        self.days.get(day).map(|trials| trials.keys().map(String::as_str))
    }

    pub fn trial(&self, selector: &TrialSelector) -> Result<(String, Trial), SourceError> {
        let (day_name, trials) = match selector.day.as_deref() {
            Some(day) => self
                .days
                .get_key_value(day)
                .ok_or_else(|| SourceError::MissingGroup(day.to_string()))?,
            None => self
                .days
                .first()
                .ok_or_else(|| SourceError::MissingGroup("<first day>".into()))?,
        };
        let (trial_name, value) = match selector.trial.as_deref() {
            Some(trial) => trials
                .get_key_value(trial)
                .ok_or_else(|| SourceError::MissingGroup(format!("{day_name}/{trial}")))?,
            None => trials
                .first()
                .ok_or_else(|| SourceError::MissingGroup(format!("{day_name}/<first trial>")))?,
        };
        let group = format!("{day_name}/{trial_name}");
        let trial = Trial::deserialize(value).map_err(|source| SourceError::Json {
            path: group.clone().into(),
            source,
        })?;
        Ok((group, trial))
    }

    pub fn load(
        &self,
        selector: &TrialSelector,
        sequence: EulerSequence,
    ) -> Result<Recording, SourceError> {
        let (group, trial) = self.trial(selector)?;
        trial.check_shape(&group)?;
        let records = trial.to_records(sequence);
        Recording::new(group, records).with_timestamps(trial.time)
    }
}
