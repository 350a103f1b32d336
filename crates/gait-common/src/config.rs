//! ---
//! gait_section: "01-core-functionality"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Configuration model and loader shared by producer and viewer."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use tracing::debug;

use crate::logging::LogFormat;

fn default_canvas_width() -> u32 {
    640
}

fn default_canvas_height() -> u32 {
    480
}

fn default_segment_length() -> f64 {
    70.0
}

fn default_leg_to_center() -> f64 {
    10.0
}

fn default_playback_rate() -> u32 {
    30
}

fn default_stream_rate() -> u32 {
    500
}

fn default_recv_timeout() -> Duration {
    Duration::from_millis(1000)
}

fn default_topic() -> String {
    "LEG_DATA".to_owned()
}

fn default_queue_depth() -> usize {
    64
}

fn default_input_path() -> PathBuf {
    PathBuf::from("assets/leg_data.csv")
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

fn default_true() -> bool {
    true
}

/// Primary configuration object for the gait producer and viewer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GaitConfig {
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub skeleton: SkeletonConfig,
    #[serde(default)]
    pub reconstruction: ReconstructionConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata describing where a [`GaitConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedGaitConfig {
    pub config: GaitConfig,
    /// `None` when no candidate existed and defaults were used.
    pub source: Option<PathBuf>,
}

impl GaitConfig {
    pub const ENV_CONFIG_PATH: &'static str = "GAIT_CONFIG";
    pub const DEFAULT_PATH: &'static str = "configs/gait.toml";

    /// Load configuration from disk, respecting the `GAIT_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration together with the effective source path.
    ///
    /// The environment override wins and must exist. Otherwise the first
    /// existing candidate is used, and built-in defaults when none exists.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedGaitConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedGaitConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(&path)?;
                return Ok(LoadedGaitConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        debug!(
            inspected = %candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            "no configuration file found; using defaults"
        );
        Ok(LoadedGaitConfig {
            config: GaitConfig::default(),
            source: None,
        })
    }

    fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<GaitConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.canvas.validate()?;
        self.skeleton.validate()?;
        self.playback.validate()?;
        self.stream.validate()?;
        self.input.columns.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for GaitConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: GaitConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "default_canvas_width")]
    pub width: u32,
    #[serde(default = "default_canvas_height")]
    pub height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_canvas_width(),
            height: default_canvas_height(),
        }
    }
}

impl CanvasConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(anyhow!(
                "canvas must have a non-zero size (got {}x{})",
                self.width,
                self.height
            ));
        }
        Ok(())
    }
}

/// Leg geometry shared by both reconstruction strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkeletonConfig {
    #[serde(default = "default_segment_length")]
    pub segment_length: f64,
    /// Horizontal distance from the canvas centre to each thigh anchor.
    #[serde(default = "default_leg_to_center")]
    pub leg_to_center: f64,
    #[serde(default)]
    pub left_anchor: Option<[f64; 2]>,
    #[serde(default)]
    pub right_anchor: Option<[f64; 2]>,
}

impl Default for SkeletonConfig {
    fn default() -> Self {
        Self {
            segment_length: default_segment_length(),
            leg_to_center: default_leg_to_center(),
            left_anchor: None,
            right_anchor: None,
        }
    }
}

impl SkeletonConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.segment_length.is_finite() && self.segment_length > 0.0) {
            return Err(anyhow!(
                "skeleton.segment_length must be positive (got {})",
                self.segment_length
            ));
        }
        Ok(())
    }

    /// Thigh anchors `(left, right)`; unset anchors sit one segment above the
    /// canvas centre, `leg_to_center` either side of it.
    pub fn anchors(&self, canvas: &CanvasConfig) -> ([f64; 2], [f64; 2]) {
        let cx = f64::from(canvas.width) / 2.0;
        let y = f64::from(canvas.height) / 2.0 - self.segment_length;
        let left = self
            .left_anchor
            .unwrap_or([cx - self.leg_to_center, y]);
        let right = self
            .right_anchor
            .unwrap_or([cx + self.leg_to_center, y]);
        (left, right)
    }
}

/// Which reconstruction strategy interprets the record vectors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReconstructionMode {
    /// Vectors carry orientation; one component is the segment pitch.
    #[default]
    Angle,
    /// Vectors carry raw 2D position proxies.
    Position,
}

/// Frame in which the position-driven knee is reported.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum KneeFrame {
    /// Rotate the local knee back onto the thigh-to-shank axis.
    #[default]
    Rotated,
    /// Keep the unrotated local offset (compatibility behaviour).
    Local,
}

/// Axis order used when decomposing an orientation quaternion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EulerSequence {
    /// Rotations about the moving x, then y, then z axes.
    #[default]
    IntrinsicXyz,
    /// Rotations about the fixed x, then y, then z axes.
    ExtrinsicXyz,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// What the playback loop does with a frame that cannot be reconstructed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GeometryPolicy {
    #[default]
    Skip,
    Abort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconstructionConfig {
    #[serde(default)]
    pub mode: ReconstructionMode,
    #[serde(default)]
    pub knee_frame: KneeFrame,
    #[serde(default = "ReconstructionConfig::default_thigh_axis")]
    pub thigh_pitch_axis: Axis,
    #[serde(default = "ReconstructionConfig::default_shank_axis")]
    pub shank_pitch_axis: Axis,
    #[serde(default)]
    pub on_geometry_error: GeometryPolicy,
}

impl ReconstructionConfig {
    const fn default_thigh_axis() -> Axis {
        Axis::X
    }

    const fn default_shank_axis() -> Axis {
        Axis::Z
    }
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            mode: ReconstructionMode::default(),
            knee_frame: KneeFrame::default(),
            thigh_pitch_axis: Self::default_thigh_axis(),
            shank_pitch_axis: Self::default_shank_axis(),
            on_geometry_error: GeometryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PacingMode {
    /// Sleep `1 / samples_per_second` between frames.
    #[default]
    Fixed,
    /// Sleep the delta between consecutive record timestamps.
    Timestamped,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReplayPolicy {
    /// End playback once the last record was drawn.
    #[default]
    Stop,
    /// Wrap back to the first record.
    Loop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_playback_rate")]
    pub samples_per_second: u32,
    #[serde(default)]
    pub pacing: PacingMode,
    #[serde(default)]
    pub replay: ReplayPolicy,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            samples_per_second: default_playback_rate(),
            pacing: PacingMode::default(),
            replay: ReplayPolicy::default(),
        }
    }
}

impl PlaybackConfig {
    pub fn validate(&self) -> Result<()> {
        if self.samples_per_second == 0 {
            return Err(anyhow!("playback.samples_per_second must be greater than zero"));
        }
        Ok(())
    }

    pub fn frame_interval(&self) -> Duration {
        interval_for(self.samples_per_second)
    }
}

/// How a record payload is wrapped inside a channel frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Framing {
    /// Payload bytes only.
    #[default]
    Raw,
    /// `<topic> <payload>`.
    Topic,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Producer publish rate.
    #[serde(default = "default_stream_rate")]
    pub samples_per_second: u32,
    #[serde(default = "default_recv_timeout", rename = "recv_timeout_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub recv_timeout: Duration,
    #[serde(default)]
    pub framing: Framing,
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Prefix a subscriber requires on every frame; empty accepts everything.
    #[serde(default)]
    pub subscribe_prefix: String,
    /// Frames buffered per subscriber before the oldest are dropped.
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            samples_per_second: default_stream_rate(),
            recv_timeout: default_recv_timeout(),
            framing: Framing::default(),
            topic: default_topic(),
            subscribe_prefix: String::new(),
            queue_depth: default_queue_depth(),
        }
    }
}

impl StreamConfig {
    pub fn validate(&self) -> Result<()> {
        if self.samples_per_second == 0 {
            return Err(anyhow!("stream.samples_per_second must be greater than zero"));
        }
        if self.recv_timeout.is_zero() {
            return Err(anyhow!("stream.recv_timeout_ms must be greater than zero"));
        }
        if self.queue_depth == 0 {
            return Err(anyhow!("stream.queue_depth must be greater than zero"));
        }
        if self.framing == Framing::Topic
            && (self.topic.is_empty() || self.topic.contains(' '))
        {
            return Err(anyhow!(
                "stream.topic must be a non-empty word when framing = \"topic\""
            ));
        }
        Ok(())
    }

    pub fn publish_interval(&self) -> Duration {
        interval_for(self.samples_per_second)
    }
}

/// Column contract of the tabular (CSV) input. Each field is the first
/// column of an `x, y, z` triple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnLayout {
    #[serde(default = "ColumnLayout::default_right_shank")]
    pub right_shank: usize,
    #[serde(default = "ColumnLayout::default_right_thigh")]
    pub right_thigh: usize,
    #[serde(default = "ColumnLayout::default_left_shank")]
    pub left_shank: usize,
    #[serde(default = "ColumnLayout::default_left_thigh")]
    pub left_thigh: usize,
    /// Optional column holding the sample time in seconds.
    #[serde(default)]
    pub time: Option<usize>,
}

impl ColumnLayout {
    const fn default_right_shank() -> usize {
        0
    }

    const fn default_right_thigh() -> usize {
        6
    }

    const fn default_left_shank() -> usize {
        12
    }

    const fn default_left_thigh() -> usize {
        18
    }

    /// Minimum number of columns a row must carry.
    pub fn min_width(&self) -> usize {
        let triples = [
            self.right_shank,
            self.right_thigh,
            self.left_shank,
            self.left_thigh,
        ]
        .into_iter()
        .map(|start| start + 3)
        .max()
        .unwrap_or(0);
        match self.time {
            Some(time) => triples.max(time + 1),
            None => triples,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut ranges = vec![
            ("right_shank", self.right_shank, self.right_shank + 3),
            ("right_thigh", self.right_thigh, self.right_thigh + 3),
            ("left_shank", self.left_shank, self.left_shank + 3),
            ("left_thigh", self.left_thigh, self.left_thigh + 3),
        ];
        if let Some(time) = self.time {
            ranges.push(("time", time, time + 1));
        }
        for (i, (name_a, start_a, end_a)) in ranges.iter().enumerate() {
            for (name_b, start_b, end_b) in ranges.iter().skip(i + 1) {
                if start_a < end_b && start_b < end_a {
                    return Err(anyhow!(
                        "input.columns.{} overlaps input.columns.{}",
                        name_a,
                        name_b
                    ));
                }
            }
        }
        Ok(())
    }
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            right_shank: Self::default_right_shank(),
            right_thigh: Self::default_right_thigh(),
            left_shank: Self::default_left_shank(),
            left_thigh: Self::default_left_thigh(),
            time: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_input_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub columns: ColumnLayout,
    /// How quaternion trials are turned into segment angles.
    #[serde(default)]
    pub euler_sequence: EulerSequence,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
            columns: ColumnLayout::default(),
            euler_sequence: EulerSequence::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
    /// Mirror events to stdout in addition to the rolling file.
    #[serde(default = "default_true")]
    pub stdout: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
            stdout: true,
        }
    }
}

fn interval_for(samples_per_second: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(samples_per_second.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_recorded_setup() {
        let config = GaitConfig::default();
        assert_eq!(config.canvas.width, 640);
        assert_eq!(config.canvas.height, 480);
        assert_eq!(config.skeleton.segment_length, 70.0);
        assert_eq!(config.stream.recv_timeout, Duration::from_millis(1000));
        assert_eq!(config.stream.framing, Framing::Raw);
        assert_eq!(config.playback.replay, ReplayPolicy::Stop);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_anchors_sit_one_segment_above_centre() {
        let config = GaitConfig::default();
        let (left, right) = config.skeleton.anchors(&config.canvas);
        assert_eq!(left, [310.0, 170.0]);
        assert_eq!(right, [330.0, 170.0]);
    }

    #[test]
    fn parses_partial_toml() {
        let config: GaitConfig = r#"
            [reconstruction]
            mode = "position"
            knee_frame = "local"

            [stream]
            framing = "topic"
            recv_timeout_ms = 250

            [input]
            euler_sequence = "extrinsic-xyz"

            [input.columns]
            time = 24
        "#
        .parse()
        .expect("valid config");
        assert_eq!(config.input.euler_sequence, EulerSequence::ExtrinsicXyz);
        assert_eq!(config.reconstruction.mode, ReconstructionMode::Position);
        assert_eq!(config.reconstruction.knee_frame, KneeFrame::Local);
        assert_eq!(config.stream.framing, Framing::Topic);
        assert_eq!(config.stream.recv_timeout, Duration::from_millis(250));
        assert_eq!(config.input.columns.time, Some(24));
        assert_eq!(config.input.columns.min_width(), 25);
    }

    #[test]
    fn rejects_overlapping_columns() {
        let err = "[input.columns]\nright_thigh = 1\n"
            .parse::<GaitConfig>()
            .unwrap_err();
        assert!(format!("{err:#}").contains("overlaps"));
    }

    #[test]
    fn rejects_non_positive_segment_length() {
        let err = "[skeleton]\nsegment_length = 0.0\n"
            .parse::<GaitConfig>()
            .unwrap_err();
        assert!(format!("{err:#}").contains("segment_length"));
    }

    #[test]
    fn load_falls_back_to_defaults_without_candidates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing.toml");
        let loaded = GaitConfig::load_with_source(&[missing]).expect("defaults");
        if std::env::var(GaitConfig::ENV_CONFIG_PATH).is_err() {
            assert!(loaded.source.is_none());
        }
    }

    #[test]
    fn load_reads_first_existing_candidate() {
        if std::env::var(GaitConfig::ENV_CONFIG_PATH).is_ok() {
            return;
        }
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gait.toml");
        std::fs::write(&path, "[playback]\nsamples_per_second = 60\n").expect("write");
        let loaded =
            GaitConfig::load_with_source(&[dir.path().join("nope.toml"), path.clone()])
                .expect("load");
        assert_eq!(loaded.source.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.config.playback.samples_per_second, 60);
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let config: GaitConfig = include_str!("../../../configs/gait.toml")
            .parse()
            .expect("shipped config");
        let defaults = GaitConfig::default();
        assert_eq!(config.playback.samples_per_second, defaults.playback.samples_per_second);
        assert_eq!(config.stream.topic, defaults.stream.topic);
        assert_eq!(config.input.columns, defaults.input.columns);
        assert_eq!(config.input.path, defaults.input.path);
        assert_eq!(config.input.euler_sequence, defaults.input.euler_sequence);
    }
}
