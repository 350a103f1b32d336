//! ---
//! gait_section: "01-core-functionality"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Frame pacing jitter measurements."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct JitterHistogram {
    samples: Vec<f64>,
}

impl JitterHistogram {
    pub fn record(&mut self, jitter: Duration) {
        self.samples.push(jitter.as_secs_f64() * 1_000_000.0);
    }

    pub fn summary(&self) -> Option<JitterSummary> {
        let slice = self.samples.as_slice();
        if slice.is_empty() {
            return None;
        }
        let count = slice.len() as f64;
        let mean = slice.iter().sum::<f64>() / count;
        let variance = if slice.len() > 1 {
            let sum_sq = slice
                .iter()
                .map(|value| {
                    let delta = value - mean;
                    delta * delta
                })
                .sum::<f64>();
            sum_sq / (count - 1.0)
        } else {
            0.0
        };
        let max = slice.iter().copied().fold(f64::MIN, f64::max);
        let min = slice.iter().copied().fold(f64::MAX, f64::min);
        Some(JitterSummary {
            mean_us: mean,
            std_dev_us: variance.sqrt(),
            max_us: max,
            min_us: min,
            samples: slice.len() as u64,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JitterSummary {
    pub mean_us: f64,
    pub std_dev_us: f64,
    pub max_us: f64,
    pub min_us: f64,
    pub samples: u64,
}

impl JitterSummary {
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        let json = serde_json::to_vec_pretty(self).map_err(std::io::Error::other)?;
        file.write_all(&json)
    }
}

/// Measures frame-to-frame intervals against the interval the loop asked for.
///
/// The expected interval is passed per tick because timestamped playback
/// changes it every frame.
#[derive(Debug, Default)]
pub struct LoopTimingReporter {
    last_tick: Option<Instant>,
    histogram: JitterHistogram,
}

impl LoopTimingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tick(&mut self, expected: Duration) {
        self.record_tick_at(Instant::now(), expected);
    }

    pub fn record_tick_at(&mut self, now: Instant, expected: Duration) {
        if let Some(previous) = self.last_tick {
            let actual = now.duration_since(previous);
            let jitter = if actual > expected {
                actual - expected
            } else {
                expected - actual
            };
            self.histogram.record(jitter);
        }
        self.last_tick = Some(now);
    }

    pub fn histogram(&self) -> &JitterHistogram {
        &self.histogram
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_only_sets_reference() {
        let mut reporter = LoopTimingReporter::new();
        reporter.record_tick_at(Instant::now(), Duration::from_millis(10));
        assert!(reporter.histogram().summary().is_none());
    }

    #[test]
    fn jitter_is_absolute_deviation() {
        let mut reporter = LoopTimingReporter::new();
        let start = Instant::now();
        let expected = Duration::from_millis(10);
        reporter.record_tick_at(start, expected);
        reporter.record_tick_at(start + Duration::from_millis(12), expected);
        reporter.record_tick_at(start + Duration::from_millis(20), expected);
        let summary = reporter.histogram().summary().expect("two samples");
        assert_eq!(summary.samples, 2);
        assert!((summary.max_us - 2000.0).abs() < 1e-6);
        assert!((summary.min_us - 2000.0).abs() < 1e-6);
        assert!(summary.std_dev_us.abs() < 1e-6);
    }

    #[test]
    fn summary_writes_as_json() {
        let mut histogram = JitterHistogram::default();
        histogram.record(Duration::from_micros(250));
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("jitter.json");
        histogram
            .summary()
            .expect("one sample")
            .write_json(&path)
            .expect("write");
        let written: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).expect("read")).expect("json");
        assert_eq!(written["samples"], 1);
        assert!((written["mean_us"].as_f64().expect("mean") - 250.0).abs() < 1e-6);
    }
}
