//! ---
//! gait_section: "06-render"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "In-memory surface for headless runs and tests."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use gait_kinematics::Point2D;

use crate::surface::RenderSurface;

pub type Segment2D = (Point2D, Point2D);

/// Cloneable quit flag, settable from a signal handler.
#[derive(Debug, Clone, Default)]
pub struct QuitSignal(Arc<AtomicBool>);

impl QuitSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Keeps every presented frame in memory.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pending: Vec<Segment2D>,
    frames: Vec<Vec<Segment2D>>,
    clears: u64,
    presented: usize,
    quit_after: Option<usize>,
    quit: QuitSignal,
    retain: Option<usize>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request quit once this many frames have been presented.
    pub fn quit_after(mut self, frames: usize) -> Self {
        self.quit_after = Some(frames);
        self
    }

    /// Keep only the most recent `frames` frames (long headless runs).
    pub fn retain_last(mut self, frames: usize) -> Self {
        self.retain = Some(frames.max(1));
        self
    }

    pub fn quit_signal(&self) -> QuitSignal {
        self.quit.clone()
    }

    pub fn frames(&self) -> &[Vec<Segment2D>] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&[Segment2D]> {
        self.frames.last().map(Vec::as_slice)
    }

    pub fn clears(&self) -> u64 {
        self.clears
    }

    /// Frames presented so far, including any no longer retained.
    pub fn presented(&self) -> usize {
        self.presented
    }
}

impl RenderSurface for RecordingSurface {
    fn clear(&mut self) -> Result<()> {
        self.pending.clear();
        self.clears += 1;
        Ok(())
    }

    fn draw_segment(&mut self, from: Point2D, to: Point2D) -> Result<()> {
        if !from.is_finite() || !to.is_finite() {
            bail!("refusing to draw non-finite segment {from} -> {to}");
        }
        self.pending.push((from, to));
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.frames.push(std::mem::take(&mut self.pending));
        self.presented += 1;
        if let Some(retain) = self.retain {
            let excess = self.frames.len().saturating_sub(retain);
            self.frames.drain(..excess);
        }
        Ok(())
    }

    fn quit_requested(&mut self) -> Result<bool> {
        let reached = self
            .quit_after
            .is_some_and(|limit| self.presented >= limit);
        Ok(reached || self.quit.is_requested())
    }
}
