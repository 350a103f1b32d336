//! ---
//! gait_section: "06-render"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Drawing surface contract."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
use anyhow::Result;
use gait_kinematics::Point2D;

/// Minimal immediate-mode canvas: clear, draw, present once per frame.
///
/// Coordinates are screen space (origin top-left, y down) on the configured
/// canvas. Implementations translate to their own coordinate system.
pub trait RenderSurface {
    fn clear(&mut self) -> Result<()>;

    fn draw_segment(&mut self, from: Point2D, to: Point2D) -> Result<()>;

    fn present(&mut self) -> Result<()>;

    /// Polled once per frame. Must not block.
    fn quit_requested(&mut self) -> Result<bool>;
}

impl<S: RenderSurface + ?Sized> RenderSurface for &mut S {
    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }

    fn draw_segment(&mut self, from: Point2D, to: Point2D) -> Result<()> {
        (**self).draw_segment(from, to)
    }

    fn present(&mut self) -> Result<()> {
        (**self).present()
    }

    fn quit_requested(&mut self) -> Result<bool> {
        (**self).quit_requested()
    }
}
