//! ---
//! gait_section: "06-render"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Drawing surfaces for the gait viewer."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---

pub mod headless;
pub mod surface;
pub mod terminal;

pub use headless::{QuitSignal, RecordingSurface, Segment2D};
pub use surface::RenderSurface;
pub use terminal::{is_quit_key, to_canvas, TerminalSurface};
