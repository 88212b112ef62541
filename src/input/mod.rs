//! §4.6 Input Synthesis: mouse and keyboard command producers. Consumes
//! generated paths/timings and issues CDP commands; never itself reads
//! responses beyond the command's own result.

pub mod keyboard;
pub mod mouse;

pub use keyboard::Keyboard;
pub use mouse::Mouse;
