// Screen module - capture of the emulator window and synthetic mouse input.
// The traits keep the perception core independent of the platform backends
// so the control loop can be driven by in-memory screens in tests.

pub mod desktop;
pub mod types;

pub use desktop::{DesktopPointer, DesktopScreen};
pub use types::{CaptureRegion, Pointer, ScreenCapture, ScreenSource};
