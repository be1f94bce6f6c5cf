//! Desktop backends: `xcap` for capture, `enigo` for input.

use super::types::{CaptureRegion, Pointer, ScreenSource};
use crate::error::{BotError, BotResult};
use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};
use image::RgbaImage;
use xcap::Monitor;

/// Captures from the first monitor reported by the OS.
///
/// Region coordinates are interpreted relative to that monitor's origin,
/// which is where the emulator window is pinned.
pub struct DesktopScreen {
    monitor_index: usize,
}

impl DesktopScreen {
    pub fn new() -> Self {
        Self { monitor_index: 0 }
    }

    fn monitor(&self) -> BotResult<Monitor> {
        let monitors = Monitor::all().map_err(|e| BotError::Capture {
            description: format!("Failed to enumerate monitors: {e}"),
        })?;
        let count = monitors.len();
        monitors
            .into_iter()
            .nth(self.monitor_index)
            .ok_or_else(|| BotError::Capture {
                description: format!(
                    "Monitor {} not found, only {} available",
                    self.monitor_index, count
                ),
            })
    }
}

impl Default for DesktopScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenSource for DesktopScreen {
    fn capture(&self, region: &CaptureRegion) -> BotResult<RgbaImage> {
        let full = self
            .monitor()?
            .capture_image()
            .map_err(|e| BotError::Capture {
                description: format!("Monitor capture failed: {e}"),
            })?;

        if !region.is_valid() || !region.fits_within(full.width(), full.height()) {
            return Err(BotError::RegionOutOfBounds {
                left: region.left,
                top: region.top,
                width: region.width,
                height: region.height,
                screen_width: full.width(),
                screen_height: full.height(),
            });
        }

        let cropped =
            image::imageops::crop_imm(&full, region.left, region.top, region.width, region.height);
        Ok(cropped.to_image())
    }
}

/// Mouse and keyboard through the OS input APIs.
pub struct DesktopPointer {
    enigo: Enigo,
}

impl DesktopPointer {
    pub fn new() -> BotResult<Self> {
        let enigo = Enigo::new(&Settings::default()).map_err(|e| BotError::Input {
            description: format!("Failed to open input connection: {e}"),
        })?;
        Ok(Self { enigo })
    }
}

impl Pointer for DesktopPointer {
    fn move_to(&mut self, x: i32, y: i32) -> BotResult<()> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| BotError::Input {
                description: format!("move to ({x}, {y}): {e}"),
            })
    }

    fn left_click(&mut self) -> BotResult<()> {
        self.enigo
            .button(Button::Left, Direction::Click)
            .map_err(|e| BotError::Input {
                description: format!("left click: {e}"),
            })
    }

    fn press_escape(&mut self) -> BotResult<()> {
        self.enigo
            .key(Key::Escape, Direction::Click)
            .map_err(|e| BotError::Input {
                description: format!("escape: {e}"),
            })
    }
}
