// Core capture/input types and traits
use crate::error::BotResult;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Rectangle of the display occupied by the emulator window.
///
/// Fixed for the process lifetime. Match coordinates are relative to this
/// rectangle; [`CaptureRegion::to_screen`] converts them back for clicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRegion {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Rectangle anchored at an offset from a point, clamped at zero.
    pub fn offset_from(x: u32, y: u32, dx: i64, dy: i64, width: u32, height: u32) -> Self {
        let left = (x as i64 + dx).max(0) as u32;
        let top = (y as i64 + dy).max(0) as u32;
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Translate region-relative coordinates to absolute screen coordinates.
    pub fn to_screen(&self, x: u32, y: u32) -> (i32, i32) {
        ((self.left + x) as i32, (self.top + y) as i32)
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Check this region lies inside a `screen_width` x `screen_height` display.
    pub fn fits_within(&self, screen_width: u32, screen_height: u32) -> bool {
        self.left.saturating_add(self.width) <= screen_width
            && self.top.saturating_add(self.height) <= screen_height
    }
}

impl Default for CaptureRegion {
    fn default() -> Self {
        Self::new(0, 0, 500, 915)
    }
}

/// A captured frame with timing information for logging.
#[derive(Debug, Clone)]
pub struct ScreenCapture {
    pub image: RgbaImage,
    pub duration_ms: u128,
}

// Anything that can produce pixels for a region of the display.
pub trait ScreenSource {
    /// Grab exactly `region`. Failure here is fatal to the caller.
    fn capture(&self, region: &CaptureRegion) -> BotResult<RgbaImage>;

    fn capture_timed(&self, region: &CaptureRegion) -> BotResult<ScreenCapture> {
        let start = std::time::Instant::now();
        let image = self.capture(region)?;
        Ok(ScreenCapture {
            image,
            duration_ms: start.elapsed().as_millis(),
        })
    }
}

// Synthetic input in absolute screen coordinates.
pub trait Pointer {
    fn move_to(&mut self, x: i32, y: i32) -> BotResult<()>;
    fn left_click(&mut self) -> BotResult<()>;
    fn press_escape(&mut self) -> BotResult<()>;

    fn click_at(&mut self, x: i32, y: i32) -> BotResult<()> {
        self.move_to(x, y)?;
        self.left_click()
    }
}
