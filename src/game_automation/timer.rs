// Reward countdown timers: crop, clean up, OCR, parse
use crate::config::TimerLayout;
use crate::error::{BotError, BotResult};
use crate::screen::CaptureRegion;
use crate::template_matching::Match;
use image::{GrayImage, ImageFormat, RgbaImage};
use imageproc::contrast::{ThresholdType, threshold};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate, erode};
use std::time::Duration;
use tokio::process::Command;

/// Duration substituted for a timer that was read but could not be parsed
/// (99h 99m 99s). Large enough to lose every "shortest timer" comparison.
pub const UNREADABLE_TIMER: Duration = Duration::from_secs(99 * 3600 + 99 * 60 + 99);

const TIMER_TEXT_LEN: usize = 8;

/// One parsed countdown and where it sits on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerReading {
    pub remaining: Duration,
    /// Left edge of the timer crop, used to tell which reward it belongs to
    pub left: u32,
}

/// OCR collaborator: turns a cleaned-up timer crop into text.
#[allow(async_fn_in_trait)]
pub trait DigitReader {
    async fn read_text(&self, image: &GrayImage) -> BotResult<String>;
}

/// Runs the `tesseract` binary on a scratch PNG.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    program: String,
}

impl TesseractCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl DigitReader for TesseractCli {
    async fn read_text(&self, image: &GrayImage) -> BotResult<String> {
        let scratch = tempfile::Builder::new()
            .prefix("timer-")
            .suffix(".png")
            .tempfile()?;
        image
            .save_with_format(scratch.path(), ImageFormat::Png)
            .map_err(|e| BotError::Process {
                program: self.program.clone(),
                description: format!("could not write OCR input: {e}"),
            })?;

        let output = Command::new(&self.program)
            .arg(scratch.path())
            .arg("stdout")
            .args(["--psm", "10", "--oem", "3"])
            .args(["-c", "tessedit_char_whitelist=0123456789:"])
            .output()
            .await
            .map_err(|e| BotError::Process {
                program: self.program.clone(),
                description: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(BotError::Process {
                program: self.program.clone(),
                description: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Grayscale, keep only near-white text, invert to dark-on-light, then an
/// open (erode + dilate) with a 3x3 square to drop speckles.
pub fn preprocess(crop: &RgbaImage, level: u8) -> GrayImage {
    let gray = image::imageops::grayscale(crop);
    let binary = threshold(&gray, level, ThresholdType::BinaryInverted);
    let opened = erode(&binary, Norm::LInf, 1);
    dilate(&opened, Norm::LInf, 1)
}

/// OCR one timer crop. Anything but exactly eight characters is unreadable.
pub async fn read_timer_text<R: DigitReader>(reader: &R, crop: &RgbaImage, level: u8) -> Option<String> {
    let cleaned = preprocess(crop, level);
    let text = match reader.read_text(&cleaned).await {
        Ok(text) => text,
        Err(e) => {
            log::warn!("⚠️ OCR failed: {e}");
            return None;
        }
    };

    let text = text.trim();
    if text.chars().count() != TIMER_TEXT_LEN {
        log::debug!("⏱️ Timer text '{text}' is not {TIMER_TEXT_LEN} characters, ignoring");
        return None;
    }
    Some(text.to_string())
}

/// Parse `HH:MM:SS`. Malformed text maps to [`UNREADABLE_TIMER`].
pub fn parse_timer(text: &str) -> Duration {
    let parts: Vec<&str> = text.split(':').collect();
    let parsed = match parts.as_slice() {
        [h, m, s] => h
            .parse::<u64>()
            .and_then(|h| Ok((h, m.parse::<u64>()?, s.parse::<u64>()?))),
        _ => {
            log::warn!("⚠️ Timer '{text}' is not HH:MM:SS, assuming ready soon");
            return UNREADABLE_TIMER;
        }
    };

    match parsed {
        Ok((h, m, s)) => Duration::from_secs(h * 3600 + m * 60 + s),
        Err(_) => {
            log::warn!("⚠️ Timer '{text}' did not parse, assuming ready soon");
            UNREADABLE_TIMER
        }
    }
}

/// Timer crops below each reward anchor, in capture-region coordinates
pub fn timer_regions(anchors: &[Match], layout: &TimerLayout) -> Vec<CaptureRegion> {
    anchors
        .iter()
        .map(|a| {
            CaptureRegion::offset_from(
                a.x,
                a.y,
                layout.offset_x,
                layout.offset_y,
                layout.width,
                layout.height,
            )
        })
        .collect()
}

pub fn crop_region(frame: &RgbaImage, region: &CaptureRegion) -> RgbaImage {
    image::imageops::crop_imm(frame, region.left, region.top, region.width, region.height).to_image()
}

pub fn shortest_timer(readings: &[TimerReading]) -> Option<TimerReading> {
    readings.iter().copied().min_by_key(|r| r.remaining)
}

/// `HH:MM:SS` rendering for status lines
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgba};
    use std::cell::RefCell;

    struct ScriptedReader {
        replies: RefCell<Vec<BotResult<String>>>,
    }

    impl ScriptedReader {
        fn new(replies: Vec<BotResult<String>>) -> Self {
            Self {
                replies: RefCell::new(replies),
            }
        }
    }

    impl DigitReader for ScriptedReader {
        async fn read_text(&self, _image: &GrayImage) -> BotResult<String> {
            self.replies.borrow_mut().remove(0)
        }
    }

    fn crop() -> RgbaImage {
        RgbaImage::from_pixel(124, 35, Rgba([20, 20, 20, 255]))
    }

    #[test]
    fn test_parse_timer() {
        assert_eq!(parse_timer("01:02:03"), Duration::from_secs(3723));
        assert_eq!(parse_timer("00:00:00"), Duration::ZERO);
        assert_eq!(parse_timer("12:3a:00"), UNREADABLE_TIMER);
        assert_eq!(parse_timer("12345678"), UNREADABLE_TIMER);
        assert_eq!(UNREADABLE_TIMER.as_secs(), 362_439);
    }

    #[tokio::test]
    async fn test_wrong_length_text_is_rejected() {
        let reader = ScriptedReader::new(vec![
            Ok("1:02:03\n".to_string()),
            Ok("001:02:03".to_string()),
            Ok("  01:02:03 \n".to_string()),
        ]);
        assert_eq!(read_timer_text(&reader, &crop(), 235).await, None);
        assert_eq!(read_timer_text(&reader, &crop(), 235).await, None);
        assert_eq!(
            read_timer_text(&reader, &crop(), 235).await.as_deref(),
            Some("01:02:03")
        );
    }

    #[tokio::test]
    async fn test_ocr_failure_is_unreadable() {
        let reader = ScriptedReader::new(vec![Err(BotError::Process {
            program: "tesseract".into(),
            description: "not installed".into(),
        })]);
        assert_eq!(read_timer_text(&reader, &crop(), 235).await, None);
    }

    #[test]
    fn test_preprocess_inverts_and_despeckles() {
        let mut image = crop();
        // White glyph block with a one-pixel hole; the hole gets filled
        for y in 10..30 {
            for x in 10..30 {
                image.put_pixel(x, y, Rgba([250, 250, 250, 255]));
            }
        }
        image.put_pixel(20, 20, Rgba([20, 20, 20, 255]));

        let cleaned = preprocess(&image, 235);
        assert_eq!(cleaned.get_pixel(15, 15), &Luma([0]));
        assert_eq!(cleaned.get_pixel(20, 20), &Luma([0]));
        assert_eq!(cleaned.get_pixel(100, 20), &Luma([255]));
    }

    #[test]
    fn test_timer_regions_offset_from_anchor() {
        let anchors = vec![Match::new("a", 104, 300, 0.95), Match::new("b", 249, 300, 0.95)];
        let regions = timer_regions(&anchors, &TimerLayout::default());
        assert_eq!(regions[0], CaptureRegion::new(44, 388, 124, 35));
        assert_eq!(regions[1].left, 189);
    }

    #[test]
    fn test_shortest_timer_keeps_its_position() {
        let readings = [
            TimerReading { remaining: Duration::from_secs(600), left: 44 },
            TimerReading { remaining: Duration::from_secs(60), left: 334 },
            TimerReading { remaining: UNREADABLE_TIMER, left: 189 },
        ];
        let shortest = shortest_timer(&readings).unwrap();
        assert_eq!(shortest.left, 334);
        assert!(shortest_timer(&[]).is_none());
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(Duration::from_secs(3723)), "1:02:03");
        assert_eq!(format_remaining(Duration::from_secs(59)), "0:00:59");
    }
}
