/// Template matching implementation
///
/// Zero-mean normalized cross-correlation computed from exact integer sums,
/// so identical pixel windows score exactly 1.0.
use super::types::{Match, Template};
use image::{GrayImage, RgbaImage};
use std::path::Path;

/// Default similarity threshold for folder-wide matching
pub const DEFAULT_THRESHOLD: f32 = 0.93;

/// A captured frame prepared for matching.
///
/// Holds the intensity image plus summed-area tables so every template
/// matched against the same capture shares one preprocessing pass.
#[derive(Debug, Clone)]
pub struct Haystack {
    image: GrayImage,
    sums: Vec<u64>,
    sums_sq: Vec<u64>,
}

impl Haystack {
    pub fn new(image: GrayImage) -> Self {
        let (w, h) = (image.width() as usize, image.height() as usize);
        let stride = w + 1;
        let mut sums = vec![0u64; stride * (h + 1)];
        let mut sums_sq = vec![0u64; stride * (h + 1)];
        let raw = image.as_raw();

        for y in 0..h {
            let mut row = 0u64;
            let mut row_sq = 0u64;
            for x in 0..w {
                let p = raw[y * w + x] as u64;
                row += p;
                row_sq += p * p;
                let idx = (y + 1) * stride + (x + 1);
                sums[idx] = sums[idx - stride] + row;
                sums_sq[idx] = sums_sq[idx - stride] + row_sq;
            }
        }

        Self {
            image,
            sums,
            sums_sq,
        }
    }

    pub fn from_rgba(image: &RgbaImage) -> Self {
        Self::new(image::imageops::grayscale(image))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Sum and sum of squares over the `w` x `h` window at (x, y)
    fn window_sums(&self, x: u32, y: u32, w: u32, h: u32) -> (u64, u64) {
        let stride = self.image.width() as usize + 1;
        let (x0, y0) = (x as usize, y as usize);
        let (x1, y1) = (x0 + w as usize, y0 + h as usize);
        let rect = |t: &[u64]| {
            t[y1 * stride + x1] + t[y0 * stride + x0] - t[y0 * stride + x1] - t[y1 * stride + x0]
        };
        (rect(&self.sums), rect(&self.sums_sq))
    }

    fn cross_sum(&self, template: &Template, x: u32, y: u32) -> u64 {
        let hw = self.image.width() as usize;
        let tw = template.width() as usize;
        let hay = self.image.as_raw();
        let tpl = template.pixels().as_raw();

        (0..template.height() as usize)
            .map(|row| {
                let start = (y as usize + row) * hw + x as usize;
                hay[start..start + tw]
                    .iter()
                    .zip(&tpl[row * tw..(row + 1) * tw])
                    .map(|(&a, &b)| a as u64 * b as u64)
                    .sum::<u64>()
            })
            .sum()
    }
}

/// Correlation coefficient of `template` against the window at (x, y).
///
/// Flat windows and flat templates have no variance to normalize by: two flat
/// patches of equal intensity score 1.0, any other pairing with a flat side
/// scores 0.0.
pub fn score_at(haystack: &Haystack, template: &Template, x: u32, y: u32) -> f64 {
    let n = (template.width() as u64 * template.height() as u64) as i128;
    let (t_sum, t_sq) = template.sums();
    let (w_sum, w_sq) = haystack.window_sums(x, y, template.width(), template.height());
    let (t_sum, t_sq, w_sum, w_sq) = (t_sum as i128, t_sq as i128, w_sum as i128, w_sq as i128);

    let var_t = n * t_sq - t_sum * t_sum;
    let var_w = n * w_sq - w_sum * w_sum;

    if var_t == 0 || var_w == 0 {
        return if var_t == 0 && var_w == 0 && t_sum == w_sum {
            1.0
        } else {
            0.0
        };
    }

    let cross = haystack.cross_sum(template, x, y) as i128;
    let num = n * cross - t_sum * w_sum;

    // Exact equality of num^2 and var_t*var_w means a perfect linear match
    if num > 0
        && let (Some(lhs), Some(rhs)) = (num.checked_mul(num), var_t.checked_mul(var_w))
        && lhs == rhs
    {
        return 1.0;
    }

    let score = num as f64 / ((var_t as f64).sqrt() * (var_w as f64).sqrt());
    score.clamp(-1.0, 1.0)
}

/// Find every position where `template` scores at least `threshold`.
///
/// Returns center points in haystack coordinates, in row-major scan order.
/// An empty list means "not on screen", never an error.
pub fn find_matches(haystack: &Haystack, template: &Template, threshold: f32) -> Vec<Match> {
    if template.is_empty()
        || template.width() > haystack.width()
        || template.height() > haystack.height()
    {
        log::debug!(
            "⚠️ Template '{}' {}x{} does not fit haystack {}x{}",
            template.name,
            template.width(),
            template.height(),
            haystack.width(),
            haystack.height()
        );
        return Vec::new();
    }

    let (cx, cy) = template.center_offset();
    let x_max = haystack.width() - template.width();
    let y_max = haystack.height() - template.height();
    let threshold = threshold as f64;
    let mut matches = Vec::new();

    for y in 0..=y_max {
        for x in 0..=x_max {
            let score = score_at(haystack, template, x, y);
            if score >= threshold {
                matches.push(Match::new(
                    template.name.clone(),
                    x + cx,
                    y + cy,
                    score as f32,
                ));
            }
        }
    }

    matches
}

/// Load a template from `path` and match it, degrading to "no match" on a
/// template that cannot be read.
pub fn match_template_file(haystack: &Haystack, path: impl AsRef<Path>, threshold: f32) -> Vec<Match> {
    match Template::load(path.as_ref()) {
        Ok(template) => find_matches(haystack, &template, threshold),
        Err(e) => {
            log::warn!("⚠️ {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn textured(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| Luma([((x * 37 + y * 91 + x * y * 7) % 251) as u8]))
    }

    fn crop(image: &GrayImage, x: u32, y: u32, w: u32, h: u32) -> GrayImage {
        image::imageops::crop_imm(image, x, y, w, h).to_image()
    }

    #[test]
    fn test_exact_crop_found_at_threshold_one() {
        let image = textured(80, 60);
        let template = Template::from_gray("crop", crop(&image, 23, 17, 12, 9));
        let haystack = Haystack::new(image);

        let matches = find_matches(&haystack, &template, 1.0);
        assert_eq!(matches.len(), 1);
        // 12x9 template: center offset (6, 4)
        assert_eq!((matches[0].x, matches[0].y), (23 + 6, 17 + 4));
        assert_eq!(matches[0].score, 1.0);
    }

    #[test]
    fn test_scores_are_bounded() {
        let image = textured(40, 40);
        let template = Template::from_gray("t", crop(&image, 5, 5, 8, 8));
        let haystack = Haystack::new(image);

        for y in 0..=32 {
            for x in 0..=32 {
                let s = score_at(&haystack, &template, x, y);
                assert!((-1.0..=1.0).contains(&s), "score {s} out of range");
            }
        }
    }

    #[test]
    fn test_inverted_patch_scores_minus_one() {
        let image = textured(30, 30);
        let inverted = GrayImage::from_fn(6, 6, |x, y| Luma([255 - image.get_pixel(x + 4, y + 4)[0]]));
        let template = Template::from_gray("inv", inverted);
        let haystack = Haystack::new(image);

        let s = score_at(&haystack, &template, 4, 4);
        assert!(s < -0.999, "expected perfect anti-correlation, got {s}");
    }

    #[test]
    fn test_threshold_monotonicity() {
        let image = textured(60, 50);
        let template = Template::from_gray("t", crop(&image, 10, 10, 7, 7));
        let haystack = Haystack::new(image);

        let loose = find_matches(&haystack, &template, 0.2);
        let strict = find_matches(&haystack, &template, 0.6);
        assert!(loose.len() >= strict.len());
        for m in &strict {
            assert!(loose.iter().any(|l| l.x == m.x && l.y == m.y));
        }
    }

    #[test]
    fn test_solid_haystack_scenario() {
        // Solid background with one 10x10 patch of a second color
        let mut image = GrayImage::from_pixel(60, 60, Luma([40]));
        for y in 20..30 {
            for x in 30..40 {
                image.put_pixel(x, y, Luma([200]));
            }
        }
        let present = Template::from_gray("present", GrayImage::from_pixel(10, 10, Luma([200])));
        let absent = Template::from_gray("absent", GrayImage::from_pixel(10, 10, Luma([120])));
        let haystack = Haystack::new(image);

        let found = find_matches(&haystack, &present, DEFAULT_THRESHOLD);
        assert_eq!(found.len(), 1);
        assert_eq!((found[0].x, found[0].y), (35, 25));
        assert!(find_matches(&haystack, &absent, DEFAULT_THRESHOLD).is_empty());
    }

    #[test]
    fn test_template_larger_than_haystack() {
        let haystack = Haystack::new(textured(10, 10));
        let template = Template::from_gray("big", textured(20, 5));
        assert!(find_matches(&haystack, &template, 0.5).is_empty());
    }

    #[test]
    fn test_unreadable_template_file_is_no_match() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.png");
        std::fs::write(&path, b"garbage").unwrap();
        let haystack = Haystack::new(textured(10, 10));
        assert!(match_template_file(&haystack, &path, 0.5).is_empty());
    }
}
