/// Green "next chest" arrow detection
///
/// The arrow has no fixed artwork (it bobs and scales), so instead of a
/// template it is found by color: a green mask, its outer contours, and the
/// largest one that simplifies to a five-sided polygon.
use image::{GrayImage, Luma, RgbaImage};
use imageproc::contours::{BorderType, find_contours};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;

/// HSV bounds of the arrow green, hue on the 0..180 scale
const GREEN_LOW: [u8; 3] = [40, 40, 40];
const GREEN_HIGH: [u8; 3] = [70, 255, 255];
const ARROW_VERTICES: usize = 5;
const APPROX_EPSILON: f64 = 0.02;

/// Convert one pixel to HSV with hue halved to fit a byte (0..180).
pub fn hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max > 0.0 { delta * 255.0 / max } else { 0.0 };
    let mut h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if h < 0.0 {
        h += 360.0;
    }

    [(h / 2.0).round() as u8, s.round() as u8, max as u8]
}

pub fn green_mask(image: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let p = image.get_pixel(x, y);
        let px = hsv(p[0], p[1], p[2]);
        let inside = (0..3).all(|i| px[i] >= GREEN_LOW[i] && px[i] <= GREEN_HIGH[i]);
        Luma([if inside { 255 } else { 0 }])
    })
}

/// Center of the arrow's bounding box, in image coordinates
pub fn find_arrow(image: &RgbaImage) -> Option<(u32, u32)> {
    let mask = green_mask(image);

    let arrow = find_contours::<i32>(&mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter(|c| {
            let epsilon = APPROX_EPSILON * arc_length(&c.points, true);
            approximate_polygon_dp(&c.points, epsilon, true).len() == ARROW_VERTICES
        })
        .max_by(|a, b| polygon_area(&a.points).total_cmp(&polygon_area(&b.points)))?;

    let (min_x, max_x) = min_max(arrow.points.iter().map(|p| p.x))?;
    let (min_y, max_y) = min_max(arrow.points.iter().map(|p| p.y))?;
    let w = max_x - min_x + 1;
    let h = max_y - min_y + 1;
    log::debug!("🟢 Arrow contour {}x{} at ({min_x},{min_y})", w, h);

    Some(((min_x + w / 2) as u32, (min_y + h / 2) as u32))
}

/// Shoelace area of a closed polygon
fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    twice.abs() as f64 / 2.0
}

fn min_max(values: impl Iterator<Item = i32>) -> Option<(i32, i32)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}
