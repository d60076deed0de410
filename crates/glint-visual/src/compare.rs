//! Pure pixel math: per-pixel deltas, antialiasing detection, and the
//! colors used to paint the diff visualization.

use glint_proto::ImageBuffer;

/// Maximum Euclidean distance between two RGBA pixels
/// (`sqrt(4 * 255^2)`), used to normalize deltas into [0, 1].
const MAX_RGBA_DISTANCE: f64 = 510.0;

/// Neighbor luminance delta below which a pair counts as near-identical
/// for the antialiasing heuristic.
pub const ANTIALIAS_NEIGHBOR_DELTA: f64 = 0.05;

/// Minimum near-identical neighbor pairs (out of 8) for a divergent pixel
/// to be classified as antialiasing noise.
const ANTIALIAS_MIN_SIMILAR: u32 = 6;

/// Marker painted over pixels inside an ignore region.
const IGNORED_COLOR: [u8; 4] = [120, 120, 120, 255];

/// Marker painted over pixels classified as antialiasing.
const ANTIALIAS_COLOR: [u8; 4] = [255, 220, 0, 255];

/// Perceptual luminance of an RGBA pixel, in [0, 255]. Alpha is ignored.
pub fn luminance(rgba: [u8; 4]) -> f64 {
    0.299 * f64::from(rgba[0]) + 0.587 * f64::from(rgba[1]) + 0.114 * f64::from(rgba[2])
}

/// Normalized luminance difference between two pixels, in [0, 1].
pub(crate) fn luminance_delta(a: [u8; 4], b: [u8; 4]) -> f64 {
    (luminance(a) - luminance(b)).abs() / 255.0
}

/// Normalized difference between two pixels, in [0, 1].
///
/// With `ignore_colors` set, only luminance is compared; otherwise the
/// delta is the Euclidean distance across all four channels.
pub fn pixel_delta(a: [u8; 4], b: [u8; 4], ignore_colors: bool) -> f64 {
    if ignore_colors {
        return luminance_delta(a, b);
    }
    let sum: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&ca, &cb)| {
            let d = f64::from(ca) - f64::from(cb);
            d * d
        })
        .sum();
    sum.sqrt() / MAX_RGBA_DISTANCE
}

/// Returns true if the divergent pixel at `(x, y)` looks like antialiasing
/// noise: at least 6 of its 8 neighbors are near-identical in luminance
/// between the two images. Border pixels have fewer neighbors and so can
/// never qualify at corners.
pub(crate) fn is_antialiased(baseline: &ImageBuffer, current: &ImageBuffer, x: u32, y: u32) -> bool {
    let mut similar = 0u32;
    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = i64::from(x) + dx;
            let ny = i64::from(y) + dy;
            if nx < 0 || ny < 0 || nx >= i64::from(baseline.width) || ny >= i64::from(baseline.height)
            {
                continue;
            }
            let (nx, ny) = (nx as u32, ny as u32);
            if luminance_delta(baseline.pixel(nx, ny), current.pixel(nx, ny))
                < ANTIALIAS_NEIGHBOR_DELTA
            {
                similar += 1;
            }
        }
    }
    similar >= ANTIALIAS_MIN_SIMILAR
}

/// Color for a matching pixel in the diff image: the baseline pixel dimmed
/// so mismatches stand out.
pub(crate) fn match_color(rgba: [u8; 4]) -> [u8; 4] {
    let dim = |c: u8| -> u8 { (f64::from(c) * 0.3) as u8 };
    [dim(rgba[0]), dim(rgba[1]), dim(rgba[2]), 255]
}

/// Color for an ignored pixel in the diff image.
pub(crate) fn ignored_color() -> [u8; 4] {
    IGNORED_COLOR
}

/// Color for an antialiased pixel in the diff image.
pub(crate) fn antialias_color() -> [u8; 4] {
    ANTIALIAS_COLOR
}

/// Color for a mismatching pixel: red, with intensity scaled by the delta.
pub(crate) fn mismatch_color(delta: f64) -> [u8; 4] {
    let intensity = (100.0 + 155.0 * delta.clamp(0.0, 1.0)) as u8;
    [intensity, 0, 0, 255]
}
