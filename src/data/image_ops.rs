use crate::algorithms::geometry::Point;
use ndarray::{s, Array2, ArrayView2, Axis};
use rayon::prelude::*;

/// Mirrors an image left to right without copying.
pub fn fliplr(image: ArrayView2<'_, f32>) -> ArrayView2<'_, f32> {
    let mut view = image;
    view.invert_axis(Axis(1));
    view
}

/// Keeps every `factor`-th row and column and rescales the samples to
/// `[0, max]`.
///
/// Scores of different hypotheses are only comparable when both images share
/// the same range. A constant image has no range and maps to zeros.
pub fn down_sample_normalize(image: ArrayView2<'_, f32>, factor: usize, max: f32) -> Array2<f32> {
    let step = factor.max(1) as isize;
    let sampled = image.slice(s![..;step, ..;step]);

    let (lo, hi) = sampled
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = hi - lo;

    if !range.is_finite() || range <= 0.0 {
        return Array2::zeros(sampled.raw_dim());
    }
    sampled.mapv(|v| (v - lo) / range * max)
}

/// Intensity-weighted centroid as `(x = column, y = row)`.
///
/// Images without positive total intensity fall back to the geometric centre.
pub fn get_mass(image: ArrayView2<'_, f32>) -> Point {
    let (h, w) = image.dim();

    let (sum_x, sum_y, total) = (0..h)
        .into_par_iter()
        .map(|row| {
            let mut sx = 0.0f64;
            let mut total = 0.0f64;
            for (col, &v) in image.row(row).iter().enumerate() {
                let weight = v as f64;
                sx += col as f64 * weight;
                total += weight;
            }
            (sx, row as f64 * total, total)
        })
        .reduce(|| (0.0, 0.0, 0.0), |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2));

    if total > 0.0 {
        Point::new(sum_x / total, sum_y / total)
    } else {
        Point::new(w as f64 / 2.0, h as f64 / 2.0)
    }
}
