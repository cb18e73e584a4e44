use crate::algorithms::geometry::Point;
use ndarray::{s, ArrayView1, ArrayView2};
use rayon::prelude::*;

/// Patches smaller than this are summed on the calling thread.
const PARALLEL_PIXEL_THRESHOLD: usize = 64 * 64;

/// Sum of the element-wise product of two equally shaped patches.
///
/// Rows are reduced in parallel, so the summation order (and the last bits
/// of the result) may differ between calls.
pub fn multiply_sum(a: ArrayView2<'_, f32>, b: ArrayView2<'_, f32>) -> f64 {
    debug_assert_eq!(a.dim(), b.dim(), "multiply_sum needs equal shapes");
    let (h, w) = a.dim();

    if h * w < PARALLEL_PIXEL_THRESHOLD {
        return a
            .rows()
            .into_iter()
            .zip(b.rows())
            .map(|(ra, rb)| row_product_sum(ra, rb))
            .sum();
    }

    (0..h)
        .into_par_iter()
        .map(|i| row_product_sum(a.row(i), b.row(i)))
        .sum()
}

#[inline]
fn row_product_sum(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| x as f64 * y as f64)
        .sum()
}

/// Start index of each image's read window for one axis of `offset`,
/// as `(transformed_start, vision_start)`.
fn window_starts(offset: f64) -> (usize, usize) {
    let shift = offset.abs().round_ties_even() as usize;
    if offset < 0.0 {
        (shift, 0)
    } else {
        (0, shift)
    }
}

/// Overlap score of `vision` against `transformed` shifted by `offset`.
///
/// A positive offset means vision content sits further right/down than the
/// transformed content. Only the common rectangle is read; nothing is
/// padded. Offsets that leave no overlap score zero.
pub fn cal_score(transformed: ArrayView2<'_, f32>, vision: ArrayView2<'_, f32>, offset: Point) -> f64 {
    let (tx, vx) = window_starts(offset.x);
    let (ty, vy) = window_starts(offset.y);

    let (vision_h, vision_w) = vision.dim();
    let (trans_h, trans_w) = transformed.dim();

    let h = vision_h.saturating_sub(vy).min(trans_h.saturating_sub(ty));
    let w = vision_w.saturating_sub(vx).min(trans_w.saturating_sub(tx));
    if h == 0 || w == 0 {
        return 0.0;
    }

    multiply_sum(
        vision.slice(s![vy..vy + h, vx..vx + w]),
        transformed.slice(s![ty..ty + h, tx..tx + w]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Axis};

    fn ramp(h: usize, w: usize) -> Array2<f32> {
        Array2::from_shape_fn((h, w), |(r, c)| ((r * 7 + c * 3) % 11) as f32)
    }

    #[test]
    fn test_multiply_sum_small_patch() {
        let a = Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let b = Array2::from_shape_vec((2, 2), vec![5.0, 6.0, 7.0, 8.0]).unwrap();
        assert_eq!(multiply_sum(a.view(), b.view()), 70.0);
    }

    #[test]
    fn test_multiply_sum_zero_patch() {
        let a = ramp(100, 90);
        let zeros = Array2::<f32>::zeros((100, 90));
        assert_eq!(multiply_sum(a.view(), zeros.view()), 0.0);
        assert_eq!(multiply_sum(zeros.view(), a.view()), 0.0);
    }

    #[test]
    fn test_multiply_sum_row_permutation_invariant() {
        let a = ramp(120, 80);
        let b = a.mapv(|v| v + 1.0);
        let order: Vec<usize> = (0..120).rev().collect();
        let a_perm = a.select(Axis(0), &order);
        let b_perm = b.select(Axis(0), &order);

        let direct = multiply_sum(a.view(), b.view());
        let permuted = multiply_sum(a_perm.view(), b_perm.view());
        assert_eq!(direct, permuted);
    }

    #[test]
    fn test_multiply_sum_parallel_matches_sequential() {
        let a = ramp(200, 150);
        let expected: f64 = a.iter().map(|&v| (v as f64) * (v as f64)).sum();
        assert_eq!(multiply_sum(a.view(), a.view()), expected);
    }

    #[test]
    fn test_cal_score_identity_offset() {
        let img = ramp(40, 30);
        let score = cal_score(img.view(), img.view(), Point::new(0.0, 0.0));
        assert_eq!(score, multiply_sum(img.view(), img.view()));
    }

    #[test]
    fn test_cal_score_positive_offset_reads_vision_shifted() {
        let mut transformed = Array2::<f32>::zeros((10, 10));
        let mut vision = Array2::<f32>::zeros((10, 10));
        transformed[[2, 3]] = 2.0;
        vision[[4, 6]] = 5.0;

        assert_eq!(cal_score(transformed.view(), vision.view(), Point::new(3.0, 2.0)), 10.0);
        assert_eq!(cal_score(vision.view(), transformed.view(), Point::new(-3.0, -2.0)), 10.0);
        assert_eq!(cal_score(transformed.view(), vision.view(), Point::new(2.0, 2.0)), 0.0);
    }

    #[test]
    fn test_cal_score_no_overlap_is_zero() {
        let a = ramp(20, 20).mapv(|v| v + 1.0);
        assert_eq!(cal_score(a.view(), a.view(), Point::new(25.0, 0.0)), 0.0);
        assert_eq!(cal_score(a.view(), a.view(), Point::new(0.0, -20.0)), 0.0);
        assert_eq!(cal_score(a.view(), a.view(), Point::new(-40.0, 40.0)), 0.0);
    }

    #[test]
    fn test_cal_score_tolerates_different_sizes() {
        let transformed = Array2::<f32>::ones((12, 30));
        let vision = Array2::<f32>::ones((25, 8));
        // Overlap is 12 x 8 at zero offset, 10 x 5 after shifting by (3, -2).
        assert_eq!(cal_score(transformed.view(), vision.view(), Point::new(0.0, 0.0)), 96.0);
        assert_eq!(cal_score(transformed.view(), vision.view(), Point::new(3.0, -2.0)), 50.0);
    }
}
