use crate::algorithms::geometry::{rotate_points, Point, Shape};
use serde::{Deserialize, Serialize};

/// Translation estimated from matched landmark points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RoughOffset {
    /// Full-resolution translation from the rotated transformed frame into
    /// the vision frame. `(0, 0)` when nothing matched.
    pub offset: Point,
    /// Number of transformed points with a vision point within the gate.
    pub matched: usize,
}

impl RoughOffset {
    pub fn is_matched(&self) -> bool {
        self.matched > 0
    }

    /// Both axes differ from zero. Older pipelines used this as the
    /// refinement gate.
    pub fn is_nonzero_on_both_axes(&self) -> bool {
        self.offset.x != 0.0 && self.offset.y != 0.0
    }
}

/// Index and distance of the vision point closest to `point`.
fn nearest(point: &Point, candidates: &[Point]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, candidate) in candidates.iter().enumerate() {
        let d = point.distance(candidate);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((i, d)),
        }
    }
    best
}

/// Median with the two middle values averaged for even lengths.
pub(crate) fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

/// Robust translation between two landmark sets under a rotation hypothesis.
///
/// The transformed points are rotated by `rot_guess` into `new_shape`,
/// shifted by `offset_guess` and matched to their nearest vision point.
/// Pairs further apart than `dist_thresh` are dropped. The per-axis median
/// of `vision - rotated` over the remaining pairs is the offset; the guess
/// only decides which pairs qualify.
pub fn get_rough_offset(
    offset_guess: Point,
    rot_guess: f64,
    old_shape: Shape,
    new_shape: Shape,
    transformed_pts: &[Point],
    vision_pts: &[Point],
    dist_thresh: f64,
) -> RoughOffset {
    let rotated = rotate_points(transformed_pts, rot_guess, old_shape, new_shape);

    let (mut dx, mut dy): (Vec<f64>, Vec<f64>) = rotated
        .iter()
        .filter_map(|p| {
            let (idx, dist) = nearest(&(*p + offset_guess), vision_pts)?;
            (dist <= dist_thresh).then(|| {
                let v = vision_pts[idx];
                (v.x - p.x, v.y - p.y)
            })
        })
        .unzip();

    match (median(&mut dx), median(&mut dy)) {
        (Some(x), Some(y)) => RoughOffset {
            offset: Point::new(x, y),
            matched: dx.len(),
        },
        _ => RoughOffset::default(),
    }
}
