use crate::algorithms::geometry::Point;
use crate::algorithms::scoring::cal_score;
use ndarray::{ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Rotates a raster counter-clockwise by `k` quarter turns without copying.
///
/// Element `[i, j]` of a single turn reads source `[j, w - 1 - i]`.
pub fn rot90(image: ArrayView2<'_, f32>, k: u32) -> ArrayView2<'_, f32> {
    let mut view = image;
    match k % 4 {
        1 => {
            view.swap_axes(0, 1);
            view.invert_axis(Axis(0));
        }
        2 => {
            view.invert_axis(Axis(0));
            view.invert_axis(Axis(1));
        }
        3 => {
            view.swap_axes(0, 1);
            view.invert_axis(Axis(1));
        }
        _ => {}
    }
    view
}

/// Best candidate found by [`FovSearch::search`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FovMatch {
    /// Full-resolution offset; `None` when no candidate scored above zero.
    pub offset: Option<Point>,
    pub score: f64,
}

/// Grid of candidate offsets spaced one chip period apart.
#[derive(Debug, Clone, Copy)]
pub struct FovSearch<'a> {
    /// Period multiples probed along x.
    pub range_x: &'a [i32],
    /// Period multiples probed along y.
    pub range_y: &'a [i32],
    pub fov_size: f64,
    /// Ratio between full-resolution and scored image coordinates.
    pub downsample_factor: f64,
}

impl FovSearch<'_> {
    /// Scores every grid candidate around `rough` with the transformed image
    /// turned by `angle` degrees and returns the strictly best one.
    ///
    /// Both images must already be downsampled by `downsample_factor`.
    /// Candidates are visited row by row, so ties keep the earlier one.
    pub fn search(
        &self,
        transformed: ArrayView2<'_, f32>,
        vision: ArrayView2<'_, f32>,
        rough: Point,
        angle: u32,
    ) -> FovMatch {
        let turned = rot90(transformed, angle / 90);
        let mut best = FovMatch::default();

        for &row in self.range_y {
            for &col in self.range_x {
                let candidate = Point::new(
                    rough.x + f64::from(col) * self.fov_size,
                    rough.y + f64::from(row) * self.fov_size,
                );
                let score = cal_score(turned, vision, candidate.scale(1.0 / self.downsample_factor));
                tracing::trace!(x = candidate.x, y = candidate.y, score, "fov candidate");

                if score > best.score {
                    best = FovMatch {
                        offset: Some(candidate),
                        score,
                    };
                }
            }
        }

        best
    }
}
