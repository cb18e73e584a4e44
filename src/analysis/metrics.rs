use crate::algorithms::geometry::Point;
use crate::AlignmentResult;

/// Euclidean distance between the recovered offset and the true one.
/// `None` when the run found no offset.
pub fn calculate_translation_error(result: &AlignmentResult, ground_truth: Point) -> Option<f64> {
    result.offset.map(|offset| offset.distance(&ground_truth))
}

pub fn rotation_matches(result: &AlignmentResult, ground_truth_degrees: u32) -> bool {
    result.rotation_degrees % 360 == ground_truth_degrees % 360
}

/// Steps between two rotation indices on the quarter-turn cycle.
pub fn rotation_index_shift(from: usize, to: usize) -> usize {
    (to + 4 - from % 4) % 4
}

/// Winning score relative to the runner-up; `None` without a runner-up score.
pub fn score_margin(result: &AlignmentResult) -> Option<f64> {
    let runner_up = result
        .hypotheses
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != result.rotation_index)
        .map(|(_, h)| h.score)
        .fold(0.0f64, f64::max);

    (runner_up > 0.0).then(|| result.score / runner_up)
}
