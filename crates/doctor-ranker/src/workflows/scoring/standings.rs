use std::cmp::Ordering;

use super::ScoreResult;

/// Sorts by composite descending, ties by doctor id ascending, and assigns 1-based ranks.
pub fn rank(results: &mut [ScoreResult]) {
    results.sort_by(compare);
    for (index, result) in results.iter_mut().enumerate() {
        result.rank = Some(index as u32 + 1);
    }
}

fn compare(left: &ScoreResult, right: &ScoreResult) -> Ordering {
    right
        .composite_score
        .total_cmp(&left.composite_score)
        .then_with(|| left.doctor_id.cmp(&right.doctor_id))
}
