//! Distance and ranking helpers shared by both engines

use osprey_core::Ordinal;
use std::cmp::Ordering;

/// Squared Euclidean distance
///
/// Callers guarantee equal lengths; extra components on either side are ignored.
#[inline]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Result ordering: distance ascending, then ordinal ascending
///
/// Distances are finite because stored and query vectors are validated.
#[inline]
pub fn rank(a: &(Ordinal, f32), b: &(Ordinal, f32)) -> Ordering {
    a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0))
}
