//! Parameter ranges and their Cartesian product.

use serde::{Deserialize, Serialize};

/// Tolerance added past `end` so that an accumulated float lands inside the range.
const END_PADDING: f64 = 0.001;

/// Inclusive float range from `begin` toward `end` in increments of `step`.
///
/// Descends when `step` is negative. Returns an empty vector when the sign
/// of `step` disagrees with the direction from `begin` to `end`, or when
/// `step` is zero or not finite. `begin == end` yields the single value.
///
/// # Example
/// ```
/// use stoplab_runner::range::range;
///
/// assert_eq!(range(1.0, 3.0, 1.0), vec![1.0, 2.0, 3.0]);
/// assert_eq!(range(3.0, 1.0, -1.0), vec![3.0, 2.0, 1.0]);
/// assert!(range(1.0, 3.0, -1.0).is_empty());
/// ```
pub fn range(begin: f64, end: f64, step: f64) -> Vec<f64> {
    if step == 0.0 || !step.is_finite() || !begin.is_finite() || !end.is_finite() {
        return Vec::new();
    }

    let at = move |i: u64| begin + i as f64 * step;
    if begin < end && step > 0.0 {
        let limit = end + END_PADDING;
        (0u64..).map(at).take_while(|v| *v < limit).collect()
    } else if end < begin && step < 0.0 {
        let limit = end - END_PADDING;
        (0u64..).map(at).take_while(|v| *v > limit).collect()
    } else if begin == end {
        vec![begin]
    } else {
        Vec::new()
    }
}

/// Cartesian product of `ranges` in row-major order: the last range varies fastest.
///
/// An empty input, or any empty range, gives an empty result.
pub fn permutations(ranges: &[Vec<f64>]) -> Vec<Vec<f64>> {
    if ranges.is_empty() {
        return Vec::new();
    }

    ranges.iter().fold(vec![Vec::new()], |acc, values| {
        acc.iter()
            .flat_map(|prefix| {
                values.iter().map(move |&v| {
                    let mut next = Vec::with_capacity(prefix.len() + 1);
                    next.extend_from_slice(prefix);
                    next.push(v);
                    next
                })
            })
            .collect()
    })
}

/// Serializable `start..=end` by `step` range, as written in config files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeSpec {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl RangeSpec {
    pub fn new(start: f64, end: f64, step: f64) -> Self {
        Self { start, end, step }
    }

    pub fn values(&self) -> Vec<f64> {
        range(self.start, self.end, self.step)
    }
}
