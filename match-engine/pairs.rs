use std::ops::Range;

use match_core::{ImageId, PairKey};

/// Right-hand images compared with `left`: `[left + 1, n)` when `radius == 0`,
/// otherwise `[left + 1, min(n, left + 1 + radius))`.
pub fn pair_window(left: ImageId, n: usize, radius: usize) -> Range<ImageId> {
    let upper = if radius == 0 {
        n
    } else {
        n.min(left.saturating_add(1).saturating_add(radius))
    };
    (left + 1)..upper
}

/// Number of pairs [`planned_pairs`] yields for `n` images.
pub fn pair_count(n: usize, radius: usize) -> usize {
    if radius == 0 {
        return n * n.saturating_sub(1) / 2;
    }
    let r = radius.min(n.saturating_sub(1));
    r * n - r * (r + 1) / 2
}

/// Every scheduled pair, ordered by `(left, right)`
pub fn planned_pairs(n: usize, radius: usize) -> impl Iterator<Item = PairKey> {
    (0..n).flat_map(move |left| pair_window(left, n, radius).map(move |right| PairKey::new(left, right)))
}
