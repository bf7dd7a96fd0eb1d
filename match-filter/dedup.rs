use std::collections::HashSet;

use match_core::{CandidateMatch, Feature};

/// Drop repeated `(left, right)` index pairs, keeping the first occurrence.
pub fn deduplicate_indices(matches: &mut Vec<CandidateMatch>) {
    let mut seen = HashSet::with_capacity(matches.len());
    matches.retain(|m| seen.insert(m.indices()));
}

/// Drop matches whose left or right keypoint sits at the same (x, y) as an
/// earlier surviving match's keypoint in that image.
///
/// Match indices must be valid for `left_features` and `right_features`.
pub fn deduplicate_coordinates(matches: &mut Vec<CandidateMatch>, left_features: &[Feature], right_features: &[Feature]) {
    let mut left_seen = HashSet::with_capacity(matches.len());
    let mut right_seen = HashSet::with_capacity(matches.len());
    matches.retain(|m| {
        let l = left_features[m.left].coordinate_key();
        let r = right_features[m.right].coordinate_key();
        if left_seen.contains(&l) || right_seen.contains(&r) {
            return false;
        }
        left_seen.insert(l);
        right_seen.insert(r);
        true
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn m(left: usize, right: usize) -> CandidateMatch {
        CandidateMatch::new(left, right, 0.0)
    }

    fn pairs(matches: &[CandidateMatch]) -> Vec<(usize, usize)> {
        matches.iter().map(CandidateMatch::indices).collect()
    }

    #[test]
    fn test_identity_keeps_first_occurrence() {
        let mut matches = vec![m(0, 1), m(2, 3), m(0, 1), m(1, 0), m(2, 3)];
        deduplicate_indices(&mut matches);
        assert_eq!(pairs(&matches), vec![(0, 1), (2, 3), (1, 0)]);
    }

    #[test]
    fn test_coordinate_dedup_on_either_side() {
        let left = [
            Feature::new(1.0, 1.0),
            Feature::new(1.0, 1.0),
            Feature::new(5.0, 5.0),
            Feature::new(7.0, 7.0),
        ];
        let right = [
            Feature::new(2.0, 2.0),
            Feature::new(3.0, 3.0),
            Feature::new(2.0, 2.0),
            Feature::new(9.0, 9.0),
        ];
        // (1,1) repeats the left position of (0,0); (2,2) repeats the right position of (0,0)
        let mut matches = vec![m(0, 0), m(1, 1), m(2, 2), m(3, 3)];
        deduplicate_coordinates(&mut matches, &left, &right);
        assert_eq!(pairs(&matches), vec![(0, 0), (3, 3)]);
    }

    #[test]
    fn test_coordinate_dedup_distinct_positions_untouched() {
        let left = [Feature::new(0.0, 0.0), Feature::new(0.0, 1.0)];
        let right = [Feature::new(1.0, 0.0), Feature::new(0.0, 0.0)];
        let mut matches = vec![m(0, 0), m(1, 1)];
        deduplicate_coordinates(&mut matches, &left, &right);
        assert_eq!(matches.len(), 2);
    }

    fn arb_matches() -> impl Strategy<Value = Vec<CandidateMatch>> {
        prop::collection::vec((0usize..8, 0usize..8), 0..40)
            .prop_map(|v| v.into_iter().map(|(l, r)| m(l, r)).collect())
    }

    fn arb_features() -> impl Strategy<Value = Vec<Feature>> {
        prop::collection::vec((0u8..4, 0u8..4), 8)
            .prop_map(|v| v.into_iter().map(|(x, y)| Feature::new(x as f32, y as f32)).collect())
    }

    proptest! {
        #[test]
        fn prop_identity_dedup_idempotent(matches in arb_matches()) {
            let mut once = matches.clone();
            deduplicate_indices(&mut once);
            let mut twice = once.clone();
            deduplicate_indices(&mut twice);
            prop_assert_eq!(pairs(&once), pairs(&twice));

            let unique: HashSet<_> = pairs(&once).into_iter().collect();
            prop_assert_eq!(unique.len(), once.len());
        }

        #[test]
        fn prop_no_shared_coordinates(
            matches in arb_matches(),
            left in arb_features(),
            right in arb_features(),
        ) {
            let mut kept = matches.clone();
            deduplicate_coordinates(&mut kept, &left, &right);
            for (a, x) in kept.iter().enumerate() {
                for y in &kept[a + 1..] {
                    prop_assert_ne!(left[x.left], left[y.left]);
                    prop_assert_ne!(right[x.right], right[y.right]);
                }
            }
            // survivors keep their relative order
            let mut cursor = matches.iter();
            for k in &kept {
                prop_assert!(cursor.any(|c| c.indices() == k.indices()));
            }
        }
    }
}
