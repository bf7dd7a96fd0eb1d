use std::collections::BTreeMap;

use crate::collection::ImageId;
use crate::types::CandidateMatch;

/// Unordered image pair, stored with `left < right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PairKey {
    pub left: ImageId,
    pub right: ImageId,
}

impl PairKey {
    pub fn new(a: ImageId, b: ImageId) -> Self {
        debug_assert_ne!(a, b, "an image is never paired with itself");
        Self {
            left: a.min(b),
            right: a.max(b),
        }
    }

    /// Id distance between the two images
    pub fn span(&self) -> usize {
        self.right - self.left
    }
}

impl std::fmt::Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.left, self.right)
    }
}

/// Putative matches per image pair. Iteration is always in `(left, right)` order.
#[derive(Debug, Clone, Default)]
pub struct PairwiseMatchTable {
    pairs: BTreeMap<PairKey, Vec<CandidateMatch>>,
}

impl PairwiseMatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the matches of one pair, returning whatever was stored for it before.
    pub fn insert(&mut self, key: PairKey, matches: Vec<CandidateMatch>) -> Option<Vec<CandidateMatch>> {
        self.pairs.insert(key, matches)
    }

    pub fn get(&self, left: ImageId, right: ImageId) -> Option<&[CandidateMatch]> {
        self.pairs.get(&PairKey::new(left, right)).map(Vec::as_slice)
    }

    pub fn contains(&self, key: &PairKey) -> bool {
        self.pairs.contains_key(key)
    }

    /// Number of pairs, empty entries included
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn total_matches(&self) -> usize {
        self.pairs.values().map(Vec::len).sum()
    }

    pub fn keys(&self) -> impl Iterator<Item = &PairKey> {
        self.pairs.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PairKey, &[CandidateMatch])> {
        self.pairs.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Pairs holding at least one match
    pub fn non_empty(&self) -> impl Iterator<Item = (&PairKey, &[CandidateMatch])> {
        self.iter().filter(|(_, matches)| !matches.is_empty())
    }
}

impl IntoIterator for PairwiseMatchTable {
    type Item = (PairKey, Vec<CandidateMatch>);
    type IntoIter = std::collections::btree_map::IntoIter<PairKey, Vec<CandidateMatch>>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}

impl FromIterator<(PairKey, Vec<CandidateMatch>)> for PairwiseMatchTable {
    fn from_iter<T: IntoIterator<Item = (PairKey, Vec<CandidateMatch>)>>(iter: T) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}
