use match_core::CandidateMatch;

/// Lowe's nearest/second-nearest distance ratio test on squared distances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioTest {
    squared_ratio: f32,
}

impl RatioTest {
    /// `ratio` is in real distance units; it is squared once here.
    pub fn new(ratio: f32) -> Self {
        Self {
            squared_ratio: ratio * ratio,
        }
    }

    pub fn squared_ratio(&self) -> f32 {
        self.squared_ratio
    }

    /// `d1 / d2 < ratio²`, written without the division so `d2 == 0` is rejected.
    pub fn accepts(&self, d1: f32, d2: f32) -> bool {
        d1 < self.squared_ratio * d2
    }

    /// Query indices whose first two neighbours pass the test, in query order.
    ///
    /// `distances` holds `k` sorted distances per query; only the first two are read.
    pub fn passing_queries(&self, distances: &[f32], k: usize) -> Vec<usize> {
        assert!(k >= 2, "ratio test needs two neighbours per query");
        distances
            .chunks_exact(k)
            .enumerate()
            .filter(|(_, nn)| self.accepts(nn[0], nn[1]))
            .map(|(q, _)| q)
            .collect()
    }

    /// Turn k-NN results into matches: `left` is the nearest indexed feature,
    /// `right` the query feature.
    pub fn apply(&self, indices: &[usize], distances: &[f32], k: usize) -> Vec<CandidateMatch> {
        debug_assert_eq!(indices.len(), distances.len());
        self.passing_queries(distances, k)
            .into_iter()
            .map(|q| CandidateMatch::new(indices[q * k], q, distances[q * k]))
            .collect()
    }
}
