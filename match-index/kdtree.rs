use std::collections::HashMap;

use kiddo::SquaredEuclidean;
use match_core::DescriptorBin;
use rayon::prelude::*;

use crate::error::{IndexError, IndexResult};
use crate::{IndexBuilder, NeighborIndex, Neighbours, check_build, check_query};

/// Leaf bucket size of each shard tree
const BUCKET: usize = 64;

/// kiddo cannot split a full leaf whose items all share the split-axis value,
/// so a shard never holds a full bucket of one value on any axis.
const MAX_SHARED_VALUE: usize = BUCKET - 1;

type ShardTree<const D: usize> = kiddo::float::kdtree::KdTree<f32, u64, D, BUCKET, u32>;

/// kd-tree search for descriptors of compile-time width `D`.
///
/// Bins are widened to `f32`; results are exact squared Euclidean distances.
/// Owns a copy of the descriptors, so the borrowed buffer is only read during build.
///
/// Quantized descriptors repeat bin values heavily (most SIFT bins are zero), so
/// rows are spread over as many trees as needed to keep every axis splittable,
/// and queries merge the per-tree results.
#[derive(Debug, Clone, Copy, Default)]
pub struct KdTree<const D: usize>;

impl<B: DescriptorBin, const D: usize> IndexBuilder<B> for KdTree<D> {
    type Index<'a>
        = KdTreeIndex<D>
    where
        B: 'a;

    fn build<'a>(&self, descriptors: &'a [B], count: usize, dimension: usize) -> IndexResult<Self::Index<'a>> {
        KdTreeIndex::new(descriptors, count, dimension)
    }

    fn name(&self) -> &'static str {
        "kd-tree"
    }
}

pub struct KdTreeIndex<const D: usize> {
    shards: Vec<ShardTree<D>>,
    len: usize,
}

fn to_point<B: DescriptorBin, const D: usize>(row: &[B]) -> [f32; D] {
    std::array::from_fn(|c| row[c].to_f32())
}

/// Value key on one axis; `-0.0` and `0.0` land in the same tree bucket.
fn axis_key(value: f32) -> u32 {
    (value + 0.0).to_bits()
}

/// Rows of one shard and how often each value occurs per axis
struct ShardLoad {
    rows: Vec<usize>,
    counts: Vec<HashMap<u32, usize>>,
}

impl ShardLoad {
    fn new(dimension: usize) -> Self {
        Self {
            rows: Vec::new(),
            counts: vec![HashMap::new(); dimension],
        }
    }

    fn fits(&self, point: &[f32]) -> bool {
        point
            .iter()
            .zip(&self.counts)
            .all(|(&v, counts)| counts.get(&axis_key(v)).copied().unwrap_or(0) < MAX_SHARED_VALUE)
    }

    fn push(&mut self, row: usize, point: &[f32]) {
        for (&v, counts) in point.iter().zip(&mut self.counts) {
            *counts.entry(axis_key(v)).or_insert(0) += 1;
        }
        self.rows.push(row);
    }
}

/// First-fit assignment of rows to shards.
fn partition<const D: usize>(points: &[[f32; D]]) -> Vec<Vec<usize>> {
    let mut shards: Vec<ShardLoad> = Vec::new();
    for (row, point) in points.iter().enumerate() {
        match shards.iter_mut().find(|shard| shard.fits(point)) {
            Some(shard) => shard.push(row, point),
            None => {
                let mut shard = ShardLoad::new(D);
                shard.push(row, point);
                shards.push(shard);
            }
        }
    }
    shards.into_iter().map(|shard| shard.rows).collect()
}

impl<const D: usize> KdTreeIndex<D> {
    pub fn new<B: DescriptorBin>(descriptors: &[B], count: usize, dimension: usize) -> IndexResult<Self> {
        if dimension != D {
            return Err(IndexError::UnsupportedDimension {
                expected: D,
                actual: dimension,
            });
        }
        check_build(descriptors, count, dimension)?;

        let points: Vec<[f32; D]> = descriptors.chunks_exact(D).map(to_point).collect();
        if let Some(row) = points.iter().position(|p| p.iter().any(|v| !v.is_finite())) {
            return Err(IndexError::NonFiniteDescriptor { row });
        }

        let shards: Vec<ShardTree<D>> = partition(&points)
            .into_iter()
            .map(|rows| {
                let mut tree = ShardTree::<D>::with_capacity(rows.len());
                for row in rows {
                    tree.add(&points[row], row as u64);
                }
                tree
            })
            .collect();
        log::trace!(
            "kd-tree built over {} descriptors of width {} in {} shard(s)",
            count,
            D,
            shards.len()
        );
        Ok(Self { shards, len: count })
    }

    /// Number of trees the descriptors were spread over
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn nearest(&self, point: &[f32; D], k: usize) -> Vec<(usize, f32)> {
        let mut found: Vec<(usize, f32)> = self
            .shards
            .iter()
            .flat_map(|tree| tree.nearest_n::<SquaredEuclidean>(point, k))
            .map(|nn| (nn.item as usize, nn.distance))
            .collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        found.truncate(k);
        found
    }
}

impl<B: DescriptorBin, const D: usize> NeighborIndex<B> for KdTreeIndex<D> {
    fn len(&self) -> usize {
        self.len
    }

    fn dimension(&self) -> usize {
        D
    }

    fn query(&self, queries: &[B], query_count: usize, k: usize) -> IndexResult<Neighbours> {
        if !check_query(self.len, D, queries, query_count, k)? {
            return Ok(Neighbours::empty(k));
        }

        let per_query: Vec<Vec<(usize, f32)>> = queries
            .par_chunks_exact(D)
            .map(|row| self.nearest(&to_point(row), k))
            .collect();

        let mut indices = Vec::with_capacity(query_count * k);
        let mut distances = Vec::with_capacity(query_count * k);
        for (idx, dist) in per_query.into_iter().flatten() {
            indices.push(idx);
            distances.push(dist);
        }
        Ok(Neighbours::new(k, indices, distances))
    }
}
