use crate::error::{CollectionError, CollectionResult};

/// Keypoint position in image coordinates. Identified by its index in the image's feature list.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Feature {
    pub x: f32,
    pub y: f32,
}

impl Feature {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Bit-exact key for coordinate equality; `-0.0` and `0.0` map to the same key.
    pub fn coordinate_key(&self) -> (u32, u32) {
        ((self.x + 0.0).to_bits(), (self.y + 0.0).to_bits())
    }
}

/// Scalar element of a descriptor vector.
pub trait DescriptorBin: Copy + Default + Send + Sync + std::fmt::Debug + 'static {
    /// Size of one bin in the on-disk little-endian encoding
    const BYTES: usize;

    fn to_f32(self) -> f32;

    /// Squared Euclidean distance between two descriptors of equal width.
    fn squared_distance(a: &[Self], b: &[Self]) -> f32;

    fn from_le_slice(bytes: &[u8]) -> Self;

    fn extend_le_bytes(self, out: &mut Vec<u8>);
}

impl DescriptorBin for u8 {
    const BYTES: usize = 1;

    fn to_f32(self) -> f32 {
        self as f32
    }

    fn squared_distance(a: &[Self], b: &[Self]) -> f32 {
        // Integer accumulation stays exact for SIFT-sized descriptors
        let sum: u64 = a
            .iter()
            .zip(b)
            .map(|(&p, &q)| {
                let d = p.abs_diff(q) as u64;
                d * d
            })
            .sum();
        sum as f32
    }

    fn from_le_slice(bytes: &[u8]) -> Self {
        bytes[0]
    }

    fn extend_le_bytes(self, out: &mut Vec<u8>) {
        out.push(self);
    }
}

impl DescriptorBin for f32 {
    const BYTES: usize = 4;

    fn to_f32(self) -> f32 {
        self
    }

    fn squared_distance(a: &[Self], b: &[Self]) -> f32 {
        a.iter()
            .zip(b)
            .map(|(&p, &q)| {
                let d = p - q;
                d * d
            })
            .sum()
    }

    fn from_le_slice(bytes: &[u8]) -> Self {
        f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    fn extend_le_bytes(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

/// Contiguous row-major descriptor storage: descriptor `k` lives at `k * dimension`.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorArray<B> {
    data: Vec<B>,
    dimension: usize,
}

impl<B: DescriptorBin> DescriptorArray<B> {
    pub fn new(data: Vec<B>, dimension: usize) -> CollectionResult<Self> {
        if dimension == 0 {
            return Err(CollectionError::EmptyDimension);
        }
        if data.len() % dimension != 0 {
            return Err(CollectionError::MalformedDescriptors {
                len: data.len(),
                dimension,
            });
        }
        Ok(Self { data, dimension })
    }

    /// An array with no descriptors but a known width
    pub fn empty(dimension: usize) -> CollectionResult<Self> {
        Self::new(Vec::new(), dimension)
    }

    pub fn from_rows<const D: usize>(rows: &[[B; D]]) -> CollectionResult<Self> {
        Self::new(rows.iter().flatten().copied().collect(), D)
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn row(&self, k: usize) -> &[B] {
        &self.data[k * self.dimension..(k + 1) * self.dimension]
    }

    pub fn as_slice(&self) -> &[B] {
        &self.data
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'_, B> {
        self.data.chunks_exact(self.dimension)
    }
}

/// Features and descriptors of one image. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct ImageDescriptorSet<B> {
    name: String,
    features: Vec<Feature>,
    descriptors: DescriptorArray<B>,
}

impl<B: DescriptorBin> ImageDescriptorSet<B> {
    pub fn new(
        name: impl Into<String>,
        features: Vec<Feature>,
        descriptors: DescriptorArray<B>,
    ) -> CollectionResult<Self> {
        let name = name.into();
        if features.len() != descriptors.len() {
            return Err(CollectionError::FeatureCountMismatch {
                image: name,
                features: features.len(),
                descriptors: descriptors.len(),
            });
        }
        Ok(Self {
            name,
            features,
            descriptors,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn descriptors(&self) -> &DescriptorArray<B> {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Putative correspondence between feature `left` of image i and feature `right` of image j.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CandidateMatch {
    pub left: usize,
    pub right: usize,
    /// Squared descriptor distance, NaN when unknown
    pub distance: f32,
}

impl CandidateMatch {
    pub fn new(left: usize, right: usize, distance: f32) -> Self {
        Self {
            left,
            right,
            distance,
        }
    }

    /// Match read back from storage, where distances are not kept
    pub fn without_distance(left: usize, right: usize) -> Self {
        Self::new(left, right, f32::NAN)
    }

    pub fn indices(&self) -> (usize, usize) {
        (self.left, self.right)
    }
}
