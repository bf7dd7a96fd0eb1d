use crate::error::{CollectionError, CollectionResult, LoadFailure};
use crate::types::{DescriptorBin, ImageDescriptorSet};

/// Image id: position of the image in its collection.
pub type ImageId = usize;

/// All images of a matching run, indexed by contiguous [`ImageId`].
///
/// Every image shares one descriptor dimension. A collection can only be
/// built from fully loaded data, so matching never runs on a partial load.
#[derive(Debug, Clone)]
pub struct ImageCollection<B> {
    images: Vec<ImageDescriptorSet<B>>,
    dimension: usize,
}

impl<B: DescriptorBin> ImageCollection<B> {
    pub fn new(images: Vec<ImageDescriptorSet<B>>) -> CollectionResult<Self> {
        let dimension = match images.first() {
            Some(first) => first.descriptors().dimension(),
            None => return Ok(Self { images, dimension: 0 }),
        };
        if let Some(bad) = images
            .iter()
            .find(|img| img.descriptors().dimension() != dimension)
        {
            return Err(CollectionError::DimensionMismatch {
                image: bad.name().to_string(),
                expected: dimension,
                actual: bad.descriptors().dimension(),
            });
        }
        Ok(Self { images, dimension })
    }

    /// Collects per-image load results, reporting every failure rather than the first one.
    pub fn from_load_results<I>(results: I) -> CollectionResult<Self>
    where
        I: IntoIterator<Item = Result<ImageDescriptorSet<B>, LoadFailure>>,
    {
        let mut images = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(image) => images.push(image),
                Err(failure) => failures.push(failure),
            }
        }
        if !failures.is_empty() {
            return Err(CollectionError::LoadFailure { failures });
        }
        Self::new(images)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Shared descriptor dimension, 0 for an empty collection
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn get(&self, id: ImageId) -> Option<&ImageDescriptorSet<B>> {
        self.images.get(id)
    }

    pub fn images(&self) -> &[ImageDescriptorSet<B>] {
        &self.images
    }

    pub fn image_ids(&self) -> std::ops::Range<ImageId> {
        0..self.images.len()
    }
}

impl<B> std::ops::Index<ImageId> for ImageCollection<B> {
    type Output = ImageDescriptorSet<B>;

    fn index(&self, id: ImageId) -> &Self::Output {
        &self.images[id]
    }
}
