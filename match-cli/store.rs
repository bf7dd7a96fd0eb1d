use std::path::{Path, PathBuf};

use match_core::{
    CollectionResult, DescriptorArray, DescriptorBin, Feature, ImageCollection, ImageDescriptorSet, LoadFailure,
};
use rayon::prelude::*;

use crate::error::{StoreError, StoreResult};

const FEATURE_EXT: &str = "feat";
const DESCRIPTOR_EXT: &str = "desc";
const COUNT_HEADER_BYTES: usize = std::mem::size_of::<u64>();

/// Feature/descriptor files of a collection, stored side by side in one directory
/// as `<stem>.feat` (text) and `<stem>.desc` (binary).
#[derive(Debug, Clone)]
pub struct FeatureStore {
    dir: PathBuf,
    dimension: usize,
}

impl FeatureStore {
    pub fn new(dir: impl Into<PathBuf>, dimension: usize) -> Self {
        Self {
            dir: dir.into(),
            dimension,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// `photos/IMG_01.jpg` -> `<dir>/IMG_01.feat`
    pub fn feature_path(&self, image: &str) -> PathBuf {
        self.sidecar(image, FEATURE_EXT)
    }

    pub fn descriptor_path(&self, image: &str) -> PathBuf {
        self.sidecar(image, DESCRIPTOR_EXT)
    }

    fn sidecar(&self, image: &str, ext: &str) -> PathBuf {
        let stem = Path::new(image)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| image.to_string());
        self.dir.join(format!("{}.{}", stem, ext))
    }

    pub fn load_image<B: DescriptorBin>(&self, image: &str) -> StoreResult<ImageDescriptorSet<B>> {
        let features = read_features(&self.feature_path(image))?;
        let descriptors = read_descriptors(&self.descriptor_path(image), self.dimension)?;
        Ok(ImageDescriptorSet::new(image, features, descriptors)?)
    }

    /// Load every image, in parallel, and report all failures together.
    pub fn load_collection<B: DescriptorBin>(&self, images: &[String]) -> CollectionResult<ImageCollection<B>> {
        let results: Vec<Result<ImageDescriptorSet<B>, LoadFailure>> = images
            .par_iter()
            .map(|image| {
                self.load_image(image).map_err(|e| {
                    log::warn!("cannot load {}: {}", image, e);
                    LoadFailure::new(image.as_str(), e.to_string())
                })
            })
            .collect();
        let collection = ImageCollection::from_load_results(results)?;
        log::info!(
            "loaded {} images ({} features) from {}",
            collection.len(),
            collection.images().iter().map(ImageDescriptorSet::len).sum::<usize>(),
            self.dir.display()
        );
        Ok(collection)
    }

    pub fn save_image<B: DescriptorBin>(&self, image: &ImageDescriptorSet<B>) -> StoreResult<()> {
        write_features(&self.feature_path(image.name()), image.features())?;
        write_descriptors(&self.descriptor_path(image.name()), image.descriptors())
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// One keypoint per line; the first two columns are x and y, extra columns
/// (scale, orientation, ...) are ignored.
pub fn read_features(path: &Path) -> StoreResult<Vec<Feature>> {
    let text = std::fs::read_to_string(path).map_err(io_error(path))?;
    parse_features(&text).map_err(|(line, message)| StoreError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    })
}

/// Parse feature text, returning the 1-based line number of the first bad line.
pub fn parse_features(text: &str) -> Result<Vec<Feature>, (usize, String)> {
    let mut features = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let mut cols = line.split_whitespace();
        let Some(first) = cols.next() else {
            continue;
        };
        let parse = |s: Option<&str>| -> Result<f32, String> {
            let s = s.ok_or_else(|| "missing y coordinate".to_string())?;
            s.parse::<f32>().map_err(|e| format!("bad coordinate {:?}: {}", s, e))
        };
        let x = parse(Some(first)).map_err(|m| (n + 1, m))?;
        let y = parse(cols.next()).map_err(|m| (n + 1, m))?;
        features.push(Feature::new(x, y));
    }
    Ok(features)
}

pub fn write_features(path: &Path, features: &[Feature]) -> StoreResult<()> {
    let mut text = String::with_capacity(features.len() * 16);
    for f in features {
        text.push_str(&format!("{} {}\n", f.x, f.y));
    }
    std::fs::write(path, text).map_err(io_error(path))
}

/// Little-endian u64 descriptor count followed by `count * dimension` bins.
pub fn read_descriptors<B: DescriptorBin>(path: &Path, dimension: usize) -> StoreResult<DescriptorArray<B>> {
    let bytes = std::fs::read(path).map_err(io_error(path))?;
    if bytes.len() < COUNT_HEADER_BYTES {
        return Err(StoreError::Truncated {
            path: path.to_path_buf(),
            expected: COUNT_HEADER_BYTES,
            actual: bytes.len(),
        });
    }
    let (header, body) = bytes.split_at(COUNT_HEADER_BYTES);
    let mut count = [0u8; COUNT_HEADER_BYTES];
    count.copy_from_slice(header);
    let count = u64::from_le_bytes(count);

    let expected = usize::try_from(count)
        .ok()
        .and_then(|count| count.checked_mul(dimension))
        .and_then(|bins| bins.checked_mul(B::BYTES))
        .ok_or_else(|| StoreError::ImpossibleCount {
            path: path.to_path_buf(),
            count,
        })?;
    if body.len() != expected {
        return Err(StoreError::Truncated {
            path: path.to_path_buf(),
            expected: expected.saturating_add(COUNT_HEADER_BYTES),
            actual: bytes.len(),
        });
    }
    let data = body.chunks_exact(B::BYTES).map(B::from_le_slice).collect();
    Ok(DescriptorArray::new(data, dimension)?)
}

pub fn write_descriptors<B: DescriptorBin>(path: &Path, descriptors: &DescriptorArray<B>) -> StoreResult<()> {
    let mut bytes = Vec::with_capacity(COUNT_HEADER_BYTES + descriptors.as_slice().len() * B::BYTES);
    bytes.extend_from_slice(&(descriptors.len() as u64).to_le_bytes());
    for &bin in descriptors.as_slice() {
        bin.extend_le_bytes(&mut bytes);
    }
    std::fs::write(path, bytes).map_err(io_error(path))
}

/// Image names from a list file: first token of each non-blank line, where
/// tokens are separated by whitespace or `;` (`name;width;height` lists).
pub fn read_image_list(path: &Path) -> StoreResult<Vec<String>> {
    let text = std::fs::read_to_string(path).map_err(io_error(path))?;
    Ok(text
        .lines()
        .filter_map(|line| {
            line.split(|c: char| c == ';' || c.is_whitespace())
                .find(|token| !token.is_empty())
        })
        .map(str::to_string)
        .collect())
}
