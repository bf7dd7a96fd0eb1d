//! Data model shared by the sparse matching crates: per-image features and
//! descriptors, the image collection, candidate matches and the pairwise table.

pub mod collection;
pub mod config;
pub mod error;
pub mod table;
pub mod types;

pub use collection::{ImageCollection, ImageId};
pub use config::{MatcherConfig, DEFAULT_RATIO_THRESHOLD};
pub use error::{CollectionError, CollectionResult, ConfigError, ConfigResult, LoadFailure};
pub use table::{PairKey, PairwiseMatchTable};
pub use types::{CandidateMatch, DescriptorArray, DescriptorBin, Feature, ImageDescriptorSet};

/// Build a dedicated Rayon pool with the specified number of threads
pub fn build_thread_pool(n_threads: usize) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .thread_name(|i| format!("sparse-match-{}", i))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(name: &str, n: usize, dim: usize) -> ImageDescriptorSet<u8> {
        let features = (0..n).map(|i| Feature::new(i as f32, 0.0)).collect();
        let descriptors = DescriptorArray::new(vec![0u8; n * dim], dim).unwrap();
        ImageDescriptorSet::new(name, features, descriptors).unwrap()
    }

    #[test]
    fn test_descriptor_rows() {
        let arr = DescriptorArray::from_rows(&[[1u8, 2, 3], [4, 5, 6]]).unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr.dimension(), 3);
        assert_eq!(arr.row(1), &[4, 5, 6]);
        assert_eq!(arr.rows().count(), 2);
    }

    #[test]
    fn test_malformed_descriptor_buffer() {
        let result = DescriptorArray::new(vec![0u8; 7], 4);
        assert!(matches!(
            result,
            Err(CollectionError::MalformedDescriptors { len: 7, dimension: 4 })
        ));
        assert!(matches!(
            DescriptorArray::<f32>::new(vec![], 0),
            Err(CollectionError::EmptyDimension)
        ));
    }

    #[test]
    fn test_feature_count_must_match_descriptors() {
        let descriptors = DescriptorArray::new(vec![0u8; 8], 4).unwrap();
        let result = ImageDescriptorSet::new("a", vec![Feature::new(0.0, 0.0)], descriptors);
        assert!(matches!(
            result,
            Err(CollectionError::FeatureCountMismatch { features: 1, descriptors: 2, .. })
        ));
    }

    #[test]
    fn test_squared_distances() {
        assert_eq!(u8::squared_distance(&[0, 10, 255], &[3, 6, 0]), (9 + 16 + 65025) as f32);
        assert_eq!(f32::squared_distance(&[0.5, -1.0], &[1.5, 1.0]), 5.0);
    }

    #[test]
    fn test_wide_u8_distance_does_not_wrap() {
        let a = vec![0u8; 70_000];
        let b = vec![255u8; 70_000];
        assert_eq!(u8::squared_distance(&a, &b), (70_000u64 * 65_025) as f32);
    }

    #[test]
    fn test_bin_byte_encoding() {
        let mut bytes = Vec::new();
        1.25f32.extend_le_bytes(&mut bytes);
        7u8.extend_le_bytes(&mut bytes);
        assert_eq!(bytes.len(), f32::BYTES + u8::BYTES);
        assert_eq!(f32::from_le_slice(&bytes[..4]), 1.25);
        assert_eq!(u8::from_le_slice(&bytes[4..]), 7);
    }

    #[test]
    fn test_coordinate_key_treats_signed_zero_as_equal() {
        assert_eq!(Feature::new(-0.0, 1.0).coordinate_key(), Feature::new(0.0, 1.0).coordinate_key());
        assert_ne!(Feature::new(1.0, 2.0).coordinate_key(), Feature::new(2.0, 1.0).coordinate_key());
    }

    #[test]
    fn test_collection_dimension_mismatch() {
        let result = ImageCollection::new(vec![image("a", 2, 4), image("b", 2, 8)]);
        assert!(matches!(
            result,
            Err(CollectionError::DimensionMismatch { expected: 4, actual: 8, .. })
        ));
    }

    #[test]
    fn test_collection_aggregates_load_failures() {
        let results = vec![
            Err(LoadFailure::new("a", "missing .feat")),
            Ok(image("b", 1, 4)),
            Err(LoadFailure::new("c", "missing .desc")),
        ];
        match ImageCollection::from_load_results(results) {
            Err(CollectionError::LoadFailure { failures }) => {
                let names: Vec<_> = failures.iter().map(|f| f.image.as_str()).collect();
                assert_eq!(names, vec!["a", "c"]);
            }
            other => panic!("expected LoadFailure, got {:?}", other.map(|c| c.len())),
        }
    }

    #[test]
    fn test_collection_indexing() {
        let collection = ImageCollection::new(vec![image("a", 2, 4), image("b", 0, 4)]).unwrap();
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.dimension(), 4);
        assert_eq!(collection[1].name(), "b");
        assert!(collection[1].is_empty());
        assert!(collection.get(2).is_none());
        assert_eq!(collection.image_ids(), 0..2);
    }

    #[test]
    fn test_table_orders_by_pair() {
        let mut table = PairwiseMatchTable::new();
        table.insert(PairKey::new(1, 2), vec![CandidateMatch::new(0, 0, 1.0)]);
        table.insert(PairKey::new(3, 0), vec![]);
        table.insert(PairKey::new(0, 1), vec![CandidateMatch::new(1, 1, 2.0); 2]);

        let keys: Vec<_> = table.keys().copied().collect();
        assert_eq!(keys, vec![PairKey::new(0, 1), PairKey::new(0, 3), PairKey::new(1, 2)]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.total_matches(), 3);
        assert_eq!(table.non_empty().count(), 2);
        assert_eq!(table.get(2, 1).map(<[_]>::len), Some(1));
        assert_eq!(PairKey::new(0, 3).span(), 3);
    }

    #[test]
    fn test_thread_pool() {
        let pool = build_thread_pool(2).unwrap();
        assert_eq!(pool.current_num_threads(), 2);
    }
}
