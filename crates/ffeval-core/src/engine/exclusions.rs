use crate::core::utils::pairs::{canonical_pair, n_pairs, upper_tri_index};
use crate::engine::error::EnergyError;
use std::collections::BTreeMap;

fn check_exclusions(
    n_particles: usize,
    pairs: &[[usize; 2]],
    scales: &[f64],
) -> Result<(), EnergyError> {
    if pairs.len() != scales.len() {
        return Err(EnergyError::ExclusionScaleCount {
            n_exclusions: pairs.len(),
            n_scales: scales.len(),
        });
    }
    if let Some(&[i, j]) = pairs
        .iter()
        .find(|&&[i, j]| i == j || i >= n_particles || j >= n_particles)
    {
        return Err(EnergyError::InvalidExclusion { i, j, n_particles });
    }
    Ok(())
}

/// A scale factor for every unordered pair, stored at its upper-triangular index.
/// Pairs without an exclusion keep scale 1.
#[derive(Debug, Clone, PartialEq)]
pub struct PairScaleTable {
    n_particles: usize,
    scales: Vec<f64>,
}

impl PairScaleTable {
    pub fn new(
        n_particles: usize,
        pairs: &[[usize; 2]],
        scales: &[f64],
    ) -> Result<Self, EnergyError> {
        check_exclusions(n_particles, pairs, scales)?;

        let mut table = vec![1.0; n_pairs(n_particles)];
        for (&[i, j], &scale) in pairs.iter().zip(scales) {
            let (i, j) = canonical_pair(i, j);
            table[upper_tri_index(i, j, n_particles)] = scale;
        }
        Ok(Self {
            n_particles,
            scales: table,
        })
    }

    #[inline]
    pub fn scale(&self, i: usize, j: usize) -> f64 {
        let (i, j) = canonical_pair(i, j);
        self.scales[upper_tri_index(i, j, self.n_particles)]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.scales
    }
}

/// Scale factors of the excluded pairs only, keyed by canonical `(i, j)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExclusionScaleMap {
    scales: BTreeMap<(usize, usize), f64>,
}

impl ExclusionScaleMap {
    pub fn new(
        n_particles: usize,
        pairs: &[[usize; 2]],
        scales: &[f64],
    ) -> Result<Self, EnergyError> {
        check_exclusions(n_particles, pairs, scales)?;

        let scales = pairs
            .iter()
            .zip(scales)
            .map(|(&[i, j], &scale)| (canonical_pair(i, j), scale))
            .collect();
        Ok(Self { scales })
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.scales.get(&canonical_pair(i, j)).copied()
    }

    #[inline]
    pub fn scale(&self, i: usize, j: usize) -> f64 {
        self.get(i, j).unwrap_or(1.0)
    }

    #[inline]
    pub fn contains(&self, i: usize, j: usize) -> bool {
        self.scales.contains_key(&canonical_pair(i, j))
    }

    /// The number of distinct excluded pairs.
    #[inline]
    pub fn len(&self) -> usize {
        self.scales.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }

    /// Distinct excluded pairs in ascending `(i, j)` order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.scales.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_table_defaults_to_one_and_overwrites_exclusions() {
        let table = PairScaleTable::new(4, &[[0, 1], [3, 2]], &[0.0, 0.5]).unwrap();
        assert_eq!(table.as_slice().len(), 6);
        assert_eq!(table.scale(0, 1), 0.0);
        assert_eq!(table.scale(2, 3), 0.5);
        assert_eq!(table.scale(1, 3), 1.0);
        assert_eq!(table.as_slice(), &[0.0, 1.0, 1.0, 1.0, 1.0, 0.5]);
    }

    #[test]
    fn duplicate_exclusions_keep_last_write() {
        let pairs = [[0, 2], [2, 0]];
        let table = PairScaleTable::new(3, &pairs, &[0.1, 0.7]).unwrap();
        assert_eq!(table.scale(0, 2), 0.7);
        let map = ExclusionScaleMap::new(3, &pairs, &[0.1, 0.7]).unwrap();
        assert_eq!(map.scale(2, 0), 0.7);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn pairs_iterate_in_canonical_order_regardless_of_input_order() {
        let map = ExclusionScaleMap::new(6, &[[5, 4], [2, 0], [3, 1], [0, 1]], &[0.5; 4]).unwrap();
        assert_eq!(
            map.pairs().collect::<Vec<_>>(),
            vec![(0, 1), (0, 2), (1, 3), (4, 5)]
        );
    }

    #[test]
    fn scales_above_one_are_kept_unclamped() {
        let table = PairScaleTable::new(2, &[[0, 1]], &[1.5]).unwrap();
        assert_eq!(table.scale(0, 1), 1.5);
    }

    #[test]
    fn sparse_map_matches_dense_table() {
        let pairs = [[0, 3], [1, 2], [4, 1]];
        let scales = [0.0, 0.5, 0.8333];
        let table = PairScaleTable::new(5, &pairs, &scales).unwrap();
        let map = ExclusionScaleMap::new(5, &pairs, &scales).unwrap();
        for i in 0..5 {
            for j in (i + 1)..5 {
                assert_eq!(table.scale(i, j), map.scale(i, j));
            }
        }
        assert!(map.contains(1, 4));
        assert!(!map.contains(0, 1));
        assert_eq!(map.pairs().collect::<Vec<_>>(), vec![(0, 3), (1, 2), (1, 4)]);
    }

    #[test]
    fn rejects_self_and_out_of_range_pairs() {
        assert_eq!(
            PairScaleTable::new(3, &[[1, 1]], &[0.0]),
            Err(EnergyError::InvalidExclusion {
                i: 1,
                j: 1,
                n_particles: 3
            })
        );
        assert!(matches!(
            ExclusionScaleMap::new(3, &[[0, 3]], &[0.0]),
            Err(EnergyError::InvalidExclusion { .. })
        ));
    }

    #[test]
    fn rejects_mismatched_scale_count() {
        let result = ExclusionScaleMap::new(3, &[[0, 1]], &[]);
        assert_eq!(
            result,
            Err(EnergyError::ExclusionScaleCount {
                n_exclusions: 1,
                n_scales: 0
            })
        );
    }
}
