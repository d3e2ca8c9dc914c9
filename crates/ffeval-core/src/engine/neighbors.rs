use crate::core::forcefield::potentials::MIN_PAIR_DISTANCE;
use crate::core::utils::geometry::PeriodicBox;
use crate::core::utils::pairs::{n_pairs, upper_tri_pairs};
use crate::engine::error::EnergyError;
use nalgebra::{Matrix3, Point3};
use tracing::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Interacting pairs `i < j` in ascending order, with their minimum-image distances.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PairList {
    pub pairs: Vec<[usize; 2]>,
    pub distances: Vec<f64>,
}

impl PairList {
    fn from_candidates(mut candidates: Vec<([usize; 2], f64)>) -> Self {
        candidates.retain(|(_, distance)| distance.is_finite());
        candidates.sort_unstable_by_key(|(pair, _)| *pair);
        let (pairs, distances) = candidates.into_iter().unzip();
        Self { pairs, distances }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.pairs
            .iter()
            .zip(&self.distances)
            .map(|(&[i, j], &distance)| (i, j, distance))
    }

    /// Fails on the first pair closer than [`MIN_PAIR_DISTANCE`].
    pub fn check_overlaps(&self) -> Result<(), EnergyError> {
        match self.iter().find(|&(_, _, distance)| distance < MIN_PAIR_DISTANCE) {
            Some((i, j, distance)) => Err(EnergyError::OverlappingParticles { i, j, distance }),
            None => Ok(()),
        }
    }
}

/// Finds every pair whose minimum-image distance is below a cutoff.
pub trait NeighborSearch: Send + Sync {
    fn search(
        &self,
        positions: &[Point3<f64>],
        box_vectors: &Matrix3<f64>,
        cutoff: f64,
    ) -> Result<PairList, EnergyError>;
}

/// Validates the box and cutoff shared by every periodic search.
pub fn periodic_box(
    box_vectors: &Matrix3<f64>,
    cutoff: f64,
) -> Result<PeriodicBox, EnergyError> {
    if !(cutoff.is_finite() && cutoff > 0.0) {
        return Err(EnergyError::InvalidCutoff(cutoff));
    }
    let periodic_box = PeriodicBox::new(*box_vectors).ok_or(EnergyError::DegenerateBox)?;
    let max_cutoff = 0.5
        * periodic_box
            .perpendicular_widths()
            .into_iter()
            .fold(f64::INFINITY, f64::min);
    if cutoff > max_cutoff {
        return Err(EnergyError::CutoffTooLarge { cutoff, max_cutoff });
    }
    Ok(periodic_box)
}

/// O(N²) reference search over every unordered pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceSearch;

impl NeighborSearch for BruteForceSearch {
    fn search(
        &self,
        positions: &[Point3<f64>],
        box_vectors: &Matrix3<f64>,
        cutoff: f64,
    ) -> Result<PairList, EnergyError> {
        let periodic_box = periodic_box(box_vectors, cutoff)?;
        let candidates = upper_tri_pairs(positions.len())
            .filter_map(|(i, j)| {
                let distance = periodic_box
                    .minimum_image(&(positions[j] - positions[i]))
                    .norm();
                (distance < cutoff).then_some(([i, j], distance))
            })
            .collect();
        Ok(PairList::from_candidates(candidates))
    }
}

/// Linked-cell search in fractional coordinates. Cells are at least one cutoff wide
/// along every reciprocal direction, so only the 27 surrounding cells are visited.
#[derive(Debug, Clone, Copy, Default)]
pub struct CellListSearch;

struct CellGrid {
    n_cells: [usize; 3],
    cell_start: Vec<usize>,
    cell_count: Vec<usize>,
    sorted_indices: Vec<usize>,
    particle_cells: Vec<[usize; 3]>,
}

impl CellGrid {
    fn build(
        positions: &[Point3<f64>],
        periodic_box: &PeriodicBox,
        n_cells: [usize; 3],
    ) -> Self {
        let particle_cells: Vec<[usize; 3]> = positions
            .iter()
            .map(|position| {
                let s = periodic_box.wrapped_fractional(position);
                [0, 1, 2].map(|d| ((s[d] * n_cells[d] as f64) as usize).min(n_cells[d] - 1))
            })
            .collect();

        let n_total = n_cells[0] * n_cells[1] * n_cells[2];
        let cell_ids: Vec<usize> = particle_cells
            .iter()
            .map(|&cell| Self::flat(cell, n_cells))
            .collect();

        let mut sorted_indices: Vec<usize> = (0..positions.len()).collect();
        sorted_indices.sort_by_key(|&i| cell_ids[i]);

        let mut cell_count = vec![0usize; n_total];
        for &id in &cell_ids {
            cell_count[id] += 1;
        }
        let mut cell_start = vec![0usize; n_total];
        let mut offset = 0;
        for (start, count) in cell_start.iter_mut().zip(&cell_count) {
            *start = offset;
            offset += count;
        }

        Self {
            n_cells,
            cell_start,
            cell_count,
            sorted_indices,
            particle_cells,
        }
    }

    #[inline]
    fn flat(cell: [usize; 3], n_cells: [usize; 3]) -> usize {
        cell[0] + cell[1] * n_cells[0] + cell[2] * n_cells[0] * n_cells[1]
    }

    fn members(&self, cell: usize) -> &[usize] {
        let start = self.cell_start[cell];
        &self.sorted_indices[start..start + self.cell_count[cell]]
    }

    /// The 27 cells around `cell`, with periodic wrap-around. Distinct when every axis
    /// has at least 3 cells.
    fn stencil(&self, cell: [usize; 3]) -> impl Iterator<Item = usize> + '_ {
        let n = self.n_cells;
        (0..27).map(move |k| {
            let offset = [k % 3, (k / 3) % 3, k / 9];
            let neighbor = [0, 1, 2].map(|d| (cell[d] + n[d] + offset[d] - 1) % n[d]);
            Self::flat(neighbor, n)
        })
    }
}

impl NeighborSearch for CellListSearch {
    fn search(
        &self,
        positions: &[Point3<f64>],
        box_vectors: &Matrix3<f64>,
        cutoff: f64,
    ) -> Result<PairList, EnergyError> {
        let periodic_box = periodic_box(box_vectors, cutoff)?;
        let n_cells = periodic_box
            .perpendicular_widths()
            .map(|width| (width / cutoff).floor() as usize);

        if n_cells.iter().any(|&n| n < 3) {
            warn!(
                ?n_cells,
                cutoff, "Box too small for a 3x3x3 cell stencil, using brute-force search."
            );
            return BruteForceSearch.search(positions, box_vectors, cutoff);
        }

        let grid = CellGrid::build(positions, &periodic_box, n_cells);

        #[cfg(not(feature = "parallel"))]
        let iterator = 0..positions.len();

        #[cfg(feature = "parallel")]
        let iterator = (0..positions.len()).into_par_iter();

        let candidates: Vec<([usize; 2], f64)> = iterator
            .map(|i| {
                let mut found = Vec::new();
                for cell in grid.stencil(grid.particle_cells[i]) {
                    for &j in grid.members(cell).iter().filter(|&&j| j > i) {
                        let distance = periodic_box
                            .minimum_image(&(positions[j] - positions[i]))
                            .norm();
                        if distance < cutoff {
                            found.push(([i, j], distance));
                        }
                    }
                }
                found
            })
            .flatten()
            .collect();

        debug!(
            n_particles = positions.len(),
            n_pairs = candidates.len(),
            ?n_cells,
            "Cell-list neighbor search complete."
        );
        Ok(PairList::from_candidates(candidates))
    }
}

/// Squared distances of every unordered pair, in upper-triangular order. No cutoff and
/// no periodicity.
pub fn exhaustive_distances_sqr(positions: &[Point3<f64>]) -> Vec<f64> {
    let mut distances = Vec::with_capacity(n_pairs(positions.len()));
    distances.extend(
        upper_tri_pairs(positions.len())
            .map(|(i, j)| (positions[j] - positions[i]).norm_squared()),
    );
    distances
}

/// Fails on the first pair of [`exhaustive_distances_sqr`] closer than
/// [`MIN_PAIR_DISTANCE`].
pub fn check_exhaustive_overlaps(
    n_particles: usize,
    distances_sqr: &[f64],
) -> Result<(), EnergyError> {
    let min_sqr = MIN_PAIR_DISTANCE * MIN_PAIR_DISTANCE;
    match upper_tri_pairs(n_particles)
        .zip(distances_sqr)
        .find(|&(_, &d2)| !(d2 >= min_sqr))
    {
        Some(((i, j), &d2)) => Err(EnergyError::OverlappingParticles {
            i,
            j,
            distance: d2.sqrt(),
        }),
        None => Ok(()),
    }
}
