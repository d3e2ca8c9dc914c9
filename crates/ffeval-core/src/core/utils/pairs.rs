use itertools::Itertools;

/// The number of unordered particle pairs, `C(n, 2)`.
#[inline]
pub fn n_pairs(n_particles: usize) -> usize {
    n_particles * n_particles.saturating_sub(1) / 2
}

/// Linear index of the pair `(i, j)`, `i < j`, in row-major upper-triangular order.
#[inline]
pub fn upper_tri_index(i: usize, j: usize, n_particles: usize) -> usize {
    debug_assert!(i < j && j < n_particles);
    i * (2 * n_particles - i - 1) / 2 + j - i - 1
}

#[inline]
pub fn canonical_pair(i: usize, j: usize) -> (usize, usize) {
    if i < j { (i, j) } else { (j, i) }
}

/// All pairs `(i, j)` with `i < j`, in the order matching [`upper_tri_index`].
pub fn upper_tri_pairs(n_particles: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..n_particles).tuple_combinations()
}
