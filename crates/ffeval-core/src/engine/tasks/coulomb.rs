use super::pme::{PmeGrid, self_energy};
use super::{PeriodicInput, check_columns, check_particle_count, frame_box, map_conformers};
use crate::core::forcefield::potentials::{
    COULOMB_PRE_FACTOR, MIN_PAIR_DISTANCE, coulomb, ewald_excluded_pair, ewald_real_space,
};
use crate::core::models::conformer::Conformers;
use crate::core::utils::pairs::upper_tri_pairs;
use crate::engine::error::EnergyError;
use crate::engine::exclusions::{ExclusionScaleMap, PairScaleTable};
use crate::engine::neighbors::{
    check_exhaustive_overlaps, exhaustive_distances_sqr, periodic_box,
};
use nalgebra::DMatrix;
use tracing::{debug, trace};

pub const ELECTROSTATICS_TYPE: &str = "Electrostatics";
pub const COULOMB_POTENTIAL: &str = "coul";

/// Point-charge electrostatics over every unordered pair, no cutoff.
///
/// `parameters` holds one charge [e] per particle in its first column.
pub fn compute_coulomb_energy(
    conformers: &Conformers,
    parameters: &DMatrix<f64>,
    exclusions: &[[usize; 2]],
    exclusion_scales: &[f64],
) -> Result<Vec<f64>, EnergyError> {
    check_columns("charge columns", parameters, 1)?;
    let n_particles = check_particle_count(conformers, parameters)?;
    let scales = PairScaleTable::new(n_particles, exclusions, exclusion_scales)?;

    let charge_products: Vec<f64> = upper_tri_pairs(n_particles)
        .zip(scales.as_slice())
        .map(|((i, j), scale)| scale * parameters[(i, 0)] * parameters[(j, 0)])
        .collect();

    map_conformers(conformers, |_, frame| {
        let distances_sqr = exhaustive_distances_sqr(frame);
        check_exhaustive_overlaps(n_particles, &distances_sqr)?;
        Ok(distances_sqr
            .iter()
            .zip(&charge_products)
            .map(|(d2, qq)| COULOMB_PRE_FACTOR * qq / d2.sqrt())
            .sum())
    })
}

/// Electrostatics of a periodic system by Ewald summation.
///
/// The energy is the sum of
/// - the screened real-space sum over non-excluded neighbor pairs,
/// - the reciprocal-space sum from the configured solver, which includes all pairs,
/// - the self energy,
/// - the removal of the smooth part of each distinct excluded pair,
/// - `scale · k_e·qᵢqⱼ / r` for every broadcast exclusion.
///
/// Excluded-pair distances use the minimum image, so a molecule split across a box
/// face is corrected at its bonded geometry rather than its raw Cartesian separation.
/// The smooth part is removed once per distinct pair even when an exclusion is listed
/// more than once, matching the single reciprocal-space contribution of that pair.
pub fn compute_coulomb_energy_periodic(
    input: &PeriodicInput<'_>,
) -> Result<Vec<f64>, EnergyError> {
    let potential = input.potential;
    let parameters = input.parameters;
    let box_vectors = input.box_vectors()?;

    check_columns("charge columns", parameters, 1)?;
    let n_particles = check_particle_count(input.conformers, parameters)?;
    let cutoff = potential.require_attribute("cutoff")?;
    let charges: Vec<f64> = parameters.column(0).iter().copied().collect();

    let excluded = ExclusionScaleMap::new(
        n_particles,
        &input.exclusions.pairs,
        &input.exclusions.scales,
    )?;

    let search = input.config.neighbor_search();
    let solver = input.config.reciprocal_solver();

    map_conformers(input.conformers, |index, frame| {
        let box_matrix = frame_box(box_vectors, index)?;
        let pairs = search.search(frame, box_matrix, cutoff)?;
        pairs.check_overlaps()?;

        let periodic_box = periodic_box(box_matrix, cutoff)?;
        let grid = PmeGrid::new(box_matrix, cutoff, &input.config.pme);
        debug!(conformer = index, dims = ?grid.dims, alpha = grid.alpha, "PME grid.");

        let image_distance = |i: usize, j: usize| -> Result<f64, EnergyError> {
            let distance = periodic_box.minimum_image(&(frame[j] - frame[i])).norm();
            if !(distance >= MIN_PAIR_DISTANCE) {
                return Err(EnergyError::OverlappingParticles { i, j, distance });
            }
            Ok(distance)
        };

        let direct: f64 = pairs
            .iter()
            .filter(|&(i, j, _)| !excluded.contains(i, j))
            .map(|(i, j, r)| ewald_real_space(r, charges[i], charges[j], grid.alpha))
            .sum();

        let mut excluded_smooth = 0.0;
        for (i, j) in excluded.pairs() {
            let r = image_distance(i, j)?;
            excluded_smooth -= ewald_excluded_pair(r, charges[i], charges[j], grid.alpha);
        }

        let mut exclusion = 0.0;
        let broadcast = input.exclusions;
        for (&[i, j], &scale) in broadcast.pairs.iter().zip(&broadcast.scales) {
            let r = image_distance(i, j)?;
            exclusion += scale * coulomb(r, charges[i], charges[j]);
        }

        let reciprocal = solver.energy(frame, &charges, box_matrix, &grid)?;
        let self_term = self_energy(&charges, grid.alpha);

        trace!(
            conformer = index,
            direct,
            reciprocal,
            self_term,
            excluded_smooth,
            exclusion,
            "Ewald energy terms."
        );
        Ok(direct + reciprocal + self_term + excluded_smooth + exclusion)
    })
}
