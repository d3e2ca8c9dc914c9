use super::dispersion::dispersion_coefficient;
use super::{PeriodicInput, check_columns, check_particle_count, frame_box, map_conformers};
use crate::core::forcefield::potentials::{
    lennard_jones_12_6, lorentz_berthelot, switching_function,
};
use crate::core::models::conformer::Conformers;
use crate::core::models::potential::Potential;
use crate::core::utils::pairs::upper_tri_pairs;
use crate::engine::error::EnergyError;
use crate::engine::exclusions::{ExclusionScaleMap, PairScaleTable};
use crate::engine::neighbors::{check_exhaustive_overlaps, exhaustive_distances_sqr};
use nalgebra::DMatrix;
use tracing::trace;

pub const VDW_TYPE: &str = "vdW";
pub const LJ_POTENTIAL: &str = "4*epsilon*((sigma/r)**12-(sigma/r)**6)";

#[inline]
fn combined(parameters: &DMatrix<f64>, i: usize, j: usize) -> (f64, f64) {
    lorentz_berthelot(
        parameters[(i, 0)],
        parameters[(j, 0)],
        parameters[(i, 1)],
        parameters[(j, 1)],
    )
}

/// The switch distance `cutoff − switch_width`, or `None` when the potential has no
/// `switch_width` attribute.
pub fn switch_distance(potential: &Potential, cutoff: f64) -> Result<Option<f64>, EnergyError> {
    let Some(switch_width) = potential.attribute("switch_width") else {
        return Ok(None);
    };
    if !(switch_width >= 0.0 && switch_width < cutoff) {
        return Err(EnergyError::InvalidSwitchWidth {
            switch_width,
            cutoff,
        });
    }
    Ok(Some(cutoff - switch_width))
}

/// 12-6 Lennard-Jones over every unordered pair, no cutoff.
///
/// `parameters` holds `epsilon` [kcal/mol] and `sigma` [Å] per particle.
pub fn compute_lj_energy(
    conformers: &Conformers,
    parameters: &DMatrix<f64>,
    exclusions: &[[usize; 2]],
    exclusion_scales: &[f64],
) -> Result<Vec<f64>, EnergyError> {
    check_columns("epsilon/sigma columns", parameters, 2)?;
    let n_particles = check_particle_count(conformers, parameters)?;
    let scales = PairScaleTable::new(n_particles, exclusions, exclusion_scales)?;

    let pair_parameters: Vec<(f64, f64, f64)> = upper_tri_pairs(n_particles)
        .zip(scales.as_slice())
        .map(|((i, j), &scale)| {
            let (epsilon, sigma) = combined(parameters, i, j);
            (scale, epsilon, sigma)
        })
        .collect();

    map_conformers(conformers, |_, frame| {
        let distances_sqr = exhaustive_distances_sqr(frame);
        check_exhaustive_overlaps(n_particles, &distances_sqr)?;
        Ok(distances_sqr
            .iter()
            .zip(&pair_parameters)
            .map(|(&d2, &(scale, epsilon, sigma))| scale * lennard_jones_12_6(d2, epsilon, sigma))
            .sum())
    })
}

/// Cutoff Lennard-Jones of a periodic system plus the long-range dispersion correction.
///
/// Pairs between the switch distance and the cutoff are tapered by the quintic switch
/// when the potential has a `switch_width` attribute.
pub fn compute_lj_energy_periodic(
    input: &PeriodicInput<'_>,
) -> Result<Vec<f64>, EnergyError> {
    let potential = input.potential;
    let parameters = input.parameters;
    let box_vectors = input.box_vectors()?;

    check_columns("epsilon/sigma columns", parameters, 2)?;
    let n_particles = check_particle_count(input.conformers, parameters)?;
    let cutoff = potential.require_attribute("cutoff")?;
    let switch_distance = switch_distance(potential, cutoff)?;

    let scales = ExclusionScaleMap::new(
        n_particles,
        &input.exclusions.pairs,
        &input.exclusions.scales,
    )?;
    let coefficient = dispersion_coefficient(input.system, potential, cutoff, switch_distance)?;
    let search = input.config.neighbor_search();

    map_conformers(input.conformers, |index, frame| {
        let box_matrix = frame_box(box_vectors, index)?;
        let pairs = search.search(frame, box_matrix, cutoff)?;
        pairs.check_overlaps()?;

        let pair_energy: f64 = pairs
            .iter()
            .map(|(i, j, r)| {
                let (epsilon, sigma) = combined(parameters, i, j);
                let switch = switch_distance.map_or(1.0, |rs| switching_function(r, rs, cutoff));
                switch * scales.scale(i, j) * lennard_jones_12_6(r * r, epsilon, sigma)
            })
            .sum();
        let correction = coefficient / box_matrix.determinant();

        trace!(
            conformer = index,
            n_pairs = pairs.len(),
            pair_energy,
            correction,
            "Periodic LJ energy terms."
        );
        Ok(pair_energy + correction)
    })
}
