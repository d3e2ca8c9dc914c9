use super::{check_columns, map_conformers};
use crate::core::forcefield::potentials::{MIN_PAIR_DISTANCE, harmonic, periodic_torsion};
use crate::core::models::conformer::Conformers;
use crate::core::utils::geometry::{bond_angle, dihedral_angle};
use crate::engine::error::EnergyError;
use nalgebra::{DMatrix, Point3};

pub const BONDS_TYPE: &str = "Bonds";
pub const ANGLES_TYPE: &str = "Angles";
pub const PROPER_TORSIONS_TYPE: &str = "ProperTorsions";
pub const IMPROPER_TORSIONS_TYPE: &str = "ImproperTorsions";

pub const HARMONIC_BOND_POTENTIAL: &str = "k/2*(r-length)**2";
pub const HARMONIC_ANGLE_POTENTIAL: &str = "k/2*(theta-angle)**2";
pub const PERIODIC_TORSION_POTENTIAL: &str = "k*(1+cos(periodicity*theta-phase))";

fn check_terms(
    conformers: &Conformers,
    particle_idxs: &[Vec<usize>],
    parameters: &DMatrix<f64>,
    tuple_len: usize,
    n_cols: usize,
) -> Result<(), EnergyError> {
    check_columns("valence parameter columns", parameters, n_cols)?;
    if parameters.nrows() != particle_idxs.len() {
        return Err(EnergyError::ShapeMismatch {
            what: "valence parameter rows",
            expected: particle_idxs.len(),
            found: parameters.nrows(),
        });
    }
    let n_particles = conformers.n_particles();
    for idxs in particle_idxs {
        if idxs.len() != tuple_len {
            return Err(EnergyError::ShapeMismatch {
                what: "valence particle tuple length",
                expected: tuple_len,
                found: idxs.len(),
            });
        }
        if let Some(&idx) = idxs.iter().find(|&&idx| idx >= n_particles) {
            return Err(EnergyError::ParticleCountMismatch {
                expected: idx + 1,
                found: n_particles,
            });
        }
    }
    Ok(())
}

/// Angles are undefined when consecutive particles coincide.
fn check_chain(frame: &[Point3<f64>], idxs: &[usize]) -> Result<(), EnergyError> {
    for pair in idxs.windows(2) {
        let distance = (frame[pair[1]] - frame[pair[0]]).norm();
        if !(distance >= MIN_PAIR_DISTANCE) {
            return Err(EnergyError::OverlappingParticles {
                i: pair[0],
                j: pair[1],
                distance,
            });
        }
    }
    Ok(())
}

/// Harmonic bonds; parameter columns `k` [kcal/mol/Å²] and `length` [Å].
pub fn compute_harmonic_bond_energy(
    conformers: &Conformers,
    particle_idxs: &[Vec<usize>],
    parameters: &DMatrix<f64>,
) -> Result<Vec<f64>, EnergyError> {
    check_terms(conformers, particle_idxs, parameters, 2, 2)?;
    map_conformers(conformers, |_, frame| {
        Ok(particle_idxs
            .iter()
            .enumerate()
            .map(|(row, idxs)| {
                let r = (frame[idxs[1]] - frame[idxs[0]]).norm();
                harmonic(r, parameters[(row, 0)], parameters[(row, 1)])
            })
            .sum())
    })
}

/// Harmonic angles; parameter columns `k` [kcal/mol/rad²] and `angle` [rad].
pub fn compute_harmonic_angle_energy(
    conformers: &Conformers,
    particle_idxs: &[Vec<usize>],
    parameters: &DMatrix<f64>,
) -> Result<Vec<f64>, EnergyError> {
    check_terms(conformers, particle_idxs, parameters, 3, 2)?;
    map_conformers(conformers, |_, frame| {
        let mut energy = 0.0;
        for (row, idxs) in particle_idxs.iter().enumerate() {
            check_chain(frame, idxs)?;
            let theta = bond_angle(&frame[idxs[0]], &frame[idxs[1]], &frame[idxs[2]]);
            energy += harmonic(theta, parameters[(row, 0)], parameters[(row, 1)]);
        }
        Ok(energy)
    })
}

/// Periodic torsions, proper or improper; parameter columns `k` [kcal/mol],
/// `periodicity`, `phase` [rad] and `idivf`.
pub fn compute_periodic_torsion_energy(
    conformers: &Conformers,
    particle_idxs: &[Vec<usize>],
    parameters: &DMatrix<f64>,
) -> Result<Vec<f64>, EnergyError> {
    check_terms(conformers, particle_idxs, parameters, 4, 4)?;
    map_conformers(conformers, |_, frame| {
        let mut energy = 0.0;
        for (row, idxs) in particle_idxs.iter().enumerate() {
            check_chain(frame, idxs)?;
            let phi = dihedral_angle(
                &frame[idxs[0]],
                &frame[idxs[1]],
                &frame[idxs[2]],
                &frame[idxs[3]],
            );
            energy += periodic_torsion(
                phi,
                parameters[(row, 0)],
                parameters[(row, 1)],
                parameters[(row, 2)],
                parameters[(row, 3)],
            );
        }
        Ok(energy)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tasks::test_support::{TOLERANCE, conformers, f64_approx_equal};
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn stretched_bond_energy_is_half_k_delta_squared() {
        let batch = conformers(vec![
            vec![[0.0, 0.0, 0.0], [1.5, 0.0, 0.0]],
            vec![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        ]);
        let parameters = DMatrix::from_row_slice(1, 2, &[400.0, 1.0]);
        let energy = compute_harmonic_bond_energy(&batch, &[vec![0, 1]], &parameters).unwrap();
        assert!(f64_approx_equal(energy[0], 50.0, TOLERANCE));
        assert!(f64_approx_equal(energy[1], 0.0, TOLERANCE));
    }

    #[test]
    fn angle_energy_uses_radians() {
        let batch = conformers(vec![vec![[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 2.0, 0.0]]]);
        let parameters = DMatrix::from_row_slice(1, 2, &[100.0, FRAC_PI_2 - 0.1]);
        let energy = compute_harmonic_angle_energy(&batch, &[vec![0, 1, 2]], &parameters).unwrap();
        assert!(f64_approx_equal(energy[0], 0.5, TOLERANCE));
    }

    #[test]
    fn torsion_energy_divides_by_idivf() {
        let batch = conformers(vec![vec![
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, -1.0, 0.0],
        ]]);
        let parameters = DMatrix::from_row_slice(2, 4, &[2.0, 1.0, 0.0, 1.0, 2.0, 2.0, PI, 2.0]);
        let idxs = vec![vec![0, 1, 2, 3], vec![0, 1, 2, 3]];
        let energy = compute_periodic_torsion_energy(&batch, &idxs, &parameters).unwrap();
        // phi = pi: 2·(1 + cos(pi)) = 0 and 2/2·(1 + cos(2pi - pi)) = 0.
        assert!(f64_approx_equal(energy[0], 0.0, TOLERANCE));
    }

    #[test]
    fn cis_torsion_energy_is_maximal_for_zero_phase() {
        let batch = conformers(vec![vec![
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
        ]]);
        let parameters = DMatrix::from_row_slice(1, 4, &[1.5, 3.0, 0.0, 1.0]);
        let energy =
            compute_periodic_torsion_energy(&batch, &[vec![0, 1, 2, 3]], &parameters).unwrap();
        assert!(f64_approx_equal(energy[0], 3.0, TOLERANCE));
    }

    #[test]
    fn wrong_tuple_length_is_rejected() {
        let batch = conformers(vec![vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]]);
        let parameters = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        let result = compute_harmonic_angle_energy(&batch, &[vec![0, 1]], &parameters);
        assert!(matches!(result, Err(EnergyError::ShapeMismatch { .. })));
    }

    #[test]
    fn out_of_range_particle_is_rejected() {
        let batch = conformers(vec![vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]]);
        let parameters = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        let result = compute_harmonic_bond_energy(&batch, &[vec![0, 5]], &parameters);
        assert!(matches!(
            result,
            Err(EnergyError::ParticleCountMismatch { .. })
        ));
    }

    #[test]
    fn coincident_angle_particles_fail_explicitly() {
        let batch = conformers(vec![vec![[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]]);
        let parameters = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        let result = compute_harmonic_angle_energy(&batch, &[vec![0, 1, 2]], &parameters);
        assert!(matches!(
            result,
            Err(EnergyError::OverlappingParticles { i: 0, j: 1, .. })
        ));
    }
}
