//! Energy kernels.
//!
//! Each kernel maps a conformer batch and already-broadcast parameters to one energy
//! per conformer. Direct kernels sum over every unordered pair without a cutoff; the
//! periodic kernels take a [`PeriodicInput`] and evaluate pairs found by the configured
//! neighbor search. Conformers are evaluated independently and, with the `parallel`
//! feature, concurrently.

use crate::core::models::conformer::Conformers;
use crate::core::models::potential::Potential;
use crate::core::models::system::{BoxVectors, System};
use crate::engine::broadcast::BroadcastExclusions;
use crate::engine::config::EvaluationConfig;
use crate::engine::error::EnergyError;
use nalgebra::{DMatrix, Matrix3, Point3};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub mod coulomb;
pub mod dispersion;
pub mod lennard_jones;
pub mod pme;
pub mod valence;

/// Everything a periodic non-bonded kernel needs for one potential.
#[derive(Debug, Clone, Copy)]
pub struct PeriodicInput<'a> {
    pub system: &'a System,
    pub potential: &'a Potential,
    /// Broadcast parameters, one row per system particle.
    pub parameters: &'a DMatrix<f64>,
    pub exclusions: &'a BroadcastExclusions,
    pub conformers: &'a Conformers,
    pub config: &'a EvaluationConfig,
}

impl<'a> PeriodicInput<'a> {
    /// The box vectors of the system, checked against the batch size.
    pub fn box_vectors(&self) -> Result<&'a BoxVectors, EnergyError> {
        let box_vectors = self
            .system
            .box_vectors()
            .ok_or(EnergyError::NonPeriodicSystem)?;
        if let Some(n_boxes) = box_vectors.n_frames() {
            if n_boxes != self.conformers.n_conformers() {
                return Err(EnergyError::BoxCountMismatch {
                    n_boxes,
                    n_conformers: self.conformers.n_conformers(),
                });
            }
        }
        Ok(box_vectors)
    }
}

pub(crate) fn frame_box<'a>(
    box_vectors: &'a BoxVectors,
    index: usize,
) -> Result<&'a Matrix3<f64>, EnergyError> {
    box_vectors
        .for_conformer(index)
        .ok_or(EnergyError::BoxCountMismatch {
            n_boxes: box_vectors.n_frames().unwrap_or(1),
            n_conformers: index + 1,
        })
}

/// Checks that there is one parameter row per particle and returns the particle count.
pub(crate) fn check_particle_count(
    conformers: &Conformers,
    parameters: &DMatrix<f64>,
) -> Result<usize, EnergyError> {
    if parameters.nrows() != conformers.n_particles() {
        return Err(EnergyError::ParticleCountMismatch {
            expected: parameters.nrows(),
            found: conformers.n_particles(),
        });
    }
    Ok(parameters.nrows())
}

pub(crate) fn check_columns(
    what: &'static str,
    parameters: &DMatrix<f64>,
    expected: usize,
) -> Result<(), EnergyError> {
    if parameters.ncols() < expected {
        return Err(EnergyError::ShapeMismatch {
            what,
            expected,
            found: parameters.ncols(),
        });
    }
    Ok(())
}

/// Evaluates `energy_fn(index, frame)` for every conformer in the batch.
pub(crate) fn map_conformers<F>(
    conformers: &Conformers,
    energy_fn: F,
) -> Result<Vec<f64>, EnergyError>
where
    F: Fn(usize, &[Point3<f64>]) -> Result<f64, EnergyError> + Send + Sync,
{
    #[cfg(not(feature = "parallel"))]
    let iterator = conformers.frames().iter().enumerate();

    #[cfg(feature = "parallel")]
    let iterator = conformers.frames().par_iter().enumerate();

    iterator
        .map(|(index, frame)| energy_fn(index, frame.as_slice()))
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::core::models::conformer::Conformers;
    use nalgebra::Point3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    pub const TOLERANCE: f64 = 1e-9;

    pub fn f64_approx_equal(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() <= tolerance * a.abs().max(b.abs()).max(1.0)
    }

    pub fn conformers(frames: Vec<Vec<[f64; 3]>>) -> Conformers {
        Conformers::from_arrays(&frames).unwrap()
    }

    /// Points inside a cube of side `length`, at least `min_distance` apart.
    pub fn random_cluster(
        seed: u64,
        n: usize,
        length: f64,
        min_distance: f64,
    ) -> Vec<Point3<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut points: Vec<Point3<f64>> = Vec::with_capacity(n);
        while points.len() < n {
            let candidate = Point3::new(
                rng.gen_range(0.0..length),
                rng.gen_range(0.0..length),
                rng.gen_range(0.0..length),
            );
            if points
                .iter()
                .all(|p| (p - candidate).norm() >= min_distance)
            {
                points.push(candidate);
            }
        }
        points
    }
}
