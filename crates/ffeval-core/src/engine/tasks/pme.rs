use crate::core::forcefield::potentials::COULOMB_PRE_FACTOR;
use crate::core::utils::geometry::PeriodicBox;
use crate::engine::config::PmeConfig;
use crate::engine::error::EnergyError;
use nalgebra::{Matrix3, Point3, Vector3};
use rustfft::{FftPlanner, num_complex::Complex};
use std::f64::consts::PI;

/// B-spline moduli below this are replaced by the mean of their neighbors.
const MIN_BSPLINE_MODULUS: f64 = 1e-7;

/// Ewald splitting parameter and reciprocal-space mesh size for one box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PmeGrid {
    pub dims: [usize; 3],
    pub alpha: f64,
}

impl PmeGrid {
    /// `alpha = sqrt(-ln(2·tol)) / cutoff`; each axis gets
    /// `max(ceil(2·alpha / (3·tol^(1/5)) · L), min_grid_nodes)` nodes, with `L` the
    /// diagonal element of the box matrix along that axis.
    pub fn new(box_vectors: &Matrix3<f64>, cutoff: f64, config: &PmeConfig) -> Self {
        let tolerance = config.error_tolerance;
        let alpha = (-(2.0 * tolerance).ln()).sqrt() / cutoff;
        let factor = 2.0 * alpha / (3.0 * tolerance.powf(0.2));
        let dims = [0, 1, 2].map(|d| {
            ((factor * box_vectors[(d, d)]).ceil() as usize).max(config.min_grid_nodes)
        });
        Self { dims, alpha }
    }
}

/// Interaction of every Gaussian screening charge with itself, removed once per
/// evaluation.
pub fn self_energy(charges: &[f64], alpha: f64) -> f64 {
    let sum_sqr: f64 = charges.iter().map(|q| q * q).sum();
    -COULOMB_PRE_FACTOR * alpha / PI.sqrt() * sum_sqr
}

/// The reciprocal-space part of an Ewald sum. Implementations must include every pair,
/// excluded or not, and every periodic image.
pub trait ReciprocalSolver: Send + Sync {
    fn energy(
        &self,
        positions: &[Point3<f64>],
        charges: &[f64],
        box_vectors: &Matrix3<f64>,
        grid: &PmeGrid,
    ) -> Result<f64, EnergyError>;
}

/// Smooth particle-mesh Ewald with cardinal B-spline interpolation of the given order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothPme {
    pub order: usize,
}

/// Direct summation over all wave vectors with `|m_d| <= k_max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EwaldSum {
    pub k_max: usize,
}

/// Cardinal B-spline weights of the `order` grid points starting at the node below a
/// particle, for a particle `fraction` of a grid spacing above that node.
pub fn bspline_weights(fraction: f64, order: usize) -> Vec<f64> {
    debug_assert!(order >= 3);
    let mut data = vec![0.0; order];
    data[1] = fraction;
    data[0] = 1.0 - fraction;

    for j in 3..=order {
        let div = 1.0 / (j - 1) as f64;
        data[j - 1] = div * fraction * data[j - 2];
        for k in 1..(j - 1) {
            data[j - k - 1] = div
                * ((fraction + k as f64) * data[j - k - 2]
                    + ((j - k) as f64 - fraction) * data[j - k - 1]);
        }
        data[0] *= div * (1.0 - fraction);
    }
    data
}

/// `|b(m)|⁻¹` factors of the smooth PME structure factor, as squared moduli of the
/// discrete Fourier transform of the B-spline sampled at the grid nodes.
pub fn bspline_moduli(n: usize, order: usize) -> Vec<f64> {
    let weights = bspline_weights(0.0, order);
    let mut moduli: Vec<f64> = (0..n)
        .map(|m| {
            let (re, im) = weights
                .iter()
                .enumerate()
                .fold((0.0, 0.0), |(re, im), (k, w)| {
                    let arg = 2.0 * PI * ((m * k) % n) as f64 / n as f64;
                    (re + w * arg.cos(), im + w * arg.sin())
                });
            re * re + im * im
        })
        .collect();

    for m in 0..n {
        if moduli[m] < MIN_BSPLINE_MODULUS {
            moduli[m] = 0.5 * (moduli[(m + n - 1) % n] + moduli[(m + 1) % n]);
        }
    }
    moduli
}

#[inline]
fn wave_number(k: usize, n: usize) -> f64 {
    if k < n.div_ceil(2) {
        k as f64
    } else {
        k as f64 - n as f64
    }
}

#[inline]
fn mesh_index(x: usize, y: usize, z: usize, dims: [usize; 3]) -> usize {
    (x * dims[1] + y) * dims[2] + z
}

/// In-place forward 3-D transform, one axis at a time.
fn fft_3d(mesh: &mut [Complex<f64>], dims: [usize; 3]) {
    let [nx, ny, nz] = dims;
    let mut planner = FftPlanner::<f64>::new();

    planner.plan_fft_forward(nz).process(mesh);

    let fft_y = planner.plan_fft_forward(ny);
    let mut line = vec![Complex::new(0.0, 0.0); ny];
    for x in 0..nx {
        for z in 0..nz {
            for (y, value) in line.iter_mut().enumerate() {
                *value = mesh[mesh_index(x, y, z, dims)];
            }
            fft_y.process(&mut line);
            for (y, value) in line.iter().enumerate() {
                mesh[mesh_index(x, y, z, dims)] = *value;
            }
        }
    }

    let fft_x = planner.plan_fft_forward(nx);
    let mut line = vec![Complex::new(0.0, 0.0); nx];
    for y in 0..ny {
        for z in 0..nz {
            for (x, value) in line.iter_mut().enumerate() {
                *value = mesh[mesh_index(x, y, z, dims)];
            }
            fft_x.process(&mut line);
            for (x, value) in line.iter().enumerate() {
                mesh[mesh_index(x, y, z, dims)] = *value;
            }
        }
    }
}

impl SmoothPme {
    fn spread_charges(
        &self,
        positions: &[Point3<f64>],
        charges: &[f64],
        periodic_box: &PeriodicBox,
        dims: [usize; 3],
    ) -> Vec<Complex<f64>> {
        let mut mesh = vec![Complex::new(0.0, 0.0); dims[0] * dims[1] * dims[2]];

        for (position, &charge) in positions.iter().zip(charges) {
            if charge == 0.0 {
                continue;
            }
            let s = periodic_box.wrapped_fractional(position);
            let mut base = [0usize; 3];
            let weights = [0, 1, 2].map(|d| {
                let t = s[d] * dims[d] as f64;
                base[d] = (t.floor() as usize).min(dims[d] - 1);
                bspline_weights(t - base[d] as f64, self.order)
            });

            for (ix, wx) in weights[0].iter().enumerate() {
                let x = (base[0] + ix) % dims[0];
                for (iy, wy) in weights[1].iter().enumerate() {
                    let y = (base[1] + iy) % dims[1];
                    let wxy = charge * wx * wy;
                    for (iz, wz) in weights[2].iter().enumerate() {
                        let z = (base[2] + iz) % dims[2];
                        mesh[mesh_index(x, y, z, dims)].re += wxy * wz;
                    }
                }
            }
        }
        mesh
    }
}

impl ReciprocalSolver for SmoothPme {
    fn energy(
        &self,
        positions: &[Point3<f64>],
        charges: &[f64],
        box_vectors: &Matrix3<f64>,
        grid: &PmeGrid,
    ) -> Result<f64, EnergyError> {
        let periodic_box = PeriodicBox::new(*box_vectors).ok_or(EnergyError::DegenerateBox)?;
        let dims = grid.dims;
        if let Some(&n) = dims.iter().find(|&&n| n < self.order) {
            return Err(EnergyError::ShapeMismatch {
                what: "PME grid nodes per axis",
                expected: self.order,
                found: n,
            });
        }

        let mut mesh = self.spread_charges(positions, charges, &periodic_box, dims);
        fft_3d(&mut mesh, dims);

        let moduli = dims.map(|n| bspline_moduli(n, self.order));
        let reciprocal = periodic_box.reciprocal();
        let prefactor = COULOMB_PRE_FACTOR / (PI * periodic_box.volume());
        let exponent = -PI * PI / (grid.alpha * grid.alpha);

        let mut energy = 0.0;
        for kx in 0..dims[0] {
            let mx = wave_number(kx, dims[0]);
            for ky in 0..dims[1] {
                let my = wave_number(ky, dims[1]);
                for kz in 0..dims[2] {
                    if kx == 0 && ky == 0 && kz == 0 {
                        continue;
                    }
                    let mz = wave_number(kz, dims[2]);
                    let m2 = (reciprocal * Vector3::new(mx, my, mz)).norm_squared();
                    let denom = m2 * moduli[0][kx] * moduli[1][ky] * moduli[2][kz];
                    let structure = mesh[mesh_index(kx, ky, kz, dims)].norm_sqr();
                    energy += 0.5 * prefactor * (exponent * m2).exp() / denom * structure;
                }
            }
        }
        Ok(energy)
    }
}

impl ReciprocalSolver for EwaldSum {
    fn energy(
        &self,
        positions: &[Point3<f64>],
        charges: &[f64],
        box_vectors: &Matrix3<f64>,
        grid: &PmeGrid,
    ) -> Result<f64, EnergyError> {
        let periodic_box = PeriodicBox::new(*box_vectors).ok_or(EnergyError::DegenerateBox)?;
        let reciprocal = periodic_box.reciprocal();
        let exponent = -PI * PI / (grid.alpha * grid.alpha);
        let k_max = self.k_max as i64;

        let mut sum = 0.0;
        for mx in -k_max..=k_max {
            for my in -k_max..=k_max {
                for mz in -k_max..=k_max {
                    if mx == 0 && my == 0 && mz == 0 {
                        continue;
                    }
                    let m = reciprocal * Vector3::new(mx as f64, my as f64, mz as f64);
                    let m2 = m.norm_squared();
                    let (re, im) = positions.iter().zip(charges).fold(
                        (0.0, 0.0),
                        |(re, im), (position, &charge)| {
                            let phase = 2.0 * PI * m.dot(&position.coords);
                            (re + charge * phase.cos(), im + charge * phase.sin())
                        },
                    );
                    sum += (exponent * m2).exp() / m2 * (re * re + im * im);
                }
            }
        }
        Ok(COULOMB_PRE_FACTOR / (2.0 * PI * periodic_box.volume()) * sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tasks::test_support::random_cluster;

    fn grid_for(box_length: f64, cutoff: f64) -> PmeGrid {
        PmeGrid::new(
            &Matrix3::from_diagonal_element(box_length),
            cutoff,
            &PmeConfig::default(),
        )
    }

    #[test]
    fn grid_follows_tolerance_formula_with_minimum_nodes() {
        let box_vectors = Matrix3::from_diagonal(&Vector3::new(30.0, 25.0, 3.0));
        let grid = PmeGrid::new(&box_vectors, 9.0, &PmeConfig::default());
        assert!((grid.alpha - 0.324_269_229_541_381_2).abs() < 1e-12);
        assert_eq!(grid.dims, [41, 35, 6]);
    }

    #[test]
    fn bspline_weights_partition_unity() {
        for order in 3..=6 {
            for fraction in [0.0, 0.1, 0.5, 0.77, 0.999] {
                let sum: f64 = bspline_weights(fraction, order).iter().sum();
                assert!((sum - 1.0).abs() < 1e-12, "order {order} fraction {fraction}");
            }
        }
    }

    #[test]
    fn cubic_bspline_weights_at_node_match_closed_form() {
        let weights = bspline_weights(0.0, 4);
        let expected = [1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0, 0.0];
        for (w, e) in weights.iter().zip(expected) {
            assert!((w - e).abs() < 1e-12);
        }
        let weights = bspline_weights(0.5, 3);
        let expected = [0.125, 0.75, 0.125];
        for (w, e) in weights.iter().zip(expected) {
            assert!((w - e).abs() < 1e-12);
        }
    }

    #[test]
    fn bspline_moduli_are_positive_and_one_at_zero() {
        let moduli = bspline_moduli(12, 5);
        assert!((moduli[0] - 1.0).abs() < 1e-12);
        assert!(moduli.iter().all(|&m| m > MIN_BSPLINE_MODULUS));
    }

    #[test]
    fn self_energy_scales_with_alpha_and_charge_squares() {
        let energy = self_energy(&[1.0, -1.0, 0.5], 0.3);
        let expected = -COULOMB_PRE_FACTOR * 0.3 / PI.sqrt() * 2.25;
        assert!((energy - expected).abs() < 1e-9);
    }

    #[test]
    fn smooth_pme_matches_exact_ewald_sum() {
        let box_length = 20.0;
        let positions = random_cluster(3, 8, box_length, 1.5);
        let charges = [0.5, -0.5, 1.0, -1.0, 0.3, -0.3, 0.8, -0.8];
        let box_vectors = Matrix3::from_diagonal_element(box_length);
        let grid = grid_for(box_length, 8.0);

        let pme = SmoothPme { order: 5 }
            .energy(&positions, &charges, &box_vectors, &grid)
            .unwrap();
        let ewald = EwaldSum { k_max: 10 }
            .energy(&positions, &charges, &box_vectors, &grid)
            .unwrap();

        assert!(ewald.abs() > 1e-3);
        assert!(
            (pme - ewald).abs() < 1e-3 * ewald.abs().max(1.0),
            "pme {pme} ewald {ewald}"
        );
    }

    #[test]
    fn smooth_pme_is_invariant_to_periodic_translation() {
        let box_length = 18.0;
        let positions = random_cluster(5, 6, box_length, 1.5);
        let shifted: Vec<Point3<f64>> = positions
            .iter()
            .map(|p| p + Vector3::new(box_length, -2.0 * box_length, 0.0))
            .collect();
        let charges = [1.0, -1.0, 0.5, -0.5, 0.2, -0.2];
        let box_vectors = Matrix3::from_diagonal_element(box_length);
        let grid = grid_for(box_length, 7.0);
        let solver = SmoothPme { order: 5 };

        let a = solver.energy(&positions, &charges, &box_vectors, &grid).unwrap();
        let b = solver.energy(&shifted, &charges, &box_vectors, &grid).unwrap();
        assert!((a - b).abs() < 1e-8);
    }

    #[test]
    fn smooth_pme_rejects_grid_smaller_than_order() {
        let grid = PmeGrid {
            dims: [4, 8, 8],
            alpha: 0.3,
        };
        let result = SmoothPme { order: 5 }.energy(
            &[Point3::origin()],
            &[1.0],
            &Matrix3::from_diagonal_element(10.0),
            &grid,
        );
        assert!(matches!(result, Err(EnergyError::ShapeMismatch { .. })));
    }
}
