use statrs::function::erf::{erf, erfc};
use std::f64::consts::PI;

const AVOGADRO_CONSTANT: f64 = 6.022_140_76e23; // mol⁻¹
const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19; // C
const VACUUM_PERMITTIVITY: f64 = 8.854_187_812_8e-12; // F·m⁻¹
const JOULES_PER_KILOCALORIE: f64 = 4184.0;
const METRES_PER_ANGSTROM: f64 = 1e-10;

/// `N_A·e²/(4π·ε₀)` in kcal·Å/(mol·e²).
pub const COULOMB_PRE_FACTOR: f64 = AVOGADRO_CONSTANT * ELEMENTARY_CHARGE * ELEMENTARY_CHARGE
    / (4.0 * PI * VACUUM_PERMITTIVITY)
    / (JOULES_PER_KILOCALORIE * METRES_PER_ANGSTROM);

/// Pairs closer than this [Å] are treated as overlapping.
pub const MIN_PAIR_DISTANCE: f64 = 1e-6;

/// Combined `(epsilon, sigma)` of a pair.
#[inline]
pub fn lorentz_berthelot(epsilon_a: f64, epsilon_b: f64, sigma_a: f64, sigma_b: f64) -> (f64, f64) {
    ((epsilon_a * epsilon_b).sqrt(), 0.5 * (sigma_a + sigma_b))
}

#[inline]
pub fn lennard_jones_12_6(dist_sqr: f64, epsilon: f64, sigma: f64) -> f64 {
    let sigma2 = sigma * sigma;
    let x = (sigma2 * sigma2 * sigma2) / (dist_sqr * dist_sqr * dist_sqr);
    4.0 * epsilon * x * (x - 1.0)
}

#[inline]
pub fn coulomb(dist: f64, q1: f64, q2: f64) -> f64 {
    COULOMB_PRE_FACTOR * q1 * q2 / dist
}

/// Quintic taper: 1 below `switch_distance`, 0 above `cutoff`.
#[inline]
pub fn switching_function(dist: f64, switch_distance: f64, cutoff: f64) -> f64 {
    if dist < switch_distance {
        return 1.0;
    }
    if dist > cutoff {
        return 0.0;
    }
    let x = (dist - switch_distance) / (cutoff - switch_distance);
    let x3 = x * x * x;
    1.0 - 6.0 * x3 * x * x + 15.0 * x3 * x - 10.0 * x3
}

/// Real-space Ewald pair energy, `k_e·qᵢqⱼ·erfc(αr)/r`.
#[inline]
pub fn ewald_real_space(dist: f64, q1: f64, q2: f64, alpha: f64) -> f64 {
    COULOMB_PRE_FACTOR * q1 * q2 * erfc(alpha * dist) / dist
}

/// The smooth part of an excluded pair that the reciprocal sum includes anyway.
#[inline]
pub fn ewald_excluded_pair(dist: f64, q1: f64, q2: f64, alpha: f64) -> f64 {
    COULOMB_PRE_FACTOR * q1 * q2 * erf(alpha * dist) / dist
}

#[inline]
pub fn harmonic(value: f64, k: f64, equilibrium: f64) -> f64 {
    let delta = value - equilibrium;
    0.5 * k * delta * delta
}

#[inline]
pub fn periodic_torsion(phi: f64, k: f64, periodicity: f64, phase: f64, idivf: f64) -> f64 {
    k / idivf * (1.0 + (periodicity * phi - phase).cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn coulomb_pre_factor_matches_reference_value() {
        assert!((COULOMB_PRE_FACTOR - 332.063_713_3).abs() < 1e-6);
    }

    #[test]
    fn lorentz_berthelot_is_symmetric() {
        let ab = lorentz_berthelot(0.1, 0.4, 3.0, 3.6);
        let ba = lorentz_berthelot(0.4, 0.1, 3.6, 3.0);
        assert_eq!(ab, ba);
        assert!(f64_approx_equal(ab.0, 0.2));
        assert!(f64_approx_equal(ab.1, 3.3));
    }

    #[test]
    fn lennard_jones_at_sigma_is_zero() {
        assert!(f64_approx_equal(lennard_jones_12_6(1.0, 1.0, 1.0), 0.0));
    }

    #[test]
    fn lennard_jones_at_minimum_returns_negative_well_depth() {
        let r_min = 2f64.powf(1.0 / 6.0) * 3.0;
        let energy = lennard_jones_12_6(r_min * r_min, 0.25, 3.0);
        assert!(f64_approx_equal(energy, -0.25));
    }

    #[test]
    fn coulomb_of_unit_charges_at_one_angstrom_is_pre_factor() {
        assert!(f64_approx_equal(coulomb(1.0, 1.0, 1.0), COULOMB_PRE_FACTOR));
        assert!(f64_approx_equal(coulomb(2.0, 1.0, -1.0), -COULOMB_PRE_FACTOR / 2.0));
    }

    #[test]
    fn switching_function_is_one_inside_and_zero_outside() {
        assert_eq!(switching_function(7.0, 8.0, 9.0), 1.0);
        assert_eq!(switching_function(8.0, 8.0, 9.0), 1.0);
        assert!(f64_approx_equal(switching_function(9.0, 8.0, 9.0), 0.0));
        assert_eq!(switching_function(9.5, 8.0, 9.0), 0.0);
    }

    #[test]
    fn switching_function_decreases_monotonically_and_is_half_at_midpoint() {
        let mut previous = 1.0;
        for step in 1..100 {
            let r = 8.0 + step as f64 / 100.0;
            let s = switching_function(r, 8.0, 9.0);
            assert!(s < previous);
            previous = s;
        }
        assert!(f64_approx_equal(switching_function(8.5, 8.0, 9.0), 0.5));
    }

    #[test]
    fn ewald_split_recovers_full_coulomb() {
        let alpha = 0.3;
        let split =
            ewald_real_space(2.5, 0.4, -0.7, alpha) + ewald_excluded_pair(2.5, 0.4, -0.7, alpha);
        assert!((split - coulomb(2.5, 0.4, -0.7)).abs() < 1e-9);
    }

    #[test]
    fn harmonic_is_zero_at_equilibrium() {
        assert_eq!(harmonic(1.5, 100.0, 1.5), 0.0);
        assert!(f64_approx_equal(harmonic(2.0, 100.0, 1.5), 12.5));
    }

    #[test]
    fn periodic_torsion_scales_with_idivf() {
        let energy = periodic_torsion(0.0, 2.0, 3.0, 0.0, 2.0);
        assert!(f64_approx_equal(energy, 2.0));
        let energy = periodic_torsion(std::f64::consts::PI, 2.0, 1.0, 0.0, 1.0);
        assert!(f64_approx_equal(energy, 0.0));
    }
}
