use crate::core::forcefield::potentials::lorentz_berthelot;
use crate::core::models::potential::Potential;
use crate::core::models::system::System;
use crate::engine::broadcast::nonbonded_map;
use crate::engine::error::EnergyError;
use std::collections::HashMap;
use std::f64::consts::PI;
use tracing::debug;

/// Antiderivative, evaluated at `r`, of `r²·(σ¹²/r¹² − σ⁶/r⁶)·(1 − S(r))` where `S` is
/// the quintic switch between `rs` and `rc`. The coefficients are the closed form used
/// by OpenMM's analytic dispersion correction.
pub fn dispersion_integral(r: f64, rs: f64, rc: f64, sigma: f64) -> f64 {
    let a = 1.0 / (rc - rs);
    let a2 = a * a;
    let a3 = a2 * a;
    let sig2 = sigma * sigma;
    let sig6 = sig2 * sig2 * sig2;
    let rs2 = rs * rs;
    let rs3 = rs * rs2;
    let r2 = r * r;
    let r3 = r * r2;
    let r4 = r * r3;
    let r5 = r * r4;
    let r6 = r * r5;
    let r9 = r3 * r6;

    #[rustfmt::skip]
    let value = sig6 * a3 * ((
        sig6 * (
            rs3 * 28.0 * (6.0 * rs2 * a2 + 15.0 * rs * a + 10.0)
            - r * rs2 * 945.0 * (rs2 * a2 + 2.0 * rs * a + 1.0)
            + r2 * rs * 1080.0 * (2.0 * rs2 * a2 + 3.0 * rs * a + 1.0)
            - r3 * 420.0 * (6.0 * rs2 * a2 + 6.0 * rs * a + 1.0)
            + r4 * 756.0 * (2.0 * rs * a2 + a)
            - r5 * 378.0 * a2)
        - r6 * (
            rs3 * 84.0 * (6.0 * rs2 * a2 + 15.0 * rs * a + 10.0)
            - r * rs2 * 3780.0 * (rs2 * a2 + 2.0 * rs * a + 1.0)
            + r2 * rs * 7560.0 * (2.0 * rs2 * a2 + 3.0 * rs * a + 1.0)))
        / (252.0 * r9)
        - r.ln() * 10.0 * (6.0 * rs2 * a2 + 6.0 * rs * a + 1.0)
        + r * 15.0 * (2.0 * rs * a2 + a)
        - r2 * 3.0 * a2);
    value
}

/// The three moment sums of one class of interactions, weighted by `count · ε`.
fn dispersion_terms(
    count: f64,
    epsilon: f64,
    sigma: f64,
    cutoff: f64,
    switch_distance: Option<f64>,
) -> [f64; 3] {
    let sigma6 = sigma.powi(6);
    let switched = match switch_distance {
        Some(rs) if rs < cutoff => {
            dispersion_integral(cutoff, rs, cutoff, sigma)
                - dispersion_integral(rs, rs, cutoff, sigma)
        }
        _ => 0.0,
    };
    let weight = count * epsilon;
    [weight * sigma6 * sigma6, weight * sigma6, weight * switched]
}

/// The long-range dispersion correction times the box volume, so that the correction
/// of any conformer is `coefficient / V`.
///
/// Particle counts per parameter type are the absolute column sums of each topology's
/// assignment matrix times its copy count; types sharing a parameter key are merged.
/// The potential's first two parameter columns must be `epsilon` and `sigma`.
pub fn dispersion_coefficient(
    system: &System,
    potential: &Potential,
    cutoff: f64,
    switch_distance: Option<f64>,
) -> Result<f64, EnergyError> {
    potential.require_columns(2)?;

    let mut n_by_key: HashMap<&str, f64> = HashMap::new();
    for (topology, n_copies) in system.components() {
        let map = nonbonded_map(topology, potential)?;
        if map.assignment_matrix.ncols() != potential.parameter_keys.len() {
            return Err(EnergyError::ShapeMismatch {
                what: "assignment matrix columns",
                expected: potential.parameter_keys.len(),
                found: map.assignment_matrix.ncols(),
            });
        }
        for (key, column) in potential
            .parameter_keys
            .iter()
            .zip(map.assignment_matrix.column_iter())
        {
            let count: f64 = column.iter().map(|value| value.abs()).sum();
            *n_by_key.entry(key.as_str()).or_insert(0.0) += count * n_copies as f64;
        }
    }
    let counts: Vec<f64> = potential
        .parameter_keys
        .iter()
        .map(|key| n_by_key.get(key.as_str()).copied().unwrap_or(0.0))
        .collect();

    let epsilon = potential.parameters.column(0);
    let sigma = potential.parameters.column(1);
    let mut terms = [0.0; 3];
    let mut accumulate = |added: [f64; 3]| {
        for (term, value) in terms.iter_mut().zip(added) {
            *term += value;
        }
    };

    for (i, &n_i) in counts.iter().enumerate() {
        let n_ii = n_i * (n_i + 1.0) / 2.0;
        accumulate(dispersion_terms(n_ii, epsilon[i], sigma[i], cutoff, switch_distance));

        for (j, &n_j) in counts.iter().enumerate().skip(i + 1) {
            let (eps_ij, sig_ij) = lorentz_berthelot(epsilon[i], epsilon[j], sigma[i], sigma[j]);
            accumulate(dispersion_terms(n_i * n_j, eps_ij, sig_ij, cutoff, switch_distance));
        }
    }

    let n_particles = system.n_particles() as f64;
    let n_interactions = n_particles * (n_particles + 1.0) / 2.0;
    if n_interactions == 0.0 {
        return Ok(0.0);
    }
    let [t1, t2, t3] = terms.map(|term| term / n_interactions);

    let coefficient = 8.0
        * n_particles
        * n_particles
        * PI
        * (t1 / (9.0 * cutoff.powi(9)) - t2 / (3.0 * cutoff.powi(3)) + t3);

    debug!(
        n_types = counts.len(),
        n_particles = system.n_particles(),
        coefficient,
        "Dispersion correction coefficient."
    );
    Ok(coefficient)
}
