use crate::core::forcefield::term::{EnergyBreakdown, EnergyTerm};
use crate::core::models::conformer::Conformers;
use crate::core::models::potential::{ForceField, Potential};
use crate::core::models::system::System;
use crate::core::models::topology::ParameterMap;
use crate::engine::broadcast::{
    apply_parameters, broadcast_exclusions, broadcast_parameters, broadcast_valence,
};
use crate::engine::config::EvaluationConfig;
use crate::engine::error::EnergyError;
use crate::engine::registry::{EnergyFn, KernelRegistry};
use crate::engine::tasks::PeriodicInput;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Energy of a single potential for an isolated topology, no cutoff and no box.
pub fn compute_energy_potential(
    map: &ParameterMap,
    conformers: &Conformers,
    potential: &Potential,
) -> Result<Vec<f64>, EnergyError> {
    compute_energy_potential_with_registry(KernelRegistry::global(), map, conformers, potential)
}

/// Sum of every potential of `force_field` for an isolated topology whose parameter
/// maps are keyed by potential type.
pub fn compute_energy(
    maps_by_type: &HashMap<String, ParameterMap>,
    conformers: &Conformers,
    force_field: &ForceField,
) -> Result<Vec<f64>, EnergyError> {
    compute_energy_with_registry(KernelRegistry::global(), maps_by_type, conformers, force_field)
}

/// Total energy of every conformer of a full system.
///
/// Periodic systems are evaluated with the periodic variant of each non-bonded
/// kernel; valence terms are evaluated the same way in both cases.
pub fn compute_system_energy(
    system: &System,
    force_field: &ForceField,
    conformers: &Conformers,
    config: &EvaluationConfig,
) -> Result<Vec<f64>, EnergyError> {
    compute_system_energy_with_registry(
        KernelRegistry::global(),
        system,
        force_field,
        conformers,
        config,
    )
}

/// Like [`compute_system_energy`], keeping one [`EnergyTerm`] per potential.
pub fn compute_system_energy_breakdown(
    system: &System,
    force_field: &ForceField,
    conformers: &Conformers,
    config: &EvaluationConfig,
) -> Result<EnergyBreakdown, EnergyError> {
    compute_system_energy_breakdown_with_registry(
        KernelRegistry::global(),
        system,
        force_field,
        conformers,
        config,
    )
}

/// [`compute_energy_potential`] dispatching through `registry`.
pub fn compute_energy_potential_with_registry(
    registry: &KernelRegistry,
    map: &ParameterMap,
    conformers: &Conformers,
    potential: &Potential,
) -> Result<Vec<f64>, EnergyError> {
    let energy_fn = registry.lookup(&potential.potential_type, &potential.functional_form)?;

    match (energy_fn, map) {
        (EnergyFn::Nonbonded { direct, .. }, ParameterMap::Nonbonded(nonbonded)) => {
            let parameters = apply_parameters(map, potential)?;
            let scales = nonbonded
                .exclusion_scale_idxs
                .iter()
                .map(|&idx| potential.attribute_at(idx))
                .collect::<Result<Vec<_>, _>>()?;
            direct(conformers, &parameters, &nonbonded.exclusions, &scales)
        }
        (EnergyFn::Valence(valence_fn), ParameterMap::Valence(valence)) => {
            let parameters = apply_parameters(map, potential)?;
            valence_fn(conformers, &valence.particle_idxs, &parameters)
        }
        (EnergyFn::Nonbonded { .. }, _) => Err(EnergyError::ParameterMapMismatch {
            potential_type: potential.potential_type.clone(),
            expected: "non-bonded",
            found: map.kind(),
        }),
        (EnergyFn::Valence(_), _) => Err(EnergyError::ParameterMapMismatch {
            potential_type: potential.potential_type.clone(),
            expected: "valence",
            found: map.kind(),
        }),
    }
}

/// [`compute_energy`] dispatching through `registry`.
#[instrument(skip_all, name = "topology_energy")]
pub fn compute_energy_with_registry(
    registry: &KernelRegistry,
    maps_by_type: &HashMap<String, ParameterMap>,
    conformers: &Conformers,
    force_field: &ForceField,
) -> Result<Vec<f64>, EnergyError> {
    let mut total = vec![0.0; conformers.n_conformers()];
    for potential in &force_field.potentials {
        let map = maps_by_type.get(&potential.potential_type).ok_or_else(|| {
            EnergyError::MissingParameterMap {
                potential_type: potential.potential_type.clone(),
            }
        })?;
        let energies =
            compute_energy_potential_with_registry(registry, map, conformers, potential)?;
        debug!(potential_type = %potential.potential_type, "Evaluated potential.");
        accumulate(&mut total, &energies);
    }
    Ok(total)
}

/// [`compute_system_energy`] dispatching through `registry`.
pub fn compute_system_energy_with_registry(
    registry: &KernelRegistry,
    system: &System,
    force_field: &ForceField,
    conformers: &Conformers,
    config: &EvaluationConfig,
) -> Result<Vec<f64>, EnergyError> {
    let breakdown = compute_system_energy_breakdown_with_registry(
        registry,
        system,
        force_field,
        conformers,
        config,
    )?;
    Ok(breakdown.total(conformers.n_conformers()))
}

/// [`compute_system_energy_breakdown`] dispatching through `registry`.
#[instrument(skip_all, name = "system_energy")]
pub fn compute_system_energy_breakdown_with_registry(
    registry: &KernelRegistry,
    system: &System,
    force_field: &ForceField,
    conformers: &Conformers,
    config: &EvaluationConfig,
) -> Result<EnergyBreakdown, EnergyError> {
    config.validate()?;
    if conformers.n_particles() != system.n_particles() {
        return Err(EnergyError::ParticleCountMismatch {
            expected: system.n_particles(),
            found: conformers.n_particles(),
        });
    }
    info!(
        n_particles = system.n_particles(),
        n_conformers = conformers.n_conformers(),
        n_potentials = force_field.potentials.len(),
        periodic = system.is_periodic(),
        "Evaluating system energy."
    );

    let mut breakdown = EnergyBreakdown::new();
    for potential in &force_field.potentials {
        let energies = system_potential_energy(registry, system, potential, conformers, config)?;
        debug!(potential_type = %potential.potential_type, "Evaluated potential.");
        breakdown.push(EnergyTerm::new(potential.potential_type.clone(), energies));
    }
    info!(n_terms = breakdown.terms().len(), "System energy evaluation complete.");
    Ok(breakdown)
}

fn system_potential_energy(
    registry: &KernelRegistry,
    system: &System,
    potential: &Potential,
    conformers: &Conformers,
    config: &EvaluationConfig,
) -> Result<Vec<f64>, EnergyError> {
    match registry.lookup(&potential.potential_type, &potential.functional_form)? {
        EnergyFn::Nonbonded { direct, periodic } => {
            let parameters = broadcast_parameters(system, potential)?;
            let exclusions = broadcast_exclusions(system, potential)?;

            if !system.is_periodic() {
                return direct(conformers, &parameters, &exclusions.pairs, &exclusions.scales);
            }
            let periodic = periodic.ok_or_else(|| EnergyError::PeriodicUnsupported {
                potential_type: potential.potential_type.clone(),
                functional_form: potential.functional_form.clone(),
            })?;
            periodic(&PeriodicInput {
                system,
                potential,
                parameters: &parameters,
                exclusions: &exclusions,
                conformers,
                config,
            })
        }
        EnergyFn::Valence(valence_fn) => {
            let valence = broadcast_valence(system, potential)?;
            valence_fn(conformers, &valence.particle_idxs, &valence.parameters)
        }
    }
}

fn accumulate(total: &mut [f64], energies: &[f64]) {
    for (acc, energy) in total.iter_mut().zip(energies) {
        *acc += energy;
    }
}
