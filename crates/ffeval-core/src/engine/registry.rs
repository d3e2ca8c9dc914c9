use super::error::EnergyError;
use super::tasks::PeriodicInput;
use super::tasks::{coulomb, lennard_jones, valence};
use crate::core::models::conformer::Conformers;
use nalgebra::DMatrix;
use std::collections::HashMap;
use std::sync::LazyLock;

/// `(conformers, parameters, exclusions, exclusion_scales)`, no cutoff.
pub type NonbondedEnergyFn =
    fn(&Conformers, &DMatrix<f64>, &[[usize; 2]], &[f64]) -> Result<Vec<f64>, EnergyError>;

pub type PeriodicEnergyFn = fn(&PeriodicInput<'_>) -> Result<Vec<f64>, EnergyError>;

/// `(conformers, particle_idxs, parameters)`.
pub type ValenceEnergyFn =
    fn(&Conformers, &[Vec<usize>], &DMatrix<f64>) -> Result<Vec<f64>, EnergyError>;

#[derive(Debug, Clone, Copy)]
pub enum EnergyFn {
    Nonbonded {
        direct: NonbondedEnergyFn,
        periodic: Option<PeriodicEnergyFn>,
    },
    Valence(ValenceEnergyFn),
}

/// Maps `(potential type, functional form)` to the kernel evaluating it.
#[derive(Debug, Clone, Default)]
pub struct KernelRegistry {
    energy_fns: HashMap<(String, String), EnergyFn>,
}

static GLOBAL_REGISTRY: LazyLock<KernelRegistry> = LazyLock::new(KernelRegistry::with_builtins);

impl KernelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry holding every built-in kernel.
    pub fn global() -> &'static KernelRegistry {
        &GLOBAL_REGISTRY
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let builtins = [
            (
                lennard_jones::VDW_TYPE,
                lennard_jones::LJ_POTENTIAL,
                EnergyFn::Nonbonded {
                    direct: lennard_jones::compute_lj_energy,
                    periodic: Some(lennard_jones::compute_lj_energy_periodic),
                },
            ),
            (
                coulomb::ELECTROSTATICS_TYPE,
                coulomb::COULOMB_POTENTIAL,
                EnergyFn::Nonbonded {
                    direct: coulomb::compute_coulomb_energy,
                    periodic: Some(coulomb::compute_coulomb_energy_periodic),
                },
            ),
            (
                valence::BONDS_TYPE,
                valence::HARMONIC_BOND_POTENTIAL,
                EnergyFn::Valence(valence::compute_harmonic_bond_energy),
            ),
            (
                valence::ANGLES_TYPE,
                valence::HARMONIC_ANGLE_POTENTIAL,
                EnergyFn::Valence(valence::compute_harmonic_angle_energy),
            ),
            (
                valence::PROPER_TORSIONS_TYPE,
                valence::PERIODIC_TORSION_POTENTIAL,
                EnergyFn::Valence(valence::compute_periodic_torsion_energy),
            ),
            (
                valence::IMPROPER_TORSIONS_TYPE,
                valence::PERIODIC_TORSION_POTENTIAL,
                EnergyFn::Valence(valence::compute_periodic_torsion_energy),
            ),
        ];
        for (potential_type, functional_form, energy_fn) in builtins {
            let previous = registry.energy_fns.insert(
                (potential_type.to_string(), functional_form.to_string()),
                energy_fn,
            );
            debug_assert!(
                previous.is_none(),
                "built-in kernel registered twice for '{potential_type}' fn '{functional_form}'"
            );
        }
        registry
    }

    pub fn register(
        &mut self,
        potential_type: &str,
        functional_form: &str,
        energy_fn: EnergyFn,
    ) -> Result<(), EnergyError> {
        let key = (potential_type.to_string(), functional_form.to_string());
        if self.energy_fns.contains_key(&key) {
            return Err(EnergyError::DuplicateEnergyFn {
                potential_type: key.0,
                functional_form: key.1,
            });
        }
        self.energy_fns.insert(key, energy_fn);
        Ok(())
    }

    pub fn lookup(
        &self,
        potential_type: &str,
        functional_form: &str,
    ) -> Result<EnergyFn, EnergyError> {
        self.energy_fns
            .get(&(potential_type.to_string(), functional_form.to_string()))
            .copied()
            .ok_or_else(|| EnergyError::UnknownEnergyFn {
                potential_type: potential_type.to_string(),
                functional_form: functional_form.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.energy_fns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energy_fns.is_empty()
    }
}
