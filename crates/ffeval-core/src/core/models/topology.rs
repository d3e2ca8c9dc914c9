use super::ModelError;
use nalgebra::DMatrix;
use std::collections::HashMap;

/// Parameters of a valence (bonded) interaction type applied to one topology.
#[derive(Debug, Clone, PartialEq)]
pub struct ValenceParameterMap {
    /// `(n_interactions, n_parameter_types)` map from parameter rows to interactions.
    pub assignment_matrix: DMatrix<f64>,
    /// The particles taking part in each interaction, local to the topology.
    pub particle_idxs: Vec<Vec<usize>>,
}

/// Parameters of a non-bonded interaction type applied to one topology.
#[derive(Debug, Clone, PartialEq)]
pub struct NonbondedParameterMap {
    /// `(n_particles, n_parameter_types)` map from parameter rows to particles.
    pub assignment_matrix: DMatrix<f64>,
    /// Particle pairs whose interaction is scaled, local to the topology.
    pub exclusions: Vec<[usize; 2]>,
    /// For each exclusion, the index of the potential attribute holding its scale factor.
    pub exclusion_scale_idxs: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParameterMap {
    Valence(ValenceParameterMap),
    Nonbonded(NonbondedParameterMap),
}

impl ParameterMap {
    pub fn assignment_matrix(&self) -> &DMatrix<f64> {
        match self {
            ParameterMap::Valence(map) => &map.assignment_matrix,
            ParameterMap::Nonbonded(map) => &map.assignment_matrix,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ParameterMap::Valence(_) => "valence",
            ParameterMap::Nonbonded(_) => "non-bonded",
        }
    }

    pub fn as_nonbonded(&self) -> Option<&NonbondedParameterMap> {
        match self {
            ParameterMap::Nonbonded(map) => Some(map),
            ParameterMap::Valence(_) => None,
        }
    }

    pub fn as_valence(&self) -> Option<&ValenceParameterMap> {
        match self {
            ParameterMap::Valence(map) => Some(map),
            ParameterMap::Nonbonded(_) => None,
        }
    }
}

/// One distinct molecular unit, reused across the identical copies of a system.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    n_particles: usize,
    parameters: HashMap<String, ParameterMap>,
}

impl Topology {
    pub fn new(
        n_particles: usize,
        parameters: HashMap<String, ParameterMap>,
    ) -> Result<Self, ModelError> {
        for (potential_type, map) in &parameters {
            match map {
                ParameterMap::Nonbonded(map) => {
                    validate_nonbonded(potential_type, n_particles, map)?
                }
                ParameterMap::Valence(map) => validate_valence(potential_type, n_particles, map)?,
            }
        }
        Ok(Self {
            n_particles,
            parameters,
        })
    }

    #[inline]
    pub fn n_particles(&self) -> usize {
        self.n_particles
    }

    pub fn parameters(&self, potential_type: &str) -> Option<&ParameterMap> {
        self.parameters.get(potential_type)
    }

    /// Every parameter map, keyed by potential type.
    pub fn parameter_maps(&self) -> &HashMap<String, ParameterMap> {
        &self.parameters
    }
}

fn validate_nonbonded(
    potential_type: &str,
    n_particles: usize,
    map: &NonbondedParameterMap,
) -> Result<(), ModelError> {
    if map.assignment_matrix.nrows() != n_particles {
        return Err(ModelError::AssignmentRows {
            potential_type: potential_type.to_string(),
            expected: n_particles,
            found: map.assignment_matrix.nrows(),
        });
    }
    if map.exclusions.len() != map.exclusion_scale_idxs.len() {
        return Err(ModelError::ExclusionScaleCount {
            potential_type: potential_type.to_string(),
            n_exclusions: map.exclusions.len(),
            n_scale_idxs: map.exclusion_scale_idxs.len(),
        });
    }
    for &[i, j] in &map.exclusions {
        check_particle_index(potential_type, i.max(j), n_particles)?;
        if i == j {
            return Err(ModelError::SelfExclusion {
                potential_type: potential_type.to_string(),
                i,
                j,
            });
        }
    }
    Ok(())
}

fn validate_valence(
    potential_type: &str,
    n_particles: usize,
    map: &ValenceParameterMap,
) -> Result<(), ModelError> {
    if map.assignment_matrix.nrows() != map.particle_idxs.len() {
        return Err(ModelError::AssignmentRows {
            potential_type: potential_type.to_string(),
            expected: map.particle_idxs.len(),
            found: map.assignment_matrix.nrows(),
        });
    }
    let Some(tuple_len) = map.particle_idxs.first().map(Vec::len) else {
        return Ok(());
    };
    for (index, idxs) in map.particle_idxs.iter().enumerate() {
        if idxs.len() != tuple_len {
            return Err(ModelError::TupleLength {
                potential_type: potential_type.to_string(),
                index,
                expected: tuple_len,
                found: idxs.len(),
            });
        }
        for &idx in idxs {
            check_particle_index(potential_type, idx, n_particles)?;
        }
    }
    Ok(())
}

fn check_particle_index(
    potential_type: &str,
    index: usize,
    n_particles: usize,
) -> Result<(), ModelError> {
    if index >= n_particles {
        return Err(ModelError::ParticleIndexOutOfRange {
            potential_type: potential_type.to_string(),
            index,
            n_particles,
        });
    }
    Ok(())
}
