//! # Molecular Models Module
//!
//! Data structures describing *what* is evaluated: the particles of a system, how
//! force field parameters were assigned to them, and the global parameter tables of
//! each potential.
//!
//! ## Key Components
//!
//! - [`system::System`] - Ordered `(Topology, n_copies)` pairs plus optional box vectors
//! - [`topology::Topology`] - One distinct molecular unit and its [`topology::ParameterMap`]s
//! - [`potential::Potential`] - The global parameter table of one interaction type
//! - [`conformer::Conformers`] - A batch of coordinate frames
//!
//! Every constructor validates shapes up front so the energy kernels can index freely.

use thiserror::Error;

pub mod conformer;
pub mod potential;
pub mod system;
pub mod topology;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("A conformer batch must contain at least one frame")]
    EmptyBatch,
    #[error("Conformer {index} has {found} particles, but the first conformer has {expected}")]
    RaggedBatch {
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error(
        "Assignment matrix for '{potential_type}' has {found} rows, expected {expected}"
    )]
    AssignmentRows {
        potential_type: String,
        expected: usize,
        found: usize,
    },
    #[error("Particle index {index} in '{potential_type}' is out of range for {n_particles} particles")]
    ParticleIndexOutOfRange {
        potential_type: String,
        index: usize,
        n_particles: usize,
    },
    #[error("Exclusion ({i}, {j}) in '{potential_type}' pairs a particle with itself")]
    SelfExclusion {
        potential_type: String,
        i: usize,
        j: usize,
    },
    #[error(
        "'{potential_type}' has {n_exclusions} exclusions but {n_scale_idxs} exclusion scale indices"
    )]
    ExclusionScaleCount {
        potential_type: String,
        n_exclusions: usize,
        n_scale_idxs: usize,
    },
    #[error("Valence term {index} in '{potential_type}' has {found} particles, expected {expected}")]
    TupleLength {
        potential_type: String,
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error("{n_topologies} topologies were given with {n_counts} copy counts")]
    CopyCountMismatch { n_topologies: usize, n_counts: usize },
    #[error("Potential '{potential_type}' has {found} {what}, expected {expected}")]
    PotentialShape {
        potential_type: String,
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Potential '{potential_type}' has no attribute named '{attribute}'")]
    MissingAttribute {
        potential_type: String,
        attribute: String,
    },
    #[error(
        "Exclusion scale index {index} is out of range for the {n_attributes} attributes of '{potential_type}'"
    )]
    AttributeIndexOutOfRange {
        potential_type: String,
        index: usize,
        n_attributes: usize,
    },
}
