use thiserror::Error;

use super::config::ConfigError;
use crate::core::models::ModelError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnergyError {
    #[error("An energy function is already registered for type '{potential_type}' fn '{functional_form}'")]
    DuplicateEnergyFn {
        potential_type: String,
        functional_form: String,
    },

    #[error("No energy function is registered for type '{potential_type}' fn '{functional_form}'")]
    UnknownEnergyFn {
        potential_type: String,
        functional_form: String,
    },

    #[error("Invalid model: {source}")]
    Model {
        #[from]
        source: ModelError,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Shape mismatch for {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Conformers have {found} particles but the system has {expected}")]
    ParticleCountMismatch { expected: usize, found: usize },

    #[error("{n_boxes} box vectors were given for {n_conformers} conformers")]
    BoxCountMismatch { n_boxes: usize, n_conformers: usize },

    #[error("Exclusion ({i}, {j}) is invalid for a system of {n_particles} particles")]
    InvalidExclusion { i: usize, j: usize, n_particles: usize },

    #[error("{n_exclusions} exclusions were given with {n_scales} scale factors")]
    ExclusionScaleCount { n_exclusions: usize, n_scales: usize },

    #[error("Particles {i} and {j} overlap (distance {distance:.3e} Å)")]
    OverlappingParticles { i: usize, j: usize, distance: f64 },

    #[error("A periodic energy function was requested for a non-periodic system")]
    NonPeriodicSystem,

    #[error("Cutoff {cutoff} Å exceeds half the smallest box width ({max_cutoff} Å)")]
    CutoffTooLarge { cutoff: f64, max_cutoff: f64 },

    #[error("Cutoff must be positive and finite, got {0}")]
    InvalidCutoff(f64),

    #[error("Box vectors are degenerate (non-positive volume)")]
    DegenerateBox,

    #[error("Switch width {switch_width} Å must lie in [0, cutoff = {cutoff} Å)")]
    InvalidSwitchWidth { switch_width: f64, cutoff: f64 },

    #[error("Potential '{potential_type}' expects a {expected} parameter map, found {found}")]
    ParameterMapMismatch {
        potential_type: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Topology has no parameter map for potential '{potential_type}'")]
    MissingParameterMap { potential_type: String },

    #[error("Potential type '{potential_type}' fn '{functional_form}' has no periodic energy function")]
    PeriodicUnsupported {
        potential_type: String,
        functional_form: String,
    },
}
