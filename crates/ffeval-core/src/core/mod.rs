//! # Core Module
//!
//! This module provides the stateless building blocks used by every energy
//! evaluation.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Systems, topologies, parameter maps,
//!   potentials and conformer batches
//! - **Energy Mathematics** ([`forcefield`]) - Pair potentials, combination rules,
//!   switching functions and force field loading
//! - **Utilities** ([`utils`]) - Periodic-box geometry and upper-triangular pair indexing
//!
//! All types in this module are immutable once constructed. Derived quantities such as
//! broadcast parameters or pair lists are produced by the [`crate::engine`] layer and are
//! never stored back into the models.

pub mod forcefield;
pub mod models;
pub mod utils;
