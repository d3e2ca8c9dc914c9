//! # Engine Module
//!
//! This module implements the evaluation engine: it turns a system, a force field and a
//! batch of conformers into per-conformer energies.
//!
//! ## Overview
//!
//! Topology-level parameters and exclusions are first broadcast to the full system.
//! Each potential is then dispatched through the [`registry`] to a kernel in [`tasks`],
//! which evaluates either every unordered pair directly or, for periodic systems, the
//! pairs found by a [`neighbors`] search plus the long-range corrections.
//!
//! ## Architecture
//!
//! - **Broadcasting** ([`broadcast`]) - Per-copy replication of parameters, exclusions and
//!   valence tuples
//! - **Exclusions** ([`exclusions`]) - Validation and lookup of pair scale factors
//! - **Neighbor Search** ([`neighbors`]) - Minimum-image pair lists within a cutoff
//! - **Kernels** ([`tasks`]) - Lennard-Jones, Coulomb, PME, dispersion and valence terms
//! - **Dispatch** ([`registry`]) - Kernels keyed by potential type and functional form
//! - **Configuration** ([`config`]) - PME grid, neighbor search and reciprocal solver
//!   settings
//! - **Error Handling** ([`error`]) - Evaluation errors and their propagation

pub mod broadcast;
pub mod config;
pub mod error;
pub mod exclusions;
pub mod neighbors;
pub mod registry;
pub mod tasks;
