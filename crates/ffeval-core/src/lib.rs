//! # ffeval Core Library
//!
//! Batched potential energy evaluation for molecular systems described by a
//! parameterized force field. Coordinates for one or many conformers are mapped
//! through precomputed per-topology parameter assignments into per-particle and
//! per-pair parameters, and reduced to one scalar energy per conformer.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Immutable data models (`System`, `Topology`,
//!   `ParameterMap`, `Potential`), pure pair-potential mathematics, force field
//!   loading, and geometry / pair-index utilities.
//!
//! - **[`engine`]: The Logic Core.** Parameter and exclusion broadcasting,
//!   exclusion scale resolution, neighbour search, the energy function registry,
//!   and the energy kernels themselves (Lennard-Jones, Coulomb, particle-mesh
//!   Ewald, dispersion correction, valence terms).
//!
//! - **[`workflows`]: The Public API.** Entry points that tie `engine` and `core`
//!   together: evaluate a single potential, a topology's full force field, or a
//!   complete (optionally periodic) system over a batch of conformers.
//!
//! ## Units
//!
//! Coordinates are in Å, energies in kcal/mol and charges in units of the
//! elementary charge.

pub mod core;
pub mod engine;
pub mod workflows;
