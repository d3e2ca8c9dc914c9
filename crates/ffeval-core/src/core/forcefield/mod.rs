//! # Force Field Module
//!
//! Pure mathematics of the pairwise and valence potentials, plus loading of force
//! field parameter tables and per-potential energy reporting.
//!
//! ## Overview
//!
//! - **Van der Waals interactions** using the 12-6 Lennard-Jones potential with
//!   Lorentz-Berthelot combination rules and an optional quintic switching function
//! - **Electrostatic interactions** using Coulomb's law, either directly or split into
//!   an error-function screened real-space part for Ewald summation
//! - **Valence interactions** using harmonic bonds and angles and periodic torsions
//!
//! ## Key Components
//!
//! - [`potentials`] - Closed-form pair and valence energy expressions and unit constants
//! - [`params`] - Loading of [`ForceField`](crate::core::models::potential::ForceField)
//!   descriptions from TOML
//! - [`term`] - Per-potential energy breakdowns over a conformer batch
//!
//! Functions in [`potentials`] assume valid inputs: overlap and periodicity checks are the
//! responsibility of the kernels in [`crate::engine::tasks`].

pub mod params;
pub mod potentials;
pub mod term;
