//! # Workflows Module
//!
//! The public entry points of the library. Each workflow resolves the kernel of every
//! potential through [`crate::engine::registry::KernelRegistry::global`], prepares its
//! inputs and sums the results per conformer.
//!
//! - [`energy::compute_energy_potential`] - One potential of one isolated topology
//! - [`energy::compute_energy`] - Every potential of one isolated topology
//! - [`energy::compute_system_energy`] - A full, optionally periodic, system
//! - [`energy::compute_system_energy_breakdown`] - The same, kept per potential
//!
//! Each entry point has a `_with_registry` twin that dispatches through a caller-built
//! [`crate::engine::registry::KernelRegistry`], so kernels added with
//! [`crate::engine::registry::KernelRegistry::register`] can be evaluated.

pub mod energy;
