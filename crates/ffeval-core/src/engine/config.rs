use serde::Deserialize;
use thiserror::Error;

use super::neighbors::{BruteForceSearch, CellListSearch, NeighborSearch};
use super::tasks::pme::{EwaldSum, ReciprocalSolver, SmoothPme};

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("PME interpolation order must be at least 3, got {0}")]
    InvalidPmeOrder(usize),
    #[error("Minimum PME grid nodes ({min_grid_nodes}) must exceed the interpolation order ({order})")]
    InvalidMinGridNodes { min_grid_nodes: usize, order: usize },
    #[error("PME error tolerance must lie in (0, 0.5), got {0}")]
    InvalidErrorTolerance(f64),
    #[error("Ewald k_max must be at least 1")]
    InvalidEwaldKMax,
}

pub const DEFAULT_PME_ORDER: usize = 5;
pub const DEFAULT_PME_MIN_GRID_NODES: usize = 6;
pub const DEFAULT_PME_ERROR_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PmeConfig {
    pub order: usize,
    pub min_grid_nodes: usize,
    pub error_tolerance: f64,
}

impl Default for PmeConfig {
    fn default() -> Self {
        Self {
            order: DEFAULT_PME_ORDER,
            min_grid_nodes: DEFAULT_PME_MIN_GRID_NODES,
            error_tolerance: DEFAULT_PME_ERROR_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NeighborSearchKind {
    #[default]
    CellList,
    BruteForce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "method")]
pub enum ReciprocalKind {
    #[default]
    SmoothPme,
    Ewald { k_max: usize },
}

/// Tunables of a periodic energy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub pme: PmeConfig,
    pub neighbor_search: NeighborSearchKind,
    pub reciprocal: ReciprocalKind,
}

impl EvaluationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pme.order < 3 {
            return Err(ConfigError::InvalidPmeOrder(self.pme.order));
        }
        if self.pme.min_grid_nodes <= self.pme.order {
            return Err(ConfigError::InvalidMinGridNodes {
                min_grid_nodes: self.pme.min_grid_nodes,
                order: self.pme.order,
            });
        }
        let tolerance = self.pme.error_tolerance;
        if !(tolerance > 0.0 && tolerance < 0.5) {
            return Err(ConfigError::InvalidErrorTolerance(tolerance));
        }
        if let ReciprocalKind::Ewald { k_max: 0 } = self.reciprocal {
            return Err(ConfigError::InvalidEwaldKMax);
        }
        Ok(())
    }

    pub fn neighbor_search(&self) -> Box<dyn NeighborSearch> {
        match self.neighbor_search {
            NeighborSearchKind::CellList => Box::new(CellListSearch),
            NeighborSearchKind::BruteForce => Box::new(BruteForceSearch),
        }
    }

    pub fn reciprocal_solver(&self) -> Box<dyn ReciprocalSolver> {
        match self.reciprocal {
            ReciprocalKind::SmoothPme => Box::new(SmoothPme {
                order: self.pme.order,
            }),
            ReciprocalKind::Ewald { k_max } => Box::new(EwaldSum { k_max }),
        }
    }
}

#[derive(Default)]
pub struct EvaluationConfigBuilder {
    pme_order: Option<usize>,
    pme_min_grid_nodes: Option<usize>,
    pme_error_tolerance: Option<f64>,
    neighbor_search: Option<NeighborSearchKind>,
    reciprocal: Option<ReciprocalKind>,
}

impl EvaluationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pme_order(mut self, order: usize) -> Self {
        self.pme_order = Some(order);
        self
    }
    pub fn pme_min_grid_nodes(mut self, nodes: usize) -> Self {
        self.pme_min_grid_nodes = Some(nodes);
        self
    }
    pub fn pme_error_tolerance(mut self, tolerance: f64) -> Self {
        self.pme_error_tolerance = Some(tolerance);
        self
    }
    pub fn neighbor_search(mut self, kind: NeighborSearchKind) -> Self {
        self.neighbor_search = Some(kind);
        self
    }
    pub fn reciprocal(mut self, kind: ReciprocalKind) -> Self {
        self.reciprocal = Some(kind);
        self
    }

    pub fn build(self) -> Result<EvaluationConfig, ConfigError> {
        let config = EvaluationConfig {
            pme: PmeConfig {
                order: self.pme_order.unwrap_or(DEFAULT_PME_ORDER),
                min_grid_nodes: self.pme_min_grid_nodes.unwrap_or(DEFAULT_PME_MIN_GRID_NODES),
                error_tolerance: self
                    .pme_error_tolerance
                    .unwrap_or(DEFAULT_PME_ERROR_TOLERANCE),
            },
            neighbor_search: self.neighbor_search.unwrap_or_default(),
            reciprocal: self.reciprocal.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}
