use crate::core::models::ModelError;
use crate::core::models::potential::{ForceField, Potential};
use nalgebra::DMatrix;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ParameterRecord {
    pub key: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PotentialRecord {
    #[serde(rename = "type")]
    pub potential_type: String,
    #[serde(rename = "fn")]
    pub functional_form: String,
    #[serde(default)]
    pub parameter_cols: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterRecord>,
    #[serde(default)]
    pub attribute_cols: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<f64>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
struct ForceFieldRecord {
    #[serde(default)]
    potentials: Vec<PotentialRecord>,
}

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Parameter '{key}' of potential '{potential_type}' has {found} values, expected {expected}")]
    RaggedParameters {
        potential_type: String,
        key: String,
        expected: usize,
        found: usize,
    },
    #[error("Invalid potential in '{path}': {source}")]
    Model { path: String, source: ModelError },
}

impl PotentialRecord {
    fn into_potential(self, path: &str) -> Result<Potential, ParamLoadError> {
        let n_cols = if self.parameter_cols.is_empty() {
            self.parameters.first().map_or(0, |p| p.values.len())
        } else {
            self.parameter_cols.len()
        };
        if let Some(ragged) = self.parameters.iter().find(|p| p.values.len() != n_cols) {
            return Err(ParamLoadError::RaggedParameters {
                potential_type: self.potential_type,
                key: ragged.key.clone(),
                expected: n_cols,
                found: ragged.values.len(),
            });
        }

        let parameters = DMatrix::from_row_iterator(
            self.parameters.len(),
            n_cols,
            self.parameters.iter().flat_map(|p| p.values.iter().copied()),
        );
        let keys = self.parameters.into_iter().map(|p| p.key).collect();

        Potential::new(
            self.potential_type,
            self.functional_form,
            parameters,
            keys,
            self.parameter_cols,
        )
        .and_then(|potential| potential.with_attributes(self.attribute_cols, self.attributes))
        .map_err(|e| ParamLoadError::Model {
            path: path.to_string(),
            source: e,
        })
    }
}

impl ForceField {
    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::parse(&content, &path.to_string_lossy())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ParamLoadError> {
        Self::parse(content, "<string>")
    }

    fn parse(content: &str, path: &str) -> Result<Self, ParamLoadError> {
        let record: ForceFieldRecord =
            toml::from_str(content).map_err(|e| ParamLoadError::Toml {
                path: path.to_string(),
                source: e,
            })?;

        let potentials = record
            .potentials
            .into_iter()
            .map(|potential| potential.into_potential(path))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ForceField::new(potentials))
    }
}
