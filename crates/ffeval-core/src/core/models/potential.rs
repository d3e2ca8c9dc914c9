use super::ModelError;
use nalgebra::DMatrix;

/// The global parameter table of one interaction type.
#[derive(Debug, Clone, PartialEq)]
pub struct Potential {
    /// The interaction type, e.g. `"vdW"` or `"Electrostatics"`.
    pub potential_type: String,
    /// The functional form, e.g. the literal Lennard-Jones expression or `"coul"`.
    pub functional_form: String,
    /// `(n_parameter_types, n_parameter_cols)` table of parameter values.
    pub parameters: DMatrix<f64>,
    /// Opaque identifiers aligned with the rows of `parameters`.
    pub parameter_keys: Vec<String>,
    pub parameter_cols: Vec<String>,
    pub attributes: Vec<f64>,
    pub attribute_cols: Vec<String>,
}

impl Potential {
    pub fn new(
        potential_type: impl Into<String>,
        functional_form: impl Into<String>,
        parameters: DMatrix<f64>,
        parameter_keys: Vec<String>,
        parameter_cols: Vec<String>,
    ) -> Result<Self, ModelError> {
        let potential_type = potential_type.into();
        if parameter_keys.len() != parameters.nrows() {
            return Err(ModelError::PotentialShape {
                potential_type,
                what: "parameter keys",
                expected: parameters.nrows(),
                found: parameter_keys.len(),
            });
        }
        if !parameter_cols.is_empty() && parameter_cols.len() != parameters.ncols() {
            return Err(ModelError::PotentialShape {
                potential_type,
                what: "parameter columns",
                expected: parameters.ncols(),
                found: parameter_cols.len(),
            });
        }
        Ok(Self {
            potential_type,
            functional_form: functional_form.into(),
            parameters,
            parameter_keys,
            parameter_cols,
            attributes: Vec::new(),
            attribute_cols: Vec::new(),
        })
    }

    pub fn with_attributes(
        mut self,
        attribute_cols: Vec<String>,
        attributes: Vec<f64>,
    ) -> Result<Self, ModelError> {
        if attribute_cols.len() != attributes.len() {
            return Err(ModelError::PotentialShape {
                potential_type: self.potential_type,
                what: "attribute values",
                expected: attribute_cols.len(),
                found: attributes.len(),
            });
        }
        self.attribute_cols = attribute_cols;
        self.attributes = attributes;
        Ok(self)
    }

    pub fn attribute(&self, name: &str) -> Option<f64> {
        self.attribute_cols
            .iter()
            .position(|col| col == name)
            .map(|idx| self.attributes[idx])
    }

    pub fn require_attribute(&self, name: &str) -> Result<f64, ModelError> {
        self.attribute(name)
            .ok_or_else(|| ModelError::MissingAttribute {
                potential_type: self.potential_type.clone(),
                attribute: name.to_string(),
            })
    }

    pub fn attribute_at(&self, index: usize) -> Result<f64, ModelError> {
        self.attributes
            .get(index)
            .copied()
            .ok_or_else(|| ModelError::AttributeIndexOutOfRange {
                potential_type: self.potential_type.clone(),
                index,
                n_attributes: self.attributes.len(),
            })
    }

    pub fn require_columns(&self, expected: usize) -> Result<(), ModelError> {
        if self.parameters.ncols() != expected {
            return Err(ModelError::PotentialShape {
                potential_type: self.potential_type.clone(),
                what: "parameter columns",
                expected,
                found: self.parameters.ncols(),
            });
        }
        Ok(())
    }
}

/// An ordered collection of potentials, evaluated and summed in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForceField {
    pub potentials: Vec<Potential>,
}

impl ForceField {
    pub fn new(potentials: Vec<Potential>) -> Self {
        Self { potentials }
    }

    pub fn potential(&self, potential_type: &str) -> Option<&Potential> {
        self.potentials
            .iter()
            .find(|potential| potential.potential_type == potential_type)
    }
}
