/// Per-conformer energies [kcal/mol] of a single potential.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyTerm {
    pub potential_type: String,
    pub energies: Vec<f64>,
}

impl EnergyTerm {
    pub fn new(potential_type: impl Into<String>, energies: Vec<f64>) -> Self {
        Self {
            potential_type: potential_type.into(),
            energies,
        }
    }

    #[inline]
    pub fn n_conformers(&self) -> usize {
        self.energies.len()
    }
}

/// Energies of every evaluated potential, kept in force field order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnergyBreakdown {
    terms: Vec<EnergyTerm>,
}

impl EnergyBreakdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, term: EnergyTerm) {
        self.terms.push(term);
    }

    pub fn terms(&self) -> &[EnergyTerm] {
        &self.terms
    }

    pub fn term(&self, potential_type: &str) -> Option<&EnergyTerm> {
        self.terms
            .iter()
            .find(|term| term.potential_type == potential_type)
    }

    /// Element-wise sum of all terms, one value per conformer.
    pub fn total(&self, n_conformers: usize) -> Vec<f64> {
        let mut total = vec![0.0; n_conformers];
        for term in &self.terms {
            for (acc, energy) in total.iter_mut().zip(&term.energies) {
                *acc += energy;
            }
        }
        total
    }
}

impl FromIterator<EnergyTerm> for EnergyBreakdown {
    fn from_iter<I: IntoIterator<Item = EnergyTerm>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().collect(),
        }
    }
}
