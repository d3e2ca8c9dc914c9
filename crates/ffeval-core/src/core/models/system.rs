use super::ModelError;
use super::topology::Topology;
use nalgebra::Matrix3;

/// Periodic box vectors [Å]. Each matrix stores the three box vectors as its rows.
#[derive(Debug, Clone, PartialEq)]
pub enum BoxVectors {
    Constant(Matrix3<f64>),
    PerConformer(Vec<Matrix3<f64>>),
}

impl BoxVectors {
    pub fn cubic(length: f64) -> Self {
        BoxVectors::Constant(Matrix3::from_diagonal_element(length))
    }

    pub fn for_conformer(&self, index: usize) -> Option<&Matrix3<f64>> {
        match self {
            BoxVectors::Constant(box_vectors) => Some(box_vectors),
            BoxVectors::PerConformer(per_conformer) => per_conformer.get(index),
        }
    }

    /// The number of frames the box vectors cover, `None` when shared by every frame.
    pub fn n_frames(&self) -> Option<usize> {
        match self {
            BoxVectors::Constant(_) => None,
            BoxVectors::PerConformer(per_conformer) => Some(per_conformer.len()),
        }
    }
}

/// A full molecular system: an ordered sequence of topologies, each replicated
/// `n_copies` times, with particles laid out topology by topology, copy by copy.
#[derive(Debug, Clone, PartialEq)]
pub struct System {
    topologies: Vec<Topology>,
    n_copies: Vec<usize>,
    box_vectors: Option<BoxVectors>,
}

impl System {
    pub fn new(topologies: Vec<Topology>, n_copies: Vec<usize>) -> Result<Self, ModelError> {
        if topologies.len() != n_copies.len() {
            return Err(ModelError::CopyCountMismatch {
                n_topologies: topologies.len(),
                n_counts: n_copies.len(),
            });
        }
        Ok(Self {
            topologies,
            n_copies,
            box_vectors: None,
        })
    }

    pub fn with_box_vectors(mut self, box_vectors: BoxVectors) -> Self {
        self.box_vectors = Some(box_vectors);
        self
    }

    #[inline]
    pub fn is_periodic(&self) -> bool {
        self.box_vectors.is_some()
    }

    pub fn box_vectors(&self) -> Option<&BoxVectors> {
        self.box_vectors.as_ref()
    }

    pub fn n_particles(&self) -> usize {
        self.components()
            .map(|(topology, n_copies)| topology.n_particles() * n_copies)
            .sum()
    }

    pub fn topologies(&self) -> &[Topology] {
        &self.topologies
    }

    pub fn n_copies(&self) -> &[usize] {
        &self.n_copies
    }

    /// Iterates over `(topology, n_copies)` in system order.
    pub fn components(&self) -> impl Iterator<Item = (&Topology, usize)> {
        self.topologies.iter().zip(self.n_copies.iter().copied())
    }

    /// Iterates over `(topology, copy_offset)` for every copy, where `copy_offset` is the
    /// index of the copy's first particle in the full system.
    pub fn copy_offsets(&self) -> impl Iterator<Item = (&Topology, usize)> {
        self.components()
            .scan(0usize, |offset, (topology, n_copies)| {
                let start = *offset;
                *offset += topology.n_particles() * n_copies;
                Some(
                    (0..n_copies)
                        .map(move |copy| (topology, start + copy * topology.n_particles())),
                )
            })
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn topology(n_particles: usize) -> Topology {
        Topology::new(n_particles, HashMap::new()).unwrap()
    }

    #[test]
    fn n_particles_sums_over_topologies_and_copies() {
        let system = System::new(vec![topology(3), topology(2)], vec![2, 4]).unwrap();
        assert_eq!(system.n_particles(), 14);
        assert!(!system.is_periodic());
    }

    #[test]
    fn new_rejects_mismatched_copy_counts() {
        let result = System::new(vec![topology(3)], vec![1, 2]);
        assert_eq!(
            result,
            Err(ModelError::CopyCountMismatch {
                n_topologies: 1,
                n_counts: 2
            })
        );
    }

    #[test]
    fn copy_offsets_follow_topology_then_copy_order() {
        let system = System::new(vec![topology(3), topology(2)], vec![2, 2]).unwrap();
        let offsets: Vec<usize> = system.copy_offsets().map(|(_, offset)| offset).collect();
        assert_eq!(offsets, vec![0, 3, 6, 8]);
    }

    #[test]
    fn with_box_vectors_marks_system_periodic() {
        let system = System::new(vec![topology(1)], vec![1])
            .unwrap()
            .with_box_vectors(BoxVectors::cubic(20.0));
        assert!(system.is_periodic());
        let box_vectors = system.box_vectors().unwrap().for_conformer(7).unwrap();
        assert_eq!(box_vectors[(1, 1)], 20.0);
    }

    #[test]
    fn per_conformer_box_vectors_are_indexed_by_frame() {
        let boxes = BoxVectors::PerConformer(vec![
            Matrix3::from_diagonal_element(10.0),
            Matrix3::from_diagonal_element(12.0),
        ]);
        assert_eq!(boxes.n_frames(), Some(2));
        assert_eq!(boxes.for_conformer(1).unwrap()[(2, 2)], 12.0);
        assert!(boxes.for_conformer(2).is_none());
    }
}
