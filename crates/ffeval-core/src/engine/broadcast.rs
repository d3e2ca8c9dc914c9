use crate::core::models::potential::Potential;
use crate::core::models::system::System;
use crate::core::models::topology::{NonbondedParameterMap, ParameterMap, Topology};
use crate::engine::error::EnergyError;
use nalgebra::DMatrix;

/// Full-system exclusion pairs and the scale factor of each, in broadcast order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BroadcastExclusions {
    pub pairs: Vec<[usize; 2]>,
    pub scales: Vec<f64>,
}

impl BroadcastExclusions {
    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Full-system valence interactions: one particle tuple and one parameter row each.
#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastValence {
    pub particle_idxs: Vec<Vec<usize>>,
    pub parameters: DMatrix<f64>,
}

pub(crate) fn parameter_map<'a>(
    topology: &'a Topology,
    potential: &Potential,
) -> Result<&'a ParameterMap, EnergyError> {
    topology
        .parameters(&potential.potential_type)
        .ok_or_else(|| EnergyError::MissingParameterMap {
            potential_type: potential.potential_type.clone(),
        })
}

pub(crate) fn nonbonded_map<'a>(
    topology: &'a Topology,
    potential: &Potential,
) -> Result<&'a NonbondedParameterMap, EnergyError> {
    let map = parameter_map(topology, potential)?;
    map.as_nonbonded()
        .ok_or_else(|| EnergyError::ParameterMapMismatch {
            potential_type: potential.potential_type.clone(),
            expected: "non-bonded",
            found: map.kind(),
        })
}

/// `assignment_matrix · parameters` for a single parameter map.
pub fn apply_parameters(
    map: &ParameterMap,
    potential: &Potential,
) -> Result<DMatrix<f64>, EnergyError> {
    let assignment = map.assignment_matrix();
    if assignment.ncols() != potential.parameters.nrows() {
        return Err(EnergyError::ShapeMismatch {
            what: "assignment matrix columns",
            expected: potential.parameters.nrows(),
            found: assignment.ncols(),
        });
    }
    Ok(assignment * &potential.parameters)
}

/// Stacks the applied parameters of every topology, repeated once per copy.
///
/// For a non-bonded potential the result has one row per system particle; for a
/// valence potential one row per system interaction.
pub fn broadcast_parameters(
    system: &System,
    potential: &Potential,
) -> Result<DMatrix<f64>, EnergyError> {
    let applied = system
        .components()
        .map(|(topology, n_copies)| {
            let map = parameter_map(topology, potential)?;
            Ok((apply_parameters(map, potential)?, n_copies))
        })
        .collect::<Result<Vec<_>, EnergyError>>()?;

    let n_rows = applied
        .iter()
        .map(|(values, n_copies)| values.nrows() * n_copies)
        .sum();
    let mut parameters = DMatrix::zeros(n_rows, potential.parameters.ncols());

    let mut row = 0;
    for (values, n_copies) in &applied {
        for _ in 0..*n_copies {
            parameters
                .rows_mut(row, values.nrows())
                .copy_from(values);
            row += values.nrows();
        }
    }
    Ok(parameters)
}

/// Offsets every topology's exclusions into the full system and resolves their scales
/// from the potential's attributes.
pub fn broadcast_exclusions(
    system: &System,
    potential: &Potential,
) -> Result<BroadcastExclusions, EnergyError> {
    let mut broadcast = BroadcastExclusions::default();
    let mut offset = 0;

    for (topology, n_copies) in system.components() {
        let map = nonbonded_map(topology, potential)?;
        let scales = map
            .exclusion_scale_idxs
            .iter()
            .map(|&idx| potential.attribute_at(idx))
            .collect::<Result<Vec<_>, _>>()?;

        for copy in 0..n_copies {
            let copy_offset = offset + copy * topology.n_particles();
            broadcast.pairs.extend(
                map.exclusions
                    .iter()
                    .map(|&[i, j]| [i + copy_offset, j + copy_offset]),
            );
            broadcast.scales.extend_from_slice(&scales);
        }
        offset += n_copies * topology.n_particles();
    }
    Ok(broadcast)
}

pub fn broadcast_valence(
    system: &System,
    potential: &Potential,
) -> Result<BroadcastValence, EnergyError> {
    let mut particle_idxs = Vec::new();

    for (topology, copy_offset) in system.copy_offsets() {
        let map = parameter_map(topology, potential)?;
        let map = map
            .as_valence()
            .ok_or_else(|| EnergyError::ParameterMapMismatch {
                potential_type: potential.potential_type.clone(),
                expected: "valence",
                found: map.kind(),
            })?;
        particle_idxs.extend(
            map.particle_idxs
                .iter()
                .map(|idxs| idxs.iter().map(|idx| idx + copy_offset).collect()),
        );
    }

    Ok(BroadcastValence {
        particle_idxs,
        parameters: broadcast_parameters(system, potential)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::topology::ValenceParameterMap;
    use std::collections::HashMap;

    fn vdw_potential() -> Potential {
        Potential::new(
            "vdW",
            "4*epsilon*((sigma/r)**12-(sigma/r)**6)",
            DMatrix::from_row_slice(2, 2, &[0.1, 3.0, 0.2, 4.0]),
            vec!["a".to_string(), "b".to_string()],
            vec!["epsilon".to_string(), "sigma".to_string()],
        )
        .unwrap()
        .with_attributes(
            vec!["scale_12".to_string(), "scale_13".to_string()],
            vec![0.0, 0.5],
        )
        .unwrap()
    }

    fn water_like() -> Topology {
        let map = NonbondedParameterMap {
            assignment_matrix: DMatrix::from_row_slice(3, 2, &[0.0, 1.0, 1.0, 0.0, 1.0, 0.0]),
            exclusions: vec![[0, 1], [0, 2], [1, 2]],
            exclusion_scale_idxs: vec![0, 0, 1],
        };
        Topology::new(
            3,
            HashMap::from([("vdW".to_string(), ParameterMap::Nonbonded(map))]),
        )
        .unwrap()
    }

    fn ion() -> Topology {
        let map = NonbondedParameterMap {
            assignment_matrix: DMatrix::from_row_slice(1, 2, &[0.5, 0.5]),
            exclusions: vec![],
            exclusion_scale_idxs: vec![],
        };
        Topology::new(
            1,
            HashMap::from([("vdW".to_string(), ParameterMap::Nonbonded(map))]),
        )
        .unwrap()
    }

    #[test]
    fn broadcast_parameters_of_single_copy_equals_applied_parameters() {
        let system = System::new(vec![water_like()], vec![1]).unwrap();
        let potential = vdw_potential();
        let parameters = broadcast_parameters(&system, &potential).unwrap();
        let map = system.topologies()[0].parameters("vdW").unwrap();
        assert_eq!(parameters, apply_parameters(map, &potential).unwrap());
        assert_eq!(parameters.row(0)[1], 4.0);
        assert_eq!(parameters.row(1)[1], 3.0);
    }

    #[test]
    fn broadcast_parameters_replicates_in_topology_then_copy_order() {
        let system = System::new(vec![water_like(), ion()], vec![2, 2]).unwrap();
        let parameters = broadcast_parameters(&system, &vdw_potential()).unwrap();
        assert_eq!(parameters.shape(), (8, 2));
        assert_eq!(parameters.row(3), parameters.row(0));
        assert_eq!(parameters.row(5), parameters.row(2));
        assert!((parameters[(6, 0)] - 0.15).abs() < 1e-12);
        assert!((parameters[(7, 1)] - 3.5).abs() < 1e-12);
    }

    #[test]
    fn broadcast_exclusions_offsets_each_copy() {
        let system = System::new(vec![ion(), water_like()], vec![1, 2]).unwrap();
        let exclusions = broadcast_exclusions(&system, &vdw_potential()).unwrap();
        assert_eq!(
            exclusions.pairs,
            vec![[1, 2], [1, 3], [2, 3], [4, 5], [4, 6], [5, 6]]
        );
        assert_eq!(exclusions.scales, vec![0.0, 0.0, 0.5, 0.0, 0.0, 0.5]);
    }

    #[test]
    fn broadcast_exclusions_fails_for_out_of_range_scale_index() {
        let map = NonbondedParameterMap {
            assignment_matrix: DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1.0]),
            exclusions: vec![[0, 1]],
            exclusion_scale_idxs: vec![7],
        };
        let topology = Topology::new(
            2,
            HashMap::from([("vdW".to_string(), ParameterMap::Nonbonded(map))]),
        )
        .unwrap();
        let system = System::new(vec![topology], vec![1]).unwrap();
        let result = broadcast_exclusions(&system, &vdw_potential());
        assert!(matches!(result, Err(EnergyError::Model { .. })));
    }

    #[test]
    fn broadcast_fails_for_missing_parameter_map() {
        let topology = Topology::new(2, HashMap::new()).unwrap();
        let system = System::new(vec![topology], vec![1]).unwrap();
        let result = broadcast_parameters(&system, &vdw_potential());
        assert_eq!(
            result,
            Err(EnergyError::MissingParameterMap {
                potential_type: "vdW".to_string()
            })
        );
    }

    #[test]
    fn apply_parameters_rejects_mismatched_assignment_columns() {
        let map = ParameterMap::Nonbonded(NonbondedParameterMap {
            assignment_matrix: DMatrix::zeros(1, 3),
            exclusions: vec![],
            exclusion_scale_idxs: vec![],
        });
        let result = apply_parameters(&map, &vdw_potential());
        assert!(matches!(result, Err(EnergyError::ShapeMismatch { .. })));
    }

    #[test]
    fn broadcast_valence_offsets_particle_tuples() {
        let bonds = Potential::new(
            "Bonds",
            "k/2*(r-length)**2",
            DMatrix::from_row_slice(1, 2, &[500.0, 1.0]),
            vec!["b".to_string()],
            vec!["k".to_string(), "length".to_string()],
        )
        .unwrap();
        let map = ValenceParameterMap {
            assignment_matrix: DMatrix::from_row_slice(2, 1, &[1.0, 1.0]),
            particle_idxs: vec![vec![0, 1], vec![0, 2]],
        };
        let topology = Topology::new(
            3,
            HashMap::from([("Bonds".to_string(), ParameterMap::Valence(map))]),
        )
        .unwrap();
        let system = System::new(vec![topology], vec![2]).unwrap();

        let valence = broadcast_valence(&system, &bonds).unwrap();
        assert_eq!(
            valence.particle_idxs,
            vec![vec![0, 1], vec![0, 2], vec![3, 4], vec![3, 5]]
        );
        assert_eq!(valence.parameters.shape(), (4, 2));

        let result = broadcast_exclusions(&system, &bonds);
        assert!(matches!(
            result,
            Err(EnergyError::ParameterMapMismatch {
                expected: "non-bonded",
                found: "valence",
                ..
            })
        ));
    }
}
