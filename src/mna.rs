use nalgebra::{DMatrix, DVector};
use log::debug;

use crate::component::{Component, Element};
use crate::error::{CircuitError, Result, SingularDiagnostic};
use crate::solver::row_norms;

/// MNA system representation: [A][x] = [z]
/// where A is the system matrix, x is the unknown vector, and z is the RHS vector.
///
/// Rows `0..num_nodes` hold node potentials, the remaining rows hold the
/// branch currents of voltage sources in enumeration order.
#[derive(Debug, Clone)]
pub struct MnaSystem {
    /// System matrix A (coefficient matrix)
    pub matrix: DMatrix<f64>,
    /// Right-hand side vector z
    pub rhs: DVector<f64>,
    /// Unknown vector x (node voltages + voltage source currents)
    pub unknowns: DVector<f64>,
    /// Total system size
    pub size: usize,
    /// Number of nodes, ground included
    pub num_nodes: usize,
    /// Number of voltage sources
    pub num_voltage_sources: usize,
}

impl MnaSystem {
    /// Create a zeroed system for `num_nodes` node rows and one extra row
    /// per voltage source
    pub fn new(num_nodes: usize, num_voltage_sources: usize) -> Result<Self> {
        if num_nodes == 0 {
            return Err(CircuitError::EmptyNetwork);
        }

        let size = num_nodes + num_voltage_sources;

        Ok(MnaSystem {
            matrix: DMatrix::zeros(size, size),
            rhs: DVector::zeros(size),
            unknowns: DVector::zeros(size),
            size,
            num_nodes,
            num_voltage_sources,
        })
    }

    /// Row of the `k`-th voltage source's branch current
    pub fn voltage_source_index(&self, k: usize) -> usize {
        self.num_nodes + k
    }

    /// Let `component` add its terms between node rows `n1` and `n2`
    pub fn stamp(&mut self, component: &mut Component, n1: usize, n2: usize, voltage_source_index: Option<usize>) -> Result<()> {
        debug!("Stamping {} at ({}, {}) aux {:?}", component.name(), n1, n2, voltage_source_index);
        component.stamp(&mut self.matrix, &mut self.rhs, n1, n2, voltage_source_index)
    }

    /// Pin the potential of node row `ground` to zero
    pub fn fix_ground(&mut self, ground: usize) {
        self.matrix.row_mut(ground).fill(0.0);
        self.matrix.column_mut(ground).fill(0.0);
        self.matrix[(ground, ground)] = 1.0;
        self.rhs[ground] = 0.0;
    }

    /// Euclidean norm of every row of the system matrix
    pub fn row_norms(&self) -> Vec<f64> {
        row_norms(&self.matrix)
    }

    /// Build the diagnostic for a rank-deficient system.
    ///
    /// `node_names` labels the node rows in index order.
    pub fn diagnose(&self, rank: usize, node_names: &[String], zero_row_tolerance: f64) -> SingularDiagnostic {
        let row_norms = self.row_norms();
        debug!(
            "row norms: {:?}",
            row_norms
                .iter()
                .enumerate()
                .map(|(i, norm)| format!("{}:{:.2e}", i, norm))
                .collect::<Vec<_>>()
        );

        let zero_rows = row_norms
            .iter()
            .enumerate()
            .filter(|(_, norm)| **norm < zero_row_tolerance)
            .map(|(row, _)| (row, self.row_label(row, node_names)))
            .collect();

        SingularDiagnostic {
            dimension: self.size,
            rank,
            row_norms,
            zero_rows,
        }
    }

    fn row_label(&self, row: usize, node_names: &[String]) -> String {
        if row < self.num_nodes {
            match node_names.get(row) {
                Some(name) => format!("Node {}", name),
                None => format!("Node #{}", row),
            }
        } else {
            format!("Voltage Source {}", row - self.num_nodes)
        }
    }

    /// Store the solution of the assembled system
    pub fn update_solution(&mut self, solution: DVector<f64>) {
        self.unknowns = solution;
    }

    /// Potential of node row `index`
    pub fn node_voltage(&self, index: usize) -> f64 {
        self.unknowns[index]
    }

    /// Branch current of the `k`-th voltage source
    pub fn voltage_source_current(&self, k: usize) -> f64 {
        self.unknowns[self.voltage_source_index(k)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{ComponentData, IdealParameters};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_mna_layout() {
        let mna = MnaSystem::new(3, 2).unwrap();
        assert_eq!(mna.size, 5);
        assert_eq!(mna.voltage_source_index(0), 3);
        assert_eq!(mna.voltage_source_index(1), 4);
        assert!(mna.matrix.iter().all(|&v| v == 0.0));

        assert_eq!(MnaSystem::new(0, 1).unwrap_err(), CircuitError::EmptyNetwork);
    }

    #[test]
    fn test_mna_simple_resistor_circuit() {
        // V1 raises node 1 by 5V above ground, R1 returns to ground
        let mut mna = MnaSystem::new(2, 1).unwrap();
        let mut v1 = Component::voltage_source(
            ComponentData::new("V1", "0", "1").with_ideal_parameters(IdealParameters::voltage_source(5.0, 0.0)),
        );
        let mut r1 = Component::resistor(ComponentData::new("R1", "1", "0").with_resistance(1000.0));

        mna.stamp(&mut r1, 1, 0, None).unwrap();
        let vs = mna.voltage_source_index(0);
        mna.stamp(&mut v1, 0, 1, Some(vs)).unwrap();
        mna.fix_ground(0);

        assert_eq!(mna.matrix[(0, 0)], 1.0);
        assert_eq!(mna.matrix[(0, 1)], 0.0);
        assert_eq!(mna.matrix[(2, 0)], 0.0);
        assert_eq!(mna.matrix[(1, 1)], 0.001);
        assert_eq!(mna.matrix[(1, 2)], -1.0);
        assert_eq!(mna.rhs[2], -5.0);

        let solution = mna.matrix.clone().lu().solve(&mna.rhs).unwrap();
        mna.update_solution(solution);

        assert!((mna.node_voltage(1) - 5.0).abs() < 1e-12);
        assert!((mna.voltage_source_current(0) - 0.005).abs() < 1e-12);
    }

    #[test]
    fn test_diagnose_labels_zero_rows() {
        let mut mna = MnaSystem::new(3, 1).unwrap();
        mna.matrix[(0, 0)] = 1.0;
        mna.matrix[(1, 1)] = 0.5;

        let diagnostic = mna.diagnose(2, &names(&["n0", "n1", "x"]), 1e-12);

        assert_eq!(diagnostic.dimension, 4);
        assert_eq!(diagnostic.rank, 2);
        assert_eq!(diagnostic.row_norms, vec![1.0, 0.5, 0.0, 0.0]);
        assert_eq!(
            diagnostic.zero_rows,
            vec![(2, "Node x".to_string()), (3, "Voltage Source 0".to_string())]
        );
    }
}
