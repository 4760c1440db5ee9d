use nalgebra::{DMatrix, DVector};
use log::debug;
use std::time::Instant;

use crate::error::{CircuitError, Result, SingularDiagnostic};

/// Solver configuration
#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub method: SolverMethod,
    /// Singular values at or below this count as zero when computing the
    /// rank. `None` scales the threshold with the matrix size and its largest
    /// singular value.
    pub rank_tolerance: Option<f64>,
    /// Rows with a Euclidean norm below this are reported as empty
    pub zero_row_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            method: SolverMethod::Lu,
            rank_tolerance: None,
            zero_row_tolerance: 1e-12,
        }
    }
}

/// Available direct solver methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverMethod {
    /// LU decomposition with partial pivoting
    Lu,
    /// QR decomposition
    Qr,
}

/// Solver statistics
#[derive(Debug, Clone)]
pub struct SolverStats {
    pub method_used: SolverMethod,
    pub residual_norm: f64,
    pub solve_time: f64,
}

/// Dense linear system solver
#[derive(Debug, Clone)]
pub struct LinearSolver {
    config: SolverConfig,
}

impl LinearSolver {
    /// Create a new solver with default configuration
    pub fn new() -> Self {
        LinearSolver {
            config: SolverConfig::default(),
        }
    }

    /// Create a new solver with custom configuration
    pub fn with_config(config: SolverConfig) -> Self {
        LinearSolver { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Numerical rank of `matrix` from its singular values
    pub fn rank(&self, matrix: &DMatrix<f64>) -> usize {
        if matrix.is_empty() {
            return 0;
        }

        let singular_values = matrix.clone().svd(false, false).singular_values;
        let tolerance = match self.config.rank_tolerance {
            Some(tolerance) => tolerance,
            None => {
                let largest = singular_values.iter().fold(0.0f64, |acc, &s| acc.max(s));
                largest * matrix.nrows().max(matrix.ncols()) as f64 * f64::EPSILON
            }
        };

        singular_values.iter().filter(|&&s| s > tolerance).count()
    }

    /// Solve the linear system Ax = b exactly with a dense direct method
    pub fn solve_dense(&self, matrix: &DMatrix<f64>, rhs: &DVector<f64>) -> Result<(DVector<f64>, SolverStats)> {
        let start_time = Instant::now();

        let solution = match self.config.method {
            SolverMethod::Lu => matrix.clone().lu().solve(rhs),
            SolverMethod::Qr => matrix.clone().qr().solve(rhs),
        };

        let solution = solution.ok_or_else(|| {
            CircuitError::SingularSystem(SingularDiagnostic {
                dimension: matrix.nrows(),
                rank: self.rank(matrix),
                row_norms: row_norms(matrix),
                zero_rows: Vec::new(),
            })
        })?;

        let residual_norm = (matrix * &solution - rhs).norm();
        let stats = SolverStats {
            method_used: self.config.method,
            residual_norm,
            solve_time: start_time.elapsed().as_secs_f64(),
        };
        debug!(
            "{:?} solve of {}x{} system, residual {:.2e}",
            stats.method_used,
            matrix.nrows(),
            matrix.ncols(),
            stats.residual_norm
        );

        Ok((solution, stats))
    }
}

impl Default for LinearSolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Euclidean norm of every row of `matrix`
pub fn row_norms(matrix: &DMatrix<f64>) -> Vec<f64> {
    matrix.row_iter().map(|row| row.norm()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_lu_solver() {
        let solver = LinearSolver::new();

        // [2 1; 1 2] * [x; y] = [3; 3] has the solution [1; 1]
        let matrix = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]);
        let rhs = DVector::from_vec(vec![3.0, 3.0]);

        let (solution, stats) = solver.solve_dense(&matrix, &rhs).unwrap();

        assert!((solution[0] - 1.0).abs() < 1e-10);
        assert!((solution[1] - 1.0).abs() < 1e-10);
        assert!(stats.residual_norm < 1e-12);
        assert_eq!(stats.method_used, SolverMethod::Lu);
    }

    #[test]
    fn test_dense_qr_solver() {
        let solver = LinearSolver::with_config(SolverConfig {
            method: SolverMethod::Qr,
            ..SolverConfig::default()
        });

        let matrix = DMatrix::from_row_slice(2, 2, &[4.0, -2.0, 1.0, 1.0]);
        let rhs = DVector::from_vec(vec![2.0, 2.0]);

        let (solution, stats) = solver.solve_dense(&matrix, &rhs).unwrap();

        assert!((solution[0] - 1.0).abs() < 1e-10);
        assert!((solution[1] - 1.0).abs() < 1e-10);
        assert_eq!(stats.method_used, SolverMethod::Qr);
    }

    #[test]
    fn test_singular_lu_is_reported() {
        let solver = LinearSolver::new();
        let matrix = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 0.0, 0.0]);
        let rhs = DVector::from_vec(vec![1.0, 0.0]);

        match solver.solve_dense(&matrix, &rhs) {
            Err(CircuitError::SingularSystem(diagnostic)) => {
                assert_eq!(diagnostic.dimension, 2);
                assert_eq!(diagnostic.rank, 1);
                assert_eq!(diagnostic.row_norms[1], 0.0);
            }
            other => panic!("expected singular system, got {:?}", other),
        }
    }

    #[test]
    fn test_rank() {
        let solver = LinearSolver::new();

        let full = DMatrix::from_row_slice(3, 3, &[1.0, 0.0, 0.0, 0.0, 1e10, -1e10, 0.0, -1e10, 1e10 + 0.1]);
        assert_eq!(solver.rank(&full), 3);

        let deficient = DMatrix::from_row_slice(3, 3, &[1.0, 0.0, 0.0, 0.0, 0.1, -0.1, 0.0, -0.1, 0.1]);
        assert_eq!(solver.rank(&deficient), 2);

        assert_eq!(solver.rank(&DMatrix::zeros(0, 0)), 0);
    }

    #[test]
    fn test_row_norms() {
        let matrix = DMatrix::from_row_slice(2, 2, &[3.0, 4.0, 0.0, 0.0]);
        assert_eq!(row_norms(&matrix), vec![5.0, 0.0]);
    }
}
