//! Sorted eigen-decomposition of symmetric 3x3 matrices.

use nalgebra::{Matrix3, SymmetricEigen, Vector3};

/// Eigen-system with eigenvalues sorted in decreasing order. Column `i` of
/// `vectors` is the unit eigenvector of `values[i]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SortedEigen {
    pub values: [f64; 3],
    pub vectors: Matrix3<f64>,
}

impl SortedEigen {
    pub fn new(m: &Matrix3<f64>) -> Self {
        let eig = SymmetricEigen::new(*m);
        let mut order = [0usize, 1, 2];
        order.sort_by(|&a, &b| eig.eigenvalues[b].total_cmp(&eig.eigenvalues[a]));
        let values = order.map(|i| eig.eigenvalues[i]);
        let vectors = Matrix3::from_columns(&[
            eig.eigenvectors.column(order[0]).into_owned(),
            eig.eigenvectors.column(order[1]).into_owned(),
            eig.eigenvectors.column(order[2]).into_owned(),
        ]);
        Self { values, vectors }
    }

    /// Direction of greatest variance.
    pub fn major(&self) -> Vector3<f64> {
        self.vectors.column(0).into_owned()
    }

    pub fn intermediate(&self) -> Vector3<f64> {
        self.vectors.column(1).into_owned()
    }

    /// Direction of least variance (the plane normal for planar scatter).
    pub fn minor(&self) -> Vector3<f64> {
        self.vectors.column(2).into_owned()
    }

    /// Number of eigenvalues above `rel_tol` times the largest one.
    pub fn rank(&self, rel_tol: f64) -> usize {
        let largest = self.values[0];
        if !(largest.is_finite() && largest > 0.0) {
            return 0;
        }
        self.values
            .iter()
            .filter(|v| v.is_finite() && **v > largest * rel_tol)
            .count()
    }
}
