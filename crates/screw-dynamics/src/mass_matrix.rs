//! Joint-space mass matrix.

use screw_math::DMat;
use screw_model::KinematicTree;

use crate::Result;

/// Computes the joint-space mass matrix `M(q)` of a tree.
///
/// Rows and columns are indexed by the tree's velocity offsets. The matrix
/// is symmetric positive semi-definite, and definite when every subtree
/// carries mass along every free direction.
pub trait MassMatrixCalculator {
    fn compute(&mut self, tree: &KinematicTree) -> Result<()>;

    /// Last computed matrix; empty before the first `compute`.
    fn mass_matrix(&self) -> &DMat;

    /// Compute and return a copy of the matrix.
    fn compute_mass_matrix(&mut self, tree: &KinematicTree) -> Result<DMat> {
        self.compute(tree)?;
        Ok(self.mass_matrix().clone())
    }
}
