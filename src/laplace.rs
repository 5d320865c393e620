//! Discrete Laplace assembly and the harmonic-extension solve.
//!
//! The stiffness matrix of ∫∇u·∇v is assembled with linear (P1) elements on
//! the triangle cells. Dirichlet constraints are eliminated symmetrically:
//! the free degrees of freedom form a reduced positive-definite system and
//! the constrained values move to the right-hand side, so prescribed boundary
//! values are carried exactly rather than solved for.

use std::collections::BTreeMap;

use nalgebra::{DVector, Vector2};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{MotionError, MotionResult};
use crate::mesh::TriangleMesh;

/// Cells flatter than this signed area are rejected as degenerate.
const MIN_CELL_AREA: f64 = 1e-14;

/// Row count above which the matrix-vector product runs on the rayon pool.
const PAR_ROWS: usize = 5_000;

/// Solves `A x = b` for a sparse symmetric positive-definite matrix.
///
/// This is the seam between the mesh-motion logic and the linear-algebra
/// backend: anything that can solve the reduced stiffness system can drive
/// the deformation.
pub trait LinearSolver {
    /// Solves the system, returning the solution vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the system is singular or the solve does not
    /// converge.
    fn solve(&self, matrix: &CsrMatrix<f64>, rhs: &DVector<f64>) -> MotionResult<DVector<f64>>;
}

/// Conjugate-gradient solver for the reduced stiffness system.
///
/// The reduced system is symmetric positive definite whenever at least one
/// node is constrained, which the motion layer guarantees, so plain CG
/// without preconditioning is sufficient for the mesh sizes this crate
/// targets.
///
/// # Examples
///
/// ```
/// use mesh_harmonic::ConjugateGradient;
///
/// let solver = ConjugateGradient::default();
/// assert_eq!(solver.tolerance, 1e-10);
///
/// let strict = ConjugateGradient::with_tolerance(1e-12);
/// assert_eq!(strict.tolerance, 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConjugateGradient {
    /// Relative residual tolerance (scaled by the right-hand side norm).
    pub tolerance: f64,
    /// Iteration cap. `None` uses ten times the system size.
    pub max_iterations: Option<usize>,
}

impl Default for ConjugateGradient {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: None,
        }
    }
}

impl ConjugateGradient {
    /// Creates a solver with the given relative tolerance.
    #[must_use]
    pub const fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance,
            max_iterations: None,
        }
    }

    /// Sets the iteration cap.
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }
}

impl LinearSolver for ConjugateGradient {
    fn solve(&self, matrix: &CsrMatrix<f64>, rhs: &DVector<f64>) -> MotionResult<DVector<f64>> {
        let n = rhs.len();
        let mut x = DVector::zeros(n);

        let rhs_norm = rhs.norm();
        if rhs_norm == 0.0 {
            return Ok(x);
        }
        let tolerance = self.tolerance * rhs_norm;
        let max_iterations = self.max_iterations.unwrap_or_else(|| 10 * n.max(100));

        let mut r = rhs.clone();
        let mut p = r.clone();
        let mut ap = DVector::zeros(n);
        let mut rr = r.dot(&r);

        for iteration in 0..max_iterations {
            if rr.sqrt() <= tolerance {
                debug!(
                    iterations = iteration,
                    residual = rr.sqrt(),
                    "conjugate gradient converged"
                );
                return Ok(x);
            }

            spmv(matrix, &p, &mut ap);
            let curvature = p.dot(&ap);
            if curvature <= 0.0 {
                return Err(MotionError::SingularSystem { curvature });
            }

            let alpha = rr / curvature;
            x.axpy(alpha, &p, 1.0);
            r.axpy(-alpha, &ap, 1.0);

            let rr_next = r.dot(&r);
            let beta = rr_next / rr;
            rr = rr_next;

            p *= beta;
            p += &r;
        }

        if rr.sqrt() <= tolerance {
            Ok(x)
        } else {
            Err(MotionError::SolveFailure {
                iterations: max_iterations,
                residual: rr.sqrt(),
                tolerance,
            })
        }
    }
}

/// Sparse matrix-vector product `y = A x`.
pub(crate) fn spmv(a: &CsrMatrix<f64>, x: &DVector<f64>, y: &mut DVector<f64>) {
    if a.nrows() > PAR_ROWS {
        y.as_mut_slice()
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, yi)| {
                let row = a.row(i);
                *yi = row
                    .col_indices()
                    .iter()
                    .zip(row.values())
                    .map(|(&j, &v)| v * x[j])
                    .sum();
            });
    } else {
        for (i, row) in a.row_iter().enumerate() {
            y[i] = row
                .col_indices()
                .iter()
                .zip(row.values())
                .map(|(&j, &v)| v * x[j])
                .sum();
        }
    }
}

/// Assembles the P1 stiffness matrix of ∫∇u·∇v over the mesh.
///
/// The matrix is the scalar Laplacian; the vector-valued extension solves it
/// once per coordinate component against the same matrix.
///
/// # Errors
///
/// Returns [`MotionError::EmptyMesh`] for a mesh without nodes or cells and
/// [`MotionError::DegenerateCell`] for a cell with (numerically) zero area.
pub fn assemble_stiffness(mesh: &TriangleMesh) -> MotionResult<CsrMatrix<f64>> {
    if mesh.is_empty() {
        return Err(MotionError::EmptyMesh);
    }

    let n = mesh.node_count();
    let mut coo = CooMatrix::new(n, n);

    for (cell, &[a, b, c]) in mesh.cells.iter().enumerate() {
        let pa = &mesh.nodes[a as usize];
        let pb = &mesh.nodes[b as usize];
        let pc = &mesh.nodes[c as usize];

        let area = 0.5 * ((pb.x - pa.x) * (pc.y - pa.y) - (pc.x - pa.x) * (pb.y - pa.y));
        if area.abs() < MIN_CELL_AREA {
            return Err(MotionError::DegenerateCell { cell, area });
        }

        // Gradients of the barycentric basis, scaled by 2A
        let grads = [
            Vector2::new(pb.y - pc.y, pc.x - pb.x),
            Vector2::new(pc.y - pa.y, pa.x - pc.x),
            Vector2::new(pa.y - pb.y, pb.x - pa.x),
        ];
        let indices = [a as usize, b as usize, c as usize];
        let scale = 1.0 / (4.0 * area.abs());

        for i in 0..3 {
            for j in 0..3 {
                coo.push(indices[i], indices[j], scale * grads[i].dot(&grads[j]));
            }
        }
    }

    let csr = CsrMatrix::from(&coo);
    debug!(
        nodes = n,
        cells = mesh.cell_count(),
        nnz = csr.nnz(),
        "assembled stiffness matrix"
    );
    Ok(csr)
}

/// Solves the harmonic extension of prescribed boundary values.
///
/// Returns one vector per mesh node. Constrained nodes carry their prescribed
/// value exactly; unconstrained nodes carry the discrete-harmonic
/// interpolation of the boundary data. Boundary nodes absent from `values`
/// are left unconstrained (implicit zero-Neumann) and will move.
///
/// # Errors
///
/// Returns an error if the mesh is empty or degenerate, if `values` is empty
/// (the system would be singular), or if the solve fails to converge.
///
/// # Panics
///
/// Panics if a key in `values` is not a valid node index.
pub fn harmonic_extension(
    mesh: &TriangleMesh,
    values: &BTreeMap<usize, Vector2<f64>>,
    solver: &dyn LinearSolver,
) -> MotionResult<Vec<Vector2<f64>>> {
    if values.is_empty() {
        return Err(MotionError::NoBoundaryConditions);
    }

    let stiffness = assemble_stiffness(mesh)?;
    let n = mesh.node_count();

    // Partition dofs into free and constrained
    let mut free_index = vec![usize::MAX; n];
    let mut free_nodes = Vec::with_capacity(n - values.len().min(n));
    for node in 0..n {
        if !values.contains_key(&node) {
            free_index[node] = free_nodes.len();
            free_nodes.push(node);
        }
    }
    let n_free = free_nodes.len();

    // Reduced system for the free dofs; constrained columns move to the rhs
    let mut reduced = CooMatrix::new(n_free, n_free);
    let mut rhs_x = DVector::zeros(n_free);
    let mut rhs_y = DVector::zeros(n_free);

    for (row, &node) in free_nodes.iter().enumerate() {
        let lane = stiffness.row(node);
        for (&col, &value) in lane.col_indices().iter().zip(lane.values()) {
            if let Some(prescribed) = values.get(&col) {
                rhs_x[row] -= value * prescribed.x;
                rhs_y[row] -= value * prescribed.y;
            } else {
                reduced.push(row, free_index[col], value);
            }
        }
    }
    let reduced = CsrMatrix::from(&reduced);

    let solution_x = solver.solve(&reduced, &rhs_x)?;
    let solution_y = solver.solve(&reduced, &rhs_y)?;

    let mut field = vec![Vector2::zeros(); n];
    for (&node, prescribed) in values {
        field[node] = *prescribed;
    }
    for (row, &node) in free_nodes.iter().enumerate() {
        field[node] = Vector2::new(solution_x[row], solution_y[row]);
    }

    debug!(
        constrained = values.len(),
        free = n_free,
        "solved harmonic extension"
    );
    Ok(field)
}
