//! Error types for harmonic mesh motion.

use thiserror::Error;

/// Errors that can occur while deforming a mesh.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MotionError {
    /// The mesh has no nodes or no cells.
    #[error("mesh has no nodes or cells")]
    EmptyMesh,

    /// No boundary conditions were provided.
    ///
    /// Without at least one Dirichlet constraint the Laplace system is
    /// singular (pure Neumann), so this is rejected before assembly.
    #[error("no boundary conditions provided for mesh motion")]
    NoBoundaryConditions,

    /// Marker and function lists have different lengths.
    #[error("boundary marker list has {markers} entries but function list has {functions}")]
    ConditionCountMismatch {
        /// Number of boundary markers.
        markers: usize,
        /// Number of boundary functions.
        functions: usize,
    },

    /// A boundary condition references a marker that tags no facet.
    ///
    /// An unknown marker would silently produce an empty constraint set,
    /// leaving that boundary free to move. The caller almost certainly
    /// mistyped the marker, so this is an error.
    #[error("boundary marker {marker} tags no facet of the mesh")]
    UnknownMarker {
        /// The marker that matched nothing.
        marker: i32,
    },

    /// A cell has (numerically) zero area and cannot be assembled.
    #[error("cell {cell} is degenerate (area {area:.3e})")]
    DegenerateCell {
        /// Index of the degenerate cell.
        cell: usize,
        /// Signed area of the cell.
        area: f64,
    },

    /// The reduced stiffness system is not positive definite.
    ///
    /// This indicates a broken mesh (inverted or disconnected cells) rather
    /// than a slow solve.
    #[error("stiffness system is not positive definite (p'Ap = {curvature:.3e})")]
    SingularSystem {
        /// The non-positive curvature encountered by the solver.
        curvature: f64,
    },

    /// The iterative solve did not reach the requested tolerance.
    #[error(
        "solve did not converge after {iterations} iterations \
         (residual {residual:.3e}, tolerance {tolerance:.3e})"
    )]
    SolveFailure {
        /// Iterations performed before giving up.
        iterations: usize,
        /// Final residual norm.
        residual: f64,
        /// The absolute tolerance that was requested.
        tolerance: f64,
    },
}

/// Result type for mesh motion operations.
pub type MotionResult<T> = Result<T, MotionError>;
