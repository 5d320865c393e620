//! Scoped harmonic mesh motion.
//!
//! [`deform_mesh`] solves the harmonic extension of the prescribed boundary
//! motion, applies it to the mesh geometry, and returns a [`DeformedMesh`]
//! scope guard. While the guard is alive the mesh carries the deformed
//! coordinates; when it drops, the original coordinates are restored unless
//! the parameters (or an explicit [`DeformedMesh::keep`]) say otherwise.
//!
//! The mesh is only mutated after the solve has succeeded, so a failed solve
//! leaves the geometry untouched.

use std::ops::{Deref, DerefMut};

use nalgebra::Point2;
use tracing::{debug, info};

use crate::boundary::{prescribe, BoundaryMotion, MotionFn};
use crate::error::{MotionError, MotionResult};
use crate::laplace::{harmonic_extension, ConjugateGradient};
use crate::mesh::TriangleMesh;
use crate::stats::MotionStats;

/// How the solved boundary field is applied to the geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionMode {
    /// Boundary functions return displacements; the solved field is added to
    /// the current coordinates.
    #[default]
    Displacement,
    /// Boundary functions return absolute target coordinates; the solved
    /// field *is* the new coordinate field and replaces the geometry
    /// wholesale.
    AbsolutePosition,
}

/// Parameters for a harmonic mesh motion.
///
/// # Examples
///
/// ```
/// use mesh_harmonic::{BoundaryMotion, MotionParams};
/// use nalgebra::Vector2;
/// use std::f64::consts::TAU;
///
/// let params = MotionParams::new()
///     .with_motion(BoundaryMotion::new(1, |p| {
///         Vector2::new(0.0, 0.2 * (TAU * p.x).sin())
///     }))
///     .with_motion(BoundaryMotion::fixed(3))
///     .keep_deformation();
///
/// assert_eq!(params.motions.len(), 2);
/// assert!(!params.reset_reference);
/// ```
#[derive(Debug, Clone)]
pub struct MotionParams {
    /// The boundary conditions, applied in order. When two markers share a
    /// node (corners), the later condition wins.
    pub motions: Vec<BoundaryMotion>,
    /// Displacement versus absolute-position semantics.
    pub mode: MotionMode,
    /// Whether dropping the scope guard restores the reference coordinates.
    pub reset_reference: bool,
    /// Relative tolerance of the interior solve.
    pub tolerance: f64,
    /// Iteration cap of the interior solve. `None` derives one from the
    /// system size.
    pub max_iterations: Option<usize>,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionParams {
    /// Creates empty parameters: displacement mode, reference restored on
    /// drop, default solver settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            motions: Vec::new(),
            mode: MotionMode::Displacement,
            reset_reference: true,
            tolerance: 1e-10,
            max_iterations: None,
        }
    }

    /// Builds parameters from parallel marker and function lists.
    ///
    /// The lists must have equal length; `functions[i]` drives `markers[i]`.
    ///
    /// # Errors
    ///
    /// Returns [`MotionError::ConditionCountMismatch`] if the lists differ in
    /// length.
    ///
    /// # Examples
    ///
    /// ```
    /// use mesh_harmonic::{MotionFn, MotionParams};
    /// use nalgebra::Vector2;
    /// use std::sync::Arc;
    ///
    /// let pin: MotionFn = Arc::new(|_p| Vector2::zeros());
    /// let params = MotionParams::from_lists(&[2, 4], vec![pin.clone(), pin]).unwrap();
    /// assert_eq!(params.motions.len(), 2);
    /// ```
    pub fn from_lists(markers: &[i32], functions: Vec<MotionFn>) -> MotionResult<Self> {
        if markers.len() != functions.len() {
            return Err(MotionError::ConditionCountMismatch {
                markers: markers.len(),
                functions: functions.len(),
            });
        }
        let motions = markers
            .iter()
            .zip(functions)
            .map(|(&marker, function)| BoundaryMotion::from_fn(marker, function))
            .collect();
        Ok(Self {
            motions,
            ..Self::new()
        })
    }

    /// Adds a boundary condition.
    #[must_use]
    pub fn with_motion(mut self, motion: BoundaryMotion) -> Self {
        self.motions.push(motion);
        self
    }

    /// Replaces the boundary conditions.
    #[must_use]
    pub fn with_motions(mut self, motions: Vec<BoundaryMotion>) -> Self {
        self.motions = motions;
        self
    }

    /// Sets the motion mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: MotionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Keeps the deformation when the scope guard drops, making the deformed
    /// geometry the new reference.
    #[must_use]
    pub const fn keep_deformation(mut self) -> Self {
        self.reset_reference = false;
        self
    }

    /// Sets whether dropping the guard restores the reference coordinates.
    #[must_use]
    pub const fn with_reset_reference(mut self, reset: bool) -> Self {
        self.reset_reference = reset;
        self
    }

    /// Sets the relative solver tolerance.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Caps the solver iteration count.
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }
}

/// Scope guard over a harmonically deformed mesh.
///
/// Holds the exclusive borrow of the mesh for its lifetime, so a second
/// overlapping deformation of the same mesh cannot be constructed. Dropping
/// the guard restores the reference coordinates if the parameters asked for
/// it; the restore also runs during unwinding, so the geometry contract holds
/// on every exit path.
///
/// Dereferences to the underlying [`TriangleMesh`].
pub struct DeformedMesh<'m> {
    mesh: &'m mut TriangleMesh,
    reference: Vec<Point2<f64>>,
    restore_on_drop: bool,
    stats: MotionStats,
}

impl DeformedMesh<'_> {
    /// The reference coordinates snapshotted before the deformation.
    #[must_use]
    pub fn reference(&self) -> &[Point2<f64>] {
        &self.reference
    }

    /// Quality metrics of this deformation.
    #[must_use]
    pub const fn stats(&self) -> &MotionStats {
        &self.stats
    }

    /// Commits the deformation: the deformed coordinates stay in place and
    /// become the new reference, regardless of `reset_reference`.
    pub fn keep(mut self) -> MotionStats {
        self.restore_on_drop = false;
        self.stats
    }

    /// Restores the reference coordinates immediately.
    pub fn restore(mut self) {
        self.restore_on_drop = true;
    }
}

impl Deref for DeformedMesh<'_> {
    type Target = TriangleMesh;

    fn deref(&self) -> &TriangleMesh {
        self.mesh
    }
}

impl DerefMut for DeformedMesh<'_> {
    fn deref_mut(&mut self) -> &mut TriangleMesh {
        self.mesh
    }
}

impl Drop for DeformedMesh<'_> {
    fn drop(&mut self) {
        if self.restore_on_drop {
            debug!("restoring reference coordinates");
            self.mesh.nodes.clear();
            self.mesh.nodes.extend_from_slice(&self.reference);
        }
    }
}

/// Deforms a mesh by harmonic extension of the prescribed boundary motion.
///
/// Boundary functions are evaluated at the current (reference) coordinates,
/// the discrete Laplace equation is solved per coordinate component for the
/// interior, and the resulting field is applied to the geometry according to
/// the motion mode. The returned guard restores the reference coordinates on
/// drop unless the parameters keep the deformation.
///
/// Sequential deformations compose: a scope kept with
/// [`MotionParams::keep_deformation`] (or [`DeformedMesh::keep`]) leaves the
/// deformed geometry as the reference for the next call.
///
/// # Errors
///
/// Returns an error if the mesh is empty or contains a degenerate cell, if no
/// boundary conditions are given, if a marker tags no facet, or if the
/// interior solve fails to converge. On error the mesh is left untouched.
///
/// # Examples
///
/// ```
/// use mesh_harmonic::{deform_mesh, BoundaryMotion, MotionParams, TriangleMesh};
/// use nalgebra::Vector2;
/// use std::f64::consts::TAU;
///
/// let mut mesh = TriangleMesh::unit_square(8);
///
/// let params = MotionParams::new()
///     .with_motion(BoundaryMotion::new(1, |p| {
///         Vector2::new(0.0, 0.2 * (TAU * p.x).sin())
///     }))
///     .with_motion(BoundaryMotion::new(3, |p| {
///         Vector2::new(0.0, 0.1 * (TAU * p.x).sin())
///     }))
///     .with_motion(BoundaryMotion::fixed(2))
///     .with_motion(BoundaryMotion::fixed(4));
///
/// let before = mesh.nodes.clone();
/// {
///     let deformed = deform_mesh(&mut mesh, &params)?;
///     assert!(deformed.stats().nodes_moved > 0);
/// }
/// // reset_reference defaults to true: geometry is back
/// assert_eq!(mesh.nodes, before);
/// # Ok::<(), mesh_harmonic::MotionError>(())
/// ```
pub fn deform_mesh<'m>(
    mesh: &'m mut TriangleMesh,
    params: &MotionParams,
) -> MotionResult<DeformedMesh<'m>> {
    if mesh.is_empty() {
        return Err(MotionError::EmptyMesh);
    }
    if params.motions.is_empty() {
        return Err(MotionError::NoBoundaryConditions);
    }

    let values = prescribe(mesh, &params.motions)?;
    let solver = ConjugateGradient {
        tolerance: params.tolerance,
        max_iterations: params.max_iterations,
    };
    let field = harmonic_extension(mesh, &values, &solver)?;

    // Solve succeeded; snapshot and mutate
    let reference = mesh.nodes.clone();
    match params.mode {
        MotionMode::Displacement => {
            for (node, motion) in mesh.nodes.iter_mut().zip(&field) {
                *node += *motion;
            }
        }
        MotionMode::AbsolutePosition => {
            for (node, position) in mesh.nodes.iter_mut().zip(&field) {
                *node = Point2::from(*position);
            }
        }
    }

    let stats = MotionStats::measure(&reference, mesh);
    info!(
        mode = ?params.mode,
        nodes_moved = stats.nodes_moved,
        max_displacement = stats.max_displacement,
        "deformed mesh"
    );

    Ok(DeformedMesh {
        mesh,
        reference,
        restore_on_drop: params.reset_reference,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector2;

    fn pinned_sides() -> MotionParams {
        MotionParams::new()
            .with_motion(BoundaryMotion::fixed(2))
            .with_motion(BoundaryMotion::fixed(4))
    }

    #[test]
    fn test_empty_mesh_rejected() {
        let mut mesh = TriangleMesh::new();
        let params = MotionParams::new().with_motion(BoundaryMotion::fixed(1));
        assert!(matches!(
            deform_mesh(&mut mesh, &params),
            Err(MotionError::EmptyMesh)
        ));
    }

    #[test]
    fn test_no_conditions_rejected() {
        let mut mesh = TriangleMesh::unit_square(2);
        assert!(matches!(
            deform_mesh(&mut mesh, &MotionParams::new()),
            Err(MotionError::NoBoundaryConditions)
        ));
    }

    #[test]
    fn test_unknown_marker_leaves_mesh_untouched() {
        let mut mesh = TriangleMesh::unit_square(2);
        let before = mesh.nodes.clone();
        let params = MotionParams::new()
            .with_motion(BoundaryMotion::new(1, |_| Vector2::new(0.0, 0.5)))
            .with_motion(BoundaryMotion::fixed(42));

        assert!(matches!(
            deform_mesh(&mut mesh, &params),
            Err(MotionError::UnknownMarker { marker: 42 })
        ));
        assert_eq!(mesh.nodes, before);
    }

    #[test]
    fn test_failed_solve_leaves_mesh_untouched() {
        let mut mesh = TriangleMesh::unit_square(8);
        let before = mesh.nodes.clone();
        let params = pinned_sides()
            .with_motion(BoundaryMotion::new(1, |_| Vector2::new(0.0, 0.3)))
            .with_tolerance(1e-14)
            .with_max_iterations(1);

        assert!(deform_mesh(&mut mesh, &params).is_err());
        assert_eq!(mesh.nodes, before);
    }

    #[test]
    fn test_drop_restores_reference() {
        let mut mesh = TriangleMesh::unit_square(4);
        let before = mesh.nodes.clone();
        let params = pinned_sides()
            .with_motion(BoundaryMotion::new(1, |_| Vector2::new(0.0, 0.2)))
            .with_motion(BoundaryMotion::fixed(3));

        {
            let deformed = deform_mesh(&mut mesh, &params).unwrap();
            assert!(deformed.stats().nodes_moved > 0);
        }
        assert_eq!(mesh.nodes, before);
    }

    #[test]
    fn test_keep_deformation_persists() {
        let mut mesh = TriangleMesh::unit_square(4);
        let before = mesh.nodes.clone();
        let params = pinned_sides()
            .with_motion(BoundaryMotion::new(1, |_| Vector2::new(0.0, 0.2)))
            .with_motion(BoundaryMotion::fixed(3))
            .keep_deformation();

        {
            deform_mesh(&mut mesh, &params).unwrap();
        }
        assert_ne!(mesh.nodes, before);
    }

    #[test]
    fn test_explicit_keep_overrides_reset() {
        let mut mesh = TriangleMesh::unit_square(4);
        let before = mesh.nodes.clone();
        let params = pinned_sides()
            .with_motion(BoundaryMotion::new(1, |_| Vector2::new(0.0, 0.2)))
            .with_motion(BoundaryMotion::fixed(3));

        let deformed = deform_mesh(&mut mesh, &params).unwrap();
        let stats = deformed.keep();
        assert!(stats.nodes_moved > 0);
        assert_ne!(mesh.nodes, before);
    }

    #[test]
    fn test_explicit_restore_overrides_keep() {
        let mut mesh = TriangleMesh::unit_square(4);
        let before = mesh.nodes.clone();
        let params = pinned_sides()
            .with_motion(BoundaryMotion::new(1, |_| Vector2::new(0.0, 0.2)))
            .with_motion(BoundaryMotion::fixed(3))
            .keep_deformation();

        let deformed = deform_mesh(&mut mesh, &params).unwrap();
        deformed.restore();
        assert_eq!(mesh.nodes, before);
    }

    #[test]
    fn test_restore_survives_panic() {
        use std::panic::AssertUnwindSafe;

        let mut mesh = TriangleMesh::unit_square(4);
        let before = mesh.nodes.clone();
        let params = pinned_sides()
            .with_motion(BoundaryMotion::new(1, |_| Vector2::new(0.0, 0.2)))
            .with_motion(BoundaryMotion::fixed(3));

        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            let _deformed = deform_mesh(&mut mesh, &params).unwrap();
            panic!("caller panicked inside the scope");
        }));
        assert!(result.is_err());
        assert_eq!(mesh.nodes, before);
    }

    #[test]
    fn test_absolute_position_mode() {
        let mut mesh = TriangleMesh::unit_square(4);
        // Every boundary maps to its own coordinates: identity deformation
        let identity = |p: &Point2<f64>| Vector2::new(p.x, p.y);
        let params = MotionParams::new()
            .with_mode(MotionMode::AbsolutePosition)
            .with_motions(vec![
                BoundaryMotion::new(1, identity),
                BoundaryMotion::new(2, identity),
                BoundaryMotion::new(3, identity),
                BoundaryMotion::new(4, identity),
            ]);

        let before = mesh.nodes.clone();
        let deformed = deform_mesh(&mut mesh, &params).unwrap();
        for (node, old) in deformed.nodes.iter().zip(&before) {
            assert_relative_eq!(node.x, old.x, epsilon = 1e-8);
            assert_relative_eq!(node.y, old.y, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_from_lists_mismatch() {
        let pin: MotionFn = std::sync::Arc::new(|_: &Point2<f64>| Vector2::zeros());
        let result = MotionParams::from_lists(&[1, 2, 3], vec![pin]);
        assert!(matches!(
            result,
            Err(MotionError::ConditionCountMismatch {
                markers: 3,
                functions: 1
            })
        ));
    }

    #[test]
    fn test_guard_derefs_to_mesh() {
        let mut mesh = TriangleMesh::unit_square(3);
        let params = pinned_sides()
            .with_motion(BoundaryMotion::fixed(1))
            .with_motion(BoundaryMotion::fixed(3));

        let deformed = deform_mesh(&mut mesh, &params).unwrap();
        assert_eq!(deformed.node_count(), 16);
        assert_eq!(deformed.reference().len(), 16);
    }
}
