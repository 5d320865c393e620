//! Boundary motion prescriptions.
//!
//! A [`BoundaryMotion`] ties one boundary marker to a function evaluated at
//! the tagged boundary nodes. Depending on the motion mode the function's
//! value is either a displacement to add or an absolute target coordinate.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use nalgebra::{Point2, Vector2};

use crate::error::{MotionError, MotionResult};
use crate::mesh::TriangleMesh;

/// A boundary function: maps a node position to a motion vector.
pub type MotionFn = Arc<dyn Fn(&Point2<f64>) -> Vector2<f64> + Send + Sync>;

/// One boundary condition: a marker paired with its motion function.
///
/// Boundary nodes not covered by any condition receive no constraint. They
/// are implicit zero-Neumann (free) boundaries and may move with the interior,
/// which is usually not what you want — pin them with [`BoundaryMotion::fixed`].
///
/// # Examples
///
/// ```
/// use mesh_harmonic::BoundaryMotion;
/// use nalgebra::Vector2;
/// use std::f64::consts::TAU;
///
/// // Sinusoidal vertical displacement on marker 1
/// let wave = BoundaryMotion::new(1, |p| Vector2::new(0.0, 0.2 * (TAU * p.x).sin()));
///
/// // Pin marker 4 in place
/// let pinned = BoundaryMotion::fixed(4);
///
/// assert_eq!(wave.marker(), 1);
/// assert_eq!(pinned.marker(), 4);
/// ```
#[derive(Clone)]
pub struct BoundaryMotion {
    marker: i32,
    motion: MotionFn,
}

impl fmt::Debug for BoundaryMotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundaryMotion")
            .field("marker", &self.marker)
            .finish_non_exhaustive()
    }
}

impl BoundaryMotion {
    /// Creates a boundary condition from a marker and a motion function.
    #[must_use]
    pub fn new<F>(marker: i32, motion: F) -> Self
    where
        F: Fn(&Point2<f64>) -> Vector2<f64> + Send + Sync + 'static,
    {
        Self {
            marker,
            motion: Arc::new(motion),
        }
    }

    /// Creates a boundary condition from a marker and a shared function.
    ///
    /// Useful when the same function drives several markers, as in the
    /// parallel-list constructor
    /// [`MotionParams::from_lists`](crate::MotionParams::from_lists).
    #[must_use]
    pub fn from_fn(marker: i32, motion: MotionFn) -> Self {
        Self { marker, motion }
    }

    /// Creates a condition that pins the marker's nodes in place.
    ///
    /// In displacement mode this prescribes zero displacement; in
    /// absolute-position mode pin boundaries by returning the node position
    /// itself instead.
    #[must_use]
    pub fn fixed(marker: i32) -> Self {
        Self::new(marker, |_| Vector2::zeros())
    }

    /// The boundary marker this condition applies to.
    #[inline]
    #[must_use]
    pub const fn marker(&self) -> i32 {
        self.marker
    }

    /// Evaluates the motion function at a point.
    #[inline]
    #[must_use]
    pub fn evaluate(&self, point: &Point2<f64>) -> Vector2<f64> {
        (self.motion)(point)
    }
}

/// Evaluates all conditions at their tagged boundary nodes.
///
/// Produces the Dirichlet value map (node index → prescribed vector) used by
/// the harmonic-extension solve. Conditions are applied in order, so when two
/// markers share a node (corners) the later condition wins.
///
/// Functions are evaluated at the mesh's *current* coordinates; call this
/// before mutating the geometry.
pub(crate) fn prescribe(
    mesh: &TriangleMesh,
    conditions: &[BoundaryMotion],
) -> MotionResult<BTreeMap<usize, Vector2<f64>>> {
    let mut values = BTreeMap::new();
    for condition in conditions {
        let nodes = mesh.marker_nodes(condition.marker());
        if nodes.is_empty() {
            return Err(MotionError::UnknownMarker {
                marker: condition.marker(),
            });
        }
        for node in nodes {
            values.insert(node, condition.evaluate(&mesh.nodes[node]));
        }
    }
    Ok(values)
}
