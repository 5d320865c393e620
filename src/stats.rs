//! Deformation quality metrics.

use nalgebra::Point2;

use crate::mesh::TriangleMesh;

/// Threshold below which a nodal displacement counts as "not moved".
const MOVE_EPSILON: f64 = 1e-12;

/// Quality metrics of one mesh deformation.
///
/// Produced by [`deform_mesh`](crate::deform_mesh) and available on the scope
/// guard. The area ratio compares each deformed cell against its reference
/// area; a non-positive minimum means the deformation inverted a cell and the
/// deformed mesh is unusable for downstream assembly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionStats {
    /// Number of nodes that moved.
    pub nodes_moved: usize,
    /// Largest nodal displacement distance.
    pub max_displacement: f64,
    /// Average displacement over the moved nodes.
    pub average_displacement: f64,
    /// Minimum of deformed cell area over reference cell area.
    pub min_area_ratio: f64,
}

impl MotionStats {
    /// Measures the deformation of `mesh` relative to `reference` coordinates.
    #[must_use]
    pub fn measure(reference: &[Point2<f64>], mesh: &TriangleMesh) -> Self {
        let mut nodes_moved = 0;
        let mut max_displacement = 0.0_f64;
        let mut total_displacement = 0.0;

        for (old, new) in reference.iter().zip(&mesh.nodes) {
            let displacement = (new - old).norm();
            if displacement > MOVE_EPSILON {
                nodes_moved += 1;
                max_displacement = max_displacement.max(displacement);
                total_displacement += displacement;
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let average_displacement = if nodes_moved > 0 {
            total_displacement / nodes_moved as f64
        } else {
            0.0
        };

        let mut min_area_ratio = f64::INFINITY;
        for (cell, &[a, b, c]) in mesh.cells.iter().enumerate() {
            let reference_area = signed_area(
                &reference[a as usize],
                &reference[b as usize],
                &reference[c as usize],
            );
            if reference_area.abs() < MOVE_EPSILON {
                continue;
            }
            min_area_ratio = min_area_ratio.min(mesh.cell_area(cell) / reference_area);
        }
        if !min_area_ratio.is_finite() {
            min_area_ratio = 1.0;
        }

        Self {
            nodes_moved,
            max_displacement,
            average_displacement,
            min_area_ratio,
        }
    }

    /// Returns whether the deformation flipped any cell.
    #[must_use]
    pub fn has_inverted_cells(&self) -> bool {
        self.min_area_ratio <= 0.0
    }

    /// One-line summary of the deformation.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} nodes moved, max displacement {:.6}, avg displacement {:.6}, \
             min area ratio {:.4}",
            self.nodes_moved, self.max_displacement, self.average_displacement, self.min_area_ratio
        )
    }
}

fn signed_area(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    0.5 * ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector2;

    #[test]
    fn test_identity_motion() {
        let mesh = TriangleMesh::unit_square(3);
        let stats = MotionStats::measure(&mesh.nodes.clone(), &mesh);

        assert_eq!(stats.nodes_moved, 0);
        assert_relative_eq!(stats.max_displacement, 0.0);
        assert_relative_eq!(stats.min_area_ratio, 1.0, epsilon = 1e-12);
        assert!(!stats.has_inverted_cells());
    }

    #[test]
    fn test_translation_motion() {
        let mut mesh = TriangleMesh::unit_square(3);
        let reference = mesh.nodes.clone();
        for node in &mut mesh.nodes {
            *node += Vector2::new(0.3, 0.4);
        }

        let stats = MotionStats::measure(&reference, &mesh);
        assert_eq!(stats.nodes_moved, mesh.node_count());
        assert_relative_eq!(stats.max_displacement, 0.5, epsilon = 1e-12);
        assert_relative_eq!(stats.average_displacement, 0.5, epsilon = 1e-12);
        // A rigid translation preserves cell areas
        assert_relative_eq!(stats.min_area_ratio, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inverted_cell_detected() {
        let mut mesh = TriangleMesh::unit_square(1);
        let reference = mesh.nodes.clone();
        // Drag the top-right corner far below the square
        mesh.nodes[3] = Point2::new(1.0, -2.0);

        let stats = MotionStats::measure(&reference, &mesh);
        assert!(stats.has_inverted_cells());
        assert!(stats.min_area_ratio < 0.0);
    }

    #[test]
    fn test_summary_contains_counts() {
        let mesh = TriangleMesh::unit_square(2);
        let stats = MotionStats::measure(&mesh.nodes.clone(), &mesh);
        let text = stats.summary();
        assert!(text.contains("nodes moved"));
        assert!(text.contains("area ratio"));
    }
}
