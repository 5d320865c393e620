//! Harmonic mesh extension, spelled out step by step.
//!
//! Solves Laplace's equation on the reference domain to compute a pointwise
//! mesh deformation from displacements prescribed on the boundary, applies it
//! to the geometry, then restores the reference coordinates. The scoped
//! equivalent of this program is the `harmonic_mesh_motion` demo.
//!
//! Reference domain: the unit square. The bottom boundary is displaced by
//! `(0, 0.2 sin(2πx))`, the top by `(0, 0.1 sin(2πx))`, the sides are held
//! in place.

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use mesh_harmonic::{harmonic_extension, ConjugateGradient, MotionResult, TriangleMesh};
use nalgebra::{Point2, Vector2};

fn main() -> MotionResult<()> {
    tracing_subscriber::fmt::init();

    let mut mesh = TriangleMesh::unit_square(16);

    // Mesh deformation on the boundaries: zero Dirichlet values must be
    // prescribed explicitly, otherwise those boundaries are zero-Neumann and
    // free to move.
    let bottom = |p: &Point2<f64>| Vector2::new(0.0, 0.2 * (TAU * p.x).sin());
    let top = |p: &Point2<f64>| Vector2::new(0.0, 0.1 * (TAU * p.x).sin());
    let side = |_: &Point2<f64>| Vector2::zeros();

    let mut values = BTreeMap::new();
    for (marker, function) in [
        (1, &bottom as &dyn Fn(&Point2<f64>) -> Vector2<f64>),
        (3, &top),
        (2, &side),
        (4, &side),
    ] {
        for node in mesh.marker_nodes(marker) {
            values.insert(node, function(&mesh.nodes[node]));
        }
    }

    // Solve Laplace's equation on the reference mesh
    let field = harmonic_extension(&mesh, &values, &ConjugateGradient::default())?;

    // Store the reference coordinates, then overwrite the geometry with the
    // displaced positions
    let reference = mesh.nodes.clone();
    for (node, displacement) in mesh.nodes.iter_mut().zip(&field) {
        *node += *displacement;
    }

    println!("Mesh points after deformation");
    for node in mesh.nodes.iter().take(7) {
        println!("  ({:.3}, {:.3})", node.x, node.y);
    }

    // Restore the reference configuration
    mesh.nodes.copy_from_slice(&reference);

    println!("Mesh points after restoring the reference");
    for node in mesh.nodes.iter().take(7) {
        println!("  ({:.3}, {:.3})", node.x, node.y);
    }

    Ok(())
}
