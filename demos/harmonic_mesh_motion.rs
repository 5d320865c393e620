//! Scoped harmonic mesh motion.
//!
//! The same deformation as the `fundamentals` demo, driven through the
//! [`deform_mesh`] scope guard: the deformed geometry is visible inside the
//! scope and the reference coordinates come back when the guard drops, unless
//! the parameters keep the deformation.

use std::f64::consts::TAU;

use mesh_harmonic::{
    deform_mesh, BoundaryMotion, MotionMode, MotionParams, MotionResult, TriangleMesh,
};
use nalgebra::Vector2;

fn print_nodes(label: &str, mesh: &TriangleMesh) {
    println!("{label}");
    for node in mesh.nodes.iter().take(7) {
        println!("  ({:.3}, {:.3})", node.x, node.y);
    }
}

fn main() -> MotionResult<()> {
    tracing_subscriber::fmt::init();

    let mut mesh = TriangleMesh::unit_square(16);
    print_nodes("Mesh points before deformation", &mesh);

    let wave = MotionParams::new()
        .with_motion(BoundaryMotion::new(1, |p| {
            Vector2::new(0.0, 0.2 * (TAU * p.x).sin())
        }))
        .with_motion(BoundaryMotion::new(3, |p| {
            Vector2::new(0.0, 0.1 * (TAU * p.x).sin())
        }))
        .with_motion(BoundaryMotion::fixed(2))
        .with_motion(BoundaryMotion::fixed(4));

    // Deformation with reset_reference = true (the default)
    {
        let deformed = deform_mesh(&mut mesh, &wave)?;
        print_nodes("Mesh points after first deformation", &deformed);
        println!("  {}", deformed.stats().summary());
    }
    print_nodes("Mesh points after exit from scope with reset", &mesh);

    // Deformation with reset_reference = false: the deformed geometry
    // becomes the new reference
    {
        let deformed = deform_mesh(&mut mesh, &wave.clone().keep_deformation())?;
        print_nodes("Mesh points after second deformation", &deformed);
    }
    print_nodes("Mesh points after exit from scope without reset", &mesh);

    // Deformation from absolute target coordinates instead of displacements
    let mut mesh = TriangleMesh::unit_square(16);
    let targets = MotionParams::new()
        .with_mode(MotionMode::AbsolutePosition)
        .with_motion(BoundaryMotion::new(1, |p| {
            Vector2::new(p.x, p.y + 0.2 * (TAU * p.x).sin())
        }))
        .with_motion(BoundaryMotion::new(3, |p| {
            Vector2::new(p.x, p.y + 0.1 * (TAU * p.x).sin())
        }))
        .with_motion(BoundaryMotion::new(2, |p| Vector2::new(p.x, p.y)))
        .with_motion(BoundaryMotion::new(4, |p| Vector2::new(p.x, p.y)));

    {
        let deformed = deform_mesh(&mut mesh, &targets)?;
        print_nodes("Mesh points with absolute-position mode", &deformed);
    }

    Ok(())
}
