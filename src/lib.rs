//! Mesh deformation via harmonic extension.
//!
//! Given a triangle mesh with tagged boundary facets and a set of boundary
//! motions (marker → function), this crate solves the discrete Laplace
//! equation per coordinate component to propagate the boundary motion
//! smoothly into the interior, applies the resulting nodal field to the mesh
//! geometry, and manages the reference/deformed lifecycle through a scope
//! guard.
//!
//! # Quick Start
//!
//! ```
//! use mesh_harmonic::{deform_mesh, BoundaryMotion, MotionParams, TriangleMesh};
//! use nalgebra::Vector2;
//! use std::f64::consts::TAU;
//!
//! // Unit square with one marker per side (bottom=1, right=2, top=3, left=4)
//! let mut mesh = TriangleMesh::unit_square(8);
//!
//! let params = MotionParams::new()
//!     .with_motion(BoundaryMotion::new(1, |p| {
//!         Vector2::new(0.0, 0.2 * (TAU * p.x).sin())
//!     }))
//!     .with_motion(BoundaryMotion::new(3, |p| {
//!         Vector2::new(0.0, 0.1 * (TAU * p.x).sin())
//!     }))
//!     .with_motion(BoundaryMotion::fixed(2))
//!     .with_motion(BoundaryMotion::fixed(4));
//!
//! {
//!     let deformed = deform_mesh(&mut mesh, &params)?;
//!     println!("{}", deformed.stats().summary());
//!     // The mesh carries the deformed geometry inside this scope.
//! }
//! // The guard restored the reference coordinates on drop.
//! # Ok::<(), mesh_harmonic::MotionError>(())
//! ```
//!
//! # Reference lifecycle
//!
//! By default the scope guard restores the pre-deformation coordinates when
//! it drops, on every exit path including panics. Two ways to keep a
//! deformation instead:
//!
//! - [`MotionParams::keep_deformation`] decides it up front;
//! - [`DeformedMesh::keep`] decides it at the end of the scope.
//!
//! Kept deformations become the new reference, so sequential deformations
//! compose additively.
//!
//! # Displacement versus absolute position
//!
//! In the default [`MotionMode::Displacement`], boundary functions return
//! displacement vectors and the solved field is *added* to the coordinates.
//! In [`MotionMode::AbsolutePosition`], boundary functions return target
//! coordinates and the solved field *replaces* the coordinates wholesale —
//! interior nodes get the harmonic interpolation of the boundary positions.
//!
//! # Unconstrained boundaries
//!
//! Boundary regions not named by any [`BoundaryMotion`] receive no constraint
//! at all. They are implicit zero-Neumann boundaries and will move with the
//! interior — pin them explicitly with [`BoundaryMotion::fixed`] if they must
//! stay put.

mod boundary;
mod error;
mod laplace;
mod mesh;
mod motion;
mod stats;

pub use boundary::{BoundaryMotion, MotionFn};
pub use error::{MotionError, MotionResult};
pub use laplace::{assemble_stiffness, harmonic_extension, ConjugateGradient, LinearSolver};
pub use mesh::{BoundaryFacet, TriangleMesh};
pub use motion::{deform_mesh, DeformedMesh, MotionMode, MotionParams};
pub use stats::MotionStats;
