//! Triangle mesh with tagged boundary facets.

use nalgebra::Point2;

/// A boundary edge of the mesh, tagged with an integer marker.
///
/// Markers group facets into named boundary regions (bottom, inlet, wall, ...)
/// so that boundary conditions can address a region instead of individual
/// edges, mirroring the facet tags produced by common mesh generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryFacet {
    /// The two endpoint nodes of the edge.
    pub nodes: [u32; 2],
    /// The region marker of this facet.
    pub marker: i32,
}

impl BoundaryFacet {
    /// Creates a tagged boundary facet.
    #[inline]
    #[must_use]
    pub const fn new(nodes: [u32; 2], marker: i32) -> Self {
        Self { nodes, marker }
    }
}

/// A 2D triangle mesh with tagged boundary facets.
///
/// Nodes are stored as a flat coordinate array so that a geometry snapshot is
/// an exact copy and a restore is bitwise identical. Cells reference nodes by
/// index with counter-clockwise winding.
///
/// # Example
///
/// ```
/// use mesh_harmonic::TriangleMesh;
///
/// let mesh = TriangleMesh::unit_square(4);
/// assert_eq!(mesh.node_count(), 25);
/// assert_eq!(mesh.cell_count(), 32);
///
/// // One marker per side: bottom = 1, right = 2, top = 3, left = 4
/// assert_eq!(mesh.marker_nodes(1).len(), 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Node coordinates.
    pub nodes: Vec<Point2<f64>>,
    /// Triangle cells as indices into the node array, CCW winding.
    pub cells: Vec<[u32; 3]>,
    /// Tagged boundary facets.
    pub facets: Vec<BoundaryFacet>,
}

impl TriangleMesh {
    /// Creates a new empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            cells: Vec::new(),
            facets: Vec::new(),
        }
    }

    /// Creates a mesh from its parts.
    #[inline]
    #[must_use]
    pub const fn from_parts(
        nodes: Vec<Point2<f64>>,
        cells: Vec<[u32; 3]>,
        facets: Vec<BoundaryFacet>,
    ) -> Self {
        Self {
            nodes,
            cells,
            facets,
        }
    }

    /// Number of nodes in the mesh.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of triangle cells in the mesh.
    #[inline]
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Returns whether the mesh has no nodes or no cells.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() || self.cells.is_empty()
    }

    /// Returns whether any facet carries the given marker.
    #[must_use]
    pub fn has_marker(&self, marker: i32) -> bool {
        self.facets.iter().any(|f| f.marker == marker)
    }

    /// Returns the distinct markers present in the mesh, sorted.
    #[must_use]
    pub fn markers(&self) -> Vec<i32> {
        let mut markers: Vec<i32> = self.facets.iter().map(|f| f.marker).collect();
        markers.sort_unstable();
        markers.dedup();
        markers
    }

    /// Returns the nodes lying on facets with the given marker, sorted and
    /// deduplicated.
    ///
    /// Nodes shared between two regions (corners) appear in the result for
    /// both markers.
    #[must_use]
    pub fn marker_nodes(&self, marker: i32) -> Vec<usize> {
        let mut nodes: Vec<usize> = self
            .facets
            .iter()
            .filter(|f| f.marker == marker)
            .flat_map(|f| f.nodes.iter().map(|&n| n as usize))
            .collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }

    /// Signed area of a cell (positive for CCW winding).
    #[must_use]
    pub fn cell_area(&self, cell: usize) -> f64 {
        let [a, b, c] = self.cells[cell];
        let pa = &self.nodes[a as usize];
        let pb = &self.nodes[b as usize];
        let pc = &self.nodes[c as usize];
        0.5 * ((pb.x - pa.x) * (pc.y - pa.y) - (pc.x - pa.x) * (pb.y - pa.y))
    }

    /// Creates a structured triangulation of the unit square `[0, 1]²`.
    ///
    /// The square is divided into `n × n` quads, each split into two
    /// triangles. Boundary facets are tagged one marker per side:
    ///
    /// | Side   | Marker |
    /// |--------|--------|
    /// | bottom | 1      |
    /// | right  | 2      |
    /// | top    | 3      |
    /// | left   | 4      |
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_harmonic::TriangleMesh;
    ///
    /// let mesh = TriangleMesh::unit_square(2);
    /// assert_eq!(mesh.node_count(), 9);
    /// assert_eq!(mesh.cell_count(), 8);
    /// assert_eq!(mesh.markers(), vec![1, 2, 3, 4]);
    /// ```
    #[must_use]
    pub fn unit_square(n: usize) -> Self {
        assert!(n >= 1, "unit_square requires at least one subdivision");

        let stride = n + 1;
        let h = 1.0 / n as f64;
        let index = |i: usize, j: usize| (j * stride + i) as u32;

        let mut nodes = Vec::with_capacity(stride * stride);
        for j in 0..stride {
            for i in 0..stride {
                nodes.push(Point2::new(i as f64 * h, j as f64 * h));
            }
        }

        let mut cells = Vec::with_capacity(2 * n * n);
        for j in 0..n {
            for i in 0..n {
                let v00 = index(i, j);
                let v10 = index(i + 1, j);
                let v01 = index(i, j + 1);
                let v11 = index(i + 1, j + 1);
                cells.push([v00, v10, v11]);
                cells.push([v00, v11, v01]);
            }
        }

        let mut facets = Vec::with_capacity(4 * n);
        for i in 0..n {
            facets.push(BoundaryFacet::new([index(i, 0), index(i + 1, 0)], 1));
            facets.push(BoundaryFacet::new([index(n, i), index(n, i + 1)], 2));
            facets.push(BoundaryFacet::new([index(i, n), index(i + 1, n)], 3));
            facets.push(BoundaryFacet::new([index(0, i), index(0, i + 1)], 4));
        }

        Self {
            nodes,
            cells,
            facets,
        }
    }
}
