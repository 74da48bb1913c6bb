//! Connected components of a mesh.
//!
//! A *shell* is a maximal set of faces connected through twin-paired edges.
//! Faces that only touch at a vertex, or across an open edge, land in
//! different shells.
//!
//! [`find_shells`] labels every face; [`stream_shell`] walks a single shell
//! from a seed face and pushes its triangles to a [`TriangleSink`] without
//! building an index.
//!
//! # Example
//!
//! ```
//! use trimesh_topo::prelude::*;
//! use trimesh_topo::algo::shells::find_shells;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(5.0, 0.0, 0.0),
//!     Point3::new(6.0, 0.0, 0.0),
//!     Point3::new(5.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0usize, 1, 2], [3, 4, 5]];
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! let shells = find_shells(&mesh);
//! assert_eq!(shells.len(), 2);
//! ```

use log::debug;

use crate::error::{MeshError, Result};
use crate::mesh::{FaceId, HalfEdgeMesh, MeshIndex, TriangleSink};

/// One connected component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shell<I: MeshIndex = u32> {
    /// The face the flood fill started from.
    pub seed: FaceId<I>,
    /// Number of faces in the shell.
    pub face_count: usize,
}

/// Partition of the faces of a mesh into shells.
#[derive(Debug, Clone)]
pub struct ShellIndex<I: MeshIndex = u32> {
    shells: Vec<Shell<I>>,
    /// Shell number per face slot.
    labels: Vec<Option<usize>>,
}

impl<I: MeshIndex> ShellIndex<I> {
    /// Number of shells.
    pub fn len(&self) -> usize {
        self.shells.len()
    }

    /// Whether the mesh had no faces.
    pub fn is_empty(&self) -> bool {
        self.shells.is_empty()
    }

    /// All shells in discovery order.
    pub fn shells(&self) -> &[Shell<I>] {
        &self.shells
    }

    /// Iterate over shells in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &Shell<I>> + '_ {
        self.shells.iter()
    }

    /// Shell number of a face, or `None` if the face was not live when the
    /// index was built.
    pub fn shell_of(&self, f: FaceId<I>) -> Option<usize> {
        self.labels.get(f.index()).copied().flatten()
    }

    /// The shell with the most faces (the first one on ties).
    pub fn largest(&self) -> Option<&Shell<I>> {
        self.shells
            .iter()
            .reduce(|best, s| if s.face_count > best.face_count { s } else { best })
    }

    /// Face counts in discovery order.
    pub fn face_counts(&self) -> Vec<usize> {
        self.shells.iter().map(|s| s.face_count).collect()
    }

    /// Sum of all face counts.
    pub fn total_faces(&self) -> usize {
        self.shells.iter().map(|s| s.face_count).sum()
    }
}

/// Label every face of `mesh` with its shell.
///
/// Runs in time linear in the number of faces. Which face seeds each shell
/// follows face sequence order but should not be relied upon.
pub fn find_shells<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> ShellIndex<I> {
    let slots = mesh.faces.slot_count();
    let mut marked = vec![false; slots];
    let mut labels = vec![None; slots];
    let mut shells = Vec::new();
    let mut stack = Vec::new();

    for seed in mesh.face_ids() {
        if marked[seed.index()] {
            continue;
        }
        let shell = shells.len();
        let face_count = flood(mesh, seed, &mut marked, &mut stack, |f| labels[f.index()] = Some(shell));
        shells.push(Shell { seed, face_count });
    }

    debug!("found {} shells over {} faces", shells.len(), mesh.num_faces());
    ShellIndex { shells, labels }
}

/// Faces of the shell containing `seed`, in flood-fill order.
pub fn shell_faces<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, seed: FaceId<I>) -> Result<Vec<FaceId<I>>> {
    check_seed(mesh, seed)?;
    let mut faces = Vec::new();
    let mut marked = vec![false; mesh.faces.slot_count()];
    flood(mesh, seed, &mut marked, &mut Vec::new(), |f| faces.push(f));
    Ok(faces)
}

/// Push every triangle of the shell containing `seed` into `sink`.
///
/// Returns the number of triangles written.
pub fn stream_shell<I, S>(mesh: &HalfEdgeMesh<I>, seed: FaceId<I>, sink: &mut S) -> Result<usize>
where
    I: MeshIndex,
    S: TriangleSink + ?Sized,
{
    check_seed(mesh, seed)?;
    let mut marked = vec![false; mesh.faces.slot_count()];
    Ok(flood(mesh, seed, &mut marked, &mut Vec::new(), |f| {
        let [p0, p1, p2] = mesh.face_positions(f);
        sink.add_triangle(p0, p1, p2);
    }))
}

/// Push the triangles of every shell with at least `min_faces` faces.
///
/// Shells are written one after another in discovery order. Returns the
/// number of triangles written.
pub fn stream_shells<I, S>(
    mesh: &HalfEdgeMesh<I>,
    shells: &ShellIndex<I>,
    min_faces: usize,
    sink: &mut S,
) -> Result<usize>
where
    I: MeshIndex,
    S: TriangleSink + ?Sized,
{
    let mut written = 0;
    let mut skipped = 0;
    for shell in shells.iter() {
        if shell.face_count < min_faces {
            skipped += 1;
            continue;
        }
        written += stream_shell(mesh, shell.seed, sink)?;
    }
    if skipped > 0 {
        debug!("skipped {} shells smaller than {} faces", skipped, min_faces);
    }
    Ok(written)
}

fn check_seed<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, seed: FaceId<I>) -> Result<()> {
    if mesh.contains_face(seed) {
        Ok(())
    } else {
        Err(MeshError::InvalidHandle(format!("{:?}", seed)))
    }
}

/// Explicit-stack flood fill across twin-paired edges.
///
/// Calls `visit` once per newly marked face and returns how many there were.
fn flood<I, F>(
    mesh: &HalfEdgeMesh<I>,
    seed: FaceId<I>,
    marked: &mut [bool],
    stack: &mut Vec<FaceId<I>>,
    mut visit: F,
) -> usize
where
    I: MeshIndex,
    F: FnMut(FaceId<I>),
{
    let mut count = 0;
    stack.clear();
    stack.push(seed);

    while let Some(f) = stack.pop() {
        if marked[f.index()] {
            continue;
        }
        marked[f.index()] = true;
        count += 1;
        visit(f);

        for he in mesh.face_halfedges(f) {
            if let Some(twin) = mesh.twin(he) {
                let neighbor = mesh.face_of(twin);
                if !marked[neighbor.index()] {
                    stack.push(neighbor);
                }
            }
        }
    }

    count
}
