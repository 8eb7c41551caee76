// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shells, solids, and face sewing
//!
//! [`sew_faces`] welds sampled face boundaries on a tolerance grid and
//! counts edge uses: a watertight shell uses every boundary edge exactly
//! twice. Connected components are split apart, and each one is oriented
//! by its signed volume, a component enclosing negative volume has its
//! faces pointing inward and gets reversed.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::brep::{BrepFace, FaceTessellation};
use crate::settings::GeometrySettings;
use crate::{Matrix4, Mesh};

/// Collection of faces forming a surface
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shell {
    pub faces: Vec<BrepFace>,
}

impl Shell {
    pub fn new(faces: Vec<BrepFace>) -> Self {
        Shell { faces }
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Tessellate every face into a display mesh, skipping failures
    pub fn to_mesh(&self, settings: &GeometrySettings) -> Mesh {
        let mut mesh = Mesh::new();
        for face in &self.faces {
            let _ = face.tessellate_into(&mut mesh, settings);
        }
        mesh
    }

    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for face in self.faces.iter_mut() {
            face.transform(matrix);
        }
    }

    pub fn transform_general(&mut self, matrix: &Matrix4<f64>, settings: &GeometrySettings) {
        for face in self.faces.iter_mut() {
            face.transform_general(matrix, settings);
        }
    }
}

/// Closed shell treated as a volume
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Solid {
    pub shell: Shell,
}

impl Solid {
    pub fn new(shell: Shell) -> Self {
        Solid { shell }
    }

    pub fn to_mesh(&self, settings: &GeometrySettings) -> Mesh {
        self.shell.to_mesh(settings)
    }

    /// Enclosed volume, positive when faces point outward
    pub fn volume(&self, settings: &GeometrySettings) -> f64 {
        self.shell
            .faces
            .iter()
            .filter_map(|f| f.tessellate(settings).ok())
            .map(|t| t.signed_volume())
            .sum()
    }

    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        self.shell.transform(matrix);
    }

    pub fn transform_general(&mut self, matrix: &Matrix4<f64>, settings: &GeometrySettings) {
        self.shell.transform_general(matrix, settings);
    }
}

/// Result of sewing a face list
#[derive(Debug, Default)]
pub struct SewOutcome {
    /// Oriented solids, one per connected component, empty when not closed
    pub solids: Vec<Solid>,
    /// Every welded boundary edge is used by exactly two faces
    pub is_closed: bool,
    /// Paired edge uses traverse in opposite directions
    pub is_consistent: bool,
}

struct EdgeUse {
    faces: SmallVec<[usize; 2]>,
    count: u32,
    direction_sum: i32,
}

/// Sew faces into closed, consistently oriented solids.
///
/// Boundary vertices are welded on a grid of the sewing tolerance. When
/// the sewn surface is not watertight the outcome carries no solids and
/// `is_closed` is false, callers decide how loudly to complain.
pub fn sew_faces(faces: Vec<BrepFace>, settings: &GeometrySettings) -> SewOutcome {
    if faces.is_empty() {
        return SewOutcome::default();
    }

    let mut tessellations: Vec<Option<FaceTessellation>> = Vec::with_capacity(faces.len());
    let mut any_failed = false;
    for face in &faces {
        match face.tessellate(settings) {
            Ok(tess) => tessellations.push(Some(tess)),
            Err(_) => {
                tessellations.push(None);
                any_failed = true;
            }
        }
    }

    // Weld boundary vertices on the tolerance grid
    let weld = settings.sewing_tolerance.max(1e-12);
    let mut vertex_ids: FxHashMap<(i64, i64, i64), usize> = FxHashMap::default();
    let mut edges: FxHashMap<(usize, usize), EdgeUse> = FxHashMap::default();

    let mut vertex_id = |map: &mut FxHashMap<(i64, i64, i64), usize>, p: &crate::Point3<f64>| {
        let key = (
            (p.x / weld).round() as i64,
            (p.y / weld).round() as i64,
            (p.z / weld).round() as i64,
        );
        let next = map.len();
        *map.entry(key).or_insert(next)
    };

    for (face_index, tess) in tessellations.iter().enumerate() {
        let Some(tess) = tess else { continue };
        for (a, b) in tess.boundary_segments() {
            let va = vertex_id(&mut vertex_ids, &tess.points[a]);
            let vb = vertex_id(&mut vertex_ids, &tess.points[b]);
            if va == vb {
                // Segment collapsed by welding
                continue;
            }
            let (key, direction) = if va < vb { ((va, vb), 1) } else { ((vb, va), -1) };
            let entry = edges.entry(key).or_insert_with(|| EdgeUse {
                faces: SmallVec::new(),
                count: 0,
                direction_sum: 0,
            });
            entry.count += 1;
            entry.direction_sum += direction;
            if !entry.faces.contains(&face_index) {
                entry.faces.push(face_index);
            }
        }
    }

    let is_closed = !any_failed && !edges.is_empty() && edges.values().all(|e| e.count == 2);
    let is_consistent =
        is_closed && edges.values().all(|e| e.direction_sum == 0 && e.faces.len() == 2);

    if !is_closed {
        return SewOutcome {
            solids: Vec::new(),
            is_closed,
            is_consistent,
        };
    }

    // Group faces into connected components over shared edges
    let mut parent: Vec<usize> = (0..faces.len()).collect();
    fn find(parent: &mut Vec<usize>, i: usize) -> usize {
        let mut root = i;
        while parent[root] != root {
            root = parent[root];
        }
        let mut current = i;
        while parent[current] != root {
            let next = parent[current];
            parent[current] = root;
            current = next;
        }
        root
    }
    for edge in edges.values() {
        if edge.faces.len() == 2 {
            let a = find(&mut parent, edge.faces[0]);
            let b = find(&mut parent, edge.faces[1]);
            if a != b {
                parent[a] = b;
            }
        }
    }

    let mut components: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
    for i in 0..faces.len() {
        let root = find(&mut parent, i);
        components.entry(root).or_default().push(i);
    }

    let mut groups: Vec<Vec<usize>> = components.into_values().collect();
    groups.sort_by_key(|g| g[0]);

    let mut face_slots: Vec<Option<BrepFace>> = faces.into_iter().map(Some).collect();
    let mut solids = Vec::with_capacity(groups.len());

    for group in groups {
        let volume: f64 = group
            .iter()
            .filter_map(|&i| tessellations[i].as_ref())
            .map(|t| t.signed_volume())
            .sum();

        let mut component_faces = Vec::with_capacity(group.len());
        for index in group {
            if let Some(mut face) = face_slots[index].take() {
                if volume < 0.0 {
                    face.reverse();
                }
                component_faces.push(face);
            }
        }
        solids.push(Solid::new(Shell::new(component_faces)));
    }

    SewOutcome {
        solids,
        is_closed,
        is_consistent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brep::{Edge, Wire};
    use crate::Point3;

    fn quad_face(p: [Point3<f64>; 4]) -> BrepFace {
        BrepFace::new(Wire::from_edges(vec![
            Edge::line(p[0], p[1]),
            Edge::line(p[1], p[2]),
            Edge::line(p[2], p[3]),
            Edge::line(p[3], p[0]),
        ]))
    }

    fn unit_cube_faces(outward: bool) -> Vec<BrepFace> {
        let c = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        let quads: [[usize; 4]; 6] = [
            [0, 3, 2, 1],
            [4, 5, 6, 7],
            [0, 1, 5, 4],
            [1, 2, 6, 5],
            [2, 3, 7, 6],
            [3, 0, 4, 7],
        ];
        quads
            .iter()
            .map(|q| {
                let mut corners = [c[q[0]], c[q[1]], c[q[2]], c[q[3]]];
                if !outward {
                    corners.reverse();
                }
                quad_face(corners)
            })
            .collect()
    }

    #[test]
    fn test_cube_sews_closed_and_consistent() {
        let settings = GeometrySettings::default();
        let outcome = sew_faces(unit_cube_faces(true), &settings);
        assert!(outcome.is_closed);
        assert!(outcome.is_consistent);
        assert_eq!(outcome.solids.len(), 1);
        let volume = outcome.solids[0].volume(&settings);
        assert!((volume - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_inward_cube_is_reversed() {
        let settings = GeometrySettings::default();
        let outcome = sew_faces(unit_cube_faces(false), &settings);
        assert!(outcome.is_closed);
        assert_eq!(outcome.solids.len(), 1);
        // Orientation fix must leave the enclosed volume positive
        let volume = outcome.solids[0].volume(&settings);
        assert!((volume - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_two_faces_do_not_close() {
        let settings = GeometrySettings::default();
        let faces = unit_cube_faces(true).into_iter().take(2).collect();
        let outcome = sew_faces(faces, &settings);
        assert!(!outcome.is_closed);
        assert!(outcome.solids.is_empty());
    }

    #[test]
    fn test_two_disjoint_cubes_split_into_components() {
        let settings = GeometrySettings::default();
        let mut faces = unit_cube_faces(true);
        let mut far = unit_cube_faces(true);
        let mut shift = Matrix4::identity();
        shift[(0, 3)] = 5.0;
        for face in far.iter_mut() {
            face.transform(&shift);
        }
        faces.extend(far);

        let outcome = sew_faces(faces, &settings);
        assert!(outcome.is_closed);
        assert_eq!(outcome.solids.len(), 2);
        for solid in &outcome.solids {
            assert!((solid.volume(&settings) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_empty_input() {
        let outcome = sew_faces(Vec::new(), &GeometrySettings::default());
        assert!(!outcome.is_closed);
        assert!(outcome.solids.is_empty());
    }
}
