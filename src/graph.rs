/*!
# Graph Registry and Path Enumeration

The [`Graph`] owns every vertex and edge of an orientation problem:

- vertices arena-allocated and name-registered (lookups only, so iteration
  order never depends on hashing),
- directed and undirected edge arenas addressed by [`EdgeId`],
- source and target lists in registration order,
- a transient degree cache keyed by `(vertex, only_oriented,
  only_undirected)`, invalidated through [`Graph::clear_degree_cache`].

Path enumeration is a bounded depth-first search from each source over the
adjacency lists. The traversal itself ignores orientations of undirected
edges (they can be walked either way); a candidate is emitted once its last
vertex is a target, unless it crosses a fixed edge against the needed
direction or its best-case weight does not exceed [`WEIGHT_THRESHOLD`].
Given fixed insertion order, the emitted path list is deterministic.
*/

use fxhash::FxHashMap;
use smallvec::SmallVec;

use crate::{
    edge::{DirEdge, Direction, EdgeId, EdgeIdx, EdgeOps, PathId, UndirEdge},
    error::{OrientError, Result},
    path::WEIGHT_THRESHOLD,
    vertex::{NumVertices, Vertex, VertexBitSet, VertexId},
};

/// Vertex/edge sequences of one enumerated path, before construction of a
/// full [`Path`](crate::path::Path).
pub(crate) struct RawPath {
    pub vertices: SmallVec<[VertexId; 8]>,
    pub edges: SmallVec<[EdgeId; 8]>,
}

/// A mixed directed/undirected weighted graph with named vertices.
#[derive(Debug, Default)]
pub struct Graph {
    vertices: Vec<Vertex>,
    names: FxHashMap<String, VertexId>,
    dir_edges: Vec<DirEdge>,
    undir_edges: Vec<UndirEdge>,
    sources: Vec<VertexId>,
    targets: Vec<VertexId>,
    degree_cache: FxHashMap<(VertexId, bool, bool), NumVertices>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a vertex by name, registering it with default weights if it
    /// does not exist yet.
    ///
    /// # Errors
    /// Fails if the name contains the reserved character `_`.
    pub fn ensure_vertex(&mut self, name: &str) -> Result<VertexId> {
        if name.contains('_') {
            return Err(OrientError::ReservedName(name.to_string()));
        }

        if let Some(&id) = self.names.get(name) {
            return Ok(id);
        }

        let id = self.vertices.len() as VertexId;
        self.vertices.push(Vertex::new(id, name.to_string()));
        self.names.insert(name.to_string(), id);
        Ok(id)
    }

    #[inline]
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id as usize]
    }

    #[inline]
    pub fn vertex_mut(&mut self, id: VertexId) -> &mut Vertex {
        &mut self.vertices[id as usize]
    }

    pub fn vertex_id(&self, name: &str) -> Option<VertexId> {
        self.names.get(name).copied()
    }

    #[inline]
    pub fn number_of_vertices(&self) -> NumVertices {
        self.vertices.len() as NumVertices
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Source vertices in registration order.
    pub fn sources(&self) -> &[VertexId] {
        &self.sources
    }

    /// Target vertices in registration order.
    pub fn targets(&self) -> &[VertexId] {
        &self.targets
    }

    /// Flags a vertex as a source.
    pub fn mark_source(&mut self, id: VertexId) {
        let v = &mut self.vertices[id as usize];
        if !v.is_source() {
            v.mark_source();
            self.sources.push(id);
        }
    }

    /// Flags a vertex as a target and records its target weight.
    pub fn mark_target(&mut self, id: VertexId, target_weight: f64) {
        let v = &mut self.vertices[id as usize];
        v.set_target_weight(target_weight);
        if !v.is_target() {
            v.mark_target();
            self.targets.push(id);
        }
    }

    /// Adds a directed edge `source → target` with the given weight.
    pub fn add_directed_edge(
        &mut self,
        source: VertexId,
        target: VertexId,
        weight: f64,
    ) -> EdgeId {
        let idx = self.dir_edges.len() as EdgeIdx;
        self.dir_edges.push(DirEdge::new(source, target, weight));
        self.vertices[source as usize].out_edges.push(idx);
        EdgeId::Directed(idx)
    }

    /// Adds an undirected edge between `source` and `target` with the given
    /// weight. The endpoint order only defines which direction counts as
    /// forward.
    pub fn add_undirected_edge(
        &mut self,
        source: VertexId,
        target: VertexId,
        weight: f64,
    ) -> EdgeId {
        let idx = self.undir_edges.len() as EdgeIdx;
        self.undir_edges.push(UndirEdge::new(source, target, weight));
        self.vertices[source as usize].undir_edges.push(idx);
        self.vertices[target as usize].undir_edges.push(idx);
        EdgeId::Undirected(idx)
    }

    pub fn dir_edges(&self) -> &[DirEdge] {
        &self.dir_edges
    }

    pub fn undir_edges(&self) -> &[UndirEdge] {
        &self.undir_edges
    }

    pub(crate) fn undir_edges_mut(&mut self) -> &mut [UndirEdge] {
        &mut self.undir_edges
    }

    #[inline]
    pub fn undir_edge(&self, idx: EdgeIdx) -> &UndirEdge {
        &self.undir_edges[idx as usize]
    }

    #[inline]
    pub fn undir_edge_mut(&mut self, idx: EdgeIdx) -> &mut UndirEdge {
        &mut self.undir_edges[idx as usize]
    }

    /// Variant-erased view of an edge.
    pub fn edge(&self, id: EdgeId) -> &dyn EdgeOps {
        match id {
            EdgeId::Directed(i) => &self.dir_edges[i as usize],
            EdgeId::Undirected(i) => &self.undir_edges[i as usize],
        }
    }

    pub(crate) fn assoc_path(&mut self, id: EdgeId, path: PathId, dir: Direction) {
        match id {
            EdgeId::Directed(i) => {
                debug_assert_eq!(dir, Direction::Forward);
                self.dir_edges[i as usize].assoc_path(path);
            }
            EdgeId::Undirected(i) => self.undir_edges[i as usize].assoc_path(path, dir),
        }
    }

    pub(crate) fn remove_path(&mut self, id: EdgeId, path: PathId) {
        match id {
            EdgeId::Directed(i) => self.dir_edges[i as usize].remove_path(path),
            EdgeId::Undirected(i) => self.undir_edges[i as usize].remove_path(path),
        }
    }

    /// Degree of `v`, counting incident undirected edges (only the oriented
    /// ones if `only_oriented`) plus, unless `only_undirected`, the directed
    /// edges leaving `v`. Results are cached until the next
    /// [`Graph::clear_degree_cache`].
    pub fn degree(&mut self, v: VertexId, only_oriented: bool, only_undirected: bool) -> NumVertices {
        let key = (v, only_oriented, only_undirected);
        if let Some(&cached) = self.degree_cache.get(&key) {
            return cached;
        }

        let vertex = &self.vertices[v as usize];
        let mut degree = vertex
            .undir_edges
            .iter()
            .filter(|&&ei| {
                !only_oriented
                    || self.undir_edges[ei as usize].orientation().direction().is_some()
            })
            .count() as NumVertices;
        if !only_undirected {
            degree += vertex.out_edges.len() as NumVertices;
        }

        self.degree_cache.insert(key, degree);
        degree
    }

    /// Drops all cached degrees. Must be called after any change to edge
    /// orientations.
    pub fn clear_degree_cache(&mut self) {
        self.degree_cache.clear();
    }

    /// Enumerates every simple path of `1..=max_len` edges from a source to
    /// a target whose best-case weight exceeds [`WEIGHT_THRESHOLD`] and that
    /// does not cross a fixed edge against its needed direction.
    pub(crate) fn enumerate_paths(&self, max_len: usize) -> Vec<RawPath> {
        let search = PathSearch {
            graph: self,
            visited: VertexBitSet::new(self.number_of_vertices()),
            vertices: Vec::with_capacity(max_len + 1),
            edges: Vec::with_capacity(max_len),
            found: Vec::new(),
        };
        search.run(max_len)
    }
}

/// Mutable state of one bounded depth-first enumeration.
struct PathSearch<'a> {
    graph: &'a Graph,
    visited: VertexBitSet,
    vertices: Vec<VertexId>,
    edges: Vec<EdgeId>,
    found: Vec<RawPath>,
}

impl PathSearch<'_> {
    fn run(mut self, max_len: usize) -> Vec<RawPath> {
        let graph = self.graph;
        for &source in &graph.sources {
            self.visited.set_bit(source);
            self.vertices.push(source);
            self.descend(source, max_len);
            self.vertices.pop();
            self.visited.clear_bit(source);
        }
        self.found
    }

    fn descend(&mut self, v: VertexId, remaining: usize) {
        if remaining == 0 {
            return;
        }

        let graph = self.graph;
        for &ei in &graph.vertices[v as usize].out_edges {
            let next = graph.dir_edges[ei as usize].target();
            self.step(EdgeId::Directed(ei), next, remaining);
        }
        // Orientation state does not restrict the walk; infeasible uses of
        // fixed edges are filtered at emit time.
        for &ei in &graph.vertices[v as usize].undir_edges {
            let edge = &graph.undir_edges[ei as usize];
            let next = if edge.source() == v {
                edge.target()
            } else {
                edge.source()
            };
            self.step(EdgeId::Undirected(ei), next, remaining);
        }
    }

    fn step(&mut self, edge: EdgeId, next: VertexId, remaining: usize) {
        if self.visited.get_bit(next) {
            return;
        }

        self.visited.set_bit(next);
        self.vertices.push(next);
        self.edges.push(edge);

        if self.graph.vertices[next as usize].is_target() && self.emittable() {
            self.found.push(RawPath {
                vertices: SmallVec::from_slice(&self.vertices),
                edges: SmallVec::from_slice(&self.edges),
            });
        }

        // Targets may appear mid-path, so keep descending past them.
        self.descend(next, remaining - 1);

        self.edges.pop();
        self.vertices.pop();
        self.visited.clear_bit(next);
    }

    fn emittable(&self) -> bool {
        let graph = self.graph;
        let mut weight = 1.0;

        for (id, &from) in self.edges.iter().zip(&self.vertices) {
            let edge = graph.edge(*id);
            let dir = edge
                .direction_from(from)
                .expect("stack edges leave their preceding vertex");
            if edge.is_fixed() && !edge.orientation().satisfies(dir) {
                return false;
            }
            weight *= edge.weight();
        }

        for &v in &self.vertices {
            weight *= graph.vertices[v as usize].weight();
        }
        weight *= graph.vertices[*self.vertices.last().unwrap() as usize].target_weight();

        weight > WEIGHT_THRESHOLD
    }
}
