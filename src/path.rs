/*!
# Source→Target Paths

A [`Path`] is an ordered sequence of vertices and edges connecting a source
to a target, together with the direction each edge must take for the target
to stay reachable. Statistics that never change (best-case weight, edge
weight extremes, vertex degrees) are cached at construction; edge-use
statistics depend on the current orientation and are refreshed through
[`Path::update_edge_uses`] whenever orientations change.

[`PathRank`] provides the comparator keys used to order the path output
file. All comparators are total orderings (`f64::total_cmp`) and break ties
on the best-case path weight.
*/

use std::{cmp::Ordering, fmt, str::FromStr};

use smallvec::SmallVec;

use crate::{
    edge::{Direction, EdgeId, EdgeOps, PathId},
    error::OrientError,
    graph::Graph,
    vertex::{NumVertices, VertexId},
};

/// Paths whose best-case weight does not exceed this threshold are dropped
/// during enumeration. Weights multiply values in `(0, 1]`, so the default
/// of zero prunes exactly the paths that can never contribute to the score.
pub const WEIGHT_THRESHOLD: f64 = 0.0;

/// One enumerated simple path from a source to a target.
#[derive(Debug, Clone)]
pub struct Path {
    id: PathId,
    vertices: SmallVec<[VertexId; 8]>,
    edges: SmallVec<[EdgeId; 8]>,
    /// Direction each edge must take, parallel to `edges`.
    dirs: SmallVec<[Direction; 8]>,

    max_weight: f64,
    max_edge_weight: f64,
    avg_edge_weight: f64,
    min_edge_weight: f64,
    max_edge_uses: usize,
    avg_edge_uses: f64,
    min_edge_uses: usize,
    max_degree: NumVertices,
    avg_degree: f64,
    min_degree: NumVertices,
}

impl Path {
    /// Builds a path from enumerated vertex/edge sequences and registers it
    /// with every edge it crosses.
    ///
    /// Edge-use statistics start at zero; the engine refreshes them once
    /// the whole path set is registered.
    pub(crate) fn new(
        graph: &mut Graph,
        id: PathId,
        vertices: SmallVec<[VertexId; 8]>,
        edges: SmallVec<[EdgeId; 8]>,
    ) -> Self {
        debug_assert!(!edges.is_empty());
        debug_assert_eq!(vertices.len(), edges.len() + 1);

        let dirs: SmallVec<[Direction; 8]> = edges
            .iter()
            .zip(vertices.iter())
            .map(|(&e, &v)| {
                graph
                    .edge(e)
                    .direction_from(v)
                    .expect("path edges leave their preceding vertex")
            })
            .collect();

        for (&e, &d) in edges.iter().zip(dirs.iter()) {
            graph.assoc_path(e, id, d);
        }

        let mut path = Self {
            id,
            vertices,
            edges,
            dirs,
            max_weight: 0.0,
            max_edge_weight: 0.0,
            avg_edge_weight: 0.0,
            min_edge_weight: 0.0,
            max_edge_uses: 0,
            avg_edge_uses: 0.0,
            min_edge_uses: 0,
            max_degree: 0,
            avg_degree: 0.0,
            min_degree: 0,
        };
        path.init_weight_stats(graph);
        path.update_degree_stats(graph);
        path
    }

    fn init_weight_stats(&mut self, graph: &Graph) {
        let mut product = 1.0;
        let mut max = f64::NEG_INFINITY;
        let mut min = f64::INFINITY;
        let mut sum = 0.0;
        for &e in &self.edges {
            let w = graph.edge(e).weight();
            product *= w;
            max = max.max(w);
            min = min.min(w);
            sum += w;
        }
        self.max_edge_weight = max;
        self.min_edge_weight = min;
        self.avg_edge_weight = sum / self.num_edges() as f64;

        for &v in &self.vertices {
            product *= graph.vertex(v).weight();
        }
        product *= graph.vertex(self.target()).target_weight();
        self.max_weight = product;
    }

    fn update_degree_stats(&mut self, graph: &mut Graph) {
        let mut max = 0;
        let mut min = NumVertices::MAX;
        let mut sum = 0.0;
        for &v in &self.vertices {
            let degree = graph.degree(v, false, true);
            max = max.max(degree);
            min = min.min(degree);
            sum += degree as f64;
        }
        self.max_degree = max;
        self.min_degree = min;
        self.avg_degree = sum / self.num_vertices() as f64;
    }

    /// Refreshes the cached edge-use statistics from the current
    /// orientation state. Considers all paths, satisfied or not.
    pub fn update_edge_uses(&mut self, graph: &Graph) {
        let mut max = 0;
        let mut min = usize::MAX;
        let mut sum = 0.0;
        for &e in &self.edges {
            let uses = graph.edge(e).consistent_paths();
            max = max.max(uses);
            min = min.min(uses);
            sum += uses as f64;
        }
        self.max_edge_uses = max;
        self.min_edge_uses = min;
        self.avg_edge_uses = sum / self.num_edges() as f64;
    }

    /// Removes this path from all edge association sets. Call exactly once,
    /// when the path set is discarded.
    pub(crate) fn release(&self, graph: &mut Graph) {
        for &e in &self.edges {
            graph.remove_path(e, self.id);
        }
    }

    #[inline]
    pub fn id(&self) -> PathId {
        self.id
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    /// Direction each edge must take, parallel to [`Path::edges`].
    pub fn desired_directions(&self) -> &[Direction] {
        &self.dirs
    }

    #[inline]
    pub fn target(&self) -> VertexId {
        *self.vertices.last().unwrap()
    }

    /// The weight under the current orientation: the best-case weight if
    /// every edge is unoriented or oriented as desired, zero otherwise.
    pub fn weight(&self, graph: &Graph) -> f64 {
        if self.is_connected(graph) {
            self.max_weight
        } else {
            0.0
        }
    }

    /// Returns `true` if every edge is unoriented or oriented in this
    /// path's desired direction.
    pub fn is_connected(&self, graph: &Graph) -> bool {
        self.edges
            .iter()
            .zip(self.dirs.iter())
            .all(|(&e, &d)| graph.edge(e).orientation().satisfies(d))
    }

    /// Like [`Path::is_connected`], but treating `skip` as satisfying. Used
    /// to evaluate hypothetical flips of a single edge.
    pub fn is_connected_excluding(&self, graph: &Graph, skip: EdgeId) -> bool {
        self.edges
            .iter()
            .zip(self.dirs.iter())
            .all(|(&e, &d)| e == skip || graph.edge(e).orientation().satisfies(d))
    }

    /// Returns `false` if some edge is fixed against this path's desired
    /// direction, making the path permanently unsatisfiable.
    pub fn is_feasible(&self, graph: &Graph) -> bool {
        self.edges.iter().zip(self.dirs.iter()).all(|(&e, &d)| {
            let edge = graph.edge(e);
            !edge.is_fixed() || edge.orientation().satisfies(d)
        })
    }

    /// Returns `true` if this path crosses at least one conflict edge.
    pub fn has_conflicts(&self, graph: &Graph) -> bool {
        self.edges.iter().any(|&e| match e {
            EdgeId::Directed(_) => false,
            EdgeId::Undirected(i) => graph.undir_edge(i).has_conflict(),
        })
    }

    /// Display adaptor rendering the vertex names separated by `:`.
    pub fn display<'a>(&'a self, graph: &'a Graph) -> PathDisplay<'a> {
        PathDisplay { path: self, graph }
    }

    /// Best-case weight: the weight when every edge is oriented as desired.
    #[inline]
    pub fn max_weight(&self) -> f64 {
        self.max_weight
    }

    #[inline]
    pub fn max_edge_weight(&self) -> f64 {
        self.max_edge_weight
    }

    #[inline]
    pub fn avg_edge_weight(&self) -> f64 {
        self.avg_edge_weight
    }

    #[inline]
    pub fn min_edge_weight(&self) -> f64 {
        self.min_edge_weight
    }

    #[inline]
    pub fn max_edge_uses(&self) -> usize {
        self.max_edge_uses
    }

    #[inline]
    pub fn avg_edge_uses(&self) -> f64 {
        self.avg_edge_uses
    }

    #[inline]
    pub fn min_edge_uses(&self) -> usize {
        self.min_edge_uses
    }

    #[inline]
    pub fn max_degree(&self) -> NumVertices {
        self.max_degree
    }

    #[inline]
    pub fn avg_degree(&self) -> f64 {
        self.avg_degree
    }

    #[inline]
    pub fn min_degree(&self) -> NumVertices {
        self.min_degree
    }
}

/// Renders a path as its colon-separated vertex names.
pub struct PathDisplay<'a> {
    path: &'a Path,
    graph: &'a Graph,
}

impl fmt::Display for PathDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, &v) in self.path.vertices.iter().enumerate() {
            if i > 0 {
                write!(f, ":")?;
            }
            write!(f, "{}", self.graph.vertex(v).name())?;
        }
        Ok(())
    }
}

/// Statistic a path listing can be ordered by.
///
/// Every key breaks ties on the best-case path weight, so two paths compare
/// equal only if both statistics coincide.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PathRank {
    PathWeight,
    MaxEdgeWeight,
    AvgEdgeWeight,
    MinEdgeWeight,
    MaxEdgeUses,
    AvgEdgeUses,
    MinEdgeUses,
    MaxDegree,
    AvgDegree,
    MinDegree,
}

impl PathRank {
    /// Compares two paths by this statistic, ascending.
    pub fn compare(self, a: &Path, b: &Path) -> Ordering {
        let primary = match self {
            PathRank::PathWeight => a.max_weight().total_cmp(&b.max_weight()),
            PathRank::MaxEdgeWeight => a.max_edge_weight().total_cmp(&b.max_edge_weight()),
            PathRank::AvgEdgeWeight => a.avg_edge_weight().total_cmp(&b.avg_edge_weight()),
            PathRank::MinEdgeWeight => a.min_edge_weight().total_cmp(&b.min_edge_weight()),
            PathRank::MaxEdgeUses => a.max_edge_uses().cmp(&b.max_edge_uses()),
            PathRank::AvgEdgeUses => a.avg_edge_uses().total_cmp(&b.avg_edge_uses()),
            PathRank::MinEdgeUses => a.min_edge_uses().cmp(&b.min_edge_uses()),
            PathRank::MaxDegree => a.max_degree().cmp(&b.max_degree()),
            PathRank::AvgDegree => a.avg_degree().total_cmp(&b.avg_degree()),
            PathRank::MinDegree => a.min_degree().cmp(&b.min_degree()),
        };
        primary.then_with(|| a.max_weight().total_cmp(&b.max_weight()))
    }
}

impl FromStr for PathRank {
    type Err = OrientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pathweight" | "maxweight" => Ok(PathRank::PathWeight),
            "maxedgeweight" => Ok(PathRank::MaxEdgeWeight),
            "avgedgeweight" => Ok(PathRank::AvgEdgeWeight),
            "minedgeweight" => Ok(PathRank::MinEdgeWeight),
            "maxuses" => Ok(PathRank::MaxEdgeUses),
            "avguses" => Ok(PathRank::AvgEdgeUses),
            "minuses" => Ok(PathRank::MinEdgeUses),
            "maxdegree" => Ok(PathRank::MaxDegree),
            "avgdegree" => Ok(PathRank::AvgDegree),
            "mindegree" => Ok(PathRank::MinDegree),
            _ => Err(OrientError::InvalidProperty {
                key: "path.sort.by",
                value: s.to_string(),
            }),
        }
    }
}
