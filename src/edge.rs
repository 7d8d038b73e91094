/*!
# Edge Representation

Edges come in two variants sharing the small [`EdgeOps`] capability set:

- [`DirEdge`]: fixed source→target endpoints, always oriented forward.
- [`UndirEdge`]: endpoints `(source, target)` with a mutable
  [`Orientation`]. An orientation may be *fixed*, which is terminal: a fixed
  edge never changes direction again.

Every edge carries a path-association set: one [`PathUse`] record per path
traversing it, storing the direction that path needs. This set is the sole
input for consistent-path counts, conflict detection and flip deltas.
*/

use rand::Rng;
use crate::bitset::BitSetImpl;

use crate::vertex::VertexId;

/// Index into one of the graph's edge arenas. Which arena is determined by
/// the [`EdgeId`] wrapping it.
pub type EdgeIdx = u32;

/// Bitset specialized for edge indices within one arena.
pub type EdgeBitSet = BitSetImpl<EdgeIdx>;

/// Stable identifier of a path within the engine's current path set.
pub type PathId = u32;

/// Tagged index addressing either edge arena of a graph.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EdgeId {
    Directed(EdgeIdx),
    Undirected(EdgeIdx),
}

/// The direction in which a path traverses an edge, relative to the edge's
/// stored `(source, target)` endpoint order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    /// source → target
    Forward,
    /// target → source
    Backward,
}

impl Direction {
    #[inline]
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// Orientation state of an undirected edge.
///
/// Together with [`UndirEdge::is_fixed`] this encodes the five states
/// unoriented / forward / backward / fixed-forward / fixed-backward.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    #[default]
    Unoriented,
    Forward,
    Backward,
}

impl Orientation {
    /// The orientation committing to the given direction.
    #[inline]
    pub fn of(dir: Direction) -> Self {
        match dir {
            Direction::Forward => Orientation::Forward,
            Direction::Backward => Orientation::Backward,
        }
    }

    /// The committed direction, or `None` while unoriented.
    #[inline]
    pub fn direction(self) -> Option<Direction> {
        match self {
            Orientation::Unoriented => None,
            Orientation::Forward => Some(Direction::Forward),
            Orientation::Backward => Some(Direction::Backward),
        }
    }

    /// Returns `true` if a path desiring `dir` can cross an edge in this
    /// state. Unoriented edges satisfy both directions.
    #[inline]
    pub fn satisfies(self, dir: Direction) -> bool {
        match self.direction() {
            None => true,
            Some(d) => d == dir,
        }
    }

    /// The opposite orientation. Unoriented stays unoriented.
    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            Orientation::Unoriented => Orientation::Unoriented,
            Orientation::Forward => Orientation::Backward,
            Orientation::Backward => Orientation::Forward,
        }
    }
}

/// Back-link from an edge to a path traversing it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PathUse {
    pub path: PathId,
    /// The direction the path needs this edge to take.
    pub dir: Direction,
}

/// Capabilities shared by both edge variants.
pub trait EdgeOps {
    /// The stored `(source, target)` endpoint pair.
    fn endpoints(&self) -> (VertexId, VertexId);

    /// Edge weight in `(0, 1]`.
    fn weight(&self) -> f64;

    /// Current orientation. Directed edges are permanently forward.
    fn orientation(&self) -> Orientation;

    /// Returns `true` if the orientation can never change again.
    fn is_fixed(&self) -> bool;

    /// The direction a traversal leaving vertex `v` over this edge takes,
    /// or `None` if the edge cannot be left from `v`.
    fn direction_from(&self, v: VertexId) -> Option<Direction>;

    /// Number of associated paths that use this edge in its current
    /// orientation. Unoriented edges count every associated path.
    fn consistent_paths(&self) -> usize;
}

/// An edge whose direction was given by the input and never changes.
#[derive(Debug, Clone)]
pub struct DirEdge {
    source: VertexId,
    target: VertexId,
    weight: f64,
    uses: Vec<PathUse>,
}

impl DirEdge {
    pub(crate) fn new(source: VertexId, target: VertexId, weight: f64) -> Self {
        debug_assert!(weight > 0.0 && weight <= 1.0);
        Self {
            source,
            target,
            weight,
            uses: Vec::new(),
        }
    }

    #[inline]
    pub fn source(&self) -> VertexId {
        self.source
    }

    #[inline]
    pub fn target(&self) -> VertexId {
        self.target
    }

    pub fn uses(&self) -> &[PathUse] {
        &self.uses
    }

    pub(crate) fn assoc_path(&mut self, path: PathId) {
        // A directed edge can only ever be traversed forward.
        self.uses.push(PathUse {
            path,
            dir: Direction::Forward,
        });
    }

    pub(crate) fn remove_path(&mut self, path: PathId) {
        self.uses.retain(|u| u.path != path);
    }
}

impl EdgeOps for DirEdge {
    fn endpoints(&self) -> (VertexId, VertexId) {
        (self.source, self.target)
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn orientation(&self) -> Orientation {
        Orientation::Forward
    }

    fn is_fixed(&self) -> bool {
        true
    }

    fn direction_from(&self, v: VertexId) -> Option<Direction> {
        (v == self.source).then_some(Direction::Forward)
    }

    fn consistent_paths(&self) -> usize {
        self.uses.len()
    }
}

/// An edge whose direction is decided by the orientation engine.
#[derive(Debug, Clone)]
pub struct UndirEdge {
    source: VertexId,
    target: VertexId,
    weight: f64,
    orientation: Orientation,
    fixed: bool,
    uses: Vec<PathUse>,
}

impl UndirEdge {
    pub(crate) fn new(source: VertexId, target: VertexId, weight: f64) -> Self {
        debug_assert!(weight > 0.0 && weight <= 1.0);
        Self {
            source,
            target,
            weight,
            orientation: Orientation::Unoriented,
            fixed: false,
            uses: Vec::new(),
        }
    }

    #[inline]
    pub fn source(&self) -> VertexId {
        self.source
    }

    #[inline]
    pub fn target(&self) -> VertexId {
        self.target
    }

    pub fn uses(&self) -> &[PathUse] {
        &self.uses
    }

    /// Returns `true` if at least one path traverses this edge.
    #[inline]
    pub fn is_used(&self) -> bool {
        !self.uses.is_empty()
    }

    /// Number of associated paths desiring forward resp. backward.
    pub fn desires(&self) -> (usize, usize) {
        let forward = self
            .uses
            .iter()
            .filter(|u| u.dir == Direction::Forward)
            .count();
        (forward, self.uses.len() - forward)
    }

    /// Returns `true` if paths want this edge in both directions.
    pub fn has_conflict(&self) -> bool {
        let (forward, backward) = self.desires();
        forward > 0 && backward > 0
    }

    /// Fixes the orientation if all associated paths agree on a direction.
    ///
    /// Returns `true` iff the edge was not fixed before but is now. Unused
    /// and conflicted edges are left untouched.
    pub fn fix_if_no_conflicts(&mut self) -> bool {
        if self.fixed || !self.is_used() || self.has_conflict() {
            return false;
        }

        let (forward, _) = self.desires();
        let dir = if forward > 0 {
            Direction::Forward
        } else {
            Direction::Backward
        };
        self.orientation = Orientation::of(dir);
        self.fixed = true;
        true
    }

    /// Sets the orientation of a non-fixed edge.
    pub fn set_orientation(&mut self, orientation: Orientation) {
        debug_assert!(!self.fixed, "orientation of a fixed edge must not change");
        self.orientation = orientation;
    }

    /// Orients the edge uniformly at random.
    pub fn rand_orient<R: Rng>(&mut self, rng: &mut R) {
        let dir = if rng.random_bool(0.5) {
            Direction::Forward
        } else {
            Direction::Backward
        };
        self.set_orientation(Orientation::of(dir));
    }

    /// Inverts the current orientation.
    ///
    /// # Panics
    /// Panics if the edge is fixed or not yet oriented.
    pub fn flip(&mut self) {
        assert!(
            !self.fixed && self.orientation != Orientation::Unoriented,
            "only oriented, non-fixed edges can be flipped"
        );
        self.orientation = self.orientation.flipped();
    }

    pub(crate) fn assoc_path(&mut self, path: PathId, dir: Direction) {
        self.uses.push(PathUse { path, dir });
    }

    pub(crate) fn remove_path(&mut self, path: PathId) {
        self.uses.retain(|u| u.path != path);
    }
}

impl EdgeOps for UndirEdge {
    fn endpoints(&self) -> (VertexId, VertexId) {
        (self.source, self.target)
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn orientation(&self) -> Orientation {
        self.orientation
    }

    fn is_fixed(&self) -> bool {
        self.fixed
    }

    fn direction_from(&self, v: VertexId) -> Option<Direction> {
        if v == self.source {
            Some(Direction::Forward)
        } else if v == self.target {
            Some(Direction::Backward)
        } else {
            None
        }
    }

    fn consistent_paths(&self) -> usize {
        match self.orientation.direction() {
            None => self.uses.len(),
            Some(dir) => self.uses.iter().filter(|u| u.dir == dir).count(),
        }
    }
}
