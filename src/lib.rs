/*!
`netorient` orients the undirected edges of a mixed directed/undirected
weighted network so that the total weight of satisfied bounded-length
source→target paths is maximized.

# Model

An input network mixes directed edges (orientation given) with undirected
ones. Every simple path of bounded length from a source to a target wants
each of its edges pointed along its walk; a path is *satisfied* once all
its edges are unoriented or pointed its way, and then contributes the
product of its edge weights, vertex weights and target weight to the
global score.

After enumeration, undirected edges whose paths agree on a direction are
fixed immediately. The remaining *conflict edges* are oriented by one of
the engine's algorithms: repeated random orientation, random orientation
followed by steepest-ascent edge-flip local search, or an external
weighted-CSP solver fed through the [`wcsp`] codec. The problem is NP-hard,
so all algorithms are heuristics without an optimality guarantee.

# Usage

```
use netorient::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

# fn main() -> Result<(), OrientError> {
let mut graph = Graph::new();
let a = graph.ensure_vertex("A")?;
let b = graph.ensure_vertex("B")?;
let c = graph.ensure_vertex("C")?;
graph.add_undirected_edge(a, b, 0.9);
graph.add_undirected_edge(b, c, 0.5);
graph.mark_source(a);
graph.mark_target(c, 1.0);

let mut engine = OrientationEngine::new(graph);
engine.find_paths(5);
engine.find_conflicts();

let mut rng = Pcg64Mcg::seed_from_u64(42);
let best = engine.rand_plus_search_sln(10, &mut rng);
assert_eq!(best, engine.max_global_score());
# Ok(())
# }
```

The `netorient` binary drives the same pipeline from a properties file;
see [`config`] for the recognized keys and [`io`] for the file formats.
*/

pub mod bitset;
pub mod config;
pub mod edge;
pub mod engine;
pub mod error;
pub mod graph;
pub mod io;
pub mod path;
pub mod vertex;
pub mod wcsp;

/// `netorient::prelude` bundles the graph model, the engine and the
/// configuration types.
pub mod prelude {
    pub use super::{
        config::{Algorithm, CspPhase, Settings},
        edge::*,
        engine::*,
        error::OrientError,
        graph::Graph,
        path::{Path, PathDisplay, PathRank, WEIGHT_THRESHOLD},
        vertex::*,
    };
}
