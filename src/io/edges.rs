//! # Edges File
//!
//! One edge per line: `name1 TYPE name2 = weight` where `TYPE` is `(pp)`
//! for an undirected edge or `(pd)` for a directed edge `name1 → name2`.
//! Weights must lie in `(0, 1]`; vertex names are registered on first use.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use super::*;
use crate::{
    error::{OrientError, Result},
    graph::Graph,
};

/// Reads edges into the graph, registering unknown vertices with node
/// weight 1. Returns the number of edges read.
pub fn read_edges<R: BufRead>(graph: &mut Graph, reader: R) -> Result<usize> {
    let mut count = 0;
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let source = next_token!(parts, "edge source", line);
        let kind = next_token!(parts, "edge type", line);
        let target = next_token!(parts, "edge target", line);
        raise_line_error_unless!(next_token!(parts, "edge separator", line) == "=", "edge separator", line);
        let weight: f64 = parse_next_token!(parts, "edge weight", line);
        raise_line_error_unless!(parts.next().is_none(), "edge", line);

        if !(weight > 0.0 && weight <= 1.0) {
            return Err(OrientError::WeightOutOfRange {
                weight,
                line: line.to_string(),
            });
        }

        let source = graph.ensure_vertex(source)?;
        let target = graph.ensure_vertex(target)?;
        match kind {
            "(pp)" => graph.add_undirected_edge(source, target, weight),
            "(pd)" => graph.add_directed_edge(source, target, weight),
            _ => {
                return Err(OrientError::MalformedLine {
                    what: "edge type",
                    line: line.to_string(),
                })
            }
        };
        count += 1;
    }
    Ok(count)
}

/// Reads edges from a file.
pub fn read_edges_file<P: AsRef<Path>>(graph: &mut Graph, path: P) -> Result<usize> {
    read_edges(graph, BufReader::new(File::open(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::EdgeOps;

    #[test]
    fn mixed_edge_list_parses() {
        let input = "\
# interaction network
A (pp) B = 0.8

B (pd) C = 0.5
C (pp) A = 1.0
";
        let mut graph = Graph::new();
        assert_eq!(read_edges(&mut graph, input.as_bytes()).unwrap(), 3);

        assert_eq!(graph.number_of_vertices(), 3);
        assert_eq!(graph.undir_edges().len(), 2);
        assert_eq!(graph.dir_edges().len(), 1);

        let a = graph.vertex_id("A").unwrap();
        let b = graph.vertex_id("B").unwrap();
        let c = graph.vertex_id("C").unwrap();
        assert_eq!(graph.undir_edges()[0].endpoints(), (a, b));
        assert_eq!(graph.undir_edges()[0].weight(), 0.8);
        assert_eq!(graph.dir_edges()[0].endpoints(), (b, c));

        // Auto-registered vertices default to node weight 1.
        assert_eq!(graph.vertex(a).weight(), 1.0);
    }

    #[test]
    fn malformed_lines_are_rejected() {
        for input in [
            "A (pp) B 0.8",        // missing separator
            "A (pp) B =",          // missing weight
            "A (pp) B = fast",     // non-numeric weight
            "A [pp] B = 0.8",      // unknown edge type
            "A (pp) B = 0.8 junk", // trailing token
            "A (pp)",              // truncated
        ] {
            let mut graph = Graph::new();
            assert!(
                matches!(
                    read_edges(&mut graph, input.as_bytes()),
                    Err(OrientError::MalformedLine { .. })
                ),
                "accepted `{input}`"
            );
        }
    }

    #[test]
    fn weights_outside_the_unit_interval_are_rejected() {
        for weight in ["0", "-0.5", "1.5"] {
            let mut graph = Graph::new();
            let input = format!("A (pp) B = {weight}");
            assert!(matches!(
                read_edges(&mut graph, input.as_bytes()),
                Err(OrientError::WeightOutOfRange { .. })
            ));
        }
    }

    #[test]
    fn reserved_names_are_rejected() {
        let mut graph = Graph::new();
        assert!(matches!(
            read_edges(&mut graph, "A_1 (pp) B = 0.8".as_bytes()),
            Err(OrientError::ReservedName(_))
        ));
    }
}
