/*!
# Weighted-CSP Codec

Encodes the conflict-edge orientation problem as a weighted CSP in the
XCSP 2.1 format (`type="WCSP"`), to be solved by an external solver, and
reads the solver's solution line back.

- One binary variable `E<k>` per conflict edge, where `k` is the edge's
  position in the conflict list (`0` = backward, `1` = forward).
- One soft relation `R<p>` and constraint `C<p>` per *conflict path* (a
  path crossing at least one conflict edge). The relation's single
  zero-cost tuple is the assignment satisfying the path; its default cost
  is the path's best-case weight scaled by 1000 and rounded.
- `maximalCost` is `1000 · |conflict paths| + 1`, a cost no assignment can
  reach.

Paths without conflict edges are already satisfied by fixing and need no
constraint. The solution file holds a single whitespace-separated line of
`0`/`1` tokens, one per conflict edge, in conflict-list order.
*/

use std::io::{self, BufRead, Write};

use fxhash::FxHashMap;
use itertools::Itertools;

use crate::{
    edge::{Direction, EdgeId, EdgeIdx},
    error::{OrientError, Result},
    graph::Graph,
    path::Path,
};

/// Writes the complete XCSP 2.1 instance for the given conflict edges.
pub fn write_instance<W: Write>(
    graph: &Graph,
    paths: &[Path],
    conflict_edges: &[EdgeIdx],
    mut writer: W,
) -> io::Result<()> {
    let var_ids: FxHashMap<EdgeIdx, usize> = conflict_edges
        .iter()
        .enumerate()
        .map(|(k, &i)| (i, k))
        .collect();
    let conflict_paths = paths.iter().filter(|p| p.has_conflicts(graph)).collect_vec();

    writeln!(writer, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n")?;
    writeln!(writer, "<instance>")?;
    writeln!(
        writer,
        "<presentation name=\"EdgeOrientation\" format=\"XCSP 2.1\" type=\"WCSP\"/>\n"
    )?;

    // All variables are binary, so a single domain suffices.
    writeln!(writer, "<domains nbDomains=\"1\">")?;
    writeln!(writer, "<domain name=\"D0\" nbValues=\"2\">0..1</domain>")?;
    writeln!(writer, "</domains>\n")?;

    writeln!(writer, "<variables nbVariables=\"{}\">", conflict_edges.len())?;
    for k in 0..conflict_edges.len() {
        writeln!(writer, "<variable name=\"E{k}\" domain=\"D0\"/>")?;
    }
    writeln!(writer, "</variables>\n")?;

    writeln!(writer, "<relations nbRelations=\"{}\">", conflict_paths.len())?;
    for (p, path) in conflict_paths.iter().enumerate() {
        write_relation(graph, path, &var_ids, p, &mut writer)?;
    }
    writeln!(writer, "</relations>\n")?;

    // A cost beyond every reachable assignment stands in for infinity.
    let maximal_cost = 1000 * conflict_paths.len() as u64 + 1;
    writeln!(
        writer,
        "<constraints nbConstraints=\"{}\" maximalCost=\"{maximal_cost}\">",
        conflict_paths.len()
    )?;
    for (p, path) in conflict_paths.iter().enumerate() {
        write_constraint(graph, path, &var_ids, p, &mut writer)?;
    }
    writeln!(writer, "</constraints>")?;
    writeln!(writer, "</instance>")?;
    Ok(())
}

/// The variable ids and desired directions of a path's conflict edges, in
/// path order.
///
/// # Panics
/// Panics if the path has no conflict edges; callers must only pass
/// conflict paths.
fn conflict_vars(
    graph: &Graph,
    path: &Path,
    var_ids: &FxHashMap<EdgeIdx, usize>,
) -> Vec<(usize, Direction)> {
    let vars = path
        .edges()
        .iter()
        .zip(path.desired_directions())
        .filter_map(|(&e, &dir)| match e {
            EdgeId::Undirected(i) if graph.undir_edge(i).has_conflict() => {
                let var = var_ids
                    .get(&i)
                    .copied()
                    .expect("conflict edge is missing from the conflict list");
                Some((var, dir))
            }
            _ => None,
        })
        .collect_vec();
    assert!(
        !vars.is_empty(),
        "path treated as a conflict path has no conflict edges"
    );
    vars
}

fn write_relation<W: Write>(
    graph: &Graph,
    path: &Path,
    var_ids: &FxHashMap<EdgeIdx, usize>,
    index: usize,
    writer: &mut W,
) -> io::Result<()> {
    let vars = conflict_vars(graph, path, var_ids);
    let tuple = vars
        .iter()
        .map(|&(_, dir)| match dir {
            Direction::Forward => "1",
            Direction::Backward => "0",
        })
        .join(" ");
    let cost = (path.max_weight() * 1000.0).round() as u64;

    writeln!(
        writer,
        "<relation name=\"R{index}\" arity=\"{}\" nbTuples=\"1\" semantics=\"soft\" defaultCost=\"{cost}\">0:{tuple}</relation>",
        vars.len()
    )
}

fn write_constraint<W: Write>(
    graph: &Graph,
    path: &Path,
    var_ids: &FxHashMap<EdgeIdx, usize>,
    index: usize,
    writer: &mut W,
) -> io::Result<()> {
    let vars = conflict_vars(graph, path, var_ids);
    let scope = vars.iter().map(|&(var, _)| format!("E{var}")).join(" ");

    writeln!(
        writer,
        "<constraint name=\"C{index}\" arity=\"{}\" scope=\"{scope}\" reference=\"R{index}\"/>",
        vars.len()
    )
}

/// Reads a solver solution: one whitespace-separated line of `0`/`1`
/// tokens, one per conflict edge.
pub fn read_solution<R: BufRead>(mut reader: R, expected: usize) -> Result<Vec<Direction>> {
    let mut line = String::new();
    reader.read_line(&mut line)?;

    let mut directions = Vec::with_capacity(expected);
    for token in line.split_whitespace() {
        match token {
            "0" => directions.push(Direction::Backward),
            "1" => directions.push(Direction::Forward),
            _ => return Err(OrientError::SolutionToken(token.to_string())),
        }
    }

    if directions.len() != expected {
        return Err(OrientError::SolutionLength {
            expected,
            found: directions.len(),
        });
    }
    Ok(directions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        edge::{EdgeOps, Orientation},
        engine::OrientationEngine,
    };

    /// One conflict edge A—B pulled forward by a path of weight 0.3 and
    /// backward by a path of weight 0.5.
    fn tug_of_war_engine() -> OrientationEngine {
        let mut graph = Graph::new();
        let s1 = graph.ensure_vertex("S1").unwrap();
        let s2 = graph.ensure_vertex("S2").unwrap();
        let t1 = graph.ensure_vertex("T1").unwrap();
        let t2 = graph.ensure_vertex("T2").unwrap();
        let a = graph.ensure_vertex("A").unwrap();
        let b = graph.ensure_vertex("B").unwrap();
        graph.add_directed_edge(s1, a, 0.3);
        graph.add_directed_edge(s2, b, 0.5);
        graph.add_directed_edge(b, t1, 1.0);
        graph.add_directed_edge(a, t2, 1.0);
        graph.add_undirected_edge(a, b, 1.0);
        graph.mark_source(s1);
        graph.mark_source(s2);
        graph.mark_target(t1, 1.0);
        graph.mark_target(t2, 1.0);

        let mut engine = OrientationEngine::new(graph);
        engine.find_paths(3);
        engine.find_conflicts();
        engine
    }

    #[test]
    fn instance_format_is_stable() {
        let mut engine = tug_of_war_engine();
        let mut buffer = Vec::new();
        engine.write_wcsp(&mut buffer).unwrap();

        let expected = "\
<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
\n\
<instance>\n\
<presentation name=\"EdgeOrientation\" format=\"XCSP 2.1\" type=\"WCSP\"/>\n\
\n\
<domains nbDomains=\"1\">\n\
<domain name=\"D0\" nbValues=\"2\">0..1</domain>\n\
</domains>\n\
\n\
<variables nbVariables=\"1\">\n\
<variable name=\"E0\" domain=\"D0\"/>\n\
</variables>\n\
\n\
<relations nbRelations=\"2\">\n\
<relation name=\"R0\" arity=\"1\" nbTuples=\"1\" semantics=\"soft\" defaultCost=\"300\">0:1</relation>\n\
<relation name=\"R1\" arity=\"1\" nbTuples=\"1\" semantics=\"soft\" defaultCost=\"500\">0:0</relation>\n\
</relations>\n\
\n\
<constraints nbConstraints=\"2\" maximalCost=\"2001\">\n\
<constraint name=\"C0\" arity=\"1\" scope=\"E0\" reference=\"R0\"/>\n\
<constraint name=\"C1\" arity=\"1\" scope=\"E0\" reference=\"R1\"/>\n\
</constraints>\n\
</instance>\n";
        assert_eq!(String::from_utf8(buffer).unwrap(), expected);
    }

    #[test]
    fn solution_round_trip_reproduces_the_score() {
        let mut engine = tug_of_war_engine();
        let mut instance = Vec::new();
        engine.write_wcsp(&mut instance).unwrap();

        // The optimal assignment breaks the cheaper path.
        let global = engine.score_wcsp("0\n".as_bytes()).unwrap();
        assert!((global - 1.3).abs() < 1e-12);
        assert_eq!(
            engine.graph().undir_edge(0).orientation(),
            Orientation::Backward
        );

        let global = engine.score_wcsp("1".as_bytes()).unwrap();
        assert!((global - 1.1).abs() < 1e-12);
    }

    #[test]
    fn solutions_parse_with_arbitrary_whitespace() {
        let directions = read_solution("  1 0\t1 \n".as_bytes(), 3).unwrap();
        assert_eq!(
            directions,
            vec![Direction::Forward, Direction::Backward, Direction::Forward]
        );
    }

    #[test]
    fn malformed_solutions_are_rejected() {
        assert!(matches!(
            read_solution("1 2 0".as_bytes(), 3),
            Err(OrientError::SolutionToken(t)) if t == "2"
        ));
        assert!(matches!(
            read_solution("1 0".as_bytes(), 3),
            Err(OrientError::SolutionLength {
                expected: 3,
                found: 2
            })
        ));
        assert!(matches!(
            read_solution("".as_bytes(), 1),
            Err(OrientError::SolutionLength {
                expected: 1,
                found: 0
            })
        ));
    }
}
