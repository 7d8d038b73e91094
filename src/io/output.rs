//! # Result Writers
//!
//! The path listing reports every enumerated path with its satisfaction
//! state and best-case weight. The edge listing reports every edge lying on
//! at least one satisfied path, directed edges first.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path as FsPath,
};

use itertools::Itertools;

use crate::{
    edge::{EdgeBitSet, EdgeId, EdgeOps, Orientation},
    graph::Graph,
    path::{Path, PathRank},
};

/// Writes the path listing, one line per enumerated path. With a rank, the
/// listing is ordered by that statistic, best first; otherwise enumeration
/// order is kept.
pub fn write_paths<W: Write>(
    graph: &Graph,
    paths: &[Path],
    rank: Option<PathRank>,
    mut writer: W,
) -> io::Result<()> {
    writeln!(writer, "Path\tIs satisfied?\tPath weight")?;

    let mut order = (0..paths.len()).collect_vec();
    if let Some(rank) = rank {
        order.sort_by(|&a, &b| rank.compare(&paths[b], &paths[a]));
    }

    for i in order {
        let path = &paths[i];
        writeln!(
            writer,
            "{}\t{}\t{}",
            path.display(graph),
            path.is_connected(graph),
            path.max_weight()
        )?;
    }
    Ok(())
}

/// Writes the path listing to a file.
pub fn write_paths_file<P: AsRef<FsPath>>(
    graph: &Graph,
    paths: &[Path],
    rank: Option<PathRank>,
    path: P,
) -> io::Result<()> {
    write_paths(graph, paths, rank, BufWriter::new(File::create(path)?))
}

/// Writes every edge appearing on at least one satisfied path: directed
/// edges first, then undirected ones, each with its endpoints, type,
/// orientation flag and weight.
pub fn write_satisfied_edges<W: Write>(
    graph: &Graph,
    paths: &[Path],
    mut writer: W,
) -> io::Result<()> {
    let mut dir_used = EdgeBitSet::new(graph.dir_edges().len() as u32);
    let mut undir_used = EdgeBitSet::new(graph.undir_edges().len() as u32);
    for path in paths.iter().filter(|p| p.is_connected(graph)) {
        for &edge in path.edges() {
            match edge {
                EdgeId::Directed(i) => dir_used.set_bit(i),
                EdgeId::Undirected(i) => undir_used.set_bit(i),
            };
        }
    }

    writeln!(writer, "Source\tType\tTarget\tOriented\tWeight")?;
    for (i, edge) in graph.dir_edges().iter().enumerate() {
        if dir_used.get_bit(i as u32) {
            writeln!(
                writer,
                "{}\tpd\t{}\ttrue\t{}",
                graph.vertex(edge.source()).name(),
                graph.vertex(edge.target()).name(),
                edge.weight()
            )?;
        }
    }
    for (i, edge) in graph.undir_edges().iter().enumerate() {
        if undir_used.get_bit(i as u32) {
            let oriented = edge.orientation() != Orientation::Unoriented;
            writeln!(
                writer,
                "{}\tpp\t{}\t{}\t{}",
                graph.vertex(edge.source()).name(),
                graph.vertex(edge.target()).name(),
                oriented,
                edge.weight()
            )?;
        }
    }
    Ok(())
}

/// Writes the satisfied-path edge listing to a file.
pub fn write_satisfied_edges_file<P: AsRef<FsPath>>(
    graph: &Graph,
    paths: &[Path],
    path: P,
) -> io::Result<()> {
    write_satisfied_edges(graph, paths, BufWriter::new(File::create(path)?))
}
