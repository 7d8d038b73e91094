//! # Sources and Targets Files
//!
//! Sources: one vertex name per line. Targets: one vertex name per line,
//! optionally followed by a target weight in `[0, 1]` (default 1).

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use super::*;
use crate::{error::Result, graph::Graph};

/// Flags one vertex per line as a source, registering unknown names.
/// Returns the number of sources read.
pub fn read_sources<R: BufRead>(graph: &mut Graph, reader: R) -> Result<usize> {
    let mut count = 0;
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let name = next_token!(parts, "source name", line);
        raise_line_error_unless!(parts.next().is_none(), "source", line);

        let id = graph.ensure_vertex(name)?;
        graph.mark_source(id);
        count += 1;
    }
    Ok(count)
}

/// Reads sources from a file.
pub fn read_sources_file<P: AsRef<Path>>(graph: &mut Graph, path: P) -> Result<usize> {
    read_sources(graph, BufReader::new(File::open(path)?))
}

/// Flags one vertex per line as a target, with an optional per-line target
/// weight. Returns the number of targets read.
pub fn read_targets<R: BufRead>(graph: &mut Graph, reader: R) -> Result<usize> {
    let mut count = 0;
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let name = next_token!(parts, "target name", line);
        let weight = match parts.next() {
            None => 1.0,
            Some(token) => {
                let parsed: std::result::Result<f64, _> = token.parse();
                raise_line_error_unless!(parsed.is_ok(), "target weight", line);
                parsed.unwrap()
            }
        };
        raise_line_error_unless!((0.0..=1.0).contains(&weight), "target weight", line);
        raise_line_error_unless!(parts.next().is_none(), "target", line);

        let id = graph.ensure_vertex(name)?;
        graph.mark_target(id, weight);
        count += 1;
    }
    Ok(count)
}

/// Reads targets from a file.
pub fn read_targets_file<P: AsRef<Path>>(graph: &mut Graph, path: P) -> Result<usize> {
    read_targets(graph, BufReader::new(File::open(path)?))
}
