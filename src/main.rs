//! Properties-file driven front end for the orientation engine.

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::Parser;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use tracing_subscriber::EnvFilter;

use netorient::{
    config::{Algorithm, CspPhase, Settings},
    engine::OrientationEngine,
    graph::Graph,
    io,
};

/// Orients the undirected edges of a mixed interaction network so that the
/// total weight of satisfied source→target paths is maximized.
#[derive(Parser)]
#[command(name = "netorient", version)]
#[command(about = "Maximum-weight edge orientation for mixed interaction networks")]
struct Cli {
    /// Properties file configuring the run
    properties: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    run(&Cli::parse().properties)
}

fn run(properties: &Path) -> anyhow::Result<()> {
    let settings = Settings::from_file(properties)
        .with_context(|| format!("cannot load properties from {}", properties.display()))?;

    let mut graph = Graph::new();
    io::read_edges_file(&mut graph, &settings.edges_file)
        .with_context(|| format!("cannot read edges from {}", settings.edges_file.display()))?;
    io::read_sources_file(&mut graph, &settings.sources_file).with_context(|| {
        format!("cannot read sources from {}", settings.sources_file.display())
    })?;
    io::read_targets_file(&mut graph, &settings.targets_file).with_context(|| {
        format!("cannot read targets from {}", settings.targets_file.display())
    })?;

    let mut engine = OrientationEngine::new(graph);
    engine.find_paths(settings.max_path_length);
    engine.find_conflicts();

    let mut rng = match settings.rand_seed {
        Some(seed) => Pcg64Mcg::seed_from_u64(seed),
        None => Pcg64Mcg::from_os_rng(),
    };

    match settings.alg {
        Algorithm::Random => {
            if settings.local_search {
                engine.rand_plus_search_sln(settings.rand_restarts, &mut rng);
            } else {
                engine.rand_sln(settings.rand_restarts, &mut rng);
            }
        }
        Algorithm::MaxCsp => match settings.csp_phase {
            CspPhase::Generate => {
                let path = settings.csp_gen_file.as_ref().expect("validated by Settings");
                let writer = BufWriter::new(
                    File::create(path)
                        .with_context(|| format!("cannot create {}", path.display()))?,
                );
                engine
                    .write_wcsp(writer)
                    .with_context(|| format!("cannot write the WCSP instance to {}", path.display()))?;
            }
            CspPhase::Score => {
                let path = settings.csp_sol_file.as_ref().expect("validated by Settings");
                let reader = BufReader::new(
                    File::open(path).with_context(|| format!("cannot open {}", path.display()))?,
                );
                engine
                    .score_wcsp(reader)
                    .with_context(|| format!("cannot apply the solution from {}", path.display()))?;
                if settings.local_search {
                    engine.local_search_sln(&mut rng);
                }
            }
        },
    }

    io::write_paths_file(
        engine.graph(),
        engine.paths(),
        settings.path_sort,
        &settings.path_output_file,
    )
    .with_context(|| {
        format!(
            "cannot write the path listing to {}",
            settings.path_output_file.display()
        )
    })?;
    io::write_satisfied_edges_file(engine.graph(), engine.paths(), &settings.edge_output_file)
        .with_context(|| {
            format!(
                "cannot write the edge listing to {}",
                settings.edge_output_file.display()
            )
        })?;

    Ok(())
}
