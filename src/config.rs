/*!
# Run Configuration

An orientation run is configured by a properties file of `key=value` lines.
Blank lines and lines starting with `#` or `!` are skipped; later
assignments override earlier ones; unrecognized keys are logged and
ignored. A known key with a value outside its accepted set is a fatal
configuration error.

| key | values | effect |
|---|---|---|
| `edges.file` | path | input edges |
| `sources.file` | path | one source name per line |
| `targets.file` | path | one target name (optional weight) per line |
| `edge.output.file` | path | edges on satisfied paths |
| `path.output.file` | path | all enumerated paths |
| `max.path.length` | int ≥ 1 | search depth bound (default 5) |
| `local.search` | `Yes` / `No` | run local search after orientation |
| `alg` | `Random` / `MAXCSP` | algorithm selector |
| `rand.restarts` | int ≥ 1 | restarts for the randomized algorithms |
| `csp.phase` | `Gen` / `Score` | emit a WCSP instance or ingest a solution |
| `csp.gen.file` | path | WCSP instance output (Gen phase) |
| `csp.sol.file` | path | WCSP solution input (Score phase) |
| `rand.seed` | u64 | seed for the random number generator |
| `path.sort.by` | a [`PathRank`] key | order of the path listing |
*/

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use fxhash::FxHashMap;
use tracing::warn;

use crate::{
    engine::{DEFAULT_MAX_PATH_LENGTH, DEFAULT_RAND_RESTARTS},
    error::{OrientError, Result},
    path::PathRank,
};

const KNOWN_KEYS: [&str; 14] = [
    "edges.file",
    "sources.file",
    "targets.file",
    "edge.output.file",
    "path.output.file",
    "max.path.length",
    "local.search",
    "alg",
    "rand.restarts",
    "csp.phase",
    "csp.gen.file",
    "csp.sol.file",
    "rand.seed",
    "path.sort.by",
];

/// Orientation algorithm selected by the `alg` property.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Algorithm {
    /// Repeated random orientation, optionally with local search.
    Random,
    /// Two-phase weighted-CSP encoding for an external solver.
    MaxCsp,
}

impl FromStr for Algorithm {
    type Err = OrientError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "rand" | "random" => Ok(Algorithm::Random),
            "maxcsp" | "max-csp" => Ok(Algorithm::MaxCsp),
            _ => Err(OrientError::InvalidProperty {
                key: "alg",
                value: s.to_string(),
            }),
        }
    }
}

/// Phase of a weighted-CSP run.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CspPhase {
    /// Write the instance file for the external solver.
    Generate,
    /// Read the solver's solution and score it.
    Score,
}

impl FromStr for CspPhase {
    type Err = OrientError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gen" | "generate" => Ok(CspPhase::Generate),
            "score" => Ok(CspPhase::Score),
            _ => Err(OrientError::InvalidProperty {
                key: "csp.phase",
                value: s.to_string(),
            }),
        }
    }
}

/// Fully validated configuration of one orientation run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub edges_file: PathBuf,
    pub sources_file: PathBuf,
    pub targets_file: PathBuf,
    pub edge_output_file: PathBuf,
    pub path_output_file: PathBuf,
    pub max_path_length: usize,
    pub local_search: bool,
    pub alg: Algorithm,
    pub rand_restarts: usize,
    pub csp_phase: CspPhase,
    /// Required when `alg` is MAXCSP in the Gen phase.
    pub csp_gen_file: Option<PathBuf>,
    /// Required when `alg` is MAXCSP in the Score phase.
    pub csp_sol_file: Option<PathBuf>,
    /// Generator seed; OS entropy when absent.
    pub rand_seed: Option<u64>,
    /// Order of the path listing; enumeration order when absent.
    pub path_sort: Option<PathRank>,
}

impl Settings {
    /// Loads and validates a properties file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        fs::read_to_string(path)?.parse()
    }
}

impl FromStr for Settings {
    type Err = OrientError;

    fn from_str(s: &str) -> Result<Self> {
        let mut props: FxHashMap<&str, &str> = FxHashMap::default();
        for raw in s.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(OrientError::MalformedLine {
                    what: "property",
                    line: line.to_string(),
                });
            };
            props.insert(key.trim(), value.trim());
        }

        for &key in props.keys() {
            if !KNOWN_KEYS.contains(&key) {
                warn!("ignoring unrecognized property `{key}`");
            }
        }

        let required = |key: &'static str| -> Result<PathBuf> {
            props
                .get(key)
                .map(PathBuf::from)
                .ok_or(OrientError::MissingProperty(key))
        };
        let count = |key: &'static str, default: usize| -> Result<usize> {
            match props.get(key) {
                None => Ok(default),
                Some(&value) => match value.parse::<usize>() {
                    Ok(n) if n >= 1 => Ok(n),
                    _ => Err(OrientError::InvalidProperty {
                        key,
                        value: value.to_string(),
                    }),
                },
            }
        };

        let local_search = match props.get("local.search") {
            None => true,
            Some(&value) => match value.to_lowercase().as_str() {
                "yes" => true,
                "no" => false,
                _ => {
                    return Err(OrientError::InvalidProperty {
                        key: "local.search",
                        value: value.to_string(),
                    })
                }
            },
        };

        let alg = match props.get("alg") {
            None => Algorithm::Random,
            Some(value) => value.parse()?,
        };
        let csp_phase = match props.get("csp.phase") {
            None => CspPhase::Generate,
            Some(value) => value.parse()?,
        };

        let rand_seed = match props.get("rand.seed") {
            None => None,
            Some(&value) => Some(value.parse::<u64>().map_err(|_| {
                OrientError::InvalidProperty {
                    key: "rand.seed",
                    value: value.to_string(),
                }
            })?),
        };
        let path_sort = match props.get("path.sort.by") {
            None => None,
            Some(value) => Some(value.parse::<PathRank>()?),
        };

        let csp_gen_file = props.get("csp.gen.file").map(PathBuf::from);
        let csp_sol_file = props.get("csp.sol.file").map(PathBuf::from);
        if alg == Algorithm::MaxCsp {
            match csp_phase {
                CspPhase::Generate if csp_gen_file.is_none() => {
                    return Err(OrientError::MissingProperty("csp.gen.file"))
                }
                CspPhase::Score if csp_sol_file.is_none() => {
                    return Err(OrientError::MissingProperty("csp.sol.file"))
                }
                _ => {}
            }
        }

        Ok(Settings {
            edges_file: required("edges.file")?,
            sources_file: required("sources.file")?,
            targets_file: required("targets.file")?,
            edge_output_file: required("edge.output.file")?,
            path_output_file: required("path.output.file")?,
            max_path_length: count("max.path.length", DEFAULT_MAX_PATH_LENGTH)?,
            local_search,
            alg,
            rand_restarts: count("rand.restarts", DEFAULT_RAND_RESTARTS)?,
            csp_phase,
            csp_gen_file,
            csp_sol_file,
            rand_seed,
            path_sort,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "\
edges.file=edges.txt
sources.file=sources.txt
targets.file=targets.txt
edge.output.file=edges.out
path.output.file=paths.out
";

    #[test]
    fn minimal_configuration_uses_defaults() {
        let settings: Settings = MINIMAL.parse().unwrap();
        assert_eq!(settings.edges_file, PathBuf::from("edges.txt"));
        assert_eq!(settings.max_path_length, DEFAULT_MAX_PATH_LENGTH);
        assert!(settings.local_search);
        assert_eq!(settings.alg, Algorithm::Random);
        assert_eq!(settings.rand_restarts, DEFAULT_RAND_RESTARTS);
        assert_eq!(settings.csp_phase, CspPhase::Generate);
        assert_eq!(settings.rand_seed, None);
        assert_eq!(settings.path_sort, None);
    }

    #[test]
    fn full_configuration_parses() {
        let input = format!(
            "{MINIMAL}\
# tuning
max.path.length = 3
local.search = No
alg = MAXCSP
csp.phase = Score
csp.sol.file = solution.txt
rand.restarts = 25
rand.seed = 12345
path.sort.by = MaxEdgeWeight
"
        );
        let settings: Settings = input.parse().unwrap();
        assert_eq!(settings.max_path_length, 3);
        assert!(!settings.local_search);
        assert_eq!(settings.alg, Algorithm::MaxCsp);
        assert_eq!(settings.csp_phase, CspPhase::Score);
        assert_eq!(settings.csp_sol_file, Some(PathBuf::from("solution.txt")));
        assert_eq!(settings.rand_restarts, 25);
        assert_eq!(settings.rand_seed, Some(12345));
        assert_eq!(settings.path_sort, Some(PathRank::MaxEdgeWeight));
    }

    #[test]
    fn alias_values_are_accepted() {
        assert_eq!("Rand".parse::<Algorithm>().unwrap(), Algorithm::Random);
        assert_eq!("MAX-CSP".parse::<Algorithm>().unwrap(), Algorithm::MaxCsp);
        assert_eq!("Generate".parse::<CspPhase>().unwrap(), CspPhase::Generate);
        assert_eq!("score".parse::<CspPhase>().unwrap(), CspPhase::Score);
    }

    #[test]
    fn invalid_values_are_fatal() {
        let invalid = [
            "alg = Greedy",
            "local.search = Maybe",
            "max.path.length = 0",
            "rand.restarts = ten",
            "csp.phase = Solve",
            "rand.seed = -1",
            "path.sort.by = Weight",
        ];
        for line in invalid {
            let input = format!("{MINIMAL}{line}\n");
            assert!(
                matches!(
                    input.parse::<Settings>(),
                    Err(OrientError::InvalidProperty { .. })
                ),
                "accepted `{line}`"
            );
        }
    }

    #[test]
    fn missing_required_files_are_fatal() {
        assert!(matches!(
            "edges.file=edges.txt".parse::<Settings>(),
            Err(OrientError::MissingProperty(_))
        ));

        let input = format!("{MINIMAL}alg=MAXCSP\ncsp.phase=Gen\n");
        assert!(matches!(
            input.parse::<Settings>(),
            Err(OrientError::MissingProperty("csp.gen.file"))
        ));

        let input = format!("{MINIMAL}alg=MAXCSP\ncsp.phase=Score\n");
        assert!(matches!(
            input.parse::<Settings>(),
            Err(OrientError::MissingProperty("csp.sol.file"))
        ));
    }

    #[test]
    fn unknown_keys_and_comments_are_ignored() {
        let input = format!("{MINIMAL}! legacy\n# comment\ncustom.key = 7\n");
        assert!(input.parse::<Settings>().is_ok());
    }

    #[test]
    fn later_assignments_override_earlier_ones() {
        let input = format!("{MINIMAL}max.path.length = 2\nmax.path.length = 4\n");
        let settings: Settings = input.parse().unwrap();
        assert_eq!(settings.max_path_length, 4);
    }
}
