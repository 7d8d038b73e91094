/*!
# IO

Parsers for the three input files of an orientation run and writers for the
two result files.

## Input Formats

- **Edges**: one edge per line, `name1 TYPE name2 = weight` with `TYPE`
  either `(pp)` (undirected) or `(pd)` (directed `name1 → name2`).
- **Sources**: one vertex name per line.
- **Targets**: one vertex name per line, optionally followed by a target
  weight.

Unknown vertex names are registered on the fly with node weight 1. Lines
that are empty or start with `#` are skipped. The `_` character is reserved
and rejected in vertex names.

## Output Formats

- **Path listing**: every enumerated path with its satisfaction flag and
  best-case weight, optionally ordered by a [`PathRank`](crate::path::PathRank)
  statistic.
- **Edge listing**: every edge lying on at least one satisfied path, with
  its type, orientation flag and weight.

All readers work on any [`BufRead`](std::io::BufRead) and all writers on
any [`Write`](std::io::Write); `*_file` variants wrap buffered file
handles.
*/

pub mod edges;
pub mod output;
pub mod terminals;

pub use edges::*;
pub use output::*;
pub use terminals::*;

/// Shorthand for returning an input error early when a condition fails
macro_rules! raise_line_error_unless {
    ($cond:expr, $what:expr, $line:expr) => {
        if !($cond) {
            return Err(crate::error::OrientError::MalformedLine {
                what: $what,
                line: $line.to_string(),
            });
        }
    };
}

/// Takes the next whitespace token of a line and fails if the line ends
macro_rules! next_token {
    ($iterator:expr, $what:expr, $line:expr) => {{
        let next = $iterator.next();
        raise_line_error_unless!(next.is_some(), $what, $line);
        next.unwrap()
    }};
}

/// Tries to parse the next token in an iterator and returns early if it fails
macro_rules! parse_next_token {
    ($iterator:expr, $what:expr, $line:expr) => {{
        let parsed = next_token!($iterator, $what, $line).parse();
        raise_line_error_unless!(parsed.is_ok(), $what, $line);
        parsed.unwrap()
    }};
}

use next_token;
use parse_next_token;
use raise_line_error_unless;
