// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025-2026 JR Morton

//! Dynamic path detection engine.
//!
//! Collapses repeated, structurally-similar runtime observations into
//! compact patterns using two marker segments:
//!
//! - `⋯` (U+22EF) matches exactly one path segment
//! - `*` matches zero or more path segments
//!
//! The engine is a prefix tree with per-prefix collapse thresholds: once a
//! node accumulates more distinct literal children than its threshold
//! allows, the children are folded into a single dynamic node. A threshold
//! of 1 short-circuits straight to a wildcard.
//!
//! ## Module structure
//!
//! - `trie`: the segment trie and its union-merge
//! - `path_analyzer`: per-identifier tries + the two-pass analyze protocol
//! - `arg_analyzer`: per-executable argument-position tries
//! - `opens`: file-open generalization driver
//! - `endpoints`: HTTP endpoint generalization driver
//! - `execs`: exec argument-vector generalization driver
//!
//! Analyzers are cheap and single-use: construct one per batch, prime it
//! with the full input, read the generalized forms back, drop it. Nothing
//! here is safe for concurrent mutation.

mod arg_analyzer;
mod endpoints;
mod execs;
mod opens;
mod path_analyzer;
mod trie;


pub use arg_analyzer::ArgAnalyzer;
pub use endpoints::analyze_endpoints;
pub use execs::analyze_execs;
pub use opens::analyze_opens;
pub use path_analyzer::PathAnalyzer;
pub use trie::TrieNode;

/// Matches exactly one path segment. Persisted profiles carry this
/// codepoint verbatim (UTF-8 bytes E2 8B AF), so it must never be
/// substituted with an ASCII lookalike.
pub const DYNAMIC_IDENTIFIER: &str = "\u{22ef}";

/// Matches zero or more path segments.
pub const WILDCARD_IDENTIFIER: &str = "*";

/// Collapse threshold for file-open paths.
pub const OPEN_DYNAMIC_THRESHOLD: usize = 50;

/// Collapse threshold for HTTP endpoint paths.
pub const ENDPOINT_DYNAMIC_THRESHOLD: usize = 100;

/// Collapse threshold for exec argument positions.
pub const EXEC_ARG_THRESHOLD: usize = 50;

/// Threshold applied to prefixes without an explicit [`CollapseConfig`]
/// when an analyzer is built from a config list alone.
pub const DEFAULT_FALLBACK_THRESHOLD: usize = 5;

/// Per-prefix collapse threshold. A node whose path falls under `prefix`
/// collapses its children once more than `threshold` distinct literal
/// children accumulate. `threshold` 1 is special: the first literal child
/// is immediately replaced with a wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapseConfig {
    pub prefix: String,
    pub threshold: usize,
}

impl CollapseConfig {
    pub fn new(prefix: impl Into<String>, threshold: usize) -> Self {
        Self { prefix: prefix.into(), threshold }
    }
}

/// The per-prefix thresholds profiles ship with. `/app` is wildcarded
/// immediately because application working directories are dominated by
/// per-request temporary files; `/var/run` and `/opt` scatter quickly too.
pub fn default_collapse_configs() -> Vec<CollapseConfig> {
    vec![
        CollapseConfig::new("/etc", 50),
        CollapseConfig::new("/opt", 5),
        CollapseConfig::new("/var/run", 3),
        CollapseConfig::new("/app", 1),
    ]
}

/// Split a path into its non-empty segments. Leading, trailing, and
/// repeated slashes all canonicalize away.
pub(crate) fn canonical_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Replace every run of two or more consecutive `⋯` segments with a single
/// `*`. A lone `⋯` is kept; static segments between two `⋯` keep both.
///
/// The input's leading slash (or lack of one) is preserved.
pub fn collapse_adjacent_dynamics(path: &str) -> String {
    let rooted = path.starts_with('/');
    let segments = canonical_segments(path);

    let mut out: Vec<&str> = Vec::with_capacity(segments.len());
    let mut run = 0usize;
    for segment in segments {
        if segment == DYNAMIC_IDENTIFIER {
            run += 1;
            continue;
        }
        flush_dynamic_run(&mut out, run);
        run = 0;
        out.push(segment);
    }
    flush_dynamic_run(&mut out, run);

    let joined = out.join("/");
    if rooted {
        format!("/{joined}")
    } else {
        joined
    }
}

fn flush_dynamic_run<'a>(out: &mut Vec<&'a str>, run: usize) {
    match run {
        0 => {}
        1 => out.push(DYNAMIC_IDENTIFIER),
        _ => out.push(WILDCARD_IDENTIFIER),
    }
}

/// Segment-wise pattern match: `⋯` consumes exactly one segment, `*`
/// consumes zero or more. Patterns without markers fall back to a plain
/// comparison of canonical segments.
pub fn compare_dynamic(pattern: &str, path: &str) -> bool {
    if !pattern.contains(WILDCARD_IDENTIFIER) && !pattern.contains(DYNAMIC_IDENTIFIER) {
        return canonical_segments(pattern) == canonical_segments(path);
    }
    tracing::trace!(pattern, path, "matching with marker segments");
    match_segments(&canonical_segments(pattern), &canonical_segments(path))
}

fn match_segments(pattern: &[&str], path: &[&str]) -> bool {
    let Some((&head, rest)) = pattern.split_first() else {
        return path.is_empty();
    };
    match head {
        WILDCARD_IDENTIFIER => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        DYNAMIC_IDENTIFIER => !path.is_empty() && match_segments(rest, &path[1..]),
        literal => !path.is_empty() && path[0] == literal && match_segments(rest, &path[1..]),
    }
}
