// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025-2026 JR Morton

//! Exec argument-vector generalization.
//!
//! Executable paths themselves are never generalized; only argument
//! positions are. Vectors are grouped by executable, collapsed through an
//! [`ArgAnalyzer`], deduplicated by their stable string form, and returned
//! in that form's order.

use std::collections::BTreeMap;

use crate::profile::ExecCall;

use super::ArgAnalyzer;

/// Collapse a batch of exec calls. Argument positions with more than
/// `threshold` distinct values read back as `⋯`.
pub fn analyze_execs(execs: &[ExecCall], threshold: usize) -> Vec<ExecCall> {
    if execs.is_empty() {
        return Vec::new();
    }

    let mut analyzer = ArgAnalyzer::new(threshold);

    // pass 1: build the per-executable tries
    for exec in execs {
        analyzer.add_args(&exec.args, &exec.path);
    }

    // pass 2: read collapsed vectors, dedupe by the stable string form
    let mut deduped: BTreeMap<String, ExecCall> = BTreeMap::new();
    for exec in execs {
        let collapsed = ExecCall {
            path: exec.path.clone(),
            args: analyzer.analyze_args(&exec.args, &exec.path),
            envs: exec.envs.clone(),
            parent_path: exec.parent_path.clone(),
        };
        deduped.entry(collapsed.dedup_key()).or_insert(collapsed);
    }

    deduped.into_values().collect()
}
