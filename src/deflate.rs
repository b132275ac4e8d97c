// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025-2026 JR Morton

//! Per-container profile deflation.
//!
//! Runs the three generalization drivers over one container's recorded
//! behavior and normalizes everything else for deterministic output: lists
//! sorted, capability and syscall sets deduplicated, rule-policy process
//! lists sorted and deduplicated.
//!
//! Analyzers are constructed fresh per container. The opens analyzer
//! carries the default per-prefix collapse configs; the endpoint analyzer
//! runs with the endpoint threshold alone, since URL namespaces have no
//! filesystem-like hot spots.

use std::collections::{BTreeMap, HashSet};

use crate::config::Config;
use crate::detector::{
    analyze_endpoints, analyze_execs, analyze_opens, default_collapse_configs, PathAnalyzer,
};
use crate::profile::{ContainerProfile, RulePolicy};

/// Deflates one container profile at a time. Cheap to construct; holds only
/// thresholds.
pub struct ContainerDeflater {
    open_threshold: usize,
    endpoint_threshold: usize,
    exec_arg_threshold: usize,
}

impl ContainerDeflater {
    pub fn new(
        open_threshold: usize,
        endpoint_threshold: usize,
        exec_arg_threshold: usize,
    ) -> Self {
        Self { open_threshold, endpoint_threshold, exec_arg_threshold }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.open_dynamic_threshold,
            config.endpoint_dynamic_threshold,
            config.exec_arg_threshold,
        )
    }

    /// Generalize and normalize `container` in place. Paths in `sbom` are
    /// never collapsed; pass `None` when no SBOM is attached.
    pub fn deflate(&self, container: &mut ContainerProfile, sbom: Option<&HashSet<String>>) {
        container.execs = analyze_execs(&container.execs, self.exec_arg_threshold);

        let mut open_analyzer = PathAnalyzer::with_default_and_configs(
            self.open_threshold,
            default_collapse_configs(),
        );
        container.opens = analyze_opens(&container.opens, &mut open_analyzer, sbom);

        let mut endpoint_analyzer = PathAnalyzer::new(self.endpoint_threshold);
        container.endpoints = analyze_endpoints(&container.endpoints, &mut endpoint_analyzer);
        container
            .endpoints
            .sort_by(|a, b| a.endpoint.cmp(&b.endpoint).then(a.direction.cmp(&b.direction)));

        container.capabilities.sort();
        container.capabilities.dedup();
        container.syscalls.sort();
        container.syscalls.dedup();

        let policies = std::mem::take(&mut container.rule_policies);
        container.rule_policies = deflate_rule_policies(policies);
    }
}

/// Sort and dedupe every rule's allowed-process list. `None` lists and
/// explicitly empty lists pass through as given; `allowed_container` is
/// untouched.
pub fn deflate_rule_policies(
    policies: BTreeMap<String, RulePolicy>,
) -> BTreeMap<String, RulePolicy> {
    policies
        .into_iter()
        .map(|(name, mut policy)| {
            if let Some(processes) = policy.allowed_processes.as_mut() {
                processes.sort();
                processes.dedup();
            }
            (name, policy)
        })
        .collect()
}
