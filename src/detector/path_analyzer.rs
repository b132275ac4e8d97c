// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025-2026 JR Morton

//! Per-identifier path tries and the two-pass analyze protocol.
//!
//! A [`PathAnalyzer`] owns one observation trie per identifier (a bucket
//! key such as a port number or the literal `"opens"`) plus a separate
//! configuration trie that is written once at construction and only
//! navigated afterwards. During insertion the configuration trie is walked
//! in lockstep with the observation trie; the threshold stored at a config
//! node governs how the matching observation node's children are managed.
//!
//! `analyze_path` reads before it writes: the generalized form of a path is
//! rendered from the trie as it stood *before* the path is inserted, so a
//! call never observes the collapse it triggers itself. Batch drivers rely
//! on this by priming the analyzer with the full input first and reading
//! the stabilized forms in a second pass.

use std::collections::HashMap;

use super::trie::TrieNode;
use super::{
    canonical_segments, collapse_adjacent_dynamics, CollapseConfig, DEFAULT_FALLBACK_THRESHOLD,
    DYNAMIC_IDENTIFIER, WILDCARD_IDENTIFIER,
};

/// Trie-based generalizer for slash-separated paths.
pub struct PathAnalyzer {
    /// Thresholds by prefix; navigated in lockstep, never mutated after
    /// construction.
    config_root: TrieNode,
    /// One observation trie per identifier.
    roots: HashMap<String, TrieNode>,
    /// Threshold applied wherever the configuration trie has nothing to say.
    default_config: CollapseConfig,
}

impl PathAnalyzer {
    /// Analyzer with a single root threshold and no per-prefix overrides.
    pub fn new(threshold: usize) -> Self {
        Self {
            config_root: TrieNode::new(),
            roots: HashMap::new(),
            default_config: CollapseConfig::new("/", threshold),
        }
    }

    /// Analyzer with per-prefix overrides; prefixes not covered by any
    /// config use [`DEFAULT_FALLBACK_THRESHOLD`].
    pub fn with_configs(configs: Vec<CollapseConfig>) -> Self {
        Self::with_default_and_configs(DEFAULT_FALLBACK_THRESHOLD, configs)
    }

    /// Analyzer with an explicit root threshold plus per-prefix overrides.
    pub fn with_default_and_configs(threshold: usize, configs: Vec<CollapseConfig>) -> Self {
        let mut config_root = TrieNode::new();
        for config in configs {
            let segments = canonical_segments(&config.prefix);
            if segments.is_empty() {
                // a "/" prefix overrides the root default itself
                config_root.config = Some(config);
            } else {
                config_root.insert_config(&segments, config.clone());
            }
        }
        Self {
            config_root,
            roots: HashMap::new(),
            default_config: CollapseConfig::new("/", threshold),
        }
    }

    /// Generalize `path` against the identifier's observation trie, then
    /// insert it. Returns the rendered path with runs of adjacent dynamic
    /// segments collapsed to a wildcard. An empty canonical path is `/`.
    pub fn analyze_path(&mut self, path: &str, identifier: &str) -> String {
        let segments = canonical_segments(path);
        if segments.is_empty() {
            return "/".to_string();
        }

        let rendered = render(self.roots.get(identifier), &segments);

        let root = self.roots.entry(identifier.to_string()).or_default();
        let active = self.config_root.config.as_ref().unwrap_or(&self.default_config);
        insert(root, &segments, Some(&self.config_root), active);

        collapse_adjacent_dynamics(&format!("/{}", rendered.join("/")))
    }

    #[cfg(test)]
    pub(crate) fn observation_root(&self, identifier: &str) -> Option<&TrieNode> {
        self.roots.get(identifier)
    }
}

/// Walk the observation trie emitting the generalized form of `segments`
/// without mutating anything. Wildcard beats dynamic beats literal; a
/// segment with no matching child is emitted verbatim and ends descent.
fn render(root: Option<&TrieNode>, segments: &[&str]) -> Vec<String> {
    let mut out = Vec::with_capacity(segments.len());
    let mut cursor = root;
    for &segment in segments {
        let Some(node) = cursor else {
            out.push(segment.to_string());
            continue;
        };
        if node.has_wildcard_child() {
            // the wildcard absorbs the rest of the path
            out.push(WILDCARD_IDENTIFIER.to_string());
            return out;
        }
        if let Some(dynamic) = node.children.get(DYNAMIC_IDENTIFIER) {
            out.push(DYNAMIC_IDENTIFIER.to_string());
            cursor = Some(dynamic);
        } else if let Some(child) = node.children.get(segment) {
            out.push(segment.to_string());
            cursor = Some(child);
        } else {
            out.push(segment.to_string());
            cursor = None;
        }
    }
    out
}

/// Insert `segments` under `node`, collapsing children wherever the active
/// threshold is crossed. `config_node` tracks the configuration trie in
/// lockstep; `active` is the threshold in force for `node`'s children.
fn insert(
    node: &mut TrieNode,
    segments: &[&str],
    config_node: Option<&TrieNode>,
    active: &CollapseConfig,
) {
    let Some((&segment, rest)) = segments.split_first() else {
        return;
    };

    // 1. an existing wildcard consumes the rest of the path
    if let Some(star) = node.children.get_mut(WILDCARD_IDENTIFIER) {
        star.count += 1;
        return;
    }

    // 2. an existing dynamic child subsumes this segment
    if node.has_dynamic_child() {
        if node.children.len() > 1 {
            // stale literal siblings fold in rather than being dropped
            node.fold_children_into_dynamic();
        }
        let next_config = advance(config_node, segment);
        let next_active = resolve(next_config, active);
        let dynamic = node.dynamic_child_mut().expect("dynamic child present");
        dynamic.count += 1;
        insert(dynamic, rest, next_config, next_active);
        return;
    }

    // 3. a literal `⋯` in the input merges every current child under it
    if segment == DYNAMIC_IDENTIFIER {
        node.fold_children_into_dynamic();
        let next_config = advance(config_node, segment);
        let next_active = resolve(next_config, active);
        let dynamic = node.dynamic_child_mut().expect("dynamic child present");
        dynamic.count += 1;
        insert(dynamic, rest, next_config, next_active);
        return;
    }

    // 3b. a literal `*` replaces every current child; it can have no siblings
    if segment == WILDCARD_IDENTIFIER {
        node.replace_children_with_wildcard();
        node.children
            .get_mut(WILDCARD_IDENTIFIER)
            .expect("wildcard child present")
            .count += 1;
        return;
    }

    // 4. plain literal: create or look up, then evaluate collapse here
    node.children.entry(segment.to_string()).or_default().count += 1;

    if active.threshold == 1 {
        // threshold 1 wildcards on the very first literal child
        node.replace_children_with_wildcard();
        return;
    }

    let next_config = advance(config_node, segment);
    let next_active = resolve(next_config, active);

    if node.children.len() > active.threshold {
        node.fold_children_into_dynamic();
        let dynamic = node.dynamic_child_mut().expect("dynamic child present");
        insert(dynamic, rest, next_config, next_active);
        return;
    }

    // 5. descend into the literal child
    let child = node.children.get_mut(segment).expect("literal child present");
    insert(child, rest, next_config, next_active);
}

fn advance<'a>(config_node: Option<&'a TrieNode>, segment: &str) -> Option<&'a TrieNode> {
    config_node.and_then(|node| node.children.get(segment))
}

fn resolve<'a>(
    config_node: Option<&'a TrieNode>,
    active: &'a CollapseConfig,
) -> &'a CollapseConfig {
    config_node.and_then(|node| node.config.as_ref()).unwrap_or(active)
}
