// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025-2026 JR Morton

//! Argument-position tries for exec generalization.
//!
//! Each executable path gets its own trie; each argument position is one
//! trie level. Unlike the path tries, nothing dynamic is ever stored here:
//! the `⋯` marker is produced purely at read time, whenever the number of
//! distinct values at a position exceeds the threshold.

use std::collections::HashMap;

use super::DYNAMIC_IDENTIFIER;

#[derive(Debug, Default)]
struct ArgNode {
    children: HashMap<String, ArgNode>,
}

/// Trie-based analyzer for exec argument vectors.
pub struct ArgAnalyzer {
    roots: HashMap<String, ArgNode>,
    threshold: usize,
}

impl ArgAnalyzer {
    pub fn new(threshold: usize) -> Self {
        Self { roots: HashMap::new(), threshold }
    }

    /// Insert an argument vector into the trie for `exec_path`.
    pub fn add_args(&mut self, args: &[String], exec_path: &str) {
        if args.is_empty() {
            return;
        }
        let mut node = self.roots.entry(exec_path.to_string()).or_default();
        for arg in args {
            node = node.children.entry(arg.clone()).or_default();
        }
    }

    /// Read back the collapsed argument vector for `exec_path`. Positions
    /// where distinct values exceed the threshold come back as `⋯`; the
    /// walk follows a stored `⋯` child if one exists (an already-collapsed
    /// vector was inserted), otherwise the exact argument.
    pub fn analyze_args(&self, args: &[String], exec_path: &str) -> Vec<String> {
        if args.is_empty() {
            return args.to_vec();
        }
        let Some(root) = self.roots.get(exec_path) else {
            return args.to_vec();
        };

        let mut result = Vec::with_capacity(args.len());
        let mut cursor = Some(root);
        for arg in args {
            let Some(node) = cursor else {
                result.push(arg.clone());
                continue;
            };
            if node.children.len() > self.threshold {
                result.push(DYNAMIC_IDENTIFIER.to_string());
                cursor = node
                    .children
                    .get(DYNAMIC_IDENTIFIER)
                    .or_else(|| node.children.get(arg));
            } else {
                result.push(arg.clone());
                cursor = node.children.get(arg);
            }
        }
        result
    }
}
