// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025-2026 JR Morton

//! Segment trie underlying the path analyzers.
//!
//! A single node variant covers everything: markers are expressed by the
//! key a child is stored under (`⋯` or `*`), never by a node kind. That
//! keeps the union-merge shallow and collapse a pure children-map rewrite.
//!
//! Structural invariants maintained by the mutation helpers:
//!
//! - a node holds at most one marker child, never a `⋯` and a `*` together
//! - a `*` child has no siblings; creating one replaces all other children
//! - after a dynamic collapse, the lone `⋯` child's subtree is the union of
//!   the former literal children's subtrees

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use super::{CollapseConfig, DYNAMIC_IDENTIFIER, WILDCARD_IDENTIFIER};

/// One node of the segment trie. `count` tracks traversals through this
/// node and is preserved (summed) across merges; collapse decisions are
/// made from the number of distinct children, not from counts.
#[derive(Debug, Clone, Default)]
pub struct TrieNode {
    pub(crate) children: HashMap<String, TrieNode>,
    pub(crate) config: Option<CollapseConfig>,
    pub(crate) count: u64,
}

impl TrieNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn has_dynamic_child(&self) -> bool {
        self.children.contains_key(DYNAMIC_IDENTIFIER)
    }

    pub(crate) fn has_wildcard_child(&self) -> bool {
        self.children.contains_key(WILDCARD_IDENTIFIER)
    }

    pub(crate) fn dynamic_child_mut(&mut self) -> Option<&mut TrieNode> {
        self.children.get_mut(DYNAMIC_IDENTIFIER)
    }

    /// Union-merge `other`'s children into this node's children. Missing
    /// keys move over as-is; on a key collision the counts add and the
    /// merge recurses. Idempotent and order-independent for the keys it
    /// touches.
    pub(crate) fn merge_children(&mut self, other: TrieNode) {
        for (key, child) in other.children {
            match self.children.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(child);
                }
                Entry::Occupied(mut slot) => {
                    let existing = slot.get_mut();
                    existing.count += child.count;
                    existing.merge_children(child);
                }
            }
        }
    }

    /// Fold every child (literal or dynamic) into a single `⋯` child whose
    /// count is the sum of the folded counts and whose subtree is the union
    /// of the folded subtrees.
    pub(crate) fn fold_children_into_dynamic(&mut self) {
        let old = std::mem::take(&mut self.children);
        let mut dynamic = TrieNode::new();
        for (_, child) in old {
            dynamic.count += child.count;
            dynamic.merge_children(child);
        }
        self.children.insert(DYNAMIC_IDENTIFIER.to_string(), dynamic);
    }

    /// Replace every child with a single `*` child carrying the summed
    /// counts. The wildcard absorbs the whole subtree; nothing below it is
    /// retained.
    pub(crate) fn replace_children_with_wildcard(&mut self) {
        let total: u64 = self.children.values().map(|c| c.count).sum();
        self.children.clear();
        self.children.insert(
            WILDCARD_IDENTIFIER.to_string(),
            TrieNode { count: total, ..TrieNode::new() },
        );
    }

    /// Install a collapse config at the node addressed by `segments`,
    /// creating intermediate nodes as needed. Used only while building a
    /// configuration trie.
    pub(crate) fn insert_config(&mut self, segments: &[&str], config: CollapseConfig) {
        let mut node = self;
        for &segment in segments {
            node = node.children.entry(segment.to_string()).or_default();
        }
        node.config = Some(config);
    }
}
