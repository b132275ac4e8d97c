// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025-2026 JR Morton

//! HTTP endpoint generalization.
//!
//! Endpoints arrive as `:<port><path>` strings. Each port gets its own
//! observation trie (the port string is the analyzer identifier), so paths
//! on one port never influence collapse decisions on another.
//!
//! Port `0` is the wildcard port, a sentinel meaning "any port observed".
//! If any endpoint in the batch carries it, every endpoint is rewritten to
//! port 0 before analysis, funneling the whole batch into one bucket.
//! Endpoints that survive to the merge phase in wildcard-port mode and
//! differ in exactly one path segment are unified on that segment, since
//! port-scattered traffic almost always varies a request identifier too.
//!
//! Malformed endpoint strings are skipped, never fatal.

use std::collections::BTreeMap;

use crate::profile::{Direction, HttpEndpoint};

use super::{
    canonical_segments, collapse_adjacent_dynamics, DYNAMIC_IDENTIFIER, PathAnalyzer,
};

/// The wildcard port sentinel.
const WILDCARD_PORT: &str = "0";

/// Generalize a batch of HTTP endpoints. Every output endpoint has sorted,
/// deduplicated methods; input order of first appearance is preserved.
pub fn analyze_endpoints(
    endpoints: &[HttpEndpoint],
    analyzer: &mut PathAnalyzer,
) -> Vec<HttpEndpoint> {
    if endpoints.is_empty() {
        return Vec::new();
    }

    // parse up front, dropping records that do not look like ":<port><path>"
    let mut parsed: Vec<(HttpEndpoint, String, String)> = Vec::new();
    for endpoint in endpoints {
        match split_port_and_path(&endpoint.endpoint) {
            Some((port, path)) => parsed.push((endpoint.clone(), port, path)),
            None => {
                tracing::debug!(endpoint = %endpoint.endpoint, "skipping malformed endpoint");
            }
        }
    }

    // one wildcard-port endpoint rewrites the whole batch to port 0
    let wildcard_mode = parsed.iter().any(|(_, port, _)| port == WILDCARD_PORT);
    if wildcard_mode {
        for (_, port, _) in &mut parsed {
            *port = WILDCARD_PORT.to_string();
        }
    }

    // pass 1: prime the per-port tries
    for (_, port, path) in &parsed {
        analyzer.analyze_path(path, port);
    }

    // pass 2: generalize, merging into an existing output on key collision
    let mut output: Vec<HttpEndpoint> = Vec::new();
    for (endpoint, port, path) in &parsed {
        let generalized = format!(":{port}{}", analyzer.analyze_path(path, port));
        if generalized == endpoint.endpoint {
            output.push(endpoint.clone());
            continue;
        }
        let key = endpoint_key(&generalized, endpoint.direction);
        if let Some(existing) = output
            .iter_mut()
            .find(|e| endpoint_key(&e.endpoint, e.direction) == key)
        {
            existing.methods = merge_methods(&existing.methods, &endpoint.methods);
            merge_headers(existing, endpoint);
        } else {
            // the first observation's internal/direction/headers carry over
            let mut generalized_endpoint = endpoint.clone();
            generalized_endpoint.endpoint = generalized;
            output.push(generalized_endpoint);
        }
    }

    // pass 3: merge duplicates, then unify near-identical wildcard-port paths
    let mut merged = merge_duplicate_endpoints(output);
    if wildcard_mode {
        unify_wildcard_port_paths(&mut merged);
    }

    for endpoint in &mut merged {
        endpoint.methods.sort();
        endpoint.methods.dedup();
    }
    merged
}

/// Split `:<port><path>` into its port and path halves. The path defaults
/// to `/`; a missing or non-numeric port is a malformed endpoint.
fn split_port_and_path(endpoint: &str) -> Option<(String, String)> {
    let rest = endpoint.strip_prefix(':')?;
    let (port, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, "/"),
    };
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((port.to_string(), path.to_string()))
}

fn endpoint_key(endpoint: &str, direction: Direction) -> String {
    format!("{endpoint}|{}", direction.as_str())
}

/// Dedupe by `(endpoint, direction)`. An entry at the wildcard port absorbs
/// specific-port entries with the same path and direction.
pub fn merge_duplicate_endpoints(endpoints: Vec<HttpEndpoint>) -> Vec<HttpEndpoint> {
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    let mut merged: Vec<HttpEndpoint> = Vec::new();

    for endpoint in endpoints {
        let Some((port, path)) = split_port_and_path(&endpoint.endpoint) else {
            continue;
        };

        let wildcard_key = format!(":{WILDCARD_PORT}{path}|{}", endpoint.direction.as_str());
        let own_key = format!(":{port}{path}|{}", endpoint.direction.as_str());

        let slot = if port != WILDCARD_PORT {
            seen.get(&wildcard_key).or_else(|| seen.get(&own_key))
        } else {
            seen.get(&own_key)
        };

        if let Some(&index) = slot {
            let existing = &mut merged[index];
            existing.methods = merge_methods(&existing.methods, &endpoint.methods);
            merge_headers(existing, &endpoint);
        } else {
            seen.insert(own_key, merged.len());
            merged.push(endpoint);
        }
    }

    merged
}

/// Sorted, deduplicated union of two method lists.
fn merge_methods(a: &[String], b: &[String]) -> Vec<String> {
    let mut union: Vec<String> = a.iter().chain(b).cloned().collect();
    union.sort();
    union.dedup();
    union
}

/// Merge `incoming`'s headers into `existing`. Headers are serialized JSON
/// objects of string to string-list; on a key collision the value lists
/// union. Either side failing to parse skips the merge silently.
fn merge_headers(existing: &mut HttpEndpoint, incoming: &HttpEndpoint) {
    let Some(mut base) = existing.parsed_headers() else {
        return;
    };
    let Some(addition) = incoming.parsed_headers() else {
        return;
    };

    for (name, values) in addition {
        let slot = base.entry(name).or_default();
        slot.extend(values);
        slot.sort();
        slot.dedup();
    }

    if let Ok(serialized) = serde_json::to_string(&base) {
        existing.headers = serialized;
    }
}

/// In wildcard-port mode, two surviving endpoints with the same direction
/// and segment count whose paths differ in exactly one position collapse
/// that position to `⋯`. Runs to a fixpoint.
fn unify_wildcard_port_paths(endpoints: &mut Vec<HttpEndpoint>) {
    loop {
        let Some((keep, absorb, unified)) = find_unifiable_pair(endpoints) else {
            return;
        };
        let absorbed = endpoints.remove(absorb);
        let target = &mut endpoints[keep];
        target.endpoint = unified;
        target.methods = merge_methods(&target.methods, &absorbed.methods);
        merge_headers(target, &absorbed);
    }
}

fn find_unifiable_pair(endpoints: &[HttpEndpoint]) -> Option<(usize, usize, String)> {
    for i in 0..endpoints.len() {
        for j in i + 1..endpoints.len() {
            if let Some(unified) = unify_pair(&endpoints[i], &endpoints[j]) {
                return Some((i, j, unified));
            }
        }
    }
    None
}

fn unify_pair(a: &HttpEndpoint, b: &HttpEndpoint) -> Option<String> {
    if a.direction != b.direction {
        return None;
    }
    let (port_a, path_a) = split_port_and_path(&a.endpoint)?;
    let (port_b, path_b) = split_port_and_path(&b.endpoint)?;
    if port_a != port_b {
        return None;
    }

    let segments_a = canonical_segments(&path_a);
    let segments_b = canonical_segments(&path_b);
    if segments_a.is_empty() || segments_a.len() != segments_b.len() {
        return None;
    }

    let mut differing = None;
    for (position, (sa, sb)) in segments_a.iter().zip(&segments_b).enumerate() {
        if sa != sb {
            if differing.is_some() {
                return None;
            }
            differing = Some(position);
        }
    }
    let position = differing?;

    let mut unified = segments_a;
    unified[position] = DYNAMIC_IDENTIFIER;
    let path = collapse_adjacent_dynamics(&format!("/{}", unified.join("/")));
    Some(format!(":{port_a}{path}"))
}
