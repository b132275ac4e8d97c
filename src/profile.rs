// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025-2026 JR Morton

//! Behavioral profile value objects.
//!
//! These are the wire types the recorder produces and the persistence layer
//! stores: per-container lists of exec invocations, file opens, and HTTP
//! endpoints, wrapped in a k8s-style object with metadata and a schema
//! version. The deflation engine consumes and mutates them in place; it
//! never owns them.
//!
//! Maps are `BTreeMap` so serialized output is byte-stable across runs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Annotation key carrying the post-deflation item count (execs + opens +
/// endpoints across all containers), rendered as a decimal string.
pub const RESOURCE_SIZE_ANNOTATION: &str = "pawprint.io/resource-size";

/// Schema version stamped on every profile at pre-save time.
pub const SCHEMA_VERSION: u32 = 1;

/// Traffic direction of an observed HTTP endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Inbound,
    Outbound,
}

impl Direction {
    /// Wire name, used when building merge keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// A single observed `execve` with its argument vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExecCall {
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub envs: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent_path: String,
}

impl ExecCall {
    /// Stable string form used for deduplication and ordering. Two calls
    /// that collapse to the same key are the same call.
    pub fn dedup_key(&self) -> String {
        let mut key = String::with_capacity(
            self.path.len() + self.parent_path.len() + self.args.len() * 8,
        );
        key.push_str(&self.path);
        for arg in &self.args {
            key.push('\u{1f}');
            key.push_str(arg);
        }
        for env in &self.envs {
            key.push('\u{1e}');
            key.push_str(env);
        }
        key.push('\u{1d}');
        key.push_str(&self.parent_path);
        key
    }
}

/// A single observed file open with the flags it was opened with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OpenCall {
    pub path: String,
    #[serde(default)]
    pub flags: Vec<String>,
}

/// An observed HTTP endpoint in `:<port><path>` form.
///
/// `headers` is a serialized JSON object mapping header name to the list of
/// values seen. It is kept serialized because the recorder emits it that way
/// and most profiles never need it parsed; the merge path parses lazily and
/// skips silently on malformed blobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HttpEndpoint {
    pub endpoint: String,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub internal: bool,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub headers: String,
}

impl HttpEndpoint {
    /// Parse the serialized headers blob. `None` when absent or malformed.
    pub fn parsed_headers(&self) -> Option<BTreeMap<String, Vec<String>>> {
        serde_json::from_str(&self.headers).ok()
    }
}

/// Per-rule allowlist attached to a container profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RulePolicy {
    /// `None` means the recorder never produced a list; an empty list means
    /// it produced an explicitly empty one. Both survive deflation as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_processes: Option<Vec<String>>,
    #[serde(default)]
    pub allowed_container: bool,
}

/// Everything recorded about one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContainerProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub execs: Vec<ExecCall>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub opens: Vec<OpenCall>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub syscalls: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<HttpEndpoint>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rule_policies: BTreeMap<String, RulePolicy>,
}

/// k8s-style object metadata. Only the fields the engine touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
}

/// Spec half of an application profile: architectures plus the three
/// container classes (init, ephemeral, regular).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationProfileSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub architectures: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub init_containers: Vec<ContainerProfile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ephemeral_containers: Vec<ContainerProfile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<ContainerProfile>,
}

/// The full recorded behavior of one workload, as handed to the
/// persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationProfile {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub spec: ApplicationProfileSpec,
}

impl ApplicationProfile {
    /// Total number of recorded items across every container class. This is
    /// the value stamped into [`RESOURCE_SIZE_ANNOTATION`].
    pub fn item_count(&self) -> usize {
        let spec = &self.spec;
        spec.init_containers
            .iter()
            .chain(&spec.ephemeral_containers)
            .chain(&spec.containers)
            .map(|c| c.execs.len() + c.opens.len() + c.endpoints.len())
            .sum()
    }
}
