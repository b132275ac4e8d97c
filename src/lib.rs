// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025-2026 JR Morton

//! Pawprint — behavioral profile deflation engine.
//!
//! A runtime security recorder watches containers and accumulates raw
//! behavioral profiles: every file path opened, every executable invoked
//! with its argument vector, every HTTP endpoint touched. Raw profiles grow
//! without bound as services write per-request temporary files, load shared
//! libraries, or fan out to many peers. Pawprint sits in front of the
//! persistence layer and collapses structurally-similar observations into
//! compact patterns before anything is written.
//!
//! Two marker segments express the generalization:
//!
//! - `⋯` (U+22EF) stands for exactly one path segment
//! - `*` stands for zero or more path segments
//!
//! The pipeline, outermost first:
//!
//! - **processor**: the pre-save transformer invoked per object; dedupes
//!   architectures, deflates every container, stamps schema version and
//!   size annotation, enforces the profile size cap
//! - **deflate**: per-container orchestration of the three drivers plus
//!   rule-policy and list normalization
//! - **detector**: the dynamic path detection engine itself; tries,
//!   per-prefix collapse thresholds, and the opens/endpoints/execs drivers
//! - **profile**: the value objects shared with the recorder and store
//! - **config**: TOML-backed engine configuration
//!
//! Everything is synchronous and value-in/value-out. Analyzers are scoped
//! to a single invocation and must not be shared across threads.

pub mod config;
pub mod deflate;
pub mod detector;
pub mod error;
pub mod processor;
pub mod profile;

pub use config::Config;
pub use deflate::{deflate_rule_policies, ContainerDeflater};
pub use detector::{
    analyze_endpoints, analyze_execs, analyze_opens, collapse_adjacent_dynamics, compare_dynamic,
    ArgAnalyzer, CollapseConfig, PathAnalyzer, DYNAMIC_IDENTIFIER, ENDPOINT_DYNAMIC_THRESHOLD,
    EXEC_ARG_THRESHOLD, OPEN_DYNAMIC_THRESHOLD, WILDCARD_IDENTIFIER,
};
pub use error::{ProcessorError, Result};
pub use processor::{ApplicationProfileProcessor, PreSaveProcessor};
pub use profile::{
    ApplicationProfile, ApplicationProfileSpec, ContainerProfile, Direction, ExecCall,
    HttpEndpoint, ObjectMeta, OpenCall, RulePolicy,
};
