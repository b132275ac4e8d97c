// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025-2026 JR Morton

//! Configuration loading and serialization.
//!
//! Defines the TOML configuration schema for the deflation engine. All
//! fields use `#[serde(default)]` so missing values gracefully fall back to
//! the defaults the recorder ships with. Load with [`Config::load`].

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::detector::{
    ENDPOINT_DYNAMIC_THRESHOLD, EXEC_ARG_THRESHOLD, OPEN_DYNAMIC_THRESHOLD,
};

/// Engine configuration, deserialized from TOML.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    /// Namespace the surrounding store files objects under when they
    /// arrive without one. Carried here for the store; the engine itself
    /// never writes it.
    #[serde(default = "default_namespace")]
    pub default_namespace: String,

    /// Hard cap on the serialized profile size in bytes. Pre-save fails if
    /// the profile is still larger than this after deflation.
    #[serde(default = "default_max_application_profile_size")]
    pub max_application_profile_size: usize,

    /// Collapse threshold for file-open paths.
    #[serde(default = "default_open_dynamic_threshold")]
    pub open_dynamic_threshold: usize,

    /// Collapse threshold for HTTP endpoint paths.
    #[serde(default = "default_endpoint_dynamic_threshold")]
    pub endpoint_dynamic_threshold: usize,

    /// Collapse threshold for exec argument positions.
    #[serde(default = "default_exec_arg_threshold")]
    pub exec_arg_threshold: usize,
}

fn default_namespace() -> String { "default".to_string() }
fn default_max_application_profile_size() -> usize { 10_000_000 }
fn default_open_dynamic_threshold() -> usize { OPEN_DYNAMIC_THRESHOLD }
fn default_endpoint_dynamic_threshold() -> usize { ENDPOINT_DYNAMIC_THRESHOLD }
fn default_exec_arg_threshold() -> usize { EXEC_ARG_THRESHOLD }

impl Default for Config {
    fn default() -> Self {
        Self {
            default_namespace: default_namespace(),
            max_application_profile_size: default_max_application_profile_size(),
            open_dynamic_threshold: default_open_dynamic_threshold(),
            endpoint_dynamic_threshold: default_endpoint_dynamic_threshold(),
            exec_arg_threshold: default_exec_arg_threshold(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| "Failed to parse config")?;
        Ok(config)
    }
}
