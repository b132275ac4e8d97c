// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025-2026 JR Morton

//! Pre-save processing of application profiles.
//!
//! The persistence layer hands every object through its kind's processor
//! just before writing. For application profiles that means: deduplicate
//! the architecture list, deflate every container (init, ephemeral,
//! regular), stamp the resource-size annotation and schema version, and
//! refuse to let an oversized profile through.
//!
//! Each invocation builds its own analyzers; nothing is shared between
//! calls, so a processor can be reused freely from a single thread.

use std::collections::HashSet;

use crate::config::Config;
use crate::deflate::ContainerDeflater;
use crate::error::{ProcessorError, Result};
use crate::profile::{ApplicationProfile, RESOURCE_SIZE_ANNOTATION, SCHEMA_VERSION};

/// Pre-persistence transformer contract. One implementation per stored
/// kind, all with this single method.
pub trait PreSaveProcessor<T> {
    /// Transform `object` in place ahead of persistence. An error aborts
    /// the write.
    fn pre_save(&self, object: &mut T) -> Result<()>;
}

/// Pre-save transformer for [`ApplicationProfile`] objects.
pub struct ApplicationProfileProcessor {
    config: Config,
    sbom: Option<HashSet<String>>,
}

impl ApplicationProfileProcessor {
    pub fn new(config: Config) -> Self {
        Self { config, sbom: None }
    }

    /// Attach the SBOM path set; these paths are never collapsed.
    pub fn with_sbom(mut self, sbom: HashSet<String>) -> Self {
        self.sbom = Some(sbom);
        self
    }
}

impl PreSaveProcessor<ApplicationProfile> for ApplicationProfileProcessor {
    fn pre_save(&self, profile: &mut ApplicationProfile) -> Result<()> {
        profile.spec.architectures.sort();
        profile.spec.architectures.dedup();

        let deflater = ContainerDeflater::from_config(&self.config);
        let spec = &mut profile.spec;
        for container in spec
            .init_containers
            .iter_mut()
            .chain(&mut spec.ephemeral_containers)
            .chain(&mut spec.containers)
        {
            deflater.deflate(container, self.sbom.as_ref());
        }

        let item_count = profile.item_count();
        profile
            .metadata
            .annotations
            .insert(RESOURCE_SIZE_ANNOTATION.to_string(), item_count.to_string());
        profile.schema_version = SCHEMA_VERSION;

        let size = serde_json::to_vec(&profile)?.len();
        if size > self.config.max_application_profile_size {
            tracing::warn!(
                size,
                max = self.config.max_application_profile_size,
                "refusing to persist oversized profile"
            );
            return Err(ProcessorError::SizeExceeded {
                size,
                max: self.config.max_application_profile_size,
            });
        }
        Ok(())
    }
}
