// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025-2026 JR Morton

//! Error types for the deflation engine.
//!
//! Generalization is best-effort: individually invalid records (a bad
//! endpoint, an unparseable header blob) are skipped where they occur and
//! never fail a batch. Only the profile size cap is surfaced to the caller,
//! because exceeding it must abort persistence.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ProcessorError>;

/// Errors surfaced by the pre-save processing pipeline.
#[derive(Error, Debug)]
pub enum ProcessorError {
    /// The deflated profile still serializes larger than the configured cap.
    /// The caller must abort the write; the in-memory profile is left in the
    /// state it reached just before the size check.
    #[error("profile too large: {size} bytes exceeds the {max} byte limit")]
    SizeExceeded { size: usize, max: usize },

    /// A record that cannot be processed at all (malformed endpoint string,
    /// missing required field). Batch drivers skip these instead of raising.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Profile serialization failed while measuring its size.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
