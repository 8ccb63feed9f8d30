//! Error types for the dcegen library.
//!
//! This module provides comprehensive error handling using the `thiserror` crate,
//! with specific error variants for configuration validation, candidate-pool
//! capacity, and internal dimension checks.
//!
//! Two failure modes deliberately do **not** appear here:
//!
//! - A singular information matrix (a non-identifiable design) is reported as a
//!   D-error of `f64::INFINITY`, so callers can retry with a different seed
//!   without unwinding the pipeline.
//! - Cancellation is a normal terminal state: the optimizer returns the best
//!   design found so far, flagged in the result.

use thiserror::Error;

/// The main error type for the dcegen library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ============ Configuration Errors ============
    /// No attributes were supplied.
    #[error("at least one attribute is required")]
    EmptyAttributes,

    /// An attribute has an empty name.
    #[error("attribute {index} has an empty name")]
    EmptyAttributeName {
        /// Zero-based position of the offending attribute.
        index: usize,
    },

    /// Two attributes share the same name.
    #[error("duplicate attribute name '{name}'")]
    DuplicateAttribute {
        /// The repeated name.
        name: String,
    },

    /// An attribute has too few levels to be identifiable.
    #[error("attribute '{attribute}' has {levels} level(s), at least 2 are required")]
    TooFewLevels {
        /// Name of the offending attribute.
        attribute: String,
        /// Number of levels supplied.
        levels: usize,
    },

    /// An attribute lists the same level label twice.
    #[error("attribute '{attribute}' repeats level '{level}'")]
    DuplicateLevel {
        /// Name of the offending attribute.
        attribute: String,
        /// The repeated level label.
        level: String,
    },

    /// The choice-task format is invalid.
    #[error("invalid task format: {message}")]
    InvalidTaskFormat {
        /// Description of what is invalid.
        message: String,
    },

    /// The model specification does not have one parameter per attribute.
    #[error("model has {parameters} parameter(s) for {attributes} attribute(s)")]
    ParameterCountMismatch {
        /// Number of parameters supplied.
        parameters: usize,
        /// Number of attributes supplied.
        attributes: usize,
    },

    /// A parameter is out of order or named after a different attribute.
    #[error("parameter '{parameter}' does not match attribute '{attribute}' at position {index}")]
    ParameterNameMismatch {
        /// The parameter name found.
        parameter: String,
        /// The attribute name expected at this position.
        attribute: String,
        /// Zero-based position of the mismatch.
        index: usize,
    },

    /// A random prior was declared for a model that estimates fixed coefficients.
    #[error("parameter '{parameter}' declares a random prior, but multinomial logit uses fixed coefficients only")]
    RandomPriorInFixedModel {
        /// Name of the offending parameter.
        parameter: String,
    },

    /// The named sample-size target does not correspond to any coefficient.
    #[error("sample-size target '{name}' does not match any design coefficient")]
    UnknownTarget {
        /// The target name supplied.
        name: String,
    },

    /// A generic configuration error.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what is invalid.
        message: String,
    },

    // ============ Capacity Errors ============
    /// The requested task shape exceeds the candidate pool.
    #[error(
        "{requested} alternatives per task requested but only {available} distinct \
         candidate row(s) exist; reduce alternatives or add levels"
    )]
    CapacityExceeded {
        /// Alternatives requested per task.
        requested: usize,
        /// Distinct candidate rows available.
        available: usize,
    },

    // ============ Dimension Errors ============
    /// Array dimensions are inconsistent.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension description.
        expected: String,
        /// Actual dimension description.
        actual: String,
    },
}

/// A specialized `Result` type for dcegen operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Create a new `InvalidConfig` error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a new `InvalidTaskFormat` error.
    #[must_use]
    pub fn invalid_task_format(message: impl Into<String>) -> Self {
        Self::InvalidTaskFormat {
            message: message.into(),
        }
    }
}
