//! # dcegen
//!
//! A deterministic design-generation engine for stated-preference choice
//! surveys: D-efficient experimental designs, efficiency metrics, and
//! estimation syntax for common discrete-choice packages.
//!
//! ## Overview
//!
//! Stated-preference studies present respondents with choice tasks built
//! from attributes and levels. Which level combinations go into which task
//! decides how precisely the choice model's coefficients can be estimated.
//! This library selects those combinations for you:
//!
//! - Dummy or effects **coding** of attribute levels into a design matrix
//! - **Candidate generation** over the full factorial (seeded subsampling
//!   above a configurable cap)
//! - **Choice probabilities and Fisher information** for multinomial logit,
//!   mixed logit, and error-component logit at the analyst's priors
//! - A Fedorov-style **row-exchange search** minimizing the D-error
//! - **D-error and sample-size** (S-error) evaluation
//! - **Estimation syntax** for R (`mlogit`), NLogit, and Biogeme
//!
//! ## Quick Start
//!
//! The easiest way to run the whole pipeline is the builder:
//!
//! ```rust
//! use dcegen::prelude::*;
//!
//! let result = DesignBuilder::new()
//!     .attribute("price", &["low", "mid", "high"])
//!     .attribute("brand", &["a", "b", "c"])
//!     .alternatives(2)
//!     .tasks(4)
//!     .seed(42)
//!     .build_and_generate()
//!     .unwrap();
//!
//! assert_eq!(result.design.row_count(), 8); // 4 tasks x 2 alternatives
//! assert!(result.d_error.is_finite());
//! println!("{}", result.design.to_csv());
//! ```
//!
//! Or assemble a [`DesignConfig`] by hand and call [`generate`] (or
//! [`generate_with_cancel`] to keep a cancellation handle).
//!
//! ## Determinism
//!
//! Every random decision — candidate subsampling, the starting design, and
//! pseudo-random draws — flows from the explicit seed in the configuration.
//! The same seed and configuration always reproduce the same design, the
//! same D-error, and the same termination state.
//!
//! ## Features
//!
//! - `serde`: enable serialization/deserialization of configs and results
//! - `parallel`: enable parallel exchange scoring via rayon
//!   ([`par_generate`]), with output identical to the sequential path

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod builder;
pub mod candidates;
pub mod coding;
pub mod config;
pub mod design;
pub mod error;
pub mod evaluate;
pub mod linalg;
pub mod model;
pub mod optimize;
pub mod pipeline;
pub mod syntax;

#[cfg(feature = "parallel")]
pub mod parallel;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::builder::DesignBuilder;
    pub use crate::candidates::{CandidatePool, FactorialRows};
    pub use crate::coding::{Codebook, Coefficient};
    pub use crate::config::{
        Attribute, CodingScheme, DesignConfig, DrawMethod, DrawSettings, ModelSpec, ModelType,
        Parameter, Prior, SampleSizeSettings, TaskFormat,
    };
    pub use crate::design::{
        BalanceReport, CandidateRow, Design, DesignResult, EstimationSyntax, Termination,
    };
    pub use crate::error::{Error, Result};
    pub use crate::evaluate::{critical_z, d_error, s_error};
    pub use crate::optimize::{CancelToken, Optimizer, SearchOutcome};
    pub use crate::pipeline::{generate, generate_with_cancel};

    #[cfg(feature = "parallel")]
    pub use crate::parallel::{par_generate, par_generate_with_cancel};
}

// Re-export commonly used items at crate root
pub use builder::DesignBuilder;
pub use config::{
    Attribute, CodingScheme, DesignConfig, ModelSpec, ModelType, Parameter, Prior, TaskFormat,
};
pub use design::{Design, DesignResult, Termination};
pub use error::{Error, Result};
pub use optimize::CancelToken;
pub use pipeline::{generate, generate_with_cancel};

#[cfg(feature = "parallel")]
pub use parallel::{par_generate, par_generate_with_cancel};
