//! Input data model for a design-generation request.
//!
//! This module provides the value types a caller assembles before invoking the
//! pipeline: attributes with their levels, the choice-task format, the choice
//! model with its priors, and the tuning knobs of the search. All of it is
//! plain immutable data owned by one generation request; nothing here outlives
//! the request and nothing is shared between concurrent requests.
//!
//! ## Validation
//!
//! [`DesignConfig::validate`] checks every structural invariant up front and
//! reports the first violation with a message naming the offending field.
//! The pipeline never starts work on an invalid configuration.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A surveyed product feature and its possible values.
///
/// Level labels are free-form strings; their order is meaningful (the first
/// level acts as the reference level under dummy and effects coding).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Attribute {
    /// Unique, non-empty attribute name.
    pub name: String,
    /// Ordered, deduplicated level labels. At least two are required.
    pub levels: Vec<String>,
}

impl Attribute {
    /// Create a new attribute from a name and level labels.
    pub fn new(name: impl Into<String>, levels: &[&str]) -> Self {
        Self {
            name: name.into(),
            levels: levels.iter().map(|&l| l.to_string()).collect(),
        }
    }
}

/// The shape of every choice task shown to a respondent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TaskFormat {
    /// Alternatives presented per task, excluding any status-quo option.
    /// Must be at least 2.
    pub alternatives: usize,
    /// Choice tasks answered by one respondent. Must be at least 1.
    pub tasks: usize,
    /// Whether every task carries a fixed "none of these" alternative.
    /// The status-quo row never varies and is excluded from optimization.
    pub status_quo: bool,
}

impl TaskFormat {
    /// Create a new task format.
    #[must_use]
    pub fn new(alternatives: usize, tasks: usize, status_quo: bool) -> Self {
        Self {
            alternatives,
            tasks,
            status_quo,
        }
    }

    /// Total alternatives per task including the status-quo row, if any.
    #[must_use]
    pub fn alternatives_total(&self) -> usize {
        self.alternatives + usize::from(self.status_quo)
    }

    /// Total design rows: tasks × alternatives (+1 per task with status quo).
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.tasks * self.alternatives_total()
    }

    /// Validate the task format.
    pub fn validate(&self) -> Result<()> {
        if self.alternatives < 2 {
            return Err(Error::invalid_task_format(format!(
                "alternatives per task must be at least 2, got {}",
                self.alternatives
            )));
        }
        if self.tasks == 0 {
            return Err(Error::invalid_task_format(
                "tasks per respondent must be at least 1",
            ));
        }
        Ok(())
    }
}

impl fmt::Display for TaskFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} task(s) x {} alternative(s){}",
            self.tasks,
            self.alternatives,
            if self.status_quo { " + status quo" } else { "" }
        )
    }
}

/// The discrete-choice model the design is optimized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ModelType {
    /// Multinomial logit with fixed coefficients.
    #[default]
    Mnl,
    /// Mixed logit: coefficients with random priors are simulated over draws.
    MixedLogit,
    /// Error-component logit: a shared normal error component is added to
    /// every non-status-quo alternative and simulated over draws.
    ErrorComponent,
}

impl ModelType {
    /// Whether choice probabilities require simulation over random draws.
    #[must_use]
    pub fn is_simulated(&self) -> bool {
        !matches!(self, Self::Mnl)
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mnl => write!(f, "Multinomial Logit (MNL)"),
            Self::MixedLogit => write!(f, "Mixed Logit (MXL)"),
            Self::ErrorComponent => write!(f, "Error Component Logit (ECL)"),
        }
    }
}

/// The analyst's assumed value of a coefficient, fixed or random.
///
/// The mean is the best guess for the true coefficient. Random variants also
/// carry the standard deviation of the assumed distribution, used when the
/// model type simulates probabilities over draws.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Prior {
    /// A point prior with no distribution.
    Fixed(f64),
    /// Normally distributed coefficient.
    Normal {
        /// Mean of the coefficient distribution.
        mean: f64,
        /// Standard deviation of the coefficient distribution.
        std_dev: f64,
    },
    /// Log-normally distributed coefficient: exp(N(mean, std_dev)).
    LogNormal {
        /// Mean of the underlying normal on the log scale.
        mean: f64,
        /// Standard deviation of the underlying normal.
        std_dev: f64,
    },
}

impl Prior {
    /// The point value used when the coefficient is not simulated.
    ///
    /// For log-normal priors this is the median of the distribution,
    /// exp(mean), which keeps the point value on the coefficient scale.
    #[must_use]
    pub fn point(&self) -> f64 {
        match *self {
            Self::Fixed(v) | Self::Normal { mean: v, .. } => v,
            Self::LogNormal { mean, .. } => mean.exp(),
        }
    }

    /// Whether this prior requires random draws.
    #[must_use]
    pub fn is_random(&self) -> bool {
        !matches!(self, Self::Fixed(_))
    }

    /// Realize the coefficient for one standard-normal draw `z`.
    #[must_use]
    pub fn realize(&self, z: f64) -> f64 {
        match *self {
            Self::Fixed(v) => v,
            Self::Normal { mean, std_dev } => mean + std_dev * z,
            Self::LogNormal { mean, std_dev } => (mean + std_dev * z).exp(),
        }
    }
}

/// One model parameter, derived 1:1 from an attribute.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Parameter {
    /// Parameter name; must equal the name of the attribute at the same
    /// position in the attribute list.
    pub name: String,
    /// Prior for this attribute's level coefficients.
    pub prior: Prior,
}

impl Parameter {
    /// Create a new parameter.
    pub fn new(name: impl Into<String>, prior: Prior) -> Self {
        Self {
            name: name.into(),
            prior,
        }
    }
}

/// Model type plus the ordered parameter list.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModelSpec {
    /// The choice model family.
    pub model: ModelType,
    /// One parameter per attribute, in attribute order.
    pub parameters: Vec<Parameter>,
}

impl ModelSpec {
    /// Create a model spec.
    #[must_use]
    pub fn new(model: ModelType, parameters: Vec<Parameter>) -> Self {
        Self { model, parameters }
    }

    /// Validate the parameter list against the attribute list.
    pub fn validate(&self, attributes: &[Attribute]) -> Result<()> {
        if self.parameters.len() != attributes.len() {
            return Err(Error::ParameterCountMismatch {
                parameters: self.parameters.len(),
                attributes: attributes.len(),
            });
        }
        for (i, (param, attr)) in self.parameters.iter().zip(attributes).enumerate() {
            if param.name != attr.name {
                return Err(Error::ParameterNameMismatch {
                    parameter: param.name.clone(),
                    attribute: attr.name.clone(),
                    index: i,
                });
            }
            if param.prior.is_random() && !self.model.is_simulated() {
                return Err(Error::RandomPriorInFixedModel {
                    parameter: param.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// How attribute levels are mapped to numeric design-matrix columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CodingScheme {
    /// k−1 binary indicator columns per k-level attribute; the first level is
    /// the reference and codes to all zeros.
    #[default]
    Dummy,
    /// k−1 columns of ±1/0; the first level codes to −1 in every column.
    Effects,
}

/// The source of pseudo-random draws for simulated models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DrawMethod {
    /// Deterministic quasi-random Halton sequences, one prime base per
    /// random dimension, transformed to standard normals.
    #[default]
    Halton,
    /// Seeded pseudo-random standard-normal draws.
    PseudoRandom,
}

/// Draw settings for simulated choice probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DrawSettings {
    /// Draw generation method.
    pub method: DrawMethod,
    /// Number of draws per random dimension.
    pub count: usize,
}

impl Default for DrawSettings {
    fn default() -> Self {
        Self {
            method: DrawMethod::Halton,
            count: 500,
        }
    }
}

/// Settings for the sample-size (S-error) estimate.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SampleSizeSettings {
    /// Two-sided confidence level for the critical value (default 0.95).
    pub confidence: f64,
    /// Coefficient the estimate targets, by coded-column name (for example
    /// `"price_high"`). Defaults to the first coefficient.
    pub target: Option<String>,
    /// Absolute precision the target estimate must reach. Defaults to the
    /// magnitude of the target's prior mean, so the estimate reduces to the
    /// classic significance condition |t| ≥ z.
    pub precision: Option<f64>,
}

impl Default for SampleSizeSettings {
    fn default() -> Self {
        Self {
            confidence: 0.95,
            target: None,
            precision: None,
        }
    }
}

/// Default cap on the materialized candidate pool.
pub const DEFAULT_CANDIDATE_CAP: usize = 10_000;

/// Default number of full exchange passes before the optimizer stops.
pub const DEFAULT_MAX_PASSES: usize = 100;

/// Everything one generation request needs.
///
/// Assemble directly or through [`crate::builder::DesignBuilder`], then hand
/// to [`crate::pipeline::generate`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DesignConfig {
    /// Attributes varied across alternatives.
    pub attributes: Vec<Attribute>,
    /// Choice-task shape.
    pub task_format: TaskFormat,
    /// Choice model and priors.
    pub model: ModelSpec,
    /// Level-to-column coding scheme.
    pub coding: CodingScheme,
    /// Seed for every random decision in the pipeline. Fixed seed, fixed
    /// config: identical output.
    pub seed: u64,
    /// Exchange-pass cap for the optimizer.
    pub max_passes: usize,
    /// Cap on the materialized candidate pool; the full factorial is
    /// subsampled (seeded) above this size.
    pub candidate_cap: usize,
    /// Draw settings for simulated models.
    pub draws: DrawSettings,
    /// Sample-size estimate settings.
    pub sample_size: SampleSizeSettings,
}

impl DesignConfig {
    /// Create a config with default tuning knobs.
    #[must_use]
    pub fn new(attributes: Vec<Attribute>, task_format: TaskFormat, model: ModelSpec) -> Self {
        Self {
            attributes,
            task_format,
            model,
            coding: CodingScheme::default(),
            seed: 0,
            max_passes: DEFAULT_MAX_PASSES,
            candidate_cap: DEFAULT_CANDIDATE_CAP,
            draws: DrawSettings::default(),
            sample_size: SampleSizeSettings::default(),
        }
    }

    /// Validate every structural invariant of the request.
    ///
    /// # Errors
    ///
    /// Returns the first violation found: empty or duplicate attribute names,
    /// fewer than two (or duplicate) levels, an invalid task format, a
    /// parameter list that does not mirror the attribute list, a random prior
    /// under plain MNL, or out-of-range tuning values.
    pub fn validate(&self) -> Result<()> {
        if self.attributes.is_empty() {
            return Err(Error::EmptyAttributes);
        }
        for (i, attr) in self.attributes.iter().enumerate() {
            if attr.name.trim().is_empty() {
                return Err(Error::EmptyAttributeName { index: i });
            }
            if attr.levels.len() < 2 {
                return Err(Error::TooFewLevels {
                    attribute: attr.name.clone(),
                    levels: attr.levels.len(),
                });
            }
            for (j, level) in attr.levels.iter().enumerate() {
                if attr.levels[..j].contains(level) {
                    return Err(Error::DuplicateLevel {
                        attribute: attr.name.clone(),
                        level: level.clone(),
                    });
                }
            }
            if self.attributes[..i].iter().any(|a| a.name == attr.name) {
                return Err(Error::DuplicateAttribute {
                    name: attr.name.clone(),
                });
            }
        }

        self.task_format.validate()?;
        self.model.validate(&self.attributes)?;

        if self.candidate_cap == 0 {
            return Err(Error::invalid_config("candidate cap must be at least 1"));
        }
        if self.model.model.is_simulated() && self.draws.count == 0 {
            return Err(Error::invalid_config(
                "simulated models need at least 1 draw",
            ));
        }
        let confidence = self.sample_size.confidence;
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(Error::invalid_config(format!(
                "confidence must lie in (0, 1), got {confidence}"
            )));
        }
        if let Some(precision) = self.sample_size.precision {
            if !(precision > 0.0) {
                return Err(Error::invalid_config(format!(
                    "target precision must be positive, got {precision}"
                )));
            }
        }
        Ok(())
    }
}
