//! Builder pattern for assembling a design request.
//!
//! The builder provides a convenient API for putting a [`DesignConfig`]
//! together without constructing the nested pieces by hand: attributes are
//! added one by one, priors attach by attribute name, and every tuning knob
//! has a sensible default.
//!
//! # Example
//!
//! ```
//! use dcegen::DesignBuilder;
//!
//! let config = DesignBuilder::new()
//!     .attribute("price", &["low", "mid", "high"])
//!     .attribute("brand", &["a", "b"])
//!     .alternatives(2)
//!     .tasks(6)
//!     .seed(1)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.attributes.len(), 2);
//! assert_eq!(config.task_format.row_count(), 12);
//! ```

use crate::config::{
    Attribute, CodingScheme, DesignConfig, DrawMethod, DrawSettings, ModelSpec, ModelType,
    Parameter, Prior, SampleSizeSettings, TaskFormat, DEFAULT_CANDIDATE_CAP, DEFAULT_MAX_PASSES,
};
use crate::design::DesignResult;
use crate::error::{Error, Result};
use crate::pipeline;

/// Builder for a [`DesignConfig`].
///
/// Attributes must be added and a task count chosen; everything else
/// defaults: 2 alternatives per task, no status quo, multinomial logit with
/// zero priors, dummy coding, seed 0.
#[derive(Debug, Clone, Default)]
pub struct DesignBuilder {
    attributes: Vec<Attribute>,
    priors: Vec<(String, Prior)>,
    alternatives: usize,
    tasks: Option<usize>,
    status_quo: bool,
    model: ModelType,
    coding: CodingScheme,
    seed: u64,
    max_passes: usize,
    candidate_cap: usize,
    draws: DrawSettings,
    sample_size: SampleSizeSettings,
}

impl DesignBuilder {
    /// Create a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            alternatives: 2,
            max_passes: DEFAULT_MAX_PASSES,
            candidate_cap: DEFAULT_CANDIDATE_CAP,
            ..Self::default()
        }
    }

    /// Add an attribute with its level labels, in presentation order.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, levels: &[&str]) -> Self {
        self.attributes.push(Attribute::new(name, levels));
        self
    }

    /// Set the number of alternatives per task (default 2).
    #[must_use]
    pub fn alternatives(mut self, alternatives: usize) -> Self {
        self.alternatives = alternatives;
        self
    }

    /// Set the number of tasks per respondent. Must be set.
    #[must_use]
    pub fn tasks(mut self, tasks: usize) -> Self {
        self.tasks = Some(tasks);
        self
    }

    /// Add a fixed status-quo ("none") alternative to every task.
    #[must_use]
    pub fn status_quo(mut self, status_quo: bool) -> Self {
        self.status_quo = status_quo;
        self
    }

    /// Set the choice model (default MNL).
    #[must_use]
    pub fn model(mut self, model: ModelType) -> Self {
        self.model = model;
        self
    }

    /// Set the prior for a named attribute's coefficients.
    ///
    /// Attributes without an explicit prior default to `Fixed(0.0)`.
    #[must_use]
    pub fn prior(mut self, attribute: impl Into<String>, prior: Prior) -> Self {
        self.priors.push((attribute.into(), prior));
        self
    }

    /// Set the level coding scheme (default dummy coding).
    #[must_use]
    pub fn coding(mut self, coding: CodingScheme) -> Self {
        self.coding = coding;
        self
    }

    /// Set the random seed (default 0).
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the optimizer's exchange-pass cap.
    #[must_use]
    pub fn max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Set the candidate-pool cap.
    #[must_use]
    pub fn candidate_cap(mut self, candidate_cap: usize) -> Self {
        self.candidate_cap = candidate_cap;
        self
    }

    /// Set the draw method for simulated models.
    #[must_use]
    pub fn draw_method(mut self, method: DrawMethod) -> Self {
        self.draws.method = method;
        self
    }

    /// Set the draw count for simulated models.
    #[must_use]
    pub fn draw_count(mut self, count: usize) -> Self {
        self.draws.count = count;
        self
    }

    /// Set the confidence level for the sample-size estimate.
    #[must_use]
    pub fn confidence(mut self, confidence: f64) -> Self {
        self.sample_size.confidence = confidence;
        self
    }

    /// Target the sample-size estimate at a named coefficient
    /// (for example `"price_high"`).
    #[must_use]
    pub fn sample_size_target(mut self, target: impl Into<String>) -> Self {
        self.sample_size.target = Some(target.into());
        self
    }

    /// Set an absolute precision for the sample-size estimate.
    #[must_use]
    pub fn sample_size_precision(mut self, precision: f64) -> Self {
        self.sample_size.precision = Some(precision);
        self
    }

    /// Assemble and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no attributes were added, the task count is
    /// missing, a prior names an unknown attribute, or any structural
    /// invariant of [`DesignConfig::validate`] fails.
    pub fn build(self) -> Result<DesignConfig> {
        let tasks = self
            .tasks
            .ok_or_else(|| Error::invalid_config("tasks must be specified"))?;

        for (name, _) in &self.priors {
            if !self.attributes.iter().any(|a| &a.name == name) {
                return Err(Error::invalid_config(format!(
                    "prior refers to unknown attribute '{name}'"
                )));
            }
        }

        let parameters: Vec<Parameter> = self
            .attributes
            .iter()
            .map(|attr| {
                let prior = self
                    .priors
                    .iter()
                    .rev()
                    .find(|(name, _)| name == &attr.name)
                    .map_or(Prior::Fixed(0.0), |(_, prior)| *prior);
                Parameter::new(attr.name.clone(), prior)
            })
            .collect();

        let config = DesignConfig {
            attributes: self.attributes,
            task_format: TaskFormat::new(self.alternatives, tasks, self.status_quo),
            model: ModelSpec::new(self.model, parameters),
            coding: self.coding,
            seed: self.seed,
            max_passes: self.max_passes,
            candidate_cap: self.candidate_cap,
            draws: self.draws,
            sample_size: self.sample_size,
        };
        config.validate()?;
        Ok(config)
    }

    /// Build the configuration and run the pipeline in one call.
    ///
    /// # Errors
    ///
    /// Same as [`DesignBuilder::build`] plus any pipeline error.
    pub fn build_and_generate(self) -> Result<DesignResult> {
        pipeline::generate(&self.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_basic() {
        let config = DesignBuilder::new()
            .attribute("price", &["low", "high"])
            .attribute("brand", &["a", "b"])
            .tasks(4)
            .build()
            .unwrap();

        assert_eq!(config.task_format.alternatives, 2);
        assert_eq!(config.task_format.tasks, 4);
        assert!(!config.task_format.status_quo);
        assert_eq!(config.model.model, ModelType::Mnl);
        assert_eq!(config.model.parameters.len(), 2);
        assert_eq!(config.model.parameters[0].prior, Prior::Fixed(0.0));
    }

    #[test]
    fn test_builder_priors_attach_by_name() {
        let config = DesignBuilder::new()
            .attribute("price", &["low", "high"])
            .attribute("brand", &["a", "b"])
            .tasks(4)
            .prior("brand", Prior::Fixed(-0.4))
            .build()
            .unwrap();

        assert_eq!(config.model.parameters[0].prior, Prior::Fixed(0.0));
        assert_eq!(config.model.parameters[1].prior, Prior::Fixed(-0.4));
    }

    #[test]
    fn test_builder_last_prior_wins() {
        let config = DesignBuilder::new()
            .attribute("price", &["low", "high"])
            .tasks(4)
            .prior("price", Prior::Fixed(0.1))
            .prior("price", Prior::Fixed(0.9))
            .build()
            .unwrap();

        assert_eq!(config.model.parameters[0].prior, Prior::Fixed(0.9));
    }

    #[test]
    fn test_builder_missing_tasks() {
        let result = DesignBuilder::new()
            .attribute("price", &["low", "high"])
            .build();
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn test_builder_missing_attributes() {
        let result = DesignBuilder::new().tasks(4).build();
        assert_eq!(result, Err(Error::EmptyAttributes));
    }

    #[test]
    fn test_builder_unknown_prior_attribute() {
        let result = DesignBuilder::new()
            .attribute("price", &["low", "high"])
            .tasks(4)
            .prior("cost", Prior::Fixed(1.0))
            .build();
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn test_builder_rejects_single_alternative() {
        let result = DesignBuilder::new()
            .attribute("price", &["low", "high"])
            .alternatives(1)
            .tasks(4)
            .build();
        assert!(matches!(result, Err(Error::InvalidTaskFormat { .. })));
    }

    #[test]
    fn test_builder_rejects_duplicate_attribute() {
        let result = DesignBuilder::new()
            .attribute("price", &["low", "high"])
            .attribute("price", &["a", "b"])
            .tasks(4)
            .build();
        assert!(matches!(result, Err(Error::DuplicateAttribute { .. })));
    }

    #[test]
    fn test_builder_full_configuration() {
        let config = DesignBuilder::new()
            .attribute("price", &["low", "mid", "high"])
            .attribute("brand", &["a", "b"])
            .alternatives(3)
            .tasks(8)
            .status_quo(true)
            .model(ModelType::MixedLogit)
            .prior(
                "price",
                Prior::Normal {
                    mean: -0.5,
                    std_dev: 0.2,
                },
            )
            .coding(CodingScheme::Effects)
            .seed(99)
            .max_passes(20)
            .candidate_cap(500)
            .draw_method(DrawMethod::PseudoRandom)
            .draw_count(250)
            .confidence(0.9)
            .sample_size_target("price_high")
            .sample_size_precision(0.1)
            .build()
            .unwrap();

        assert_eq!(config.coding, CodingScheme::Effects);
        assert_eq!(config.seed, 99);
        assert_eq!(config.max_passes, 20);
        assert_eq!(config.candidate_cap, 500);
        assert_eq!(config.draws.count, 250);
        assert_eq!(config.draws.method, DrawMethod::PseudoRandom);
        assert_eq!(config.sample_size.confidence, 0.9);
        assert_eq!(
            config.sample_size.target.as_deref(),
            Some("price_high")
        );
        assert_eq!(config.task_format.row_count(), 32);
    }
}
