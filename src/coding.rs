//! Level-to-column coding of attributes.
//!
//! A [`Codebook`] turns the attribute list into a stable numeric coding: each
//! level of a k-level attribute maps to a fixed (k−1)-element vector, and the
//! per-attribute vectors concatenate into one design-matrix row. The mapping
//! is decided once per request, so the same level always codes to the same
//! vector within a run.
//!
//! Two schemes are supported:
//!
//! - **Dummy** (default): level 0 is the reference and codes to all zeros;
//!   level j ≥ 1 codes to the j-th unit vector.
//! - **Effects**: level j ≥ 1 codes to the j-th unit vector; the reference
//!   level codes to −1 in every column.
//!
//! The codebook also expands the model's one-parameter-per-attribute priors
//! into one [`Coefficient`] per coded column, which fixes the order and
//! dimension of the information matrix.

use ndarray::Array1;

use crate::config::{Attribute, CodingScheme, ModelSpec, Prior};
use crate::error::{Error, Result};

/// Coding of a single attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeCoding {
    /// Attribute name.
    pub name: String,
    /// Level labels, in declaration order. Level 0 is the reference.
    pub levels: Vec<String>,
    /// Number of coded columns: levels − 1.
    pub columns: usize,
}

/// One expanded design coefficient: a single coded column with its prior.
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficient {
    /// Column name, `<attribute>_<level>`.
    pub name: String,
    /// Index of the attribute this column belongs to.
    pub attribute: usize,
    /// Prior inherited from the attribute's parameter.
    pub prior: Prior,
}

/// Stable numeric coding for a full attribute list.
#[derive(Debug, Clone, PartialEq)]
pub struct Codebook {
    scheme: CodingScheme,
    attributes: Vec<AttributeCoding>,
    coefficients: Vec<Coefficient>,
}

impl Codebook {
    /// Build the codebook for an attribute list and model spec.
    ///
    /// The model supplies one prior per attribute; the codebook replicates it
    /// across that attribute's coded columns, so the expanded coefficient
    /// count equals the total column count.
    ///
    /// # Errors
    ///
    /// Returns an error if an attribute has an empty name or fewer than two
    /// levels, or if the parameter list does not mirror the attribute list.
    pub fn new(
        attributes: &[Attribute],
        model: &ModelSpec,
        scheme: CodingScheme,
    ) -> Result<Self> {
        if attributes.is_empty() {
            return Err(Error::EmptyAttributes);
        }
        model.validate(attributes)?;

        let mut coded = Vec::with_capacity(attributes.len());
        let mut coefficients = Vec::new();
        for (i, attr) in attributes.iter().enumerate() {
            if attr.name.trim().is_empty() {
                return Err(Error::EmptyAttributeName { index: i });
            }
            if attr.levels.len() < 2 {
                return Err(Error::TooFewLevels {
                    attribute: attr.name.clone(),
                    levels: attr.levels.len(),
                });
            }
            let prior = model.parameters[i].prior;
            for level in attr.levels.iter().skip(1) {
                coefficients.push(Coefficient {
                    name: format!("{}_{}", attr.name, level),
                    attribute: i,
                    prior,
                });
            }
            coded.push(AttributeCoding {
                name: attr.name.clone(),
                levels: attr.levels.clone(),
                columns: attr.levels.len() - 1,
            });
        }

        Ok(Self {
            scheme,
            attributes: coded,
            coefficients,
        })
    }

    /// The coding scheme in use.
    #[must_use]
    pub fn scheme(&self) -> CodingScheme {
        self.scheme
    }

    /// Per-attribute codings.
    #[must_use]
    pub fn attributes(&self) -> &[AttributeCoding] {
        &self.attributes
    }

    /// Expanded coefficients, one per coded column.
    #[must_use]
    pub fn coefficients(&self) -> &[Coefficient] {
        &self.coefficients
    }

    /// Total coded columns, equal to the coefficient count.
    #[must_use]
    pub fn columns(&self) -> usize {
        self.coefficients.len()
    }

    /// Prior means as a vector, in column order.
    #[must_use]
    pub fn prior_means(&self) -> Array1<f64> {
        self.coefficients.iter().map(|c| c.prior.point()).collect()
    }

    /// Find a coefficient index by column name.
    #[must_use]
    pub fn coefficient_index(&self, name: &str) -> Option<usize> {
        self.coefficients.iter().position(|c| c.name == name)
    }

    /// Code one candidate row (a level index per attribute) into a
    /// design-matrix row of length [`Self::columns`].
    ///
    /// # Panics
    ///
    /// Panics if `levels` does not hold one in-range level index per
    /// attribute. Candidate rows come from the generator, which only
    /// produces in-range indices.
    #[must_use]
    pub fn code_row(&self, levels: &[usize]) -> Array1<f64> {
        assert_eq!(
            levels.len(),
            self.attributes.len(),
            "level assignment length {} must match attribute count {}",
            levels.len(),
            self.attributes.len()
        );

        let mut row = Array1::zeros(self.columns());
        let mut offset = 0;
        for (attr, &level) in self.attributes.iter().zip(levels) {
            assert!(
                level < attr.levels.len(),
                "level {} out of range for attribute '{}'",
                level,
                attr.name
            );
            match self.scheme {
                CodingScheme::Dummy => {
                    if level > 0 {
                        row[offset + level - 1] = 1.0;
                    }
                }
                CodingScheme::Effects => {
                    if level > 0 {
                        row[offset + level - 1] = 1.0;
                    } else {
                        for c in 0..attr.columns {
                            row[offset + c] = -1.0;
                        }
                    }
                }
            }
            offset += attr.columns;
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelType, Parameter};

    fn spec_for(attributes: &[Attribute]) -> ModelSpec {
        ModelSpec::new(
            ModelType::Mnl,
            attributes
                .iter()
                .map(|a| Parameter::new(a.name.clone(), Prior::Fixed(0.5)))
                .collect(),
        )
    }

    fn three_by_two() -> Vec<Attribute> {
        vec![
            Attribute::new("price", &["low", "mid", "high"]),
            Attribute::new("color", &["red", "blue"]),
        ]
    }

    #[test]
    fn test_column_count_matches_coefficients() {
        let attrs = three_by_two();
        let model = spec_for(&attrs);
        let codebook = Codebook::new(&attrs, &model, CodingScheme::Dummy).unwrap();

        // (3-1) + (2-1) columns
        assert_eq!(codebook.columns(), 3);
        assert_eq!(codebook.coefficients().len(), 3);
        assert_eq!(codebook.coefficients()[0].name, "price_mid");
        assert_eq!(codebook.coefficients()[1].name, "price_high");
        assert_eq!(codebook.coefficients()[2].name, "color_blue");
    }

    #[test]
    fn test_dummy_coding() {
        let attrs = three_by_two();
        let model = spec_for(&attrs);
        let codebook = Codebook::new(&attrs, &model, CodingScheme::Dummy).unwrap();

        assert_eq!(codebook.code_row(&[0, 0]).to_vec(), vec![0.0, 0.0, 0.0]);
        assert_eq!(codebook.code_row(&[1, 0]).to_vec(), vec![1.0, 0.0, 0.0]);
        assert_eq!(codebook.code_row(&[2, 1]).to_vec(), vec![0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_effects_coding() {
        let attrs = three_by_two();
        let model = spec_for(&attrs);
        let codebook = Codebook::new(&attrs, &model, CodingScheme::Effects).unwrap();

        // Reference level codes to -1 in each of the attribute's columns.
        assert_eq!(codebook.code_row(&[0, 0]).to_vec(), vec![-1.0, -1.0, -1.0]);
        assert_eq!(codebook.code_row(&[1, 1]).to_vec(), vec![1.0, 0.0, 1.0]);
        assert_eq!(codebook.code_row(&[2, 0]).to_vec(), vec![0.0, 1.0, -1.0]);
    }

    #[test]
    fn test_coding_is_stable() {
        let attrs = three_by_two();
        let model = spec_for(&attrs);
        let codebook = Codebook::new(&attrs, &model, CodingScheme::Dummy).unwrap();

        let first = codebook.code_row(&[2, 1]);
        let second = codebook.code_row(&[2, 1]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_prior_expansion() {
        let attrs = three_by_two();
        let model = spec_for(&attrs);
        let codebook = Codebook::new(&attrs, &model, CodingScheme::Dummy).unwrap();

        let means = codebook.prior_means();
        assert_eq!(means.len(), 3);
        for &m in &means {
            assert!((m - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_coefficient_lookup() {
        let attrs = three_by_two();
        let model = spec_for(&attrs);
        let codebook = Codebook::new(&attrs, &model, CodingScheme::Dummy).unwrap();

        assert_eq!(codebook.coefficient_index("color_blue"), Some(2));
        assert_eq!(codebook.coefficient_index("color_red"), None);
    }

    #[test]
    fn test_rejects_single_level() {
        let attrs = vec![Attribute::new("price", &["only"])];
        let model = spec_for(&attrs);
        let result = Codebook::new(&attrs, &model, CodingScheme::Dummy);
        assert!(matches!(result, Err(Error::TooFewLevels { levels: 1, .. })));
    }

    #[test]
    fn test_rejects_empty_name() {
        let attrs = vec![Attribute::new("", &["a", "b"])];
        let model = spec_for(&attrs);
        let result = Codebook::new(&attrs, &model, CodingScheme::Dummy);
        assert!(matches!(result, Err(Error::EmptyAttributeName { index: 0 })));
    }
}
