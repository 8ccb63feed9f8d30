//! Design value types and the generation result.
//!
//! A [`Design`] is an ordered sequence of [`CandidateRow`]s grouped into
//! tasks for one synthetic respondent block. It is plain value data: the
//! optimizer produces it, the evaluator and syntax emitter read it, and the
//! caller owns it afterwards.

use std::collections::HashSet;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{Attribute, TaskFormat};

/// One alternative within one task.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CandidateRow {
    /// Zero-based task index.
    pub task: usize,
    /// Zero-based alternative index within the task.
    pub alternative: usize,
    /// One level index per attribute.
    pub levels: Vec<usize>,
    /// Whether this is the fixed status-quo row.
    pub status_quo: bool,
}

/// A report on how evenly attribute levels are used across a design.
///
/// Status-quo rows are fixed at the reference levels and excluded from the
/// counts.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BalanceReport {
    /// Per attribute, the usage count of each level.
    pub level_counts: Vec<Vec<usize>>,
    /// Per attribute, the count a perfectly balanced design would show.
    pub expected: Vec<f64>,
    /// Largest absolute deviation from the expected count, over all levels.
    pub max_deviation: f64,
}

/// A complete choice design for one synthetic respondent block.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Design {
    attributes: Vec<Attribute>,
    task_format: TaskFormat,
    rows: Vec<CandidateRow>,
}

impl Design {
    /// Assemble a design from its rows.
    ///
    /// # Panics
    ///
    /// Panics if the row count does not match the task format. Rows come
    /// from the optimizer, which always produces a full assignment.
    #[must_use]
    pub fn new(attributes: Vec<Attribute>, task_format: TaskFormat, rows: Vec<CandidateRow>) -> Self {
        assert_eq!(
            rows.len(),
            task_format.row_count(),
            "design rows {} must match task format rows {}",
            rows.len(),
            task_format.row_count()
        );
        Self {
            attributes,
            task_format,
            rows,
        }
    }

    /// The attributes the design varies.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// The task format the design satisfies.
    #[must_use]
    pub fn task_format(&self) -> &TaskFormat {
        &self.task_format
    }

    /// All rows, task-major.
    #[must_use]
    pub fn rows(&self) -> &[CandidateRow] {
        &self.rows
    }

    /// Number of tasks.
    #[must_use]
    pub fn tasks(&self) -> usize {
        self.task_format.tasks
    }

    /// Total number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Rows of one task.
    #[must_use]
    pub fn task_rows(&self, task: usize) -> &[CandidateRow] {
        let width = self.task_format.alternatives_total();
        &self.rows[task * width..(task + 1) * width]
    }

    /// Whether any task shows the same level profile on two non-status-quo
    /// alternatives.
    #[must_use]
    pub fn has_duplicate_alternatives(&self) -> bool {
        for task in 0..self.tasks() {
            let mut seen = HashSet::new();
            for row in self.task_rows(task).iter().filter(|r| !r.status_quo) {
                if !seen.insert(&row.levels) {
                    return true;
                }
            }
        }
        false
    }

    /// Count level usage per attribute, excluding status-quo rows.
    #[must_use]
    pub fn level_counts(&self) -> Vec<Vec<usize>> {
        let mut counts: Vec<Vec<usize>> = self
            .attributes
            .iter()
            .map(|a| vec![0; a.levels.len()])
            .collect();
        for row in self.rows.iter().filter(|r| !r.status_quo) {
            for (attr, &level) in row.levels.iter().enumerate() {
                counts[attr][level] += 1;
            }
        }
        counts
    }

    /// Perform a balance check on all attributes.
    #[must_use]
    pub fn balance_report(&self) -> BalanceReport {
        let level_counts = self.level_counts();
        let varied_rows = self.rows.iter().filter(|r| !r.status_quo).count() as f64;

        let mut expected = Vec::with_capacity(self.attributes.len());
        let mut max_deviation = 0.0f64;
        for (attr, counts) in self.attributes.iter().zip(&level_counts) {
            let target = varied_rows / attr.levels.len() as f64;
            expected.push(target);
            for &count in counts {
                max_deviation = max_deviation.max((count as f64 - target).abs());
            }
        }

        BalanceReport {
            level_counts,
            expected,
            max_deviation,
        }
    }

    /// Flatten the design into a comma-separated table.
    ///
    /// Header: `RespondentID,Task,Alternative,<attribute names...>,Choice`.
    /// Task and alternative indices are 1-based; the `Choice` column is an
    /// empty placeholder for collected responses. Fields containing commas,
    /// quotes, or newlines are quote-escaped.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        out.push_str("RespondentID,Task,Alternative");
        for attr in &self.attributes {
            out.push(',');
            out.push_str(&escape_csv(&attr.name));
        }
        out.push_str(",Choice\n");

        for row in &self.rows {
            out.push_str(&format!("1,{},{}", row.task + 1, row.alternative + 1));
            for (attr, &level) in self.attributes.iter().zip(&row.levels) {
                out.push(',');
                out.push_str(&escape_csv(&attr.levels[level]));
            }
            out.push_str(",\n");
        }
        out
    }
}

impl fmt::Display for Design {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Design({})", self.task_format)?;
        for row in &self.rows {
            let labels: Vec<&str> = self
                .attributes
                .iter()
                .zip(&row.levels)
                .map(|(a, &l)| a.levels[l].as_str())
                .collect();
            writeln!(
                f,
                "  task {} alt {}{}: {}",
                row.task + 1,
                row.alternative + 1,
                if row.status_quo { " (status quo)" } else { "" },
                labels.join(" | ")
            )?;
        }
        Ok(())
    }
}

/// Quote a CSV field when it needs quoting.
fn escape_csv(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Estimation-ready syntax for external statistical packages.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EstimationSyntax {
    /// R, using the `mlogit` package.
    pub r: String,
    /// NLogit command file.
    pub nlogit: String,
    /// Biogeme model script (Python).
    pub biogeme: String,
}

/// How the optimizer's search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Termination {
    /// No single-row exchange improves the D-error.
    Converged {
        /// Full exchange passes performed.
        passes: usize,
    },
    /// The pass cap was reached with improvements still being found.
    /// A normal, lower-confidence outcome, not an error.
    IterationCapReached {
        /// Full exchange passes performed.
        passes: usize,
    },
    /// Cancellation was signalled; the best design found so far is returned.
    Cancelled {
        /// Full exchange passes completed before cancellation.
        passes: usize,
    },
}

impl Termination {
    /// Passes completed before the search ended.
    #[must_use]
    pub fn passes(&self) -> usize {
        match *self {
            Self::Converged { passes }
            | Self::IterationCapReached { passes }
            | Self::Cancelled { passes } => passes,
        }
    }
}

/// The complete outcome of one generation request.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DesignResult {
    /// The optimized design.
    pub design: Design,
    /// D-error of the final design; `f64::INFINITY` marks a singular
    /// (non-identifiable) information matrix.
    pub d_error: f64,
    /// Estimated respondents required for the target coefficient to reach
    /// significance; `f64::INFINITY` when the design is singular.
    pub s_error: f64,
    /// Estimation syntax for R, NLogit, and Biogeme.
    pub syntax: EstimationSyntax,
    /// Human-readable summary of the design and how the search ended.
    pub explanation: String,
    /// Terminal state of the search.
    pub termination: Termination,
}
