//! Estimation-syntax rendering.
//!
//! Pure templating: given the final configuration, emit ready-to-edit
//! estimation commands for R (`mlogit`), NLogit, and Biogeme. Nothing here
//! computes or alters a numeric result; the templates only interpolate
//! attribute names, alternative counts, and the model type.

use std::fmt::Write as _;

use crate::config::{DesignConfig, ModelType, Prior};
use crate::design::EstimationSyntax;

/// File name the templates assume the exported design table was saved under.
const CSV_FILE: &str = "experimental_design.csv";

/// Render estimation syntax for all supported packages.
#[must_use]
pub fn emit(config: &DesignConfig) -> EstimationSyntax {
    EstimationSyntax {
        r: render_r(config),
        nlogit: render_nlogit(config),
        biogeme: render_biogeme(config),
    }
}

/// Alternative labels: `alt1..altJ`, plus `none` for the status quo.
fn alternative_labels(config: &DesignConfig) -> Vec<String> {
    let mut labels: Vec<String> = (1..=config.task_format.alternatives)
        .map(|j| format!("alt{j}"))
        .collect();
    if config.task_format.status_quo {
        labels.push("none".to_string());
    }
    labels
}

fn render_r(config: &DesignConfig) -> String {
    let attributes: Vec<&str> = config
        .attributes
        .iter()
        .map(|a| a.name.as_str())
        .collect();
    let formula = attributes.join(" + ");

    let mut out = String::new();
    let _ = writeln!(out, "library(mlogit)");
    let _ = writeln!(out);
    let _ = writeln!(out, "design <- read.csv(\"{CSV_FILE}\")");
    let _ = writeln!(
        out,
        "data <- mlogit.data(design, choice = \"Choice\", shape = \"long\","
    );
    let _ = writeln!(
        out,
        "                    alt.var = \"Alternative\", chid.var = \"Task\","
    );
    let _ = writeln!(out, "                    id.var = \"RespondentID\")");
    let _ = writeln!(out);

    match config.model.model {
        ModelType::Mnl => {
            let _ = writeln!(out, "model <- mlogit(Choice ~ {formula} | 0, data = data)");
        }
        ModelType::MixedLogit | ModelType::ErrorComponent => {
            let rpar: Vec<String> = config
                .model
                .parameters
                .iter()
                .filter_map(|p| match p.prior {
                    Prior::Normal { .. } => Some(format!("{} = \"n\"", p.name)),
                    Prior::LogNormal { .. } => Some(format!("{} = \"ln\"", p.name)),
                    Prior::Fixed(_) => None,
                })
                .collect();
            let rpar_arg = if rpar.is_empty() {
                String::new()
            } else {
                format!(",\n                rpar = c({})", rpar.join(", "))
            };
            let _ = writeln!(
                out,
                "model <- mlogit(Choice ~ {formula} | 0, data = data{rpar_arg},"
            );
            let _ = writeln!(
                out,
                "                R = {}, halton = NA, panel = TRUE)",
                config.draws.count
            );
        }
    }
    let _ = writeln!(out, "summary(model)");
    out
}

fn render_nlogit(config: &DesignConfig) -> String {
    let labels = alternative_labels(config);
    let terms: Vec<String> = config
        .attributes
        .iter()
        .map(|a| format!("b_{name}*{upper}", name = a.name, upper = a.name.to_uppercase()))
        .collect();
    let utility = terms.join(" + ");

    let mut out = String::new();
    let _ = writeln!(out, "NLOGIT");
    let _ = writeln!(out, "    ;lhs = Choice");
    let _ = writeln!(out, "    ;choices = {}", labels.join(", "));
    if config.model.model.is_simulated() {
        let _ = writeln!(out, "    ;RPL");
        let _ = writeln!(out, "    ;halton ;pts = {}", config.draws.count);
        let fcn: Vec<String> = config
            .model
            .parameters
            .iter()
            .filter_map(|p| match p.prior {
                Prior::Normal { .. } => Some(format!("b_{}(n)", p.name)),
                Prior::LogNormal { .. } => Some(format!("b_{}(l)", p.name)),
                Prior::Fixed(_) => None,
            })
            .collect();
        if !fcn.is_empty() {
            let _ = writeln!(out, "    ;fcn = {}", fcn.join(", "));
        }
    }
    let _ = writeln!(out, "    ;model:");
    for (j, label) in labels.iter().enumerate() {
        let is_status_quo = config.task_format.status_quo && j == labels.len() - 1;
        let terminator = if j + 1 == labels.len() { "" } else { " /" };
        if is_status_quo {
            let _ = writeln!(out, "    U({label}) = asc_none{terminator}");
        } else {
            let _ = writeln!(out, "    U({label}) = {utility}{terminator}");
        }
    }
    let _ = writeln!(out, "    $");
    out
}

fn render_biogeme(config: &DesignConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "import pandas as pd");
    let _ = writeln!(out, "import biogeme.biogeme as bio");
    let _ = writeln!(out, "import biogeme.database as db");
    let _ = writeln!(out, "from biogeme import models");
    let _ = writeln!(out, "from biogeme.expressions import Beta, Variable");
    let _ = writeln!(out);
    let _ = writeln!(out, "df = pd.read_csv(\"{CSV_FILE}\")");
    let _ = writeln!(out, "database = db.Database(\"design\", df)");
    let _ = writeln!(out);
    for attr in &config.attributes {
        let _ = writeln!(
            out,
            "B_{upper} = Beta(\"b_{name}\", 0, None, None, 0)",
            upper = attr.name.to_uppercase(),
            name = attr.name
        );
    }
    if config.task_format.status_quo {
        let _ = writeln!(out, "ASC_NONE = Beta(\"asc_none\", 0, None, None, 0)");
    }
    let _ = writeln!(out);

    let terms: Vec<String> = config
        .attributes
        .iter()
        .map(|a| {
            format!(
                "B_{upper} * Variable(\"{name}\")",
                upper = a.name.to_uppercase(),
                name = a.name
            )
        })
        .collect();
    let utility = terms.join(" + ");

    let labels = alternative_labels(config);
    for (j, label) in labels.iter().enumerate() {
        let is_status_quo = config.task_format.status_quo && j == labels.len() - 1;
        if is_status_quo {
            let _ = writeln!(out, "V_{label} = ASC_NONE");
        } else {
            let _ = writeln!(out, "V_{label} = {utility}");
        }
    }
    let _ = writeln!(out);
    let v_map: Vec<String> = labels
        .iter()
        .enumerate()
        .map(|(j, label)| format!("{}: V_{label}", j + 1))
        .collect();
    let _ = writeln!(out, "V = {{{}}}", v_map.join(", "));
    let _ = writeln!(
        out,
        "av = {{{}}}",
        labels
            .iter()
            .enumerate()
            .map(|(j, _)| format!("{}: 1", j + 1))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "logprob = models.loglogit(V, av, Variable(\"Choice\"))"
    );
    let _ = writeln!(out, "biogeme = bio.BIOGEME(database, logprob)");
    let _ = writeln!(out, "biogeme.modelName = \"choice_design\"");
    let _ = writeln!(out, "results = biogeme.estimate()");
    let _ = writeln!(out, "print(results.short_summary())");
    out
}
