//! Basic usage example for the dcegen library.
//!
//! Generates a D-efficient design for a small two-attribute study and prints
//! the design table, efficiency metrics, and R estimation syntax.

use dcegen::prelude::*;

fn main() {
    println!("dcegen - Basic Usage Example\n");

    println!("Generating a design: 2 attributes, 2 alternatives, 6 tasks...");
    let result = DesignBuilder::new()
        .attribute("price", &["$10", "$15", "$20"])
        .attribute("delivery", &["same day", "2 days", "1 week"])
        .alternatives(2)
        .tasks(6)
        .status_quo(true)
        .prior("price", Prior::Fixed(-0.4))
        .prior("delivery", Prior::Fixed(-0.2))
        .seed(2024)
        .build_and_generate()
        .expect("Failed to generate design");

    println!("\n{}", result.design);

    println!("D-error: {:.4e}", result.d_error);
    println!("S-error: {:.0} respondents", result.s_error);
    println!("Outcome: {:?}", result.termination);
    println!("\n{}", result.explanation);

    println!("\nBalance report:");
    let report = result.design.balance_report();
    for (attr, counts) in result.design.attributes().iter().zip(&report.level_counts) {
        println!("  {}: {:?}", attr.name, counts);
    }

    println!("\nCSV export:");
    println!("{}", result.design.to_csv());

    println!("R estimation syntax:");
    println!("{}", result.syntax.r);
}
