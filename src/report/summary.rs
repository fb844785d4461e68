//! Selection summary report generation

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

/// Summary of the feature selection and transform process
#[derive(Debug, Default)]
pub struct SelectionSummary {
    pub initial_features: usize,
    pub final_features: usize,
    pub dropped_correlated: Vec<String>,
    pub dropped_constant: Vec<String>,
    pub rescaled: Vec<String>,
}

impl SelectionSummary {
    pub fn new(initial_features: usize) -> Self {
        Self {
            initial_features,
            final_features: initial_features,
            ..Default::default()
        }
    }

    pub fn add_correlation_drops(&mut self, features: Vec<String>) {
        self.final_features -= features.len();
        self.dropped_correlated = features;
    }

    pub fn add_constant_drops(&mut self, features: Vec<String>) {
        self.final_features -= features.len();
        self.dropped_constant = features;
    }

    pub fn add_rescaled(&mut self, features: Vec<String>) {
        self.rescaled = features;
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("SELECTION SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![
            Cell::new("📁 Initial Features"),
            Cell::new(self.initial_features),
        ]);

        table.add_row(vec![
            Cell::new("🔗 Dropped (Correlation)"),
            Cell::new(self.dropped_correlated.len()).fg(if self.dropped_correlated.is_empty() {
                Color::White
            } else {
                Color::Red
            }),
        ]);

        table.add_row(vec![
            Cell::new("🗑️  Dropped (Almost Constant)"),
            Cell::new(self.dropped_constant.len()).fg(if self.dropped_constant.is_empty() {
                Color::White
            } else {
                Color::Red
            }),
        ]);

        table.add_row(vec![
            Cell::new("📐 Log-rescaled"),
            Cell::new(self.rescaled.len()).fg(Color::Cyan),
        ]);

        table.add_row(vec![
            Cell::new("✅ Final Features"),
            Cell::new(self.final_features)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);

        let reduction_pct = if self.initial_features > 0 {
            ((self.initial_features - self.final_features) as f64 / self.initial_features as f64)
                * 100.0
        } else {
            0.0
        };

        let color = if reduction_pct > 30.0 {
            Color::Green
        } else if reduction_pct > 10.0 {
            Color::Yellow
        } else {
            Color::Cyan
        };

        table.add_row(vec![
            Cell::new("📉 Reduction"),
            Cell::new(format!("{:.1}%", reduction_pct))
                .fg(color)
                .add_attribute(Attribute::Bold),
        ]);

        // Indent the table
        for line in table.to_string().lines() {
            println!("    {}", line);
        }

        // Show dropped features details if any
        if !self.dropped_correlated.is_empty() || !self.dropped_constant.is_empty() {
            println!();
            println!(
                "    {} {}",
                style("📝").cyan(),
                style("DROPPED FEATURES").white().bold()
            );
            println!("    {}", style("─".repeat(50)).dim());

            if !self.dropped_correlated.is_empty() {
                println!();
                println!(
                    "      {} {}:",
                    style("High Correlation").yellow(),
                    style(format!("({})", self.dropped_correlated.len())).dim()
                );
                for feature in &self.dropped_correlated {
                    println!("        {} {}", style("•").dim(), feature);
                }
            }

            if !self.dropped_constant.is_empty() {
                println!();
                println!(
                    "      {} {}:",
                    style("Almost Constant").yellow(),
                    style(format!("({})", self.dropped_constant.len())).dim()
                );
                for feature in &self.dropped_constant {
                    println!("        {} {}", style("•").dim(), feature);
                }
            }
        }

        if !self.rescaled.is_empty() {
            println!();
            println!(
                "      {} {}:",
                style("Log-rescaled").yellow(),
                style(format!("({})", self.rescaled.len())).dim()
            );
            for feature in &self.rescaled {
                println!("        {} {}", style("•").dim(), feature);
            }
        }
    }
}
