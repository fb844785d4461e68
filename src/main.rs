//! Chaff: Feature Selection CLI Tool
//!
//! Runs the full pipeline over a dataset: correlation-based and
//! near-constant-based removal, log-rescaling of the survivors, and
//! persistence of the resulting feature lists and pipeline settings.

use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use console::style;

use chaff::cli::Cli;
use chaff::pipeline::{
    load_dataset, save_dataset, AlmostConstantFeatureRemover, CorrelatedFeatureRemover,
    FeatureSelectionPipeline, LogRescaler,
};
use chaff::report::SelectionSummary;
use chaff::utils::{create_spinner, finish_with_success};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let root = cli.root_path();

    // Step 1: Load dataset
    let start = Instant::now();
    let spinner = create_spinner("Loading dataset...");
    let mut df = load_dataset(&cli.input)?;
    let (rows, cols) = df.shape();
    finish_with_success(&spinner, "Dataset loaded");

    println!("\n    {} Dataset Statistics:", style("✧").cyan());
    println!("      Rows: {}", rows);
    println!("      Columns: {}", cols);

    // Step 2: Build the pipeline
    let mut pipeline = FeatureSelectionPipeline::new(&root, &df, &cli.non_feature_columns)?
        .with_verbose(cli.verbose);
    if let Some(prefix) = &cli.prefix {
        pipeline = pipeline.with_prefix(prefix.clone());
    }

    let mut correlated =
        CorrelatedFeatureRemover::new(cli.correlation_threshold).with_verbose(cli.verbose);
    if let Some(path) = &cli.matrix_output {
        correlated = correlated.with_matrix_output(path.clone());
    } else if let Some(path) = &cli.matrix_input {
        correlated = correlated.with_matrix_input(path.clone());
    }

    pipeline
        .add_remover(Box::new(correlated))
        .add_remover(Box::new(
            AlmostConstantFeatureRemover::new(cli.max_count_percent).with_verbose(cli.verbose),
        ))
        .add_transform(Box::new(LogRescaler::new(cli.log_threshold)));

    let initial_features = pipeline.features().all.len();
    let mut summary = SelectionSummary::new(initial_features);

    // Step 3: Removal passes
    println!();
    println!(
        "    {} {} {}",
        style("STEP 1").cyan().bold(),
        style("│").dim(),
        style("Feature Removal").white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());

    let (selected, removed) = pipeline.fit_remove(&df)?;
    println!(
        "      Kept {} of {} features ({} removed)",
        style(selected.len()).green().bold(),
        initial_features,
        style(removed.len()).yellow().bold()
    );

    summary.add_correlation_drops(pipeline.removers()[0].columns_to_remove().to_vec());
    summary.add_constant_drops(pipeline.removers()[1].columns_to_remove().to_vec());

    // Step 4: Transforms over the selected columns
    println!();
    println!(
        "    {} {} {}",
        style("STEP 2").cyan().bold(),
        style("│").dim(),
        style("Log Rescaling").white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());

    pipeline.fit_transform(&mut df)?;
    summary.add_rescaled(pipeline.transforms()[0].fitted_columns().to_vec());

    // Step 5: Persist the run
    println!();
    println!(
        "    {} {} {}",
        style("STEP 3").cyan().bold(),
        style("│").dim(),
        style("Save Pipeline State").white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());

    let run_id = pipeline.save()?;
    println!(
        "      Run {} saved under {}",
        style(&run_id).yellow(),
        pipeline.store().settings_path().display()
    );

    if let Some(output) = &cli.output {
        let spinner = create_spinner("Writing transformed dataset...");
        save_dataset(&mut df, output)?;
        finish_with_success(&spinner, &format!("Saved to {}", output.display()));
    }

    summary.display();

    println!();
    println!(
        "    {} {}",
        style(">>").cyan(),
        style(format!(
            "Chaff selection complete in {:.2}s",
            start.elapsed().as_secs_f64()
        ))
        .green()
        .bold()
    );
    println!();

    Ok(())
}
