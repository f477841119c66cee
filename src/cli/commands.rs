use crate::cli::args::{Cli, Commands};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::{CensusRecord, CorrespondenceRecord, PollutantObservation, PopulationRecord};
use crate::pipeline::Pipeline;
use crate::readers::TableReader;
use crate::stages::normalize_headers;
use crate::utils::constants::{CENSUS_RENAMES, POPULATION_RENAMES};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use validator::Validate;

pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Run {
            data_dir,
            output_dir,
            quiet,
        } => {
            let config = match output_dir {
                Some(out) => PipelineConfig::new(data_dir, out),
                None => PipelineConfig::in_dir(data_dir),
            };
            tracing::info!(
                "running pipeline: data {} -> output {}",
                config.data_dir.display(),
                config.output_dir.display()
            );

            let summary = Pipeline::new(config.clone()).with_silent(quiet).run()?;

            println!("\n{}", summary.summary());
            println!(
                "Final table ({} rows) written to {}",
                summary.final_rows(),
                config.final_path().display()
            );
        }

        Commands::Validate { data_dir } => {
            let config = PipelineConfig::in_dir(data_dir);
            validate_inputs(&config)?;
            println!("All inputs loadable and schema-complete");
        }
    }

    Ok(())
}

/// Load every source file and run the per-stage schema checks without
/// transforming or writing anything.
fn validate_inputs(config: &PipelineConfig) -> Result<()> {
    let mut table = TableReader::latin1()
        .with_delimiter(b';')
        .read(&config.correspondence_path())?;
    normalize_headers(&mut table, &[]);
    let correspondence = CorrespondenceRecord::from_table(&table)?;
    for record in &correspondence {
        record.validate()?;
    }
    println!(
        "{}: {} row(s), {} skipped",
        config.correspondence_path().display(),
        correspondence.len(),
        table.skipped_rows
    );

    let mut table = TableReader::latin1().read(&config.population_path())?;
    normalize_headers(&mut table, POPULATION_RENAMES);
    let population = PopulationRecord::from_table(&table)?;
    println!(
        "{}: {} row(s), {} skipped",
        config.population_path().display(),
        population.len(),
        table.skipped_rows
    );

    let mut table = TableReader::latin1().read(&config.census_path())?;
    normalize_headers(&mut table, CENSUS_RENAMES);
    let census = CensusRecord::from_table(&table)?;
    println!(
        "{}: {} row(s), {} skipped",
        config.census_path().display(),
        census.len(),
        table.skipped_rows
    );

    let mut table = TableReader::utf8().read(&config.pollutants_path())?;
    normalize_headers(&mut table, &[]);
    let observations = PollutantObservation::from_table(&table)?;
    let missing_timestamps = observations
        .iter()
        .filter(|o| o.last_updated.is_none())
        .count();
    println!(
        "{}: {} row(s), {} skipped, {} without timestamp",
        config.pollutants_path().display(),
        observations.len(),
        table.skipped_rows,
        missing_timestamps
    );

    Ok(())
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let stdout_layer = fmt::layer()
        .with_target(false)
        .compact()
        .with_filter(level);

    let file_layer = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            Some(
                fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false)
                    .with_target(false)
                    .with_filter(LevelFilter::DEBUG),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(())
}
