use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::{
    CensusRecord, CityRecord, CleanedReading, CorrespondenceRecord, PollutantObservation,
    PopulationBase, PopulationRecord,
};
use crate::readers::{RawTable, TableReader};
use crate::stages::{
    apply_overrides, enrich_with_census, join_pollution_population, normalize_headers,
    PollutantReshaper, PopulationJoiner,
};
use crate::utils::constants::{CENSUS_RENAMES, CITY_OVERRIDES, POPULATION_RENAMES, POSTAL_POPULATION_OVERRIDES};
use crate::utils::ProgressReporter;
use crate::writers::CsvWriter;
use std::path::Path;

/// Row accounting for one pipeline stage.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub name: &'static str,
    pub rows_in: usize,
    pub rows_out: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineSummary {
    pub stages: Vec<StageReport>,
}

impl PipelineSummary {
    fn record(&mut self, name: &'static str, rows_in: usize, rows_out: usize, skipped: usize) {
        tracing::info!(
            "stage '{}': {} row(s) in, {} out, {} skipped",
            name,
            rows_in,
            rows_out,
            skipped
        );
        self.stages.push(StageReport {
            name,
            rows_in,
            rows_out,
            skipped,
        });
    }

    pub fn final_rows(&self) -> usize {
        self.stages.last().map(|s| s.rows_out).unwrap_or(0)
    }

    pub fn summary(&self) -> String {
        let mut out = String::from("Pipeline Summary\n================\n");
        for stage in &self.stages {
            out.push_str(&format!(
                "{:<22} {:>8} in {:>8} out {:>6} skipped\n",
                stage.name, stage.rows_in, stage.rows_out, stage.skipped
            ));
        }
        out
    }
}

/// Sequential, checkpointed runner: every stage loads its inputs from disk,
/// transforms them, and persists its output before the next stage starts.
/// A failure leaves the earlier checkpoints in place for inspection.
pub struct Pipeline {
    config: PipelineConfig,
    silent: bool,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            silent: false,
        }
    }

    /// Suppress progress spinners (tests, non-interactive runs).
    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn run(&self) -> Result<PipelineSummary> {
        self.config.ensure_output_dir()?;
        let mut summary = PipelineSummary::default();

        self.run_population_join(&mut summary)?;
        self.run_reshape(&mut summary)?;
        self.run_pollution_join(&mut summary)?;
        self.run_census_enrichment(&mut summary)?;
        self.run_overrides(&mut summary)?;

        Ok(summary)
    }

    fn run_population_join(&self, summary: &mut PipelineSummary) -> Result<()> {
        const STAGE: &str = "population join";
        let progress = ProgressReporter::new_spinner("Joining correspondence and census...", self.silent);

        let result = (|| {
            let corr_table = self.load(
                TableReader::latin1().with_delimiter(b';'),
                &self.config.correspondence_path(),
                &[],
            )?;
            let pop_table = self.load(
                TableReader::latin1(),
                &self.config.population_path(),
                POPULATION_RENAMES,
            )?;
            let skipped = corr_table.skipped_rows + pop_table.skipped_rows;

            let correspondence = CorrespondenceRecord::from_table(&corr_table)?;
            let population = PopulationRecord::from_table(&pop_table)?;
            let rows_in = correspondence.len() + population.len();

            let base = PopulationJoiner::new().join(correspondence, population)?;
            CsvWriter::new().write_records(&base, &self.config.population_base_path())?;

            summary.record(STAGE, rows_in, base.len(), skipped);
            Ok(base.len())
        })();

        self.finish_stage(STAGE, &progress, result)
    }

    fn run_reshape(&self, summary: &mut PipelineSummary) -> Result<()> {
        const STAGE: &str = "pollutant reshape";
        let progress =
            ProgressReporter::new_spinner("Pivoting and interpolating pollutant readings...", self.silent);

        let result = (|| {
            let table = self.load(TableReader::utf8(), &self.config.pollutants_path(), &[])?;
            let skipped = table.skipped_rows;

            let observations = PollutantObservation::from_table(&table)?;
            let rows_in = observations.len();

            let cleaned = PollutantReshaper::new().reshape_and_interpolate(observations)?;
            CsvWriter::new().write_records(&cleaned, &self.config.pollutants_cleaned_path())?;

            summary.record(STAGE, rows_in, cleaned.len(), skipped);
            Ok(cleaned.len())
        })();

        self.finish_stage(STAGE, &progress, result)
    }

    fn run_pollution_join(&self, summary: &mut PipelineSummary) -> Result<()> {
        const STAGE: &str = "pollution join";
        let progress =
            ProgressReporter::new_spinner("Linking pollutant readings to communes...", self.silent);

        let result = (|| {
            let readings_table =
                self.load(TableReader::utf8(), &self.config.pollutants_cleaned_path(), &[])?;
            let base_table =
                self.load(TableReader::utf8(), &self.config.population_base_path(), &[])?;

            let readings = CleanedReading::from_table(&readings_table)?;
            let base = PopulationBase::from_table(&base_table)?;
            let rows_in = readings.len();

            let joined = join_pollution_population(readings, base);
            CsvWriter::new().write_records(&joined, &self.config.pollution_population_path())?;

            summary.record(STAGE, rows_in, joined.len(), 0);
            Ok(joined.len())
        })();

        self.finish_stage(STAGE, &progress, result)
    }

    fn run_census_enrichment(&self, summary: &mut PipelineSummary) -> Result<()> {
        const STAGE: &str = "census enrichment";
        let progress =
            ProgressReporter::new_spinner("Attaching the newer census vintage...", self.silent);

        let result = (|| {
            let city_table = self.load(
                TableReader::utf8(),
                &self.config.pollution_population_path(),
                &[],
            )?;
            let census_table = self.load(
                TableReader::latin1(),
                &self.config.census_path(),
                CENSUS_RENAMES,
            )?;

            let cities = crate::models::CityPollution::from_table(&city_table)?;
            let census = CensusRecord::from_table(&census_table)?;
            let rows_in = cities.len();

            let enriched = enrich_with_census(cities, census);
            CsvWriter::new().write_records(&enriched, &self.config.census_enriched_path())?;

            summary.record(STAGE, rows_in, enriched.len(), 0);
            Ok(enriched.len())
        })();

        self.finish_stage(STAGE, &progress, result)
    }

    fn run_overrides(&self, summary: &mut PipelineSummary) -> Result<()> {
        const STAGE: &str = "overrides";
        let progress = ProgressReporter::new_spinner("Applying fixed corrections...", self.silent);

        let result = (|| {
            let table = self.load(TableReader::utf8(), &self.config.census_enriched_path(), &[])?;
            let mut records = CityRecord::from_table(&table)?;
            let rows_in = records.len();

            apply_overrides(&mut records, POSTAL_POPULATION_OVERRIDES, CITY_OVERRIDES);
            CsvWriter::new().write_records(&records, &self.config.final_path())?;

            summary.record(STAGE, rows_in, records.len(), 0);
            Ok(records.len())
        })();

        self.finish_stage(STAGE, &progress, result)
    }

    fn load(
        &self,
        reader: TableReader,
        path: &Path,
        renames: &[(&str, &str)],
    ) -> Result<RawTable> {
        let mut table = reader.read(path)?;
        normalize_headers(&mut table, renames);
        Ok(table)
    }

    fn finish_stage(
        &self,
        stage: &str,
        progress: &ProgressReporter,
        result: Result<usize>,
    ) -> Result<()> {
        match result {
            Ok(rows) => {
                progress.finish_with_message(&format!("{stage}: {rows} row(s)"));
                Ok(())
            }
            Err(e) => {
                tracing::error!("stage '{stage}' failed: {e}");
                progress.finish_with_message(&format!("{stage}: failed"));
                Err(e)
            }
        }
    }
}
