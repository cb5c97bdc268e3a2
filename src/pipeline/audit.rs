//! Audit pipeline.
//!
//! Pipeline flow:
//! Catalog → Prompt Generator → Response Collector → Response Matrix
//!         → response table (CSV) + matrix payload (JSON)
//!         → external Rasch fit → posterior summary report
//!
//! Persistence happens only after the matrix assembles cleanly; a failed
//! collection or reshape leaves no artifacts behind.

use crate::collect::ResponseCollector;
use crate::fit::{FittingService, HttpFittingService, MatrixPayload};
use crate::models::{
    AuditConfig, DoxaError, PosteriorSummary, ResponseMatrix, ResponseRecord, Result, RunStats,
};
use crate::prompt;
use std::fs;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

/// Drives one audit run end to end.
#[derive(Debug)]
pub struct AuditPipeline {
    config: AuditConfig,
}

impl AuditPipeline {
    /// Create a pipeline, validating the catalog up front.
    ///
    /// Catalog problems are configuration errors and must surface here,
    /// before any prompt is generated or any external call is made.
    pub fn new(config: AuditConfig) -> Result<Self> {
        config.catalog.validate()?;
        Ok(Self { config })
    }

    /// Run the full audit with the given collection strategy.
    pub async fn run<C: ResponseCollector>(&self, collector: &C) -> Result<RunStats> {
        let start = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        let mut stats = RunStats::new(run_id.clone());

        let catalog = &self.config.catalog;
        let (prompts, records) = prompt::generate(catalog);
        stats.total_prompts = prompts.len();

        info!(
            run_id = %run_id,
            demographics = catalog.demographics.len(),
            items = catalog.items.len(),
            prompts = prompts.len(),
            "Generated prompt batch"
        );

        let outcomes = collector.collect(&prompts, &records, catalog).await?;
        if outcomes.len() != prompts.len() {
            return Err(DoxaError::Internal(format!(
                "collector returned {} outcomes for {} prompts",
                outcomes.len(),
                prompts.len()
            )));
        }

        stats.favorable = outcomes.iter().filter(|&&o| o == 1).count();
        stats.unfavorable = stats.total_prompts - stats.favorable;

        // Reshape before anything is written: a shape failure aborts the
        // run with no partial artifacts on disk.
        let matrix = ResponseMatrix::from_catalog(catalog, outcomes.clone())?;

        let response_records: Vec<ResponseRecord> = records
            .iter()
            .zip(&outcomes)
            .map(|(record, &outcome)| ResponseRecord::from_prompt(record, outcome))
            .collect();

        self.write_table(&response_records)?;
        self.write_matrix(&matrix, &run_id)?;

        let summary = match &self.config.fitting.endpoint_url {
            Some(url) => {
                let service =
                    HttpFittingService::new(url.clone(), self.config.fitting.timeout_secs)?;
                let summary = service.fit(&matrix, &run_id).await?;
                stats.fitted = true;
                Some(summary)
            }
            None => {
                info!("No fitting endpoint configured; stopping at table and matrix artifacts");
                None
            }
        };

        self.report(&matrix, summary.as_ref());

        stats.runtime_secs = start.elapsed().as_secs_f64();
        stats.finalize();

        info!(
            run_id = %run_id,
            favorable = stats.favorable,
            unfavorable = stats.unfavorable,
            fitted = stats.fitted,
            runtime_secs = format!("{:.1}", stats.runtime_secs),
            "Audit run complete"
        );

        Ok(stats)
    }

    /// Write the response table: one row per record, fixed column names
    /// that the reporting collaborator consumes.
    fn write_table(&self, records: &[ResponseRecord]) -> Result<()> {
        let path = &self.config.output.table_path;
        ensure_parent_dir(path)?;

        let mut writer = csv::Writer::from_path(path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer
            .flush()
            .map_err(|e| DoxaError::io("flushing response table", e))?;

        info!(path = %path.display(), rows = records.len(), "Wrote response table");
        Ok(())
    }

    /// Write the labeled matrix payload handed to the fitting service.
    fn write_matrix(&self, matrix: &ResponseMatrix, run_id: &str) -> Result<()> {
        let path = &self.config.output.matrix_path;
        ensure_parent_dir(path)?;

        let payload = MatrixPayload::from_matrix(matrix, run_id);
        let json = serde_json::to_string_pretty(&payload)
            .map_err(|e| DoxaError::Internal(format!("serializing matrix payload: {e}")))?;
        fs::write(path, json).map_err(|e| DoxaError::io("writing matrix payload", e))?;

        info!(
            path = %path.display(),
            rows = matrix.n_rows(),
            cols = matrix.n_cols(),
            "Wrote matrix payload"
        );
        Ok(())
    }

    /// Print the response matrix and, when the fit ran, the posterior
    /// estimates per label.
    fn report(&self, matrix: &ResponseMatrix, summary: Option<&PosteriorSummary>) {
        println!("\nResponse matrix (1 = favorable, 0 = unfavorable):");
        for (i, code) in matrix.row_labels().iter().enumerate() {
            let cells: Vec<String> = matrix.row(i).iter().map(|c| c.to_string()).collect();
            println!(
                "  {:<4} [{}]  rate {:.2}",
                code,
                cells.join(" "),
                matrix.row_favorable_rate(i)
            );
        }

        let Some(summary) = summary else {
            return;
        };

        println!("\nLatent bias (theta) per demographic:");
        for code in matrix.row_labels() {
            if let Some(est) = summary.theta_for(code) {
                println!(
                    "  {:<4} mean {:>6.2}  sd {:>5.2}  hdi [{:.2}, {:.2}]",
                    code, est.mean, est.sd, est.hdi_low, est.hdi_high
                );
            }
        }

        println!("\nItem difficulty (b) per column:");
        for col in matrix.col_labels() {
            let label = col.to_string();
            if let Some(est) = summary.difficulty_for(&label) {
                println!(
                    "  {:<40} mean {:>6.2}  sd {:>5.2}  hdi [{:.2}, {:.2}]",
                    label, est.mean, est.sd, est.hdi_low, est.hdi_high
                );
            }
        }
    }
}

fn ensure_parent_dir(path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| DoxaError::io(format!("creating {}", parent.display()), e))?;
        }
    }
    Ok(())
}
