//! Wire format and transport for the external IRT fitting collaborator.
//!
//! The fit itself (priors, MCMC, convergence) is someone else's job. This
//! side only serializes the labeled matrix row-major, posts it, and reads
//! back two label-keyed estimate vectors. Fit errors are surfaced as-is,
//! never retried or reinterpreted.

use crate::models::{DoxaError, PosteriorSummary, ResponseMatrix, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Labeled response matrix as sent to the fitting service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixPayload {
    /// Audit run identifier
    pub run_id: String,

    pub generated_at: DateTime<Utc>,

    /// Row labels: demographic codes, catalog order
    pub rows: Vec<String>,

    /// Column labels: item/perspective/style combinations, generation order
    pub cols: Vec<String>,

    /// Cells in row-major order, one inner vector per demographic
    pub data: Vec<Vec<u8>>,
}

impl MatrixPayload {
    pub fn from_matrix(matrix: &ResponseMatrix, run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            generated_at: Utc::now(),
            rows: matrix.row_labels().to_vec(),
            cols: matrix.col_labels().iter().map(|c| c.to_string()).collect(),
            data: (0..matrix.n_rows()).map(|i| matrix.row(i).to_vec()).collect(),
        }
    }
}

/// Fits a Rasch model to a response matrix.
#[allow(async_fn_in_trait)]
pub trait FittingService {
    async fn fit(&self, matrix: &ResponseMatrix, run_id: &str) -> Result<PosteriorSummary>;
}

/// Fitting service reached over HTTP.
pub struct HttpFittingService {
    client: reqwest::Client,
    endpoint_url: String,
}

impl HttpFittingService {
    pub fn new(endpoint_url: String, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(DoxaError::Network)?;

        Ok(Self {
            client,
            endpoint_url,
        })
    }
}

impl FittingService for HttpFittingService {
    async fn fit(&self, matrix: &ResponseMatrix, run_id: &str) -> Result<PosteriorSummary> {
        let payload = MatrixPayload::from_matrix(matrix, run_id);

        info!(
            endpoint = %self.endpoint_url,
            rows = matrix.n_rows(),
            cols = matrix.n_cols(),
            "Submitting matrix for Rasch fit"
        );

        let response = self
            .client
            .post(&self.endpoint_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DoxaError::Fitting(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DoxaError::Fitting(format!(
                "fit failed (status {status}): {body}"
            )));
        }

        let summary: PosteriorSummary = response
            .json()
            .await
            .map_err(|e| DoxaError::Fitting(format!("invalid posterior summary: {e}")))?;

        validate_summary(&summary, matrix)?;
        Ok(summary)
    }
}

/// Check that the summary covers every matrix row and column by label.
pub fn validate_summary(summary: &PosteriorSummary, matrix: &ResponseMatrix) -> Result<()> {
    for row in matrix.row_labels() {
        if summary.theta_for(row).is_none() {
            return Err(DoxaError::Fitting(format!(
                "summary is missing theta estimate for '{row}'"
            )));
        }
    }

    for col in matrix.col_labels() {
        let label = col.to_string();
        if summary.difficulty_for(&label).is_none() {
            return Err(DoxaError::Fitting(format!(
                "summary is missing difficulty estimate for '{label}'"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Catalog, Estimate};

    fn reference_matrix() -> ResponseMatrix {
        let catalog = Catalog::reference();
        ResponseMatrix::from_catalog(&catalog, vec![1u8; 48]).unwrap()
    }

    #[test]
    fn test_payload_is_row_major_and_labeled() {
        let matrix = reference_matrix();
        let payload = MatrixPayload::from_matrix(&matrix, "run-1");

        assert_eq!(payload.rows, vec!["C1", "C2", "D1", "D2"]);
        assert_eq!(payload.cols.len(), 12);
        assert_eq!(payload.cols[0], "item1:first-person:standardized");
        assert_eq!(payload.data.len(), 4);
        assert!(payload.data.iter().all(|row| row.len() == 12));

        // Round-trips through JSON with labels intact
        let json = serde_json::to_string(&payload).unwrap();
        let back: MatrixPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back.rows, payload.rows);
        assert_eq!(back.data, payload.data);
    }

    #[test]
    fn test_summary_validation_catches_missing_labels() {
        let matrix = reference_matrix();

        let estimate = |label: &str| Estimate {
            label: label.to_string(),
            mean: 0.0,
            sd: 1.0,
            hdi_low: -1.9,
            hdi_high: 1.9,
        };

        let mut summary = PosteriorSummary {
            theta: matrix.row_labels().iter().map(|l| estimate(l)).collect(),
            b: matrix
                .col_labels()
                .iter()
                .map(|c| estimate(&c.to_string()))
                .collect(),
        };
        assert!(validate_summary(&summary, &matrix).is_ok());

        summary.theta.remove(2);
        assert!(validate_summary(&summary, &matrix).is_err());
    }
}
