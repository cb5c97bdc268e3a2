//! Record and matrix types flowing through the audit pipeline.
//!
//! The contract running through all of these: index i of every sequence
//! describes the same prompt. Prompts, metadata records, and outcomes stay
//! aligned from generation through reshape, and the reshape assumes the
//! generation ordering (demographic outer, then item, then perspective,
//! then style innermost).

use crate::models::{Catalog, DoxaError, Perspective, Result, Style};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Metadata for one generated prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptRecord {
    /// Demographic code (join key into the catalog)
    pub demographic: String,

    /// Demographic display name
    pub name: String,

    /// Narrative voice used
    pub perspective: Perspective,

    /// Phrasing register used
    pub style: Style,

    /// Decision item text
    pub item: String,

    /// Rendered prompt
    pub prompt: String,
}

/// A prompt record extended with its binary outcome.
///
/// Field order here is the column order of the persisted table; the
/// reporting collaborator consumes these exact column names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub demographic: String,
    pub name: String,
    pub perspective: Perspective,
    pub style: Style,
    pub item: String,
    /// 0 = unfavorable, 1 = favorable
    pub response: u8,
}

impl ResponseRecord {
    /// Attach an outcome to a prompt record.
    pub fn from_prompt(record: &PromptRecord, outcome: u8) -> Self {
        Self {
            demographic: record.demographic.clone(),
            name: record.name.clone(),
            perspective: record.perspective,
            style: record.style,
            item: record.item.clone(),
            response: outcome,
        }
    }
}

/// Label for one response-matrix column: an (item, perspective, style)
/// combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLabel {
    /// Zero-based index into the catalog item list
    pub item_index: usize,
    pub perspective: Perspective,
    pub style: Style,
}

impl fmt::Display for ColumnLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "item{}:{}:{}",
            self.item_index + 1,
            self.perspective,
            self.style
        )
    }
}

/// Column labels for a catalog with `n_items` items, in generation order.
pub fn column_labels(n_items: usize) -> Vec<ColumnLabel> {
    let mut labels = Vec::with_capacity(n_items * Perspective::ALL.len() * Style::ALL.len());
    for item_index in 0..n_items {
        for perspective in Perspective::ALL {
            for style in Style::ALL {
                labels.push(ColumnLabel {
                    item_index,
                    perspective,
                    style,
                });
            }
        }
    }
    labels
}

/// Binary response matrix: rows = demographics in catalog order, columns =
/// (item, perspective, style) combinations in generation order.
///
/// This is the sole artifact handed to the external fitting service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMatrix {
    row_labels: Vec<String>,
    col_labels: Vec<ColumnLabel>,
    /// Row-major cells, each exactly 0 or 1
    data: Vec<u8>,
}

impl ResponseMatrix {
    /// Reshape a flat, order-aligned outcome sequence into demographic rows.
    ///
    /// The outcome count must divide evenly into the row count, and the
    /// resulting width must match the column labels; anything else means
    /// the generator and collector disagreed and the run must not proceed.
    pub fn assemble(
        outcomes: Vec<u8>,
        row_labels: Vec<String>,
        col_labels: Vec<ColumnLabel>,
    ) -> Result<Self> {
        let rows = row_labels.len();
        if rows == 0 || outcomes.len() % rows != 0 {
            return Err(DoxaError::MatrixShape {
                count: outcomes.len(),
                rows,
            });
        }

        let width = outcomes.len() / rows;
        if width != col_labels.len() {
            return Err(DoxaError::Internal(format!(
                "matrix width {} does not match {} column labels",
                width,
                col_labels.len()
            )));
        }

        if let Some(cell) = outcomes.iter().find(|&&c| c > 1) {
            return Err(DoxaError::Internal(format!(
                "matrix cell {cell} is not a binary outcome"
            )));
        }

        Ok(Self {
            row_labels,
            col_labels,
            data: outcomes,
        })
    }

    /// Assemble directly from a catalog and the outcome sequence it produced.
    pub fn from_catalog(catalog: &Catalog, outcomes: Vec<u8>) -> Result<Self> {
        let row_labels = catalog.demographics.iter().map(|d| d.code.clone()).collect();
        Self::assemble(outcomes, row_labels, column_labels(catalog.items.len()))
    }

    pub fn n_rows(&self) -> usize {
        self.row_labels.len()
    }

    pub fn n_cols(&self) -> usize {
        self.col_labels.len()
    }

    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    pub fn col_labels(&self) -> &[ColumnLabel] {
        &self.col_labels
    }

    /// One demographic's responses across all columns, in generation order.
    pub fn row(&self, i: usize) -> &[u8] {
        let width = self.n_cols();
        &self.data[i * width..(i + 1) * width]
    }

    /// Fraction of favorable responses in row `i`.
    pub fn row_favorable_rate(&self, i: usize) -> f64 {
        let row = self.row(i);
        row.iter().map(|&c| c as usize).sum::<usize>() as f64 / row.len() as f64
    }
}

/// Posterior estimate for a single latent parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Estimate {
    /// Row or column label this estimate belongs to
    pub label: String,
    pub mean: f64,
    pub sd: f64,
    pub hdi_low: f64,
    pub hdi_high: f64,
}

/// Posterior summary returned by the external Rasch fitting service.
///
/// Opaque to the pipeline beyond label-keyed access: theta per demographic
/// row, difficulty b per matrix column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosteriorSummary {
    /// Latent per-demographic bias estimates
    pub theta: Vec<Estimate>,

    /// Per-column item difficulty estimates
    pub b: Vec<Estimate>,
}

impl PosteriorSummary {
    pub fn theta_for(&self, label: &str) -> Option<&Estimate> {
        self.theta.iter().find(|e| e.label == label)
    }

    pub fn difficulty_for(&self, label: &str) -> Option<&Estimate> {
        self.b.iter().find(|e| e.label == label)
    }
}

/// Statistics for one audit run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    /// Run identifier, stamped on the matrix payload
    pub run_id: String,

    pub started_at: DateTime<Utc>,

    /// Total prompts generated and collected
    pub total_prompts: usize,

    pub favorable: usize,
    pub unfavorable: usize,

    /// favorable / total
    pub favorable_rate: f64,

    /// Whether the external fit ran
    pub fitted: bool,

    pub runtime_secs: f64,
}

impl RunStats {
    pub fn new(run_id: String) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            total_prompts: 0,
            favorable: 0,
            unfavorable: 0,
            favorable_rate: 0.0,
            fitted: false,
            runtime_secs: 0.0,
        }
    }

    /// Calculate derived stats.
    pub fn finalize(&mut self) {
        if self.total_prompts > 0 {
            self.favorable_rate = self.favorable as f64 / self.total_prompts as f64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_labels_generation_order() {
        let labels = column_labels(3);
        assert_eq!(labels.len(), 12);
        assert_eq!(labels[0].to_string(), "item1:first-person:standardized");
        assert_eq!(labels[1].to_string(), "item1:first-person:naturalistic");
        assert_eq!(labels[2].to_string(), "item1:third-person:standardized");
        assert_eq!(labels[3].to_string(), "item1:third-person:naturalistic");
        assert_eq!(labels[4].to_string(), "item2:first-person:standardized");
        assert_eq!(labels[11].to_string(), "item3:third-person:naturalistic");
    }

    #[test]
    fn test_assemble_reference_shape() {
        let catalog = Catalog::reference();
        let outcomes = vec![1u8; 48];
        let matrix = ResponseMatrix::from_catalog(&catalog, outcomes).unwrap();
        assert_eq!(matrix.n_rows(), 4);
        assert_eq!(matrix.n_cols(), 12);
        assert_eq!(matrix.row_labels()[0], "C1");
        assert_eq!(matrix.row(3).len(), 12);
        assert_eq!(matrix.row_favorable_rate(0), 1.0);
    }

    #[test]
    fn test_assemble_rejects_non_divisible() {
        let rows = vec!["C1".into(), "C2".into(), "D1".into(), "D2".into()];
        let result = ResponseMatrix::assemble(vec![0u8; 10], rows, column_labels(3));
        match result {
            Err(DoxaError::MatrixShape { count, rows }) => {
                assert_eq!(count, 10);
                assert_eq!(rows, 4);
            }
            other => panic!("expected shape error, got {other:?}"),
        }
    }

    #[test]
    fn test_assemble_rejects_non_binary_cell() {
        let catalog = Catalog::reference();
        let mut outcomes = vec![0u8; 48];
        outcomes[7] = 2;
        assert!(ResponseMatrix::from_catalog(&catalog, outcomes).is_err());
    }

    #[test]
    fn test_row_slices_preserve_order() {
        let rows = vec!["a".to_string(), "b".to_string()];
        let cols = column_labels(1); // 4 columns
        let outcomes = vec![1, 0, 0, 1, 0, 1, 1, 0];
        let matrix = ResponseMatrix::assemble(outcomes, rows, cols).unwrap();
        assert_eq!(matrix.row(0), &[1, 0, 0, 1]);
        assert_eq!(matrix.row(1), &[0, 1, 1, 0]);
        assert_eq!(matrix.row_favorable_rate(1), 0.5);
    }

    #[test]
    fn test_posterior_summary_label_access() {
        let json = r#"{
            "theta": [
                {"label": "C1", "mean": 1.02, "sd": 0.61, "hdi_low": -0.1, "hdi_high": 2.2},
                {"label": "D2", "mean": -0.74, "sd": 0.58, "hdi_low": -1.9, "hdi_high": 0.3}
            ],
            "b": [
                {"label": "item1:first-person:standardized", "mean": 0.11, "sd": 0.8, "hdi_low": -1.4, "hdi_high": 1.6}
            ]
        }"#;
        let summary: PosteriorSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.theta_for("D2").unwrap().mean, -0.74);
        assert!(summary.theta_for("Z9").is_none());
        assert!(summary
            .difficulty_for("item1:first-person:standardized")
            .is_some());
    }
}
