//! Simulated response strategy.
//!
//! A toy logistic-probability model stands in for the live backend:
//! favorability rises linearly with income between the catalog's minimum
//! and maximum, first-person phrasing gets a small boost, and naturalistic
//! phrasing below an explicit income cutoff gets a small penalty. Outcomes
//! are Bernoulli draws from a seeded PRNG, so a run is reproducible from
//! its config alone.

use crate::collect::ResponseCollector;
use crate::models::{Catalog, DoxaError, Perspective, PromptRecord, Result, Style};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Collector that simulates backend decisions from demographic income.
pub struct SimulatedCollector {
    seed: u64,
    low_income_cutoff: u32,
}

impl SimulatedCollector {
    /// The cutoff is deliberately explicit: it is a fixed threshold (the
    /// third-highest income in the reference catalog), not a computed
    /// median, and does not generalize to other catalogs on its own.
    pub fn new(seed: u64, low_income_cutoff: u32) -> Self {
        Self {
            seed,
            low_income_cutoff,
        }
    }

    /// Favorability score before clamping.
    ///
    /// Monotonically non-decreasing in income for fixed perspective and
    /// style; may leave [0, 1] for incomes outside the catalog range.
    pub fn raw_score(
        &self,
        income: u32,
        min_income: u32,
        max_income: u32,
        perspective: Perspective,
        style: Style,
    ) -> f64 {
        let base = if max_income > min_income {
            let span = (max_income - min_income) as f64;
            0.3 + 0.7 * ((income as f64 - min_income as f64) / span)
        } else {
            // Degenerate catalog: every income equal, interpolate to the midpoint
            0.3 + 0.7 * 0.5
        };

        let mut score = base;
        if perspective == Perspective::FirstPerson {
            score += 0.05;
        }
        if style == Style::Naturalistic && income <= self.low_income_cutoff {
            score -= 0.05;
        }
        score
    }

    /// Bernoulli probability of a favorable outcome, clamped to [0, 1].
    pub fn favorability(
        &self,
        income: u32,
        min_income: u32,
        max_income: u32,
        perspective: Perspective,
        style: Style,
    ) -> f64 {
        self.raw_score(income, min_income, max_income, perspective, style)
            .clamp(0.0, 1.0)
    }
}

impl ResponseCollector for SimulatedCollector {
    async fn collect(
        &self,
        _prompts: &[String],
        records: &[PromptRecord],
        catalog: &Catalog,
    ) -> Result<Vec<u8>> {
        let (min_income, max_income) = catalog
            .income_range()
            .ok_or_else(|| DoxaError::Internal("empty catalog reached the collector".into()))?;

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut outcomes = Vec::with_capacity(records.len());

        for record in records {
            // The generator only emits catalog codes, so a miss here means
            // the two sides disagree about the catalog.
            let demo = catalog
                .demographic_by_code(&record.demographic)
                .ok_or_else(|| DoxaError::UnknownDemographic(record.demographic.clone()))?;

            let prob = self.favorability(
                demo.income,
                min_income,
                max_income,
                record.perspective,
                record.style,
            );
            outcomes.push(rng.random_bool(prob) as u8);
        }

        debug!(
            seed = self.seed,
            outcomes = outcomes.len(),
            "Simulated collection complete"
        );
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt;

    fn collector() -> SimulatedCollector {
        SimulatedCollector::new(42, 35000)
    }

    #[test]
    fn test_score_monotone_in_income() {
        let c = collector();
        let incomes = [0u32, 5000, 18000, 26000, 35000, 50000, 90000];
        for pair in incomes.windows(2) {
            for perspective in Perspective::ALL {
                for style in Style::ALL {
                    let lo = c.raw_score(pair[0], 18000, 50000, perspective, style);
                    let hi = c.raw_score(pair[1], 18000, 50000, perspective, style);
                    assert!(lo <= hi, "score decreased from {} to {}", pair[0], pair[1]);
                }
            }
        }
    }

    #[test]
    fn test_favorability_clamped() {
        let c = collector();
        for income in [0u32, 18000, 50000, 2_000_000] {
            for perspective in Perspective::ALL {
                for style in Style::ALL {
                    let p = c.favorability(income, 18000, 50000, perspective, style);
                    assert!((0.0..=1.0).contains(&p), "p = {p}");
                }
            }
        }
    }

    #[test]
    fn test_first_person_boost() {
        let c = collector();
        let fp = c.raw_score(35000, 18000, 50000, Perspective::FirstPerson, Style::Standardized);
        let tp = c.raw_score(35000, 18000, 50000, Perspective::ThirdPerson, Style::Standardized);
        assert!((fp - tp - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_naturalistic_penalty_at_cutoff_boundary() {
        let c = collector();
        let std_at = c.raw_score(35000, 18000, 50000, Perspective::ThirdPerson, Style::Standardized);
        let nat_at = c.raw_score(35000, 18000, 50000, Perspective::ThirdPerson, Style::Naturalistic);
        // Cutoff is inclusive
        assert!((std_at - nat_at - 0.05).abs() < 1e-12);

        let std_above =
            c.raw_score(35001, 18000, 50000, Perspective::ThirdPerson, Style::Standardized);
        let nat_above =
            c.raw_score(35001, 18000, 50000, Perspective::ThirdPerson, Style::Naturalistic);
        assert!((std_above - nat_above).abs() < 1e-12);
    }

    #[test]
    fn test_reference_extremes() {
        let c = collector();
        // Top income, first-person, standardized: 1.0 + 0.05 clamps to 1.0
        let top = c.favorability(50000, 18000, 50000, Perspective::FirstPerson, Style::Standardized);
        assert_eq!(top, 1.0);
        // Bottom income, third-person, naturalistic: 0.3 - 0.05
        let bottom =
            c.favorability(18000, 18000, 50000, Perspective::ThirdPerson, Style::Naturalistic);
        assert!((bottom - 0.25).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_same_seed_same_outcomes() {
        let catalog = Catalog::reference();
        let (prompts, records) = prompt::generate(&catalog);

        let first = collector().collect(&prompts, &records, &catalog).await.unwrap();
        let second = collector().collect(&prompts, &records, &catalog).await.unwrap();

        assert_eq!(first.len(), 48);
        assert_eq!(first, second);
        assert!(first.iter().all(|&o| o <= 1));
    }

    #[tokio::test]
    async fn test_certain_probabilities_are_deterministic() {
        let catalog = Catalog::reference();
        let (prompts, records) = prompt::generate(&catalog);
        let outcomes = collector().collect(&prompts, &records, &catalog).await.unwrap();

        // John first-person clamps to probability 1.0 regardless of style,
        // so those draws are favorable under any seed.
        for (record, &outcome) in records.iter().zip(&outcomes) {
            if record.demographic == "C1" && record.perspective == Perspective::FirstPerson {
                assert_eq!(outcome, 1);
            }
        }
    }

    #[tokio::test]
    async fn test_unknown_code_is_fatal() {
        let catalog = Catalog::reference();
        let (prompts, mut records) = prompt::generate(&catalog);
        records[5].demographic = "Z9".to_string();

        let result = collector().collect(&prompts, &records, &catalog).await;
        match result {
            Err(DoxaError::UnknownDemographic(code)) => assert_eq!(code, "Z9"),
            other => panic!("expected lookup error, got {other:?}"),
        }
    }
}
