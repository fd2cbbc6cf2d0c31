use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FundPairError;
use crate::returns::dataset::Dataset;
use crate::returns::matrix::{build_return_matrix, default_time_column, ReturnMatrix};
use crate::statistics::{self, sqrt_decimal, StatisticsRecord};
use crate::types::{with_metadata, ComputationOutput, Rate};
use crate::FundPairResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Per-fund statistics and the dense covariance matrix of one dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundUniverse {
    pub funds: Vec<String>,
    pub statistics: Vec<StatisticsRecord>,
    /// Symmetric; entry `[i][j]` is computed over the periods where both
    /// funds have an observation, the diagonal is each fund's variance.
    /// `None` for a pair with no shared period.
    pub covariance: Vec<Vec<Option<Rate>>>,
}

/// Input for the per-fund summary table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundSummaryInput {
    pub dataset: Dataset,
    #[serde(default = "default_time_column")]
    pub time_column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundSummary {
    pub fund: String,
    pub observations: usize,
    pub missing: usize,
    pub mean: Rate,
    pub variance: Rate,
    pub std_dev: Rate,
    /// Mean over standard deviation; `None` when the fund has no variance.
    pub sharpe_ratio: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundSummaryOutput {
    pub periods: usize,
    pub funds: Vec<FundSummary>,
    pub covariance_matrix: Vec<Vec<Option<Rate>>>,
    pub correlation_matrix: Vec<Vec<Option<Decimal>>>,
}

// ---------------------------------------------------------------------------
// Universe construction
// ---------------------------------------------------------------------------

impl FundUniverse {
    #[allow(clippy::needless_range_loop)]
    pub fn from_matrix(matrix: &ReturnMatrix) -> FundPairResult<Self> {
        let n = matrix.funds.len();
        let statistics = (0..n)
            .map(|i| StatisticsRecord::from_series(&matrix.series_at(i)))
            .collect::<FundPairResult<Vec<_>>>()?;

        let mut covariance = vec![vec![None; n]; n];
        for i in 0..n {
            covariance[i][i] = Some(statistics[i].variance);
            for j in (i + 1)..n {
                let cov = pair_covariance(matrix, i, j)?;
                covariance[i][j] = cov;
                covariance[j][i] = cov;
            }
        }

        Ok(FundUniverse {
            funds: matrix.funds.clone(),
            statistics,
            covariance,
        })
    }

    /// Build the matrix and universe in one step, recording data-quality
    /// warnings for dropped rows, incomplete funds and pairs of funds that
    /// never overlap.
    pub fn from_dataset(
        dataset: &Dataset,
        time_column: &str,
        warnings: &mut Vec<String>,
    ) -> FundPairResult<(ReturnMatrix, Self)> {
        let matrix = build_return_matrix(dataset, time_column)?;
        if matrix.dropped_rows > 0 {
            warnings.push(format!(
                "{} row(s) dropped for a missing '{}' label",
                matrix.dropped_rows, time_column
            ));
        }
        for (i, fund) in matrix.funds.iter().enumerate() {
            let missing = matrix.missing_at(i);
            if missing > 0 {
                warnings.push(format!(
                    "{}: {} of {} periods have no numeric value",
                    fund,
                    missing,
                    matrix.period_count()
                ));
            }
        }
        let universe = FundUniverse::from_matrix(&matrix)?;
        for i in 0..universe.len() {
            for j in (i + 1)..universe.len() {
                if universe.covariance[i][j].is_none() {
                    warnings.push(format!(
                        "{} and {} share no period with values; their covariance is undefined",
                        universe.funds[i], universe.funds[j]
                    ));
                }
            }
        }
        Ok((matrix, universe))
    }

    pub fn len(&self) -> usize {
        self.funds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funds.is_empty()
    }

    pub fn fund_index(&self, fund: &str) -> Option<usize> {
        self.funds.iter().position(|f| f == fund)
    }

    /// Index of a fund the caller named, as an `InvalidInput` on `field` when
    /// it is not part of the dataset.
    pub fn require_fund(&self, field: &str, fund: &str) -> FundPairResult<usize> {
        self.fund_index(fund).ok_or_else(|| FundPairError::InvalidInput {
            field: field.into(),
            reason: format!("'{}' is not a fund in the dataset", fund),
        })
    }

    /// Covariance of a pair that is about to be blended. Funds with no
    /// shared period cannot be paired.
    pub fn covariance_of(&self, i: usize, j: usize) -> FundPairResult<Rate> {
        self.covariance[i][j].ok_or_else(|| {
            FundPairError::InvalidDataset(format!(
                "funds '{}' and '{}' share no period with values",
                self.funds[i], self.funds[j]
            ))
        })
    }

    pub fn correlation(&self, i: usize, j: usize) -> Option<Decimal> {
        let denom = self.statistics[i]
            .std_dev()
            .checked_mul(self.statistics[j].std_dev())?;
        if denom.is_zero() {
            None
        } else {
            self.covariance[i][j]?.checked_div(denom)
        }
    }
}

fn pair_covariance(matrix: &ReturnMatrix, i: usize, j: usize) -> FundPairResult<Option<Rate>> {
    let (a, b) = matrix.aligned_pair_at(i, j);
    if a.is_empty() {
        return Ok(None);
    }
    let mean_a = statistics::mean(&a)?;
    let mean_b = statistics::mean(&b)?;
    statistics::covariance(&a, mean_a, &b, mean_b).map(Some)
}

// ---------------------------------------------------------------------------
// Summary table
// ---------------------------------------------------------------------------

/// Per-fund observation counts, moments and standalone Sharpe ratio, plus the
/// covariance and correlation matrices.
pub fn summarize_funds(
    input: &FundSummaryInput,
) -> FundPairResult<ComputationOutput<FundSummaryOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let (matrix, universe) =
        FundUniverse::from_dataset(&input.dataset, &input.time_column, &mut warnings)?;

    let funds: Vec<FundSummary> = universe
        .funds
        .iter()
        .zip(universe.statistics.iter())
        .enumerate()
        .map(|(i, (fund, stats))| {
            let std_dev = sqrt_decimal(stats.variance);
            FundSummary {
                fund: fund.clone(),
                observations: matrix.observations_at(i),
                missing: matrix.missing_at(i),
                mean: stats.mean,
                variance: stats.variance,
                std_dev,
                sharpe_ratio: if std_dev.is_zero() {
                    None
                } else {
                    stats.mean.checked_div(std_dev)
                },
            }
        })
        .collect();

    for f in funds.iter().filter(|f| f.sharpe_ratio.is_none()) {
        warnings.push(format!("{} has zero variance; Sharpe ratio undefined", f.fund));
    }

    let n = universe.len();
    let correlation_matrix: Vec<Vec<Option<Decimal>>> = (0..n)
        .map(|i| (0..n).map(|j| universe.correlation(i, j)).collect())
        .collect();

    let output = FundSummaryOutput {
        periods: matrix.period_count(),
        funds,
        covariance_matrix: universe.covariance.clone(),
        correlation_matrix,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Per-fund population moments over time-aligned returns",
        &serde_json::json!({
            "time_column": input.time_column,
            "n_funds": n,
            "variance": "population (divide by N)",
            "covariance": "pairwise over shared periods",
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn input(value: serde_json::Value) -> FundSummaryInput {
        serde_json::from_value(value).unwrap()
    }

    fn mirrored() -> FundSummaryInput {
        input(json!({
            "dataset": {
                "columns": ["Date", "A", "B"],
                "rows": [
                    {"Date": "d1", "A": 0.01, "B": 0.04},
                    {"Date": "d2", "A": 0.02, "B": 0.03},
                    {"Date": "d3", "A": 0.03, "B": 0.02},
                    {"Date": "d4", "A": 0.04, "B": 0.01}
                ]
            }
        }))
    }

    #[test]
    fn test_time_column_defaults_to_date() {
        assert_eq!(mirrored().time_column, "Date");
    }

    #[test]
    fn test_covariance_is_symmetric_with_variance_diagonal() {
        let mut warnings = Vec::new();
        let data = mirrored();
        let (_, u) = FundUniverse::from_dataset(&data.dataset, "Date", &mut warnings).unwrap();
        assert_eq!(u.covariance[0][1], u.covariance[1][0]);
        assert_eq!(u.covariance_of(0, 1).unwrap(), dec!(-0.000125));
        assert_eq!(u.covariance[0][0], Some(u.statistics[0].variance));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_perfect_negative_correlation() {
        let out = summarize_funds(&mirrored()).unwrap();
        let rho = out.result.correlation_matrix[0][1].unwrap();
        assert!((rho + Decimal::ONE).abs() < dec!(0.0000001));
        assert_eq!(out.result.periods, 4);
    }

    #[test]
    fn test_summary_flags_zero_variance() {
        let out = summarize_funds(&input(json!({
            "dataset": {
                "columns": ["Date", "Flat", "Moving"],
                "rows": [
                    {"Date": "d1", "Flat": 0.01, "Moving": 0.01},
                    {"Date": "d2", "Flat": 0.01, "Moving": 0.03}
                ]
            }
        })))
        .unwrap();
        assert_eq!(out.result.funds[0].sharpe_ratio, None);
        assert!(out.result.funds[1].sharpe_ratio.is_some());
        assert_eq!(out.result.correlation_matrix[0][1], None);
        assert!(out.warnings.iter().any(|w| w.contains("Flat")));
    }

    #[test]
    fn test_pairwise_overlap_used_for_covariance() {
        let out = summarize_funds(&input(json!({
            "dataset": {
                "columns": ["Date", "A", "B"],
                "rows": [
                    {"Date": "d1", "A": 0.50, "B": null},
                    {"Date": "d2", "A": 0.01, "B": 0.02},
                    {"Date": "d3", "A": 0.03, "B": 0.04}
                ]
            }
        })))
        .unwrap();
        // overlap d2, d3: deviations (-0.01, 0.01) and (-0.01, 0.01)
        assert_eq!(out.result.covariance_matrix[0][1], Some(dec!(0.0001)));
        assert_eq!(out.result.funds[1].missing, 1);
        assert!(out.warnings.iter().any(|w| w.starts_with("B:")));
    }

    #[test]
    fn test_disjoint_funds_left_undefined() {
        let out = summarize_funds(&input(json!({
            "dataset": {
                "columns": ["Date", "A", "B"],
                "rows": [
                    {"Date": "d1", "A": 0.01, "B": null},
                    {"Date": "d2", "A": null, "B": 0.02}
                ]
            }
        })))
        .unwrap();
        assert_eq!(out.result.covariance_matrix[0][1], None);
        assert_eq!(out.result.correlation_matrix[0][1], None);
        assert!(out.warnings.iter().any(|w| w.contains("share no period")));
    }

    #[test]
    fn test_disjoint_pair_cannot_be_blended() {
        let mut warnings = Vec::new();
        let data = input(json!({
            "dataset": {
                "columns": ["Date", "A", "B"],
                "rows": [
                    {"Date": "d1", "A": 0.01, "B": null},
                    {"Date": "d2", "A": null, "B": 0.02}
                ]
            }
        }));
        let (_, u) = FundUniverse::from_dataset(&data.dataset, "Date", &mut warnings).unwrap();
        assert!(matches!(u.covariance_of(0, 1), Err(FundPairError::InvalidDataset(_))));
        assert_eq!(u.covariance_of(0, 0).unwrap(), u.statistics[0].variance);
    }
}
