use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FundPairError;
use crate::optimization::pairwise::evaluate_blend;
use crate::returns::dataset::Dataset;
use crate::returns::matrix::default_time_column;
use crate::returns::universe::FundUniverse;
use crate::statistics::StatisticsRecord;
use crate::types::{with_metadata, ComputationOutput, Rate};
use crate::FundPairResult;

/// Grid resolution used when the caller does not choose one.
pub const DEFAULT_FRONTIER_POINTS: usize = 100;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A single point on the two-fund frontier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontierPoint {
    pub weight_target: Rate,
    pub weight_candidate: Rate,
    pub expected_return: Rate,
    pub risk: Rate,
    pub sharpe_ratio: Option<Decimal>,
}

/// Frontier curve of one fund pair with its max-Sharpe and lowest-risk points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frontier {
    /// Ordered by ascending target weight, both endpoints included.
    pub points: Vec<FrontierPoint>,
    pub optimal: FrontierPoint,
    pub optimal_index: usize,
    pub min_risk: FrontierPoint,
    pub min_risk_index: usize,
}

/// Where the pair's moments come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrontierSource {
    /// Two named funds of a dataset.
    Funds {
        dataset: Dataset,
        #[serde(default = "default_time_column")]
        time_column: String,
        target_fund: String,
        candidate_fund: String,
    },
    /// Moments supplied directly.
    Moments {
        target: StatisticsRecord,
        candidate: StatisticsRecord,
        covariance: Rate,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontierInput {
    pub source: FrontierSource,
    /// Number of grid points (default 100, minimum 2).
    #[serde(default)]
    pub points: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontierOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_fund: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_fund: Option<String>,
    pub frontier: Frontier,
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Sweep the target weight over `points` evenly spaced values from 0 to 1
/// inclusive (`w_i = i / (points - 1)`).
///
/// Weights are not clamped to the minimum-variance solution; every blend on
/// the grid is reported. The optimal point is the first point with the
/// highest defined Sharpe ratio.
pub fn generate_frontier(
    target: &StatisticsRecord,
    candidate: &StatisticsRecord,
    covariance: Rate,
    points: usize,
) -> FundPairResult<Frontier> {
    if points < 2 {
        return Err(FundPairError::InvalidInput {
            field: "points".into(),
            reason: format!("at least 2 grid points required, got {}", points),
        });
    }

    let last = Decimal::from((points - 1) as i64);
    let curve: Vec<FrontierPoint> = (0..points)
        .map(|i| -> FundPairResult<FrontierPoint> {
            let w = Decimal::from(i as i64) / last;
            let (expected_return, risk, sharpe_ratio) =
                evaluate_blend(w, target, candidate, covariance)?;
            Ok(FrontierPoint {
                weight_target: w,
                weight_candidate: Decimal::ONE - w,
                expected_return,
                risk,
                sharpe_ratio,
            })
        })
        .collect::<FundPairResult<_>>()?;

    let mut best: Option<(usize, Decimal)> = None;
    for (i, p) in curve.iter().enumerate() {
        if let Some(s) = p.sharpe_ratio {
            if best.map_or(true, |(_, b)| s > b) {
                best = Some((i, s));
            }
        }
    }
    let Some((optimal_index, _)) = best else {
        return Err(FundPairError::NoValidCandidate(
            "no frontier point has a defined Sharpe ratio".into(),
        ));
    };

    let mut min_risk_index = 0;
    for (i, p) in curve.iter().enumerate() {
        if p.risk < curve[min_risk_index].risk {
            min_risk_index = i;
        }
    }

    Ok(Frontier {
        optimal: curve[optimal_index].clone(),
        optimal_index,
        min_risk: curve[min_risk_index].clone(),
        min_risk_index,
        points: curve,
    })
}

/// Efficient frontier for a fund pair.
pub fn calculate_frontier(
    input: &FrontierInput,
) -> FundPairResult<ComputationOutput<FrontierOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let points = input.points.unwrap_or(DEFAULT_FRONTIER_POINTS);

    let (target_fund, candidate_fund, target, candidate, covariance) = match &input.source {
        FrontierSource::Funds {
            dataset,
            time_column,
            target_fund,
            candidate_fund,
        } => {
            let (_, universe) = FundUniverse::from_dataset(dataset, time_column, &mut warnings)?;
            let t = universe.require_fund("target_fund", target_fund)?;
            let c = universe.require_fund("candidate_fund", candidate_fund)?;
            if t == c {
                return Err(FundPairError::InvalidInput {
                    field: "candidate_fund".into(),
                    reason: "candidate must differ from the target".into(),
                });
            }
            (
                Some(target_fund.clone()),
                Some(candidate_fund.clone()),
                universe.statistics[t],
                universe.statistics[c],
                universe.covariance_of(t, c)?,
            )
        }
        FrontierSource::Moments {
            target,
            candidate,
            covariance,
        } => {
            validate_moments(target, "target")?;
            validate_moments(candidate, "candidate")?;
            (None, None, *target, *candidate, *covariance)
        }
    };

    let frontier = generate_frontier(&target, &candidate, covariance, points)?;
    let undefined = frontier
        .points
        .iter()
        .filter(|p| p.sharpe_ratio.is_none())
        .count();
    if undefined > 0 {
        warnings.push(format!(
            "{} frontier point(s) have zero risk and no Sharpe ratio",
            undefined
        ));
    }

    let output = FrontierOutput {
        target_fund,
        candidate_fund,
        frontier,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Two-asset efficient frontier over an even weight grid",
        &serde_json::json!({
            "points": points,
            "weight_grid": "i / (points - 1), endpoints included",
            "optimal": "max Sharpe, first occurrence on ties",
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn validate_moments(stats: &StatisticsRecord, field: &str) -> FundPairResult<()> {
    if stats.variance < Decimal::ZERO {
        return Err(FundPairError::InvalidInput {
            field: format!("{}.variance", field),
            reason: "variance cannot be negative".into(),
        });
    }
    Ok(())
}
