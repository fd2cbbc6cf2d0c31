use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Instant;

use crate::error::FundPairError;
use crate::optimization::pairwise::optimize_pair;
use crate::returns::dataset::Dataset;
use crate::returns::matrix::default_time_column;
use crate::returns::universe::FundUniverse;
use crate::statistics::StatisticsRecord;
use crate::types::{with_metadata, ComputationOutput, Rate};
use crate::FundPairResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One candidate fund paired with the target at the minimum-variance weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub candidate_fund: String,
    pub weight_target: Rate,
    pub weight_candidate: Rate,
    pub portfolio_return: Rate,
    pub portfolio_risk: Rate,
    pub sharpe_ratio: Option<Decimal>,
    /// Weight came from the zero-denominator fallback.
    pub degenerate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingInput {
    pub dataset: Dataset,
    #[serde(default = "default_time_column")]
    pub time_column: String,
    pub target_fund: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingOutput {
    pub target_fund: String,
    pub target_statistics: StatisticsRecord,
    pub best_candidate: CandidateResult,
    /// Every other fund, best first.
    pub candidates: Vec<CandidateResult>,
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Total order on Sharpe ratios for ranking: larger first, undefined last.
pub fn sharpe_rank_order(a: Option<Decimal>, b: Option<Decimal>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Pair the target with every other fund and sort best first.
///
/// Ties keep registry order. Fails with `NoValidCandidate` when there is no
/// other fund or no pairing has a defined Sharpe ratio.
pub fn rank_candidates_in(
    universe: &FundUniverse,
    target_fund: &str,
) -> FundPairResult<Vec<CandidateResult>> {
    if universe.len() < 2 {
        return Err(FundPairError::NoValidCandidate(format!(
            "at least two funds are required, dataset has {}",
            universe.len()
        )));
    }
    let t = universe.require_fund("target_fund", target_fund)?;
    let target = &universe.statistics[t];

    let mut candidates: Vec<CandidateResult> = universe
        .funds
        .iter()
        .enumerate()
        .filter(|(c, _)| *c != t)
        .map(|(c, name)| -> FundPairResult<CandidateResult> {
            let pair = optimize_pair(target, &universe.statistics[c], universe.covariance_of(t, c)?)?;
            Ok(CandidateResult {
                candidate_fund: name.clone(),
                weight_target: pair.weight_target,
                weight_candidate: pair.weight_candidate,
                portfolio_return: pair.portfolio_return,
                portfolio_risk: pair.portfolio_risk,
                sharpe_ratio: pair.sharpe_ratio,
                degenerate: pair.degenerate,
            })
        })
        .collect::<FundPairResult<_>>()?;

    candidates.sort_by(|a, b| sharpe_rank_order(a.sharpe_ratio, b.sharpe_ratio));

    if candidates.iter().all(|c| c.sharpe_ratio.is_none()) {
        return Err(FundPairError::NoValidCandidate(format!(
            "no pairing with '{}' has a defined Sharpe ratio",
            target_fund
        )));
    }

    Ok(candidates)
}

/// Rank every candidate against the target fund of a dataset.
pub fn rank_candidates(input: &RankingInput) -> FundPairResult<ComputationOutput<RankingOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let (_, universe) =
        FundUniverse::from_dataset(&input.dataset, &input.time_column, &mut warnings)?;
    let candidates = rank_candidates_in(&universe, &input.target_fund)?;
    push_candidate_warnings(&candidates, &mut warnings);

    let t = universe.require_fund("target_fund", &input.target_fund)?;
    let output = RankingOutput {
        target_fund: input.target_fund.clone(),
        target_statistics: universe.statistics[t],
        best_candidate: candidates[0].clone(),
        candidates,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Two-asset minimum-variance pairing ranked by Sharpe ratio",
        &serde_json::json!({
            "target_fund": input.target_fund,
            "time_column": input.time_column,
            "n_candidates": output.candidates.len(),
            "risk_free_rate": "0 (Sharpe = return / risk)",
        }),
        warnings,
        elapsed,
        output,
    ))
}

pub(crate) fn push_candidate_warnings(candidates: &[CandidateResult], warnings: &mut Vec<String>) {
    for c in candidates {
        if c.degenerate {
            warnings.push(format!(
                "{}: identical risk profile to target, weight fell back to 0",
                c.candidate_fund
            ));
        }
        if c.sharpe_ratio.is_none() {
            warnings.push(format!(
                "{}: blended risk is zero, Sharpe ratio undefined (ranked last)",
                c.candidate_fund
            ));
        }
    }
}
