use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::allocation::planner::{
    plan_allocation_with, push_plan_warnings, require_amount, AllocationPlan, LINEAR_RISK_WARNING,
};
use crate::optimization::frontier::{generate_frontier, Frontier, DEFAULT_FRONTIER_POINTS};
use crate::optimization::ranking::{push_candidate_warnings, rank_candidates_in, CandidateResult};
use crate::returns::dataset::Dataset;
use crate::returns::matrix::default_time_column;
use crate::returns::universe::FundUniverse;
use crate::statistics::StatisticsRecord;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FundPairResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which weight of the best pair new capital is steered toward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightSource {
    /// Max-Sharpe point of the frontier.
    #[default]
    MaxSharpe,
    /// Closed-form minimum-variance weight of the best candidate.
    MinVariance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRequest {
    #[serde(default)]
    pub current_holding: Option<Money>,
    #[serde(default)]
    pub extra_funds: Option<Money>,
}

/// One recomputation request: dataset, chosen target and optional new capital.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetAnalysisInput {
    pub dataset: Dataset,
    #[serde(default = "default_time_column")]
    pub time_column: String,
    pub target_fund: String,
    #[serde(default)]
    pub frontier_points: Option<usize>,
    #[serde(default)]
    pub weight_source: WeightSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocation: Option<AllocationRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetAnalysisOutput {
    pub target_fund: String,
    pub target_statistics: StatisticsRecord,
    pub best_candidate: CandidateResult,
    pub candidate_statistics: StatisticsRecord,
    pub pair_covariance: Rate,
    pub candidates: Vec<CandidateResult>,
    pub frontier: Frontier,
    pub allocation_weight: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation: Option<AllocationPlan>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Rank every pairing for the target, trace the best pair's frontier and,
/// when new capital is given, plan how to invest it.
pub fn analyze_target(
    input: &TargetAnalysisInput,
) -> FundPairResult<ComputationOutput<TargetAnalysisOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let (_, universe) =
        FundUniverse::from_dataset(&input.dataset, &input.time_column, &mut warnings)?;
    let candidates = rank_candidates_in(&universe, &input.target_fund)?;
    push_candidate_warnings(&candidates, &mut warnings);

    let best = candidates[0].clone();
    let t = universe.require_fund("target_fund", &input.target_fund)?;
    let c = universe.require_fund("candidate_fund", &best.candidate_fund)?;
    let target = universe.statistics[t];
    let candidate = universe.statistics[c];
    let covariance = universe.covariance_of(t, c)?;

    let points = input.frontier_points.unwrap_or(DEFAULT_FRONTIER_POINTS);
    let frontier = generate_frontier(&target, &candidate, covariance, points)?;

    let allocation_weight = match input.weight_source {
        WeightSource::MaxSharpe => frontier.optimal.weight_target,
        WeightSource::MinVariance => best.weight_target,
    };

    let allocation = match &input.allocation {
        Some(req) => {
            let current_holding = require_amount("allocation.current_holding", req.current_holding)?;
            let extra_funds = require_amount("allocation.extra_funds", req.extra_funds)?;
            let plan = plan_allocation_with(
                allocation_weight,
                current_holding,
                extra_funds,
                &target,
                &candidate,
                Some(covariance),
            )?;
            warnings.push(LINEAR_RISK_WARNING.to_string());
            push_plan_warnings(&plan, allocation_weight, &mut warnings);
            Some(plan)
        }
        None => None,
    };

    let output = TargetAnalysisOutput {
        target_fund: input.target_fund.clone(),
        target_statistics: target,
        best_candidate: best,
        candidate_statistics: candidate,
        pair_covariance: covariance,
        candidates,
        frontier,
        allocation_weight,
        allocation,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Two-asset pairing: min-variance ranking, frontier and incremental allocation",
        &serde_json::json!({
            "target_fund": input.target_fund,
            "time_column": input.time_column,
            "frontier_points": points,
            "weight_source": input.weight_source,
            "risk_free_rate": "0 (Sharpe = return / risk)",
        }),
        warnings,
        elapsed,
        output,
    ))
}
