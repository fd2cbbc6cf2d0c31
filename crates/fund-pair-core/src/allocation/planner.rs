use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FundPairError;
use crate::optimization::pairwise::{blend_return, blend_variance};
use crate::statistics::{sqrt_decimal, StatisticsRecord};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FundPairResult;

/// Warning attached to every plan: `projected_risk` blends standalone
/// volatilities linearly and ignores the pair's covariance.
pub const LINEAR_RISK_WARNING: &str =
    "projected_risk is a linear blend of standalone volatilities and ignores covariance";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for splitting new capital between a held fund and its pairing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationInput {
    /// Target-fund weight to steer toward, in [0, 1].
    pub optimal_weight: Rate,
    /// Value already held in the target fund.
    #[serde(default)]
    pub current_holding: Option<Money>,
    /// New capital to invest.
    #[serde(default)]
    pub extra_funds: Option<Money>,
    pub target: StatisticsRecord,
    pub candidate: StatisticsRecord,
    /// Pair covariance; enables `projected_risk_with_covariance`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub covariance: Option<Rate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub total_value: Money,
    pub ideal_target_value: Money,
    pub additional_target: Money,
    pub additional_candidate: Money,
    pub final_target_value: Money,
    pub final_candidate_value: Money,
    pub final_weight_target: Rate,
    pub final_weight_candidate: Rate,
    pub projected_return: Rate,
    /// w_t * sd_t + w_c * sd_c.
    pub projected_risk: Rate,
    /// sqrt of the full two-asset variance at the final weights.
    pub projected_risk_with_covariance: Option<Rate>,
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Split `extra_funds` so the combined position moves toward `optimal_weight`
/// in the target fund. Nothing already held is sold: the target top-up is
/// floored at zero and the remainder goes to the candidate.
pub fn plan_allocation_with(
    optimal_weight: Rate,
    current_holding: Money,
    extra_funds: Money,
    target: &StatisticsRecord,
    candidate: &StatisticsRecord,
    covariance: Option<Rate>,
) -> FundPairResult<AllocationPlan> {
    validate_amount("current_holding", current_holding)?;
    validate_amount("extra_funds", extra_funds)?;
    if optimal_weight < Decimal::ZERO || optimal_weight > Decimal::ONE {
        return Err(FundPairError::InvalidInput {
            field: "optimal_weight".into(),
            reason: format!("must be between 0 and 1, got {}", optimal_weight),
        });
    }

    let total_value = current_holding
        .checked_add(extra_funds)
        .ok_or_else(|| out_of_range("extra_funds", "current_holding + extra_funds"))?;
    let ideal_target_value = total_value
        .checked_mul(optimal_weight)
        .ok_or_else(|| out_of_range("optimal_weight", "ideal target value"))?;
    let additional_target = (ideal_target_value - current_holding).max(Decimal::ZERO);
    let additional_candidate = extra_funds - additional_target;

    let final_target_value = current_holding + additional_target;
    let final_candidate_value = additional_candidate;
    let final_total = final_target_value + final_candidate_value;
    let final_weight_target = if final_total > Decimal::ZERO {
        final_target_value / final_total
    } else {
        Decimal::ZERO
    };
    let final_weight_candidate = Decimal::ONE - final_weight_target;

    let projected_return = blend_return(final_weight_target, target.mean, candidate.mean)
        .map_err(|_| out_of_range("target.mean", "projected return"))?;
    let projected_risk =
        final_weight_target * target.std_dev() + final_weight_candidate * candidate.std_dev();
    let projected_risk_with_covariance = covariance
        .map(|cov| {
            blend_variance(final_weight_target, target.variance, candidate.variance, cov)
                .map(sqrt_decimal)
                .map_err(|_| out_of_range("covariance", "projected variance"))
        })
        .transpose()?;

    Ok(AllocationPlan {
        total_value,
        ideal_target_value,
        additional_target,
        additional_candidate,
        final_target_value,
        final_candidate_value,
        final_weight_target,
        final_weight_candidate,
        projected_return,
        projected_risk,
        projected_risk_with_covariance,
    })
}

/// Incremental-investment plan with the standard output envelope.
pub fn plan_allocation(input: &AllocationInput) -> FundPairResult<ComputationOutput<AllocationPlan>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = vec![LINEAR_RISK_WARNING.to_string()];

    let current_holding = require_amount("current_holding", input.current_holding)?;
    let extra_funds = require_amount("extra_funds", input.extra_funds)?;
    let plan = plan_allocation_with(
        input.optimal_weight,
        current_holding,
        extra_funds,
        &input.target,
        &input.candidate,
        input.covariance,
    )?;
    push_plan_warnings(&plan, input.optimal_weight, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Incremental allocation toward a target weight without selling",
        &serde_json::json!({
            "optimal_weight": input.optimal_weight.to_string(),
            "current_holding": current_holding.to_string(),
            "extra_funds": extra_funds.to_string(),
            "projected_risk": "linear blend of standard deviations",
        }),
        warnings,
        elapsed,
        plan,
    ))
}

pub(crate) fn push_plan_warnings(
    plan: &AllocationPlan,
    optimal_weight: Rate,
    warnings: &mut Vec<String>,
) {
    if plan.additional_target.is_zero() && plan.final_weight_target > optimal_weight {
        warnings.push(format!(
            "existing holding already exceeds the target weight; final target weight {:.4} vs optimal {:.4}",
            plan.final_weight_target, optimal_weight
        ));
    }
}

pub(crate) fn require_amount(field: &str, value: Option<Money>) -> FundPairResult<Money> {
    value.ok_or_else(|| FundPairError::InvalidInput {
        field: field.into(),
        reason: "a non-negative amount is required".into(),
    })
}

fn out_of_range(field: &str, quantity: &str) -> FundPairError {
    FundPairError::InvalidInput {
        field: field.into(),
        reason: format!("{} overflows decimal range", quantity),
    }
}

fn validate_amount(field: &str, value: Money) -> FundPairResult<()> {
    if value < Decimal::ZERO {
        return Err(FundPairError::InvalidInput {
            field: field.into(),
            reason: format!("must be non-negative, got {}", value),
        });
    }
    Ok(())
}
