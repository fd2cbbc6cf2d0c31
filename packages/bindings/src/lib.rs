use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Fund statistics
// ---------------------------------------------------------------------------

#[napi]
pub fn summarize_funds(input_json: String) -> NapiResult<String> {
    let input: fund_pair_core::returns::universe::FundSummaryInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        fund_pair_core::returns::universe::summarize_funds(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Pairing
// ---------------------------------------------------------------------------

#[napi]
pub fn rank_candidates(input_json: String) -> NapiResult<String> {
    let input: fund_pair_core::optimization::ranking::RankingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        fund_pair_core::optimization::ranking::rank_candidates(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn efficient_frontier(input_json: String) -> NapiResult<String> {
    let input: fund_pair_core::optimization::frontier::FrontierInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fund_pair_core::optimization::frontier::calculate_frontier(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

#[napi]
pub fn plan_allocation(input_json: String) -> NapiResult<String> {
    let input: fund_pair_core::allocation::planner::AllocationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        fund_pair_core::allocation::planner::plan_allocation(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn analyze_target(input_json: String) -> NapiResult<String> {
    let input: fund_pair_core::analysis::TargetAnalysisInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fund_pair_core::analysis::analyze_target(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
