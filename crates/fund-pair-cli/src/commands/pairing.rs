use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use fund_pair_core::analysis::{self, TargetAnalysisInput};
use fund_pair_core::optimization::frontier::{self, FrontierInput};
use fund_pair_core::optimization::ranking::{self, RankingInput};
use fund_pair_core::returns::universe::{self, FundSummaryInput};

use crate::input;

/// Arguments shared by every dataset-driven command
#[derive(Args)]
pub struct DatasetArgs {
    /// Path to a CSV file or a JSON request/dataset
    #[arg(long)]
    pub input: Option<String>,

    /// Column holding the period label
    #[arg(long)]
    pub time_column: Option<String>,
}

/// Arguments for per-fund statistics
#[derive(Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
}

/// Arguments for ranking pairing candidates
#[derive(Args)]
pub struct RankArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Fund already held
    #[arg(long)]
    pub target: Option<String>,
}

/// Arguments for the two-fund efficient frontier
#[derive(Args)]
pub struct FrontierArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Fund already held
    #[arg(long)]
    pub target: Option<String>,

    /// Fund to pair with the target
    #[arg(long)]
    pub candidate: Option<String>,

    /// Number of grid points, endpoints included
    #[arg(long)]
    pub points: Option<usize>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum WeightSourceArg {
    MaxSharpe,
    MinVariance,
}

/// Arguments for the full ranking, frontier and allocation pipeline
#[derive(Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Fund already held
    #[arg(long)]
    pub target: Option<String>,

    /// Number of frontier grid points
    #[arg(long)]
    pub points: Option<usize>,

    /// Which weight new capital is steered toward
    #[arg(long, value_enum)]
    pub weight_source: Option<WeightSourceArg>,

    /// Value currently held in the target fund
    #[arg(long)]
    pub current_holding: Option<Decimal>,

    /// New capital to invest
    #[arg(long)]
    pub extra_funds: Option<Decimal>,
}

pub fn run_summary(args: SummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request = input::read_request(args.dataset.input.as_deref(), "summary")?;
    apply_time_column(&mut request, &args.dataset);
    let summary_input: FundSummaryInput = serde_json::from_value(request)?;
    let result = universe::summarize_funds(&summary_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_rank(args: RankArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request = input::read_request(args.dataset.input.as_deref(), "rank")?;
    apply_time_column(&mut request, &args.dataset);
    input::override_field(&mut request, "target_fund", args.target.map(Value::String));
    let ranking_input: RankingInput = serde_json::from_value(request)
        .map_err(|e| format!("invalid rank request (is --target set?): {}", e))?;
    let result = ranking::rank_candidates(&ranking_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_frontier(args: FrontierArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request = input::read_request(args.dataset.input.as_deref(), "frontier")?;
    if request.get("source").is_none() {
        let points = request
            .as_object_mut()
            .and_then(|m| m.remove("points"))
            .unwrap_or(Value::Null);
        request = json!({ "source": request, "points": points });
    }
    if let Some(source) = input::object_at(&mut request, "source") {
        apply_time_column(source, &args.dataset);
        input::override_field(source, "target_fund", args.target.map(Value::String));
        input::override_field(source, "candidate_fund", args.candidate.map(Value::String));
    }
    input::override_field(&mut request, "points", args.points.map(Value::from));

    let frontier_input: FrontierInput = serde_json::from_value(request).map_err(|e| {
        format!(
            "invalid frontier request (set --target and --candidate, or supply moments): {}",
            e
        )
    })?;
    let result = frontier::calculate_frontier(&frontier_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request = input::read_request(args.dataset.input.as_deref(), "analyze")?;
    apply_time_column(&mut request, &args.dataset);
    input::override_field(&mut request, "target_fund", args.target.map(Value::String));
    input::override_field(&mut request, "frontier_points", args.points.map(Value::from));
    input::override_field(
        &mut request,
        "weight_source",
        args.weight_source.map(|ws| {
            Value::String(
                match ws {
                    WeightSourceArg::MaxSharpe => "max_sharpe",
                    WeightSourceArg::MinVariance => "min_variance",
                }
                .to_string(),
            )
        }),
    );
    if args.current_holding.is_some() || args.extra_funds.is_some() {
        if let Some(allocation) = input::object_at(&mut request, "allocation") {
            input::override_field(allocation, "current_holding", args.current_holding.map(decimal_value));
            input::override_field(allocation, "extra_funds", args.extra_funds.map(decimal_value));
        }
    }

    let analysis_input: TargetAnalysisInput = serde_json::from_value(request)
        .map_err(|e| format!("invalid analyze request (is --target set?): {}", e))?;
    let result = analysis::analyze_target(&analysis_input)?;
    Ok(serde_json::to_value(result)?)
}

fn apply_time_column(request: &mut Value, args: &DatasetArgs) {
    input::override_field(request, "time_column", args.time_column.clone().map(Value::String));
}

pub(crate) fn decimal_value(d: Decimal) -> Value {
    Value::String(d.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_frontier_from_csv_and_flags() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("funds.csv");
        fs::write(
            &path,
            "Month,Core,Bond\nm1,0.02,0.004\nm2,-0.01,0.006\nm3,0.03,0.002\nm4,0.01,0.005\n",
        )
        .unwrap();

        let args = FrontierArgs {
            dataset: DatasetArgs {
                input: Some(path.to_string_lossy().into_owned()),
                time_column: Some("Month".into()),
            },
            target: Some("Core".into()),
            candidate: Some("Bond".into()),
            points: Some(5),
        };
        let value = run_frontier(args).unwrap();
        assert_eq!(value["result"]["target_fund"], "Core");
        assert_eq!(value["result"]["candidate_fund"], "Bond");
        assert_eq!(
            value["result"]["frontier"]["points"].as_array().unwrap().len(),
            5
        );
    }

    #[test]
    fn test_rank_requires_target() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("funds.csv");
        fs::write(&path, "Date,A,B\nd1,0.01,0.02\nd2,0.03,0.01\n").unwrap();
        let args = RankArgs {
            dataset: DatasetArgs {
                input: Some(path.to_string_lossy().into_owned()),
                time_column: None,
            },
            target: None,
        };
        let err = run_rank(args).unwrap_err();
        assert!(err.to_string().contains("--target"));
    }
}
