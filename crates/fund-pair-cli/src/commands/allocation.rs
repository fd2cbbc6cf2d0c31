use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fund_pair_core::allocation::planner::{self, AllocationInput};
use fund_pair_core::statistics::StatisticsRecord;

use crate::input;

/// Arguments for splitting new capital between the target and a candidate
#[derive(Args)]
pub struct AllocateArgs {
    /// Path to JSON allocation request
    #[arg(long)]
    pub input: Option<String>,

    /// Target-fund weight to steer toward (0 to 1)
    #[arg(long)]
    pub weight: Option<Decimal>,

    /// Value currently held in the target fund
    #[arg(long)]
    pub current_holding: Option<Decimal>,

    /// New capital to invest
    #[arg(long)]
    pub extra_funds: Option<Decimal>,

    /// Mean periodic return of the target fund
    #[arg(long, allow_hyphen_values = true)]
    pub target_mean: Option<Decimal>,

    /// Return variance of the target fund
    #[arg(long)]
    pub target_variance: Option<Decimal>,

    /// Mean periodic return of the candidate fund
    #[arg(long, allow_hyphen_values = true)]
    pub candidate_mean: Option<Decimal>,

    /// Return variance of the candidate fund
    #[arg(long)]
    pub candidate_variance: Option<Decimal>,

    /// Pair covariance, adds a covariance-aware risk figure
    #[arg(long, allow_hyphen_values = true)]
    pub covariance: Option<Decimal>,
}

pub fn run_allocate(args: AllocateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let allocation_input: AllocationInput = if args.input.is_some() {
        let mut request = input::read_request(args.input.as_deref(), "allocate")?;
        apply_amount_overrides(&mut request, &args);
        serde_json::from_value(request)?
    } else {
        build_from_flags(&args)?
    };
    let result = planner::plan_allocation(&allocation_input)?;
    Ok(serde_json::to_value(result)?)
}

fn apply_amount_overrides(request: &mut Value, args: &AllocateArgs) {
    let decimal = |d: Option<Decimal>| d.map(crate::commands::pairing::decimal_value);
    input::override_field(request, "optimal_weight", decimal(args.weight));
    input::override_field(request, "current_holding", decimal(args.current_holding));
    input::override_field(request, "extra_funds", decimal(args.extra_funds));
    input::override_field(request, "covariance", decimal(args.covariance));
}

fn build_from_flags(args: &AllocateArgs) -> Result<AllocationInput, Box<dyn std::error::Error>> {
    let required = |value: Option<Decimal>, flag: &str| {
        value.ok_or_else(|| format!("--{} required (or pass --input <file.json>)", flag))
    };
    Ok(AllocationInput {
        optimal_weight: required(args.weight, "weight")?,
        current_holding: args.current_holding,
        extra_funds: args.extra_funds,
        target: StatisticsRecord {
            mean: required(args.target_mean, "target-mean")?,
            variance: required(args.target_variance, "target-variance")?,
        },
        candidate: StatisticsRecord {
            mean: required(args.candidate_mean, "candidate-mean")?,
            variance: required(args.candidate_variance, "candidate-variance")?,
        },
        covariance: args.covariance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn flags() -> AllocateArgs {
        AllocateArgs {
            input: None,
            weight: Some(dec!(0.7)),
            current_holding: Some(dec!(100000)),
            extra_funds: Some(dec!(50000)),
            target_mean: Some(dec!(0.01)),
            target_variance: Some(dec!(0.0004)),
            candidate_mean: Some(dec!(0.005)),
            candidate_variance: Some(dec!(0.0001)),
            covariance: None,
        }
    }

    #[test]
    fn test_allocate_from_flags() {
        let value = run_allocate(flags()).unwrap();
        let amount = |key: &str| -> Decimal {
            value["result"][key].as_str().unwrap().parse().unwrap()
        };
        assert_eq!(amount("additional_target"), dec!(5000));
        assert_eq!(amount("additional_candidate"), dec!(45000));
    }

    #[test]
    fn test_missing_moment_flag_reported() {
        let mut args = flags();
        args.candidate_variance = None;
        let err = build_from_flags(&args).unwrap_err();
        assert!(err.to_string().contains("--candidate-variance"));
    }
}
