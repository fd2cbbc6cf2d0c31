use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::statistics::{overflow, sqrt_decimal, StatisticsRecord};
use crate::types::Rate;
use crate::FundPairResult;

/// Result of blending a target fund with one candidate at the
/// minimum-variance weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairOptimization {
    pub weight_target: Rate,
    pub weight_candidate: Rate,
    pub portfolio_return: Rate,
    pub portfolio_risk: Rate,
    /// Return over risk; `None` when the blend carries no risk.
    pub sharpe_ratio: Option<Decimal>,
    /// True when `var_t + var_c - 2 cov` was zero and the weight fell back
    /// to zero instead of being solved.
    pub degenerate: bool,
}

/// Closed-form two-asset minimum-variance weight of the target fund, and
/// whether the zero-denominator fallback was taken.
///
/// w = (var_c - cov) / (var_t + var_c - 2 cov), clamped to [0, 1]. A zero
/// denominator (identical risk profiles) yields 0: all weight goes to the
/// candidate.
pub fn min_variance_weight(
    target_variance: Rate,
    candidate_variance: Rate,
    covariance: Rate,
) -> FundPairResult<(Rate, bool)> {
    let denom = target_variance
        .checked_add(candidate_variance)
        .and_then(|sum| sum.checked_sub(covariance.checked_mul(dec!(2))?))
        .ok_or_else(|| overflow("minimum-variance weight"))?;
    if denom.is_zero() {
        return Ok((Decimal::ZERO, true));
    }
    let numer = candidate_variance
        .checked_sub(covariance)
        .ok_or_else(|| overflow("minimum-variance weight"))?;
    let weight = match numer.checked_div(denom) {
        Some(w) => w,
        // Quotient past the decimal range clamps to the bound its sign points at
        None if numer.is_sign_negative() == denom.is_sign_negative() => Decimal::ONE,
        None => Decimal::ZERO,
    };
    Ok((weight.clamp(Decimal::ZERO, Decimal::ONE), false))
}

pub fn blend_return(weight_target: Rate, target_mean: Rate, candidate_mean: Rate) -> FundPairResult<Rate> {
    let wc = Decimal::ONE - weight_target;
    weight_target
        .checked_mul(target_mean)
        .zip(wc.checked_mul(candidate_mean))
        .and_then(|(t, c)| t.checked_add(c))
        .ok_or_else(|| overflow("blend return"))
}

pub fn blend_variance(
    weight_target: Rate,
    target_variance: Rate,
    candidate_variance: Rate,
    covariance: Rate,
) -> FundPairResult<Rate> {
    let wc = Decimal::ONE - weight_target;
    let terms = [
        (weight_target * weight_target, target_variance),
        (wc * wc, candidate_variance),
        (dec!(2) * weight_target * wc, covariance),
    ];
    terms
        .iter()
        .try_fold(Decimal::ZERO, |acc, (k, x)| acc.checked_add(k.checked_mul(*x)?))
        .ok_or_else(|| overflow("blend variance"))
}

/// Sharpe ratio without a risk-free rate. `None` when the blend carries no
/// risk or the ratio falls outside the decimal range.
pub fn sharpe_ratio(portfolio_return: Rate, portfolio_risk: Rate) -> Option<Decimal> {
    if portfolio_risk.is_zero() {
        None
    } else {
        portfolio_return.checked_div(portfolio_risk)
    }
}

/// Return, risk and Sharpe of a blend at an arbitrary target weight.
pub fn evaluate_blend(
    weight_target: Rate,
    target: &StatisticsRecord,
    candidate: &StatisticsRecord,
    covariance: Rate,
) -> FundPairResult<(Rate, Rate, Option<Decimal>)> {
    let ret = blend_return(weight_target, target.mean, candidate.mean)?;
    let var = blend_variance(weight_target, target.variance, candidate.variance, covariance)?;
    let risk = sqrt_decimal(var);
    Ok((ret, risk, sharpe_ratio(ret, risk)))
}

/// Blend a target and candidate fund at the minimum-variance weight.
pub fn optimize_pair(
    target: &StatisticsRecord,
    candidate: &StatisticsRecord,
    covariance: Rate,
) -> FundPairResult<PairOptimization> {
    let (weight_target, degenerate) =
        min_variance_weight(target.variance, candidate.variance, covariance)?;
    let (portfolio_return, portfolio_risk, sharpe) =
        evaluate_blend(weight_target, target, candidate, covariance)?;

    Ok(PairOptimization {
        weight_target,
        weight_candidate: Decimal::ONE - weight_target,
        portfolio_return,
        portfolio_risk,
        sharpe_ratio: sharpe,
        degenerate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FundPairError;
    use crate::statistics::{covariance, mean};

    fn stats(series: &[Decimal]) -> StatisticsRecord {
        StatisticsRecord::from_series(series).unwrap()
    }

    fn cov(a: &[Decimal], b: &[Decimal]) -> Decimal {
        covariance(a, mean(a).unwrap(), b, mean(b).unwrap()).unwrap()
    }

    #[test]
    fn test_mirrored_funds_diversify() {
        let a = vec![dec!(0.01), dec!(0.02), dec!(0.03), dec!(0.04)];
        let b = vec![dec!(0.04), dec!(0.03), dec!(0.02), dec!(0.01)];
        let c = cov(&a, &b);
        assert!(c < Decimal::ZERO);

        let res = optimize_pair(&stats(&a), &stats(&b), c).unwrap();
        assert!(res.weight_target > Decimal::ZERO && res.weight_target < Decimal::ONE);
        assert_eq!(res.weight_target, dec!(0.5));
        assert_eq!(res.portfolio_return, dec!(0.025));
        // Perfect hedge: the blend has no risk, so Sharpe is undefined.
        assert_eq!(res.portfolio_risk, Decimal::ZERO);
        assert_eq!(res.sharpe_ratio, None);
        assert!(!res.degenerate);
    }

    #[test]
    fn test_identical_funds_fall_back_to_candidate() {
        let a = vec![dec!(0.01), dec!(0.05), dec!(-0.02), dec!(0.03)];
        let res = optimize_pair(&stats(&a), &stats(&a), cov(&a, &a)).unwrap();
        assert_eq!(res.weight_target, Decimal::ZERO);
        assert_eq!(res.weight_candidate, Decimal::ONE);
        assert!(res.degenerate);
    }

    #[test]
    fn test_weight_clamped_to_unit_interval() {
        // Candidate far riskier and positively correlated: unclamped weight > 1
        assert_eq!(
            min_variance_weight(dec!(0.01), dec!(0.09), dec!(0.02)).unwrap(),
            (Decimal::ONE, false)
        );
        // Target far riskier: unclamped weight < 0
        assert_eq!(
            min_variance_weight(dec!(0.09), dec!(0.01), dec!(0.02)).unwrap(),
            (Decimal::ZERO, false)
        );
    }

    #[test]
    fn test_weight_always_in_range() {
        let variances = [dec!(0), dec!(0.0001), dec!(0.01), dec!(0.04)];
        let covariances = [dec!(-0.01), dec!(0), dec!(0.00005), dec!(0.01)];
        for vt in variances {
            for vc in variances {
                for c in covariances {
                    let (w, _) = min_variance_weight(vt, vc, c).unwrap();
                    assert!(w >= Decimal::ZERO && w <= Decimal::ONE, "w={w} vt={vt} vc={vc} c={c}");
                }
            }
        }
    }

    #[test]
    fn test_uncorrelated_textbook_weight() {
        // var_t = 0.04, var_c = 0.01, cov = 0 -> w = 0.01 / 0.05 = 0.2
        let t = StatisticsRecord { mean: dec!(0.10), variance: dec!(0.04) };
        let c = StatisticsRecord { mean: dec!(0.05), variance: dec!(0.01) };
        let res = optimize_pair(&t, &c, Decimal::ZERO).unwrap();
        assert_eq!(res.weight_target, dec!(0.2));
        assert_eq!(res.portfolio_return, dec!(0.06));
        // variance = 0.04*0.04 + 0.64*0.01 = 0.008
        let expected_risk = sqrt_decimal(dec!(0.008));
        assert!((res.portfolio_risk - expected_risk).abs() < dec!(0.0000000001));
        assert!(res.sharpe_ratio.unwrap() > Decimal::ZERO);
    }

    #[test]
    fn test_zero_denominator_flagged_degenerate() {
        assert_eq!(
            min_variance_weight(dec!(0.04), dec!(0.04), dec!(0.04)).unwrap(),
            (Decimal::ZERO, true)
        );
    }

    #[test]
    fn test_oversized_moments_report_overflow() {
        assert!(matches!(
            min_variance_weight(Decimal::MAX, Decimal::MAX, Decimal::ZERO),
            Err(FundPairError::InvalidDataset(_))
        ));
        assert!(matches!(
            min_variance_weight(dec!(1), dec!(1), Decimal::MIN),
            Err(FundPairError::InvalidDataset(_))
        ));
    }

    #[test]
    fn test_sharpe_undefined_at_zero_risk() {
        assert_eq!(sharpe_ratio(dec!(0.05), Decimal::ZERO), None);
        assert_eq!(sharpe_ratio(dec!(0.05), dec!(0.1)), Some(dec!(0.5)));
    }
}
