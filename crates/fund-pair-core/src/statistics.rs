use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};

use crate::error::FundPairError;
use crate::types::Rate;
use crate::FundPairResult;

/// Mean and population variance of one fund's return series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsRecord {
    pub mean: Rate,
    pub variance: Rate,
}

impl StatisticsRecord {
    pub fn from_series(series: &[Decimal]) -> FundPairResult<Self> {
        let mean = mean(series)?;
        let variance = variance(series, mean)?;
        Ok(StatisticsRecord { mean, variance })
    }

    /// Standard deviation (zero when the variance is not positive).
    pub fn std_dev(&self) -> Rate {
        sqrt_decimal(self.variance)
    }
}

/// Arithmetic mean. An empty series is an error, never zero.
pub fn mean(series: &[Decimal]) -> FundPairResult<Rate> {
    if series.is_empty() {
        return Err(FundPairError::InvalidDataset(
            "mean of an empty series is undefined".into(),
        ));
    }
    let sum = series
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
        .ok_or_else(|| overflow("mean"))?;
    Ok(sum / Decimal::from(series.len() as i64))
}

/// Population variance (divides by N) around a caller-supplied mean.
pub fn variance(series: &[Decimal], mean: Rate) -> FundPairResult<Rate> {
    if series.is_empty() {
        return Err(FundPairError::InvalidDataset(
            "variance of an empty series is undefined".into(),
        ));
    }
    let sum_sq = series
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| {
            let diff = v.checked_sub(mean)?;
            acc.checked_add(diff.checked_mul(diff)?)
        })
        .ok_or_else(|| overflow("variance"))?;
    Ok(sum_sq / Decimal::from(series.len() as i64))
}

/// Population covariance over index-paired observations.
///
/// Both series must already be aligned; a length difference is reported
/// rather than truncated.
pub fn covariance(
    series_a: &[Decimal],
    mean_a: Rate,
    series_b: &[Decimal],
    mean_b: Rate,
) -> FundPairResult<Rate> {
    if series_a.len() != series_b.len() {
        return Err(FundPairError::MismatchedSeriesLength {
            context: "covariance".into(),
            left: series_a.len(),
            right: series_b.len(),
        });
    }
    if series_a.is_empty() {
        return Err(FundPairError::InvalidDataset(
            "covariance of empty series is undefined".into(),
        ));
    }
    let sum = series_a
        .iter()
        .zip(series_b.iter())
        .try_fold(Decimal::ZERO, |acc, (a, b)| {
            let product = a.checked_sub(mean_a)?.checked_mul(b.checked_sub(mean_b)?)?;
            acc.checked_add(product)
        })
        .ok_or_else(|| overflow("covariance"))?;
    Ok(sum / Decimal::from(series_a.len() as i64))
}

/// Error for a return-derived quantity that leaves the decimal range.
pub(crate) fn overflow(context: &str) -> FundPairError {
    FundPairError::InvalidDataset(format!(
        "return magnitude overflows decimal range in {}",
        context
    ))
}

/// Square root via `MathematicalOps`, with non-positive inputs mapped to zero.
pub fn sqrt_decimal(value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    value.sqrt().unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_mean_basic() {
        let s = vec![dec!(0.01), dec!(0.02), dec!(0.03), dec!(0.04)];
        assert_eq!(mean(&s).unwrap(), dec!(0.025));
    }

    #[test]
    fn test_mean_empty_rejected() {
        assert!(matches!(
            mean(&[]),
            Err(FundPairError::InvalidDataset(_))
        ));
    }

    #[test]
    fn test_population_variance() {
        // deviations: -0.015, -0.005, 0.005, 0.015 -> squares sum 0.0005, /4
        let s = vec![dec!(0.01), dec!(0.02), dec!(0.03), dec!(0.04)];
        let m = mean(&s).unwrap();
        assert_eq!(variance(&s, m).unwrap(), dec!(0.000125));
    }

    #[test]
    fn test_variance_non_negative() {
        let samples = [
            vec![dec!(-0.2), dec!(0.4), dec!(0.05)],
            vec![dec!(1)],
            vec![dec!(0.3), dec!(0.3), dec!(0.3)],
            vec![dec!(-0.01), dec!(-0.07), dec!(0.12), dec!(0.003), dec!(0)],
        ];
        for s in &samples {
            let m = mean(s).unwrap();
            assert!(variance(s, m).unwrap() >= Decimal::ZERO);
        }
    }

    #[test]
    fn test_huge_returns_overflow_as_error() {
        let s = vec![dec!(1000000000000000), dec!(-1000000000000000)];
        let m = mean(&s).unwrap();
        assert!(matches!(variance(&s, m), Err(FundPairError::InvalidDataset(_))));
        assert!(matches!(
            covariance(&s, m, &s, m),
            Err(FundPairError::InvalidDataset(_))
        ));
        assert!(matches!(
            mean(&[Decimal::MAX, Decimal::MAX]),
            Err(FundPairError::InvalidDataset(_))
        ));
    }

    #[test]
    fn test_single_observation_has_zero_variance() {
        let s = vec![dec!(0.07)];
        let m = mean(&s).unwrap();
        assert_eq!(variance(&s, m).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_self_covariance_equals_variance() {
        let s = vec![dec!(0.013), dec!(-0.021), dec!(0.034), dec!(0.002), dec!(0.011)];
        let m = mean(&s).unwrap();
        assert_eq!(covariance(&s, m, &s, m).unwrap(), variance(&s, m).unwrap());
    }

    #[test]
    fn test_negative_covariance() {
        let a = vec![dec!(0.01), dec!(0.02), dec!(0.03), dec!(0.04)];
        let b = vec![dec!(0.04), dec!(0.03), dec!(0.02), dec!(0.01)];
        let ma = mean(&a).unwrap();
        let mb = mean(&b).unwrap();
        assert_eq!(covariance(&a, ma, &b, mb).unwrap(), dec!(-0.000125));
    }

    #[test]
    fn test_covariance_length_mismatch() {
        let a = vec![dec!(0.01), dec!(0.02)];
        let b = vec![dec!(0.01)];
        let err = covariance(&a, dec!(0.015), &b, dec!(0.01)).unwrap_err();
        match err {
            FundPairError::MismatchedSeriesLength { left, right, .. } => {
                assert_eq!((left, right), (2, 1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_covariance_empty() {
        assert!(covariance(&[], Decimal::ZERO, &[], Decimal::ZERO).is_err());
    }

    #[test]
    fn test_sqrt_decimal() {
        assert_eq!(sqrt_decimal(dec!(0)), Decimal::ZERO);
        assert_eq!(sqrt_decimal(dec!(-0.0001)), Decimal::ZERO);
        assert!((sqrt_decimal(dec!(0.04)) - dec!(0.2)).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_statistics_record() {
        let rec = StatisticsRecord::from_series(&[dec!(0.1), dec!(0.3)]).unwrap();
        assert_eq!(rec.mean, dec!(0.2));
        assert_eq!(rec.variance, dec!(0.01));
        assert!((rec.std_dev() - dec!(0.1)).abs() < dec!(0.0000000001));
    }
}
