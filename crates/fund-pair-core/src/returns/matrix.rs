use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FundPairError;
use crate::returns::dataset::{coerce_return, time_label, Dataset};
use crate::FundPairResult;

/// Column excluded from the fund set unless the caller names another.
pub const DEFAULT_TIME_COLUMN: &str = "Date";

pub fn default_time_column() -> String {
    DEFAULT_TIME_COLUMN.to_string()
}

/// Time-indexed return table.
///
/// Rows without a usable time label are dropped as a whole; individual
/// unparseable cells stay in place as `None` so every fund keeps the same
/// period index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnMatrix {
    pub time_column: String,
    pub periods: Vec<String>,
    pub funds: Vec<String>,
    /// Fund-major: `values[fund][period]`.
    pub values: Vec<Vec<Option<Decimal>>>,
    pub dropped_rows: usize,
}

/// Build the return matrix from a parsed dataset.
pub fn build_return_matrix(dataset: &Dataset, time_column: &str) -> FundPairResult<ReturnMatrix> {
    if dataset.rows.is_empty() {
        return Err(FundPairError::InvalidDataset(
            "dataset has no data rows".into(),
        ));
    }

    let header = dataset.header();
    if !header.iter().any(|h| h == time_column) {
        return Err(FundPairError::InvalidDataset(format!(
            "time column '{}' not found in header",
            time_column
        )));
    }

    let funds: Vec<String> = header
        .into_iter()
        .filter(|h| h != time_column)
        .collect();
    if funds.is_empty() {
        return Err(FundPairError::InvalidDataset(format!(
            "no fund columns besides '{}'",
            time_column
        )));
    }

    let mut periods: Vec<String> = Vec::with_capacity(dataset.rows.len());
    let mut values: Vec<Vec<Option<Decimal>>> =
        vec![Vec::with_capacity(dataset.rows.len()); funds.len()];
    let mut dropped_rows = 0usize;

    for row in &dataset.rows {
        let Some(label) = time_label(row.get(time_column)) else {
            dropped_rows += 1;
            continue;
        };
        periods.push(label);
        for (fund, column) in funds.iter().zip(values.iter_mut()) {
            column.push(row.get(fund).and_then(coerce_return));
        }
    }

    if periods.is_empty() {
        return Err(FundPairError::InvalidDataset(format!(
            "no row has a valid '{}' label",
            time_column
        )));
    }

    for (fund, column) in funds.iter().zip(values.iter()) {
        if column.iter().all(Option::is_none) {
            return Err(FundPairError::InvalidDataset(format!(
                "fund '{}' has no numeric observations",
                fund
            )));
        }
    }

    Ok(ReturnMatrix {
        time_column: time_column.to_string(),
        periods,
        funds,
        values,
        dropped_rows,
    })
}

impl ReturnMatrix {
    pub fn period_count(&self) -> usize {
        self.periods.len()
    }

    pub fn fund_index(&self, fund: &str) -> Option<usize> {
        self.funds.iter().position(|f| f == fund)
    }

    fn require_index(&self, fund: &str) -> FundPairResult<usize> {
        self.fund_index(fund)
            .ok_or_else(|| FundPairError::InvalidInput {
                field: "fund".into(),
                reason: format!("unknown fund '{}'", fund),
            })
    }

    /// Compacted observations of one fund, missing periods removed.
    pub fn series(&self, fund: &str) -> FundPairResult<Vec<Decimal>> {
        let idx = self.require_index(fund)?;
        Ok(self.series_at(idx))
    }

    pub fn series_at(&self, idx: usize) -> Vec<Decimal> {
        self.values[idx].iter().flatten().copied().collect()
    }

    pub fn observations_at(&self, idx: usize) -> usize {
        self.values[idx].iter().filter(|v| v.is_some()).count()
    }

    pub fn missing_at(&self, idx: usize) -> usize {
        self.period_count() - self.observations_at(idx)
    }

    /// Observations of two funds restricted to the periods where both have a
    /// value. The returned vectors always have equal length.
    pub fn aligned_pair(&self, a: &str, b: &str) -> FundPairResult<(Vec<Decimal>, Vec<Decimal>)> {
        let ia = self.require_index(a)?;
        let ib = self.require_index(b)?;
        Ok(self.aligned_pair_at(ia, ib))
    }

    pub fn aligned_pair_at(&self, a: usize, b: usize) -> (Vec<Decimal>, Vec<Decimal>) {
        self.values[a]
            .iter()
            .zip(self.values[b].iter())
            .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
            .unzip()
    }
}
