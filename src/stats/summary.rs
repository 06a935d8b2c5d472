//! Summary Statistics Module
//! Table summaries feeding the chart functions.

use polars::prelude::*;
use std::collections::HashMap;

use crate::data::AgeBand;

/// Percentage of non-null values per column, in column order.
pub fn column_availability(df: &DataFrame) -> Vec<(String, f64)> {
    let height = df.height();
    df.get_columns()
        .iter()
        .map(|column| {
            let pct = if height == 0 {
                0.0
            } else {
                (1.0 - column.null_count() as f64 / height as f64) * 100.0
            };
            (column.name().to_string(), pct)
        })
        .collect()
}

/// Count rows per distinct non-null value of a column, most frequent first.
/// Ties break on the value itself so the order is deterministic.
pub fn value_counts(df: &DataFrame, column: &str) -> PolarsResult<Vec<(String, u32)>> {
    let series = df.column(column)?.as_materialized_series().clone();

    let mut counts: HashMap<String, u32> = HashMap::new();
    for i in 0..series.len() {
        let value = series.get(i)?;
        if value.is_null() {
            continue;
        }
        let value = value.to_string().trim_matches('"').to_string();
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut counts: Vec<(String, u32)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(counts)
}

/// Cross-tabulate row counts of `index` values against `column` values.
///
/// The output holds the `index` labels in its first column and one count
/// column per distinct `column` value (sorted). When every index label is an
/// age band, rows follow band rank order instead of lexical order.
pub fn pivot_counts(df: &DataFrame, index: &str, column: &str) -> PolarsResult<DataFrame> {
    let rows = df.column(index)?.as_materialized_series().clone();
    let cols = df.column(column)?.as_materialized_series().clone();

    let mut cells: HashMap<(String, String), u32> = HashMap::new();
    let mut row_labels: Vec<String> = Vec::new();
    let mut col_labels: Vec<String> = Vec::new();

    for i in 0..df.height() {
        let (row, col) = (rows.get(i)?, cols.get(i)?);
        if row.is_null() || col.is_null() {
            continue;
        }
        let row = row.to_string().trim_matches('"').to_string();
        let col = col.to_string().trim_matches('"').to_string();
        if !row_labels.contains(&row) {
            row_labels.push(row.clone());
        }
        if !col_labels.contains(&col) {
            col_labels.push(col.clone());
        }
        *cells.entry((row, col)).or_insert(0) += 1;
    }

    if row_labels
        .iter()
        .all(|label| AgeBand::parse(label).is_some())
    {
        row_labels.sort_by_key(|label| AgeBand::parse(label).map(AgeBand::rank));
    } else {
        row_labels.sort();
    }
    col_labels.sort();

    let mut columns = vec![Column::new(index.into(), row_labels.clone())];
    for col_label in &col_labels {
        let values: Vec<u32> = row_labels
            .iter()
            .map(|row_label| {
                cells
                    .get(&(row_label.clone(), col_label.clone()))
                    .copied()
                    .unwrap_or(0)
            })
            .collect();
        columns.push(Column::new(col_label.as_str().into(), values));
    }

    DataFrame::new(columns)
}

/// Non-null values of `value_col` for the rows where `group_col` equals
/// `group`, as floats.
pub fn group_values(
    df: &DataFrame,
    value_col: &str,
    group_col: &str,
    group: &str,
) -> PolarsResult<Vec<f64>> {
    let filtered = df
        .clone()
        .lazy()
        .filter(col(group_col).cast(DataType::String).eq(lit(group)))
        .select([col(value_col).cast(DataType::Float64)])
        .collect()?;

    Ok(filtered
        .column(value_col)?
        .f64()?
        .into_iter()
        .flatten()
        .collect())
}
