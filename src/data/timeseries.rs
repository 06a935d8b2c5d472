//! Timeseries Expander Module
//! Turns accumulated daily-count tables into combined accumulated/new tables.

use polars::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimeseriesError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("No columns given to expand")]
    EmptyExpand,
}

/// Expand accumulated timeseries columns into daily increments.
///
/// For every column in `expand`, the day-over-day difference is computed
/// along the existing row order, per `grouping` group when one is given. The
/// first row of each group, where no previous value exists, keeps its
/// original accumulated value (the cumulative delta from zero). Deltas are
/// cast to integers and prefixed with `new_`; the original columns (plus a
/// derived `{num}_to_{den}_ratio` column, computed on both tables) are
/// prefixed with `accumulated_`. The output has the same height and row
/// order as the input.
///
/// Rows are assumed date-ascending within each group; on unsorted input the
/// deltas follow row order, so sort before calling.
pub fn expand_daily(
    df: &DataFrame,
    expand: &[&str],
    ratio: (&str, &str),
    grouping: Option<&str>,
) -> Result<DataFrame, TimeseriesError> {
    if expand.is_empty() {
        return Err(TimeseriesError::EmptyExpand);
    }
    let (num, den) = ratio;
    let ratio_name = format!("{num}_to_{den}_ratio");
    let new_num = format!("new_{num}");
    let new_den = format!("new_{den}");
    let new_ratio_name = format!("new_{ratio_name}");

    let daily = |name: &str| {
        let delta = col(name) - col(name).shift(lit(1));
        let delta = match grouping {
            Some(group) => delta.over([col(group)]),
            None => delta,
        };
        delta.fill_null(col(name)).cast(DataType::Int64)
    };

    let new_columns: Vec<Expr> = expand
        .iter()
        .map(|name| daily(name).alias(format!("new_{name}")))
        .collect();

    let mut out = df
        .clone()
        .lazy()
        .with_columns([(col(num).cast(DataType::Float64) / col(den).cast(DataType::Float64))
            .alias(ratio_name.as_str())])
        .with_columns(new_columns)
        .with_columns([(col(new_num.as_str()).cast(DataType::Float64)
            / col(new_den.as_str()).cast(DataType::Float64))
        .alias(new_ratio_name.as_str())])
        .collect()?;

    for name in expand.iter().copied().chain([ratio_name.as_str()]) {
        out.rename(name, format!("accumulated_{name}").into())?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use polars::df;

    fn i64_values(df: &DataFrame, column: &str) -> Vec<i64> {
        df.column(column)
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .map(|value| value.unwrap())
            .collect()
    }

    #[test]
    fn ungrouped_expansion_with_first_row_fallback() {
        let df = df!(
            "date" => ["2020-01-20", "2020-01-21", "2020-01-22"],
            "confirmed" => [10i64, 15, 23],
            "test" => [20i64, 60, 100],
        )
        .unwrap();

        let out = expand_daily(&df, &["confirmed", "test"], ("confirmed", "test"), None).unwrap();

        assert_eq!(out.height(), df.height());
        assert_eq!(i64_values(&out, "new_confirmed"), vec![10, 5, 8]);
        assert_eq!(i64_values(&out, "new_test"), vec![20, 40, 40]);
        assert_eq!(
            i64_values(&out, "accumulated_confirmed"),
            vec![10, 15, 23]
        );
    }

    #[test]
    fn grouped_expansion_restarts_per_group() {
        let df = df!(
            "age" => ["20s", "20s", "20s", "50s", "50s", "50s"],
            "confirmed" => [5i64, 7, 12, 3, 9, 10],
            "deceased" => [1i64, 1, 2, 1, 3, 4],
        )
        .unwrap();

        let out = expand_daily(&df, &["confirmed"], ("confirmed", "deceased"), Some("age")).unwrap();

        assert_eq!(i64_values(&out, "new_confirmed"), vec![5, 2, 5, 3, 6, 1]);
    }

    #[test]
    fn ratio_columns_on_both_tables() {
        let df = df!(
            "confirmed" => [10i64, 15],
            "test" => [20i64, 40],
        )
        .unwrap();

        let out = expand_daily(&df, &["confirmed", "test"], ("confirmed", "test"), None).unwrap();

        let accumulated = out
            .column("accumulated_confirmed_to_test_ratio")
            .unwrap()
            .f64()
            .unwrap();
        assert_approx_eq!(accumulated.get(0).unwrap(), 0.5, 1e-12);
        assert_approx_eq!(accumulated.get(1).unwrap(), 0.375, 1e-12);

        let new = out
            .column("new_confirmed_to_test_ratio")
            .unwrap()
            .f64()
            .unwrap();
        assert_approx_eq!(new.get(0).unwrap(), 0.5, 1e-12);
        assert_approx_eq!(new.get(1).unwrap(), 0.25, 1e-12);
    }

    #[test]
    fn increments_reconstruct_accumulated_values() {
        let df = df!(
            "confirmed" => [10i64, 15, 23, 40],
            "test" => [100i64, 150, 230, 400],
        )
        .unwrap();

        let out = expand_daily(&df, &["confirmed"], ("confirmed", "test"), None).unwrap();
        let accumulated = i64_values(&out, "accumulated_confirmed");
        let new = i64_values(&out, "new_confirmed");

        let mut running = accumulated[0];
        for i in 1..accumulated.len() {
            running += new[i];
            assert_eq!(running, accumulated[i]);
        }
    }

    #[test]
    fn empty_expand_list_is_rejected() {
        let df = df!("confirmed" => [1i64]).unwrap();
        let result = expand_daily(&df, &[], ("confirmed", "confirmed"), None);
        assert!(matches!(result, Err(TimeseriesError::EmptyExpand)));
    }

    #[test]
    fn zero_denominator_follows_float_semantics() {
        let df = df!(
            "confirmed" => [0i64, 5],
            "test" => [0i64, 10],
        )
        .unwrap();

        let out = expand_daily(&df, &["confirmed", "test"], ("confirmed", "test"), None).unwrap();
        let ratio = out
            .column("accumulated_confirmed_to_test_ratio")
            .unwrap()
            .f64()
            .unwrap();
        assert!(ratio.get(0).unwrap().is_nan());
    }
}
