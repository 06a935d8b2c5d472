//! Timeline Chart Module
//! Daily bars against an accumulated line on a secondary axis.

use chrono::{Days, NaiveDate};
use plotters::prelude::*;
use polars::prelude::DataFrame;
use std::path::Path;

use crate::charts::{draw_err, title_case, ChartError, ChartStyle};

/// Dual-axis timeseries figure: the `new` column as daily bars on the left
/// axis and the `accumulated` column as a line on the right axis, sharing a
/// date x-axis. Rows where any of the three columns is null are skipped.
pub fn render_new_vs_accumulated(
    df: &DataFrame,
    date_col: &str,
    new: &str,
    accumulated: &str,
    title: &str,
    style: &ChartStyle,
    path: &Path,
) -> Result<(), ChartError> {
    let dates = df.column(date_col)?.as_materialized_series().clone();
    let dates = dates.date()?;
    let new_values = df.column(new)?.cast(&polars::prelude::DataType::Float64)?;
    let new_values = new_values.f64()?;
    let acc_values = df
        .column(accumulated)?
        .cast(&polars::prelude::DataType::Float64)?;
    let acc_values = acc_values.f64()?;

    let mut rows: Vec<(NaiveDate, f64, f64)> = Vec::with_capacity(df.height());
    for ((date, new_value), acc_value) in dates
        .as_date_iter()
        .zip(new_values.into_iter())
        .zip(acc_values.into_iter())
    {
        if let (Some(date), Some(new_value), Some(acc_value)) = (date, new_value, acc_value) {
            rows.push((date, new_value, acc_value));
        }
    }
    if rows.is_empty() {
        return Err(ChartError::InvalidInput(format!(
            "no complete rows of '{date_col}'/'{new}'/'{accumulated}'"
        )));
    }

    let first = rows.iter().map(|(date, _, _)| *date).min().unwrap_or(rows[0].0);
    let mut last = rows.iter().map(|(date, _, _)| *date).max().unwrap_or(rows[0].0);
    last = last + Days::new(1);
    let new_max = rows.iter().map(|(_, v, _)| *v).fold(0.0f64, f64::max).max(1.0);
    let acc_max = rows.iter().map(|(_, _, v)| *v).fold(0.0f64, f64::max).max(1.0);

    let root = BitMapBackend::new(path, style.figure_size).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", style.title_font_size as i32))
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(65)
        .right_y_label_area_size(65)
        .build_cartesian_2d(first..last, 0f64..new_max * 1.05)
        .map_err(draw_err)?
        .set_secondary_coord(first..last, 0f64..acc_max * 1.05);

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Date")
        .y_desc(title_case(new))
        .x_labels(8)
        .x_label_formatter(&|date| date.format("%b %d").to_string())
        .label_style(("sans-serif", style.label_font_size as i32))
        .draw()
        .map_err(draw_err)?;
    chart
        .configure_secondary_axes()
        .y_desc(title_case(accumulated))
        .label_style(("sans-serif", style.label_font_size as i32))
        .draw()
        .map_err(draw_err)?;

    let bar_color = style.color(0);
    chart
        .draw_series(rows.iter().map(|&(date, new_value, _)| {
            Rectangle::new(
                [(date, 0.0), (date + Days::new(1), new_value)],
                bar_color.mix(0.6).filled(),
            )
        }))
        .map_err(draw_err)?
        .label(title_case(new))
        .legend(move |(x, y)| {
            Rectangle::new([(x, y - 5), (x + 12, y + 5)], bar_color.mix(0.6).filled())
        });

    let line_color = style.color(1);
    chart
        .draw_secondary_series(LineSeries::new(
            rows.iter().map(|&(date, _, acc_value)| (date, acc_value)),
            line_color.stroke_width(2),
        ))
        .map_err(draw_err)?
        .label(title_case(accumulated))
        .legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + 12, y)], line_color.stroke_width(2))
        });

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.85))
        .position(SeriesLabelPosition::UpperLeft)
        .label_font(("sans-serif", style.label_font_size as i32))
        .draw()
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{expand_daily, load_time_data};
    use std::io::Write;

    #[test]
    fn timeline_renders_from_expanded_table() {
        let csv = "\
date,test,confirmed
2020-01-20,10,1
2020-01-21,25,4
2020-01-22,60,10
2020-01-23,130,16
";
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{csv}").unwrap();
        let time = load_time_data(file.path().to_str().unwrap()).unwrap();
        let time = expand_daily(&time, &["test", "confirmed"], ("confirmed", "test"), None).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timeline.png");
        render_new_vs_accumulated(
            &time,
            "date",
            "new_confirmed",
            "accumulated_confirmed",
            "Confirmed cases",
            &ChartStyle::default(),
            &path,
        )
        .unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn empty_table_is_rejected() {
        let csv = "date,confirmed\n2020-01-20,\n";
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{csv}").unwrap();
        let time = load_time_data(file.path().to_str().unwrap()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let result = render_new_vs_accumulated(
            &time,
            "date",
            "confirmed",
            "confirmed",
            "t",
            &ChartStyle::default(),
            &dir.path().join("empty.png"),
        );
        assert!(matches!(result, Err(ChartError::InvalidInput(_))));
    }
}
