//! Bar Chart Module
//! Horizontal bar figures: data availability, value counts, and the
//! two-sided population pyramid.

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use polars::prelude::DataFrame;
use std::path::Path;

use crate::charts::{draw_err, title_case, ChartError, ChartStyle};
use crate::stats::column_availability;

/// How bar values are printed on the axis and at bar ends.
#[derive(Clone, Copy)]
enum ValueFormat {
    /// Values are percentages in 0..100.
    Percent,
    /// Values are fractions in 0..1, shown as percentages.
    Fraction,
    /// Plain counts.
    Count,
}

impl ValueFormat {
    fn axis(self, value: f64) -> String {
        match self {
            ValueFormat::Percent => format!("{value:.0}%"),
            ValueFormat::Fraction => format!("{:.0}%", value * 100.0),
            ValueFormat::Count => format!("{value:.0}"),
        }
    }

    fn label(self, value: f64) -> String {
        match self {
            ValueFormat::Percent => format!("{value:.1}%"),
            ValueFormat::Fraction => format!("{:.1}%", value * 100.0),
            ValueFormat::Count => format!("{value:.0}"),
        }
    }
}

/// Bar plot of the percentage of available (non-null) data per column.
pub fn render_availability(
    df: &DataFrame,
    title: &str,
    style: &ChartStyle,
    path: &Path,
) -> Result<(), ChartError> {
    let availability = column_availability(df);
    let labels: Vec<String> = availability.iter().map(|(name, _)| name.clone()).collect();
    let values: Vec<f64> = availability.iter().map(|(_, pct)| *pct).collect();

    draw_horizontal_bars(
        &labels,
        &values,
        100.0,
        ValueFormat::Percent,
        title,
        "Columns",
        style,
        path,
    )
}

/// Bar plot of pre-counted values (counts or fractions), most frequent
/// first. Entries below `min_value` are dropped. `custom_ylabels`, when
/// given, replaces the bar labels positionally after sorting.
#[allow(clippy::too_many_arguments)]
pub fn render_value_counts(
    entries: &[(String, f64)],
    ylabel: &str,
    title: &str,
    percentage: bool,
    min_value: f64,
    custom_ylabels: Option<&[String]>,
    style: &ChartStyle,
    path: &Path,
) -> Result<(), ChartError> {
    let mut entries: Vec<(String, f64)> = entries
        .iter()
        .filter(|(_, value)| *value >= min_value)
        .cloned()
        .collect();
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let labels: Vec<String> = match custom_ylabels {
        Some(custom) => custom.to_vec(),
        None => entries.iter().map(|(label, _)| label.clone()).collect(),
    };
    if labels.len() != entries.len() {
        return Err(ChartError::InvalidInput(format!(
            "{} custom labels for {} bars",
            labels.len(),
            entries.len()
        )));
    }
    let values: Vec<f64> = entries.iter().map(|(_, value)| *value).collect();
    let x_max = values.iter().copied().fold(0.0f64, f64::max);

    let format = if percentage {
        ValueFormat::Fraction
    } else {
        ValueFormat::Count
    };
    draw_horizontal_bars(&labels, &values, x_max, format, title, ylabel, style, path)
}

/// Shared horizontal-bar scaffolding: one band per label, value labels at
/// bar ends (zeros stay unlabeled), topmost bar first.
#[allow(clippy::too_many_arguments)]
fn draw_horizontal_bars(
    labels: &[String],
    values: &[f64],
    x_max: f64,
    format: ValueFormat,
    title: &str,
    y_desc: &str,
    style: &ChartStyle,
    path: &Path,
) -> Result<(), ChartError> {
    let n = labels.len();
    if n == 0 || n != values.len() {
        return Err(ChartError::InvalidInput(
            "nothing to plot or label/value mismatch".into(),
        ));
    }
    if !(x_max > 0.0) {
        return Err(ChartError::InvalidInput("non-positive axis limit".into()));
    }

    // index 0 renders at the top
    let labels: Vec<String> = labels.iter().rev().cloned().collect();
    let values: Vec<f64> = values.iter().rev().copied().collect();

    let root = BitMapBackend::new(path, style.figure_size).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", style.title_font_size as i32))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(170)
        .build_cartesian_2d(0f64..x_max * 1.12, (0..n).into_segmented())
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n)
        .x_label_formatter(&|x| format.axis(*x))
        .y_label_formatter(&|segment| match segment {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                labels.get(*i).cloned().unwrap_or_default()
            }
            SegmentValue::Last => String::new(),
        })
        .y_desc(y_desc)
        .label_style(("sans-serif", style.label_font_size as i32))
        .draw()
        .map_err(draw_err)?;

    let color = style.color(0);
    chart
        .draw_series(values.iter().enumerate().map(|(i, &value)| {
            let mut bar = Rectangle::new(
                [
                    (0.0, SegmentValue::Exact(i)),
                    (value, SegmentValue::Exact(i + 1)),
                ],
                color.filled(),
            );
            bar.set_margin(4, 4, 0, 0);
            bar
        }))
        .map_err(draw_err)?;

    let label_style = ("sans-serif", style.label_font_size as i32)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Center));
    chart
        .draw_series(
            values
                .iter()
                .enumerate()
                .filter(|(_, value)| **value != 0.0)
                .map(|(i, &value)| {
                    Text::new(
                        format.label(value),
                        (value + x_max * 0.01, SegmentValue::CenterOf(i)),
                        label_style.clone(),
                    )
                }),
        )
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}

/// Two-sided population pyramid from a counts pivot.
///
/// The pivot's first column holds the band labels; `columns` names the
/// (left, right) count columns. Counts are normalized to percent of the
/// grand total across both sides; `x_max` bounds each side's axis.
pub fn render_population_pyramid(
    pivot: &DataFrame,
    columns: (&str, &str),
    x_max: f64,
    title: &str,
    style: &ChartStyle,
    path: &Path,
) -> Result<(), ChartError> {
    let n = pivot.height();
    if n == 0 {
        return Err(ChartError::InvalidInput("empty pivot table".into()));
    }
    if !(x_max > 0.0) {
        return Err(ChartError::InvalidInput("non-positive axis limit".into()));
    }

    let band_column = pivot
        .get_columns()
        .first()
        .ok_or_else(|| ChartError::InvalidInput("pivot has no columns".into()))?;
    let mut bands: Vec<String> = Vec::with_capacity(n);
    for i in 0..n {
        bands.push(band_column.get(i)?.to_string().trim_matches('"').to_string());
    }

    let left = side_percentages(pivot, columns.0)?;
    let right = side_percentages(pivot, columns.1)?;
    let total: f64 = left.iter().sum::<f64>() + right.iter().sum::<f64>();
    if total <= 0.0 {
        return Err(ChartError::InvalidInput("pivot counts are all zero".into()));
    }
    let left: Vec<f64> = left.iter().map(|v| v / total * 100.0).collect();
    let right: Vec<f64> = right.iter().map(|v| v / total * 100.0).collect();

    let root = BitMapBackend::new(path, style.figure_size).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;
    let root = root
        .titled(title, ("sans-serif", style.title_font_size as i32))
        .map_err(draw_err)?;
    let (left_area, right_area) = root.split_horizontally((style.figure_size.0 / 2) as i32);

    draw_pyramid_side(
        &left_area,
        &bands,
        &left,
        x_max,
        true,
        &side_title(columns.0, &left),
        style.color(0),
        style,
    )?;
    draw_pyramid_side(
        &right_area,
        &bands,
        &right,
        x_max,
        false,
        &side_title(columns.1, &right),
        style.color(1),
        style,
    )?;

    root.present().map_err(draw_err)?;
    Ok(())
}

fn side_percentages(pivot: &DataFrame, column: &str) -> Result<Vec<f64>, ChartError> {
    let values = pivot.column(column)?.cast(&polars::prelude::DataType::Float64)?;
    let values = values.f64()?;
    Ok(values.into_iter().map(|v| v.unwrap_or(0.0)).collect())
}

fn side_title(column: &str, percentages: &[f64]) -> String {
    format!(
        "{} (Total = {:.1}%)",
        title_case(column),
        percentages.iter().sum::<f64>()
    )
}

#[allow(clippy::too_many_arguments)]
fn draw_pyramid_side<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    bands: &[String],
    percentages: &[f64],
    x_max: f64,
    mirrored: bool,
    caption: &str,
    color: RGBColor,
    style: &ChartStyle,
) -> Result<(), ChartError> {
    let n = bands.len();
    // the mirrored side grows leftwards from zero
    let (x_range, sign) = if mirrored {
        (-x_max..0f64, -1.0)
    } else {
        (0f64..x_max, 1.0)
    };

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", style.label_font_size as i32 + 4))
        .margin(8)
        .x_label_area_size(35)
        .y_label_area_size(if mirrored { 10 } else { 55 })
        .build_cartesian_2d(x_range, (0..n).into_segmented())
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n)
        .x_labels(5)
        .x_label_formatter(&|x| format!("{:.0}%", x.abs()))
        .y_label_formatter(&|segment| match segment {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                if mirrored {
                    String::new()
                } else {
                    bands.get(*i).cloned().unwrap_or_default()
                }
            }
            SegmentValue::Last => String::new(),
        })
        .label_style(("sans-serif", style.label_font_size as i32))
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(percentages.iter().enumerate().map(|(i, &value)| {
            let mut bar = Rectangle::new(
                [
                    (0.0, SegmentValue::Exact(i)),
                    (sign * value, SegmentValue::Exact(i + 1)),
                ],
                color.filled(),
            );
            bar.set_margin(3, 3, 0, 0);
            bar
        }))
        .map_err(draw_err)?;

    let anchor = if mirrored { HPos::Right } else { HPos::Left };
    let label_style = ("sans-serif", style.label_font_size as i32)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(anchor, VPos::Center));
    chart
        .draw_series(
            percentages
                .iter()
                .enumerate()
                .filter(|(_, value)| **value != 0.0)
                .map(|(i, &value)| {
                    Text::new(
                        format!("{value:.1}%"),
                        (sign * (value + x_max * 0.015), SegmentValue::CenterOf(i)),
                        label_style.clone(),
                    )
                }),
        )
        .map_err(draw_err)?;

    Ok(())
}
