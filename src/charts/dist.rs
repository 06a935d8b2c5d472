//! Distribution Chart Module
//! Overlaid per-group histograms with Gaussian KDE curves.

use plotters::prelude::*;
use polars::prelude::DataFrame;
use std::path::Path;

use crate::charts::{draw_err, title_case, ChartError, ChartStyle};
use crate::stats::{gaussian_kde, histogram, group_values};

const KDE_GRID_LEN: usize = 200;

/// Histogram of a numeric column split by a two-value hue column, drawn as
/// translucent overlaid bars with a KDE curve per group.
///
/// `hue_order` fixes which group gets the first palette color. Without an
/// explicit `binwidth` the combined range is split into 20 bins. Null and
/// non-finite values are ignored; a hue value with no data is skipped.
#[allow(clippy::too_many_arguments)]
pub fn render_group_histogram(
    df: &DataFrame,
    x: &str,
    hue: &str,
    hue_order: (&str, &str),
    binwidth: Option<f64>,
    title: &str,
    xlabel: Option<&str>,
    style: &ChartStyle,
    path: &Path,
) -> Result<(), ChartError> {
    let groups = [
        (hue_order.0, group_values(df, x, hue, hue_order.0)?),
        (hue_order.1, group_values(df, x, hue, hue_order.1)?),
    ];
    let combined: Vec<f64> = groups
        .iter()
        .flat_map(|(_, values)| values.iter().copied())
        .filter(|v| v.is_finite())
        .collect();
    if combined.is_empty() {
        return Err(ChartError::InvalidInput(format!(
            "no finite values of '{x}' for hues '{}'/'{}'",
            hue_order.0, hue_order.1
        )));
    }

    let data_min = combined.iter().copied().fold(f64::INFINITY, f64::min);
    let data_max = combined.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = data_max - data_min;
    let binwidth = binwidth.unwrap_or(if span > 0.0 { span / 20.0 } else { 1.0 });
    if binwidth <= 0.0 {
        return Err(ChartError::InvalidInput("non-positive binwidth".into()));
    }

    let histograms: Vec<_> = groups
        .iter()
        .map(|(name, values)| (*name, values, histogram(values, binwidth)))
        .collect();

    let y_max = histograms
        .iter()
        .map(|(_, _, hist)| hist.max_count())
        .max()
        .unwrap_or(0)
        .max(1) as f64
        * 1.15;
    let x_min = histograms
        .iter()
        .filter_map(|(_, _, hist)| hist.edges.first().copied())
        .fold(f64::INFINITY, f64::min)
        .min(data_min);
    let x_max = histograms
        .iter()
        .filter_map(|(_, _, hist)| hist.edges.last().copied())
        .fold(f64::NEG_INFINITY, f64::max)
        .max(data_max);

    let root = BitMapBackend::new(path, style.figure_size).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", style.title_font_size as i32))
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, 0f64..y_max)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc(xlabel.map(str::to_string).unwrap_or_else(|| title_case(x)))
        .y_desc("Count")
        .label_style(("sans-serif", style.label_font_size as i32))
        .draw()
        .map_err(draw_err)?;

    for (index, (name, values, hist)) in histograms.iter().enumerate() {
        if hist.counts.is_empty() {
            continue;
        }
        let color = style.color(index);

        chart
            .draw_series(hist.counts.iter().enumerate().filter_map(|(bin, &count)| {
                if count == 0 {
                    return None;
                }
                Some(Rectangle::new(
                    [
                        (hist.edges[bin], 0.0),
                        (hist.edges[bin + 1], count as f64),
                    ],
                    color.mix(0.5).filled(),
                ))
            }))
            .map_err(draw_err)?
            .label(title_case(name))
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.mix(0.6).filled())
            });

        // KDE scaled from density to counts so it overlays the bars
        let scale = values.len() as f64 * binwidth;
        let curve = gaussian_kde(values, KDE_GRID_LEN);
        if !curve.is_empty() {
            chart
                .draw_series(LineSeries::new(
                    curve.into_iter().map(|(x, density)| (x, density * scale)),
                    color.stroke_width(2),
                ))
                .map_err(draw_err)?;
        }
    }

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.85))
        .position(SeriesLabelPosition::UpperRight)
        .label_font(("sans-serif", style.label_font_size as i32))
        .draw()
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}
