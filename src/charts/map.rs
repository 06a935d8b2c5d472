//! Map Chart Module
//! Geographic scatter of case clusters; dot area tracks the confirmed count.

use plotters::prelude::*;
use polars::prelude::{DataFrame, DataType};
use std::path::Path;

use crate::charts::{draw_err, ChartError, ChartStyle};

/// Scatter of `lat`/`lon` coordinates with dot area proportional to `size`
/// and an optional categorical color column. Rows missing a coordinate or
/// the size value are skipped; dot radius is capped at `size_max` pixels.
///
/// The projection is a plain lon/lat plane; no tile basemap is drawn.
#[allow(clippy::too_many_arguments)]
pub fn render_case_map(
    df: &DataFrame,
    lat: &str,
    lon: &str,
    size: &str,
    color_by: Option<&str>,
    size_max: u32,
    title: &str,
    style: &ChartStyle,
    path: &Path,
) -> Result<(), ChartError> {
    let lats = float_values(df, lat)?;
    let lons = float_values(df, lon)?;
    let sizes = float_values(df, size)?;
    let categories = match color_by {
        Some(column) => Some(string_values(df, column)?),
        None => None,
    };

    let mut dots: Vec<(f64, f64, f64, Option<String>)> = Vec::new();
    for i in 0..df.height() {
        if let (Some(lat), Some(lon), Some(size)) = (lats[i], lons[i], sizes[i]) {
            let category = categories.as_ref().and_then(|values| values[i].clone());
            dots.push((lon, lat, size.max(0.0), category));
        }
    }
    if dots.is_empty() {
        return Err(ChartError::InvalidInput(
            "no rows with coordinates to map".into(),
        ));
    }

    let (lon_min, lon_max) = padded_bounds(dots.iter().map(|dot| dot.0));
    let (lat_min, lat_max) = padded_bounds(dots.iter().map(|dot| dot.1));
    let size_cap = dots.iter().map(|dot| dot.2).fold(0.0f64, f64::max).max(1.0);

    let root = BitMapBackend::new(path, style.figure_size).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", style.title_font_size as i32))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(lon_min..lon_max, lat_min..lat_max)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .x_desc("Longitude")
        .y_desc("Latitude")
        .x_labels(6)
        .y_labels(6)
        .light_line_style(RGBColor(230, 230, 230))
        .label_style(("sans-serif", style.label_font_size as i32))
        .draw()
        .map_err(draw_err)?;

    // area-true scaling: radius grows with the square root of the count
    let radius_of =
        move |value: f64| (((value / size_cap).sqrt() * size_max as f64) as i32).max(2);

    let mut groups: Vec<Option<String>> = Vec::new();
    for (_, _, _, category) in &dots {
        if !groups.contains(category) {
            groups.push(category.clone());
        }
    }
    groups.sort();

    for (index, group) in groups.iter().enumerate() {
        let color = style.color(index);
        let series = chart
            .draw_series(
                dots.iter()
                    .filter(|(_, _, _, category)| category == group)
                    .map(|&(lon, lat, size, _)| {
                        Circle::new((lon, lat), radius_of(size), color.mix(0.5).filled())
                    }),
            )
            .map_err(draw_err)?;
        if let Some(name) = group {
            let name = name.clone();
            series.label(name).legend(move |(x, y)| {
                Circle::new((x + 6, y), 5, color.mix(0.7).filled())
            });
        }
    }

    if groups.iter().any(Option::is_some) {
        chart
            .configure_series_labels()
            .border_style(BLACK)
            .background_style(WHITE.mix(0.85))
            .position(SeriesLabelPosition::UpperRight)
            .label_font(("sans-serif", style.label_font_size as i32))
            .draw()
            .map_err(draw_err)?;
    }

    root.present().map_err(draw_err)?;
    Ok(())
}

fn float_values(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>, ChartError> {
    let values = df.column(column)?.cast(&DataType::Float64)?;
    let values = values.f64()?;
    Ok(values.into_iter().collect())
}

fn string_values(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>, ChartError> {
    let series = df.column(column)?.as_materialized_series().clone();
    let mut values = Vec::with_capacity(series.len());
    for i in 0..series.len() {
        let value = series.get(i)?;
        if value.is_null() {
            values.push(None);
        } else {
            values.push(Some(value.to_string().trim_matches('"').to_string()));
        }
    }
    Ok(values)
}

fn padded_bounds(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let min = values.clone().fold(f64::INFINITY, f64::min);
    let max = values.fold(f64::NEG_INFINITY, f64::max);
    let pad = ((max - min) * 0.05).max(0.05);
    (min - pad, max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn map_renders_and_skips_missing_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let df = df!(
            "latitude" => [Some(37.538621f64), None, Some(35.158), Some(37.48)],
            "longitude" => [Some(126.992652f64), None, Some(129.043), Some(126.89)],
            "confirmed" => [Some(139i64), Some(12), Some(30), Some(8)],
            "province" => ["Seoul", "Seoul", "Busan", "Seoul"],
        )
        .unwrap();

        let path = dir.path().join("map.png");
        render_case_map(
            &df,
            "latitude",
            "longitude",
            "confirmed",
            Some("province"),
            40,
            "Infection case clusters",
            &ChartStyle::default(),
            &path,
        )
        .unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn map_without_coordinates_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let df = df!(
            "latitude" => [None::<f64>],
            "longitude" => [None::<f64>],
            "confirmed" => [1i64],
        )
        .unwrap();

        let result = render_case_map(
            &df,
            "latitude",
            "longitude",
            "confirmed",
            None,
            40,
            "t",
            &ChartStyle::default(),
            &dir.path().join("empty.png"),
        );
        assert!(matches!(result, Err(ChartError::InvalidInput(_))));
    }
}
