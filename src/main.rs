//! covid-eda pipeline - loads the dataset, derives the helper columns, and
//! renders the standard figure set plus a combined report sheet.

use anyhow::{bail, Context, Result};
use covid_eda::charts::{
    compose_report, render_availability, render_case_map, render_group_histogram,
    render_new_vs_accumulated, render_population_pyramid, render_value_counts, ChartError,
    ChartStyle,
};
use covid_eda::data::{expand_daily, load_case_data, load_patient_info, load_time_data};
use covid_eda::stats::{pivot_counts, value_counts};
use log::info;
use polars::prelude::{DataFrame, DataType};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()?;

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 5 {
        bail!("usage: covid-eda <cases.csv> <patients.csv> <time.csv> <out-dir> [style.json]");
    }
    let out_dir = PathBuf::from(&args[4]);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let style = match args.get(5) {
        Some(path) => load_style(path)?,
        None => ChartStyle::default(),
    };

    let cases = load_case_data(&args[1])?;
    let patients = load_patient_info(&args[2])?;
    let time = load_time_data(&args[3])?;
    let time = expand_daily(
        &time,
        &["test", "confirmed", "released", "deceased"],
        ("confirmed", "test"),
        None,
    )?;

    let age_sex = pivot_counts(&patients, "age", "sex")?;
    let pyramid_max = pyramid_axis_limit(&age_sex)?;
    let case_counts: Vec<(String, f64)> = value_counts(&cases, "infection_case")?
        .into_iter()
        .map(|(label, count)| (label, count as f64))
        .collect();

    let jobs: Vec<(
        &str,
        Box<dyn Fn(&Path) -> std::result::Result<(), ChartError> + Send + Sync + '_>,
    )> = vec![
        (
            "cases_availability.png",
            Box::new(|path| {
                render_availability(&cases, "Available data: infection cases", &style, path)
            }),
        ),
        (
            "patients_availability.png",
            Box::new(|path| render_availability(&patients, "Available data: patients", &style, path)),
        ),
        (
            "infection_case_counts.png",
            Box::new(|path| {
                render_value_counts(
                    &case_counts,
                    "Infection case",
                    "Confirmed cases by infection case",
                    false,
                    2.0,
                    None,
                    &style,
                    path,
                )
            }),
        ),
        (
            "age_pyramid.png",
            Box::new(|path| {
                render_population_pyramid(
                    &age_sex,
                    ("male", "female"),
                    pyramid_max,
                    "Patients by age and sex",
                    &style,
                    path,
                )
            }),
        ),
        (
            "released_days_hist.png",
            Box::new(|path| {
                render_group_histogram(
                    &patients,
                    "confirmed_to_released",
                    "sex",
                    ("male", "female"),
                    None,
                    "Days from confirmation to release",
                    Some("Days"),
                    &style,
                    path,
                )
            }),
        ),
        (
            "confirmed_timeline.png",
            Box::new(|path| {
                render_new_vs_accumulated(
                    &time,
                    "date",
                    "new_confirmed",
                    "accumulated_confirmed",
                    "Confirmed cases over time",
                    &style,
                    path,
                )
            }),
        ),
        (
            "case_map.png",
            Box::new(|path| {
                render_case_map(
                    &cases,
                    "latitude",
                    "longitude",
                    "confirmed",
                    Some("province"),
                    40,
                    "Infection case clusters",
                    &style,
                    path,
                )
            }),
        ),
    ];

    let failures: Vec<String> = jobs
        .par_iter()
        .filter_map(|(name, job)| {
            let path = out_dir.join(name);
            match job(&path) {
                Ok(()) => {
                    info!("rendered {}", path.display());
                    None
                }
                Err(error) => Some(format!("{name}: {error}")),
            }
        })
        .collect();
    if !failures.is_empty() {
        bail!(
            "{} chart(s) failed: {}",
            failures.len(),
            failures.join("; ")
        );
    }

    let rendered: Vec<PathBuf> = jobs.iter().map(|(name, _)| out_dir.join(name)).collect();
    let report = out_dir.join("report.png");
    compose_report(&rendered, 1600, &report)?;
    info!("report sheet written to {}", report.display());

    Ok(())
}

fn load_style(path: &str) -> Result<ChartStyle> {
    let file =
        std::fs::File::open(path).with_context(|| format!("opening style file {path}"))?;
    let style =
        serde_json::from_reader(file).with_context(|| format!("parsing style file {path}"))?;
    Ok(style)
}

/// Axis limit for the pyramid: the largest cell's share of the grand total,
/// with a third of headroom for the value labels.
fn pyramid_axis_limit(pivot: &DataFrame) -> Result<f64> {
    let mut grand_total = 0.0;
    let mut max_cell = 0.0f64;
    for column in pivot.get_columns().iter().skip(1) {
        let values = column.cast(&DataType::Float64)?;
        let values = values.f64()?;
        for value in values.into_iter().flatten() {
            grand_total += value;
            max_cell = max_cell.max(value);
        }
    }
    if grand_total <= 0.0 {
        bail!("age/sex pivot holds no counts");
    }
    Ok((max_cell / grand_total * 100.0 * 1.3).ceil())
}
