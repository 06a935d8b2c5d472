//! Charts module - static figure rendering

mod bars;
mod dist;
mod map;
mod report;
mod style;
mod timeline;

pub use bars::{render_availability, render_population_pyramid, render_value_counts};
pub use dist::render_group_histogram;
pub use map::render_case_map;
pub use report::compose_report;
pub use style::ChartStyle;
pub use timeline::render_new_vs_accumulated;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    InvalidInput(String),
}

/// Plotters error types are generic over the backend; charts flatten them
/// into [`ChartError::Draw`] through this adapter.
pub(crate) fn draw_err<E: std::fmt::Display>(error: E) -> ChartError {
    ChartError::Draw(error.to_string())
}

/// "confirmed_to_released" -> "Confirmed To Released", the axis-label casing
/// used across the figures.
pub(crate) fn title_case(name: &str) -> String {
    name.split(['_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::title_case;

    #[test]
    fn title_case_replaces_underscores() {
        assert_eq!(title_case("confirmed_to_released"), "Confirmed To Released");
        assert_eq!(title_case("sex"), "Sex");
        assert_eq!(title_case(""), "");
    }
}
