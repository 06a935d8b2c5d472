//! Stats module - summaries and density estimates feeding the charts

mod density;
mod summary;

pub use density::{gaussian_kde, histogram, Histogram};
pub use summary::{column_availability, group_values, pivot_counts, value_counts};
