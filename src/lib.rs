//! covid-eda - exploratory-analysis helpers for the South-Korean COVID-19
//! dataset.
//!
//! Three layers, all synchronous and stateless:
//! * [`data`] loads and cleans the infection-case, patient, and timeseries
//!   CSV tables and expands accumulated counts into daily increments;
//! * [`stats`] computes the table summaries the figures are built from;
//! * [`charts`] renders the figures (bars, pyramid, histogram, dual-axis
//!   timeline, cluster map) to PNG and composes the report sheet.

pub mod charts;
pub mod data;
pub mod stats;
