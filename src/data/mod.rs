//! Data module - CSV loading, cleaning, and timeseries expansion

mod ages;
mod loader;
mod timeseries;

pub use ages::{AgeBand, AgeCategory};
pub use loader::{
    clean_case_data, clean_patient_info, load_case_data, load_patient_info, load_time_data,
    LoaderError,
};
pub use timeseries::{expand_daily, TimeseriesError};
