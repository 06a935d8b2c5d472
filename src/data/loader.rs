//! CSV Loader Module
//! Loads and cleans the infection-case, patient, and timeseries tables using Polars.

use log::info;
use polars::prelude::*;
use thiserror::Error;

use crate::data::ages::AgeBand;

/// Date columns of the patient table, parsed as `%Y-%m-%d`.
const PATIENT_DATE_COLUMNS: [&str; 4] = [
    "symptom_onset_date",
    "confirmed_date",
    "released_date",
    "deceased_date",
];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    Csv(#[from] PolarsError),
}

/// Load the infection-case table.
///
/// Expected columns:
/// * `case_id`: the ID of the infection case
/// * `province`: Special City / Metropolitan City / Province(-do)
/// * `city`: City(-si) / County(-gun) / District(-gu); the value
///   "from other city" means the group infection started in another city
/// * `group`: whether the case is a group infection
/// * `infection_case`: name of the group or of the individual case kind
/// * `confirmed`: accumulated number of confirmed patients
/// * `latitude` / `longitude`: coordinates of the group (WGS84), with the
///   literal sentinel "-" meaning no coordinate was recorded
pub fn load_case_data(path: &str) -> Result<DataFrame, LoaderError> {
    let df = read_csv(path)?;
    info!("{path} loaded into dataframe");
    clean_case_data(df)
}

/// Cleaning pass behind [`load_case_data`], usable on an already-read table.
///
/// Rows whose `latitude` is the sentinel "-" lose both coordinates. Where
/// `city` is "-" the province name substitutes for the city. The derived
/// `sub_city` column equals `city`, except for "from other city" rows where
/// it falls back to the province as well.
pub fn clean_case_data(df: DataFrame) -> Result<DataFrame, LoaderError> {
    let no_coordinate = col("latitude").cast(DataType::String).eq(lit("-"));

    let df = df
        .lazy()
        .with_columns([
            when(no_coordinate.clone())
                .then(lit(NULL))
                .otherwise(col("latitude"))
                .alias("latitude"),
            when(no_coordinate)
                .then(lit(NULL))
                .otherwise(col("longitude"))
                .alias("longitude"),
        ])
        .with_columns([when(col("city").eq(lit("-")))
            .then(col("province"))
            .otherwise(col("city"))
            .alias("city")])
        .with_columns([when(col("city").eq(lit("from other city")))
            .then(col("province"))
            .otherwise(col("city"))
            .alias("sub_city")])
        .with_columns([
            col("case_id").cast(DataType::String),
            col("latitude").cast(DataType::Float64),
            col("longitude").cast(DataType::Float64),
        ])
        .collect()?;

    info!("helper column 'sub_city' created");
    Ok(df)
}

/// Load the epidemiological patient table.
///
/// Expected columns:
/// * `patient_id`: the ID of the patient (unique, the primary lookup key;
///   duplicates are not detected)
/// * `sex`: male / female
/// * `age`: the age of the patient in decades ("0s" .. "100s")
/// * `country` / `province` / `city`: location of the patient
/// * `infection_case`: the case of infection
/// * `infected_by`: `patient_id` of the infector; may dangle
/// * `contact_number`: the number of contacts with people
/// * `symptom_onset_date` / `confirmed_date` / `released_date` /
///   `deceased_date`: nullable dates
/// * `state`: isolated / released / deceased
pub fn load_patient_info(path: &str) -> Result<DataFrame, LoaderError> {
    let df = read_csv(path)?;
    info!("{path} loaded into dataframe");
    clean_patient_info(df)
}

/// Cleaning pass behind [`load_patient_info`], usable on an already-read table.
///
/// Parses the four date columns (symptom-onset values are whitespace-trimmed
/// first; the raw file carries stray spaces in that column), nulls
/// `contact_number` where the sentinel "-" appears or where the raw value is
/// exactly 10 characters long (a 10-character numeric string in this dataset
/// is a misplaced patient ID, not a contact count), restricts `age` to the
/// known decade bands, derives `age_category`, and computes the three
/// day-count interval columns.
pub fn clean_patient_info(df: DataFrame) -> Result<DataFrame, LoaderError> {
    let date_options = StrptimeOptions {
        format: Some("%Y-%m-%d".into()),
        ..Default::default()
    };
    let contact_raw = col("contact_number").cast(DataType::String);

    let mut df = df
        .lazy()
        .with_columns(PATIENT_DATE_COLUMNS.map(|name| {
            col(name)
                .cast(DataType::String)
                .str()
                .strip_chars(lit(NULL))
                .str()
                .to_date(date_options.clone())
                .alias(name)
        }))
        .with_columns([when(
            contact_raw
                .clone()
                .eq(lit("-"))
                .or(contact_raw.str().len_chars().eq(lit(10u32))),
        )
        .then(lit(NULL))
        .otherwise(col("contact_number"))
        .alias("contact_number")])
        .with_columns([
            col("patient_id").cast(DataType::String),
            col("infected_by").cast(DataType::String),
            col("contact_number").cast(DataType::Float32),
        ])
        .with_columns([
            (col("confirmed_date") - col("symptom_onset_date"))
                .dt()
                .total_days()
                .cast(DataType::Float32)
                .alias("symptom_to_confirmed"),
            (col("released_date") - col("confirmed_date"))
                .dt()
                .total_days()
                .cast(DataType::Float32)
                .alias("confirmed_to_released"),
            (col("deceased_date") - col("confirmed_date"))
                .dt()
                .total_days()
                .cast(DataType::Float32)
                .alias("confirmed_to_deceased"),
        ])
        .collect()?;

    let (age, age_category) = derive_age_columns(&df)?;
    df.with_column(age)?;
    df.with_column(age_category)?;
    info!("column 'age_category' created: young (0-29), middle (30-59), old (60+)");

    for name in ["age", "age_category", "sex", "state"] {
        let categorical = df
            .column(name)?
            .cast(&DataType::Categorical(None, CategoricalOrdering::Physical))?;
        df.with_column(categorical)?;
    }

    info!("interval columns 'symptom_to_confirmed', 'confirmed_to_released', 'confirmed_to_deceased' created");
    Ok(df)
}

/// Load a timeseries table whose `date` column holds `%Y-%m-%d` dates.
/// Other columns keep their inferred types. Rows are expected to be
/// date-ascending as in the source files.
pub fn load_time_data(path: &str) -> Result<DataFrame, LoaderError> {
    let date_options = StrptimeOptions {
        format: Some("%Y-%m-%d".into()),
        ..Default::default()
    };
    let df = read_csv(path)?
        .lazy()
        .with_columns([col("date")
            .cast(DataType::String)
            .str()
            .to_date(date_options)
            .alias("date")])
        .collect()?;
    info!("{path} loaded into dataframe");
    Ok(df)
}

/// Read a CSV with full-file schema inference and trim column-name whitespace.
fn read_csv(path: &str) -> Result<DataFrame, LoaderError> {
    let mut df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(None)
        .finish()?
        .collect()?;
    trim_column_names(&mut df)?;
    Ok(df)
}

fn trim_column_names(df: &mut DataFrame) -> PolarsResult<()> {
    let renames: Vec<(String, String)> = df
        .get_column_names()
        .iter()
        .filter(|name| name.trim() != name.as_str())
        .map(|name| (name.to_string(), name.trim().to_string()))
        .collect();
    for (old, new) in renames {
        df.rename(&old, new.into())?;
    }
    Ok(())
}

/// Normalize the `age` column to the known decade bands and derive the
/// matching `age_category` labels. Unknown bands become null in both.
fn derive_age_columns(df: &DataFrame) -> Result<(Column, Column), LoaderError> {
    let age = df.column("age")?.cast(&DataType::String)?;
    let age = age.str()?;

    let mut bands: Vec<Option<&str>> = Vec::with_capacity(age.len());
    let mut categories: Vec<Option<&str>> = Vec::with_capacity(age.len());
    for value in age.into_iter() {
        let band = value.map(str::trim).and_then(AgeBand::parse);
        bands.push(band.map(AgeBand::label));
        categories.push(band.map(|band| band.category().label()));
    }

    Ok((
        Column::new("age".into(), bands),
        Column::new("age_category".into(), categories),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load_from_str(csv: &str, load: fn(&str) -> Result<DataFrame, LoaderError>) -> DataFrame {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{csv}").unwrap();
        load(file.path().to_str().unwrap()).unwrap()
    }

    fn string_at(df: &DataFrame, column: &str, row: usize) -> Option<String> {
        let value = df.column(column).unwrap().get(row).unwrap();
        if value.is_null() {
            None
        } else {
            Some(value.to_string().trim_matches('"').to_string())
        }
    }

    const CASE_CSV: &str = "\
 case_id,province,city,group,infection_case,confirmed,latitude,longitude
1000001,Seoul,Yongsan-gu,TRUE,Itaewon Clubs,139,37.538621,126.992652
1000036,Seoul,-,TRUE,Orange Life,1,-,-
1000037,Seoul,from other city,TRUE,Daejeon door-to-door sales,1,-,-
";

    #[test]
    fn case_sentinel_coordinates_are_nulled_together() {
        let df = load_from_str(CASE_CSV, load_case_data);

        let latitude = df.column("latitude").unwrap();
        let longitude = df.column("longitude").unwrap();
        assert_eq!(latitude.dtype(), &DataType::Float64);
        assert!(!latitude.get(0).unwrap().is_null());
        assert!(latitude.get(1).unwrap().is_null());
        assert!(longitude.get(1).unwrap().is_null());
        assert!(latitude.get(2).unwrap().is_null());
        assert!(longitude.get(2).unwrap().is_null());
    }

    #[test]
    fn case_city_and_sub_city_substitution() {
        let df = load_from_str(CASE_CSV, load_case_data);

        // "-" city takes the province name, and sub_city follows it
        assert_eq!(string_at(&df, "city", 1).as_deref(), Some("Seoul"));
        assert_eq!(string_at(&df, "sub_city", 1).as_deref(), Some("Seoul"));

        // "from other city" is kept as the city but sub_city falls back
        assert_eq!(
            string_at(&df, "city", 2).as_deref(),
            Some("from other city")
        );
        assert_eq!(string_at(&df, "sub_city", 2).as_deref(), Some("Seoul"));

        // ordinary rows keep their city
        assert_eq!(string_at(&df, "sub_city", 0).as_deref(), Some("Yongsan-gu"));
    }

    #[test]
    fn case_id_is_cast_to_string() {
        let df = load_from_str(CASE_CSV, load_case_data);
        assert_eq!(df.column("case_id").unwrap().dtype(), &DataType::String);
        assert_eq!(string_at(&df, "case_id", 0).as_deref(), Some("1000001"));
    }

    const PATIENT_HEADER: &str = "patient_id,sex,age,country,province,city,infection_case,infected_by,contact_number,symptom_onset_date,confirmed_date,released_date,deceased_date,state\n";

    fn patient_df(rows: &[&str]) -> DataFrame {
        let csv = format!("{PATIENT_HEADER}{}\n", rows.join("\n"));
        load_from_str(&csv, load_patient_info)
    }

    #[test]
    fn patient_age_category_buckets() {
        let df = patient_df(&[
            "1000000001,male,10s,Korea,Seoul,Gangnam-gu,overseas inflow,,2,2020-01-22,2020-01-23,2020-02-05,,released",
            "1000000002,female,30s,Korea,Seoul,Jungnang-gu,contact with patient,1000000001,31,,2020-01-30,2020-03-02,,released",
            "1000000003,male,70s,Korea,Seoul,Seongbuk-gu,etc,,17,,2020-01-30,,2020-02-19,deceased",
            "1000000004,female,,Korea,Seoul,Mapo-gu,etc,,9,,2020-01-31,2020-02-24,,released",
        ]);

        assert_eq!(string_at(&df, "age_category", 0).as_deref(), Some("young"));
        assert_eq!(string_at(&df, "age_category", 1).as_deref(), Some("middle"));
        assert_eq!(string_at(&df, "age_category", 2).as_deref(), Some("old"));
        assert_eq!(string_at(&df, "age_category", 3), None);
    }

    #[test]
    fn patient_interval_columns() {
        let df = patient_df(&[
            "1000000001,male,50s,Korea,Seoul,Gangnam-gu,overseas inflow,,2,2020-01-05,2020-01-10,2020-01-20,,released",
            "1000000002,female,20s,Korea,Seoul,Jungnang-gu,etc,,3,,2020-01-30,,2020-02-08,deceased",
        ]);

        let symptom = df.column("symptom_to_confirmed").unwrap().f32().unwrap();
        let released = df.column("confirmed_to_released").unwrap().f32().unwrap();
        let deceased = df.column("confirmed_to_deceased").unwrap().f32().unwrap();

        assert_eq!(symptom.get(0), Some(5.0));
        assert_eq!(released.get(0), Some(10.0));
        assert_eq!(deceased.get(0), None);

        // missing endpoints leave the interval missing
        assert_eq!(symptom.get(1), None);
        assert_eq!(released.get(1), None);
        assert_eq!(deceased.get(1), Some(9.0));
    }

    #[test]
    fn patient_symptom_onset_tolerates_stray_whitespace() {
        let df = patient_df(&[
            "1000000001,male,50s,Korea,Seoul,Gangnam-gu,etc,,2, 2020-01-05,2020-01-10,,,isolated",
        ]);
        let symptom = df.column("symptom_to_confirmed").unwrap().f32().unwrap();
        assert_eq!(symptom.get(0), Some(5.0));
    }

    #[test]
    fn patient_contact_number_sentinels() {
        let df = patient_df(&[
            "1000000001,male,50s,Korea,Seoul,Gangnam-gu,etc,,75,,2020-01-10,,,isolated",
            "1000000002,male,50s,Korea,Seoul,Gangnam-gu,etc,,-,,2020-01-10,,,isolated",
            "1000000003,male,50s,Korea,Seoul,Gangnam-gu,etc,,2002000001,,2020-01-10,,,isolated",
        ]);

        let contact = df.column("contact_number").unwrap().f32().unwrap();
        assert_eq!(contact.get(0), Some(75.0));
        assert_eq!(contact.get(1), None);
        // a 10-character value is a misplaced patient ID
        assert_eq!(contact.get(2), None);
    }

    #[test]
    fn patient_ids_are_strings() {
        let df = patient_df(&[
            "1000000002,female,30s,Korea,Seoul,Jungnang-gu,contact with patient,1000000001,31,,2020-01-30,2020-03-02,,released",
        ]);
        assert_eq!(df.column("patient_id").unwrap().dtype(), &DataType::String);
        assert_eq!(
            string_at(&df, "infected_by", 0).as_deref(),
            Some("1000000001")
        );
    }

    #[test]
    fn patient_unknown_age_band_becomes_null() {
        let df = patient_df(&[
            "1000000001,male,110s,Korea,Seoul,Gangnam-gu,etc,,2,,2020-01-10,,,isolated",
        ]);
        assert_eq!(string_at(&df, "age", 0), None);
        assert_eq!(string_at(&df, "age_category", 0), None);
    }

    #[test]
    fn column_names_are_trimmed() {
        // the cases fixture carries a leading space on "case_id"
        let df = load_from_str(CASE_CSV, load_case_data);
        assert!(df.column("case_id").is_ok());
    }

    #[test]
    fn time_table_dates_are_parsed() {
        let csv = "\
date,time,test,negative,confirmed,released,deceased
2020-01-20,16,1,0,1,0,0
2020-01-21,16,1,0,1,0,0
";
        let df = load_from_str(csv, load_time_data);
        assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);
        assert_eq!(df.column("test").unwrap().dtype(), &DataType::Int64);
    }
}
