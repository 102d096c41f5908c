#![doc = include_str!("../README.md")]
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr};

use std::{
    collections::HashSet,
    fmt::Display,
    fs::File,
    io::{self, Read},
    path::Path,
};

mod error;
mod groups;
mod money;
mod report;

pub use error::{Error, Result};
pub use groups::{group_sum, AggregateRow, Breakdown, Dimension, AMOUNT_LABEL, QUANTITY_LABEL};
pub use money::Amount;
pub use report::Report;

/// Defines the CSV format for sales data.
///
/// Column headers are the localized names used by the source spreadsheets;
/// the English names are accepted as aliases. Any other columns are ignored.
#[serde_as]
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Record {
    #[serde(rename = "日期", alias = "date", alias = "Date")]
    #[serde_as(as = "DisplayFromStr")]
    pub date: NaiveDate,
    #[serde(rename = "產品", alias = "product", alias = "Product")]
    pub product: String,
    #[serde(rename = "地區", alias = "region", alias = "Region")]
    pub region: String,
    #[serde(rename = "業務", alias = "salesperson", alias = "Salesperson")]
    pub salesperson: String,
    #[serde(rename = "金額", alias = "amount", alias = "Amount")]
    pub amount: Amount,
    #[serde(rename = "數量", alias = "quantity", alias = "Quantity")]
    pub quantity: i64,
}

impl Record {
    #[must_use]
    pub fn month(&self) -> MonthKey {
        MonthKey::from(self.date)
    }
}

/// The calendar month a sale falls in.
///
/// Orders chronologically, and displays as `YYYY-MM`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl From<NaiveDate> for MonthKey {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Holds sales records, in the order they were read.
///
/// To load records from a CSV file, use [`Dataset::read_csv`].
///
/// To compute whole-dataset statistics, use [`Summary::of`]; for per-product,
/// per-region, per-salesperson or per-month totals, use
/// [`Breakdown::for_dimension`].
///
/// The absolute amounts and quantities of all records each sum to within
/// `i64`, so no total over any subset of the records can overflow.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Reads sales data from the CSV file at `path`.
    ///
    /// # Errors
    ///
    /// Returns:
    /// * [`Error::FileNotFound`] if there is no file at `path`
    /// * [`Error::Io`] if the file cannot be opened for some other reason
    /// * [`Error::Parse`] if any record cannot be read or parsed. A single bad
    ///   record fails the whole file.
    /// * [`Error::Overflow`] if the records' totals are out of range
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => Error::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => Error::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let dataset = Self::from_reader(file).map_err(|err| match err {
            Error::Csv(source) => Error::Parse {
                path: path.to_path_buf(),
                source,
            },
            err => err,
        })?;
        log::info!("read {} records from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    /// Reads sales data in CSV format from `rdr`.
    ///
    /// Leading and trailing whitespace around fields is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Csv`] for the first record that cannot be read or
    /// deserialized, and [`Error::Overflow`] as for [`Dataset::from_records`].
    pub fn from_reader(rdr: impl Read) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(rdr);
        let records = rdr.deserialize().collect::<csv::Result<Vec<Record>>>()?;
        Self::from_records(records)
    }

    /// Creates a dataset from records already in memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Overflow`] if the absolute amounts or quantities of
    /// `records` sum to more than `i64::MAX`.
    pub fn from_records(records: Vec<Record>) -> Result<Self> {
        let (mut amount, mut quantity) = (0_i64, 0_i64);
        for record in &records {
            amount = record
                .amount
                .cents()
                .checked_abs()
                .and_then(|cents| amount.checked_add(cents))
                .ok_or(Error::Overflow)?;
            quantity = record
                .quantity
                .checked_abs()
                .and_then(|qty| quantity.checked_add(qty))
                .ok_or(Error::Overflow)?;
        }
        Ok(Self { records })
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Whole-dataset statistics for the report overview.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    pub records: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub total_amount: Amount,
    pub total_quantity: i64,
    pub products: usize,
    pub regions: usize,
    pub salespeople: usize,
}

impl Summary {
    #[must_use]
    pub fn of(dataset: &Dataset) -> Self {
        let records = dataset.records();
        Self {
            records: records.len(),
            first_date: records.iter().map(|r| r.date).min(),
            last_date: records.iter().map(|r| r.date).max(),
            total_amount: records.iter().map(|r| r.amount).sum(),
            total_quantity: records.iter().map(|r| r.quantity).sum(),
            products: count_distinct(records, |r| &r.product),
            regions: count_distinct(records, |r| &r.region),
            salespeople: count_distinct(records, |r| &r.salesperson),
        }
    }

    /// Returns the date range as `FIRST ~ LAST`, or `None` if there are no
    /// records.
    #[must_use]
    pub fn date_range(&self) -> Option<String> {
        Some(format!("{} ~ {}", self.first_date?, self.last_date?))
    }
}

fn count_distinct<'a>(records: &'a [Record], key: impl Fn(&'a Record) -> &'a String) -> usize {
    records.iter().map(key).collect::<HashSet<_>>().len()
}
