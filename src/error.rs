use rust_xlsxwriter::XlsxError;
use thiserror::Error;

use std::{io, path::PathBuf};

/// Errors that abort a report run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("input file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("reading {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A record has a malformed date, amount or quantity, or a required
    /// column is missing. The CSV error carries the record position.
    #[error("parsing {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Reading CSV data from something other than a named file failed.
    #[error("parsing CSV data")]
    Csv(#[from] csv::Error),

    #[error("sales totals exceed the supported range")]
    Overflow,

    #[error("building workbook")]
    Workbook(#[from] XlsxError),

    #[error("writing {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: XlsxError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
