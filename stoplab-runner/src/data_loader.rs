//! Bar loading for the runner.
//!
//! Reads Yahoo-format daily CSV files (`Date,Open,High,Low,Close,Adj Close,Volume`).
//! Rows whose prices are missing or `null` are skipped with a warning; a file
//! that yields no bars at all is an error. Downloading data is out of scope:
//! files must already be on disk.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use stoplab_core::domain::Bar;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("no usable bars for '{symbol}'")]
    Empty { symbol: String },

    #[error("no data file registered for '{0}'")]
    UnknownSymbol(String),
}

/// Anything that can hand out a bar series per symbol.
pub trait BarSource {
    fn load(&self, symbol: &str) -> Result<Vec<Bar>, LoadError>;
}

/// One instrument's bar series, as consumed by sweeps.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentBars {
    pub symbol: String,
    pub bars: Vec<Bar>,
}

impl InstrumentBars {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
        }
    }
}

/// CSV files on disk, either registered per symbol or found as `{dir}/{symbol}.csv`.
#[derive(Debug, Clone, Default)]
pub struct CsvBarSource {
    base_dir: Option<PathBuf>,
    paths: HashMap<String, PathBuf>,
}

impl CsvBarSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve unregistered symbols as `{dir}/{symbol}.csv`.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(dir.into()),
            paths: HashMap::new(),
        }
    }

    pub fn with_path(mut self, symbol: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(symbol.into(), path.into());
        self
    }

    fn resolve(&self, symbol: &str) -> Result<PathBuf, LoadError> {
        if let Some(path) = self.paths.get(symbol) {
            return Ok(path.clone());
        }
        match &self.base_dir {
            Some(dir) => Ok(dir.join(format!("{symbol}.csv"))),
            None => Err(LoadError::UnknownSymbol(symbol.to_string())),
        }
    }
}

impl BarSource for CsvBarSource {
    fn load(&self, symbol: &str) -> Result<Vec<Bar>, LoadError> {
        let path = self.resolve(symbol)?;
        load_csv_file(&path, symbol)
    }
}

/// Load every symbol from `source`, in the given order.
pub fn load_instruments(
    source: &dyn BarSource,
    symbols: &[&str],
) -> Result<Vec<InstrumentBars>, LoadError> {
    symbols
        .iter()
        .map(|&symbol| Ok(InstrumentBars::new(symbol, source.load(symbol)?)))
        .collect()
}

/// Read a Yahoo-format CSV file.
pub fn load_csv_file(path: &Path, symbol: &str) -> Result<Vec<Bar>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bars = read_bars(file, symbol)?;
    debug!(symbol, path = %path.display(), bars = bars.len(), "loaded bars");
    Ok(bars)
}

/// Row as it appears in the CSV. Extra columns (`Adj Close`, `Volume`) are ignored.
#[derive(Debug, Deserialize)]
struct YahooRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Open", deserialize_with = "csv::invalid_option")]
    open: Option<f64>,
    #[serde(rename = "High", deserialize_with = "csv::invalid_option")]
    high: Option<f64>,
    #[serde(rename = "Low", deserialize_with = "csv::invalid_option")]
    low: Option<f64>,
    #[serde(rename = "Close", deserialize_with = "csv::invalid_option")]
    close: Option<f64>,
}

impl YahooRow {
    fn into_bar(self) -> Option<Bar> {
        let bar = Bar::new(self.date, self.open?, self.high?, self.low?, self.close?);
        bar.is_sane().then_some(bar)
    }
}

/// Parse Yahoo-format CSV from any reader.
pub fn read_bars<R: Read>(reader: R, symbol: &str) -> Result<Vec<Bar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut bars = Vec::new();
    let mut skipped = 0usize;
    for (line, rec) in rdr.deserialize::<YahooRow>().enumerate() {
        let row = match rec {
            Ok(row) => row,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                warn!(symbol, line = line + 2, error = %e, "skipping malformed row");
                skipped += 1;
                continue;
            }
        };
        match row.into_bar() {
            Some(bar) => bars.push(bar),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(symbol, skipped, kept = bars.len(), "skipped rows with missing or invalid prices");
    }
    if bars.is_empty() {
        return Err(LoadError::Empty {
            symbol: symbol.to_string(),
        });
    }
    Ok(bars)
}
