//! CSV bar loading and synthetic bars.
//!
//! Accepts the common OHLCV CSV layouts (Yahoo-style exports, broker dumps):
//! 1. Header names are trimmed and capitalised (`close` and `CLOSE` → `Close`)
//! 2. `Price` is accepted as an alias for `Date`
//! 3. Rows with an unparseable date, non-numeric OHLC(V), or inconsistent prices
//!    (high < low, open/close outside the range) are dropped and counted
//! 4. The surviving rows must be strictly increasing in time
//!
//! Synthetic bars are a developer-only debug mode, seeded from the symbol name.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, warn};

use divbar_core::domain::{validate_history, Bar, HistoryError};

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

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("no usable rows ({dropped} dropped)")]
    Empty { dropped: usize },

    #[error("invalid history: {0}")]
    History(#[from] HistoryError),
}

/// Bars plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub bars: Vec<Bar>,
    /// Rows skipped for unparseable dates or prices.
    pub dropped_rows: usize,
    /// BLAKE3 over every bar's timestamp and OHLCV.
    pub dataset_hash: String,
    pub synthetic: bool,
}

/// Load a CSV file of OHLCV bars.
pub fn load_csv(path: &Path) -> Result<LoadedData, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let loaded = parse_csv(file)?;
    debug!(
        path = %path.display(),
        bars = loaded.bars.len(),
        dropped = loaded.dropped_rows,
        "loaded csv"
    );
    Ok(loaded)
}

/// Parse OHLCV bars from any CSV reader.
pub fn parse_csv<R: Read>(reader: R) -> Result<LoadedData, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns: HashMap<String, usize> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (normalize_header(h), i))
        .collect();
    let column = |name: &'static str| {
        columns
            .get(name)
            .copied()
            .ok_or(LoadError::MissingColumn(name))
    };

    let layout = ColumnLayout {
        date: columns
            .get("Date")
            .or_else(|| columns.get("Price"))
            .copied()
            .ok_or(LoadError::MissingColumn("Date"))?,
        open: column("Open")?,
        high: column("High")?,
        low: column("Low")?,
        close: column("Close")?,
        volume: columns.get("Volume").copied(),
    };

    let mut bars = Vec::new();
    let mut dropped_rows = 0usize;
    for record in rdr.records() {
        match layout.parse(&record?) {
            Some(bar) if bar.is_sane() => bars.push(bar),
            Some(bar) => {
                debug!(timestamp = %bar.timestamp, "dropping row with inconsistent prices");
                dropped_rows += 1;
            }
            None => dropped_rows += 1,
        }
    }

    if dropped_rows > 0 {
        warn!(dropped_rows, "dropped rows with unparseable or inconsistent prices");
    }
    if bars.is_empty() {
        return Err(LoadError::Empty {
            dropped: dropped_rows,
        });
    }
    validate_history(&bars)?;

    Ok(LoadedData {
        dataset_hash: dataset_hash(&bars),
        bars,
        dropped_rows,
        synthetic: false,
    })
}

/// Column positions resolved from the header row.
struct ColumnLayout {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl ColumnLayout {
    /// `None` if the date or any price field fails to parse.
    fn parse(&self, record: &csv::StringRecord) -> Option<Bar> {
        let number = |i: usize| {
            record
                .get(i)?
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
        };
        Some(Bar {
            timestamp: parse_timestamp(record.get(self.date)?)?,
            open: number(self.open)?,
            high: number(self.high)?,
            low: number(self.low)?,
            close: number(self.close)?,
            volume: match self.volume {
                Some(col) => number(col)?,
                None => 0.0,
            },
        })
    }
}

/// Trim and capitalise a header: first character upper-case, the rest lower.
pub fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Parse `%Y-%m-%d`, `%Y-%m-%d %H:%M:%S`, or RFC 3339 (offset dropped).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local())
}

/// BLAKE3 digest of the bar series, for result fingerprinting.
pub fn dataset_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(&bar.timestamp.and_utc().timestamp().to_le_bytes());
        for value in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
            hasher.update(&value.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// Deterministic random-walk weekday bars for `symbol` between `start` and `end`.
pub fn generate_synthetic_bars(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
    // Deterministic seed from symbol name
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64) as f64;

        if let Some(timestamp) = current.and_hms_opt(0, 0, 0) {
            bars.push(Bar {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}

/// Synthetic bars wrapped as `LoadedData`.
pub fn load_synthetic(symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<LoadedData, LoadError> {
    let bars = generate_synthetic_bars(symbol, start, end);
    if bars.is_empty() {
        return Err(LoadError::Empty { dropped: 0 });
    }
    validate_history(&bars)?;
    Ok(LoadedData {
        dataset_hash: dataset_hash(&bars),
        bars,
        dropped_rows: 0,
        synthetic: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_capitalised() {
        assert_eq!(normalize_header(" close "), "Close");
        assert_eq!(normalize_header("VOLUME"), "Volume");
        assert_eq!(normalize_header("Date"), "Date");
        assert_eq!(normalize_header(""), "");
    }

    #[test]
    fn timestamp_formats() {
        let day = parse_timestamp("2024-03-01").unwrap();
        assert_eq!(day.to_string(), "2024-03-01 00:00:00");
        let intraday = parse_timestamp("2024-03-01 15:30:00").unwrap();
        assert_eq!(intraday.to_string(), "2024-03-01 15:30:00");
        let rfc = parse_timestamp("2024-03-01T09:30:00-05:00").unwrap();
        assert_eq!(rfc.to_string(), "2024-03-01 09:30:00");
        assert!(parse_timestamp("Ticker").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn parses_lowercase_headers() {
        let csv = "date,open,high,low,close,volume\n\
                   2024-01-02,10,11,9,10.5,100\n\
                   2024-01-03,10.5,12,10,11.5,200\n";
        let loaded = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(loaded.bars.len(), 2);
        assert_eq!(loaded.bars[1].close, 11.5);
        assert_eq!(loaded.bars[1].volume, 200.0);
        assert_eq!(loaded.dropped_rows, 0);
        assert!(!loaded.synthetic);
    }

    #[test]
    fn yahoo_multi_header_layout() {
        // yfinance exports: "Price" header row, then ticker and blank-date rows.
        let csv = "Price,Close,High,Low,Open,Volume\n\
                   Ticker,AAPL,AAPL,AAPL,AAPL,AAPL\n\
                   Date,,,,,\n\
                   2024-01-02,185.6,188.4,183.9,187.2,82488700\n\
                   2024-01-03,184.2,185.9,183.4,184.2,58414500\n";
        let loaded = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(loaded.bars.len(), 2);
        assert_eq!(loaded.dropped_rows, 2);
        assert_eq!(loaded.bars[0].open, 187.2);
    }

    #[test]
    fn volume_column_optional() {
        let csv = "Date,Open,High,Low,Close\n2024-01-02,10,11,9,10.5\n";
        let loaded = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(loaded.bars[0].volume, 0.0);
    }

    #[test]
    fn missing_price_column_is_error() {
        let csv = "Date,Open,High,Close\n2024-01-02,10,11,10.5\n";
        assert!(matches!(
            parse_csv(csv.as_bytes()),
            Err(LoadError::MissingColumn("Low"))
        ));
    }

    #[test]
    fn out_of_order_rows_rejected() {
        let csv = "Date,Open,High,Low,Close,Volume\n\
                   2024-01-03,10,11,9,10.5,1\n\
                   2024-01-02,10,11,9,10.5,1\n";
        assert!(matches!(parse_csv(csv.as_bytes()), Err(LoadError::History(_))));
    }

    #[test]
    fn inconsistent_rows_are_dropped_not_fatal() {
        // Adjusted vendor data: close a hair above the high, then high < low.
        let csv = "Date,Open,High,Low,Close,Volume\n\
                   2024-01-02,10,11,9,10.5,1\n\
                   2024-01-03,10.5,11,10,11.02,1\n\
                   2024-01-04,10.5,9,10,9.5,1\n\
                   2024-01-05,10.5,12,10,11.5,1\n";
        let loaded = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(loaded.bars.len(), 2);
        assert_eq!(loaded.dropped_rows, 2);
        assert_eq!(loaded.bars[1].close, 11.5);
    }

    #[test]
    fn all_rows_dropped_is_error() {
        let csv = "Date,Open,High,Low,Close\nnot-a-date,1,2,0.5,1\n";
        assert!(matches!(
            parse_csv(csv.as_bytes()),
            Err(LoadError::Empty { dropped: 1 })
        ));
    }

    #[test]
    fn dataset_hash_is_content_addressed() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let a = generate_synthetic_bars("SPY", start, end);
        let b = generate_synthetic_bars("SPY", start, end);
        let c = generate_synthetic_bars("QQQ", start, end);
        assert_eq!(dataset_hash(&a), dataset_hash(&b));
        assert_ne!(dataset_hash(&a), dataset_hash(&c));
    }

    #[test]
    fn synthetic_bars_skip_weekends_and_validate() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let loaded = load_synthetic("TEST", start, end).unwrap();
        assert!(loaded.synthetic);
        assert!(loaded.bars.len() > 250);
        assert!(loaded
            .bars
            .iter()
            .all(|b| b.timestamp.weekday() != chrono::Weekday::Sat));
    }
}
