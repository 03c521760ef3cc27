//! Finam-style candle exports.
//!
//! ```text
//! <TICKER>;<PER>;<DATE>;<TIME>;<OPEN>;<HIGH>;<LOW>;<CLOSE>;<VOL>
//! SBER;D;20240102;000000;271,90;274,70;271,00;274,00;26521390
//! ```
//!
//! Semicolon-delimited, decimal commas allowed, one file may hold several
//! tickers interleaved.

use std::collections::HashMap;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::{Candle, Result, ScanError};

const MIN_FIELDS: usize = 9;

/// Load and parse an export file.
pub fn load_finam_csv(path: impl AsRef<Path>) -> Result<HashMap<String, Vec<Candle>>> {
    let text = std::fs::read_to_string(path)?;
    parse_finam_csv(&text)
}

/// Parse an export into `ticker -> candles`, in file order.
///
/// Header lines (starting with `<` or `TICKER`), blank lines and rows with
/// fewer than nine fields are skipped. Each ticker's candles are numbered
/// from zero.
pub fn parse_finam_csv(text: &str) -> Result<HashMap<String, Vec<Candle>>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .comment(Some(b'<'))
        .from_reader(text.as_bytes());

    let mut tickers: HashMap<String, Vec<Candle>> = HashMap::new();
    for row in reader.records() {
        let record = row?;
        if record.len() < MIN_FIELDS {
            continue;
        }
        let ticker = &record[0];
        if ticker.is_empty() || ticker.starts_with('<') || ticker == "TICKER" {
            continue;
        }

        let line = record.position().map_or(0, |p| p.line());
        let candle = parse_row(&record).map_err(|reason| ScanError::Feed { line, reason })?;
        let series = tickers.entry(ticker.to_string()).or_default();
        let position = series.len();
        series.push(candle.with_position(position));
    }

    Ok(tickers)
}

fn parse_row(record: &StringRecord) -> std::result::Result<Candle, String> {
    let begin = format!("{}T{}", parse_date(&record[2])?, parse_time(&record[3]));
    let mut candle = Candle::new(
        begin,
        parse_price(&record[4], "open")?,
        parse_price(&record[5], "high")?,
        parse_price(&record[6], "low")?,
        parse_price(&record[7], "close")?,
    );
    if !record[8].is_empty() {
        candle = candle.with_volume(parse_price(&record[8], "volume")?);
    }
    Ok(candle)
}

/// `YYYYMMDD` -> `YYYY-MM-DD`
fn parse_date(raw: &str) -> std::result::Result<String, String> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("bad date '{raw}'"));
    }
    Ok(format!("{}-{}-{}", &raw[..4], &raw[4..6], &raw[6..]))
}

/// `HHMMSS` -> `HH:MM:SS`; anything else is midnight
fn parse_time(raw: &str) -> String {
    if raw.len() == 6 && raw.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}:{}:{}", &raw[..2], &raw[2..4], &raw[4..])
    } else {
        "00:00:00".to_string()
    }
}

fn parse_price(raw: &str, field: &str) -> std::result::Result<f64, String> {
    raw.replace(',', ".")
        .parse::<f64>()
        .map_err(|e| format!("bad {field} '{raw}': {e}"))
}
