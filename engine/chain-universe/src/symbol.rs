//! Exchange ticker parsing for concrete future contracts.
//!
//! Tickers follow the CME convention `{root}{month code}{year}`, e.g. `ESZ25`
//! or `GCJ2026`. The parsed contract expires on the third Friday of its
//! contract month, which is the standard monthly expiry for index futures.

use crate::error::SelectionError;
use crate::types::InstrumentId;
use chrono::{NaiveDate, Weekday};

/// CME month-code letters, January first
const MONTH_CODES: [char; 12] = ['F', 'G', 'H', 'J', 'K', 'M', 'N', 'Q', 'U', 'V', 'X', 'Z'];

fn month_from_code(code: char) -> Option<u32> {
    MONTH_CODES.iter().position(|&c| c == code).map(|idx| idx as u32 + 1)
}

/// Split a ticker into root, contract month and year
fn split_ticker(ticker: &str) -> Option<(&str, u32, i32)> {
    let digits_start = ticker.find(|c: char| c.is_ascii_digit())?;
    let (head, digits) = ticker.split_at(digits_start);
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let year = match digits.len() {
        2 => 2000 + digits.parse::<i32>().ok()?,
        4 => digits.parse::<i32>().ok()?,
        _ => return None,
    };

    let code = head.chars().last()?;
    let month = month_from_code(code)?;
    let root = &head[..head.len() - code.len_utf8()];
    if root.is_empty() {
        return None;
    }

    Some((root, month, year))
}

/// Parse a ticker such as `ESZ25` into a concrete future contract on `market`
pub fn parse_future_ticker(ticker: &str, market: &str) -> Result<InstrumentId, SelectionError> {
    let ticker = ticker.trim().to_ascii_uppercase();
    let (root, month, year) = split_ticker(&ticker)
        .ok_or_else(|| SelectionError::Config(format!("Invalid future ticker '{ticker}'")))?;

    let expiry = NaiveDate::from_weekday_of_month_opt(year, month, Weekday::Fri, 3)
        .ok_or_else(|| SelectionError::Config(format!("No expiry for ticker '{ticker}'")))?;

    Ok(InstrumentId::future_contract(root, market, expiry))
}
