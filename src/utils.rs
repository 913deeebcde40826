// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Parse an amount column value read back from the database.
pub fn db_decimal(s: &str, what: &str) -> Result<Decimal> {
    Decimal::from_str_exact(s).with_context(|| format!("Invalid stored {} '{}'", what, s))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn id_for_account(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM accounts WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Account '{}' not found", name))?;
    Ok(id)
}

pub fn account_name(conn: &Connection, id: i64) -> Result<String> {
    let name: String = conn
        .query_row("SELECT name FROM accounts WHERE id=?1", params![id], |r| {
            r.get(0)
        })
        .with_context(|| format!("Account id {} not found", id))?;
    Ok(name)
}

pub fn account_balance(conn: &Connection, id: i64) -> Result<Decimal> {
    let s: String = conn
        .query_row(
            "SELECT balance FROM accounts WHERE id=?1",
            params![id],
            |r| r.get(0),
        )
        .with_context(|| format!("Account id {} not found", id))?;
    db_decimal(&s, "balance")
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

/// Whole calendar months from `from` to `to`, counting only fully elapsed
/// months. Negative when `to` is before `from`.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    use chrono::Datelike;
    let mut months =
        (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    if to.day() < from.day() {
        months -= 1;
    }
    months
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn months_between_counts_full_months_only() {
        assert_eq!(months_between(d("2025-01-15"), d("2025-03-15")), 2);
        assert_eq!(months_between(d("2025-01-15"), d("2025-03-14")), 1);
        assert_eq!(months_between(d("2025-01-31"), d("2025-02-28")), 0);
        assert_eq!(months_between(d("2025-03-15"), d("2025-01-15")), -2);
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(parse_date("2025-13-01").is_err());
        assert!(parse_date("01/02/2025").is_err());
        assert_eq!(parse_date("2025-02-03").unwrap(), d("2025-02-03"));
    }
}
