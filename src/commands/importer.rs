// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::transactions::{create_transactions_bulk, find_by_natural_key, NewTransaction};
use crate::utils::id_for_account;
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Which CSV headers feed which transaction fields. Either a single signed
/// `amount` column or a `debit`/`credit` pair must be mapped.
#[derive(Debug, Default, Clone)]
pub struct ColumnMapping {
    pub date: String,
    pub payee: String,
    pub amount: Option<String>,
    pub debit: Option<String>,
    pub credit: Option<String>,
    pub category: Option<String>,
    pub memo: Option<String>,
}

/// Lenient bank-export amount parsing. Currency symbols, thousands commas and
/// inner whitespace are stripped, a parenthesized value is negative, and
/// anything unparseable becomes zero so a single bad cell cannot abort a
/// whole statement.
pub fn parse_amount(raw: &str) -> Decimal {
    let mut s: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | '¥' | ',' | ' '))
        .collect();
    let mut negative = false;
    if s.starts_with('(') && s.ends_with(')') {
        negative = true;
        s = s[1..s.len() - 1].to_string();
    }
    match s.parse::<Decimal>() {
        Ok(d) if negative => -d,
        Ok(d) => d,
        Err(_) => Decimal::ZERO,
    }
}

/// ISO dates first, then the US form banks favor: a three-part date whose
/// last field has four digits is read as MM/DD/YYYY.
pub fn parse_csv_date(raw: &str) -> Result<NaiveDate> {
    let s = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    let parts: Vec<&str> = s.split(['/', '-']).collect();
    if parts.len() == 3 && parts[2].len() == 4 {
        for fmt in ["%m/%d/%Y", "%m-%d-%Y"] {
            if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
                return Ok(d);
            }
        }
    }
    Err(anyhow!("Unrecognized date '{}'", s))
}

#[derive(Debug)]
pub struct ImportRow {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub payee: String,
    pub category: Option<String>,
    pub memo: Option<String>,
    pub is_duplicate: bool,
}

fn field<'a>(
    headers: &HashMap<String, usize>,
    record: &'a csv::StringRecord,
    name: &str,
) -> Result<&'a str> {
    let idx = headers
        .get(&name.to_lowercase())
        .with_context(|| format!("CSV has no '{}' column", name))?;
    Ok(record.get(*idx).unwrap_or(""))
}

fn opt_field<'a>(
    headers: &HashMap<String, usize>,
    record: &'a csv::StringRecord,
    name: &Option<String>,
) -> Option<&'a str> {
    let name = name.as_deref()?;
    let idx = headers.get(&name.to_lowercase())?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a statement into normalized rows. Debit cells become outflows and
/// credit cells inflows regardless of how the bank signed them.
pub fn parse_statement(path: &Path, mapping: &ColumnMapping) -> Result<Vec<ImportRow>> {
    if mapping.amount.is_none() && mapping.debit.is_none() && mapping.credit.is_none() {
        return Err(anyhow!("Map either an amount column or debit/credit columns"));
    }
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Cannot open {}", path.display()))?;
    let headers: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_lowercase(), i))
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let date = parse_csv_date(field(&headers, &record, &mapping.date)?)?;
        let payee = field(&headers, &record, &mapping.payee)?.trim().to_string();

        let amount = if let Some(col) = &mapping.amount {
            parse_amount(field(&headers, &record, col)?)
        } else {
            let debit = opt_field(&headers, &record, &mapping.debit)
                .map(parse_amount)
                .unwrap_or(Decimal::ZERO);
            let credit = opt_field(&headers, &record, &mapping.credit)
                .map(parse_amount)
                .unwrap_or(Decimal::ZERO);
            credit.abs() - debit.abs()
        };

        rows.push(ImportRow {
            date,
            amount,
            payee,
            category: opt_field(&headers, &record, &mapping.category).map(str::to_string),
            memo: opt_field(&headers, &record, &mapping.memo).map(str::to_string),
            is_duplicate: false,
        });
    }
    Ok(rows)
}

fn natural_key(row: &ImportRow) -> (NaiveDate, Decimal, String) {
    (row.date, row.amount, row.payee.to_lowercase())
}

/// Flag rows already present in the ledger, or repeated within the file,
/// by their (date, amount, payee) natural key.
pub fn detect_duplicates(conn: &Connection, rows: &mut [ImportRow]) -> Result<usize> {
    let mut seen: HashSet<(NaiveDate, Decimal, String)> = HashSet::new();
    let mut flagged = 0;
    for row in rows.iter_mut() {
        let key = natural_key(row);
        let exists = !seen.insert(key)
            || find_by_natural_key(conn, row.date, row.amount, &row.payee)?.is_some();
        if exists {
            row.is_duplicate = true;
            flagged += 1;
        }
    }
    Ok(flagged)
}

/// Fill missing categories from ledger history: each payee maps to the
/// category it carried the first time it was seen.
pub fn auto_assign_categories(conn: &Connection, rows: &mut [ImportRow]) -> Result<usize> {
    let mut stmt = conn.prepare(
        "SELECT LOWER(payee), category FROM transactions
         WHERE category<>'' AND category<>'Uncategorized' ORDER BY id",
    )?;
    let mut history: HashMap<String, String> = HashMap::new();
    let mut db_rows = stmt.query([])?;
    while let Some(r) = db_rows.next()? {
        history
            .entry(r.get::<_, String>(0)?)
            .or_insert(r.get::<_, String>(1)?);
    }

    let mut assigned = 0;
    for row in rows.iter_mut() {
        if row.category.is_none() {
            if let Some(cat) = history.get(&row.payee.to_lowercase()) {
                row.category = Some(cat.clone());
                assigned += 1;
            }
        }
    }
    Ok(assigned)
}

pub struct ImportOutcome {
    pub imported: usize,
    pub skipped_duplicates: usize,
    pub auto_categorized: usize,
}

/// End-to-end statement import: parse, auto-categorize, flag duplicates and
/// bulk-insert, skipping flagged rows unless told otherwise. All inserted
/// rows share one import id so a bad import is easy to find.
pub fn import_statement(
    conn: &mut Connection,
    account_id: i64,
    path: &Path,
    mapping: &ColumnMapping,
    include_duplicates: bool,
) -> Result<ImportOutcome> {
    let mut rows = parse_statement(path, mapping)?;
    let auto_categorized = auto_assign_categories(conn, &mut rows)?;
    detect_duplicates(conn, &mut rows)?;

    let import_id = format!(
        "import-{}-{}",
        chrono::Utc::now().format("%Y%m%d%H%M%S"),
        account_id
    );
    let mut skipped = 0;
    let mut to_insert = Vec::new();
    for row in rows {
        if row.is_duplicate && !include_duplicates {
            skipped += 1;
            continue;
        }
        to_insert.push(NewTransaction {
            date: row.date,
            account_id,
            amount: row.amount,
            payee: row.payee,
            category: row.category.unwrap_or_else(|| "Uncategorized".to_string()),
            memo: row.memo,
            import_id: Some(import_id.clone()),
            ..Default::default()
        });
    }
    let ids = create_transactions_bulk(conn, &to_insert)?;
    Ok(ImportOutcome {
        imported: ids.len(),
        skipped_duplicates: skipped,
        auto_categorized,
    })
}

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("csv", sub)) = m.subcommand() {
        let account = sub.get_one::<String>("account").unwrap().trim();
        let path = Path::new(sub.get_one::<String>("file").unwrap());
        let mapping = ColumnMapping {
            date: sub
                .get_one::<String>("date-col")
                .map(String::clone)
                .unwrap_or_else(|| "Date".to_string()),
            payee: sub
                .get_one::<String>("payee-col")
                .map(String::clone)
                .unwrap_or_else(|| "Description".to_string()),
            amount: sub.get_one::<String>("amount-col").cloned(),
            debit: sub.get_one::<String>("debit-col").cloned(),
            credit: sub.get_one::<String>("credit-col").cloned(),
            category: sub.get_one::<String>("category-col").cloned(),
            memo: sub.get_one::<String>("memo-col").cloned(),
        };
        let mapping = if mapping.amount.is_none() && mapping.debit.is_none() && mapping.credit.is_none() {
            ColumnMapping {
                amount: Some("Amount".to_string()),
                ..mapping
            }
        } else {
            mapping
        };
        let include_duplicates = sub.get_flag("include-duplicates");
        let account_id = id_for_account(conn, account)?;
        let outcome = import_statement(conn, account_id, path, &mapping, include_duplicates)?;
        println!(
            "Imported {} transactions into '{}' ({} duplicates skipped, {} auto-categorized)",
            outcome.imported, account, outcome.skipped_duplicates, outcome.auto_categorized
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_survive_bank_formatting() {
        assert_eq!(parse_amount("$1,234.56"), Decimal::new(123456, 2));
        assert_eq!(parse_amount("(45.00)"), Decimal::new(-4500, 2));
        assert_eq!(parse_amount("€ 99,00"), Decimal::new(9900, 0));
        assert_eq!(parse_amount("-12.30"), Decimal::new(-1230, 2));
        assert_eq!(parse_amount("N/A"), Decimal::ZERO);
        assert_eq!(parse_amount(""), Decimal::ZERO);
    }

    #[test]
    fn dates_fall_back_to_us_order() {
        let d = |y, m, dd| NaiveDate::from_ymd_opt(y, m, dd).unwrap();
        assert_eq!(parse_csv_date("2025-03-04").unwrap(), d(2025, 3, 4));
        assert_eq!(parse_csv_date("03/04/2025").unwrap(), d(2025, 3, 4));
        assert_eq!(parse_csv_date("03-04-2025").unwrap(), d(2025, 3, 4));
        assert!(parse_csv_date("04.03.2025").is_err());
    }
}
