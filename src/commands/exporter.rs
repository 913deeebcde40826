// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::transactions::{list_transactions, TxFilter};
use crate::utils::{account_name, id_for_account, parse_date};
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

/// Write filtered transactions as CSV, newest first, in a shape most
/// spreadsheet tools and banks agree on.
pub fn export_csv<W: Write>(conn: &Connection, filter: &TxFilter, out: W) -> Result<usize> {
    let transactions = list_transactions(conn, filter)?;
    let mut names: HashMap<i64, String> = HashMap::new();

    let mut writer = csv::Writer::from_writer(out);
    writer.write_record([
        "Date",
        "Account",
        "Payee",
        "Category",
        "Memo",
        "Amount",
        "Reconciled",
    ])?;
    for t in &transactions {
        let account = match names.get(&t.account_id) {
            Some(n) => n.clone(),
            None => {
                let n = account_name(conn, t.account_id)?;
                names.insert(t.account_id, n.clone());
                n
            }
        };
        let date = t.date.to_string();
        let amount = format!("{:.2}", t.amount);
        writer.write_record([
            date.as_str(),
            account.as_str(),
            t.payee.as_str(),
            t.category.as_str(),
            t.memo.as_deref().unwrap_or(""),
            amount.as_str(),
            if t.reconciled { "yes" } else { "no" },
        ])?;
    }
    writer.flush()?;
    Ok(transactions.len())
}

pub fn export_csv_file(conn: &Connection, filter: &TxFilter, path: &Path) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Cannot create {}", path.display()))?;
    export_csv(conn, filter, file)
}

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("csv", sub)) = m.subcommand() {
        let path = Path::new(sub.get_one::<String>("file").unwrap());
        let mut filter = TxFilter::default();
        if let Some(account) = sub.get_one::<String>("account") {
            filter.account_ids.push(id_for_account(conn, account.trim())?);
        }
        if let Some(from) = sub.get_one::<String>("from") {
            filter.date_from = Some(parse_date(from.trim())?);
        }
        if let Some(to) = sub.get_one::<String>("to") {
            filter.date_to = Some(parse_date(to.trim())?);
        }
        let count = export_csv_file(conn, &filter, path)?;
        println!("Exported {} transactions to {}", count, path.display());
    }
    Ok(())
}
