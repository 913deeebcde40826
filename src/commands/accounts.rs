// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::transactions::recomputed_balance;
use crate::models::Account;
use crate::utils::{db_decimal, id_for_account, maybe_print_json, parse_decimal, pretty_table};
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

pub const ACCOUNT_TYPES: &[&str] = &[
    "checking",
    "savings",
    "credit",
    "investment",
    "retirement",
    "cash",
];

const ACCOUNT_COLUMNS: &str = "id, name, type, balance, opening_balance, currency, is_active";

fn row_to_account(r: &rusqlite::Row<'_>) -> rusqlite::Result<(Account, String, String)> {
    Ok((
        Account {
            id: r.get(0)?,
            name: r.get(1)?,
            r#type: r.get(2)?,
            balance: Decimal::ZERO,
            opening_balance: Decimal::ZERO,
            currency: r.get(5)?,
            is_active: r.get(6)?,
        },
        r.get::<_, String>(3)?,
        r.get::<_, String>(4)?,
    ))
}

fn finish_account((mut a, balance_s, opening_s): (Account, String, String)) -> Result<Account> {
    a.balance = db_decimal(&balance_s, "balance")?;
    a.opening_balance = db_decimal(&opening_s, "opening_balance")?;
    Ok(a)
}

pub fn get_account(conn: &Connection, id: i64) -> Result<Account> {
    let sql = format!("SELECT {} FROM accounts WHERE id=?1", ACCOUNT_COLUMNS);
    let raw = conn
        .query_row(&sql, params![id], row_to_account)
        .with_context(|| format!("Account id {} not found", id))?;
    finish_account(raw)
}

pub fn list_accounts(conn: &Connection, include_inactive: bool) -> Result<Vec<Account>> {
    let sql = if include_inactive {
        format!("SELECT {} FROM accounts ORDER BY name", ACCOUNT_COLUMNS)
    } else {
        format!(
            "SELECT {} FROM accounts WHERE is_active=1 ORDER BY name",
            ACCOUNT_COLUMNS
        )
    };
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        out.push(finish_account(row_to_account(r)?)?);
    }
    Ok(out)
}

/// New accounts start with their running balance equal to the opening
/// balance; every later balance change flows through the transaction engine.
pub fn create_account(
    conn: &Connection,
    name: &str,
    kind: &str,
    opening_balance: Decimal,
    currency: &str,
) -> Result<i64> {
    if !ACCOUNT_TYPES.contains(&kind) {
        return Err(anyhow!(
            "Unknown account type '{}', expected one of {}",
            kind,
            ACCOUNT_TYPES.join(", ")
        ));
    }
    conn.execute(
        "INSERT INTO accounts(name, type, balance, opening_balance, currency)
         VALUES (?1,?2,?3,?3,?4)",
        params![name, kind, opening_balance.to_string(), currency],
    )
    .with_context(|| format!("Account '{}' already exists", name))?;
    Ok(conn.last_insert_rowid())
}

/// Deactivate by default so history stays intact. A hard delete removes the
/// row and cascades to its transactions, and is refused while transactions
/// exist unless forced.
pub fn delete_account(conn: &mut Connection, id: i64, hard: bool, force: bool) -> Result<()> {
    if !hard {
        let n = conn.execute("UPDATE accounts SET is_active=0 WHERE id=?1", params![id])?;
        if n == 0 {
            return Err(anyhow!("Account id {} not found", id));
        }
        return Ok(());
    }
    let tx_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM transactions WHERE account_id=?1",
        params![id],
        |r| r.get(0),
    )?;
    if tx_count > 0 && !force {
        return Err(anyhow!(
            "Account id {} has {} transactions; pass --force to delete them too",
            id,
            tx_count
        ));
    }
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM transactions WHERE account_id=?1", params![id])?;
    let n = tx.execute("DELETE FROM accounts WHERE id=?1", params![id])?;
    if n == 0 {
        return Err(anyhow!("Account id {} not found", id));
    }
    tx.commit()?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct AccountAudit {
    pub account: String,
    pub stored: Decimal,
    pub recomputed: Decimal,
    pub drift: Decimal,
}

/// Compare each account's stored running balance against opening balance
/// plus the sum of its transactions. Both figures must agree; any drift
/// means a balance update was lost or applied twice.
pub fn audit_balances(conn: &Connection) -> Result<Vec<AccountAudit>> {
    let mut out = Vec::new();
    for account in list_accounts(conn, true)? {
        let recomputed = recomputed_balance(conn, account.id)?;
        out.push(AccountAudit {
            drift: account.balance - recomputed,
            stored: account.balance,
            recomputed,
            account: account.name,
        });
    }
    Ok(out)
}

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let kind = sub.get_one::<String>("type").unwrap().trim();
            let opening = match sub.get_one::<String>("opening-balance") {
                Some(s) => parse_decimal(s.trim())?,
                None => Decimal::ZERO,
            };
            let currency = sub
                .get_one::<String>("currency")
                .map(String::as_str)
                .unwrap_or("USD");
            let id = create_account(conn, name, kind, opening, currency)?;
            println!("Created {} account {} '{}' with balance {}", kind, id, name, opening);
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rename", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let new_name = sub.get_one::<String>("new-name").unwrap().trim();
            let id = id_for_account(conn, name)?;
            conn.execute(
                "UPDATE accounts SET name=?1 WHERE id=?2",
                params![new_name, id],
            )?;
            println!("Renamed account '{}' to '{}'", name, new_name);
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let hard = sub.get_flag("hard");
            let force = sub.get_flag("force");
            let id = id_for_account(conn, name)?;
            delete_account(conn, id, hard, force)?;
            if hard {
                println!("Deleted account '{}'", name);
            } else {
                println!("Deactivated account '{}'", name);
            }
        }
        Some(("summary", sub)) => {
            let json_flag = sub.get_flag("json");
            let accounts = list_accounts(conn, false)?;
            let mut by_type: BTreeMap<String, Decimal> = BTreeMap::new();
            for a in &accounts {
                *by_type.entry(a.r#type.clone()).or_default() += a.balance;
            }
            if !maybe_print_json(json_flag, false, &by_type)? {
                let rows = by_type
                    .iter()
                    .map(|(kind, total)| vec![kind.clone(), format!("{:.2}", total)])
                    .collect();
                println!("{}", pretty_table(&["Type", "Total"], rows));
            }
        }
        Some(("audit", sub)) => {
            let json_flag = sub.get_flag("json");
            let data = audit_balances(conn)?;
            if !maybe_print_json(json_flag, false, &data)? {
                let rows = data
                    .iter()
                    .map(|a| {
                        vec![
                            a.account.clone(),
                            format!("{:.2}", a.stored),
                            format!("{:.2}", a.recomputed),
                            format!("{:.2}", a.drift),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Account", "Stored", "Recomputed", "Drift"], rows)
                );
            }
        }
        _ => {}
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let include_inactive = sub.get_flag("all");
    let data = list_accounts(conn, include_inactive)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .iter()
            .map(|a| {
                vec![
                    a.id.to_string(),
                    a.name.clone(),
                    a.r#type.clone(),
                    format!("{:.2}", a.balance),
                    a.currency.clone(),
                    if a.is_active { "yes".into() } else { "no".into() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Name", "Type", "Balance", "Currency", "Active"], rows)
        );
    }
    Ok(())
}
