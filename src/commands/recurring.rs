// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::transactions::{adjust_balance, get_transaction, insert_row, NewTransaction};
use crate::models::{RecurringTransaction, Transaction};
use crate::utils::{
    db_decimal, id_for_account, maybe_print_json, parse_date, parse_decimal, pretty_table,
};
use anyhow::{anyhow, Context, Result};
use chrono::{Days, Months, NaiveDate};
use rusqlite::{params, Connection};

/// Advance a due date by one period.
pub fn advance_date(date: NaiveDate, frequency: &str) -> Result<NaiveDate> {
    let next = match frequency {
        "weekly" => date.checked_add_days(Days::new(7)),
        "bi-weekly" => date.checked_add_days(Days::new(14)),
        "monthly" => date.checked_add_months(Months::new(1)),
        "quarterly" => date.checked_add_months(Months::new(3)),
        "yearly" => date.checked_add_months(Months::new(12)),
        other => return Err(anyhow!("Unknown frequency '{}'", other)),
    };
    next.with_context(|| format!("Date overflow advancing {} by {}", date, frequency))
}

fn row_to_recurring(r: &rusqlite::Row<'_>) -> rusqlite::Result<(RecurringTransaction, String)> {
    Ok((
        RecurringTransaction {
            id: r.get(0)?,
            account_id: r.get(1)?,
            frequency: r.get(2)?,
            next_date: r.get(3)?,
            end_date: r.get(4)?,
            amount: rust_decimal::Decimal::ZERO,
            payee: r.get(6)?,
            category: r.get(7)?,
            memo: r.get(8)?,
            is_active: r.get(9)?,
            last_created_date: r.get(10)?,
        },
        r.get::<_, String>(5)?,
    ))
}

const REC_COLUMNS: &str = "id, account_id, frequency, next_date, end_date, amount, payee, \
                           category, memo, is_active, last_created_date";

pub fn get_recurring(conn: &Connection, id: i64) -> Result<RecurringTransaction> {
    let sql = format!("SELECT {} FROM recurring_transactions WHERE id=?1", REC_COLUMNS);
    let (mut rec, amount_s) = conn
        .query_row(&sql, params![id], row_to_recurring)
        .with_context(|| format!("Recurring transaction id {} not found", id))?;
    rec.amount = db_decimal(&amount_s, "amount")?;
    Ok(rec)
}

pub fn list_recurring(conn: &Connection) -> Result<Vec<RecurringTransaction>> {
    let sql = format!(
        "SELECT {} FROM recurring_transactions ORDER BY next_date",
        REC_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let (mut rec, amount_s) = row_to_recurring(r)?;
        rec.amount = db_decimal(&amount_s, "amount")?;
        out.push(rec);
    }
    Ok(out)
}

pub fn toggle_active(conn: &Connection, id: i64) -> Result<RecurringTransaction> {
    let rec = get_recurring(conn, id)?;
    conn.execute(
        "UPDATE recurring_transactions SET is_active=?1 WHERE id=?2",
        params![!rec.is_active, id],
    )?;
    get_recurring(conn, id)
}

/// One scheduler pass over every recurring entry, with `today` injected by
/// the caller.
///
/// Per entry: inactive entries are skipped; entries whose end date has passed
/// are deactivated without materializing; the `last_created_date` guard caps
/// materialization at one per calendar day; a due entry materializes exactly
/// one transaction and advances `next_date` by one period. Multiple elapsed
/// periods still produce a single occurrence per pass.
pub fn process_recurring(conn: &mut Connection, today: NaiveDate) -> Result<Vec<Transaction>> {
    let entries = list_recurring(conn)?;
    let mut created = Vec::new();

    for rec in entries {
        if !rec.is_active {
            continue;
        }
        if let Some(end) = rec.end_date {
            if today > end {
                conn.execute(
                    "UPDATE recurring_transactions SET is_active=0 WHERE id=?1",
                    params![rec.id],
                )?;
                continue;
            }
        }
        if rec.next_date > today {
            continue;
        }
        if rec.last_created_date == Some(today) {
            continue;
        }

        let memo = match &rec.memo {
            Some(m) => format!("{} (Auto-generated)", m),
            None => "Auto-generated from recurring transaction".to_string(),
        };
        let new = NewTransaction {
            date: rec.next_date,
            account_id: rec.account_id,
            amount: rec.amount,
            payee: rec.payee.clone(),
            category: rec.category.clone(),
            memo: Some(memo),
            recurring_transaction_id: Some(rec.id),
            ..Default::default()
        };

        // Materialization and schedule advance commit together.
        let tx = conn.transaction()?;
        let id = insert_row(&tx, &new)?;
        adjust_balance(&tx, new.account_id, new.amount)?;
        let next = advance_date(rec.next_date, &rec.frequency)?;
        tx.execute(
            "UPDATE recurring_transactions SET next_date=?1, last_created_date=?2 WHERE id=?3",
            params![next.to_string(), today.to_string(), rec.id],
        )?;
        tx.commit()?;

        created.push(get_transaction(conn, id)?);
    }
    Ok(created)
}

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let id: i64 = sub.get_one::<String>("id").unwrap().trim().parse()?;
            conn.execute("DELETE FROM recurring_transactions WHERE id=?1", params![id])?;
            println!("Removed recurring transaction {}", id);
        }
        Some(("toggle", sub)) => {
            let id: i64 = sub.get_one::<String>("id").unwrap().trim().parse()?;
            let rec = toggle_active(conn, id)?;
            println!(
                "Recurring transaction {} is now {}",
                rec.id,
                if rec.is_active { "active" } else { "inactive" }
            );
        }
        Some(("process", _)) => {
            let today = chrono::Utc::now().date_naive();
            let created = process_recurring(conn, today)?;
            println!("Materialized {} transactions", created.len());
            for t in created {
                println!("  {} {} at '{}'", t.date, t.amount, t.payee);
            }
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let account = sub.get_one::<String>("account").unwrap().trim();
    let frequency = sub.get_one::<String>("frequency").unwrap().trim();
    let next_date = parse_date(sub.get_one::<String>("next-date").unwrap().trim())?;
    let end_date = sub
        .get_one::<String>("end-date")
        .map(|s| parse_date(s.trim()))
        .transpose()?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?;
    let payee = sub.get_one::<String>("payee").unwrap().trim();
    let category = sub
        .get_one::<String>("category")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Uncategorized".to_string());
    let memo = sub
        .get_one::<String>("memo")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    // Validate up front rather than trip the schema CHECK.
    advance_date(next_date, frequency)?;

    let account_id = id_for_account(conn, account)?;
    conn.execute(
        "INSERT INTO recurring_transactions(account_id, frequency, next_date, end_date,
                                            amount, payee, category, memo)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
        params![
            account_id,
            frequency,
            next_date.to_string(),
            end_date.map(|d| d.to_string()),
            amount.to_string(),
            payee,
            category,
            memo,
        ],
    )?;
    println!(
        "Scheduled {} '{}' {} starting {}",
        frequency, payee, amount, next_date
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = list_recurring(conn)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .iter()
            .map(|rec| {
                vec![
                    rec.id.to_string(),
                    rec.payee.clone(),
                    rec.frequency.clone(),
                    rec.next_date.to_string(),
                    format!("{:.2}", rec.amount),
                    rec.category.clone(),
                    if rec.is_active { "yes".into() } else { "no".into() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Payee", "Frequency", "Next", "Amount", "Category", "Active"],
                rows
            )
        );
    }
    Ok(())
}
