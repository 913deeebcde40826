// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::ReconciliationHistory;
use crate::utils::{
    account_balance, db_decimal, id_for_account, maybe_print_json, parse_date, parse_decimal,
    pretty_table,
};
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

#[derive(Debug)]
pub struct ReconcileOutcome {
    pub history_id: i64,
    pub reconciled_balance: Decimal,
    pub difference: Decimal,
    pub is_balanced: bool,
}

/// Statement-style reconciliation: mark the selected transactions reconciled,
/// compute the reconciled balance from the statement's beginning balance plus
/// the selected amounts, and persist a history record either way. The caller
/// decides what to do with an unbalanced outcome.
///
/// Amounts are exact decimals, so `is_balanced` is exact equality rather than
/// the cent tolerance a float implementation would need.
pub fn reconcile_transactions(
    conn: &mut Connection,
    account_id: i64,
    transaction_ids: &[i64],
    statement_date: NaiveDate,
    statement_beginning_balance: Decimal,
    statement_ending_balance: Decimal,
    notes: Option<String>,
) -> Result<ReconcileOutcome> {
    let tx = conn.transaction()?;

    let mut selected_sum = Decimal::ZERO;
    {
        let mut fetch = tx.prepare("SELECT amount FROM transactions WHERE id=?1 AND account_id=?2")?;
        let mut mark = tx.prepare("UPDATE transactions SET reconciled=1 WHERE id=?1")?;
        for &id in transaction_ids {
            let amount_s: String = fetch
                .query_row(params![id, account_id], |r| r.get(0))
                .with_context(|| {
                    format!("Transaction id {} not found on account {}", id, account_id)
                })?;
            selected_sum += db_decimal(&amount_s, "amount")?;
            mark.execute(params![id])?;
        }
    }

    let reconciled_balance = statement_beginning_balance + selected_sum;
    let difference = reconciled_balance - statement_ending_balance;

    tx.execute(
        "INSERT INTO reconciliation_history(account_id, statement_date,
             statement_beginning_balance, statement_ending_balance,
             reconciled_balance, difference, transaction_count, notes)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
        params![
            account_id,
            statement_date.to_string(),
            statement_beginning_balance.to_string(),
            statement_ending_balance.to_string(),
            reconciled_balance.to_string(),
            difference.to_string(),
            transaction_ids.len() as i64,
            notes,
        ],
    )?;
    let history_id = tx.last_insert_rowid();
    {
        let mut entry = tx.prepare(
            "INSERT INTO reconciliation_entries(reconciliation_id, transaction_id) VALUES (?1,?2)",
        )?;
        for &id in transaction_ids {
            entry.execute(params![history_id, id])?;
        }
    }
    tx.commit()?;

    Ok(ReconcileOutcome {
        history_id,
        reconciled_balance,
        difference,
        is_balanced: difference.is_zero(),
    })
}

/// Undo a reconciliation session. Only the transactions recorded for that
/// session are unreconciled, so overlapping sessions on the same account
/// cannot clobber each other.
pub fn undo_reconciliation(conn: &mut Connection, history_id: i64) -> Result<usize> {
    let tx = conn.transaction()?;
    let count = {
        let mut stmt = tx.prepare(
            "SELECT transaction_id FROM reconciliation_entries WHERE reconciliation_id=?1",
        )?;
        let ids: Vec<i64> = stmt
            .query_map(params![history_id], |r| r.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        let mut unmark = tx.prepare("UPDATE transactions SET reconciled=0 WHERE id=?1")?;
        for id in &ids {
            unmark.execute(params![id])?;
        }
        ids.len()
    };
    let deleted = tx.execute(
        "DELETE FROM reconciliation_history WHERE id=?1",
        params![history_id],
    )?;
    if deleted == 0 {
        return Err(anyhow!("Reconciliation record {} not found", history_id));
    }
    tx.commit()?;
    Ok(count)
}

/// Single-account consistency check: the implied already-reconciled balance
/// is `account.balance - sum(unreconciled through date)`; adding the
/// unreconciled sum back must equal the caller's expected balance before
/// anything is marked.
pub fn auto_reconcile(
    conn: &mut Connection,
    account_id: i64,
    reconcile_date: NaiveDate,
    expected_balance: Decimal,
) -> Result<usize> {
    let balance = account_balance(conn, account_id)?;

    let tx = conn.transaction()?;
    let (ids, unreconciled_sum) = {
        let mut stmt = tx.prepare(
            "SELECT id, amount FROM transactions
             WHERE account_id=?1 AND reconciled=0 AND date<=?2 ORDER BY date",
        )?;
        let mut rows = stmt.query(params![account_id, reconcile_date.to_string()])?;
        let mut ids = Vec::new();
        let mut sum = Decimal::ZERO;
        while let Some(r) = rows.next()? {
            ids.push(r.get::<_, i64>(0)?);
            let s: String = r.get(1)?;
            sum += db_decimal(&s, "amount")?;
        }
        (ids, sum)
    };

    let already_reconciled = balance - unreconciled_sum;
    let computed = already_reconciled + unreconciled_sum;
    if computed != expected_balance {
        return Err(anyhow!(
            "Balance mismatch: expected {}, calculated {}. Difference: {}",
            expected_balance,
            computed,
            (computed - expected_balance).abs()
        ));
    }

    {
        let mut mark = tx.prepare("UPDATE transactions SET reconciled=1 WHERE id=?1")?;
        for id in &ids {
            mark.execute(params![id])?;
        }
    }
    tx.commit()?;
    Ok(ids.len())
}

/// Unreconciled transaction ids on an account dated on/before `through`.
pub fn unreconciled_ids(
    conn: &Connection,
    account_id: i64,
    through: NaiveDate,
) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM transactions
         WHERE account_id=?1 AND reconciled=0 AND date<=?2 ORDER BY date",
    )?;
    let ids = stmt
        .query_map(params![account_id, through.to_string()], |r| r.get(0))?
        .collect::<rusqlite::Result<_>>()?;
    Ok(ids)
}

pub fn history_for_account(
    conn: &Connection,
    account_id: i64,
) -> Result<Vec<ReconciliationHistory>> {
    let mut stmt = conn.prepare(
        "SELECT id, account_id, statement_date, statement_beginning_balance,
                statement_ending_balance, reconciled_balance, difference,
                transaction_count, notes
         FROM reconciliation_history WHERE account_id=?1
         ORDER BY statement_date DESC",
    )?;
    let mut rows = stmt.query(params![account_id])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        out.push(ReconciliationHistory {
            id: r.get(0)?,
            account_id: r.get(1)?,
            statement_date: r.get(2)?,
            statement_beginning_balance: db_decimal(&r.get::<_, String>(3)?, "balance")?,
            statement_ending_balance: db_decimal(&r.get::<_, String>(4)?, "balance")?,
            reconciled_balance: db_decimal(&r.get::<_, String>(5)?, "balance")?,
            difference: db_decimal(&r.get::<_, String>(6)?, "difference")?,
            transaction_count: r.get(7)?,
            notes: r.get(8)?,
        });
    }
    Ok(out)
}

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("run", sub)) => run(conn, sub)?,
        Some(("auto", sub)) => {
            let account = sub.get_one::<String>("account").unwrap().trim();
            let date = parse_date(sub.get_one::<String>("date").unwrap().trim())?;
            let expected = parse_decimal(sub.get_one::<String>("expected").unwrap().trim())?;
            let account_id = id_for_account(conn, account)?;
            let count = auto_reconcile(conn, account_id, date, expected)?;
            println!("Reconciled {} transactions on '{}'", count, account);
        }
        Some(("undo", sub)) => {
            let id: i64 = sub.get_one::<String>("id").unwrap().trim().parse()?;
            let count = undo_reconciliation(conn, id)?;
            println!("Unreconciled {} transactions from session {}", count, id);
        }
        Some(("history", sub)) => {
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            let account = sub.get_one::<String>("account").unwrap().trim();
            let account_id = id_for_account(conn, account)?;
            let data = history_for_account(conn, account_id)?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|h| {
                        vec![
                            h.id.to_string(),
                            h.statement_date.to_string(),
                            format!("{:.2}", h.statement_beginning_balance),
                            format!("{:.2}", h.statement_ending_balance),
                            format!("{:.2}", h.reconciled_balance),
                            format!("{:.2}", h.difference),
                            h.transaction_count.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Statement", "Begin", "End", "Reconciled", "Diff", "Count"],
                        rows
                    )
                );
            }
        }
        _ => {}
    }
    Ok(())
}

fn run(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let account = sub.get_one::<String>("account").unwrap().trim();
    let date = parse_date(sub.get_one::<String>("date").unwrap().trim())?;
    let begin = parse_decimal(sub.get_one::<String>("begin").unwrap().trim())?;
    let end = parse_decimal(sub.get_one::<String>("end").unwrap().trim())?;
    let notes = sub
        .get_one::<String>("notes")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let account_id = id_for_account(conn, account)?;

    // Pre-selected ids, or every unreconciled transaction through the
    // statement date.
    let ids: Vec<i64> = match sub.get_one::<String>("ids") {
        Some(raw) => raw
            .split(',')
            .map(|s| {
                s.trim()
                    .parse::<i64>()
                    .with_context(|| format!("Invalid transaction id '{}'", s.trim()))
            })
            .collect::<Result<_>>()?,
        None => unreconciled_ids(conn, account_id, date)?,
    };

    let outcome = reconcile_transactions(conn, account_id, &ids, date, begin, end, notes)?;
    if outcome.is_balanced {
        println!(
            "Balanced: reconciled {} transactions, reconciled balance {:.2}",
            ids.len(),
            outcome.reconciled_balance
        );
    } else {
        println!(
            "NOT balanced: reconciled balance {:.2}, statement ending {:.2}, difference {:.2} (session {})",
            outcome.reconciled_balance,
            end,
            outcome.difference,
            outcome.history_id
        );
    }
    Ok(())
}
