// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Transaction;
use crate::utils::{
    db_decimal, id_for_account, maybe_print_json, parse_date, parse_decimal, pretty_table,
};
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Payload for a new ledger transaction. Everything the row needs except the
/// generated id.
#[derive(Debug, Clone, Default)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub account_id: i64,
    pub amount: Decimal,
    pub payee: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub memo: Option<String>,
    pub reconciled: bool,
    pub transaction_type: Option<String>,
    pub linked_transaction_id: Option<i64>,
    pub recurring_transaction_id: Option<i64>,
    pub import_id: Option<String>,
}

/// Partial update; `None` leaves the stored field untouched.
#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    pub date: Option<NaiveDate>,
    pub account_id: Option<i64>,
    pub amount: Option<Decimal>,
    pub payee: Option<String>,
    pub category: Option<String>,
    pub memo: Option<String>,
    pub reconciled: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct TxFilter {
    pub account_ids: Vec<i64>,
    pub categories: Vec<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub search: Option<String>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub reconciled: Option<bool>,
}

/// Shift an account's materialized balance by `delta`. Callers are expected
/// to hold an open SQL transaction so the row write and the balance write
/// commit together.
pub(crate) fn adjust_balance(conn: &Connection, account_id: i64, delta: Decimal) -> Result<()> {
    let balance_s: String = conn
        .query_row(
            "SELECT balance FROM accounts WHERE id=?1",
            params![account_id],
            |r| r.get(0),
        )
        .with_context(|| format!("Account id {} not found", account_id))?;
    let balance = db_decimal(&balance_s, "balance")?;
    conn.execute(
        "UPDATE accounts SET balance=?1 WHERE id=?2",
        params![(balance + delta).to_string(), account_id],
    )?;
    Ok(())
}

pub(crate) fn insert_row(conn: &Connection, new: &NewTransaction) -> Result<i64> {
    conn.execute(
        "INSERT INTO transactions(date, account_id, amount, payee, category, subcategory, memo,
                                  reconciled, transaction_type, linked_transaction_id,
                                  recurring_transaction_id, import_id)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12)",
        params![
            new.date.to_string(),
            new.account_id,
            new.amount.to_string(),
            new.payee,
            new.category,
            new.subcategory,
            new.memo,
            new.reconciled,
            new.transaction_type,
            new.linked_transaction_id,
            new.recurring_transaction_id,
            new.import_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn row_to_transaction(r: &rusqlite::Row<'_>) -> rusqlite::Result<(Transaction, String)> {
    Ok((
        Transaction {
            id: r.get(0)?,
            date: r.get(1)?,
            account_id: r.get(2)?,
            amount: Decimal::ZERO, // filled from the raw string below
            payee: r.get(4)?,
            category: r.get(5)?,
            subcategory: r.get(6)?,
            memo: r.get(7)?,
            reconciled: r.get(8)?,
            transaction_type: r.get(9)?,
            linked_transaction_id: r.get(10)?,
            recurring_transaction_id: r.get(11)?,
            import_id: r.get(12)?,
        },
        r.get::<_, String>(3)?,
    ))
}

const TX_COLUMNS: &str = "id, date, account_id, amount, payee, category, subcategory, memo, \
                          reconciled, transaction_type, linked_transaction_id, \
                          recurring_transaction_id, import_id";

pub fn get_transaction(conn: &Connection, id: i64) -> Result<Transaction> {
    let sql = format!("SELECT {} FROM transactions WHERE id=?1", TX_COLUMNS);
    let (mut t, amount_s) = conn
        .query_row(&sql, params![id], row_to_transaction)
        .with_context(|| format!("Transaction id {} not found", id))?;
    t.amount = db_decimal(&amount_s, "amount")?;
    Ok(t)
}

/// Insert a transaction and apply its amount to the owning account's balance
/// as one atomic unit.
pub fn create_transaction(conn: &mut Connection, new: &NewTransaction) -> Result<Transaction> {
    if new.payee.trim().is_empty() {
        return Err(anyhow!("Payee cannot be empty"));
    }
    let tx = conn.transaction()?;
    let id = insert_row(&tx, new)?;
    adjust_balance(&tx, new.account_id, new.amount)?;
    tx.commit()?;
    get_transaction(conn, id)
}

/// Patch a transaction. When the amount or the owning account changes, the
/// old amount is reversed on the old account and the new amount applied on
/// the (possibly different) new account. Two balance writes, never a diff in
/// place, so cross-account moves cannot corrupt either side.
pub fn update_transaction(
    conn: &mut Connection,
    id: i64,
    patch: &TransactionPatch,
) -> Result<Transaction> {
    let old = get_transaction(conn, id)?;
    let tx = conn.transaction()?;

    let mut sets: Vec<String> = Vec::new();
    let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
    let push = |sets: &mut Vec<String>, args: &mut Vec<Box<dyn rusqlite::ToSql>>,
                    col: &str,
                    v: Box<dyn rusqlite::ToSql>| {
        args.push(v);
        sets.push(format!("{}=?{}", col, args.len()));
    };
    if let Some(date) = patch.date {
        push(&mut sets, &mut args, "date", Box::new(date.to_string()));
    }
    if let Some(account_id) = patch.account_id {
        push(&mut sets, &mut args, "account_id", Box::new(account_id));
    }
    if let Some(amount) = patch.amount {
        push(&mut sets, &mut args, "amount", Box::new(amount.to_string()));
    }
    if let Some(ref payee) = patch.payee {
        push(&mut sets, &mut args, "payee", Box::new(payee.clone()));
    }
    if let Some(ref category) = patch.category {
        push(&mut sets, &mut args, "category", Box::new(category.clone()));
    }
    if let Some(ref memo) = patch.memo {
        push(&mut sets, &mut args, "memo", Box::new(memo.clone()));
    }
    if let Some(reconciled) = patch.reconciled {
        push(&mut sets, &mut args, "reconciled", Box::new(reconciled));
    }

    if !sets.is_empty() {
        let sql = format!(
            "UPDATE transactions SET {} WHERE id=?{}",
            sets.join(", "),
            args.len() + 1
        );
        args.push(Box::new(id));
        let refs: Vec<&dyn rusqlite::ToSql> = args.iter().map(|a| a.as_ref()).collect();
        tx.execute(&sql, refs.as_slice())?;
    }

    if patch.amount.is_some() || patch.account_id.is_some() {
        let new_account = patch.account_id.unwrap_or(old.account_id);
        let new_amount = patch.amount.unwrap_or(old.amount);
        adjust_balance(&tx, old.account_id, -old.amount)?;
        adjust_balance(&tx, new_account, new_amount)?;
    }

    tx.commit()?;
    get_transaction(conn, id)
}

/// Delete a transaction, reversing its balance impact in the same unit.
pub fn delete_transaction(conn: &mut Connection, id: i64) -> Result<()> {
    let old = get_transaction(conn, id)?;
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM transactions WHERE id=?1", params![id])?;
    adjust_balance(&tx, old.account_id, -old.amount)?;
    tx.commit()?;
    Ok(())
}

/// Bulk create for imports. Amounts are aggregated per account and applied as
/// one balance delta per account; the net effect matches row-at-a-time
/// application.
pub fn create_transactions_bulk(
    conn: &mut Connection,
    rows: &[NewTransaction],
) -> Result<Vec<i64>> {
    let tx = conn.transaction()?;
    let mut ids = Vec::with_capacity(rows.len());
    let mut totals: HashMap<i64, Decimal> = HashMap::new();
    for row in rows {
        ids.push(insert_row(&tx, row)?);
        *totals.entry(row.account_id).or_insert(Decimal::ZERO) += row.amount;
    }
    for (account_id, total) in totals {
        adjust_balance(&tx, account_id, total)?;
    }
    tx.commit()?;
    Ok(ids)
}

/// Flip the reconciled flag. No balance effect.
pub fn toggle_reconciled(conn: &mut Connection, id: i64) -> Result<Transaction> {
    let t = get_transaction(conn, id)?;
    update_transaction(
        conn,
        id,
        &TransactionPatch {
            reconciled: Some(!t.reconciled),
            ..Default::default()
        },
    )
}

pub fn list_transactions(conn: &Connection, filter: &TxFilter) -> Result<Vec<Transaction>> {
    let mut sql = format!("SELECT {} FROM transactions WHERE 1=1", TX_COLUMNS);
    let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if !filter.account_ids.is_empty() {
        let marks = vec!["?"; filter.account_ids.len()].join(",");
        sql.push_str(&format!(" AND account_id IN ({})", marks));
        for id in &filter.account_ids {
            args.push(Box::new(*id));
        }
    }
    if !filter.categories.is_empty() {
        let marks = vec!["?"; filter.categories.len()].join(",");
        sql.push_str(&format!(" AND category IN ({})", marks));
        for c in &filter.categories {
            args.push(Box::new(c.clone()));
        }
    }
    if let Some(from) = filter.date_from {
        sql.push_str(" AND date >= ?");
        args.push(Box::new(from.to_string()));
    }
    if let Some(to) = filter.date_to {
        sql.push_str(" AND date <= ?");
        args.push(Box::new(to.to_string()));
    }
    if let Some(ref term) = filter.search {
        sql.push_str(" AND (LOWER(payee) LIKE ? OR LOWER(IFNULL(memo,'')) LIKE ?)");
        let pat = format!("%{}%", term.to_lowercase());
        args.push(Box::new(pat.clone()));
        args.push(Box::new(pat));
    }
    if let Some(min) = filter.min_amount {
        sql.push_str(" AND CAST(amount AS REAL) >= ?");
        args.push(Box::new(min.to_string().parse::<f64>().unwrap_or(0.0)));
    }
    if let Some(max) = filter.max_amount {
        sql.push_str(" AND CAST(amount AS REAL) <= ?");
        args.push(Box::new(max.to_string().parse::<f64>().unwrap_or(0.0)));
    }
    if let Some(rec) = filter.reconciled {
        sql.push_str(" AND reconciled = ?");
        args.push(Box::new(rec));
    }
    sql.push_str(" ORDER BY date DESC, id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let refs: Vec<&dyn rusqlite::ToSql> = args.iter().map(|a| a.as_ref()).collect();
    let mut rows = stmt.query(refs.as_slice())?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let (mut t, amount_s) = row_to_transaction(r)?;
        t.amount = db_decimal(&amount_s, "amount")?;
        out.push(t);
    }
    Ok(out)
}

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        Some(("reconcile-toggle", sub)) => {
            let id: i64 = sub.get_one::<String>("id").unwrap().trim().parse()?;
            let t = toggle_reconciled(conn, id)?;
            println!(
                "Transaction {} is now {}",
                t.id,
                if t.reconciled { "reconciled" } else { "unreconciled" }
            );
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let date = parse_date(sub.get_one::<String>("date").unwrap().trim())?;
    let account = sub.get_one::<String>("account").unwrap().trim();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?;
    let payee = sub.get_one::<String>("payee").unwrap().trim().to_string();
    // Core stores whatever it is given; the empty-category default lives here
    // at the CLI boundary.
    let category = sub
        .get_one::<String>("category")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Uncategorized".to_string());
    let memo = sub
        .get_one::<String>("memo")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let account_id = id_for_account(conn, account)?;
    let t = create_transaction(
        conn,
        &NewTransaction {
            date,
            account_id,
            amount,
            payee,
            category,
            memo,
            ..Default::default()
        },
    )?;
    println!(
        "Recorded {} on {} at '{}' (acct: {})",
        t.amount, t.date, t.payee, account
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let mut filter = TxFilter::default();
    if let Some(acct) = sub.get_one::<String>("account") {
        filter.account_ids.push(id_for_account(conn, acct.trim())?);
    }
    if let Some(cat) = sub.get_one::<String>("category") {
        filter.categories.push(cat.trim().to_string());
    }
    if let Some(from) = sub.get_one::<String>("from") {
        filter.date_from = Some(parse_date(from.trim())?);
    }
    if let Some(to) = sub.get_one::<String>("to") {
        filter.date_to = Some(parse_date(to.trim())?);
    }
    if let Some(term) = sub.get_one::<String>("search") {
        filter.search = Some(term.trim().to_string());
    }
    if let Some(min) = sub.get_one::<String>("min-amount") {
        filter.min_amount = Some(parse_decimal(min.trim())?);
    }
    if let Some(max) = sub.get_one::<String>("max-amount") {
        filter.max_amount = Some(parse_decimal(max.trim())?);
    }
    if sub.get_flag("reconciled") {
        filter.reconciled = Some(true);
    } else if sub.get_flag("unreconciled") {
        filter.reconciled = Some(false);
    }

    let data = list_transactions(conn, &filter)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|t| {
                vec![
                    t.id.to_string(),
                    t.date.to_string(),
                    t.payee.clone(),
                    format!("{:.2}", t.amount),
                    t.category.clone(),
                    if t.reconciled { "R".into() } else { String::new() },
                    t.memo.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Payee", "Amount", "Category", "Rec", "Memo"],
                rows
            )
        );
    }
    Ok(())
}

fn edit(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id: i64 = sub.get_one::<String>("id").unwrap().trim().parse()?;
    let mut patch = TransactionPatch::default();
    if let Some(date) = sub.get_one::<String>("date") {
        patch.date = Some(parse_date(date.trim())?);
    }
    if let Some(acct) = sub.get_one::<String>("account") {
        patch.account_id = Some(id_for_account(conn, acct.trim())?);
    }
    if let Some(amount) = sub.get_one::<String>("amount") {
        patch.amount = Some(parse_decimal(amount.trim())?);
    }
    if let Some(payee) = sub.get_one::<String>("payee") {
        patch.payee = Some(payee.trim().to_string());
    }
    if let Some(cat) = sub.get_one::<String>("category") {
        patch.category = Some(cat.trim().to_string());
    }
    if let Some(memo) = sub.get_one::<String>("memo") {
        patch.memo = Some(memo.trim().to_string());
    }
    let t = update_transaction(conn, id, &patch)?;
    println!("Updated transaction {} ({} at '{}')", t.id, t.amount, t.payee);
    Ok(())
}

fn rm(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id: i64 = sub.get_one::<String>("id").unwrap().trim().parse()?;
    delete_transaction(conn, id)?;
    println!("Removed transaction {}", id);
    Ok(())
}

/// Exists mainly for the end-to-end invariant tests: recompute a balance the
/// slow way.
pub fn recomputed_balance(conn: &Connection, account_id: i64) -> Result<Decimal> {
    let opening_s: String = conn
        .query_row(
            "SELECT opening_balance FROM accounts WHERE id=?1",
            params![account_id],
            |r| r.get(0),
        )
        .with_context(|| format!("Account id {} not found", account_id))?;
    let mut total = db_decimal(&opening_s, "opening balance")?;
    let mut stmt = conn.prepare("SELECT amount FROM transactions WHERE account_id=?1")?;
    let mut rows = stmt.query(params![account_id])?;
    while let Some(r) = rows.next()? {
        let s: String = r.get(0)?;
        total += db_decimal(&s, "amount")?;
    }
    Ok(total)
}

/// First transaction matching the (date, amount, payee) natural key, if any.
/// The importer uses this triple for duplicate flagging.
pub fn find_by_natural_key(
    conn: &Connection,
    date: NaiveDate,
    amount: Decimal,
    payee: &str,
) -> Result<Option<i64>> {
    let id: Option<i64> = conn
        .query_row(
            "SELECT id FROM transactions WHERE date=?1 AND amount=?2 AND LOWER(payee)=LOWER(?3) LIMIT 1",
            params![date.to_string(), amount.to_string(), payee],
            |r| r.get(0),
        )
        .optional()?;
    Ok(id)
}
