// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::transactions::{adjust_balance, insert_row, NewTransaction};
use crate::models::Reminder;
use crate::utils::{
    db_decimal, id_for_account, maybe_print_json, parse_date, parse_decimal, pretty_table,
};
use anyhow::{anyhow, Context, Result};
use chrono::{Months, NaiveDate};
use rusqlite::{params, Connection};

const REMINDER_COLUMNS: &str =
    "id, title, amount, due_date, frequency, is_paid, linked_transaction_id, category, notes";

fn row_to_reminder(r: &rusqlite::Row<'_>) -> rusqlite::Result<(Reminder, Option<String>)> {
    Ok((
        Reminder {
            id: r.get(0)?,
            title: r.get(1)?,
            amount: None,
            due_date: r.get(3)?,
            frequency: r.get(4)?,
            is_paid: r.get(5)?,
            linked_transaction_id: r.get(6)?,
            category: r.get(7)?,
            notes: r.get(8)?,
        },
        r.get::<_, Option<String>>(2)?,
    ))
}

fn finish_reminder((mut rem, amount_s): (Reminder, Option<String>)) -> Result<Reminder> {
    rem.amount = amount_s.as_deref().map(|s| db_decimal(s, "amount")).transpose()?;
    Ok(rem)
}

pub fn get_reminder(conn: &Connection, id: i64) -> Result<Reminder> {
    let sql = format!("SELECT {} FROM reminders WHERE id=?1", REMINDER_COLUMNS);
    let raw = conn
        .query_row(&sql, params![id], row_to_reminder)
        .with_context(|| format!("Reminder id {} not found", id))?;
    finish_reminder(raw)
}

pub fn list_reminders(conn: &Connection) -> Result<Vec<Reminder>> {
    let sql = format!("SELECT {} FROM reminders ORDER BY due_date", REMINDER_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        out.push(finish_reminder(row_to_reminder(r)?)?);
    }
    Ok(out)
}

/// Unpaid reminders due within the next `days` days, today included.
pub fn upcoming_reminders(conn: &Connection, today: NaiveDate, days: u64) -> Result<Vec<Reminder>> {
    let horizon = today
        .checked_add_days(chrono::Days::new(days))
        .context("Horizon out of range")?;
    Ok(list_reminders(conn)?
        .into_iter()
        .filter(|r| !r.is_paid && r.due_date >= today && r.due_date <= horizon)
        .collect())
}

pub fn overdue_reminders(conn: &Connection, today: NaiveDate) -> Result<Vec<Reminder>> {
    Ok(list_reminders(conn)?
        .into_iter()
        .filter(|r| !r.is_paid && r.due_date < today)
        .collect())
}

fn next_due_date(due: NaiveDate, frequency: &str) -> Option<NaiveDate> {
    match frequency {
        "monthly" => due.checked_add_months(Months::new(1)),
        "yearly" => due.checked_add_months(Months::new(12)),
        _ => None,
    }
}

/// Pay a bill: record the payment as a normal expense transaction on the
/// given account, mark the reminder paid and link it to the transaction.
/// Recurring reminders spawn their next occurrence in the same step.
pub fn mark_paid(
    conn: &mut Connection,
    reminder_id: i64,
    account_id: i64,
    paid_on: NaiveDate,
) -> Result<i64> {
    let rem = get_reminder(conn, reminder_id)?;
    if rem.is_paid {
        return Err(anyhow!("Reminder '{}' is already paid", rem.title));
    }
    let amount = rem
        .amount
        .ok_or_else(|| anyhow!("Reminder '{}' has no amount to pay", rem.title))?;

    let tx = conn.transaction()?;
    let transaction_id = insert_row(
        &tx,
        &NewTransaction {
            date: paid_on,
            account_id,
            amount: -amount.abs(),
            payee: format!("Bill payment: {}", rem.title),
            category: rem.category.clone().unwrap_or_else(|| "Bills".to_string()),
            ..Default::default()
        },
    )?;
    adjust_balance(&tx, account_id, -amount.abs())?;
    tx.execute(
        "UPDATE reminders SET is_paid=1, linked_transaction_id=?1 WHERE id=?2",
        params![transaction_id, reminder_id],
    )?;
    if let Some(next_due) = next_due_date(rem.due_date, &rem.frequency) {
        tx.execute(
            "INSERT INTO reminders(title, amount, due_date, frequency, category, notes)
             VALUES (?1,?2,?3,?4,?5,?6)",
            params![
                rem.title,
                amount.to_string(),
                next_due.to_string(),
                rem.frequency,
                rem.category,
                rem.notes,
            ],
        )?;
    }
    tx.commit()?;
    Ok(transaction_id)
}

pub fn toggle_paid(conn: &Connection, id: i64) -> Result<Reminder> {
    let rem = get_reminder(conn, id)?;
    conn.execute(
        "UPDATE reminders SET is_paid=?1 WHERE id=?2",
        params![!rem.is_paid, id],
    )?;
    get_reminder(conn, id)
}

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let title = sub.get_one::<String>("title").unwrap().trim();
            let due = parse_date(sub.get_one::<String>("due").unwrap().trim())?;
            let amount = sub
                .get_one::<String>("amount")
                .map(|s| parse_decimal(s.trim()))
                .transpose()?;
            let frequency = sub
                .get_one::<String>("frequency")
                .map(String::as_str)
                .unwrap_or("one-time");
            let category = sub.get_one::<String>("category").map(|s| s.trim().to_string());
            let notes = sub.get_one::<String>("notes").map(|s| s.trim().to_string());
            conn.execute(
                "INSERT INTO reminders(title, amount, due_date, frequency, category, notes)
                 VALUES (?1,?2,?3,?4,?5,?6)",
                params![
                    title,
                    amount.map(|a| a.to_string()),
                    due.to_string(),
                    frequency,
                    category,
                    notes,
                ],
            )?;
            println!("Added {} reminder '{}' due {}", frequency, title, due);
        }
        Some(("pay", sub)) => {
            let id: i64 = sub.get_one::<String>("id").unwrap().trim().parse()?;
            let account = sub.get_one::<String>("account").unwrap().trim();
            let account_id = id_for_account(conn, account)?;
            let paid_on = chrono::Utc::now().date_naive();
            let transaction_id = mark_paid(conn, id, account_id, paid_on)?;
            println!("Paid reminder {} (transaction {})", id, transaction_id);
        }
        Some(("toggle", sub)) => {
            let id: i64 = sub.get_one::<String>("id").unwrap().trim().parse()?;
            let rem = toggle_paid(conn, id)?;
            println!(
                "Reminder '{}' is now {}",
                rem.title,
                if rem.is_paid { "paid" } else { "unpaid" }
            );
        }
        Some(("rm", sub)) => {
            let id: i64 = sub.get_one::<String>("id").unwrap().trim().parse()?;
            let n = conn.execute("DELETE FROM reminders WHERE id=?1", params![id])?;
            if n == 0 {
                return Err(anyhow!("Reminder id {} not found", id));
            }
            println!("Removed reminder {}", id);
        }
        Some(("list", sub)) => {
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            let today = chrono::Utc::now().date_naive();
            let data = if sub.get_flag("overdue") {
                overdue_reminders(conn, today)?
            } else if let Some(days) = sub.get_one::<String>("upcoming") {
                upcoming_reminders(conn, today, days.trim().parse()?)?
            } else {
                list_reminders(conn)?
            };
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|r| {
                        vec![
                            r.id.to_string(),
                            r.title.clone(),
                            r.due_date.to_string(),
                            r.amount
                                .map(|a| format!("{:.2}", a))
                                .unwrap_or_else(|| "-".into()),
                            r.frequency.clone(),
                            if r.is_paid { "yes".into() } else { "no".into() },
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Title", "Due", "Amount", "Frequency", "Paid"], rows)
                );
            }
        }
        _ => {}
    }
    Ok(())
}
