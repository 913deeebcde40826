// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pocketbook::commands::accounts::create_account;
use pocketbook::commands::recurring::{get_recurring, process_recurring, toggle_active};
use pocketbook::utils::account_balance;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn setup() -> (Connection, i64) {
    let mut conn = Connection::open_in_memory().unwrap();
    pocketbook::db::init_schema(&mut conn).unwrap();
    let acct = create_account(&conn, "Checking", "checking", dec("1000"), "USD").unwrap();
    (conn, acct)
}

fn schedule(
    conn: &Connection,
    acct: i64,
    frequency: &str,
    next_date: &str,
    end_date: Option<&str>,
    amount: &str,
) -> i64 {
    conn.execute(
        "INSERT INTO recurring_transactions(account_id, frequency, next_date, end_date, amount, payee, category, memo)
         VALUES (?1,?2,?3,?4,?5,'Landlord','Rent','Monthly rent')",
        params![acct, frequency, next_date, end_date, amount],
    )
    .unwrap();
    conn.last_insert_rowid()
}

#[test]
fn due_entry_materializes_once_and_advances() {
    let (mut conn, acct) = setup();
    let id = schedule(&conn, acct, "monthly", "2025-05-01", None, "-800");

    let created = process_recurring(&mut conn, d("2025-05-01")).unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].amount, dec("-800"));
    assert_eq!(created[0].date, d("2025-05-01"));
    assert_eq!(created[0].recurring_transaction_id, Some(id));
    assert_eq!(created[0].memo.as_deref(), Some("Monthly rent (Auto-generated)"));
    assert_eq!(account_balance(&conn, acct).unwrap(), dec("200"));

    let rec = get_recurring(&conn, id).unwrap();
    assert_eq!(rec.next_date, d("2025-06-01"));
    assert_eq!(rec.last_created_date, Some(d("2025-05-01")));
}

#[test]
fn same_day_rerun_is_a_no_op() {
    let (mut conn, acct) = setup();
    schedule(&conn, acct, "monthly", "2025-05-01", None, "-800");

    process_recurring(&mut conn, d("2025-05-01")).unwrap();
    let again = process_recurring(&mut conn, d("2025-05-01")).unwrap();
    assert!(again.is_empty());
    assert_eq!(account_balance(&conn, acct).unwrap(), dec("200"));
}

#[test]
fn missed_periods_do_not_catch_up() {
    let (mut conn, acct) = setup();
    let id = schedule(&conn, acct, "monthly", "2025-01-01", None, "-100");

    // Three months late: only one occurrence per pass.
    let created = process_recurring(&mut conn, d("2025-04-15")).unwrap();
    assert_eq!(created.len(), 1);
    let rec = get_recurring(&conn, id).unwrap();
    assert_eq!(rec.next_date, d("2025-02-01"));

    let created = process_recurring(&mut conn, d("2025-04-16")).unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(get_recurring(&conn, id).unwrap().next_date, d("2025-03-01"));
}

#[test]
fn expired_entries_deactivate_without_materializing() {
    let (mut conn, acct) = setup();
    let id = schedule(&conn, acct, "weekly", "2025-03-01", Some("2025-03-31"), "-50");

    let created = process_recurring(&mut conn, d("2025-04-10")).unwrap();
    assert!(created.is_empty());
    assert!(!get_recurring(&conn, id).unwrap().is_active);
    assert_eq!(account_balance(&conn, acct).unwrap(), dec("1000"));
}

#[test]
fn inactive_entries_are_skipped() {
    let (mut conn, acct) = setup();
    let id = schedule(&conn, acct, "monthly", "2025-05-01", None, "-800");
    toggle_active(&conn, id).unwrap();

    let created = process_recurring(&mut conn, d("2025-05-01")).unwrap();
    assert!(created.is_empty());

    toggle_active(&conn, id).unwrap();
    assert_eq!(process_recurring(&mut conn, d("2025-05-01")).unwrap().len(), 1);
}

#[test]
fn future_entries_wait_their_turn() {
    let (mut conn, acct) = setup();
    schedule(&conn, acct, "monthly", "2025-06-01", None, "-800");
    assert!(process_recurring(&mut conn, d("2025-05-31")).unwrap().is_empty());
}
