// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pocketbook::commands::accounts::create_account;
use pocketbook::commands::goals::{add_to_goal, create_goal, get_goal, sync_goal};
use pocketbook::commands::networth::{
    current_net_worth, list_snapshots, net_worth_change, take_snapshot,
};
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    pocketbook::db::init_schema(&mut conn).unwrap();
    conn
}

#[test]
fn completion_flips_on_and_stays_on() {
    let conn = setup();
    let id = create_goal(&conn, "Vacation", dec("1000"), None, None, "#fff").unwrap();

    let goal = add_to_goal(&conn, id, dec("600")).unwrap();
    assert!(!goal.is_completed);

    let goal = add_to_goal(&conn, id, dec("400")).unwrap();
    assert!(goal.is_completed);

    // Withdrawing after completion does not un-complete the goal.
    let goal = add_to_goal(&conn, id, dec("-500")).unwrap();
    assert_eq!(goal.current_amount, dec("500"));
    assert!(goal.is_completed);
}

#[test]
fn sync_takes_the_linked_account_balance() {
    let conn = setup();
    let acct = create_account(&conn, "Savings", "savings", dec("750"), "USD").unwrap();
    let id = create_goal(&conn, "Emergency", dec("1000"), None, Some(acct), "#fff").unwrap();

    let goal = sync_goal(&conn, id).unwrap();
    assert_eq!(goal.current_amount, dec("750"));

    let unlinked = create_goal(&conn, "Car", dec("5000"), None, None, "#fff").unwrap();
    assert!(sync_goal(&conn, unlinked).is_err());
    assert_eq!(get_goal(&conn, unlinked).unwrap().current_amount, dec("0"));
}

#[test]
fn credit_balances_count_as_liabilities() {
    let conn = setup();
    create_account(&conn, "Checking", "checking", dec("2000"), "USD").unwrap();
    create_account(&conn, "Brokerage", "investment", dec("5000"), "USD").unwrap();
    create_account(&conn, "Card", "credit", dec("-400"), "USD").unwrap();

    let summary = current_net_worth(&conn).unwrap();
    assert_eq!(summary.total_assets, dec("7000"));
    assert_eq!(summary.total_liabilities, dec("400"));
    assert_eq!(summary.net_worth, dec("6600"));
}

#[test]
fn inactive_accounts_are_excluded() {
    let conn = setup();
    create_account(&conn, "Checking", "checking", dec("2000"), "USD").unwrap();
    let old = create_account(&conn, "Old", "checking", dec("999"), "USD").unwrap();
    conn.execute("UPDATE accounts SET is_active=0 WHERE id=?1", rusqlite::params![old]).unwrap();

    assert_eq!(current_net_worth(&conn).unwrap().net_worth, dec("2000"));
}

#[test]
fn snapshots_upsert_per_date_and_report_change() {
    let conn = setup();
    let acct = create_account(&conn, "Checking", "checking", dec("1000"), "USD").unwrap();

    take_snapshot(&conn, d("2025-01-01")).unwrap();
    conn.execute("UPDATE accounts SET balance='1500' WHERE id=?1", rusqlite::params![acct]).unwrap();
    take_snapshot(&conn, d("2025-02-01")).unwrap();

    // Same-day retake overwrites instead of duplicating.
    conn.execute("UPDATE accounts SET balance='1600' WHERE id=?1", rusqlite::params![acct]).unwrap();
    take_snapshot(&conn, d("2025-02-01")).unwrap();
    assert_eq!(list_snapshots(&conn).unwrap().len(), 2);

    let change = net_worth_change(&conn, d("2025-01-01")).unwrap().unwrap();
    assert_eq!(change.amount, dec("600"));
    assert_eq!(change.percent, dec("60.00"));
}

#[test]
fn change_from_a_zero_baseline_reports_zero_percent() {
    let conn = setup();
    let acct = create_account(&conn, "Checking", "checking", dec("0"), "USD").unwrap();

    take_snapshot(&conn, d("2025-01-01")).unwrap();
    conn.execute("UPDATE accounts SET balance='250' WHERE id=?1", rusqlite::params![acct]).unwrap();
    take_snapshot(&conn, d("2025-02-01")).unwrap();

    let change = net_worth_change(&conn, d("2025-01-01")).unwrap().unwrap();
    assert_eq!(change.amount, dec("250"));
    assert_eq!(change.percent, dec("0"));
}

#[test]
fn change_needs_two_distinct_snapshots() {
    let conn = setup();
    create_account(&conn, "Checking", "checking", dec("1000"), "USD").unwrap();
    take_snapshot(&conn, d("2025-01-01")).unwrap();
    assert!(net_worth_change(&conn, d("2025-01-01")).unwrap().is_none());
}
