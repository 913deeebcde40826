// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pocketbook::commands::accounts::create_account;
use pocketbook::commands::transactions::{
    create_transaction, create_transactions_bulk, delete_transaction, get_transaction,
    list_transactions, recomputed_balance, toggle_reconciled, update_transaction, NewTransaction,
    TransactionPatch, TxFilter,
};
use pocketbook::utils::account_balance;
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    pocketbook::db::init_schema(&mut conn).unwrap();
    conn
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn new_tx(account_id: i64, date: &str, amount: &str, payee: &str) -> NewTransaction {
    NewTransaction {
        date: d(date),
        account_id,
        amount: dec(amount),
        payee: payee.to_string(),
        category: "Misc".to_string(),
        ..Default::default()
    }
}

#[test]
fn balance_tracks_create_and_delete() {
    let mut conn = setup();
    let acct = create_account(&conn, "Checking", "checking", dec("500"), "USD").unwrap();

    let groceries = create_transaction(&mut conn, &new_tx(acct, "2025-01-05", "-60", "Grocer")).unwrap();
    assert_eq!(account_balance(&conn, acct).unwrap(), dec("440"));

    create_transaction(&mut conn, &new_tx(acct, "2025-01-06", "2000", "Employer")).unwrap();
    assert_eq!(account_balance(&conn, acct).unwrap(), dec("2440"));

    delete_transaction(&mut conn, groceries.id).unwrap();
    assert_eq!(account_balance(&conn, acct).unwrap(), dec("2500"));
    assert_eq!(recomputed_balance(&conn, acct).unwrap(), dec("2500"));
}

#[test]
fn update_reverses_old_amount_before_applying_new() {
    let mut conn = setup();
    let acct = create_account(&conn, "Checking", "checking", dec("100"), "USD").unwrap();
    let t = create_transaction(&mut conn, &new_tx(acct, "2025-02-01", "-25", "Cafe")).unwrap();
    assert_eq!(account_balance(&conn, acct).unwrap(), dec("75"));

    let patch = TransactionPatch {
        amount: Some(dec("-40")),
        ..Default::default()
    };
    update_transaction(&mut conn, t.id, &patch).unwrap();
    assert_eq!(account_balance(&conn, acct).unwrap(), dec("60"));
    assert_eq!(recomputed_balance(&conn, acct).unwrap(), dec("60"));
}

#[test]
fn moving_a_transaction_rebalances_both_accounts() {
    let mut conn = setup();
    let a = create_account(&conn, "A", "checking", dec("100"), "USD").unwrap();
    let b = create_account(&conn, "B", "savings", dec("100"), "USD").unwrap();
    let t = create_transaction(&mut conn, &new_tx(a, "2025-02-01", "-30", "Shop")).unwrap();

    let patch = TransactionPatch {
        account_id: Some(b),
        ..Default::default()
    };
    update_transaction(&mut conn, t.id, &patch).unwrap();
    assert_eq!(account_balance(&conn, a).unwrap(), dec("100"));
    assert_eq!(account_balance(&conn, b).unwrap(), dec("70"));
}

#[test]
fn bulk_insert_applies_one_delta_per_account() {
    let mut conn = setup();
    let a = create_account(&conn, "A", "checking", dec("0"), "USD").unwrap();
    let b = create_account(&conn, "B", "savings", dec("50"), "USD").unwrap();

    let rows = vec![
        new_tx(a, "2025-03-01", "-10", "X"),
        new_tx(a, "2025-03-02", "-15", "Y"),
        new_tx(b, "2025-03-03", "100", "Z"),
    ];
    let ids = create_transactions_bulk(&mut conn, &rows).unwrap();
    assert_eq!(ids.len(), 3);
    assert_eq!(account_balance(&conn, a).unwrap(), dec("-25"));
    assert_eq!(account_balance(&conn, b).unwrap(), dec("150"));
}

#[test]
fn toggle_flips_only_the_reconciled_flag() {
    let mut conn = setup();
    let acct = create_account(&conn, "A", "checking", dec("0"), "USD").unwrap();
    let t = create_transaction(&mut conn, &new_tx(acct, "2025-03-01", "-10", "X")).unwrap();
    assert!(!t.reconciled);

    let t = toggle_reconciled(&mut conn, t.id).unwrap();
    assert!(t.reconciled);
    let t = toggle_reconciled(&mut conn, t.id).unwrap();
    assert!(!t.reconciled);
    assert_eq!(account_balance(&conn, acct).unwrap(), dec("-10"));
}

#[test]
fn filters_narrow_the_listing() {
    let mut conn = setup();
    let acct = create_account(&conn, "A", "checking", dec("0"), "USD").unwrap();
    create_transaction(&mut conn, &new_tx(acct, "2025-01-01", "-10", "Grocer")).unwrap();
    create_transaction(&mut conn, &new_tx(acct, "2025-02-01", "-20", "Cafe")).unwrap();
    create_transaction(&mut conn, &new_tx(acct, "2025-03-01", "500", "Employer")).unwrap();

    let by_date = TxFilter {
        date_from: Some(d("2025-01-15")),
        date_to: Some(d("2025-02-15")),
        ..Default::default()
    };
    let rows = list_transactions(&conn, &by_date).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].payee, "Cafe");

    let by_search = TxFilter {
        search: Some("emplo".to_string()),
        ..Default::default()
    };
    assert_eq!(list_transactions(&conn, &by_search).unwrap().len(), 1);

    let by_amount = TxFilter {
        min_amount: Some(dec("-15")),
        max_amount: Some(dec("0")),
        ..Default::default()
    };
    assert_eq!(list_transactions(&conn, &by_amount).unwrap().len(), 1);
}

#[test]
fn missing_transaction_is_an_error() {
    let conn = setup();
    assert!(get_transaction(&conn, 999).is_err());
}
