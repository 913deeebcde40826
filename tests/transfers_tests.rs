// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pocketbook::commands::accounts::create_account;
use pocketbook::commands::transactions::get_transaction;
use pocketbook::commands::transfers::{create_transfer, delete_transfer, TRANSFER_CATEGORY};
use pocketbook::utils::account_balance;
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> (Connection, i64, i64) {
    let mut conn = Connection::open_in_memory().unwrap();
    pocketbook::db::init_schema(&mut conn).unwrap();
    let checking = create_account(&conn, "Checking", "checking", dec("1000"), "USD").unwrap();
    let savings = create_account(&conn, "Savings", "savings", dec("200"), "USD").unwrap();
    (conn, checking, savings)
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()
}

#[test]
fn transfer_creates_a_symmetric_linked_pair() {
    let (mut conn, checking, savings) = setup();
    let pair = create_transfer(&mut conn, checking, savings, dec("300"), day(), None).unwrap();

    assert_eq!(pair.withdrawal.amount, dec("-300"));
    assert_eq!(pair.deposit.amount, dec("300"));
    assert_eq!(pair.withdrawal.linked_transaction_id, Some(pair.deposit.id));
    assert_eq!(pair.deposit.linked_transaction_id, Some(pair.withdrawal.id));
    assert_eq!(pair.withdrawal.payee, "Transfer to Savings");
    assert_eq!(pair.deposit.payee, "Transfer from Checking");
    assert_eq!(pair.withdrawal.category, TRANSFER_CATEGORY);

    assert_eq!(account_balance(&conn, checking).unwrap(), dec("700"));
    assert_eq!(account_balance(&conn, savings).unwrap(), dec("500"));
}

#[test]
fn overdraft_is_allowed() {
    let (mut conn, checking, savings) = setup();
    create_transfer(&mut conn, checking, savings, dec("1500"), day(), None).unwrap();
    assert_eq!(account_balance(&conn, checking).unwrap(), dec("-500"));
}

#[test]
fn same_account_and_non_positive_amounts_are_rejected() {
    let (mut conn, checking, savings) = setup();
    assert!(create_transfer(&mut conn, checking, checking, dec("10"), day(), None).is_err());
    assert!(create_transfer(&mut conn, checking, savings, dec("0"), day(), None).is_err());
    assert!(create_transfer(&mut conn, checking, savings, dec("-5"), day(), None).is_err());
    assert_eq!(account_balance(&conn, checking).unwrap(), dec("1000"));
}

#[test]
fn deleting_either_side_removes_both_and_restores_balances() {
    let (mut conn, checking, savings) = setup();
    let pair = create_transfer(&mut conn, checking, savings, dec("300"), day(), None).unwrap();

    delete_transfer(&mut conn, pair.deposit.id).unwrap();
    assert!(get_transaction(&conn, pair.withdrawal.id).is_err());
    assert!(get_transaction(&conn, pair.deposit.id).is_err());
    assert_eq!(account_balance(&conn, checking).unwrap(), dec("1000"));
    assert_eq!(account_balance(&conn, savings).unwrap(), dec("200"));
}

#[test]
fn delete_refuses_a_plain_transaction() {
    let (mut conn, checking, _) = setup();
    let t = pocketbook::commands::transactions::create_transaction(
        &mut conn,
        &pocketbook::commands::transactions::NewTransaction {
            date: day(),
            account_id: checking,
            amount: dec("-10"),
            payee: "Shop".into(),
            category: "Misc".into(),
            ..Default::default()
        },
    )
    .unwrap();
    assert!(delete_transfer(&mut conn, t.id).is_err());
}
