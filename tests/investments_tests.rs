// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pocketbook::commands::accounts::create_account;
use pocketbook::commands::investments::{
    buy_shares, get_holding, portfolio_summary, sell_shares, set_price,
};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn setup() -> (Connection, i64) {
    let mut conn = Connection::open_in_memory().unwrap();
    pocketbook::db::init_schema(&mut conn).unwrap();
    let acct = create_account(&conn, "Brokerage", "investment", dec("0"), "USD").unwrap();
    (conn, acct)
}

#[test]
fn buys_merge_into_one_lot() {
    let (conn, acct) = setup();
    buy_shares(&conn, acct, "VTI", dec("10"), dec("200")).unwrap();
    let h = buy_shares(&conn, acct, "VTI", dec("5"), dec("220")).unwrap();

    assert_eq!(h.shares, dec("15"));
    assert_eq!(h.cost_basis, dec("3100"));
    assert_eq!(h.current_price, Some(dec("220")));
}

#[test]
fn selling_keeps_the_average_cost() {
    let (conn, acct) = setup();
    buy_shares(&conn, acct, "VTI", dec("10"), dec("200")).unwrap();

    let h = sell_shares(&conn, acct, "VTI", dec("4")).unwrap().unwrap();
    assert_eq!(h.shares, dec("6"));
    assert_eq!(h.cost_basis, dec("1200"));
}

#[test]
fn overselling_is_rejected() {
    let (conn, acct) = setup();
    buy_shares(&conn, acct, "VTI", dec("10"), dec("200")).unwrap();
    assert!(sell_shares(&conn, acct, "VTI", dec("11")).is_err());
    assert_eq!(get_holding(&conn, acct, "VTI").unwrap().shares, dec("10"));
}

#[test]
fn selling_out_removes_the_position() {
    let (conn, acct) = setup();
    buy_shares(&conn, acct, "VTI", dec("10"), dec("200")).unwrap();
    assert!(sell_shares(&conn, acct, "VTI", dec("10")).unwrap().is_none());
    assert!(get_holding(&conn, acct, "VTI").is_err());
}

#[test]
fn summary_totals_value_and_gain() {
    let (conn, acct) = setup();
    buy_shares(&conn, acct, "VTI", dec("10"), dec("200")).unwrap();
    buy_shares(&conn, acct, "BND", dec("20"), dec("80")).unwrap();
    set_price(&conn, acct, "VTI", dec("250")).unwrap();

    let summary = portfolio_summary(&conn, Some(acct)).unwrap();
    assert_eq!(summary.holdings, 2);
    assert_eq!(summary.total_cost_basis, dec("3600"));
    assert_eq!(summary.total_value, dec("4100"));
    assert_eq!(summary.total_gain_loss, dec("500"));
}
