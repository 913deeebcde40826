// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pocketbook::commands::accounts::create_account;
use pocketbook::commands::exporter::export_csv;
use pocketbook::commands::transactions::{create_transaction, NewTransaction, TxFilter};
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn export_round_trips_through_csv_text() {
    let mut conn = Connection::open_in_memory().unwrap();
    pocketbook::db::init_schema(&mut conn).unwrap();
    let acct = create_account(&conn, "Checking", "checking", dec("0"), "USD").unwrap();
    create_transaction(
        &mut conn,
        &NewTransaction {
            date: d("2025-01-05"),
            account_id: acct,
            amount: dec("-45.5"),
            payee: "Grocer, Inc".into(),
            category: "Food".into(),
            memo: Some("weekly run".into()),
            ..Default::default()
        },
    )
    .unwrap();
    create_transaction(
        &mut conn,
        &NewTransaction {
            date: d("2025-01-06"),
            account_id: acct,
            amount: dec("1000"),
            payee: "Employer".into(),
            category: "Salary".into(),
            ..Default::default()
        },
    )
    .unwrap();

    let mut buf = Vec::new();
    let count = export_csv(&conn, &TxFilter::default(), &mut buf).unwrap();
    assert_eq!(count, 2);

    let text = String::from_utf8(buf).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Date,Account,Payee,Category,Memo,Amount,Reconciled"
    );
    // Newest first; the comma-bearing payee gets quoted.
    assert_eq!(
        lines.next().unwrap(),
        "2025-01-06,Checking,Employer,Salary,,1000.00,no"
    );
    assert_eq!(
        lines.next().unwrap(),
        "2025-01-05,Checking,\"Grocer, Inc\",Food,weekly run,-45.50,no"
    );
}

#[test]
fn filters_scope_the_export() {
    let mut conn = Connection::open_in_memory().unwrap();
    pocketbook::db::init_schema(&mut conn).unwrap();
    let a = create_account(&conn, "A", "checking", dec("0"), "USD").unwrap();
    let b = create_account(&conn, "B", "savings", dec("0"), "USD").unwrap();
    for (acct, date) in [(a, "2025-01-01"), (b, "2025-01-02")] {
        create_transaction(
            &mut conn,
            &NewTransaction {
                date: d(date),
                account_id: acct,
                amount: dec("-1"),
                payee: "P".into(),
                category: "C".into(),
                ..Default::default()
            },
        )
        .unwrap();
    }

    let filter = TxFilter {
        account_ids: vec![b],
        ..Default::default()
    };
    let mut buf = Vec::new();
    assert_eq!(export_csv(&conn, &filter, &mut buf).unwrap(), 1);
}
