// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pocketbook::commands::accounts::create_account;
use pocketbook::commands::budgets::{budgets_with_spending, create_budget};
use pocketbook::commands::transactions::{create_transaction, NewTransaction};
use chrono::NaiveDate;
use rusqlite::Connection;
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
    let acct = create_account(&conn, "Checking", "checking", dec("5000"), "USD").unwrap();
    (conn, acct)
}

fn spend(conn: &mut Connection, acct: i64, date: &str, amount: &str, category: &str) {
    create_transaction(
        conn,
        &NewTransaction {
            date: d(date),
            account_id: acct,
            amount: dec(amount),
            payee: "Shop".into(),
            category: category.into(),
            ..Default::default()
        },
    )
    .unwrap();
}

#[test]
fn status_bands_at_eighty_and_one_hundred_percent() {
    let (mut conn, acct) = setup();
    let today = d("2025-06-20");
    create_budget(&conn, "Food", dec("100"), "monthly", d("2025-01-01"), false).unwrap();
    create_budget(&conn, "Fuel", dec("100"), "monthly", d("2025-01-01"), false).unwrap();
    create_budget(&conn, "Fun", dec("100"), "monthly", d("2025-01-01"), false).unwrap();

    spend(&mut conn, acct, "2025-06-05", "-50", "Food");
    spend(&mut conn, acct, "2025-06-05", "-85", "Fuel");
    spend(&mut conn, acct, "2025-06-05", "-105", "Fun");

    let statuses = budgets_with_spending(&conn, today).unwrap();
    let by_cat = |c: &str| statuses.iter().find(|s| s.budget.category == c).unwrap();

    assert_eq!(by_cat("Food").status, "good");
    assert_eq!(by_cat("Food").percentage, dec("50"));
    assert_eq!(by_cat("Food").remaining, dec("50"));

    assert_eq!(by_cat("Fuel").status, "warning");

    assert_eq!(by_cat("Fun").status, "over");
    // Displayed percentage caps at 100 even when overspent.
    assert_eq!(by_cat("Fun").percentage, dec("100"));
    assert_eq!(by_cat("Fun").remaining, dec("-5"));
}

#[test]
fn fuzzy_matching_pools_subcategories() {
    let (mut conn, acct) = setup();
    let today = d("2025-06-20");
    create_budget(&conn, "Food", dec("200"), "monthly", d("2025-01-01"), false).unwrap();

    spend(&mut conn, acct, "2025-06-03", "-40", "food");
    spend(&mut conn, acct, "2025-06-07", "-60", "Food: Restaurants");
    spend(&mut conn, acct, "2025-06-09", "-30", "Rent");

    let statuses = budgets_with_spending(&conn, today).unwrap();
    assert_eq!(statuses[0].spent, dec("100"));
}

#[test]
fn windows_exclude_other_periods_and_inflows() {
    let (mut conn, acct) = setup();
    create_budget(&conn, "Food", dec("100"), "monthly", d("2025-01-01"), false).unwrap();
    create_budget(&conn, "Travel", dec("1000"), "annual", d("2025-01-01"), false).unwrap();

    spend(&mut conn, acct, "2025-05-30", "-70", "Food"); // last month
    spend(&mut conn, acct, "2025-06-02", "-20", "Food");
    spend(&mut conn, acct, "2025-06-05", "15", "Food"); // refund, not spending
    spend(&mut conn, acct, "2025-02-10", "-400", "Travel");
    spend(&mut conn, acct, "2024-12-20", "-999", "Travel"); // last year

    let statuses = budgets_with_spending(&conn, d("2025-06-20")).unwrap();
    let by_cat = |c: &str| statuses.iter().find(|s| s.budget.category == c).unwrap();
    assert_eq!(by_cat("Food").spent, dec("20"));
    assert_eq!(by_cat("Travel").spent, dec("400"));
}

#[test]
fn future_dated_spending_in_the_current_period_counts() {
    let (mut conn, acct) = setup();
    create_budget(&conn, "Food", dec("100"), "monthly", d("2025-01-01"), false).unwrap();

    // Dated after "today" but still inside June.
    spend(&mut conn, acct, "2025-06-25", "-40", "Food");

    let statuses = budgets_with_spending(&conn, d("2025-06-10")).unwrap();
    assert_eq!(statuses[0].spent, dec("40"));
    assert_eq!(statuses[0].remaining, dec("60"));
}

#[test]
fn typed_outflows_count_toward_spending() {
    let (mut conn, acct) = setup();
    create_budget(&conn, "[Transfer]", dec("500"), "monthly", d("2025-01-01"), false).unwrap();

    create_transaction(
        &mut conn,
        &NewTransaction {
            date: d("2025-06-05"),
            account_id: acct,
            amount: dec("-120"),
            payee: "Transfer to Savings".into(),
            category: "[Transfer]".into(),
            transaction_type: Some("transfer".into()),
            ..Default::default()
        },
    )
    .unwrap();

    let statuses = budgets_with_spending(&conn, d("2025-06-20")).unwrap();
    assert_eq!(statuses[0].spent, dec("120"));
}

#[test]
fn duplicate_category_and_period_is_rejected() {
    let (conn, _) = setup();
    create_budget(&conn, "Food", dec("100"), "monthly", d("2025-01-01"), false).unwrap();
    assert!(create_budget(&conn, "Food", dec("150"), "monthly", d("2025-01-01"), false).is_err());
    // A different period for the same category is fine.
    create_budget(&conn, "Food", dec("1200"), "annual", d("2025-01-01"), false).unwrap();
}
