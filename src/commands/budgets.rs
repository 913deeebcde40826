// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Budget;
use crate::utils::{db_decimal, maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, NaiveDate};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct BudgetStatus {
    #[serde(flatten)]
    pub budget: Budget,
    pub spent: Decimal,
    pub remaining: Decimal,
    /// Percent of the budget consumed, capped at 100 for display.
    pub percentage: Decimal,
    pub status: &'static str,
}

/// Case-insensitive fuzzy match between a transaction category and a budget
/// category. "Food" budgets "Food: Restaurants" and vice versa.
pub fn category_matches(transaction_category: &str, budget_category: &str) -> bool {
    let t = transaction_category.to_lowercase();
    let b = budget_category.to_lowercase();
    t == b || t.contains(&b) || b.contains(&t)
}

/// The full budget window containing `today`: the whole calendar month for
/// monthly budgets, the whole calendar year for annual ones. Future-dated
/// rows inside the period count.
fn window(period: &str, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    let bounds = match period {
        "monthly" => {
            let start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1);
            let end = start
                .and_then(|s| s.checked_add_months(chrono::Months::new(1)))
                .and_then(|next| next.pred_opt());
            start.zip(end)
        }
        "annual" => NaiveDate::from_ymd_opt(today.year(), 1, 1)
            .zip(NaiveDate::from_ymd_opt(today.year(), 12, 31)),
        other => return Err(anyhow!("Unknown budget period '{}'", other)),
    };
    bounds.context("Invalid budget window")
}

/// Sum of outflows against a budget's category within its current window.
/// Outflows are negative amounts; the result is their absolute sum.
pub fn budget_spending(conn: &Connection, budget: &Budget, today: NaiveDate) -> Result<Decimal> {
    let (start, end) = window(&budget.period, today)?;
    let mut stmt = conn.prepare(
        "SELECT amount, category FROM transactions WHERE date>=?1 AND date<=?2",
    )?;
    let mut rows = stmt.query(params![start.to_string(), end.to_string()])?;
    let mut spent = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        let amount = db_decimal(&r.get::<_, String>(0)?, "amount")?;
        let category: String = r.get(1)?;
        if amount < Decimal::ZERO && category_matches(&category, &budget.category) {
            spent += amount.abs();
        }
    }
    Ok(spent)
}

pub fn get_budget(conn: &Connection, id: i64) -> Result<Budget> {
    let (mut b, amount_s) = conn
        .query_row(
            "SELECT id, category, amount, period, start_date, rollover FROM budgets WHERE id=?1",
            params![id],
            row_to_budget,
        )
        .with_context(|| format!("Budget id {} not found", id))?;
    b.amount = db_decimal(&amount_s, "amount")?;
    Ok(b)
}

fn row_to_budget(r: &rusqlite::Row<'_>) -> rusqlite::Result<(Budget, String)> {
    Ok((
        Budget {
            id: r.get(0)?,
            category: r.get(1)?,
            amount: Decimal::ZERO,
            period: r.get(3)?,
            start_date: r.get(4)?,
            rollover: r.get(5)?,
        },
        r.get::<_, String>(2)?,
    ))
}

pub fn list_budgets(conn: &Connection) -> Result<Vec<Budget>> {
    let mut stmt = conn.prepare(
        "SELECT id, category, amount, period, start_date, rollover FROM budgets ORDER BY category",
    )?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let (mut b, amount_s) = row_to_budget(r)?;
        b.amount = db_decimal(&amount_s, "amount")?;
        out.push(b);
    }
    Ok(out)
}

/// Every budget joined with its current-window spending and a status band.
/// Warning starts at 80 percent, over at 100. The displayed percentage is
/// capped at 100 but the band is computed from the uncapped ratio.
pub fn budgets_with_spending(conn: &Connection, today: NaiveDate) -> Result<Vec<BudgetStatus>> {
    let hundred = Decimal::ONE_HUNDRED;
    let warning_at = Decimal::new(80, 0);
    let mut out = Vec::new();
    for budget in list_budgets(conn)? {
        let spent = budget_spending(conn, &budget, today)?;
        let remaining = budget.amount - spent;
        let raw_pct = if budget.amount.is_zero() {
            hundred
        } else {
            (spent / budget.amount * hundred).round_dp(1)
        };
        let status = if raw_pct >= hundred {
            "over"
        } else if raw_pct >= warning_at {
            "warning"
        } else {
            "good"
        };
        out.push(BudgetStatus {
            budget,
            spent,
            remaining,
            percentage: raw_pct.min(hundred),
            status,
        });
    }
    Ok(out)
}

pub fn create_budget(
    conn: &Connection,
    category: &str,
    amount: Decimal,
    period: &str,
    start_date: NaiveDate,
    rollover: bool,
) -> Result<i64> {
    if amount <= Decimal::ZERO {
        return Err(anyhow!("Budget amount must be positive"));
    }
    conn.execute(
        "INSERT INTO budgets(category, amount, period, start_date, rollover)
         VALUES (?1,?2,?3,?4,?5)",
        params![
            category,
            amount.to_string(),
            period,
            start_date.to_string(),
            rollover,
        ],
    )
    .with_context(|| format!("A {} budget for '{}' already exists", period, category))?;
    Ok(conn.last_insert_rowid())
}

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let category = sub.get_one::<String>("category").unwrap().trim();
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?;
            let period = sub.get_one::<String>("period").unwrap().trim();
            let start_date = match sub.get_one::<String>("start-date") {
                Some(s) => parse_date(s.trim())?,
                None => chrono::Utc::now().date_naive(),
            };
            let rollover = sub.get_flag("rollover");
            let id = create_budget(conn, category, amount, period, start_date, rollover)?;
            println!("Created {} budget {} for '{}': {}", period, id, category, amount);
        }
        Some(("edit", sub)) => {
            let id: i64 = sub.get_one::<String>("id").unwrap().trim().parse()?;
            let b = get_budget(conn, id)?;
            let amount = match sub.get_one::<String>("amount") {
                Some(s) => parse_decimal(s.trim())?,
                None => b.amount,
            };
            if amount <= Decimal::ZERO {
                return Err(anyhow!("Budget amount must be positive"));
            }
            conn.execute(
                "UPDATE budgets SET amount=?1 WHERE id=?2",
                params![amount.to_string(), id],
            )?;
            println!("Updated budget {} to {}", id, amount);
        }
        Some(("rm", sub)) => {
            let id: i64 = sub.get_one::<String>("id").unwrap().trim().parse()?;
            let n = conn.execute("DELETE FROM budgets WHERE id=?1", params![id])?;
            if n == 0 {
                return Err(anyhow!("Budget id {} not found", id));
            }
            println!("Removed budget {}", id);
        }
        Some(("status", sub)) => {
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            let today = chrono::Utc::now().date_naive();
            let data = budgets_with_spending(conn, today)?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|s| {
                        vec![
                            s.budget.id.to_string(),
                            s.budget.category.clone(),
                            s.budget.period.clone(),
                            format!("{:.2}", s.budget.amount),
                            format!("{:.2}", s.spent),
                            format!("{:.2}", s.remaining),
                            format!("{}%", s.percentage),
                            s.status.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Category", "Period", "Budget", "Spent", "Remaining", "Used", "Status"],
                        rows
                    )
                );
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuzzy_match_is_case_insensitive_and_bidirectional() {
        assert!(category_matches("Food", "food"));
        assert!(category_matches("Food: Restaurants", "Food"));
        assert!(category_matches("Food", "Food: Restaurants"));
        assert!(!category_matches("Rent", "Food"));
    }

    #[test]
    fn window_covers_whole_period() {
        let d = |y, m, dd| NaiveDate::from_ymd_opt(y, m, dd).unwrap();
        assert_eq!(
            window("monthly", d(2025, 6, 17)).unwrap(),
            (d(2025, 6, 1), d(2025, 6, 30))
        );
        assert_eq!(
            window("monthly", d(2024, 2, 3)).unwrap(),
            (d(2024, 2, 1), d(2024, 2, 29))
        );
        assert_eq!(
            window("monthly", d(2025, 12, 31)).unwrap(),
            (d(2025, 12, 1), d(2025, 12, 31))
        );
        assert_eq!(
            window("annual", d(2025, 6, 17)).unwrap(),
            (d(2025, 1, 1), d(2025, 12, 31))
        );
        assert!(window("weekly", d(2025, 6, 17)).is_err());
    }
}
