// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::SavingsGoal;
use crate::utils::{
    account_balance, db_decimal, id_for_account, maybe_print_json, parse_date, parse_decimal,
    pretty_table,
};
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;

const GOAL_COLUMNS: &str = "id, name, target_amount, current_amount, target_date, \
                            linked_account_id, color, is_completed";

fn row_to_goal(r: &rusqlite::Row<'_>) -> rusqlite::Result<(SavingsGoal, String, String)> {
    Ok((
        SavingsGoal {
            id: r.get(0)?,
            name: r.get(1)?,
            target_amount: Decimal::ZERO,
            current_amount: Decimal::ZERO,
            target_date: r.get(4)?,
            linked_account_id: r.get(5)?,
            color: r.get(6)?,
            is_completed: r.get(7)?,
        },
        r.get::<_, String>(2)?,
        r.get::<_, String>(3)?,
    ))
}

fn finish_goal((mut g, target_s, current_s): (SavingsGoal, String, String)) -> Result<SavingsGoal> {
    g.target_amount = db_decimal(&target_s, "target_amount")?;
    g.current_amount = db_decimal(&current_s, "current_amount")?;
    Ok(g)
}

pub fn get_goal(conn: &Connection, id: i64) -> Result<SavingsGoal> {
    let sql = format!("SELECT {} FROM savings_goals WHERE id=?1", GOAL_COLUMNS);
    let raw = conn
        .query_row(&sql, params![id], row_to_goal)
        .with_context(|| format!("Savings goal id {} not found", id))?;
    finish_goal(raw)
}

pub fn list_goals(conn: &Connection) -> Result<Vec<SavingsGoal>> {
    let sql = format!("SELECT {} FROM savings_goals ORDER BY name", GOAL_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        out.push(finish_goal(row_to_goal(r)?)?);
    }
    Ok(out)
}

pub fn create_goal(
    conn: &Connection,
    name: &str,
    target_amount: Decimal,
    target_date: Option<NaiveDate>,
    linked_account_id: Option<i64>,
    color: &str,
) -> Result<i64> {
    if target_amount <= Decimal::ZERO {
        return Err(anyhow!("Target amount must be positive"));
    }
    conn.execute(
        "INSERT INTO savings_goals(name, target_amount, current_amount, target_date,
                                   linked_account_id, color)
         VALUES (?1,?2,'0',?3,?4,?5)",
        params![
            name,
            target_amount.to_string(),
            target_date.map(|d| d.to_string()),
            linked_account_id,
            color,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn store_progress(conn: &Connection, goal: &SavingsGoal, new_current: Decimal) -> Result<SavingsGoal> {
    // The completion flag flips on once the target is reached and stays on
    // even if the amount later dips below the target.
    let completed = goal.is_completed || new_current >= goal.target_amount;
    conn.execute(
        "UPDATE savings_goals SET current_amount=?1, is_completed=?2 WHERE id=?3",
        params![new_current.to_string(), completed, goal.id],
    )?;
    get_goal(conn, goal.id)
}

pub fn add_to_goal(conn: &Connection, id: i64, amount: Decimal) -> Result<SavingsGoal> {
    let goal = get_goal(conn, id)?;
    store_progress(conn, &goal, goal.current_amount + amount)
}

/// Reset a linked goal's progress to the linked account's live balance.
pub fn sync_goal(conn: &Connection, id: i64) -> Result<SavingsGoal> {
    let goal = get_goal(conn, id)?;
    let account_id = goal
        .linked_account_id
        .ok_or_else(|| anyhow!("Goal '{}' has no linked account", goal.name))?;
    let balance = account_balance(conn, account_id)?;
    store_progress(conn, &goal, balance)
}

#[derive(Debug, Serialize)]
pub struct GoalProgress {
    #[serde(flatten)]
    pub goal: SavingsGoal,
    /// Percent complete, capped at 100.
    pub percentage: Decimal,
    pub remaining: Decimal,
    pub days_remaining: Option<i64>,
    /// Monthly contribution needed to hit the target date. The whole
    /// remainder when the date is this month or already past.
    pub monthly_savings_needed: Option<Decimal>,
}

pub fn goal_progress(goal: SavingsGoal, today: NaiveDate) -> GoalProgress {
    let remaining = (goal.target_amount - goal.current_amount).max(Decimal::ZERO);
    let percentage = if goal.target_amount.is_zero() {
        Decimal::ONE_HUNDRED
    } else {
        (goal.current_amount / goal.target_amount * Decimal::ONE_HUNDRED)
            .round_dp(1)
            .min(Decimal::ONE_HUNDRED)
    };
    let days_remaining = goal
        .target_date
        .map(|d| (d - today).num_days());
    let monthly_savings_needed = goal.target_date.map(|d| {
        let months = crate::utils::months_between(today, d);
        if months <= 0 {
            remaining
        } else {
            (remaining / Decimal::from(months)).round_dp(2)
        }
    });
    GoalProgress {
        goal,
        percentage,
        remaining,
        days_remaining,
        monthly_savings_needed,
    }
}

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let target = parse_decimal(sub.get_one::<String>("target").unwrap().trim())?;
            let target_date = sub
                .get_one::<String>("target-date")
                .map(|s| parse_date(s.trim()))
                .transpose()?;
            let linked = sub
                .get_one::<String>("account")
                .map(|s| id_for_account(conn, s.trim()))
                .transpose()?;
            let color = sub
                .get_one::<String>("color")
                .map(String::as_str)
                .unwrap_or("#3b82f6");
            let id = create_goal(conn, name, target, target_date, linked, color)?;
            println!("Created goal {} '{}' targeting {}", id, name, target);
        }
        Some(("contribute", sub)) => {
            let id: i64 = sub.get_one::<String>("id").unwrap().trim().parse()?;
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?;
            let goal = add_to_goal(conn, id, amount)?;
            println!(
                "Goal '{}': {:.2} of {:.2}{}",
                goal.name,
                goal.current_amount,
                goal.target_amount,
                if goal.is_completed { " (completed)" } else { "" }
            );
        }
        Some(("sync", sub)) => {
            let id: i64 = sub.get_one::<String>("id").unwrap().trim().parse()?;
            let goal = sync_goal(conn, id)?;
            println!(
                "Synced goal '{}' to linked balance: {:.2}",
                goal.name, goal.current_amount
            );
        }
        Some(("rm", sub)) => {
            let id: i64 = sub.get_one::<String>("id").unwrap().trim().parse()?;
            let n = conn.execute("DELETE FROM savings_goals WHERE id=?1", params![id])?;
            if n == 0 {
                return Err(anyhow!("Savings goal id {} not found", id));
            }
            println!("Removed goal {}", id);
        }
        Some(("list", sub)) => {
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            let today = chrono::Utc::now().date_naive();
            let data: Vec<GoalProgress> = list_goals(conn)?
                .into_iter()
                .map(|g| goal_progress(g, today))
                .collect();
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|p| {
                        vec![
                            p.goal.id.to_string(),
                            p.goal.name.clone(),
                            format!("{:.2}", p.goal.current_amount),
                            format!("{:.2}", p.goal.target_amount),
                            format!("{}%", p.percentage),
                            p.monthly_savings_needed
                                .map(|m| format!("{:.2}/mo", m))
                                .unwrap_or_else(|| "-".into()),
                            if p.goal.is_completed { "yes".into() } else { "no".into() },
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Name", "Saved", "Target", "Progress", "Needed", "Done"],
                        rows
                    )
                );
            }
        }
        _ => {}
    }
    Ok(())
}
