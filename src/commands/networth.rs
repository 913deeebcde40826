// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::NetWorthSnapshot;
use crate::utils::{db_decimal, maybe_print_json, pretty_table};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct NetWorthSummary {
    pub total_assets: Decimal,
    pub total_liabilities: Decimal,
    pub net_worth: Decimal,
}

/// Net worth over active accounts. Credit account balances count as
/// liabilities at their absolute value; every other account type counts as an
/// asset, negative balances included.
pub fn current_net_worth(conn: &Connection) -> Result<NetWorthSummary> {
    let mut stmt =
        conn.prepare("SELECT type, balance FROM accounts WHERE is_active=1")?;
    let mut rows = stmt.query([])?;
    let mut assets = Decimal::ZERO;
    let mut liabilities = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        let kind: String = r.get(0)?;
        let balance = db_decimal(&r.get::<_, String>(1)?, "balance")?;
        if kind == "credit" {
            liabilities += balance.abs();
        } else {
            assets += balance;
        }
    }
    Ok(NetWorthSummary {
        total_assets: assets,
        total_liabilities: liabilities,
        net_worth: assets - liabilities,
    })
}

/// Record today's net worth. One snapshot per date: re-running on the same
/// day overwrites the earlier figure.
pub fn take_snapshot(conn: &Connection, date: NaiveDate) -> Result<NetWorthSnapshot> {
    let summary = current_net_worth(conn)?;
    conn.execute(
        "INSERT INTO net_worth_snapshots(snapshot_date, total_assets, total_liabilities, net_worth)
         VALUES (?1,?2,?3,?4)
         ON CONFLICT(snapshot_date) DO UPDATE SET
             total_assets=excluded.total_assets,
             total_liabilities=excluded.total_liabilities,
             net_worth=excluded.net_worth",
        params![
            date.to_string(),
            summary.total_assets.to_string(),
            summary.total_liabilities.to_string(),
            summary.net_worth.to_string(),
        ],
    )?;
    conn.query_row(
        "SELECT id, snapshot_date, total_assets, total_liabilities, net_worth
         FROM net_worth_snapshots WHERE snapshot_date=?1",
        params![date.to_string()],
        row_to_snapshot,
    )
    .map_err(Into::into)
    .and_then(finish_snapshot)
}

fn row_to_snapshot(
    r: &rusqlite::Row<'_>,
) -> rusqlite::Result<(NetWorthSnapshot, String, String, String)> {
    Ok((
        NetWorthSnapshot {
            id: r.get(0)?,
            snapshot_date: r.get(1)?,
            total_assets: Decimal::ZERO,
            total_liabilities: Decimal::ZERO,
            net_worth: Decimal::ZERO,
        },
        r.get::<_, String>(2)?,
        r.get::<_, String>(3)?,
        r.get::<_, String>(4)?,
    ))
}

fn finish_snapshot(
    (mut snap, assets_s, liabilities_s, net_s): (NetWorthSnapshot, String, String, String),
) -> Result<NetWorthSnapshot> {
    snap.total_assets = db_decimal(&assets_s, "total_assets")?;
    snap.total_liabilities = db_decimal(&liabilities_s, "total_liabilities")?;
    snap.net_worth = db_decimal(&net_s, "net_worth")?;
    Ok(snap)
}

pub fn list_snapshots(conn: &Connection) -> Result<Vec<NetWorthSnapshot>> {
    let mut stmt = conn.prepare(
        "SELECT id, snapshot_date, total_assets, total_liabilities, net_worth
         FROM net_worth_snapshots ORDER BY snapshot_date",
    )?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        out.push(finish_snapshot(row_to_snapshot(r)?)?);
    }
    Ok(out)
}

#[derive(Debug, Serialize)]
pub struct NetWorthChange {
    pub from: NetWorthSnapshot,
    pub to: NetWorthSnapshot,
    pub amount: Decimal,
    /// Zero when the starting net worth is zero.
    pub percent: Decimal,
}

/// Change between the oldest snapshot on/after `since` and the latest one.
pub fn net_worth_change(conn: &Connection, since: NaiveDate) -> Result<Option<NetWorthChange>> {
    let snapshots = list_snapshots(conn)?;
    let from = snapshots
        .iter()
        .find(|s| s.snapshot_date >= since)
        .cloned();
    let to = snapshots.last().cloned();
    let (from, to) = match (from, to) {
        (Some(f), Some(t)) if f.snapshot_date < t.snapshot_date => (f, t),
        _ => return Ok(None),
    };
    let amount = to.net_worth - from.net_worth;
    let percent = if from.net_worth.is_zero() {
        Decimal::ZERO
    } else {
        (amount / from.net_worth.abs() * Decimal::ONE_HUNDRED).round_dp(2)
    };
    Ok(Some(NetWorthChange { from, to, amount, percent }))
}

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => {
            let json_flag = sub.get_flag("json");
            let summary = current_net_worth(conn)?;
            if !maybe_print_json(json_flag, false, &summary)? {
                println!("Assets:      {:.2}", summary.total_assets);
                println!("Liabilities: {:.2}", summary.total_liabilities);
                println!("Net worth:   {:.2}", summary.net_worth);
            }
        }
        Some(("snapshot", _)) => {
            let snap = take_snapshot(conn, chrono::Utc::now().date_naive())?;
            println!(
                "Snapshot {} on {}: net worth {:.2}",
                snap.id, snap.snapshot_date, snap.net_worth
            );
        }
        Some(("history", sub)) => {
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            let data = list_snapshots(conn)?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|s| {
                        vec![
                            s.snapshot_date.to_string(),
                            format!("{:.2}", s.total_assets),
                            format!("{:.2}", s.total_liabilities),
                            format!("{:.2}", s.net_worth),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Date", "Assets", "Liabilities", "Net worth"], rows)
                );
            }
        }
        Some(("change", sub)) => {
            let since = crate::utils::parse_date(
                sub.get_one::<String>("since")
                    .context("--since is required")?
                    .trim(),
            )?;
            match net_worth_change(conn, since)? {
                Some(change) => {
                    println!(
                        "{} -> {}: {:+.2} ({:+.2}%)",
                        change.from.snapshot_date,
                        change.to.snapshot_date,
                        change.amount,
                        change.percent
                    );
                }
                None => println!("Not enough snapshots to compute a change"),
            }
        }
        _ => {}
    }
    Ok(())
}
