// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::InvestmentHolding;
use crate::utils::{db_decimal, id_for_account, maybe_print_json, parse_decimal, pretty_table};
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::Serialize;

const HOLDING_COLUMNS: &str =
    "id, account_id, symbol, name, shares, cost_basis, current_price, asset_type";

fn row_to_holding(
    r: &rusqlite::Row<'_>,
) -> rusqlite::Result<(InvestmentHolding, String, String, Option<String>)> {
    Ok((
        InvestmentHolding {
            id: r.get(0)?,
            account_id: r.get(1)?,
            symbol: r.get(2)?,
            name: r.get(3)?,
            shares: Decimal::ZERO,
            cost_basis: Decimal::ZERO,
            current_price: None,
            asset_type: r.get(7)?,
        },
        r.get::<_, String>(4)?,
        r.get::<_, String>(5)?,
        r.get::<_, Option<String>>(6)?,
    ))
}

fn finish_holding(
    (mut h, shares_s, basis_s, price_s): (InvestmentHolding, String, String, Option<String>),
) -> Result<InvestmentHolding> {
    h.shares = db_decimal(&shares_s, "shares")?;
    h.cost_basis = db_decimal(&basis_s, "cost_basis")?;
    h.current_price = price_s.as_deref().map(|s| db_decimal(s, "price")).transpose()?;
    Ok(h)
}

pub fn get_holding(conn: &Connection, account_id: i64, symbol: &str) -> Result<InvestmentHolding> {
    let sql = format!(
        "SELECT {} FROM investment_holdings WHERE account_id=?1 AND symbol=?2",
        HOLDING_COLUMNS
    );
    let raw = conn
        .query_row(&sql, params![account_id, symbol], row_to_holding)
        .with_context(|| format!("No holding of '{}' in account {}", symbol, account_id))?;
    finish_holding(raw)
}

pub fn list_holdings(conn: &Connection, account_id: Option<i64>) -> Result<Vec<InvestmentHolding>> {
    let sql = match account_id {
        Some(_) => format!(
            "SELECT {} FROM investment_holdings WHERE account_id=?1 ORDER BY symbol",
            HOLDING_COLUMNS
        ),
        None => format!(
            "SELECT {} FROM investment_holdings ORDER BY account_id, symbol",
            HOLDING_COLUMNS
        ),
    };
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = match account_id {
        Some(id) => stmt.query(params![id])?,
        None => stmt.query([])?,
    };
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        out.push(finish_holding(row_to_holding(r)?)?);
    }
    Ok(out)
}

/// Market value of a holding, falling back to cost when no price is set.
pub fn holding_value(h: &InvestmentHolding) -> Decimal {
    match h.current_price {
        Some(price) => h.shares * price,
        None => h.cost_basis,
    }
}

pub fn gain_loss(h: &InvestmentHolding) -> Decimal {
    holding_value(h) - h.cost_basis
}

/// Buying merges into any existing lot for the symbol: shares add up and
/// the purchase cost accrues onto the total cost basis.
pub fn buy_shares(
    conn: &Connection,
    account_id: i64,
    symbol: &str,
    shares: Decimal,
    price_per_share: Decimal,
) -> Result<InvestmentHolding> {
    if shares <= Decimal::ZERO || price_per_share < Decimal::ZERO {
        return Err(anyhow!("Share count must be positive and price non-negative"));
    }
    let cost = shares * price_per_share;
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM investment_holdings WHERE account_id=?1 AND symbol=?2",
            params![account_id, symbol],
            |r| r.get(0),
        )
        .optional()?;
    match existing {
        Some(id) => {
            let h = get_holding(conn, account_id, symbol)?;
            conn.execute(
                "UPDATE investment_holdings
                 SET shares=?1, cost_basis=?2, current_price=?3 WHERE id=?4",
                params![
                    (h.shares + shares).to_string(),
                    (h.cost_basis + cost).to_string(),
                    price_per_share.to_string(),
                    id,
                ],
            )?;
        }
        None => {
            conn.execute(
                "INSERT INTO investment_holdings(account_id, symbol, shares, cost_basis, current_price)
                 VALUES (?1,?2,?3,?4,?5)",
                params![
                    account_id,
                    symbol,
                    shares.to_string(),
                    cost.to_string(),
                    price_per_share.to_string(),
                ],
            )?;
        }
    }
    get_holding(conn, account_id, symbol)
}

/// Selling reduces the cost basis proportionally to the shares sold, so the
/// remaining lot keeps its average cost. Selling the final share removes the
/// row.
pub fn sell_shares(
    conn: &Connection,
    account_id: i64,
    symbol: &str,
    shares: Decimal,
) -> Result<Option<InvestmentHolding>> {
    if shares <= Decimal::ZERO {
        return Err(anyhow!("Share count must be positive"));
    }
    let h = get_holding(conn, account_id, symbol)?;
    if shares > h.shares {
        return Err(anyhow!(
            "Cannot sell {} shares of '{}': only {} held",
            shares,
            symbol,
            h.shares
        ));
    }
    let remaining = h.shares - shares;
    if remaining.is_zero() {
        conn.execute(
            "DELETE FROM investment_holdings WHERE id=?1",
            params![h.id],
        )?;
        return Ok(None);
    }
    let basis_sold = h.cost_basis * shares / h.shares;
    conn.execute(
        "UPDATE investment_holdings SET shares=?1, cost_basis=?2 WHERE id=?3",
        params![
            remaining.to_string(),
            (h.cost_basis - basis_sold).to_string(),
            h.id,
        ],
    )?;
    Ok(Some(get_holding(conn, account_id, symbol)?))
}

pub fn set_price(
    conn: &Connection,
    account_id: i64,
    symbol: &str,
    price: Decimal,
) -> Result<InvestmentHolding> {
    if price < Decimal::ZERO {
        return Err(anyhow!("Price cannot be negative"));
    }
    let h = get_holding(conn, account_id, symbol)?;
    conn.execute(
        "UPDATE investment_holdings SET current_price=?1 WHERE id=?2",
        params![price.to_string(), h.id],
    )?;
    get_holding(conn, account_id, symbol)
}

#[derive(Debug, Serialize)]
pub struct PortfolioSummary {
    pub total_value: Decimal,
    pub total_cost_basis: Decimal,
    pub total_gain_loss: Decimal,
    pub holdings: usize,
}

pub fn portfolio_summary(conn: &Connection, account_id: Option<i64>) -> Result<PortfolioSummary> {
    let holdings = list_holdings(conn, account_id)?;
    let mut total_value = Decimal::ZERO;
    let mut total_cost = Decimal::ZERO;
    for h in &holdings {
        total_value += holding_value(h);
        total_cost += h.cost_basis;
    }
    Ok(PortfolioSummary {
        total_value,
        total_cost_basis: total_cost,
        total_gain_loss: total_value - total_cost,
        holdings: holdings.len(),
    })
}

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("buy", sub)) => {
            let account_id = id_for_account(conn, sub.get_one::<String>("account").unwrap().trim())?;
            let symbol = sub.get_one::<String>("symbol").unwrap().trim();
            let shares = parse_decimal(sub.get_one::<String>("shares").unwrap().trim())?;
            let price = parse_decimal(sub.get_one::<String>("price").unwrap().trim())?;
            let h = buy_shares(conn, account_id, symbol, shares, price)?;
            println!("Now holding {} shares of '{}' (basis {:.2})", h.shares, symbol, h.cost_basis);
        }
        Some(("sell", sub)) => {
            let account_id = id_for_account(conn, sub.get_one::<String>("account").unwrap().trim())?;
            let symbol = sub.get_one::<String>("symbol").unwrap().trim();
            let shares = parse_decimal(sub.get_one::<String>("shares").unwrap().trim())?;
            match sell_shares(conn, account_id, symbol, shares)? {
                Some(h) => println!(
                    "Sold {} shares of '{}', {} remain (basis {:.2})",
                    shares, symbol, h.shares, h.cost_basis
                ),
                None => println!("Sold the entire position in '{}'", symbol),
            }
        }
        Some(("price", sub)) => {
            let account_id = id_for_account(conn, sub.get_one::<String>("account").unwrap().trim())?;
            let symbol = sub.get_one::<String>("symbol").unwrap().trim();
            let price = parse_decimal(sub.get_one::<String>("price").unwrap().trim())?;
            let h = set_price(conn, account_id, symbol, price)?;
            println!(
                "Priced '{}' at {:.2}, position value {:.2}",
                symbol,
                price,
                holding_value(&h)
            );
        }
        Some(("list", sub)) => {
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            let account_id = sub
                .get_one::<String>("account")
                .map(|s| id_for_account(conn, s.trim()))
                .transpose()?;
            let data = list_holdings(conn, account_id)?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|h| {
                        vec![
                            h.symbol.clone(),
                            h.shares.to_string(),
                            format!("{:.2}", h.cost_basis),
                            h.current_price
                                .map(|p| format!("{:.2}", p))
                                .unwrap_or_else(|| "-".into()),
                            format!("{:.2}", holding_value(h)),
                            format!("{:+.2}", gain_loss(h)),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Symbol", "Shares", "Basis", "Price", "Value", "Gain"], rows)
                );
            }
            let summary = portfolio_summary(conn, account_id)?;
            if !json_flag && !jsonl_flag {
                println!(
                    "Total value {:.2}, gain {:+.2} over {} holdings",
                    summary.total_value, summary.total_gain_loss, summary.holdings
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

    fn holding(shares: i64, basis: i64, price: Option<i64>) -> InvestmentHolding {
        InvestmentHolding {
            id: 1,
            account_id: 1,
            symbol: "VTI".into(),
            name: None,
            shares: Decimal::from(shares),
            cost_basis: Decimal::from(basis),
            current_price: price.map(Decimal::from),
            asset_type: None,
        }
    }

    #[test]
    fn value_uses_price_when_available() {
        assert_eq!(holding_value(&holding(10, 2000, Some(250))), Decimal::from(2500));
        assert_eq!(holding_value(&holding(10, 2000, None)), Decimal::from(2000));
    }

    #[test]
    fn gain_is_value_minus_basis() {
        assert_eq!(gain_loss(&holding(10, 2000, Some(250))), Decimal::from(500));
        assert_eq!(gain_loss(&holding(10, 2000, None)), Decimal::ZERO);
    }
}
