// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::transactions::{adjust_balance, get_transaction, insert_row, NewTransaction};
use crate::models::Transaction;
use crate::utils::{account_name, id_for_account, parse_date, parse_decimal};
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

pub const TRANSFER_CATEGORY: &str = "[Transfer]";

pub struct TransferPair {
    pub withdrawal: Transaction,
    pub deposit: Transaction,
}

/// Move money between two owned accounts by creating a linked withdrawal and
/// deposit. Both rows, both balance updates, and the two-phase link are one
/// atomic unit. Overdrawing the source account is allowed for every account
/// type.
pub fn create_transfer(
    conn: &mut Connection,
    from_account_id: i64,
    to_account_id: i64,
    amount: Decimal,
    date: NaiveDate,
    memo: Option<String>,
) -> Result<TransferPair> {
    if from_account_id == to_account_id {
        return Err(anyhow!("Cannot transfer to the same account"));
    }
    if amount <= Decimal::ZERO {
        return Err(anyhow!("Transfer amount must be positive"));
    }

    let from_name = account_name(conn, from_account_id)?;
    let to_name = account_name(conn, to_account_id)?;

    let tx = conn.transaction()?;

    let withdrawal_id = insert_row(
        &tx,
        &NewTransaction {
            date,
            account_id: from_account_id,
            amount: -amount,
            payee: format!("Transfer to {}", to_name),
            category: TRANSFER_CATEGORY.to_string(),
            memo: memo.clone(),
            transaction_type: Some("transfer".to_string()),
            ..Default::default()
        },
    )?;
    let deposit_id = insert_row(
        &tx,
        &NewTransaction {
            date,
            account_id: to_account_id,
            amount,
            payee: format!("Transfer from {}", from_name),
            category: TRANSFER_CATEGORY.to_string(),
            memo,
            transaction_type: Some("transfer".to_string()),
            linked_transaction_id: Some(withdrawal_id),
            ..Default::default()
        },
    )?;
    // Second phase of the link: the withdrawal could not reference the
    // deposit before the deposit's id existed.
    tx.execute(
        "UPDATE transactions SET linked_transaction_id=?1 WHERE id=?2",
        params![deposit_id, withdrawal_id],
    )?;

    adjust_balance(&tx, from_account_id, -amount)?;
    adjust_balance(&tx, to_account_id, amount)?;
    tx.commit()?;

    Ok(TransferPair {
        withdrawal: get_transaction(conn, withdrawal_id)?,
        deposit: get_transaction(conn, deposit_id)?,
    })
}

/// Delete both sides of a transfer and reverse both balance effects. Either
/// side's id may be given. Fails if the transaction is not a transfer.
pub fn delete_transfer(conn: &mut Connection, transaction_id: i64) -> Result<()> {
    let t = get_transaction(conn, transaction_id)?;
    if t.transaction_type.as_deref() != Some("transfer") {
        return Err(anyhow!("Transaction {} is not a transfer", transaction_id));
    }
    let linked = match t.linked_transaction_id {
        Some(id) => Some(get_transaction(conn, id)?),
        None => None,
    };

    let tx = conn.transaction()?;
    tx.execute("DELETE FROM transactions WHERE id=?1", params![t.id])?;
    adjust_balance(&tx, t.account_id, -t.amount)?;
    if let Some(linked) = linked {
        tx.execute("DELETE FROM transactions WHERE id=?1", params![linked.id])?;
        adjust_balance(&tx, linked.account_id, -linked.amount)?;
    }
    tx.commit()?;
    Ok(())
}

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let from = sub.get_one::<String>("from").unwrap().trim();
            let to = sub.get_one::<String>("to").unwrap().trim();
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?;
            let date = parse_date(sub.get_one::<String>("date").unwrap().trim())?;
            let memo = sub
                .get_one::<String>("memo")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
            let from_id = id_for_account(conn, from)?;
            let to_id = id_for_account(conn, to)?;
            let pair = create_transfer(conn, from_id, to_id, amount, date, memo)?;
            println!(
                "Transferred {} from '{}' to '{}' (tx {} <-> {})",
                amount, from, to, pair.withdrawal.id, pair.deposit.id
            );
        }
        Some(("rm", sub)) => {
            let id: i64 = sub.get_one::<String>("id").unwrap().trim().parse()?;
            delete_transfer(conn, id)?;
            println!("Removed transfer {} and its linked transaction", id);
        }
        _ => {}
    }
    Ok(())
}
