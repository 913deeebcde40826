// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub r#type: String,
    pub balance: Decimal,
    pub opening_balance: Decimal,
    pub currency: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub r#type: String,
    pub color: String,
    pub icon: Option<String>,
    pub sort_order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    pub account_id: i64,
    pub amount: Decimal,
    pub payee: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub memo: Option<String>,
    pub reconciled: bool,
    pub transaction_type: Option<String>,
    pub linked_transaction_id: Option<i64>,
    pub recurring_transaction_id: Option<i64>,
    pub import_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub category: String,
    pub amount: Decimal,
    pub period: String, // monthly | annual
    pub start_date: NaiveDate,
    pub rollover: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringTransaction {
    pub id: i64,
    pub account_id: i64,
    pub frequency: String,
    pub next_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub amount: Decimal,
    pub payee: String,
    pub category: String,
    pub memo: Option<String>,
    pub is_active: bool,
    pub last_created_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: i64,
    pub title: String,
    pub amount: Option<Decimal>,
    pub due_date: NaiveDate,
    pub frequency: String, // one-time | monthly | yearly
    pub is_paid: bool,
    pub linked_transaction_id: Option<i64>,
    pub category: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: i64,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub target_date: Option<NaiveDate>,
    pub linked_account_id: Option<i64>,
    pub color: String,
    pub is_completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetWorthSnapshot {
    pub id: i64,
    pub snapshot_date: NaiveDate,
    pub total_assets: Decimal,
    pub total_liabilities: Decimal,
    pub net_worth: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentHolding {
    pub id: i64,
    pub account_id: i64,
    pub symbol: String,
    pub name: Option<String>,
    pub shares: Decimal,
    /// Total cost, not per-share.
    pub cost_basis: Decimal,
    pub current_price: Option<Decimal>,
    pub asset_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationHistory {
    pub id: i64,
    pub account_id: i64,
    pub statement_date: NaiveDate,
    pub statement_beginning_balance: Decimal,
    pub statement_ending_balance: Decimal,
    pub reconciled_balance: Decimal,
    pub difference: Decimal,
    pub transaction_count: i64,
    pub notes: Option<String>,
}
