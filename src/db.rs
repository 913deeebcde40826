// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("app.pocketbook", "Pocketbook", "pocketbook"));

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("pocketbook.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let mut conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

/// Create all tables. Public so tests can run against an in-memory database.
pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        type TEXT NOT NULL CHECK(type IN ('checking','savings','credit','investment','retirement','cash')),
        balance TEXT NOT NULL,
        opening_balance TEXT NOT NULL,
        currency TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        type TEXT NOT NULL CHECK(type IN ('income','expense')),
        color TEXT NOT NULL DEFAULT '#808080',
        icon TEXT,
        sort_order INTEGER NOT NULL DEFAULT 0
    );

    -- transactions.category is a free-form name, not a foreign key: category
    -- renames do not cascade and budgets match fuzzily on the string.
    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        account_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        payee TEXT NOT NULL,
        category TEXT NOT NULL DEFAULT '',
        subcategory TEXT,
        memo TEXT,
        reconciled INTEGER NOT NULL DEFAULT 0,
        transaction_type TEXT CHECK(transaction_type IN ('income','expense','transfer')),
        linked_transaction_id INTEGER,
        recurring_transaction_id INTEGER,
        import_id TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
    CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id);

    CREATE TABLE IF NOT EXISTS budgets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        category TEXT NOT NULL,
        amount TEXT NOT NULL,
        period TEXT NOT NULL CHECK(period IN ('monthly','annual')),
        start_date TEXT NOT NULL,
        rollover INTEGER NOT NULL DEFAULT 0,
        UNIQUE(category, period)
    );

    CREATE TABLE IF NOT EXISTS recurring_transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        account_id INTEGER NOT NULL,
        frequency TEXT NOT NULL CHECK(frequency IN ('weekly','bi-weekly','monthly','quarterly','yearly')),
        next_date TEXT NOT NULL,
        end_date TEXT,
        amount TEXT NOT NULL,
        payee TEXT NOT NULL,
        category TEXT NOT NULL DEFAULT '',
        memo TEXT,
        is_active INTEGER NOT NULL DEFAULT 1,
        last_created_date TEXT,
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS reminders(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        amount TEXT,
        due_date TEXT NOT NULL,
        frequency TEXT NOT NULL DEFAULT 'one-time' CHECK(frequency IN ('one-time','monthly','yearly')),
        is_paid INTEGER NOT NULL DEFAULT 0,
        linked_transaction_id INTEGER,
        category TEXT,
        notes TEXT
    );

    CREATE TABLE IF NOT EXISTS savings_goals(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        target_amount TEXT NOT NULL,
        current_amount TEXT NOT NULL DEFAULT '0',
        target_date TEXT,
        linked_account_id INTEGER,
        color TEXT NOT NULL DEFAULT '#2E86AB',
        is_completed INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY(linked_account_id) REFERENCES accounts(id) ON DELETE SET NULL
    );

    CREATE TABLE IF NOT EXISTS net_worth_snapshots(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        snapshot_date TEXT NOT NULL UNIQUE,
        total_assets TEXT NOT NULL,
        total_liabilities TEXT NOT NULL,
        net_worth TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS investment_holdings(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        account_id INTEGER NOT NULL,
        symbol TEXT NOT NULL,
        name TEXT,
        shares TEXT NOT NULL,
        cost_basis TEXT NOT NULL,
        current_price TEXT,
        asset_type TEXT,
        last_updated TEXT,
        UNIQUE(account_id, symbol),
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS reconciliation_history(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        account_id INTEGER NOT NULL,
        statement_date TEXT NOT NULL,
        statement_beginning_balance TEXT NOT NULL,
        statement_ending_balance TEXT NOT NULL,
        reconciled_balance TEXT NOT NULL,
        difference TEXT NOT NULL,
        transaction_count INTEGER NOT NULL,
        notes TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE CASCADE
    );

    -- Exact id set per reconciliation session so undo never touches
    -- transactions reconciled in an overlapping session.
    CREATE TABLE IF NOT EXISTS reconciliation_entries(
        reconciliation_id INTEGER NOT NULL,
        transaction_id INTEGER NOT NULL,
        PRIMARY KEY(reconciliation_id, transaction_id),
        FOREIGN KEY(reconciliation_id) REFERENCES reconciliation_history(id) ON DELETE CASCADE
    );
    "#,
    )?;
    Ok(())
}
