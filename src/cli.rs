// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{crate_version, Arg, ArgAction, Command};

fn arg(name: &'static str) -> Arg {
    Arg::new(name).long(name)
}

fn req(name: &'static str) -> Arg {
    arg(name).required(true)
}

fn flag(name: &'static str) -> Arg {
    arg(name).action(ArgAction::SetTrue)
}

fn json_flags(cmd: Command) -> Command {
    cmd.arg(flag("json").help("Print as a JSON array"))
        .arg(flag("jsonl").help("Print as one JSON object per line"))
}

pub fn build_cli() -> Command {
    Command::new("pocketbook")
        .about("Personal finance ledger in your terminal")
        .version(crate_version!())
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(account_cmd())
        .subcommand(category_cmd())
        .subcommand(tx_cmd())
        .subcommand(transfer_cmd())
        .subcommand(reconcile_cmd())
        .subcommand(recurring_cmd())
        .subcommand(budget_cmd())
        .subcommand(networth_cmd())
        .subcommand(goal_cmd())
        .subcommand(reminder_cmd())
        .subcommand(holding_cmd())
        .subcommand(import_cmd())
        .subcommand(export_cmd())
}

fn account_cmd() -> Command {
    Command::new("account")
        .about("Manage accounts")
        .subcommand(
            Command::new("add")
                .about("Create an account")
                .arg(req("name"))
                .arg(req("type").help("checking|savings|credit|investment|retirement|cash"))
                .arg(arg("opening-balance"))
                .arg(arg("currency")),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about("List accounts")
                .arg(flag("all").help("Include deactivated accounts")),
        ))
        .subcommand(
            Command::new("rename")
                .about("Rename an account")
                .arg(req("name"))
                .arg(req("new-name")),
        )
        .subcommand(
            Command::new("rm")
                .about("Deactivate or delete an account")
                .arg(req("name"))
                .arg(flag("hard").help("Delete the row instead of deactivating"))
                .arg(flag("force").help("Delete its transactions too")),
        )
        .subcommand(
            Command::new("summary")
                .about("Balance totals by account type")
                .arg(flag("json")),
        )
        .subcommand(
            Command::new("audit")
                .about("Check stored balances against transaction history")
                .arg(flag("json")),
        )
}

fn category_cmd() -> Command {
    Command::new("category")
        .about("Manage categories")
        .subcommand(
            Command::new("add")
                .about("Create a category")
                .arg(req("name"))
                .arg(arg("type").help("income|expense"))
                .arg(arg("color"))
                .arg(arg("icon")),
        )
        .subcommand(Command::new("rm").about("Delete an unused category").arg(req("name")))
        .subcommand(json_flags(Command::new("list").about("List categories")))
}

fn tx_cmd() -> Command {
    Command::new("tx")
        .about("Record and query transactions")
        .subcommand(
            Command::new("add")
                .about("Record a transaction (negative amount = outflow)")
                .arg(req("date").help("YYYY-MM-DD"))
                .arg(req("account"))
                .arg(req("amount"))
                .arg(req("payee"))
                .arg(arg("category"))
                .arg(arg("memo")),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about("List transactions")
                .arg(arg("account"))
                .arg(arg("category"))
                .arg(arg("from"))
                .arg(arg("to"))
                .arg(arg("search").help("Match payee or memo"))
                .arg(arg("min-amount"))
                .arg(arg("max-amount"))
                .arg(flag("reconciled"))
                .arg(flag("unreconciled")),
        ))
        .subcommand(
            Command::new("edit")
                .about("Edit a transaction")
                .arg(req("id"))
                .arg(arg("date"))
                .arg(arg("account"))
                .arg(arg("amount"))
                .arg(arg("payee"))
                .arg(arg("category"))
                .arg(arg("memo")),
        )
        .subcommand(Command::new("rm").about("Delete a transaction").arg(req("id")))
        .subcommand(
            Command::new("reconcile-toggle")
                .about("Flip a transaction's reconciled flag")
                .arg(req("id")),
        )
}

fn transfer_cmd() -> Command {
    Command::new("transfer")
        .about("Move money between accounts")
        .subcommand(
            Command::new("add")
                .about("Create a transfer")
                .arg(req("from"))
                .arg(req("to"))
                .arg(req("amount"))
                .arg(req("date"))
                .arg(arg("memo")),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete both sides of a transfer")
                .arg(req("id").help("Either side's transaction id")),
        )
}

fn reconcile_cmd() -> Command {
    Command::new("reconcile")
        .about("Reconcile against bank statements")
        .subcommand(
            Command::new("run")
                .about("Reconcile a statement")
                .arg(req("account"))
                .arg(req("date").help("Statement date"))
                .arg(req("begin").help("Statement beginning balance"))
                .arg(req("end").help("Statement ending balance"))
                .arg(arg("ids").help("Comma-separated transaction ids, default all unreconciled"))
                .arg(arg("notes")),
        )
        .subcommand(
            Command::new("auto")
                .about("Reconcile everything if the expected balance matches")
                .arg(req("account"))
                .arg(req("date"))
                .arg(req("expected")),
        )
        .subcommand(
            Command::new("undo")
                .about("Undo a reconciliation session")
                .arg(req("id")),
        )
        .subcommand(json_flags(
            Command::new("history")
                .about("Past reconciliations for an account")
                .arg(req("account")),
        ))
}

fn recurring_cmd() -> Command {
    Command::new("recurring")
        .about("Schedule repeating transactions")
        .subcommand(
            Command::new("add")
                .about("Schedule a recurring transaction")
                .arg(req("account"))
                .arg(req("frequency").help("weekly|bi-weekly|monthly|quarterly|yearly"))
                .arg(req("next-date"))
                .arg(req("amount"))
                .arg(req("payee"))
                .arg(arg("end-date"))
                .arg(arg("category"))
                .arg(arg("memo")),
        )
        .subcommand(json_flags(Command::new("list").about("List schedules")))
        .subcommand(Command::new("rm").about("Delete a schedule").arg(req("id")))
        .subcommand(
            Command::new("toggle")
                .about("Pause or resume a schedule")
                .arg(req("id")),
        )
        .subcommand(Command::new("process").about("Materialize everything due today"))
}

fn budget_cmd() -> Command {
    Command::new("budget")
        .about("Manage spending budgets")
        .subcommand(
            Command::new("add")
                .about("Create a budget")
                .arg(req("category"))
                .arg(req("amount"))
                .arg(req("period").help("monthly|annual"))
                .arg(arg("start-date"))
                .arg(flag("rollover")),
        )
        .subcommand(
            Command::new("edit")
                .about("Change a budget's amount")
                .arg(req("id"))
                .arg(arg("amount")),
        )
        .subcommand(Command::new("rm").about("Delete a budget").arg(req("id")))
        .subcommand(json_flags(
            Command::new("status").about("Budgets with current spending"),
        ))
}

fn networth_cmd() -> Command {
    Command::new("networth")
        .about("Track net worth")
        .subcommand(Command::new("show").about("Current net worth").arg(flag("json")))
        .subcommand(Command::new("snapshot").about("Record today's net worth"))
        .subcommand(json_flags(Command::new("history").about("Recorded snapshots")))
        .subcommand(
            Command::new("change")
                .about("Change since a date")
                .arg(req("since")),
        )
}

fn goal_cmd() -> Command {
    Command::new("goal")
        .about("Savings goals")
        .subcommand(
            Command::new("add")
                .about("Create a goal")
                .arg(req("name"))
                .arg(req("target"))
                .arg(arg("target-date"))
                .arg(arg("account").help("Link progress to an account"))
                .arg(arg("color")),
        )
        .subcommand(
            Command::new("contribute")
                .about("Add to a goal")
                .arg(req("id"))
                .arg(req("amount")),
        )
        .subcommand(
            Command::new("sync")
                .about("Reset progress to the linked account balance")
                .arg(req("id")),
        )
        .subcommand(Command::new("rm").about("Delete a goal").arg(req("id")))
        .subcommand(json_flags(Command::new("list").about("Goals with progress")))
}

fn reminder_cmd() -> Command {
    Command::new("reminder")
        .about("Bill reminders")
        .subcommand(
            Command::new("add")
                .about("Create a reminder")
                .arg(req("title"))
                .arg(req("due"))
                .arg(arg("amount"))
                .arg(arg("frequency").help("one-time|monthly|yearly"))
                .arg(arg("category"))
                .arg(arg("notes")),
        )
        .subcommand(
            Command::new("pay")
                .about("Pay a bill and record the transaction")
                .arg(req("id"))
                .arg(req("account")),
        )
        .subcommand(
            Command::new("toggle")
                .about("Flip a reminder's paid flag")
                .arg(req("id")),
        )
        .subcommand(Command::new("rm").about("Delete a reminder").arg(req("id")))
        .subcommand(json_flags(
            Command::new("list")
                .about("List reminders")
                .arg(flag("overdue").help("Only unpaid past-due reminders"))
                .arg(arg("upcoming").help("Only reminders due within N days")),
        ))
}

fn holding_cmd() -> Command {
    Command::new("holding")
        .about("Investment holdings")
        .subcommand(
            Command::new("buy")
                .about("Buy shares")
                .arg(req("account"))
                .arg(req("symbol"))
                .arg(req("shares"))
                .arg(req("price").help("Price per share")),
        )
        .subcommand(
            Command::new("sell")
                .about("Sell shares")
                .arg(req("account"))
                .arg(req("symbol"))
                .arg(req("shares")),
        )
        .subcommand(
            Command::new("price")
                .about("Update a holding's market price")
                .arg(req("account"))
                .arg(req("symbol"))
                .arg(req("price")),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about("Holdings with value and gain")
                .arg(arg("account")),
        ))
}

fn import_cmd() -> Command {
    Command::new("import").about("Import bank statements").subcommand(
        Command::new("csv")
            .about("Import a CSV statement")
            .arg(req("account"))
            .arg(req("file"))
            .arg(arg("date-col").help("Date column header, default 'Date'"))
            .arg(arg("payee-col").help("Payee column header, default 'Description'"))
            .arg(arg("amount-col").help("Signed amount column, default 'Amount'"))
            .arg(arg("debit-col"))
            .arg(arg("credit-col"))
            .arg(arg("category-col"))
            .arg(arg("memo-col"))
            .arg(flag("include-duplicates").help("Import rows flagged as duplicates too")),
    )
}

fn export_cmd() -> Command {
    Command::new("export").about("Export the ledger").subcommand(
        Command::new("csv")
            .about("Export transactions to CSV")
            .arg(req("file"))
            .arg(arg("account"))
            .arg(arg("from"))
            .arg(arg("to")),
    )
}
