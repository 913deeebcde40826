// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Category;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection};

fn row_to_category(r: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: r.get(0)?,
        name: r.get(1)?,
        r#type: r.get(2)?,
        color: r.get(3)?,
        icon: r.get(4)?,
        sort_order: r.get(5)?,
    })
}

pub fn list_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, type, color, icon, sort_order FROM categories
         ORDER BY sort_order, name",
    )?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        out.push(row_to_category(r)?);
    }
    Ok(out)
}

pub fn create_category(
    conn: &Connection,
    name: &str,
    kind: &str,
    color: &str,
    icon: Option<&str>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO categories(name, type, color, icon) VALUES (?1,?2,?3,?4)",
        params![name, kind, color, icon],
    )
    .with_context(|| format!("Category '{}' already exists", name))?;
    Ok(conn.last_insert_rowid())
}

/// Transactions reference categories by name, so a category with history
/// cannot be removed without orphaning those rows.
pub fn delete_category(conn: &Connection, name: &str) -> Result<()> {
    let in_use: i64 = conn.query_row(
        "SELECT COUNT(*) FROM transactions WHERE category=?1",
        params![name],
        |r| r.get(0),
    )?;
    if in_use > 0 {
        return Err(anyhow!(
            "Cannot delete category '{}' with associated transactions",
            name
        ));
    }
    let n = conn.execute("DELETE FROM categories WHERE name=?1", params![name])?;
    if n == 0 {
        return Err(anyhow!("Category '{}' not found", name));
    }
    Ok(())
}

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let kind = sub
                .get_one::<String>("type")
                .map(String::as_str)
                .unwrap_or("expense");
            let color = sub
                .get_one::<String>("color")
                .map(String::as_str)
                .unwrap_or("#6b7280");
            let icon = sub.get_one::<String>("icon").map(String::as_str);
            let id = create_category(conn, name, kind, color, icon)?;
            println!("Created {} category {} '{}'", kind, id, name);
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            delete_category(conn, name)?;
            println!("Removed category '{}'", name);
        }
        Some(("list", sub)) => {
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            let data = list_categories(conn)?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|c| {
                        vec![
                            c.id.to_string(),
                            c.name.clone(),
                            c.r#type.clone(),
                            c.color.clone(),
                            c.icon.clone().unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["ID", "Name", "Type", "Color", "Icon"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}
