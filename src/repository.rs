//! CRUD over the `todos` table.
//!
//! Every function takes the storage context explicitly and runs against its
//! own short-lived connection. Updates and deletes of unknown ids are no-ops
//! and report `false`.

use anyhow::Result;
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use crate::{db::driver::Db, models::Todo};

fn todo_from_row(row: &Row<'_>) -> rusqlite::Result<Todo> {
    Ok(Todo {
        id: row.get("id")?,
        title: row.get::<_, Option<String>>("title")?.unwrap_or_default(),
        completed: row.get::<_, Option<i64>>("completed")?.unwrap_or(0) != 0,
    })
}

pub fn list(db: &Db) -> Result<Vec<Todo>> {
    let todos = db.with_connection(|conn| {
        let mut stmt = conn.prepare("SELECT id, title, completed FROM todos")?;
        let todos = stmt
            .query_map([], todo_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(todos)
    })?;
    debug!(count = todos.len(), "listed todos");
    Ok(todos)
}

pub fn get(db: &Db, id: &str) -> Result<Option<Todo>> {
    db.with_connection(|conn| {
        conn.query_row(
            "SELECT id, title, completed FROM todos WHERE id = ?1",
            params![id],
            todo_from_row,
        )
        .optional()
    })
}

pub fn create(db: &Db, title: &str) -> Result<Todo> {
    let todo = Todo::new(title.to_string());
    db.with_connection(|conn| {
        conn.execute(
            "INSERT INTO todos (id, title, completed) VALUES (?1, ?2, ?3)",
            params![todo.id, todo.title, todo.completed],
        )
    })?;
    debug!(id = %todo.id, "created todo");
    Ok(todo)
}

pub fn update(db: &Db, id: &str, title: &str, completed: bool) -> Result<bool> {
    let changed = db.with_connection(|conn| {
        conn.execute(
            "UPDATE todos SET title = ?2, completed = ?3 WHERE id = ?1",
            params![id, title, completed],
        )
    })?;
    if changed == 0 {
        debug!(id, "update skipped, no such todo");
    }
    Ok(changed > 0)
}

pub fn delete(db: &Db, id: &str) -> Result<bool> {
    let changed =
        db.with_connection(|conn| conn.execute("DELETE FROM todos WHERE id = ?1", params![id]))?;
    if changed == 0 {
        debug!(id, "delete skipped, no such todo");
    }
    Ok(changed > 0)
}
