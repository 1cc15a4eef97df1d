//! Applies grid edits back to storage.
//!
//! The grid posts every row on each change, keyed by position
//! (`rows[3].title`, `rows[3].completed`, ...). The edited-rows map is the
//! subset of positions whose values differ from what is stored for that id,
//! and the whole map is written in one pass, lowest position first.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use tracing::{debug, info};

use crate::{
    db::driver::Db,
    error::AppError,
    models::{Attribute, GridVariant},
    repository,
};

/// A row as submitted by the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedRow {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub delete: bool,
}

/// An edited row together with the attributes that differ from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowEdit {
    pub row: SubmittedRow,
    pub changed: BTreeSet<Attribute>,
}

pub type EditedRows = BTreeMap<usize, RowEdit>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub updated: usize,
    pub deleted: usize,
}

#[derive(Default)]
struct PartialRow {
    id: Option<String>,
    title: Option<String>,
    completed: Option<String>,
    delete: bool,
}

fn split_key(key: &str) -> Option<(&str, &str)> {
    let rest = key.strip_prefix("rows[")?;
    let (position, field) = rest.split_once("].")?;
    Some((position, field))
}

/// Plain cells are read as integers and collapsed to a flag, so any non-zero
/// value (5 included) is stored as 1.
fn parse_completed(raw: Option<&str>, variant: GridVariant) -> Result<bool, AppError> {
    match variant {
        // unchecked boxes are not submitted at all
        GridVariant::Deletable => Ok(raw.is_some()),
        GridVariant::Plain => {
            // a cleared number input submits an empty string
            let raw = raw.map(str::trim).filter(|raw| !raw.is_empty()).unwrap_or("0");
            let value: i64 = raw
                .parse()
                .map_err(|_| AppError::bad_request(format!("completed must be a number, got {raw:?}")))?;
            Ok(value != 0)
        }
    }
}

/// Groups submitted form pairs into rows by position.
///
/// Keys that don't look like grid cells are ignored. Delete flags are dropped
/// for the plain variant, which has no delete column.
pub fn parse_grid(
    pairs: &[(String, String)],
    variant: GridVariant,
) -> Result<BTreeMap<usize, SubmittedRow>, AppError> {
    let mut partial: BTreeMap<usize, PartialRow> = BTreeMap::new();
    for (key, value) in pairs {
        let Some((position, field)) = split_key(key) else {
            continue;
        };
        let position: usize = position
            .parse()
            .map_err(|_| AppError::bad_request(format!("bad row position in {key:?}")))?;
        let row = partial.entry(position).or_default();
        match field {
            "id" => row.id = Some(value.clone()),
            "title" => row.title = Some(value.clone()),
            "completed" => row.completed = Some(value.clone()),
            "delete" => row.delete = variant.has_delete(),
            _ => {}
        }
    }

    let mut rows = BTreeMap::new();
    for (position, row) in partial {
        let id = row
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::bad_request(format!("row {position} has no id")))?;
        let completed = parse_completed(row.completed.as_deref(), variant)?;
        rows.insert(
            position,
            SubmittedRow {
                id,
                title: row.title.unwrap_or_default(),
                completed,
                delete: row.delete,
            },
        );
    }
    Ok(rows)
}

/// Compares submitted rows with storage and keeps the ones that changed.
///
/// Rows whose id has disappeared from storage are left out.
pub fn edited_rows(db: &Db, rows: BTreeMap<usize, SubmittedRow>) -> Result<EditedRows> {
    let mut edited = EditedRows::new();
    for (position, row) in rows {
        let Some(stored) = repository::get(db, &row.id)? else {
            debug!(position, id = %row.id, "edited row no longer stored");
            continue;
        };
        let mut changed = BTreeSet::new();
        if stored.title != row.title {
            changed.insert(Attribute::Title);
        }
        if stored.completed != row.completed {
            changed.insert(Attribute::Completed);
        }
        if row.delete {
            changed.insert(Attribute::Delete);
        }
        if !changed.is_empty() {
            edited.insert(position, RowEdit { row, changed });
        }
    }
    Ok(edited)
}

/// Writes every edited row. A set delete flag wins over any other edit in the
/// same row; otherwise the full row is rewritten.
pub fn apply(db: &Db, edited: &EditedRows) -> Result<Outcome> {
    let mut outcome = Outcome::default();
    for (position, edit) in edited {
        let row = &edit.row;
        let changed: Vec<String> = edit.changed.iter().map(ToString::to_string).collect();
        if row.delete {
            if repository::delete(db, &row.id)? {
                outcome.deleted += 1;
            }
            info!(position, id = %row.id, "deleted todo from grid");
        } else {
            if repository::update(db, &row.id, &row.title, row.completed)? {
                outcome.updated += 1;
            }
            info!(position, id = %row.id, ?changed, "updated todo from grid");
        }
    }
    Ok(outcome)
}

pub fn reconcile(
    db: &Db,
    pairs: &[(String, String)],
    variant: GridVariant,
) -> Result<Outcome, AppError> {
    let rows = parse_grid(pairs, variant)?;
    let edited = edited_rows(db, rows)?;
    Ok(apply(db, &edited)?)
}
