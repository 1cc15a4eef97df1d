use std::{fmt, str::FromStr};

use anyhow::bail;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub completed: bool,
}
impl Todo {
    pub fn new(title: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            completed: false,
        }
    }
}

/// Which flavour of grid the UI shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridVariant {
    /// Checkbox for `completed` plus a delete checkbox per row.
    #[default]
    Deletable,
    /// Number input for `completed`, no way to delete from the grid.
    Plain,
}
impl GridVariant {
    pub fn has_delete(self) -> bool {
        matches!(self, Self::Deletable)
    }
    pub fn title_label(self) -> &'static str {
        match self {
            Self::Deletable => "🎯 Title",
            Self::Plain => "📝 Title",
        }
    }
    pub fn completed_label(self) -> &'static str {
        match self {
            Self::Deletable => "✅ Completed",
            Self::Plain => "🔢 Completed",
        }
    }
    pub fn delete_label(self) -> &'static str {
        "❌ Delete"
    }
}
impl FromStr for GridVariant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deletable" | "1" => Ok(Self::Deletable),
            "plain" | "2" => Ok(Self::Plain),
            other => bail!("unknown grid variant {other:?}, expected `deletable` or `plain`"),
        }
    }
}

/// A grid column a user can change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attribute {
    Title,
    Completed,
    Delete,
}
impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Title => "title",
            Self::Completed => "completed",
            Self::Delete => "delete",
        })
    }
}

/// One rendered grid line. `delete` is transient and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    pub position: usize,
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub delete: bool,
}

/// The display table for a single render pass, rebuilt from storage every time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub variant: GridVariant,
    pub rows: Vec<GridRow>,
}
impl Projection {
    pub fn build(todos: Vec<Todo>, variant: GridVariant) -> Self {
        let rows = todos
            .into_iter()
            .enumerate()
            .map(|(position, todo)| GridRow {
                position,
                id: todo.id,
                title: todo.title,
                completed: todo.completed,
                delete: false,
            })
            .collect();
        Self { variant, rows }
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
