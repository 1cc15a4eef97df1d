use std::{env, path::PathBuf};

use anyhow::{Context, Result};

use crate::{db::driver, models::GridVariant};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub bind_addr: String,
    pub variant: GridVariant,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let variant = match env::var("TODO_GRID_VARIANT") {
            Ok(raw) => raw.parse::<GridVariant>().context("TODO_GRID_VARIANT")?,
            Err(_) => GridVariant::default(),
        };
        Ok(Config {
            db_path: env::var("TODO_DB_PATH")
                .unwrap_or_else(|_| driver::DEFAULT_PATH.to_string())
                .into(),
            bind_addr: env::var("TODO_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            variant,
        })
    }
}
