use std::collections::HashMap;

use anyhow::{Context, Result};
use config::{Config, File, FileFormat};
use serde::Deserialize;

use crate::col::{ColName, ColType};

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub debug: bool,
    pub tables: HashMap<String, Table>,
}

#[derive(Debug, Deserialize)]
pub struct Table {
    pub schema: Vec<(ColName, ColType)>, // from [["name", "Text"], ...]

    /// Columns left out of the view ("None-columns").
    #[serde(default)]
    pub hidden: Vec<ColName>,

    /// Sample rows of raw cell text, one entry per schema column.
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl Settings {
    pub fn load(path: &str) -> Result<Self> {
        Config::builder()
            .add_source(File::with_name(path))
            .build()
            .with_context(|| format!("Failed to load config from '{}'", path))?
            .try_deserialize()
            .context("Failed to deserialize config")
    }

    pub fn from_toml(source: &str) -> Result<Self> {
        Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .context("Failed to parse config")?
            .try_deserialize()
            .context("Failed to deserialize config")
    }
}
