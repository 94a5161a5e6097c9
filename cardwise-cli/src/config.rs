use anyhow::{Context, Result};
use cardwise_core::ProgramTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::state::{cardwise_home, ensure_cardwise_home};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogSection,
    #[serde(default)]
    pub valuation: ValuationSection,
    /// program id -> cents-per-point, replacing built-in defaults
    #[serde(default)]
    pub programs: BTreeMap<String, f64>,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSection {
    pub cards_path: PathBuf,
    pub offers_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationSection {
    /// IANA zone for `--at "YYYY-MM-DD HH:MM"`
    pub timezone: String,
    /// Rows printed by `rank`
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// EnvFilter directive used when RUST_LOG is unset
    pub log_level: String,
}

impl Default for CatalogSection {
    fn default() -> Self {
        let home = cardwise_home().unwrap_or_else(|_| PathBuf::from(".cardwise"));
        Self {
            cards_path: home.join("cards.json"),
            offers_path: home.join("offers.json"),
        }
    }
}

impl Default for ValuationSection {
    fn default() -> Self {
        Self {
            timezone: "America/Chicago".to_string(),
            limit: 10,
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: CatalogSection::default(),
            valuation: ValuationSection::default(),
            programs: ProgramTable::builtin()
                .iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            logging: LoggingSection::default(),
        }
    }
}

impl Config {
    /// Built-in program values with this config's `[programs]` layered on top.
    pub fn program_table(&self) -> ProgramTable {
        ProgramTable::builtin().merged(self.programs.iter().map(|(k, v)| (k.clone(), *v)))
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_cardwise_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let cfg = Config::default();
    save_config(&cfg)?;
    println!("Wrote {}", p.display());
    Ok(())
}
