use anyhow::{Context, Result};
use cardwise_catalog::WalletState;
use std::fs;
use std::path::PathBuf;

/// `$CARDWISE_HOME`, else `$HOME/.cardwise`.
pub fn cardwise_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("CARDWISE_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".cardwise"))
}

pub fn ensure_cardwise_home() -> Result<PathBuf> {
    let dir = cardwise_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn wallet_path() -> Result<PathBuf> {
    Ok(ensure_cardwise_home()?.join("wallet.json"))
}

pub fn read_wallet() -> Result<WalletState> {
    let p = wallet_path()?;
    if !p.exists() {
        return Ok(WalletState::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn write_wallet(wallet: &WalletState) -> Result<()> {
    let p = wallet_path()?;
    let json = serde_json::to_string_pretty(wallet)?;
    fs::write(&p, json).with_context(|| format!("write {}", p.display()))?;
    tracing::debug!(path = %p.display(), cards = wallet.cards.len(), "wallet saved");
    Ok(())
}
