//! Replay a purchase history against the wallet.
//!
//! Input is a CSV with a header row:
//! date,description,amount,category[,merchant]
//!
//! Column order is free; names are matched case-insensitively. Amounts may be
//! written as `12.34`, `$12.34` or `$1,234.56`. Refunds (negative amounts) and
//! rows with an unreadable date or amount are skipped.

use cardwise_core::{Card, Valuator, time::start_of_day_utc};
use chrono::{Duration, NaiveDate};
use regex::Regex;
use serde::Serialize;
use std::io::Read;
use std::path::Path;

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::wallet::WalletState;

/// Optional sign, optional `$`, digits with optional thousands commas, up to two decimals.
const AMOUNT_PATTERN: &str = r"^(?P<neg>-)?\s*\$?\s*(?P<whole>\d{1,3}(?:,\d{3})+|\d+)(?:\.(?P<frac>\d{1,2}))?$";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Purchase {
    pub date: NaiveDate,
    pub description: String,
    pub amount_cents: u64,
    pub category: String,
    pub merchant: Option<String>,
}

/// Best card for one purchase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseBest {
    pub purchase: Purchase,
    pub best_card: Option<String>,
    pub best_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementReport {
    pub rows: Vec<PurchaseBest>,
    /// Sum of the best card's value on every purchase
    pub best_total: f64,
    /// (card id, value if that card had been used for everything), wallet order
    pub card_totals: Vec<(String, f64)>,
}

impl StatementReport {
    /// What the single best all-purpose card would have earned.
    pub fn best_single_card(&self) -> Option<&(String, f64)> {
        self.card_totals
            .iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}

pub fn parse_purchases_csv(path: impl AsRef<Path>) -> Result<Vec<Purchase>, CatalogError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_purchases(file)
}

pub fn parse_purchases<R: Read>(input: R) -> Result<Vec<Purchase>, CatalogError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = rdr.headers()?.clone();
    let col = |name: &'static str| -> Result<usize, CatalogError> {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or(CatalogError::MissingColumn(name))
    };
    let date_col = col("date")?;
    let amount_col = col("amount")?;
    let category_col = col("category")?;
    let description_col = col("description").ok();
    let merchant_col = col("merchant").ok();

    let amount_re = Regex::new(AMOUNT_PATTERN)?;

    let mut out = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();

        let Some(date) = parse_date(field(date_col)) else {
            tracing::warn!(row = i + 1, value = field(date_col), "skipping purchase: bad date");
            continue;
        };
        let Some(amount_cents) = parse_amount_cents(&amount_re, field(amount_col)) else {
            tracing::debug!(row = i + 1, value = field(amount_col), "skipping non-purchase row");
            continue;
        };
        let category = field(category_col).to_lowercase();
        if category.is_empty() {
            tracing::warn!(row = i + 1, "skipping purchase: no category");
            continue;
        }

        out.push(Purchase {
            date,
            description: description_col.map(field).unwrap_or("").to_string(),
            amount_cents,
            category,
            merchant: merchant_col.map(field).filter(|m| !m.is_empty()).map(str::to_string),
        });
    }

    Ok(out)
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
        .ok()
}

/// Positive amount in cents; `None` for refunds, zero, or garbage.
fn parse_amount_cents(re: &Regex, s: &str) -> Option<u64> {
    let caps = re.captures(s.trim())?;
    if caps.name("neg").is_some() {
        return None;
    }
    let whole: u64 = caps["whole"].replace(',', "").parse().ok()?;
    let frac: u64 = match caps.name("frac").map(|m| m.as_str()) {
        Some(f) if f.len() == 1 => f.parse::<u64>().ok()? * 10,
        Some(f) => f.parse().ok()?,
        None => 0,
    };
    let cents = whole.checked_mul(100)?.checked_add(frac)?;
    (cents > 0).then_some(cents)
}

/// Rank the wallet for every purchase, valued at noon UTC on its date.
pub fn replay_statement(
    purchases: &[Purchase],
    wallet: &WalletState,
    cards: &[Card],
    catalog: &Catalog,
    valuator: &Valuator,
) -> StatementReport {
    let mut card_totals: Vec<(String, f64)> = cards.iter().map(|c| (c.id.clone(), 0.0)).collect();
    let mut rows = Vec::with_capacity(purchases.len());
    let mut best_total = 0.0;

    for p in purchases {
        let now = start_of_day_utc(p.date) + Duration::hours(12);
        let params = wallet.params(p.amount_cents, &p.category, now);
        let offers = catalog.offers_by_card(cards, p.merchant.as_deref());
        let ranked = valuator.rank_cards(cards, &params, &offers);

        for r in &ranked {
            if let Some(total) = card_totals.iter_mut().find(|(id, _)| *id == r.card.id) {
                total.1 += r.dollars;
            }
        }

        let best = ranked.first();
        let best_value = best.map(|r| r.dollars).unwrap_or(0.0);
        best_total += best_value;
        rows.push(PurchaseBest {
            purchase: p.clone(),
            best_card: best.map(|r| r.card.id.clone()),
            best_value,
        });
    }

    StatementReport {
        rows,
        best_total,
        card_totals,
    }
}
