//! Text and JSON rendering for rankings and statement replays.

use cardwise_catalog::StatementReport;
use cardwise_core::{Card, ValuationResult, money::fmt_dollars};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct RankRow<'a> {
    rank: usize,
    card_id: &'a str,
    name: &'a str,
    dollars: f64,
    base_value: f64,
    bonus_value: f64,
    notes: &'a [String],
}

pub fn render_ranking(results: &[ValuationResult<'_>], limit: usize) -> String {
    if results.is_empty() {
        return "No cards to rank.\n".to_string();
    }

    let mut s = String::new();
    for (i, r) in results.iter().take(limit).enumerate() {
        let marker = if i == 0 { "*" } else { " " };
        s.push_str(&format!(
            "{marker} {}. {:<28} {:>9}  (base {}, bonus {})\n",
            i + 1,
            r.card.display_name(),
            fmt_dollars(r.dollars),
            fmt_dollars(r.base_value),
            fmt_dollars(r.bonus_value),
        ));
        for note in &r.notes {
            s.push_str(&format!("      - {note}\n"));
        }
    }
    if results.len() > limit {
        s.push_str(&format!("  ... {} more\n", results.len() - limit));
    }
    s
}

pub fn ranking_json(results: &[ValuationResult<'_>], limit: usize) -> serde_json::Result<String> {
    let rows: Vec<RankRow<'_>> = results
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, r)| RankRow {
            rank: i + 1,
            card_id: &r.card.id,
            name: r.card.display_name(),
            dollars: r.dollars,
            base_value: r.base_value,
            bonus_value: r.bonus_value,
            notes: &r.notes,
        })
        .collect();
    serde_json::to_string_pretty(&rows)
}

pub fn render_statement(report: &StatementReport, cards: &[Card]) -> String {
    let name = |id: &str| -> String {
        cards
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.display_name().to_string())
            .unwrap_or_else(|| id.to_string())
    };

    let mut s = String::new();
    for row in &report.rows {
        let p = &row.purchase;
        s.push_str(&format!(
            "{} {:<28} {:>10} {:<14} -> {} ({})\n",
            p.date,
            truncate(&p.description, 28),
            fmt_dollars(p.amount_cents as f64 / 100.0),
            p.category,
            row.best_card.as_deref().map(name).unwrap_or_else(|| "-".to_string()),
            fmt_dollars(row.best_value),
        ));
    }

    s.push_str(&format!("\nBest card every time: {}\n", fmt_dollars(report.best_total)));
    for (id, total) in &report.card_totals {
        s.push_str(&format!("  {:<28} {:>9}\n", name(id), fmt_dollars(*total)));
    }
    if let Some((id, total)) = report.best_single_card() {
        s.push_str(&format!(
            "Switching cards per purchase earns {} more than {} alone.\n",
            fmt_dollars(report.best_total - total),
            name(id)
        ));
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}~")
    }
}
