//! Offer matching and stacking.
//!
//! Every offer that passes the filters and yields a positive value is added;
//! there is no best-of selection between offers.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::card::Card;
use crate::money::{dollars, dollars_clamped, fmt_dollars, fmt_rate, percent_of};
use crate::offer::{Offer, OfferType};

pub const ENROLLMENT_REQUIRED: &str = "Offer requires enrollment";

/// Incremental value of a card's qualifying offers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OfferOutcome {
    pub bonus_value: f64,
    pub notes: Vec<String>,
}

/// Purchase context an offer is checked against.
#[derive(Debug, Clone, Copy)]
pub struct OfferContext<'a> {
    pub card: &'a Card,
    pub category_id: &'a str,
    pub amount_cents: u64,
    pub now: DateTime<Utc>,
    /// The card's resolved cents-per-point
    pub cpp: f64,
}

/// Filter `offers` down to those that apply and sum their value.
///
/// Filters, in order: live window, card scope, category, enrollment.
/// Offers skipped for enrollment add a single shared note.
pub fn stack_offers(ctx: &OfferContext<'_>, enrolled: &HashSet<String>, offers: &[Offer]) -> OfferOutcome {
    let mut out = OfferOutcome::default();
    let mut enrollment_noted = false;

    for offer in offers {
        if !offer.is_live(ctx.now) {
            tracing::debug!(offer = %offer.id, "offer not live");
            continue;
        }
        if !offer.card_scope.admits(&ctx.card.id) {
            continue;
        }
        if !offer.matches_category(ctx.category_id) {
            continue;
        }
        if offer.enrollment_required && !enrolled.contains(&offer.id) {
            tracing::debug!(offer = %offer.id, card = %ctx.card.id, "offer skipped: not enrolled");
            if !enrollment_noted {
                out.notes.push(ENROLLMENT_REQUIRED.to_string());
                enrollment_noted = true;
            }
            continue;
        }

        if let Some((value, note)) = offer_value(offer, ctx) {
            if value > 0.0 {
                tracing::debug!(offer = %offer.id, value, "offer applied");
                out.bonus_value += value;
                out.notes.push(note);
            }
        }
    }

    out
}

fn offer_value(offer: &Offer, ctx: &OfferContext<'_>) -> Option<(f64, String)> {
    let v = &offer.value;
    match offer.offer_type {
        OfferType::StatementCredit => {
            if ctx.amount_cents < offer.min_spend() {
                return None;
            }
            if let Some(fixed) = v.fixed_amount {
                let credit = dollars_clamped(fixed);
                return Some((credit, format!("{} statement credit", fmt_dollars(credit))));
            }
            percent_back(offer, ctx.amount_cents)
        }
        OfferType::PercentBack => percent_back(offer, ctx.amount_cents),
        OfferType::PointsMultiplier => {
            let extra = v.points_multiplier?;
            let value = if ctx.card.card_type.is_cashback() {
                // Cashback cards earn no points; read the extra as added percent.
                percent_of(ctx.amount_cents, extra)
            } else {
                dollars(ctx.amount_cents) * extra * ctx.cpp / 100.0
            };
            Some((value, format!("+{}x points", fmt_rate(extra))))
        }
        OfferType::Unknown => None,
    }
}

fn percent_back(offer: &Offer, amount_cents: u64) -> Option<(f64, String)> {
    let pct = offer.value.percent?;
    let raw = percent_of(amount_cents, pct);

    match offer.value.cap_cents().map(dollars_clamped) {
        Some(cap) if raw > cap => Some((
            cap,
            format!("{}% back, capped at {}", fmt_rate(pct), fmt_dollars(cap)),
        )),
        _ => Some((raw, format!("{}% back ({})", fmt_rate(pct), fmt_dollars(raw)))),
    }
}
