//! Per-card valuation: base earn, rotating bonus, stacked offers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::card::{Card, CardType};
use crate::money::{dollars, fmt_dollars, fmt_rate, percent_of};
use crate::offer::Offer;
use crate::program::{ProgramTable, cents_per_point};
use crate::rotating::{UserRotatingState, resolve_rotating, split_cap};
use crate::stacking::{OfferContext, stack_offers};

/// Everything a valuation call needs besides the card and its offers.
///
/// Rotating state and enrollment are an immutable snapshot for the call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationParams {
    pub amount_cents: u64,
    pub category_id: String,
    #[serde(default)]
    pub program_overrides: HashMap<String, f64>,
    #[serde(rename = "nowISO", alias = "now")]
    pub now: DateTime<Utc>,
    #[serde(default)]
    pub user_rotating: HashMap<String, UserRotatingState>,
    #[serde(default, rename = "userEnrolledOfferIds", alias = "enrolledOfferIds")]
    pub enrolled_offer_ids: HashSet<String>,
}

impl ValuationParams {
    pub fn new(amount_cents: u64, category_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            amount_cents,
            category_id: category_id.into(),
            now,
            ..Self::default()
        }
    }

    pub fn with_override(mut self, program: impl Into<String>, cpp: f64) -> Self {
        self.program_overrides.insert(program.into(), cpp);
        self
    }

    pub fn with_rotating(mut self, card_id: impl Into<String>, state: UserRotatingState) -> Self {
        self.user_rotating.insert(card_id.into(), state);
        self
    }

    pub fn with_enrolled(mut self, offer_id: impl Into<String>) -> Self {
        self.enrolled_offer_ids.insert(offer_id.into());
        self
    }
}

/// Estimated value of one card for one purchase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationResult<'a> {
    pub card: &'a Card,
    pub dollars: f64,
    pub base_value: f64,
    pub bonus_value: f64,
    /// Base/rotating note first, then offer notes in catalog order
    pub notes: Vec<String>,
}

/// The valuation engine. Holds only the program default table.
#[derive(Debug, Clone, Default)]
pub struct Valuator {
    programs: ProgramTable,
}

impl Valuator {
    pub fn new(programs: ProgramTable) -> Self {
        Self { programs }
    }

    pub fn programs(&self) -> &ProgramTable {
        &self.programs
    }

    pub fn cents_per_point(&self, card: &Card, overrides: &HashMap<String, f64>) -> f64 {
        cents_per_point(card, overrides, &self.programs)
    }

    /// Value `card` for the purchase in `params`, stacking `offers` on top.
    pub fn value_for<'a>(&self, card: &'a Card, params: &ValuationParams, offers: &[Offer]) -> ValuationResult<'a> {
        let cpp = self.cents_per_point(card, &params.program_overrides);
        let rate = card.category_rate(&params.category_id);
        let amount = params.amount_cents;
        let category = params.category_id.as_str();

        let mut notes = Vec::new();
        let base_value;
        let mut bonus_value = 0.0;

        match card.card_type {
            CardType::Cashback => {
                match resolve_rotating(card, category, params.now, &params.user_rotating) {
                    Some(window) if window.active => {
                        let after = window.after_rate_percent.unwrap_or(rate);
                        let split = split_cap(amount, window.boost_rate_percent, after, window.remaining_cap_cents);
                        base_value = split.base_value;
                        bonus_value += split.boost_value;

                        let mut note = format!(
                            "{}% rotating bonus on {}",
                            fmt_rate(window.boost_rate_percent),
                            fmt_dollars(dollars(split.boost_cents))
                        );
                        if split.base_cents > 0 {
                            note.push_str(&format!(
                                "; {}% on remaining {} (cap reached)",
                                fmt_rate(after),
                                fmt_dollars(dollars(split.base_cents))
                            ));
                        }
                        notes.push(note);
                    }
                    Some(window) => {
                        base_value = percent_of(amount, rate);
                        notes.push(format!("{}% back on {}", fmt_rate(rate), category));
                        if let Some(reason) = window.reason {
                            notes.push(format!("{reason} for rotating bonus"));
                        }
                    }
                    None => {
                        base_value = percent_of(amount, rate);
                        notes.push(format!("{}% back on {}", fmt_rate(rate), category));
                    }
                }
            }
            // Rotating rules are only evaluated for cashback cards.
            CardType::Points | CardType::Miles => {
                base_value = dollars(amount) * rate * cpp / 100.0;
                notes.push(format!(
                    "{}x on {} @ {}\u{a2}/pt",
                    fmt_rate(rate),
                    category,
                    fmt_rate(cpp)
                ));
            }
        }

        let ctx = OfferContext {
            card,
            category_id: category,
            amount_cents: amount,
            now: params.now,
            cpp,
        };
        let offers = stack_offers(&ctx, &params.enrolled_offer_ids, offers);
        bonus_value += offers.bonus_value;
        notes.extend(offers.notes);

        tracing::trace!(card = %card.id, base_value, bonus_value, "card valued");

        ValuationResult {
            card,
            dollars: base_value + bonus_value,
            base_value,
            bonus_value,
            notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::RotatingRule;
    use crate::offer::{OfferType, OfferValue};
    use crate::rotating::UserRotatingState;
    use crate::stacking::ENROLLMENT_REQUIRED;
    use chrono::{NaiveDate, TimeZone};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 12, 0, 0).unwrap()
    }

    fn flex() -> Card {
        Card::new("flex", CardType::Cashback)
            .with_base(1.0)
            .with_rotating_rule(
                RotatingRule::new(&["grocery"], 5.0)
                    .between(
                        NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
                        NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
                    )
                    .with_after_rate(1.0)
                    .with_cap(150_000)
                    .requiring_activation(),
            )
    }

    #[test]
    fn test_cashback_static_rate() {
        let card = Card::new("blue", CardType::Cashback).with_category("grocery", 3.0);
        let params = ValuationParams::new(5000, "grocery", now());
        let r = Valuator::default().value_for(&card, &params, &[]);
        assert!(close(r.base_value, 1.50));
        assert_eq!(r.bonus_value, 0.0);
        assert!(close(r.dollars, 1.50));
        assert_eq!(r.notes, vec!["3% back on grocery"]);
    }

    #[test]
    fn test_rotating_cap_split() {
        let card = flex();
        let params = ValuationParams::new(200_000, "grocery", now())
            .with_rotating("flex", UserRotatingState::activated().with_remaining(100_000));
        let r = Valuator::default().value_for(&card, &params, &[]);
        assert!(close(r.bonus_value, 50.0));
        assert!(close(r.base_value, 10.0));
        assert!(close(r.dollars, 60.0));
        assert_eq!(
            r.notes,
            vec!["5% rotating bonus on $1000.00; 1% on remaining $1000.00 (cap reached)"]
        );
    }

    #[test]
    fn test_rotating_not_activated() {
        let card = flex();
        let params = ValuationParams::new(200_000, "grocery", now())
            .with_rotating("flex", UserRotatingState::default().with_remaining(100_000));
        let r = Valuator::default().value_for(&card, &params, &[]);
        assert_eq!(r.bonus_value, 0.0);
        assert!(close(r.base_value, 20.0));
        assert!(r.notes.iter().any(|n| n == "Activation required for rotating bonus"));
    }

    #[test]
    fn test_rotating_after_rate_falls_back_to_static() {
        let card = Card::new("c", CardType::Cashback)
            .with_category("gas", 2.0)
            .with_rotating_rule(RotatingRule::new(&["gas"], 5.0).with_cap(1000));
        let params = ValuationParams::new(3000, "gas", now());
        let r = Valuator::default().value_for(&card, &params, &[]);
        // $10 at 5% + $20 at 2%
        assert!(close(r.bonus_value, 0.5));
        assert!(close(r.base_value, 0.4));
    }

    #[test]
    fn test_points_card_ignores_rotating_rules() {
        let card = Card::new("p", CardType::Points)
            .with_program("chase_ur")
            .with_category("grocery", 3.0)
            .with_rotating_rule(RotatingRule::new(&["grocery"], 10.0).with_cap(1_000_000));
        let params = ValuationParams::new(10_000, "grocery", now());
        let r = Valuator::default().value_for(&card, &params, &[]);
        // $100 * 3x * 1.25cpp
        assert!(close(r.base_value, 3.75));
        assert_eq!(r.bonus_value, 0.0);
        assert_eq!(r.notes, vec!["3x on grocery @ 1.25\u{a2}/pt"]);
    }

    #[test]
    fn test_override_changes_points_value() {
        let card = Card::new("p", CardType::Miles).with_program("capital_one_miles").with_base(2.0);
        let params = ValuationParams::new(10_000, "travel", now()).with_override("capital_one_miles", 1.8);
        let r = Valuator::default().value_for(&card, &params, &[]);
        assert!(close(r.dollars, 3.6));
    }

    #[test]
    fn test_offers_follow_base_note_and_add_to_bonus() {
        let card = Card::new("blue", CardType::Cashback).with_category("grocery", 3.0);
        let offers = vec![
            Offer::new(
                "gated",
                OfferType::PercentBack,
                OfferValue {
                    percent: Some(10.0),
                    ..OfferValue::default()
                },
            )
            .requiring_enrollment(),
            Offer::new(
                "credit",
                OfferType::StatementCredit,
                OfferValue {
                    fixed_amount: Some(500),
                    ..OfferValue::default()
                },
            ),
        ];
        let params = ValuationParams::new(5000, "grocery", now());
        let r = Valuator::default().value_for(&card, &params, &offers);
        assert!(close(r.bonus_value, 5.0));
        assert!(close(r.dollars, 6.5));
        assert_eq!(
            r.notes,
            vec!["3% back on grocery", ENROLLMENT_REQUIRED, "$5.00 statement credit"]
        );
    }

    #[test]
    fn test_params_wire_names() {
        let params: ValuationParams = serde_json::from_value(serde_json::json!({
            "amountCents": 1234,
            "categoryId": "dining",
            "nowISO": "2026-05-10T12:00:00Z",
            "userRotating": {"flex": {"activated": true, "remainingCapCents": 500}},
            "userEnrolledOfferIds": ["o1"]
        }))
        .unwrap();
        assert_eq!(params.amount_cents, 1234);
        assert_eq!(params.now, now());
        assert_eq!(params.user_rotating["flex"].remaining_cap_cents, Some(500));
        assert!(params.enrolled_offer_ids.contains("o1"));
    }
}
