use cardwise_core::{Card, Offer, UserRotatingState, ValuationParams, Valuator, split_cap};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use std::collections::HashMap;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 10, 12, 0, 0).unwrap()
}

fn rotating_card() -> Card {
    serde_json::from_value(json!({
        "id": "discover-it",
        "program": "cashback",
        "type": "cashback",
        "base": 1,
        "rotating_rules": [{
            "start": "2026-04-01",
            "end": "2026-06-30",
            "category_ids": ["grocery"],
            "rate": 5,
            "after_rate": 1,
            "cap_cents": 150000,
            "activation_required": true
        }]
    }))
    .unwrap()
}

fn offer(v: serde_json::Value) -> Offer {
    serde_json::from_value(v).unwrap()
}

/// Cashback card, static 3% grocery, no rules, no offers.
#[test]
fn test_cashback_static_rate_scenario() {
    let card: Card = serde_json::from_value(json!({
        "id": "blue-cash",
        "type": "cashback",
        "categories": {"grocery": 3}
    }))
    .unwrap();

    let r = Valuator::default().value_for(&card, &ValuationParams::new(5000, "grocery", now()), &[]);
    assert!(close(r.base_value, 1.50));
    assert_eq!(r.bonus_value, 0.0);
    assert!(close(r.dollars, 1.50));
}

/// 5% on the first $1000 of remaining cap, 1% on the other $1000.
#[test]
fn test_rotating_cap_split_scenario() {
    let card = rotating_card();
    let params = ValuationParams::new(200_000, "grocery", now()).with_rotating(
        "discover-it",
        UserRotatingState {
            activated: true,
            remaining_cap_cents: Some(100_000),
        },
    );

    let split = split_cap(200_000, 5.0, 1.0, 100_000);
    assert_eq!(split.boost_cents, 100_000);
    assert_eq!(split.base_cents, 100_000);

    let r = Valuator::default().value_for(&card, &params, &[]);
    assert!(close(r.bonus_value, 50.0));
    assert!(close(r.base_value, 10.0));
    assert!(close(r.dollars, 60.0));
}

#[test]
fn test_activation_required_scenario() {
    let card = rotating_card();
    let params = ValuationParams::new(200_000, "grocery", now()).with_rotating(
        "discover-it",
        UserRotatingState {
            activated: false,
            remaining_cap_cents: Some(100_000),
        },
    );

    let r = Valuator::default().value_for(&card, &params, &[]);
    assert_eq!(r.bonus_value, 0.0);
    assert!(close(r.base_value, 20.0));
    assert!(r.notes.contains(&"Activation required for rotating bonus".to_string()));
}

#[test]
fn test_statement_credit_cap_scenario() {
    let card: Card = serde_json::from_value(json!({"id": "gold", "type": "points", "base": 1})).unwrap();
    let offers = vec![offer(json!({
        "id": "sc-10",
        "offer_type": "statement_credit",
        "min_spend_cents": 2000,
        "value": {"percent": 10, "max_back_cents": 2000},
        "card_scope": "all"
    }))];

    let r = Valuator::default().value_for(&card, &ValuationParams::new(50_000, "dining", now()), &offers);
    assert!(close(r.bonus_value, 20.0));
    assert!(r.notes.iter().any(|n| n.contains("capped at $20.00")));
}

#[test]
fn test_enrollment_gate_scenario() {
    let card: Card = serde_json::from_value(json!({"id": "gold", "type": "cashback", "base": 1})).unwrap();
    let offers = vec![
        offer(json!({"id": "e1", "offer_type": "percent_back", "value": {"percent": 5}, "enrollment_required": true})),
        offer(json!({"id": "e2", "offer_type": "statement_credit", "value": {"fixed_amount": 1000}, "enrollment_required": true})),
    ];

    let r = Valuator::default().value_for(&card, &ValuationParams::new(10_000, "dining", now()), &offers);
    assert_eq!(r.bonus_value, 0.0);
    assert_eq!(r.notes.iter().filter(|n| *n == "Offer requires enrollment").count(), 1);
}

#[test]
fn test_monotonic_in_amount() {
    let card = rotating_card();
    let offers = vec![offer(json!({
        "id": "pb",
        "offer_type": "percent_back",
        "value": {"percent": 10, "max_amount_cents": 500}
    }))];
    let v = Valuator::default();

    let mut last = -1.0;
    for amount in (0..=400_000u64).step_by(12_500) {
        let params = ValuationParams::new(amount, "grocery", now())
            .with_rotating("discover-it", UserRotatingState::activated().with_remaining(100_000));
        let r = v.value_for(&card, &params, &offers);
        assert!(r.dollars >= last, "value dropped at {amount}: {} < {last}", r.dollars);
        last = r.dollars;
    }
}

#[test]
fn test_dollars_is_base_plus_bonus() {
    let card = rotating_card();
    let offers = vec![
        offer(json!({"id": "a", "offer_type": "points_multiplier", "value": {"points_multiplier": 2}})),
        offer(json!({"id": "b", "offer_type": "statement_credit", "value": {"fixed_amount": 250}})),
    ];
    for amount in [0u64, 999, 150_000, 310_000] {
        let params = ValuationParams::new(amount, "grocery", now())
            .with_rotating("discover-it", UserRotatingState::activated());
        let r = Valuator::default().value_for(&card, &params, &offers);
        assert!(close(r.dollars, r.base_value + r.bonus_value));
    }
}

#[test]
fn test_rank_wallet_scenario() {
    let wallet: Vec<Card> = serde_json::from_value(json!([
        {"id": "double", "type": "cashback", "base": 2},
        {"id": "discover-it", "type": "cashback", "base": 1,
         "rotating_rules": [{"category_ids": ["grocery"], "rate": 5, "cap_cents": 150000}]},
        {"id": "sapphire", "type": "points", "program": "chase_ur", "categories": {"grocery": 3}}
    ]))
    .unwrap();

    let params = ValuationParams::new(10_000, "grocery", now());
    let ranked = Valuator::default().rank_cards(&wallet, &params, &HashMap::new());
    let order: Vec<_> = ranked.iter().map(|r| r.card.id.as_str()).collect();
    // $5.00, $3.75, $2.00
    assert_eq!(order, vec!["discover-it", "sapphire", "double"]);
}
