//! Rotating bonus categories: window resolution and cap splitting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::card::Card;
use crate::money::percent_of;

pub const ACTIVATION_REQUIRED: &str = "Activation required";

/// Caller-held rotating state for one card in the current period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserRotatingState {
    #[serde(default)]
    pub activated: bool,
    /// Boosted-rate headroom left; `None` = the rule's full cap
    #[serde(
        default,
        rename = "remainingCapCents",
        alias = "remaining_cap_cents",
        skip_serializing_if = "Option::is_none"
    )]
    pub remaining_cap_cents: Option<i64>,
}

impl UserRotatingState {
    pub fn activated() -> Self {
        Self {
            activated: true,
            remaining_cap_cents: None,
        }
    }

    pub fn with_remaining(mut self, cents: i64) -> Self {
        self.remaining_cap_cents = Some(cents);
        self
    }
}

/// The rotating rule that applies to one (card, category, instant).
#[derive(Debug, Clone, PartialEq)]
pub struct RotatingWindow {
    pub active: bool,
    pub reason: Option<&'static str>,
    pub boost_rate_percent: f64,
    /// `None` = fall back to the card's static rate
    pub after_rate_percent: Option<f64>,
    pub remaining_cap_cents: i64,
}

/// Find the first rotating rule on `card` whose window contains `now` and
/// which boosts `category_id`.
///
/// Scanning stops at the first match even when it is not activated.
pub fn resolve_rotating(
    card: &Card,
    category_id: &str,
    now: DateTime<Utc>,
    user_rotating: &HashMap<String, UserRotatingState>,
) -> Option<RotatingWindow> {
    for rule in &card.rotating_rules {
        if !rule.contains(now) || !rule.boosts(category_id) {
            continue;
        }

        let state = user_rotating.get(&card.id).copied().unwrap_or_default();
        let active = !rule.activation_required || state.activated;
        let full_cap = rule.cap_cents.unwrap_or(0).max(0);
        let remaining = state.remaining_cap_cents.unwrap_or(full_cap).max(0);

        tracing::debug!(
            card = %card.id,
            category = category_id,
            active,
            remaining_cap_cents = remaining,
            "rotating rule matched"
        );

        return Some(RotatingWindow {
            active,
            reason: (!active).then_some(ACTIVATION_REQUIRED),
            boost_rate_percent: rule.rate.unwrap_or(0.0),
            after_rate_percent: rule.after_rate,
            remaining_cap_cents: remaining,
        });
    }

    None
}

/// A purchase divided at the remaining cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapSplit {
    pub boost_value: f64,
    pub base_value: f64,
    pub boost_cents: u64,
    pub base_cents: u64,
}

/// Split `amount_cents` into a boosted portion (at most the remaining cap)
/// and the remainder, valuing each at its percent. Negative caps count as 0.
pub fn split_cap(amount_cents: u64, boost_percent: f64, base_percent: f64, remaining_cap_cents: i64) -> CapSplit {
    let cap = remaining_cap_cents.max(0) as u64;
    let boost_cents = amount_cents.min(cap);
    let base_cents = amount_cents - boost_cents;

    CapSplit {
        boost_value: percent_of(boost_cents, boost_percent),
        base_value: percent_of(base_cents, base_percent),
        boost_cents,
        base_cents,
    }
}
