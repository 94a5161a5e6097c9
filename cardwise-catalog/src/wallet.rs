//! The user's wallet: owned cards plus the mutable per-user state the
//! engine reads as a snapshot (rotating activation and cap, enrollment,
//! cents-per-point overrides).

use cardwise_core::{Card, UserRotatingState, ValuationParams};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::Catalog;
use crate::error::CatalogError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletState {
    /// Owned card ids, in the order the user added them
    #[serde(default)]
    pub cards: Vec<String>,
    #[serde(default)]
    pub rotating: BTreeMap<String, UserRotatingState>,
    #[serde(default)]
    pub enrolled_offers: BTreeSet<String>,
    /// program id -> cents-per-point
    #[serde(default)]
    pub program_overrides: BTreeMap<String, f64>,
}

impl WalletState {
    /// Returns false if the card was already in the wallet.
    pub fn add_card(&mut self, card_id: &str) -> bool {
        if self.owns(card_id) {
            return false;
        }
        self.cards.push(card_id.to_string());
        true
    }

    /// Drops the card and its rotating state. Returns false if it was not owned.
    pub fn remove_card(&mut self, card_id: &str) -> bool {
        let before = self.cards.len();
        self.cards.retain(|c| c != card_id);
        self.rotating.remove(card_id);
        self.cards.len() != before
    }

    pub fn owns(&self, card_id: &str) -> bool {
        self.cards.iter().any(|c| c == card_id)
    }

    pub fn set_activated(&mut self, card_id: &str, activated: bool) {
        self.rotating.entry(card_id.to_string()).or_default().activated = activated;
    }

    /// `None` resets to the rule's full cap.
    pub fn set_remaining_cap(&mut self, card_id: &str, cents: Option<i64>) {
        self.rotating
            .entry(card_id.to_string())
            .or_default()
            .remaining_cap_cents = cents.map(|c| c.max(0));
    }

    pub fn enroll(&mut self, offer_id: &str) -> bool {
        self.enrolled_offers.insert(offer_id.to_string())
    }

    pub fn unenroll(&mut self, offer_id: &str) -> bool {
        self.enrolled_offers.remove(offer_id)
    }

    pub fn set_override(&mut self, program: &str, cpp: f64) {
        self.program_overrides.insert(program.to_string(), cpp);
    }

    pub fn clear_override(&mut self, program: &str) -> bool {
        self.program_overrides.remove(program).is_some()
    }

    /// Owned cards looked up in the catalog, in wallet order.
    pub fn resolve(&self, catalog: &Catalog) -> Result<Vec<Card>, CatalogError> {
        self.cards
            .iter()
            .map(|id| {
                catalog
                    .card(id)
                    .cloned()
                    .ok_or_else(|| CatalogError::UnknownCard(id.clone()))
            })
            .collect()
    }

    /// Valuation inputs for one purchase, carrying this wallet's snapshot.
    pub fn params(&self, amount_cents: u64, category_id: &str, now: DateTime<Utc>) -> ValuationParams {
        ValuationParams {
            amount_cents,
            category_id: category_id.to_string(),
            program_overrides: self.program_overrides.clone().into_iter().collect(),
            now,
            user_rotating: self.rotating.clone().into_iter().collect(),
            enrolled_offer_ids: self.enrolled_offers.iter().cloned().collect(),
        }
    }
}
