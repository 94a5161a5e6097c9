//! Card and offer catalogs loaded from JSON arrays.
//!
//! Records that fail to decode are dropped with a warning; the rest of the
//! catalog still loads. Card ids must be unique.

use cardwise_core::{Card, Offer};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::error::CatalogError;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    cards: Vec<Card>,
    offers: Vec<Offer>,
}

impl Catalog {
    pub fn new(cards: Vec<Card>, offers: Vec<Offer>) -> Result<Self, CatalogError> {
        if let Some(dup) = first_duplicate(&cards) {
            return Err(CatalogError::DuplicateCard(dup));
        }
        Ok(Self { cards, offers })
    }

    /// Load both catalogs. A missing offers file means no offers.
    pub fn load(cards_path: impl AsRef<Path>, offers_path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let cards_path = cards_path.as_ref();
        let offers_path = offers_path.as_ref();

        let cards = parse_records(&read(cards_path)?, "card catalog")?;
        let offers = if offers_path.exists() {
            parse_records(&read(offers_path)?, "offer catalog")?
        } else {
            tracing::debug!(path = %offers_path.display(), "no offer catalog; continuing without offers");
            Vec::new()
        };

        tracing::debug!(cards = cards.len(), offers = offers.len(), "catalog loaded");
        Self::new(cards, offers)
    }

    pub fn from_json(cards_json: &str, offers_json: &str) -> Result<Self, CatalogError> {
        Self::new(
            parse_records(cards_json, "card catalog")?,
            parse_records(offers_json, "offer catalog")?,
        )
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    pub fn card(&self, id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn offer(&self, id: &str) -> Option<&Offer> {
        self.offers.iter().find(|o| o.id == id)
    }

    /// Candidate offers per card, in catalog order.
    ///
    /// Offers bound to a merchant are kept only when `merchant` names that
    /// merchant (case-insensitive). Unbound offers are always candidates.
    pub fn offers_by_card(&self, cards: &[Card], merchant: Option<&str>) -> HashMap<String, Vec<Offer>> {
        cards
            .iter()
            .map(|card| {
                let offers = self
                    .offers
                    .iter()
                    .filter(|o| o.card_scope.admits(&card.id))
                    .filter(|o| merchant_matches(o, merchant))
                    .cloned()
                    .collect();
                (card.id.clone(), offers)
            })
            .collect()
    }
}

fn first_duplicate(cards: &[Card]) -> Option<String> {
    let mut seen = HashSet::new();
    cards
        .iter()
        .find(|c| !seen.insert(c.id.as_str()))
        .map(|c| c.id.clone())
}

fn merchant_matches(offer: &Offer, merchant: Option<&str>) -> bool {
    match (offer.merchant_id.as_deref(), merchant) {
        (None, _) => true,
        (Some(bound), Some(m)) => bound.trim().eq_ignore_ascii_case(m.trim()),
        (Some(_), None) => false,
    }
}

fn read(path: &Path) -> Result<String, CatalogError> {
    fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_records<T: DeserializeOwned>(json: &str, what: &str) -> Result<Vec<T>, CatalogError> {
    let value: Value = serde_json::from_str(json).map_err(|source| CatalogError::Json {
        what: what.to_string(),
        source,
    })?;
    let Value::Array(items) = value else {
        return Err(CatalogError::NotAnArray { what: what.to_string() });
    };

    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value(item) {
            Ok(rec) => Some(rec),
            Err(e) => {
                tracing::warn!(catalog = what, index = i, error = %e, "skipping malformed record");
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARDS: &str = r#"[
        {"id": "flex", "type": "cashback", "base": 1},
        {"id": "gold", "type": "points", "program": "amex_mr", "categories": {"dining": 4}},
        {"name": "no id, dropped"}
    ]"#;

    const OFFERS: &str = r#"[
        {"id": "any", "offer_type": "percent_back", "value": {"percent": 1}},
        {"id": "gold-only", "offer_type": "percent_back", "value": {"percent": 5}, "card_scope": ["gold"]},
        {"id": "wf", "offer_type": "statement_credit", "value": {"fixed_amount": 500}, "merchant_id": "whole-foods"}
    ]"#;

    #[test]
    fn test_from_json_drops_bad_records() {
        let cat = Catalog::from_json(CARDS, OFFERS).unwrap();
        assert_eq!(cat.cards().len(), 2);
        assert_eq!(cat.offers().len(), 3);
        assert!(cat.card("gold").is_some());
        assert!(cat.offer("wf").is_some());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = Catalog::from_json(r#"[{"id": "a"}, {"id": "a"}]"#, "[]").unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateCard(ref id) if id == "a"));
    }

    #[test]
    fn test_non_array_rejected() {
        let err = Catalog::from_json(r#"{"id": "a"}"#, "[]").unwrap_err();
        assert!(matches!(err, CatalogError::NotAnArray { .. }));
    }

    #[test]
    fn test_offers_by_card_scope_and_merchant() {
        let cat = Catalog::from_json(CARDS, OFFERS).unwrap();
        let cards = cat.cards().to_vec();

        let none = cat.offers_by_card(&cards, None);
        let ids = |m: &HashMap<String, Vec<Offer>>, card: &str| -> Vec<String> {
            m[card].iter().map(|o| o.id.clone()).collect()
        };
        assert_eq!(ids(&none, "flex"), vec!["any"]);
        assert_eq!(ids(&none, "gold"), vec!["any", "gold-only"]);

        let wf = cat.offers_by_card(&cards, Some("Whole-Foods"));
        assert_eq!(ids(&wf, "flex"), vec!["any", "wf"]);

        let other = cat.offers_by_card(&cards, Some("target"));
        assert_eq!(ids(&other, "flex"), vec!["any"]);
    }
}
