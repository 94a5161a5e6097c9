//! Promotional offer records from the offer catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::lenient;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OfferType {
    StatementCredit,
    PercentBack,
    PointsMultiplier,
    /// Catalog-level types this engine does not evaluate
    #[default]
    #[serde(other)]
    Unknown,
}

/// Type-dependent payload of an offer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OfferValue {
    /// Flat credit, in cents
    #[serde(default, deserialize_with = "lenient::opt_cents")]
    pub fixed_amount: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub percent: Option<f64>,
    /// Extra multiplier (points) or extra percent (cashback cards)
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub points_multiplier: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_cents")]
    pub max_back_cents: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_cents")]
    pub max_amount_cents: Option<i64>,
}

impl OfferValue {
    /// Cap on percent-style value, in cents: `max_back_cents`, then `max_amount_cents`.
    pub fn cap_cents(&self) -> Option<i64> {
        lenient::first_present([self.max_back_cents, self.max_amount_cents])
    }
}

/// Which cards an offer may be applied to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CardScope {
    #[default]
    All,
    Cards(Vec<String>),
}

impl CardScope {
    pub fn admits(&self, card_id: &str) -> bool {
        match self {
            CardScope::All => true,
            CardScope::Cards(ids) => ids.iter().any(|id| id == card_id),
        }
    }
}

impl Serialize for CardScope {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            CardScope::All => s.serialize_str("all"),
            CardScope::Cards(ids) => ids.serialize(s),
        }
    }
}

/// `"all"`, a single card id, or an array of card ids. Absent or null means all;
/// any other shape admits no card.
impl<'de> Deserialize<'de> for CardScope {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = Option::<Value>::deserialize(d)?;
        Ok(match raw {
            None | Some(Value::Null) => CardScope::All,
            Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("all") => CardScope::All,
            Some(Value::String(s)) => CardScope::Cards(vec![s.trim().to_string()]),
            Some(Value::Array(items)) => CardScope::Cards(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|s| s.trim().to_string())
                    .collect(),
            ),
            Some(_) => CardScope::Cards(Vec::new()),
        })
    }
}

/// A promotional bonus, independent of the base card earn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub offer_type: OfferType,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub value: OfferValue,
    #[serde(default, deserialize_with = "lenient::opt_cents")]
    pub min_spend_cents: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_instant")]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::opt_instant")]
    pub end_at: Option<DateTime<Utc>>,
    /// Set for merchant-bound offers; the catalog layer scopes these
    #[serde(default)]
    pub merchant_id: Option<String>,
    #[serde(default)]
    pub card_scope: CardScope,
    /// Empty = every category
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub categories: Vec<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub enrollment_required: bool,
}

impl Offer {
    pub fn new(id: impl Into<String>, offer_type: OfferType, value: OfferValue) -> Self {
        Self {
            id: id.into(),
            issuer: String::new(),
            title: String::new(),
            offer_type,
            value,
            min_spend_cents: None,
            start_at: None,
            end_at: None,
            merchant_id: None,
            card_scope: CardScope::All,
            categories: Vec::new(),
            enrollment_required: false,
        }
    }

    pub fn with_min_spend(mut self, cents: i64) -> Self {
        self.min_spend_cents = Some(cents);
        self
    }

    pub fn with_window(mut self, start_at: Option<DateTime<Utc>>, end_at: Option<DateTime<Utc>>) -> Self {
        self.start_at = start_at;
        self.end_at = end_at;
        self
    }

    pub fn with_categories(mut self, categories: &[&str]) -> Self {
        self.categories = categories.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn for_cards(mut self, card_ids: &[&str]) -> Self {
        self.card_scope = CardScope::Cards(card_ids.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn for_merchant(mut self, merchant_id: impl Into<String>) -> Self {
        self.merchant_id = Some(merchant_id.into());
        self
    }

    pub fn requiring_enrollment(mut self) -> Self {
        self.enrollment_required = true;
        self
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.start_at.is_none_or(|s| now >= s) && self.end_at.is_none_or(|e| now <= e)
    }

    pub fn matches_category(&self, category_id: &str) -> bool {
        self.categories.is_empty() || self.categories.iter().any(|c| c == category_id)
    }

    pub fn min_spend(&self) -> u64 {
        self.min_spend_cents.unwrap_or(0).max(0) as u64
    }
}
