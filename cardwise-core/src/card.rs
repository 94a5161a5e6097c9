//! Card reference records: earn rates, reward currency, rotating bonus rules.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::lenient;
use crate::time::{end_of_day_utc, start_of_day_utc};

/// Rate applied when a card has neither a category rate nor a usable `base`.
pub const FALLBACK_RATE: f64 = 1.0;

/// How a card's rates are read.
///
/// Cashback rates are percents of spend. Points and miles rates are
/// multipliers, converted to dollars through cents-per-point.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Cashback,
    #[default]
    Points,
    Miles,
}

impl CardType {
    /// Catalog label to type. Unknown labels read as points.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "cashback" | "cash_back" | "cash-back" | "cash" => CardType::Cashback,
            "miles" => CardType::Miles,
            _ => CardType::Points,
        }
    }

    pub fn is_cashback(&self) -> bool {
        matches!(self, CardType::Cashback)
    }
}

impl<'de> Deserialize<'de> for CardType {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = Option::<Value>::deserialize(d)?;
        Ok(raw
            .as_ref()
            .and_then(Value::as_str)
            .map(CardType::from_label)
            .unwrap_or_default())
    }
}

/// A reward-earning card as it appears in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    /// Display name ("Freedom Flex"); falls back to `id` when empty
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub issuer: String,
    /// Reward currency id (e.g. "chase_ur", "cashback")
    #[serde(default)]
    pub program: String,
    #[serde(rename = "type", default)]
    pub card_type: CardType,
    /// Default multiplier/percent when no category rate exists
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub base: Option<f64>,
    /// Card-specific cents-per-point
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub cpp_default: Option<f64>,
    /// category id -> multiplier/percent
    #[serde(default, deserialize_with = "lenient::rates")]
    pub categories: BTreeMap<String, f64>,
    /// Evaluated in order; first match wins
    #[serde(default, deserialize_with = "lenient::records")]
    pub rotating_rules: Vec<RotatingRule>,
}

impl Card {
    pub fn new(id: impl Into<String>, card_type: CardType) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            issuer: String::new(),
            program: String::new(),
            card_type,
            base: None,
            cpp_default: None,
            categories: BTreeMap::new(),
            rotating_rules: Vec::new(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_base(mut self, base: f64) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_cpp(mut self, cpp: f64) -> Self {
        self.cpp_default = Some(cpp);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>, rate: f64) -> Self {
        self.categories.insert(category.into(), rate);
        self
    }

    pub fn with_rotating_rule(mut self, rule: RotatingRule) -> Self {
        self.rotating_rules.push(rule);
        self
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Static rate for a category: category rate, then `base`, then 1.
    pub fn category_rate(&self, category_id: &str) -> f64 {
        lenient::first_finite([self.categories.get(category_id).copied(), self.base])
            .unwrap_or(FALLBACK_RATE)
    }
}

/// A time-bounded bonus category attached to a card.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RotatingRule {
    /// First day (inclusive); `None` = open start
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub start: Option<NaiveDate>,
    /// Last day (inclusive); `None` = open end
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub end: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub category_ids: Vec<String>,
    /// Boosted percent
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub rate: Option<f64>,
    /// Percent once the cap is used up; `None` = the card's static rate
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub after_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_cents")]
    pub cap_cents: Option<i64>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub activation_required: bool,
}

impl RotatingRule {
    pub fn new(category_ids: &[&str], rate: f64) -> Self {
        Self {
            category_ids: category_ids.iter().map(|c| c.to_string()).collect(),
            rate: Some(rate),
            ..Self::default()
        }
    }

    pub fn between(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn with_after_rate(mut self, after_rate: f64) -> Self {
        self.after_rate = Some(after_rate);
        self
    }

    pub fn with_cap(mut self, cap_cents: i64) -> Self {
        self.cap_cents = Some(cap_cents);
        self
    }

    pub fn requiring_activation(mut self) -> Self {
        self.activation_required = true;
        self
    }

    /// `[start-of-day(start), end-of-day(end)]` in UTC, either side optional.
    pub fn window(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        (
            self.start.map(start_of_day_utc),
            self.end.map(end_of_day_utc),
        )
    }

    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let (from, to) = self.window();
        from.is_none_or(|f| now >= f) && to.is_none_or(|t| now <= t)
    }

    pub fn boosts(&self, category_id: &str) -> bool {
        self.category_ids.iter().any(|c| c == category_id)
    }
}
