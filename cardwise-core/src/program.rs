//! Reward-currency valuation: cents-per-point for a card's program.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::card::Card;
use crate::lenient;

/// Universal cents-per-point when nothing else is known.
pub const FALLBACK_CPP: f64 = 1.0;

/// Immutable program-id -> cents-per-point table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgramTable {
    rates: BTreeMap<String, f64>,
}

impl ProgramTable {
    /// Built-in conservative redemption values for well-known programs.
    pub fn builtin() -> Self {
        Self::from_pairs([
            ("cashback", 1.0),
            ("amex_mr", 1.0),
            ("chase_ur", 1.25),
            ("citi_typ", 1.0),
            ("capital_one_miles", 1.0),
            ("bilt", 1.25),
            ("wells_fargo_rewards", 1.0),
            ("discover_cashback", 1.0),
        ])
    }

    pub fn empty() -> Self {
        Self { rates: BTreeMap::new() }
    }

    pub fn from_pairs<K: Into<String>>(pairs: impl IntoIterator<Item = (K, f64)>) -> Self {
        Self::empty().merged(pairs)
    }

    /// New table with `pairs` replacing or extending existing entries.
    /// Non-finite or negative rates are ignored.
    pub fn merged<K: Into<String>>(mut self, pairs: impl IntoIterator<Item = (K, f64)>) -> Self {
        for (program, cpp) in pairs {
            let program = program.into();
            if cpp.is_finite() && cpp >= 0.0 {
                self.rates.insert(program, cpp);
            } else {
                tracing::warn!(%program, cpp, "ignoring unusable cents-per-point entry");
            }
        }
        self
    }

    pub fn get(&self, program: &str) -> Option<f64> {
        self.rates.get(program).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl Default for ProgramTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Resolve cents-per-point for `card`.
///
/// Order: caller override for `card.program`, the card's own `cpp_default`,
/// the program table, then [`FALLBACK_CPP`].
pub fn cents_per_point(card: &Card, overrides: &HashMap<String, f64>, table: &ProgramTable) -> f64 {
    lenient::first_finite([
        overrides.get(&card.program).copied(),
        card.cpp_default,
        table.get(&card.program),
    ])
    .unwrap_or(FALLBACK_CPP)
}
