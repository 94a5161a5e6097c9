//! Wallet ranking: value every card, best first.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::card::Card;
use crate::offer::Offer;
use crate::valuation::{ValuationParams, ValuationResult, Valuator};

/// Descending by `dollars`, then by `bonus_value`.
pub fn compare_results(a: &ValuationResult<'_>, b: &ValuationResult<'_>) -> Ordering {
    b.dollars
        .total_cmp(&a.dollars)
        .then_with(|| b.bonus_value.total_cmp(&a.bonus_value))
}

impl Valuator {
    /// Value every card in `wallet` and sort best-to-worst.
    ///
    /// `offers_by_card` maps card id to that card's candidate offers, in
    /// catalog order. Cards tied on both keys keep their wallet order.
    pub fn rank_cards<'a>(
        &self,
        wallet: &'a [Card],
        params: &ValuationParams,
        offers_by_card: &HashMap<String, Vec<Offer>>,
    ) -> Vec<ValuationResult<'a>> {
        let mut results: Vec<ValuationResult<'a>> = wallet
            .iter()
            .map(|card| {
                let offers = offers_by_card.get(&card.id).map(Vec::as_slice).unwrap_or(&[]);
                self.value_for(card, params, offers)
            })
            .collect();

        // sort_by is stable
        results.sort_by(compare_results);
        results
    }
}
