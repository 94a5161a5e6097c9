//! cardwise-core: reward valuation and card ranking for a single purchase.
//!
//! Pure functions over catalog records and a per-call snapshot of user state.
//! No I/O happens in this crate.

pub mod card;
pub mod lenient;
pub mod money;
pub mod offer;
pub mod program;
pub mod ranking;
pub mod rotating;
pub mod stacking;
pub mod time;
pub mod valuation;

pub use card::{Card, CardType, RotatingRule};
pub use offer::{CardScope, Offer, OfferType, OfferValue};
pub use program::{FALLBACK_CPP, ProgramTable, cents_per_point};
pub use ranking::compare_results;
pub use rotating::{CapSplit, RotatingWindow, UserRotatingState, resolve_rotating, split_cap};
pub use stacking::{OfferContext, OfferOutcome, stack_offers};
pub use valuation::{ValuationParams, ValuationResult, Valuator};
