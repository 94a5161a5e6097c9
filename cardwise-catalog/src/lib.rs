//! cardwise-catalog: card/offer catalogs, wallet state, and purchase-statement
//! replay around the cardwise-core engine.

pub mod catalog;
pub mod error;
pub mod statement;
pub mod wallet;

pub use catalog::Catalog;
pub use error::CatalogError;
pub use statement::{Purchase, PurchaseBest, StatementReport, parse_purchases, parse_purchases_csv, replay_statement};
pub use wallet::WalletState;
