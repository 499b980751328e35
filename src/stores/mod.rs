//! In-memory domain stores
//!
//! Seeded with the prototype's fixed records. Mutated only through
//! `AppState::apply`.

pub mod contacts;
pub mod goals;
pub mod ledger;
pub mod marketplace;
pub mod vault;

pub use contacts::ContactBook;
pub use goals::GoalBoard;
pub use ledger::Ledger;
pub use marketplace::{Marketplace, MarketplaceQuery};
pub use vault::DocumentVault;
