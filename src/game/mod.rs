//! Game lifecycle
//!
//! Games are created pending and finalized exactly once. Finalization is the
//! single operation that moves ratings and writes the ledger.

pub mod lifecycle;
pub mod locks;
pub mod store;

pub use lifecycle::GameLifecycle;
pub use locks::KeyedLocks;
pub use store::{GameResult, GameStorage, InMemoryGameStorage};
