//! Stake pool registration and delegation ledger.
//!
//! The ledger is made of three stores ([`AccountLedger`],
//! [`StakePoolRegistry`] and [`DelegationTracker`]) plus the global pots. The
//! [`TransactionApplier`] is the only way transactions reach them and the
//! [`EpochScheduler`] finalizes whatever is deferred to an epoch boundary.

mod accounts;
mod apply;
mod delegation;
mod epoch;
mod facade;
mod fees;
mod pools;
mod state;

pub use accounts::*;
pub use apply::*;
pub use delegation::*;
pub use epoch::*;
pub use facade::*;
pub use fees::*;
pub use pools::*;
pub use state::*;
