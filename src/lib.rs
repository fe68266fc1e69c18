pub mod client;
pub mod poll;
pub mod prelude;
pub mod protocol;
pub mod serve;

pub use stakeledger_core as core;
pub use stakeledger_ledger as ledger;
