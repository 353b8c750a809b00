//! Storage layer for the ledger. Provides storage for:
//! - Account records and balances ([`AccountsStore`])
//! - Account number allocation
//!
//! Current implementation is optimized for synchronous, direct memory
//! access. Durability is handled by [`crate::persistence`].

mod accounts;

pub use accounts::{
    Account, AccountKind, AccountView, AccountsStore, ID_SPACE, MAX_ACCOUNT_ID, MIN_ACCOUNT_ID,
};
