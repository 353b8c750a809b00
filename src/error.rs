//! Domain-specific errors for the account ledger.
//!
//! Contains error variants for common failure cases like:
//! - Account-related errors (unknown account, insufficient funds)
//! - Input validation errors (invalid amount, kind or holder name)
//! - Persistence errors (I/O failures, a corrupt data file)

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid amount")]
    InvalidAmount,

    #[error("invalid account kind '{0}', expected savings or current")]
    InvalidKind(String),

    #[error("holder name must not be empty")]
    EmptyHolderName,

    #[error("account {0} not found")]
    UnknownAccount(u32),

    #[error("account {id} has insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { id: u32, balance: u64, requested: u64 },

    #[error("no account numbers left to allocate")]
    IdExhausted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt data file: {0}")]
    CorruptStore(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        Self::CorruptStore(reason.into())
    }
}
