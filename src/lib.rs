mod dto;
mod error;
pub mod ledger;
pub mod persistence;
pub mod shell;
mod stores;

pub use dto::AccountRecord;
pub use error::{Error, Result};
pub use ledger::{Applied, Ledger};
pub use shell::run;
pub use stores::{
    Account, AccountKind, AccountView, AccountsStore, ID_SPACE, MAX_ACCOUNT_ID, MIN_ACCOUNT_ID,
};
