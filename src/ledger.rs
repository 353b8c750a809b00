use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::persistence;
use crate::stores::{AccountKind, AccountView, AccountsStore};
use crate::{Error, Result};

/// Result of a mutation that was applied in memory.
///
/// The in-memory change is authoritative even when the follow-up save
/// failed; `save_error` then carries the reason durability is not guaranteed.
#[derive(Debug)]
pub struct Applied<T> {
    pub value: T,
    pub save_error: Option<Error>,
}

impl<T> Applied<T> {
    pub fn is_durable(&self) -> bool {
        self.save_error.is_none()
    }
}

/// The account store bound to its data file.
///
/// Every successful `open`, `deposit` and `withdraw` is followed by a save,
/// so a crash loses at most the operation in flight.
#[derive(Debug)]
pub struct Ledger {
    store: AccountsStore,
    path: PathBuf,
}

impl Ledger {
    pub fn new(store: AccountsStore, path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            path: path.into(),
        }
    }

    /// Loads the ledger from `path`; a missing file gives an empty ledger.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let store = persistence::load(&path)?;
        Ok(Self::new(store, path))
    }

    pub fn open(
        &mut self,
        holder_name: &str,
        address: &str,
        kind: &str,
        initial_deposit: i64,
    ) -> Result<Applied<u32>> {
        let kind = kind
            .parse::<AccountKind>()
            .inspect_err(|err| warn!(%err, "open rejected"))?;
        let id = self
            .store
            .open(holder_name, address, kind, initial_deposit)
            .inspect_err(|err| warn!(%err, "open rejected"))?;
        info!(id, %kind, balance = initial_deposit, "account opened");
        Ok(self.commit(id))
    }

    pub fn deposit(&mut self, id: u32, amount: i64) -> Result<Applied<u64>> {
        let balance = self
            .store
            .deposit(id, amount)
            .inspect_err(|err| warn!(id, amount, %err, "deposit rejected"))?;
        debug!(id, amount, balance, "deposit");
        Ok(self.commit(balance))
    }

    pub fn withdraw(&mut self, id: u32, amount: i64) -> Result<Applied<u64>> {
        let balance = self
            .store
            .withdraw(id, amount)
            .inspect_err(|err| warn!(id, amount, %err, "withdrawal rejected"))?;
        debug!(id, amount, balance, "withdrawal");
        Ok(self.commit(balance))
    }

    pub fn inspect(&self, id: u32) -> Result<AccountView<'_>> {
        self.store.inspect(id)
    }

    /// Flushes the store to the data file.
    pub fn save(&self) -> Result<()> {
        persistence::save(&self.store, &self.path)
    }

    pub fn store(&self) -> &AccountsStore {
        &self.store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn commit<T>(&self, value: T) -> Applied<T> {
        Applied {
            value,
            save_error: self.save().err(),
        }
    }
}
