use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

pub const MIN_ACCOUNT_ID: u32 = 100_000;
pub const MAX_ACCOUNT_ID: u32 = 999_999;
/// Number of distinct six-digit account numbers.
pub const ID_SPACE: usize = (MAX_ACCOUNT_ID - MIN_ACCOUNT_ID + 1) as usize;

/// Random draws tried before falling back to a scan for a free number.
const RANDOM_ATTEMPTS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountKind {
    #[serde(rename = "s")]
    Savings,
    #[serde(rename = "c")]
    Current,
}

impl AccountKind {
    pub fn label(self) -> &'static str {
        match self {
            AccountKind::Savings => "Savings",
            AccountKind::Current => "Current",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AccountKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "savings" => Ok(AccountKind::Savings),
            "c" | "current" => Ok(AccountKind::Current),
            _ => Err(Error::InvalidKind(s.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: u32,
    pub holder_name: String,
    pub address: String,
    pub kind: AccountKind,
    pub balance: u64,
}

impl Account {
    pub fn view(&self) -> AccountView<'_> {
        AccountView {
            holder_name: &self.holder_name,
            address: &self.address,
            kind: self.kind,
            balance: self.balance,
        }
    }
}

/// Read-only snapshot of a single account, as returned by [`AccountsStore::inspect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountView<'a> {
    pub holder_name: &'a str,
    pub address: &'a str,
    pub kind: AccountKind,
    pub balance: u64,
}

/// The authoritative in-memory collection of accounts.
///
/// Owns the account number allocator; its random source is seeded once when
/// the store is created and reused for every allocation.
pub struct AccountsStore {
    accounts: HashMap<u32, Account>,
    rng: StdRng,
}

impl Default for AccountsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AccountsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountsStore")
            .field("accounts", &self.accounts)
            .finish_non_exhaustive()
    }
}

/// Two stores are equal when they hold the same accounts; allocator state is ignored.
impl PartialEq for AccountsStore {
    fn eq(&self, other: &Self) -> bool {
        self.accounts == other.accounts
    }
}

impl AccountsStore {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Creates an empty store with a deterministic allocator.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            accounts: HashMap::new(),
            rng,
        }
    }

    /// Rebuilds a store from previously persisted accounts.
    /// Returns [`Error::CorruptStore`] if any record breaks a store invariant.
    pub fn restore(accounts: impl IntoIterator<Item = Account>) -> Result<Self> {
        let mut store = Self::new();
        for account in accounts {
            if !(MIN_ACCOUNT_ID..=MAX_ACCOUNT_ID).contains(&account.id) {
                return Err(Error::corrupt(format!(
                    "account number {} out of range",
                    account.id
                )));
            }
            if account.holder_name.trim().is_empty() {
                return Err(Error::corrupt(format!(
                    "account {} has an empty holder name",
                    account.id
                )));
            }
            if store.accounts.contains_key(&account.id) {
                return Err(Error::corrupt(format!(
                    "duplicate account number {}",
                    account.id
                )));
            }
            store.accounts.insert(account.id, account);
        }
        Ok(store)
    }

    /// Opens a new account and returns its freshly allocated number.
    pub fn open(
        &mut self,
        holder_name: &str,
        address: &str,
        kind: AccountKind,
        initial_deposit: i64,
    ) -> Result<u32> {
        if holder_name.trim().is_empty() {
            return Err(Error::EmptyHolderName);
        }
        let balance = u64::try_from(initial_deposit).map_err(|_| Error::InvalidAmount)?;
        let id = self.allocate_id()?;
        self.accounts.insert(
            id,
            Account {
                id,
                holder_name: holder_name.to_string(),
                address: address.to_string(),
                kind,
                balance,
            },
        );
        Ok(id)
    }

    /// Credits `amount` to the account and returns the new balance.
    pub fn deposit(&mut self, id: u32, amount: i64) -> Result<u64> {
        let account = self.get_mut(id)?;
        let amount = positive(amount)?;
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(Error::InvalidAmount)?;
        Ok(account.balance)
    }

    /// Debits `amount` from the account and returns the new balance.
    /// The balance is left untouched if it does not cover the amount.
    pub fn withdraw(&mut self, id: u32, amount: i64) -> Result<u64> {
        let account = self.get_mut(id)?;
        let amount = positive(amount)?;
        if amount > account.balance {
            return Err(Error::InsufficientFunds {
                id,
                balance: account.balance,
                requested: amount,
            });
        }
        account.balance -= amount;
        Ok(account.balance)
    }

    pub fn inspect(&self, id: u32) -> Result<AccountView<'_>> {
        self.accounts
            .get(&id)
            .map(Account::view)
            .ok_or(Error::UnknownAccount(id))
    }

    /// Gets an account entry, or returns an error if it doesn't exist.
    fn get_mut(&mut self, id: u32) -> Result<&mut Account> {
        self.accounts.get_mut(&id).ok_or(Error::UnknownAccount(id))
    }

    /// Draws six-digit numbers until one is free. A nearly full store falls
    /// back to scanning forward from a random start so allocation always ends.
    fn allocate_id(&mut self) -> Result<u32> {
        if self.accounts.len() >= ID_SPACE {
            return Err(Error::IdExhausted);
        }
        for _ in 0..RANDOM_ATTEMPTS {
            let candidate = self.rng.gen_range(MIN_ACCOUNT_ID..=MAX_ACCOUNT_ID);
            if !self.accounts.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
        let start = self.rng.gen_range(MIN_ACCOUNT_ID..=MAX_ACCOUNT_ID);
        (start..=MAX_ACCOUNT_ID)
            .chain(MIN_ACCOUNT_ID..start)
            .find(|id| !self.accounts.contains_key(id))
            .ok_or(Error::IdExhausted)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Iterates accounts in ascending account number order.
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        let mut accounts: Vec<_> = self.accounts.values().collect();
        accounts.sort_by_key(|account| account.id);
        accounts.into_iter()
    }
}

fn positive(amount: i64) -> Result<u64> {
    match u64::try_from(amount) {
        Ok(amount) if amount > 0 => Ok(amount),
        _ => Err(Error::InvalidAmount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_alice() -> (AccountsStore, u32) {
        let mut store = AccountsStore::with_seed(7);
        let id = store
            .open("Alice", "1 Main St", AccountKind::Savings, 500)
            .unwrap();
        (store, id)
    }

    fn account(id: u32) -> Account {
        Account {
            id,
            holder_name: "Holder".to_string(),
            address: String::new(),
            kind: AccountKind::Current,
            balance: 0,
        }
    }

    #[test]
    fn test_open_sets_initial_balance() {
        let (store, id) = store_with_alice();
        assert!((MIN_ACCOUNT_ID..=MAX_ACCOUNT_ID).contains(&id));
        let view = store.inspect(id).unwrap();
        assert_eq!(view.holder_name, "Alice");
        assert_eq!(view.address, "1 Main St");
        assert_eq!(view.kind, AccountKind::Savings);
        assert_eq!(view.balance, 500);
    }

    #[test]
    fn test_open_with_zero_deposit_and_empty_address() {
        let mut store = AccountsStore::with_seed(1);
        let id = store.open("Bob", "", AccountKind::Current, 0).unwrap();
        assert_eq!(store.inspect(id).unwrap().balance, 0);
        assert_eq!(store.inspect(id).unwrap().address, "");
    }

    #[test]
    fn test_open_rejects_negative_deposit() {
        let mut store = AccountsStore::with_seed(1);
        let result = store.open("Bob", "", AccountKind::Current, -1);
        assert!(matches!(result, Err(Error::InvalidAmount)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_open_rejects_empty_holder() {
        let mut store = AccountsStore::with_seed(1);
        let result = store.open("   ", "", AccountKind::Current, 10);
        assert!(matches!(result, Err(Error::EmptyHolderName)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_successive_opens_return_distinct_ids() {
        let mut store = AccountsStore::new();
        let mut ids = std::collections::HashSet::new();
        for i in 0..1000 {
            let id = store
                .open(&format!("Holder {i}"), "", AccountKind::Savings, i)
                .unwrap();
            assert!(ids.insert(id), "id {id} issued twice");
        }
        assert_eq!(store.len(), 1000);
    }

    #[test]
    fn test_deposit_and_withdraw_track_balance() {
        let (mut store, id) = store_with_alice();
        assert_eq!(store.deposit(id, 250).unwrap(), 750);
        assert_eq!(store.withdraw(id, 100).unwrap(), 650);
        assert_eq!(store.withdraw(id, 650).unwrap(), 0);
        assert_eq!(store.inspect(id).unwrap().balance, 0);
    }

    #[test]
    fn test_sequence_sums_exactly() {
        let (mut store, id) = store_with_alice();
        let deposits = [1, 20, 300, 4000];
        let withdrawals = [5, 15, 250];
        for (d, w) in deposits.iter().zip(withdrawals.iter()) {
            assert!(store.deposit(id, *d).is_ok());
            assert!(store.withdraw(id, *w).is_ok());
        }
        store.deposit(id, 4000).unwrap();
        let expected = 500 + 1 + 20 + 300 + 4000 - 5 - 15 - 250;
        assert_eq!(store.inspect(id).unwrap().balance, expected as u64);
    }

    #[test]
    fn test_withdraw_insufficient_funds_leaves_balance() {
        let (mut store, id) = store_with_alice();
        let result = store.withdraw(id, 501);
        assert!(matches!(
            result,
            Err(Error::InsufficientFunds {
                balance: 500,
                requested: 501,
                ..
            })
        ));
        assert_eq!(store.inspect(id).unwrap().balance, 500);
    }

    #[test]
    fn test_non_positive_amounts_rejected() {
        let (mut store, id) = store_with_alice();
        for amount in [0, -1, i64::MIN] {
            assert!(matches!(store.deposit(id, amount), Err(Error::InvalidAmount)));
            assert!(matches!(store.withdraw(id, amount), Err(Error::InvalidAmount)));
        }
        assert_eq!(store.inspect(id).unwrap().balance, 500);
    }

    #[test]
    fn test_deposit_overflow_rejected() {
        let (mut store, id) = store_with_alice();
        store.get_mut(id).unwrap().balance = u64::MAX - 1;
        assert!(matches!(store.deposit(id, 2), Err(Error::InvalidAmount)));
        assert_eq!(store.inspect(id).unwrap().balance, u64::MAX - 1);
    }

    #[test]
    fn test_unknown_account() {
        let (mut store, _) = store_with_alice();
        assert!(matches!(
            store.inspect(999_999_999),
            Err(Error::UnknownAccount(999_999_999))
        ));
        assert!(matches!(store.deposit(42, 10), Err(Error::UnknownAccount(42))));
        assert!(matches!(store.withdraw(42, 10), Err(Error::UnknownAccount(42))));
    }

    #[test]
    fn test_operations_touch_only_named_account() {
        let (mut store, alice) = store_with_alice();
        let bob = store.open("Bob", "2 Side St", AccountKind::Current, 80).unwrap();
        store.deposit(alice, 20).unwrap();
        store.withdraw(alice, 300).unwrap();
        assert_eq!(store.inspect(bob).unwrap().balance, 80);
        assert_eq!(store.inspect(alice).unwrap().balance, 220);
    }

    #[test]
    fn test_same_seed_same_ids() {
        let mut a = AccountsStore::with_seed(99);
        let mut b = AccountsStore::with_seed(99);
        for _ in 0..10 {
            assert_eq!(
                a.open("A", "", AccountKind::Savings, 0).unwrap(),
                b.open("A", "", AccountKind::Savings, 0).unwrap()
            );
        }
    }

    #[test]
    fn test_allocation_finds_last_free_id() {
        let mut store = AccountsStore::with_seed(3);
        let free = 543_210;
        for id in MIN_ACCOUNT_ID..=MAX_ACCOUNT_ID {
            if id != free {
                store.accounts.insert(id, account(id));
            }
        }
        assert_eq!(store.open("Last", "", AccountKind::Savings, 0).unwrap(), free);
        assert!(matches!(
            store.open("Overflow", "", AccountKind::Savings, 0),
            Err(Error::IdExhausted)
        ));
        assert_eq!(store.len(), ID_SPACE);
    }

    #[test]
    fn test_restore_rejects_duplicates_and_out_of_range() {
        let dup = AccountsStore::restore(vec![account(123_456), account(123_456)]);
        assert!(matches!(dup, Err(Error::CorruptStore(_))));

        let low = AccountsStore::restore(vec![account(99_999)]);
        assert!(matches!(low, Err(Error::CorruptStore(_))));

        let mut nameless = account(123_456);
        nameless.holder_name.clear();
        assert!(matches!(
            AccountsStore::restore(vec![nameless]),
            Err(Error::CorruptStore(_))
        ));
    }

    #[test]
    fn test_restored_store_allocates_fresh_ids() {
        let mut store = AccountsStore::restore(vec![account(100_000), account(999_999)]).unwrap();
        let id = store.open("New", "", AccountKind::Savings, 1).unwrap();
        assert!(id != 100_000 && id != 999_999);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_iter_sorted_by_id() {
        let store =
            AccountsStore::restore(vec![account(500_000), account(100_001), account(700_000)])
                .unwrap();
        let ids: Vec<_> = store.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![100_001, 500_000, 700_000]);
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("s".parse::<AccountKind>().unwrap(), AccountKind::Savings);
        assert_eq!(" Current ".parse::<AccountKind>().unwrap(), AccountKind::Current);
        assert_eq!("SAVINGS".parse::<AccountKind>().unwrap(), AccountKind::Savings);
        assert!(matches!("x".parse::<AccountKind>(), Err(Error::InvalidKind(k)) if k == "x"));
    }
}
