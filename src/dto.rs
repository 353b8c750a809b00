use serde::{Deserialize, Serialize};

use crate::stores::{Account, AccountKind};

/// One account as it is laid out in the data file, in column order.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AccountRecord {
    pub id: u32,
    pub holder_name: String,
    pub address: String,
    pub kind: AccountKind,
    pub balance: u64,
}

impl From<&Account> for AccountRecord {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            holder_name: account.holder_name.clone(),
            address: account.address.clone(),
            kind: account.kind,
            balance: account.balance,
        }
    }
}

impl From<AccountRecord> for Account {
    fn from(record: AccountRecord) -> Self {
        Self {
            id: record.id,
            holder_name: record.holder_name,
            address: record.address,
            kind: record.kind,
            balance: record.balance,
        }
    }
}
