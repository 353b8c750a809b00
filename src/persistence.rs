//! Durable storage of the account store in a single data file.
//!
//! File layout (UTF-8 text):
//! - a header line: `bank-ledger<TAB>v1<TAB><account count><TAB><crc32 of body>`
//! - one tab-separated record per account: id, holder name, address,
//!   kind (`s`/`c`), balance
//!
//! Records are written with the `csv` crate, so holder names and addresses
//! containing tabs, quotes or line breaks are quoted and read back exactly.
//! Saves go to a sibling temporary file which is synced and then renamed
//! over the data file, so readers only ever see a complete file.

use std::env;
use std::ffi::{OsStr, OsString};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::dto::AccountRecord;
use crate::stores::{Account, AccountsStore, ID_SPACE};
use crate::{Error, Result};

pub const DEFAULT_DATA_FILE: &str = "accounts.dat";
pub const DATA_FILE_ENV: &str = "BANK_DATA_FILE";

const MAGIC: &str = "bank-ledger";
const VERSION: &str = "v1";

/// Resolves the data file path from `BANK_DATA_FILE`, falling back to
/// `accounts.dat` in the working directory.
pub fn data_file_path() -> PathBuf {
    resolve_data_file(env::var_os(DATA_FILE_ENV))
}

fn resolve_data_file(value: Option<OsString>) -> PathBuf {
    value
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE))
}

/// Writes the whole store to `path` atomically.
///
/// # Errors
/// Returns [`Error::Io`] if the temporary file cannot be written, synced or
/// renamed. The file at `path` is left as it was in that case.
pub fn save<P: AsRef<Path>>(store: &AccountsStore, path: P) -> Result<()> {
    let path = path.as_ref();
    let tmp_path = temp_path(path);

    let result = write_synced(store, &tmp_path)
        .and_then(|()| fs::rename(&tmp_path, path).map_err(Error::from));
    if let Err(err) = &result {
        warn!(path = %path.display(), error = %err, "save failed");
        // Best effort; the canonical file is untouched either way.
        let _ = fs::remove_file(&tmp_path);
        return result;
    }

    info!(path = %path.display(), accounts = store.len(), "store saved");
    Ok(())
}

fn write_synced(store: &AccountsStore, tmp_path: &Path) -> Result<()> {
    let mut file = File::create(tmp_path)?;
    encode(store, &mut file)?;
    file.sync_all()?;
    Ok(())
}

/// Reads the store from `path`.
///
/// A missing file yields an empty store.
///
/// # Errors
/// * [`Error::Io`] if the file exists but cannot be read
/// * [`Error::CorruptStore`] if the file is truncated, malformed or fails a
///   consistency check
pub fn load<P: AsRef<Path>>(path: P) -> Result<AccountsStore> {
    let path = path.as_ref();
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no data file, starting empty");
            return Ok(AccountsStore::new());
        }
        Err(err) => return Err(err.into()),
    };

    let store = decode(&data)?;
    info!(path = %path.display(), accounts = store.len(), "store loaded");
    Ok(store)
}

/// Serializes the store in the data file format.
pub fn encode<W: Write>(store: &AccountsStore, mut writer: W) -> Result<()> {
    let mut body = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(Vec::new());
    for account in store.iter() {
        body.serialize(AccountRecord::from(account))
            .map_err(io::Error::from)?;
    }
    let body = body
        .into_inner()
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;

    writeln!(
        writer,
        "{MAGIC}\t{VERSION}\t{}\t{:08x}",
        store.len(),
        crc32fast::hash(&body)
    )?;
    writer.write_all(&body)?;
    writer.flush()?;
    Ok(())
}

struct Header {
    count: usize,
    checksum: u32,
}

fn parse_header(line: &str) -> Result<Header> {
    let fields: Vec<&str> = line.trim_end_matches('\r').split('\t').collect();
    let [magic, version, count, checksum] = fields.as_slice() else {
        return Err(Error::corrupt("malformed header"));
    };
    if *magic != MAGIC {
        return Err(Error::corrupt("not a ledger data file"));
    }
    if *version != VERSION {
        return Err(Error::corrupt(format!("unsupported format version {version}")));
    }
    let count: usize = count
        .parse()
        .map_err(|_| Error::corrupt(format!("invalid account count '{count}'")))?;
    if count > ID_SPACE {
        return Err(Error::corrupt(format!("account count {count} exceeds capacity")));
    }
    let checksum = u32::from_str_radix(checksum, 16)
        .map_err(|_| Error::corrupt(format!("invalid checksum '{checksum}'")))?;
    Ok(Header { count, checksum })
}

/// Parses bytes in the data file format back into a store.
pub fn decode(data: &[u8]) -> Result<AccountsStore> {
    let newline = data
        .iter()
        .position(|byte| *byte == b'\n')
        .ok_or_else(|| Error::corrupt("missing header"))?;
    let header = std::str::from_utf8(&data[..newline])
        .map_err(|_| Error::corrupt("header is not valid UTF-8"))?;
    let header = parse_header(header)?;

    let body = &data[newline + 1..];
    if crc32fast::hash(body) != header.checksum {
        return Err(Error::corrupt("checksum mismatch, file is truncated or damaged"));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_reader(body);
    let mut accounts = Vec::with_capacity(header.count);
    for (index, record) in reader.deserialize::<AccountRecord>().enumerate() {
        let record =
            record.map_err(|err| Error::corrupt(format!("record {}: {err}", index + 1)))?;
        accounts.push(Account::from(record));
    }
    if accounts.len() != header.count {
        return Err(Error::corrupt(format!(
            "header declares {} accounts but {} were found",
            header.count,
            accounts.len()
        )));
    }
    debug!(accounts = accounts.len(), "decoded data file");

    AccountsStore::restore(accounts)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .unwrap_or_else(|| OsStr::new(DEFAULT_DATA_FILE))
        .to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
