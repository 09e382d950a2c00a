use crate::error::{BlockchainError, Result};
use crate::utils::{encode_hash, Hash, HASH_LEN};
use log::info;
use sled::Db;
use std::path::{Path, PathBuf};

/// The only key this store ever writes: the hash of the chain head.
const HEAD_KEY: &str = "lh";

/// Durable pointer to the chain head, kept in a sled database.
pub struct HeadStore {
    db: Db,
    db_path: PathBuf,
}

impl HeadStore {
    pub fn open(path: &Path) -> Result<HeadStore> {
        let db = sled::open(path)
            .map_err(|e| BlockchainError::Database(format!("Failed to open database: {e}")))?;
        Ok(HeadStore {
            db,
            db_path: path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        self.db_path.as_path()
    }

    pub fn get_head(&self) -> Result<Option<Hash>> {
        let data = self
            .db
            .get(HEAD_KEY)
            .map_err(|e| BlockchainError::Database(format!("Failed to get head hash: {e}")))?;

        match data {
            Some(bytes) => {
                if bytes.len() != HASH_LEN {
                    return Err(BlockchainError::Database(format!(
                        "Stored head hash has {} bytes, expected {HASH_LEN}",
                        bytes.len()
                    )));
                }
                let mut hash = [0u8; HASH_LEN];
                hash.copy_from_slice(bytes.as_ref());
                Ok(Some(hash))
            }
            None => Ok(None),
        }
    }

    pub fn set_head(&self, hash: &Hash) -> Result<()> {
        self.db
            .insert(HEAD_KEY, hash.as_slice())
            .map_err(|e| BlockchainError::Database(format!("Failed to set head hash: {e}")))?;
        self.db
            .flush()
            .map_err(|e| BlockchainError::Database(format!("Failed to flush head hash: {e}")))?;
        Ok(())
    }

    /// Reads the stored head, or writes `initial` when none exists yet.
    pub fn get_or_init_head(&self, initial: &Hash) -> Result<Hash> {
        if let Some(head) = self.get_head()? {
            info!("Existing head found: {}", encode_hash(&head));
            return Ok(head);
        }
        info!("No existing head found, initializing to {}", encode_hash(initial));
        self.set_head(initial)?;
        Ok(*initial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_absent_head_is_none() {
        let temp_dir = tempdir().unwrap();
        let store = HeadStore::open(&temp_dir.path().join("head")).unwrap();
        assert_eq!(store.get_head().unwrap(), None);
    }

    #[test]
    fn test_init_then_read_back() {
        let temp_dir = tempdir().unwrap();
        let store = HeadStore::open(&temp_dir.path().join("head")).unwrap();

        let initial = [1u8; HASH_LEN];
        assert_eq!(store.get_or_init_head(&initial).unwrap(), initial);

        // An existing head wins over the initial value
        let other = [2u8; HASH_LEN];
        assert_eq!(store.get_or_init_head(&other).unwrap(), initial);
    }

    #[test]
    fn test_head_survives_reopen() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("head");
        let head = [0xabu8; HASH_LEN];
        {
            let store = HeadStore::open(&path).unwrap();
            store.set_head(&head).unwrap();
        }
        let reopened = HeadStore::open(&path).unwrap();
        assert_eq!(reopened.get_head().unwrap(), Some(head));
        assert_eq!(reopened.get_db_path(), path.as_path());
    }
}
