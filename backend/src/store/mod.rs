//! Cheque store - one JSON file per saved cheque
//!
//! Cheques live in a data directory as `<id>.json`. Everything is loaded on
//! open; ids are sequential and never reused.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::models::{ChequeFields, ChequeStatus, ChequeSummary, StoredCheque};

/// Store for saved cheques.
#[derive(Debug)]
pub struct ChequeStore {
    /// Directory where cheques are stored
    data_dir: PathBuf,
    /// Loaded cheques (id -> cheque), in id order
    cheques: BTreeMap<u64, StoredCheque>,
}

impl ChequeStore {
    /// Open a store in `dir`, loading the cheques already there.
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        let mut store = Self {
            data_dir: PathBuf::from(dir.as_ref()),
            cheques: BTreeMap::new(),
        };
        store.load_all();
        store
    }

    /// Load all cheques from the data directory
    fn load_all(&mut self) {
        if !self.data_dir.exists() {
            return;
        }

        let entries = match fs::read_dir(&self.data_dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(dir = %self.data_dir.display(), error = %e, "Cannot read data directory");
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }

            match fs::read_to_string(&path).map(|content| serde_json::from_str::<StoredCheque>(&content)) {
                Ok(Ok(cheque)) => {
                    self.cheques.insert(cheque.id, cheque);
                }
                Ok(Err(e)) => warn!(path = %path.display(), error = %e, "Skipping unreadable cheque"),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable cheque"),
            }
        }

        debug!(count = self.cheques.len(), dir = %self.data_dir.display(), "Cheques loaded");
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn len(&self) -> usize {
        self.cheques.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cheques.is_empty()
    }

    /// Summaries in id order.
    pub fn list(&self) -> Vec<ChequeSummary> {
        self.cheques.values().map(ChequeSummary::from).collect()
    }

    pub fn get(&self, id: u64) -> Option<&StoredCheque> {
        self.cheques.get(&id)
    }

    /// Persist a new cheque with status `pending`.
    pub fn save(&mut self, fields: ChequeFields) -> StoreResult<&StoredCheque> {
        fields.check_required().map_err(StoreError::MissingField)?;

        let id = self.next_id();
        let cheque = StoredCheque {
            id,
            fields,
            status: ChequeStatus::Pending,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        self.write(&cheque)?;

        info!(id, cheque_number = %cheque.fields.cheque_number, "Cheque stored");
        Ok(&*self.cheques.entry(id).or_insert(cheque))
    }

    /// Change the status of a stored cheque.
    pub fn set_status(&mut self, id: u64, status: ChequeStatus) -> StoreResult<&StoredCheque> {
        let mut updated = self.cheques.get(&id).cloned().ok_or(StoreError::NotFound(id))?;
        updated.status = status;
        self.write(&updated)?;

        info!(id, status = ?status, "Cheque status changed");
        self.cheques.insert(id, updated);
        self.cheques.get(&id).ok_or(StoreError::NotFound(id))
    }

    fn next_id(&self) -> u64 {
        self.cheques.keys().next_back().map_or(1, |last| last + 1)
    }

    fn write(&self, cheque: &StoredCheque) -> StoreResult<()> {
        fs::create_dir_all(&self.data_dir)?;
        let path = self.data_dir.join(format!("{}.json", cheque.id));
        let content = serde_json::to_string_pretty(cheque)?;
        fs::write(&path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(number: &str) -> ChequeFields {
        ChequeFields {
            cheque_number: number.into(),
            amount: "250.000".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_save_assigns_sequential_ids() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ChequeStore::with_dir(dir.path());
        assert!(store.is_empty());

        assert_eq!(store.save(fields("111")).unwrap().id, 1);
        assert_eq!(store.save(fields("222")).unwrap().id, 2);

        let list = store.list();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].cheque_number, "222");
        assert_eq!(list[1].status, ChequeStatus::Pending);
        assert!(dir.path().join("2.json").exists());
    }

    #[test]
    fn test_reload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = ChequeStore::with_dir(dir.path());
            store.save(fields("111")).unwrap();
            store.save(fields("222")).unwrap();
            store.set_status(1, ChequeStatus::Validated).unwrap();
        }
        fs::write(dir.path().join("junk.json"), "not json").unwrap();

        let mut store = ChequeStore::with_dir(dir.path());
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1).map(|c| c.status), Some(ChequeStatus::Validated));
        assert_eq!(store.save(fields("333")).unwrap().id, 3);
    }

    #[test]
    fn test_rejects_blank_required_values() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ChequeStore::with_dir(dir.path());

        let err = store.save(ChequeFields::default()).unwrap_err();
        assert!(matches!(err, StoreError::MissingField("chequeNumber")));
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_status_unknown_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ChequeStore::with_dir(dir.path());
        assert!(matches!(store.set_status(7, ChequeStatus::Rejected), Err(StoreError::NotFound(7))));
    }
}
