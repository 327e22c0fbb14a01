//! Transaction persistence boundary

use std::collections::HashMap;
use std::sync::RwLock;

use cafe_core::Network;

use crate::record::TransactionRecord;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Transaction {id} already exists")]
    Duplicate { id: String },

    #[error("Transaction {id} not found")]
    NotFound { id: String },

    #[error("Transaction store lock poisoned")]
    Poisoned,
}

/// Owner of persisted transaction records
pub trait TransactionStore: Send + Sync {
    fn get(&self, id: &str) -> Option<TransactionRecord>;

    fn add(&self, record: TransactionRecord) -> Result<(), StoreError>;

    /// Replace a stored record, returning what was stored
    fn update(&self, record: TransactionRecord) -> Result<TransactionRecord, StoreError>;

    fn exists(&self, record: &TransactionRecord) -> bool {
        self.get(&record.id).is_some()
    }

    /// Records on a network version, newest first (ties by id)
    fn list(&self, network: Network) -> Vec<TransactionRecord>;
}

/// Sort newest first; records without a creation time sort last
pub fn sort_newest_first(records: &mut [TransactionRecord]) {
    records.sort_by(|a, b| {
        b.tx_created_at
            .unwrap_or(0)
            .cmp(&a.tx_created_at.unwrap_or(0))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// In-process store
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, TransactionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TransactionStore for MemoryStore {
    fn get(&self, id: &str) -> Option<TransactionRecord> {
        self.records.read().ok()?.get(id).cloned()
    }

    fn add(&self, record: TransactionRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        if records.contains_key(&record.id) {
            return Err(StoreError::Duplicate { id: record.id });
        }
        tracing::debug!(id = %record.id, direction = %record.direction, "Added transaction");
        records.insert(record.id.clone(), record);
        Ok(())
    }

    fn update(&self, record: TransactionRecord) -> Result<TransactionRecord, StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        match records.get_mut(&record.id) {
            Some(slot) => {
                *slot = record.clone();
                Ok(record)
            }
            None => Err(StoreError::NotFound { id: record.id }),
        }
    }

    fn list(&self, network: Network) -> Vec<TransactionRecord> {
        let Ok(records) = self.records.read() else {
            return Vec::new();
        };
        let mut listed: Vec<_> = records
            .values()
            .filter(|r| r.network() == network)
            .cloned()
            .collect();
        sort_newest_first(&mut listed);
        listed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::{burn_record, mint_record};

    #[test]
    fn test_add_get_update() {
        let store = MemoryStore::new();
        let record = mint_record();
        assert!(!store.exists(&record));

        store.add(record.clone()).unwrap();
        assert!(store.exists(&record));
        assert_eq!(
            store.add(record.clone()),
            Err(StoreError::Duplicate { id: record.id.clone() })
        );

        let updated = store
            .update(TransactionRecord {
                error: true,
                ..record.clone()
            })
            .unwrap();
        assert!(updated.error);
        assert!(store.get(&record.id).unwrap().error);
    }

    #[test]
    fn test_update_unknown() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.update(mint_record()),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_list_filters_and_orders() {
        let store = MemoryStore::new();
        let older = TransactionRecord {
            id: "b".into(),
            tx_created_at: Some(100),
            ..mint_record()
        };
        let newer = TransactionRecord {
            id: "c".into(),
            tx_created_at: Some(200),
            ..burn_record()
        };
        let tie = TransactionRecord {
            id: "a".into(),
            tx_created_at: Some(100),
            ..mint_record()
        };
        let mainnet = TransactionRecord {
            id: "d".into(),
            source_network_version: "mainnet".into(),
            ..mint_record()
        };
        for r in [older, newer, tie, mainnet] {
            store.add(r).unwrap();
        }

        let ids: Vec<_> = store
            .list(Network::Testnet)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, ["c", "a", "b"]);
        assert_eq!(store.list(Network::Mainnet).len(), 1);
        assert_eq!(store.len(), 4);
    }
}
