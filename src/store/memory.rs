use super::types::*;
use crate::backend::types::ResultRecord;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Results are keyed by `(identity, method)`.
type ResultKey = (String, String);

#[derive(Default)]
struct Namespace {
    results: DashMap<ResultKey, ResultRecord>,
    references: DashMap<String, serde_json::Value>,
}

/// In-memory result store.
///
/// Structure: `namespace -> { (identity, method) -> record, reference key -> data }`.
#[derive(Default)]
pub struct MemoryResultStore {
    namespaces: DashMap<String, Namespace>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds reference data, creating the namespace if needed.
    pub fn insert_reference(
        &self,
        namespace: &str,
        key: &str,
        data: serde_json::Value,
    ) -> Result<(), StoreError> {
        validate_namespace(namespace)?;
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .references
            .insert(key.to_string(), data);
        Ok(())
    }

    /// Bulk-loads reference data shaped `{namespace: {key: data}}`.
    ///
    /// Returns the number of references loaded.
    pub fn load_references(&self, document: &serde_json::Value) -> Result<usize, StoreError> {
        let namespaces = document.as_object().ok_or_else(|| {
            StoreError::Malformed("reference document must be an object".to_string())
        })?;

        let mut loaded = 0;
        for (namespace, references) in namespaces {
            let references = references.as_object().ok_or_else(|| {
                StoreError::Malformed(format!("references of {} must be an object", namespace))
            })?;
            for (key, data) in references {
                self.insert_reference(namespace, key, data.clone())?;
                loaded += 1;
            }
        }

        tracing::info!(
            "Loaded {} reference(s) into {} namespace(s)",
            loaded,
            namespaces.len()
        );
        Ok(loaded)
    }

    pub fn get_result(&self, namespace: &str, identity: &str, method: &str) -> Option<ResultRecord> {
        let ns = self.namespaces.get(namespace)?;
        let record = ns
            .results
            .get(&(identity.to_string(), method.to_string()))?
            .clone();
        Some(record)
    }

    pub fn result_count(&self, namespace: &str) -> usize {
        self.namespaces
            .get(namespace)
            .map(|ns| ns.results.len())
            .unwrap_or(0)
    }

    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains_key(namespace)
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn select_namespace(&self, name: &str) -> Result<(), StoreError> {
        validate_namespace(name)?;
        self.namespaces.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn add_result(&self, namespace: &str, record: ResultRecord) -> Result<bool, StoreError> {
        if record.identity.is_empty() || record.method.is_empty() {
            return Err(StoreError::Malformed(format!(
                "record for program {} is missing its identity or method",
                record.program
            )));
        }

        let ns = self
            .namespaces
            .get(namespace)
            .ok_or_else(|| StoreError::UnknownNamespace(namespace.to_string()))?;

        let key = (record.identity.clone(), record.method.clone());
        let inserted = match ns.results.entry(key) {
            Entry::Occupied(existing) => {
                tracing::debug!(
                    "Result ({}, {}) already stored in {}",
                    existing.key().0,
                    existing.key().1,
                    namespace
                );
                Ok(false)
            }
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(true)
            }
        };
        inserted
    }

    async fn reference(
        &self,
        namespace: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>, StoreError> {
        let ns = self
            .namespaces
            .get(namespace)
            .ok_or_else(|| StoreError::UnknownNamespace(namespace.to_string()))?;
        Ok(ns.references.get(key).map(|data| data.value().clone()))
    }
}
