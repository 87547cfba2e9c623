/// Typed collections over the key-value store.
///
/// A collection is a JSON array stored under a single key. Reads are
/// forgiving (absent or corrupt data reads as empty) and writes replace the
/// whole array. Read-modify-write cycles are guarded by the key's revision so
/// a concurrent writer forces a retry instead of being silently overwritten.
/// Array entries that fail to decode are hidden from callers but written back
/// untouched by every read-modify-write.

use crate::error::{AppError, Result};
use crate::storage::{KeyValueStore, WriteBatch};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// How many times a conflicting read-modify-write is retried.
pub const MAX_RETRIES: usize = 3;

/// A record stored in a collection.
pub trait Record: Serialize + DeserializeOwned + Clone {
    type Id: PartialEq + Copy + fmt::Display;

    fn id(&self) -> Self::Id;
}

pub struct Collection<T> {
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Collection {
            store: Arc::clone(&self.store),
            key: self.key,
            _marker: PhantomData,
        }
    }
}

impl<T: Record> Collection<T> {
    pub fn new(store: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Collection {
            store,
            key,
            _marker: PhantomData,
        }
    }

    /// Load every record. Missing or malformed data yields an empty list.
    pub fn load(&self) -> Result<Vec<T>> {
        let raw = self.store.get(self.key)?;
        Ok(decode(self.key, raw.as_deref()).0)
    }

    /// Load every record together with the revision it was read at.
    pub fn load_versioned(&self) -> Result<(Vec<T>, u64)> {
        // Revision first: a write landing in between makes the later commit conflict.
        let revision = self.store.revision(self.key)?;
        let records = self.load()?;
        Ok((records, revision))
    }

    /// Overwrite the collection. Unreadable entries are dropped too.
    pub fn save(&self, records: &[T]) -> Result<()> {
        let mut batch = WriteBatch::new();
        self.stage(&mut batch, records, &[])?;
        self.store.commit(batch)
    }

    /// Serialize `records` followed by `unreadable` into `batch` without committing.
    fn stage(&self, batch: &mut WriteBatch, records: &[T], unreadable: &[Value]) -> Result<()> {
        let json = if unreadable.is_empty() {
            serde_json::to_string(records)?
        } else {
            let mut values = records
                .iter()
                .map(serde_json::to_value)
                .collect::<serde_json::Result<Vec<Value>>>()?;
            values.extend_from_slice(unreadable);
            serde_json::to_string(&values)?
        };
        batch.set(self.key, json);
        Ok(())
    }

    pub fn find(&self, id: T::Id) -> Result<Option<T>> {
        Ok(self.load()?.into_iter().find(|r| r.id() == id))
    }

    pub fn find_by(&self, pred: impl Fn(&T) -> bool) -> Result<Option<T>> {
        Ok(self.load()?.into_iter().find(|r| pred(r)))
    }

    pub fn filter(&self, pred: impl Fn(&T) -> bool) -> Result<Vec<T>> {
        Ok(self.load()?.into_iter().filter(|r| pred(r)).collect())
    }

    pub fn append(&self, record: T) -> Result<()> {
        self.modify(|records| {
            records.push(record.clone());
            Ok(())
        })
    }

    /// Remove the record with `id`. Returns whether anything was removed.
    pub fn remove(&self, id: T::Id) -> Result<bool> {
        self.modify(|records| {
            let before = records.len();
            records.retain(|r| r.id() != id);
            Ok(records.len() != before)
        })
    }

    /// Keep only records matching `pred`. Returns how many were dropped.
    pub fn retain(&self, pred: impl Fn(&T) -> bool) -> Result<usize> {
        self.modify(|records| {
            let before = records.len();
            records.retain(|r| pred(r));
            Ok(before - records.len())
        })
    }

    /// Mutate the record with `id` in place and return its new state.
    pub fn update(&self, id: T::Id, mut f: impl FnMut(&mut T)) -> Result<Option<T>> {
        self.modify(|records| {
            Ok(records.iter_mut().find(|r| r.id() == id).map(|record| {
                f(record);
                record.clone()
            }))
        })
    }

    /// Revision-guarded read-modify-write of the whole collection.
    ///
    /// `f` may run more than once if another writer gets in first.
    pub fn modify<R>(&self, mut f: impl FnMut(&mut Vec<T>) -> Result<R>) -> Result<R> {
        transact(&self.store, |tx| {
            let mut records = tx.read(self)?;
            let outcome = f(&mut records)?;
            tx.write(self, &records)?;
            Ok(outcome)
        })
    }
}

/// Split a stored array into decodable records and the raw entries that failed.
fn decode<T: DeserializeOwned>(key: &str, raw: Option<&str>) -> (Vec<T>, Vec<Value>) {
    let Some(raw) = raw else {
        return (Vec::new(), Vec::new());
    };

    let values: Vec<Value> = match serde_json::from_str(raw) {
        Ok(values) => values,
        Err(e) => {
            log::warn!("Collection '{}' is not a JSON array, reading as empty: {}", key, e);
            return (Vec::new(), Vec::new());
        }
    };

    let mut records = Vec::with_capacity(values.len());
    let mut unreadable = Vec::new();
    for (index, value) in values.into_iter().enumerate() {
        match <T as serde::Deserialize>::deserialize(&value) {
            Ok(record) => records.push(record),
            Err(e) => {
                log::warn!("Skipping malformed record {} in '{}': {}", index, key, e);
                unreadable.push(value);
            }
        }
    }
    (records, unreadable)
}

/// Reads and staged writes for one atomic multi-collection update.
pub struct Transaction<'a> {
    store: &'a dyn KeyValueStore,
    batch: WriteBatch,
    unreadable: HashMap<&'static str, Vec<Value>>,
}

impl Transaction<'_> {
    /// Read a collection and pin its revision for the commit.
    pub fn read<T: Record>(&mut self, collection: &Collection<T>) -> Result<Vec<T>> {
        let revision = self.store.revision(collection.key)?;
        let raw = self.store.get(collection.key)?;
        self.batch.expect_revision(collection.key, revision);
        let (records, unreadable) = decode(collection.key, raw.as_deref());
        self.unreadable.insert(collection.key, unreadable);
        Ok(records)
    }

    /// Stage `records` for a collection. Entries this transaction read but
    /// could not decode are carried over as they were.
    pub fn write<T: Record>(&mut self, collection: &Collection<T>, records: &[T]) -> Result<()> {
        let unreadable = self
            .unreadable
            .get(collection.key)
            .map(Vec::as_slice)
            .unwrap_or_default();
        collection.stage(&mut self.batch, records, unreadable)
    }

    pub fn write_raw(&mut self, key: &str, value: String) {
        self.batch.set(key, value);
    }

    pub fn remove_raw(&mut self, key: &str) {
        self.batch.remove(key);
    }
}

/// Run `f` against a fresh [`Transaction`] and commit its writes atomically,
/// retrying on revision conflicts.
pub fn transact<R>(
    store: &Arc<dyn KeyValueStore>,
    mut f: impl FnMut(&mut Transaction<'_>) -> Result<R>,
) -> Result<R> {
    let mut attempt = 0;
    loop {
        let mut tx = Transaction {
            store: store.as_ref(),
            batch: WriteBatch::new(),
            unreadable: HashMap::new(),
        };
        let outcome = f(&mut tx)?;

        match store.commit(tx.batch) {
            Ok(()) => return Ok(outcome),
            Err(AppError::Conflict(key)) if attempt < MAX_RETRIES => {
                attempt += 1;
                log::warn!("Concurrent write to '{}', retrying ({}/{})", key, attempt, MAX_RETRIES);
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: u32,
        text: String,
        #[serde(default)]
        pinned: bool,
    }

    impl Record for Note {
        type Id = u32;

        fn id(&self) -> u32 {
            self.id
        }
    }

    fn note(id: u32, text: &str) -> Note {
        Note {
            id,
            text: text.to_string(),
            pinned: false,
        }
    }

    fn notes() -> (Arc<dyn KeyValueStore>, Collection<Note>) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let collection = Collection::new(Arc::clone(&store), "notes");
        (store, collection)
    }

    #[test]
    fn test_absent_key_loads_empty() {
        let (_, notes) = notes();
        assert!(notes.load().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_json_loads_empty() {
        let (store, notes) = notes();
        store.set("notes", "{not json").unwrap();
        assert!(notes.load().unwrap().is_empty());
    }

    #[test]
    fn test_bad_record_is_skipped_and_missing_fields_default() {
        let (store, notes) = notes();
        store
            .set("notes", r#"[{"id":1,"text":"ok"},{"id":"two"},{"id":3,"text":"x","pinned":true}]"#)
            .unwrap();

        let loaded = notes.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(!loaded[0].pinned);
        assert!(loaded[1].pinned);
    }

    #[test]
    fn test_bad_record_survives_modify() {
        let (store, notes) = notes();
        store
            .set("notes", r#"[{"id":1,"text":"ok"},{"id":"two"}]"#)
            .unwrap();

        notes.append(note(3, "new")).unwrap();
        assert!(notes.remove(1).unwrap());

        let raw: Vec<Value> = serde_json::from_str(&store.get("notes").unwrap().unwrap()).unwrap();
        assert!(raw.contains(&serde_json::json!({"id": "two"})));
        let ids: Vec<u32> = notes.load().unwrap().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn test_transaction_carries_bad_records_per_collection() {
        let (store, notes) = notes();
        let archive: Collection<Note> = Collection::new(Arc::clone(&store), "archive");
        store.set("notes", r#"[{"id":1,"text":"a"},"junk"]"#).unwrap();

        transact(&store, |tx| {
            let mut from = tx.read(&notes)?;
            let mut to = tx.read(&archive)?;
            to.extend(from.drain(..));
            tx.write(&notes, &from)?;
            tx.write(&archive, &to)?;
            Ok(())
        })
        .unwrap();

        assert_eq!(store.get("notes").unwrap().as_deref(), Some(r#"["junk"]"#));
        assert_eq!(archive.load().unwrap().len(), 1);
    }

    #[test]
    fn test_append_round_trip() {
        let (_, notes) = notes();
        let record = note(7, "হ্যালো");
        notes.append(record.clone()).unwrap();

        let loaded = notes.load().unwrap();
        assert!(loaded.contains(&record));
    }

    #[test]
    fn test_remove_by_id_shrinks_by_one() {
        let (_, notes) = notes();
        notes.save(&[note(1, "a"), note(2, "b"), note(3, "c")]).unwrap();

        assert!(notes.remove(2).unwrap());
        let loaded = notes.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.iter().all(|n| n.id != 2));

        assert!(!notes.remove(2).unwrap());
    }

    #[test]
    fn test_load_versioned_tracks_writes() {
        let (_, notes) = notes();
        assert_eq!(notes.load_versioned().unwrap().1, 0);

        notes.append(note(1, "a")).unwrap();
        notes.append(note(2, "b")).unwrap();
        let (records, revision) = notes.load_versioned().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(revision, 2);
    }

    #[test]
    fn test_update_double_toggle_restores() {
        let (_, notes) = notes();
        notes.save(&[note(1, "a")]).unwrap();

        notes.update(1, |n| n.pinned = !n.pinned).unwrap();
        let toggled = notes.update(1, |n| n.pinned = !n.pinned).unwrap().unwrap();
        assert!(!toggled.pinned);
        assert!(notes.update(99, |n| n.pinned = true).unwrap().is_none());
    }

    #[test]
    fn test_retain_and_filter() {
        let (_, notes) = notes();
        notes.save(&[note(1, "keep"), note(2, "drop"), note(3, "keep")]).unwrap();

        assert_eq!(notes.filter(|n| n.text == "keep").unwrap().len(), 2);
        assert_eq!(notes.retain(|n| n.text == "keep").unwrap(), 1);
        assert_eq!(notes.load().unwrap().len(), 2);
        assert_eq!(notes.find(3).unwrap().unwrap().text, "keep");
        assert!(notes.find_by(|n| n.text == "drop").unwrap().is_none());
    }

    #[test]
    fn test_modify_retries_after_concurrent_write() {
        let (store, notes) = notes();
        notes.save(&[note(1, "a")]).unwrap();

        let calls = AtomicUsize::new(0);
        notes
            .modify(|records| {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    // Someone else writes between our read and our commit.
                    store.set("notes", r#"[{"id":1,"text":"a"},{"id":2,"text":"b"}]"#)?;
                }
                records.push(note(3, "c"));
                Ok(())
            })
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let ids: Vec<u32> = notes.load().unwrap().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_transact_writes_two_collections_atomically() {
        let (store, notes) = notes();
        let archive: Collection<Note> = Collection::new(Arc::clone(&store), "archive");
        notes.save(&[note(1, "a")]).unwrap();

        transact(&store, |tx| {
            let mut from = tx.read(&notes)?;
            let mut to = tx.read(&archive)?;
            to.extend(from.drain(..));
            tx.write(&notes, &from)?;
            tx.write(&archive, &to)?;
            Ok(())
        })
        .unwrap();

        assert!(notes.load().unwrap().is_empty());
        assert_eq!(archive.load().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_closure_writes_nothing() {
        let (_, notes) = notes();
        notes.save(&[note(1, "a")]).unwrap();

        let result: Result<()> = notes.modify(|records| {
            records.clear();
            Err(AppError::Validation("nope".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(notes.load().unwrap().len(), 1);
    }
}
