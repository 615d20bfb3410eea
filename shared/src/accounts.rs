//! The working set a single transition runs against.
//!
//! A host loads every declared account into [`Accounts`], hands it to the
//! processor, and persists [`Accounts::into_writes`] only when the processor
//! returns `Ok`. Nothing a transition does is visible outside its working set
//! until then.

use std::collections::HashMap;

use serde::{Serialize, Deserialize};

use crate::address::Key;
use crate::error::{Error, ErrorCode, Result};
use crate::models::AccountData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMeta {
    pub key: Key,
    pub writable: bool,
}

impl AccountMeta {
    pub fn readonly(key: Key) -> Self {
        Self { key, writable: false }
    }

    pub fn writable(key: Key) -> Self {
        Self { key, writable: true }
    }
}

#[derive(Debug)]
struct Slot {
    data: Option<Vec<u8>>,
    writable: bool,
    dirty: bool,
}

#[derive(Debug)]
pub struct Accounts {
    slots: HashMap<Key, Slot>,
}

impl Accounts {
    /// `loaded` holds the current bytes of every declared key that exists;
    /// declared keys missing from it are treated as absent records.
    pub fn from_snapshot(metas: &[AccountMeta], mut loaded: HashMap<Key, Vec<u8>>) -> Self {
        let mut slots: HashMap<Key, Slot> = HashMap::with_capacity(metas.len());
        for meta in metas {
            slots
                .entry(meta.key)
                .and_modify(|slot| slot.writable |= meta.writable)
                .or_insert_with(|| Slot {
                    data: loaded.remove(&meta.key),
                    writable: meta.writable,
                    dirty: false,
                });
        }
        Self { slots }
    }

    fn slot(&self, key: &Key) -> Result<&Slot> {
        self.slots.get(key).ok_or_else(|| {
            Error::with_details(ErrorCode::SystemError, "Account not declared by instruction", key.to_string())
        })
    }

    fn slot_mut(&mut self, key: &Key) -> Result<&mut Slot> {
        let slot = self.slots.get_mut(key).ok_or_else(|| {
            Error::with_details(ErrorCode::SystemError, "Account not declared by instruction", key.to_string())
        })?;
        if !slot.writable {
            return Err(Error::with_details(ErrorCode::SystemError, "Account is read-only", key.to_string()));
        }
        Ok(slot)
    }

    pub fn exists(&self, key: &Key) -> Result<bool> {
        Ok(self.slot(key)?.data.is_some())
    }

    pub fn get<T: AccountData>(&self, key: &Key) -> Result<Option<T>> {
        self.slot(key)?.data.as_deref().map(T::decode).transpose()
    }

    pub fn create<T: AccountData>(&mut self, key: &Key, record: &T) -> Result<()> {
        let bytes = record.encode()?;
        let slot = self.slot_mut(key)?;
        if slot.data.is_some() {
            return Err(Error::with_details(ErrorCode::AlreadyExists, format!("{} already exists", T::KIND), key.to_string()));
        }
        slot.data = Some(bytes);
        slot.dirty = true;
        Ok(())
    }

    /// Read-modify-write of one record. `apply` sees the decoded record and
    /// the slot is only rewritten if it succeeds.
    pub fn update<T, F>(&mut self, key: &Key, apply: F) -> Result<T>
    where
        T: AccountData,
        F: FnOnce(&mut T) -> Result<()>,
    {
        let slot = self.slot_mut(key)?;
        let bytes = slot.data.as_deref().ok_or_else(|| {
            Error::with_details(ErrorCode::NotFound, format!("{} not found", T::KIND), key.to_string())
        })?;
        let mut record = T::decode(bytes)?;
        apply(&mut record)?;
        slot.data = Some(record.encode()?);
        slot.dirty = true;
        Ok(record)
    }

    pub fn into_writes(self) -> Vec<(Key, Vec<u8>)> {
        let mut writes: Vec<(Key, Vec<u8>)> = self
            .slots
            .into_iter()
            .filter_map(|(key, slot)| match (slot.dirty, slot.data) {
                (true, Some(data)) => Some((key, data)),
                _ => None,
            })
            .collect();
        writes.sort_by(|a, b| a.0.cmp(&b.0));
        writes
    }
}
