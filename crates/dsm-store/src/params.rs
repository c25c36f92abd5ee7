use std::collections::HashMap;
use std::sync::RwLock;

use dsm_types::CasOutcome;

use crate::error::{StoreError, StoreResult};

/// One parameter slot: its value and the peer id of the last writer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParamEntry {
    pub value: i64,
    pub last_writer: Option<u32>,
}

#[derive(Default)]
struct Slot {
    entry: ParamEntry,
    /// Token of the last swap applied for each writer.
    applied: HashMap<u32, u64>,
}

/// Named integer slots held by the parameter server.
///
/// A lock slot holds `0` when free and the holder's pattern otherwise.
/// `compare_and_swap` checks and replaces under one write lock, so two
/// contenders can never both observe `0` and both win.
#[derive(Default)]
pub struct ParamTable {
    slots: RwLock<HashMap<String, Slot>>,
}

impl ParamTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a slot initialised to `0`.
    pub fn register(&self, name: &str) -> StoreResult<()> {
        let mut slots = self.slots.write().expect("lock poisoned");
        if slots.contains_key(name) {
            return Err(StoreError::ParamAlreadyExists { name: name.to_string() });
        }
        slots.insert(name.to_string(), Slot::default());
        tracing::debug!(name, "parameter registered");
        Ok(())
    }

    pub fn deregister(&self, name: &str) -> StoreResult<()> {
        let mut slots = self.slots.write().expect("lock poisoned");
        slots
            .remove(name)
            .ok_or_else(|| StoreError::param_not_found(name))?;
        tracing::debug!(name, "parameter deregistered");
        Ok(())
    }

    pub fn read(&self, name: &str) -> StoreResult<i64> {
        self.entry(name).map(|entry| entry.value)
    }

    pub fn entry(&self, name: &str) -> StoreResult<ParamEntry> {
        let slots = self.slots.read().expect("lock poisoned");
        slots
            .get(name)
            .map(|slot| slot.entry)
            .ok_or_else(|| StoreError::param_not_found(name))
    }

    /// Unconditional overwrite.
    pub fn write(&self, name: &str, value: i64, writer: Option<u32>) -> StoreResult<()> {
        let mut slots = self.slots.write().expect("lock poisoned");
        let slot = slots
            .get_mut(name)
            .ok_or_else(|| StoreError::param_not_found(name))?;
        slot.entry = ParamEntry { value, last_writer: writer };
        Ok(())
    }

    /// Replace the value with `new` only if it currently equals `expected`.
    pub fn compare_and_swap(
        &self,
        name: &str,
        expected: i64,
        new: i64,
        writer: Option<u32>,
    ) -> StoreResult<CasOutcome> {
        let mut slots = self.slots.write().expect("lock poisoned");
        let slot = slots
            .get_mut(name)
            .ok_or_else(|| StoreError::param_not_found(name))?;
        Ok(swap(slot, expected, new, writer))
    }

    /// [`compare_and_swap`](Self::compare_and_swap) that is applied at most
    /// once per `(writer, token)`.
    ///
    /// A repeat of the last swap `writer` had applied with `token` is not
    /// applied again and reports `swapped` with the value that swap set,
    /// whatever the slot holds now. A client that lost the answer to a
    /// swap can therefore resend it under the same token.
    pub fn compare_and_swap_once(
        &self,
        name: &str,
        expected: i64,
        new: i64,
        writer: u32,
        token: u64,
    ) -> StoreResult<CasOutcome> {
        let mut slots = self.slots.write().expect("lock poisoned");
        let slot = slots
            .get_mut(name)
            .ok_or_else(|| StoreError::param_not_found(name))?;
        if slot.applied.get(&writer) == Some(&token) {
            tracing::debug!(name, writer, token, "repeated swap not reapplied");
            return Ok(CasOutcome::swapped(new));
        }
        let outcome = swap(slot, expected, new, Some(writer));
        if outcome.swapped {
            slot.applied.insert(writer, token);
        }
        Ok(outcome)
    }

    pub fn len(&self) -> usize {
        self.slots.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn swap(slot: &mut Slot, expected: i64, new: i64, writer: Option<u32>) -> CasOutcome {
    if slot.entry.value != expected {
        return CasOutcome::mismatch(slot.entry.value);
    }
    slot.entry = ParamEntry { value: new, last_writer: writer };
    CasOutcome::swapped(new)
}

impl std::fmt::Debug for ParamTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamTable")
            .field("slot_count", &self.len())
            .finish()
    }
}
