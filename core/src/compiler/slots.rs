//! Slot table and id allocation for one compilation.

use alloc::collections::{BTreeMap, BTreeSet};

use hashbrown::HashMap;

use crate::{
    String, ToString,
    compiler::CompileError,
    format,
    vm::{
        Constant, FIRST_DYNAMIC_SLOT, Slot, SlotId, SlotKind, boolean_slot, predefined_name,
        small_long_slot,
    },
};

/// Hands out slot ids in increasing order, starting after the reserved range.
#[derive(Debug)]
pub(crate) struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next: FIRST_DYNAMIC_SLOT.0 as u32,
        }
    }

    pub fn next(&mut self) -> Result<SlotId, CompileError> {
        let id = u16::try_from(self.next).map_err(|_| CompileError::TooManySlots)?;
        self.next += 1;
        Ok(SlotId(id))
    }
}

/// Every slot the program references.
///
/// Reserved slots (booleans, small longs, predefined names) enter the table
/// the first time they are used. Code slots stay pending until their chunk is
/// written.
#[derive(Debug)]
pub(crate) struct SlotTable {
    ids: IdAllocator,
    slots: BTreeMap<SlotId, Slot>,
    natives: HashMap<String, SlotId>,
    pending: BTreeSet<SlotId>,
}

impl SlotTable {
    pub fn new() -> Self {
        Self {
            ids: IdAllocator::new(),
            slots: BTreeMap::new(),
            natives: HashMap::new(),
            pending: BTreeSet::new(),
        }
    }

    fn insert(&mut self, id: SlotId, kind: SlotKind, label: String) -> SlotId {
        self.slots.insert(id, Slot { id, kind, label });
        id
    }

    fn fresh(&mut self, kind: SlotKind, label: String) -> Result<SlotId, CompileError> {
        let id = self.ids.next()?;
        Ok(self.insert(id, kind, label))
    }

    /// Slot holding a literal. Booleans and longs in `0..=100` share reserved
    /// slots; every other literal gets its own.
    pub fn constant(&mut self, constant: Constant) -> Result<SlotId, CompileError> {
        let reserved = match constant {
            Constant::Boolean(value) => Some(boolean_slot(value)),
            Constant::Long(value) => small_long_slot(value),
            _ => None,
        };
        let label = constant.to_string();
        match reserved {
            Some(id) => {
                self.slots.entry(id).or_insert_with(|| Slot {
                    id,
                    kind: SlotKind::Constant(constant),
                    label,
                });
                Ok(id)
            }
            None => self.fresh(SlotKind::Constant(constant), label),
        }
    }

    /// Slot naming a native function. One per distinct name.
    pub fn native(&mut self, name: &str, id: u16) -> Result<SlotId, CompileError> {
        if let Some(&slot) = self.natives.get(name) {
            return Ok(slot);
        }
        let slot = self.fresh(SlotKind::Native(id), name.to_string())?;
        self.natives.insert(name.to_string(), slot);
        Ok(slot)
    }

    pub fn parameter(&mut self, name: &str) -> Result<SlotId, CompileError> {
        self.fresh(SlotKind::Parameter, name.to_string())
    }

    /// A slot for code not yet written.
    pub fn code(&mut self, label: &str) -> Result<SlotId, CompileError> {
        let id = self.fresh(SlotKind::Code(0), label.to_string())?;
        self.pending.insert(id);
        Ok(id)
    }

    /// A slot for a memoized binding not yet written. Bindings inside a
    /// function body are memoized per call of `owner`.
    pub fn binding(
        &mut self,
        label: &str,
        owner: Option<SlotId>,
    ) -> Result<SlotId, CompileError> {
        let kind = match owner {
            Some(function) => SlotKind::Local {
                address: 0,
                function,
            },
            None => SlotKind::Code(0),
        };
        let id = self.fresh(kind, label.to_string())?;
        self.pending.insert(id);
        Ok(id)
    }

    /// Record a reference to `id`, adding it to the table if it is a
    /// predefined name seen for the first time.
    pub fn referenced(&mut self, id: SlotId) {
        if let Some(name) = predefined_name(id) {
            self.slots
                .entry(id)
                .or_insert_with(|| Slot {
                    id,
                    kind: SlotKind::Predefined,
                    label: name.to_string(),
                });
        }
    }

    /// Record the chunk address of a code slot.
    pub fn set_address(&mut self, id: SlotId, address: u16) -> Result<(), CompileError> {
        if !self.pending.remove(&id) {
            return Err(CompileError::malformed(format!(
                "slot {} written twice or not a code slot",
                id
            )));
        }
        match self.slots.get_mut(&id).map(|slot| &mut slot.kind) {
            Some(SlotKind::Code(target)) | Some(SlotKind::Local { address: target, .. }) => {
                *target = address;
                Ok(())
            }
            _ => Err(CompileError::malformed(format!("slot {} is not a code slot", id))),
        }
    }

    /// Address of a written code slot.
    pub fn address(&self, id: SlotId) -> Option<u16> {
        if self.pending.contains(&id) {
            return None;
        }
        self.slots.get(&id).and_then(Slot::code_address)
    }

    #[cfg(test)]
    pub fn get(&self, id: SlotId) -> Option<&Slot> {
        self.slots.get(&id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// The finished table. Fails if any code slot was never written.
    pub fn finish(self) -> Result<BTreeMap<SlotId, Slot>, CompileError> {
        if let Some(id) = self.pending.first() {
            let label = self.slots.get(id).map(|slot| slot.label.as_str()).unwrap_or("");
            return Err(CompileError::malformed(format!(
                "code for '{}' ({}) was never written",
                label, id
            )));
        }
        Ok(self.slots)
    }
}
