//! Append-only code buffer with forward-reference patching.
//!
//! Jump targets and call addresses are usually unknown when the operand is
//! written. The buffer writes a zero "stub" word and records what it must
//! point at; `finish` resolves every stub in one pass.

use crate::{
    Vec,
    compiler::CompileError,
    format,
    vm::{Opcode, SlotId},
};

/// A position in the code, bound once it is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Label(usize);

/// What a stub operand resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    Label(Label),
    /// The code address of a slot's chunk.
    Slot(SlotId),
}

#[derive(Debug, Default)]
pub(crate) struct CodeBuffer {
    bytes: Vec<u8>,
    patches: Vec<(usize, Target)>,
    labels: Vec<Option<u16>>,
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address of the next byte to be written.
    pub fn address(&self) -> Result<u16, CompileError> {
        u16::try_from(self.bytes.len()).map_err(|_| CompileError::CodeTooLarge)
    }

    pub fn op(&mut self, opcode: Opcode) {
        self.bytes.push(opcode as u8);
    }

    pub fn word(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn slot(&mut self, slot: SlotId) {
        self.word(slot.0);
    }

    /// Write an opcode with a single slot operand.
    pub fn op_slot(&mut self, opcode: Opcode, slot: SlotId) {
        self.op(opcode);
        self.slot(slot);
    }

    /// Reserve an operand to be patched with `target`.
    pub fn stub(&mut self, target: Target) {
        self.patches.push((self.bytes.len(), target));
        self.word(0);
    }

    pub fn new_label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    /// Bind `label` to the current address.
    pub fn bind(&mut self, label: Label) -> Result<(), CompileError> {
        let address = self.address()?;
        let entry = self
            .labels
            .get_mut(label.0)
            .ok_or_else(|| CompileError::malformed(format!("unknown label {}", label.0)))?;
        if entry.is_some() {
            return Err(CompileError::malformed(format!(
                "label {} bound twice",
                label.0
            )));
        }
        *entry = Some(address);
        Ok(())
    }

    /// Resolve every stub and return the finished code. `resolve_slot` maps a
    /// slot to its chunk address.
    pub fn finish(
        mut self,
        resolve_slot: impl Fn(SlotId) -> Option<u16>,
    ) -> Result<Vec<u8>, CompileError> {
        if self.bytes.len() > u16::MAX as usize {
            return Err(CompileError::CodeTooLarge);
        }

        for (offset, target) in core::mem::take(&mut self.patches) {
            let address = match target {
                Target::Label(label) => self
                    .labels
                    .get(label.0)
                    .copied()
                    .flatten()
                    .ok_or_else(|| {
                        CompileError::malformed(format!("label {} never bound", label.0))
                    })?,
                Target::Slot(slot) => resolve_slot(slot).ok_or_else(|| {
                    CompileError::malformed(format!("no code written for slot {}", slot))
                })?,
            };
            self.bytes[offset..offset + 2].copy_from_slice(&address.to_be_bytes());
        }
        Ok(self.bytes)
    }
}
