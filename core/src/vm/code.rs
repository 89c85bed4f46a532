use alloc::collections::BTreeMap;

use hashbrown::HashMap;

use crate::{
    String, Vec, format,
    vm::{DecodeError, Instruction, Slot, SlotId, SlotKind},
};

/// A compiled program, ready for the interpreter.
///
/// All maps are ordered, so two executables built from the same tree compare
/// equal and print identically.
#[derive(Clone, PartialEq, Eq)]
pub struct Executable {
    pub lib_version: u8,
    pub byte_code: Vec<u8>,
    /// Every slot the program references, keyed by id.
    pub constants: BTreeMap<SlotId, Slot>,
    /// Named code addresses where interpretation can begin. `""` is the
    /// verifier or the expression.
    pub entry_points: BTreeMap<String, u16>,
    pub is_dapp: bool,
    pub has_verifier: bool,
}

impl Executable {
    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.constants.get(&id)
    }

    pub fn entry_point(&self, name: &str) -> Option<u16> {
        self.entry_points.get(name).copied()
    }

    /// Slot whose label is `label`, if any. Labels are not unique; the
    /// lowest id wins.
    pub fn slot_by_label(&self, label: &str) -> Option<&Slot> {
        self.constants.values().find(|slot| slot.label == label)
    }

    /// Decode the whole program into `(address, instruction)` pairs.
    pub fn disassemble(&self) -> Result<Vec<(usize, Instruction)>, DecodeError> {
        let mut out = Vec::new();
        let mut pc = 0;
        while pc < self.byte_code.len() {
            let (instruction, next) = Instruction::decode(&self.byte_code, pc)?;
            out.push((pc, instruction));
            pc = next;
        }
        Ok(out)
    }
}

impl core::fmt::Debug for Executable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "Executable {{")?;
        writeln!(f, "  lib_version: {}", self.lib_version)?;
        writeln!(f, "  is_dapp: {}", self.is_dapp)?;
        writeln!(f, "  has_verifier: {}", self.has_verifier)?;

        if !self.constants.is_empty() {
            writeln!(f, "  slots: [")?;
            for (id, slot) in &self.constants {
                match &slot.kind {
                    SlotKind::Constant(constant) => writeln!(f, "    {} = {}", id, constant)?,
                    SlotKind::Native(native) => {
                        writeln!(f, "    {} = native {} {:?}", id, native, slot.label)?
                    }
                    SlotKind::Predefined => writeln!(f, "    {} = predefined {}", id, slot.label)?,
                    SlotKind::Parameter => writeln!(f, "    {} = parameter {}", id, slot.label)?,
                    SlotKind::Code(address) => {
                        writeln!(f, "    {} = code @{} {}", id, address, slot.label)?
                    }
                    SlotKind::Local { address, function } => writeln!(
                        f,
                        "    {} = local @{} {} in {}",
                        id, address, slot.label, function
                    )?,
                }
            }
            writeln!(f, "  ]")?;
        } else {
            writeln!(f, "  slots: []")?;
        }

        writeln!(f, "  entry_points:")?;
        for (name, address) in &self.entry_points {
            writeln!(f, "    {:?} -> @{}", name, address)?;
        }

        // Name every address something jumps or calls into
        let mut labels: HashMap<usize, String> = HashMap::new();
        for slot in self.constants.values() {
            if let Some(address) = slot.code_address() {
                labels.insert(address as usize, format!("{}:", slot.label));
            }
        }
        for (name, address) in &self.entry_points {
            labels.insert(*address as usize, format!("<{}>:", name));
        }

        writeln!(f, "  instructions:")?;
        let mut pc = 0;
        while pc < self.byte_code.len() {
            let label = labels.get(&pc).map(String::as_str).unwrap_or("");
            match Instruction::decode(&self.byte_code, pc) {
                Ok((instr, next)) => {
                    writeln!(f, "    {:4} {:>10}  {:?}", pc, label, instr)?;
                    pc = next;
                }
                Err(err) => {
                    writeln!(f, "    {:4} {:>10}  <{}>", pc, label, err)?;
                    break;
                }
            }
        }

        write!(f, "}}")
    }
}
