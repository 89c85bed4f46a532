//! Output side of the compiler: slots, instructions and the executable.

mod code;
pub mod instruction_set;
mod slot;

pub use code::Executable;
pub use instruction_set::{DecodeError, EncodeError, Instruction, Opcode};
pub use slot::{
    Constant, FALSE_SLOT, FIRST_DYNAMIC_SLOT, PREDEFINED, Slot, SlotId, SlotKind, TRUE_SLOT,
    boolean_slot, predefined_name, predefined_slot, small_long_slot,
};
