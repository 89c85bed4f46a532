//! Ride VM Instructions - Variable-Length Format
//!
//! Every instruction starts with a one-byte opcode followed by zero or more
//! big-endian `u16` operands:
//!
//! ```text
//! ┌──────────┬──────────────┬──────────────┬─────
//! │  Opcode  │  Operand 0   │  Operand 1   │ ...
//! │ (8 bits) │  (16 bits)   │  (16 bits)   │
//! └──────────┴──────────────┴──────────────┴─────
//! ```
//!
//! `Call` is the only instruction whose length depends on its operands: its
//! second operand is the number of argument slots that follow. `Pop` is part
//! of the instruction set for interpreters but the compiler never emits it.
//!
//! Code addresses are absolute byte offsets into the program.

use core::fmt;

use smallvec::SmallVec;

use crate::Vec;
use crate::vm::SlotId;

/// Instruction tags. The numbering is part of the wire contract.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Pop a return address, or finish if there is none.
    /// Stack: [..., result] -> [..., result]
    ///
    /// Having Return at 0x00 means zeroed memory ends execution instead of
    /// running garbage.
    Return = 0x00,

    /// Push the value of a slot.
    /// Operand: slot | Stack: [...] -> [..., value]
    ///
    /// Constants and predefined names are pushed directly, parameters through
    /// their frame binding, code slots from the memo cache or by running their
    /// chunk.
    Ref = 0x01,

    /// Operands: true address, false address, merge address
    /// Stack: [..., cond: Boolean] -> [...]
    ///
    /// Pushes the merge address as the return address of whichever branch
    /// runs.
    JumpIfFalse = 0x02,

    /// Read a field of the object on top of the stack.
    /// Operand: string constant slot | Stack: [..., obj] -> [..., obj.field]
    Property = 0x03,

    /// Call a user function.
    /// Operands: address, argc, argc x slot
    Call = 0x04,

    /// Call a native function.
    /// Operands: native id, argc | Stack: [..., args...] -> [..., result]
    ExternalCall = 0x05,

    /// Push the argument reference at an index of the current frame.
    /// Operand: u16 index
    PushFromFrame = 0x06,

    /// Pop an argument reference and bind a parameter slot to it.
    /// Operand: slot
    UseArg = 0x07,

    /// Drop the current call frame.
    PopCtx = 0x08,

    /// Memoize the top of the stack into a slot without popping it.
    /// Operand: slot
    Cache = 0x09,

    /// Drop a memoized value or parameter binding.
    /// Operand: slot
    ClearCache = 0x0A,

    /// Discard the top of the stack.
    /// Stack: [..., value] -> [...]
    Pop = 0x0B,
}

impl Opcode {
    pub const fn from_byte(byte: u8) -> Option<Opcode> {
        Some(match byte {
            0x00 => Opcode::Return,
            0x01 => Opcode::Ref,
            0x02 => Opcode::JumpIfFalse,
            0x03 => Opcode::Property,
            0x04 => Opcode::Call,
            0x05 => Opcode::ExternalCall,
            0x06 => Opcode::PushFromFrame,
            0x07 => Opcode::UseArg,
            0x08 => Opcode::PopCtx,
            0x09 => Opcode::Cache,
            0x0A => Opcode::ClearCache,
            0x0B => Opcode::Pop,
            _ => return None,
        })
    }

    /// Number of fixed `u16` operands. `Call` is followed by `argc` more.
    pub const fn fixed_operands(self) -> usize {
        match self {
            Opcode::Return | Opcode::PopCtx | Opcode::Pop => 0,
            Opcode::Ref
            | Opcode::Property
            | Opcode::PushFromFrame
            | Opcode::UseArg
            | Opcode::Cache
            | Opcode::ClearCache => 1,
            Opcode::Call | Opcode::ExternalCall => 2,
            Opcode::JumpIfFalse => 3,
        }
    }
}

/// A decoded instruction.
#[derive(Clone, PartialEq, Eq)]
pub enum Instruction {
    Return,
    Ref(SlotId),
    JumpIfFalse {
        on_true: u16,
        on_false: u16,
        merge: u16,
    },
    Property(SlotId),
    Call {
        address: u16,
        args: SmallVec<[SlotId; 4]>,
    },
    ExternalCall {
        id: u16,
        argc: u16,
    },
    PushFromFrame(u16),
    UseArg(SlotId),
    PopCtx,
    Cache(SlotId),
    ClearCache(SlotId),
    Pop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Invalid opcode 0x{opcode:02X} at {pc}")]
    InvalidOpcode { opcode: u8, pc: usize },
    #[error("Truncated instruction at {pc}")]
    Truncated { pc: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("Call with {argc} arguments does not fit a u16 operand")]
    TooManyArguments { argc: usize },
}

struct Reader<'b> {
    bytes: &'b [u8],
    start: usize,
    pos: usize,
}

impl Reader<'_> {
    fn u16(&mut self) -> Result<u16, DecodeError> {
        let hi = self.bytes.get(self.pos);
        let lo = self.bytes.get(self.pos + 1);
        match (hi, lo) {
            (Some(&hi), Some(&lo)) => {
                self.pos += 2;
                Ok(u16::from_be_bytes([hi, lo]))
            }
            _ => Err(DecodeError::Truncated { pc: self.start }),
        }
    }

    fn slot(&mut self) -> Result<SlotId, DecodeError> {
        self.u16().map(SlotId)
    }
}

impl Instruction {
    /// Decode the instruction at `pc`. Returns it with the address of the
    /// following instruction.
    pub fn decode(bytes: &[u8], pc: usize) -> Result<(Instruction, usize), DecodeError> {
        let &byte = bytes.get(pc).ok_or(DecodeError::Truncated { pc })?;
        let opcode =
            Opcode::from_byte(byte).ok_or(DecodeError::InvalidOpcode { opcode: byte, pc })?;
        let mut r = Reader {
            bytes,
            start: pc,
            pos: pc + 1,
        };

        let instruction = match opcode {
            Opcode::Return => Instruction::Return,
            Opcode::Ref => Instruction::Ref(r.slot()?),
            Opcode::JumpIfFalse => Instruction::JumpIfFalse {
                on_true: r.u16()?,
                on_false: r.u16()?,
                merge: r.u16()?,
            },
            Opcode::Property => Instruction::Property(r.slot()?),
            Opcode::Call => {
                let address = r.u16()?;
                let argc = r.u16()?;
                let args = (0..argc).map(|_| r.slot()).collect::<Result<_, _>>()?;
                Instruction::Call { address, args }
            }
            Opcode::ExternalCall => Instruction::ExternalCall {
                id: r.u16()?,
                argc: r.u16()?,
            },
            Opcode::PushFromFrame => Instruction::PushFromFrame(r.u16()?),
            Opcode::UseArg => Instruction::UseArg(r.slot()?),
            Opcode::PopCtx => Instruction::PopCtx,
            Opcode::Cache => Instruction::Cache(r.slot()?),
            Opcode::ClearCache => Instruction::ClearCache(r.slot()?),
            Opcode::Pop => Instruction::Pop,
        };
        Ok((instruction, r.pos))
    }

    /// Append the encoded form to `out`. Nothing is written on error.
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        let argc = match self {
            Instruction::Call { args, .. } => Some(
                u16::try_from(args.len())
                    .map_err(|_| EncodeError::TooManyArguments { argc: args.len() })?,
            ),
            _ => None,
        };

        out.push(self.opcode() as u8);
        let mut word = |value: u16| out.extend_from_slice(&value.to_be_bytes());
        match self {
            Instruction::Return | Instruction::PopCtx | Instruction::Pop => {}
            Instruction::Ref(slot)
            | Instruction::Property(slot)
            | Instruction::UseArg(slot)
            | Instruction::Cache(slot)
            | Instruction::ClearCache(slot) => word(slot.0),
            Instruction::JumpIfFalse {
                on_true,
                on_false,
                merge,
            } => {
                word(*on_true);
                word(*on_false);
                word(*merge);
            }
            Instruction::Call { address, args } => {
                word(*address);
                word(argc.unwrap_or_default());
                for arg in args {
                    word(arg.0);
                }
            }
            Instruction::ExternalCall { id, argc } => {
                word(*id);
                word(*argc);
            }
            Instruction::PushFromFrame(index) => word(*index),
        }
        Ok(())
    }

    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Return => Opcode::Return,
            Instruction::Ref(_) => Opcode::Ref,
            Instruction::JumpIfFalse { .. } => Opcode::JumpIfFalse,
            Instruction::Property(_) => Opcode::Property,
            Instruction::Call { .. } => Opcode::Call,
            Instruction::ExternalCall { .. } => Opcode::ExternalCall,
            Instruction::PushFromFrame(_) => Opcode::PushFromFrame,
            Instruction::UseArg(_) => Opcode::UseArg,
            Instruction::PopCtx => Opcode::PopCtx,
            Instruction::Cache(_) => Opcode::Cache,
            Instruction::ClearCache(_) => Opcode::ClearCache,
            Instruction::Pop => Opcode::Pop,
        }
    }

    /// Encoded size in bytes.
    pub fn encoded_len(&self) -> usize {
        let extra = match self {
            Instruction::Call { args, .. } => args.len(),
            _ => 0,
        };
        1 + 2 * (self.opcode().fixed_operands() + extra)
    }

    /// Check if this is a control flow instruction
    pub fn is_control_flow(&self) -> bool {
        matches!(
            self,
            Instruction::Return | Instruction::JumpIfFalse { .. } | Instruction::Call { .. }
        )
    }
}

/// Encode a sequence of instructions.
pub fn assemble(instructions: &[Instruction]) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    for instruction in instructions {
        instruction.encode(&mut out)?;
    }
    Ok(out)
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Return => write!(f, "Return"),
            Self::Ref(slot) => write!(f, "Ref({})", slot),
            Self::JumpIfFalse {
                on_true,
                on_false,
                merge,
            } => write!(
                f,
                "{:14} @{} @{} @{}",
                "JumpIfFalse", on_true, on_false, merge
            ),
            Self::Property(slot) => write!(f, "Property({})", slot),
            Self::Call { address, args } => {
                write!(f, "{:14} @{} (", "Call", address)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Self::ExternalCall { id, argc } => write!(f, "ExternalCall({}, {})", id, argc),
            Self::PushFromFrame(index) => write!(f, "PushFromFrame({})", index),
            Self::UseArg(slot) => write!(f, "UseArg({})", slot),
            Self::PopCtx => write!(f, "PopCtx"),
            Self::Cache(slot) => write!(f, "Cache({})", slot),
            Self::ClearCache(slot) => write!(f, "ClearCache({})", slot),
            Self::Pop => write!(f, "Pop"),
        }
    }
}
