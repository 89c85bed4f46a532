//! Slots: the interpreter's dense, integer-addressed storage.
//!
//! # Reserved ids
//!
//! The low id range is fixed so that frequently used constants and the
//! predefined names never need fresh ids:
//!
//! ```text
//! 0            false
//! 1            true
//! 2..=102      longs 0..=100 (id = value + 2)
//! 103..=128    predefined names, in `PREDEFINED` order
//! 129..        allocated per compilation
//! ```

use core::fmt;

use static_assertions::const_assert;

use crate::{String, Vec};

/// Index into the slot table. Every `Ref`, `Cache` and `UseArg` operand is a
/// `SlotId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(pub u16);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub const FALSE_SLOT: SlotId = SlotId(0);
pub const TRUE_SLOT: SlotId = SlotId(1);

/// Longs in this range share the reserved slots starting at id 2.
pub const SMALL_LONG_MIN: i64 = 0;
pub const SMALL_LONG_MAX: i64 = 100;
const SMALL_LONG_BASE: u16 = 2;

/// Names bound in the root scope of every script. Their values are supplied
/// by the interpreter.
pub const PREDEFINED: [&str; 26] = [
    "tx", "this", "height", "lastBlock", "unit", "nil", "Buy", "Sell",
    // Rounding modes
    "DOWN", "UP", "HALFUP", "HALFDOWN", "HALFEVEN", "CEILING", "FLOOR",
    // Hash algorithms
    "NOALG", "MD5", "SHA1", "SHA224", "SHA256", "SHA384", "SHA512", "SHA3224", "SHA3256",
    "SHA3384", "SHA3512",
];

const PREDEFINED_BASE: u16 = SMALL_LONG_BASE + (SMALL_LONG_MAX - SMALL_LONG_MIN) as u16 + 1;

/// First id handed out by the id allocator.
pub const FIRST_DYNAMIC_SLOT: SlotId = SlotId(PREDEFINED_BASE + PREDEFINED.len() as u16);

const_assert!(PREDEFINED_BASE == 103);
const_assert!(PREDEFINED_BASE as usize + PREDEFINED.len() == 129);

/// Reserved slot of a small long, if `value` is in the shared range.
pub fn small_long_slot(value: i64) -> Option<SlotId> {
    if (SMALL_LONG_MIN..=SMALL_LONG_MAX).contains(&value) {
        Some(SlotId(SMALL_LONG_BASE + (value - SMALL_LONG_MIN) as u16))
    } else {
        None
    }
}

pub fn boolean_slot(value: bool) -> SlotId {
    if value { TRUE_SLOT } else { FALSE_SLOT }
}

/// Reserved slot of a predefined name.
pub fn predefined_slot(name: &str) -> Option<SlotId> {
    PREDEFINED
        .iter()
        .position(|predefined| *predefined == name)
        .map(|index| SlotId(PREDEFINED_BASE + index as u16))
}

/// Name of the predefined value stored in `slot`, if it is one.
pub fn predefined_name(slot: SlotId) -> Option<&'static str> {
    let index = slot.0.checked_sub(PREDEFINED_BASE)? as usize;
    PREDEFINED.get(index).copied()
}

/// A literal value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    Long(i64),
    Bytes(Vec<u8>),
    String(String),
    Boolean(bool),
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Long(value) => write!(f, "{value}"),
            Constant::Bytes(bytes) => {
                write!(f, "base16'")?;
                for byte in bytes {
                    write!(f, "{byte:02x}")?;
                }
                write!(f, "'")
            }
            Constant::String(s) => write!(f, "{s:?}"),
            Constant::Boolean(b) => write!(f, "{b}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotKind {
    /// A literal; `Ref` pushes it directly.
    Constant(Constant),
    /// A native function referenced by the script, by its numeric id.
    Native(u16),
    /// A predefined name; the interpreter supplies the value.
    Predefined,
    /// A function parameter, bound per call by `UseArg`.
    Parameter,
    /// A memoized computation whose chunk starts at this address. Its memo
    /// is shared by the whole run. Function chunks are `Code` slots too.
    Code(u16),
    /// A memoized computation owned by a function body: one of its locals,
    /// conditions or user-call arguments. The memo lives in the frame of the
    /// innermost active call of `function`, so every call computes its own.
    Local { address: u16, function: SlotId },
}

/// One entry of the executable's slot table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub id: SlotId,
    pub kind: SlotKind,
    /// Debug label: binding or function name, literal text, native name.
    pub label: String,
}

impl Slot {
    pub fn is_constant(&self) -> bool {
        matches!(self.kind, SlotKind::Constant(_))
    }

    pub fn constant(&self) -> Option<&Constant> {
        match &self.kind {
            SlotKind::Constant(constant) => Some(constant),
            _ => None,
        }
    }

    pub fn native_id(&self) -> Option<u16> {
        match self.kind {
            SlotKind::Native(id) => Some(id),
            _ => None,
        }
    }

    /// Function whose frame holds this slot's memo, if it is frame-local.
    pub fn owner(&self) -> Option<SlotId> {
        match self.kind {
            SlotKind::Local { function, .. } => Some(function),
            _ => None,
        }
    }

    pub fn code_address(&self) -> Option<u16> {
        match self.kind {
            SlotKind::Code(address) | SlotKind::Local { address, .. } => Some(address),
            _ => None,
        }
    }
}
