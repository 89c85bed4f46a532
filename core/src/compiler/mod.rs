//! Bytecode compiler for Ride scripts.
//!
//! The compiler walks the tree once. Every construct is handled by a
//! [`State`]: entering a construct creates a child state, and `return_`
//! folds the child's result into its parent. Referenceable computations
//! (let-bindings, user-call arguments, conditions, functions) become
//! [`Deferred`] chunks with their own slot; the chunk owner writes them out of
//! line when it is written itself.
//!
//! ## Design
//!
//! - States are consumed by value; only [`Params`] is mutated
//! - Scopes are persistent, so a branch or let-body never leaks bindings
//! - Forward addresses are stubs patched in one pass at the end
//! - Lazy evaluation is encoded with `Ref`/`Cache`/`ClearCache` on slots

mod buffer;
mod deferred;
mod driver;
mod error;
mod slots;
mod state;


use alloc::collections::BTreeMap;

pub use error::CompileError;

pub(crate) use buffer::CodeBuffer;
pub(crate) use deferred::{Block, Deferred, Term};
pub(crate) use driver::compile;
pub(crate) use slots::SlotTable;
pub(crate) use state::State;

use crate::{String, api::CompilationOptions, api::FunctionChecker, vm::Executable};

/// Everything a compilation writes to, shared by all states.
pub(crate) struct Params<'c> {
    pub code: CodeBuffer,
    pub slots: SlotTable,
    pub checker: &'c dyn FunctionChecker,
    pub options: CompilationOptions,
    pub entry_points: BTreeMap<String, u16>,
}

impl<'c> Params<'c> {
    pub fn new(checker: &'c dyn FunctionChecker, options: CompilationOptions) -> Self {
        Self {
            code: CodeBuffer::new(),
            slots: SlotTable::new(),
            checker,
            options,
            entry_points: BTreeMap::new(),
        }
    }

    /// Resolve all forward references and assemble the executable.
    pub fn finish(
        self,
        lib_version: u8,
        is_dapp: bool,
        has_verifier: bool,
    ) -> Result<Executable, CompileError> {
        let Params {
            code,
            slots,
            entry_points,
            ..
        } = self;
        let byte_code = code.finish(|slot| slots.address(slot))?;
        let constants = slots.finish()?;
        Ok(Executable {
            lib_version,
            byte_code,
            constants,
            entry_points,
            is_dapp,
            has_verifier,
        })
    }
}
