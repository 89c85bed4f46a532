//! Terms and deferred chunks.
//!
//! A [`Term`] is written inline where its value is needed. A [`Deferred`] is
//! a referenceable computation with its own slot: it is written out of line,
//! after the code of the chunk that owns it, and reached through `Ref`.
//!
//! A chunk is laid out as
//!
//! ```text
//! <prologue>            function parameters only
//! <result term>
//! <clean>...            one per owned deferred, registration order
//! <epilogue>            Cache(slot), or parameter cleanup + PopCtx
//! Return
//! <deferred chunk>...   reverse registration order
//! ```

use smallvec::SmallVec;
use tracing::trace;

use crate::{
    Box, String, Vec,
    compiler::{
        CompileError, Params,
        buffer::{CodeBuffer, Target},
    },
    vm::{Opcode, SlotId},
};

/// Inline code producing one value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Term {
    Ref(SlotId),
    NativeCall {
        id: u16,
        args: Vec<Term>,
    },
    UserCall {
        function: SlotId,
        args: SmallVec<[SlotId; 4]>,
    },
    Property {
        object: Box<Term>,
        field: SlotId,
    },
    Conditional {
        condition: SlotId,
        then_branch: Box<Term>,
        else_branch: Box<Term>,
    },
}

impl Term {
    pub fn write(&self, code: &mut CodeBuffer) -> Result<(), CompileError> {
        match self {
            Term::Ref(slot) => code.op_slot(Opcode::Ref, *slot),
            Term::NativeCall { id, args } => {
                let argc = operand(args.len())?;
                for arg in args {
                    arg.write(code)?;
                }
                code.op(Opcode::ExternalCall);
                code.word(*id);
                code.word(argc);
            }
            Term::UserCall { function, args } => {
                let argc = operand(args.len())?;
                code.op(Opcode::Call);
                code.stub(Target::Slot(*function));
                code.word(argc);
                for arg in args {
                    code.slot(*arg);
                }
            }
            Term::Property { object, field } => {
                object.write(code)?;
                code.op_slot(Opcode::Property, *field);
            }
            Term::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                let on_true = code.new_label();
                let on_false = code.new_label();
                let merge = code.new_label();

                code.op_slot(Opcode::Ref, *condition);
                code.op(Opcode::JumpIfFalse);
                code.stub(Target::Label(on_true));
                code.stub(Target::Label(on_false));
                code.stub(Target::Label(merge));

                code.bind(on_true)?;
                then_branch.write(code)?;
                code.op(Opcode::Return);

                code.bind(on_false)?;
                else_branch.write(code)?;
                code.op(Opcode::Return);

                code.bind(merge)?;
            }
        }
        Ok(())
    }
}

/// A count or index as a `u16` operand. Anything larger cannot fit in the
/// address space either.
fn operand(value: usize) -> Result<u16, CompileError> {
    u16::try_from(value).map_err(|_| CompileError::CodeTooLarge)
}

/// The body of a chunk: its result and the deferreds it owns.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Block {
    pub result: Term,
    pub deferreds: Vec<Deferred>,
}

impl Block {
    /// Write the result and the cleanups of every owned deferred.
    pub fn write_body(&self, code: &mut CodeBuffer) -> Result<(), CompileError> {
        self.result.write(code)?;
        for deferred in &self.deferreds {
            deferred.clean(code);
        }
        Ok(())
    }
}

/// Write deferred chunks out of line, last registered first.
pub(crate) fn write_chunks(
    params: &mut Params<'_>,
    deferreds: Vec<Deferred>,
) -> Result<(), CompileError> {
    for deferred in deferreds.into_iter().rev() {
        deferred.write(params)?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Deferred {
    /// A memoized value: let-binding, user-call argument or condition.
    Binding { slot: SlotId, block: Block },
    /// A user function. Callables and the dApp verifier carry an entry name
    /// and an invocation parameter, bound at frame index 0.
    Function {
        slot: SlotId,
        entry: Option<String>,
        invocation: Option<SlotId>,
        params: Vec<SlotId>,
        block: Block,
    },
}

impl Deferred {
    pub fn slot(&self) -> SlotId {
        match self {
            Deferred::Binding { slot, .. } | Deferred::Function { slot, .. } => *slot,
        }
    }

    /// Cleanup run when the owning chunk exits.
    pub fn clean(&self, code: &mut CodeBuffer) {
        match self {
            Deferred::Binding { slot, .. } => code.op_slot(Opcode::ClearCache, *slot),
            Deferred::Function { .. } => {}
        }
    }

    pub fn write(self, params: &mut Params<'_>) -> Result<(), CompileError> {
        let address = params.code.address()?;
        params.slots.set_address(self.slot(), address)?;

        match self {
            Deferred::Binding { slot, block } => {
                trace!(%slot, address, "Writing binding chunk");
                block.write_body(&mut params.code)?;
                params.code.op_slot(Opcode::Cache, slot);
                params.code.op(Opcode::Return);
                write_chunks(params, block.deferreds)
            }
            Deferred::Function {
                slot,
                entry,
                invocation,
                params: parameters,
                block,
            } => {
                trace!(%slot, address, ?entry, "Writing function chunk");
                if let Some(name) = entry {
                    if params.entry_points.insert(name.clone(), address).is_some() {
                        return Err(CompileError::malformed(crate::format!(
                            "duplicate entry point '{}'",
                            name
                        )));
                    }
                }

                let frame: Vec<SlotId> = invocation.into_iter().chain(parameters).collect();
                let code = &mut params.code;
                for (index, parameter) in frame.iter().enumerate() {
                    code.op(Opcode::PushFromFrame);
                    code.word(operand(index)?);
                    code.op_slot(Opcode::UseArg, *parameter);
                }
                block.write_body(code)?;
                for parameter in &frame {
                    code.op_slot(Opcode::ClearCache, *parameter);
                }
                code.op(Opcode::PopCtx);
                code.op(Opcode::Return);
                write_chunks(params, block.deferreds)
            }
        }
    }
}
