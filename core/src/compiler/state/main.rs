use tracing::trace;

use crate::{
    compiler::{
        CompileError, Params,
        deferred::{Block, write_chunks},
    },
    format,
    scope::Scope,
    vm::Opcode,
};

use super::{Kind, State, single_term};

impl<'a> State<'a> {
    /// The outermost state of a compilation, in the root scope.
    pub fn main(is_dapp: bool) -> State<'a> {
        State::new(Kind::Main { is_dapp }, Scope::root())
    }

    /// Write the program.
    ///
    /// An expression script is entered at `""`: its result, the cleanup of
    /// every top-level binding, `Return`, then the chunks. A dApp has no
    /// top-level code, only chunks; its globals are never cleaned.
    pub fn finish(self, params: &mut Params<'_>) -> Result<(), CompileError> {
        let State {
            kind,
            terms,
            deferreds,
            parent,
            ..
        } = self;
        let is_dapp = match kind {
            Kind::Main { is_dapp } if parent.is_none() => is_dapp,
            other => {
                return Err(CompileError::malformed(format!(
                    "finish in {} state",
                    other.name()
                )));
            }
        };

        if is_dapp {
            if !terms.is_empty() {
                return Err(CompileError::malformed("dApp with a top-level expression"));
            }
            return write_chunks(params, deferreds);
        }

        let block = Block {
            result: single_term(terms, "script")?,
            deferreds,
        };
        let address = params.code.address()?;
        trace!(address, "Writing expression entry");
        params.entry_points.insert("".into(), address);
        block.write_body(&mut params.code)?;
        params.code.op(Opcode::Return);
        write_chunks(params, block.deferreds)
    }
}
