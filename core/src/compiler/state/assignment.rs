use crate::{
    Vec,
    compiler::{Block, CompileError, Deferred, Params, Term},
    format,
    vm::SlotId,
};

use super::{Kind, State, single_term};

impl<'a> State<'a> {
    /// Start `let name = ...`. The binding's slot is allocated here; the name
    /// becomes visible only after `return_`, so the right-hand side sees the
    /// outer binding of the same name.
    pub fn assignment(
        self,
        params: &mut Params<'_>,
        name: &'a str,
    ) -> Result<State<'a>, CompileError> {
        let slot = params.slots.binding(name, self.enclosing_function())?;
        let scope = self.scope.clone();
        Ok(self.enter(
            Kind::Assignment {
                slot,
                name: Some(name),
            },
            scope,
        ))
    }
}

/// Register the binding in the parent. A let-binding opens a new scope layer
/// on the parent holding its name, left by the driver after the body. An
/// argument is appended to the parent user call instead.
pub(super) fn close<'a>(
    mut parent: State<'a>,
    slot: SlotId,
    name: Option<&'a str>,
    terms: Vec<Term>,
    deferreds: Vec<Deferred>,
) -> Result<State<'a>, CompileError> {
    let block = Block {
        result: single_term(terms, "binding")?,
        deferreds,
    };

    match name {
        Some(name) => {
            parent.scope = parent.scope.child();
            parent.scope.set(name, slot);
        }
        None => match &mut parent.kind {
            Kind::CallUser { args, .. } => args.push(slot),
            other => {
                return Err(CompileError::malformed(format!(
                    "argument returned to {} state",
                    other.name()
                )));
            }
        },
    }

    parent.register(Deferred::Binding { slot, block });
    Ok(parent)
}
