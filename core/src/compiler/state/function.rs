use crate::{
    String, Vec,
    compiler::{Block, CompileError, Deferred, Params, Term},
    scope::Callee,
    vm::SlotId,
};

use super::{Kind, State, single_term};

pub(crate) struct FuncDecl<'a> {
    pub slot: SlotId,
    pub name: &'a str,
    pub params: Vec<SlotId>,
    /// Implicit first parameter of dApp callables and the dApp verifier.
    pub invocation: Option<SlotId>,
    /// Entry point name. Functions with an entry are not callable from
    /// script code.
    pub entry: Option<String>,
}

impl<'a> State<'a> {
    /// Start a function declaration. Allocates the function slot, then the
    /// invocation slot if any, then one slot per parameter, and opens the
    /// body scope binding them.
    pub fn function(
        self,
        params: &mut Params<'_>,
        name: &'a str,
        param_names: &'a [&'a str],
        invocation: Option<&'a str>,
        entry: Option<String>,
    ) -> Result<State<'a>, CompileError> {
        let slot = params.slots.code(name)?;
        let mut scope = self.scope.child();

        let invocation = match invocation {
            Some(invocation_name) => {
                let id = params.slots.parameter(invocation_name)?;
                scope.set(invocation_name, id);
                Some(id)
            }
            None => None,
        };

        let mut slots = Vec::with_capacity(param_names.len());
        for &param in param_names {
            let id = params.slots.parameter(param)?;
            scope.set(param, id);
            slots.push(id);
        }

        Ok(self.enter(
            Kind::FuncDecl(FuncDecl {
                slot,
                name,
                params: slots,
                invocation,
                entry,
            }),
            scope,
        ))
    }
}

/// Register the function chunk in the parent. A plain function also becomes
/// callable in a new scope layer of the parent, left by the driver after the
/// declaration's continuation.
pub(super) fn close<'a>(
    mut parent: State<'a>,
    decl: FuncDecl<'a>,
    terms: Vec<Term>,
    deferreds: Vec<Deferred>,
) -> Result<State<'a>, CompileError> {
    let block = Block {
        result: single_term(terms, "function body")?,
        deferreds,
    };

    if decl.entry.is_none() {
        parent.scope = parent.scope.child();
        parent.scope.set_func(
            decl.name,
            Callee {
                slot: decl.slot,
                arity: decl.params.len(),
            },
        );
    }

    parent.register(Deferred::Function {
        slot: decl.slot,
        entry: decl.entry,
        invocation: decl.invocation,
        params: decl.params,
        block,
    });
    Ok(parent)
}
