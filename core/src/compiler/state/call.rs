//! Native and user function calls.
//!
//! A user function found in scope wins over a native of the same name.
//! Native arguments are inline terms evaluated once, before the call. User
//! arguments are anonymous bindings: each gets a slot and a chunk, and the
//! callee evaluates it at most once, on first use.

use smallvec::SmallVec;

use crate::{
    Vec,
    compiler::{CompileError, Deferred, Params, Term},
    format,
    vm::SlotId,
};

use super::{Kind, State};

impl<'a> State<'a> {
    /// Start a call of `name` with `argc` arguments.
    pub fn call(
        self,
        params: &mut Params<'_>,
        name: &'a str,
        argc: usize,
    ) -> Result<State<'a>, CompileError> {
        let kind = if let Some(callee) = self.scope.get_func(name) {
            if callee.arity != argc {
                return Err(CompileError::malformed(format!(
                    "function '{}' takes {} arguments, {} given",
                    name, callee.arity, argc
                )));
            }
            Kind::CallUser {
                name,
                function: callee.slot,
                argc,
                args: SmallVec::new(),
            }
        } else if let Some(id) = params.checker.check(name) {
            params.slots.native(name, id)?;
            Kind::CallNative { id, argc }
        } else {
            return Err(CompileError::UnknownFunction(name.into()));
        };

        let scope = self.scope.clone();
        Ok(self.enter(kind, scope))
    }

    /// Start the next argument of the current call.
    pub fn argument(self, params: &mut Params<'_>) -> Result<State<'a>, CompileError> {
        match &self.kind {
            Kind::CallNative { .. } => Ok(self),
            Kind::CallUser { name, args, .. } => {
                let slot = params.slots.binding(
                    &format!("{}:{}", name, args.len()),
                    self.enclosing_function(),
                )?;
                let scope = self.scope.clone();
                Ok(self.enter(Kind::Assignment { slot, name: None }, scope))
            }
            other => Err(CompileError::malformed(format!(
                "argument in {} state",
                other.name()
            ))),
        }
    }

    /// Finish the current argument.
    pub fn end_argument(self) -> Result<State<'a>, CompileError> {
        match &self.kind {
            Kind::CallNative { .. } => Ok(self),
            Kind::Assignment { name: None, .. } => self.return_(),
            other => Err(CompileError::malformed(format!(
                "end of argument in {} state",
                other.name()
            ))),
        }
    }
}

pub(super) fn close_native<'a>(
    mut parent: State<'a>,
    id: u16,
    argc: usize,
    terms: Vec<Term>,
    deferreds: Vec<Deferred>,
) -> Result<State<'a>, CompileError> {
    if terms.len() != argc {
        return Err(CompileError::malformed(format!(
            "native call expects {} arguments, got {}",
            argc,
            terms.len()
        )));
    }
    parent.push_term(Term::NativeCall { id, args: terms });
    parent.deferreds.extend(deferreds);
    Ok(parent)
}

pub(super) fn close_user<'a>(
    mut parent: State<'a>,
    name: &str,
    function: SlotId,
    argc: usize,
    args: SmallVec<[SlotId; 4]>,
    deferreds: Vec<Deferred>,
) -> Result<State<'a>, CompileError> {
    if args.len() != argc {
        return Err(CompileError::malformed(format!(
            "call of '{}' expects {} arguments, got {}",
            name,
            argc,
            args.len()
        )));
    }
    parent.push_term(Term::UserCall { function, args });
    parent.deferreds.extend(deferreds);
    Ok(parent)
}
