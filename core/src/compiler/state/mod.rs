//! Compiler states.
//!
//! Each state kind lives in its own module with the transitions that create
//! it and the `close_*` function that folds it into its parent on
//! `return_`.
//!
//! Chunk owners (main, bindings, functions) keep the deferreds registered
//! while they are active. Inline states (calls, conditionals, property
//! reads) forward theirs to the parent, so anything declared inside them is
//! hoisted to the nearest owner and written once.

mod assignment;
mod call;
mod conditional;
mod function;
mod main;
mod property;

use smallvec::SmallVec;
use tracing::trace;

use crate::{
    Box, Vec,
    compiler::{CompileError, Deferred, Params, Term},
    format,
    scope::Scope,
    vm::{Constant, SlotId},
};

pub(crate) use conditional::{Conditional, Phase};
pub(crate) use function::FuncDecl;

pub(crate) enum Kind<'a> {
    Main {
        is_dapp: bool,
    },
    /// A let-binding, or a user-call argument when `name` is `None`.
    Assignment {
        slot: SlotId,
        name: Option<&'a str>,
    },
    CallNative {
        id: u16,
        argc: usize,
    },
    CallUser {
        name: &'a str,
        function: SlotId,
        argc: usize,
        args: SmallVec<[SlotId; 4]>,
    },
    Conditional(Conditional<'a>),
    FuncDecl(FuncDecl<'a>),
    Property {
        field: SlotId,
    },
}

impl Kind<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Main { .. } => "main",
            Kind::Assignment { name: Some(_), .. } => "assignment",
            Kind::Assignment { name: None, .. } => "argument",
            Kind::CallNative { .. } => "native call",
            Kind::CallUser { .. } => "user call",
            Kind::Conditional(_) => "conditional",
            Kind::FuncDecl(_) => "function declaration",
            Kind::Property { .. } => "property access",
        }
    }
}

/// One active construct, linked to the construct that contains it.
pub(crate) struct State<'a> {
    kind: Kind<'a>,
    scope: Scope<'a>,
    /// Inline results, in evaluation order.
    terms: Vec<Term>,
    /// Out-of-line chunks registered here, in registration order.
    deferreds: Vec<Deferred>,
    parent: Option<Box<State<'a>>>,
}

impl<'a> State<'a> {
    fn new(kind: Kind<'a>, scope: Scope<'a>) -> Self {
        State {
            kind,
            scope,
            terms: Vec::new(),
            deferreds: Vec::new(),
            parent: None,
        }
    }

    /// Enter a child construct.
    fn enter(self, kind: Kind<'a>, scope: Scope<'a>) -> State<'a> {
        trace!(from = self.kind.name(), to = kind.name(), "Entering state");
        State {
            parent: Some(Box::new(self)),
            ..State::new(kind, scope)
        }
    }

    #[cfg(test)]
    pub fn kind(&self) -> &Kind<'a> {
        &self.kind
    }

    #[cfg(test)]
    pub fn scope(&self) -> &Scope<'a> {
        &self.scope
    }

    /// Slot of the innermost function whose body contains this state.
    fn enclosing_function(&self) -> Option<SlotId> {
        let mut state = Some(self);
        while let Some(current) = state {
            if let Kind::FuncDecl(decl) = &current.kind {
                return Some(decl.slot);
            }
            state = current.parent.as_deref();
        }
        None
    }

    fn push_term(&mut self, term: Term) {
        self.terms.push(term);
    }

    fn register(&mut self, deferred: Deferred) {
        trace!(slot = %deferred.slot(), owner = self.kind.name(), "Registering deferred");
        self.deferreds.push(deferred);
    }

    /// Push a literal.
    pub fn constant(
        mut self,
        params: &mut Params<'_>,
        constant: Constant,
    ) -> Result<State<'a>, CompileError> {
        let slot = params.slots.constant(constant)?;
        self.push_term(Term::Ref(slot));
        Ok(self)
    }

    /// Push a reference to a bound name. Never emits new code for the
    /// binding itself.
    pub fn reference(
        mut self,
        params: &mut Params<'_>,
        name: &str,
    ) -> Result<State<'a>, CompileError> {
        let slot = self
            .scope
            .get(name)
            .ok_or_else(|| CompileError::UnresolvedReference(name.into()))?;
        params.slots.referenced(slot);
        self.push_term(Term::Ref(slot));
        Ok(self)
    }

    /// Drop the innermost scope layer, opened by a let-binding or a function
    /// declaration once its continuation is compiled.
    pub fn leave_scope(mut self) -> Result<State<'a>, CompileError> {
        self.scope = self.scope.parent().ok_or_else(|| {
            CompileError::malformed(format!("leaving the root scope of {}", self.kind.name()))
        })?;
        Ok(self)
    }

    /// Fold this state into its parent.
    pub fn return_(self) -> Result<State<'a>, CompileError> {
        let State {
            kind,
            terms,
            deferreds,
            parent,
            ..
        } = self;
        let Some(parent) = parent else {
            return Err(CompileError::malformed(format!(
                "return from {} state without a parent",
                kind.name()
            )));
        };
        let parent = *parent;
        trace!(from = kind.name(), to = parent.kind.name(), "Returning");

        match kind {
            Kind::Main { .. } => Err(CompileError::malformed("main state cannot return")),
            Kind::Assignment { slot, name } => assignment::close(parent, slot, name, terms, deferreds),
            Kind::CallNative { id, argc } => call::close_native(parent, id, argc, terms, deferreds),
            Kind::CallUser {
                name,
                function,
                argc,
                args,
            } => call::close_user(parent, name, function, argc, args, deferreds),
            Kind::Conditional(branches) => conditional::close(parent, branches, terms, deferreds),
            Kind::FuncDecl(decl) => function::close(parent, decl, terms, deferreds),
            Kind::Property { field } => property::close(parent, field, terms, deferreds),
        }
    }
}

/// The single result of a construct that produces exactly one value.
fn single_term(terms: Vec<Term>, what: &str) -> Result<Term, CompileError> {
    let count = terms.len();
    let mut terms = terms.into_iter();
    match (terms.next(), count) {
        (Some(term), 1) => Ok(term),
        _ => Err(CompileError::malformed(format!(
            "{} produced {} values, expected 1",
            what, count
        ))),
    }
}
