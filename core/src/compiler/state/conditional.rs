//! `if cond then a else b`
//!
//! Transitions must come in the order `conditional`, `condition`,
//! `true_branch`, `false_branch`, `return_`. The condition is an anonymous
//! binding with its own chunk; each branch is compiled inline in a fresh
//! child of the scope the conditional was opened in.

use core::mem;

use crate::{
    Box, Vec,
    compiler::{Block, CompileError, Deferred, Params, Term},
    format,
    scope::Scope,
    vm::SlotId,
};

use super::{Kind, State, single_term};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Opened,
    Condition,
    TrueBranch,
    FalseBranch,
}

pub(crate) struct Conditional<'a> {
    pub phase: Phase,
    /// Scope the branches are children of.
    pub base: Scope<'a>,
    pub condition: Option<SlotId>,
    pub then_branch: Option<Term>,
}

impl<'a> State<'a> {
    pub fn conditional(self) -> State<'a> {
        let scope = self.scope.clone();
        self.enter(
            Kind::Conditional(Conditional {
                phase: Phase::Opened,
                base: scope.clone(),
                condition: None,
                then_branch: None,
            }),
            scope,
        )
    }

    /// Start compiling the condition.
    pub fn condition(mut self, params: &mut Params<'_>) -> Result<State<'a>, CompileError> {
        self.expect_phase(Phase::Opened, "condition")?;
        let slot = params.slots.binding("condition", self.enclosing_function())?;
        if let Kind::Conditional(branches) = &mut self.kind {
            branches.condition = Some(slot);
            branches.phase = Phase::Condition;
        }
        Ok(self)
    }

    /// Close the condition into its own chunk and start the true branch.
    pub fn true_branch(mut self) -> Result<State<'a>, CompileError> {
        self.expect_phase(Phase::Condition, "true branch")?;
        let result = single_term(mem::take(&mut self.terms), "condition")?;
        let deferreds = mem::take(&mut self.deferreds);

        let Kind::Conditional(branches) = &mut self.kind else {
            return Err(CompileError::malformed("true branch outside a conditional"));
        };
        let slot = branches
            .condition
            .ok_or_else(|| CompileError::malformed("condition without a slot"))?;
        branches.phase = Phase::TrueBranch;
        let scope = branches.base.child();

        self.scope = scope;
        self.register(Deferred::Binding {
            slot,
            block: Block { result, deferreds },
        });
        Ok(self)
    }

    pub fn false_branch(mut self) -> Result<State<'a>, CompileError> {
        self.expect_phase(Phase::TrueBranch, "false branch")?;
        let then_branch = single_term(mem::take(&mut self.terms), "true branch")?;

        let Kind::Conditional(branches) = &mut self.kind else {
            return Err(CompileError::malformed("false branch outside a conditional"));
        };
        branches.then_branch = Some(then_branch);
        branches.phase = Phase::FalseBranch;
        let scope = branches.base.child();

        self.scope = scope;
        Ok(self)
    }

    fn expect_phase(&self, expected: Phase, transition: &str) -> Result<(), CompileError> {
        match &self.kind {
            Kind::Conditional(branches) if branches.phase == expected => Ok(()),
            Kind::Conditional(branches) => Err(CompileError::malformed(format!(
                "{} after {:?}",
                transition, branches.phase
            ))),
            other => Err(CompileError::malformed(format!(
                "{} in {} state",
                transition,
                other.name()
            ))),
        }
    }
}

pub(super) fn close<'a>(
    mut parent: State<'a>,
    branches: Conditional<'a>,
    terms: Vec<Term>,
    deferreds: Vec<Deferred>,
) -> Result<State<'a>, CompileError> {
    if branches.phase != Phase::FalseBranch {
        return Err(CompileError::malformed(format!(
            "conditional returned after {:?}",
            branches.phase
        )));
    }
    let else_branch = single_term(terms, "false branch")?;
    let (Some(condition), Some(then_branch)) = (branches.condition, branches.then_branch) else {
        return Err(CompileError::malformed("incomplete conditional"));
    };

    parent.push_term(Term::Conditional {
        condition,
        then_branch: Box::new(then_branch),
        else_branch: Box::new(else_branch),
    });
    parent.deferreds.extend(deferreds);
    Ok(parent)
}
