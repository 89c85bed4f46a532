use crate::{
    Box, ToString, Vec,
    compiler::{CompileError, Deferred, Params, Term},
    vm::{Constant, SlotId},
};

use super::{Kind, State, single_term};

impl<'a> State<'a> {
    /// Start `object.name`. The field name is stored as a string constant.
    pub fn property(self, params: &mut Params<'_>, name: &str) -> Result<State<'a>, CompileError> {
        let field = params.slots.constant(Constant::String(name.to_string()))?;
        let scope = self.scope.clone();
        Ok(self.enter(Kind::Property { field }, scope))
    }
}

pub(super) fn close<'a>(
    mut parent: State<'a>,
    field: SlotId,
    terms: Vec<Term>,
    deferreds: Vec<Deferred>,
) -> Result<State<'a>, CompileError> {
    let object = single_term(terms, "property object")?;
    parent.push_term(Term::Property {
        object: Box::new(object),
        field,
    });
    parent.deferreds.extend(deferreds);
    Ok(parent)
}
