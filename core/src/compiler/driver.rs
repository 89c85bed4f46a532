//! Recursive walk over the tree, driving state transitions.

use crate::{
    ToString,
    ast::Node,
    compiler::{CompileError, Params, State},
    vm::Constant,
};

/// Compile `node` against `state`. `depth` is the nesting level of `node`,
/// starting at 1 for the root of an expression.
pub(crate) fn compile<'a>(
    params: &mut Params<'_>,
    state: State<'a>,
    node: &'a Node<'a>,
    depth: usize,
) -> Result<State<'a>, CompileError> {
    if depth > params.options.max_depth {
        return Err(CompileError::NestingTooDeep(params.options.max_depth));
    }
    let next = depth + 1;

    match *node {
        Node::Long(value) => state.constant(params, Constant::Long(value)),
        Node::Bytes(bytes) => state.constant(params, Constant::Bytes(bytes.to_vec())),
        Node::String(s) => state.constant(params, Constant::String(s.to_string())),
        Node::Boolean(value) => state.constant(params, Constant::Boolean(value)),
        Node::Reference(name) => state.reference(params, name),
        Node::FunctionCall { name, args } => {
            let mut state = state.call(params, name, args.len())?;
            for arg in args {
                state = state.argument(params)?;
                state = compile(params, state, arg, next)?;
                state = state.end_argument()?;
            }
            state.return_()
        }
        Node::Assignment { name, expr, body } => {
            let state = state.assignment(params, name)?;
            let state = compile(params, state, expr, next)?;
            let state = state.return_()?;
            let state = compile(params, state, body, next)?;
            state.leave_scope()
        }
        Node::Conditional {
            cond,
            then_branch,
            else_branch,
        } => {
            let state = state.conditional().condition(params)?;
            let state = compile(params, state, cond, next)?;
            let state = state.true_branch()?;
            let state = compile(params, state, then_branch, next)?;
            let state = state.false_branch()?;
            let state = compile(params, state, else_branch, next)?;
            state.return_()
        }
        Node::FunctionDeclaration {
            name,
            params: param_names,
            body,
            next: continuation,
        } => {
            let state = state.function(params, name, param_names, None, None)?;
            let state = compile(params, state, body, next)?;
            let state = state.return_()?;
            let state = compile(params, state, continuation, next)?;
            state.leave_scope()
        }
        Node::PropertyAccess { object, name } => {
            let state = state.property(params, name)?;
            let state = compile(params, state, object, next)?;
            state.return_()
        }
    }
}
