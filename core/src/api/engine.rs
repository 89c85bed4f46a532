//! Entry points of a compilation.

use tracing::debug;

use super::{CompilationOptions, FunctionChecker};
use crate::ast::{Declaration, Tree, Verifier};
use crate::compiler::{CompileError, Params, State, compile};
use crate::vm::Executable;
use crate::ToString;

/// Compiles trees into executables.
///
/// A compiler holds no state between compilations: every call starts from a
/// fresh slot table and code buffer, so compiling the same tree twice yields
/// identical executables.
///
/// # Example
///
/// ```
/// use bumpalo::Bump;
/// use ride_core::api::{CompilationOptions, Compiler};
/// use ride_core::ast::{Builder, Tree};
///
/// let arena = Bump::new();
/// let b = Builder::new(&arena);
/// // let x = 1 + 1; x == x
/// let body = b.let_(
///     "x",
///     b.call("+", &[b.long(1), b.long(1)]),
///     b.call("==", &[b.reference("x"), b.reference("x")]),
/// );
/// let tree = Tree::expression(5, body);
///
/// let checker = |name: &str| match name {
///     "+" => Some(100),
///     "==" => Some(0),
///     _ => None,
/// };
/// let compiler = Compiler::new(&checker).with_options(CompilationOptions { max_depth: 32 });
/// let exe = compiler.compile_verifier("x-twice", &tree).unwrap();
/// assert_eq!(exe.byte_code.len(), 30);
/// ```
pub struct Compiler<'c> {
    checker: &'c dyn FunctionChecker,
    options: CompilationOptions,
}

impl<'c> Compiler<'c> {
    /// The checker must match the tree's `lib_version`.
    pub fn new(checker: &'c dyn FunctionChecker) -> Self {
        Self {
            checker,
            options: CompilationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompilationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CompilationOptions {
        &self.options
    }

    /// Compile an expression script. `id` names the script in log output.
    pub fn compile_verifier(&self, id: &str, tree: &Tree<'_>) -> Result<Executable, CompileError> {
        debug!(id, lib_version = tree.lib_version, "Compiling expression script");

        if !tree.declarations.is_empty() || !tree.functions.is_empty() {
            return Err(CompileError::malformed(
                "expression script with declarations or callable functions",
            ));
        }
        let body = match tree.verifier {
            Some(Verifier::Expression(body)) => body,
            Some(other) => {
                return Err(CompileError::UnexpectedNodeKind {
                    expected: "expression verifier",
                    found: other.kind_name(),
                });
            }
            None => return Err(CompileError::malformed("expression script without a body")),
        };

        let mut params = Params::new(self.checker, self.options.clone());
        let state = compile(&mut params, State::main(false), body, 1)?;
        state.finish(&mut params)?;
        self.assemble(id, tree.lib_version, params, false, true)
    }

    /// Compile a dApp: global declarations, callable functions and an
    /// optional verifier function.
    pub fn compile_dapp(&self, id: &str, tree: &Tree<'_>) -> Result<Executable, CompileError> {
        debug!(
            id,
            lib_version = tree.lib_version,
            declarations = tree.declarations.len(),
            callables = tree.functions.len(),
            "Compiling dApp"
        );

        let mut params = Params::new(self.checker, self.options.clone());
        let mut state = State::main(true);

        for declaration in tree.declarations {
            state = match *declaration {
                Declaration::Let { name, expr } => {
                    let binding = state.assignment(&mut params, name)?;
                    compile(&mut params, binding, expr, 1)?.return_()?
                }
                Declaration::Function(function) => {
                    let decl =
                        state.function(&mut params, function.name, function.params, None, None)?;
                    compile(&mut params, decl, function.body, 1)?.return_()?
                }
            };
        }

        for callable in tree.functions {
            let function = callable.function;
            let decl = state.function(
                &mut params,
                function.name,
                function.params,
                Some(callable.invocation),
                Some(function.name.to_string()),
            )?;
            state = compile(&mut params, decl, function.body, 1)?.return_()?;
        }

        match tree.verifier {
            Some(Verifier::Callable(verifier)) => {
                let function = verifier.function;
                let decl = state.function(
                    &mut params,
                    function.name,
                    function.params,
                    Some(verifier.invocation),
                    Some("".to_string()),
                )?;
                state = compile(&mut params, decl, function.body, 1)?.return_()?;
            }
            Some(other) => {
                return Err(CompileError::UnexpectedNodeKind {
                    expected: "callable verifier",
                    found: other.kind_name(),
                });
            }
            None => {}
        }

        state.finish(&mut params)?;
        self.assemble(id, tree.lib_version, params, true, tree.verifier.is_some())
    }

    /// Compile a dApp or an expression script, whichever `tree` is.
    pub fn compile_tree(&self, id: &str, tree: &Tree<'_>) -> Result<Executable, CompileError> {
        if tree.is_dapp() {
            self.compile_dapp(id, tree)
        } else {
            self.compile_verifier(id, tree)
        }
    }

    fn assemble(
        &self,
        id: &str,
        lib_version: u8,
        params: Params<'_>,
        is_dapp: bool,
        has_verifier: bool,
    ) -> Result<Executable, CompileError> {
        let slot_count = params.slots.len();
        let exe = params.finish(lib_version, is_dapp, has_verifier)?;
        debug!(
            id,
            bytes = exe.byte_code.len(),
            slots = slot_count,
            entries = exe.entry_points.len(),
            "Compiled"
        );
        Ok(exe)
    }
}

/// Compile `tree` with default options.
pub fn compile_tree(
    id: &str,
    tree: &Tree<'_>,
    checker: &dyn FunctionChecker,
) -> Result<Executable, CompileError> {
    Compiler::new(checker).compile_tree(id, tree)
}
