//! Arena-backed tree construction.

use bumpalo::Bump;

use crate::Vec;

use super::{Callable, Declaration, Function, Node, Tree, Verifier};

/// Allocates tree nodes in a `Bump` arena.
///
/// ```
/// use bumpalo::Bump;
/// use ride_core::ast::Builder;
///
/// let arena = Bump::new();
/// let b = Builder::new(&arena);
/// // let x = 1 + 1; x == x
/// let body = b.let_(
///     "x",
///     b.call("+", &[b.long(1), b.long(1)]),
///     b.call("==", &[b.reference("x"), b.reference("x")]),
/// );
/// assert!(matches!(body, ride_core::ast::Node::Assignment { .. }));
/// ```
#[derive(Clone, Copy)]
pub struct Builder<'a> {
    arena: &'a Bump,
}

impl<'a> Builder<'a> {
    pub fn new(arena: &'a Bump) -> Self {
        Self { arena }
    }

    fn node(&self, node: Node<'a>) -> &'a Node<'a> {
        self.arena.alloc(node)
    }

    fn str(&self, s: &str) -> &'a str {
        self.arena.alloc_str(s)
    }

    fn nodes(&self, nodes: &[&'a Node<'a>]) -> &'a [Node<'a>] {
        self.arena
            .alloc_slice_fill_iter(nodes.iter().map(|node| **node))
    }

    fn names(&self, names: &[&str]) -> &'a [&'a str] {
        let names: Vec<&'a str> = names.iter().map(|name| self.str(name)).collect();
        self.arena.alloc_slice_copy(&names)
    }

    pub fn long(&self, value: i64) -> &'a Node<'a> {
        self.node(Node::Long(value))
    }

    pub fn bytes(&self, value: &[u8]) -> &'a Node<'a> {
        self.node(Node::Bytes(self.arena.alloc_slice_copy(value)))
    }

    pub fn string(&self, value: &str) -> &'a Node<'a> {
        self.node(Node::String(self.str(value)))
    }

    pub fn boolean(&self, value: bool) -> &'a Node<'a> {
        self.node(Node::Boolean(value))
    }

    pub fn reference(&self, name: &str) -> &'a Node<'a> {
        self.node(Node::Reference(self.str(name)))
    }

    pub fn call(&self, name: &str, args: &[&'a Node<'a>]) -> &'a Node<'a> {
        self.node(Node::FunctionCall {
            name: self.str(name),
            args: self.nodes(args),
        })
    }

    /// `let name = expr; body`
    pub fn let_(&self, name: &str, expr: &'a Node<'a>, body: &'a Node<'a>) -> &'a Node<'a> {
        self.node(Node::Assignment {
            name: self.str(name),
            expr,
            body,
        })
    }

    pub fn if_(
        &self,
        cond: &'a Node<'a>,
        then_branch: &'a Node<'a>,
        else_branch: &'a Node<'a>,
    ) -> &'a Node<'a> {
        self.node(Node::Conditional {
            cond,
            then_branch,
            else_branch,
        })
    }

    /// `func name(params) = body; next`
    pub fn func(
        &self,
        name: &str,
        params: &[&str],
        body: &'a Node<'a>,
        next: &'a Node<'a>,
    ) -> &'a Node<'a> {
        self.node(Node::FunctionDeclaration {
            name: self.str(name),
            params: self.names(params),
            body,
            next,
        })
    }

    pub fn property(&self, object: &'a Node<'a>, name: &str) -> &'a Node<'a> {
        self.node(Node::PropertyAccess {
            object,
            name: self.str(name),
        })
    }

    pub fn function(&self, name: &str, params: &[&str], body: &'a Node<'a>) -> Function<'a> {
        Function {
            name: self.str(name),
            params: self.names(params),
            body,
        }
    }

    pub fn global_let(&self, name: &str, expr: &'a Node<'a>) -> Declaration<'a> {
        Declaration::Let {
            name: self.str(name),
            expr,
        }
    }

    pub fn callable(&self, invocation: &str, function: Function<'a>) -> Callable<'a> {
        Callable {
            invocation: self.str(invocation),
            function,
        }
    }

    pub fn dapp(
        &self,
        lib_version: u8,
        declarations: &[Declaration<'a>],
        functions: &[Callable<'a>],
        verifier: Option<Callable<'a>>,
    ) -> Tree<'a> {
        Tree {
            lib_version,
            app_version: 1,
            declarations: self.arena.alloc_slice_copy(declarations),
            functions: self.arena.alloc_slice_copy(functions),
            verifier: verifier.map(Verifier::Callable),
        }
    }
}
