//! Input tree for the compiler.
//!
//! Trees are produced by an external parser and allocated in a `bumpalo`
//! arena, so every child is a plain `&'a` reference and the whole tree is
//! `Copy`. The compiler never mutates a tree.
//!
//! A script is either an *expression script* (a single verifier expression)
//! or a *dApp* (global declarations, annotated callable functions and an
//! optional verifier function).

mod builder;

pub use builder::Builder;

/// A node of the expression tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node<'a> {
    Long(i64),
    Bytes(&'a [u8]),
    String(&'a str),
    Boolean(bool),
    Reference(&'a str),
    FunctionCall {
        name: &'a str,
        args: &'a [Node<'a>],
    },
    /// `let name = expr; body`
    Assignment {
        name: &'a str,
        expr: &'a Node<'a>,
        body: &'a Node<'a>,
    },
    Conditional {
        cond: &'a Node<'a>,
        then_branch: &'a Node<'a>,
        else_branch: &'a Node<'a>,
    },
    /// `func name(params) = body; next`
    FunctionDeclaration {
        name: &'a str,
        params: &'a [&'a str],
        body: &'a Node<'a>,
        next: &'a Node<'a>,
    },
    PropertyAccess {
        object: &'a Node<'a>,
        name: &'a str,
    },
}

impl Node<'_> {
    /// Short name of the node kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Long(_) => "long",
            Node::Bytes(_) => "bytes",
            Node::String(_) => "string",
            Node::Boolean(_) => "boolean",
            Node::Reference(_) => "reference",
            Node::FunctionCall { .. } => "function call",
            Node::Assignment { .. } => "assignment",
            Node::Conditional { .. } => "conditional",
            Node::FunctionDeclaration { .. } => "function declaration",
            Node::PropertyAccess { .. } => "property access",
        }
    }
}

/// A user function without continuation, as found in dApp declarations and
/// callables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Function<'a> {
    pub name: &'a str,
    pub params: &'a [&'a str],
    pub body: &'a Node<'a>,
}

/// A global dApp declaration, visible to every callable and the verifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Declaration<'a> {
    Let { name: &'a str, expr: &'a Node<'a> },
    Function(Function<'a>),
}

/// An annotated dApp function. `invocation` names the implicit parameter that
/// receives the invocation context (`@Callable(i)`, `@Verifier(tx)`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Callable<'a> {
    pub invocation: &'a str,
    pub function: Function<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verifier<'a> {
    /// Body of an expression script.
    Expression(&'a Node<'a>),
    /// `@Verifier` function of a dApp.
    Callable(Callable<'a>),
}

impl Verifier<'_> {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Verifier::Expression(_) => "expression verifier",
            Verifier::Callable(_) => "callable verifier",
        }
    }
}

/// A parsed script.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tree<'a> {
    pub lib_version: u8,
    /// Zero for expression scripts, the dApp format version otherwise.
    pub app_version: u8,
    pub declarations: &'a [Declaration<'a>],
    pub functions: &'a [Callable<'a>],
    pub verifier: Option<Verifier<'a>>,
}

impl<'a> Tree<'a> {
    /// An expression script with the given body.
    pub fn expression(lib_version: u8, body: &'a Node<'a>) -> Self {
        Tree {
            lib_version,
            app_version: 0,
            declarations: &[],
            functions: &[],
            verifier: Some(Verifier::Expression(body)),
        }
    }

    pub fn is_dapp(&self) -> bool {
        self.app_version != 0
    }
}
