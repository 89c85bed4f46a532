//! Ride - a lazy bytecode compiler for the Ride smart-contract language
//!
//! # Overview
//!
//! The compiler turns a parsed script into linear bytecode for a
//! stack-based interpreter:
//!
//! - `let` bindings are evaluated at most once, on first use
//! - user-call arguments are lazy and shared the same way
//! - native functions are called by numeric id, user functions by address
//! - output is deterministic: the same tree always yields the same bytes
//!
//! # Quick Start
//!
//! ```
//! use ride::{Bump, Compiler};
//! use ride::ast::{Builder, Tree};
//!
//! let arena = Bump::new();
//! let b = Builder::new(&arena);
//!
//! // if (height > 100) then "late" else "early"
//! let body = b.if_(
//!     b.call(">", &[b.reference("height"), b.long(100)]),
//!     b.string("late"),
//!     b.string("early"),
//! );
//! let tree = Tree::expression(5, body);
//!
//! let natives = |name: &str| (name == ">").then_some(102);
//! let exe = Compiler::new(&natives).compile_tree("quick-start", &tree).unwrap();
//! assert_eq!(exe.entry_point(""), Some(0));
//! println!("{:?}", exe);
//! ```
//!
//! # dApps
//!
//! A dApp has global declarations, annotated callable functions and an
//! optional verifier. Each callable is entered by its name and the verifier
//! by `""`. See [`ast::Builder::dapp`].

// Re-export public API from ride_core
pub use ride_core::api::{CompilationOptions, Compiler, FunctionChecker, compile_tree};

// Re-export the tree, output and error types
pub use ride_core::ast;
pub use ride_core::vm::{self, Constant, Executable, Instruction, Opcode, Slot, SlotId, SlotKind};
pub use ride_core::CompileError;

pub use bumpalo::Bump;
