//! Public API of the Ride compiler.
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use ride_core::api::Compiler;
//! use ride_core::ast::{Builder, Tree};
//!
//! let arena = Bump::new();
//! let b = Builder::new(&arena);
//! let tree = Tree::expression(5, b.call("==", &[b.reference("height"), b.long(0)]));
//!
//! let checker = |name: &str| (name == "==").then_some(0);
//! let exe = Compiler::new(&checker).compile_tree("example", &tree).unwrap();
//! assert_eq!(exe.entry_point(""), Some(0));
//! ```

pub mod checker;
pub mod engine;
pub mod options;

pub use checker::FunctionChecker;
pub use engine::{Compiler, compile_tree};
pub use options::CompilationOptions;
