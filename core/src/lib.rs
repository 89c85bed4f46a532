#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

extern crate alloc;

// Re-export for convenience so other modules don't need alloc:: prefix
#[allow(unused_imports)]
pub(crate) use alloc::{boxed::Box, format, string::String, string::ToString, vec, vec::Vec};

pub mod api;
pub mod ast;
pub mod compiler;
pub mod scope;
pub mod vm;

pub use api::{CompilationOptions, Compiler, FunctionChecker, compile_tree};
pub use compiler::CompileError;
pub use vm::{Executable, SlotId};
