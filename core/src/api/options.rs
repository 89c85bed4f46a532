//! Configuration options for the compiler.

/// Configuration options for compilation.
///
/// # Example
///
/// ```
/// use ride_core::api::CompilationOptions;
///
/// let options = CompilationOptions { max_depth: 64 };
/// assert_ne!(options, CompilationOptions::default());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationOptions {
    /// Maximum nesting of tree nodes. Deeper trees fail with
    /// `CompileError::NestingTooDeep` instead of exhausting the stack.
    ///
    /// Default: 256
    pub max_depth: usize,
}

impl Default for CompilationOptions {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}
