//! Native function lookup.

/// Maps a native function name to its numeric id for one language version.
///
/// Closures implement it directly:
///
/// ```
/// use ride_core::FunctionChecker;
///
/// let checker = |name: &str| match name {
///     "+" => Some(100),
///     "==" => Some(0),
///     _ => None,
/// };
/// assert_eq!(checker.check("+"), Some(100));
/// assert_eq!(checker.check("sigVerify"), None);
/// ```
pub trait FunctionChecker {
    fn check(&self, name: &str) -> Option<u16>;
}

impl<F> FunctionChecker for F
where
    F: Fn(&str) -> Option<u16>,
{
    fn check(&self, name: &str) -> Option<u16> {
        self(name)
    }
}
