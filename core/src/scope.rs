//! Lexical scopes for name resolution.
//!
//! A scope is a chain of layers searched from innermost to outermost. Layers
//! are reference counted and never shared mutably: binding into a layer that
//! another scope also holds copies it first, so a child can never change what
//! its parent sees.
//!
//! Two namespaces are kept per layer:
//! - **values**: let-bindings, parameters and predefined names
//! - **functions**: user functions, with their arity
//!
//! ```text
//! let height = height   // right side resolves in the outer layer
//! height != 0           // resolves to the new slot
//! ```

use alloc::rc::Rc;

use hashbrown::HashMap;

use crate::vm::{PREDEFINED, SlotId, predefined_slot};

/// A user function as seen from a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Callee {
    pub slot: SlotId,
    pub arity: usize,
}

#[derive(Clone, Default)]
struct Layer<'a> {
    values: HashMap<&'a str, SlotId>,
    functions: HashMap<&'a str, Callee>,
    parent: Option<Rc<Layer<'a>>>,
}

#[derive(Clone)]
pub struct Scope<'a>(Rc<Layer<'a>>);

impl<'a> Scope<'a> {
    /// An empty scope with no parent.
    pub fn empty() -> Self {
        Scope(Rc::new(Layer::default()))
    }

    /// The outermost scope of a script: binds every predefined name to its
    /// reserved slot.
    pub fn root() -> Self {
        let mut scope = Scope::empty();
        for name in PREDEFINED {
            if let Some(slot) = predefined_slot(name) {
                scope.set(name, slot);
            }
        }
        scope
    }

    /// A new empty layer nested in this one.
    pub fn child(&self) -> Self {
        Scope(Rc::new(Layer {
            parent: Some(Rc::clone(&self.0)),
            ..Layer::default()
        }))
    }

    /// The enclosing scope, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        self.0.parent.clone().map(Scope)
    }

    /// Look up a value, searching layers from innermost to outermost.
    pub fn get(&self, name: &str) -> Option<SlotId> {
        self.layers().find_map(|layer| layer.values.get(name).copied())
    }

    /// Bind a value in the innermost layer, shadowing outer bindings.
    pub fn set(&mut self, name: &'a str, slot: SlotId) {
        Rc::make_mut(&mut self.0).values.insert(name, slot);
    }

    pub fn get_func(&self, name: &str) -> Option<Callee> {
        self.layers()
            .find_map(|layer| layer.functions.get(name).copied())
    }

    pub fn set_func(&mut self, name: &'a str, callee: Callee) {
        Rc::make_mut(&mut self.0).functions.insert(name, callee);
    }

    /// Number of layers, counting this one.
    pub fn depth(&self) -> usize {
        self.layers().count()
    }

    fn layers(&self) -> impl Iterator<Item = &Layer<'a>> {
        core::iter::successors(Some(&*self.0), |layer| layer.parent.as_deref())
    }
}

impl core::fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scope")
            .field("depth", &self.depth())
            .field("values", &self.0.values.len())
            .field("functions", &self.0.functions.len())
            .finish()
    }
}
