use crate::object::Object;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope. Closures keep their defining scope alive through it.
pub type Env = Rc<RefCell<Environment>>;

/// One lexical scope: local bindings plus an optional enclosing scope.
///
/// Lookups walk outward until a binding is found; writes always land in the
/// local scope, so an inner binding shadows an outer one without touching it.
#[derive(Debug, Default)]
pub struct Environment {
    store: HashMap<String, Object>,
    outer: Option<Env>,
}

impl Environment {
    /// The global scope of a program run.
    pub fn new() -> Env {
        Rc::new(RefCell::new(Default::default()))
    }

    /// A scope for one function call, chained to the function's defining scope.
    pub fn new_enclosed(outer: &Env) -> Env {
        Rc::new(RefCell::new(Self {
            store: Default::default(),
            outer: Some(Rc::clone(outer)),
        }))
    }

    pub fn get(&self, name: &str) -> Option<Object> {
        match self.store.get(name) {
            Some(val) => Some(val.clone()),
            None => self.outer.as_ref()?.borrow().get(name),
        }
    }

    pub fn set(&mut self, name: &str, val: Object) -> Object {
        self.store.insert(name.to_owned(), val.clone());
        val
    }
}
