use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Anything that evaluates to a scalar: property references, lookup tables,
/// whole functions. Leaf evaluators supplied by collaborators only need to
/// implement this.
pub trait Parameter: fmt::Debug {
    fn value(&self) -> f64;
}

/// A named scalar slot shared between its producer and any number of
/// expression trees. Cloning a `Property` clones the handle, not the slot.
#[derive(Clone)]
pub struct Property {
    name: Rc<str>,
    slot: Rc<Cell<f64>>,
}

impl Property {
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: Rc::from(name),
            slot: Rc::new(Cell::new(value)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self) -> f64 {
        self.slot.get()
    }

    pub fn set(&self, value: f64) {
        self.slot.set(value);
    }
}

impl Parameter for Property {
    fn value(&self) -> f64 {
        self.get()
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Property({} = {})", self.name, self.get())
    }
}

/// String-keyed registry of shared property slots.
///
/// Producers publish into the bus by name; expression trees bind to the
/// underlying slots at construction, so later `set` calls are visible to
/// every bound tree without re-resolution.
#[derive(Debug, Default, Clone)]
pub struct PropertyBus {
    slots: HashMap<String, Property>,
}

impl PropertyBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for `name`, creating the slot (initialized to 0.0) if absent.
    pub fn node(&mut self, name: &str) -> Property {
        self.slots
            .entry(name.to_string())
            .or_insert_with(|| Property::new(name, 0.0))
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.slots.get(name).map(Property::get)
    }

    pub fn set(&mut self, name: &str, value: f64) {
        self.node(name).set(value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }
}
