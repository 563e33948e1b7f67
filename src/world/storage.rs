use std::collections::HashMap;
use crate::engine::{BodyHandle, CompositeHandle};
use crate::error::BindingError;
use crate::Result;

/// Generic storage trait for engine-owned objects
pub trait Storage<T, H> {
    /// Creates a new empty storage
    fn new() -> Self;

    /// Adds an item to the storage and returns its handle
    fn add(&mut self, item: T) -> H;

    /// Gets a reference to an item by its handle
    fn get(&self, handle: H) -> Option<&T>;

    /// Gets a mutable reference to an item by its handle
    fn get_mut(&mut self, handle: H) -> Option<&mut T>;

    /// Removes an item from the storage
    fn remove(&mut self, handle: H) -> Option<T>;

    /// Returns the number of items in the storage
    fn len(&self) -> usize;

    /// Returns whether the storage is empty
    fn is_empty(&self) -> bool;
}

/// Storage for bodies
pub struct BodyStorage<T> {
    items: HashMap<BodyHandle, T>,
    next_id: u32,
}

impl<T> Storage<T, BodyHandle> for BodyStorage<T> {
    fn new() -> Self {
        Self {
            items: HashMap::new(),
            next_id: 1, // Start at 1, so 0 can represent invalid handle
        }
    }

    fn add(&mut self, item: T) -> BodyHandle {
        let handle = BodyHandle(self.next_id);
        self.next_id += 1;
        self.items.insert(handle, item);
        handle
    }

    fn get(&self, handle: BodyHandle) -> Option<&T> {
        self.items.get(&handle)
    }

    fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut T> {
        self.items.get_mut(&handle)
    }

    fn remove(&mut self, handle: BodyHandle) -> Option<T> {
        self.items.remove(&handle)
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> BodyStorage<T> {
    /// Gets a body by its handle, returning an error if not found
    pub fn get_body(&self, handle: BodyHandle) -> Result<&T> {
        self.get(handle)
            .ok_or_else(|| BindingError::ResourceNotFound(format!("Body with handle {:?} not found", handle)))
    }

    /// Gets a mutable reference to a body by its handle, returning an error if not found
    pub fn get_body_mut(&mut self, handle: BodyHandle) -> Result<&mut T> {
        self.get_mut(handle)
            .ok_or_else(|| BindingError::ResourceNotFound(format!("Body with handle {:?} not found", handle)))
    }
}

/// Storage for composites; each composite is an ordered list of member bodies
pub struct CompositeStorage {
    items: HashMap<CompositeHandle, Vec<BodyHandle>>,
    next_id: u32,
}

impl Storage<Vec<BodyHandle>, CompositeHandle> for CompositeStorage {
    fn new() -> Self {
        Self {
            items: HashMap::new(),
            next_id: 1,
        }
    }

    fn add(&mut self, item: Vec<BodyHandle>) -> CompositeHandle {
        let handle = CompositeHandle(self.next_id);
        self.next_id += 1;
        self.items.insert(handle, item);
        handle
    }

    fn get(&self, handle: CompositeHandle) -> Option<&Vec<BodyHandle>> {
        self.items.get(&handle)
    }

    fn get_mut(&mut self, handle: CompositeHandle) -> Option<&mut Vec<BodyHandle>> {
        self.items.get_mut(&handle)
    }

    fn remove(&mut self, handle: CompositeHandle) -> Option<Vec<BodyHandle>> {
        self.items.remove(&handle)
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
