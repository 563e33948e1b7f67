use crate::engine::SimObject;
use std::collections::VecDeque;

/// Types of world membership events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldEventType {
    /// An object has been inserted into the world
    Added,

    /// An object has been removed from the world
    Removed,
}

/// An event related to a single world object
#[derive(Debug, Clone, PartialEq)]
pub struct WorldEvent {
    /// The type of event
    pub event_type: WorldEventType,

    /// The object that the event refers to
    pub object: SimObject,
}

/// A queue of world events, drained by the caller
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<WorldEvent>,
}

impl EventQueue {
    /// Creates a new empty event queue
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
        }
    }

    /// Adds an event to the queue
    pub fn push(&mut self, event: WorldEvent) {
        self.events.push_back(event);
    }

    /// Gets the next event from the queue
    pub fn next_event(&mut self) -> Option<WorldEvent> {
        self.events.pop_front()
    }

    /// Returns whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Clears all events from the queue
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Gets all events of a specific type
    pub fn events_of_type(&self, event_type: WorldEventType) -> Vec<&WorldEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }
}
