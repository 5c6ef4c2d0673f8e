//! Topic management
//!
//! A `Topic` holds the ids of the clients subscribed to one topic name, in
//! subscription order. A client appears at most once. Removal swaps the last
//! subscriber into the vacated slot, so order is only loosely preserved.

use crate::client::ClientId;

#[derive(Debug, Default)]
pub struct Topic {
    pub name: String,
    pub subscribers: Vec<ClientId>,
}

impl Topic {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subscribers: Vec::new(),
        }
    }

    /// Add a subscriber. Returns `false` if it was already subscribed.
    pub fn subscribe(&mut self, id: ClientId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.subscribers.push(id);
        true
    }

    /// Remove a subscriber. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: &str) -> bool {
        match self.subscribers.iter().position(|s| s == id) {
            Some(index) => {
                self.subscribers.swap_remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.subscribers.iter().any(|s| s == id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
