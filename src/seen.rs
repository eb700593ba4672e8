use std::collections::{HashSet, VecDeque};

/// Message-IDs already answered, oldest forgotten first once `capacity` is
/// reached. Covers servers that don't set `\Seen` on fetch.
#[derive(Debug, Default)]
pub struct SeenMessages {
    capacity: usize,
    order: VecDeque<String>,
    ids: HashSet<String>,
}

impl SeenMessages {
    pub fn new(capacity: usize) -> Self {
        SeenMessages {
            capacity,
            order: VecDeque::with_capacity(capacity.min(4096)),
            ids: HashSet::new(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns false if the id was already remembered.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.capacity == 0 || self.ids.contains(id) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
        self.order
            .push_back(id.to_string());
        self.ids.insert(id.to_string());
        true
    }
}
