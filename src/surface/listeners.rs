use std::collections::HashMap;

use super::element::{ControlElement, ControlId};

/// Callback invoked with the new value and the element that sent it.
pub type ValueListener = Box<dyn FnMut(u8, &ControlElement)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Control identity -> listeners, in registration order.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: u64,
    listeners: HashMap<ControlId, Vec<(ListenerId, ValueListener)>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, control: ControlId, listener: ValueListener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.entry(control).or_default().push((id, listener));
        id
    }

    /// Returns whether `id` was registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        for list in self.listeners.values_mut() {
            if let Some(pos) = list.iter().position(|(lid, _)| *lid == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn dispatch(&mut self, control: ControlId, value: u8, sender: &ControlElement) {
        if let Some(list) = self.listeners.get_mut(&control) {
            for (_, listener) in list.iter_mut() {
                listener(value, sender);
            }
        }
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count_for(&self, control: ControlId) -> usize {
        self.listeners.get(&control).map_or(0, Vec::len)
    }
}
