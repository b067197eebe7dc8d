//! The proxy store: an append-only history of `Message`s plus the small
//! amount of UI-facing cursor state layered on top of it.

use std::sync::{Arc, RwLock};

use crate::message::Message;

pub struct Store {
    messages: RwLock<Vec<Arc<Message>>>,
    selected: RwLock<i64>,
    auto_transmit: RwLock<bool>,
    window_size: RwLock<(u16, u16)>,
}

impl Store {
    pub fn new(auto_transmit: bool) -> Self {
        Store {
            messages: RwLock::new(Vec::new()),
            selected: RwLock::new(-1),
            auto_transmit: RwLock::new(auto_transmit),
            window_size: RwLock::new((0, 0)),
        }
    }

    /// Appends a message. Safe to call concurrently from any number of
    /// relay pumps; the UI only ever reads this side.
    pub fn append(&self, message: Arc<Message>) {
        self.messages.write().unwrap().push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Arc<Message>> {
        self.messages.read().unwrap().get(index).cloned()
    }

    /// A snapshot of the full history, in append order.
    pub fn all(&self) -> Vec<Arc<Message>> {
        self.messages.read().unwrap().clone()
    }

    pub fn selected_index(&self) -> i64 {
        *self.selected.read().unwrap()
    }

    pub fn selected(&self) -> Option<Arc<Message>> {
        let idx = *self.selected.read().unwrap();
        if idx < 0 {
            None
        } else {
            self.get(idx as usize)
        }
    }

    /// Moves the selection cursor by `delta`, saturating at the ends of the
    /// list. Returns the newly-selected message when the cursor actually
    /// moved, so the caller can re-view it. Only `tick` may promote
    /// `selected` from `-1`; a move while nothing is selected yet is a
    /// no-op.
    pub fn move_selection(&self, delta: i64) -> Option<Arc<Message>> {
        let len = self.len() as i64;
        if len == 0 {
            return None;
        }

        let mut idx = self.selected.write().unwrap();
        if *idx < 0 {
            return None;
        }

        let next = (*idx + delta).clamp(0, len - 1);
        if next == *idx {
            return None;
        }
        *idx = next;
        drop(idx);
        self.get(next as usize)
    }

    /// Runs once per UI tick. The only place that promotes `selected` from
    /// `-1` to `0`; returns the message to view when it does so, so the
    /// viewer gets its first `ViewMessage` deterministically.
    pub fn tick(&self) -> Option<Arc<Message>> {
        let mut idx = self.selected.write().unwrap();
        if *idx == -1 {
            let len = self.messages.read().unwrap().len();
            if len > 0 {
                *idx = 0;
                drop(idx);
                return self.get(0);
            }
        }
        None
    }

    pub fn auto_transmit(&self) -> bool {
        *self.auto_transmit.read().unwrap()
    }

    pub fn set_auto_transmit(&self, value: bool) {
        *self.auto_transmit.write().unwrap() = value;
    }

    pub fn window_size(&self) -> (u16, u16) {
        *self.window_size.read().unwrap()
    }

    pub fn set_window_size(&self, size: (u16, u16)) {
        *self.window_size.write().unwrap() = size;
    }
}
