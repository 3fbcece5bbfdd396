//! Engine event registry.
//!
//! Handlers are registered per event and invoked synchronously in
//! registration order. Closures are not reference-comparable in Rust, so
//! `bind` hands back a [`HandlerId`] token used for unbinding.

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum EngineEvent {
    EnterFrame,
    LoopStart,
    LoopComplete,
    Play,
    Pause,
    Stop,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct HandlerId(u64);

type Handler<T> = Box<dyn FnMut(&T)>;

pub struct EventRegistry<T> {
    table: HashMap<EngineEvent, Vec<(HandlerId, Handler<T>)>>,
    /// Ids unbound while their handler list was checked out for firing.
    pending_removal: HashSet<(EngineEvent, HandlerId)>,
    next_id: u64,
}

impl<T> Default for EventRegistry<T> {
    fn default() -> Self {
        Self {
            table: HashMap::new(),
            pending_removal: HashSet::new(),
            next_id: 0,
        }
    }
}

impl<T> EventRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, event: EngineEvent, handler: impl FnMut(&T) + 'static) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.table
            .entry(event)
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Returns whether a handler was removed. Unbinding a handler that is
    /// currently checked out for firing takes effect when it is restored.
    pub fn unbind(&mut self, event: EngineEvent, id: HandlerId) -> bool {
        if let Some(handlers) = self.table.get_mut(&event) {
            let before = handlers.len();
            handlers.retain(|(hid, _)| *hid != id);
            if handlers.len() != before {
                return true;
            }
        }
        self.pending_removal.insert((event, id));
        false
    }

    /// Check out the handler list for an event so it can be fired without
    /// borrowing the registry. Must be paired with [`EventRegistry::restore`].
    pub(crate) fn take(&mut self, event: EngineEvent) -> Vec<(HandlerId, Handler<T>)> {
        self.table.remove(&event).unwrap_or_default()
    }

    /// Return a checked-out handler list, keeping handlers bound during the
    /// fire and dropping any unbound in the meantime.
    pub(crate) fn restore(&mut self, event: EngineEvent, mut handlers: Vec<(HandlerId, Handler<T>)>) {
        handlers.retain(|(id, _)| !self.pending_removal.remove(&(event, *id)));
        let slot = self.table.entry(event).or_default();
        // Handlers bound during the fire were appended to the fresh slot;
        // the checked-out list keeps its original position at the front.
        let appended = std::mem::replace(slot, handlers);
        slot.extend(appended);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn fire(reg: &mut EventRegistry<u32>, event: EngineEvent, arg: &u32) {
        let mut handlers = reg.take(event);
        for (_, h) in handlers.iter_mut() {
            h(arg);
        }
        reg.restore(event, handlers);
    }

    #[test]
    fn handlers_fire_in_registration_order() {
        let mut reg = EventRegistry::<u32>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let a = seen.clone();
        let b = seen.clone();
        reg.bind(EngineEvent::Play, move |_| a.borrow_mut().push("first"));
        reg.bind(EngineEvent::Play, move |_| b.borrow_mut().push("second"));
        fire(&mut reg, EngineEvent::Play, &0);
        assert_eq!(*seen.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn unbind_removes_handler() {
        let mut reg = EventRegistry::<u32>::new();
        let seen = Rc::new(RefCell::new(0u32));
        let s = seen.clone();
        let id = reg.bind(EngineEvent::Stop, move |_| *s.borrow_mut() += 1);
        fire(&mut reg, EngineEvent::Stop, &0);
        assert!(reg.unbind(EngineEvent::Stop, id));
        fire(&mut reg, EngineEvent::Stop, &0);
        assert_eq!(*seen.borrow(), 1);
    }

    #[test]
    fn unbind_during_fire_takes_effect_on_restore() {
        let mut reg = EventRegistry::<u32>::new();
        let id = reg.bind(EngineEvent::Pause, |_| {});
        let handlers = reg.take(EngineEvent::Pause);
        assert!(!reg.unbind(EngineEvent::Pause, id));
        reg.restore(EngineEvent::Pause, handlers);
        let handlers = reg.take(EngineEvent::Pause);
        assert!(handlers.is_empty());
        reg.restore(EngineEvent::Pause, handlers);
    }
}
