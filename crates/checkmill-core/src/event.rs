use std::cell::RefCell;
use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};

use crate::dispose::Dispose;

new_key_type! {
    pub struct ListenerKey;
}

type Listener<E> = Rc<dyn Fn(&E)>;

/// Typed, single-threaded event emitter.
///
/// Cloning yields another handle to the same listener set.
pub struct Emitter<E: 'static> {
    listeners: Rc<RefCell<SlotMap<ListenerKey, Listener<E>>>>,
}

impl<E: 'static> Clone for Emitter<E> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
        }
    }
}

impl<E: 'static> Default for Emitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> Emitter<E> {
    pub fn new() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(SlotMap::with_key())),
        }
    }

    /// Subscribes `f`; running the returned handle unsubscribes it.
    pub fn register(&self, f: impl Fn(&E) + 'static) -> Dispose {
        let key = self.listeners.borrow_mut().insert(Rc::new(f));
        let listeners = Rc::downgrade(&self.listeners);
        Dispose::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.borrow_mut().remove(key);
            }
        })
    }

    pub fn emit(&self, event: &E) {
        // Snapshot so listeners can (un)register while being called.
        let snapshot: Vec<Listener<E>> = self.listeners.borrow().values().cloned().collect();
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_emit_release() {
        let emitter = Emitter::<i32>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let release = emitter.register({
            let seen = seen.clone();
            move |v| seen.borrow_mut().push(*v)
        });

        emitter.emit(&1);
        release.run();
        emitter.emit(&2);

        assert_eq!(*seen.borrow(), vec![1]);
        assert!(emitter.is_empty());
    }

    #[test]
    fn listener_can_register_during_emit() {
        let emitter = Emitter::<()>::new();
        let inner = emitter.clone();
        let _keep = emitter.register(move |_| {
            let _ = inner.register(|_| {});
        });
        emitter.emit(&());
        assert_eq!(emitter.len(), 2);
    }
}
