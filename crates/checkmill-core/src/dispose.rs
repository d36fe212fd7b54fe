use std::cell::RefCell;
use std::rc::Rc;

/// Release handle returned by every registration.
#[derive(Clone)]
pub struct Dispose(Rc<RefCell<Option<Box<dyn FnOnce()>>>>);

impl Dispose {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(RefCell::new(Some(Box::new(f)))))
    }

    pub fn noop() -> Self {
        Self(Rc::new(RefCell::new(None)))
    }

    /// Runs at most once (safe to call multiple times).
    pub fn run(&self) {
        let f = self.0.borrow_mut().take();
        if let Some(f) = f {
            f()
        }
    }

    pub fn is_spent(&self) -> bool {
        self.0.borrow().is_none()
    }
}

impl std::fmt::Debug for Dispose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Dispose").field(&!self.is_spent()).finish()
    }
}

/// Lifetime tier a disposer belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tier {
    /// Lives as long as the owner.
    Static,
    /// Torn down and rebuilt on every reconfigure.
    Reconfigurable,
    /// Scoped to a single gesture.
    Temporal,
}

impl Tier {
    const ALL: [Tier; 3] = [Tier::Static, Tier::Reconfigurable, Tier::Temporal];

    fn slot(self) -> usize {
        match self {
            Tier::Static => 0,
            Tier::Reconfigurable => 1,
            Tier::Temporal => 2,
        }
    }
}

/// Disposers partitioned by [`Tier`], released newest-first.
#[derive(Default)]
pub struct DisposableStore {
    tiers: RefCell<[Vec<Dispose>; 3]>,
}

impl DisposableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, tier: Tier, disposer: Dispose) {
        self.tiers.borrow_mut()[tier.slot()].push(disposer);
    }

    pub fn push_all(&self, tier: Tier, disposers: impl IntoIterator<Item = Dispose>) {
        self.tiers.borrow_mut()[tier.slot()].extend(disposers);
    }

    pub fn flush(&self, tier: Tier) {
        // Take first: a disposer may register into the store while running.
        let drained = std::mem::take(&mut self.tiers.borrow_mut()[tier.slot()]);
        for d in drained.into_iter().rev() {
            d.run();
        }
    }

    pub fn flush_all(&self) {
        for tier in Tier::ALL.into_iter().rev() {
            self.flush(tier);
        }
    }

    pub fn len(&self, tier: Tier) -> usize {
        self.tiers.borrow()[tier.slot()].len()
    }

    /// Collapses the whole store into one handle.
    pub fn into_dispose(self) -> Dispose {
        Dispose::new(move || self.flush_all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispose_runs_once() {
        let count = Rc::new(RefCell::new(0));
        let d = Dispose::new({
            let count = count.clone();
            move || *count.borrow_mut() += 1
        });
        d.run();
        d.clone().run();
        assert_eq!(*count.borrow(), 1);
        assert!(d.is_spent());
    }

    #[test]
    fn flush_only_touches_one_tier() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let store = DisposableStore::new();
        for (tier, name) in [
            (Tier::Static, "static"),
            (Tier::Reconfigurable, "a"),
            (Tier::Reconfigurable, "b"),
        ] {
            let log = log.clone();
            store.push(tier, Dispose::new(move || log.borrow_mut().push(name)));
        }

        store.flush(Tier::Reconfigurable);
        assert_eq!(*log.borrow(), vec!["b", "a"]);
        assert_eq!(store.len(Tier::Static), 1);

        store.flush_all();
        assert_eq!(*log.borrow(), vec!["b", "a", "static"]);
    }

    #[test]
    fn disposer_may_register_while_flushing() {
        let store = Rc::new(DisposableStore::new());
        let inner = store.clone();
        store.push(
            Tier::Temporal,
            Dispose::new(move || inner.push(Tier::Temporal, Dispose::noop())),
        );
        store.flush(Tier::Temporal);
        assert_eq!(store.len(Tier::Temporal), 1);
    }
}
