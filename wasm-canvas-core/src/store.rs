//! Single-threaded store holding the load state
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::action::Action;
use crate::reducer::reduce;
use crate::state::LoadState;

/// Anything that accepts actions
pub trait Dispatch {
    fn dispatch(&self, action: Action);
}

impl<D: Dispatch + ?Sized> Dispatch for Rc<D> {
    fn dispatch(&self, action: Action) {
        (**self).dispatch(action)
    }
}

impl<D: Dispatch + ?Sized> Dispatch for &D {
    fn dispatch(&self, action: Action) {
        (**self).dispatch(action)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn as_u64(self) -> u64 {
        self.0
    }

    pub fn from_u64(id: u64) -> Self {
        Self(id)
    }
}

impl TryFrom<SubscriptionId> for u32 {
    type Error = std::num::TryFromIntError;

    fn try_from(id: SubscriptionId) -> Result<Self, Self::Error> {
        u32::try_from(id.0)
    }
}

type Listener = Rc<dyn Fn(&Rc<LoadState>)>;

/// Store for [`LoadState`].
///
/// Listeners run after every dispatch that changed the state identity. A
/// dispatch issued from inside a listener is queued and applied once the
/// current round of notifications has finished.
pub struct Store {
    state: RefCell<Rc<LoadState>>,
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
    next_id: Cell<u64>,
    dispatching: Cell<bool>,
    pending: RefCell<VecDeque<Action>>,
}

impl Store {
    pub fn new() -> Self {
        Self::with_state(LoadState::default())
    }

    pub fn with_state(state: LoadState) -> Self {
        Self {
            state: RefCell::new(Rc::new(state)),
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            dispatching: Cell::new(false),
            pending: RefCell::new(VecDeque::new()),
        }
    }

    /// Current state
    pub fn state(&self) -> Rc<LoadState> {
        Rc::clone(&*self.state.borrow())
    }

    pub fn subscribe(&self, listener: impl Fn(&Rc<LoadState>) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let listener: Listener = Rc::new(listener);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    /// Returns false if the subscription was already gone
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn apply(&self, action: &Action) {
        let current = self.state();
        let next = reduce(&current, action);
        if Rc::ptr_eq(&current, &next) {
            log::trace!("{} left the canvas state unchanged", action.kind());
            return;
        }
        *self.state.borrow_mut() = Rc::clone(&next);

        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&next);
        }
    }
}

impl Dispatch for Store {
    fn dispatch(&self, action: Action) {
        if self.dispatching.get() {
            self.pending.borrow_mut().push_back(action);
            return;
        }

        self.dispatching.set(true);
        self.apply(&action);
        loop {
            let next = self.pending.borrow_mut().pop_front();
            match next {
                Some(action) => self.apply(&action),
                None => break,
            }
        }
        self.dispatching.set(false);
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state.borrow())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}
