use std::{
    cell::{Cell, RefCell},
    fmt::Debug,
    rc::{Rc, Weak},
};

/// A wrapper for a callback which is notified after every
/// [Store::dispatch()](crate::Store::dispatch()). It takes no
/// arguments, listeners read the state they need from the store.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn()>);

impl Callback {
    pub fn new<C: Fn() + 'static>(closure: C) -> Self {
        Callback(Rc::new(closure))
    }

    pub fn emit(&self) {
        (self.0)()
    }
}

impl<C> From<C> for Callback
where
    C: Fn() + 'static,
{
    fn from(closure: C) -> Self {
        Callback(Rc::new(closure))
    }
}

impl Debug for Callback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Callback(@ {:p})", Rc::as_ptr(&self.0))
    }
}

/// Identifies a listener within a single store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// The ordered set of listeners owned by a [Store](crate::Store).
#[derive(Debug, Default)]
pub(crate) struct Listeners {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(ListenerId, Callback)>>,
}

impl Listeners {
    pub fn add(&self, callback: Callback) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.entries.borrow_mut().push((id, callback));
        id
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.borrow_mut();
        match entries.iter().position(|(entry_id, _)| *entry_id == id) {
            Some(index) => {
                // `remove` rather than `swap_remove`, notification order
                // is registration order.
                entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// The listeners to notify for one round, in registration order.
    /// Later changes to the registry do not affect the returned list.
    pub fn snapshot(&self) -> Vec<(ListenerId, Callback)> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

/// Returned by [Store::subscribe()](crate::Store::subscribe()).
///
/// The listener stays subscribed for as long as this handle is alive.
/// Dropping the handle, or calling
/// [unsubscribe()](Subscription::unsubscribe()), removes the listener
/// from the store. Use [detach()](Subscription::detach()) to keep the
/// listener for the rest of the store's life.
#[must_use = "the listener is removed when the subscription is dropped"]
pub struct Subscription {
    id: ListenerId,
    listeners: Weak<Listeners>,
}

impl Subscription {
    pub(crate) fn new(id: ListenerId, listeners: &Rc<Listeners>) -> Self {
        Self {
            id,
            listeners: Rc::downgrade(listeners),
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Remove the listener from the store. Returns `false` if the
    /// store no longer exists.
    pub fn unsubscribe(mut self) -> bool {
        self.release()
    }

    /// Keep the listener subscribed until the store is dropped.
    pub fn detach(mut self) {
        self.listeners = Weak::new();
    }

    fn release(&mut self) -> bool {
        let listeners = std::mem::replace(&mut self.listeners, Weak::new());
        match listeners.upgrade() {
            Some(listeners) => listeners.remove(self.id),
            None => false,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("attached", &(self.listeners.strong_count() > 0))
            .finish()
    }
}
