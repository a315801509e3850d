use crate::{
    config::{ListenerFailurePolicy, StoreConfig},
    listener::Listeners,
    Action, AppState, Callback, PlayerReducer, Reducer, Subscription,
};
use std::{
    cell::RefCell,
    collections::VecDeque,
    fmt::Debug,
    ops::Deref,
    panic::{self, AssertUnwindSafe},
    rc::{Rc, Weak},
};

/// A wrapper for an [Rc] reference to a [Store].
///
/// This wrapper exists to provide a standard interface for components
/// which require a long living reference to the store in order to
/// dispatch actions or read its state, such as the glue code of a UI.
pub struct StoreRef<State, Action>(Rc<Store<State, Action>>);

impl<State, Action> StoreRef<State, Action>
where
    State: Debug,
    Action: Debug,
{
    pub fn new<R: Reducer<State, Action> + 'static>(reducer: R, initial_state: State) -> Self {
        Self(Rc::new(Store::new(reducer, initial_state)))
    }

    pub fn with_config<R: Reducer<State, Action> + 'static>(
        reducer: R,
        initial_state: State,
        config: StoreConfig,
    ) -> Self {
        Self(Rc::new(Store::with_config(reducer, initial_state, config)))
    }
}

impl<State, Action> StoreRef<State, Action> {
    /// A reference which does not keep the store alive, for use in
    /// listeners that are owned by the store itself.
    pub fn downgrade(&self) -> WeakStoreRef<State, Action> {
        WeakStoreRef(Rc::downgrade(&self.0))
    }
}

impl<State, Action> Clone for StoreRef<State, Action> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<State, Action> Deref for StoreRef<State, Action> {
    type Target = Store<State, Action>;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl<State, Action> PartialEq for StoreRef<State, Action> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// A weak counterpart of [StoreRef], see [StoreRef::downgrade()].
pub struct WeakStoreRef<State, Action>(Weak<Store<State, Action>>);

impl<State, Action> WeakStoreRef<State, Action> {
    pub fn upgrade(&self) -> Option<StoreRef<State, Action>> {
        self.0.upgrade().map(StoreRef)
    }
}

impl<State, Action> Clone for WeakStoreRef<State, Action> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// A [StoreRef] holding the player's [AppState].
pub type PlayerStore = StoreRef<AppState, Action>;

/// Create the player's store, reducing with [PlayerReducer] from the
/// default (stopped) [AppState].
pub fn player_store() -> PlayerStore {
    StoreRef::new(PlayerReducer, AppState::default())
}

/// Clears actions that are still queued when a listener panic unwinds
/// through [Store::dispatch()], so that they are not applied by some
/// unrelated later dispatch.
struct DiscardQueueOnUnwind<'a, Action>(&'a RefCell<VecDeque<Action>>);

impl<'a, Action> Drop for DiscardQueueOnUnwind<'a, Action> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            if let Ok(mut queue) = self.0.try_borrow_mut() {
                queue.clear();
            }
        }
    }
}

/// This struct is designed to operate as a central source of truth
/// and "immutable" state within your application.
///
/// The current state of this store ([Store::state()]) can only be
/// modified by dispatching an `Action` via [Store::dispatch()] to the
/// store. These actions are taken by a [Reducer] which you provided
/// to the store (at construction) and a new current state is
/// produced. The previous state is never mutated, and remains valid
/// for anything which still holds a reference to it, which is how
/// renderers compare the previous and current state.
///
/// Listeners subscribe with [Store::subscribe()] and are invoked,
/// without arguments and in the order they subscribed, after every
/// dispatch.
pub struct Store<State, Action> {
    config: StoreConfig,
    /// This lock is used to prevent dispatch recursion.
    dispatch_lock: RefCell<()>,
    /// Queue of actions to be dispatched by [Store::dispatch()].
    dispatch_queue: RefCell<VecDeque<Action>>,
    /// The [Reducer] for this store, which takes `Actions` and
    /// produces the next `State`.
    reducer: Box<dyn Reducer<State, Action>>,
    /// The current state of this store.
    state: RefCell<Rc<State>>,
    /// The listeners which are notified after every
    /// [Store::dispatch()].
    listeners: Rc<Listeners>,
}

impl<State, Action> Store<State, Action>
where
    State: Debug,
    Action: Debug,
{
    /// Create a new [Store], which uses the specified `reducer` to
    /// handle `Action`s, starting from `initial_state`.
    pub fn new<R: Reducer<State, Action> + 'static>(reducer: R, initial_state: State) -> Self {
        Self::with_config(reducer, initial_state, StoreConfig::default())
    }

    pub fn with_config<R: Reducer<State, Action> + 'static>(
        reducer: R,
        initial_state: State,
        config: StoreConfig,
    ) -> Self {
        Self {
            config,
            dispatch_lock: RefCell::new(()),
            dispatch_queue: RefCell::new(VecDeque::new()),
            reducer: Box::new(reducer),
            state: RefCell::new(Rc::new(initial_state)),
            listeners: Rc::new(Listeners::default()),
        }
    }

    /// Get the current `State` stored in this store.
    ///
    /// Modifications to this state need to be performed by
    /// dispatching an `Action` to the store using
    /// [dispatch()](Store::dispatch()).
    pub fn state(&self) -> Rc<State> {
        self.state.borrow().clone()
    }

    /// Dispatch an `Action` to the reducer on this `Store`, replacing
    /// the current state with the result.
    fn dispatch_reducer(&self, action: &Action) {
        let log_level = self.config.log_level;
        let logging = log_level.enabled();

        let prev_state = self.state();
        if logging {
            log_level.log(format!("prev state: {:?}", prev_state));
            log_level.log(format!("action: {:?}", action));
        }

        let next_state = self.reducer.reduce(&prev_state, action);

        if logging {
            if Rc::ptr_eq(&prev_state, &next_state) {
                log_level.log("next state: unchanged");
            } else {
                log_level.log(format!("next state: {:?}", next_state));
            }
        }

        *self.state.borrow_mut() = next_state;
    }

    /// Notify every listener once, in registration order. Listeners
    /// added or removed while this runs take effect on the next call.
    fn notify_listeners(&self) {
        for (id, callback) in self.listeners.snapshot() {
            match self.config.listener_failures {
                ListenerFailurePolicy::Propagate => callback.emit(),
                ListenerFailurePolicy::Isolate => {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| callback.emit()));
                    if let Err(payload) = result {
                        let message = payload
                            .downcast_ref::<&str>()
                            .map(|s| s.to_string())
                            .or_else(|| payload.downcast_ref::<String>().cloned())
                            .unwrap_or_else(|| "unknown panic".to_string());
                        log::error!("listener {:?} panicked: {}", id, message);
                    }
                }
            }
        }
    }

    /// Dispatch an `Action` to be passed to the [Reducer] in order to
    /// produce the next `State` of this store, then notify the
    /// listeners.
    ///
    /// Listeners are notified even when the reducer returns the
    /// previous state unchanged. When a listener dispatches another
    /// action, that action is queued and processed once the current
    /// round of notifications has finished, before the outermost
    /// `dispatch()` returns.
    pub fn dispatch<A: Into<Action>>(&self, action: A) {
        self.dispatch_impl(action.into());
    }

    /// Concrete version of [Store::dispatch()], to avoid generating a
    /// copy of the dispatch loop per type implementing `Into<Action>`.
    fn dispatch_impl(&self, action: Action) {
        self.dispatch_queue.borrow_mut().push_back(action);

        // If the lock fails to acquire, then the dispatch is already in progress.
        // This prevents recursion, when a listener callback also triggers another
        // dispatch.
        if let Ok(_lock) = self.dispatch_lock.try_borrow_mut() {
            let _discard = DiscardQueueOnUnwind(&self.dispatch_queue);

            loop {
                // Bound to a local so the queue borrow ends before the
                // listeners run and possibly push to it.
                let dispatch_action = self.dispatch_queue.borrow_mut().pop_front();

                match dispatch_action {
                    Some(action) => {
                        self.dispatch_reducer(&action);
                        self.notify_listeners();
                    }
                    None => break,
                }
            }
        }
    }

    /// Subscribe a listener, to be invoked after every
    /// [dispatch()](Store::dispatch()).
    ///
    /// The listener is removed when the returned [Subscription] is
    /// dropped, see [Subscription::detach()] to keep it for the life
    /// of the store. A listener subscribed from within another
    /// listener is first invoked by the next dispatch.
    pub fn subscribe<L: Into<Callback>>(&self, listener: L) -> Subscription {
        let id = self.listeners.add(listener.into());
        Subscription::new(id, &self.listeners)
    }

    /// The number of listeners currently subscribed.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        config::{ListenerFailurePolicy, StoreConfig},
        player_store, Action, AppState, PlayerReducer, PlayerStore, Reducer, StoreRef,
        Subscription, TaggedAction,
    };
    use std::{cell::RefCell, panic, rc::Rc};

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Box<dyn Fn()>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_copy = log.clone();
        let make = move |name: &'static str| -> Box<dyn Fn()> {
            let log = log_copy.clone();
            Box::new(move || log.borrow_mut().push(name))
        };
        (log, make)
    }

    #[test]
    fn test_initial_state() {
        let store = player_store();
        assert_eq!(AppState::default(), *store.state());
        assert!(Rc::ptr_eq(&store.state(), &store.state()));
    }

    #[test]
    fn test_play_next_stop() {
        let store = player_store();

        store.dispatch(Action::play("A"));
        let playing = store.state();
        assert!(playing.is_playing);
        assert_eq!("stop", playing.button.class_name);
        assert_eq!("A", playing.screen.title);

        store.dispatch(Action::next("B"));
        let next = store.state();
        assert_eq!("B", next.screen.title);
        assert!(next.is_playing);
        assert!(Rc::ptr_eq(&playing.button, &next.button));

        store.dispatch(Action::stop("C"));
        let stopped = store.state();
        assert!(!stopped.is_playing);
        assert_eq!("play", stopped.button.class_name);
        assert_eq!("C", stopped.screen.title);
    }

    #[test]
    fn test_dispatch_applies_only_reducer() {
        let store = player_store();
        let actions = vec![
            Action::next("x"),
            Action::play("A"),
            Action::play("A2"),
            Action::next("B"),
            Action::stop("C"),
            Action::next("D"),
        ];

        for action in actions {
            let expected = PlayerReducer.reduce(&store.state(), &action);
            store.dispatch(action);
            assert_eq!(*expected, *store.state());
        }
    }

    #[test]
    fn test_unknown_action_keeps_state() {
        let store: StoreRef<AppState, TaggedAction> =
            StoreRef::new(PlayerReducer, AppState::default());
        let (log, make) = recorder();
        store.subscribe(make("listener")).detach();

        let before = store.state();
        store.dispatch(TaggedAction::new("REWIND", "x"));
        assert!(Rc::ptr_eq(&before, &store.state()));
        assert_eq!(vec!["listener"], *log.borrow());

        store.dispatch(Action::play("A"));
        assert!(store.state().is_playing);
    }

    #[test]
    fn test_notify_order() {
        let store = player_store();
        let (log, make) = recorder();
        let _first = store.subscribe(make("first"));
        let _second = store.subscribe(make("second"));
        let _third = store.subscribe(make("third"));

        store.dispatch(Action::play("A"));
        store.dispatch(Action::stop("B"));
        assert_eq!(
            vec!["first", "second", "third", "first", "second", "third"],
            *log.borrow()
        );
    }

    #[test]
    fn test_stop_twice() {
        let store = player_store();
        let (log, make) = recorder();
        let _subscription = store.subscribe(make("listener"));

        store.dispatch(Action::stop("C"));
        let first = store.state();
        store.dispatch(Action::stop("C"));
        let second = store.state();

        assert_eq!(*first, *second);
        assert!(!Rc::ptr_eq(&first, &second));
        assert_eq!(2, log.borrow().len());
    }

    #[test]
    fn test_unsubscribe() {
        let store = player_store();
        let (log, make) = recorder();
        let first = store.subscribe(make("first"));
        let second = store.subscribe(make("second"));
        assert_eq!(2, store.listener_count());

        store.dispatch(Action::play("A"));
        assert!(first.unsubscribe());
        store.dispatch(Action::play("A"));
        drop(second);
        store.dispatch(Action::play("A"));

        assert_eq!(vec!["first", "second", "second"], *log.borrow());
        assert_eq!(0, store.listener_count());
    }

    #[test]
    fn test_subscribe_during_notify() {
        let store = player_store();
        let (log, make) = recorder();
        let make = Rc::new(make);
        let late: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));

        let weak_store = store.downgrade();
        let late_copy = late.clone();
        let make_copy = make.clone();
        store
            .subscribe(move || {
                if let Some(store) = weak_store.upgrade() {
                    if late_copy.borrow().is_empty() {
                        let subscription = store.subscribe(make_copy("late"));
                        late_copy.borrow_mut().push(subscription);
                    }
                }
            })
            .detach();
        store.subscribe(make("early")).detach();

        store.dispatch(Action::play("A"));
        assert_eq!(vec!["early"], *log.borrow());

        store.dispatch(Action::play("A"));
        assert_eq!(vec!["early", "early", "late"], *log.borrow());
    }

    #[test]
    fn test_dispatch_from_listener_is_queued() {
        let store = player_store();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let weak_store = store.downgrade();
        let seen_copy = seen.clone();
        store
            .subscribe(move || {
                let store = match weak_store.upgrade() {
                    Some(store) => store,
                    None => return,
                };
                let state = store.state();
                seen_copy.borrow_mut().push(state.screen.title.clone());
                if state.screen.title == "A" {
                    store.dispatch(Action::next("B"));
                    // still the state of the current round
                    assert_eq!("A", store.state().screen.title);
                }
            })
            .detach();

        store.dispatch(Action::play("A"));
        assert_eq!(vec!["A".to_string(), "B".to_string()], *seen.borrow());
        assert_eq!("B", store.state().screen.title);
    }

    #[test]
    fn test_listener_panic_propagates() {
        let store = player_store();
        let (log, make) = recorder();
        store.subscribe(|| panic!("listener failure")).detach();
        store.subscribe(make("after")).detach();

        let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            store.dispatch(Action::play("A"));
        }));
        assert!(result.is_err());
        assert!(store.state().is_playing);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_unsubscribe_during_notify() {
        let store = player_store();
        let (log, make) = recorder();
        let removed: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let removed_copy = removed.clone();
        store
            .subscribe(move || {
                removed_copy.borrow_mut().take();
            })
            .detach();
        *removed.borrow_mut() = Some(store.subscribe(make("removed")));
        assert_eq!(2, store.listener_count());

        // already part of the first round when it is unsubscribed
        store.dispatch(Action::play("A"));
        assert_eq!(vec!["removed"], *log.borrow());
        assert_eq!(1, store.listener_count());

        store.dispatch(Action::play("A"));
        assert_eq!(vec!["removed"], *log.borrow());
    }

    #[test]
    fn test_listener_panic_discards_queued_actions() {
        let store = player_store();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_copy = seen.clone();
        let weak_store = store.downgrade();
        store
            .subscribe(move || {
                if let Some(store) = weak_store.upgrade() {
                    let title = store.state().screen.title.clone();
                    seen_copy.borrow_mut().push(title.clone());
                    if title == "A" {
                        store.dispatch(Action::next("QUEUED"));
                        panic!("listener failure");
                    }
                }
            })
            .detach();

        let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            store.dispatch(Action::play("A"));
        }));
        assert!(result.is_err());
        assert_eq!("A", store.state().screen.title);

        store.dispatch(Action::stop("C"));
        let state = store.state();
        assert_eq!("C", state.screen.title);
        assert!(!state.is_playing);
        assert_eq!(vec!["A".to_string(), "C".to_string()], *seen.borrow());
    }

    #[test]
    fn test_listener_panic_isolated() {
        let store: PlayerStore = StoreRef::with_config(
            PlayerReducer,
            AppState::default(),
            StoreConfig::new().listener_failures(ListenerFailurePolicy::Isolate),
        );
        let (log, make) = recorder();
        store.subscribe(make("before")).detach();
        store.subscribe(|| panic!("listener failure")).detach();
        store.subscribe(make("after")).detach();

        store.dispatch(Action::play("A"));
        assert_eq!(vec!["before", "after"], *log.borrow());
        assert!(store.state().is_playing);
    }

    #[test]
    fn test_closure_reducer_store() {
        let store = StoreRef::new(
            |prev: &Rc<i32>, delta: &i32| {
                if *delta == 0 {
                    prev.clone()
                } else {
                    Rc::new(**prev + *delta)
                }
            },
            0,
        );
        let before = store.state();
        store.dispatch(0);
        assert!(Rc::ptr_eq(&before, &store.state()));
        store.dispatch(3);
        assert_eq!(3, *store.state());
    }

    #[test]
    fn test_store_ref_identity() {
        let store = player_store();
        let other = player_store();
        assert!(store == store.clone());
        assert!(store != other);
        let weak = store.downgrade();
        drop(store);
        assert!(weak.upgrade().is_none());
    }
}
