//! Reducer-driven state containers for the cart and the session.
//!
//! A [`Store`] holds a state value that only changes by dispatching actions
//! through the state's pure [`Reducer`]. Side effects (persistence) live in
//! subscribers, which are called with the new state after every dispatch.

pub mod auth;
pub mod cart;

use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// State that evolves by applying actions.
pub trait Reducer: Clone + Send + Sync + 'static {
    type Action;

    /// The state after applying `action`. Must not have side effects.
    #[must_use]
    fn reduce(&self, action: Self::Action) -> Self;
}

type Subscriber<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// A state container with change subscribers.
pub struct Store<S: Reducer> {
    state: RwLock<S>,
    subscribers: RwLock<Vec<Subscriber<S>>>,
    /// Held from reduce through notification so subscribers see states in
    /// dispatch order.
    dispatching: Mutex<()>,
}

impl<S: Reducer> Store<S> {
    #[must_use]
    pub fn new(initial: S) -> Self {
        Self {
            state: RwLock::new(initial),
            subscribers: RwLock::new(Vec::new()),
            dispatching: Mutex::new(()),
        }
    }

    /// Apply `action` and notify subscribers with the resulting state.
    ///
    /// Dispatches are serialized: subscribers are called once per dispatch,
    /// in dispatch order. The state lock is released before they run, so they
    /// may read the store, but they must not dispatch.
    pub fn dispatch(&self, action: S::Action) -> S {
        let _ordered = self
            .dispatching
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let next = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            *state = state.reduce(action);
            state.clone()
        };

        let subscribers = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for subscriber in &subscribers {
            subscriber(&next);
        }
        next
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> S {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Read the current state without cloning it.
    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Call `subscriber` after every dispatch.
    pub fn subscribe(&self, subscriber: impl Fn(&S) + Send + Sync + 'static) {
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(subscriber));
    }
}

impl<S: Reducer + std::fmt::Debug> std::fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.with_state(|state| f.debug_struct("Store").field("state", state).finish_non_exhaustive())
    }
}
