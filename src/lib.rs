//! A minimal single-threaded state store (similar to redux), and the
//! play/stop player it drives.
//!
//! A [Store] owns the current state, which only changes when an action
//! is [dispatched](Store::dispatch()) and reduced by the store's
//! [Reducer]. Listeners [subscribe](Store::subscribe()) to be called
//! after every dispatch, and the [render] module uses this to redraw
//! only the parts of the player whose state changed.

mod action;
pub mod config;
pub mod controller;
mod listener;
mod reducer;
pub mod render;
mod state;
mod store;

pub use action::*;
pub use listener::{Callback, ListenerId, Subscription};
pub use reducer::*;
pub use state::*;
pub use store::{player_store, PlayerStore, Store, StoreRef, WeakStoreRef};
